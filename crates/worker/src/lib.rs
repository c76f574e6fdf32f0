//! Supervised worker runtime for the trait filter engine.
//!
//! The filter engine keeps its seed store and trait index inside one actor so
//! evaluation never runs on the caller's task. This crate supplies that actor's
//! plumbing: classified spawning ([`TaskClass`], [`spawn`]), a bounded
//! [`mailbox`] that can be closed from the sending side, and the supervisor
//! ([`ActorSpec`], [`ActorHandle`]) that runs and stops an actor, streams its
//! events without loss and publishes its [`ActorExit`].

mod actor;
mod class;
mod exit;
pub mod mailbox;
mod spawn;
mod supervisor;

pub use actor::{ActorContext, ActorFlow, WorkerActor};
pub use class::TaskClass;
pub use exit::{ActorExit, ActorExitKind};
pub use mailbox::{MailboxReceiver, MailboxSendError, MailboxSender};
pub use spawn::{join_failure, spawn, spawn_blocking};
pub use supervisor::{ActorHandle, ActorSpec, ShutdownMode, ShutdownReport, spawn_supervised_actor};

/// Events emitted by a supervised actor, in emission order.
pub type ActorEvents<Evt> = tokio::sync::mpsc::UnboundedReceiver<Evt>;

pub type ActorExitReceiver = tokio::sync::watch::Receiver<Option<ActorExit>>;
