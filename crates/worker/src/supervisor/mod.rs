//! Supervision: a task that runs one actor, classifies how it ended and
//! publishes the result.

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::mailbox::{self, MailboxReceiver};
use crate::{ActorContext, ActorEvents, ActorExit, ActorExitKind, ActorFlow, TaskClass, WorkerActor, join_failure};

mod handle;

pub use handle::{ActorHandle, ShutdownMode, ShutdownReport};

const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Everything needed to run an actor under supervision.
pub struct ActorSpec<A: WorkerActor> {
	name: String,
	class: TaskClass,
	actor: A,
	mailbox_capacity: usize,
}

impl<A: WorkerActor> ActorSpec<A> {
	pub fn new(name: impl Into<String>, class: TaskClass, actor: A) -> Self {
		Self {
			name: name.into(),
			class,
			actor,
			mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
		}
	}

	/// Commands that may queue before `send` waits. Clamped to at least one.
	pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
		self.mailbox_capacity = capacity.max(1);
		self
	}
}

/// Starts `spec` on the ambient runtime.
///
/// Returns the owner handle and the actor's event stream. The stream yields
/// every emitted event in order and ends only after the exit has been
/// published on [`ActorHandle::watch_exit`].
pub fn spawn_supervised_actor<A: WorkerActor>(spec: ActorSpec<A>) -> (ActorHandle<A::Cmd>, ActorEvents<A::Evt>) {
	let (tx, rx) = mailbox::bounded(spec.mailbox_capacity);
	let (events_tx, events) = mpsc::unbounded_channel();
	let (exit_tx, exit) = watch::channel(None);
	let cancel = CancellationToken::new();

	let ActorSpec {
		name,
		class,
		actor,
		mailbox_capacity,
	} = spec;
	tracing::debug!(actor = %name, %class, capacity = mailbox_capacity, "worker.actor.spawn");

	let ctx = ActorContext::new(events_tx.clone(), cancel.clone());
	let instance = crate::spawn(class, run(actor, rx, ctx, cancel.clone()));
	let task_name = name.clone();
	let queue = tx.clone();
	crate::spawn(class, async move {
		let exit = match instance.await {
			Ok(exit) => exit,
			Err(err) if err.is_panic() => ActorExit::new(ActorExitKind::Panicked).with_message(join_failure(err)),
			Err(err) => ActorExit::new(ActorExitKind::Aborted).with_message(join_failure(err)),
		};
		// Nothing drains the queue any more.
		queue.close();
		if exit.is_failure() {
			tracing::warn!(actor = %task_name, %exit, "worker.actor.exit");
		} else {
			tracing::debug!(actor = %task_name, %exit, "worker.actor.exit");
		}
		exit_tx.send_replace(Some(exit));
		// Ends the event stream, now that the exit is visible.
		drop(events_tx);
	});

	(ActorHandle::new(name, tx, cancel, exit), events)
}

async fn run<A: WorkerActor>(mut actor: A, rx: MailboxReceiver<A::Cmd>, mut ctx: ActorContext<A::Evt>, cancel: CancellationToken) -> ActorExit {
	let exit = loop {
		let cmd = tokio::select! {
			biased;
			_ = cancel.cancelled() => break ActorExit::new(ActorExitKind::Cancelled),
			cmd = rx.recv() => match cmd {
				Some(cmd) => cmd,
				None => break ActorExit::new(ActorExitKind::MailboxClosed),
			},
		};
		let flow = tokio::select! {
			biased;
			_ = cancel.cancelled() => break ActorExit::new(ActorExitKind::Cancelled),
			flow = actor.handle(cmd, &mut ctx) => flow,
		};
		match flow {
			Ok(ActorFlow::Continue) => {}
			Ok(ActorFlow::Stop) => break ActorExit::new(ActorExitKind::Stopped),
			Err(err) => break ActorExit::new(ActorExitKind::HandlerFailed).with_message(err),
		}
	};

	actor.on_stop(&mut ctx).await;
	exit
}

#[cfg(test)]
mod tests;
