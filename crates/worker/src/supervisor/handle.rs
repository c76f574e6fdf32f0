use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::mailbox::{MailboxSendError, MailboxSender};
use crate::{ActorExit, ActorExitReceiver};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
	/// Cancel the actor, even mid-command.
	Immediate,
	/// Close the mailbox and let queued commands drain, up to `timeout`.
	Graceful { timeout: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
	completed: bool,
	exit: Option<ActorExit>,
}

impl ShutdownReport {
	/// True when the actor ended within the shutdown window.
	pub fn completed(&self) -> bool {
		self.completed
	}

	pub fn timed_out(&self) -> bool {
		!self.completed
	}

	pub fn exit(&self) -> Option<&ActorExit> {
		self.exit.as_ref()
	}
}

/// Owner side of a supervised actor. Dropping it cancels the actor.
pub struct ActorHandle<Cmd> {
	name: String,
	tx: MailboxSender<Cmd>,
	cancel: CancellationToken,
	exit: watch::Receiver<Option<ActorExit>>,
}

impl<Cmd: Send + 'static> ActorHandle<Cmd> {
	pub(super) fn new(name: String, tx: MailboxSender<Cmd>, cancel: CancellationToken, exit: watch::Receiver<Option<ActorExit>>) -> Self {
		Self { name, tx, cancel, exit }
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Queues a command, waiting while the mailbox is full. Cancel safe.
	pub async fn send(&self, cmd: Cmd) -> Result<(), MailboxSendError> {
		self.tx.send(cmd).await
	}

	/// How the actor ended, once it has.
	pub fn exit(&self) -> Option<ActorExit> {
		self.exit.borrow().clone()
	}

	pub fn watch_exit(&self) -> ActorExitReceiver {
		self.exit.clone()
	}

	/// Cancels the actor and closes its mailbox so later sends fail at once
	/// rather than waiting on a full queue nobody drains.
	pub fn cancel(&self) {
		self.cancel.cancel();
		self.tx.close();
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Stops the actor. Safe to call concurrently and more than once.
	pub async fn shutdown(&self, mode: ShutdownMode) -> ShutdownReport {
		let completed = match mode {
			ShutdownMode::Immediate => {
				self.cancel();
				self.finished().await;
				true
			}
			ShutdownMode::Graceful { timeout } => {
				self.tx.close();
				let drained = tokio::time::timeout(timeout, self.finished()).await.is_ok();
				if !drained {
					self.cancel.cancel();
				}
				drained
			}
		};
		ShutdownReport {
			completed,
			exit: self.exit(),
		}
	}

	/// Graceful shutdown, escalating to immediate once `timeout` runs out.
	pub async fn shutdown_graceful_or_force(&self, timeout: Duration) -> ShutdownReport {
		let report = self.shutdown(ShutdownMode::Graceful { timeout }).await;
		if report.completed() {
			return report;
		}
		tracing::warn!(actor = %self.name, ?timeout, "worker.actor.force_shutdown");
		self.shutdown(ShutdownMode::Immediate).await
	}

	async fn finished(&self) {
		let mut exit = self.exit.clone();
		// An error means the supervisor task is gone, which is also final.
		let _ = exit.wait_for(Option::is_some).await;
	}
}

impl<Cmd> Drop for ActorHandle<Cmd> {
	fn drop(&mut self) {
		self.cancel.cancel();
		self.tx.close();
	}
}
