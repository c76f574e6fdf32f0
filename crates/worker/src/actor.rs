use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// What the actor loop does after a command was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorFlow {
	Continue,
	/// Ends the actor with [`ActorExitKind::Stopped`](crate::ActorExitKind::Stopped).
	Stop,
}

/// A stateful actor driven one command at a time by its supervisor.
///
/// A handler error is fatal: it ends the actor and is reported as
/// [`ActorExitKind::HandlerFailed`](crate::ActorExitKind::HandlerFailed).
/// Failures that concern a single command belong in the emitted events.
#[async_trait]
pub trait WorkerActor: Send + 'static {
	type Cmd: Send + 'static;
	type Evt: Send + 'static;

	async fn handle(&mut self, cmd: Self::Cmd, ctx: &mut ActorContext<Self::Evt>) -> Result<ActorFlow, String>;

	/// Runs once after the command loop ends, including on cancellation and
	/// handler errors. Not reached when the handler panics.
	async fn on_stop(&mut self, _ctx: &mut ActorContext<Self::Evt>) {}
}

/// Context handed to every [`WorkerActor`] callback.
pub struct ActorContext<Evt> {
	events: mpsc::UnboundedSender<Evt>,
	cancel: CancellationToken,
}

impl<Evt: Send + 'static> ActorContext<Evt> {
	pub(crate) fn new(events: mpsc::UnboundedSender<Evt>, cancel: CancellationToken) -> Self {
		Self { events, cancel }
	}

	/// Queues `evt` for the event receiver. Events are never dropped while
	/// the receiver is alive; returns false once it is gone.
	pub fn emit(&self, evt: Evt) -> bool {
		self.events.send(evt).is_ok()
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}
}
