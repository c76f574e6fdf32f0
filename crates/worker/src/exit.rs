use std::fmt;

/// Why an actor stopped running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActorExitKind {
	/// The handler returned [`ActorFlow::Stop`](crate::ActorFlow::Stop).
	Stopped,
	/// The mailbox was closed and drained.
	MailboxClosed,
	Cancelled,
	HandlerFailed,
	Panicked,
	/// The actor task ended abnormally without panicking.
	Aborted,
}

impl ActorExitKind {
	const fn as_str(self) -> &'static str {
		match self {
			Self::Stopped => "stopped",
			Self::MailboxClosed => "mailbox closed",
			Self::Cancelled => "cancelled",
			Self::HandlerFailed => "handler failed",
			Self::Panicked => "panicked",
			Self::Aborted => "aborted",
		}
	}
}

/// Record of how a supervised actor ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorExit {
	kind: ActorExitKind,
	message: Option<String>,
}

impl ActorExit {
	pub(crate) fn new(kind: ActorExitKind) -> Self {
		Self { kind, message: None }
	}

	pub(crate) fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}

	pub fn kind(&self) -> ActorExitKind {
		self.kind
	}

	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}

	/// Handler errors, panics and aborts.
	pub fn is_failure(&self) -> bool {
		matches!(self.kind, ActorExitKind::HandlerFailed | ActorExitKind::Panicked | ActorExitKind::Aborted)
	}
}

impl fmt::Display for ActorExit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.kind.as_str())?;
		if let Some(message) = &self.message {
			write!(f, ": {message}")?;
		}
		Ok(())
	}
}
