use crate::protocol::RequestId;

/// Failures the worker reports for one request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkerError {
	#[error("filter requested before the collection was initialized")]
	NotInitialized,
	#[error("filter generation {generation} superseded by {latest}")]
	Superseded { generation: u64, latest: u64 },
	/// Index build or evaluation failed for this request only; the worker
	/// keeps serving.
	#[error("filter worker failed to handle request: {0}")]
	Handler(String),
}

/// Errors returned to callers of [`FilterEngine`](crate::FilterEngine).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
	/// The engine was destroyed or shut down; no further requests are served.
	#[error("filter engine destroyed")]
	Destroyed,
	/// The worker exited abnormally. Carries the exit summary.
	#[error("filter worker failed: {0}")]
	WorkerFailed(String),
	#[error("filter requested before the collection was initialized")]
	NotInitialized,
	/// A newer `apply_filters` call was issued before this one resolved.
	#[error("filter generation {generation} superseded by {latest}")]
	Superseded { generation: u64, latest: u64 },
	/// The worker answered a request with the wrong kind of response.
	/// The worker failed this one request. Later requests are still served.
	#[error("filter worker failed to handle request: {0}")]
	Handler(String),
	#[error("unexpected response to request {id}")]
	UnexpectedResponse { id: RequestId },
	/// The worker mailbox closed while no shutdown reason was recorded.
	#[error("filter worker mailbox closed")]
	MailboxClosed,
}

impl From<WorkerError> for EngineError {
	fn from(err: WorkerError) -> Self {
		match err {
			WorkerError::NotInitialized => Self::NotInitialized,
			WorkerError::Superseded { generation, latest } => Self::Superseded { generation, latest },
			WorkerError::Handler(message) => Self::Handler(message),
		}
	}
}

impl EngineError {
	/// Superseded requests are expected under rapid input; callers usually
	/// drop them silently.
	pub fn is_superseded(&self) -> bool {
		matches!(self, Self::Superseded { .. })
	}
}
