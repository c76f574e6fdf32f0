use std::any::Any;
use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::{JoinError, JoinHandle};

use crate::TaskClass;

/// Runtime used when the filter engine is created outside any tokio context,
/// for example from a synchronous test or a plain `main`.
static DETACHED: OnceLock<Runtime> = OnceLock::new();

fn current_or_detached() -> Handle {
	Handle::try_current().unwrap_or_else(|_| {
		DETACHED
			.get_or_init(|| {
				Builder::new_multi_thread()
					.worker_threads(2)
					.thread_name("lilnouns-filter")
					.enable_all()
					.build()
					.expect("building the detached filter runtime")
			})
			.handle()
			.clone()
	})
}

/// Spawns `fut` on the current runtime, tagging the trace with its class.
pub fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(%class, "worker.task.spawn");
	current_or_detached().spawn(fut)
}

/// Runs `work` on the blocking pool. Used for index builds, which would
/// otherwise stall the runtime thread the actor lives on.
pub fn spawn_blocking<F, R>(class: TaskClass, work: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(%class, "worker.task.spawn_blocking");
	current_or_detached().spawn_blocking(work)
}

/// Describes a failed join: the panic message when the task panicked,
/// otherwise the join error itself.
pub fn join_failure(err: JoinError) -> String {
	if !err.is_panic() {
		return err.to_string();
	}
	panic_message(err.into_panic()).unwrap_or_else(|| "task panicked".to_string())
}

fn panic_message(payload: Box<dyn Any + Send>) -> Option<String> {
	match payload.downcast::<String>() {
		Ok(message) => Some(*message),
		Err(payload) => payload.downcast_ref::<&str>().map(|message| (*message).to_string()),
	}
}
