use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lilnouns_traits::{CountMode, FacetSummary, FilterResult, FilterSelection, NounSeed};
use lilnouns_worker::{ActorEvents, ActorExitReceiver, ActorHandle, ActorSpec, ShutdownReport, TaskClass, WorkerActor, spawn_supervised_actor};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::pending::{PendingTable, Reply};
use crate::protocol::{EngineRequest, EngineResponse, Generation, RequestBody, RequestId, ResponseBody};
use crate::worker::FilterWorker;

/// Client handle for one filter worker.
///
/// Requests are correlated by id through a pending table; a router task
/// resolves them from the worker's response stream. `apply_filters` calls are
/// stamped with a generation, and only the newest delivered generation can
/// succeed: older calls still in flight resolve to [`EngineError::Superseded`].
///
/// Dropping the engine is equivalent to [`destroy`](Self::destroy).
pub struct FilterEngine {
	actor: ActorHandle<EngineRequest>,
	pending: Arc<PendingTable>,
	next_id: AtomicU64,
	next_generation: AtomicU64,
	/// Newest generation that reached the worker mailbox. Shared with the
	/// worker and the router.
	latest: Arc<AtomicU64>,
	router: JoinHandle<()>,
	count_mode: CountMode,
}

impl FilterEngine {
	/// Starts the worker and its router. Uses the ambient tokio runtime, or
	/// the shared fallback runtime outside one.
	pub fn spawn(config: &EngineConfig) -> Self {
		let latest = Arc::new(AtomicU64::new(0));
		let mode = config.count_mode;
		let worker = FilterWorker::new(mode, Arc::clone(&latest));
		let spec = ActorSpec::new("filter-worker", TaskClass::Interactive, worker).mailbox_capacity(config.mailbox_capacity);
		Self::start(spec, latest, mode)
	}

	pub(crate) fn start<A>(spec: ActorSpec<A>, latest: Arc<AtomicU64>, count_mode: CountMode) -> Self
	where
		A: WorkerActor<Cmd = EngineRequest, Evt = EngineResponse>,
	{
		let (actor, events) = spawn_supervised_actor(spec);
		let pending = Arc::new(PendingTable::default());
		let router = lilnouns_worker::spawn(
			TaskClass::Background,
			route(events, actor.watch_exit(), Arc::clone(&pending), Arc::clone(&latest)),
		);
		tracing::debug!(actor = actor.name(), ?count_mode, "filter.engine.spawn");

		Self {
			actor,
			pending,
			next_id: AtomicU64::new(1),
			next_generation: AtomicU64::new(0),
			latest,
			router,
			count_mode,
		}
	}

/// Loads `nouns` into the worker, replacing any previous collection, and
	/// returns the unfiltered totals.
	pub async fn initialize(&self, nouns: Vec<NounSeed>) -> Result<FacetSummary, EngineError> {
		match self.request(RequestBody::Initialize { nouns }).await? {
			(_, ResponseBody::Initialized(summary)) => Ok(summary),
			(id, ResponseBody::Filtered { .. }) => Err(EngineError::UnexpectedResponse { id }),
		}
	}

	/// Evaluates `selection`. Once delivered to the worker it supersedes every
	/// earlier unresolved call.
	pub async fn apply_filters(&self, selection: FilterSelection) -> Result<FilterResult, EngineError> {
		let generation = self.next_generation.fetch_add(1, Ordering::AcqRel) + 1;
		match self.request(RequestBody::ApplyFilters { generation, selection }).await? {
			(_, ResponseBody::Filtered { result, .. }) => Ok(Arc::unwrap_or_clone(result)),
			(id, ResponseBody::Initialized(_)) => Err(EngineError::UnexpectedResponse { id }),
		}
	}

	/// Stops the worker and rejects every pending request with
	/// [`EngineError::Destroyed`]. Idempotent.
	pub fn destroy(&self) {
		let rejected = self.pending.close(EngineError::Destroyed);
		self.actor.cancel();
		self.router.abort();
		tracing::debug!(rejected, "filter.engine.destroy");
	}

	/// Lets the worker finish queued requests, then stops it. Requests still
	/// unresolved after `timeout` are rejected when the engine drops.
	pub async fn shutdown(mut self, timeout: Duration) -> ShutdownReport {
		let report = self.actor.shutdown_graceful_or_force(timeout).await;
		// The router exits after delivering everything the worker emitted.
		if tokio::time::timeout(timeout, &mut self.router).await.is_err() {
			tracing::warn!("filter.engine.router_timeout");
		}
		report
	}

	/// Requests registered and not yet resolved.
	pub fn pending_requests(&self) -> usize {
		self.pending.len()
	}

	/// Generation of the newest `apply_filters` call delivered to the
	/// worker, zero before the first. Calls abandoned before delivery do not
	/// count.
	pub fn latest_generation(&self) -> Generation {
		self.latest.load(Ordering::Acquire)
	}

	pub fn count_mode(&self) -> CountMode {
		self.count_mode
	}

	/// True once destroyed, shut down, or after the worker failed.
	pub fn is_closed(&self) -> bool {
		self.pending.closed().is_some()
	}

	async fn request(&self, body: RequestBody) -> Result<(RequestId, ResponseBody), EngineError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let kind = body.kind();
		let generation = body.generation();
		let mut reply = self.pending.register(id)?;
		let _entry = PendingEntry {
			pending: &self.pending,
			id,
		};
		tracing::trace!(id, kind, "filter.engine.request");

		// A dead worker with a full mailbox would park `send` forever; the
		// router rejects the waiter in that case.
		tokio::select! {
			sent = self.actor.send(EngineRequest { id, body }) => {
				if sent.is_err() {
					return Err(self.pending.closed().unwrap_or(EngineError::MailboxClosed));
				}
			}
			early = &mut reply => return flatten(id, early),
		}
		if let Some(generation) = generation {
			self.latest.fetch_max(generation, Ordering::AcqRel);
		}
		flatten(id, reply.await)
	}
}

/// Removes a pending entry when its request future ends, including when the
/// caller drops it mid-flight. Resolved entries are already gone.
struct PendingEntry<'a> {
	pending: &'a PendingTable,
	id: RequestId,
}

impl Drop for PendingEntry<'_> {
	fn drop(&mut self) {
		if self.pending.take(self.id).is_some() {
			tracing::trace!(id = self.id, "filter.engine.request_abandoned");
		}
	}
}

impl Drop for FilterEngine {
	fn drop(&mut self) {
		self.destroy();
	}
}

fn flatten(id: RequestId, reply: Result<Reply, oneshot::error::RecvError>) -> Result<(RequestId, ResponseBody), EngineError> {
	match reply {
		Ok(Ok(body)) => Ok((id, body)),
		Ok(Err(err)) => Err(err),
		// Sender dropped without a reply: only happens when the table is torn down.
		Err(_) => Err(EngineError::Destroyed),
	}
}

/// Resolves pending requests from worker responses until the worker is gone.
async fn route(mut events: ActorEvents<EngineResponse>, exit: ActorExitReceiver, pending: Arc<PendingTable>, latest: Arc<AtomicU64>) {
	while let Some(response) = events.recv().await {
		deliver(&pending, &latest, response);
	}

	// The stream ends only after the exit is published.
	let exit = exit.borrow().clone();
	let reason = match &exit {
		Some(exit) if exit.is_failure() => {
			tracing::error!(%exit, "filter.engine.worker_failed");
			EngineError::WorkerFailed(exit.to_string())
		}
		_ => EngineError::Destroyed,
	};
	let rejected = pending.close(reason);
	tracing::debug!(exit = ?exit, rejected, "filter.engine.router_exit");
}

fn deliver(pending: &PendingTable, latest: &AtomicU64, response: EngineResponse) {
	let EngineResponse { id, body } = response;
	let Some(tx) = pending.take(id) else {
		tracing::debug!(id, "filter.engine.unknown_response");
		return;
	};

	let newest = latest.load(Ordering::Acquire);
	let reply = match body {
		Ok(ResponseBody::Filtered { generation, .. }) if generation < newest => {
			tracing::debug!(id, generation, latest = newest, "filter.engine.drop_stale");
			Err(EngineError::Superseded { generation, latest: newest })
		}
		Ok(body) => Ok(body),
		Err(err) => Err(err.into()),
	};
	if tx.send(reply).is_err() {
		tracing::trace!(id, "filter.engine.caller_gone");
	}
}
