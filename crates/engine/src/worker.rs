use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use lilnouns_traits::{CountMode, FacetSummary, FilterSelection, IndexedCollection, NounSeed};
use lilnouns_worker::{ActorContext, ActorFlow, TaskClass, WorkerActor, join_failure};

use crate::error::WorkerError;
use crate::protocol::{EngineRequest, EngineResponse, Generation, RequestBody, ResponseBody};

/// Owns the seed store and trait index. Nothing outside this actor touches
/// them; every query arrives through the mailbox.
pub(crate) struct FilterWorker {
	collection: Option<Arc<IndexedCollection>>,
	mode: CountMode,
	/// Newest generation delivered by the façade, shared so queued requests
	/// that are already stale can be skipped.
	latest: Arc<AtomicU64>,
}

/// Runs `work` on the blocking pool. A panic fails only the request that
/// triggered it.
pub(crate) async fn offload<F, R>(class: TaskClass, work: F) -> Result<R, WorkerError>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	lilnouns_worker::spawn_blocking(class, work)
		.await
		.map_err(|err| WorkerError::Handler(join_failure(err)))
}

impl FilterWorker {
	pub(crate) fn new(mode: CountMode, latest: Arc<AtomicU64>) -> Self {
		Self {
			collection: None,
			mode,
			latest,
		}
	}

	/// Builds a new index. On failure the previous collection stays loaded.
	async fn initialize(&mut self, nouns: Vec<NounSeed>) -> Result<FacetSummary, WorkerError> {
		let started = Instant::now();
		let mode = self.mode;
		let (collection, summary) = offload(TaskClass::CpuBlocking, move || {
			let collection = IndexedCollection::from_nouns(&nouns);
			let summary = collection.summary(mode);
			(collection, summary)
		})
		.await?;

		tracing::info!(
			entities = collection.len(),
			buckets = collection.index().bucket_count(),
			elapsed_ms = started.elapsed().as_millis() as u64,
			"filter.worker.initialize"
		);
		self.collection = Some(Arc::new(collection));
		Ok(summary)
	}

	async fn apply(&self, generation: Generation, selection: FilterSelection) -> Result<ResponseBody, WorkerError> {
		let latest = self.latest.load(Ordering::Acquire);
		if generation < latest {
			tracing::debug!(generation, latest, "filter.worker.skip_stale");
			return Err(WorkerError::Superseded { generation, latest });
		}
		let collection = Arc::clone(self.collection.as_ref().ok_or(WorkerError::NotInitialized)?);

		let started = Instant::now();
		let mode = self.mode;
		let result = offload(TaskClass::Interactive, move || collection.evaluate(&selection, mode)).await?;
		tracing::debug!(
			generation,
			total = result.total,
			elapsed_us = started.elapsed().as_micros() as u64,
			"filter.worker.evaluate"
		);
		Ok(ResponseBody::Filtered {
			generation,
			result: Arc::new(result),
		})
	}
}

#[async_trait]
impl WorkerActor for FilterWorker {
	type Cmd = EngineRequest;
	type Evt = EngineResponse;

	async fn handle(&mut self, cmd: Self::Cmd, ctx: &mut ActorContext<Self::Evt>) -> Result<ActorFlow, String> {
		let EngineRequest { id, body } = cmd;
		tracing::trace!(id, kind = body.kind(), "filter.worker.request");

		let body = match body {
			RequestBody::Initialize { nouns } => self.initialize(nouns).await.map(ResponseBody::Initialized),
			RequestBody::ApplyFilters { generation, selection } => self.apply(generation, selection).await,
		};
		if let Err(err @ WorkerError::Handler(_)) = &body {
			tracing::warn!(id, %err, "filter.worker.request_failed");
		}

		if !ctx.emit(EngineResponse { id, body }) {
			tracing::debug!(id, "filter.worker.no_listener");
		}
		Ok(ActorFlow::Continue)
	}

	async fn on_stop(&mut self, _ctx: &mut ActorContext<Self::Evt>) {
		let entities = self.collection.take().map_or(0, |collection| collection.len());
		tracing::debug!(entities, "filter.worker.stop");
	}
}
