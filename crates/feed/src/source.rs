use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use lilnouns_traits::NounSeed;
use rustc_hash::FxHashMap;

/// A detail record the feed can key by Noun id.
pub trait DetailRecord: Clone + Send + Sync + 'static {
	fn id(&self) -> &str;
}

impl DetailRecord for NounSeed {
	fn id(&self) -> &str {
		&self.id
	}
}

/// The detail collaborator failed; nothing was returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("detail fetch failed: {message}")]
pub struct FetchError {
	message: String,
}

impl FetchError {
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

/// Fetches detail records for a batch of Noun ids.
///
/// Records may come back in any order, and ids unknown upstream may simply
/// be missing.
#[async_trait]
pub trait DetailSource: Send + Sync {
	type Record: DetailRecord;

	async fn fetch_details(&self, ids: &[String]) -> Result<Vec<Self::Record>, FetchError>;
}

#[async_trait]
impl<S: DetailSource + ?Sized> DetailSource for Arc<S> {
	type Record = S::Record;

	async fn fetch_details(&self, ids: &[String]) -> Result<Vec<Self::Record>, FetchError> {
		(**self).fetch_details(ids).await
	}
}

/// Detail source backed by a map, for offline use and tests.
///
/// Counts fetches and requested ids, and can be switched into a failing mode.
pub struct MemorySource<R> {
	records: FxHashMap<String, R>,
	fetches: AtomicUsize,
	requested: AtomicUsize,
	failing: AtomicBool,
}

impl<R: DetailRecord> MemorySource<R> {
	pub fn new(records: impl IntoIterator<Item = R>) -> Self {
		Self {
			records: records.into_iter().map(|record| (record.id().to_owned(), record)).collect(),
			fetches: AtomicUsize::new(0),
			requested: AtomicUsize::new(0),
			failing: AtomicBool::new(false),
		}
	}

	pub fn set_failing(&self, failing: bool) {
		self.failing.store(failing, Ordering::SeqCst);
	}

	/// Successful and failed calls to `fetch_details`.
	pub fn fetches(&self) -> usize {
		self.fetches.load(Ordering::SeqCst)
	}

	/// Ids asked for across all calls.
	pub fn requested(&self) -> usize {
		self.requested.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl<R: DetailRecord> DetailSource for MemorySource<R> {
	type Record = R;

	async fn fetch_details(&self, ids: &[String]) -> Result<Vec<R>, FetchError> {
		self.fetches.fetch_add(1, Ordering::SeqCst);
		self.requested.fetch_add(ids.len(), Ordering::SeqCst);
		if self.failing.load(Ordering::SeqCst) {
			return Err(FetchError::new("memory source set to fail"));
		}
		Ok(ids.iter().filter_map(|id| self.records.get(id).cloned()).collect())
	}
}
