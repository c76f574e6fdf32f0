use std::cmp::Ordering;

use indexmap::IndexMap;
use lilnouns_engine::{FeedConfig, FilterResult, SortOrder};
use rustc_hash::FxHashSet;
use tokio::sync::watch;

use crate::source::{DetailRecord, DetailSource, FetchError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
	#[error(transparent)]
	Fetch(#[from] FetchError),
}

/// Snapshot published to [`NounFeed::subscribe`] observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedState {
	pub loading: bool,
	/// Match count reported by the evaluator.
	pub total: u32,
	/// Ids covered by the pages fetched so far.
	pub loaded: usize,
	pub has_more: bool,
}

/// Pages detail records for the current filter result.
///
/// The id list is sorted by numeric Noun id and deduplicated once per result.
/// Pages are fetched `batch_size` ids at a time and merged into a keyed
/// cache; entries already cached are never replaced or repeated, so
/// [`entities`](Self::entities) only grows until the next result arrives.
///
/// A failed fetch commits nothing: ids, cache and offset stay as they were,
/// the loading flag is cleared, and the error is returned so the caller can
/// retry.
pub struct NounFeed<S: DetailSource> {
	source: S,
	batch_size: usize,
	order: SortOrder,
	total: u32,
	ids: Vec<String>,
	offset: usize,
	cache: IndexMap<String, S::Record>,
	/// Also the source of truth for the loading flag.
	state: watch::Sender<FeedState>,
}

impl<S: DetailSource> NounFeed<S> {
	pub fn new(source: S, config: &FeedConfig) -> Self {
		let (state, _) = watch::channel(FeedState::default());
		Self {
			source,
			batch_size: config.batch_size.max(1),
			order: config.order,
			total: 0,
			ids: Vec::new(),
			offset: 0,
			cache: IndexMap::new(),
			state,
		}
	}

	/// Replaces the id list with `result`'s matches and fetches the first page.
	pub async fn set_result(&mut self, result: &FilterResult) -> Result<(), FeedError> {
		let ids = sorted_ids(&result.matching_noun_ids, self.order);
		let first_page = self.fetch(&ids[..self.batch_size.min(ids.len())]).await?;

		self.cache.clear();
		self.merge(first_page);
		self.ids = ids;
		self.total = result.total;
		self.offset = 0;
		self.publish();
		tracing::debug!(total = self.total, ids = self.ids.len(), cached = self.cache.len(), "feed.reset");
		Ok(())
	}

	/// Fetches the next page. Returns how many entities became visible; zero
	/// when there is nothing left.
	pub async fn load_more(&mut self) -> Result<usize, FeedError> {
		if !self.has_more() {
			return Ok(0);
		}
		let before = self.visible_len();
		let next = self.offset + self.batch_size;
		let end = (next + self.batch_size).min(self.ids.len());

		let missing: Vec<String> = self.ids[next..end]
			.iter()
			.filter(|id| !self.cache.contains_key(id.as_str()))
			.cloned()
			.collect();
		let page = self.fetch(&missing).await?;

		self.merge(page);
		self.offset = next;
		self.publish();
		let added = self.visible_len() - before;
		tracing::debug!(offset = self.offset, added, "feed.load_more");
		Ok(added)
	}

	/// Re-sorts the current ids and reloads from the first page. Cached
	/// records are reused.
	pub async fn set_order(&mut self, order: SortOrder) -> Result<(), FeedError> {
		if order == self.order {
			return Ok(());
		}
		let ids = sorted_ids(&self.ids, order);
		let end = self.batch_size.min(ids.len());
		let missing: Vec<String> = ids[..end].iter().filter(|id| !self.cache.contains_key(id.as_str())).cloned().collect();
		let page = self.fetch(&missing).await?;

		self.merge(page);
		self.ids = ids;
		self.order = order;
		self.offset = 0;
		self.publish();
		Ok(())
	}

	/// Fetched entities in id order, up to the current page.
	pub fn entities(&self) -> Vec<&S::Record> {
		self.ids[..self.window_end()].iter().filter_map(|id| self.cache.get(id.as_str())).collect()
	}

	pub fn has_more(&self) -> bool {
		self.offset + self.batch_size < self.ids.len()
	}

	pub fn is_loading(&self) -> bool {
		self.state.borrow().loading
	}

	/// Match count from the evaluator, independent of how much is fetched.
	pub fn total(&self) -> u32 {
		self.total
	}

	/// Start of the most recently fetched page.
	pub fn offset(&self) -> usize {
		self.offset
	}

	pub fn batch_size(&self) -> usize {
		self.batch_size
	}

	pub fn order(&self) -> SortOrder {
		self.order
	}

	/// Sorted, deduplicated ids of the current result.
	pub fn ids(&self) -> &[String] {
		&self.ids
	}

	pub fn source(&self) -> &S {
		&self.source
	}

	pub fn state(&self) -> FeedState {
		*self.state.borrow()
	}

	pub fn subscribe(&self) -> watch::Receiver<FeedState> {
		self.state.subscribe()
	}

	fn window_end(&self) -> usize {
		if self.ids.is_empty() { 0 } else { (self.offset + self.batch_size).min(self.ids.len()) }
	}

	fn visible_len(&self) -> usize {
		self.ids[..self.window_end()].iter().filter(|id| self.cache.contains_key(id.as_str())).count()
	}

	async fn fetch(&self, ids: &[String]) -> Result<Vec<S::Record>, FeedError> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}
		let loading = Loading::start(&self.state);
		let fetched = self.source.fetch_details(ids).await;
		drop(loading);

		match fetched {
			Ok(records) => {
				if records.len() < ids.len() {
					tracing::debug!(requested = ids.len(), returned = records.len(), "feed.fetch.partial");
				}
				Ok(records)
			}
			Err(err) => {
				tracing::error!(error = %err, requested = ids.len(), "feed.fetch.failed");
				Err(err.into())
			}
		}
	}

	fn merge(&mut self, records: Vec<S::Record>) {
		for record in records {
			if !self.cache.contains_key(record.id()) {
				self.cache.insert(record.id().to_owned(), record);
			}
		}
	}

	fn publish(&self) {
		let (total, loaded, has_more) = (self.total, self.window_end(), self.has_more());
		self.state.send_if_modified(|current| {
			let snapshot = FeedState {
				loading: current.loading,
				total,
				loaded,
				has_more,
			};
			if *current == snapshot {
				return false;
			}
			*current = snapshot;
			true
		});
	}
}

/// Raises the published loading flag for as long as it lives, so a fetch
/// whose future is dropped mid-flight still clears it.
struct Loading<'a>(&'a watch::Sender<FeedState>);

impl<'a> Loading<'a> {
	fn start(state: &'a watch::Sender<FeedState>) -> Self {
		state.send_if_modified(|current| !std::mem::replace(&mut current.loading, true));
		Self(state)
	}
}

impl Drop for Loading<'_> {
	fn drop(&mut self) {
		self.0.send_if_modified(|current| std::mem::replace(&mut current.loading, false));
	}
}

/// Numeric ids sort by value in `order`. Anything else comes after every
/// numeric id in either order, lexically ascending.
fn compare_ids(a: &str, b: &str, order: SortOrder) -> Ordering {
	match (a.parse::<u64>(), b.parse::<u64>()) {
		(Ok(x), Ok(y)) => match order {
			SortOrder::Oldest => x.cmp(&y),
			SortOrder::Newest => y.cmp(&x),
		},
		(Ok(_), Err(_)) => Ordering::Less,
		(Err(_), Ok(_)) => Ordering::Greater,
		(Err(_), Err(_)) => a.cmp(b),
	}
}

fn sorted_ids(ids: &[String], order: SortOrder) -> Vec<String> {
	let mut seen = FxHashSet::default();
	let mut sorted: Vec<String> = ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect();
	sorted.sort_by(|a, b| compare_ids(a, b, order));
	sorted
}
