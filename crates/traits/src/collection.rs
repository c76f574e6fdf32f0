use crate::evaluate::{CountMode, Evaluator, FacetSummary, FilterResult};
use crate::index::TraitIndex;
use crate::seed::{NounSeed, SeedStore};
use crate::selection::FilterSelection;

/// A seed store together with the index built from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedCollection {
	store: SeedStore,
	index: TraitIndex,
}

impl IndexedCollection {
	pub fn from_nouns(nouns: &[NounSeed]) -> Self {
		Self::from_store(SeedStore::from_nouns(nouns))
	}

	pub fn from_store(store: SeedStore) -> Self {
		let index = TraitIndex::build(&store);
		Self { store, index }
	}

	pub fn store(&self) -> &SeedStore {
		&self.store
	}

	pub fn index(&self) -> &TraitIndex {
		&self.index
	}

	pub fn len(&self) -> usize {
		self.store.len()
	}

	pub fn is_empty(&self) -> bool {
		self.store.is_empty()
	}

	pub fn evaluator(&self, mode: CountMode) -> Evaluator<'_> {
		Evaluator::new(&self.store, &self.index).with_mode(mode)
	}

	pub fn evaluate(&self, selection: &FilterSelection, mode: CountMode) -> FilterResult {
		self.evaluator(mode).evaluate(selection)
	}

	pub fn summary(&self, mode: CountMode) -> FacetSummary {
		self.evaluator(mode).summary()
	}
}
