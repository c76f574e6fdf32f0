use std::collections::BTreeMap;

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, TraitValue};
use crate::index::TraitIndex;
use crate::seed::{Position, SeedStore};
use crate::selection::FilterSelection;

/// How per-value facet counts relate to the active selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountMode {
	/// Count over the fully intersected match set, own dimension included.
	/// Selecting a value collapses that dimension's counts to the selected
	/// values.
	#[default]
	Intersected,
	/// Count each dimension against the intersection of the *other*
	/// dimensions' constraints, so sibling values keep their counts.
	ExcludeOwnFacet,
}

/// Per dimension, trait value → number of matching Nouns. Zero counts are
/// omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetCounts {
	pub background: BTreeMap<TraitValue, u32>,
	pub body: BTreeMap<TraitValue, u32>,
	pub accessory: BTreeMap<TraitValue, u32>,
	pub head: BTreeMap<TraitValue, u32>,
	pub glasses: BTreeMap<TraitValue, u32>,
}

impl FacetCounts {
	pub fn get(&self, dim: Dimension) -> &BTreeMap<TraitValue, u32> {
		match dim {
			Dimension::Background => &self.background,
			Dimension::Body => &self.body,
			Dimension::Accessory => &self.accessory,
			Dimension::Head => &self.head,
			Dimension::Glasses => &self.glasses,
		}
	}

	pub fn get_mut(&mut self, dim: Dimension) -> &mut BTreeMap<TraitValue, u32> {
		match dim {
			Dimension::Background => &mut self.background,
			Dimension::Body => &mut self.body,
			Dimension::Accessory => &mut self.accessory,
			Dimension::Head => &mut self.head,
			Dimension::Glasses => &mut self.glasses,
		}
	}

	/// Count for one value, zero when absent.
	pub fn count(&self, dim: Dimension, value: TraitValue) -> u32 {
		self.get(dim).get(&value).copied().unwrap_or(0)
	}
}

/// Totals and counts without the match list; the reply to `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetSummary {
	pub total: u32,
	pub counts: FacetCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResult {
	pub total: u32,
	pub counts: FacetCounts,
	/// Matching positions, ascending. Consumers must not rely on the order.
	pub matching_indices: Vec<Position>,
	/// Noun ids of `matching_indices`, element for element.
	pub matching_noun_ids: Vec<String>,
}

impl FilterResult {
	pub fn summary(&self) -> FacetSummary {
		FacetSummary {
			total: self.total,
			counts: self.counts.clone(),
		}
	}
}

/// Evaluates selections against one store and its index.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
	store: &'a SeedStore,
	index: &'a TraitIndex,
	mode: CountMode,
}

impl<'a> Evaluator<'a> {
	pub fn new(store: &'a SeedStore, index: &'a TraitIndex) -> Self {
		Self {
			store,
			index,
			mode: CountMode::default(),
		}
	}

	#[must_use]
	pub fn with_mode(mut self, mode: CountMode) -> Self {
		self.mode = mode;
		self
	}

	pub fn mode(&self) -> CountMode {
		self.mode
	}

	pub fn evaluate(&self, selection: &FilterSelection) -> FilterResult {
		let unions = self.unions(selection);
		let matches = intersect(unions.iter().flatten(), || self.index.universe());
		let counts = match self.mode {
			CountMode::Intersected => self.count_over(&matches, |_| &matches),
			CountMode::ExcludeOwnFacet => {
				let relaxed: [Option<RoaringBitmap>; Dimension::COUNT] = Dimension::ALL.map(|dim| {
					unions[dim.slot()]
						.as_ref()
						.map(|_| intersect(others(&unions, dim), || self.index.universe()))
				});
				self.count_over(&matches, |dim| relaxed[dim.slot()].as_ref().unwrap_or(&matches))
			}
		};

		let matching_indices: Vec<Position> = matches.iter().collect();
		let matching_noun_ids = matching_indices
			.iter()
			.filter_map(|&pos| self.store.id(pos).map(str::to_owned))
			.collect();

		tracing::trace!(
			total = matches.len(),
			constrained = unions.iter().flatten().count(),
			mode = ?self.mode,
			"filter.evaluate"
		);

		FilterResult {
			total: matches.len() as u32,
			counts,
			matching_indices,
			matching_noun_ids,
		}
	}

	/// Positions matching `selection`, without counts.
	pub fn matches(&self, selection: &FilterSelection) -> RoaringBitmap {
		intersect(self.unions(selection).iter().flatten(), || self.index.universe())
	}

	/// Counts for the unfiltered collection.
	pub fn summary(&self) -> FacetSummary {
		self.evaluate(&FilterSelection::default()).summary()
	}

	/// OR of the selected buckets per constrained dimension; `None` where
	/// the dimension is unconstrained. Values without a bucket add nothing.
	fn unions(&self, selection: &FilterSelection) -> [Option<RoaringBitmap>; Dimension::COUNT] {
		Dimension::ALL.map(|dim| {
			let values = selection.get(dim);
			if values.is_empty() {
				return None;
			}
			let mut union = RoaringBitmap::new();
			for &value in values {
				if let Some(bucket) = self.index.bucket(dim, value) {
					union |= bucket;
				}
			}
			Some(union)
		})
	}

	fn count_over<'b>(&self, matches: &'b RoaringBitmap, base: impl Fn(Dimension) -> &'b RoaringBitmap) -> FacetCounts {
		let mut counts = FacetCounts::default();
		if matches.is_empty() && self.mode == CountMode::Intersected {
			return counts;
		}
		for dim in Dimension::ALL {
			let against = base(dim);
			let slot = counts.get_mut(dim);
			for (value, bucket) in self.index.values(dim) {
				let n = bucket.intersection_len(against);
				if n > 0 {
					slot.insert(value, n as u32);
				}
			}
		}
		counts
	}
}

fn others<'a>(unions: &'a [Option<RoaringBitmap>; Dimension::COUNT], skip: Dimension) -> impl Iterator<Item = &'a RoaringBitmap> {
	unions
		.iter()
		.enumerate()
		.filter(move |(slot, _)| *slot != skip.slot())
		.filter_map(|(_, union)| union.as_ref())
}

/// AND of `sets`, smallest first with an early exit on empty. With no sets
/// the result is `universe()`.
fn intersect<'a>(sets: impl Iterator<Item = &'a RoaringBitmap>, universe: impl FnOnce() -> RoaringBitmap) -> RoaringBitmap {
	let mut sets: Vec<&RoaringBitmap> = sets.collect();
	sets.sort_by_key(|set| set.len());
	let Some((first, rest)) = sets.split_first() else {
		return universe();
	};
	let mut acc = (*first).clone();
	for set in rest {
		if acc.is_empty() {
			break;
		}
		acc &= *set;
	}
	acc
}
