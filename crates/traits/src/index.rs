use std::time::Instant;

use roaring::RoaringBitmap;

use crate::dimension::{Dimension, TraitValue};
use crate::seed::{Position, SeedStore};

/// Inverted index: dimension × trait value → bitmap of seed store positions.
///
/// Each dimension holds a dense `Vec` addressed by trait value. Buckets are
/// created the first time a value is seen; there is no fixed universe of
/// legal values. Every position lands in exactly one bucket per dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraitIndex {
	entity_count: u32,
	buckets: [Vec<RoaringBitmap>; Dimension::COUNT],
}

impl TraitIndex {
	/// Builds the index in one pass over the store.
	pub fn build(store: &SeedStore) -> Self {
		let started = Instant::now();
		let mut index = Self::default();

		for (pos, record) in store.seeds().chunks_exact(SeedStore::STRIDE).enumerate() {
			let pos = pos as Position;
			for (buckets, &value) in index.buckets.iter_mut().zip(record) {
				let slot = value as usize;
				if slot >= buckets.len() {
					buckets.resize_with(slot + 1, RoaringBitmap::new);
				}
				// Positions arrive ascending, so `push` always appends.
				buckets[slot].push(pos);
			}
		}
		index.entity_count = store.len() as u32;

		tracing::debug!(
			entities = index.entity_count,
			buckets = index.bucket_count(),
			elapsed_us = started.elapsed().as_micros() as u64,
			"filter.index.build"
		);
		index
	}

	pub fn entity_count(&self) -> u32 {
		self.entity_count
	}

	/// Positions holding `value` in `dim`, or `None` if no Noun has it.
	pub fn bucket(&self, dim: Dimension, value: TraitValue) -> Option<&RoaringBitmap> {
		self.buckets[dim.slot()].get(value as usize).filter(|bucket| !bucket.is_empty())
	}

	/// Non-empty buckets of `dim`, ascending by trait value.
	pub fn values(&self, dim: Dimension) -> impl Iterator<Item = (TraitValue, &RoaringBitmap)> + '_ {
		self.buckets[dim.slot()]
			.iter()
			.enumerate()
			.filter(|(_, bucket)| !bucket.is_empty())
			.map(|(value, bucket)| (value as TraitValue, bucket))
	}

	/// Number of non-empty buckets across all dimensions.
	pub fn bucket_count(&self) -> usize {
		Dimension::ALL.into_iter().map(|dim| self.values(dim).count()).sum()
	}

	/// Every position, `0..entity_count`.
	pub fn universe(&self) -> RoaringBitmap {
		let mut all = RoaringBitmap::new();
		all.insert_range(0..self.entity_count);
		all
	}
}
