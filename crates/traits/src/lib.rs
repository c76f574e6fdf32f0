//! Trait filtering core for the Lil Nouns collection.
//!
//! Data flows leaf to root:
//! * [`SeedStore`]: packed `u16` trait tuples, five per Noun, in load order
//! * [`TraitIndex`]: per dimension, trait value → [`RoaringBitmap`](roaring::RoaringBitmap) of positions
//! * [`Evaluator`]: OR within a dimension, AND across dimensions, plus
//!   disjunctive [`FacetCounts`]
//!
//! [`IndexedCollection`] bundles a store with its index, which is what the
//! engine's worker owns.

mod collection;
mod dimension;
mod evaluate;
mod index;
mod seed;
mod selection;

pub use collection::IndexedCollection;
pub use dimension::{Dimension, TraitValue, UnknownDimension};
pub use evaluate::{CountMode, Evaluator, FacetCounts, FacetSummary, FilterResult};
pub use index::TraitIndex;
pub use seed::{NounSeed, Position, SeedError, SeedStore};
pub use selection::FilterSelection;
