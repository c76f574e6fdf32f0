//! Algebraic properties of the index and evaluator over random collections.

use std::collections::BTreeSet;

use lilnouns_traits::{CountMode, Dimension, FilterSelection, IndexedCollection, NounSeed, Position, TraitValue};
use proptest::prelude::*;

/// Small value ranges so selections regularly hit and miss.
fn arb_nouns() -> impl Strategy<Value = Vec<NounSeed>> {
	prop::collection::vec(prop::array::uniform5(0u16..6), 0..80).prop_map(|rows| {
		rows.into_iter()
			.enumerate()
			.map(|(i, traits)| NounSeed::new(i.to_string(), traits))
			.collect()
	})
}

fn arb_dimension() -> impl Strategy<Value = Dimension> {
	prop::sample::select(Dimension::ALL.to_vec())
}

fn arb_selection() -> impl Strategy<Value = FilterSelection> {
	prop::collection::vec((arb_dimension(), 0u16..7), 0..6).prop_map(|picks| {
		let mut selection = FilterSelection::new();
		for (dim, value) in picks {
			selection.add(dim, value);
		}
		selection
	})
}

fn positions(collection: &IndexedCollection, selection: &FilterSelection) -> BTreeSet<Position> {
	collection
		.evaluate(selection, CountMode::Intersected)
		.matching_indices
		.into_iter()
		.collect()
}

/// Brute-force reference: scan every record.
fn scan(nouns: &[NounSeed], selection: &FilterSelection) -> BTreeSet<Position> {
	nouns
		.iter()
		.enumerate()
		.filter(|(_, noun)| selection.constrained().all(|(dim, values)| values.contains(&noun.get(dim))))
		.map(|(pos, _)| pos as Position)
		.collect()
}

proptest! {
	#[test]
	fn buckets_cover_every_entity_once(nouns in arb_nouns()) {
		let collection = IndexedCollection::from_nouns(&nouns);
		for dim in Dimension::ALL {
			let covered: u64 = collection.index().values(dim).map(|(_, bucket)| bucket.len()).sum();
			prop_assert_eq!(covered, nouns.len() as u64, "{} coverage", dim);
		}
	}

	#[test]
	fn evaluation_is_idempotent(nouns in arb_nouns(), selection in arb_selection()) {
		let collection = IndexedCollection::from_nouns(&nouns);
		for mode in [CountMode::Intersected, CountMode::ExcludeOwnFacet] {
			let first = collection.evaluate(&selection, mode);
			let second = collection.evaluate(&selection, mode);
			prop_assert_eq!(first, second);
		}
	}

	#[test]
	fn empty_selection_matches_everything(nouns in arb_nouns()) {
		let collection = IndexedCollection::from_nouns(&nouns);
		let result = collection.evaluate(&FilterSelection::new(), CountMode::Intersected);
		prop_assert_eq!(result.total as usize, nouns.len());
		prop_assert_eq!(result.matching_indices, (0..nouns.len() as Position).collect::<Vec<_>>());
	}

	#[test]
	fn values_within_a_dimension_union(nouns in arb_nouns(), a in 0u16..6, b in 0u16..6) {
		prop_assume!(a != b);
		let collection = IndexedCollection::from_nouns(&nouns);
		let only_a = positions(&collection, &FilterSelection::new().with(Dimension::Background, [a]));
		let only_b = positions(&collection, &FilterSelection::new().with(Dimension::Background, [b]));
		let both = positions(&collection, &FilterSelection::new().with(Dimension::Background, [a, b]));

		prop_assert!(only_a.is_disjoint(&only_b));
		prop_assert_eq!(both, only_a.union(&only_b).copied().collect::<BTreeSet<_>>());
	}

	#[test]
	fn dimensions_intersect(nouns in arb_nouns(), a in 0u16..6, b in 0u16..6) {
		let collection = IndexedCollection::from_nouns(&nouns);
		let by_background = positions(&collection, &FilterSelection::new().with(Dimension::Background, [a]));
		let by_body = positions(&collection, &FilterSelection::new().with(Dimension::Body, [b]));
		let combined = positions(
			&collection,
			&FilterSelection::new().with(Dimension::Background, [a]).with(Dimension::Body, [b]),
		);
		prop_assert_eq!(combined, by_background.intersection(&by_body).copied().collect::<BTreeSet<_>>());
	}

	#[test]
	fn unseen_value_empties_the_result(nouns in arb_nouns(), selection in arb_selection(), dim in arb_dimension()) {
		let collection = IndexedCollection::from_nouns(&nouns);
		let unseen: TraitValue = 500;
		let result = collection.evaluate(&selection.with(dim, [unseen]), CountMode::Intersected);
		prop_assert_eq!(result.total, 0);
		prop_assert!(result.matching_noun_ids.is_empty());
	}

	#[test]
	fn matches_agree_with_a_linear_scan(nouns in arb_nouns(), selection in arb_selection()) {
		let collection = IndexedCollection::from_nouns(&nouns);
		prop_assert_eq!(positions(&collection, &selection), scan(&nouns, &selection));
	}

	#[test]
	fn intersected_counts_sum_to_total(nouns in arb_nouns(), selection in arb_selection()) {
		let collection = IndexedCollection::from_nouns(&nouns);
		let result = collection.evaluate(&selection, CountMode::Intersected);
		for dim in Dimension::ALL {
			let sum: u32 = result.counts.get(dim).values().sum();
			prop_assert_eq!(sum, result.total, "{} counts", dim);
		}
	}

	#[test]
	fn exclude_own_facet_counts_relax_only_their_dimension(nouns in arb_nouns(), selection in arb_selection(), dim in arb_dimension()) {
		let collection = IndexedCollection::from_nouns(&nouns);
		let result = collection.evaluate(&selection, CountMode::ExcludeOwnFacet);
		let mut relaxed = selection.clone();
		relaxed.clear(dim);
		for (value, &count) in result.counts.get(dim) {
			let expected = scan(&nouns, &relaxed.clone().with(dim, [*value])).len() as u32;
			prop_assert_eq!(count, expected, "{}={}", dim, value);
		}
	}
}
