use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, TraitValue};

/// Index of a Noun inside the seed store (and every bitmap built from it).
pub type Position = u32;

/// Errors raised while reading one trait value from upstream data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
	#[error("trait value {0} does not fit in 16 bits")]
	OutOfRange(u64),
	#[error("trait value '{0}' is not a non-negative integer")]
	NotNumeric(String),
}

/// One Noun as delivered by the indexer: an opaque id plus its five traits.
///
/// Trait fields accept JSON numbers or numeric strings, since indexers encode
/// seeds as either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NounSeed {
	#[serde(deserialize_with = "noun_id")]
	pub id: String,
	#[serde(deserialize_with = "trait_value")]
	pub background: TraitValue,
	#[serde(deserialize_with = "trait_value")]
	pub body: TraitValue,
	#[serde(deserialize_with = "trait_value")]
	pub accessory: TraitValue,
	#[serde(deserialize_with = "trait_value")]
	pub head: TraitValue,
	#[serde(deserialize_with = "trait_value")]
	pub glasses: TraitValue,
}

impl NounSeed {
	pub fn new(id: impl Into<String>, traits: [TraitValue; Dimension::COUNT]) -> Self {
		let [background, body, accessory, head, glasses] = traits;
		Self {
			id: id.into(),
			background,
			body,
			accessory,
			head,
			glasses,
		}
	}

	pub fn get(&self, dim: Dimension) -> TraitValue {
		match dim {
			Dimension::Background => self.background,
			Dimension::Body => self.body,
			Dimension::Accessory => self.accessory,
			Dimension::Head => self.head,
			Dimension::Glasses => self.glasses,
		}
	}

	/// Trait values in packing order.
	pub fn traits(&self) -> [TraitValue; Dimension::COUNT] {
		Dimension::ALL.map(|dim| self.get(dim))
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
	Number(u64),
	Text(String),
}

fn parse_trait_value(raw: Numeric) -> Result<TraitValue, SeedError> {
	match raw {
		Numeric::Number(n) => TraitValue::try_from(n).map_err(|_| SeedError::OutOfRange(n)),
		Numeric::Text(text) => match text.trim().parse::<u64>() {
			Ok(n) => TraitValue::try_from(n).map_err(|_| SeedError::OutOfRange(n)),
			Err(_) => Err(SeedError::NotNumeric(text)),
		},
	}
}

fn trait_value<'de, D>(deserializer: D) -> Result<TraitValue, D::Error>
where
	D: Deserializer<'de>,
{
	parse_trait_value(Numeric::deserialize(deserializer)?).map_err(de::Error::custom)
}

fn noun_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Numeric::deserialize(deserializer)? {
		Numeric::Number(n) => n.to_string(),
		Numeric::Text(text) => text,
	})
}

/// Packed trait buffer: record `i` occupies `seeds[5i..5i + 5]` in
/// [`Dimension`] order, and `ids[i]` is its Noun id.
///
/// Built once per load and read-only afterwards. Values are packed as given;
/// range checks happen when upstream data is deserialized into [`NounSeed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedStore {
	ids: Vec<String>,
	seeds: Vec<TraitValue>,
}

impl SeedStore {
	pub const STRIDE: usize = Dimension::COUNT;

	/// Packs nouns in iteration order; that order becomes the position → id mapping.
	pub fn from_nouns<'a>(nouns: impl IntoIterator<Item = &'a NounSeed>) -> Self {
		let nouns = nouns.into_iter();
		let (lower, _) = nouns.size_hint();
		let mut ids = Vec::with_capacity(lower);
		let mut seeds = Vec::with_capacity(lower * Self::STRIDE);
		for noun in nouns {
			ids.push(noun.id.clone());
			seeds.extend_from_slice(&noun.traits());
		}
		debug_assert_eq!(seeds.len(), ids.len() * Self::STRIDE);
		Self { ids, seeds }
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn ids(&self) -> &[String] {
		&self.ids
	}

	/// The raw packed buffer.
	pub fn seeds(&self) -> &[TraitValue] {
		&self.seeds
	}

	pub fn id(&self, pos: Position) -> Option<&str> {
		self.ids.get(pos as usize).map(String::as_str)
	}

	pub fn record(&self, pos: Position) -> Option<&[TraitValue]> {
		let start = (pos as usize).checked_mul(Self::STRIDE)?;
		self.seeds.get(start..start + Self::STRIDE)
	}

	/// Trait value of `pos` in `dim`.
	///
	/// # Panics
	///
	/// Panics if `pos` is out of bounds.
	pub fn value(&self, pos: Position, dim: Dimension) -> TraitValue {
		self.seeds[pos as usize * Self::STRIDE + dim.slot()]
	}
}
