use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, TraitValue};

/// Trait values the user picked, per dimension.
///
/// An empty list leaves that dimension unconstrained. Values within a
/// dimension are OR-ed; constrained dimensions are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub background: Vec<TraitValue>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub body: Vec<TraitValue>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub accessory: Vec<TraitValue>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub head: Vec<TraitValue>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub glasses: Vec<TraitValue>,
}

impl FilterSelection {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the values of `dim`.
	#[must_use]
	pub fn with(mut self, dim: Dimension, values: impl IntoIterator<Item = TraitValue>) -> Self {
		let slot = self.get_mut(dim);
		slot.clear();
		for value in values {
			if !slot.contains(&value) {
				slot.push(value);
			}
		}
		self
	}

	/// Adds one value to `dim`. Returns `false` if it was already selected.
	pub fn add(&mut self, dim: Dimension, value: TraitValue) -> bool {
		let slot = self.get_mut(dim);
		if slot.contains(&value) {
			return false;
		}
		slot.push(value);
		true
	}

	/// Removes one value from `dim`. Returns `false` if it was not selected.
	pub fn remove(&mut self, dim: Dimension, value: TraitValue) -> bool {
		let slot = self.get_mut(dim);
		let before = slot.len();
		slot.retain(|&v| v != value);
		slot.len() != before
	}

	pub fn clear(&mut self, dim: Dimension) {
		self.get_mut(dim).clear();
	}

	pub fn get(&self, dim: Dimension) -> &[TraitValue] {
		match dim {
			Dimension::Background => &self.background,
			Dimension::Body => &self.body,
			Dimension::Accessory => &self.accessory,
			Dimension::Head => &self.head,
			Dimension::Glasses => &self.glasses,
		}
	}

	fn get_mut(&mut self, dim: Dimension) -> &mut Vec<TraitValue> {
		match dim {
			Dimension::Background => &mut self.background,
			Dimension::Body => &mut self.body,
			Dimension::Accessory => &mut self.accessory,
			Dimension::Head => &mut self.head,
			Dimension::Glasses => &mut self.glasses,
		}
	}

	/// Dimensions carrying at least one value, in packing order.
	pub fn constrained(&self) -> impl Iterator<Item = (Dimension, &[TraitValue])> + '_ {
		Dimension::ALL
			.into_iter()
			.map(|dim| (dim, self.get(dim)))
			.filter(|(_, values)| !values.is_empty())
	}

	pub fn is_unconstrained(&self) -> bool {
		self.constrained().next().is_none()
	}
}
