use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One trait variant within a dimension. Observed values fit in a byte; the
/// extra width is headroom.
pub type TraitValue = u16;

/// One of the five independent trait categories of a Noun.
///
/// Declaration order is the packing order of the seed store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
	Background,
	Body,
	Accessory,
	Head,
	Glasses,
}

impl Dimension {
	pub const COUNT: usize = 5;

	pub const ALL: [Dimension; Self::COUNT] = [Self::Background, Self::Body, Self::Accessory, Self::Head, Self::Glasses];

	/// Offset of this dimension inside one packed seed record.
	pub const fn slot(self) -> usize {
		match self {
			Self::Background => 0,
			Self::Body => 1,
			Self::Accessory => 2,
			Self::Head => 3,
			Self::Glasses => 4,
		}
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Background => "background",
			Self::Body => "body",
			Self::Accessory => "accessory",
			Self::Head => "head",
			Self::Glasses => "glasses",
		}
	}
}

impl fmt::Display for Dimension {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown trait dimension '{0}'")]
pub struct UnknownDimension(pub String);

impl FromStr for Dimension {
	type Err = UnknownDimension;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		Self::ALL
			.into_iter()
			.find(|dim| dim.as_str().eq_ignore_ascii_case(trimmed))
			.ok_or_else(|| UnknownDimension(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn slots_follow_packing_order() {
		for (expected, dim) in Dimension::ALL.into_iter().enumerate() {
			assert_eq!(dim.slot(), expected);
		}
	}

	#[rstest]
	#[case("background", Dimension::Background)]
	#[case("Body", Dimension::Body)]
	#[case(" ACCESSORY ", Dimension::Accessory)]
	#[case("head", Dimension::Head)]
	#[case("glasses", Dimension::Glasses)]
	fn parses_names(#[case] input: &str, #[case] expected: Dimension) {
		assert_eq!(input.parse::<Dimension>(), Ok(expected));
	}

	#[test]
	fn rejects_unknown_names() {
		assert_eq!("hat".parse::<Dimension>(), Err(UnknownDimension("hat".to_string())));
	}

	#[test]
	fn display_matches_serde_name() {
		for dim in Dimension::ALL {
			let json = serde_json::to_string(&dim).unwrap();
			assert_eq!(json, format!("\"{dim}\""));
		}
	}
}
