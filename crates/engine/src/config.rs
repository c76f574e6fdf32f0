use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use lilnouns_traits::CountMode;
use serde::{Deserialize, Serialize};

/// Errors raised while loading an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid engine config: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("invalid engine config: {0}")]
	Invalid(&'static str),
}

/// Engine settings, loaded from TOML. Every field has a default.
///
/// ```toml
/// mailbox_capacity = 64
/// count_mode = "intersected"
///
/// [feed]
/// batch_size = 40
/// order = "newest"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
	/// Requests the worker may have queued before callers wait.
	pub mailbox_capacity: usize,
	pub count_mode: CountMode,
	pub feed: FeedConfig,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			mailbox_capacity: 64,
			count_mode: CountMode::default(),
			feed: FeedConfig::default(),
		}
	}
}

impl EngineConfig {
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let config = Self::from_toml_str(&text)?;
		tracing::debug!(path = %path.display(), ?config, "filter.config.load");
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.mailbox_capacity == 0 {
			return Err(ConfigError::Invalid("mailbox_capacity must be at least 1"));
		}
		if self.feed.batch_size == 0 {
			return Err(ConfigError::Invalid("feed.batch_size must be at least 1"));
		}
		Ok(())
	}
}

/// Paging settings for the incremental consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
	/// Detail records fetched per page.
	pub batch_size: usize,
	pub order: SortOrder,
}

impl Default for FeedConfig {
	fn default() -> Self {
		Self {
			batch_size: 40,
			order: SortOrder::default(),
		}
	}
}

/// Display order of matched Nouns, by numeric id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	/// Highest id first.
	#[default]
	Newest,
	Oldest,
}

impl SortOrder {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Newest => "newest",
			Self::Oldest => "oldest",
		}
	}
}

impl fmt::Display for SortOrder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort order '{0}' (expected 'newest' or 'oldest')")]
pub struct UnknownSortOrder(pub String);

impl FromStr for SortOrder {
	type Err = UnknownSortOrder;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"newest" => Ok(Self::Newest),
			"oldest" => Ok(Self::Oldest),
			_ => Err(UnknownSortOrder(s.to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
	}

	#[test]
	fn parses_every_field() {
		let config = EngineConfig::from_toml_str(
			r#"
			mailbox_capacity = 8
			count_mode = "exclude-own-facet"

			[feed]
			batch_size = 12
			order = "oldest"
			"#,
		)
		.unwrap();

		assert_eq!(
			config,
			EngineConfig {
				mailbox_capacity: 8,
				count_mode: CountMode::ExcludeOwnFacet,
				feed: FeedConfig {
					batch_size: 12,
					order: SortOrder::Oldest,
				},
			}
		);
	}

	#[test]
	fn partial_feed_table_keeps_other_defaults() {
		let config = EngineConfig::from_toml_str("[feed]\norder = \"oldest\"\n").unwrap();
		assert_eq!(config.feed.batch_size, 40);
		assert_eq!(config.feed.order, SortOrder::Oldest);
		assert_eq!(config.count_mode, CountMode::Intersected);
	}

	#[test]
	fn rejects_unknown_keys_and_zero_sizes() {
		assert!(matches!(EngineConfig::from_toml_str("mailbox = 3"), Err(ConfigError::Parse(_))));
		assert!(matches!(EngineConfig::from_toml_str("count_mode = \"fuzzy\""), Err(ConfigError::Parse(_))));
		assert!(matches!(EngineConfig::from_toml_str("mailbox_capacity = 0"), Err(ConfigError::Invalid(_))));
		assert!(matches!(EngineConfig::from_toml_str("[feed]\nbatch_size = 0"), Err(ConfigError::Invalid(_))));
	}

	#[test]
	fn loads_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "mailbox_capacity = 32").unwrap();

		let config = EngineConfig::load(file.path()).unwrap();
		assert_eq!(config.mailbox_capacity, 32);
		assert_eq!(config.feed.batch_size, 40);
	}

	#[test]
	fn missing_file_reports_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("absent.toml");
		let err = EngineConfig::load(&path).unwrap_err();
		assert!(matches!(err, ConfigError::Io { .. }));
		assert!(err.to_string().contains("absent.toml"), "{err}");
	}

	#[test]
	fn sort_order_parses_loosely() {
		assert_eq!("Newest".parse::<SortOrder>(), Ok(SortOrder::Newest));
		assert_eq!(" oldest".parse::<SortOrder>(), Ok(SortOrder::Oldest));
		assert!("random".parse::<SortOrder>().is_err());
	}
}
