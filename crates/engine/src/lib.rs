//! Faceted trait filtering behind an isolated worker.
//!
//! [`FilterEngine`] owns a supervised worker actor that holds the seed store
//! and trait index. Callers talk to it through correlated requests:
//!
//! ```no_run
//! # async fn demo(nouns: Vec<lilnouns_traits::NounSeed>) -> Result<(), lilnouns_engine::EngineError> {
//! use lilnouns_engine::{EngineConfig, FilterEngine};
//! use lilnouns_traits::{Dimension, FilterSelection};
//!
//! let engine = FilterEngine::spawn(&EngineConfig::default());
//! let summary = engine.initialize(nouns).await?;
//! let result = engine
//! 	.apply_filters(FilterSelection::new().with(Dimension::Head, [12, 40]))
//! 	.await?;
//! assert!(result.total <= summary.total);
//! engine.destroy();
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod pending;
pub mod protocol;
mod worker;

pub use config::{ConfigError, EngineConfig, FeedConfig, SortOrder, UnknownSortOrder};
pub use engine::FilterEngine;
pub use error::{EngineError, WorkerError};
pub use lilnouns_traits::{CountMode, Dimension, FacetCounts, FacetSummary, FilterResult, FilterSelection, NounSeed, TraitValue};
pub use lilnouns_worker::ShutdownReport;
