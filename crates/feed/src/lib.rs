//! Incremental consumer for filter results.
//!
//! [`NounFeed`] turns the id list of a [`FilterResult`](lilnouns_engine::FilterResult)
//! into pages of detail records pulled from a [`DetailSource`].

mod feed;
mod source;

pub use feed::{FeedError, FeedState, NounFeed};
pub use source::{DetailRecord, DetailSource, FetchError, MemorySource};
