//! Messages exchanged between the façade and the filter worker.

use std::sync::Arc;

use lilnouns_traits::{FacetSummary, FilterResult, FilterSelection, NounSeed};

use crate::error::WorkerError;

/// Correlation id of one request, unique per engine.
pub type RequestId = u64;

/// Filter generation. Strictly increasing per engine; later wins.
pub type Generation = u64;

#[derive(Debug)]
pub struct EngineRequest {
	pub id: RequestId,
	pub body: RequestBody,
}

#[derive(Debug)]
pub enum RequestBody {
	/// Replace the collection and rebuild the index.
	Initialize { nouns: Vec<NounSeed> },
	ApplyFilters { generation: Generation, selection: FilterSelection },
}

impl RequestBody {
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Initialize { .. } => "initialize",
			Self::ApplyFilters { .. } => "apply_filters",
		}
	}

	pub fn generation(&self) -> Option<Generation> {
		match self {
			Self::Initialize { .. } => None,
			Self::ApplyFilters { generation, .. } => Some(*generation),
		}
	}
}

/// Worker reply, correlated by `id`.
#[derive(Debug, Clone)]
pub struct EngineResponse {
	pub id: RequestId,
	pub body: Result<ResponseBody, WorkerError>,
}

#[derive(Debug, Clone)]
pub enum ResponseBody {
	Initialized(FacetSummary),
	Filtered { generation: Generation, result: Arc<FilterResult> },
}
