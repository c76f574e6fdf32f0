//! `lilnouns-filter`: load a Noun collection, filter it, print a page.
//!
//! Reads a JSON array of seeds (`{"id", "background", "body", "accessory",
//! "head", "glasses"}`), runs one selection through the filter engine, pages
//! the matches through the feed and prints a JSON summary to stdout. Logs go
//! to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use lilnouns_engine::{Dimension, EngineConfig, FacetCounts, FilterEngine, FilterSelection, NounSeed, SortOrder, TraitValue};
use lilnouns_feed::{MemorySource, NounFeed};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "lilnouns-filter")]
#[command(about = "Filter Lil Nouns by trait and page through the matches")]
struct Args {
	/// JSON file holding the Noun seeds
	#[arg(long, value_name = "PATH")]
	nouns: PathBuf,

	/// Engine config (TOML)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Background values to match (comma separated)
	#[arg(long, value_delimiter = ',', value_name = "N,..")]
	background: Vec<TraitValue>,

	#[arg(long, value_delimiter = ',', value_name = "N,..")]
	body: Vec<TraitValue>,

	#[arg(long, value_delimiter = ',', value_name = "N,..")]
	accessory: Vec<TraitValue>,

	#[arg(long, value_delimiter = ',', value_name = "N,..")]
	head: Vec<TraitValue>,

	#[arg(long, value_delimiter = ',', value_name = "N,..")]
	glasses: Vec<TraitValue>,

	/// newest or oldest; overrides the config
	#[arg(long)]
	order: Option<SortOrder>,

	/// Pages to load
	#[arg(long, default_value_t = 1)]
	pages: usize,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

impl Args {
	fn selection(&self) -> FilterSelection {
		FilterSelection::new()
			.with(Dimension::Background, self.background.iter().copied())
			.with(Dimension::Body, self.body.iter().copied())
			.with(Dimension::Accessory, self.accessory.iter().copied())
			.with(Dimension::Head, self.head.iter().copied())
			.with(Dimension::Glasses, self.glasses.iter().copied())
	}

	fn engine_config(&self) -> Result<EngineConfig> {
		let mut config = match &self.config {
			Some(path) => EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
			None => EngineConfig::default(),
		};
		if let Some(order) = self.order {
			config.feed.order = order;
		}
		Ok(config)
	}
}

#[derive(Serialize)]
struct Report {
	total: u32,
	selection: FilterSelection,
	counts: FacetCounts,
	order: SortOrder,
	shown: Vec<String>,
	has_more: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	setup_tracing(args.verbose);

	let config = args.engine_config()?;
	let text = std::fs::read_to_string(&args.nouns).with_context(|| format!("reading {}", args.nouns.display()))?;
	let nouns: Vec<NounSeed> = serde_json::from_str(&text).with_context(|| format!("parsing {}", args.nouns.display()))?;
	tracing::info!(nouns = nouns.len(), path = %args.nouns.display(), "cli.load");

	let engine = FilterEngine::spawn(&config);
	let source = Arc::new(MemorySource::new(nouns.iter().cloned()));
	let summary = engine.initialize(nouns).await.context("initializing filter engine")?;
	tracing::info!(total = summary.total, "cli.initialized");

	let selection = args.selection();
	let result = engine.apply_filters(selection.clone()).await.context("applying filters")?;

	let mut feed = NounFeed::new(Arc::clone(&source), &config.feed);
	feed.set_result(&result).await?;
	for _ in 1..args.pages {
		if feed.load_more().await? == 0 {
			break;
		}
	}

	let report = Report {
		total: result.total,
		selection,
		counts: result.counts,
		order: feed.order(),
		shown: feed.entities().into_iter().map(|noun| noun.id.clone()).collect(),
		has_more: feed.has_more(),
	};
	println!("{}", serde_json::to_string_pretty(&report)?);

	let shutdown = engine.shutdown(Duration::from_secs(1)).await;
	tracing::debug!(completed = shutdown.completed(), fetches = source.fetches(), "cli.exit");
	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("lilnouns=debug,info")
		} else {
			EnvFilter::new("warn")
		}
	});
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
