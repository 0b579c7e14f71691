pub mod backend;
pub mod config;
mod error;
mod extract;
mod geometry;

pub use error::CropError;
pub use extract::{CardOutcome, ExtractionReport, Extractor};
pub use geometry::{plan, CardJob, CardLayout, CropRect, OutputNaming};

use backend::CropBackend;
use std::path::Path;

/// Crops every card `config` describes, creating the output directory first
/// when the config asks for it.
pub fn extract_cards(config: &config::Config) -> anyhow::Result<ExtractionReport> {
    let cards = plan(&config.layout(), &config.naming())?;

    if config.create_output_dir {
        create_dir(&config.output_dir)?;
    }

    let extractor = Extractor::new(config.tool.build()).with_jobs(config.jobs);
    tracing::debug!(
        "cropping {} cards from {} with the {} backend",
        cards.len(),
        config.source.display(),
        extractor.backend().name()
    );

    Ok(extractor.run(&config.source, &cards)?)
}

fn create_dir(dir: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}
