use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::backend::CropBackend;
use crate::{CardJob, CropError};

#[derive(Debug)]
pub struct CardOutcome {
    pub index: u32,
    pub output: PathBuf,
    pub result: Result<(), CropError>,
}

/// Per-card results, always in index order.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub outcomes: Vec<CardOutcome>,
}

impl ExtractionReport {
    pub fn written(&self) -> impl Iterator<Item = &CardOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CardOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

pub struct Extractor<B> {
    backend: B,
    jobs: usize,
}

impl<B: CropBackend> Extractor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, jobs: 1 }
    }

    /// Number of crops run at once. `0` and `1` both mean sequential.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn run(&self, source: &Path, cards: &[CardJob]) -> Result<ExtractionReport, CropError> {
        let outcomes: Vec<CardOutcome> = if self.jobs == 1 || cards.len() < 2 {
            cards.iter().map(|card| self.extract(source, card)).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;

            // Indexed collect keeps index order whatever order the crops finish in.
            pool.install(|| {
                cards
                    .par_iter()
                    .map(|card| self.extract(source, card))
                    .collect()
            })
        };

        Ok(ExtractionReport { outcomes })
    }

    fn extract(&self, source: &Path, card: &CardJob) -> CardOutcome {
        let result = preflight(source, &card.output)
            .and_then(|()| self.backend.crop(source, card.rect, &card.output));

        match &result {
            Ok(()) => info!(
                "card {} {} -> {}",
                card.index,
                card.rect,
                card.output.display()
            ),
            Err(err) => error!(
                "card {} ({}) failed via {}: {}",
                card.index,
                card.output.display(),
                self.backend.name(),
                err
            ),
        }

        CardOutcome {
            index: card.index,
            output: card.output.clone(),
            result,
        }
    }
}

fn preflight(source: &Path, output: &Path) -> Result<(), CropError> {
    if !source.is_file() {
        return Err(CropError::MissingSource(source.to_path_buf()));
    }

    match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => {
            Err(CropError::MissingOutputDir(dir.to_path_buf()))
        }
        _ => Ok(()),
    }
}
