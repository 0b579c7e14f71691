use anyhow::Context;
use card_tools::config::{BackendKind, Config};
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Crop a row of square cards out of a scanned page.
///
/// With no arguments this crops `0008.jpg` into `cards/special_{0,1,2}.jpg`
/// with `magick convert`.
#[derive(StructOpt)]
pub struct Opts {
    /// TOML file with run parameters; flags override it.
    #[structopt(long)]
    config: Option<PathBuf>,
    #[structopt(long)]
    source: Option<PathBuf>,
    #[structopt(long)]
    output_dir: Option<PathBuf>,
    #[structopt(long)]
    prefix: Option<String>,
    #[structopt(long)]
    extension: Option<String>,
    /// Number of cards.
    #[structopt(long)]
    count: Option<u32>,
    /// Side length of each square card in pixels.
    #[structopt(long)]
    side: Option<u32>,
    #[structopt(long)]
    start_x: Option<u32>,
    #[structopt(long)]
    start_y: Option<u32>,
    /// Horizontal distance between the left edges of neighbouring cards.
    #[structopt(long)]
    step: Option<u32>,
    /// `magick` or `native`.
    #[structopt(long)]
    backend: Option<BackendKind>,
    /// Image tool to run for the magick backend. Given without `--arg`, the
    /// tool gets no leading arguments, so `--program convert` runs ImageMagick 6.
    #[structopt(long)]
    program: Option<PathBuf>,
    /// Leading argument for the image tool, repeatable; replaces the configured ones.
    #[structopt(long = "arg", allow_hyphen_values = true, number_of_values = 1)]
    args: Vec<String>,
    #[structopt(long)]
    timeout_secs: Option<u64>,
    /// Crops to run at once.
    #[structopt(short, long)]
    jobs: Option<usize>,
    #[structopt(long)]
    create_output_dir: bool,
    /// Print the planned crops without running anything.
    #[structopt(long)]
    dry_run: bool,
    /// Exit successfully even when some cards failed.
    #[structopt(long)]
    ignore_failures: bool,
}

impl Opts {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(extension) = &self.extension {
            config.extension = extension.clone();
        }
        config.count = self.count.unwrap_or(config.count);
        config.side = self.side.unwrap_or(config.side);
        config.start_x = self.start_x.unwrap_or(config.start_x);
        config.start_y = self.start_y.unwrap_or(config.start_y);
        config.step = self.step.unwrap_or(config.step);
        config.jobs = self.jobs.unwrap_or(config.jobs);
        config.create_output_dir |= self.create_output_dir;
        config.tool.backend = self.backend.unwrap_or(config.tool.backend);
        if let Some(program) = &self.program {
            config.tool.program = program.clone();
            config.tool.args.clear();
        }
        if !self.args.is_empty() {
            config.tool.args = self.args.clone();
        }
        if self.timeout_secs.is_some() {
            config.tool.timeout_secs = self.timeout_secs;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::from_args();
    let config = opts.config()?;

    if opts.dry_run {
        let cards = card_tools::plan(&config.layout(), &config.naming())?;

        for card in &cards {
            println!("{}\t{}\t{}", card.index, card.rect, card.output.display());
        }

        return Ok(());
    }

    let report = card_tools::extract_cards(&config).context("Failed to start extraction")?;
    let failed = report.failures().count();

    info!(
        "{} of {} cards written",
        report.written().count(),
        report.outcomes.len()
    );

    if failed == 0 {
        return Ok(());
    }

    if opts.ignore_failures {
        warn!("ignoring {} failed cards", failed);
        return Ok(());
    }

    anyhow::bail!("{} of {} cards failed", failed, report.outcomes.len())
}
