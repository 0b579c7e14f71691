use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use crate::CropRect;

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("invalid card layout: {0}")]
    InvalidLayout(String),

    #[error("source image {0:?} does not exist")]
    MissingSource(PathBuf),

    #[error("output directory {0:?} does not exist")]
    MissingOutputDir(PathBuf),

    #[error("failed to launch {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program:?} exited with {status}{}", stderr_detail(.stderr))]
    ToolFailed {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{program:?} exited successfully but did not write {output:?}")]
    NoOutput { program: PathBuf, output: PathBuf },

    #[error("{program:?} timed out after {after:?}")]
    TimedOut { program: PathBuf, after: Duration },

    #[error("crop {rect} lies outside the {width}x{height} page")]
    OutOfBounds {
        rect: CropRect,
        width: u32,
        height: u32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

fn stderr_detail(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}
