use image::{DynamicImage, GenericImageView};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::CropBackend;
use crate::{CropError, CropRect};

/// Crops in-process with the `image` crate.
///
/// Pages are decoded once per path and shared between crops. A rectangle that
/// runs past the page edge is clipped the way `-crop` clips it; one that starts
/// outside the page is an error.
#[derive(Default)]
pub struct NativeBackend {
    pages: Mutex<HashMap<PathBuf, Arc<DynamicImage>>>,
}

impl NativeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn page(&self, source: &Path) -> Result<Arc<DynamicImage>, CropError> {
        if let Some(page) = self.pages.lock().get(source) {
            return Ok(page.clone());
        }

        // Decoded outside the lock; the first insert for a path wins.
        let page = Arc::new(image::open(source)?);

        Ok(self
            .pages
            .lock()
            .entry(source.to_path_buf())
            .or_insert(page)
            .clone())
    }
}

impl CropBackend for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }

    fn crop(&self, source: &Path, rect: CropRect, output: &Path) -> Result<(), CropError> {
        let page = self.page(source)?;
        let (width, height) = page.dimensions();

        if rect.x >= width || rect.y >= height {
            return Err(CropError::OutOfBounds {
                rect,
                width,
                height,
            });
        }

        page.crop_imm(rect.x, rect.y, rect.width, rect.height)
            .save(output)?;

        Ok(())
    }
}
