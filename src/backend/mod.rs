use std::path::Path;

use crate::{CropError, CropRect};

mod magick;
mod native;

pub use magick::MagickBackend;
pub use native::NativeBackend;

/// Cuts one rectangle out of `source` and writes it to `output`.
pub trait CropBackend: Send + Sync {
    fn name(&self) -> &str;

    fn crop(&self, source: &Path, rect: CropRect, output: &Path) -> Result<(), CropError>;
}

impl<B: CropBackend + ?Sized> CropBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn crop(&self, source: &Path, rect: CropRect, output: &Path) -> Result<(), CropError> {
        (**self).crop(source, rect, output)
    }
}
