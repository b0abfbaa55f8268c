use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use camframe_core::DecodedImage;
use clap::ValueEnum;

/// Encoding used for saved frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageFormat {
    Png,
    #[value(alias = "jpeg")]
    Jpg,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }

    fn encoding(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpg => image::ImageFormat::Jpeg,
        }
    }
}

pub fn save_image(decoded: DecodedImage, path: &Path, format: ImageFormat) -> Result<()> {
    let (width, height) = (decoded.width(), decoded.height());
    let buffer = image::RgbImage::from_raw(width, height, decoded.into_raw())
        .ok_or_else(|| anyhow!("image buffer does not match {width}x{height}"))?;
    buffer
        .save_with_format(path, format.encoding())
        .with_context(|| format!("Failed to write image: {}", path.display()))
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}
