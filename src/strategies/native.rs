//! Pure Rust strategies built on the `image` crate.
//!
//! | Strategy | Sampling |
//! |---|---|
//! | `image_nearest` | `FilterType::Nearest` |
//! | `image_triangle` | `FilterType::Triangle` (bilinear) |
//! | `image_catmullrom` | `FilterType::CatmullRom` (bicubic) |
//! | `image_lanczos3` | `FilterType::Lanczos3` |
//! | `image_thumbnail` | `DynamicImage::thumbnail_exact` (integer box sampling) |
//!
//! All of them decode in-process, fit the image inside the thumbnail box,
//! encode JPEG into memory and write it out. They need nothing on the host,
//! so their probe always passes.

use super::StrategySettings;
use super::calculations::fit_within;
use super::codec::{encode_jpeg, load_image, write_output};
use crate::probe::Probe;
use crate::registry::Candidate;
use crate::strategy::{SizePair, Strategy, StrategyError, file_size};
use image::DynamicImage;
use image::imageops::FilterType;
use std::path::Path;
use std::sync::Arc;

/// How pixels are resampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sampling {
    Filter(FilterType),
    /// The `image` crate's fast thumbnailing path.
    Thumbnail,
}

pub struct ImageCrateStrategy {
    name: String,
    sampling: Sampling,
    settings: StrategySettings,
}

impl ImageCrateStrategy {
    pub fn new(name: impl Into<String>, sampling: Sampling, settings: StrategySettings) -> Self {
        Self {
            name: name.into(),
            sampling,
            settings,
        }
    }

    fn shrink(&self, img: &DynamicImage) -> DynamicImage {
        let (w, h) = fit_within(img.width(), img.height(), self.settings.max_edge);
        if (w, h) == (img.width(), img.height()) {
            return img.clone();
        }
        match self.sampling {
            Sampling::Filter(filter) => img.resize_exact(w, h, filter),
            Sampling::Thumbnail => img.thumbnail_exact(w, h),
        }
    }
}

impl Strategy for ImageCrateStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_native(&self) -> bool {
        true
    }

    fn invoke(&self, source: &Path, output: &Path) -> Result<SizePair, StrategyError> {
        let input_bytes = file_size(source)?;
        let img = load_image(source)?;
        let encoded = encode_jpeg(&self.shrink(&img), self.settings.quality)?;
        write_output(output, &encoded)?;
        Ok(SizePair::new(encoded.len() as u64, input_bytes))
    }
}

const VARIANTS: &[(&str, Sampling)] = &[
    ("image_nearest", Sampling::Filter(FilterType::Nearest)),
    ("image_triangle", Sampling::Filter(FilterType::Triangle)),
    ("image_catmullrom", Sampling::Filter(FilterType::CatmullRom)),
    ("image_lanczos3", Sampling::Filter(FilterType::Lanczos3)),
    ("image_thumbnail", Sampling::Thumbnail),
];

pub fn candidates(settings: &StrategySettings) -> Vec<Candidate> {
    VARIANTS
        .iter()
        .map(|&(name, sampling)| {
            let settings = settings.clone();
            Candidate::new(name, Probe::Always, move || {
                Arc::new(ImageCrateStrategy::new(name, sampling, settings))
            })
        })
        .collect()
}
