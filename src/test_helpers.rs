//! Shared test utilities for the resize-bench test suite.
//!
//! Provides fixture writers (sized placeholder files and real synthetic
//! JPEGs) and [`MockStrategy`], a strategy that records every invocation
//! without touching pixels.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_bytes(&tmp.path().join("a.jpg"), 100);
//!
//! let mock = MockStrategy::new("mock", MockBehavior::Halve);
//! mock.invoke(&tmp.path().join("a.jpg"), &tmp.path().join("out.jpg")).unwrap();
//! assert_eq!(mock.calls().len(), 1);
//! ```

use crate::strategy::{SharedStrategy, SizePair, Strategy, StrategyError, file_size};
use image::{ImageEncoder, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =========================================================================
// Fixture writers
// =========================================================================

/// Write a file of exactly `len` bytes. Content is irrelevant to mocks.
pub fn write_bytes(path: &Path, len: usize) {
    std::fs::write(path, vec![0xAB; len]).unwrap();
}

/// Write a small valid JPEG with a gradient so encoders have real work.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

// =========================================================================
// Mock strategy
// =========================================================================

/// What a [`MockStrategy`] reports for each invocation.
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Output is half the input size.
    Halve,
    /// Output is exactly the input size.
    Identity,
    /// Every invocation fails.
    Fail,
    /// Sleep, then report output half the input size.
    Sleep(Duration),
    /// Panic inside `invoke`.
    Panic,
}

/// Strategy that records `(source, output)` pairs and reports sizes derived
/// from the source file's length. Uses Mutex (not RefCell) so it is Sync.
pub struct MockStrategy {
    name: String,
    native: bool,
    behavior: MockBehavior,
    calls: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl MockStrategy {
    pub fn new(name: &str, behavior: MockBehavior) -> Self {
        Self {
            name: name.to_string(),
            native: true,
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn external(name: &str, behavior: MockBehavior) -> Self {
        Self {
            native: false,
            ..Self::new(name, behavior)
        }
    }

    pub fn shared(name: &str, behavior: MockBehavior) -> SharedStrategy {
        Arc::new(Self::new(name, behavior))
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Strategy for MockStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_native(&self) -> bool {
        self.native
    }

    fn invoke(&self, source: &Path, output: &Path) -> Result<SizePair, StrategyError> {
        self.calls
            .lock()
            .unwrap()
            .push((source.to_path_buf(), output.to_path_buf()));

        let input = file_size(source)?;
        match self.behavior {
            MockBehavior::Halve => Ok(SizePair::new(input / 2, input)),
            MockBehavior::Identity => Ok(SizePair::new(input, input)),
            MockBehavior::Fail => Err(StrategyError::Encode("mock failure".into())),
            MockBehavior::Sleep(d) => {
                std::thread::sleep(d);
                Ok(SizePair::new(input / 2, input))
            }
            MockBehavior::Panic => panic!("mock strategy panicked"),
        }
    }
}
