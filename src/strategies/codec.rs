//! Decode, encode and write helpers shared by in-process strategies.

use crate::strategy::StrategyError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// Load and decode an image from disk, sniffing the format from content.
pub fn load_image(path: &Path) -> Result<DynamicImage, StrategyError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| StrategyError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Decode an in-memory image of a known format (e.g. PNM from a pipe).
pub fn decode_bytes(
    bytes: &[u8],
    format: ImageFormat,
    origin: &Path,
) -> Result<DynamicImage, StrategyError> {
    image::load_from_memory_with_format(bytes, format).map_err(|e| StrategyError::Decode {
        path: origin.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Encode as baseline JPEG into memory.
///
/// JPEG has no alpha channel, so images carrying one are flattened to RGB.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, StrategyError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    let result = if img.color().has_alpha() {
        DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
    } else {
        img.write_with_encoder(encoder)
    };
    result.map_err(|e| StrategyError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

/// Write encoded bytes, replacing any previous output.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), StrategyError> {
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{write_bytes, write_test_jpeg};
    use image::RgbaImage;

    #[test]
    fn load_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("src.jpg");
        write_test_jpeg(&path, 64, 48);

        let img = load_image(&path).unwrap();
        assert_eq!((img.width(), img.height()), (64, 48));
    }

    #[test]
    fn load_garbage_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        write_bytes(&path, 64);

        assert!(matches!(
            load_image(&path),
            Err(StrategyError::Decode { .. })
        ));
    }

    #[test]
    fn load_missing_is_io_error() {
        assert!(matches!(
            load_image(Path::new("/nonexistent/src.jpg")),
            Err(StrategyError::Io(_))
        ));
    }

    #[test]
    fn encode_produces_jpeg_magic() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(8, 8));
        let bytes = encode_jpeg(&img, 75).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn encode_flattens_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(8, 8));
        assert!(encode_jpeg(&img, 75).is_ok());
    }

    #[test]
    fn decode_pnm_bytes() {
        let pnm = b"P6\n2 1\n255\n\xff\x00\x00\x00\xff\x00";
        let img = decode_bytes(pnm, ImageFormat::Pnm, Path::new("pipe")).unwrap();
        assert_eq!((img.width(), img.height()), (2, 1));
    }

    #[test]
    fn write_output_overwrites() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.jpg");
        write_output(&path, &[1, 2, 3, 4]).unwrap();
        write_output(&path, &[5]).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![5]);
    }
}
