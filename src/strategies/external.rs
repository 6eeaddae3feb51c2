//! Strategies that delegate to external command-line tools.
//!
//! | Strategy | Command |
//! |---|---|
//! | `GraphicsMagick_thumbnail` | `gm convert -define jpeg:size=2Nx2N -thumbnail NxN> -quality Q in out` |
//! | `ImageMagick_thumbnail` | `convert -define jpeg:size=2Nx2N -thumbnail NxN> -quality Q in out` |
//! | `ImageMagick_resize` | `convert -resize NxN> -quality Q in out` |
//! | `vipsthumbnail` | `vipsthumbnail in --size NxN> -o out[Q=Q]` |
//! | `djpeg_downsample` | `djpeg -scale 1/8 -pnm in`, then resized in-process |
//!
//! Each one is gated on its executable being on `PATH`. None of them is
//! native: the pixel work happens in another process. The output size is
//! read back from the file the tool wrote, except for `djpeg_downsample`,
//! which encodes the final JPEG itself.

use super::StrategySettings;
use super::calculations::fit_within;
use super::codec::{decode_bytes, encode_jpeg, write_output};
use super::tool::run_tool;
use crate::probe::Probe;
use crate::registry::Candidate;
use crate::strategy::{SizePair, Strategy, StrategyError, file_size};
use image::ImageFormat;
use image::imageops::FilterType;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

/// Builds the argument list for one invocation.
type ArgBuilder = fn(&Path, &Path, &StrategySettings) -> Vec<OsString>;

/// A strategy that is one external command writing the thumbnail itself.
pub struct CommandStrategy {
    name: &'static str,
    program: &'static str,
    build_args: ArgBuilder,
    settings: StrategySettings,
}

impl CommandStrategy {
    pub fn new(
        name: &'static str,
        program: &'static str,
        build_args: ArgBuilder,
        settings: StrategySettings,
    ) -> Self {
        Self {
            name,
            program,
            build_args,
            settings,
        }
    }

    pub fn args(&self, source: &Path, output: &Path) -> Vec<OsString> {
        (self.build_args)(source, output, &self.settings)
    }
}

impl Strategy for CommandStrategy {
    fn name(&self) -> &str {
        self.name
    }

    fn is_native(&self) -> bool {
        false
    }

    fn invoke(&self, source: &Path, output: &Path) -> Result<SizePair, StrategyError> {
        let input_bytes = file_size(source)?;
        run_tool(
            self.program,
            self.args(source, output),
            self.settings.tool_timeout,
        )?;
        Ok(SizePair::new(file_size(output)?, input_bytes))
    }
}

/// `NxN>`: fit inside the box, never enlarge.
fn shrink_geometry(settings: &StrategySettings) -> String {
    format!("{0}x{0}>", settings.max_edge)
}

/// Lets the JPEG decoder skip DCT scales it will not need.
fn decode_hint(settings: &StrategySettings) -> String {
    format!("jpeg:size={0}x{0}", settings.max_edge * 2)
}

fn magick_thumbnail_args(
    source: &Path,
    output: &Path,
    settings: &StrategySettings,
) -> Vec<OsString> {
    vec![
        "-define".into(),
        decode_hint(settings).into(),
        "-thumbnail".into(),
        shrink_geometry(settings).into(),
        "-quality".into(),
        settings.quality.to_string().into(),
        source.into(),
        output.into(),
    ]
}

fn gm_thumbnail_args(source: &Path, output: &Path, settings: &StrategySettings) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["convert".into()];
    args.extend(magick_thumbnail_args(source, output, settings));
    args
}

fn magick_resize_args(source: &Path, output: &Path, settings: &StrategySettings) -> Vec<OsString> {
    vec![
        "-resize".into(),
        shrink_geometry(settings).into(),
        "-quality".into(),
        settings.quality.to_string().into(),
        source.into(),
        output.into(),
    ]
}

fn vipsthumbnail_args(source: &Path, output: &Path, settings: &StrategySettings) -> Vec<OsString> {
    let mut target = output.as_os_str().to_os_string();
    target.push(format!("[Q={}]", settings.quality));
    vec![
        source.into(),
        "--size".into(),
        shrink_geometry(settings).into(),
        "-o".into(),
        target,
    ]
}

/// Decode at 1/8 scale with libjpeg's `djpeg`, finish the resize in Rust.
///
/// The IDCT scaling in `djpeg` does most of the shrinking for almost no cost;
/// the `image` crate only has a small bitmap left to filter.
pub struct DjpegStrategy {
    settings: StrategySettings,
}

impl DjpegStrategy {
    pub const NAME: &'static str = "djpeg_downsample";

    pub fn new(settings: StrategySettings) -> Self {
        Self { settings }
    }
}

impl Strategy for DjpegStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_native(&self) -> bool {
        false
    }

    fn invoke(&self, source: &Path, output: &Path) -> Result<SizePair, StrategyError> {
        let input_bytes = file_size(source)?;
        let args: [&std::ffi::OsStr; 4] = [
            "-scale".as_ref(),
            "1/8".as_ref(),
            "-pnm".as_ref(),
            source.as_os_str(),
        ];
        let pnm = run_tool("djpeg", args, self.settings.tool_timeout)?;
        let img = decode_bytes(&pnm, ImageFormat::Pnm, source)?;
        let (w, h) = fit_within(img.width(), img.height(), self.settings.max_edge);
        let resized = if (w, h) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(w, h, FilterType::Triangle)
        };
        let encoded = encode_jpeg(&resized, self.settings.quality)?;
        write_output(output, &encoded)?;
        Ok(SizePair::new(encoded.len() as u64, input_bytes))
    }
}

/// `(strategy name, executable, argument builder)`
const COMMANDS: &[(&str, &str, ArgBuilder)] = &[
    ("GraphicsMagick_thumbnail", "gm", gm_thumbnail_args),
    ("ImageMagick_thumbnail", "convert", magick_thumbnail_args),
    ("ImageMagick_resize", "convert", magick_resize_args),
    ("vipsthumbnail", "vipsthumbnail", vipsthumbnail_args),
];

pub fn candidates(settings: &StrategySettings) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = COMMANDS
        .iter()
        .map(|&(name, program, build_args)| {
            let settings = settings.clone();
            Candidate::new(name, Probe::Executable(program), move || {
                Arc::new(CommandStrategy::new(name, program, build_args, settings))
            })
        })
        .collect();

    let settings = settings.clone();
    candidates.push(Candidate::new(
        DjpegStrategy::NAME,
        Probe::Executable("djpeg"),
        move || Arc::new(DjpegStrategy::new(settings)),
    ));
    candidates
}
