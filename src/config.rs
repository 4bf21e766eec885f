// Tunables and the command line.

use crate::types::EffectType;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub const MIN_INTENSITY: u32 = 5;
pub const MAX_INTENSITY: u32 = 80;
pub const DEFAULT_INTENSITY: u32 = 25;
pub const INTENSITY_STEP: u32 = 5;

/// Slider input must be quiet this long before layers are rebuilt.
pub const INTENSITY_SETTLE: Duration = Duration::from_millis(200);

/// A drawn box must exceed this (image px) on both axes to become a region.
pub const MIN_DRAWN_SIZE: f64 = 5.0;

/// Radius of the delete handle at each region's top-right corner (screen px).
pub const DELETE_HANDLE_RADIUS: f64 = 14.0;

/// Longest side the detector sees; boxes are scaled back afterwards.
pub const DETECTION_INPUT_SIZE: u32 = 512;

pub const EXPORT_PREFIX: &str = "student-privacy-blur";

/// Clamp any incoming intensity into the supported range.
pub fn clamp_intensity(value: u32) -> u32 {
    value.clamp(MIN_INTENSITY, MAX_INTENSITY)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EffectArg {
    Blur,
    Mosaic,
}

impl From<EffectArg> for EffectType {
    fn from(arg: EffectArg) -> Self {
        match arg {
            EffectArg::Blur => EffectType::Blur,
            EffectArg::Mosaic => EffectType::Mosaic,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "privacy-blur")]
#[command(version, about = "Blur or mosaic faces in a photo before sharing it", long_about = None)]
pub struct Cli {
    /// Photo to edit
    #[arg(value_name = "IMAGE")]
    pub input: PathBuf,

    /// Directory the exported PNG is written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,

    /// Effect applied to new regions
    #[arg(short, long, value_enum, default_value = "blur")]
    pub effect: EffectArg,

    /// Blur radius / mosaic cell size in pixels (5..=80)
    #[arg(short, long, value_name = "PX", default_value_t = DEFAULT_INTENSITY)]
    pub intensity: u32,

    /// SeetaFace model file for automatic face detection
    #[arg(short, long, value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Skip the automatic detection pass after loading
    #[arg(long)]
    pub no_detect: bool,

    /// Largest initial window width
    #[arg(long, value_name = "PX", default_value_t = 1280)]
    pub max_width: usize,

    /// Largest initial window height
    #[arg(long, value_name = "PX", default_value_t = 860)]
    pub max_height: usize,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
