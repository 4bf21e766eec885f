// Face-obscuring photo editor engine.
//
// Load a photo into a `Session`, let a `FaceDetector` seed elliptical
// regions, edit them with pointer gestures, and export the flattened
// result as PNG. The window app in `main.rs` is one front end for it.

pub mod compositor;
pub mod config;
pub mod coords;
pub mod debounce;
pub mod detector;
pub mod draw;
pub mod error;
pub mod export;
pub mod gamma;
pub mod interaction;
pub mod layers;
pub mod photo;
pub mod regions;
#[cfg(feature = "rustface")]
pub mod rustface_backend;
pub mod session;
pub mod types;
pub mod vision;

pub use coords::{CoordinateMapper, DisplayBox, Layout};
pub use detector::{FaceBox, FaceDetector};
pub use error::Error;
pub use export::ExportArtifact;
pub use interaction::{Gesture, Outcome};
pub use regions::RegionStore;
#[cfg(feature = "rustface")]
pub use rustface_backend::RustfaceDetector;
pub use session::{DetectionTicket, Session};
pub use types::{EffectType, FrameBuffer, Point, Rect, Region, RegionId};
