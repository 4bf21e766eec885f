// The face-detection boundary: a detector hands back boxes in image pixels,
// the session turns them into auto regions.

use crate::error::Error;
use crate::types::{unpack_rgb, FrameBuffer, Rect};

/// Bounding box of a detected face, in image-intrinsic pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    /// X coordinate of the top-left corner (pixels).
    pub x: f64,
    /// Y coordinate of the top-left corner (pixels).
    pub y: f64,
    /// Width of the bounding box (pixels).
    pub width: f64,
    /// Height of the bounding box (pixels).
    pub height: f64,
    /// Detection confidence score, already past the backend's threshold.
    pub confidence: f64,
}

impl FaceBox {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Pluggable face detection backend.
///
/// The editor only consumes the boxes; how they are found is up to the
/// implementation. `Send + Sync` so the window app can run it off the
/// UI thread.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in `image`, returning zero or more boxes.
    fn detect(&self, image: &FrameBuffer) -> Result<Vec<FaceBox>, Error>;
}

/// Grayscale copy of `image` whose longest side is at most `max_side`,
/// plus the factor that maps its coordinates back to `image`.
pub fn detection_input(image: &FrameBuffer, max_side: u32) -> (image::GrayImage, f64) {
    let (w, h) = (image.width as u32, image.height as u32);
    let gray = image::GrayImage::from_fn(w, h, |x, y| {
        let (r, g, b) = unpack_rgb(image.get(x as usize, y as usize));
        // Rec. 601 luma
        let l = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
        image::Luma([l as u8])
    });

    let longest = w.max(h);
    if longest <= max_side || max_side == 0 {
        return (gray, 1.0);
    }
    let scale = max_side as f64 / longest as f64;
    let nw = ((w as f64 * scale).round() as u32).max(1);
    let nh = ((h as f64 * scale).round() as u32).max(1);
    let small = image::imageops::resize(&gray, nw, nh, image::imageops::FilterType::Triangle);
    (small, w as f64 / nw as f64)
}
