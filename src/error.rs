// One error type for the engine and the window app.
// Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("window init error: {0}")]
    WindowInit(String), // Creating the window failed

    #[error("window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed

    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("image dimensions are zero")]
    ZeroDimensions,

    #[error("buffer size mismatch: {0}")]
    SizeMismatch(String),

    #[error("face detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("face detection failed: {0}")]
    Detection(String),

    #[error("a detection pass is already running")]
    DetectionBusy,

    #[error("no image loaded")]
    NoImage,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
