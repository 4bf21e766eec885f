// Save dialog state: export only happens right after the user ticked the
// disclaimer, and the tick is cleared whenever the dialog closes.

use crate::config::EXPORT_PREFIX;
use crate::error::Error;
use crate::photo::encode_png;
use crate::types::FrameBuffer;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// An encoded export ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub png: Vec<u8>,
}

impl ExportArtifact {
    /// Write into `dir` under the artifact's own name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, Error> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.png)?;
        Ok(path)
    }
}

/// `<prefix>-<unix millis>.png`
pub fn export_filename(timestamp_ms: u128) -> String {
    format!("{EXPORT_PREFIX}-{timestamp_ms}.png")
}

pub fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0)
}

#[derive(Debug, Default)]
pub struct ExportGate {
    open: bool,
    confirmed: bool,
}

impl ExportGate {
    pub fn open(&mut self) {
        self.open = true;
        self.confirmed = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Tick or untick the disclaimer. Only meaningful while the dialog is open.
    pub fn set_confirmed(&mut self, confirmed: bool) {
        self.confirmed = self.open && confirmed;
    }

    /// Close without exporting.
    pub fn cancel(&mut self) {
        self.open = false;
        self.confirmed = false;
    }

    /// Encode `composite` if confirmed. Without confirmation nothing happens
    /// and `Ok(None)` comes back.
    pub fn export(&mut self, composite: &FrameBuffer, timestamp_ms: u128) -> Result<Option<ExportArtifact>, Error> {
        if !self.confirmed {
            log::debug!("export ignored: disclaimer not confirmed");
            return Ok(None);
        }
        let png = encode_png(composite)?;
        self.cancel();
        let filename = export_filename(timestamp_ms);
        log::info!("exported {filename} ({} bytes)", png.len());
        Ok(Some(ExportArtifact { filename, png }))
    }
}
