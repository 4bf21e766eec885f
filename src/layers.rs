// Precomputed full-image effect layers.
// Filtering the whole photo is the expensive part; doing it once per
// (image, intensity) lets every region and every frame reuse the result.

use crate::config::clamp_intensity;
use crate::error::Error;
use crate::types::{EffectType, FrameBuffer};
use std::rc::Rc;

/// Both filtered copies of one source image at one intensity.
#[derive(Debug)]
pub struct EffectLayers {
    pub generation: u64,  // which loaded image these came from
    pub intensity: u32,
    pub blur: FrameBuffer,
    pub mosaic: FrameBuffer,
}

impl EffectLayers {
    pub fn compute(source: &FrameBuffer, generation: u64, intensity: u32) -> Result<Self, Error> {
        let intensity = clamp_intensity(intensity);
        let blur = EffectType::Blur.apply(source, intensity)?;
        let mosaic = EffectType::Mosaic.apply(source, intensity)?;
        Ok(Self { generation, intensity, blur, mosaic })
    }

    /// Paint source for regions using `effect`.
    pub fn layer(&self, effect: EffectType) -> &FrameBuffer {
        match effect {
            EffectType::Blur => &self.blur,
            EffectType::Mosaic => &self.mosaic,
        }
    }
}

/// Holds the current layers; replaced wholesale, never edited in place.
#[derive(Debug, Default)]
pub struct LayerCache {
    current: Option<Rc<EffectLayers>>,
    recomputes: usize,
}

impl LayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers for `(generation, intensity)`, recomputing only on a key change.
    pub fn refresh(
        &mut self,
        source: &FrameBuffer,
        generation: u64,
        intensity: u32,
    ) -> Result<Rc<EffectLayers>, Error> {
        let intensity = clamp_intensity(intensity);
        if let Some(layers) = &self.current {
            if layers.generation == generation && layers.intensity == intensity {
                return Ok(Rc::clone(layers));
            }
        }

        log::debug!("recomputing effect layers (image #{generation}, intensity {intensity})");
        let layers = Rc::new(EffectLayers::compute(source, generation, intensity)?);
        // Anyone still holding the old Rc keeps reading the old buffers.
        self.current = Some(Rc::clone(&layers));
        self.recomputes += 1;
        Ok(layers)
    }

    /// How many times layers were actually rebuilt.
    pub fn recompute_count(&self) -> usize {
        self.recomputes
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }
}
