// Top-level editing session.
//
// Owns the photo and everything derived from it: the region store, the
// effect layers, the current composite, the pointer state and the save
// dialog. All mutation goes through here so the composite is re-rendered
// exactly when committed data changes.

use crate::compositor::Compositor;
use crate::config::{clamp_intensity, INTENSITY_SETTLE};
use crate::coords::{CoordinateMapper, Layout};
use crate::debounce::Debounced;
use crate::detector::{FaceBox, FaceDetector};
use crate::error::Error;
use crate::export::{ExportArtifact, ExportGate};
use crate::interaction::{Interaction, Marker, Outcome, Viewport};
use crate::layers::LayerCache;
use crate::regions::RegionStore;
use crate::types::{EffectType, FrameBuffer, Point};
use std::sync::Arc;
use std::time::Instant;

/// Handed out by [`Session::begin_detection`]; ties results to the one pass
/// that was started for them. Not `Clone`: each pass is finished once.
#[derive(Debug)]
pub struct DetectionTicket {
    pass: u64,
    image: Arc<FrameBuffer>,
}

impl DetectionTicket {
    pub fn image(&self) -> &Arc<FrameBuffer> {
        &self.image
    }
}

pub struct Session {
    image: Option<Arc<FrameBuffer>>,
    generation: u64,               // bumped on every load/reset
    store: RegionStore,
    layers: LayerCache,
    intensity: Debounced<u32>,     // committed = what the layers are built at
    interaction: Interaction,
    export: ExportGate,
    compositor: Compositor,
    composite: Option<FrameBuffer>,
    passes: u64,                   // detection passes started so far
    detecting: Option<u64>,        // id of the outstanding pass
}

impl Session {
    pub fn new(effect: EffectType, intensity: u32) -> Self {
        let intensity = clamp_intensity(intensity);
        Self {
            image: None,
            generation: 0,
            store: RegionStore::new(effect, intensity),
            layers: LayerCache::new(),
            intensity: Debounced::new(intensity, INTENSITY_SETTLE),
            interaction: Interaction::new(),
            export: ExportGate::default(),
            compositor: Compositor::new(),
            composite: None,
            passes: 0,
            detecting: None,
        }
    }

    /// Start over with a new photo. Regions, layers and gestures all go.
    pub fn load_image(&mut self, image: FrameBuffer) -> Result<(), Error> {
        if image.width == 0 || image.height == 0 {
            return Err(Error::ZeroDimensions);
        }
        self.discard();
        self.intensity.flush();
        self.image = Some(Arc::new(image));
        self.render()
    }

    /// Drop the photo and everything derived from it.
    pub fn reset(&mut self) {
        self.discard();
        log::info!("session reset");
    }

    fn discard(&mut self) {
        self.generation += 1;
        self.image = None;
        self.store.clear();
        self.layers.invalidate();
        self.interaction.reset();
        self.export.cancel();
        self.composite = None;
        self.detecting = None;
    }

    /* ---------------------------- effect controls ---------------------------- */

    /// Switch effect for new regions and every existing one.
    pub fn set_effect_type(&mut self, effect: EffectType) -> Result<(), Error> {
        self.store.set_effect_type(effect);
        self.render()
    }

    /// Slider input. New regions pick it up at once; the layers are rebuilt
    /// by [`Session::tick`] after the input settles.
    pub fn set_intensity(&mut self, value: u32, now: Instant) {
        let value = clamp_intensity(value);
        self.store.set_intensity(value);
        self.intensity.propose(value, now);
    }

    /// Commit a settled intensity. Returns true when the composite changed.
    pub fn tick(&mut self, now: Instant) -> Result<bool, Error> {
        match self.intensity.poll(now) {
            Some(value) => {
                log::debug!("intensity settled at {value}");
                self.render()?;
                Ok(self.image.is_some())
            }
            None => Ok(false),
        }
    }

    fn render(&mut self) -> Result<(), Error> {
        let Some(image) = &self.image else { return Ok(()) };
        let layers = self.layers.refresh(image, self.generation, *self.intensity.committed())?;
        self.composite = Some(self.compositor.render(image, self.store.regions(), &layers)?);
        Ok(())
    }

    /* ------------------------------- pointer -------------------------------- */

    pub fn viewport(&self, layout: Layout) -> Option<Viewport> {
        let image = self.image.as_ref()?;
        Some(Viewport { mapper: CoordinateMapper::new(image.width, image.height), layout })
    }

    pub fn toggle_add_mode(&mut self) {
        if self.image.is_some() {
            self.interaction.toggle_add_mode();
        }
    }

    pub fn pointer_down(&mut self, pointer: Point, layout: Layout) -> Result<Outcome, Error> {
        if self.detecting.is_some() {
            log::debug!("pointer ignored while detection runs");
            return Ok(Outcome::Nothing);
        }
        let Some(view) = self.viewport(layout) else { return Ok(Outcome::Nothing) };
        let outcome = self.interaction.pointer_down(pointer, &view, &mut self.store);
        self.after(outcome)
    }

    pub fn pointer_move(&mut self, pointer: Point, layout: Layout) -> Outcome {
        match self.viewport(layout) {
            Some(view) => self.interaction.pointer_move(pointer, &view),
            None => Outcome::Nothing,
        }
    }

    pub fn pointer_up(&mut self, pointer: Point, layout: Layout) -> Result<Outcome, Error> {
        let Some(view) = self.viewport(layout) else { return Ok(Outcome::Nothing) };
        let outcome = self.interaction.pointer_up(pointer, &view, &mut self.store);
        self.after(outcome)
    }

    pub fn pointer_leave(&mut self, pointer: Point, layout: Layout) -> Result<Outcome, Error> {
        let Some(view) = self.viewport(layout) else { return Ok(Outcome::Nothing) };
        let outcome = self.interaction.pointer_leave(pointer, &view, &mut self.store);
        self.after(outcome)
    }

    fn after(&mut self, outcome: Outcome) -> Result<Outcome, Error> {
        if outcome == Outcome::Store {
            self.render()?;
        }
        Ok(outcome)
    }

    pub fn markers(&self, layout: Layout) -> Vec<Marker> {
        match self.viewport(layout) {
            Some(view) => self.interaction.markers(&self.store, &view),
            None => Vec::new(),
        }
    }

    /* ------------------------------ detection ------------------------------- */

    /// Mark a detection pass as running. Only one may be outstanding.
    pub fn begin_detection(&mut self) -> Result<DetectionTicket, Error> {
        if self.detecting.is_some() {
            return Err(Error::DetectionBusy);
        }
        let image = self.image.clone().ok_or(Error::NoImage)?;
        // Results replace the store wholesale, so no gesture may be in flight.
        self.interaction.reset();
        self.passes += 1;
        self.detecting = Some(self.passes);
        log::info!("detection pass #{} on {}x{} image", self.passes, image.width, image.height);
        Ok(DetectionTicket { pass: self.passes, image })
    }

    /// Apply (or drop) the outcome of a pass.
    ///
    /// `Ok(Some(n))`: store replaced with `n` auto regions. `Ok(None)`: the
    /// ticket is not the outstanding pass (the photo changed meanwhile) and
    /// the results were thrown away. `Err`: the detector failed; the store
    /// is left as it was.
    pub fn finish_detection(
        &mut self,
        ticket: DetectionTicket,
        result: Result<Vec<FaceBox>, Error>,
    ) -> Result<Option<usize>, Error> {
        if self.detecting != Some(ticket.pass) {
            log::debug!("dropping results of detection pass #{}", ticket.pass);
            return Ok(None);
        }
        self.detecting = None;

        let faces = match result {
            Ok(faces) => faces,
            Err(e) => {
                log::warn!("face detection failed: {e}");
                return Err(e);
            }
        };
        let n = self.store.replace_with_auto(faces.iter().map(FaceBox::bounds));
        log::info!("detected {} face(s), {n} usable", faces.len());
        self.render()?;
        Ok(Some(n))
    }

    /// Run `detector` right here and apply its result.
    pub fn detect_with(&mut self, detector: &dyn FaceDetector) -> Result<Option<usize>, Error> {
        let ticket = self.begin_detection()?;
        let result = detector.detect(ticket.image());
        self.finish_detection(ticket, result)
    }

    pub fn is_detecting(&self) -> bool {
        self.detecting.is_some()
    }

    /* -------------------------------- export -------------------------------- */

    pub fn open_export(&mut self) {
        if self.composite.is_some() {
            self.export.open();
        }
    }

    pub fn set_export_confirmed(&mut self, confirmed: bool) {
        self.export.set_confirmed(confirmed);
    }

    pub fn cancel_export(&mut self) {
        self.export.cancel();
    }

    pub fn export_gate(&self) -> &ExportGate {
        &self.export
    }

    /// Export the current composite if the disclaimer was just confirmed.
    pub fn export(&mut self, timestamp_ms: u128) -> Result<Option<ExportArtifact>, Error> {
        match &self.composite {
            Some(composite) => self.export.export(composite, timestamp_ms),
            None => Ok(None),
        }
    }

    /* ------------------------------- readers -------------------------------- */

    pub fn image(&self) -> Option<&FrameBuffer> {
        self.image.as_deref()
    }

    pub fn composite(&self) -> Option<&FrameBuffer> {
        self.composite.as_ref()
    }

    pub fn store(&self) -> &RegionStore {
        &self.store
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn effect_type(&self) -> EffectType {
        self.store.effect_type()
    }

    /// Slider position (may not be committed yet).
    pub fn intensity(&self) -> u32 {
        *self.intensity.latest()
    }

    /// Intensity the current layers were built at.
    pub fn committed_intensity(&self) -> u32 {
        *self.intensity.committed()
    }

    pub fn layer_recomputes(&self) -> usize {
        self.layers.recompute_count()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EffectType::default(), crate::config::DEFAULT_INTENSITY)
    }
}
