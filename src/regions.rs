// The canonical list of obscured regions plus the session-wide defaults
// (effect + intensity) that new regions are stamped with.

use crate::config::{clamp_intensity, DEFAULT_INTENSITY};
use crate::types::{EffectType, Point, Rect, Region, RegionId};
use std::collections::HashSet;

#[derive(Debug)]
pub struct RegionStore {
    regions: Vec<Region>,   // insertion order = paint order
    effect: EffectType,     // default for new regions, applied retroactively on change
    intensity: u32,         // default for new regions only
    next_id: u64,           // monotonic; ids are never handed out twice
    retired: HashSet<RegionId>, // deleted ids, refused by `add`
}

impl Default for RegionStore {
    fn default() -> Self {
        Self::new(EffectType::default(), DEFAULT_INTENSITY)
    }
}

impl RegionStore {
    pub fn new(effect: EffectType, intensity: u32) -> Self {
        Self {
            regions: Vec::new(),
            effect,
            intensity: clamp_intensity(intensity),
            next_id: 1,
            retired: HashSet::new(),
        }
    }

    /// Build a region with a fresh id and the current defaults. Not stored yet.
    pub fn new_region(&mut self, bounds: Rect, is_auto: bool) -> Region {
        let id = RegionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        Region { id, bounds, is_auto, effect_type: self.effect, intensity: self.intensity }
    }

    /// Append a region. Degenerate boxes, duplicate ids and ids of deleted
    /// regions are ignored.
    pub fn add(&mut self, mut region: Region) -> bool {
        if region.bounds.is_degenerate() {
            log::debug!("ignoring degenerate region {:?}", region.bounds);
            return false;
        }
        if self.get(region.id).is_some() {
            log::warn!("ignoring region with duplicate id {:?}", region.id);
            return false;
        }
        if self.retired.contains(&region.id) {
            log::warn!("ignoring region with deleted id {:?}", region.id);
            return false;
        }
        // Ids allocated elsewhere must not collide with ones we hand out later.
        let Some(after) = region.id.0.checked_add(1) else {
            log::warn!("ignoring region with id {:?}: id space exhausted", region.id);
            return false;
        };
        self.next_id = self.next_id.max(after);
        region.intensity = clamp_intensity(region.intensity);
        self.regions.push(region);
        true
    }

    /// Remove by id; returns whether anything was removed.
    pub fn remove(&mut self, id: RegionId) -> bool {
        let before = self.regions.len();
        self.regions.retain(|r| r.id != id);
        let removed = before != self.regions.len();
        if removed {
            self.retired.insert(id);
        }
        removed
    }

    /// Replace the region with the same id by `region` (whole value, not a patch).
    pub fn update(&mut self, mut region: Region) -> bool {
        if region.bounds.is_degenerate() {
            return false;
        }
        match self.regions.iter_mut().find(|r| r.id == region.id) {
            Some(slot) => {
                region.intensity = clamp_intensity(region.intensity);
                *slot = region;
                true
            }
            None => false,
        }
    }

    /// Convenience for drag commits: move a region's origin.
    pub fn move_to(&mut self, id: RegionId, origin: Point) -> bool {
        match self.get(id) {
            Some(r) => {
                let moved = r.moved_to(origin);
                self.update(moved)
            }
            None => false,
        }
    }

    /// Set the default effect and overwrite it on every existing region.
    pub fn set_effect_type(&mut self, effect: EffectType) {
        self.effect = effect;
        for r in &mut self.regions {
            r.effect_type = effect;
        }
    }

    /// Set the default intensity for regions created from now on.
    /// Existing regions keep theirs.
    pub fn set_intensity(&mut self, value: u32) {
        self.intensity = clamp_intensity(value);
    }

    /// Swap the whole list for one auto region per box (detection results).
    pub fn replace_with_auto(&mut self, boxes: impl IntoIterator<Item = Rect>) -> usize {
        self.clear();
        for bounds in boxes {
            let region = self.new_region(bounds, true);
            self.add(region);
        }
        self.regions.len()
    }

    pub fn clear(&mut self) {
        self.retired.extend(self.regions.drain(..).map(|r| r.id));
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn effect_type(&self) -> EffectType {
        self.effect
    }

    pub fn intensity(&self) -> u32 {
        self.intensity
    }

    /// Topmost region whose ellipse contains `p` (image coordinates).
    pub fn hit_test(&self, p: Point) -> Option<&Region> {
        self.regions.iter().rev().find(|r| r.bounds.ellipse_contains(p))
    }
}
