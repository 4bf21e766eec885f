// Pointer gestures on the canvas.
//
// `Idle -> Armed` (add mode on) `-> Drawing -> Idle` draws a new region;
// `Idle -> Dragging -> Idle` moves an existing one. Moves only touch local
// state (preview box, drag candidate); the store is written once, on release.
// Leaving the surface finishes a gesture exactly like releasing does.

use crate::config::{DELETE_HANDLE_RADIUS, MIN_DRAWN_SIZE};
use crate::coords::{CoordinateMapper, Layout};
use crate::regions::RegionStore;
use crate::types::{EffectType, Point, Rect, RegionId};

/// What the pointer is currently doing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    Idle,
    /// Add mode on, waiting for the first press.
    Armed,
    Drawing { anchor: Point, preview: Rect },
    Dragging { id: RegionId, offset: Point, origin: Point },
}

/// What the caller has to redo after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Nothing,
    /// Only the overlay (preview box / drag candidate) moved.
    Overlay,
    /// The region store changed; re-composite.
    Store,
}

/// Mapper plus the layout it should use for this event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub mapper: CoordinateMapper,
    pub layout: Layout,
}

impl Viewport {
    fn to_image(&self, pointer: Point) -> Option<Point> {
        self.mapper.screen_to_image(pointer, &self.layout.canvas)
    }

    /// Pointer position relative to the overlay layer.
    fn to_overlay(&self, pointer: Point) -> Point {
        Point::new(pointer.x - self.layout.overlay.left, pointer.y - self.layout.overlay.top)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarkerKind {
    Region(EffectType),
    Preview,
}

/// One outline to draw over the canvas, in overlay coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    pub id: Option<RegionId>,
    pub rect: Rect,
    pub kind: MarkerKind,
    pub delete_handle: Option<Point>,
}

#[derive(Debug)]
pub struct Interaction {
    gesture: Gesture,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self { gesture: Gesture::Idle }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_add_mode(&self) -> bool {
        matches!(self.gesture, Gesture::Armed | Gesture::Drawing { .. })
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.gesture, Gesture::Drawing { .. } | Gesture::Dragging { .. })
    }

    /// Flip add mode. Ignored in the middle of a gesture.
    pub fn toggle_add_mode(&mut self) {
        self.gesture = match self.gesture {
            Gesture::Idle => Gesture::Armed,
            Gesture::Armed => Gesture::Idle,
            other => other,
        };
    }

    /// Back to idle, dropping any local preview or candidate.
    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
    }

    pub fn pointer_down(&mut self, pointer: Point, view: &Viewport, store: &mut RegionStore) -> Outcome {
        match self.gesture {
            Gesture::Armed => {
                let Some(anchor) = view.to_image(pointer) else { return Outcome::Nothing };
                self.gesture = Gesture::Drawing { anchor, preview: Rect::new(anchor.x, anchor.y, 0.0, 0.0) };
                Outcome::Overlay
            }
            Gesture::Idle => self.press_on_regions(pointer, view, store),
            // A second press mid-gesture (e.g. another button) is ignored.
            _ => Outcome::Nothing,
        }
    }

    pub fn pointer_move(&mut self, pointer: Point, view: &Viewport) -> Outcome {
        let Some(current) = view.to_image(pointer) else { return Outcome::Nothing };
        match &mut self.gesture {
            Gesture::Drawing { anchor, preview } => {
                let next = Rect::from_corners(*anchor, current);
                if next == *preview {
                    return Outcome::Nothing;
                }
                *preview = next;
                Outcome::Overlay
            }
            Gesture::Dragging { offset, origin, .. } => {
                let next = Point::new(current.x - offset.x, current.y - offset.y);
                if next == *origin {
                    return Outcome::Nothing;
                }
                *origin = next;
                Outcome::Overlay
            }
            _ => Outcome::Nothing,
        }
    }

    /// Finish the gesture at `pointer`, committing to the store.
    pub fn pointer_up(&mut self, pointer: Point, view: &Viewport, store: &mut RegionStore) -> Outcome {
        self.pointer_move(pointer, view);
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Drawing { preview, .. } => {
                if preview.width > MIN_DRAWN_SIZE && preview.height > MIN_DRAWN_SIZE {
                    let region = store.new_region(preview, false);
                    log::debug!("drew region {:?} at {:?}", region.id, preview);
                    if store.add(region) {
                        return Outcome::Store;
                    }
                } else {
                    log::trace!("discarding {:.1}x{:.1} draw", preview.width, preview.height);
                }
                Outcome::Overlay
            }
            Gesture::Dragging { id, origin, .. } => {
                let unchanged = store.get(id).is_some_and(|r| r.bounds.x == origin.x && r.bounds.y == origin.y);
                if unchanged {
                    return Outcome::Overlay;
                }
                log::debug!("moved region {id:?} to ({:.1}, {:.1})", origin.x, origin.y);
                if store.move_to(id, origin) { Outcome::Store } else { Outcome::Overlay }
            }
            // Release while armed keeps add mode on.
            Gesture::Armed => {
                self.gesture = Gesture::Armed;
                Outcome::Nothing
            }
            Gesture::Idle => Outcome::Nothing,
        }
    }

    /// Pointer left the surface: same as releasing it there.
    pub fn pointer_leave(&mut self, pointer: Point, view: &Viewport, store: &mut RegionStore) -> Outcome {
        self.pointer_up(pointer, view, store)
    }

    /// Live box being drawn, in image coordinates.
    pub fn preview(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Drawing { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Region being dragged and where it currently sits (not yet committed).
    pub fn drag_candidate(&self) -> Option<(RegionId, Point)> {
        match self.gesture {
            Gesture::Dragging { id, origin, .. } => Some((id, origin)),
            _ => None,
        }
    }

    /// Delete handles first (they sit above every region body), then the
    /// topmost region body.
    fn press_on_regions(&mut self, pointer: Point, view: &Viewport, store: &mut RegionStore) -> Outcome {
        let Some(image_pt) = view.to_image(pointer) else { return Outcome::Nothing };
        let local = view.to_overlay(pointer);

        let handle_hit = store.regions().iter().rev().find_map(|region| {
            let handle = handle_center(&region.bounds, view)?;
            (distance(handle, local) <= DELETE_HANDLE_RADIUS).then_some(region.id)
        });
        if let Some(id) = handle_hit {
            // The delete click must not also start a drag.
            store.remove(id);
            log::debug!("removed region {id:?}");
            return Outcome::Store;
        }

        match store.hit_test(image_pt).map(|r| (r.id, r.bounds)) {
            Some((id, bounds)) => {
                let offset = Point::new(image_pt.x - bounds.x, image_pt.y - bounds.y);
                self.gesture = Gesture::Dragging { id, offset, origin: Point::new(bounds.x, bounds.y) };
                Outcome::Overlay
            }
            None => Outcome::Nothing,
        }
    }

    /// Everything the overlay should show, in overlay coordinates.
    pub fn markers(&self, store: &RegionStore, view: &Viewport) -> Vec<Marker> {
        let show_handles = !self.is_add_mode();
        let candidate = self.drag_candidate();
        let mut out = Vec::with_capacity(store.len() + 1);

        for region in store.regions() {
            let bounds = match candidate {
                Some((id, origin)) if id == region.id => region.moved_to(origin).bounds,
                _ => region.bounds,
            };
            let Some(rect) = view.mapper.rect_to_screen(&bounds, &view.layout) else { continue };
            out.push(Marker {
                id: Some(region.id),
                rect,
                kind: MarkerKind::Region(region.effect_type),
                delete_handle: if show_handles { Some(Point::new(rect.x + rect.width, rect.y)) } else { None },
            });
        }

        if let Some(preview) = self.preview() {
            if let Some(rect) = view.mapper.rect_to_screen(&preview, &view.layout) {
                out.push(Marker { id: None, rect, kind: MarkerKind::Preview, delete_handle: None });
            }
        }
        out
    }
}

/// Top-right corner of a region's on-screen box.
fn handle_center(bounds: &Rect, view: &Viewport) -> Option<Point> {
    let rect = view.mapper.rect_to_screen(bounds, &view.layout)?;
    Some(Point::new(rect.x + rect.width, rect.y))
}

fn distance(a: Point, b: Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::DisplayBox;

    /// 400x200 image shown at half size, 10px into the overlay.
    fn view() -> Viewport {
        Viewport {
            mapper: CoordinateMapper::new(400, 200),
            layout: Layout {
                canvas: DisplayBox::new(10.0, 10.0, 200.0, 100.0),
                overlay: DisplayBox::new(0.0, 0.0, 220.0, 120.0),
            },
        }
    }

    /// Screen point for an image point under `view()`.
    fn at(x: f64, y: f64) -> Point {
        Point::new(10.0 + x / 2.0, 10.0 + y / 2.0)
    }

    #[test]
    fn add_mode_toggles() {
        let mut ix = Interaction::new();
        ix.toggle_add_mode();
        assert_eq!(ix.gesture(), Gesture::Armed);
        ix.toggle_add_mode();
        assert_eq!(ix.gesture(), Gesture::Idle);
    }

    #[test]
    fn press_without_add_mode_on_empty_canvas_does_nothing() {
        let mut ix = Interaction::new();
        let mut store = RegionStore::default();
        assert_eq!(ix.pointer_down(at(50.0, 50.0), &view(), &mut store), Outcome::Nothing);
        assert_eq!(ix.gesture(), Gesture::Idle);
    }

    #[test]
    fn drawing_previews_then_commits() {
        let (mut ix, mut store, v) = (Interaction::new(), RegionStore::default(), view());
        ix.toggle_add_mode();
        ix.pointer_down(at(100.0, 80.0), &v, &mut store);
        assert_eq!(ix.pointer_move(at(40.0, 20.0), &v), Outcome::Overlay);
        assert_eq!(ix.preview(), Some(Rect::new(40.0, 20.0, 60.0, 60.0)));
        assert!(store.is_empty());

        assert_eq!(ix.pointer_up(at(40.0, 20.0), &v, &mut store), Outcome::Store);
        assert_eq!(ix.gesture(), Gesture::Idle);
        let r = &store.regions()[0];
        assert_eq!(r.bounds, Rect::new(40.0, 20.0, 60.0, 60.0));
        assert!(!r.is_auto);
    }

    #[test]
    fn tiny_draw_is_discarded_and_disarms() {
        let (mut ix, mut store, v) = (Interaction::new(), RegionStore::default(), view());
        ix.toggle_add_mode();
        ix.pointer_down(at(100.0, 100.0), &v, &mut store);
        ix.pointer_up(at(104.0, 150.0), &v, &mut store);
        assert!(store.is_empty());
        assert_eq!(ix.gesture(), Gesture::Idle);
    }

    #[test]
    fn drag_commits_only_on_release() {
        let (mut ix, mut store, v) = (Interaction::new(), RegionStore::default(), view());
        let r = store.new_region(Rect::new(100.0, 50.0, 80.0, 80.0), true);
        let id = r.id;
        store.add(r);

        assert_eq!(ix.pointer_down(at(140.0, 90.0), &v, &mut store), Outcome::Overlay);
        assert_eq!(ix.pointer_move(at(160.0, 100.0), &v), Outcome::Overlay);
        assert_eq!(store.get(id).unwrap().bounds.x, 100.0);
        assert_eq!(ix.drag_candidate(), Some((id, Point::new(120.0, 60.0))));

        assert_eq!(ix.pointer_up(at(170.0, 110.0), &v, &mut store), Outcome::Store);
        let moved = store.get(id).unwrap();
        assert_eq!((moved.bounds.x, moved.bounds.y), (130.0, 70.0));
        assert_eq!((moved.bounds.width, moved.bounds.height), (80.0, 80.0));
        assert!(moved.is_auto);
    }

    #[test]
    fn leaving_the_surface_finalizes_like_release() {
        let (mut ix, mut store, v) = (Interaction::new(), RegionStore::default(), view());
        ix.toggle_add_mode();
        ix.pointer_down(at(10.0, 10.0), &v, &mut store);
        assert_eq!(ix.pointer_leave(at(90.0, 70.0), &v, &mut store), Outcome::Store);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn leaving_the_surface_mid_drag_commits_the_move() {
        let (mut ix, mut store, v) = (Interaction::new(), RegionStore::default(), view());
        let r = store.new_region(Rect::new(100.0, 50.0, 80.0, 80.0), false);
        let id = r.id;
        store.add(r);

        ix.pointer_down(at(140.0, 90.0), &v, &mut store);
        ix.pointer_move(at(150.0, 95.0), &v);
        assert_eq!(ix.pointer_leave(at(180.0, 110.0), &v, &mut store), Outcome::Store);
        assert_eq!(ix.gesture(), Gesture::Idle);
        let moved = store.get(id).unwrap();
        assert_eq!((moved.bounds.x, moved.bounds.y), (100.0 + 40.0, 50.0 + 20.0));
    }

    #[test]
    fn delete_handle_removes_without_dragging() {
        let (mut ix, mut store, v) = (Interaction::new(), RegionStore::default(), view());
        let r = store.new_region(Rect::new(100.0, 50.0, 80.0, 80.0), false);
        store.add(r);
        // top-right corner of the box: image (180, 50)
        assert_eq!(ix.pointer_down(at(180.0, 50.0), &v, &mut store), Outcome::Store);
        assert!(store.is_empty());
        assert_eq!(ix.gesture(), Gesture::Idle);
    }

    #[test]
    fn regions_are_not_grabbed_in_add_mode() {
        let (mut ix, mut store, v) = (Interaction::new(), RegionStore::default(), view());
        let r = store.new_region(Rect::new(100.0, 50.0, 80.0, 80.0), false);
        store.add(r);
        ix.toggle_add_mode();
        ix.pointer_down(at(140.0, 90.0), &v, &mut store);
        assert!(matches!(ix.gesture(), Gesture::Drawing { .. }));
        assert!(ix.markers(&store, &v).iter().all(|m| m.delete_handle.is_none()));
    }

    #[test]
    fn markers_follow_the_drag_candidate() {
        let (mut ix, mut store, v) = (Interaction::new(), RegionStore::default(), view());
        let r = store.new_region(Rect::new(100.0, 50.0, 80.0, 80.0), false);
        store.add(r);
        ix.pointer_down(at(140.0, 90.0), &v, &mut store);
        ix.pointer_move(at(160.0, 90.0), &v);
        let markers = ix.markers(&store, &v);
        assert_eq!(markers.len(), 1);
        // image x 120 -> overlay 10 + 60
        assert_eq!(markers[0].rect, Rect::new(70.0, 35.0, 40.0, 40.0));
        assert_eq!(markers[0].delete_handle, Some(Point::new(110.0, 35.0)));
    }
}
