use privacy_blur::coords::{CoordinateMapper, DisplayBox, Layout};
use privacy_blur::types::pack_rgb;
use privacy_blur::{
    EffectType, Error, FaceBox, FaceDetector, FrameBuffer, Gesture, Outcome, Point, Rect, Session,
};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const W: usize = 120;
const H: usize = 80;

/// Photo with enough structure that blur and mosaic both change it.
fn photo() -> FrameBuffer {
    let mut fb = FrameBuffer::filled(W, H, 0);
    for y in 0..H {
        for x in 0..W {
            let v = if (x / 4 + y / 4) % 2 == 0 { 230 } else { 20 };
            fb.pixels[y * W + x] = pack_rgb(v, (x * 2) as u8, (y * 3) as u8);
        }
    }
    fb
}

/// Canvas shown 1:1, offset 10px inside the overlay.
fn layout() -> Layout {
    Layout {
        canvas: DisplayBox::new(10.0, 10.0, W as f64, H as f64),
        overlay: DisplayBox::new(0.0, 0.0, W as f64 + 20.0, H as f64 + 20.0),
    }
}

/// Screen point for image point (x, y) under `layout()`.
fn at(x: f64, y: f64) -> Point {
    Point::new(x + 10.0, y + 10.0)
}

fn loaded() -> Session {
    let mut s = Session::new(EffectType::Blur, 20);
    s.load_image(photo()).unwrap();
    s
}

fn draw(s: &mut Session, from: (f64, f64), to: (f64, f64)) -> Outcome {
    s.toggle_add_mode();
    s.pointer_down(at(from.0, from.1), layout()).unwrap();
    s.pointer_move(at(to.0, to.1), layout());
    s.pointer_up(at(to.0, to.1), layout()).unwrap()
}

/// Returns a fixed list of boxes, or fails.
struct FakeDetector {
    boxes: Mutex<Vec<Vec<FaceBox>>>,
}

impl FakeDetector {
    fn answering(runs: Vec<Vec<FaceBox>>) -> Self {
        Self { boxes: Mutex::new(runs) }
    }
}

impl FaceDetector for FakeDetector {
    fn detect(&self, _image: &FrameBuffer) -> Result<Vec<FaceBox>, Error> {
        let mut runs = self.boxes.lock().unwrap();
        if runs.is_empty() {
            return Err(Error::Detection("model crashed".into()));
        }
        Ok(runs.remove(0))
    }
}

fn face(x: f64, y: f64, w: f64, h: f64) -> FaceBox {
    FaceBox { x, y, width: w, height: h, confidence: 0.9 }
}

#[test]
fn small_draws_never_create_regions() {
    let mut s = loaded();
    for (dx, dy) in [(5.0, 40.0), (40.0, 5.0), (2.0, 2.0), (0.0, 0.0)] {
        draw(&mut s, (30.0, 30.0), (30.0 + dx, 30.0 + dy));
        assert_eq!(s.store().len(), 0, "{dx}x{dy} should be discarded");
        assert_eq!(s.interaction().gesture(), Gesture::Idle);
    }
}

#[test]
fn large_draw_creates_one_manual_region_with_current_defaults() {
    let mut s = loaded();
    s.set_effect_type(EffectType::Mosaic).unwrap();
    s.set_intensity(45, Instant::now());

    assert_eq!(draw(&mut s, (70.0, 60.0), (20.0, 10.0)), Outcome::Store);
    let regions = s.store().regions();
    assert_eq!(regions.len(), 1);
    let r = &regions[0];
    assert_eq!(r.bounds, Rect::new(20.0, 10.0, 50.0, 50.0));
    assert!(!r.is_auto);
    assert_eq!(r.effect_type, EffectType::Mosaic);
    assert_eq!(r.intensity, 45);
}

#[test]
fn committed_region_changes_the_composite_inside_its_ellipse_only() {
    let mut s = loaded();
    draw(&mut s, (20.0, 20.0), (80.0, 70.0));
    let out = s.composite().unwrap();
    let original = photo();
    let inside = (50..52).any(|x| out.get(x, 45) != original.get(x, 45));
    assert!(inside);
    assert_eq!(out.get(0, 0), original.get(0, 0));
    assert_eq!(out.get(W - 1, H - 1), original.get(W - 1, H - 1));
}

#[test]
fn effect_switch_applies_to_existing_regions() {
    let mut s = loaded();
    draw(&mut s, (10.0, 10.0), (40.0, 40.0));
    draw(&mut s, (60.0, 10.0), (100.0, 40.0));
    s.set_effect_type(EffectType::Mosaic).unwrap();
    s.set_effect_type(EffectType::Mosaic).unwrap();
    assert!(s.store().regions().iter().all(|r| r.effect_type == EffectType::Mosaic));
}

#[test]
fn intensity_change_keeps_existing_region_intensity() {
    let mut s = loaded();
    draw(&mut s, (10.0, 10.0), (40.0, 40.0));
    s.set_intensity(70, Instant::now());
    assert_eq!(s.store().regions()[0].intensity, 20);
    draw(&mut s, (60.0, 10.0), (100.0, 40.0));
    assert_eq!(s.store().regions()[1].intensity, 70);
}

#[test]
fn drag_moves_by_pointer_delta_and_commits_once() {
    let mut s = loaded();
    draw(&mut s, (20.0, 20.0), (60.0, 60.0));
    let id = s.store().regions()[0].id;
    let composite_before = s.composite().unwrap().clone();

    let p0 = (40.0, 40.0);
    let p1 = (55.0, 30.0);
    assert_eq!(s.pointer_down(at(p0.0, p0.1), layout()).unwrap(), Outcome::Overlay);
    for step in 1..=5 {
        let t = step as f64 / 5.0;
        s.pointer_move(at(p0.0 + (p1.0 - p0.0) * t, p0.1 + (p1.1 - p0.1) * t), layout());
        let r = s.store().get(id).unwrap();
        assert_eq!((r.bounds.x, r.bounds.y), (20.0, 20.0), "moves must not touch the store");
        assert_eq!(s.composite().unwrap(), &composite_before);
    }
    assert_eq!(s.pointer_up(at(p1.0, p1.1), layout()).unwrap(), Outcome::Store);

    let r = s.store().get(id).unwrap();
    assert!((r.bounds.x - (20.0 + p1.0 - p0.0)).abs() < 1e-9);
    assert!((r.bounds.y - (20.0 + p1.1 - p0.1)).abs() < 1e-9);
    assert_ne!(s.composite().unwrap(), &composite_before);
}

#[test]
fn burst_of_intensity_changes_recomputes_layers_once() {
    let mut s = loaded();
    let base = s.layer_recomputes();
    let t0 = Instant::now();
    for i in 0..8u64 {
        let now = t0 + Duration::from_millis(20 * i);
        s.set_intensity(25 + 5 * i as u32, now);
        assert!(!s.tick(now).unwrap());
    }
    assert_eq!(s.layer_recomputes(), base);
    assert_eq!(s.committed_intensity(), 20);

    let settled = t0 + Duration::from_millis(20 * 7 + 200);
    assert!(s.tick(settled).unwrap());
    assert_eq!(s.layer_recomputes(), base + 1);
    assert_eq!(s.committed_intensity(), 60);
    assert!(!s.tick(settled + Duration::from_secs(1)).unwrap());
    assert_eq!(s.layer_recomputes(), base + 1);
}

#[test]
fn dragging_or_switching_effect_reuses_layers() {
    let mut s = loaded();
    let base = s.layer_recomputes();
    draw(&mut s, (20.0, 20.0), (60.0, 60.0));
    s.pointer_down(at(40.0, 40.0), layout()).unwrap();
    s.pointer_move(at(50.0, 50.0), layout());
    s.pointer_up(at(50.0, 50.0), layout()).unwrap();
    s.set_effect_type(EffectType::Mosaic).unwrap();
    assert_eq!(s.layer_recomputes(), base);
}

#[test]
fn detection_replaces_previous_results() {
    let mut s = loaded();
    draw(&mut s, (10.0, 10.0), (40.0, 40.0));
    let detector = FakeDetector::answering(vec![
        vec![face(1.0, 1.0, 20.0, 20.0), face(50.0, 10.0, 30.0, 30.0), face(90.0, 40.0, 20.0, 25.0)],
        vec![face(60.0, 30.0, 40.0, 40.0)],
    ]);

    assert_eq!(s.detect_with(&detector).unwrap(), Some(3));
    assert!(s.store().regions().iter().all(|r| r.is_auto));

    assert_eq!(s.detect_with(&detector).unwrap(), Some(1));
    let regions = s.store().regions();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].bounds, Rect::new(60.0, 30.0, 40.0, 40.0));
    assert_eq!(regions[0].effect_type, EffectType::Blur);
    assert_eq!(regions[0].intensity, 20);
}

#[test]
fn failed_detection_leaves_the_store_alone() {
    let mut s = loaded();
    draw(&mut s, (10.0, 10.0), (40.0, 40.0));
    let before = s.store().regions().to_vec();
    let detector = FakeDetector::answering(vec![]);
    assert!(matches!(s.detect_with(&detector), Err(Error::Detection(_))));
    assert_eq!(s.store().regions(), &before[..]);
    assert!(!s.is_detecting());
}

#[test]
fn only_one_detection_at_a_time_and_gestures_wait() {
    let mut s = loaded();
    let ticket = s.begin_detection().unwrap();
    assert!(matches!(s.begin_detection(), Err(Error::DetectionBusy)));

    s.toggle_add_mode();
    assert_eq!(s.pointer_down(at(10.0, 10.0), layout()).unwrap(), Outcome::Nothing);

    s.finish_detection(ticket, Ok(vec![face(5.0, 5.0, 30.0, 30.0)])).unwrap();
    assert!(!s.is_detecting());
    assert_eq!(s.store().len(), 1);
}

#[test]
fn results_for_a_replaced_photo_are_dropped() {
    let mut s = loaded();
    let ticket = s.begin_detection().unwrap();
    s.load_image(photo()).unwrap();
    assert_eq!(s.finish_detection(ticket, Ok(vec![face(5.0, 5.0, 30.0, 30.0)])).unwrap(), None);
    assert!(s.store().is_empty());
}

#[test]
fn an_abandoned_pass_cannot_finish_the_running_one() {
    let mut s = loaded();
    let abandoned = s.begin_detection().unwrap();
    s.load_image(photo()).unwrap();
    let running = s.begin_detection().unwrap();

    let late = s.finish_detection(abandoned, Ok(vec![face(5.0, 5.0, 30.0, 30.0), face(50.0, 5.0, 30.0, 30.0)]));
    assert_eq!(late.unwrap(), None);
    assert!(s.is_detecting());
    assert!(s.store().is_empty());
    assert!(matches!(s.begin_detection(), Err(Error::DetectionBusy)));

    assert_eq!(s.finish_detection(running, Ok(vec![face(60.0, 30.0, 40.0, 40.0)])).unwrap(), Some(1));
    assert!(!s.is_detecting());
}

#[test]
fn export_needs_fresh_confirmation() {
    let mut s = loaded();
    s.open_export();
    assert_eq!(s.export(1).unwrap(), None);

    s.set_export_confirmed(true);
    let artifact = s.export(1_234).unwrap().expect("one artifact");
    assert_eq!(artifact.filename, "student-privacy-blur-1234.png");
    assert_eq!(&artifact.png[1..4], b"PNG");
    assert!(!s.export_gate().is_confirmed());
    assert!(!s.export_gate().is_open());
    assert_eq!(s.export(1_235).unwrap(), None);
}

#[test]
fn exported_png_matches_the_composite() {
    let mut s = loaded();
    draw(&mut s, (20.0, 20.0), (80.0, 70.0));
    s.open_export();
    s.set_export_confirmed(true);
    let artifact = s.export(1).unwrap().unwrap();
    let decoded = privacy_blur::photo::decode(&artifact.png).unwrap();
    assert_eq!(&decoded, s.composite().unwrap());
}

#[test]
fn reset_discards_everything() {
    let mut s = loaded();
    draw(&mut s, (10.0, 10.0), (40.0, 40.0));
    s.reset();
    assert!(s.image().is_none());
    assert!(s.composite().is_none());
    assert!(s.store().is_empty());
    assert_eq!(s.pointer_down(at(20.0, 20.0), layout()).unwrap(), Outcome::Nothing);
}

#[test]
fn delete_handle_click_removes_region() {
    let mut s = loaded();
    draw(&mut s, (20.0, 20.0), (60.0, 60.0));
    // Handle sits on the box's top-right corner: image (60, 20).
    assert_eq!(s.pointer_down(at(60.0, 20.0), layout()).unwrap(), Outcome::Store);
    assert!(s.store().is_empty());
    assert_eq!(s.interaction().gesture(), Gesture::Idle);
    assert_eq!(s.composite().unwrap(), &photo());
}

#[test]
fn pointer_and_overlay_coordinates_round_trip_under_letterboxing() {
    // 400x200 photo letterboxed at half size, 30px below the overlay's top.
    let mapper = CoordinateMapper::new(400, 200);
    let layout = Layout {
        canvas: DisplayBox::new(15.0, 40.0, 200.0, 100.0),
        overlay: DisplayBox::new(5.0, 10.0, 230.0, 140.0),
    };
    for (x, y) in [(0.0, 0.0), (123.0, 45.5), (399.0, 199.0), (200.0, 100.0)] {
        let overlay_pt = mapper.image_to_screen(Point::new(x, y), &layout).unwrap();
        // Overlay coordinates are relative to the overlay box; add it back for the pointer.
        let pointer = Point::new(overlay_pt.x + layout.overlay.left, overlay_pt.y + layout.overlay.top);
        let back = mapper.screen_to_image(pointer, &layout.canvas).unwrap();
        assert!((back.x - x).abs() < 1e-9 && (back.y - y).abs() < 1e-9, "({x}, {y}) -> {back:?}");
    }
}

#[test]
fn markers_show_the_drag_candidate_but_the_store_keeps_the_old_box() {
    let mut s = loaded();
    draw(&mut s, (20.0, 20.0), (60.0, 60.0));
    s.pointer_down(at(40.0, 40.0), layout()).unwrap();
    s.pointer_move(at(50.0, 45.0), layout());

    let markers = s.markers(layout());
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].rect, Rect::new(40.0, 35.0, 40.0, 40.0));
    assert_eq!(s.store().regions()[0].bounds, Rect::new(20.0, 20.0, 40.0, 40.0));
}
