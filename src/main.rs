// What you SEE:
// • The photo, letterboxed under a two-line HUD. Detected faces get dashed ellipses.
// • A: add mode, then drag to draw an ellipse. Drag an ellipse to move it; its red dot deletes it.
// • B / M switch every region to blur / mosaic. Up / Down change the strength.
// • D re-runs face detection. R starts over with the same photo.
// • S opens the save dialog: Y ticks "I checked the result", Enter writes the PNG, Esc cancels.
// • Esc (no dialog) quits.

use clap::Parser;
use minifb::Key;
use privacy_blur::config::{clamp_intensity, Cli, INTENSITY_STEP};
use privacy_blur::coords::{DisplayBox, Layout};
use privacy_blur::detector::{FaceBox, FaceDetector};
use privacy_blur::draw::{self, Drawer};
use privacy_blur::error::Error;
use privacy_blur::export::now_millis;
use privacy_blur::photo;
use privacy_blur::session::{DetectionTicket, Session};
use privacy_blur::types::{EffectType, FrameBuffer, Point};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Instant;

const HUD_HEIGHT: usize = 32;
const MIN_WINDOW_WIDTH: usize = 480;
const HUD_BG: u32 = 0x00_10_10_14;
const NOTICE_BG: u32 = 0x00_40_10_10;

/// A detection pass running on a worker thread.
struct PendingDetection {
    ticket: DetectionTicket,
    rx: Receiver<Result<Vec<FaceBox>, Error>>,
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    /* --- Photo + session ---
       Visual: nothing yet; the composite starts as the untouched photo. */
    let original = photo::load(&cli.input)?;
    let mut session = Session::new(cli.effect.into(), cli.intensity);
    session.load_image(original.clone())?;

    /* --- Face detector ---
       Visual: if this fails, a red notice stays at the bottom of the window. */
    let mut notice: Option<String> = None;
    let detector = match load_detector(&cli) {
        Ok(Some(d)) => Some(d),
        Ok(None) => {
            notice = Some("NO FACE MODEL (--MODEL): DRAW REGIONS WITH A".into());
            None
        }
        Err(e) => {
            log::error!("{e}");
            notice = Some("FACE DETECTION UNAVAILABLE: DRAW REGIONS WITH A".into());
            None
        }
    };
    let mut pending: Option<PendingDetection> = None;
    if let Some(d) = auto_detector(&detector, cli.no_detect) {
        pending = start_detection(&mut session, d);
    }

    /* --- Window --- */
    let (win_w, win_h) = initial_window_size(&original, cli.max_width, cli.max_height);
    let mut drawer = Drawer::new("Privacy Blur", win_w, win_h)?;
    let mut screen = FrameBuffer::filled(win_w, win_h, draw::BACKDROP);

    let mut button_was_down = false;
    let mut last_pointer = Point::default();

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() {
        let now = Instant::now();

        // Layout is recomputed every frame: the window may have been resized.
        let (ww, wh) = drawer.size();
        if screen.width != ww || screen.height != wh {
            screen = FrameBuffer::filled(ww, wh, draw::BACKDROP);
        }
        let layout = layout_for(ww, wh, &original);

        /* 1) Collect a finished detection pass. */
        if let Some(p) = pending.take() {
            match p.rx.try_recv() {
                Ok(result) => finish(&mut session, p.ticket, result, &mut notice),
                Err(TryRecvError::Empty) => pending = Some(p),
                Err(TryRecvError::Disconnected) => {
                    let lost = Err(Error::Detection("detector thread exited".into()));
                    finish(&mut session, p.ticket, lost, &mut notice);
                }
            }
        }

        /* 2) Keys */
        if session.export_gate().is_open() {
            if drawer.pressed_once(Key::Escape) {
                session.cancel_export();
            } else if drawer.pressed_once(Key::Y) {
                let ticked = session.export_gate().is_confirmed();
                session.set_export_confirmed(!ticked);
            } else if drawer.pressed_once(Key::Enter) {
                match session.export(now_millis()) {
                    Ok(Some(artifact)) => match artifact.write_to(&cli.out) {
                        Ok(path) => println!("Saved {}", path.display()),
                        Err(e) => log::error!("could not write export: {e}"),
                    },
                    Ok(None) => {} // not confirmed: Enter does nothing
                    Err(e) => log::error!("export failed: {e}"),
                }
            }
        } else {
            if drawer.pressed_once(Key::Escape) {
                break;
            }
            if drawer.pressed_once(Key::A) {
                session.toggle_add_mode();
            }
            if drawer.pressed_once(Key::B) {
                session.set_effect_type(EffectType::Blur)?;
            }
            if drawer.pressed_once(Key::M) {
                session.set_effect_type(EffectType::Mosaic)?;
            }
            if drawer.pressed_repeating(Key::Up) {
                session.set_intensity(clamp_intensity(session.intensity() + INTENSITY_STEP), now);
            }
            if drawer.pressed_repeating(Key::Down) {
                session.set_intensity(clamp_intensity(session.intensity().saturating_sub(INTENSITY_STEP)), now);
            }
            if drawer.pressed_once(Key::D) {
                match &detector {
                    Some(d) if pending.is_none() => pending = start_detection(&mut session, d),
                    Some(_) => log::debug!("detection already running"),
                    None => log::info!("no face detector loaded"),
                }
            }
            if drawer.pressed_once(Key::S) {
                session.open_export();
            }
            if drawer.pressed_once(Key::R) {
                // "Choose another photo": the session forgets everything, then we
                // hand it the file again.
                session.reset();
                pending = None;
                session.load_image(original.clone())?;
                if let Some(d) = auto_detector(&detector, cli.no_detect) {
                    pending = start_detection(&mut session, d);
                }
            }
        }

        /* 3) Pointer → gestures (mouse leaving the window = release). */
        let down = drawer.left_mouse_down();
        let pos = drawer.mouse_pos();
        if !session.export_gate().is_open() {
            if down && !button_was_down {
                if let Some(p) = pos {
                    session.pointer_down(p, layout)?;
                }
            } else if session.interaction().is_busy() {
                match pos {
                    None => { session.pointer_leave(last_pointer, layout)?; }
                    Some(p) if !down => { session.pointer_up(p, layout)?; }
                    Some(p) => { session.pointer_move(p, layout); }
                }
            }
        }
        button_was_down = down;
        if let Some(p) = pos {
            last_pointer = p;
        }

        /* 4) Rebuild effect layers once the strength keys have been quiet a while. */
        session.tick(now)?;

        /* 5) Paint: composite, markers, crosshair, HUD, dialog. */
        screen.pixels.fill(draw::BACKDROP);
        if let Some(composite) = session.composite() {
            draw::blit_scaled(&mut screen, composite, &layout.canvas);
        }
        draw::draw_markers(&mut screen, &session.markers(layout));
        if session.interaction().is_add_mode() {
            if let Some(p) = pos {
                draw::draw_crosshair(&mut screen, p.x as i32, p.y as i32, 12, draw::CROSSHAIR);
            }
        }
        draw_hud(&mut screen, &session, pending.is_some());
        if let Some(text) = &notice {
            draw_notice(&mut screen, text);
        }
        if session.export_gate().is_open() {
            draw_save_dialog(&mut screen, session.export_gate().is_confirmed());
        }

        /* 6) Present. */
        drawer.present(&screen)?;
    }

    Ok(())
}

#[cfg(feature = "rustface")]
fn load_detector(cli: &Cli) -> Result<Option<Arc<dyn FaceDetector>>, Error> {
    match &cli.model {
        Some(path) => {
            let detector = privacy_blur::RustfaceDetector::from_path(path)?;
            Ok(Some(Arc::new(detector)))
        }
        None => Ok(None),
    }
}

#[cfg(not(feature = "rustface"))]
fn load_detector(cli: &Cli) -> Result<Option<Arc<dyn FaceDetector>>, Error> {
    match &cli.model {
        Some(_) => Err(Error::DetectorUnavailable("built without the `rustface` feature".into())),
        None => Ok(None),
    }
}

/// Detector to run by itself after a photo loads. `--no-detect` leaves
/// detection to the D key.
fn auto_detector(detector: &Option<Arc<dyn FaceDetector>>, no_detect: bool) -> Option<&Arc<dyn FaceDetector>> {
    detector.as_ref().filter(|_| !no_detect)
}

/// Kick off detection on a worker thread. The session stays on this thread.
fn start_detection(session: &mut Session, detector: &Arc<dyn FaceDetector>) -> Option<PendingDetection> {
    let ticket = match session.begin_detection() {
        Ok(t) => t,
        Err(e) => {
            log::warn!("cannot start detection: {e}");
            return None;
        }
    };
    let image = Arc::clone(ticket.image());
    let detector = Arc::clone(detector);
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        // The receiver may be gone after a reset; nothing to do then.
        let _ = tx.send(detector.detect(&image));
    });
    Some(PendingDetection { ticket, rx })
}

fn finish(
    session: &mut Session,
    ticket: DetectionTicket,
    result: Result<Vec<FaceBox>, Error>,
    notice: &mut Option<String>,
) {
    match session.finish_detection(ticket, result) {
        Ok(Some(n)) => {
            println!("Found {n} face(s)");
            *notice = None;
        }
        Ok(None) => {}
        Err(_) => *notice = Some("FACE DETECTION FAILED: PRESS D TO RETRY".into()),
    }
}

/// Fit the photo into the max size (never upscaled), plus the HUD bar.
fn initial_window_size(photo: &FrameBuffer, max_w: usize, max_h: usize) -> (usize, usize) {
    let avail_h = max_h.saturating_sub(HUD_HEIGHT).max(1);
    let scale = (max_w as f64 / photo.width as f64)
        .min(avail_h as f64 / photo.height as f64)
        .min(1.0);
    let w = ((photo.width as f64 * scale).round() as usize).max(MIN_WINDOW_WIDTH);
    let h = (photo.height as f64 * scale).round() as usize + HUD_HEIGHT;
    (w, h)
}

/// The overlay is the whole window; the canvas is letterboxed below the HUD.
fn layout_for(ww: usize, wh: usize, photo: &FrameBuffer) -> Layout {
    let overlay = DisplayBox::new(0.0, 0.0, ww as f64, wh as f64);
    let area = DisplayBox::new(0.0, HUD_HEIGHT as f64, ww as f64, wh.saturating_sub(HUD_HEIGHT) as f64);
    Layout { canvas: area.fit(photo.width as f64, photo.height as f64), overlay }
}

fn draw_hud(screen: &mut FrameBuffer, session: &Session, detecting: bool) {
    let sw = screen.width as i32;
    draw::fill_rect(screen, 0, 0, sw, HUD_HEIGHT as i32, HUD_BG);

    let mode = if session.interaction().is_add_mode() { "ADD MODE: DRAG TO DRAW" } else { "EDIT" };
    let busy = if detecting { " | FINDING FACES..." } else { "" };
    let status = format!(
        "{mode} | {} {}PX | {} REGIONS{busy}",
        session.effect_type().label(),
        session.intensity(),
        session.store().len(),
    );
    draw::draw_text_5x7(screen, 8, 5, &status, draw::WHITE);
    draw::draw_text_5x7(
        screen,
        8,
        19,
        "A ADD  B BLUR  M MOSAIC  UP/DOWN SIZE  D DETECT  S SAVE  R RESET  ESC QUIT",
        0x00_A0_A0_A8,
    );
}

/// Red bar along the bottom edge.
fn draw_notice(screen: &mut FrameBuffer, text: &str) {
    let (sw, y) = (screen.width as i32, screen.height as i32 - 12);
    draw::fill_rect(screen, 0, y - 4, sw, 16, NOTICE_BG);
    draw::draw_text_5x7(screen, 8, y, text, draw::WHITE);
}

fn draw_save_dialog(screen: &mut FrameBuffer, confirmed: bool) {
    let lines = [
        "SAVE AS PNG".to_string(),
        String::new(),
        "FACE DETECTION CAN MISS FACES.".to_string(),
        "CHECK THE RESULT BEFORE SHARING IT.".to_string(),
        String::new(),
        format!("[{}] Y: I CHECKED IT", if confirmed { "X" } else { " " }),
        String::new(),
        (if confirmed { "ENTER: SAVE   ESC: CANCEL" } else { "ESC: CANCEL" }).to_string(),
    ];
    let w = lines.iter().map(|l| draw::text_width(l)).max().unwrap_or(0) + 32;
    let h = lines.len() as i32 * 12 + 24;
    let x = (screen.width as i32 - w) / 2;
    let y = (screen.height as i32 - h) / 2;
    draw::fill_rect(screen, x, y, w, h, 0x00_30_30_36);
    for (i, line) in lines.iter().enumerate() {
        draw::draw_text_5x7(screen, x + 16, y + 12 + i as i32 * 12, line, draw::WHITE);
    }
}
