// Image-intrinsic pixels <-> on-screen pixels.
// Boxes are passed on every call: the window can be resized between events,
// so nothing about the layout is remembered here.

use crate::types::{Point, Rect};

/// Where something sits on screen, in screen pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayBox {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Largest box with the given aspect that fits inside `self`, centred.
    pub fn fit(&self, content_w: f64, content_h: f64) -> DisplayBox {
        if content_w <= 0.0 || content_h <= 0.0 {
            return DisplayBox::new(self.left, self.top, 0.0, 0.0);
        }
        let scale = (self.width / content_w).min(self.height / content_h);
        let (w, h) = (content_w * scale, content_h * scale);
        DisplayBox::new(self.left + (self.width - w) / 2.0, self.top + (self.height - h) / 2.0, w, h)
    }
}

/// The two boxes the mapper needs: the displayed canvas, and the overlay
/// layer the region markers are positioned in.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Layout {
    pub canvas: DisplayBox,
    pub overlay: DisplayBox,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    pub intrinsic_width: f64,
    pub intrinsic_height: f64,
}

impl CoordinateMapper {
    pub fn new(intrinsic_width: usize, intrinsic_height: usize) -> Self {
        Self { intrinsic_width: intrinsic_width as f64, intrinsic_height: intrinsic_height as f64 }
    }

    /// Pointer position (screen) to image coordinates.
    /// `None` while the canvas has no on-screen size.
    pub fn screen_to_image(&self, pointer: Point, canvas: &DisplayBox) -> Option<Point> {
        if canvas.width <= 0.0 || canvas.height <= 0.0 {
            return None;
        }
        let scale_x = self.intrinsic_width / canvas.width;
        let scale_y = self.intrinsic_height / canvas.height;
        Some(Point::new((pointer.x - canvas.left) * scale_x, (pointer.y - canvas.top) * scale_y))
    }

    /// Image coordinates to a position inside the overlay layer.
    pub fn image_to_screen(&self, p: Point, layout: &Layout) -> Option<Point> {
        let (sx, sy) = self.display_scale(&layout.canvas)?;
        let off_x = layout.canvas.left - layout.overlay.left;
        let off_y = layout.canvas.top - layout.overlay.top;
        Some(Point::new(p.x * sx + off_x, p.y * sy + off_y))
    }

    /// Inverse of `image_to_screen`: overlay-layer position to image coordinates.
    pub fn overlay_to_image(&self, p: Point, layout: &Layout) -> Option<Point> {
        let canvas = &layout.canvas;
        let screen = Point::new(p.x + layout.overlay.left, p.y + layout.overlay.top);
        self.screen_to_image(screen, canvas)
    }

    /// Overlay placement for a region box.
    pub fn rect_to_screen(&self, r: &Rect, layout: &Layout) -> Option<Rect> {
        let (sx, sy) = self.display_scale(&layout.canvas)?;
        let origin = self.image_to_screen(Point::new(r.x, r.y), layout)?;
        Some(Rect::new(origin.x, origin.y, r.width * sx, r.height * sy))
    }

    fn display_scale(&self, canvas: &DisplayBox) -> Option<(f64, f64)> {
        if self.intrinsic_width <= 0.0 || self.intrinsic_height <= 0.0 {
            return None;
        }
        Some((canvas.width / self.intrinsic_width, canvas.height / self.intrinsic_height))
    }
}
