// Core types shared by the store, the compositor and the window.

/// A raster the window can show directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,      // intrinsic width in pixels
    pub height: usize,     // intrinsic height in pixels
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// Solid-colour buffer of the given size.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    #[inline]
    pub fn same_size(&self, other: &FrameBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }
}

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
pub fn unpack_rgb(px: u32) -> (u8, u8, u8) {
    (((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
}

/// A point, either in image-intrinsic or in screen pixels depending on context.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box: top-left corner plus extent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Box spanned by two corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// True when `p` lies inside the ellipse inscribed in this box.
    pub fn ellipse_contains(&self, p: Point) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let rx = self.width / 2.0;
        let ry = self.height / 2.0;
        let dx = (p.x - (self.x + rx)) / rx;
        let dy = (p.y - (self.y + ry)) / ry;
        dx * dx + dy * dy <= 1.0
    }
}

/// Which obscuring effect a region uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EffectType {
    #[default]
    Blur,
    Mosaic,
}

impl EffectType {
    pub fn label(self) -> &'static str {
        match self {
            EffectType::Blur => "BLUR",
            EffectType::Mosaic => "MOSAIC",
        }
    }
}

/// Stable handle for a region; never reused after deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u64);

/// An obscured area. Coordinates are image-intrinsic; it renders as the
/// ellipse inscribed in `bounds`.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub id: RegionId,
    pub bounds: Rect,
    pub is_auto: bool,          // true = came from face detection
    pub effect_type: EffectType,
    pub intensity: u32,         // blur radius or mosaic cell size, in [5, 80]
}

impl Region {
    /// Same region moved so its top-left corner sits at `origin`.
    pub fn moved_to(&self, origin: Point) -> Self {
        let mut r = self.clone();
        r.bounds.x = origin.x;
        r.bounds.y = origin.y;
        r
    }
}
