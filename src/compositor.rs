// Flattens the photo and its regions into one raster.
// Visual: the untouched photo, with each region's ellipse showing the
// blurred or mosaicked layer instead.

use crate::error::Error;
use crate::gamma::GammaLut;
use crate::layers::EffectLayers;
use crate::types::{FrameBuffer, Rect, Region};

pub struct Compositor {
    lut: GammaLut,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self { lut: GammaLut::new() }
    }

    /// Base image, then every region in store order through its ellipse clip.
    pub fn render(
        &self,
        base: &FrameBuffer,
        regions: &[Region],
        layers: &EffectLayers,
    ) -> Result<FrameBuffer, Error> {
        if !base.same_size(&layers.blur) || !base.same_size(&layers.mosaic) {
            return Err(Error::SizeMismatch("compositor: layers vs image".into()));
        }
        let mut out = base.clone();
        for region in regions {
            self.blit_ellipse(&mut out, layers.layer(region.effect_type), region.bounds);
        }
        Ok(out)
    }

    /// Copy `layer` into `out` through the ellipse inscribed in `bounds`.
    pub fn blit_ellipse(&self, out: &mut FrameBuffer, layer: &FrameBuffer, bounds: Rect) {
        // Whole pixels, like the canvas path we draw with.
        let x = bounds.x.round();
        let y = bounds.y.round();
        let w = bounds.width.round();
        let h = bounds.height.round();
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let (rx, ry) = (w / 2.0, h / 2.0);
        let (cx, cy) = (x + rx, y + ry);

        // Only scan the box (plus one pixel of rim) clipped to the image.
        let x0 = (x - 1.0).max(0.0) as usize;
        let y0 = (y - 1.0).max(0.0) as usize;
        let x1 = ((x + w + 1.0).max(0.0) as usize).min(out.width);
        let y1 = ((y + h + 1.0).max(0.0) as usize).min(out.height);

        for py in y0..y1 {
            let row = py * out.width;
            for px in x0..x1 {
                let a = ellipse_coverage(px as f64 + 0.5 - cx, py as f64 + 0.5 - cy, rx, ry);
                if a <= 0.0 {
                    continue;
                }
                let idx = row + px;
                out.pixels[idx] = self.lut.mix(out.pixels[idx], layer.pixels[idx], a as f32);
            }
        }
    }
}

/// Approximate share of a pixel centred at (dx, dy) from the ellipse centre
/// that lies inside the ellipse, from its signed distance to the rim.
fn ellipse_coverage(dx: f64, dy: f64, rx: f64, ry: f64) -> f64 {
    let nx = dx / rx;
    let ny = dy / ry;
    let f = nx * nx + ny * ny - 1.0;
    let gx = 2.0 * dx / (rx * rx);
    let gy = 2.0 * dy / (ry * ry);
    let grad = (gx * gx + gy * gy).sqrt();
    if grad < 1e-9 {
        // centre
        return if f <= 0.0 { 1.0 } else { 0.0 };
    }
    (0.5 - f / grad).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EffectType, RegionId};

    const BASE: u32 = 0x00_00_00_00;
    const BLUR: u32 = 0x00_FF_00_00;
    const MOSAIC: u32 = 0x00_00_00_FF;

    fn layers(w: usize, h: usize) -> EffectLayers {
        EffectLayers {
            generation: 1,
            intensity: 10,
            blur: FrameBuffer::filled(w, h, BLUR),
            mosaic: FrameBuffer::filled(w, h, MOSAIC),
        }
    }

    fn region(id: u64, bounds: Rect, effect_type: EffectType) -> Region {
        Region { id: RegionId(id), bounds, is_auto: false, effect_type, intensity: 10 }
    }

    #[test]
    fn no_regions_gives_the_base_image() {
        let base = FrameBuffer::filled(20, 10, BASE);
        let out = Compositor::new().render(&base, &[], &layers(20, 10)).unwrap();
        assert_eq!(out, base);
    }

    #[test]
    fn ellipse_not_rectangle() {
        let base = FrameBuffer::filled(40, 40, BASE);
        let regions = [region(1, Rect::new(0.0, 0.0, 40.0, 40.0), EffectType::Blur)];
        let out = Compositor::new().render(&base, &regions, &layers(40, 40)).unwrap();
        assert_eq!(out.get(20, 20), BLUR);
        assert_eq!(out.get(0, 0), BASE, "box corner lies outside the ellipse");
        assert_eq!(out.get(39, 39), BASE);
    }

    #[test]
    fn each_region_uses_its_own_layer() {
        let base = FrameBuffer::filled(60, 20, BASE);
        let regions = [
            region(1, Rect::new(0.0, 0.0, 20.0, 20.0), EffectType::Blur),
            region(2, Rect::new(40.0, 0.0, 20.0, 20.0), EffectType::Mosaic),
        ];
        let out = Compositor::new().render(&base, &regions, &layers(60, 20)).unwrap();
        assert_eq!(out.get(10, 10), BLUR);
        assert_eq!(out.get(50, 10), MOSAIC);
        assert_eq!(out.get(30, 10), BASE);
    }

    #[test]
    fn later_regions_paint_over_earlier_ones() {
        let base = FrameBuffer::filled(30, 30, BASE);
        let regions = [
            region(1, Rect::new(0.0, 0.0, 30.0, 30.0), EffectType::Blur),
            region(2, Rect::new(5.0, 5.0, 20.0, 20.0), EffectType::Mosaic),
        ];
        let out = Compositor::new().render(&base, &regions, &layers(30, 30)).unwrap();
        assert_eq!(out.get(15, 15), MOSAIC);
    }

    #[test]
    fn regions_past_the_edge_are_clipped() {
        let base = FrameBuffer::filled(20, 20, BASE);
        let regions = [region(1, Rect::new(10.0, 10.0, 40.0, 40.0), EffectType::Blur)];
        let out = Compositor::new().render(&base, &regions, &layers(20, 20)).unwrap();
        assert_eq!(out.get(19, 19), BLUR);
        assert_eq!(out.get(0, 0), BASE);
    }

    #[test]
    fn size_mismatch_is_an_error() {
        let base = FrameBuffer::filled(20, 20, BASE);
        assert!(matches!(
            Compositor::new().render(&base, &[], &layers(10, 10)),
            Err(Error::SizeMismatch(_))
        ));
    }

    #[test]
    fn coverage_is_full_inside_and_empty_outside() {
        assert_eq!(ellipse_coverage(0.0, 0.0, 10.0, 5.0), 1.0);
        assert_eq!(ellipse_coverage(3.0, 1.0, 10.0, 5.0), 1.0);
        assert_eq!(ellipse_coverage(12.0, 0.0, 10.0, 5.0), 0.0);
        let rim = ellipse_coverage(10.0, 0.0, 10.0, 5.0);
        assert!((rim - 0.5).abs() < 1e-9);
    }
}
