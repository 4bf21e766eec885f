// Whole-image filters that produce the effect layers.
// Visual: `box_blur_rgb` gives the soft "frosted" look, `mosaic_rgb` the blocky one.
use crate::error::Error;
use crate::types::{pack_rgb, EffectType, FrameBuffer};

/// Mosaic cells never get smaller than this, whatever intensity says.
const MIN_MOSAIC_CELL: u32 = 2;

impl EffectType {
    /// Filter the whole `src` with this effect at `intensity`.
    pub fn apply(self, src: &FrameBuffer, intensity: u32) -> Result<FrameBuffer, Error> {
        match self {
            EffectType::Blur => {
                let mut tmp = FrameBuffer::filled(src.width, src.height, 0);
                let mut dst = FrameBuffer::filled(src.width, src.height, 0);
                box_blur_rgb(src, &mut tmp, &mut dst, intensity as usize)?;
                Ok(dst)
            }
            EffectType::Mosaic => mosaic_rgb(src, intensity),
        }
    }
}

#[inline]
fn channels_u32(p: u32) -> (u32, u32, u32) {
    ((p >> 16) & 0xFF, (p >> 8) & 0xFF, p & 0xFF)
}

pub fn box_blur_rgb(
    src: &FrameBuffer,      // input (the source photo)
    tmp: &mut FrameBuffer,  // horizontal pass result (scratch)
    dst: &mut FrameBuffer,  // final blurred output
    radius: usize,          // blur amount; bigger = softer
) -> Result<(), Error> {
    if !src.same_size(dst) {
        return Err(Error::SizeMismatch("box_blur: src vs dst".into()));
    }
    if !src.same_size(tmp) {
        return Err(Error::SizeMismatch("box_blur: src vs tmp".into()));
    }
    if src.width == 0 || src.height == 0 {
        return Ok(());
    }
    let w = src.width as i32;
    let h = src.height as i32;
    let r = radius as i32;
    let win = (2 * r + 1) as u32; // window width for averaging (constant everywhere)

    /* ---- Pass 1: Horizontal (store averaged rows in tmp) ---- */
    for y in 0..h {
        let row_ofs = (y as usize) * (w as usize);

        // Edge pixel value at x=0 (we "extend" edges to avoid dark borders)
        let (r0, g0, b0) = channels_u32(src.pixels[row_ofs]);
        let (mut sr, mut sg, mut sb) = (r0 * (r as u32 + 1), g0 * (r as u32 + 1), b0 * (r as u32 + 1));

        // Prime the right side of the initial window [0..r]
        for x in 1..=r {
            let xr = x.min(w - 1) as usize;
            let (pr, pg, pb) = channels_u32(src.pixels[row_ofs + xr]);
            sr += pr;
            sg += pg;
            sb += pb;
        }

        // Slide the window across the row
        for x in 0..w {
            tmp.pixels[row_ofs + x as usize] = ((sr / win) << 16) | ((sg / win) << 8) | (sb / win);

            let left_x = (x - r).max(0) as usize;
            let right_x = (x + r + 1).min(w - 1) as usize;
            let (ar, ag, ab) = channels_u32(src.pixels[row_ofs + right_x]);
            let (dr, dg, db) = channels_u32(src.pixels[row_ofs + left_x]);
            sr = sr + ar - dr;
            sg = sg + ag - dg;
            sb = sb + ab - db;
        }
    }

    /* ---- Pass 2: Vertical (read tmp, write dst) ---- */
    let stride = w as usize;
    for x in 0..w {
        let col = x as usize;
        let (r0, g0, b0) = channels_u32(tmp.pixels[col]);
        let (mut sr, mut sg, mut sb) = (r0 * (r as u32 + 1), g0 * (r as u32 + 1), b0 * (r as u32 + 1));

        for y in 1..=r {
            let yr = y.min(h - 1) as usize;
            let (pr, pg, pb) = channels_u32(tmp.pixels[yr * stride + col]);
            sr += pr;
            sg += pg;
            sb += pb;
        }

        for y in 0..h {
            dst.pixels[(y as usize) * stride + col] = ((sr / win) << 16) | ((sg / win) << 8) | (sb / win);

            let top_y = (y - r).max(0) as usize;
            let bottom_y = (y + r + 1).min(h - 1) as usize;
            let (ar, ag, ab) = channels_u32(tmp.pixels[bottom_y * stride + col]);
            let (dr, dg, db) = channels_u32(tmp.pixels[top_y * stride + col]);
            sr = sr + ar - dr;
            sg = sg + ag - dg;
            sb = sb + ab - db;
        }
    }

    Ok(())
}

/// Blocky version of `src`: area-average into a ceil(W/cell) x ceil(H/cell)
/// grid, then blow it back up with nearest-neighbour.
pub fn mosaic_rgb(src: &FrameBuffer, cell: u32) -> Result<FrameBuffer, Error> {
    let (w, h) = (src.width, src.height);
    if w == 0 || h == 0 {
        return Err(Error::ZeroDimensions);
    }
    let cell = cell.max(MIN_MOSAIC_CELL) as usize;
    let cols = w.div_ceil(cell);
    let rows = h.div_ceil(cell);

    // Which grid cell each pixel column/row falls into.
    let col_of: Vec<usize> = (0..w).map(|x| x * cols / w).collect();
    let row_of: Vec<usize> = (0..h).map(|y| y * rows / h).collect();

    /* 1) Downsample: sum channels per cell, then divide by pixel count. */
    let mut sums = vec![(0u64, 0u64, 0u64, 0u64); cols * rows];
    for y in 0..h {
        let row_base = row_of[y] * cols;
        for x in 0..w {
            let (r, g, b) = channels_u32(src.pixels[y * w + x]);
            let s = &mut sums[row_base + col_of[x]];
            s.0 += r as u64;
            s.1 += g as u64;
            s.2 += b as u64;
            s.3 += 1;
        }
    }
    let cells: Vec<u32> = sums
        .iter()
        .map(|&(r, g, b, n)| {
            let n = n.max(1);
            pack_rgb((r / n) as u8, (g / n) as u8, (b / n) as u8)
        })
        .collect();

    /* 2) Upsample with nearest-neighbour (no smoothing => hard block edges). */
    let mut out = Vec::with_capacity(w * h);
    for y in 0..h {
        let row_base = row_of[y] * cols;
        for x in 0..w {
            out.push(cells[row_base + col_of[x]]);
        }
    }

    Ok(FrameBuffer { width: w, height: h, pixels: out })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: usize, h: usize) -> FrameBuffer {
        let mut fb = FrameBuffer::filled(w, h, 0);
        for y in 0..h {
            for x in 0..w {
                let v = ((x * 255) / w.max(1)) as u8;
                fb.pixels[y * w + x] = pack_rgb(v, (y % 256) as u8, 255 - v);
            }
        }
        fb
    }

    #[test]
    fn blur_keeps_flat_image_flat() {
        let src = FrameBuffer::filled(17, 9, pack_rgb(10, 200, 90));
        let out = EffectType::Blur.apply(&src, 5).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn blur_softens_a_hard_edge() {
        let mut src = FrameBuffer::filled(20, 1, 0);
        for x in 10..20 {
            src.pixels[x] = pack_rgb(255, 255, 255);
        }
        let out = EffectType::Blur.apply(&src, 3).unwrap();
        let (left, _, _) = crate::types::unpack_rgb(out.pixels[9]);
        let (right, _, _) = crate::types::unpack_rgb(out.pixels[10]);
        assert!(left > 0 && left < 255);
        assert!(right > 0 && right < 255);
        assert_eq!(out.pixels[0], 0);
        assert_eq!(out.pixels[19], pack_rgb(255, 255, 255));
    }

    #[test]
    fn blur_rejects_mismatched_scratch() {
        let src = FrameBuffer::filled(4, 4, 0);
        let mut tmp = FrameBuffer::filled(3, 4, 0);
        let mut dst = FrameBuffer::filled(4, 4, 0);
        assert!(matches!(box_blur_rgb(&src, &mut tmp, &mut dst, 2), Err(Error::SizeMismatch(_))));
    }

    #[test]
    fn mosaic_cells_are_uniform_blocks() {
        let src = gradient(40, 20);
        let out = mosaic_rgb(&src, 10).unwrap();
        assert_eq!((out.width, out.height), (40, 20));
        // Every pixel of the first 10x10 block shares one colour.
        let first = out.get(0, 0);
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(out.get(x, y), first);
            }
        }
        assert_ne!(out.get(0, 0), out.get(39, 0));
    }

    #[test]
    fn mosaic_grid_rounds_up_partial_cells() {
        // 25 / 10 -> 3 columns, so the last column is its own colour.
        let src = gradient(25, 5);
        let out = mosaic_rgb(&src, 10).unwrap();
        let distinct: std::collections::BTreeSet<u32> = (0..25).map(|x| out.get(x, 0)).collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn mosaic_cell_has_a_floor() {
        let src = gradient(8, 8);
        assert_eq!(mosaic_rgb(&src, 0).unwrap(), mosaic_rgb(&src, 2).unwrap());
    }
}
