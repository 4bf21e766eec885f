// sRGB <-> linear lookup tables for the anti-aliased ellipse rim.
// Mixing in linear light keeps the rim from looking darker than either side.

use crate::types::{pack_rgb, unpack_rgb};

pub struct GammaLut {
    srgb_to_linear: [f32; 256],
    // 4096-step quantization of linear 0..1
    linear_to_srgb: [u8; 4096],
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}

impl GammaLut {
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, slot) in s2l.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut l2s = [0u8; 4096];
        for (i, slot) in l2s.iter_mut().enumerate() {
            let l = i as f32 / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }

    /// `a` of `over` on top of `under`, both packed 0x00RRGGBB.
    #[inline]
    pub fn mix(&self, under: u32, over: u32, a: f32) -> u32 {
        if a <= 0.0 {
            return under;
        }
        if a >= 1.0 {
            return over;
        }
        let (ur, ug, ub) = unpack_rgb(under);
        let (or, og, ob) = unpack_rgb(over);
        let inv = 1.0 - a;
        let ch = |u: u8, o: u8| {
            self.linear_to_srgb_u8(a * self.srgb_u8_to_linear(o) + inv * self.srgb_u8_to_linear(u))
        };
        pack_rgb(ch(ur, or), ch(ug, og), ch(ub, ob))
    }
}
