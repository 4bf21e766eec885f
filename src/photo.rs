// Turns file bytes into a buffer the window can show, and back into PNG.
// Alpha in the source is dropped: the editor works on opaque RGB.

use crate::error::Error;
use crate::types::{pack_rgb, unpack_rgb, FrameBuffer};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Decode any format the `image` crate knows into 0x00RRGGBB pixels.
pub fn decode(bytes: &[u8]) -> Result<FrameBuffer, Error> {
    let img = image::load_from_memory(bytes).map_err(|e| Error::Decode(e.to_string()))?;
    let rgb = img.to_rgb8();
    let (w, h) = rgb.dimensions();
    if w == 0 || h == 0 {
        return Err(Error::ZeroDimensions);
    }

    let mut out = Vec::with_capacity((w as usize) * (h as usize));
    for pixel in rgb.pixels() {
        out.push(pack_rgb(pixel[0], pixel[1], pixel[2]));
    }

    Ok(FrameBuffer { width: w as usize, height: h as usize, pixels: out })
}

pub fn load(path: &Path) -> Result<FrameBuffer, Error> {
    let bytes = std::fs::read(path)?;
    let fb = decode(&bytes)?;
    log::info!("loaded {} ({}x{})", path.display(), fb.width, fb.height);
    Ok(fb)
}

/// Encode a buffer as PNG bytes.
pub fn encode_png(fb: &FrameBuffer) -> Result<Vec<u8>, Error> {
    if fb.width == 0 || fb.height == 0 {
        return Err(Error::ZeroDimensions);
    }
    let img = RgbImage::from_fn(fb.width as u32, fb.height as u32, |x, y| {
        let (r, g, b) = unpack_rgb(fb.get(x as usize, y as usize));
        Rgb([r, g, b])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: usize, h: usize) -> FrameBuffer {
        let mut fb = FrameBuffer::filled(w, h, 0);
        for y in 0..h {
            for x in 0..w {
                if (x + y) % 2 == 0 {
                    fb.pixels[y * w + x] = pack_rgb(200, 100, 50);
                }
            }
        }
        fb
    }

    #[test]
    fn png_output_decodes_to_the_same_pixels() {
        let fb = checker(7, 5);
        let png = encode_png(&fb).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(decode(&png).unwrap(), fb);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(decode(b"not an image"), Err(Error::Decode(_))));
    }

    #[test]
    fn empty_buffer_cannot_be_encoded() {
        let fb = FrameBuffer::filled(0, 0, 0);
        assert!(matches!(encode_png(&fb), Err(Error::ZeroDimensions)));
    }
}
