//! Shared test fixtures: images generated in memory, plus a hand-assembled
//! animated WebP container.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! std::fs::write(tmp.path().join("hero.jpg"), jpeg_bytes(640, 480, 95)).unwrap();
//! std::fs::write(tmp.path().join("loader.webp"), animated_webp_bytes(10)).unwrap();
//! ```

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, Frame, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Still images
// =========================================================================

/// Smooth RGB gradient; compresses well and decodes deterministically
pub fn gradient_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_with(&gradient_image(width, height), ImageFormat::Png)
}

pub fn tiff_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_with(&gradient_image(width, height), ImageFormat::Tiff)
}

pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    gradient_image(width, height)
        .write_with_encoder(encoder)
        .unwrap();
    buf
}

fn encode_with(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, format).unwrap();
    cursor.into_inner()
}

/// TIFF with two pages (two IFDs)
pub fn two_page_tiff_bytes() -> Vec<u8> {
    use tiff::encoder::{colortype, TiffEncoder};

    let page = gradient_image(16, 16).to_rgb8().into_raw();
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut cursor).unwrap();
        encoder.write_image::<colortype::RGB8>(16, 16, &page).unwrap();
        encoder.write_image::<colortype::RGB8>(16, 16, &page).unwrap();
    }
    cursor.into_inner()
}

// =========================================================================
// Animated WebP
// =========================================================================

fn push_u24(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes()[..3]);
}

/// RIFF chunk: fourcc, little-endian size, payload, pad to even length
fn chunk(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// The `VP8L` chunk (header included) of a still lossless WebP
fn lossless_frame_chunk(width: u32, height: u32) -> Vec<u8> {
    let rgba = gradient_image(width, height).to_rgba8();
    let mut still = Vec::new();
    WebPEncoder::new_lossless(&mut still)
        .encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
        .unwrap();

    let mut pos = 12;
    while pos + 8 <= still.len() {
        let size = u32::from_le_bytes(still[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let end = pos + 8 + size + (size % 2);
        if &still[pos..pos + 4] == b"VP8L" {
            return still[pos..end.min(still.len())].to_vec();
        }
        pos = end;
    }
    panic!("encoder produced no VP8L chunk");
}

/// Animated WebP with `frames` identical 8x8 frames
pub fn animated_webp_bytes(frames: usize) -> Vec<u8> {
    let (w, h) = (8u32, 8u32);
    let frame = lossless_frame_chunk(w, h);

    // VP8X: flags (alpha | animation), 3 reserved bytes, canvas size minus one
    let mut vp8x = vec![0x10 | 0x02, 0, 0, 0];
    push_u24(&mut vp8x, w - 1);
    push_u24(&mut vp8x, h - 1);

    // ANIM: background colour, loop count
    let anim = [0u8, 0, 0, 0, 0, 0];

    let mut body = Vec::new();
    body.extend_from_slice(b"WEBP");
    body.extend(chunk(b"VP8X", &vp8x));
    body.extend(chunk(b"ANIM", &anim));
    for _ in 0..frames {
        let mut anmf = Vec::new();
        push_u24(&mut anmf, 0); // x / 2
        push_u24(&mut anmf, 0); // y / 2
        push_u24(&mut anmf, w - 1);
        push_u24(&mut anmf, h - 1);
        push_u24(&mut anmf, 100); // duration ms
        anmf.push(0); // blend + dispose
        anmf.extend_from_slice(&frame);
        body.extend(chunk(b"ANMF", &anmf));
    }

    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend(body);
    out
}

/// Animated GIF with `frames` 8x8 frames of alternating colour
pub fn animated_gif_bytes(frames: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        let frames = (0..frames).map(|i| {
            let shade = if i % 2 == 0 { 255 } else { 0 };
            Frame::new(RgbaImage::from_pixel(8, 8, Rgba([shade, 0, 255 - shade, 255])))
        });
        encoder.encode_frames(frames).unwrap();
    }
    buf
}

/// Write `count` distinct small JPEGs into `dir`
pub fn write_jpeg_set(dir: &std::path::Path, count: usize) -> Vec<std::path::PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("photo-{i:02}.jpg"));
            std::fs::write(&path, jpeg_bytes(32 + i as u32, 24, 95)).unwrap();
            path
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animated_webp_fixture_is_recognized() {
        let bytes = animated_webp_bytes(10);
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);
        assert_eq!(
            u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize,
            bytes.len() - 8
        );
    }
}
