//! Imaging Primitives - Crop, Flip, Resize, Blit
//!
//! Thin wrappers over the `image` crate. The layout engine only sees
//! `RgbaImage` buffers and the `ImageLoader` seam.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::geometry::PlacementRect;

/// Near-white tint treated as product-photo background.
pub const BACKGROUND_COLOR: Rgb<u8> = Rgb([215, 255, 255]);

#[derive(Debug, Error)]
#[error("Image {path} could not be decoded: {source}")]
pub struct DecodeError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

/// Source of decoded images, keyed by path.
pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<RgbaImage, DecodeError>;
}

/// Decodes images from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl ImageLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<RgbaImage, DecodeError> {
        image::open(path)
            .map(|img| img.to_rgba8())
            .map_err(|source| DecodeError { path: path.to_path_buf(), source })
    }
}

/// Mean absolute RGB difference, normalized to `[0, 1]`.
fn distance(pixel: &image::Rgba<u8>, background: Rgb<u8>) -> f64 {
    let sum: u32 = (0..3usize)
        .map(|c| (pixel[c] as i32 - background[c] as i32).unsigned_abs())
        .sum();
    sum as f64 / (3.0 * 255.0)
}

/// Trim rows and columns from every edge while they are background.
///
/// An image with no foreground pixel at all comes back unchanged.
pub fn crop_background(img: &RgbaImage, background: Rgb<u8>, threshold: f64) -> RgbaImage {
    let (width, height) = img.dimensions();
    let is_fg = |x: u32, y: u32| distance(img.get_pixel(x, y), background) > threshold;
    let row_has_fg = |y: u32| (0..width).any(|x| is_fg(x, y));
    let col_has_fg = |x: u32, top: u32, bottom: u32| (top..bottom).any(|y| is_fg(x, y));

    let Some(top) = (0..height).find(|&y| row_has_fg(y)) else {
        return img.clone();
    };
    // A foreground row exists, so the reverse scan finds one too.
    let bottom = (top..height).rev().find(|&y| row_has_fg(y)).unwrap_or(top) + 1;
    let left = (0..width).find(|&x| col_has_fg(x, top, bottom)).unwrap_or(0);
    let right = (left..width).rev().find(|&x| col_has_fg(x, top, bottom)).unwrap_or(left) + 1;

    imageops::crop_imm(img, left, top, right - left, bottom - top).to_image()
}

pub fn flip_horizontal(img: &RgbaImage) -> RgbaImage {
    imageops::flip_horizontal(img)
}

pub fn resize(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.dimensions() == (width, height) {
        return img.clone();
    }
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

/// Opaque copy of `src` anchored at the rect's top-left corner.
///
/// Clipped to the rect, the source bounds and the canvas bounds.
pub fn blit(canvas: &mut RgbaImage, src: &RgbaImage, rect: PlacementRect) {
    let w = rect.width().min(src.width() as i64);
    let h = rect.height().min(src.height() as i64);
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);

    for sy in 0..h.max(0) {
        let ty = rect.top + sy;
        if ty < 0 || ty >= ch {
            continue;
        }
        for sx in 0..w.max(0) {
            let tx = rect.left + sx;
            if tx < 0 || tx >= cw {
                continue;
            }
            let pixel = *src.get_pixel(sx as u32, sy as u32);
            canvas.put_pixel(tx as u32, ty as u32, pixel);
        }
    }
}
