//! Compositors - Hero Slot and Thumbnail Strip
//!
//! Both compositors draw onto the same `Canvas` in sequence order. Later
//! draws overwrite earlier ones, so nothing here runs concurrently.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{LayoutConfig, Mode};
use crate::geometry::{fit, place, Fit, PlacementRect};
use crate::imaging::{self, DecodeError, ImageLoader, BACKGROUND_COLOR};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Cannot fit {path} ({width}x{height}) into a {box_width}x{box_height} box")]
    DegenerateFit {
        path: PathBuf,
        width: u32,
        height: u32,
        box_width: f64,
        box_height: f64,
    },
}

/// Square, opaque white drawing surface.
pub struct Canvas {
    buffer: RgbaImage,
}

impl Canvas {
    pub fn new(size: u32) -> Self {
        Self {
            buffer: RgbaImage::from_pixel(size, size, Rgba([255, 255, 255, 255])),
        }
    }

    pub fn buffer(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn into_buffer(self) -> RgbaImage {
        self.buffer
    }

    fn draw(&mut self, img: &RgbaImage, rect: PlacementRect) {
        imaging::blit(&mut self.buffer, img, rect);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Hero,
    Thumbnail,
    Marker,
}

/// One draw onto the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub path: PathBuf,
    pub role: Role,
    pub fit: Fit,
    /// Size of the drawn (scaled) image.
    pub size: [u32; 2],
    pub rect: PlacementRect,
}

/// Load, optionally mirror, then trim the background.
fn prepare(config: &LayoutConfig, loader: &dyn ImageLoader, path: &Path) -> Result<RgbaImage, ComposeError> {
    let mut img = loader.load(path)?;
    if config.flip_images.enabled() {
        img = imaging::flip_horizontal(&img);
    }
    Ok(imaging::crop_background(&img, BACKGROUND_COLOR, config.white_threshold))
}

fn fit_into(path: &Path, img: &RgbaImage, box_width: f64, box_height: f64) -> Result<Fit, ComposeError> {
    let (width, height) = img.dimensions();
    fit(width as f64, height as f64, box_width, box_height).ok_or_else(|| ComposeError::DegenerateFit {
        path: path.to_path_buf(),
        width,
        height,
        box_width,
        box_height,
    })
}

/// Draw the hero image into the main slot.
pub fn place_hero(
    config: &LayoutConfig,
    loader: &dyn ImageLoader,
    path: &Path,
    canvas: &mut Canvas,
) -> Result<Placement, ComposeError> {
    log::info!("Importing image 1: {}", path.display());

    let cropped = prepare(config, loader, path)?;
    let (box_width, box_height) = config.hero_box();
    let fit = fit_into(path, &cropped, box_width, box_height)?;
    let (w, h) = fit.scaled_size(cropped.width(), cropped.height());
    let scaled = imaging::resize(&cropped, w, h);

    let rect = place(w, h, fit.axis, (0, 0), box_width, box_height);
    log::debug!("hero {}x{} scale {:.4} {:?} -> {:?}", w, h, fit.scale, fit.axis, rect);
    canvas.draw(&scaled, rect);

    Ok(Placement {
        path: path.to_path_buf(),
        role: Role::Hero,
        fit,
        size: [w, h],
        rect,
    })
}

/// Whether the marker replaces the next image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StripState {
    Normal,
    /// Terminal: the marker is drawn and the strip ends.
    DrawMarkerNext,
}

/// Geometry of the thumbnail strip for one config.
struct StripLayout {
    mode: Mode,
    spacer: i64,
    size: i64,
    pos: i64,
    canvas: i64,
}

impl StripLayout {
    fn new(config: &LayoutConfig) -> Self {
        Self {
            mode: config.mode,
            spacer: config.thumbnail_spacer as i64,
            size: config.thumbnail_size as i64,
            pos: config.thumbnail_pos as i64,
            canvas: config.image_size as i64,
        }
    }

    /// Top-left corner of slot `index` in canvas space.
    fn slot_origin(&self, index: usize) -> (i64, i64) {
        let i = index as i64;
        let along = (i + 1) * self.spacer + i * self.size;
        match self.mode {
            Mode::Bottom => (along, self.pos),
            Mode::Top => (self.pos, along),
        }
    }

    /// Two more slots after `index` would run past the canvas.
    fn next_two_overflow(&self, index: usize) -> bool {
        let steps = index as i64 + 3;
        steps * self.spacer + steps * self.size > self.canvas
    }

    fn thumbnail_rect(&self, index: usize, fit: Fit, w: u32, h: u32) -> PlacementRect {
        let side = self.size as f64;
        place(w, h, fit.axis, self.slot_origin(index), side, side)
    }

    /// Centered on both axes, with the far edges pushed out by an extra slot.
    fn marker_rect(&self, index: usize, w: u32, h: u32) -> PlacementRect {
        let (ox, oy) = self.slot_origin(index);
        let side = self.size as f64;
        let (dx, dy) = (w as f64, h as f64);
        PlacementRect::new(
            ox + (side / 2.0 - dx / 2.0) as i64,
            oy + (side / 2.0 - dy / 2.0) as i64,
            ox + self.size + (side / 2.0 + dx / 2.0) as i64 + self.size,
            oy + self.size + self.size + (side / 2.0 + dy / 2.0) as i64,
        )
    }
}

/// Draw thumbnails along the strip, ending in the marker on overflow.
///
/// `paths` excludes the hero. Returns the draws in order; a marker, if
/// any, is always last.
pub fn place_strip(
    config: &LayoutConfig,
    loader: &dyn ImageLoader,
    paths: &[PathBuf],
    canvas: &mut Canvas,
) -> Result<Vec<Placement>, ComposeError> {
    let layout = StripLayout::new(config);
    let side = config.thumbnail_size as f64;
    let mut state = StripState::Normal;
    let mut placements = Vec::with_capacity(paths.len());

    for (i, listed) in paths.iter().enumerate() {
        let (path, role) = match state {
            StripState::Normal => (listed.as_path(), Role::Thumbnail),
            StripState::DrawMarkerNext => (config.dot_image.as_path(), Role::Marker),
        };
        log::info!("Importing image {}: {}", i + 2, path.display());

        let cropped = prepare(config, loader, path)?;
        let mut fit = fit_into(path, &cropped, side, side)?;
        if role == Role::Marker {
            fit = fit.scaled(config.dot_scale);
        }
        let (w, h) = fit.scaled_size(cropped.width(), cropped.height());
        let scaled = imaging::resize(&cropped, w, h);

        let rect = match role {
            Role::Marker => layout.marker_rect(i, w, h),
            _ => layout.thumbnail_rect(i, fit, w, h),
        };
        log::debug!("{:?} {} {}x{} -> {:?}", role, i, w, h, rect);
        canvas.draw(&scaled, rect);

        placements.push(Placement {
            path: path.to_path_buf(),
            role,
            fit,
            size: [w, h],
            rect,
        });

        if state == StripState::DrawMarkerNext {
            break;
        }
        // A single remaining image is always drawn in full.
        let remaining = paths.len() - i - 1;
        if remaining > 1 && layout.next_two_overflow(i) {
            log::info!("{} images do not fit, truncating strip after slot {}", remaining, i);
            state = StripState::DrawMarkerNext;
        }
    }

    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlipImages;
    use crate::geometry::Axis;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const DOTS: &str = "dots.png";

    /// Serves solid images and records every load.
    struct MemoryLoader {
        images: HashMap<PathBuf, RgbaImage>,
        loads: RefCell<Vec<PathBuf>>,
    }

    impl MemoryLoader {
        fn new() -> Self {
            let mut images = HashMap::new();
            images.insert(PathBuf::from(DOTS), solid(30, 10, [0, 0, 0]));
            Self { images, loads: RefCell::new(vec![]) }
        }

        fn with(mut self, path: &str, img: RgbaImage) -> Self {
            self.images.insert(PathBuf::from(path), img);
            self
        }

        fn loads(&self) -> Vec<PathBuf> {
            self.loads.borrow().clone()
        }
    }

    impl ImageLoader for MemoryLoader {
        fn load(&self, path: &Path) -> Result<RgbaImage, DecodeError> {
            self.loads.borrow_mut().push(path.to_path_buf());
            let img = self.images.get(path).cloned();
            img.ok_or_else(|| DecodeError {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(std::io::ErrorKind::NotFound.into()),
            })
        }
    }

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn config(mode: Mode) -> LayoutConfig {
        LayoutConfig {
            mode,
            image_size: 1000,
            white_threshold: 0.1,
            main_spacer: 10,
            thumbnail_spacer: 10,
            thumbnail_size: 100,
            thumbnail_pos: 850,
            dot_scale: 0.5,
            dot_image: DOTS.into(),
            image_ending: ".jpg".to_string(),
            flip_images: FlipImages::No,
        }
    }

    fn thumbs(loader: MemoryLoader, n: usize) -> (MemoryLoader, Vec<PathBuf>) {
        let mut loader = loader;
        let mut paths = vec![];
        for k in 0..n {
            let name = format!("thumb_{k:02}.jpg");
            loader = loader.with(&name, solid(50, 50, [200, 0, 0]));
            paths.push(PathBuf::from(name));
        }
        (loader, paths)
    }

    #[test]
    fn test_hero_square_bottom_mode() {
        let loader = MemoryLoader::new().with("hero.jpg", solid(400, 400, [10, 20, 30]));
        let mut canvas = Canvas::new(1000);
        let p = place_hero(&config(Mode::Bottom), &loader, Path::new("hero.jpg"), &mut canvas).unwrap();

        assert_eq!(p.fit.axis, Axis::Horizontal);
        assert_eq!(p.size, [840, 840]);
        assert_eq!(p.rect, PlacementRect::new(80, 0, 920, 840));
        assert_eq!(*canvas.buffer().get_pixel(80, 0), Rgba([10, 20, 30, 255]));
        assert_eq!(*canvas.buffer().get_pixel(79, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*canvas.buffer().get_pixel(500, 845), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_hero_wide_top_mode_centers_vertically() {
        let loader = MemoryLoader::new().with("hero.jpg", solid(840, 420, [10, 20, 30]));
        let mut canvas = Canvas::new(1000);
        let p = place_hero(&config(Mode::Top), &loader, Path::new("hero.jpg"), &mut canvas).unwrap();

        assert_eq!(p.fit.axis, Axis::Vertical);
        assert_eq!(p.size, [840, 420]);
        assert_eq!(p.rect, PlacementRect::new(0, 290, 840, 710));
    }

    #[test]
    fn test_hero_is_cropped_before_fitting() {
        let mut img = solid(300, 300, [255, 255, 255]);
        for y in 100..200 {
            for x in 50..250 {
                img.put_pixel(x, y, Rgba([0, 0, 200, 255]));
            }
        }
        let loader = MemoryLoader::new().with("hero.jpg", img);
        let mut canvas = Canvas::new(1000);
        let p = place_hero(&config(Mode::Bottom), &loader, Path::new("hero.jpg"), &mut canvas).unwrap();

        // 200x100 cropped; width binds at 1000/200 = 5.
        assert_eq!(p.fit.axis, Axis::Vertical);
        assert_eq!(p.size, [1000, 500]);
        assert_eq!(p.rect, PlacementRect::new(0, 170, 1000, 670));
    }

    #[test]
    fn test_strip_slots_bottom_mode() {
        let (loader, paths) = thumbs(MemoryLoader::new(), 3);
        let loader = loader.with("thumb_01.jpg", solid(100, 50, [0, 200, 0]));
        let mut canvas = Canvas::new(1000);
        let placed = place_strip(&config(Mode::Bottom), &loader, &paths, &mut canvas).unwrap();

        assert_eq!(placed.len(), 3);
        assert_eq!(placed[0].rect, PlacementRect::new(10, 850, 110, 950));
        // 100x50 fills the slot width and is centered vertically.
        assert_eq!(placed[1].fit.axis, Axis::Vertical);
        assert_eq!(placed[1].rect, PlacementRect::new(120, 875, 220, 925));
        assert_eq!(placed[2].rect, PlacementRect::new(230, 850, 330, 950));
        assert_eq!(*canvas.buffer().get_pixel(120, 875), Rgba([0, 200, 0, 255]));
        assert_eq!(*canvas.buffer().get_pixel(120, 874), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_strip_slots_top_mode_run_vertically() {
        let (loader, paths) = thumbs(MemoryLoader::new(), 2);
        let mut canvas = Canvas::new(1000);
        let placed = place_strip(&config(Mode::Top), &loader, &paths, &mut canvas).unwrap();

        assert_eq!(placed[0].rect, PlacementRect::new(850, 10, 950, 110));
        assert_eq!(placed[1].rect, PlacementRect::new(850, 120, 950, 220));
    }

    #[test]
    fn test_eight_thumbnails_fit_without_marker() {
        let (loader, paths) = thumbs(MemoryLoader::new(), 8);
        let mut canvas = Canvas::new(1000);
        let placed = place_strip(&config(Mode::Bottom), &loader, &paths, &mut canvas).unwrap();

        assert_eq!(placed.len(), 8);
        assert!(placed.iter().all(|p| p.role == Role::Thumbnail));
        assert_eq!(placed[7].rect.left, 780);
    }

    #[test]
    fn test_single_remaining_image_is_never_truncated() {
        // At slot 7 the next two overflow, but only one image remains.
        let (loader, paths) = thumbs(MemoryLoader::new(), 9);
        let mut canvas = Canvas::new(1000);
        let placed = place_strip(&config(Mode::Bottom), &loader, &paths, &mut canvas).unwrap();

        assert_eq!(placed.len(), 9);
        assert!(placed.iter().all(|p| p.role == Role::Thumbnail));
        assert_eq!(placed[8].path, PathBuf::from("thumb_08.jpg"));
    }

    #[test]
    fn test_overflow_draws_marker_last_and_stops() {
        let (loader, paths) = thumbs(MemoryLoader::new(), 12);
        let mut canvas = Canvas::new(1000);
        let placed = place_strip(&config(Mode::Bottom), &loader, &paths, &mut canvas).unwrap();

        assert_eq!(placed.len(), 9);
        assert!(placed[..8].iter().all(|p| p.role == Role::Thumbnail));
        let marker = &placed[8];
        assert_eq!(marker.role, Role::Marker);
        assert_eq!(marker.path, PathBuf::from(DOTS));

        // Nothing past the marker is even loaded.
        let loads = loader.loads();
        assert_eq!(loads.len(), 9);
        assert_eq!(loads.last(), Some(&PathBuf::from(DOTS)));
        assert!(!loads.contains(&PathBuf::from("thumb_08.jpg")));
    }

    #[test]
    fn test_marker_is_shrunk_and_inset() {
        let (loader, paths) = thumbs(MemoryLoader::new(), 10);
        let mut canvas = Canvas::new(1000);
        let placed = place_strip(&config(Mode::Bottom), &loader, &paths, &mut canvas).unwrap();
        let marker = placed.last().unwrap();

        // 30x10 fits at 100/30, halved by dot_scale.
        assert_eq!(marker.size, [50, 16]);
        assert!((marker.fit.scale - 100.0 / 30.0 * 0.5).abs() < 1e-9);
        // Slot 8 starts at x = 9 * 10 + 8 * 100 = 890.
        assert_eq!(marker.rect, PlacementRect::new(915, 892, 1165, 1108));
        assert_eq!(*canvas.buffer().get_pixel(915, 892), Rgba([0, 0, 0, 255]));
        assert_eq!(*canvas.buffer().get_pixel(964, 907), Rgba([0, 0, 0, 255]));
        assert_eq!(*canvas.buffer().get_pixel(965, 892), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_marker_rect_top_mode_mirrors_bottom() {
        let (loader, paths) = thumbs(MemoryLoader::new(), 10);
        let mut canvas = Canvas::new(1000);
        let placed = place_strip(&config(Mode::Top), &loader, &paths, &mut canvas).unwrap();
        let marker = placed.last().unwrap();

        assert_eq!(marker.role, Role::Marker);
        assert_eq!(marker.rect, PlacementRect::new(875, 932, 1125, 1148));
    }

    #[test]
    fn test_decode_failure_aborts_strip() {
        let loader = MemoryLoader::new();
        let mut canvas = Canvas::new(1000);
        let paths = vec![PathBuf::from("missing.jpg")];
        let err = place_strip(&config(Mode::Bottom), &loader, &paths, &mut canvas).unwrap_err();
        assert!(matches!(err, ComposeError::Decode(_)));
    }

    #[test]
    fn test_zero_thumbnail_size_is_degenerate() {
        let (loader, paths) = thumbs(MemoryLoader::new(), 1);
        let mut c = config(Mode::Bottom);
        c.thumbnail_size = 0;
        let mut canvas = Canvas::new(1000);
        let err = place_strip(&c, &loader, &paths, &mut canvas).unwrap_err();
        assert!(matches!(err, ComposeError::DegenerateFit { .. }));
    }
}
