//! Rendered preview frames.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use serde::Serialize;

use reelsync_common::error::{ReelsyncError, ReelsyncResult};

/// Letterbox colour behind scaled layers.
pub const BACKGROUND: Rgba<u8> = Rgba([24, 24, 24, 255]);

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const ERROR_FILL: Rgba<u8> = Rgba([190, 32, 32, 255]);
const ERROR_MARK: Rgba<u8> = Rgba([48, 8, 8, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// At least one visual layer, all decoded.
    Composited,
    /// Nothing visual is active at this time.
    Black,
    /// One or more layers failed to decode and were replaced.
    Error,
}

/// A composited frame for one timeline instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// The quantized timeline time this frame shows.
    pub time: f64,
    pub kind: FrameKind,
    pub image: RgbaImage,
}

impl Frame {
    pub fn new(time: f64, kind: FrameKind, image: RgbaImage) -> Self {
        Self { time, kind, image }
    }

    pub fn black(time: f64, width: u32, height: u32) -> Self {
        Self::new(time, FrameKind::Black, RgbaImage::from_pixel(width, height, BLACK))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Write the frame as PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> ReelsyncResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| ReelsyncError::render(format!("Failed to write {}: {e}", path.display())))
    }
}

/// Placeholder for a layer that failed to decode: red with a dark cross.
pub fn error_image(width: u32, height: u32) -> RgbaImage {
    let (w, h) = (width as f64, height as f64);
    let diagonal = (w * w + h * h).sqrt().max(1.0);
    let half_thickness = (h / 60.0).max(1.5);

    RgbaImage::from_fn(width, height, |x, y| {
        let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
        // Distance to each diagonal of the frame.
        let d1 = (py * w - px * h).abs() / diagonal;
        let d2 = (py * w - (w - px) * h).abs() / diagonal;
        if d1 <= half_thickness || d2 <= half_thickness {
            ERROR_MARK
        } else {
            ERROR_FILL
        }
    })
}
