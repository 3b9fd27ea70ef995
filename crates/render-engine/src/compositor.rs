//! Layer compositing.
//!
//! Layers arrive in ascending track order. Each is scaled to fit the output
//! while keeping its aspect ratio and centred over [`BACKGROUND`].

use std::sync::Arc;

use image::imageops::{overlay, resize, FilterType};
use image::RgbaImage;

use reelsync_timeline_model::ClipId;

use crate::frame::BACKGROUND;

/// One decoded picture contributing to a frame.
#[derive(Debug, Clone)]
pub struct Layer {
    pub clip_id: ClipId,
    pub track_index: u32,
    pub image: Arc<RgbaImage>,
}

pub trait Compositor: Send + Sync {
    /// Combine `layers` (lowest track first) into a `width`×`height` image.
    fn composite(&self, layers: &[Layer], width: u32, height: u32) -> RgbaImage;

    fn name(&self) -> &str;
}

/// Shows only the highest-track layer. Blending and transitions are left
/// to other compositors.
#[derive(Debug, Default, Clone, Copy)]
pub struct TopMostCompositor;

impl Compositor for TopMostCompositor {
    fn composite(&self, layers: &[Layer], width: u32, height: u32) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
        let top = layers
            .iter()
            .max_by_key(|layer| (layer.track_index, layer.clip_id));
        if let Some(layer) = top {
            place_centered(&mut canvas, &layer.image);
        }
        canvas
    }

    fn name(&self) -> &str {
        "top-most"
    }
}

/// Size and offset of a `src_w`×`src_h` picture fitted inside the canvas.
pub fn fit_within(
    src_w: u32,
    src_h: u32,
    canvas_w: u32,
    canvas_h: u32,
) -> Option<(u32, u32, i64, i64)> {
    if src_w == 0 || src_h == 0 || canvas_w == 0 || canvas_h == 0 {
        return None;
    }
    let scale = (canvas_w as f64 / src_w as f64).min(canvas_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, canvas_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, canvas_h);
    let x = i64::from((canvas_w - w) / 2);
    let y = i64::from((canvas_h - h) / 2);
    Some((w, h, x, y))
}

/// Scale `image` to fit `canvas` and paint it centred.
pub fn place_centered(canvas: &mut RgbaImage, image: &RgbaImage) {
    let Some((w, h, x, y)) =
        fit_within(image.width(), image.height(), canvas.width(), canvas.height())
    else {
        return;
    };
    if (w, h) == image.dimensions() {
        overlay(canvas, image, x, y);
    } else {
        let scaled = resize(image, w, h, FilterType::Triangle);
        overlay(canvas, &scaled, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255])))
    }

    #[test]
    fn test_fit_wide_into_16_9() {
        // 2:1 source in a 16:9 canvas is letterboxed top and bottom.
        assert_eq!(fit_within(200, 100, 160, 90), Some((160, 80, 0, 5)));
        // 1:1 source is pillarboxed.
        assert_eq!(fit_within(50, 50, 160, 90), Some((90, 90, 35, 0)));
        assert_eq!(fit_within(0, 10, 160, 90), None);
    }

    #[test]
    fn test_top_layer_wins() {
        let layers = vec![
            Layer {
                clip_id: ClipId(1),
                track_index: 0,
                image: solid(16, 9, [255, 0, 0]),
            },
            Layer {
                clip_id: ClipId(2),
                track_index: 3,
                image: solid(16, 9, [0, 0, 255]),
            },
        ];
        let out = TopMostCompositor.composite(&layers, 32, 18);
        assert_eq!(*out.get_pixel(16, 9), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_letterbox_uses_background() {
        let layers = vec![Layer {
            clip_id: ClipId(1),
            track_index: 0,
            image: solid(10, 10, [0, 255, 0]),
        }];
        let out = TopMostCompositor.composite(&layers, 40, 20);
        assert_eq!(*out.get_pixel(0, 10), BACKGROUND);
        assert_eq!(*out.get_pixel(20, 10), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_no_layers_is_background() {
        let out = TopMostCompositor.composite(&[], 4, 4);
        assert!(out.pixels().all(|p| *p == BACKGROUND));
    }
}
