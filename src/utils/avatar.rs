//! Circular avatar badges for map markers.
//!
//! 80x80 RGBA: white disc, a 4px ring (green when shown on the map, grey
//! otherwise) and the photo clipped to the inner circle.

use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ImageFormat, Rgba, RgbaImage, imageops::FilterType};

use crate::error::AppError;

pub const BADGE_SIZE: u32 = 80;

const CENTER: f32 = 40.0;
const OUTER_RADIUS: f32 = 38.0;
const RING_WIDTH: f32 = 4.0;
const INNER_RADIUS: f32 = 34.0;
const PHOTO_OFFSET: u32 = 6;
const PHOTO_SIZE: u32 = 68;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const ONLINE_RING: Rgba<u8> = Rgba([0, 255, 0, 255]);
const OFFLINE_RING: Rgba<u8> = Rgba([153, 153, 153, 255]);
const FALLBACK_FILL: Rgba<u8> = Rgba([204, 204, 204, 255]);

/// Distance from the badge center to the center of pixel (x, y).
fn distance(x: u32, y: u32) -> f32 {
    let dx = x as f32 + 0.5 - CENTER;
    let dy = y as f32 + 0.5 - CENTER;
    (dx * dx + dy * dy).sqrt()
}

/// Decodes `photo` and draws the badge.
pub fn render_badge(photo: &[u8], online: bool) -> Result<RgbaImage, AppError> {
    let avatar = image::load_from_memory(photo)?
        .resize_exact(PHOTO_SIZE, PHOTO_SIZE, FilterType::Triangle)
        .to_rgba8();
    let ring = if online { ONLINE_RING } else { OFFLINE_RING };

    let mut canvas = RgbaImage::new(BADGE_SIZE, BADGE_SIZE);
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let d = distance(x, y);
        if d <= INNER_RADIUS {
            *pixel = x
                .checked_sub(PHOTO_OFFSET)
                .zip(y.checked_sub(PHOTO_OFFSET))
                .and_then(|(px, py)| avatar.get_pixel_checked(px, py))
                .copied()
                .unwrap_or(WHITE);
        } else if d <= OUTER_RADIUS - RING_WIDTH / 2.0 {
            *pixel = WHITE;
        } else if d <= OUTER_RADIUS + RING_WIDTH / 2.0 {
            *pixel = ring;
        }
    }

    Ok(canvas)
}

/// Plain grey disc, used when the photo cannot be loaded.
pub fn render_fallback() -> RgbaImage {
    let mut canvas = RgbaImage::new(BADGE_SIZE, BADGE_SIZE);
    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        if distance(x, y) <= OUTER_RADIUS {
            *pixel = FALLBACK_FILL;
        }
    }
    canvas
}

pub fn to_data_url(badge: &RgbaImage) -> Result<String, AppError> {
    let mut buf = Cursor::new(Vec::new());
    badge.write_to(&mut buf, ImageFormat::Png)?;
    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(buf.into_inner())
    ))
}
