//! Drawing background baking
//!
//! Canvas snapshots are transparent where nothing was drawn. Before a
//! drawing is persisted its strokes are composited over the background the
//! user drew on, so it renders the same under any viewer theme.

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use super::block::DrawingPayload;
use super::media::DataUrl;
use crate::error::Result;

const WHITE: [u8; 3] = [0xff, 0xff, 0xff];

/// Parse a CSS-ish colour: `#rgb`, `#rrggbb`, `#rrggbbaa` (alpha ignored)
/// or a few names. `None` when unrecognised.
pub fn parse_color(raw: &str) -> Option<[u8; 3]> {
    let color = raw.trim().to_ascii_lowercase();
    match color.as_str() {
        "white" | "transparent" | "default" | "" => return Some(WHITE),
        "black" => return Some([0, 0, 0]),
        _ => {}
    }

    let hex = color.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(rgb)
        }
        6 | 8 => Some([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?]),
        _ => None,
    }
}

/// Composite an image over an opaque background colour
fn composite(image: &RgbaImage, background: [u8; 3]) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = u32::from(a);
        let blend = |fg: u8, bg: u8| -> u8 {
            ((u32::from(fg) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255) as u8
        };
        *pixel = Rgba([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
            255,
        ]);
    }
    out
}

fn bake_data_url(data_url: &str, background: [u8; 3]) -> Result<Option<String>> {
    let Some(decoded) = DataUrl::parse(data_url) else {
        return Ok(None);
    };
    if !decoded.mime_type.starts_with("image/") {
        return Ok(None);
    }

    let image = image::load_from_memory(&decoded.bytes)?.to_rgba8();
    let baked = composite(&image, background);

    let mut png = Cursor::new(Vec::new());
    baked.write_to(&mut png, ImageFormat::Png)?;
    Ok(Some(DataUrl::encode("image/png", png.get_ref())))
}

/// The persisted form of a drawing.
///
/// Drawings without a background were baked on an earlier save and are
/// returned as-is. Anything that cannot be decoded as an image is also
/// returned unchanged.
pub fn bake(drawing: &DrawingPayload) -> Option<String> {
    let data_url = drawing.data_url.as_deref().filter(|d| !d.trim().is_empty())?;
    let Some(background) = drawing.background.as_deref() else {
        return Some(data_url.to_string());
    };

    let color = parse_color(background).unwrap_or_else(|| {
        tracing::warn!("Unknown drawing background {:?}, baking onto white", background);
        WHITE
    });

    match bake_data_url(data_url, color) {
        Ok(Some(baked)) => Some(baked),
        Ok(None) => Some(data_url.to_string()),
        Err(e) => {
            tracing::warn!("Failed to bake drawing background, keeping original: {}", e);
            Some(data_url.to_string())
        }
    }
}
