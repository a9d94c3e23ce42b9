//! PNG output: composed SVG rasterised with `resvg`.

use std::sync::{Arc, OnceLock};

use resvg::{tiny_skia, usvg};
use tracing::info;

use crate::errors::{BadgeError, Result};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Anything shorter cannot be a real badge; treat it as a failed render.
pub const MIN_RASTER_BYTES: usize = 128;

/// 1×1 fully transparent RGBA PNG.
pub const PLACEHOLDER_PNG: [u8; 68] = [
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d,
    0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
    0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4, 0x89, 0x00, 0x00, 0x00,
    0x0b, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x60, 0x00, 0x02, 0x00,
    0x00, 0x05, 0x00, 0x01, 0xe9, 0xfa, 0xdc, 0xd8, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

fn fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            info!("Loaded {} font faces for rasterisation", db.len());
            Arc::new(db)
        })
        .clone()
}

/// Rasterise `svg` onto a `width` × `height` transparent canvas and encode it as PNG.
pub fn rasterize(svg: &str, width: u32, height: u32) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb = fonts();

    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| BadgeError::Render(format!("Failed to parse SVG: {e}")))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        BadgeError::Render(format!("Cannot allocate a {width}x{height} canvas"))
    })?;

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| BadgeError::Render(format!("PNG encoding failed: {e}")))
}

/// Whether `bytes` plausibly holds a rendered PNG badge.
pub fn is_plausible_png(bytes: &[u8]) -> bool {
    bytes.len() >= MIN_RASTER_BYTES && bytes.starts_with(&PNG_SIGNATURE)
}
