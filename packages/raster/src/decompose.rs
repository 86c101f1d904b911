//! Turns a raster image into single-pixel paint operations.

use canvas_core::{BoundingBox, DrawError, DrawResult, PaintOp, Rgb};
use image::{DynamicImage, Rgba, RgbaImage};

/// Pixels with alpha at or below this value are never painted.
pub const ALPHA_THRESHOLD: u8 = 230;

/// Unordered paint operations plus the region they cover.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Row-major scan order, already translated to canvas coordinates.
    pub ops: Vec<PaintOp>,
    pub bounds: BoundingBox,
}

impl Decomposition {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Whether a pixel is opaque enough to be painted.
pub fn is_opaque(pixel: &Rgba<u8>) -> bool {
    pixel.0[3] > ALPHA_THRESHOLD
}

/// Decode raw bytes in any supported format.
pub fn decode(bytes: &[u8]) -> DrawResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| DrawError::Decode(e.to_string()))
}

/// Collect every opaque pixel of `image`, offset by `origin`.
///
/// Fails with [`DrawError::EmptyImage`] when nothing qualifies.
pub fn decompose(image: &RgbaImage, origin: (i64, i64)) -> DrawResult<Decomposition> {
    let mut ops = Vec::new();
    let mut bounds: Option<BoundingBox> = None;

    for (px, py, pixel) in image.enumerate_pixels() {
        if !is_opaque(pixel) {
            continue;
        }
        let x = origin.0 + i64::from(px);
        let y = origin.1 + i64::from(py);
        let [r, g, b, _] = pixel.0;
        ops.push(PaintOp::new(x, y, Rgb::new(r, g, b)));
        match bounds.as_mut() {
            Some(bounds) => bounds.include(x, y),
            None => bounds = Some(BoundingBox::point(x, y)),
        }
    }

    let bounds = bounds.ok_or(DrawError::EmptyImage)?;
    tracing::debug!("Decomposed {} opaque pixels within {}", ops.len(), bounds);
    Ok(Decomposition { ops, bounds })
}
