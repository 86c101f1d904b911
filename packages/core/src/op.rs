//! Single-pixel paint operations and the regions they cover.

use serde::{Deserialize, Serialize};

use crate::Rgb;

/// One coordinate + color instruction destined for the external canvas.
///
/// Serialized as a compact `[x, y, "#rrggbb"]` tuple so queue blobs of
/// several hundred thousand operations stay small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i64, i64, Rgb)", into = "(i64, i64, Rgb)")]
pub struct PaintOp {
    pub x: i64,
    pub y: i64,
    pub color: Rgb,
}

impl PaintOp {
    pub const fn new(x: i64, y: i64, color: Rgb) -> Self {
        Self { x, y, color }
    }
}

impl From<(i64, i64, Rgb)> for PaintOp {
    fn from((x, y, color): (i64, i64, Rgb)) -> Self {
        Self { x, y, color }
    }
}

impl From<PaintOp> for (i64, i64, Rgb) {
    fn from(op: PaintOp) -> Self {
        (op.x, op.y, op.color)
    }
}

impl std::fmt::Display for PaintOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}) {}", self.x, self.y, self.color)
    }
}

/// Inclusive axis-aligned bounding box in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top_left: (i64, i64),
    pub bottom_right: (i64, i64),
}

impl BoundingBox {
    /// A box covering a single point.
    pub const fn point(x: i64, y: i64) -> Self {
        Self {
            top_left: (x, y),
            bottom_right: (x, y),
        }
    }

    /// Grow the box to include `(x, y)`.
    pub fn include(&mut self, x: i64, y: i64) {
        self.top_left.0 = self.top_left.0.min(x);
        self.top_left.1 = self.top_left.1.min(y);
        self.bottom_right.0 = self.bottom_right.0.max(x);
        self.bottom_right.1 = self.bottom_right.1.max(y);
    }

    /// Smallest box containing every operation, or `None` for an empty set.
    pub fn of_ops<'a>(ops: impl IntoIterator<Item = &'a PaintOp>) -> Option<Self> {
        let mut iter = ops.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::point(first.x, first.y);
        for op in iter {
            bounds.include(op.x, op.y);
        }
        Some(bounds)
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        (self.top_left.0..=self.bottom_right.0).contains(&x)
            && (self.top_left.1..=self.bottom_right.1).contains(&y)
    }

    pub fn width(&self) -> i64 {
        self.bottom_right.0 - self.top_left.0 + 1
    }

    pub fn height(&self) -> i64 {
        self.bottom_right.1 - self.top_left.1 + 1
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {})-({}, {})",
            self.top_left.0, self.top_left.1, self.bottom_right.0, self.bottom_right.1
        )
    }
}
