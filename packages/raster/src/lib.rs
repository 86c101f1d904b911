//! Raster side of the canvas scheduler.
//!
//! - `decompose` turns images into opaque-pixel paint operations
//! - `ordering` reorders operations (center-first, interleaved, sweeps, slices)
//! - `text` renders chat lines onto a persistent character grid
//! - `plan` glues those together into job contents

pub mod decompose;
mod font;
pub mod ordering;
pub mod plan;
pub mod text;

pub use decompose::{ALPHA_THRESHOLD, Decomposition, decode, decompose, is_opaque};
pub use ordering::{Direction, Interleave, Ordered, Pipeline, Slice, Strategy, order};
pub use plan::{Placement, Plan, plan_bytes, plan_image, plan_text};
pub use text::{TextCursor, TextGrid, TextRender};
