//! Draw planning: image or text in, ordered job contents out.

use canvas_core::{BoundingBox, DrawError, DrawResult, Job, PaintOp};
use image::DynamicImage;
use image::imageops::{self, FilterType};

use crate::decompose::{decode, decompose};
use crate::ordering::Pipeline;
use crate::text::{TextCursor, TextGrid};

/// Where on the canvas an image lands, optionally resized first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    /// Target `(width, height)`; nearest-neighbour so no new colors appear.
    pub size: Option<(u32, u32)>,
}

impl Placement {
    pub const fn at(x: i64, y: i64) -> Self {
        Self { x, y, size: None }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }
}

/// Ordered operations ready to become a job.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub ops: Vec<PaintOp>,
    pub cursor: usize,
    pub bounds: BoundingBox,
}

impl Plan {
    pub fn into_job(self) -> Job {
        Job::new(self.ops, self.cursor, self.bounds)
    }
}

/// Decompose, order and slice an already decoded image.
pub fn plan_image(
    image: &DynamicImage,
    placement: &Placement,
    pipeline: &Pipeline,
) -> DrawResult<Plan> {
    let rgba = match placement.size {
        Some((0, _)) | Some((_, 0)) => return Err(DrawError::EmptyImage),
        Some((width, height)) => {
            imageops::resize(&image.to_rgba8(), width, height, FilterType::Nearest)
        }
        None => image.to_rgba8(),
    };
    let decomposition = decompose(&rgba, (placement.x, placement.y))?;
    let ordered = pipeline.order(decomposition.ops);
    // slicing may cut everything, the bounds still describe the whole image
    Ok(Plan {
        ops: ordered.ops,
        cursor: ordered.cursor,
        bounds: decomposition.bounds,
    })
}

/// Decode raw bytes and plan them.
pub fn plan_bytes(bytes: &[u8], placement: &Placement, pipeline: &Pipeline) -> DrawResult<Plan> {
    let image = decode(bytes)?;
    plan_image(&image, placement, pipeline)
}

/// Render a chat line at `cursor` and plan it in scan order.
///
/// Returns the plan and the cursor the next message should continue from.
pub fn plan_text(
    grid: &TextGrid,
    text: &str,
    cursor: TextCursor,
    origin: (i64, i64),
) -> DrawResult<(Plan, TextCursor)> {
    if grid.lines == 0 || grid.columns == 0 {
        return Err(DrawError::EmptyImage);
    }
    let render = grid.render(text, cursor);
    let decomposition = decompose(&render.image, origin)?;
    let plan = Plan {
        ops: decomposition.ops,
        cursor: 0,
        bounds: decomposition.bounds,
    };
    Ok((plan, render.cursor))
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::ordering::Strategy;

    fn opaque(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 255])))
    }

    #[test]
    fn plan_places_and_orders() -> DrawResult<()> {
        let plan = plan_image(
            &opaque(3, 3),
            &Placement::at(100, 50),
            &Pipeline::new(vec![Strategy::CenterFirst]),
        )?;
        assert_eq!(plan.ops.len(), 9);
        assert_eq!((plan.ops[0].x, plan.ops[0].y), (101, 51));
        assert_eq!(
            plan.bounds,
            BoundingBox {
                top_left: (100, 50),
                bottom_right: (102, 52)
            }
        );
        Ok(())
    }

    #[test]
    fn resize_uses_target_size() -> DrawResult<()> {
        let plan = plan_image(
            &opaque(2, 2),
            &Placement::at(0, 0).with_size(4, 3),
            &Pipeline::default(),
        )?;
        assert_eq!(plan.ops.len(), 12);
        assert!(plan.ops.iter().all(|op| op.color == canvas_core::Rgb::new(200, 10, 10)));
        Ok(())
    }

    #[test]
    fn zero_size_is_rejected() {
        let result = plan_image(
            &opaque(2, 2),
            &Placement::at(0, 0).with_size(0, 3),
            &Pipeline::default(),
        );
        assert_eq!(result, Err(DrawError::EmptyImage));
    }

    #[test]
    fn text_plan_moves_cursor() -> DrawResult<()> {
        let grid = TextGrid::default();
        let (plan, next) = plan_text(&grid, "ok", TextCursor::new(0, 0), (0, 0))?;
        assert!(!plan.ops.is_empty());
        assert_eq!(plan.cursor, 0);
        assert_eq!(next, TextCursor::new(0, 5));
        Ok(())
    }
}
