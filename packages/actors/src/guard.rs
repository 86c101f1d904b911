//! Consistency guard: repaints protected pixels that someone else overwrote.

use std::collections::HashMap;

use canvas_core::{BoundingBox, CanvasWrite, PaintOp, Rgb, SendOrigin};
use futures_util::StreamExt;
use image::{DynamicImage, RgbaImage};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use raster::is_opaque;

use crate::channel::SharedChannel;
use crate::messages::GuardMessage;

/// An image pinned to a canvas position.
#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub origin: (i64, i64),
    pub image: RgbaImage,
}

impl ReferenceImage {
    pub fn new(origin: (i64, i64), image: RgbaImage) -> Self {
        Self { origin, image }
    }

    pub fn from_dynamic(origin: (i64, i64), image: &DynamicImage) -> Self {
        Self::new(origin, image.to_rgba8())
    }

    /// Canvas area covered by the image, opaque or not.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let (w, h) = self.image.dimensions();
        if w == 0 || h == 0 {
            return None;
        }
        let (x, y) = self.origin;
        Some(BoundingBox {
            top_left: (x, y),
            bottom_right: (
                x.saturating_add(i64::from(w) - 1),
                y.saturating_add(i64::from(h) - 1),
            ),
        })
    }

    /// The color protected at `(x, y)`, if that pixel is inside and opaque.
    pub fn expected(&self, x: i64, y: i64) -> Option<Rgb> {
        let px = u32::try_from(x.checked_sub(self.origin.0)?).ok()?;
        let py = u32::try_from(y.checked_sub(self.origin.1)?).ok()?;
        let pixel = self.image.get_pixel_checked(px, py)?;
        is_opaque(pixel).then(|| Rgb::new(pixel[0], pixel[1], pixel[2]))
    }

    /// Every protected pixel in scan order.
    pub fn protected(&self) -> impl Iterator<Item = PaintOp> + '_ {
        let (ox, oy) = self.origin;
        self.image
            .enumerate_pixels()
            .filter(|(_, _, pixel)| is_opaque(pixel))
            .map(move |(x, y, pixel)| {
                PaintOp::new(
                    ox.saturating_add(i64::from(x)),
                    oy.saturating_add(i64::from(y)),
                    Rgb::new(pixel[0], pixel[1], pixel[2]),
                )
            })
    }
}

/// One protected pixel that does not currently look right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub x: i64,
    pub y: i64,
    pub expected: Rgb,
    pub observed: Rgb,
}

/// One-shot diff between the reference and the observed canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MismatchReport {
    /// Protected pixels considered (after the color filter).
    pub checked: usize,
    /// Considered pixels with an observed write.
    pub observed: usize,
    pub mismatches: Vec<Mismatch>,
}

impl MismatchReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

impl std::fmt::Display for MismatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} mismatched of {} protected pixels ({} observed)",
            self.mismatches.len(),
            self.checked,
            self.observed
        )
    }
}

/// Guard state, free of any actor or channel plumbing.
#[derive(Debug, Default)]
pub struct ConsistencyGuard {
    enabled: bool,
    reference: Option<ReferenceImage>,
    /// Last color seen at each protected coordinate.
    observed: HashMap<(i64, i64), Rgb>,
}

impl ConsistencyGuard {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn reference(&self) -> Option<&ReferenceImage> {
        self.reference.as_ref()
    }

    pub fn protect(&mut self, reference: ReferenceImage) {
        self.observed.clear();
        self.reference = Some(reference);
    }

    pub fn clear(&mut self) {
        self.observed.clear();
        self.reference = None;
    }

    /// Record a write and return the correction it calls for, if any.
    pub fn observe(&mut self, write: &CanvasWrite) -> Option<PaintOp> {
        let expected = self.reference.as_ref()?.expected(write.x, write.y)?;
        self.observed.insert((write.x, write.y), write.color);

        (self.enabled && write.color != expected).then(|| PaintOp::new(write.x, write.y, expected))
    }

    /// Protected pixels whose last observed color differs from the reference.
    ///
    /// With a filter, only pixels whose reference color equals it are considered.
    /// Pixels never observed are not reported.
    pub fn mismatch(&self, filter: Option<Rgb>) -> MismatchReport {
        let mut report = MismatchReport::default();
        let Some(reference) = &self.reference else {
            return report;
        };

        for op in reference.protected() {
            if filter.is_some_and(|color| color != op.color) {
                continue;
            }
            report.checked += 1;
            let Some(&observed) = self.observed.get(&(op.x, op.y)) else {
                continue;
            };
            report.observed += 1;
            if observed != op.color {
                report.mismatches.push(Mismatch {
                    x: op.x,
                    y: op.y,
                    expected: op.color,
                    observed,
                });
            }
        }
        report
    }
}

/// State for the guard actor.
pub struct GuardActorState {
    pub guard: ConsistencyGuard,
    channel: SharedChannel,
}

/// Guard actor arguments.
pub struct GuardArgs {
    pub enabled: bool,
    pub channel: SharedChannel,
}

/// Guard actor. Shares nothing with the scheduler but the channel.
pub struct GuardActor;

impl Actor for GuardActor {
    type Msg = GuardMessage;
    type State = GuardActorState;
    type Arguments = GuardArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting consistency guard (enabled: {})", args.enabled);

        // Forward inbound canvas writes
        let mut writes = args.channel.subscribe();
        let myself_clone = myself.clone();
        tokio::spawn(async move {
            while let Some(write) = writes.next().await {
                if myself_clone.send_message(GuardMessage::Observe(write)).is_err() {
                    break;
                }
            }
        });

        Ok(GuardActorState {
            guard: ConsistencyGuard::new(args.enabled),
            channel: args.channel,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            GuardMessage::Observe(write) => {
                if let Some(op) = state.guard.observe(&write) {
                    tracing::debug!("{} overwrote protected pixel, restoring {}", write.actor, op);
                    if let Err(e) = state.channel.send(op, SendOrigin::Guard).await {
                        tracing::warn!("Guard correction {} failed: {}", op, e);
                    }
                }
            }

            GuardMessage::SetEnabled(enabled) => {
                tracing::info!("Consistency guard {}", if enabled { "on" } else { "off" });
                state.guard.set_enabled(enabled);
            }

            GuardMessage::Protect { reference } => {
                tracing::info!(
                    "Protecting {}x{} image at ({}, {})",
                    reference.image.width(),
                    reference.image.height(),
                    reference.origin.0,
                    reference.origin.1
                );
                state.guard.protect(*reference);
            }

            GuardMessage::Clear => state.guard.clear(),

            GuardMessage::Mismatch { filter, reply } => {
                let _ = reply.send(state.guard.mismatch(filter));
            }
        }

        Ok(())
    }
}

/// Spawn a guard actor subscribed to the channel's inbound writes.
pub async fn start_guard(
    args: GuardArgs,
) -> Result<(ActorRef<GuardMessage>, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    Actor::spawn(None, GuardActor, args).await
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn write(x: i64, y: i64, color: Rgb) -> CanvasWrite {
        CanvasWrite {
            x,
            y,
            color,
            actor: "someone".to_string(),
        }
    }

    /// 3x3 red square at (4, 4) with a transparent top-left corner.
    fn guard() -> ConsistencyGuard {
        let mut image = RgbaImage::from_pixel(3, 3, Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let mut guard = ConsistencyGuard::new(true);
        guard.protect(ReferenceImage::new((4, 4), image));
        guard
    }

    #[test]
    fn overwrite_is_corrected_once() {
        let mut guard = guard();
        assert_eq!(
            guard.observe(&write(5, 5, BLUE)),
            Some(PaintOp::new(5, 5, RED))
        );
        // our own correction echoing back
        assert_eq!(guard.observe(&write(5, 5, RED)), None);
    }

    #[test]
    fn ignores_outside_transparent_and_disabled() {
        let mut guard = guard();
        assert_eq!(guard.observe(&write(0, 0, BLUE)), None);
        assert_eq!(guard.observe(&write(7, 5, BLUE)), None);
        assert_eq!(guard.observe(&write(4, 4, BLUE)), None);

        guard.set_enabled(false);
        assert_eq!(guard.observe(&write(5, 5, BLUE)), None);
    }

    #[test]
    fn mismatch_reports_last_observed_color() {
        let mut guard = guard();
        guard.set_enabled(false);
        guard.observe(&write(5, 5, BLUE));
        guard.observe(&write(6, 6, BLUE));
        guard.observe(&write(6, 6, RED));
        guard.observe(&write(4, 5, RED));

        let report = guard.mismatch(None);
        assert_eq!(report.checked, 8);
        assert_eq!(report.observed, 3);
        assert_eq!(
            report.mismatches,
            vec![Mismatch {
                x: 5,
                y: 5,
                expected: RED,
                observed: BLUE
            }]
        );

        assert_eq!(guard.mismatch(Some(BLUE)).checked, 0);
    }

    #[test]
    fn extreme_coordinates_are_outside() {
        let mut guard = ConsistencyGuard::new(true);
        let image = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        guard.protect(ReferenceImage::new((5, -5), image));

        assert_eq!(guard.observe(&write(i64::MIN, 0, BLUE)), None);
        assert_eq!(guard.observe(&write(0, i64::MAX, BLUE)), None);
        assert_eq!(
            guard.observe(&write(6, -4, BLUE)),
            Some(PaintOp::new(6, -4, RED))
        );
    }

    #[test]
    fn no_reference_means_nothing_to_do() {
        let mut guard = ConsistencyGuard::new(true);
        assert_eq!(guard.observe(&write(1, 1, BLUE)), None);
        assert!(guard.mismatch(None).is_clean());
        assert!(guard.reference().is_none());
    }
}
