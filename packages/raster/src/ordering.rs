//! Pure reordering strategies applied to a job's operations before scheduling.
//!
//! Strategies compose as a pipeline: each stage reorders the output of the
//! previous one, and the percentage slice is applied after all of them.
//! Every strategy is a permutation of its input; only the slice drops
//! operations.

use std::cmp::Reverse;

use canvas_core::{DrawError, DrawResult, PaintOp};

/// Axis-ordered sweeps. Each is a stable sort on a single coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

/// One reordering stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Natural row-major scan order.
    Identity,
    /// Reverse the sequence.
    Flip,
    /// Nearest to the centroid first; ties keep their prior order.
    CenterFirst,
    /// Coarse-to-fine fill driven by a multiplicative generator.
    LowToHighResolution(Interleave),
    Directional(Direction),
}

impl Strategy {
    pub fn apply(&self, ops: Vec<PaintOp>) -> Vec<PaintOp> {
        match self {
            Strategy::Identity => ops,
            Strategy::Flip => {
                let mut ops = ops;
                ops.reverse();
                ops
            }
            Strategy::CenterFirst => center_first(ops),
            Strategy::LowToHighResolution(interleave) => interleave.apply(&ops),
            Strategy::Directional(direction) => directional(ops, *direction),
        }
    }
}

fn center_first(ops: Vec<PaintOp>) -> Vec<PaintOp> {
    if ops.is_empty() {
        return ops;
    }
    let n = ops.len() as f64;
    let cx = ops.iter().map(|op| op.x as f64).sum::<f64>() / n;
    let cy = ops.iter().map(|op| op.y as f64).sum::<f64>() / n;

    let mut keyed: Vec<(f64, PaintOp)> = ops
        .into_iter()
        .map(|op| {
            let dx = op.x as f64 - cx;
            let dy = op.y as f64 - cy;
            (dx * dx + dy * dy, op)
        })
        .collect();
    // sort_by is stable, so equal distances keep scan order
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, op)| op).collect()
}

fn directional(mut ops: Vec<PaintOp>, direction: Direction) -> Vec<PaintOp> {
    match direction {
        Direction::LeftToRight => ops.sort_by_key(|op| op.x),
        Direction::RightToLeft => ops.sort_by_key(|op| Reverse(op.x)),
        Direction::TopToBottom => ops.sort_by_key(|op| op.y),
        Direction::BottomToTop => ops.sort_by_key(|op| Reverse(op.y)),
    }
    ops
}

/// Generator/modulus pair for the low-to-high resolution ordering.
///
/// The sequence `g^k mod p` for `k = 0..p-1` must visit every residue
/// `1..p` exactly once; subtracting one gives a permutation of the block
/// offsets `0..p-1`. The block size is therefore `modulus - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interleave {
    generator: u64,
    modulus: u64,
}

impl Default for Interleave {
    fn default() -> Self {
        Self {
            generator: 37,
            modulus: 541,
        }
    }
}

impl Interleave {
    /// Validate that `generator` has full period modulo `modulus`.
    pub fn new(generator: u64, modulus: u64) -> DrawResult<Self> {
        let invalid = DrawError::InvalidInterleave { generator, modulus };
        if modulus < 2 {
            return Err(invalid);
        }
        let g = generator % modulus;
        let mut x = 1u64;
        for step in 1..modulus {
            x = mul_mod(x, g, modulus);
            if x == 1 || x == 0 {
                return if x == 1 && step == modulus - 1 {
                    Ok(Self { generator, modulus })
                } else {
                    Err(invalid)
                };
            }
        }
        Err(invalid)
    }

    pub fn generator(&self) -> u64 {
        self.generator
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn block_size(&self) -> usize {
        (self.modulus - 1) as usize
    }

    /// Block offsets in visiting order.
    pub fn offsets(&self) -> Vec<usize> {
        let g = self.generator % self.modulus;
        let mut x = 1u64;
        let mut offsets = Vec::with_capacity(self.block_size());
        for _ in 0..self.block_size() {
            offsets.push((x - 1) as usize);
            x = mul_mod(x, g, self.modulus);
        }
        offsets
    }

    /// For each offset in generator order, emit that offset of every block.
    pub fn apply(&self, ops: &[PaintOp]) -> Vec<PaintOp> {
        let block = self.block_size();
        let blocks = ops.len().div_ceil(block);
        let mut out = Vec::with_capacity(ops.len());
        for offset in self.offsets() {
            for b in 0..blocks {
                if let Some(op) = ops.get(b * block + offset) {
                    out.push(*op);
                }
            }
        }
        out
    }
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    (u128::from(a) * u128::from(b) % u128::from(m)) as u64
}

/// Percentage window `[start%, end%)` applied after every strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Slice {
    start: Option<f64>,
    end: Option<f64>,
}

impl Slice {
    pub fn new(start: Option<f64>, end: Option<f64>) -> DrawResult<Self> {
        let s = start.unwrap_or(0.0);
        let e = end.unwrap_or(100.0);
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(s) || !in_range(e) || s > e {
            return Err(DrawError::InvalidRange { start: s, end: e });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Option<f64> {
        self.start
    }

    pub fn end(&self) -> Option<f64> {
        self.end
    }

    fn index(pct: f64, len: usize) -> usize {
        ((len as f64 * pct / 100.0).floor() as usize).min(len)
    }

    /// `(cursor, total)` for a sequence of `len` operations.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let cursor = self.start.map_or(0, |pct| Self::index(pct, len));
        let total = self.end.map_or(len, |pct| Self::index(pct, len));
        (cursor.min(total), total)
    }
}

/// Strategies applied left to right, then the slice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    pub strategies: Vec<Strategy>,
    pub slice: Slice,
}

/// Ordered operations plus the cursor a job should start from.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered {
    pub ops: Vec<PaintOp>,
    pub cursor: usize,
}

impl Pipeline {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self {
            strategies,
            slice: Slice::default(),
        }
    }

    pub fn with_slice(mut self, slice: Slice) -> Self {
        self.slice = slice;
        self
    }

    /// Parse draw modifiers permissively.
    ///
    /// Unknown tokens are skipped; malformed or out-of-range percentages
    /// are rejected.
    pub fn parse<'a>(tokens: impl IntoIterator<Item = &'a str>) -> DrawResult<Self> {
        let mut strategies = Vec::new();
        let mut start = None;
        let mut end = None;

        for token in tokens {
            let token = token.trim().to_ascii_lowercase();
            if let Some((key, value)) = token.split_once('=') {
                match key {
                    "start" | "resume" => start = Some(parse_percent(value)?),
                    "end" => end = Some(parse_percent(value)?),
                    _ => tracing::debug!("Ignoring unknown modifier: {}", token),
                }
                continue;
            }
            let strategy = match token.as_str() {
                "identity" | "default" => Strategy::Identity,
                "flip" | "reverse" => Strategy::Flip,
                "center" | "centerfirst" => Strategy::CenterFirst,
                "lowtohigh" | "resolution" => Strategy::LowToHighResolution(Interleave::default()),
                "ltr" => Strategy::Directional(Direction::LeftToRight),
                "rtl" => Strategy::Directional(Direction::RightToLeft),
                "ttb" => Strategy::Directional(Direction::TopToBottom),
                "btt" => Strategy::Directional(Direction::BottomToTop),
                _ => {
                    tracing::debug!("Ignoring unknown modifier: {}", token);
                    continue;
                }
            };
            strategies.push(strategy);
        }

        Ok(Self::new(strategies).with_slice(Slice::new(start, end)?))
    }

    pub fn order(&self, ops: Vec<PaintOp>) -> Ordered {
        order(ops, self)
    }
}

fn parse_percent(value: &str) -> DrawResult<f64> {
    let trimmed = value.trim().trim_end_matches('%');
    match trimmed.parse::<f64>() {
        Ok(pct) if pct.is_finite() => Ok(pct),
        _ => Err(DrawError::InvalidRange {
            start: f64::NAN,
            end: f64::NAN,
        }),
    }
}

/// Run `ops` through every strategy, then cut the slice.
pub fn order(ops: Vec<PaintOp>, pipeline: &Pipeline) -> Ordered {
    let mut ops = pipeline
        .strategies
        .iter()
        .fold(ops, |ops, strategy| strategy.apply(ops));
    let (cursor, total) = pipeline.slice.bounds(ops.len());
    ops.truncate(total);
    Ordered { ops, cursor }
}
