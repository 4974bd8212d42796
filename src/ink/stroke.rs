//! Geometric stroke model and arc-length resampling.
//!
//! A [`Stroke`] is an ordered list of [`InkPoint`] samples captured by the
//! drawing surface.  Strokes are immutable once captured; a block's ink is
//! replaced wholesale on every edit.

use serde::{Deserialize, Serialize};

/// Upper bound on the samples one stroke resamples to, final point included.
pub const MAX_RESAMPLED_POINTS: usize = 100_000;

// ---------------------------------------------------------------------------
// InkPoint
// ---------------------------------------------------------------------------

/// A single pen sample: 2D location plus pressure.
///
/// Time ordering is implicit in the sample's position inside its stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InkPoint {
    pub x: f32,
    pub y: f32,
    /// Normalised pen pressure / force.
    pub force: f32,
}

impl InkPoint {
    pub fn new(x: f32, y: f32, force: f32) -> Self {
        Self { x, y, force }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.force.is_finite()
    }

    // f64 keeps the squares of large finite coordinates finite.
    fn distance_to(&self, other: &InkPoint) -> f64 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        (dx * dx + dy * dy).sqrt()
    }

    fn lerp(&self, other: &InkPoint, t: f64) -> InkPoint {
        let mix = |from: f32, to: f32| {
            let from = f64::from(from);
            (from + (f64::from(to) - from) * t) as f32
        };
        InkPoint {
            x: mix(self.x, other.x),
            y: mix(self.y, other.y),
            force: mix(self.force, other.force),
        }
    }
}

// ---------------------------------------------------------------------------
// Stroke
// ---------------------------------------------------------------------------

/// One continuous pen stroke.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    points: Vec<InkPoint>,
}

impl Stroke {
    pub fn new(points: Vec<InkPoint>) -> Self {
        Self { points }
    }

    /// Convenience constructor from `(x, y)` pairs at uniform pressure.
    pub fn from_xy(coords: &[(f32, f32)], force: f32) -> Self {
        Self::new(
            coords
                .iter()
                .map(|&(x, y)| InkPoint::new(x, y, force))
                .collect(),
        )
    }

    pub fn points(&self) -> &[InkPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total polyline length of the stroke.
    pub fn length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum::<f64>() as f32
    }

    /// Resample the stroke path at a fixed arc-length `interval`.
    ///
    /// The first sample is always the stroke's first point and the last
    /// sample is always its final point.  Pressure is interpolated alongside
    /// the location.  A non-positive or NaN `interval` returns the raw
    /// samples.
    ///
    /// Samples with a non-finite coordinate or pressure are dropped and the
    /// path joins their neighbours, so a stroke made only of such samples
    /// resamples to nothing.  Output is capped at [`MAX_RESAMPLED_POINTS`].
    pub fn resample(&self, interval: f32) -> Vec<InkPoint> {
        if interval.is_nan() || interval <= 0.0 {
            return self.points.clone();
        }

        let finite: Vec<&InkPoint> = self.points.iter().filter(|p| p.is_finite()).collect();
        if finite.len() < self.points.len() {
            log::warn!(
                "ink: dropping {} non-finite sample(s) from a {}-point stroke",
                self.points.len() - finite.len(),
                self.points.len()
            );
        }
        let (Some(&&first), Some(&&last_raw)) = (finite.first(), finite.last()) else {
            return Vec::new();
        };

        let interval = f64::from(interval);
        let mut out = vec![first];
        // Distance travelled along the path since the last emitted sample.
        let mut carried = 0.0_f64;

        'segments: for pair in finite.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let seg_len = a.distance_to(b);
            if seg_len == 0.0 {
                continue;
            }

            let start = interval - carried;
            if start > seg_len {
                carried += seg_len;
                continue;
            }

            let steps = (((seg_len - start) / interval).floor() as usize).saturating_add(1);
            for k in 0..steps {
                // Leave room for the final point.
                if out.len() + 1 >= MAX_RESAMPLED_POINTS {
                    log::warn!(
                        "ink: stroke of length {:.0} truncated to {MAX_RESAMPLED_POINTS} samples",
                        self.length()
                    );
                    break 'segments;
                }
                let along = start + k as f64 * interval;
                out.push(a.lerp(b, along / seg_len));
            }
            carried = seg_len - (start + (steps - 1) as f64 * interval);
        }

        if let Some(last_out) = out.last() {
            if finite.len() > 1 && last_out.distance_to(&last_raw) > f64::from(f32::EPSILON) {
                out.push(last_raw);
            }
        }

        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
