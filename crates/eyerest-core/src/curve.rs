//! Volume crossfade curve generator.
//!
//! Produces the ordered `(channel A %, channel B %)` setpoints of a ducking
//! fade. Channel A is swept linearly in 5-point steps away from the baseline;
//! channel B follows an inverse-proportion curve of channel A, sharpened near
//! the low end by a sine term and damped by `damping_factor`.
//!
//! Channel A is swept in integer units of 1/100 percent so every emitted
//! value already has 2-decimal resolution.

use serde::{Deserialize, Serialize};

/// Units of channel A per percentage point.
const UNITS_PER_PERCENT: i64 = 100;
/// Units of channel A at full scale (100%).
const FULL_SCALE_UNITS: i64 = 100 * UNITS_PER_PERCENT;
/// Sweep step: 5 percentage points.
pub const STEP_UNITS: i64 = 5 * UNITS_PER_PERCENT;
/// Sweep step in percent, for callers comparing channel-A values.
pub const STEP_PERCENT: f64 = (STEP_UNITS / UNITS_PER_PERCENT) as f64;

/// One paired setpoint of a crossfade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub channel_a: f64,
    pub channel_b: f64,
}

impl CurvePoint {
    pub fn new(channel_a: f64, channel_b: f64) -> Self {
        Self {
            channel_a,
            channel_b,
        }
    }
}

/// An ordered crossfade, generated once per ramp and consumed read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve {
    points: Vec<CurvePoint>,
}

impl Curve {
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&CurvePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&CurvePoint> {
        self.points.last()
    }

    /// The same setpoints walked backward, restoring the starting levels.
    pub fn reversed(mut self) -> Self {
        self.points.reverse();
        self
    }
}

impl IntoIterator for Curve {
    type Item = CurvePoint;
    type IntoIter = std::vec::IntoIter<CurvePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

/// Generate the crossfade from `baseline` to `baseline + delta`.
///
/// `baseline` is clamped to `0.0..=1.0` and `delta` is shrunk so the target
/// stays inside the same range. The first point is always the baseline; the
/// target is included when it falls on the 5-point grid.
pub fn generate_curve(baseline: f64, delta: f64, damping_factor: f64) -> Curve {
    let baseline = clamp_unit(baseline);
    let delta = clamp_delta(baseline, delta);
    let damping_factor = if damping_factor.is_nan() { 0.0 } else { damping_factor };

    let start = to_units(baseline);
    let end = to_units(baseline + delta);
    let step = if end >= start { STEP_UNITS } else { -STEP_UNITS };
    // Exclusive bound, one unit past the endpoint.
    let bound = end + step.signum();

    let reference = baseline * (FULL_SCALE_UNITS as f64);
    let mut points = Vec::new();
    let mut units = start;
    while (step > 0 && units < bound) || (step < 0 && units > bound) {
        points.push(point_at(units, reference, damping_factor));
        units += step;
    }

    debug_assert!(
        points.iter().all(|p| (0.0..=100.0).contains(&p.channel_a)
            && (0.0..=100.0).contains(&p.channel_b)),
        "curve point out of range for baseline={baseline} delta={delta}"
    );
    Curve { points }
}

/// Channel-B level for a channel-A value, `number` being `baseline*10000/a`.
pub fn sigmoid(number: f64, factor: f64) -> f64 {
    let reverse = (number - 100.0).abs();
    let mut extra = (number / 100.0 + 1.5).sin() - 0.6;
    if extra < 0.0 || factor == 0.0 {
        extra = 0.0;
    }
    let adjusted = number + reverse * factor - extra * 100.0;
    truncate_hundredths(adjusted.clamp(0.0, 100.0))
}

fn point_at(units: i64, reference: f64, factor: f64) -> CurvePoint {
    if units == 0 {
        return CurvePoint::new(0.0, 100.0);
    }
    let percent = units as f64 / UNITS_PER_PERCENT as f64;
    let channel_b = sigmoid(reference / percent, factor);
    // Upper cap only; the sweep never goes below zero.
    let channel_a = units.min(FULL_SCALE_UNITS) as f64 / UNITS_PER_PERCENT as f64;
    CurvePoint::new(channel_a, channel_b)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

fn clamp_delta(baseline: f64, delta: f64) -> f64 {
    if delta.is_nan() {
        return 0.0;
    }
    if baseline + delta > 1.0 {
        1.0 - baseline
    } else if baseline + delta < 0.0 {
        -baseline
    } else {
        delta
    }
}

fn to_units(level: f64) -> i64 {
    (level * FULL_SCALE_UNITS as f64).round() as i64
}

fn truncate_hundredths(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn full_duck_from_twenty_percent() {
        let curve = generate_curve(0.2, 0.8, 0.3);
        assert_eq!(curve.first(), Some(&CurvePoint::new(20.0, 100.0)));
        assert_eq!(curve.last(), Some(&CurvePoint::new(100.0, 4.83)));
        assert_eq!(curve.len(), 17);
    }

    #[test]
    fn overshooting_decrease_is_clamped() {
        let curve = generate_curve(0.8, -0.9, 0.0);
        assert_eq!(curve.first().map(|p| p.channel_a), Some(80.0));
        assert_eq!(curve.last(), Some(&CurvePoint::new(0.0, 100.0)));
        assert!(curve.points().iter().all(|p| p.channel_b == 100.0));
    }

    #[test]
    fn overshooting_increase_is_clamped() {
        let curve = generate_curve(0.7, 0.5, 0.3);
        assert_eq!(curve.first().map(|p| p.channel_a), Some(70.0));
        assert_eq!(curve.last().map(|p| p.channel_a), Some(100.0));
    }

    #[test]
    fn channel_b_falls_as_channel_a_rises() {
        let curve = generate_curve(0.3, 0.5, 0.3);
        let levels: Vec<f64> = curve.points().iter().map(|p| p.channel_b).collect();
        assert!(levels.windows(2).all(|w| w[0] >= w[1]), "{levels:?}");
    }

    #[test]
    fn zero_delta_yields_single_point() {
        let curve = generate_curve(0.4, 0.0, 0.3);
        assert_eq!(curve.points(), &[CurvePoint::new(40.0, 100.0)]);
    }

    #[test]
    fn silent_baseline_starts_at_full_channel_b() {
        let curve = generate_curve(0.0, 0.5, 0.3);
        assert_eq!(curve.first(), Some(&CurvePoint::new(0.0, 100.0)));
        // baseline 0 makes every later channel-B value collapse to 0
        assert!(curve.points()[1..].iter().all(|p| p.channel_b == 0.0));
    }

    #[test]
    fn off_grid_endpoint_is_not_appended() {
        let curve = generate_curve(0.23, 0.8, 0.3);
        assert_eq!(curve.first().map(|p| p.channel_a), Some(23.0));
        assert_eq!(curve.last().map(|p| p.channel_a), Some(98.0));
    }

    #[test]
    fn sigmoid_is_identity_at_reference() {
        assert_eq!(sigmoid(100.0, 0.3), 100.0);
        assert_eq!(sigmoid(100.0, 0.0), 100.0);
    }

    #[test]
    fn sigmoid_truncates_instead_of_rounding() {
        // 20 + 80*0.3 - (sin(1.7) - 0.6)*100 = 4.834...
        assert_eq!(sigmoid(20.0, 0.3), 4.83);
    }

    #[test]
    fn reversed_walks_backward() {
        let forward = generate_curve(0.2, 0.5, 0.3);
        let backward = forward.clone().reversed();
        assert_eq!(forward.first(), backward.last());
        assert_eq!(forward.last(), backward.first());
    }

    proptest! {
        #[test]
        fn all_points_within_percent_range(
            baseline in 0.0f64..=1.0,
            delta in -2.0f64..=2.0,
            factor in 0.0f64..=1.0,
        ) {
            let curve = generate_curve(baseline, delta, factor);
            prop_assert!(!curve.is_empty());
            for p in curve.points() {
                prop_assert!((0.0..=100.0).contains(&p.channel_a), "a={}", p.channel_a);
                prop_assert!((0.0..=100.0).contains(&p.channel_b), "b={}", p.channel_b);
            }
        }

        #[test]
        fn reversed_curve_returns_to_start(
            baseline in 0.0f64..=1.0,
            delta in -1.0f64..=1.0,
            factor in 0.0f64..=1.0,
        ) {
            let restored = generate_curve(baseline, delta, factor).reversed();
            let end = restored.last().map(|p| p.channel_a).unwrap_or(f64::NAN);
            prop_assert!((end - baseline * 100.0).abs() <= STEP_PERCENT);
        }

        #[test]
        fn generation_is_deterministic(
            baseline in -0.5f64..=1.5,
            delta in -2.0f64..=2.0,
            factor in 0.0f64..=1.0,
        ) {
            prop_assert_eq!(
                generate_curve(baseline, delta, factor),
                generate_curve(baseline, delta, factor)
            );
        }
    }
}
