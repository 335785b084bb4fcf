use clap::Args;
use eyerest_core::{generate_curve, Curve};

#[derive(Args)]
pub struct CurveArgs {
    /// Starting channel-A level in 0.0..=1.0
    #[arg(long, allow_hyphen_values = true)]
    pub baseline: f64,
    /// Signed change of channel A (clamped to keep the target in range)
    #[arg(long, allow_hyphen_values = true)]
    pub delta: f64,
    /// Damping applied to the channel-B sine term
    #[arg(long, default_value = "0.3")]
    pub damping: f64,
    /// Print the curve walked backward (restore order)
    #[arg(long)]
    pub reverse: bool,
}

pub fn run(args: CurveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(&build(&args))?;
    println!("{json}");
    Ok(())
}

fn build(args: &CurveArgs) -> Curve {
    let curve = generate_curve(args.baseline, args.delta, args.damping);
    if args.reverse {
        curve.reversed()
    } else {
        curve
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(baseline: f64, delta: f64, reverse: bool) -> CurveArgs {
        CurveArgs {
            baseline,
            delta,
            damping: 0.3,
            reverse,
        }
    }

    #[test]
    fn forward_curve_starts_at_baseline() {
        let curve = build(&args(0.2, 0.8, false));
        let first = curve.first().unwrap();
        assert_eq!(first.channel_a, 20.0);
        assert_eq!(first.channel_b, 100.0);
    }

    #[test]
    fn reverse_flag_walks_backward() {
        let forward = build(&args(0.2, 0.8, false));
        let backward = build(&args(0.2, 0.8, true));
        assert_eq!(forward.len(), backward.len());
        assert_eq!(forward.first(), backward.last());
        assert_eq!(forward.last(), backward.first());
    }

    #[test]
    fn serializes_as_point_array() {
        let json = serde_json::to_value(build(&args(0.5, 0.1, false))).unwrap();
        let points = json.as_array().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0]["channel_a"], 50.0);
    }
}
