//! Generator reactive capability limits.

use cgx_core::{ConversionDiagnostics, Megavars, Megawatts, ReactiveCurvePoint, ReactiveLimits, WarningCategory};
use tracing::debug;

use crate::source::{CurvePoint, ReactiveCapabilityCurve, SynchronousMachine};

/// Placeholder active power some exporters write for an undefined curve point.
pub const CURVE_SENTINEL_P: f64 = -9999.0;

/// Reactive limits of a machine from its capability curve, or from its fixed
/// minQ/maxQ when it has no usable curve.
pub fn reactive_limits(
    generator_id: &str,
    machine: &SynchronousMachine,
    curve: Option<&ReactiveCapabilityCurve>,
    diagnostics: &mut ConversionDiagnostics,
) -> ReactiveLimits {
    let fixed = || ReactiveLimits::MinMax {
        min_q: Megavars(machine.min_q.unwrap_or(-f64::MAX)),
        max_q: Megavars(machine.max_q.unwrap_or(f64::MAX)),
    };
    let Some(curve) = curve else {
        return fixed();
    };

    let (sentinel, mut points): (Vec<CurvePoint>, Vec<CurvePoint>) = curve
        .points
        .iter()
        .copied()
        .partition(|point| point.p == CURVE_SENTINEL_P);
    if !sentinel.is_empty() {
        diagnostics.add_warning(
            WarningCategory::CurveSentinelPoint,
            [generator_id, curve.id.as_str()],
            &format!("{} curve point(s) at P = -9999 ignored", sentinel.len()),
        );
    }

    points.sort_by(|a, b| a.p.total_cmp(&b.p));
    let before = points.len();
    points.dedup_by(|later, earlier| later.p == earlier.p);
    if points.len() < before {
        diagnostics.add_warning(
            WarningCategory::DuplicateCurvePoint,
            [generator_id, curve.id.as_str()],
            &format!("{} curve point(s) with repeated P dropped", before - points.len()),
        );
    }

    match points.as_slice() {
        [] => {
            debug!(generator = generator_id, curve = %curve.id, "empty capability curve, using fixed limits");
            fixed()
        }
        [single] => ReactiveLimits::MinMax {
            min_q: Megavars(single.min_q),
            max_q: Megavars(single.max_q),
        },
        _ => ReactiveLimits::Curve {
            points: points
                .iter()
                .map(|point| ReactiveCurvePoint {
                    p: Megawatts(point.p),
                    min_q: Megavars(point.min_q),
                    max_q: Megavars(point.max_q),
                })
                .collect(),
        },
    }
}
