//! Tap changer step tables and regulation.
//!
//! CGMES describes a tap changer by a handful of parameters (step range,
//! voltage increment per step, winding connection angle...). The network
//! model needs the explicit per-step table, synthesized here.
//!
//! Ratio tap changers on the reference (primary) side store `rho = 1/(1+n·du)`.
//! On the other side the model's impedance base does not move with the tap,
//! so each step also carries impedance and admittance deviations.
//!
//! Phase tap changers compute `alpha`/`rho` per step from the connection angle
//! and voltage increment, and interpolate the step reactance between
//! `x_step_min` and `x_step_max`.

use std::collections::BTreeMap;

use cgx_core::{
    ConversionError, ConversionResult, Degrees, Kilovolts, Network, PhaseRegulationMode,
    PhaseTapChanger, RatioTapChanger, RegulatedTerminal, Side, TapStep, TapTable,
    WarningCategory,
};
use tracing::{debug, trace, warn};

use crate::context::Context;
use crate::source::{self, PhaseTapChangerKind, RegulatingControl, RegulatingControlMode};

/// Absolute |du0| above which the neutral offset is ignored.
const MAX_NEUTRAL_OFFSET: f64 = 0.5;

/// Voltage increment per step assumed when the source gives none.
const DEFAULT_STEP_INCREMENT: f64 = 0.01;

pub fn check_neutral_step(id: &str, low: i32, high: i32, neutral: i32) -> ConversionResult<()> {
    if neutral < low || neutral > high {
        return Err(ConversionError::NeutralStepOutOfRange {
            tap_changer: id.to_string(),
            neutral,
            low,
            high,
        });
    }
    Ok(())
}

/// Ratio tap changer steps.
///
/// `reference_side` is true when the changer sits on the winding the model
/// impedance is not referred to (the primary).
pub fn ratio_table(tc: &source::RatioTapChanger, reference_side: bool) -> ConversionResult<TapTable> {
    check_neutral_step(&tc.id, tc.low_step, tc.high_step, tc.neutral_step)?;
    let du = tc.step_voltage_increment / 100.0;

    let steps = (tc.low_step..=tc.high_step)
        .map(|step| {
            let n = f64::from(step - tc.neutral_step);
            if reference_side {
                TapStep {
                    rho: 1.0 / (1.0 + n * du),
                    ..TapStep::default()
                }
            } else {
                let rho = 1.0 + n * du;
                let dz = (rho * rho - 1.0) * 100.0;
                let dy = (1.0 / (rho * rho) - 1.0) * 100.0;
                TapStep {
                    rho,
                    alpha: Degrees::ZERO,
                    r: dz,
                    x: dz,
                    g: dy,
                    b: dy,
                }
            }
        })
        .collect();

    Ok(TapTable::new(tc.low_step, steps))
}

/// Transformer data a phase table depends on.
#[derive(Debug, Clone, Copy)]
pub struct PhaseTableInput {
    /// Rated voltage of the winding carrying the changer, kV
    pub rated_u: f64,
    /// Series reactance of the built transformer, ohms
    pub transformer_x: f64,
    /// Negate du on the du-based paths
    pub invert_du: bool,
}

/// Notes raised while synthesizing a phase table, turned into warnings by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseTableNotes {
    pub default_connection_angle: bool,
    pub default_step_increment: bool,
    pub inconsistent_x_range: bool,
}

fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && !v.is_nan())
}

/// Phase tap changer steps, expressed from the primary side.
pub fn phase_table(
    tc: &source::PhaseTapChanger,
    input: PhaseTableInput,
) -> ConversionResult<(TapTable, PhaseTableNotes)> {
    check_neutral_step(&tc.id, tc.low_step, tc.high_step, tc.neutral_step)?;
    let mut notes = PhaseTableNotes::default();

    let theta = match tc.winding_connection_angle {
        Some(angle) => Degrees(angle).to_radians(),
        None => {
            notes.default_connection_angle = true;
            Degrees::RIGHT.to_radians()
        }
    };

    let mut du = if let (Some(out_of_phase), true) = (
        non_zero(tc.voltage_step_increment_out_of_phase),
        input.rated_u != 0.0,
    ) {
        let du = out_of_phase / input.rated_u;
        trace!(tap_changer = %tc.id, du, "du from out-of-phase voltage increment");
        du
    } else if let Some(increment) = non_zero(tc.step_voltage_increment) {
        let du = increment / 100.0;
        debug!(tap_changer = %tc.id, du, "du from step voltage increment");
        du
    } else {
        warn!(tap_changer = %tc.id, "no voltage step increment, assuming 1 %");
        notes.default_step_increment = true;
        DEFAULT_STEP_INCREMENT
    };
    if input.invert_du {
        du = -du;
    }

    let mut du0 = match (tc.neutral_u, input.rated_u) {
        (Some(neutral_u), rated_u) if rated_u != 0.0 => neutral_u / rated_u,
        _ => 0.0,
    };
    if du0.abs() > MAX_NEUTRAL_OFFSET {
        du0 = 0.0;
    }

    let direct_increment = non_zero(tc.step_phase_shift_increment);
    let (sin_theta, cos_theta) = (theta.sin(), theta.cos());

    let angles: Vec<(f64, f64)> = (tc.low_step..=tc.high_step)
        .map(|step| {
            let n = f64::from(step - tc.neutral_step);
            match (tc.kind, direct_increment) {
                (PhaseTapChangerKind::Asymmetrical, _) => {
                    let dx = (n * du - du0) * cos_theta;
                    let dy = (n * du - du0) * sin_theta;
                    (dy.atan2(1.0 + dx), 1.0 / dy.hypot(1.0 + dx))
                }
                (PhaseTapChangerKind::Symmetrical | PhaseTapChangerKind::Linear, Some(value)) => {
                    (Degrees(n * value).to_radians().value(), 1.0)
                }
                (PhaseTapChangerKind::Symmetrical | PhaseTapChangerKind::Linear, None) => {
                    let sin_half = ((n * du / 2.0 - du0) * sin_theta).clamp(-1.0, 1.0);
                    (2.0 * sin_half.asin(), 1.0)
                }
            }
        })
        .collect();

    let alpha_max = angles.iter().map(|(a, _)| a.abs()).fold(0.0, f64::max);
    let x_range = match (tc.x_step_min, tc.x_step_max) {
        (Some(min), Some(max)) => {
            if min < 0.0 || max <= 0.0 || min > max || alpha_max == 0.0 || input.transformer_x == 0.0 {
                notes.inconsistent_x_range = true;
                None
            } else {
                Some((min, max))
            }
        }
        _ => None,
    };

    let steps = angles
        .into_iter()
        .map(|(alpha, rho)| {
            let x = x_range
                .map(|(x_min, x_max)| {
                    let a = alpha.abs();
                    let ratio = match tc.kind {
                        PhaseTapChangerKind::Asymmetrical => {
                            a.tan() / alpha_max.tan() * (sin_theta - alpha_max.tan() * cos_theta)
                                / (sin_theta - a.tan() * cos_theta)
                        }
                        PhaseTapChangerKind::Symmetrical | PhaseTapChangerKind::Linear => {
                            (a / 2.0).sin() / (alpha_max / 2.0).sin()
                        }
                    };
                    let x = x_min + (x_max - x_min) * ratio * ratio;
                    (x / input.transformer_x - 1.0) * 100.0
                })
                .unwrap_or(0.0);
            TapStep {
                rho,
                alpha: cgx_core::Radians(alpha).to_degrees(),
                x,
                ..TapStep::default()
            }
        })
        .collect();

    Ok((TapTable::new(tc.low_step, steps), notes))
}

/// Re-express a primary-side table for a changer on the secondary winding.
pub fn mirror_to_secondary(table: &TapTable) -> TapTable {
    let steps = table
        .steps()
        .iter()
        .map(|step| TapStep {
            rho: 1.0 / step.rho,
            alpha: -step.alpha,
            ..*step
        })
        .collect();
    TapTable::new(table.low_step(), steps)
}

/// Where a regulating control measures, as a network element end when one
/// was registered for the control terminal, otherwise as the bus of its node.
pub fn regulated_terminal(ctx: &Context<'_>, control: &RegulatingControl) -> Option<RegulatedTerminal> {
    if let Some(terminal) = ctx.registry.terminal(&control.terminal) {
        return Some(RegulatedTerminal::Terminal(terminal.clone()));
    }
    let terminal = ctx.index.terminals.get(control.terminal.as_str())?;
    if !ctx.classify(&terminal.topological_node).is_ordinary() {
        return None;
    }
    let node = ctx.index.nodes.get(terminal.topological_node.as_str())?;
    Some(RegulatedTerminal::Bus {
        id: ctx.bus_id(node),
    })
}

fn control<'a>(
    ctx: &Context<'a>,
    owner: &str,
    id: Option<&str>,
) -> ConversionResult<Option<&'a RegulatingControl>> {
    match id {
        None => Ok(None),
        Some(id) => ctx
            .index
            .regulating_controls
            .get(id)
            .copied()
            .map(Some)
            .ok_or_else(|| ConversionError::unknown("tap changer", owner, "regulating control", id)),
    }
}

fn build_ratio(
    ctx: &mut Context<'_>,
    tc: &source::RatioTapChanger,
    reference_side: bool,
) -> ConversionResult<RatioTapChanger> {
    let id = ctx.naming.id(tc);
    let table = ratio_table(tc, reference_side)?;
    let mut built = RatioTapChanger {
        id: id.clone(),
        table,
        neutral_step: tc.neutral_step,
        tap_position: tc.normal_step,
        load_tap_changing_capabilities: false,
        regulating: false,
        target_v: Kilovolts(f64::NAN),
        target_deadband: 0.0,
        regulated_terminal: None,
    };

    let Some(rc) = control(ctx, &tc.id, tc.regulating_control.as_deref())? else {
        return Ok(built);
    };
    match rc.mode {
        RegulatingControlMode::Voltage => {
            built.load_tap_changing_capabilities = true;
            built.regulated_terminal = regulated_terminal(ctx, rc);
            built.target_deadband = rc.target_deadband;
            if rc.target_value <= 0.0 {
                warn!(tap_changer = %id, target = rc.target_value, "non-positive target voltage, regulation disabled");
                ctx.diagnostics.add_warning(
                    WarningCategory::NonPositiveTargetVoltage,
                    [id.as_str()],
                    "voltage regulation disabled: target voltage is not positive",
                );
            } else {
                built.regulating = true;
                built.target_v = Kilovolts(rc.target_value);
            }
        }
        RegulatingControlMode::Fixed => {}
        mode => {
            ctx.diagnostics.add_warning(
                WarningCategory::UnsupportedRegulationMode,
                [id.as_str(), rc.id.as_str()],
                &format!("ratio tap changer regulation mode {} is not supported", mode.as_str()),
            );
        }
    }
    Ok(built)
}

fn build_phase(
    ctx: &mut Context<'_>,
    tc: &source::PhaseTapChanger,
    input: PhaseTableInput,
    side: Side,
) -> ConversionResult<PhaseTapChanger> {
    let id = ctx.naming.id(tc);
    let (table, notes) = phase_table(tc, input)?;
    let table = if side == Side::Two {
        mirror_to_secondary(&table)
    } else {
        table
    };

    if notes.default_connection_angle {
        ctx.diagnostics.add_warning(
            WarningCategory::DefaultConnectionAngle,
            [id.as_str()],
            "winding connection angle missing, 90 degrees assumed",
        );
    }
    if notes.default_step_increment {
        ctx.diagnostics.add_warning(
            WarningCategory::DefaultStepIncrement,
            [id.as_str()],
            "voltage step increment missing, 1 % assumed",
        );
    }
    if notes.inconsistent_x_range {
        warn!(tap_changer = %id, "xStepMin/xStepMax unusable, transformer X kept for every step");
        ctx.diagnostics.add_warning(
            WarningCategory::InconsistentXStepRange,
            [id.as_str()],
            "xStepMin/xStepMax unusable, transformer X kept for every step",
        );
    }

    let mut built = PhaseTapChanger {
        id: id.clone(),
        table,
        neutral_step: tc.neutral_step,
        tap_position: tc.normal_step,
        regulation_mode: PhaseRegulationMode::FixedTap,
        regulation_value: f64::NAN,
        regulating: false,
        target_deadband: 0.0,
        regulated_terminal: None,
    };

    if let Some(rc) = control(ctx, &tc.id, tc.regulating_control.as_deref())? {
        if rc.mode == RegulatingControlMode::CurrentFlow {
            built.regulation_mode = PhaseRegulationMode::CurrentLimiter;
            built.regulation_value = rc.target_value;
            built.regulating = rc.enabled;
            built.target_deadband = rc.target_deadband;
            built.regulated_terminal = regulated_terminal(ctx, rc);
        } else {
            ctx.diagnostics.add_warning(
                WarningCategory::UnsupportedRegulationMode,
                [id.as_str(), rc.id.as_str()],
                &format!("phase tap changer regulation mode {} is not supported", rc.mode.as_str()),
            );
        }
    }
    Ok(built)
}

/// Tap changers of one transformer, grouped by kind.
#[derive(Default)]
struct TransformerTapChangers<'a> {
    ratio: Vec<&'a source::RatioTapChanger>,
    phase: Vec<&'a source::PhaseTapChanger>,
}

/// Attach synthesized tap changers to the transformers already in `network`.
pub fn attach_tap_changers(ctx: &mut Context<'_>, network: &mut Network) -> ConversionResult<()> {
    let model = ctx.index.model;
    let owner = |kind: &'static str, id: &str, end: &str| {
        ctx.index
            .transformer_ends
            .get(end)
            .map(|(transformer, _)| *transformer)
            .ok_or_else(|| ConversionError::unknown(kind, id, "transformer end", end))
    };

    let mut by_transformer: BTreeMap<&str, TransformerTapChangers> = BTreeMap::new();
    for tc in &model.ratio_tap_changers {
        let transformer = owner("ratio tap changer", &tc.id, &tc.transformer_end)?;
        by_transformer.entry(&transformer.id).or_default().ratio.push(tc);
    }
    for tc in &model.phase_tap_changers {
        let transformer = owner("phase tap changer", &tc.id, &tc.transformer_end)?;
        by_transformer.entry(&transformer.id).or_default().phase.push(tc);
    }
    let transformers: BTreeMap<&str, &source::PowerTransformer> = model
        .power_transformers
        .iter()
        .map(|t| (t.id.as_str(), t))
        .collect();

    for (transformer_id, changers) in by_transformer {
        let Some(transformer) = transformers.get(transformer_id).copied() else {
            continue;
        };
        let network_id = ctx.naming.id(transformer);

        match transformer.ends.len() {
            2 => {
                if changers.ratio.len() > 1 {
                    return Err(ConversionError::DuplicateTapChanger {
                        transformer: transformer_id.to_string(),
                        kind: "ratio",
                    });
                }
                if changers.phase.len() > 1 {
                    return Err(ConversionError::DuplicateTapChanger {
                        transformer: transformer_id.to_string(),
                        kind: "phase",
                    });
                }
                if let (Some(ratio), Some(phase)) = (changers.ratio.first(), changers.phase.first()) {
                    if ratio.transformer_end != phase.transformer_end {
                        return Err(ConversionError::TapChangerSidesMismatch {
                            transformer: transformer_id.to_string(),
                        });
                    }
                }

                let mut ends: Vec<_> = transformer.ends.iter().collect();
                ends.sort_by_key(|e| e.end_number);
                let side_of = |end_id: &str| {
                    if ends[0].id == end_id {
                        Side::One
                    } else {
                        Side::Two
                    }
                };

                let ratio = match changers.ratio.first() {
                    Some(tc) => {
                        let side = side_of(&tc.transformer_end);
                        Some(build_ratio(ctx, tc, side == Side::One)?)
                    }
                    None => None,
                };
                let phase = match changers.phase.first() {
                    Some(tc) => {
                        let side = side_of(&tc.transformer_end);
                        let end = if side == Side::One { ends[0] } else { ends[1] };
                        let transformer_x = network
                            .two_winding_transformers
                            .get(&network_id)
                            .map(|t| t.x)
                            .unwrap_or(0.0);
                        let input = PhaseTableInput {
                            rated_u: end.rated_u,
                            transformer_x,
                            invert_du: ctx.config.invert_voltage_step_increment_out_of_phase,
                        };
                        Some(build_phase(ctx, tc, input, side)?)
                    }
                    None => None,
                };

                let built = network
                    .two_winding_transformers
                    .get_mut(&network_id)
                    .ok_or_else(|| {
                        ConversionError::unknown("tap changer", transformer_id, "transformer", &network_id)
                    })?;
                built.ratio_tap_changer = ratio;
                built.phase_tap_changer = phase;
            }
            3 => {
                if !changers.phase.is_empty() {
                    return Err(ConversionError::UnsupportedPhaseTapChanger {
                        transformer: transformer_id.to_string(),
                    });
                }
                let mut ends: Vec<_> = transformer.ends.iter().collect();
                ends.sort_by(|a, b| b.rated_u.total_cmp(&a.rated_u));

                let mut by_leg: BTreeMap<Side, &source::RatioTapChanger> = BTreeMap::new();
                for &tc in &changers.ratio {
                    let position = ends
                        .iter()
                        .position(|e| e.id == tc.transformer_end)
                        .ok_or_else(|| {
                            ConversionError::unknown("ratio tap changer", &tc.id, "transformer end", &tc.transformer_end)
                        })?;
                    let side = match position {
                        0 => Side::One,
                        1 => Side::Two,
                        _ => Side::Three,
                    };
                    if by_leg.insert(side, tc).is_some() {
                        return Err(ConversionError::DuplicateTapChanger {
                            transformer: transformer_id.to_string(),
                            kind: "ratio",
                        });
                    }
                }

                for (side, tc) in by_leg {
                    if side == Side::One {
                        check_neutral_step(&tc.id, tc.low_step, tc.high_step, tc.neutral_step)?;
                        warn!(transformer = %network_id, tap_changer = %tc.id, "ratio tap changer on the highest voltage leg dropped");
                        ctx.diagnostics.add_warning(
                            WarningCategory::DroppedTapChanger,
                            [tc.id.as_str(), transformer_id],
                            "ratio tap changer on leg 1 of a three-winding transformer is not supported",
                        );
                        continue;
                    }
                    let built_tc = build_ratio(ctx, tc, false)?;
                    let built = network
                        .three_winding_transformers
                        .get_mut(&network_id)
                        .ok_or_else(|| {
                            ConversionError::unknown("tap changer", transformer_id, "transformer", &network_id)
                        })?;
                    built.leg_mut(side).ratio_tap_changer = Some(built_tc);
                }
            }
            count => {
                return Err(ConversionError::UnsupportedWindingCount {
                    transformer: transformer_id.to_string(),
                    count,
                });
            }
        }
    }
    Ok(())
}
