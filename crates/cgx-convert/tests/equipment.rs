//! Equipment builders and transformer tap changers on a single-substation model,
//! including the fatal transformer and boundary conditions.

use cgx_convert::source::{
    EnergyConsumer, LineSegment, OtherEquipment, PhaseTapChanger, PhaseTapChangerKind,
    PowerTransformer, RatioTapChanger, Region, RegulatingControl, RegulatingControlMode,
    ShuntCompensator, Substation, SvPowerFlow, SvVoltage, SynchronousMachine, Terminal,
    TopologicalNode, TransformerEnd, VoltageLevel,
};
use cgx_convert::{CgmesModel, Conversion, ConversionConfig, NetworkAssembler};
use cgx_core::{
    ConversionError, ConversionResult, Kilovolts, LoadType, Megavars, Megawatts,
    PhaseRegulationMode, RegulatedTerminal, Side, TerminalRef, WarningCategory,
};

fn terminal(id: &str, equipment: &str, node: &str, sequence_number: u32) -> Terminal {
    Terminal {
        id: id.into(),
        equipment: equipment.into(),
        topological_node: node.into(),
        connected: true,
        sequence_number,
    }
}

fn flow(terminal: &str, p: f64, q: f64) -> SvPowerFlow {
    SvPowerFlow {
        terminal: terminal.into(),
        p,
        q,
    }
}

fn node(id: &str, vl: &str) -> TopologicalNode {
    TopologicalNode {
        id: id.into(),
        name: id.into(),
        container: Some(vl.into()),
        ..Default::default()
    }
}

fn vl(id: &str, nominal_voltage: f64) -> VoltageLevel {
    VoltageLevel {
        id: id.into(),
        name: id.into(),
        substation: "S1".into(),
        nominal_voltage,
    }
}

/// One French substation with 400, 220 and 63 kV levels.
///
/// ```text
///   B400        B220 ──L220── B220B        B63
/// ```
fn station() -> CgmesModel {
    let buses = [
        ("B400", "VL400", 402.0),
        ("B220", "VL220", 221.0),
        ("B220B", "VL220", 220.5),
        ("B63", "VL63", 63.5),
    ];
    CgmesModel {
        regions: vec![Region {
            id: "R_FR".into(),
            name: "France".into(),
        }],
        substations: vec![Substation {
            id: "S1".into(),
            name: "Station".into(),
            region: Some("R_FR".into()),
        }],
        voltage_levels: vec![vl("VL400", 400.0), vl("VL220", 220.0), vl("VL63", 63.0)],
        topological_nodes: buses.iter().map(|(id, vl, _)| node(id, vl)).collect(),
        terminals: vec![
            terminal("T_L220_1", "L220", "B220", 1),
            terminal("T_L220_2", "L220", "B220B", 2),
        ],
        line_segments: vec![LineSegment {
            id: "L220".into(),
            name: "L220".into(),
            r: 0.4,
            x: 4.0,
            ..Default::default()
        }],
        sv_voltages: buses
            .iter()
            .map(|(id, _, v)| SvVoltage {
                topological_node: (*id).into(),
                v: *v,
                angle: 0.0,
            })
            .collect(),
        ..Default::default()
    }
}

/// 400/220 kV transformer `id` between B400 (end `{id}_E1`) and B220 (end `{id}_E2`).
fn add_two_winding(model: &mut CgmesModel, id: &str) {
    let (t1, t2) = (format!("T_{id}_1"), format!("T_{id}_2"));
    model.terminals.push(terminal(&t1, id, "B400", 1));
    model.terminals.push(terminal(&t2, id, "B220", 2));
    model.power_transformers.push(PowerTransformer {
        id: id.into(),
        name: id.into(),
        ends: vec![
            TransformerEnd {
                id: format!("{id}_E1"),
                terminal: t1,
                end_number: 1,
                rated_u: 400.0,
                ..Default::default()
            },
            TransformerEnd {
                id: format!("{id}_E2"),
                terminal: t2,
                end_number: 2,
                rated_u: 220.0,
                r: 1.0,
                x: 30.0,
                ..Default::default()
            },
        ],
    });
}

/// 400/220/63 kV transformer `id`, ends declared lowest voltage first.
/// End ids are `{id}_E400`, `{id}_E220` and `{id}_E63`.
fn add_three_winding(model: &mut CgmesModel, id: &str) {
    let windings = [("63", "B63", 63.0, 3), ("400", "B400", 400.0, 1), ("220", "B220", 220.0, 2)];
    let mut ends = Vec::new();
    for (suffix, bus, rated_u, end_number) in windings {
        let terminal_id = format!("T_{id}_{suffix}");
        model.terminals.push(terminal(&terminal_id, id, bus, end_number));
        ends.push(TransformerEnd {
            id: format!("{id}_E{suffix}"),
            terminal: terminal_id,
            end_number,
            rated_u,
            x: rated_u / 10.0,
            ..Default::default()
        });
    }
    model.power_transformers.push(PowerTransformer {
        id: id.into(),
        name: id.into(),
        ends,
    });
}

fn ratio_changer(id: &str, end: &str) -> RatioTapChanger {
    RatioTapChanger {
        id: id.into(),
        name: id.into(),
        transformer_end: end.into(),
        low_step: -5,
        high_step: 5,
        neutral_step: 0,
        normal_step: 0,
        step_voltage_increment: 1.0,
        regulating_control: None,
    }
}

fn control(id: &str, mode: RegulatingControlMode, terminal: &str, target_value: f64) -> RegulatingControl {
    RegulatingControl {
        id: id.into(),
        mode,
        terminal: terminal.into(),
        target_value,
        enabled: true,
        target_deadband: 0.5,
    }
}

fn run(model: &CgmesModel) -> ConversionResult<Conversion> {
    let config = ConversionConfig::default();
    NetworkAssembler::new(&config)
        .expect("default config")
        .convert(model)
}

/// Station with generator G1 on B220, measured at -100 MW / -20 Mvar (load convention).
fn with_generator(regulating_control: Option<&str>) -> CgmesModel {
    let mut model = station();
    model.machines.push(SynchronousMachine {
        id: "G1".into(),
        name: "G1".into(),
        min_p: Some(0.0),
        max_p: Some(250.0),
        regulating_control: regulating_control.map(Into::into),
        ..Default::default()
    });
    model.terminals.push(terminal("T_G1", "G1", "B220", 1));
    model.sv_power_flows.push(flow("T_G1", -100.0, -20.0));
    model
}

#[test]
fn generator_without_control_takes_set_points_from_the_flow() {
    let conversion = run(&with_generator(None)).expect("conversion");
    let generator = &conversion.network.generators["G1"];

    assert_eq!(generator.target_p, Megawatts(100.0));
    assert_eq!(generator.target_q, Megavars(20.0));
    assert!(!generator.voltage_regulator_on);
    assert_eq!(generator.target_v, None);
    assert_eq!(generator.regulated_terminal, None);
    assert_eq!(
        conversion.diagnostics.ids_in(WarningCategory::MissingRegulatingControl),
        vec!["G1"]
    );
}

#[test]
fn zero_voltage_target_falls_back_to_nominal() {
    let mut model = with_generator(Some("RC_G1"));
    model
        .regulating_controls
        .push(control("RC_G1", RegulatingControlMode::Voltage, "T_G1", 0.0));

    let conversion = run(&model).expect("conversion");
    let generator = &conversion.network.generators["G1"];

    assert!(generator.voltage_regulator_on);
    assert_eq!(generator.target_v, Some(Kilovolts(220.0)));
    assert_eq!(
        generator.regulated_terminal,
        Some(RegulatedTerminal::Terminal(TerminalRef::new("G1", Side::One)))
    );
    assert_eq!(
        conversion.diagnostics.ids_in(WarningCategory::ZeroTargetVoltage),
        vec!["G1"]
    );
    assert!(!conversion
        .diagnostics
        .contains(WarningCategory::MissingRegulatingControl, "G1"));
}

#[test]
fn remote_voltage_regulation_points_at_the_bus() {
    let mut model = with_generator(Some("RC_G1"));
    let mut rc = control("RC_G1", RegulatingControlMode::Voltage, "T_L220_2", 223.0);
    rc.enabled = false;
    model.regulating_controls.push(rc);

    let conversion = run(&model).expect("conversion");
    let generator = &conversion.network.generators["G1"];

    assert!(generator.voltage_regulator_on);
    assert_eq!(generator.target_v, Some(Kilovolts(223.0)));
    assert_eq!(
        generator.regulated_terminal,
        Some(RegulatedTerminal::Bus { id: "B220B".into() })
    );
    assert!(conversion
        .diagnostics
        .warnings_in(WarningCategory::ZeroTargetVoltage)
        .next()
        .is_none());
}

#[test]
fn reactive_power_control_sets_target_q_only() {
    let mut model = with_generator(Some("RC_G1"));
    model
        .regulating_controls
        .push(control("RC_G1", RegulatingControlMode::ReactivePower, "T_G1", 15.0));

    let conversion = run(&model).expect("conversion");
    let generator = &conversion.network.generators["G1"];

    assert_eq!(generator.target_q, Megavars(15.0));
    assert_eq!(generator.target_p, Megawatts(100.0));
    assert!(!generator.voltage_regulator_on);
    assert_eq!(generator.target_v, None);
    assert_eq!(generator.min_p, Megawatts(0.0));
    assert_eq!(generator.max_p, Megawatts(250.0));
}

#[test]
fn shunt_section_count_and_susceptance_are_corrected() {
    let mut model = station();
    model.shunts.extend([
        ShuntCompensator {
            id: "SH_NEG".into(),
            name: "SH_NEG".into(),
            b_per_section: 0.001,
            g_per_section: 0.0,
            maximum_sections: 3,
            sections: -2,
        },
        ShuntCompensator {
            id: "SH_ZERO".into(),
            name: "SH_ZERO".into(),
            b_per_section: 0.0,
            g_per_section: 0.0,
            maximum_sections: 1,
            sections: 1,
        },
    ]);
    model.terminals.push(terminal("T_SH_NEG", "SH_NEG", "B63", 1));
    model.terminals.push(terminal("T_SH_ZERO", "SH_ZERO", "B63", 1));

    let conversion = run(&model).expect("conversion");
    let shunts = &conversion.network.shunts;

    assert_eq!(shunts["SH_NEG"].section_count, 2);
    assert_eq!(shunts["SH_NEG"].maximum_section_count, 3);
    assert_eq!(shunts["SH_NEG"].b_per_section, 0.001);
    assert_eq!(shunts["SH_ZERO"].b_per_section, f64::MIN_POSITIVE);
    assert_eq!(shunts["SH_ZERO"].end.bus, "B63");

    let diagnostics = &conversion.diagnostics;
    assert_eq!(diagnostics.ids_in(WarningCategory::NegativeSectionCount), vec!["SH_NEG"]);
    assert_eq!(
        diagnostics.ids_in(WarningCategory::ZeroSusceptancePerSection),
        vec!["SH_ZERO"]
    );
}

#[test]
fn loads_are_typed_and_default_to_zero_without_flow() {
    let mut model = station();
    model.loads.extend([
        EnergyConsumer {
            id: "LD_Fict_1".into(),
            name: "LD_Fict_1".into(),
        },
        EnergyConsumer {
            id: "LD2".into(),
            name: "LD2".into(),
        },
    ]);
    model.terminals.push(terminal("T_LDF", "LD_Fict_1", "B220B", 1));
    model.terminals.push(terminal("T_LD2", "LD2", "B220B", 1));
    model.sv_power_flows.push(flow("T_LDF", 12.0, 4.0));

    let conversion = run(&model).expect("conversion");
    let loads = &conversion.network.loads;

    assert_eq!(loads["LD_Fict_1"].load_type, LoadType::Fictitious);
    assert_eq!(loads["LD_Fict_1"].p0, Megawatts(12.0));
    assert_eq!(loads["LD_Fict_1"].q0, Megavars(4.0));

    assert_eq!(loads["LD2"].load_type, LoadType::Undefined);
    assert_eq!(loads["LD2"].p0, Megawatts(0.0));
    assert_eq!(loads["LD2"].q0, Megavars(0.0));
    assert_eq!(
        conversion.diagnostics.ids_in(WarningCategory::MissingPowerFlow),
        vec!["LD2"]
    );
}

fn phase_changer(id: &str, end: &str) -> PhaseTapChanger {
    PhaseTapChanger {
        id: id.into(),
        name: id.into(),
        transformer_end: end.into(),
        kind: PhaseTapChangerKind::Symmetrical,
        low_step: -8,
        high_step: 8,
        neutral_step: 0,
        normal_step: 0,
        step_phase_shift_increment: Some(2.0),
        winding_connection_angle: Some(90.0),
        ..Default::default()
    }
}

#[test]
fn three_winding_legs_are_ordered_by_rated_voltage() {
    let mut model = station();
    add_three_winding(&mut model, "PT3");

    let conversion = run(&model).expect("conversion");
    let t3w = &conversion.network.three_winding_transformers["PT3"];

    assert_eq!(t3w.leg1.rated_u, Kilovolts(400.0));
    assert_eq!(t3w.leg2.rated_u, Kilovolts(220.0));
    assert_eq!(t3w.leg3.rated_u, Kilovolts(63.0));
    assert_eq!(t3w.rated_u0, Kilovolts(400.0));
    assert_eq!(t3w.leg1.end.bus, "B400");
    assert_eq!(t3w.leg3.end.bus, "B63");
    assert_eq!(t3w.substation, "S1");
}

#[test]
fn three_winding_ratio_changers_on_legs_two_and_three() {
    let mut model = station();
    add_three_winding(&mut model, "PT3");
    model.ratio_tap_changers.push(ratio_changer("R2", "PT3_E220"));
    model.ratio_tap_changers.push(ratio_changer("R3", "PT3_E63"));

    let conversion = run(&model).expect("conversion");
    let t3w = &conversion.network.three_winding_transformers["PT3"];

    assert!(t3w.leg1.ratio_tap_changer.is_none());
    let r2 = t3w.leg2.ratio_tap_changer.as_ref().expect("leg 2 changer");
    let r3 = t3w.leg3.ratio_tap_changer.as_ref().expect("leg 3 changer");
    assert_eq!(r2.id, "R2");
    assert_eq!(r3.id, "R3");
    assert_eq!(r2.table.len(), 11);
    assert!((r2.table.step(5).unwrap().rho - 1.05).abs() < 1e-12);
    assert!(conversion
        .diagnostics
        .warnings_in(WarningCategory::DroppedTapChanger)
        .next()
        .is_none());
}

#[test]
fn two_ratio_changers_on_one_leg_are_fatal() {
    let mut model = station();
    add_three_winding(&mut model, "PT3");
    model.ratio_tap_changers.push(ratio_changer("R2", "PT3_E220"));
    model.ratio_tap_changers.push(ratio_changer("R2B", "PT3_E220"));

    assert_eq!(
        run(&model).unwrap_err(),
        ConversionError::DuplicateTapChanger {
            transformer: "PT3".into(),
            kind: "ratio",
        }
    );
}

#[test]
fn ratio_changer_on_the_highest_voltage_leg_is_dropped() {
    let mut model = station();
    add_three_winding(&mut model, "PT3");
    model.ratio_tap_changers.push(ratio_changer("R1", "PT3_E400"));

    let conversion = run(&model).expect("conversion");
    let t3w = &conversion.network.three_winding_transformers["PT3"];

    assert!(t3w.leg1.ratio_tap_changer.is_none());
    assert_eq!(
        conversion.diagnostics.ids_in(WarningCategory::DroppedTapChanger),
        vec!["R1", "PT3"]
    );
}

#[test]
fn dropped_changer_still_checks_its_neutral_step() {
    let mut model = station();
    add_three_winding(&mut model, "PT3");
    let mut r1 = ratio_changer("R1", "PT3_E400");
    r1.neutral_step = 9;
    model.ratio_tap_changers.push(r1);

    assert_eq!(
        run(&model).unwrap_err(),
        ConversionError::NeutralStepOutOfRange {
            tap_changer: "R1".into(),
            neutral: 9,
            low: -5,
            high: 5,
        }
    );
}

#[test]
fn phase_changer_on_three_winding_transformer_is_fatal() {
    let mut model = station();
    add_three_winding(&mut model, "PT3");
    model.phase_tap_changers.push(phase_changer("P2", "PT3_E220"));

    assert_eq!(
        run(&model).unwrap_err(),
        ConversionError::UnsupportedPhaseTapChanger {
            transformer: "PT3".into()
        }
    );
}

#[test]
fn equal_rated_voltages_on_three_windings_are_fatal() {
    let mut model = station();
    add_three_winding(&mut model, "PT3");
    model.power_transformers[0].ends[0].rated_u = 220.0;

    assert_eq!(
        run(&model).unwrap_err(),
        ConversionError::NonDescendingRatedVoltages {
            transformer: "PT3".into()
        }
    );
}

#[test]
fn single_winding_transformer_is_fatal() {
    let mut model = station();
    model.terminals.push(terminal("T_PT1_1", "PT1", "B400", 1));
    model.power_transformers.push(PowerTransformer {
        id: "PT1".into(),
        name: "PT1".into(),
        ends: vec![TransformerEnd {
            id: "PT1_E1".into(),
            terminal: "T_PT1_1".into(),
            end_number: 1,
            rated_u: 400.0,
            ..Default::default()
        }],
    });

    assert_eq!(
        run(&model).unwrap_err(),
        ConversionError::UnsupportedWindingCount {
            transformer: "PT1".into(),
            count: 1,
        }
    );
}

#[test]
fn two_ratio_changers_on_two_winding_transformer_are_fatal() {
    let mut model = station();
    add_two_winding(&mut model, "PT");
    model.ratio_tap_changers.push(ratio_changer("R1", "PT_E1"));
    model.ratio_tap_changers.push(ratio_changer("R2", "PT_E2"));

    assert_eq!(
        run(&model).unwrap_err(),
        ConversionError::DuplicateTapChanger {
            transformer: "PT".into(),
            kind: "ratio",
        }
    );
}

#[test]
fn ratio_and_phase_changers_on_different_windings_are_fatal() {
    let mut model = station();
    add_two_winding(&mut model, "PT");
    model.ratio_tap_changers.push(ratio_changer("R1", "PT_E1"));
    model.phase_tap_changers.push(phase_changer("P2", "PT_E2"));

    assert_eq!(
        run(&model).unwrap_err(),
        ConversionError::TapChangerSidesMismatch {
            transformer: "PT".into()
        }
    );
}

#[test]
fn boundary_node_without_code_is_fatal() {
    let mut model = station();
    model.topological_nodes.push(TopologicalNode {
        id: "XN".into(),
        description: "no boundary code".into(),
        from_boundary: true,
        ..Default::default()
    });
    model.line_segments.push(LineSegment {
        id: "LX".into(),
        name: "LX".into(),
        r: 1.0,
        x: 10.0,
        ..Default::default()
    });
    model.terminals.push(terminal("T_LX_1", "LX", "B400", 1));
    model.terminals.push(terminal("T_LX_2", "LX", "XN", 2));

    assert_eq!(
        run(&model).unwrap_err(),
        ConversionError::MissingBoundaryCode { node: "XN".into() }
    );
}

#[test]
fn voltage_regulating_ratio_changer() {
    let mut model = station();
    add_two_winding(&mut model, "PT");
    let mut rtc = ratio_changer("R1", "PT_E1");
    rtc.regulating_control = Some("RC1".into());
    model.ratio_tap_changers.push(rtc);
    model
        .regulating_controls
        .push(control("RC1", RegulatingControlMode::Voltage, "T_PT_2", 225.0));

    let conversion = run(&model).expect("conversion");
    let built = conversion.network.two_winding_transformers["PT"]
        .ratio_tap_changer
        .as_ref()
        .expect("ratio tap changer");

    assert!(built.load_tap_changing_capabilities);
    assert!(built.regulating);
    assert_eq!(built.target_v, Kilovolts(225.0));
    assert_eq!(built.target_deadband, 0.5);
    assert_eq!(
        built.regulated_terminal,
        Some(RegulatedTerminal::Terminal(TerminalRef::new("PT", Side::Two)))
    );
    // primary side: rho = 1 / (1 + n du)
    assert!((built.table.step(5).unwrap().rho - 1.0 / 1.05).abs() < 1e-12);
}

#[test]
fn non_positive_voltage_target_disables_regulation() {
    let mut model = station();
    add_two_winding(&mut model, "PT");
    let mut rtc = ratio_changer("R1", "PT_E1");
    rtc.regulating_control = Some("RC1".into());
    model.ratio_tap_changers.push(rtc);
    model
        .regulating_controls
        .push(control("RC1", RegulatingControlMode::Voltage, "T_PT_2", 0.0));

    let conversion = run(&model).expect("conversion");
    let built = conversion.network.two_winding_transformers["PT"]
        .ratio_tap_changer
        .as_ref()
        .expect("ratio tap changer");

    assert!(!built.regulating);
    assert!(built.target_v.0.is_nan());
    assert_eq!(
        conversion.diagnostics.ids_in(WarningCategory::NonPositiveTargetVoltage),
        vec!["R1"]
    );
}

#[test]
fn fixed_and_unsupported_ratio_modes_have_no_capability() {
    let mut model = station();
    add_two_winding(&mut model, "PT_FIX");
    add_two_winding(&mut model, "PT_ACT");
    let mut fixed = ratio_changer("R_FIX", "PT_FIX_E1");
    fixed.regulating_control = Some("RC_FIX".into());
    let mut active = ratio_changer("R_ACT", "PT_ACT_E2");
    active.regulating_control = Some("RC_ACT".into());
    model.ratio_tap_changers.extend([fixed, active]);
    model.regulating_controls.extend([
        control("RC_FIX", RegulatingControlMode::Fixed, "T_PT_FIX_2", 0.0),
        control("RC_ACT", RegulatingControlMode::ActivePower, "T_PT_ACT_2", 50.0),
    ]);

    let conversion = run(&model).expect("conversion");
    let transformers = &conversion.network.two_winding_transformers;
    for id in ["PT_FIX", "PT_ACT"] {
        let built = transformers[id].ratio_tap_changer.as_ref().expect("ratio tap changer");
        assert!(!built.load_tap_changing_capabilities);
        assert!(!built.regulating);
        assert_eq!(built.regulated_terminal, None);
    }
    // secondary side: rho = 1 + n du
    let active = transformers["PT_ACT"].ratio_tap_changer.as_ref().unwrap();
    assert!((active.table.step(5).unwrap().rho - 1.05).abs() < 1e-12);

    assert_eq!(
        conversion.diagnostics.ids_in(WarningCategory::UnsupportedRegulationMode),
        vec!["R_ACT", "RC_ACT"]
    );
}

#[test]
fn current_flow_phase_changer_regulates_at_a_registered_end() {
    let mut model = station();
    add_two_winding(&mut model, "PT");
    let mut ptc = phase_changer("P1", "PT_E1");
    ptc.regulating_control = Some("RC1".into());
    model.phase_tap_changers.push(ptc);
    model
        .regulating_controls
        .push(control("RC1", RegulatingControlMode::CurrentFlow, "T_L220_1", 800.0));

    let conversion = run(&model).expect("conversion");
    let built = conversion.network.two_winding_transformers["PT"]
        .phase_tap_changer
        .as_ref()
        .expect("phase tap changer");

    assert_eq!(built.regulation_mode, PhaseRegulationMode::CurrentLimiter);
    assert_eq!(built.regulation_value, 800.0);
    assert!(built.regulating);
    assert_eq!(
        built.regulated_terminal,
        Some(RegulatedTerminal::Terminal(TerminalRef::new("L220", Side::One)))
    );
    assert!((built.table.step(3).unwrap().alpha.value() - 6.0).abs() < 1e-9);
}

#[test]
fn current_flow_on_unmapped_terminal_falls_back_to_the_bus() {
    let mut model = station();
    add_two_winding(&mut model, "PT");
    model.other_equipment.push(OtherEquipment {
        id: "EI1".into(),
        name: "EI1".into(),
        kind: "EquivalentInjection".into(),
    });
    model.terminals.push(terminal("T_EI1", "EI1", "B220B", 1));
    let mut ptc = phase_changer("P1", "PT_E1");
    ptc.regulating_control = Some("RC1".into());
    model.phase_tap_changers.push(ptc);
    model
        .regulating_controls
        .push(control("RC1", RegulatingControlMode::CurrentFlow, "T_EI1", 600.0));

    let conversion = run(&model).expect("conversion");
    let built = conversion.network.two_winding_transformers["PT"]
        .phase_tap_changer
        .as_ref()
        .expect("phase tap changer");

    assert_eq!(
        built.regulated_terminal,
        Some(RegulatedTerminal::Bus { id: "B220B".into() })
    );
}

#[test]
fn other_phase_modes_stay_fixed_tap() {
    let mut model = station();
    add_two_winding(&mut model, "PT");
    let mut ptc = phase_changer("P1", "PT_E2");
    ptc.regulating_control = Some("RC1".into());
    model.phase_tap_changers.push(ptc);
    model
        .regulating_controls
        .push(control("RC1", RegulatingControlMode::ActivePower, "T_PT_2", 100.0));

    let conversion = run(&model).expect("conversion");
    let built = conversion.network.two_winding_transformers["PT"]
        .phase_tap_changer
        .as_ref()
        .expect("phase tap changer");

    assert_eq!(built.regulation_mode, PhaseRegulationMode::FixedTap);
    assert!(built.regulation_value.is_nan());
    assert!(!built.regulating);
    // secondary side tables are mirrored
    assert!((built.table.step(3).unwrap().alpha.value() + 6.0).abs() < 1e-9);
    assert_eq!(
        conversion.diagnostics.ids_in(WarningCategory::UnsupportedRegulationMode),
        vec!["P1", "RC1"]
    );
}
