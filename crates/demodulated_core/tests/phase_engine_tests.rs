//! Integration tests for the DeModulated module.
//!
//! These drive the module through the public `Module` API the way a host
//! would: set params as JSON, set port state, call `update()` once per
//! sample and read the output ports.

use demodulated_core::module::{POLY_PHASE_OUTPUT, voice_output_name};
use demodulated_core::{DeModulated, Module, PolySignal, VOICES};
use serde_json::json;
use std::f32::consts::TAU;

const SAMPLE_RATE: f32 = 48000.0;

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn make_module(params: serde_json::Value) -> DeModulated {
    let mut module = DeModulated::default();
    module
        .try_update_params(params)
        .expect("try_update_params failed");
    module
}

fn step_n(module: &mut DeModulated, n: usize) {
    for _ in 0..n {
        module.update(SAMPLE_RATE);
    }
}

fn voice_voltage(module: &DeModulated, voice: usize) -> f32 {
    module
        .get_output(&voice_output_name(voice))
        .expect("missing voice output")
        .get_voltage(0)
}

fn poly_voltage(module: &DeModulated, channel: usize) -> f32 {
    module
        .get_output(POLY_PHASE_OUTPUT)
        .expect("missing poly output")
        .get_voltage(channel)
}

/// Approximate equality within a tolerance.
fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() <= tol
}

/// Distance between two phases on the unit circle.
fn phase_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(1.0);
    d.min(1.0 - d)
}

fn assert_channel_counts(module: &DeModulated) {
    assert_eq!(module.get_output(POLY_PHASE_OUTPUT).unwrap().channels(), VOICES);
    for voice in 0..VOICES {
        assert_eq!(
            module.get_output(&voice_output_name(voice)).unwrap().channels(),
            1,
            "voice output {voice} should report one channel"
        );
    }
}

// ─── Internal accumulation ───────────────────────────────────────────────────

#[test]
fn accumulate_completes_one_cycle_per_second_at_one_hz() {
    let mut module = make_module(json!({
        "rate": 1.0,
        "accumulate": true,
        "offset": 0.0,
        "offsetModDepth": 0.0,
    }));

    step_n(&mut module, 12000);
    let quarter = voice_voltage(&module, 0);
    assert!(approx_eq(quarter, 5.0, 1e-3), "quarter cycle should peak at 5V, got {quarter}");
    assert!(approx_eq(poly_voltage(&module, 0), quarter, 0.0));

    step_n(&mut module, 36000);
    let phase = module.engine().phases()[0];
    assert!(
        phase_distance(phase, 0.0) < 5e-3,
        "after one second the phase should be back near 0, got {phase}"
    );
}

#[test]
fn accumulated_phase_stays_wrapped() {
    let mut module = make_module(json!({ "rate": 19000.0, "accumulate": true }));
    for _ in 0..10_000 {
        module.update(SAMPLE_RATE);
        assert!(module.engine().phases().iter().all(|p| (0.0..1.0).contains(p)));
    }
}

#[test]
fn all_voices_share_the_accumulator_rate() {
    let mut module = make_module(json!({ "rate": 3.0, "accumulate": true, "offset": 0.0 }));
    step_n(&mut module, 777);
    let phases = module.engine().phases();
    assert!(phases.iter().all(|&p| p == phases[0]));
    let first = voice_voltage(&module, 0);
    for voice in 1..VOICES {
        assert_eq!(voice_voltage(&module, voice), first);
    }
}

#[test]
fn mode_switch_resumes_from_frozen_phase() {
    let mut module = make_module(json!({ "rate": 10.0, "accumulate": true, "offset": 0.0 }));
    step_n(&mut module, 1000);
    let before = module.engine().phases()[0];

    module
        .try_update_params(json!({ "rate": 10.0, "accumulate": false, "offset": 0.0 }))
        .unwrap();
    module.set_input("phase", PolySignal::mono(0.5)).unwrap();
    step_n(&mut module, 500);
    assert_eq!(module.engine().phases()[0], before);
    assert!(approx_eq(voice_voltage(&module, 0), 0.0, 1e-4));

    module
        .try_update_params(json!({ "rate": 10.0, "accumulate": true, "offset": 0.0 }))
        .unwrap();
    step_n(&mut module, 1);
    let expected = before + 10.0 / SAMPLE_RATE;
    assert!(approx_eq(module.engine().phases()[0], expected, 1e-6));
}

#[test]
fn accumulate_ignores_phase_input_but_applies_offsets() {
    let step = 0.3;
    let depth = 0.75;
    let mods: Vec<f32> = (0..VOICES).map(|i| 1.0 - i as f32 * 0.125).collect();
    let external: Vec<f32> = (0..VOICES).map(|i| 0.9 - i as f32 * 0.05).collect();
    let params = json!({
        "rate": 7.0,
        "accumulate": true,
        "offset": step,
        "offsetModDepth": depth,
    });

    let mut patched = make_module(params.clone());
    patched.set_input("phase", PolySignal::poly(&external)).unwrap();
    patched.set_input("offset", PolySignal::poly(&mods)).unwrap();

    let mut unpatched = make_module(params);
    unpatched.set_input("offset", PolySignal::poly(&mods)).unwrap();

    for _ in 0..321 {
        patched.update(SAMPLE_RATE);
        unpatched.update(SAMPLE_RATE);
    }

    let acc = patched.engine().phases()[0];
    assert!(acc > 0.0, "accumulator should have advanced");
    for voice in 0..VOICES {
        let angle = acc * TAU + voice as f32 * step + mods[voice] * depth;
        let expected = angle.sin() * 5.0;
        let v = voice_voltage(&patched, voice);
        assert!(approx_eq(v, expected, 1e-4), "voice {voice}: expected {expected}, got {v}");
        assert_eq!(v, voice_voltage(&unpatched, voice), "voice {voice} read the phase input");
        assert_eq!(poly_voltage(&patched, voice), poly_voltage(&unpatched, voice));
    }
}

// ─── External phase ──────────────────────────────────────────────────────────

#[test]
fn mono_phase_input_broadcasts_to_every_voice() {
    let mut module = make_module(json!({ "accumulate": false, "offset": 0.0 }));
    module.set_input("phase", PolySignal::mono(0.25)).unwrap();
    step_n(&mut module, 1);

    for voice in 0..VOICES {
        let v = voice_voltage(&module, voice);
        assert!(approx_eq(v, 5.0, 1e-4), "voice {voice} should be 5V, got {v}");
        assert!(approx_eq(poly_voltage(&module, voice), v, 0.0));
    }
}

#[test]
fn poly_phase_input_drives_voices_per_channel() {
    let mut module = make_module(json!({ "accumulate": false, "offset": 0.0 }));
    let phases: Vec<f32> = (0..VOICES).map(|i| i as f32 / 16.0).collect();
    module.set_input("phase", PolySignal::poly(&phases)).unwrap();
    step_n(&mut module, 1);

    for voice in 0..VOICES {
        let expected = (voice as f32 / 16.0 * TAU).sin() * 5.0;
        let v = voice_voltage(&module, voice);
        assert!(approx_eq(v, expected, 1e-4), "voice {voice}: expected {expected}, got {v}");
    }
}

#[test]
fn short_poly_phase_input_reads_zero_for_missing_channels() {
    let mut module = make_module(json!({ "accumulate": false, "offset": 0.0 }));
    module
        .set_input("phase", PolySignal::poly(&[0.25, 0.25, 0.25, 0.25]))
        .unwrap();
    step_n(&mut module, 1);

    assert!(approx_eq(voice_voltage(&module, 3), 5.0, 1e-4));
    for voice in 4..VOICES {
        assert!(approx_eq(voice_voltage(&module, voice), 0.0, 1e-6));
    }
}

#[test]
fn disconnected_phase_input_leaves_only_offsets() {
    let step = TAU / 16.0;
    let mut module = make_module(json!({ "accumulate": false, "offset": step }));
    step_n(&mut module, 1);

    for voice in 0..VOICES {
        let expected = (voice as f32 * step).sin() * 5.0;
        assert!(approx_eq(voice_voltage(&module, voice), expected, 1e-4));
    }
}

#[test]
fn fm_input_has_no_effect() {
    let mut plain = make_module(json!({ "rate": 5.0, "accumulate": true, "fmAmount": 1.0 }));
    let mut with_fm = make_module(json!({ "rate": 5.0, "accumulate": true, "fmAmount": 1.0 }));
    with_fm.set_input("fm", PolySignal::mono(3.0)).unwrap();

    for _ in 0..100 {
        plain.update(SAMPLE_RATE);
        with_fm.update(SAMPLE_RATE);
        for voice in 0..VOICES {
            assert_eq!(voice_voltage(&plain, voice), voice_voltage(&with_fm, voice));
        }
    }
}

// ─── Offsets ─────────────────────────────────────────────────────────────────

#[test]
fn static_offset_grows_linearly_with_voice_index() {
    let step = 0.1;
    let mut module = make_module(json!({ "accumulate": false, "offset": step }));
    module.set_input("phase", PolySignal::mono(0.0)).unwrap();
    step_n(&mut module, 1);

    assert!(approx_eq(voice_voltage(&module, 0), 0.0, 1e-6));
    for voice in 1..VOICES {
        let expected = (voice as f32 * step).sin() * 5.0;
        let v = voice_voltage(&module, voice);
        assert!(approx_eq(v, expected, 1e-4), "voice {voice}: expected {expected}, got {v}");
    }
}

#[test]
fn offset_modulation_is_added_after_static_offset() {
    let step = 0.2;
    let depth = 0.5;
    let mods: Vec<f32> = (0..VOICES).map(|i| i as f32 * 0.1).collect();

    let mut module = make_module(json!({
        "accumulate": false,
        "offset": step,
        "offsetModDepth": depth,
    }));
    module.set_input("phase", PolySignal::mono(0.1)).unwrap();
    module.set_input("offset", PolySignal::poly(&mods)).unwrap();
    step_n(&mut module, 1);

    for voice in 0..VOICES {
        let angle = 0.1 * TAU + voice as f32 * step + mods[voice] * depth;
        let expected = angle.sin() * 5.0;
        let v = voice_voltage(&module, voice);
        assert!(approx_eq(v, expected, 1e-4), "voice {voice}: expected {expected}, got {v}");
    }
}

// ─── Output assembly ─────────────────────────────────────────────────────────

#[test]
fn disconnected_outputs_are_skipped_but_report_channels() {
    let mut module = make_module(json!({ "accumulate": false, "offset": 0.0 }));
    module.set_input("phase", PolySignal::mono(0.25)).unwrap();
    module.set_output_connected(POLY_PHASE_OUTPUT, false).unwrap();
    module.set_output_connected(&voice_output_name(3), false).unwrap();
    step_n(&mut module, 4);

    assert_channel_counts(&module);
    assert_eq!(voice_voltage(&module, 3), 0.0);
    assert!(approx_eq(voice_voltage(&module, 2), 5.0, 1e-4));
    for channel in 0..VOICES {
        assert_eq!(poly_voltage(&module, channel), 0.0);
    }

    module.set_output_connected(POLY_PHASE_OUTPUT, true).unwrap();
    step_n(&mut module, 1);
    assert!(approx_eq(poly_voltage(&module, 3), 5.0, 1e-4));
}

#[test]
fn channel_counts_are_fixed_regardless_of_history() {
    let mut module = make_module(json!({ "rate": 2.0, "accumulate": true }));
    let inputs = [
        PolySignal::default(),
        PolySignal::mono(0.3),
        PolySignal::poly(&[0.1, 0.2]),
        PolySignal::poly(&[0.5; 16]),
    ];

    for (i, input) in inputs.iter().enumerate() {
        module.set_input("phase", *input).unwrap();
        module.set_input("offset", *input).unwrap();
        module
            .try_update_params(json!({ "accumulate": i % 2 == 0 }))
            .unwrap();
        module
            .set_output_connected(&voice_output_name(i), i % 2 == 1)
            .unwrap();
        step_n(&mut module, 3);
        assert_channel_counts(&module);
    }
}

#[test]
fn output_ports_serialize_for_the_host() {
    let mut module = make_module(json!({ "accumulate": false, "offset": 0.0 }));
    module.set_input("phase", PolySignal::mono(0.0)).unwrap();
    step_n(&mut module, 1);

    let json = serde_json::to_value(module.get_output(&voice_output_name(0)).unwrap()).unwrap();
    assert_eq!(json["connected"], json!(true));
    assert_eq!(json["channels"], json!(1));
    assert_eq!(json["voltages"].as_array().map(Vec::len), Some(1));
}

#[test]
fn invalid_params_leave_previous_params_in_place() {
    let mut module = make_module(json!({ "rate": 7.0 }));
    assert!(module.try_update_params(json!({ "rate": "fast" })).is_err());
    assert_eq!(module.params.rate, 7.0);
    assert!(DeModulated::validate_params_json(&json!({ "offset": 1.0 })).is_ok());
}
