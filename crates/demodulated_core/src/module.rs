//! The DeModulated module: phase engine plus its ports and params.
//!
//! Inputs:
//! - `phase`: phase in cycles (mono broadcasts to every voice)
//! - `offset`: per-voice offset modulation, scaled by `offsetModDepth`
//! - `fm`: accepted but unused
//!
//! Outputs:
//! - `polyPhase`: all sixteen voices on one cable
//! - `phase0` .. `phase15`: one voice each

use anyhow::{Result, anyhow};

use crate::dsp::phase_engine::{PhaseEngine, VOICES};
use crate::metrics::{TimingMetrics, UpdateTimer};
use crate::params::{DeModulatedParams, param_infos, validate_params_json};
use crate::poly::{OutputPort, PolySignal};
use crate::types::{Module, ModuleSchema, PortSchema};

pub const MODULE_NAME: &str = "deModulated";

pub const PHASE_INPUT: &str = "phase";
pub const OFFSET_INPUT: &str = "offset";
pub const FM_INPUT: &str = "fm";
pub const POLY_PHASE_OUTPUT: &str = "polyPhase";
const VOICE_OUTPUT_PREFIX: &str = "phase";

/// Name of the mono output carrying `voice`.
pub fn voice_output_name(voice: usize) -> String {
    format!("{VOICE_OUTPUT_PREFIX}{voice}")
}

fn parse_voice_output(port: &str) -> Option<usize> {
    port.strip_prefix(VOICE_OUTPUT_PREFIX)
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|&voice| voice < VOICES)
}

#[derive(Debug, Clone, Default)]
pub struct DeModulatedInputs {
    pub phase: PolySignal,
    pub offset: PolySignal,
    pub fm: PolySignal,
}

#[derive(Debug, Clone, Default)]
pub struct DeModulatedOutputs {
    pub poly_phase: OutputPort,
    pub phases: [OutputPort; VOICES],
}

impl DeModulatedOutputs {
    /// Publish one frame of voice voltages.
    ///
    /// Channel counts are set on every port each call, connected or not;
    /// voltages only go to connected ports.
    pub fn write(&mut self, voltages: &[f32; VOICES]) {
        self.poly_phase.set_channels(VOICES);
        for (voice, &voltage) in voltages.iter().enumerate() {
            self.poly_phase.set_voltage(voice, voltage);

            let port = &mut self.phases[voice];
            port.set_channels(1);
            port.set_voltage(0, voltage);
        }
    }

    pub fn get(&self, port: &str) -> Option<&OutputPort> {
        if port == POLY_PHASE_OUTPUT {
            return Some(&self.poly_phase);
        }
        parse_voice_output(port).map(|voice| &self.phases[voice])
    }

    fn get_mut(&mut self, port: &str) -> Option<&mut OutputPort> {
        if port == POLY_PHASE_OUTPUT {
            return Some(&mut self.poly_phase);
        }
        parse_voice_output(port).map(|voice| &mut self.phases[voice])
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeModulated {
    pub params: DeModulatedParams,
    pub inputs: DeModulatedInputs,
    pub outputs: DeModulatedOutputs,
    engine: PhaseEngine,
    timer: UpdateTimer,
}

impl DeModulated {
    pub fn new(params: DeModulatedParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Replace the params, clamped to their configured ranges.
    pub fn set_params(&mut self, params: DeModulatedParams) {
        self.params = params.clamped();
        tracing::debug!(params = ?self.params, "updated params");
    }

    pub fn engine(&self) -> &PhaseEngine {
        &self.engine
    }

    pub fn set_timing_enabled(&mut self, enabled: bool) {
        self.timer.set_enabled(enabled);
    }
}

impl Module for DeModulated {
    fn get_schema() -> ModuleSchema {
        let mut outputs = vec![
            PortSchema::output(POLY_PHASE_OUTPUT, "all voices, one per channel", VOICES)
                .with_default(),
        ];
        outputs.extend(
            (0..VOICES).map(|voice| {
                PortSchema::output(voice_output_name(voice), format!("voice {voice}"), 1)
            }),
        );

        ModuleSchema {
            name: MODULE_NAME.to_string(),
            description: "Sixteen phase-shifted sine voices from one phase or rate".to_string(),
            params_schema: schemars::schema_for!(DeModulatedParams),
            params: param_infos().to_vec(),
            inputs: vec![
                PortSchema::input(PHASE_INPUT, "phase in cycles, mono or per voice").with_default(),
                PortSchema::input(OFFSET_INPUT, "per-voice offset modulation"),
                PortSchema::input(FM_INPUT, "frequency modulation (unused)"),
            ],
            outputs,
        }
    }

    fn validate_params_json(params: &serde_json::Value) -> Result<()> {
        validate_params_json(params)
    }

    fn get_module_type(&self) -> &'static str {
        MODULE_NAME
    }

    fn update(&mut self, sample_rate: f32) {
        let Self {
            params,
            inputs,
            outputs,
            engine,
            timer,
        } = self;
        let sample_time = 1.0 / sample_rate;

        timer.time(|| {
            let voltages = engine.process(params, &inputs.phase, &inputs.offset, sample_time);
            outputs.write(&voltages);
        });
    }

    fn try_update_params(&mut self, params: serde_json::Value) -> Result<()> {
        self.params = DeModulatedParams::from_json(params)?;
        tracing::debug!(params = ?self.params, "updated params");
        Ok(())
    }

    fn set_input(&mut self, port: &str, signal: PolySignal) -> Result<()> {
        let slot = match port {
            PHASE_INPUT => &mut self.inputs.phase,
            OFFSET_INPUT => &mut self.inputs.offset,
            FM_INPUT => &mut self.inputs.fm,
            _ => return Err(anyhow!("{MODULE_NAME} does not have input {port}")),
        };
        if slot.channels() != signal.channels() {
            tracing::debug!(port, channels = signal.channels(), "input channel count changed");
        }
        *slot = signal;
        Ok(())
    }

    fn set_output_connected(&mut self, port: &str, connected: bool) -> Result<()> {
        let out = self
            .outputs
            .get_mut(port)
            .ok_or_else(|| anyhow!("{MODULE_NAME} does not have output {port}"))?;
        if out.is_connected() != connected {
            tracing::debug!(port, connected, "output connection changed");
        }
        out.set_connected(connected);
        Ok(())
    }

    fn get_output(&self, port: &str) -> Result<&OutputPort> {
        self.outputs
            .get(port)
            .ok_or_else(|| anyhow!("{MODULE_NAME} does not have output {port}"))
    }

    fn get_timing_metrics(&self) -> Option<TimingMetrics> {
        self.timer.metrics()
    }

    fn reset_timing_metrics(&mut self) {
        self.timer.reset();
    }
}
