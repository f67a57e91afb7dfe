//! Sixteen-voice phase engine.
//!
//! Every tick each voice gets a phase, either from its own free-running
//! accumulator or from the phase input, shifts it by a per-voice offset and
//! renders a ±5V sine. The mode flag is re-read every tick, so toggling it
//! switches instantly and may click.

use std::f32::consts::TAU;

use crate::dsp::utils::{OUTPUT_SCALE, sine_radians, wrap_unit};
use crate::params::DeModulatedParams;
use crate::poly::{PORT_MAX_CHANNELS, PolySignal};

/// Number of voices, one per cable channel.
pub const VOICES: usize = PORT_MAX_CHANNELS;

/// Static phase shift of a voice: `voice * offset` radians.
#[inline]
pub fn static_offset(voice: usize, offset: f32) -> f32 {
    voice as f32 * offset
}

/// Modulated phase shift of a voice, in radians.
///
/// Disconnected or missing channels of the offset input read as 0V.
#[inline]
pub fn mod_offset(voice: usize, offset_in: &PolySignal, depth: f32) -> f32 {
    offset_in.get(voice) * depth
}

/// Total phase shift of a voice in radians, static part first.
#[inline]
pub fn total_offset(voice: usize, params: &DeModulatedParams, offset_in: &PolySignal) -> f32 {
    static_offset(voice, params.offset) + mod_offset(voice, offset_in, params.offset_mod_depth)
}

/// Phase a voice reads from the phase input.
///
/// A mono input drives all voices; otherwise each voice follows its own
/// channel and channels beyond the input's count read as 0.0.
#[inline]
pub fn external_phase(voice: usize, phase_in: &PolySignal) -> f32 {
    if phase_in.is_monophonic() {
        phase_in.get(0)
    } else {
        phase_in.get(voice)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhaseEngine {
    /// Accumulated phase per voice, always in `[0, 1)`.
    phases: [f32; VOICES],
}

impl PhaseEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phases(&self) -> &[f32; VOICES] {
        &self.phases
    }

    /// Advance one sample and return the voltage of every voice.
    ///
    /// The accumulators only move while `params.accumulate` is set; in
    /// external mode they hold their last value.
    #[profiling::function]
    pub fn process(
        &mut self,
        params: &DeModulatedParams,
        phase_in: &PolySignal,
        offset_in: &PolySignal,
        sample_time: f32,
    ) -> [f32; VOICES] {
        let delta_phase = params.rate * sample_time;
        let mut voltages = [0.0; VOICES];

        for (voice, voltage) in voltages.iter_mut().enumerate() {
            let offset = total_offset(voice, params, offset_in);

            let phase = if params.accumulate {
                let phase = &mut self.phases[voice];
                *phase = wrap_unit(*phase + delta_phase);
                *phase
            } else {
                external_phase(voice, phase_in)
            };

            *voltage = sine_radians(phase * TAU + offset) * OUTPUT_SCALE;
        }

        voltages
    }
}
