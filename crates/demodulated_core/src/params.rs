//! Parameter configuration for the DeModulated module.
//!
//! The engine reads these values once per tick and never validates them.
//! Ranges, defaults and display metadata live here so a host UI can build
//! its controls, and `clamped()` is what `DeModulated::set_params` stores.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::dsp::utils::radians_to_degrees;

pub const RATE_MIN: f32 = 0.0;
pub const RATE_MAX: f32 = 20000.0;
pub const RATE_DEFAULT: f32 = 1.0;

pub const OFFSET_MIN: f32 = -TAU;
pub const OFFSET_MAX: f32 = TAU;
pub const OFFSET_DEFAULT: f32 = TAU / 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DeModulatedParams {
    /// internal phase accumulation rate in Hz
    pub rate: f32,
    /// accumulate phase internally instead of following the phase input
    pub accumulate: bool,
    /// frequency modulation amount (reserved, has no effect)
    pub fm_amount: f32,
    /// per-voice phase offset step in radians; voice `i` is shifted by `i * offset`
    pub offset: f32,
    /// depth applied to the offset modulation input
    pub offset_mod_depth: f32,
}

impl Default for DeModulatedParams {
    fn default() -> Self {
        Self {
            rate: RATE_DEFAULT,
            accumulate: false,
            fm_amount: 0.0,
            offset: OFFSET_DEFAULT,
            offset_mod_depth: 0.0,
        }
    }
}

impl DeModulatedParams {
    /// Parse a JSON params object. Missing fields take their defaults.
    pub fn from_json(params: serde_json::Value) -> Result<Self> {
        serde_json::from_value(params).context("invalid DeModulated params")
    }

    /// Copy with every numeric value clamped to its configured range.
    pub fn clamped(&self) -> Self {
        let clamped = Self {
            rate: self.rate.clamp(RATE_MIN, RATE_MAX),
            accumulate: self.accumulate,
            fm_amount: self.fm_amount.clamp(-1.0, 1.0),
            offset: self.offset.clamp(OFFSET_MIN, OFFSET_MAX),
            offset_mod_depth: self.offset_mod_depth.clamp(-1.0, 1.0),
        };
        if clamped != *self {
            tracing::debug!(params = ?self, ?clamped, "clamped params to configured ranges");
        }
        clamped
    }

    /// The offset step for display, in degrees.
    pub fn offset_degrees(&self) -> f32 {
        radians_to_degrees(self.offset)
    }
}

/// Validate a JSON params object without keeping the result.
pub fn validate_params_json(params: &serde_json::Value) -> Result<()> {
    DeModulatedParams::from_json(params.clone()).map(|_| ())
}

/// Identifies a parameter slot, in host order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamId {
    Rate,
    Accumulate,
    FmAmount,
    Offset,
    OffsetModDepth,
}

/// Display metadata for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamInfo {
    pub id: ParamId,
    pub key: &'static str,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub unit: &'static str,
    /// multiply the stored value by this for display (e.g. 100 for percent)
    pub display_multiplier: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<[&'static str; 2]>,
}

impl ParamInfo {
    const fn new(id: ParamId, key: &'static str, name: &'static str) -> Self {
        Self {
            id,
            key,
            name,
            min: 0.0,
            max: 1.0,
            default: 0.0,
            unit: "",
            display_multiplier: 1.0,
            labels: None,
        }
    }

    const fn range(mut self, min: f32, max: f32, default: f32) -> Self {
        self.min = min;
        self.max = max;
        self.default = default;
        self
    }

    const fn unit(mut self, unit: &'static str, display_multiplier: f32) -> Self {
        self.unit = unit;
        self.display_multiplier = display_multiplier;
        self
    }

    const fn switch(mut self, off: &'static str, on: &'static str) -> Self {
        self.labels = Some([off, on]);
        self
    }

    /// Value as the host should display it.
    pub fn display_value(&self, value: f32) -> f32 {
        value * self.display_multiplier
    }
}

pub fn param_infos() -> [ParamInfo; 5] {
    [
        ParamInfo::new(ParamId::Rate, "rate", "Rate")
            .range(RATE_MIN, RATE_MAX, RATE_DEFAULT)
            .unit(" hz", 1.0),
        ParamInfo::new(ParamId::Accumulate, "accumulate", "Accumulate")
            .range(0.0, 1.0, 0.0)
            .switch("Off", "On"),
        ParamInfo::new(ParamId::FmAmount, "fmAmount", "Frequency Modulation")
            .range(-1.0, 1.0, 0.0)
            .unit("%", 100.0),
        ParamInfo::new(ParamId::Offset, "offset", "Phase Offset")
            .range(OFFSET_MIN, OFFSET_MAX, OFFSET_DEFAULT)
            .unit(" rads", 1.0),
        ParamInfo::new(ParamId::OffsetModDepth, "offsetModDepth", "Offset Modulation")
            .range(-1.0, 1.0, 0.0)
            .unit("%", 100.0),
    ]
}
