use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::metrics::TimingMetrics;
use crate::params::ParamInfo;
use crate::poly::{OutputPort, PolySignal};

/// The seam between a module and the host that drives it.
///
/// The host sets params and port state from its own thread of control, then
/// calls `update()` once per sample frame on the audio thread.
pub trait Module {
    fn get_schema() -> ModuleSchema
    where
        Self: Sized;

    /// Validate a JSON params object by attempting to parse it as the
    /// module's concrete params type.
    fn validate_params_json(params: &serde_json::Value) -> Result<()>
    where
        Self: Sized;

    fn get_module_type(&self) -> &'static str;

    /// Process one sample frame.
    fn update(&mut self, sample_rate: f32);

    fn try_update_params(&mut self, params: serde_json::Value) -> Result<()>;

    fn set_input(&mut self, port: &str, signal: PolySignal) -> Result<()>;

    fn set_output_connected(&mut self, port: &str, connected: bool) -> Result<()>;

    fn get_output(&self, port: &str) -> Result<&OutputPort>;

    fn get_timing_metrics(&self) -> Option<TimingMetrics> {
        None
    }

    fn reset_timing_metrics(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSchema {
    pub name: String,
    pub description: String,
    /// Channel count the port always reports, for outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<usize>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub default: bool,
}

impl PortSchema {
    pub fn input(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            channels: None,
            default: false,
        }
    }

    pub fn output(name: impl Into<String>, description: impl Into<String>, channels: usize) -> Self {
        Self {
            channels: Some(channels),
            ..Self::input(name, description)
        }
    }

    pub fn with_default(mut self) -> Self {
        self.default = true;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSchema {
    pub name: String,
    pub description: String,
    pub params_schema: schemars::Schema,
    pub params: Vec<ParamInfo>,
    pub inputs: Vec<PortSchema>,
    pub outputs: Vec<PortSchema>,
}
