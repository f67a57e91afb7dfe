//! Patch files: module params plus the port state a host would supply.
//!
//! ```json
//! {
//!   "params": { "rate": 110.0, "accumulate": true },
//!   "inputs": { "phase": 0.25, "offset": [0.0, 0.1] },
//!   "disconnected": ["phase3", "polyPhase"]
//! }
//! ```

use anyhow::{Context, Result};
use demodulated_core::module::{FM_INPUT, OFFSET_INPUT, PHASE_INPUT};
use demodulated_core::{DeModulated, DeModulatedParams, Module, PolySignal};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchInputs {
    pub phase: PolySignal,
    pub offset: PolySignal,
    pub fm: PolySignal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatchFile {
    pub params: serde_json::Value,
    pub inputs: PatchInputs,
    /// Output ports the host reports as unplugged
    pub disconnected: Vec<String>,
}

impl Default for PatchFile {
    fn default() -> Self {
        Self {
            params: serde_json::json!({}),
            inputs: PatchInputs::default(),
            disconnected: Vec::new(),
        }
    }
}

pub fn load_patch(path: &Path) -> Result<PatchFile> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read patch file {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse patch JSON {}", path.display()))
}

/// Build a module with params and port state applied.
///
/// Params outside their configured ranges are clamped, as a host's knobs would.
pub fn build_module(patch: &PatchFile) -> Result<DeModulated> {
    let mut module = DeModulated::default();
    module.set_params(DeModulatedParams::from_json(patch.params.clone())?);

    module.set_input(PHASE_INPUT, patch.inputs.phase)?;
    module.set_input(OFFSET_INPUT, patch.inputs.offset)?;
    module.set_input(FM_INPUT, patch.inputs.fm)?;

    for port in &patch.disconnected {
        module.set_output_connected(port, false)?;
    }

    tracing::info!(
        params = ?module.params,
        phase_channels = patch.inputs.phase.channels(),
        offset_channels = patch.inputs.offset.channels(),
        disconnected = patch.disconnected.len(),
        "built module from patch"
    );
    Ok(module)
}

/// Locate the bundled patches directory.
pub fn get_patches_dir() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));

    let candidates = [
        PathBuf::from("patches"),
        PathBuf::from("crates/demodulated_cli/patches"),
        exe_dir
            .clone()
            .map(|p| p.join("patches"))
            .unwrap_or_default(),
        exe_dir
            .map(|p| p.join("../../crates/demodulated_cli/patches"))
            .unwrap_or_default(),
    ];

    for path in &candidates {
        if path.is_dir() {
            return path.clone();
        }
    }

    PathBuf::from("crates/demodulated_cli/patches")
}

/// All `.json` files in a directory, sorted by name.
pub fn list_patch_files(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect()
        })
        .unwrap_or_default();
    paths.sort();
    paths
}
