//! DeModulated phase engine core library
//!
//! Sixteen phase-shifted sine voices driven by an external phase signal or
//! an internal accumulator. This crate holds the DSP, the port and param
//! types a host needs to drive it, and nothing else: no audio I/O, no UI.

pub mod dsp;
pub mod metrics;
pub mod module;
pub mod params;
pub mod poly;
pub mod types;

// Re-export commonly used items
pub use dsp::phase_engine::{PhaseEngine, VOICES};
pub use module::DeModulated;
pub use params::DeModulatedParams;
pub use poly::{OutputPort, PORT_MAX_CHANNELS, PolyOutput, PolySignal};
pub use types::{Module, ModuleSchema};
