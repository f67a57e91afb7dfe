pub mod phase_engine;
pub mod utils;
