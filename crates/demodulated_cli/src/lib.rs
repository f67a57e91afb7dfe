//! Shared pieces of the `demodulated` and `demodulated-bench` binaries.

pub mod patch;
