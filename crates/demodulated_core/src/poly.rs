//! Polyphonic port values for multichannel cables.
//!
//! A single cable carries up to 16 independent voltages, VCV Rack style.
//!
//! - `PolySignal`: what an input port currently reads (voltages + channel count)
//! - `PolyOutput`: what an output port publishes (voltages + reported channel count)
//! - `OutputPort`: a `PolyOutput` plus the host's connection flag

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;

/// Maximum channels per cable (matches VCV Rack / MIDI convention)
pub const PORT_MAX_CHANNELS: usize = 16;

/// A polyphonic output buffer with channel count metadata.
///
/// The `channels` field indicates how many channels are semantically valid:
/// - 0 = nothing reported yet
/// - 1 = monophonic
/// - 2-16 = polyphonic
#[derive(Clone, Copy, Debug)]
pub struct PolyOutput {
    voltages: [f32; PORT_MAX_CHANNELS],
    channels: usize,
}

impl Default for PolyOutput {
    fn default() -> Self {
        Self {
            voltages: [0.0; PORT_MAX_CHANNELS],
            channels: 0,
        }
    }
}

impl PartialEq for PolyOutput {
    fn eq(&self, other: &Self) -> bool {
        self.channels == other.channels
            && self.voltages[..self.channels] == other.voltages[..other.channels]
    }
}

impl PolyOutput {
    /// Get voltage for a specific channel (returns 0.0 if out of range)
    pub fn get(&self, channel: usize) -> f32 {
        if channel < self.channels {
            self.voltages[channel]
        } else {
            0.0
        }
    }

    /// Set voltage for a specific channel
    pub fn set(&mut self, channel: usize, value: f32) {
        if channel < PORT_MAX_CHANNELS {
            self.voltages[channel] = value;
        }
    }

    /// Set the number of active channels (clears higher channels to 0)
    pub fn set_channels(&mut self, channels: usize) {
        let channels = channels.min(PORT_MAX_CHANNELS);
        for c in channels..self.channels {
            self.voltages[c] = 0.0;
        }
        self.channels = channels;
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Active voltages only
    pub fn voltages(&self) -> &[f32] {
        &self.voltages[..self.channels]
    }
}

impl Serialize for PolyOutput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("PolyOutput", 2)?;
        state.serialize_field("channels", &self.channels)?;
        state.serialize_field("voltages", self.voltages())?;
        state.end()
    }
}

// =============================================================================
// OutputPort - host connection state around a PolyOutput
// =============================================================================

/// An output port as the host exposes it.
///
/// Writers must check `is_connected()` before writing voltages. The reported
/// channel count is bookkeeping for the host and is set regardless.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputPort {
    connected: bool,
    #[serde(flatten)]
    signal: PolyOutput,
}

impl Default for OutputPort {
    fn default() -> Self {
        Self {
            connected: true,
            signal: PolyOutput::default(),
        }
    }
}

impl OutputPort {
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn set_channels(&mut self, channels: usize) {
        self.signal.set_channels(channels);
    }

    pub fn channels(&self) -> usize {
        self.signal.channels()
    }

    /// Write a voltage. Ignored while the port is disconnected.
    pub fn set_voltage(&mut self, channel: usize, value: f32) {
        if self.connected {
            self.signal.set(channel, value);
        }
    }

    pub fn get_voltage(&self, channel: usize) -> f32 {
        self.signal.get(channel)
    }
}

// =============================================================================
// PolySignal - polyphonic input voltages
// =============================================================================

/// A polyphonic input buffer.
///
/// The `channels` field indicates how many voltages are semantically valid:
/// - 0 = disconnected (reads as 0V everywhere)
/// - 1 = monophonic
/// - 2-16 = polyphonic
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PolySignal {
    voltages: [f32; PORT_MAX_CHANNELS],
    channels: usize,
}

impl PolySignal {
    /// Create a monophonic input from a single voltage
    pub fn mono(value: f32) -> Self {
        let mut ps = Self::default();
        ps.voltages[0] = value;
        ps.channels = 1;
        ps
    }

    /// Create a polyphonic input from a slice of voltages (truncated to 16)
    pub fn poly(values: &[f32]) -> Self {
        let channels = values.len().min(PORT_MAX_CHANNELS);
        let mut ps = Self::default();
        ps.voltages[..channels].copy_from_slice(&values[..channels]);
        ps.channels = channels;
        ps
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_disconnected(&self) -> bool {
        self.channels == 0
    }

    pub fn is_monophonic(&self) -> bool {
        self.channels == 1
    }

    /// Voltage at a channel; channels past the active count read as 0.0
    pub fn get(&self, channel: usize) -> f32 {
        if channel < self.channels {
            self.voltages[channel]
        } else {
            0.0
        }
    }
}

impl Serialize for PolySignal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.voltages[..self.channels].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PolySignal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Accept a bare number, an array of numbers, or null
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum PolySignalDe {
            Single(f32),
            Array(Vec<f32>),
            Disconnected(()),
        }

        Ok(match PolySignalDe::deserialize(deserializer)? {
            PolySignalDe::Single(v) => PolySignal::mono(v),
            PolySignalDe::Array(values) => PolySignal::poly(&values),
            PolySignalDe::Disconnected(()) => PolySignal::default(),
        })
    }
}

impl JsonSchema for PolySignal {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("PolySignal")
    }

    fn json_schema(r#gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
        #[derive(JsonSchema)]
        #[serde(untagged)]
        #[allow(dead_code)]
        enum PolySignalSchema {
            Single(f32),
            Array(Vec<f32>),
            Disconnected(()),
        }
        PolySignalSchema::json_schema(r#gen)
    }
}
