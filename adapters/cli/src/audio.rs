//! Selection of the output device backing the synthesis graph.

use anyhow::Result;
use clap::ValueEnum;
use ferry_crossing_system_synthesis::{
    DeviceError, DeviceProvider, OfflineProvider, OutputDevice, SynthesisGraph,
};

use crate::config::AudioConfig;

/// Where rendered audio goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum AudioMode {
    /// Render into memory at the configured sample rate; nothing is heard.
    Offline,
    /// Play through the default output device.
    Cpal,
    /// No output device; every audio operation is a no-op.
    None,
}

impl AudioMode {
    /// Whether the session has to render the destination itself.
    pub(crate) fn needs_pumping(self) -> bool {
        matches!(self, Self::Offline)
    }
}

/// Provider standing in for a machine without audio output.
#[derive(Clone, Copy, Debug)]
struct DisabledProvider;

impl DeviceProvider for DisabledProvider {
    fn open(&mut self) -> Result<Box<dyn OutputDevice>, DeviceError> {
        Err(DeviceError::Unavailable)
    }
}

/// Builds the synthesis graph for `mode`.
pub(crate) fn build_graph(mode: AudioMode, config: &AudioConfig) -> Result<SynthesisGraph> {
    let graph = match mode {
        AudioMode::Offline => SynthesisGraph::new(OfflineProvider::new(config.sample_rate)),
        AudioMode::Cpal => native_graph()?,
        AudioMode::None => SynthesisGraph::new(DisabledProvider),
    };
    Ok(graph)
}

#[cfg(feature = "cpal")]
fn native_graph() -> Result<SynthesisGraph> {
    Ok(SynthesisGraph::new(crate::cpal_device::CpalProvider))
}

#[cfg(not(feature = "cpal"))]
fn native_graph() -> Result<SynthesisGraph> {
    anyhow::bail!("native audio output requires building with `--features cpal`")
}
