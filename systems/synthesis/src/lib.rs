#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural audio feedback for the ferry crossing.
//!
//! The graph owns a single output device and one persistent ambient bed whose
//! timbre tracks the player's fear and frustration. One-shot effects are
//! scheduled as self-contained voices that the mixer drops once they finish.
//! Every operation is best effort: when no device is available the graph
//! stays silent and the game keeps running.

mod ambient;
mod dsp;
mod effects;
mod output;

use ferry_crossing_core::{AudioCue, Event, Footing, SoundEffect};

pub use ambient::{AmbientTargets, AMBIENT_FLOOR, FADE_TIME_CONSTANT, RETUNE_TIME_CONSTANT};
pub use output::{
    Destination, DeviceError, DeviceProvider, OfflineDevice, OfflineProvider, OutputDevice,
    OutputPort,
};

/// Seed of the noise generator feeding the struggle effect.
const NOISE_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Lazily initialised synthesis graph fed by world audio cues.
pub struct SynthesisGraph {
    provider: Box<dyn DeviceProvider>,
    device: Option<Box<dyn OutputDevice>>,
    port: OutputPort,
    chains_built: usize,
}

impl std::fmt::Debug for SynthesisGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisGraph")
            .field("initialized", &self.device.is_some())
            .field("chains_built", &self.chains_built)
            .field("port", &self.port)
            .finish()
    }
}

impl SynthesisGraph {
    /// Creates an uninitialised graph that opens devices through `provider`.
    #[must_use]
    pub fn new(provider: impl DeviceProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            device: None,
            port: OutputPort::default(),
            chains_built: 0,
        }
    }

    /// Consumes world events and performs the audio cues they carry.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            let Event::AudioCue(cue) = event else {
                continue;
            };
            match *cue {
                AudioCue::Initialize => self.initialize(),
                AudioCue::StartAmbient => self.start_ambient(),
                AudioCue::StopAmbient => self.stop_ambient(),
                AudioCue::RetuneAmbient { fear, frustration } => {
                    self.update_ambient(fear, frustration);
                }
                AudioCue::Effect(effect) => self.play_effect(effect),
            }
        }
    }

    /// Ensures the output device exists and is running.
    ///
    /// Idempotent: the device and the ambient chain are built at most once.
    /// A suspended device is resumed. Failures are logged and leave the graph
    /// silent.
    pub fn initialize(&mut self) {
        if let Some(device) = self.device.as_mut() {
            if device.is_suspended() {
                if let Err(error) = device.resume() {
                    log::warn!("failed to resume audio output: {error}");
                }
            }
            return;
        }

        match self.open_device() {
            Ok((device, destination)) => {
                self.device = Some(device);
                self.chains_built += 1;
                self.port.install(destination);
                log::debug!("audio output initialised");
            }
            Err(error) => log::warn!("audio output unavailable: {error}"),
        }
    }

    fn open_device(&mut self) -> Result<(Box<dyn OutputDevice>, Destination), DeviceError> {
        let mut device = self.provider.open()?;
        let destination = Destination::new(device.sample_rate(), NOISE_SEED);
        device.connect(destination.clone())?;
        device.resume()?;
        Ok((device, destination))
    }

    /// Releases the device. A later [`SynthesisGraph::initialize`] builds a
    /// fresh chain.
    pub fn teardown(&mut self) {
        if self.device.take().is_some() {
            self.port.clear();
            log::debug!("audio output released");
        }
    }

    /// Fades the ambient bed in to [`AMBIENT_FLOOR`].
    pub fn start_ambient(&self) {
        if let Some(destination) = self.destination_or_trace("start ambient") {
            destination.fade_ambient(AMBIENT_FLOOR);
        }
    }

    /// Fades the ambient bed out to silence. The chain stays alive.
    pub fn stop_ambient(&self) {
        if let Some(destination) = self.destination_or_trace("stop ambient") {
            destination.fade_ambient(0.0);
        }
    }

    /// Glides the ambient bed toward the timbre of `fear` and `frustration`.
    pub fn update_ambient(&self, fear: f32, frustration: f32) {
        if let Some(destination) = self.destination_or_trace("update ambient") {
            destination.retune_ambient(AmbientTargets::from_attributes(fear, frustration));
        }
    }

    /// Schedules a one-shot effect.
    pub fn play_effect(&self, effect: SoundEffect) {
        if let Some(destination) = self.destination_or_trace("play effect") {
            destination.play_effect(effect);
        }
    }

    /// Short downward thud; muddy footing sounds rougher and lower.
    pub fn play_footstep(&self, footing: Footing) {
        self.play_effect(SoundEffect::Footstep(footing));
    }

    /// Burst of filtered noise.
    pub fn play_struggle(&self) {
        self.play_effect(SoundEffect::Struggle);
    }

    /// Rising two-tone chime.
    pub fn play_helping_hand(&self) {
        self.play_effect(SoundEffect::HelpingHand);
    }

    /// UI click.
    pub fn play_click(&self) {
        self.play_effect(SoundEffect::Click);
    }

    /// Failure alarm.
    pub fn play_alarm(&self) {
        self.play_effect(SoundEffect::Alarm);
    }

    /// Whether an output device is open.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.device.is_some()
    }

    /// Number of ambient chains built over the graph's lifetime.
    #[must_use]
    pub fn ambient_chain_count(&self) -> usize {
        self.chains_built
    }

    /// Shared handle other systems use to reach the destination.
    #[must_use]
    pub fn output_port(&self) -> OutputPort {
        self.port.clone()
    }

    /// Destination of the open device, if any.
    #[must_use]
    pub fn destination(&self) -> Option<Destination> {
        self.port.destination()
    }

    /// Values the ambient parameters are gliding toward.
    #[must_use]
    pub fn ambient_targets(&self) -> Option<AmbientTargets> {
        self.destination().map(|destination| destination.ambient_targets())
    }

    /// Values the ambient parameters currently hold.
    #[must_use]
    pub fn ambient_levels(&self) -> Option<AmbientTargets> {
        self.destination().map(|destination| destination.ambient_levels())
    }

    /// Number of effect voices and clips still playing.
    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.destination()
            .map_or(0, |destination| destination.active_voices())
    }

    fn destination_or_trace(&self, operation: &str) -> Option<Destination> {
        let destination = self.port.destination();
        if destination.is_none() {
            log::trace!("{operation} skipped: audio output not initialised");
        }
        destination
    }
}
