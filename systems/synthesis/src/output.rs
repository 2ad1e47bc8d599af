//! Output device abstraction and the shared destination every voice feeds.

use std::sync::Arc;

use ferry_crossing_core::SoundEffect;
use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::{
    ambient::{AmbientBed, AmbientTargets},
    effects::{ClipVoice, EffectVoice},
};

/// Failures raised while bringing up or driving an output device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No output device could be found.
    #[error("no audio output device is available")]
    Unavailable,
    /// The device refused the requested stream configuration.
    #[error("audio output rejected the stream configuration: {0}")]
    Configuration(String),
    /// The stream could not be built or started.
    #[error("audio output stream failed: {0}")]
    Stream(String),
}

/// Audio sink that pulls mono frames from a [`Destination`].
pub trait OutputDevice {
    /// Frames per second the device consumes.
    fn sample_rate(&self) -> u32;

    /// Attaches the destination the device pulls frames from.
    fn connect(&mut self, destination: Destination) -> Result<(), DeviceError>;

    /// Whether the device is currently paused.
    fn is_suspended(&self) -> bool;

    /// Starts or resumes pulling frames.
    fn resume(&mut self) -> Result<(), DeviceError>;
}

/// Factory for the process-wide output device.
pub trait DeviceProvider {
    /// Opens a new output device.
    fn open(&mut self) -> Result<Box<dyn OutputDevice>, DeviceError>;
}

/// Device that never pulls on its own; whoever owns the destination renders it.
///
/// Headless sessions and tests drive rendering explicitly through
/// [`Destination::render`].
#[derive(Debug)]
pub struct OfflineDevice {
    sample_rate: u32,
    destination: Option<Destination>,
    suspended: bool,
}

impl OfflineDevice {
    /// Creates a suspended offline device.
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            destination: None,
            suspended: true,
        }
    }
}

impl OutputDevice for OfflineDevice {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn connect(&mut self, destination: Destination) -> Result<(), DeviceError> {
        self.destination = Some(destination);
        Ok(())
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> Result<(), DeviceError> {
        if self.destination.is_none() {
            return Err(DeviceError::Stream("offline device is not connected".into()));
        }
        self.suspended = false;
        Ok(())
    }
}

/// Provider that hands out [`OfflineDevice`]s.
#[derive(Clone, Copy, Debug)]
pub struct OfflineProvider {
    sample_rate: u32,
}

impl OfflineProvider {
    /// Creates a provider for devices running at `sample_rate`.
    #[must_use]
    pub const fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl DeviceProvider for OfflineProvider {
    fn open(&mut self) -> Result<Box<dyn OutputDevice>, DeviceError> {
        if self.sample_rate == 0 {
            return Err(DeviceError::Configuration("sample rate must be non-zero".into()));
        }
        Ok(Box::new(OfflineDevice::new(self.sample_rate)))
    }
}

/// Shared mix bus. Clones refer to the same bus.
#[derive(Clone, Debug)]
pub struct Destination {
    mixer: Arc<Mutex<Mixer>>,
    sample_rate: u32,
}

impl Destination {
    pub(crate) fn new(sample_rate: u32, seed: u64) -> Self {
        Self {
            mixer: Arc::new(Mutex::new(Mixer::new(sample_rate as f32, seed))),
            sample_rate,
        }
    }

    /// Frames per second the bus is rendered at.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Renders the next `out.len()` mono frames.
    pub fn render(&self, out: &mut [f32]) {
        let mut mixer = self.mixer.lock();
        for frame in out.iter_mut() {
            *frame = mixer.next_frame();
        }
    }

    /// Schedules a clip at `gain`; the receiver resolves when the clip has
    /// played out or was discarded.
    pub fn play_clip(&self, samples: Vec<f32>, clip_rate: u32, gain: f32) -> oneshot::Receiver<()> {
        let (done, finished) = oneshot::channel();
        let mut mixer = self.mixer.lock();
        let voice = ClipVoice::new(samples, clip_rate, mixer.sample_rate, gain, done);
        mixer.voices.push(Voice::Clip(voice));
        finished
    }

    /// Number of one-shot voices and clips still playing.
    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.mixer.lock().voices.len()
    }

    pub(crate) fn play_effect(&self, effect: SoundEffect) {
        let mut guard = self.mixer.lock();
        let mixer = &mut *guard;
        let voice = EffectVoice::new(effect, mixer.sample_rate, &mut mixer.rng);
        mixer.voices.push(Voice::Effect(voice));
    }

    pub(crate) fn fade_ambient(&self, gain: f32) {
        self.mixer.lock().ambient.fade_to(gain);
    }

    pub(crate) fn retune_ambient(&self, targets: AmbientTargets) {
        self.mixer.lock().ambient.retune(targets);
    }

    pub(crate) fn ambient_targets(&self) -> AmbientTargets {
        self.mixer.lock().ambient.targets()
    }

    pub(crate) fn ambient_levels(&self) -> AmbientTargets {
        self.mixer.lock().ambient.levels()
    }
}

/// Read handle onto the destination, available once the graph is initialised.
#[derive(Clone, Debug, Default)]
pub struct OutputPort {
    slot: Arc<RwLock<Option<Destination>>>,
}

impl OutputPort {
    /// Destination to play into, if the device is up.
    #[must_use]
    pub fn destination(&self) -> Option<Destination> {
        self.slot.read().clone()
    }

    pub(crate) fn install(&self, destination: Destination) {
        *self.slot.write() = Some(destination);
    }

    pub(crate) fn clear(&self) {
        *self.slot.write() = None;
    }
}

#[derive(Debug)]
enum Voice {
    Effect(EffectVoice),
    Clip(ClipVoice),
}

impl Voice {
    fn next(&mut self) -> f32 {
        match self {
            Self::Effect(voice) => voice.next(),
            Self::Clip(voice) => voice.next(),
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            Self::Effect(voice) => voice.is_finished(),
            Self::Clip(voice) => voice.is_finished(),
        }
    }
}

#[derive(Debug)]
struct Mixer {
    sample_rate: f32,
    ambient: AmbientBed,
    voices: Vec<Voice>,
    rng: ChaCha8Rng,
}

impl Mixer {
    fn new(sample_rate: f32, seed: u64) -> Self {
        Self {
            sample_rate,
            ambient: AmbientBed::new(sample_rate),
            voices: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn next_frame(&mut self) -> f32 {
        let mut frame = self.ambient.next();
        let mut any_finished = false;
        for voice in &mut self.voices {
            frame += voice.next();
            any_finished |= voice.is_finished();
        }

        if any_finished {
            self.voices.retain_mut(|voice| {
                if !voice.is_finished() {
                    return true;
                }
                if let Voice::Clip(clip) = voice {
                    clip.complete();
                }
                false
            });
        }

        if frame.is_finite() {
            frame.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}
