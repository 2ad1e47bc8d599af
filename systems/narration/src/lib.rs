#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single-flight narrated speech.
//!
//! The narrator turns a line and a [`NarrationRole`] into a framed prompt,
//! asks a [`SpeechBackend`] for PCM audio and plays the result through the
//! synthesis destination. At most one narration is in flight at a time;
//! requests that arrive while busy are dropped rather than queued.

mod pcm;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use ferry_crossing_core::{Event, NarrationRole, Persona};
use ferry_crossing_system_synthesis::OutputPort;
use thiserror::Error;
use tokio::runtime::Handle;

pub use pcm::{decode_pcm16, SPEECH_SAMPLE_RATE};

/// Playback gain applied to narration so it cuts through the ambient bed.
pub const NARRATION_GAIN: f32 = 1.5;

/// Failures reported by speech backends.
#[derive(Debug, Error)]
pub enum NarrationError {
    /// The request never produced a response.
    #[error("speech request failed: {0}")]
    Request(String),
    /// The backend answered with a non-success status.
    #[error("speech backend returned status {status}: {body}")]
    Status {
        /// HTTP-style status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
    /// The response arrived but its audio payload was malformed.
    #[error("speech payload could not be decoded: {0}")]
    Payload(String),
}

/// Framed prompt plus the voice that should speak it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeechRequest {
    /// Instruction text sent to the backend, including the line to speak.
    pub prompt: String,
    /// Voice the backend should use.
    pub persona: Persona,
}

impl SpeechRequest {
    /// Builds the request for `text` voiced as `role`.
    #[must_use]
    pub fn new(text: &str, role: NarrationRole) -> Self {
        Self {
            prompt: format!(
                "Act as {} during a desperate ferry crossing. Speak this line loudly with raw emotion and total realism: {text}",
                role.framing()
            ),
            persona: role.persona(),
        }
    }
}

/// External text-to-speech collaborator.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Synthesizes the request into little-endian 16-bit mono PCM at
    /// [`SPEECH_SAMPLE_RATE`]. `Ok(None)` means the backend answered without audio.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Option<Vec<u8>>, NarrationError>;
}

/// Why a narration request was dropped without contacting the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// No speech backend is configured.
    BackendUnavailable,
    /// The audio output has not been initialised.
    DeviceUnavailable,
    /// Another narration is still in flight.
    Busy,
}

/// Result of a single [`Narrator::speak`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Audio was played to completion or discarded by an output teardown.
    Spoken,
    /// The backend answered without audio.
    NoAudio,
    /// The backend call failed.
    Failed,
    /// The request was dropped before reaching the backend.
    Dropped(DropReason),
}

/// Cloneable handle onto the single narration channel.
///
/// Clones share the busy flag, so single-flight holds across every clone.
#[derive(Clone)]
pub struct Narrator {
    backend: Option<Arc<dyn SpeechBackend>>,
    port: OutputPort,
    busy: Arc<AtomicBool>,
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator")
            .field("backend", &self.backend.is_some())
            .field("busy", &self.is_busy())
            .finish()
    }
}

impl Narrator {
    /// Creates a narrator that plays through `port`. Without a backend every
    /// request is dropped.
    #[must_use]
    pub fn new(backend: Option<Arc<dyn SpeechBackend>>, port: OutputPort) -> Self {
        Self {
            backend,
            port,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a narration is currently in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Speaks `text` in the voice of `role` and resolves once playback ends.
    ///
    /// Never fails: backend errors are logged and reported in the outcome. The
    /// busy flag is held from before the backend call until playback finishes
    /// and is released on every exit path.
    pub async fn speak(&self, text: &str, role: NarrationRole) -> SpeakOutcome {
        let Some(backend) = self.backend.as_ref() else {
            log::trace!("narration dropped: no speech backend");
            return SpeakOutcome::Dropped(DropReason::BackendUnavailable);
        };
        let Some(_flight) = FlightGuard::acquire(&self.busy) else {
            log::debug!("narration dropped: another line is in flight");
            return SpeakOutcome::Dropped(DropReason::Busy);
        };
        if self.port.destination().is_none() {
            log::trace!("narration dropped: audio output not initialised");
            return SpeakOutcome::Dropped(DropReason::DeviceUnavailable);
        }

        let request = SpeechRequest::new(text, role);
        let bytes = match backend.synthesize(&request).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::debug!("speech backend returned no audio for {}", role.label());
                return SpeakOutcome::NoAudio;
            }
            Err(error) => {
                log::warn!("narration failed: {error}");
                return SpeakOutcome::Failed;
            }
        };

        let samples = decode_pcm16(&bytes);
        if samples.is_empty() {
            return SpeakOutcome::NoAudio;
        }
        let Some(destination) = self.port.destination() else {
            return SpeakOutcome::Dropped(DropReason::DeviceUnavailable);
        };
        let finished = destination.play_clip(samples, SPEECH_SAMPLE_RATE, NARRATION_GAIN);
        drop(destination);

        if finished.await.is_err() {
            log::debug!("narration clip discarded before it finished");
        }
        SpeakOutcome::Spoken
    }

    /// Spawns a [`Narrator::speak`] for every narration request in `events`.
    ///
    /// Requests are dispatched onto the current tokio runtime; outside a
    /// runtime they are dropped with a warning.
    pub fn handle(&self, events: &[Event]) {
        for event in events {
            let Event::NarrationRequested { text, role } = event else {
                continue;
            };
            let Ok(runtime) = Handle::try_current() else {
                log::warn!("narration dropped: no async runtime available");
                continue;
            };

            let narrator = self.clone();
            let text = text.clone();
            let role = *role;
            let _ = runtime.spawn(async move {
                let outcome = narrator.speak(&text, role).await;
                log::debug!("narration as {} finished: {outcome:?}", role.label());
            });
        }
    }
}

/// Scoped ownership of the busy flag.
#[derive(Debug)]
struct FlightGuard {
    busy: Arc<AtomicBool>,
}

impl FlightGuard {
    fn acquire(busy: &Arc<AtomicBool>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                busy: Arc::clone(busy),
            })
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_framing_and_line() {
        let request = SpeechRequest::new("Hold on!", NarrationRole::Boatman);
        assert_eq!(request.persona, Persona::A);
        assert!(request.prompt.starts_with("Act as a rough, LOUD, gritty dockworker"));
        assert!(request.prompt.ends_with("total realism: Hold on!"));
    }

    #[test]
    fn flight_guard_is_exclusive_and_released_on_drop() {
        let busy = Arc::new(AtomicBool::new(false));
        let guard = FlightGuard::acquire(&busy).expect("idle flag");
        assert!(FlightGuard::acquire(&busy).is_none());

        drop(guard);
        assert!(!busy.load(Ordering::Acquire));
        assert!(FlightGuard::acquire(&busy).is_some());
    }
}
