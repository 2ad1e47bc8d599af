//! Fire-and-forget voices for one-shot effects and narrated clips.

use ferry_crossing_core::{Footing, SoundEffect};
use rand::Rng;
use tokio::sync::oneshot;

use crate::dsp::{LowPass, Oscillator, Ramp, Waveform};

/// A pitched partial whose frequency follows a ramp.
#[derive(Debug)]
struct Tone {
    oscillator: Oscillator,
    pitch: Ramp,
}

impl Tone {
    fn new(waveform: Waveform, pitch: Ramp) -> Self {
        Self {
            oscillator: Oscillator::new(waveform),
            pitch,
        }
    }
}

#[derive(Debug)]
enum Source {
    Tones(Vec<Tone>),
    /// Pre-rendered noise swept by a low-pass filter.
    FilteredNoise {
        buffer: Vec<f32>,
        filter: LowPass,
        cutoff: Ramp,
    },
}

/// Self-contained voice for a single [`SoundEffect`].
///
/// The voice owns its generators and its stop time; once the stop time passes
/// it reports itself finished and the mixer drops it.
#[derive(Debug)]
pub(crate) struct EffectVoice {
    source: Source,
    gain: Ramp,
    sample_rate: f32,
    elapsed: usize,
    length: usize,
}

impl EffectVoice {
    pub(crate) fn new<R: Rng>(effect: SoundEffect, sample_rate: f32, rng: &mut R) -> Self {
        match effect {
            SoundEffect::Footstep(footing) => {
                let (waveform, start_hz) = match footing {
                    Footing::Firm => (Waveform::Sine, 100.0),
                    Footing::Mud => (Waveform::Sawtooth, 60.0),
                };
                Self::tones(
                    vec![Tone::new(
                        waveform,
                        Ramp::Exponential {
                            from: start_hz,
                            to: 10.0,
                            duration: 0.15,
                        },
                    )],
                    Ramp::Exponential {
                        from: 0.2,
                        to: 0.001,
                        duration: 0.15,
                    },
                    0.15,
                    sample_rate,
                )
            }
            SoundEffect::Struggle => {
                let length = seconds_to_samples(0.2, sample_rate);
                let buffer: Vec<f32> = (0..length).map(|_| rng.gen_range(-1.0..1.0)).collect();
                Self {
                    source: Source::FilteredNoise {
                        buffer,
                        filter: LowPass::new(300.0, sample_rate),
                        cutoff: Ramp::Exponential {
                            from: 300.0,
                            to: 50.0,
                            duration: 0.2,
                        },
                    },
                    gain: Ramp::Exponential {
                        from: 0.4,
                        to: 0.01,
                        duration: 0.2,
                    },
                    sample_rate,
                    elapsed: 0,
                    length,
                }
            }
            SoundEffect::HelpingHand => Self::tones(
                vec![
                    Tone::new(
                        Waveform::Sine,
                        Ramp::Linear {
                            from: 440.0,
                            to: 880.0,
                            duration: 0.1,
                        },
                    ),
                    Tone::new(
                        Waveform::Sine,
                        Ramp::Linear {
                            from: 330.0,
                            to: 660.0,
                            duration: 0.1,
                        },
                    ),
                ],
                Ramp::Exponential {
                    from: 0.15,
                    to: 0.001,
                    duration: 0.3,
                },
                0.3,
                sample_rate,
            ),
            SoundEffect::Click => Self::tones(
                vec![Tone::new(
                    Waveform::Sine,
                    Ramp::Exponential {
                        from: 600.0,
                        to: 1000.0,
                        duration: 0.05,
                    },
                )],
                Ramp::Linear {
                    from: 0.05,
                    to: 0.0,
                    duration: 0.05,
                },
                0.05,
                sample_rate,
            ),
            SoundEffect::Alarm => Self::tones(
                vec![Tone::new(Waveform::Square, Ramp::Constant(330.0))],
                Ramp::Linear {
                    from: 0.02,
                    to: 0.0,
                    duration: 0.3,
                },
                0.3,
                sample_rate,
            ),
        }
    }

    fn tones(tones: Vec<Tone>, gain: Ramp, stop_after: f32, sample_rate: f32) -> Self {
        Self {
            source: Source::Tones(tones),
            gain,
            sample_rate,
            elapsed: 0,
            length: seconds_to_samples(stop_after, sample_rate),
        }
    }

    pub(crate) fn next(&mut self) -> f32 {
        if self.is_finished() {
            return 0.0;
        }
        let time = self.elapsed as f32 / self.sample_rate;
        let gain = self.gain.at(time);
        let sample_rate = self.sample_rate;

        let raw = match &mut self.source {
            Source::Tones(tones) => tones
                .iter_mut()
                .map(|tone| {
                    let frequency = tone.pitch.at(time);
                    tone.oscillator.next(frequency, sample_rate)
                })
                .sum::<f32>(),
            Source::FilteredNoise {
                buffer,
                filter,
                cutoff,
            } => {
                filter.set_cutoff(cutoff.at(time), sample_rate);
                let input = buffer.get(self.elapsed).copied().unwrap_or(0.0);
                filter.process(input)
            }
        };

        self.elapsed += 1;
        raw * gain
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.elapsed >= self.length
    }
}

/// Decoded speech played once at a fixed gain, resampled to the device rate.
#[derive(Debug)]
pub(crate) struct ClipVoice {
    samples: Vec<f32>,
    position: f64,
    step: f64,
    gain: f32,
    done: Option<oneshot::Sender<()>>,
}

impl ClipVoice {
    pub(crate) fn new(
        samples: Vec<f32>,
        clip_rate: u32,
        device_rate: f32,
        gain: f32,
        done: oneshot::Sender<()>,
    ) -> Self {
        Self {
            samples,
            position: 0.0,
            step: f64::from(clip_rate) / f64::from(device_rate),
            gain,
            done: Some(done),
        }
    }

    pub(crate) fn next(&mut self) -> f32 {
        let index = self.position as usize;
        let Some(&current) = self.samples.get(index) else {
            return 0.0;
        };
        let following = self.samples.get(index + 1).copied().unwrap_or(current);
        let fraction = (self.position - index as f64) as f32;
        self.position += self.step;
        (current + (following - current) * fraction) * self.gain
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.position >= self.samples.len() as f64
    }

    /// Signals the waiting narration task exactly once.
    pub(crate) fn complete(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

fn seconds_to_samples(seconds: f32, sample_rate: f32) -> usize {
    (seconds * sample_rate).round() as usize
}
