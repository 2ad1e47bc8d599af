//! Sample-level building blocks shared by the ambient bed and the effects.

use std::f32::consts::{FRAC_1_SQRT_2, TAU};

/// Lowest cutoff the low-pass filter accepts.
const MIN_CUTOFF_HZ: f32 = 10.0;
/// Highest cutoff expressed as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f32 = 0.45;

/// Periodic waveform shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl Waveform {
    /// Evaluates the waveform at `phase` in `0.0..1.0`.
    fn sample(self, phase: f32) -> f32 {
        match self {
            Self::Sine => (TAU * phase).sin(),
            Self::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Self::Sawtooth => 2.0 * phase - 1.0,
            Self::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// Phase accumulator producing one waveform.
#[derive(Clone, Debug)]
pub(crate) struct Oscillator {
    waveform: Waveform,
    phase: f32,
}

impl Oscillator {
    pub(crate) fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
        }
    }

    /// Emits the current sample and advances the phase by one sample at `frequency`.
    pub(crate) fn next(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let value = self.waveform.sample(self.phase);
        self.phase += frequency / sample_rate;
        self.phase -= self.phase.floor();
        if !self.phase.is_finite() {
            self.phase = 0.0;
        }
        value
    }
}

/// Parameter that approaches its target exponentially with a fixed time constant.
///
/// After one time constant the remaining distance to the target has shrunk to
/// `1/e`, matching a set-target-at-time automation curve.
#[derive(Clone, Debug)]
pub(crate) struct SmoothedParam {
    value: f32,
    target: f32,
    coefficient: f32,
}

impl SmoothedParam {
    pub(crate) fn new(value: f32) -> Self {
        Self {
            value,
            target: value,
            coefficient: 1.0,
        }
    }

    /// Starts a glide from the current value toward `target`.
    /// Non-finite targets are ignored; the parameter keeps gliding to its
    /// previous target.
    pub(crate) fn set_target(&mut self, target: f32, time_constant: f32, sample_rate: f32) {
        if !target.is_finite() {
            return;
        }
        self.target = target;
        self.coefficient = if time_constant > 0.0 && sample_rate > 0.0 {
            -(-1.0 / (time_constant * sample_rate)).exp_m1()
        } else {
            1.0
        };
    }

    pub(crate) fn next(&mut self) -> f32 {
        self.value += (self.target - self.value) * self.coefficient;
        self.value
    }

    pub(crate) fn value(&self) -> f32 {
        self.value
    }

    pub(crate) fn target(&self) -> f32 {
        self.target
    }
}

/// Fixed-duration automation curve evaluated against elapsed seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Ramp {
    /// Geometric interpolation; both endpoints must be positive.
    Exponential { from: f32, to: f32, duration: f32 },
    Linear { from: f32, to: f32, duration: f32 },
    Constant(f32),
}

impl Ramp {
    /// Value at `elapsed` seconds; holds the end value once the ramp completes.
    pub(crate) fn at(&self, elapsed: f32) -> f32 {
        match *self {
            Self::Constant(value) => value,
            Self::Linear { from, to, duration } => from + (to - from) * progress(elapsed, duration),
            Self::Exponential { from, to, duration } => {
                let progress = progress(elapsed, duration);
                if from <= 0.0 || to <= 0.0 {
                    return from + (to - from) * progress;
                }
                from * (to / from).powf(progress)
            }
        }
    }
}

fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed / duration).clamp(0.0, 1.0)
}

/// Second-order low-pass filter with Butterworth resonance.
#[derive(Clone, Debug)]
pub(crate) struct LowPass {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
    cutoff: f32,
}

impl LowPass {
    pub(crate) fn new(cutoff: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            cutoff: 0.0,
        };
        filter.set_cutoff(cutoff, sample_rate);
        filter
    }

    /// Recomputes the coefficients for `cutoff`, keeping the filter history.
    pub(crate) fn set_cutoff(&mut self, cutoff: f32, sample_rate: f32) {
        let max = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);
        let cutoff = cutoff.clamp(MIN_CUTOFF_HZ, max);
        if (cutoff - self.cutoff).abs() < f32::EPSILON {
            return;
        }
        self.cutoff = cutoff;

        let w0 = TAU * cutoff / sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * FRAC_1_SQRT_2);
        let a0 = 1.0 + alpha;

        self.b0 = (1.0 - cos) / 2.0 / a0;
        self.b1 = (1.0 - cos) / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Filters one sample. A non-finite result clears the history and yields silence.
    pub(crate) fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        if !output.is_finite() {
            self.reset();
            return 0.0;
        }
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}
