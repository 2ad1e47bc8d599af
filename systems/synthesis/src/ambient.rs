//! Persistent ambient bed whose timbre tracks fear and frustration.

use crate::dsp::{LowPass, Oscillator, SmoothedParam, Waveform};

/// Gain the ambient bed fades in to when started.
pub const AMBIENT_FLOOR: f32 = 0.08;
/// Time constant of the fade in and fade out, in seconds.
pub const FADE_TIME_CONSTANT: f32 = 1.5;
/// Time constant of attribute-driven retuning, in seconds.
pub const RETUNE_TIME_CONSTANT: f32 = 0.5;

const INITIAL_CUTOFF_HZ: f32 = 400.0;
const INITIAL_MODULATION_RATE_HZ: f32 = 0.5;
const INITIAL_BASE_PITCH_HZ: f32 = 40.0;
/// Peak deviation the LFO applies to the drone pitch.
const MODULATION_DEPTH_HZ: f32 = 15.0;
/// Samples between filter coefficient refreshes.
const CONTROL_BLOCK: u32 = 64;

/// Parameter set driving the ambient bed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientTargets {
    /// Output gain.
    pub gain: f32,
    /// Low-pass cutoff in Hz; higher sounds harsher.
    pub cutoff_hz: f32,
    /// Pulse rate of the pitch modulation in Hz.
    pub modulation_rate_hz: f32,
    /// Drone pitch in Hz.
    pub base_pitch_hz: f32,
}

impl AmbientTargets {
    /// Linear mapping from the player's fear and frustration.
    #[must_use]
    pub fn from_attributes(fear: f32, frustration: f32) -> Self {
        Self {
            gain: AMBIENT_FLOOR + frustration / 800.0,
            cutoff_hz: INITIAL_CUTOFF_HZ + frustration * 5.0,
            modulation_rate_hz: INITIAL_MODULATION_RATE_HZ + fear / 15.0,
            base_pitch_hz: INITIAL_BASE_PITCH_HZ - fear / 8.0,
        }
    }
}

/// Triangle drone, sine LFO on its pitch, gain, then low-pass.
#[derive(Debug)]
pub(crate) struct AmbientBed {
    sample_rate: f32,
    carrier: Oscillator,
    lfo: Oscillator,
    gain: SmoothedParam,
    cutoff: SmoothedParam,
    modulation_rate: SmoothedParam,
    base_pitch: SmoothedParam,
    filter: LowPass,
    control_counter: u32,
}

impl AmbientBed {
    /// Builds a silent bed; it becomes audible once faded in.
    pub(crate) fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            carrier: Oscillator::new(Waveform::Triangle),
            lfo: Oscillator::new(Waveform::Sine),
            gain: SmoothedParam::new(0.0),
            cutoff: SmoothedParam::new(INITIAL_CUTOFF_HZ),
            modulation_rate: SmoothedParam::new(INITIAL_MODULATION_RATE_HZ),
            base_pitch: SmoothedParam::new(INITIAL_BASE_PITCH_HZ),
            filter: LowPass::new(INITIAL_CUTOFF_HZ, sample_rate),
            control_counter: 0,
        }
    }

    pub(crate) fn fade_to(&mut self, gain: f32) {
        self.gain
            .set_target(gain, FADE_TIME_CONSTANT, self.sample_rate);
    }

    pub(crate) fn retune(&mut self, targets: AmbientTargets) {
        let sample_rate = self.sample_rate;
        self.gain
            .set_target(targets.gain, RETUNE_TIME_CONSTANT, sample_rate);
        self.cutoff
            .set_target(targets.cutoff_hz, RETUNE_TIME_CONSTANT, sample_rate);
        self.modulation_rate
            .set_target(targets.modulation_rate_hz, RETUNE_TIME_CONSTANT, sample_rate);
        self.base_pitch
            .set_target(targets.base_pitch_hz, RETUNE_TIME_CONSTANT, sample_rate);
    }

    /// Values the parameters are gliding toward.
    pub(crate) fn targets(&self) -> AmbientTargets {
        AmbientTargets {
            gain: self.gain.target(),
            cutoff_hz: self.cutoff.target(),
            modulation_rate_hz: self.modulation_rate.target(),
            base_pitch_hz: self.base_pitch.target(),
        }
    }

    /// Values the parameters currently hold.
    pub(crate) fn levels(&self) -> AmbientTargets {
        AmbientTargets {
            gain: self.gain.value(),
            cutoff_hz: self.cutoff.value(),
            modulation_rate_hz: self.modulation_rate.value(),
            base_pitch_hz: self.base_pitch.value(),
        }
    }

    pub(crate) fn next(&mut self) -> f32 {
        let gain = self.gain.next();
        let cutoff = self.cutoff.next();
        let rate = self.modulation_rate.next();
        let pitch = self.base_pitch.next();

        if self.control_counter == 0 {
            self.filter.set_cutoff(cutoff, self.sample_rate);
        }
        self.control_counter = (self.control_counter + 1) % CONTROL_BLOCK;

        let modulation = self.lfo.next(rate, self.sample_rate) * MODULATION_DEPTH_HZ;
        let drone = self.carrier.next(pitch + modulation, self.sample_rate);
        self.filter.process(drone * gain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_until_faded_in() {
        let mut bed = AmbientBed::new(8_000.0);
        let peak = (0..8_000).map(|_| bed.next().abs()).fold(0.0, f32::max);
        assert_eq!(peak, 0.0);

        bed.fade_to(AMBIENT_FLOOR);
        let peak = (0..16_000).map(|_| bed.next().abs()).fold(0.0, f32::max);
        assert!(peak > 0.0);
        assert!(bed.levels().gain < AMBIENT_FLOOR);
    }

    #[test]
    fn retune_glides_rather_than_jumps() {
        let mut bed = AmbientBed::new(8_000.0);
        bed.retune(AmbientTargets::from_attributes(80.0, 100.0));
        let _ = bed.next();

        let levels = bed.levels();
        assert!(levels.cutoff_hz < 401.0, "cutoff jumped to {}", levels.cutoff_hz);
        assert!(levels.base_pitch_hz > 39.9);

        for _ in 0..(8_000 * 5) {
            let _ = bed.next();
        }
        let levels = bed.levels();
        assert!((levels.cutoff_hz - 900.0).abs() < 5.0);
        assert!((levels.base_pitch_hz - 30.0).abs() < 0.1);
    }
}
