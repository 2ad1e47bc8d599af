#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative stage progression for Ferry Crossing.
//!
//! The world owns the active stage, the per-stage countdown, the player's
//! attribute snapshot and the run metrics. Every mutation arrives as a
//! [`Command`] through [`apply`], and every observable consequence leaves as an
//! [`Event`], including the audio cues and narration requests the systems act
//! on. Commands that do not fit the active stage leave the state untouched.

mod countdown;

use ferry_crossing_core::{
    AttributeSnapshot, AudioCue, Command, Event, NarrationRole, RejectionReason, RunMetrics,
    SoundEffect, Stage, StageCeilings,
};

use self::countdown::Countdown;

const DEFAULT_SUCCESS_LINE: &str =
    "You made it across the river. Welcome home to Sandwip, the crossing is yours!";
const DEFAULT_FAILURE_LINE: &str = "The ghat waits for no one. You have been beaten. Try again!";

/// Configuration parameters required to construct the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    ceilings: StageCeilings,
    success_line: String,
    failure_line: String,
}

impl Config {
    /// Creates a configuration with explicit ceilings and narration lines.
    #[must_use]
    pub fn new(
        ceilings: StageCeilings,
        success_line: impl Into<String>,
        failure_line: impl Into<String>,
    ) -> Self {
        Self {
            ceilings,
            success_line: success_line.into(),
            failure_line: failure_line.into(),
        }
    }

    /// Returns a copy of the configuration using the provided ceilings.
    #[must_use]
    pub fn with_ceilings(mut self, ceilings: StageCeilings) -> Self {
        self.ceilings = ceilings;
        self
    }

    /// Countdown ceilings for the gameplay stages.
    #[must_use]
    pub const fn ceilings(&self) -> &StageCeilings {
        &self.ceilings
    }

    /// Line narrated when the final stage is completed.
    #[must_use]
    pub fn success_line(&self) -> &str {
        &self.success_line
    }

    /// Line narrated when a gameplay stage is failed.
    #[must_use]
    pub fn failure_line(&self) -> &str {
        &self.failure_line
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            StageCeilings::default(),
            DEFAULT_SUCCESS_LINE,
            DEFAULT_FAILURE_LINE,
        )
    }
}

/// Represents the authoritative Ferry Crossing world state.
#[derive(Debug)]
pub struct World {
    config: Config,
    stage: Stage,
    attributes: AttributeSnapshot,
    metrics: RunMetrics,
    countdown: Countdown,
    home_navigation_disabled: bool,
}

impl World {
    /// Creates a world on the start screen using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a world on the start screen using the provided configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            stage: Stage::Start,
            attributes: AttributeSnapshot::INITIAL,
            metrics: RunMetrics::default(),
            countdown: Countdown::default(),
            home_navigation_disabled: false,
        }
    }

    fn enter(&mut self, to: Stage, out_events: &mut Vec<Event>) {
        let from = self.stage;
        self.stage = to;
        log::debug!("stage transition {} -> {}", from.label(), to.label());
        out_events.push(Event::StageEntered { from, to });

        if to.is_gameplay() {
            let ceiling_tenths = self.config.ceilings.tenths_for(to);
            self.countdown.arm(ceiling_tenths);
            out_events.push(Event::CountdownArmed {
                stage: to,
                ceiling_tenths,
            });
        } else {
            self.countdown.freeze();
        }

        self.set_home_navigation_disabled(false, out_events);
    }

    fn begin_run(&mut self, out_events: &mut Vec<Event>) {
        out_events.push(Event::AudioCue(AudioCue::Initialize));
        out_events.push(Event::AudioCue(AudioCue::Effect(SoundEffect::Click)));
        out_events.push(Event::AudioCue(AudioCue::StartAmbient));

        self.replace_attributes(AttributeSnapshot::INITIAL, out_events);
        self.metrics = RunMetrics::default();
        self.publish_metrics(out_events);
        self.enter(Stage::Stage1, out_events);
    }

    fn replace_attributes(&mut self, current: AttributeSnapshot, out_events: &mut Vec<Event>) {
        let previous = self.attributes;
        self.attributes = current;
        out_events.push(Event::AttributesChanged { previous, current });
    }

    fn publish_metrics(&self, out_events: &mut Vec<Event>) {
        out_events.push(Event::MetricsUpdated {
            metrics: self.metrics,
        });
    }

    fn narrate(&self, text: &str, out_events: &mut Vec<Event>) {
        out_events.push(Event::NarrationRequested {
            text: text.to_owned(),
            role: NarrationRole::System,
        });
    }

    fn set_home_navigation_disabled(&mut self, disabled: bool, out_events: &mut Vec<Event>) {
        if self.home_navigation_disabled == disabled {
            return;
        }
        self.home_navigation_disabled = disabled;
        out_events.push(Event::HomeNavigationChanged { disabled });
    }

    fn reject(&self, command: &Command, reason: RejectionReason, out_events: &mut Vec<Event>) {
        log::warn!(
            "ignoring {command:?} in stage {}: {reason:?}",
            self.stage.label()
        );
        out_events.push(Event::CommandRejected {
            stage: self.stage,
            reason,
        });
    }

    /// Validates that `stage` names the active gameplay stage.
    fn check_active_gameplay(&self, stage: Stage) -> Result<(), RejectionReason> {
        if !self.stage.is_gameplay() {
            return Err(RejectionReason::InvalidTransition);
        }
        if stage != self.stage {
            return Err(RejectionReason::StaleStage);
        }
        Ok(())
    }

    fn complete_stage(
        &mut self,
        attributes: AttributeSnapshot,
        bribe_taken: bool,
        out_events: &mut Vec<Event>,
    ) {
        out_events.push(Event::AudioCue(AudioCue::Effect(SoundEffect::Click)));

        self.metrics.time_elapsed_tenths = self
            .metrics
            .time_elapsed_tenths
            .saturating_add(self.countdown.consumed());
        if bribe_taken && self.stage == Stage::Stage1 {
            self.metrics.bribes_taken = self.metrics.bribes_taken.saturating_add(1);
        }
        self.replace_attributes(attributes, out_events);

        match self.stage.next_gameplay() {
            Some(next) => {
                self.publish_metrics(out_events);
                self.enter(next, out_events);
            }
            None => {
                out_events.push(Event::AudioCue(AudioCue::StopAmbient));
                self.narrate(self.config.success_line(), out_events);
                self.metrics.survived = true;
                self.publish_metrics(out_events);
                self.enter(Stage::Result, out_events);
            }
        }
    }

    fn fail_stage(&mut self, out_events: &mut Vec<Event>) {
        out_events.push(Event::AudioCue(AudioCue::Effect(SoundEffect::Alarm)));
        out_events.push(Event::AudioCue(AudioCue::StopAmbient));
        self.narrate(self.config.failure_line(), out_events);

        self.metrics.failures = self.metrics.failures.saturating_add(1);
        self.metrics.survived = false;
        self.publish_metrics(out_events);
        self.enter(Stage::Result, out_events);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Initialize => out_events.push(Event::AudioCue(AudioCue::Initialize)),
        Command::Start => {
            if world.stage != Stage::Start {
                world.reject(&command, RejectionReason::InvalidTransition, out_events);
                return;
            }
            out_events.push(Event::AudioCue(AudioCue::Initialize));
            out_events.push(Event::AudioCue(AudioCue::Effect(SoundEffect::Click)));
            world.enter(Stage::Instructions, out_events);
        }
        Command::DirectPlay | Command::BeginJourney | Command::Restart => {
            let expected = match command {
                Command::DirectPlay => Stage::Start,
                Command::BeginJourney => Stage::Instructions,
                _ => Stage::Result,
            };
            if world.stage != expected {
                world.reject(&command, RejectionReason::InvalidTransition, out_events);
                return;
            }
            world.begin_run(out_events);
        }
        Command::UpdateAttributes { update } => {
            if !world.stage.is_gameplay() {
                world.reject(&command, RejectionReason::InvalidTransition, out_events);
                return;
            }
            let current = world.attributes.apply(update);
            world.replace_attributes(current, out_events);
            out_events.push(Event::AudioCue(AudioCue::RetuneAmbient {
                fear: current.fear,
                frustration: current.frustration,
            }));
        }
        Command::CompleteStage {
            stage,
            attributes,
            bribe_taken,
        } => match world.check_active_gameplay(stage) {
            Ok(()) => world.complete_stage(attributes, bribe_taken, out_events),
            Err(reason) => world.reject(&command, reason, out_events),
        },
        Command::FailStage { stage } => match world.check_active_gameplay(stage) {
            Ok(()) => world.fail_stage(out_events),
            Err(reason) => world.reject(&command, reason, out_events),
        },
        Command::GoHome => {
            if world.stage == Stage::Start {
                world.reject(&command, RejectionReason::InvalidTransition, out_events);
                return;
            }
            if world.stage.is_gameplay() && world.home_navigation_disabled {
                world.reject(&command, RejectionReason::HomeNavigationDisabled, out_events);
                return;
            }
            out_events.push(Event::AudioCue(AudioCue::Effect(SoundEffect::Click)));
            out_events.push(Event::AudioCue(AudioCue::StopAmbient));
            world.enter(Stage::Start, out_events);
        }
        Command::SetHomeNavigationDisabled { disabled } => {
            if !world.stage.is_gameplay() {
                world.reject(&command, RejectionReason::InvalidTransition, out_events);
                return;
            }
            world.set_home_navigation_disabled(disabled, out_events);
        }
        Command::PlayEffect { effect } => {
            out_events.push(Event::AudioCue(AudioCue::Effect(effect)));
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            if let Some(remaining_tenths) = world.countdown.advance(dt) {
                out_events.push(Event::CountdownChanged { remaining_tenths });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use ferry_crossing_core::{tenths_to_seconds, AttributeSnapshot, RunMetrics, Stage};

    use super::{Config, World};

    /// Stage currently active.
    #[must_use]
    pub fn stage(world: &World) -> Stage {
        world.stage
    }

    /// Latest attribute snapshot.
    #[must_use]
    pub fn attributes(world: &World) -> AttributeSnapshot {
        world.attributes
    }

    /// Metrics accumulated over the current run.
    #[must_use]
    pub fn metrics(world: &World) -> RunMetrics {
        world.metrics
    }

    /// Remaining countdown in tenths of a second.
    #[must_use]
    pub fn countdown_tenths(world: &World) -> u32 {
        world.countdown.remaining()
    }

    /// Remaining countdown in seconds.
    #[must_use]
    pub fn countdown_seconds(world: &World) -> f32 {
        tenths_to_seconds(world.countdown.remaining())
    }

    /// Whether the countdown is currently decrementing.
    #[must_use]
    pub fn countdown_running(world: &World) -> bool {
        world.countdown.is_running()
    }

    /// Whether a stage has blocked home navigation.
    #[must_use]
    pub fn home_navigation_disabled(world: &World) -> bool {
        world.home_navigation_disabled
    }

    /// Whether a timed gameplay stage is active.
    #[must_use]
    pub fn is_gameplay(world: &World) -> bool {
        world.stage.is_gameplay()
    }

    /// One-based index of the active gameplay stage, zero outside gameplay.
    #[must_use]
    pub fn stage_index(world: &World) -> u8 {
        world.stage.index()
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &Config {
        &world.config
    }

    /// Captures everything a heads-up display needs in one read.
    #[must_use]
    pub fn hud(world: &World) -> HudView {
        HudView {
            stage: world.stage,
            stage_index: world.stage.index(),
            attributes: world.attributes,
            countdown_seconds: countdown_seconds(world),
            home_navigation_disabled: world.home_navigation_disabled,
            visible: !matches!(world.stage, Stage::Start | Stage::Result),
            show_attributes: world.stage.is_gameplay(),
        }
    }

    /// Read-only snapshot for heads-up displays.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct HudView {
        /// Active stage.
        pub stage: Stage,
        /// One-based gameplay index, zero outside gameplay.
        pub stage_index: u8,
        /// Latest attributes.
        pub attributes: AttributeSnapshot,
        /// Remaining countdown in seconds.
        pub countdown_seconds: f32,
        /// Whether the home button should be disabled.
        pub home_navigation_disabled: bool,
        /// Whether the HUD should be shown at all.
        pub visible: bool,
        /// Whether the attribute gauges should be shown.
        pub show_attributes: bool,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ferry_crossing_core::{AudioCue, Command, Event, RejectionReason, Stage};

    use super::{apply, query, World};

    #[test]
    fn start_leads_to_instructions_with_click() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::Start, &mut events);

        assert_eq!(query::stage(&world), Stage::Instructions);
        assert!(events.contains(&Event::AudioCue(AudioCue::Initialize)));
        assert!(!query::countdown_running(&world));
    }

    #[test]
    fn restart_outside_result_is_rejected() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::Restart, &mut events);

        assert_eq!(query::stage(&world), Stage::Start);
        assert_eq!(
            events,
            vec![Event::CommandRejected {
                stage: Stage::Start,
                reason: RejectionReason::InvalidTransition,
            }]
        );
    }

    #[test]
    fn ticks_outside_gameplay_only_advance_time() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                dt: Duration::from_secs(1)
            }]
        );
    }
}
