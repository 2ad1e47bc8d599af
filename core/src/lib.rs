#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Ferry Crossing engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the audio systems. Adapters submit [`Command`]
//! values describing player intent, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values. The synthesis and
//! narration systems consume event streams and perform their side effects
//! without ever mutating game truth.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Period of the countdown timer while a gameplay stage is active.
pub const COUNTDOWN_PERIOD: Duration = Duration::from_millis(100);

/// Number of countdown tenths contained in a single second.
pub const TENTHS_PER_SECOND: u32 = 10;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests that the audio device is brought up, resuming it if suspended.
    Initialize,
    /// Leaves the start screen for the instructions screen.
    Start,
    /// Skips the instructions and launches a fresh run at stage one.
    DirectPlay,
    /// Leaves the instructions screen and launches a fresh run at stage one.
    BeginJourney,
    /// Mutates the player attributes while a gameplay stage is active.
    UpdateAttributes {
        /// Update to apply to the current snapshot.
        update: AttributeUpdate,
    },
    /// Reports that the active gameplay stage was completed successfully.
    CompleteStage {
        /// Stage the completion originates from; must match the active stage.
        stage: Stage,
        /// Final attributes carried out of the stage.
        attributes: AttributeSnapshot,
        /// Whether the optional bribe was taken. Only counted for stage one.
        bribe_taken: bool,
    },
    /// Reports that the active gameplay stage was failed.
    FailStage {
        /// Stage the failure originates from; must match the active stage.
        stage: Stage,
    },
    /// Launches a fresh run from the result screen.
    Restart,
    /// Returns to the start screen.
    GoHome,
    /// Toggles whether home navigation is blocked by a non-interruptible sequence.
    SetHomeNavigationDisabled {
        /// Whether home navigation should be disabled.
        disabled: bool,
    },
    /// Requests a one-shot sound effect on behalf of the presentation layer.
    PlayEffect {
        /// Effect to play.
        effect: SoundEffect,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the active stage changed.
    StageEntered {
        /// Stage that was active before the transition.
        from: Stage,
        /// Stage that became active.
        to: Stage,
    },
    /// Confirms that the countdown was re-armed for a gameplay stage.
    CountdownArmed {
        /// Gameplay stage the countdown belongs to.
        stage: Stage,
        /// Ceiling the countdown starts from, in tenths of a second.
        ceiling_tenths: u32,
    },
    /// Reports that the countdown decremented.
    CountdownChanged {
        /// Remaining countdown in tenths of a second.
        remaining_tenths: u32,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports that the attribute snapshot was replaced.
    AttributesChanged {
        /// Snapshot before the change.
        previous: AttributeSnapshot,
        /// Snapshot after the change.
        current: AttributeSnapshot,
    },
    /// Reports that the run metrics were updated at a stage boundary.
    MetricsUpdated {
        /// Metrics after the update.
        metrics: RunMetrics,
    },
    /// Reports that home navigation was enabled or disabled.
    HomeNavigationChanged {
        /// Whether home navigation is now disabled.
        disabled: bool,
    },
    /// Instructs the synthesis graph to perform an operation.
    AudioCue(AudioCue),
    /// Requests narrated speech from the narration channel.
    NarrationRequested {
        /// Line to narrate.
        text: String,
        /// Character archetype voicing the line.
        role: NarrationRole,
    },
    /// Reports that a command was ignored because it is not valid in the active stage.
    CommandRejected {
        /// Stage that was active when the command arrived.
        stage: Stage,
        /// Why the command was ignored.
        reason: RejectionReason,
    },
}

/// Reasons a command may be ignored by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The command does not apply to the active stage.
    InvalidTransition,
    /// The command named a stage other than the active one.
    StaleStage,
    /// Home navigation is currently disabled.
    HomeNavigationDisabled,
}

/// Operations the synthesis graph performs in response to world transitions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum AudioCue {
    /// Construct the output device and ambient chain if needed, resuming if suspended.
    Initialize,
    /// Fade the ambient bed in to its audible floor.
    StartAmbient,
    /// Fade the ambient bed out to silence.
    StopAmbient,
    /// Glide the ambient bed toward the parameters derived from the attributes.
    RetuneAmbient {
        /// Current fear attribute.
        fear: f32,
        /// Current frustration attribute.
        frustration: f32,
    },
    /// Fire a one-shot effect.
    Effect(SoundEffect),
}

/// Discrete phases of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Title screen.
    #[default]
    Start,
    /// Instructions screen shown before the first stage.
    Instructions,
    /// First gameplay stage, the muddy walk to the ghat.
    Stage1,
    /// Second gameplay stage.
    Stage2,
    /// Third gameplay stage, the crossing itself.
    Stage3,
    /// Terminal screen summarising the run.
    Result,
}

impl Stage {
    /// Reports whether the stage is one of the three timed gameplay stages.
    #[must_use]
    pub const fn is_gameplay(self) -> bool {
        matches!(self, Self::Stage1 | Self::Stage2 | Self::Stage3)
    }

    /// One-based gameplay index, or zero for non-gameplay stages.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Stage1 => 1,
            Self::Stage2 => 2,
            Self::Stage3 => 3,
            Self::Start | Self::Instructions | Self::Result => 0,
        }
    }

    /// Stable lowercase label for the stage.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Instructions => "instructions",
            Self::Stage1 => "stage1",
            Self::Stage2 => "stage2",
            Self::Stage3 => "stage3",
            Self::Result => "result",
        }
    }

    /// Resolves a stage from its label.
    ///
    /// Unknown labels fall back to [`Stage::Start`] rather than failing, so a
    /// presentation layer that loses track of its stage lands on the title
    /// screen.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "instructions" => Self::Instructions,
            "stage1" | "1" => Self::Stage1,
            "stage2" | "2" => Self::Stage2,
            "stage3" | "3" => Self::Stage3,
            "result" => Self::Result,
            _ => Self::Start,
        }
    }

    /// Gameplay stage that follows this one on success, if any.
    #[must_use]
    pub const fn next_gameplay(self) -> Option<Self> {
        match self {
            Self::Stage1 => Some(Self::Stage2),
            Self::Stage2 => Some(Self::Stage3),
            _ => None,
        }
    }
}

/// Immutable triple of player-state axes.
///
/// No range is enforced; callers clamp if they need bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeSnapshot {
    /// Remaining physical endurance.
    pub stamina: f32,
    /// How frightened the player is.
    pub fear: f32,
    /// How frustrated the player is.
    pub frustration: f32,
}

impl AttributeSnapshot {
    /// Attributes every fresh run starts from.
    pub const INITIAL: Self = Self::new(100.0, 10.0, 0.0);

    /// Creates a snapshot from explicit values.
    #[must_use]
    pub const fn new(stamina: f32, fear: f32, frustration: f32) -> Self {
        Self {
            stamina,
            fear,
            frustration,
        }
    }

    /// Produces the snapshot that results from applying `update`.
    #[must_use]
    pub fn apply(self, update: AttributeUpdate) -> Self {
        match update {
            AttributeUpdate::Absolute(snapshot) => snapshot,
            AttributeUpdate::Delta {
                stamina,
                fear,
                frustration,
            } => Self::new(
                self.stamina + stamina,
                self.fear + fear,
                self.frustration + frustration,
            ),
        }
    }

    /// Delta that turns `self` into `other`.
    #[must_use]
    pub fn delta_to(self, other: Self) -> AttributeUpdate {
        AttributeUpdate::Delta {
            stamina: other.stamina - self.stamina,
            fear: other.fear - self.fear,
            frustration: other.frustration - self.frustration,
        }
    }

    /// Returns a copy with every axis clamped into `min..=max`.
    #[must_use]
    pub fn clamped(self, min: f32, max: f32) -> Self {
        Self::new(
            self.stamina.clamp(min, max),
            self.fear.clamp(min, max),
            self.frustration.clamp(min, max),
        )
    }
}

impl Default for AttributeSnapshot {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Mutation applied to an [`AttributeSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeUpdate {
    /// Replace the snapshot wholesale.
    Absolute(AttributeSnapshot),
    /// Add the provided offsets to each axis.
    Delta {
        /// Offset applied to stamina.
        stamina: f32,
        /// Offset applied to fear.
        fear: f32,
        /// Offset applied to frustration.
        frustration: f32,
    },
}

/// Cumulative counters over one full run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Countdown time consumed across completed stages, in tenths of a second.
    pub time_elapsed_tenths: u32,
    /// Number of failures recorded.
    pub failures: u32,
    /// Number of bribes taken during stage one.
    pub bribes_taken: u32,
    /// Whether the run reached the result screen through success.
    pub survived: bool,
}

impl RunMetrics {
    /// Consumed countdown time expressed in seconds.
    #[must_use]
    pub fn time_elapsed_seconds(&self) -> f32 {
        tenths_to_seconds(self.time_elapsed_tenths)
    }
}

/// Countdown ceilings for the three gameplay stages, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageCeilings {
    /// Ceiling for stage one.
    pub stage1: f32,
    /// Ceiling for stage two.
    pub stage2: f32,
    /// Ceiling for stage three.
    pub stage3: f32,
}

impl StageCeilings {
    /// Ceiling in tenths of a second for a gameplay stage; zero otherwise.
    #[must_use]
    pub fn tenths_for(&self, stage: Stage) -> u32 {
        let seconds = match stage {
            Stage::Stage1 => self.stage1,
            Stage::Stage2 => self.stage2,
            Stage::Stage3 => self.stage3,
            Stage::Start | Stage::Instructions | Stage::Result => 0.0,
        };
        seconds_to_tenths(seconds)
    }
}

impl Default for StageCeilings {
    fn default() -> Self {
        Self {
            stage1: 60.0,
            stage2: 60.0,
            stage3: 60.0,
        }
    }
}

/// Converts seconds to whole tenths, rounding to the nearest tenth and flooring at zero.
#[must_use]
pub fn seconds_to_tenths(seconds: f32) -> u32 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * TENTHS_PER_SECOND as f32).round() as u32
}

/// Converts whole tenths to seconds.
#[must_use]
pub fn tenths_to_seconds(tenths: u32) -> f32 {
    tenths as f32 / TENTHS_PER_SECOND as f32
}

/// Ground a footstep lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Footing {
    /// Firm ground; a round, dull thud.
    Firm,
    /// Soft, muddy ground; a buzzier squelch.
    Mud,
}

/// One-shot sound effects available to the presentation layer and the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// A single step.
    Footstep(Footing),
    /// A burst of strained effort.
    Struggle,
    /// Relief as someone lends a hand.
    HelpingHand,
    /// Confirmation chirp for menu actions.
    Click,
    /// Low buzz signalling failure.
    Alarm,
}

impl SoundEffect {
    /// Resolves an effect from a short name used by scripts.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "step" | "footstep" => Some(Self::Footstep(Footing::Firm)),
            "mud" | "mudstep" => Some(Self::Footstep(Footing::Mud)),
            "struggle" => Some(Self::Struggle),
            "help" | "helping-hand" => Some(Self::HelpingHand),
            "click" => Some(Self::Click),
            "alarm" => Some(Self::Alarm),
            _ => None,
        }
    }
}

/// Character archetypes that can voice a narrated line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationRole {
    /// Dockworker hauling passengers through the mud.
    Boatman,
    /// Ticket tout working the queue.
    Broker,
    /// Male passenger.
    PassengerMale,
    /// Female passenger.
    PassengerFemale,
    /// Passenger demanding special treatment.
    Vip,
    /// Narrator announcing outcomes.
    System,
}

impl NarrationRole {
    /// Every role, in table order.
    pub const ALL: [Self; 6] = [
        Self::Boatman,
        Self::Broker,
        Self::PassengerMale,
        Self::PassengerFemale,
        Self::Vip,
        Self::System,
    ];

    /// Voice persona assigned to the role.
    #[must_use]
    pub const fn persona(self) -> Persona {
        match self {
            Self::Boatman | Self::Broker => Persona::A,
            Self::PassengerMale => Persona::B,
            Self::PassengerFemale => Persona::C,
            Self::Vip => Persona::D,
            Self::System => Persona::E,
        }
    }

    /// Emotional framing passed to the speech backend alongside the line.
    #[must_use]
    pub const fn framing(self) -> &'static str {
        match self {
            Self::Boatman => "a rough, LOUD, gritty dockworker shouting through the mud and rain",
            Self::Broker => "a shady, greedy, LOUD hustler shouting to cut the line",
            Self::PassengerMale => "a PANICKED, LOUD, exhausted man screaming for help",
            Self::PassengerFemale => {
                "a TERRIFIED, LOUD, crying woman caught in a life-threatening storm"
            }
            Self::Vip => "an arrogant, LOUD, commanding passenger demanding priority",
            Self::System => "a clear, celebratory and authoritative narrator",
        }
    }

    /// Stable snake_case label for the role.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Boatman => "boatman",
            Self::Broker => "broker",
            Self::PassengerMale => "passenger_male",
            Self::PassengerFemale => "passenger_female",
            Self::Vip => "vip",
            Self::System => "system",
        }
    }

    /// Resolves a role from its label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.label() == label.trim())
    }
}

/// Synthesized voice identities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Persona {
    /// Deep, rough voice shared by the boatman and broker.
    A,
    /// Male passenger voice.
    B,
    /// Female passenger voice.
    C,
    /// Commanding voice.
    D,
    /// Narrator voice.
    E,
}

impl Persona {
    /// Prebuilt voice identifier understood by the speech backend.
    #[must_use]
    pub const fn voice_name(self) -> &'static str {
        match self {
            Self::A => "Charon",
            Self::B => "Puck",
            Self::C => "Kore",
            Self::D => "Fenrir",
            Self::E => "Zephyr",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        seconds_to_tenths, AttributeSnapshot, AttributeUpdate, NarrationRole, Persona, RunMetrics,
        SoundEffect, Stage, StageCeilings,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn apply_leaves_previous_snapshot_untouched() {
        let previous = AttributeSnapshot::INITIAL;
        let next = previous.apply(AttributeUpdate::Delta {
            stamina: -15.0,
            fear: 5.0,
            frustration: 20.0,
        });

        assert_eq!(previous, AttributeSnapshot::new(100.0, 10.0, 0.0));
        assert_eq!(next, AttributeSnapshot::new(85.0, 15.0, 20.0));
    }

    #[test]
    fn absolute_update_replaces_every_axis() {
        let target = AttributeSnapshot::new(1.0, 2.0, 3.0);
        let next = AttributeSnapshot::INITIAL.apply(AttributeUpdate::Absolute(target));
        assert_eq!(next, target);
    }

    #[test]
    fn delta_to_reproduces_target() {
        let from = AttributeSnapshot::new(80.0, 30.0, 12.5);
        let to = AttributeSnapshot::new(60.0, 45.0, 10.0);
        assert_eq!(from.apply(from.delta_to(to)), to);
    }

    #[test]
    fn clamped_bounds_each_axis() {
        let wild = AttributeSnapshot::new(140.0, -3.0, 55.0);
        assert_eq!(
            wild.clamped(0.0, 100.0),
            AttributeSnapshot::new(100.0, 0.0, 55.0)
        );
    }

    #[test]
    fn unknown_stage_label_falls_back_to_start() {
        assert_eq!(Stage::from_label("stage2"), Stage::Stage2);
        assert_eq!(Stage::from_label(" Result "), Stage::Result);
        assert_eq!(Stage::from_label("harbour"), Stage::Start);
    }

    #[test]
    fn ceilings_round_to_whole_tenths() {
        let ceilings = StageCeilings {
            stage1: 45.0,
            stage2: 30.05,
            stage3: 12.34,
        };
        assert_eq!(ceilings.tenths_for(Stage::Stage1), 450);
        assert_eq!(ceilings.tenths_for(Stage::Stage3), 123);
        assert_eq!(ceilings.tenths_for(Stage::Result), 0);
        assert_eq!(seconds_to_tenths(-4.0), 0);
        assert_eq!(seconds_to_tenths(f32::NAN), 0);
    }

    #[test]
    fn persona_table_matches_roles() {
        assert_eq!(NarrationRole::Boatman.persona(), Persona::A);
        assert_eq!(NarrationRole::Broker.persona(), Persona::A);
        assert_eq!(NarrationRole::PassengerMale.persona(), Persona::B);
        assert_eq!(NarrationRole::PassengerFemale.persona(), Persona::C);
        assert_eq!(NarrationRole::Vip.persona(), Persona::D);
        assert_eq!(NarrationRole::System.persona(), Persona::E);

        for role in NarrationRole::ALL {
            assert_eq!(NarrationRole::from_label(role.label()), Some(role));
        }
    }

    #[test]
    fn effect_names_resolve() {
        assert_eq!(SoundEffect::from_name("alarm"), Some(SoundEffect::Alarm));
        assert_eq!(SoundEffect::from_name("kazoo"), None);
    }

    #[test]
    fn metrics_round_trip_through_bincode() {
        let metrics = RunMetrics {
            time_elapsed_tenths: 550,
            failures: 1,
            bribes_taken: 1,
            survived: false,
        };
        assert_round_trip(&metrics);
        assert!((metrics.time_elapsed_seconds() - 55.0).abs() < f32::EPSILON);
    }

    #[test]
    fn attribute_snapshot_round_trips_through_bincode() {
        assert_round_trip(&AttributeSnapshot::new(72.5, 31.0, 8.25));
    }
}
