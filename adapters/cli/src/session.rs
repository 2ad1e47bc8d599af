//! Wiring between the world, the audio systems and the terminal.

use std::time::Duration;

use ferry_crossing_core::{Command, Event, RunMetrics, TENTHS_PER_SECOND};
use ferry_crossing_system_narration::Narrator;
use ferry_crossing_system_synthesis::SynthesisGraph;
use ferry_crossing_world::{self as world, query, World};

/// Countdown values announced while a stage is running, in tenths.
const COUNTDOWN_ANNOUNCE_INTERVAL: u32 = 10 * TENTHS_PER_SECOND;

/// One running game: the world plus the systems reacting to its events.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    graph: SynthesisGraph,
    narrator: Narrator,
    pump_audio: bool,
    frame_debt: f64,
    scratch: Vec<f32>,
}

impl Session {
    /// `pump_audio` renders the destination on every advance; devices that
    /// pull frames on their own leave it off.
    pub(crate) fn new(
        world: World,
        graph: SynthesisGraph,
        narrator: Narrator,
        pump_audio: bool,
    ) -> Self {
        Self {
            world,
            graph,
            narrator,
            pump_audio,
            frame_debt: 0.0,
            scratch: Vec::new(),
        }
    }

    /// Applies `command` and lets the audio systems react to the result.
    pub(crate) fn submit(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.graph.handle(&events);
        self.narrator.handle(&events);
        events
    }

    /// Advances simulated time by `dt`.
    pub(crate) fn advance(&mut self, dt: Duration) -> Vec<Event> {
        let events = self.submit(Command::Tick { dt });
        self.pump(dt);
        events
    }

    /// Renders `dt` worth of audio without touching the world clock.
    pub(crate) fn pump(&mut self, dt: Duration) {
        if !self.pump_audio {
            return;
        }
        let Some(destination) = self.graph.destination() else {
            return;
        };

        self.frame_debt += dt.as_secs_f64() * f64::from(destination.sample_rate());
        let frames = self.frame_debt.floor();
        self.frame_debt -= frames;
        self.scratch.resize(frames as usize, 0.0);
        destination.render(&mut self.scratch);
    }

    /// Whether a narrated line is still being fetched or played.
    pub(crate) fn narration_pending(&self) -> bool {
        self.narrator.is_busy()
    }

    /// Multi-line summary of the HUD, the run metrics and the audio state.
    pub(crate) fn status(&self) -> String {
        let hud = query::hud(&self.world);
        let attributes = hud.attributes;
        let progress = if hud.stage_index > 0 {
            format!(" ({}/3)", hud.stage_index)
        } else {
            String::new()
        };
        let home = if hud.home_navigation_disabled {
            "locked"
        } else {
            "open"
        };
        let audio = if self.graph.is_initialized() {
            format!("ready, {} voices", self.graph.active_voices())
        } else {
            "silent".to_owned()
        };
        let narration = if self.narrator.is_busy() {
            "speaking"
        } else {
            "idle"
        };

        format!(
            "stage: {}{progress}  countdown: {:.1}s  home: {home}\n\
             attributes: stamina {:.1}  fear {:.1}  frustration {:.1}\n\
             {}\n\
             audio: {audio}  narration: {narration}",
            hud.stage.label(),
            hud.countdown_seconds,
            attributes.stamina,
            attributes.fear,
            attributes.frustration,
            describe_metrics(&query::metrics(&self.world)),
        )
    }
}

/// Human-readable line for the events worth showing; `None` for the rest.
pub(crate) fn describe(event: &Event) -> Option<String> {
    match event {
        Event::StageEntered { from, to } => Some(format!("{} -> {}", from.label(), to.label())),
        Event::CountdownChanged { remaining_tenths } => {
            if *remaining_tenths == 0 {
                Some("countdown expired".to_owned())
            } else if remaining_tenths % COUNTDOWN_ANNOUNCE_INTERVAL == 0 {
                Some(format!(
                    "{}s remaining",
                    remaining_tenths / TENTHS_PER_SECOND
                ))
            } else {
                None
            }
        }
        Event::AttributesChanged { current, .. } => Some(format!(
            "stamina {:.1}  fear {:.1}  frustration {:.1}",
            current.stamina, current.fear, current.frustration
        )),
        Event::MetricsUpdated { metrics } => Some(describe_metrics(metrics)),
        Event::HomeNavigationChanged { disabled } => Some(if *disabled {
            "home navigation locked".to_owned()
        } else {
            "home navigation unlocked".to_owned()
        }),
        Event::NarrationRequested { text, role } => Some(format!("[{}] {text}", role.label())),
        Event::CommandRejected { stage, reason } => {
            Some(format!("ignored in {}: {reason:?}", stage.label()))
        }
        Event::CountdownArmed { .. } | Event::TimeAdvanced { .. } | Event::AudioCue(_) => None,
    }
}

fn describe_metrics(metrics: &RunMetrics) -> String {
    format!(
        "run: elapsed {:.1}s  failures {}  bribes {}  survived {}",
        metrics.time_elapsed_seconds(),
        metrics.failures,
        metrics.bribes_taken,
        if metrics.survived { "yes" } else { "no" }
    )
}
