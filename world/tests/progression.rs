use std::time::Duration;

use ferry_crossing_core::{
    AttributeSnapshot, AttributeUpdate, AudioCue, Command, Event, NarrationRole, RejectionReason,
    RunMetrics, SoundEffect, Stage, StageCeilings,
};
use ferry_crossing_world::{self as world, query, Config, World};

fn world_with_ceilings(stage1: f32, stage2: f32, stage3: f32) -> World {
    World::with_config(Config::default().with_ceilings(StageCeilings {
        stage1,
        stage2,
        stage3,
    }))
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn tick(world: &mut World, dt: Duration) -> Vec<Event> {
    run(world, Command::Tick { dt })
}

fn complete(world: &mut World, stage: Stage, bribe_taken: bool) -> Vec<Event> {
    let attributes = query::attributes(world);
    run(
        world,
        Command::CompleteStage {
            stage,
            attributes,
            bribe_taken,
        },
    )
}

fn enter_stage1(world: &mut World) {
    let _ = run(world, Command::DirectPlay);
    assert_eq!(query::stage(world), Stage::Stage1);
}

#[test]
fn elapsed_time_sums_consumed_countdown_across_stages() {
    let mut world = world_with_ceilings(60.0, 60.0, 60.0);
    enter_stage1(&mut world);

    let _ = tick(&mut world, Duration::from_secs(15));
    assert_eq!(query::countdown_tenths(&world), 450);
    let _ = complete(&mut world, Stage::Stage1, false);

    assert_eq!(query::stage(&world), Stage::Stage2);
    assert_eq!(query::countdown_tenths(&world), 600);
    let _ = tick(&mut world, Duration::from_secs(10));
    let _ = complete(&mut world, Stage::Stage2, false);

    let _ = tick(&mut world, Duration::from_secs(30));
    assert!((query::countdown_seconds(&world) - 30.0).abs() < f32::EPSILON);
    let events = complete(&mut world, Stage::Stage3, false);

    let metrics = query::metrics(&world);
    assert_eq!(query::stage(&world), Stage::Result);
    assert_eq!(metrics.time_elapsed_tenths, 550);
    assert!((metrics.time_elapsed_seconds() - 55.0).abs() < f32::EPSILON);
    assert!(metrics.survived);
    assert_eq!(metrics.failures, 0);

    assert!(events.contains(&Event::AudioCue(AudioCue::StopAmbient)));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::NarrationRequested {
            role: NarrationRole::System,
            ..
        }
    )));
}

#[test]
fn many_small_ticks_do_not_drift() {
    let mut world = world_with_ceilings(60.0, 60.0, 60.0);
    enter_stage1(&mut world);

    for _ in 0..150 {
        let _ = tick(&mut world, Duration::from_millis(100));
    }
    assert_eq!(query::countdown_tenths(&world), 450);
}

#[test]
fn bribe_counts_only_when_flag_is_set() {
    let mut world = World::new();
    enter_stage1(&mut world);
    let _ = complete(&mut world, Stage::Stage1, true);
    assert_eq!(query::metrics(&world).bribes_taken, 1);

    let _ = complete(&mut world, Stage::Stage2, true);
    assert_eq!(
        query::metrics(&world).bribes_taken,
        1,
        "bribe flag outside stage one is ignored"
    );

    let mut world = World::new();
    enter_stage1(&mut world);
    let _ = complete(&mut world, Stage::Stage1, false);
    assert_eq!(query::metrics(&world).bribes_taken, 0);
}

#[test]
fn failure_from_any_gameplay_stage_reaches_result() {
    for failing in [Stage::Stage1, Stage::Stage2, Stage::Stage3] {
        let mut world = World::new();
        enter_stage1(&mut world);
        let mut stage = Stage::Stage1;
        while stage != failing {
            let _ = complete(&mut world, stage, false);
            stage = query::stage(&world);
        }

        let events = run(&mut world, Command::FailStage { stage: failing });

        let metrics = query::metrics(&world);
        assert_eq!(query::stage(&world), Stage::Result, "failing {failing:?}");
        assert_eq!(metrics.failures, 1);
        assert!(!metrics.survived);
        assert_eq!(
            &events[..2],
            &[
                Event::AudioCue(AudioCue::Effect(SoundEffect::Alarm)),
                Event::AudioCue(AudioCue::StopAmbient),
            ]
        );
        assert!(matches!(
            events[2],
            Event::NarrationRequested {
                role: NarrationRole::System,
                ..
            }
        ));
    }
}

#[test]
fn failure_is_terminal_until_restart() {
    let mut world = World::new();
    enter_stage1(&mut world);
    let _ = run(
        &mut world,
        Command::FailStage {
            stage: Stage::Stage1,
        },
    );

    let events = run(
        &mut world,
        Command::FailStage {
            stage: Stage::Stage1,
        },
    );
    assert_eq!(query::metrics(&world).failures, 1);
    assert_eq!(
        events,
        vec![Event::CommandRejected {
            stage: Stage::Result,
            reason: RejectionReason::InvalidTransition,
        }]
    );
}

#[test]
fn restart_resets_attributes_and_metrics() {
    let mut world = World::new();
    enter_stage1(&mut world);
    let _ = run(
        &mut world,
        Command::UpdateAttributes {
            update: AttributeUpdate::Absolute(AttributeSnapshot::new(40.0, 70.0, 55.0)),
        },
    );
    let _ = tick(&mut world, Duration::from_secs(4));
    let _ = complete(&mut world, Stage::Stage1, true);
    let _ = run(
        &mut world,
        Command::FailStage {
            stage: Stage::Stage2,
        },
    );
    assert_ne!(query::metrics(&world), RunMetrics::default());

    let events = run(&mut world, Command::Restart);

    assert_eq!(query::stage(&world), Stage::Stage1);
    assert_eq!(
        query::attributes(&world),
        AttributeSnapshot::new(100.0, 10.0, 0.0)
    );
    assert_eq!(query::metrics(&world), RunMetrics::default());
    assert_eq!(query::countdown_tenths(&world), 600);
    assert!(events.contains(&Event::AudioCue(AudioCue::StartAmbient)));
}

#[test]
fn home_from_result_returns_to_start() {
    let mut world = World::new();
    enter_stage1(&mut world);
    let _ = run(
        &mut world,
        Command::FailStage {
            stage: Stage::Stage1,
        },
    );

    let events = run(&mut world, Command::GoHome);
    assert_eq!(query::stage(&world), Stage::Start);
    assert!(events.contains(&Event::AudioCue(AudioCue::StopAmbient)));
}

#[test]
fn attribute_updates_retune_ambient_with_new_snapshot() {
    let mut world = World::new();
    enter_stage1(&mut world);

    let events = run(
        &mut world,
        Command::UpdateAttributes {
            update: AttributeUpdate::Delta {
                stamina: -10.0,
                fear: 20.0,
                frustration: 8.0,
            },
        },
    );

    let previous = AttributeSnapshot::INITIAL;
    let current = AttributeSnapshot::new(90.0, 30.0, 8.0);
    assert_eq!(
        events,
        vec![
            Event::AttributesChanged { previous, current },
            Event::AudioCue(AudioCue::RetuneAmbient {
                fear: 30.0,
                frustration: 8.0,
            }),
        ]
    );
    assert_eq!(query::attributes(&world), current);
}

#[test]
fn attribute_updates_outside_gameplay_are_ignored() {
    let mut world = World::new();
    let events = run(
        &mut world,
        Command::UpdateAttributes {
            update: AttributeUpdate::Absolute(AttributeSnapshot::new(1.0, 1.0, 1.0)),
        },
    );

    assert_eq!(query::attributes(&world), AttributeSnapshot::INITIAL);
    assert!(matches!(events[..], [Event::CommandRejected { .. }]));
}

#[test]
fn countdown_freezes_outside_gameplay_and_never_goes_negative() {
    let mut world = world_with_ceilings(2.0, 60.0, 60.0);
    enter_stage1(&mut world);

    let _ = tick(&mut world, Duration::from_secs(30));
    assert_eq!(query::countdown_tenths(&world), 0);
    assert_eq!(
        query::stage(&world),
        Stage::Stage1,
        "an exhausted countdown does not transition on its own"
    );

    let _ = run(
        &mut world,
        Command::FailStage {
            stage: Stage::Stage1,
        },
    );
    let frozen = query::countdown_tenths(&world);
    for _ in 0..3 {
        let events = tick(&mut world, Duration::from_secs(5));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::CountdownChanged { .. })));
    }
    assert_eq!(query::countdown_tenths(&world), frozen);
    assert!(!query::countdown_running(&world));
}

#[test]
fn stale_completion_is_ignored() {
    let mut world = World::new();
    enter_stage1(&mut world);
    let _ = complete(&mut world, Stage::Stage1, false);

    let events = complete(&mut world, Stage::Stage1, true);
    assert_eq!(query::stage(&world), Stage::Stage2);
    assert_eq!(query::metrics(&world).bribes_taken, 0);
    assert_eq!(
        events,
        vec![Event::CommandRejected {
            stage: Stage::Stage2,
            reason: RejectionReason::StaleStage,
        }]
    );
}

#[test]
fn disabled_home_navigation_blocks_leaving_gameplay() {
    let mut world = World::new();
    enter_stage1(&mut world);
    let _ = complete(&mut world, Stage::Stage1, false);
    let _ = complete(&mut world, Stage::Stage2, false);

    let events = run(
        &mut world,
        Command::SetHomeNavigationDisabled { disabled: true },
    );
    assert_eq!(
        events,
        vec![Event::HomeNavigationChanged { disabled: true }]
    );
    assert!(query::hud(&world).home_navigation_disabled);

    let events = run(&mut world, Command::GoHome);
    assert_eq!(query::stage(&world), Stage::Stage3);
    assert!(matches!(
        events[..],
        [Event::CommandRejected {
            reason: RejectionReason::HomeNavigationDisabled,
            ..
        }]
    ));

    let events = complete(&mut world, Stage::Stage3, false);
    assert!(events.contains(&Event::HomeNavigationChanged { disabled: false }));
    assert!(!query::home_navigation_disabled(&world));
}

#[test]
fn instructions_path_begins_a_fresh_run() {
    let mut world = World::new();
    let _ = run(&mut world, Command::Start);
    assert!(query::hud(&world).visible);
    assert!(!query::hud(&world).show_attributes);

    let _ = run(&mut world, Command::BeginJourney);
    let hud = query::hud(&world);
    assert_eq!(hud.stage, Stage::Stage1);
    assert_eq!(hud.stage_index, 1);
    assert!(hud.show_attributes);
    assert!((hud.countdown_seconds - 60.0).abs() < f32::EPSILON);
}

#[test]
fn replay_produces_identical_event_stream() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());
    assert_eq!(first, second, "replay diverged between runs");
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::StageEntered { to: Stage::Result, .. })));
}

fn replay(commands: Vec<Command>) -> Vec<Event> {
    let mut world = World::new();
    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }
    events
}

fn scripted_commands() -> Vec<Command> {
    let mut commands = vec![Command::Start, Command::BeginJourney];
    for step in 0..20 {
        commands.push(Command::Tick {
            dt: Duration::from_millis(100),
        });
        commands.push(Command::UpdateAttributes {
            update: AttributeUpdate::Delta {
                stamina: -1.0,
                fear: step as f32 * 0.5,
                frustration: 1.5,
            },
        });
    }
    commands.push(Command::CompleteStage {
        stage: Stage::Stage1,
        attributes: AttributeSnapshot::new(70.0, 40.0, 30.0),
        bribe_taken: true,
    });
    commands.push(Command::PlayEffect {
        effect: SoundEffect::Struggle,
    });
    commands.push(Command::FailStage {
        stage: Stage::Stage2,
    });
    commands
}
