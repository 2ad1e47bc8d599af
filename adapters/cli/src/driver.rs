//! Interactive and scripted session loops.

use std::time::Duration;

use anyhow::{Context, Result};
use ferry_crossing_core::{Event, COUNTDOWN_PERIOD};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    script::{parse_line, Directive},
    session::{describe, Session},
};

/// Longest the session lingers after input ends so a narrated line can finish.
const NARRATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(20);

/// Reads commands from stdin while a real-time ticker drives the countdown.
pub(crate) async fn run_interactive(session: &mut Session) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = time::interval(COUNTDOWN_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => report(&session.advance(COUNTDOWN_PERIOD)),
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(Some(directive)) => {
                        if !execute(session, directive).await {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(error) => eprintln!("{error}"),
                }
            }
        }
    }

    drain_narration(session).await;
    Ok(())
}

/// Executes a script; simulated time only moves on `wait` lines.
pub(crate) async fn run_script(session: &mut Session, contents: &str) -> Result<()> {
    for (index, line) in contents.lines().enumerate() {
        let directive = parse_line(line)
            .with_context(|| format!("script line {}: `{}`", index + 1, line.trim()))?;
        let Some(directive) = directive else {
            continue;
        };
        if !execute(session, directive).await {
            break;
        }
    }

    drain_narration(session).await;
    Ok(())
}

/// Returns `false` once the session should end.
async fn execute(session: &mut Session, directive: Directive) -> bool {
    match directive {
        Directive::Submit(command) => report(&session.submit(command)),
        Directive::Status => println!("{}", session.status()),
        Directive::Wait(duration) => wait(session, duration).await,
        Directive::Quit => return false,
    }
    true
}

async fn wait(session: &mut Session, duration: Duration) {
    let mut remaining = duration;
    while !remaining.is_zero() {
        let step = remaining.min(COUNTDOWN_PERIOD);
        remaining -= step;
        report(&session.advance(step));
        tokio::task::yield_now().await;
    }
}

async fn drain_narration(session: &mut Session) {
    tokio::task::yield_now().await;
    if !session.narration_pending() {
        return;
    }

    log::info!("waiting for narration to finish");
    let deadline = Instant::now() + NARRATION_DRAIN_TIMEOUT;
    let mut ticker = time::interval(COUNTDOWN_PERIOD);
    while session.narration_pending() {
        if Instant::now() >= deadline {
            log::warn!("narration still pending after {NARRATION_DRAIN_TIMEOUT:?}, exiting");
            return;
        }
        let _ = ticker.tick().await;
        session.pump(COUNTDOWN_PERIOD);
    }
}

/// Prints the events worth showing.
pub(crate) fn report(events: &[Event]) {
    for line in events.iter().filter_map(describe) {
        println!("{line}");
    }
}
