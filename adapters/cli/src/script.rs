//! Line grammar shared by interactive play and script files.

use std::time::Duration;

use ferry_crossing_core::{AttributeSnapshot, AttributeUpdate, Command, SoundEffect, Stage};
use thiserror::Error;

/// Parsed form of a single input line.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Directive {
    /// Submit a command to the world.
    Submit(Command),
    /// Print the current HUD and metrics.
    Status,
    /// Advance simulated time.
    Wait(Duration),
    /// End the session.
    Quit,
}

/// Reasons an input line could not be understood.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum ParseError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{command}` expects {expected}")]
    Arity {
        command: &'static str,
        expected: &'static str,
    },
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
    #[error("`{0}` is not a gameplay stage")]
    InvalidStage(String),
    #[error("unknown effect `{0}`")]
    UnknownEffect(String),
    #[error("wait duration must be a non-negative number of seconds")]
    InvalidWait,
}

/// Parses one line. Blank lines and `#` comments yield `None`.
pub(crate) fn parse_line(line: &str) -> Result<Option<Directive>, ParseError> {
    let line = line.split('#').next().unwrap_or_default().trim();
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let directive = match keyword.to_ascii_lowercase().as_str() {
        "init" => Directive::Submit(Command::Initialize),
        "start" => Directive::Submit(Command::Start),
        "direct" => Directive::Submit(Command::DirectPlay),
        "begin" => Directive::Submit(Command::BeginJourney),
        "attrs" => {
            let [stamina, fear, frustration] = triple("attrs", &args)?;
            Directive::Submit(Command::UpdateAttributes {
                update: AttributeUpdate::Absolute(AttributeSnapshot::new(
                    stamina,
                    fear,
                    frustration,
                )),
            })
        }
        "delta" => {
            let [stamina, fear, frustration] = triple("delta", &args)?;
            Directive::Submit(Command::UpdateAttributes {
                update: AttributeUpdate::Delta {
                    stamina,
                    fear,
                    frustration,
                },
            })
        }
        "complete" => parse_complete(&args)?,
        "fail" => {
            let [stage] = args[..] else {
                return Err(ParseError::Arity {
                    command: "fail",
                    expected: "<stage>",
                });
            };
            Directive::Submit(Command::FailStage {
                stage: gameplay_stage(stage)?,
            })
        }
        "restart" => Directive::Submit(Command::Restart),
        "home" => Directive::Submit(Command::GoHome),
        "lock-home" => Directive::Submit(Command::SetHomeNavigationDisabled { disabled: true }),
        "unlock-home" => Directive::Submit(Command::SetHomeNavigationDisabled { disabled: false }),
        "effect" => {
            let [name] = args[..] else {
                return Err(ParseError::Arity {
                    command: "effect",
                    expected: "<name>",
                });
            };
            let effect = SoundEffect::from_name(name)
                .ok_or_else(|| ParseError::UnknownEffect(name.to_owned()))?;
            Directive::Submit(Command::PlayEffect { effect })
        }
        "status" => Directive::Status,
        "wait" => {
            let [seconds] = args[..] else {
                return Err(ParseError::Arity {
                    command: "wait",
                    expected: "<seconds>",
                });
            };
            let seconds = number(seconds)?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(ParseError::InvalidWait);
            }
            Directive::Wait(Duration::from_secs_f32(seconds))
        }
        "quit" | "exit" => Directive::Quit,
        other => return Err(ParseError::UnknownCommand(other.to_owned())),
    };
    Ok(Some(directive))
}

fn parse_complete(args: &[&str]) -> Result<Directive, ParseError> {
    let arity = ParseError::Arity {
        command: "complete",
        expected: "<stage> <stamina> <fear> <frustration> [bribe]",
    };
    let (stage, values, bribe_taken) = match args {
        [stage, rest @ ..] if rest.len() == 3 => (*stage, rest, false),
        [stage, rest @ .., flag] if rest.len() == 3 && flag.eq_ignore_ascii_case("bribe") => {
            (*stage, rest, true)
        }
        _ => return Err(arity),
    };
    let [stamina, fear, frustration] = triple("complete", values)?;
    Ok(Directive::Submit(Command::CompleteStage {
        stage: gameplay_stage(stage)?,
        attributes: AttributeSnapshot::new(stamina, fear, frustration),
        bribe_taken,
    }))
}

fn triple(command: &'static str, args: &[&str]) -> Result<[f32; 3], ParseError> {
    let [first, second, third] = args[..] else {
        return Err(ParseError::Arity {
            command,
            expected: "<stamina> <fear> <frustration>",
        });
    };
    Ok([number(first)?, number(second)?, number(third)?])
}

fn number(word: &str) -> Result<f32, ParseError> {
    word.parse()
        .map_err(|_| ParseError::InvalidNumber(word.to_owned()))
}

fn gameplay_stage(word: &str) -> Result<Stage, ParseError> {
    let stage = Stage::from_label(word);
    if stage.is_gameplay() {
        Ok(stage)
    } else {
        Err(ParseError::InvalidStage(word.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use ferry_crossing_core::Footing;

    use super::*;

    fn submitted(line: &str) -> Command {
        match parse_line(line) {
            Ok(Some(Directive::Submit(command))) => command,
            other => panic!("expected a command from `{line}`, got {other:?}"),
        }
    }

    #[test]
    fn blank_lines_and_comments_are_skipped() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   # walking to the ghat"), Ok(None));
        assert_eq!(parse_line("start # go"), Ok(Some(Directive::Submit(Command::Start))));
    }

    #[test]
    fn completion_with_and_without_bribe() {
        assert_eq!(
            submitted("complete 1 80 25 10 bribe"),
            Command::CompleteStage {
                stage: Stage::Stage1,
                attributes: AttributeSnapshot::new(80.0, 25.0, 10.0),
                bribe_taken: true,
            }
        );
        assert_eq!(
            submitted("COMPLETE stage2 60 40 35.5"),
            Command::CompleteStage {
                stage: Stage::Stage2,
                attributes: AttributeSnapshot::new(60.0, 40.0, 35.5),
                bribe_taken: false,
            }
        );
        assert!(matches!(
            parse_line("complete 3 1 2"),
            Err(ParseError::Arity { .. })
        ));
    }

    #[test]
    fn attribute_updates() {
        assert_eq!(
            submitted("delta -5 2.5 1"),
            Command::UpdateAttributes {
                update: AttributeUpdate::Delta {
                    stamina: -5.0,
                    fear: 2.5,
                    frustration: 1.0,
                },
            }
        );
        assert_eq!(
            parse_line("attrs 1 two 3"),
            Err(ParseError::InvalidNumber("two".into()))
        );
    }

    #[test]
    fn stages_must_be_gameplay() {
        assert_eq!(
            submitted("fail stage3"),
            Command::FailStage {
                stage: Stage::Stage3
            }
        );
        assert_eq!(
            parse_line("fail result"),
            Err(ParseError::InvalidStage("result".into()))
        );
    }

    #[test]
    fn effects_waits_and_control() {
        assert_eq!(
            submitted("effect mud"),
            Command::PlayEffect {
                effect: SoundEffect::Footstep(Footing::Mud)
            }
        );
        assert_eq!(
            parse_line("effect kazoo"),
            Err(ParseError::UnknownEffect("kazoo".into()))
        );
        assert_eq!(
            parse_line("wait 1.5"),
            Ok(Some(Directive::Wait(Duration::from_millis(1_500))))
        );
        assert_eq!(parse_line("wait -1"), Err(ParseError::InvalidWait));
        assert_eq!(
            submitted("lock-home"),
            Command::SetHomeNavigationDisabled { disabled: true }
        );
        assert_eq!(parse_line("status"), Ok(Some(Directive::Status)));
        assert_eq!(parse_line("quit"), Ok(Some(Directive::Quit)));
        assert_eq!(
            parse_line("jump"),
            Err(ParseError::UnknownCommand("jump".into()))
        );
    }
}
