//! Scenario script format.
//!
//! One statement per line, `#` starts a comment:
//!
//! ```text
//! board timer_freq=10000000 tick_freq=1000 local=16 platform=96
//! install local 7
//! install plic 10 priority=3
//! enable plic 10 priority=3
//! mask 35000
//! raise plic 10
//! advance 1000
//! query
//! ```
//!
//! `board` and the setup statements (`install`, `enable`) must come before
//! the first event.

use anyhow::{Result, anyhow, bail};
use hartirq_common::board::{
    NUM_LOCAL_INTERRUPTS, PLIC_TOTAL_INTERRUPT_COUNT, TICK_FREQ, TIMER_FREQ,
};
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1, space1},
    combinator::{all_consuming, map, map_res, opt, value},
    multi::many0,
    sequence::{preceded, separated_pair, tuple},
};
use std::str::FromStr;

/// Simulated board parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub timer_freq: u32,
    pub tick_freq: u32,
    /// Local vector entries.
    pub local: usize,
    /// Platform vector entries, source 0 included.
    pub platform: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            timer_freq: TIMER_FREQ,
            tick_freq: TICK_FREQ,
            local: NUM_LOCAL_INTERRUPTS,
            platform: PLIC_TOTAL_INTERRUPT_COUNT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    Local,
    Plic,
}

/// Statement run before interrupts are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Installs a recording handler; for PLIC sources an optional priority
    /// also enables the source.
    Install {
        controller: Controller,
        index: usize,
        priority: Option<u32>,
    },
    /// Enables a PLIC source, with or without a handler behind it.
    Enable { source: u32, priority: Option<u32> },
}

/// Timeline entry replayed with interrupts enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Lets the timer run, taking interrupts as they become due.
    Advance(u64),
    /// Lets the timer run with interrupts masked, then unmasks.
    Mask(u64),
    /// Marks an interrupt pending.
    Raise(Controller, usize),
    /// Prints the current time base.
    Query,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub board: BoardConfig,
    pub setup: Vec<Directive>,
    pub events: Vec<Event>,
}

enum Line<'a> {
    Board(Vec<(&'a str, u64)>),
    Setup(Directive),
    Event(Event),
}

fn number<T: FromStr>(input: &str) -> IResult<&str, T> {
    map_res(digit1, |digits: &str| digits.parse::<T>())(input)
}

fn controller(input: &str) -> IResult<&str, Controller> {
    alt((
        value(Controller::Plic, tag("plic")),
        value(Controller::Local, tag("local")),
    ))(input)
}

fn priority(input: &str) -> IResult<&str, Option<u32>> {
    opt(preceded(tuple((space1, tag("priority="))), number::<u32>))(input)
}

fn board(input: &str) -> IResult<&str, Line<'_>> {
    let key = take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_');
    map(
        preceded(
            tag("board"),
            many0(preceded(space1, separated_pair(key, char('='), number::<u64>))),
        ),
        Line::Board,
    )(input)
}

fn install(input: &str) -> IResult<&str, Line<'_>> {
    map(
        tuple((tag("install"), space1, controller, space1, number::<usize>, priority)),
        |(_, _, controller, _, index, priority)| {
            Line::Setup(Directive::Install {
                controller,
                index,
                priority,
            })
        },
    )(input)
}

fn enable(input: &str) -> IResult<&str, Line<'_>> {
    map(
        tuple((tag("enable"), space1, tag("plic"), space1, number::<u32>, priority)),
        |(_, _, _, _, source, priority)| Line::Setup(Directive::Enable { source, priority }),
    )(input)
}

fn event(input: &str) -> IResult<&str, Line<'_>> {
    map(
        alt((
            map(preceded(tuple((tag("advance"), space1)), number::<u64>), Event::Advance),
            map(preceded(tuple((tag("mask"), space1)), number::<u64>), Event::Mask),
            map(
                tuple((tag("raise"), space1, controller, space1, number::<usize>)),
                |(_, _, controller, _, index)| Event::Raise(controller, index),
            ),
            value(Event::Query, tag("query")),
        )),
        Line::Event,
    )(input)
}

fn line(input: &str) -> IResult<&str, Line<'_>> {
    all_consuming(alt((board, install, enable, event)))(input)
}

fn apply_board(board: &mut BoardConfig, pairs: &[(&str, u64)]) -> Result<()> {
    for &(key, raw) in pairs {
        match key {
            "timer_freq" => board.timer_freq = u32::try_from(raw)?,
            "tick_freq" => board.tick_freq = u32::try_from(raw)?,
            "local" => board.local = usize::try_from(raw)?,
            "platform" => board.platform = usize::try_from(raw)?,
            other => bail!("unknown board parameter '{}'", other),
        }
    }
    if board.tick_freq == 0 || board.tick_freq > board.timer_freq {
        bail!(
            "tick_freq {} must be in 1..={}",
            board.tick_freq,
            board.timer_freq
        );
    }
    Ok(())
}

/// Parses a whole script.
pub fn parse_script(text: &str) -> Result<Script> {
    let mut script = Script::default();
    let mut seen_board = false;

    for (number, raw) in text.lines().enumerate() {
        let number = number + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let (_, parsed) = line(content).map_err(|e| anyhow!("line {}: {}", number, e))?;
        match parsed {
            Line::Board(pairs) => {
                if seen_board || !script.setup.is_empty() || !script.events.is_empty() {
                    bail!("line {}: board must be the first statement", number);
                }
                seen_board = true;
                apply_board(&mut script.board, &pairs)
                    .map_err(|e| anyhow!("line {}: {}", number, e))?;
            }
            Line::Setup(directive) => {
                if !script.events.is_empty() {
                    bail!("line {}: setup after the first event", number);
                }
                script.setup.push(directive);
            }
            Line::Event(event) => script.events.push(event),
        }
    }

    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_script() {
        let text = "\
# burst test
board timer_freq=1000000 tick_freq=1000 local=16 platform=32

install local 3
install plic 10 priority=3   # uart
enable plic 11

mask 3500
raise plic 10
raise local 3
advance 250
query
";
        let script = parse_script(text).unwrap();

        assert_eq!(
            script.board,
            BoardConfig {
                timer_freq: 1_000_000,
                tick_freq: 1000,
                local: 16,
                platform: 32,
            }
        );
        assert_eq!(
            script.setup,
            vec![
                Directive::Install {
                    controller: Controller::Local,
                    index: 3,
                    priority: None,
                },
                Directive::Install {
                    controller: Controller::Plic,
                    index: 10,
                    priority: Some(3),
                },
                Directive::Enable {
                    source: 11,
                    priority: None,
                },
            ]
        );
        assert_eq!(
            script.events,
            vec![
                Event::Mask(3500),
                Event::Raise(Controller::Plic, 10),
                Event::Raise(Controller::Local, 3),
                Event::Advance(250),
                Event::Query,
            ]
        );
    }

    #[test]
    fn board_defaults_to_build_constants() {
        let script = parse_script("board tick_freq=100\nadvance 1").unwrap();
        assert_eq!(script.board.timer_freq, TIMER_FREQ);
        assert_eq!(script.board.tick_freq, 100);
        assert_eq!(script.board.local, NUM_LOCAL_INTERRUPTS);

        let script = parse_script("query").unwrap();
        assert_eq!(script.board, BoardConfig::default());
    }

    #[test]
    fn rejects_unknown_statement_with_line_number() {
        let err = parse_script("query\n\nfire plic 3").unwrap_err();
        assert!(err.to_string().starts_with("line 3:"), "{err}");
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_script("advance 10 cycles").is_err());
        assert!(parse_script("install plic ten").is_err());
    }

    #[test]
    fn rejects_misplaced_statements() {
        assert!(parse_script("advance 1\ninstall local 7").is_err());
        assert!(parse_script("install local 7\nboard local=16").is_err());
        assert!(parse_script("board local=16\nboard local=16").is_err());
    }

    #[test]
    fn rejects_bad_board_parameters() {
        assert!(parse_script("board colour=3").is_err());
        assert!(parse_script("board tick_freq=0").is_err());
        assert!(parse_script("board timer_freq=100 tick_freq=1000").is_err());
        assert!(parse_script("board timer_freq=99999999999").is_err());
    }
}
