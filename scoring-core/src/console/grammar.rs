//! Operator console grammar.
//!
//! One command per line, keywords are case-insensitive:
//!
//! ```text
//! weapon foil|epee|sabre      mode manual|auto|hybrid
//! lights <n>[ms|s]            mirror on|off
//! reset  block  allow  status  help
//! ```

use core::fmt;
use core::time::Duration;

use winnow::ascii::{Caseless, dec_uint, space0, space1};
use winnow::combinator::{alt, cut_err, delimited, opt, preceded};
#[cfg(feature = "alloc")]
use winnow::error::StrContextValue;
use winnow::error::{ContextError, StrContext};
use winnow::prelude::*;

use crate::detector::DetectionMode;
use crate::weapons::WeaponKind;

/// Parsed operator command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    Weapon(WeaponKind),
    Mode(DetectionMode),
    Lights(Duration),
    Mirror(bool),
    Reset,
    Block,
    Allow,
    Status,
    Help,
}

/// Rejected console line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConsoleError {
    Empty,
    Syntax {
        /// Byte offset where parsing stopped.
        offset: usize,
        expected: Option<&'static str>,
    },
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Empty => f.write_str("empty command"),
            ConsoleError::Syntax {
                offset,
                expected: Some(expected),
            } => write!(f, "expected {expected} at column {}", offset + 1),
            ConsoleError::Syntax {
                offset,
                expected: None,
            } => write!(f, "unrecognized input at column {}", offset + 1),
        }
    }
}

/// Parses one console line.
///
/// # Errors
///
/// Returns [`ConsoleError::Empty`] for a blank line and
/// [`ConsoleError::Syntax`] when the line does not match the grammar.
pub fn parse(line: &str) -> Result<Command, ConsoleError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(ConsoleError::Empty);
    }

    delimited(space0, command, space0)
        .parse(line)
        .map_err(|error| ConsoleError::Syntax {
            offset: error.offset(),
            expected: expected_label(error.inner()),
        })
}

/// Context labels are only retained when `winnow` can allocate.
#[cfg(feature = "alloc")]
fn expected_label(error: &ContextError) -> Option<&'static str> {
    error.context().find_map(|context| match context {
        StrContext::Label(label) => Some(*label),
        StrContext::Expected(StrContextValue::Description(description)) => Some(*description),
        _ => None,
    })
}

#[cfg(not(feature = "alloc"))]
fn expected_label(_error: &ContextError) -> Option<&'static str> {
    None
}

fn command(input: &mut &str) -> ModalResult<Command> {
    alt((
        preceded((Caseless("weapon"), space1), cut_err(weapon)).map(Command::Weapon),
        preceded((Caseless("mode"), space1), cut_err(mode)).map(Command::Mode),
        preceded((Caseless("lights"), space1), cut_err(duration)).map(Command::Lights),
        preceded((Caseless("mirror"), space1), cut_err(switch)).map(Command::Mirror),
        Caseless("reset").value(Command::Reset),
        Caseless("block").value(Command::Block),
        Caseless("allow").value(Command::Allow),
        Caseless("status").value(Command::Status),
        Caseless("help").value(Command::Help),
    ))
    .context(StrContext::Label("command"))
    .parse_next(input)
}

fn weapon(input: &mut &str) -> ModalResult<WeaponKind> {
    alt((
        Caseless("foil").value(WeaponKind::Foil),
        Caseless("epee").value(WeaponKind::Epee),
        Caseless("sabre").value(WeaponKind::Sabre),
        Caseless("saber").value(WeaponKind::Sabre),
    ))
    .context(StrContext::Label("weapon (foil, epee, sabre)"))
    .parse_next(input)
}

fn mode(input: &mut &str) -> ModalResult<DetectionMode> {
    alt((
        Caseless("manual").value(DetectionMode::Manual),
        Caseless("auto").value(DetectionMode::Auto),
        Caseless("hybrid").value(DetectionMode::Hybrid),
    ))
    .context(StrContext::Label("mode (manual, auto, hybrid)"))
    .parse_next(input)
}

fn switch(input: &mut &str) -> ModalResult<bool> {
    alt((Caseless("on").value(true), Caseless("off").value(false)))
        .context(StrContext::Label("on or off"))
        .parse_next(input)
}

/// `<n>ms`, `<n>s` or a bare millisecond count.
fn duration(input: &mut &str) -> ModalResult<Duration> {
    let value: u32 = dec_uint
        .context(StrContext::Label("duration"))
        .parse_next(input)?;
    let scale = opt(alt((Caseless("ms").value(1_u64), Caseless("s").value(1_000_u64))))
        .parse_next(input)?
        .unwrap_or(1);
    Ok(Duration::from_millis(u64::from(value) * scale))
}
