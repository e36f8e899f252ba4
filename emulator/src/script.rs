//! Emulator-only commands that script the simulated strip.
//!
//! ```text
//! touch <contact> [<ohms>]     release <contact>|all
//! plug  unplug  contacts       advance <n>[us|ms|s]
//! ```
//!
//! Contacts are `tip`, `own`, `lame`, `guard`, `piste` or `leak` followed by
//! `left|right`, or `blades`. Anything else is handed to the operator console.

use std::time::Duration;

use scoring_core::console::ConsoleError;
use scoring_core::{Path, Side};
use winnow::ascii::{Caseless, dec_uint, space0, space1};
use winnow::combinator::{alt, cut_err, delimited, opt, preceded};
use winnow::error::{ContextError, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::rest;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScriptCommand {
    Touch { path: Path, ohms: f32 },
    Release(Option<Path>),
    Plug,
    Unplug,
    Contacts,
    Advance(Duration),
}

/// Splits a line into a script command or a console line.
///
/// # Errors
///
/// Returns [`ConsoleError::Syntax`] when a script keyword has bad arguments.
pub fn parse(line: &str) -> Result<Option<ScriptCommand>, ConsoleError> {
    let line = line.trim();
    alt((
        delimited(space0, script, space0).map(Some),
        rest.value(None),
    ))
    .parse(line)
    .map_err(|error| ConsoleError::Syntax {
        offset: error.offset(),
        expected: expected_label(error.inner()),
    })
}

fn expected_label(error: &ContextError) -> Option<&'static str> {
    error.context().find_map(|context| match context {
        StrContext::Label(label) => Some(*label),
        StrContext::Expected(StrContextValue::Description(description)) => Some(*description),
        _ => None,
    })
}

fn script(input: &mut &str) -> ModalResult<ScriptCommand> {
    alt((
        preceded((Caseless("touch"), space1), cut_err(touch)),
        preceded((Caseless("release"), space1), cut_err(release)),
        preceded((Caseless("advance"), space1), cut_err(duration)).map(ScriptCommand::Advance),
        Caseless("unplug").value(ScriptCommand::Unplug),
        Caseless("plug").value(ScriptCommand::Plug),
        Caseless("contacts").value(ScriptCommand::Contacts),
    ))
    .parse_next(input)
}

fn touch(input: &mut &str) -> ModalResult<ScriptCommand> {
    let path = contact.parse_next(input)?;
    let ohms: Option<u32> = opt(preceded(space1, dec_uint))
        .context(StrContext::Label("resistance in ohms"))
        .parse_next(input)?;
    #[allow(clippy::cast_precision_loss)]
    let ohms = ohms.map_or(0.0, |value| value as f32);
    Ok(ScriptCommand::Touch { path, ohms })
}

fn release(input: &mut &str) -> ModalResult<ScriptCommand> {
    alt((
        Caseless("all").value(ScriptCommand::Release(None)),
        contact.map(|path| ScriptCommand::Release(Some(path))),
    ))
    .parse_next(input)
}

fn contact(input: &mut &str) -> ModalResult<Path> {
    alt((
        Caseless("blades").value(Path::BladeContact),
        (sided_contact, preceded(space1, side)).map(|(make, side)| make(side)),
    ))
    .context(StrContext::Label("contact (tip, own, lame, guard, piste, leak <side> or blades)"))
    .parse_next(input)
}

fn sided_contact(input: &mut &str) -> ModalResult<fn(Side) -> Path> {
    alt((
        Caseless("tip").value(Path::TipCircuit as fn(Side) -> Path),
        Caseless("own").value(Path::OwnLame as fn(Side) -> Path),
        Caseless("lame").value(Path::OpponentLame as fn(Side) -> Path),
        Caseless("guard").value(Path::OpponentGuard as fn(Side) -> Path),
        Caseless("piste").value(Path::Piste as fn(Side) -> Path),
        Caseless("leak").value(Path::LameLeak as fn(Side) -> Path),
    ))
    .parse_next(input)
}

fn side(input: &mut &str) -> ModalResult<Side> {
    alt((
        Caseless("left").value(Side::Left),
        Caseless("right").value(Side::Right),
    ))
    .context(StrContext::Label("side (left, right)"))
    .parse_next(input)
}

/// `<n>us`, `<n>ms`, `<n>s` or a bare millisecond count.
fn duration(input: &mut &str) -> ModalResult<Duration> {
    let value: u64 = dec_uint
        .context(StrContext::Label("duration"))
        .parse_next(input)?;
    let unit = opt(alt((
        Caseless("us").value(Duration::from_micros as fn(u64) -> Duration),
        Caseless("ms").value(Duration::from_millis as fn(u64) -> Duration),
        Caseless("s").value(Duration::from_secs as fn(u64) -> Duration),
    )))
    .parse_next(input)?
    .unwrap_or(Duration::from_millis);
    Ok(unit(value))
}
