//! Executes parsed console commands against a [`ScoringSensor`].

use core::fmt;
use core::time::Duration;

use crate::clock::Instant;
use crate::detector::DetectionMode;
use crate::events::EventSink;
use crate::probe::AnalogFrontEnd;
use crate::sensor::{ScoringSensor, SensorStatus};
use crate::weapons::WeaponKind;

use super::grammar::{self, Command, ConsoleError};

pub const HELP: &str = "commands: weapon foil|epee|sabre, mode manual|auto|hybrid, \
lights <n>[ms|s], mirror on|off, reset, block, allow, status, help";

/// Acknowledgement for an executed command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Reply {
    Weapon(WeaponKind),
    Mode(DetectionMode),
    Lights(Duration),
    Mirror(bool),
    Reset,
    Blocked,
    Allowed,
    Status(SensorStatus),
    Help,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Weapon(kind) => write!(f, "OK weapon {kind}"),
            Reply::Mode(mode) => write!(f, "OK mode {mode}"),
            Reply::Lights(duration) => write!(f, "OK lights {}ms", duration.as_millis()),
            Reply::Mirror(true) => f.write_str("OK mirror on"),
            Reply::Mirror(false) => f.write_str("OK mirror off"),
            Reply::Reset => f.write_str("OK reset"),
            Reply::Blocked => f.write_str("OK hits blocked"),
            Reply::Allowed => f.write_str("OK hits allowed"),
            Reply::Status(status) => write!(f, "STATUS {status}"),
            Reply::Help => f.write_str(HELP),
        }
    }
}

/// Applies one command. Weapon and reset changes publish through `sink`.
pub fn execute<F, S>(
    sensor: &mut ScoringSensor<F>,
    command: Command,
    now: Instant,
    sink: &mut S,
) -> Reply
where
    F: AnalogFrontEnd,
    S: EventSink,
{
    match command {
        Command::Weapon(kind) => {
            sensor.set_active_weapon(kind, now, sink);
            Reply::Weapon(kind)
        }
        Command::Mode(mode) => {
            sensor.set_detection_mode(mode);
            Reply::Mode(mode)
        }
        Command::Lights(duration) => {
            sensor.set_lights_duration(duration);
            Reply::Lights(sensor.settings().lights_duration)
        }
        Command::Mirror(mirrored) => {
            sensor.set_mirrored(mirrored);
            Reply::Mirror(mirrored)
        }
        Command::Reset => {
            sensor.reset(now, sink);
            Reply::Reset
        }
        Command::Block => {
            sensor.block_all_new_hits();
            Reply::Blocked
        }
        Command::Allow => {
            sensor.allow_all_new_hits();
            Reply::Allowed
        }
        Command::Status => Reply::Status(sensor.status(now)),
        Command::Help => Reply::Help,
    }
}

/// Parses and executes one console line.
///
/// # Errors
///
/// Returns the [`ConsoleError`] from [`grammar::parse`]; the sensor is left untouched.
pub fn run_line<F, S>(
    sensor: &mut ScoringSensor<F>,
    line: &str,
    now: Instant,
    sink: &mut S,
) -> Result<Reply, ConsoleError>
where
    F: AnalogFrontEnd,
    S: EventSink,
{
    let command = grammar::parse(line)?;
    Ok(execute(sensor, command, now, sink))
}
