use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path as FsPath;
use std::time::Duration;

use scoring_core::console::{self, HELP};
use scoring_core::weapons::timing::SCAN_PERIOD;
use scoring_core::{
    DetectionMode, EventQueue, Instant, MonotonicClock, Path, ScanScheduler, ScoringSensor,
    SensorSettings, Side, WeaponKind,
};

use crate::circuit::{BOARD_DIVIDER, SimulatedCircuit};
use crate::script::{self, ScriptCommand};

const EVENT_QUEUE_DEPTH: usize = 64;

pub const USAGE: &str =
    "Usage: scoring-emulator [--profile <foil|epee|sabre|detection>] | scoring-emulator <profile>";

const FAREWELL: &str = "Session closed.";

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "touch",
        "touch <contact> [<ohms>]      - close a contact (tip|own|lame|guard|piste|leak <side>, blades)",
    ),
    (
        "release",
        "release <contact>|all         - open a contact, or every contact",
    ),
    (
        "plug",
        "plug | unplug                 - connect or remove both body wires",
    ),
    (
        "advance",
        "advance <n>[us|ms|s]          - run the scan loop for simulated time",
    ),
    (
        "contacts",
        "contacts                      - list closed contacts",
    ),
    ("console", HELP),
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptProfile {
    Foil,
    Epee,
    Sabre,
    Detection,
}

impl TranscriptProfile {
    pub fn log_path(self) -> &'static str {
        match self {
            TranscriptProfile::Foil => "transcripts/emulator-foil.log",
            TranscriptProfile::Epee => "transcripts/emulator-epee.log",
            TranscriptProfile::Sabre => "transcripts/emulator-sabre.log",
            TranscriptProfile::Detection => "transcripts/emulator-detection.log",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            TranscriptProfile::Foil => "Scoring emulator foil bout transcript",
            TranscriptProfile::Epee => "Scoring emulator epee bout transcript",
            TranscriptProfile::Sabre => "Scoring emulator sabre bout transcript",
            TranscriptProfile::Detection => "Scoring emulator weapon detection transcript",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        [
            ("foil", Self::Foil),
            ("epee", Self::Epee),
            ("sabre", Self::Sabre),
            ("detection", Self::Detection),
        ]
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(tag))
        .map(|(_, profile)| profile)
        .ok_or_else(|| format!("Unknown transcript profile `{tag}`"))
    }

    /// Reads the profile from the command line; no argument means foil.
    pub fn from_args<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let Some(arg) = args.next() else {
            return Ok(Self::Foil);
        };

        if let Some(value) = arg.strip_prefix("--profile=") {
            Self::from_tag(value)
        } else if arg == "--profile" {
            let value = args
                .next()
                .ok_or_else(|| "Expected value after --profile".to_string())?;
            Self::from_tag(&value)
        } else {
            Self::from_tag(&arg)
        }
    }

    /// Weapon profiles pin the weapon; the detection profile lets it roam.
    pub fn settings(self) -> SensorSettings {
        let (default_weapon, detection_mode) = match self {
            TranscriptProfile::Foil => (WeaponKind::Foil, DetectionMode::Manual),
            TranscriptProfile::Epee => (WeaponKind::Epee, DetectionMode::Manual),
            TranscriptProfile::Sabre => (WeaponKind::Sabre, DetectionMode::Manual),
            TranscriptProfile::Detection => (WeaponKind::Foil, DetectionMode::Auto),
        };
        SensorSettings {
            default_weapon,
            detection_mode,
            ..SensorSettings::default()
        }
    }
}

/// Simulated time; only `advance` moves it.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimClock {
    now: Instant,
}

impl SimClock {
    fn advance(&mut self, by: Duration) {
        self.now = self.now + by;
    }
}

impl MonotonicClock for SimClock {
    fn now(&self) -> Instant {
        self.now
    }
}

/// What the front end does after one input line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Reply(Vec<String>),
    /// `exit` or `quit`; carries the farewell line.
    Closed(String),
}

pub struct Session {
    sensor: ScoringSensor<SimulatedCircuit>,
    events: EventQueue<EVENT_QUEUE_DEPTH>,
    clock: SimClock,
    scheduler: ScanScheduler,
    transcript: TranscriptLogger,
}

impl Session {
    pub fn new(profile: TranscriptProfile) -> io::Result<Self> {
        let transcript = TranscriptLogger::create(profile)?;
        Ok(Self::with_transcript(profile.settings(), transcript))
    }

    fn with_transcript(settings: SensorSettings, transcript: TranscriptLogger) -> Self {
        Self {
            sensor: ScoringSensor::new(
                SimulatedCircuit::new(BOARD_DIVIDER),
                BOARD_DIVIDER.calibration(),
                settings,
            ),
            events: EventQueue::new(),
            clock: SimClock::default(),
            scheduler: ScanScheduler::new(SCAN_PERIOD),
            transcript,
        }
    }

    pub fn sensor(&self) -> &ScoringSensor<SimulatedCircuit> {
        &self.sensor
    }

    pub fn banner(&self) -> String {
        format!(
            "Scoring emulator ready ({}, {} mode). Type `help` for commands or `exit` to quit.",
            self.sensor.active_weapon(),
            self.sensor.detection_mode()
        )
    }

    /// Handles one interactive line, recognising the words that end the session.
    pub fn respond(&mut self, line: &str) -> io::Result<Outcome> {
        let trimmed = line.trim();
        if !is_farewell(trimmed) {
            return self.handle_command(trimmed).map(Outcome::Reply);
        }

        self.transcript
            .append_line(self.clock.now(), TranscriptRole::Host, trimmed)?;
        let farewell = FAREWELL.to_string();
        self.record_output(std::slice::from_ref(&farewell))?;
        Ok(Outcome::Closed(farewell))
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        self.transcript
            .append_line(self.clock.now(), TranscriptRole::Host, trimmed)?;

        let lines = if trimmed.eq_ignore_ascii_case("help") {
            help(None)
        } else if let Some(topic) = trimmed.strip_prefix("help ") {
            help(Some(topic.trim()))
        } else {
            match script::parse(trimmed) {
                Ok(Some(command)) => self.run_script(command),
                Ok(None) => self.run_console(trimmed),
                Err(error) => vec![format!("ERR syntax {error}")],
            }
        };

        self.record_output(&lines)?;
        Ok(lines)
    }

    fn run_script(&mut self, command: ScriptCommand) -> Vec<String> {
        let circuit = self.sensor.front_end_mut();
        match command {
            ScriptCommand::Touch { path, ohms } => {
                circuit.touch(path, ohms);
                vec![format!("OK touch {path} {ohms}ohm")]
            }
            ScriptCommand::Release(Some(path)) => {
                if circuit.release(path) {
                    vec![format!("OK release {path}")]
                } else {
                    vec![format!("ERR {path} is not closed")]
                }
            }
            ScriptCommand::Release(None) => {
                circuit.release_all();
                vec!["OK release all".to_string()]
            }
            ScriptCommand::Plug => {
                for side in Side::BOTH {
                    circuit.touch(Path::TipCircuit(side), 0.0);
                }
                vec!["OK plugged".to_string()]
            }
            ScriptCommand::Unplug => {
                for side in Side::BOTH {
                    circuit.release(Path::TipCircuit(side));
                }
                vec!["OK unplugged".to_string()]
            }
            ScriptCommand::Contacts => {
                let mut lines: Vec<String> = circuit
                    .contacts()
                    .map(|(path, ohms)| format!("  {path} {ohms}ohm"))
                    .collect();
                if lines.is_empty() {
                    lines.push("  no contacts closed".to_string());
                }
                lines.insert(0, format!("OK contacts conversions={}", circuit.conversions()));
                lines
            }
            ScriptCommand::Advance(span) => self.advance(span),
        }
    }

    fn run_console(&mut self, line: &str) -> Vec<String> {
        let now = self.clock.now();
        let mut lines = match console::run_line(&mut self.sensor, line, now, &mut self.events) {
            Ok(reply) => vec![reply.to_string()],
            Err(error) => vec![format!("ERR syntax {error}")],
        };
        self.narrate(&mut lines);
        lines
    }

    /// Runs the scan loop in scan-period steps until `span` of simulated time has passed.
    fn advance(&mut self, span: Duration) -> Vec<String> {
        let target = self.clock.now() + span;
        let mut lines = Vec::new();
        let mut scans = 0_u64;

        while self.clock.now() < target {
            let step = SCAN_PERIOD.min(target.saturating_duration_since(self.clock.now()));
            self.clock.advance(step);

            let sensor = &mut self.sensor;
            let events = &mut self.events;
            let ran = self.scheduler.run_due(self.clock.now(), |now| {
                sensor.scan(now, events);
            });
            if ran {
                scans += 1;
            }
            self.narrate(&mut lines);
        }

        lines.push(format!(
            "OK advanced to {} ({scans} scans)",
            format_timestamp(self.clock.now())
        ));
        lines
    }

    fn narrate(&mut self, lines: &mut Vec<String>) {
        while let Some(timed) = self.events.pop() {
            lines.push(format!("EVENT {} {}", format_timestamp(timed.at), timed.event));
        }
    }

    fn record_output(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            self.transcript
                .append_line(self.clock.now(), TranscriptRole::Emulator, line)?;
        }
        Ok(())
    }
}

fn is_farewell(input: &str) -> bool {
    ["exit", "quit"]
        .iter()
        .any(|word| input.eq_ignore_ascii_case(word))
}

fn help(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) if !target.is_empty() => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        _ => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Type `help <topic>` for a specific command.".to_string());
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `+12.345ms` since power-up.
fn format_timestamp(at: Instant) -> String {
    let micros = at.as_micros();
    format!("+{}.{:03}ms", micros / 1_000, micros % 1_000)
}

#[derive(Clone, Copy)]
enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

struct TranscriptLogger {
    writer: Box<dyn Write>,
}

impl TranscriptLogger {
    fn create(profile: TranscriptProfile) -> io::Result<Self> {
        let path = FsPath::new(profile.log_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: Box::new(BufWriter::new(file)),
        };

        logger.write_header(profile)?;
        Ok(logger)
    }

    #[cfg(test)]
    fn discard() -> Self {
        Self {
            writer: Box::new(io::sink()),
        }
    }

    fn write_header(&mut self, profile: TranscriptProfile) -> io::Result<()> {
        writeln!(self.writer, "# {}", profile.header())?;
        writeln!(
            self.writer,
            "# Timestamps are simulated milliseconds since power-up"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, at: Instant, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(
            self.writer,
            "[{:>12}] {} {}",
            format_timestamp(at),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}
