use std::io;

#[allow(dead_code)]
#[path = "../circuit.rs"]
mod circuit;
#[allow(dead_code)]
#[path = "../script.rs"]
mod script;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, TranscriptProfile};

fn main() -> io::Result<()> {
    for profile in [
        TranscriptProfile::Foil,
        TranscriptProfile::Epee,
        TranscriptProfile::Sabre,
        TranscriptProfile::Detection,
    ] {
        record_profile(profile)?;
        println!("wrote {}", profile.log_path());
    }
    Ok(())
}

fn record_profile(profile: TranscriptProfile) -> io::Result<()> {
    let mut session = Session::new(profile)?;
    let script: &[&str] = match profile {
        TranscriptProfile::Foil => FOIL_BOUT,
        TranscriptProfile::Epee => EPEE_BOUT,
        TranscriptProfile::Sabre => SABRE_BOUT,
        TranscriptProfile::Detection => DETECTION,
    };
    for line in script {
        session.handle_command(line)?;
    }
    Ok(())
}

/// A press opens the foil's A-B circuit.
const FOIL_BOUT: &[&str] = &[
    "plug",
    "advance 5ms",
    "release tip left",
    "touch lame left",
    "advance 10ms",
    "advance 10ms",
    "touch tip left",
    "release lame left",
    "advance 180ms",
    "release tip right",
    "advance 20ms",
    "touch tip right",
    "status",
    "advance 2600ms",
    "touch blades",
    "advance 5ms",
    "release blades",
    "advance 60ms",
    "status",
];

const EPEE_BOUT: &[&str] = &[
    "touch own left",
    "advance 3ms",
    "touch guard left",
    "advance 1ms",
    "release guard left",
    "advance 10ms",
    "release own left",
    "advance 100ms",
    "reset",
    "touch own right 2000",
    "advance 20ms",
    "touch own right",
    "advance 20ms",
    "release all",
    "touch tip left",
    "advance 300ms",
    "status",
];

const SABRE_BOUT: &[&str] = &[
    "plug",
    "lights 1s",
    "touch lame right",
    "advance 1ms",
    "release lame right",
    "advance 300ms",
    "touch lame left",
    "advance 1ms",
    "release lame left",
    "advance 1500ms",
    "release tip left",
    "advance 300ms",
    "status",
];

const DETECTION: &[&str] = &[
    "plug",
    "touch lame left",
    "touch lame right",
    "advance 2400ms",
    "status",
    "advance 200ms",
    "release all",
    "advance 3000ms",
    "weapon foil",
    "mode hybrid",
    "status",
];
