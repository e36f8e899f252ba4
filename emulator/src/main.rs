mod circuit;
mod script;
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use session::{Outcome, Session, TranscriptProfile, USAGE};

fn main() -> io::Result<ExitCode> {
    let profile = match TranscriptProfile::from_args(env::args().skip(1)) {
        Ok(profile) => profile,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{USAGE}");
            return Ok(ExitCode::from(2));
        }
    };

    let mut session = Session::new(profile)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{}", session.banner())?;
    prompt(&mut out)?;

    for line in io::stdin().lock().lines() {
        match session.respond(&line?)? {
            Outcome::Reply(lines) => {
                for reply in lines {
                    writeln!(out, "{reply}")?;
                }
            }
            Outcome::Closed(farewell) => {
                writeln!(out, "{farewell}")?;
                return Ok(ExitCode::SUCCESS);
            }
        }
        prompt(&mut out)?;
    }

    writeln!(out)?;
    Ok(ExitCode::SUCCESS)
}

fn prompt(out: &mut impl Write) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}
