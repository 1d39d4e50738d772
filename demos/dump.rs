#![deny(clippy::all)]
#![forbid(unsafe_code)]

use colored::Colorize;
use error_iter::ErrorIter as _;
use qms::{smf, Event};
use std::process::ExitCode;
use thiserror::Error;

const MAX_EVENTS: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing mid-file argument\nUsage: dump <mid-file>")]
    MissingFilename,

    #[error("MIDI error")]
    Midi(#[from] qms::Error),
}

fn main() -> ExitCode {
    match dump() {
        Err(e) => {
            eprintln!("{} {}", "error:".red(), e);

            for cause in e.sources().skip(1) {
                eprintln!("{} {}", "caused by:".bright_red(), cause);
            }

            ExitCode::FAILURE
        }
        Ok(()) => ExitCode::SUCCESS,
    }
}

fn dump() -> Result<(), Error> {
    let filename = std::env::args().nth(1).ok_or(Error::MissingFilename)?;

    let mut buffer = vec![Event::default(); MAX_EVENTS];
    let events = smf::load_file(filename, &mut buffer)?;

    for event in events.iter() {
        let seconds = f64::from(event.offset) / f64::from(qms::R);
        let offset = format!("{:>10} {:>9.3}s", event.offset, seconds);

        match event.instruction() {
            Some(instruction) => println!("{}  {:?}", offset.dimmed(), instruction),
            None => println!("{}  {}", offset.dimmed(), format!("{:#010x}", event.word).yellow()),
        }
    }
    println!("{} events", events.len());

    Ok(())
}
