#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![forbid(unsafe_code)]

use arrayvec::ArrayVec;
use colored::Colorize;
use error_iter::ErrorIter as _;
use qms::{smf, Event, Player};
use riff_wave::{WaveWriter, WriteError};
use std::{fs::File, io::BufWriter, process::ExitCode};
use thiserror::Error;

const MAX_EVENTS: usize = 1 << 20;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Missing mid-file argument\nUsage: writer <mid-file> <wav-file>")]
    MissingMidFilename,

    #[error("Missing wav-file argument\nUsage: writer <mid-file> <wav-file>")]
    MissingWavFilename,

    #[error("MIDI error")]
    Midi(#[from] qms::Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Wave writer error")]
    Writer(#[from] WriteError),
}

fn main() -> ExitCode {
    match writer() {
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

fn writer() -> Result<(), Error> {
    let mut args = std::env::args().skip(1);
    let mid_filename = args.next().ok_or(Error::MissingMidFilename)?;
    let wav_filename = args.next().ok_or(Error::MissingWavFilename)?;

    // Load the MIDI file into a flat event list
    let mut buffer = vec![Event::default(); MAX_EVENTS];
    let events = smf::load_file(mid_filename, &mut buffer)?;

    // Write the wav file
    let file = File::create(wav_filename)?;
    let writer = BufWriter::new(file);
    let mut wave_writer = WaveWriter::new(2, qms::R, 16, writer)?;

    for sample in Player::new(events).flat_map(ArrayVec::from) {
        wave_writer.write_sample_i16(sample)?;
    }

    Ok(())
}
