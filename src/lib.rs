//! A tiny fixed-point wavetable synthesizer driven by Standard MIDI Files.
//!
//! Loading a file with [`smf::parse`] produces a flat, time-sorted list of
//! [`Event`]s. Playing that list on an [`Engine`] renders 16-bit stereo frames
//! at [`R`] Hz, either pushed to an [`AudioSink`] by [`Engine::run_events`] or
//! pulled one at a time from a [`Player`].
//!
//! The crate is `no_std` when the default `std` feature is disabled, and never
//! allocates: every buffer is either fixed size or provided by the caller.

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![forbid(unsafe_code)]

mod consts;
mod cursor;
mod event;
mod fixed;
mod sequencer;
pub mod smf;
mod synth;
mod tempo;

pub use consts::{DEFAULT_TEMPO, MAX_TEMPO_CHANGES, N, NPACS, NTRACKS, NVOICES, R};
pub use event::{Event, EventKind, Instruction};
pub use sequencer::Player;
pub use smf::Error;
pub use synth::{AudioSink, Engine};
pub use tempo::{convert_offsets, TempoChange};
