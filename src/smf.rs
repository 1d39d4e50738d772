//! Standard MIDI File loading.
//!
//! A file is flattened into one list of [`Event`]s covering every track, sorted
//! and timed in samples, ready for [`Engine::run_events`](crate::Engine::run_events)
//! or a [`Player`](crate::Player). Each MIDI channel drives the synthesizer
//! track with the same index through that track's first voice.

use arrayvec::ArrayVec;

#[cfg(feature = "std")]
use thiserror::Error;

use crate::consts::*;
use crate::cursor::Cursor;
use crate::event::{Event, Instruction};
use crate::tempo::{convert_offsets, TempoChange};

/// Possible errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Error))]
pub enum Error {
    #[cfg_attr(feature = "std", error("MIDI file could not be read"))]
    FileNotFound,

    #[cfg_attr(feature = "std", error("Invalid chunk signature"))]
    BadSignature,

    #[cfg_attr(feature = "std", error("Unsupported SMF format {0}"))]
    UnsupportedFormat(u16),

    #[cfg_attr(feature = "std", error("Unsupported time division {0:#06x}"))]
    UnsupportedDivision(u16),

    #[cfg_attr(feature = "std", error("Event buffer is too small"))]
    TooManyEvents,

    #[cfg_attr(feature = "std", error("More than {} tempo changes", MAX_TEMPO_CHANGES))]
    TooManyTempoChanges,
}

// Synth voice driven by every channel
const VOICE: u8 = 0;

const PERCUSSION_CHANNEL: u8 = 9;

// Registered parameter numbers
const RPN_PITCH_BEND_RANGE: u16 = 0x0000;
const RPN_NULL: u16 = 0x3fff;

/// Pitch bend sensitivity of one channel.
#[derive(Clone, Copy, Debug)]
struct BendRange {
    semitones: u8,
    cents: u8,
}

impl Default for BendRange {
    fn default() -> Self {
        BendRange {
            semitones: DEFAULT_BEND_SEMITONES,
            cents: 0,
        }
    }
}

impl BendRange {
    /// Scale a 14-bit wheel position into a bend in 1/256 semitone.
    fn scale(self, raw: u16) -> i16 {
        let cents = i32::from(self.semitones) * 100 + i32::from(self.cents);
        // Full deflection is 0x2000 steps, one semitone is 256 units
        let bend = (i32::from(raw) - 0x2000) * cents / 3200;

        bend.max(i32::from(i16::MIN)).min(i32::from(i16::MAX)) as i16
    }
}

/// Parser state carried across all track chunks.
struct Parser<'e> {
    events: &'e mut [Event],
    nevs: usize,
    tempo_changes: ArrayVec<[TempoChange; MAX_TEMPO_CHANGES]>,
    bend_ranges: [BendRange; NTRACKS],
    rpn: [u16; NTRACKS],
    end_tick: u32,
}

impl<'e> Parser<'e> {
    fn new(events: &'e mut [Event]) -> Self {
        Parser {
            events,
            nevs: 0,
            tempo_changes: ArrayVec::new(),
            bend_ranges: [BendRange::default(); NTRACKS],
            rpn: [RPN_NULL; NTRACKS],
            end_tick: 0,
        }
    }

    fn add_event(&mut self, tick: u32, instruction: Instruction) -> Result<(), Error> {
        // The last slot is kept for the END marker
        if self.nevs + 1 >= self.events.len() {
            return Err(Error::TooManyEvents);
        }
        self.events[self.nevs] = Event::new(tick, instruction);
        self.nevs += 1;

        Ok(())
    }

    /// Insert a tempo change after any others on the same tick, keeping the
    /// map sorted in encounter order.
    fn add_tempo_change(&mut self, tick: u32, usecs_per_quarter: u32) -> Result<(), Error> {
        let index = self
            .tempo_changes
            .iter()
            .position(|change| change.offset > tick)
            .unwrap_or_else(|| self.tempo_changes.len());
        let change = TempoChange {
            offset: tick,
            usecs_per_quarter,
        };

        self.tempo_changes
            .try_insert(index, change)
            .map_err(|_| Error::TooManyTempoChanges)
    }

    /// Scan one track chunk ending at byte position `end`.
    fn read_track(&mut self, cursor: &mut Cursor, end: usize) -> Result<(), Error> {
        let mut tick: u32 = 0;
        let mut status: u8 = 0;

        while cursor.position() < end {
            tick = tick.saturating_add(cursor.read_vlq());

            match cursor.read_u8() {
                0xff => {
                    let kind = cursor.read_u8();
                    let length = cursor.read_vlq() as usize;
                    let start = cursor.position();

                    match kind {
                        0x2f => {
                            self.end_tick = self.end_tick.max(tick);
                            return Ok(());
                        }
                        0x51 => {
                            let usecs_per_quarter = cursor.read_u24();
                            self.add_tempo_change(tick, usecs_per_quarter)?;
                        }
                        _ => log::trace!("skipping meta event {:#04x} ({} bytes)", kind, length),
                    }

                    cursor.seek_to(start.saturating_add(length));
                }
                0xf0..=0xfe => {
                    // SysEx
                    let length = cursor.read_vlq() as usize;
                    cursor.skip(length);
                }
                byte => {
                    // Running status: data bytes reuse the last status byte
                    let arg = if byte < 0x80 {
                        byte
                    } else {
                        status = byte;
                        cursor.read_data()
                    };
                    self.channel_message(cursor, tick, status, arg)?;
                }
            }
        }

        log::warn!("track chunk ended without an end-of-track event");
        self.end_tick = self.end_tick.max(tick);

        Ok(())
    }

    fn channel_message(
        &mut self,
        cursor: &mut Cursor,
        tick: u32,
        status: u8,
        arg: u8,
    ) -> Result<(), Error> {
        let chan = status & 0xf;
        let track = chan;

        match status >> 4 {
            // Note off
            0x8 => {
                cursor.read_data();
                if chan != PERCUSSION_CHANNEL {
                    self.add_event(
                        tick,
                        Instruction::Vel {
                            track,
                            voice: VOICE,
                            velocity: 0,
                        },
                    )?;
                }
            }
            // Note on
            0x9 => {
                let velocity = cursor.read_data();
                if chan == PERCUSSION_CHANNEL {
                    return Ok(());
                }
                self.add_event(
                    tick,
                    Instruction::Vel {
                        track,
                        voice: VOICE,
                        velocity,
                    },
                )?;
                if velocity > 0 {
                    self.add_event(
                        tick,
                        Instruction::Pitch {
                            track,
                            voice: VOICE,
                            pitch: arg,
                        },
                    )?;
                }
            }
            // Polyphonic aftertouch
            0xa => {
                cursor.read_data();
            }
            0xb => self.control_change(cursor, tick, chan, arg)?,
            0xc => {
                let pac = arg % NPACS as u8;
                self.add_event(tick, Instruction::Pac { track, pac })?;
            }
            // Channel pressure
            0xd => (),
            // Pitch wheel
            0xe => {
                let raw = u16::from(arg) | u16::from(cursor.read_data()) << 7;
                let bend = self.bend_ranges[usize::from(chan)].scale(raw);
                self.add_event(
                    tick,
                    Instruction::Wheel {
                        track,
                        voice: VOICE,
                        bend,
                    },
                )?;
            }
            // Data byte before any status byte
            _ => (),
        }

        Ok(())
    }

    fn control_change(
        &mut self,
        cursor: &mut Cursor,
        tick: u32,
        chan: u8,
        controller: u8,
    ) -> Result<(), Error> {
        let value = cursor.read_data();
        let c = usize::from(chan);

        match controller {
            // Data entry MSB
            0x06 => {
                if self.rpn[c] == RPN_PITCH_BEND_RANGE {
                    self.bend_ranges[c].semitones = value;
                }
            }
            0x07 => self.add_event(tick, Instruction::Vol { track: chan, volume: value })?,
            0x0a => self.add_event(tick, Instruction::Pan { track: chan, pan: value })?,
            // Data entry LSB
            0x26 => {
                if self.rpn[c] == RPN_PITCH_BEND_RANGE {
                    self.bend_ranges[c].cents = value;
                }
            }
            // NRPN LSB and MSB
            0x62 | 0x63 => self.rpn[c] = RPN_NULL,
            // RPN LSB
            0x64 => self.rpn[c] = (self.rpn[c] & 0x3f80) | u16::from(value),
            // RPN MSB
            0x65 => self.rpn[c] = (self.rpn[c] & 0x007f) | u16::from(value) << 7,
            _ => (),
        }

        Ok(())
    }

    /// Sort, terminate and time the collected events.
    fn finish(self, ticks_per_quarter: u16) -> Result<&'e mut [Event], Error> {
        let Parser {
            events,
            nevs,
            tempo_changes,
            end_tick,
            ..
        } = self;

        if nevs >= events.len() {
            return Err(Error::TooManyEvents);
        }
        let events = &mut events[..=nevs];

        // Note offs go first on a shared tick so they never cut a new note
        events[..nevs].sort_unstable_by_key(|event| {
            let note_on = match event.instruction() {
                Some(Instruction::Vel { velocity: 0, .. }) => 0,
                _ => 1,
            };
            (event.offset, note_on)
        });

        let last = events[..nevs].last().map_or(0, |event| event.offset);
        events[nevs] = Event::new(end_tick.max(last), Instruction::End);

        convert_offsets(ticks_per_quarter, &tempo_changes, events);
        log::debug!(
            "loaded {} events and {} tempo changes",
            nevs,
            tempo_changes.len()
        );

        Ok(events)
    }
}

/// Parse a Standard MIDI File held in memory.
///
/// Events are written into the caller's `events` buffer, which must also have
/// room for the terminating [`Instruction::End`]. On success the filled part
/// of the buffer is returned, sorted with offsets in samples. On error the
/// buffer contents are unspecified.
///
/// The list always ends with one END event at the end of the longest track,
/// after the events the MIDI messages map to. A single note therefore yields
/// four events: two VEL, one PITCH and the END.
///
/// ```rust
/// let smf = [
///     0x4d, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xe0, // MThd
///     0x4d, 0x54, 0x72, 0x6b, 0, 0, 0, 4, // MTrk
///     0x00, 0xff, 0x2f, 0x00, // end of track
/// ];
/// let mut buffer = [qms::Event::default(); 16];
/// let events = qms::smf::parse(&smf, &mut buffer).unwrap();
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].instruction(), Some(qms::Instruction::End));
/// ```
pub fn parse<'e>(data: &[u8], events: &'e mut [Event]) -> Result<&'e mut [Event], Error> {
    let mut cursor = Cursor::new(data);

    if &cursor.read_tag() != b"MThd" || cursor.read_u32() != 6 {
        return Err(Error::BadSignature);
    }

    let format = cursor.read_u16();
    if format > 1 {
        return Err(Error::UnsupportedFormat(format));
    }

    let ntracks = cursor.read_u16();

    // Only ticks per quarter note; SMPTE frames are not supported
    let division = cursor.read_u16();
    if division & 0x8000 != 0 || division == 0 {
        return Err(Error::UnsupportedDivision(division));
    }

    log::debug!(
        "format {}, {} tracks, {} ticks per quarter note",
        format,
        ntracks,
        division
    );

    let mut parser = Parser::new(events);
    for _ in 0..ntracks {
        if &cursor.read_tag() != b"MTrk" {
            return Err(Error::BadSignature);
        }
        let length = cursor.read_u32() as usize;
        let end = cursor.position().saturating_add(length).min(cursor.len());

        parser.read_track(&mut cursor, end)?;
        cursor.seek_to(end);
    }

    parser.finish(division)
}

/// Read and parse a Standard MIDI File. (Requires `std` feature.)
///
/// Any failure to read the file is reported as [`Error::FileNotFound`].
#[cfg(feature = "std")]
pub fn load_file<'e, P>(path: P, events: &'e mut [Event]) -> Result<&'e mut [Event], Error>
where
    P: AsRef<std::path::Path>,
{
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| {
        log::debug!("{}: {}", path.display(), e);
        Error::FileNotFound
    })?;

    parse(&data, events)
}
