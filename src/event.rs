//! Packed synthesizer events.
//!
//! An `Event` is the unit shared by the MIDI parser and the sequencer: an
//! absolute offset and a 32-bit instruction word laid out as
//!
//! ```text
//!  31..28   27   26..24   23..16   15..0
//!  track    -    voice    kind     argument
//! ```
//!
//! The word is only ever inspected through [`Instruction::decode`].

/// Event kinds. The discriminants are the wire values of the kind field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    End = 0,
    Pac,
    Vol,
    Pan,
    Vel,
    Pitch,
    Wheel,
}

impl EventKind {
    fn from_u8(kind: u8) -> Option<EventKind> {
        Some(match kind {
            0 => EventKind::End,
            1 => EventKind::Pac,
            2 => EventKind::Vol,
            3 => EventKind::Pan,
            4 => EventKind::Vel,
            5 => EventKind::Pitch,
            6 => EventKind::Wheel,
            _ => return None,
        })
    }
}

/// A decoded instruction word.
///
/// Track indices are below [`NTRACKS`](crate::NTRACKS) and voice indices below
/// [`NVOICES`](crate::NVOICES); encoding keeps only 4 and 3 bits of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Stop playback.
    End,
    /// Select the wavetable of a track.
    Pac { track: u8, pac: u8 },
    /// MIDI channel volume, 0-127.
    Vol { track: u8, volume: u8 },
    /// MIDI pan, 0-127 with 64 at the center.
    Pan { track: u8, pan: u8 },
    /// Voice amplitude, 0-127. Zero silences the voice.
    Vel { track: u8, voice: u8, velocity: u8 },
    /// MIDI note number of a voice.
    Pitch { track: u8, voice: u8, pitch: u8 },
    /// Pitch bend of a voice in 1/256 semitone, zero at the center.
    Wheel { track: u8, voice: u8, bend: i16 },
}

fn pack(track: u8, voice: u8, kind: EventKind, arg: u16) -> u32 {
    (u32::from(track & 0xf) << 28)
        | (u32::from(voice & 0x7) << 24)
        | (u32::from(kind as u8) << 16)
        | u32::from(arg)
}

impl Instruction {
    /// The kind tag of this instruction.
    pub fn kind(&self) -> EventKind {
        match self {
            Instruction::End => EventKind::End,
            Instruction::Pac { .. } => EventKind::Pac,
            Instruction::Vol { .. } => EventKind::Vol,
            Instruction::Pan { .. } => EventKind::Pan,
            Instruction::Vel { .. } => EventKind::Vel,
            Instruction::Pitch { .. } => EventKind::Pitch,
            Instruction::Wheel { .. } => EventKind::Wheel,
        }
    }

    /// Pack into the wire format.
    pub fn encode(self) -> u32 {
        let kind = self.kind();
        match self {
            Instruction::End => pack(0, 0, kind, 0),
            Instruction::Pac { track, pac } => pack(track, 0, kind, pac.into()),
            Instruction::Vol { track, volume } => pack(track, 0, kind, volume.into()),
            Instruction::Pan { track, pan } => pack(track, 0, kind, pan.into()),
            Instruction::Vel {
                track,
                voice,
                velocity,
            } => pack(track, voice, kind, velocity.into()),
            Instruction::Pitch {
                track,
                voice,
                pitch,
            } => pack(track, voice, kind, pitch.into()),
            Instruction::Wheel { track, voice, bend } => pack(track, voice, kind, bend as u16),
        }
    }

    /// Unpack a wire word. Returns `None` for unknown kind tags.
    ///
    /// Byte-sized arguments keep only their low byte.
    pub fn decode(word: u32) -> Option<Instruction> {
        let track = (word >> 28) as u8;
        let voice = ((word >> 24) & 0x7) as u8;
        let arg = word as u16;
        let byte = arg as u8;

        Some(match EventKind::from_u8((word >> 16) as u8)? {
            EventKind::End => Instruction::End,
            EventKind::Pac => Instruction::Pac { track, pac: byte },
            EventKind::Vol => Instruction::Vol {
                track,
                volume: byte,
            },
            EventKind::Pan => Instruction::Pan { track, pan: byte },
            EventKind::Vel => Instruction::Vel {
                track,
                voice,
                velocity: byte,
            },
            EventKind::Pitch => Instruction::Pitch {
                track,
                voice,
                pitch: byte,
            },
            EventKind::Wheel => Instruction::Wheel {
                track,
                voice,
                bend: arg as i16,
            },
        })
    }
}

/// A time-stamped instruction.
///
/// The offset is absolute: ticks while a file is being parsed, samples once it
/// has been converted for playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Event {
    pub offset: u32,
    pub word: u32,
}

impl Event {
    /// Create an event from a decoded instruction.
    pub fn new(offset: u32, instruction: Instruction) -> Self {
        Event {
            offset,
            word: instruction.encode(),
        }
    }

    /// Decode the instruction word.
    pub fn instruction(&self) -> Option<Instruction> {
        Instruction::decode(self.word)
    }
}
