/// Number of synthesizer tracks, one per MIDI channel.
pub const NTRACKS: usize = 16;
/// Voice slots per track.
pub const NVOICES: usize = 8;
/// Number of wavetables (timbres) a track can select.
pub const NPACS: usize = 2;

// Wavetable size is N = 2^NEXP samples
pub(crate) const NEXP: u32 = 11;
/// Wavetable length in samples.
pub const N: usize = 1 << NEXP;

/// Output sample rate in samples per second.
pub const R: u32 = 44100;

// Phase accumulators are NEXP.NEXP fixed point
pub(crate) const PHASE_MASK: u32 = (1 << (NEXP * 2)) - 1;

/// Microseconds per quarter note until the first tempo change.
pub const DEFAULT_TEMPO: u32 = 500_000;
/// Capacity of the tempo map built while parsing.
pub const MAX_TEMPO_CHANGES: usize = 1024;

pub(crate) const DEFAULT_BEND_SEMITONES: u8 = 2;

// Pitch bends are expressed in 1/256 semitone, which spans any RPN range
pub(crate) const BEND_SHIFT: u32 = 8;
