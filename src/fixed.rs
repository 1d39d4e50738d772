//! Fixed-point arithmetic shared by the synthesizer: the sine approximation
//! used to fill the wavetables, the `e^x - 1` series behind pitch bends, and
//! output saturation.

use crate::consts::*;

/// Integer frequencies of MIDI notes 0-11 multiplied by `N`, to be used as
/// fixed point with NEXP.NEXP precision.
const FREQ: [u32; 12] = [
    16744, 17740, 18795, 19912, 21096, 22351, 23680, 25088, 26580, 28160, 29834, 31609,
];

/// `ln(2) / 12` (the natural log of one semitone) as 0.32 fixed point.
const LN_SEMITONE: u64 = 248_087_039;

/// Sine approximation using Bhaskara I's formula.
///
/// The input covers one full cycle in `[0, 2048)`; higher bits are ignored.
/// The output is in `[-i16::MAX, i16::MAX]`.
pub(crate) fn sin_bhaskara(i: u32) -> i16 {
    let i = i & 2047;
    let sign = if i >> 10 == 0 { 1 } else { -1 };
    let i = i & 1023;

    // Peaks at 360 * 11796480, which still fits in 32 bits
    let c = i * (46080 - 45 * i);
    let n = 360 * c;
    let d = 162_005 - (90 * c >> 15);

    sign * (n / d) as i16
}

/// Approximate `e^x - 1` with a truncated power series.
///
/// `x` is a fraction in `[0, 1)` scaled to the full `u32` range, and so is the
/// result. Terms are generated until one truncates to zero. The sum wraps for
/// inputs above `ln(2)`, so callers keep `x` well below that.
pub(crate) fn exp_m1(x: u32) -> u32 {
    let mut sum: u32 = 0;
    let mut term = x;
    let mut i = 1;

    while term != 0 {
        sum = sum.wrapping_add(term);
        i += 1;
        term = (term >> 13) * (x >> 19) / i;
    }

    sum
}

/// Clamp a mixing accumulator to the 16-bit sample range.
#[inline]
pub(crate) fn saturate(sample: i32) -> i16 {
    sample.max(i32::from(i16::MIN)).min(i32::from(i16::MAX)) as i16
}

/// Phase step for an unbent semitone, `m = octave * 12 + note`.
fn semitone_step(m: u32) -> u32 {
    let octave = m / 12;
    let note = (m % 12) as usize;

    ((u64::from(FREQ[note]) << (octave + NEXP)) / u64::from(R)) as u32
}

/// Convert a MIDI pitch and a signed bend (in 1/256 semitone) into the
/// per-sample phase step of a voice.
///
/// Whole semitones come from the frequency table; the remaining fraction of a
/// semitone scales the step by `1 + exp_m1(fraction * ln(2) / 12)`. A bend of
/// zero always yields the plain table value.
pub(crate) fn phase_step(pitch: u8, bend: i16) -> u32 {
    let position = (i32::from(pitch) << BEND_SHIFT) + i32::from(bend);
    let position = position.max(0) as u32;

    let step = semitone_step(position >> BEND_SHIFT);
    let fraction = position & ((1 << BEND_SHIFT) - 1);
    if fraction == 0 {
        return step;
    }

    let x = (u64::from(fraction) * LN_SEMITONE) >> BEND_SHIFT;
    let ratio = u64::from(exp_m1(x as u32));

    step + ((u64::from(step) * ratio) >> 32) as u32
}
