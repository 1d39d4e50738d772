use crate::consts::*;
use crate::fixed::{phase_step, saturate, sin_bhaskara};

/// Receives the rendered audio, one stereo frame at a time.
///
/// Any `FnMut(i16, i16)` closure is a sink:
///
/// ```rust
/// let mut peak = 0;
/// let mut engine = qms::Engine::new();
/// engine.advance(16, &mut |left: i16, right: i16| {
///     peak = peak.max(left.abs()).max(right.abs());
/// });
/// assert_eq!(peak, 0);
/// ```
pub trait AudioSink {
    fn put_sample(&mut self, left: i16, right: i16);
}

impl<F> AudioSink for F
where
    F: FnMut(i16, i16),
{
    fn put_sample(&mut self, left: i16, right: i16) {
        self(left, right)
    }
}

/// The main struct for audio synthesis: 16 tracks of 8 wavetable voices each,
/// mixed down to 16-bit stereo at [`R`] Hz.
///
/// All state lives in the `Engine` value itself, so independent engines can be
/// driven side by side. Track and voice indices passed to the setters must be
/// below [`NTRACKS`] and [`NVOICES`]; anything else panics.
#[derive(Clone)]
pub struct Engine {
    wavetables: [[i16; N]; NPACS],
    tracks: [TrackState; NTRACKS],
    voices: [[VoiceState; NVOICES]; NTRACKS],
}

/// Per-track mixing state. The defaults (all zero) mean full volume and
/// center pan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TrackState {
    pac: usize, // < NPACS
    vol: i32,   // 0 (loudest) - 127 (silent)
    pan: i32,   // (-64) - (+63)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct VoiceState {
    phase_acc: u32,  // NEXP.NEXP fixed point
    phase_step: u32, // NEXP.NEXP fixed point
    velocity: i32,   // 0-127
    pitch: u8,
    bend: i16, // 1/256 semitone
}

impl TrackState {
    /// Left and right channel weights, each below 2^14.
    fn weights(&self) -> (i32, i32) {
        let gain = 127 - self.vol;
        ((63 - self.pan) * gain, (63 + self.pan) * gain)
    }
}

/// Build the wavetables: a sawtooth and a Bhaskara sine.
fn load_wavetables() -> [[i16; N]; NPACS] {
    let mut wavetables = [[0; N]; NPACS];
    let max = i32::from(i16::MAX);

    for (i, sample) in wavetables[0].iter_mut().enumerate() {
        *sample = (((i as i32 * max) >> (NEXP - 1)) - max) as i16;
    }
    for (i, sample) in wavetables[1].iter_mut().enumerate() {
        *sample = sin_bhaskara(i as u32);
    }

    wavetables
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create a silent engine with every track at full volume and center pan.
    pub fn new() -> Self {
        Engine {
            wavetables: load_wavetables(),
            tracks: [TrackState::default(); NTRACKS],
            voices: [[VoiceState::default(); NVOICES]; NTRACKS],
        }
    }

    /// Select the wavetable of `track`.
    ///
    /// # Panics
    ///
    /// Panics if `pac` is not below [`NPACS`].
    pub fn set_pac(&mut self, track: usize, pac: usize) {
        assert!(pac < NPACS, "pac {} out of range", pac);
        self.tracks[track].pac = pac;
    }

    /// Set the MIDI channel volume (0-127) of `track`.
    pub fn set_volume(&mut self, track: usize, midi_volume: u8) {
        self.tracks[track].vol = 127 - i32::from(midi_volume.min(127));
    }

    /// Set the MIDI pan (0-127, 64 is the center) of `track`.
    pub fn set_pan(&mut self, track: usize, midi_pan: u8) {
        self.tracks[track].pan = i32::from(midi_pan.min(127)) - 64;
    }

    /// Set the amplitude (0-127) of a voice.
    pub fn set_velocity(&mut self, track: usize, voice: usize, velocity: u8) {
        self.voices[track][voice].velocity = i32::from(velocity.min(127));
    }

    /// Retune a voice to a MIDI note, keeping its current pitch bend.
    pub fn set_note(&mut self, track: usize, voice: usize, midi_pitch: u8) {
        let voice = &mut self.voices[track][voice];
        voice.phase_step = phase_step(midi_pitch, voice.bend);
        voice.pitch = midi_pitch;
    }

    /// Bend a voice away from its current note. `bend` is in 1/256
    /// semitone; zero is the unbent pitch.
    pub fn set_wheel(&mut self, track: usize, voice: usize, bend: i16) {
        let voice = &mut self.voices[track][voice];
        voice.phase_step = phase_step(voice.pitch, bend);
        voice.bend = bend;
    }

    /// Render a single stereo frame and advance every oscillator by one
    /// sample.
    pub fn render_frame(&mut self) -> [i16; 2] {
        let mut left: i32 = 0;
        let mut right: i32 = 0;

        for (track, voices) in self.tracks.iter().zip(self.voices.iter_mut()) {
            let (lvol, rvol) = track.weights();
            let table = &self.wavetables[track.pac];

            for voice in voices.iter_mut() {
                let amp = i32::from(table[(voice.phase_acc >> NEXP) as usize]) * voice.velocity >> 7;
                left += amp * lvol >> 14;
                right += amp * rvol >> 14;

                voice.phase_acc = voice.phase_acc.wrapping_add(voice.phase_step) & PHASE_MASK;
            }
        }

        // Saturate rather than wrap when narrowing to 16 bits
        [saturate(left), saturate(right)]
    }

    /// Render `nsamples` stereo frames into `sink`.
    pub fn advance<S>(&mut self, nsamples: u32, sink: &mut S)
    where
        S: AudioSink + ?Sized,
    {
        for _ in 0..nsamples {
            let [left, right] = self.render_frame();
            sink.put_sample(left, right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sawtooth_ramp() {
        let engine = Engine::new();
        let saw = &engine.wavetables[0];

        assert_eq!(saw[0], -i16::MAX);
        assert_eq!(saw[N / 2], 0);
        assert_eq!(saw[N - 1], 32735);
        for pair in saw.windows(2) {
            let rise = pair[1] - pair[0];
            assert!(rise == 31 || rise == 32, "rise of {}", rise);
        }
    }

    #[test]
    fn sine_table_symmetry() {
        let engine = Engine::new();
        let sine = &engine.wavetables[1];

        for i in 0..N / 2 {
            assert_eq!(sine[i + N / 2], -sine[i]);
        }
        assert_eq!(sine[N / 4], 32766);
    }

    #[test]
    fn default_track_is_loud_and_centered() {
        let engine = Engine::new();
        for track in engine.tracks.iter() {
            assert_eq!(track.weights(), (63 * 127, 63 * 127));
        }
    }

    #[test]
    fn track_setters() {
        let mut engine = Engine::new();
        engine.set_volume(2, 127);
        engine.set_pan(2, 0);
        engine.set_pac(2, 1);
        assert_eq!(
            engine.tracks[2],
            TrackState {
                pac: 1,
                vol: 0,
                pan: -64
            }
        );
        assert_eq!(engine.tracks[2].weights(), (127 * 127, -127));

        engine.set_volume(3, 0);
        assert_eq!(engine.tracks[3].weights(), (0, 0));

        // Other tracks are untouched
        assert_eq!(engine.tracks[1], TrackState::default());
    }

    #[test]
    fn centered_wheel_is_a_no_op() {
        let mut engine = Engine::new();
        engine.set_note(0, 0, 69);
        let step = engine.voices[0][0].phase_step;

        engine.set_wheel(0, 0, 0);
        assert_eq!(engine.voices[0][0].phase_step, step);

        engine.set_wheel(0, 0, 256);
        assert_eq!(engine.voices[0][0].phase_step, phase_step(70, 0));

        // Retuning keeps the bend
        engine.set_note(0, 0, 60);
        assert_eq!(engine.voices[0][0].phase_step, phase_step(61, 0));
        assert_eq!(engine.voices[0][0].pitch, 60);
    }

    #[test]
    fn silent_by_default() {
        let mut engine = Engine::new();
        for _ in 0..64 {
            assert_eq!(engine.render_frame(), [0, 0]);
        }
    }

    #[test]
    fn phase_is_additive() {
        let setup = |engine: &mut Engine| {
            for (t, pitch) in [(0, 21), (3, 69), (7, 127), (15, 100)].iter() {
                engine.set_note(*t, 1, *pitch);
                engine.set_velocity(*t, 1, 90);
            }
            engine.set_wheel(3, 1, -1234);
        };

        let mut whole = Engine::new();
        setup(&mut whole);
        let mut frames_whole = [[0; 2]; 5000];
        let mut i = 0;
        whole.advance(5000, &mut |l: i16, r: i16| {
            frames_whole[i] = [l, r];
            i += 1;
        });

        for &split in [0, 1, 777, 2048, 4999].iter() {
            let mut parts = Engine::new();
            setup(&mut parts);
            let mut frames = [[0; 2]; 5000];
            let mut i = 0;
            let mut sink = |l: i16, r: i16| {
                frames[i] = [l, r];
                i += 1;
            };
            parts.advance(split, &mut sink);
            parts.advance(5000 - split, &mut sink);

            assert_eq!(parts.voices, whole.voices, "split at {}", split);
            assert!(frames.iter().eq(frames_whole.iter()), "split at {}", split);
        }
    }

    #[test]
    fn phase_wraps_within_table() {
        let mut engine = Engine::new();
        engine.set_note(0, 0, 127);
        for _ in 0..100_000 {
            engine.render_frame();
            assert!(engine.voices[0][0].phase_acc <= PHASE_MASK);
        }
    }

    #[test]
    fn output_saturates() {
        let mut engine = Engine::new();
        for t in 0..NTRACKS {
            for v in 0..NVOICES {
                engine.set_velocity(t, v, 127);
            }
        }

        // Every sawtooth voice sits at its most negative sample
        assert_eq!(engine.render_frame(), [i16::MIN, i16::MIN]);

        for t in 0..NTRACKS {
            engine.set_pac(t, 1);
            for v in 0..NVOICES {
                engine.voices[t][v].phase_acc = (N as u32 / 4) << NEXP;
            }
        }
        assert_eq!(engine.render_frame(), [i16::MAX, i16::MAX]);
    }

    #[test]
    fn pan_moves_the_image() {
        let mut engine = Engine::new();
        engine.set_velocity(0, 0, 127);
        engine.set_pan(0, 127);

        // Saw starts negative; only the right channel hears it
        let [left, right] = engine.render_frame();
        assert_eq!(left, 0);
        assert!(right < -30000, "{}", right);
    }

    #[test]
    fn engines_are_independent() {
        let mut a = Engine::new();
        let b = Engine::new();
        a.set_velocity(0, 0, 127);
        a.set_note(0, 0, 60);
        a.render_frame();
        assert_eq!(b.voices[0][0], VoiceState::default());
    }
}
