use crate::event::{Event, Instruction};
use crate::synth::{AudioSink, Engine};

impl Engine {
    /// Apply a single event to the synthesizer state.
    ///
    /// Returns `true` for [`Instruction::End`], which tells the caller to stop.
    /// Words with an unknown kind are ignored.
    ///
    /// # Panics
    ///
    /// The track and voice fields index the engine directly, and a PAC
    /// argument selects a wavetable. A PAC of [`NPACS`](crate::NPACS) or more
    /// panics, like any out-of-range index. Events produced by
    /// [`smf::parse`](crate::smf::parse) always satisfy this.
    pub fn run_event(&mut self, event: &Event) -> bool {
        match event.instruction() {
            Some(Instruction::End) => return true,
            Some(Instruction::Pac { track, pac }) => self.set_pac(track.into(), pac.into()),
            Some(Instruction::Vol { track, volume }) => self.set_volume(track.into(), volume),
            Some(Instruction::Pan { track, pan }) => self.set_pan(track.into(), pan),
            Some(Instruction::Vel {
                track,
                voice,
                velocity,
            }) => self.set_velocity(track.into(), voice.into(), velocity),
            Some(Instruction::Pitch {
                track,
                voice,
                pitch,
            }) => self.set_note(track.into(), voice.into(), pitch),
            Some(Instruction::Wheel { track, voice, bend }) => {
                self.set_wheel(track.into(), voice.into(), bend)
            }
            None => log::warn!("ignoring unknown event word {:#010x}", event.word),
        }

        false
    }

    /// Play a sorted event list into `sink`.
    ///
    /// Before each event the gap since the previous one (or since zero) is
    /// rendered, so the sink receives exactly as many frames as the offset of
    /// the last event applied. Playback stops after the last event or at the
    /// first END.
    ///
    /// ```rust
    /// use qms::{Engine, Event, Instruction};
    ///
    /// let events = [
    ///     Event::new(0, Instruction::Vel { track: 0, voice: 0, velocity: 100 }),
    ///     Event::new(0, Instruction::Pitch { track: 0, voice: 0, pitch: 69 }),
    ///     Event::new(4410, Instruction::End),
    /// ];
    ///
    /// let mut frames = 0;
    /// Engine::new().run_events(&events, &mut |_: i16, _: i16| frames += 1);
    /// assert_eq!(frames, 4410);
    /// ```
    pub fn run_events<S>(&mut self, events: &[Event], sink: &mut S)
    where
        S: AudioSink + ?Sized,
    {
        let mut offset = 0;

        for event in events {
            debug_assert!(event.offset >= offset, "events out of order");
            self.advance(event.offset.saturating_sub(offset), sink);
            offset = offset.max(event.offset);

            if self.run_event(event) {
                break;
            }
        }
    }
}

/// Pull-based playback of an event list. `Player` implements `Iterator`, so
/// calling the `next` method on it will render the next stereo frame.
///
/// The frames are the same ones [`Engine::run_events`] would push to a sink.
///
/// ```rust
/// use qms::{Event, Instruction, Player};
///
/// let events = [
///     Event::new(0, Instruction::Vel { track: 0, voice: 0, velocity: 100 }),
///     Event::new(100, Instruction::End),
/// ];
/// let player = Player::new(&events);
/// assert_eq!(player.count(), 100);
/// ```
#[derive(Clone)]
pub struct Player<'a> {
    engine: Engine,
    events: &'a [Event],
    next_event: usize,
    position: u32,
    done: bool,
}

impl<'a> Player<'a> {
    /// Play `events` on a fresh engine.
    pub fn new(events: &'a [Event]) -> Self {
        Self::with_engine(Engine::new(), events)
    }

    /// Play `events` on an engine in any prior state.
    pub fn with_engine(engine: Engine, events: &'a [Event]) -> Self {
        Player {
            engine,
            events,
            next_event: 0,
            position: 0,
            done: false,
        }
    }

    /// Number of frames rendered so far.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// The synthesizer state after the frames rendered so far.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Stop playback and keep the synthesizer, e.g. to continue with
    /// [`Player::with_engine`] on another event list.
    pub fn into_engine(self) -> Engine {
        self.engine
    }
}

impl<'a> Iterator for Player<'a> {
    type Item = [i16; 2];

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while let Some(event) = self.events.get(self.next_event) {
            if event.offset > self.position {
                // Render up to the next event
                let frame = self.engine.render_frame();
                self.position += 1;
                return Some(frame);
            }

            self.next_event += 1;
            if self.engine.run_event(event) {
                break;
            }
        }

        self.done = true;
        None
    }
}
