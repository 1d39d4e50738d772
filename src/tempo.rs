//! Tick to sample conversion over a tempo map.

use crate::consts::*;
use crate::event::Event;

/// A tempo change at an absolute tick offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TempoChange {
    pub offset: u32,
    pub usecs_per_quarter: u32,
}

/// Samples spanned by `ticks` at a constant tempo.
fn ticks_to_samples(ticks: u32, usecs_per_quarter: u32, ticks_per_quarter: u16) -> u64 {
    let usecs = u64::from(ticks) * u64::from(usecs_per_quarter) / u64::from(ticks_per_quarter);
    usecs * u64::from(R / 100) / 10000
}

/// Rewrite the offsets of tick-sorted `events` from ticks to samples.
///
/// `tempo_changes` must be sorted by tick. Until the first change the tempo
/// is [`DEFAULT_TEMPO`]. Each event's distance from the previous one is
/// converted in one step, at the tempo set by the changes at or before the
/// previous event's tick; those take effect in order, so the last of several
/// changes on one tick wins. A change that falls between two events only
/// applies from the following gap on.
///
/// ```rust
/// use qms::{Event, Instruction};
///
/// let mut events = [Event::new(480, Instruction::End)];
/// qms::convert_offsets(480, &[], &mut events);
/// assert_eq!(events[0].offset, 22050);
/// ```
pub fn convert_offsets(ticks_per_quarter: u16, tempo_changes: &[TempoChange], events: &mut [Event]) {
    debug_assert!(ticks_per_quarter > 0);

    let mut changes = tempo_changes.iter().peekable();
    let mut usecs_per_quarter = DEFAULT_TEMPO;
    let mut tick = 0;
    let mut total_samples: u64 = 0;

    for event in events.iter_mut() {
        while let Some(change) = changes.next_if(|change| change.offset <= tick) {
            usecs_per_quarter = change.usecs_per_quarter;
        }

        let target = event.offset.max(tick);
        total_samples += ticks_to_samples(target - tick, usecs_per_quarter, ticks_per_quarter);
        tick = target;

        event.offset = total_samples.min(u64::from(u32::max_value())) as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Instruction;

    fn events_at(ticks: &[u32], events: &mut [Event]) {
        for (event, &tick) in events.iter_mut().zip(ticks) {
            *event = Event::new(tick, Instruction::End);
        }
    }

    fn offsets(events: &[Event]) -> [u32; 4] {
        let mut offsets = [0; 4];
        for (offset, event) in offsets.iter_mut().zip(events) {
            *offset = event.offset;
        }
        offsets
    }

    #[test]
    fn quarter_note_at_default_tempo() {
        assert_eq!(ticks_to_samples(480, 500_000, 480), 22050);
        assert_eq!(ticks_to_samples(0, 500_000, 480), 0);
        assert_eq!(ticks_to_samples(96, 500_000, 96), 22050);
    }

    #[test]
    fn cumulative_offsets() {
        let mut events = [Event::default(); 4];
        events_at(&[0, 480, 480, 1440], &mut events);
        convert_offsets(480, &[], &mut events);
        assert_eq!(offsets(&events), [0, 22050, 22050, 66150]);
    }

    #[test]
    fn tempo_change_on_event_tick() {
        let changes = [TempoChange {
            offset: 480,
            usecs_per_quarter: 250_000,
        }];
        let mut events = [Event::default(); 4];
        events_at(&[0, 480, 960, 1440], &mut events);
        convert_offsets(480, &changes, &mut events);
        assert_eq!(offsets(&events), [0, 22050, 33075, 44100]);
    }

    #[test]
    fn last_change_on_a_tick_wins() {
        let changes = [
            TempoChange {
                offset: 0,
                usecs_per_quarter: 1_000_000,
            },
            TempoChange {
                offset: 0,
                usecs_per_quarter: 250_000,
            },
        ];
        let mut events = [Event::default(); 4];
        events_at(&[0, 480, 960, 960], &mut events);
        convert_offsets(480, &changes, &mut events);
        assert_eq!(offsets(&events), [0, 11025, 22050, 22050]);
    }

    #[test]
    fn tempo_change_inside_a_gap_waits_for_the_next_event() {
        let changes = [TempoChange {
            offset: 480,
            usecs_per_quarter: 1_000_000,
        }];
        let mut events = [Event::default(); 4];
        events_at(&[0, 960, 1440, 1440], &mut events);
        convert_offsets(480, &changes, &mut events);
        // 960 ticks at the default tempo, then 480 at the new one
        assert_eq!(offsets(&events), [0, 44100, 88200, 88200]);
    }

    #[test]
    fn no_overflow_on_long_gaps() {
        let mut events = [Event::default(); 4];
        events_at(&[0, 0, 0, 480 * 10_000], &mut events);
        convert_offsets(480, &[], &mut events);
        assert_eq!(events[3].offset, 22050 * 10_000);
    }
}
