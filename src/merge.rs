//! Interleaving of several tracks into a single sequence ordered by absolute time.

use crate::{
    event::EventKind,
    smf::MidiFile,
    track::{Track, TrackEvent},
};
use std::{cmp::Reverse, collections::BinaryHeap};

/// An event placed at an absolute time.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct MergedEvent<'a> {
    /// Ticks since the start of the track this event comes from.
    pub time: u64,
    /// The index of the originating track.
    pub track: usize,
    pub kind: EventKind<'a>,
}

/// Merge all tracks of a file into a single sequence ordered by absolute tick time.
///
/// Events with the same absolute time keep their file order within a track, and across tracks
/// the lower-indexed track goes first.
/// The result holds every event of every track.
pub fn merge<'a>(smf: &MidiFile<'a>) -> Vec<MergedEvent<'a>> {
    let total: usize = smf.tracks.iter().map(Track::len).sum();
    let mut merged = Vec::with_capacity(total);
    merged.extend(MergeIter::new(smf.tracks.iter().map(|track| &track.events[..])));
    merged
}

struct Cursor<'t, 'a> {
    events: &'t [TrackEvent<'a>],
    /// Absolute time of `events[0]`.
    time: u64,
}

/// A lazy k-way merge over several tracks, see [`merge`](fn.merge.html).
pub struct MergeIter<'t, 'a> {
    cursors: Vec<Cursor<'t, 'a>>,
    /// Tracks with events left, keyed by the absolute time of their next event and then by
    /// track index.
    pending: BinaryHeap<Reverse<(u64, usize)>>,
    remaining: usize,
}
impl<'t, 'a> MergeIter<'t, 'a> {
    /// Merge the given tracks, given in track index order.
    pub fn new<I>(tracks: I) -> MergeIter<'t, 'a>
    where
        I: IntoIterator<Item = &'t [TrackEvent<'a>]>,
    {
        let cursors = tracks
            .into_iter()
            .map(|events| Cursor {
                events,
                time: events
                    .first()
                    .map(|ev| ev.delta.as_int() as u64)
                    .unwrap_or(0),
            })
            .collect::<Vec<_>>();
        let pending = cursors
            .iter()
            .enumerate()
            .filter(|(_, cursor)| !cursor.events.is_empty())
            .map(|(idx, cursor)| Reverse((cursor.time, idx)))
            .collect();
        let remaining = cursors.iter().map(|cursor| cursor.events.len()).sum();
        MergeIter {
            cursors,
            pending,
            remaining,
        }
    }
}
impl<'t, 'a> Iterator for MergeIter<'t, 'a> {
    type Item = MergedEvent<'a>;

    fn next(&mut self) -> Option<MergedEvent<'a>> {
        let Reverse((time, track)) = self.pending.pop()?;
        let cursor = &mut self.cursors[track];
        let kind = cursor.events[0].kind;
        cursor.events = &cursor.events[1..];
        if let Some(next) = cursor.events.first() {
            cursor.time = time + next.delta.as_int() as u64;
            self.pending.push(Reverse((cursor.time, track)));
        }
        self.remaining -= 1;
        Some(MergedEvent { time, track, kind })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
impl ExactSizeIterator for MergeIter<'_, '_> {}
