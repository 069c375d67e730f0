//! Decoding of a single track chunk into its events.

use crate::{
    channel::DecoderContext,
    chunk::TrackChunk,
    event::{EventKind, MetaMessage},
    prelude::*,
    primitive::read_vlq_raw,
};

/// Represents a decoded SMF track event.
///
/// Consists of a delta time (in MIDI ticks relative to the previous event in the same track) and
/// the actual event.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct TrackEvent<'a> {
    /// How many MIDI ticks after the previous event should this event fire.
    pub delta: u28,
    /// The type of event along with event-specific data.
    pub kind: EventKind<'a>,
}

/// The events of a track, in file order.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Track<'a> {
    pub events: Vec<TrackEvent<'a>>,
}
impl<'a> Track<'a> {
    pub fn new(events: Vec<TrackEvent<'a>>) -> Track<'a> {
        Track { events }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, TrackEvent<'a>> {
        self.events.iter()
    }

    /// Whether the last event is the End-Of-Track meta event, as every well-formed track's is.
    pub fn is_terminated(&self) -> bool {
        self.events
            .last()
            .map(|ev| ev.kind.is_end_of_track())
            .unwrap_or(false)
    }

    /// The amount of `EventKind::Unknown` events in this track.
    pub fn unknown_count(&self) -> usize {
        self.events
            .iter()
            .filter(|ev| matches!(ev.kind, EventKind::Unknown { .. }))
            .count()
    }

    /// The total length of the track in ticks.
    pub fn duration(&self) -> u64 {
        self.events
            .iter()
            .map(|ev| ev.delta.as_int() as u64)
            .sum()
    }
}
impl<'a, 'b> IntoIterator for &'b Track<'a> {
    type Item = &'b TrackEvent<'a>;
    type IntoIter = core::slice::Iter<'b, TrackEvent<'a>>;
    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// An iterator of events over a single track.
/// Allows deferring the decoding of tracks for later, on an on-demand basis.
///
/// Each decoder owns a fresh [`DecoderContext`](struct.DecoderContext.html), so running status
/// never leaks from one track to another.
///
/// Iteration stops after the End-Of-Track event, when the payload runs out, or right after the
/// first error.
#[derive(Clone, Debug)]
pub struct TrackDecoder<'a> {
    raw: &'a [u8],
    /// Absolute file offset of `raw[0]`.
    offset: usize,
    /// Absolute file offset of the last event read.
    last_offset: usize,
    track: usize,
    ctx: DecoderContext,
    varlen_lengths: bool,
    done: bool,
}
impl<'a> TrackDecoder<'a> {
    /// Decode the given track payload.
    ///
    /// `track` and `offset` are only used to report positions in errors.
    pub fn new(track: usize, offset: usize, raw: &'a [u8]) -> TrackDecoder<'a> {
        TrackDecoder {
            raw,
            offset,
            last_offset: offset,
            track,
            ctx: DecoderContext::new(),
            varlen_lengths: false,
            done: false,
        }
    }

    pub(crate) fn for_chunk(track: usize, chunk: TrackChunk<'a>) -> TrackDecoder<'a> {
        TrackDecoder::new(track, chunk.offset, chunk.data)
    }

    /// Read meta, SysEx and unknown event lengths as varlen integers instead of single bytes.
    pub fn varlen_lengths(mut self, enable: bool) -> TrackDecoder<'a> {
        self.varlen_lengths = enable;
        self
    }

    /// Get the remaining unread bytes.
    pub fn unread(&self) -> &'a [u8] {
        self.raw
    }

    /// The absolute file offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The absolute file offset where the last decoded event (including its delta time) starts.
    pub fn last_offset(&self) -> usize {
        self.last_offset
    }

    /// The index of the track being decoded.
    pub fn track(&self) -> usize {
        self.track
    }

    /// Get the current decoding state of the track.
    pub fn context(&self) -> &DecoderContext {
        &self.ctx
    }

    /// Whether the End-Of-Track event, the end of the payload or an error has been reached.
    pub fn is_done(&self) -> bool {
        self.done || self.raw.is_empty()
    }

    fn read_event(&mut self, raw: &mut &'a [u8]) -> StdResult<TrackEvent<'a>, Fault> {
        let (delta, _) = read_vlq_raw(raw)?;
        let kind = EventKind::read(raw, &mut self.ctx, self.varlen_lengths)?;
        Ok(TrackEvent { delta, kind })
    }
}
impl<'a> Iterator for TrackDecoder<'a> {
    type Item = Result<TrackEvent<'a>>;

    fn next(&mut self) -> Option<Result<TrackEvent<'a>>> {
        if self.is_done() {
            return None;
        }
        let start = self.offset;
        let mut raw = self.raw;
        match self.read_event(&mut raw) {
            Ok(ev) => {
                self.last_offset = start;
                self.offset += self.raw.len() - raw.len();
                self.raw = raw;
                if let EventKind::Meta(MetaMessage::EndOfTrack) = ev.kind {
                    self.done = true;
                }
                Some(Ok(ev))
            }
            Err(fault) => {
                //Do not read again from the middle of a broken event
                self.done = true;
                Some(Err(fault.at(Position::track(self.track, start))))
            }
        }
    }
}
