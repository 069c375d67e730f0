//! `smfscan` is a Standard Midi File (SMF) decoder that reproduces the binary semantics of a
//! `.mid` file exactly: variable-length delta times, running status, Mode 4 (omni off / mono)
//! channel messages and the meta and system exclusive sub-formats embedded in track chunks.
//!
//! Decoding a file in memory:
//!
//! ```rust
//! use smfscan::MidiFile;
//!
//! # let bytes: &[u8] = &[
//! #     b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0, 96,
//! #     b'M', b'T', b'r', b'k', 0, 0, 0, 4, 0x00, 0xFF, 0x2F, 0x00,
//! # ];
//! let smf = MidiFile::parse(bytes).unwrap();
//!
//! assert_eq!(smf.tracks.len(), 1);
//! assert!(smf.tracks[0].is_terminated());
//! assert!(smf.warnings.is_empty());
//! ```
//!
//! The [`MidiFile`](struct.MidiFile.html) struct is the main type in the crate.
//! See its documentation for the structure of decoded MIDI files.
//!
//! # Borrowed payloads
//!
//! Decoded events borrow text, SysEx and unknown payloads from the raw file bytes in order to
//! avoid allocations.
//! For this reason, the byte buffer must be created separately from the `MidiFile` structure:
//!
//! ```rust,no_run
//! use smfscan::MidiFile;
//!
//! // The buffer has to outlive the decoded file
//! let bytes = smfscan::load("song.mid").unwrap();
//!
//! let smf = MidiFile::parse(&bytes).unwrap();
//! ```
//!
//! # Time ordering
//!
//! Each track is stored with delta times, exactly as it appears in the file.
//! [`merge`](fn.merge.html) (or [`MidiFile::merged`](struct.MidiFile.html#method.merged))
//! converts every track to absolute ticks and interleaves them into a single time-ordered
//! sequence, with ties resolved in favour of the lower-indexed track.
//!
//! # Cargo features
//!
//! - The `strict` feature
//!
//!   By default inconsistencies that still leave a decodable file (a track without an
//!   End-Of-Track event, bytes after the End-Of-Track event, more track chunks than declared)
//!   are recorded as [`Warning`](enum.Warning.html)s.
//!   With the `strict` feature enabled, `DecodeOptions::default()` turns them into errors.
//!
//! - The `parallel` feature
//!
//!   Decodes the located track chunks on the `rayon` thread pool.
//!   Decoding state is owned by each track, so the output is identical to the serial decoder.

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

#[macro_use]
mod error;

mod prelude {
    pub(crate) use crate::{
        error::{Error, Fault, FormatError, Position, Result, StdResult, Warning},
        primitive::{u14, u24, u28, u4, u7, IntRead, SplitChecked},
    };
    pub(crate) use core::{fmt, mem, ops};

    pub(crate) fn bit_range<T>(val: T, range: ops::Range<u32>) -> T
    where
        T: From<u8>
            + ops::Shr<u32, Output = T>
            + ops::Shl<u32, Output = T>
            + ops::Not<Output = T>
            + ops::BitAnd<Output = T>,
    {
        let width = range.end - range.start;
        (val >> range.start) & !(!T::from(0) << width)
    }
}

mod channel;
mod chunk;
mod event;
mod io;
mod merge;
mod primitive;
mod smf;
mod timing;
mod track;

pub use crate::{
    channel::{DecoderContext, MidiMessage, PitchBend},
    chunk::{ChunkReader, Header, Locator, TrackChunk},
    error::{Error, FormatError, Position, Result, Warning},
    event::{
        Accidentals, EventKind, KeySignature, MetaMessage, Mode, SmpteOffset, SysExForm,
        TimeSignature,
    },
    io::{load, read_source},
    merge::{merge, MergeIter, MergedEvent},
    smf::{decode, decode_with, DecodeOptions, MidiFile},
    timing::{Format, Fps, Timing},
    track::{Track, TrackDecoder, TrackEvent},
};

/// Integer types narrower than their storage, and the varlen integer reader.
pub mod num {
    pub use crate::primitive::{read_vlq, u14, u15, u24, u28, u4, u7};
}

#[cfg(test)]
mod test;
