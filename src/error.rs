use core::fmt;
use std::io;
use thiserror::Error;

/// Where in the file an error or warning happened.
///
/// `offset` is always an absolute byte offset from the start of the file, even for errors raised
/// while decoding a track chunk.
/// `track` is the zero-based index of the track being located or decoded, if any.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Position {
    pub track: Option<usize>,
    pub offset: usize,
}
impl Position {
    #[inline]
    pub fn new(track: Option<usize>, offset: usize) -> Position {
        Position { track, offset }
    }

    #[inline]
    pub(crate) fn file(offset: usize) -> Position {
        Position::new(None, offset)
    }

    #[inline]
    pub(crate) fn track(track: usize, offset: usize) -> Position {
        Position::new(Some(track), offset)
    }
}
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.track {
            Some(track) => write!(f, "track {}, byte {:#x}", track, self.offset),
            None => write!(f, "byte {:#x}", self.offset),
        }
    }
}

/// Represents a fatal error while decoding an SMF file.
///
/// There are no retries anywhere in the decoder: decoding is a single deterministic pass, so any
/// of these errors aborts the decode session (see
/// [`DecodeOptions::keep_partial_tracks`](struct.DecodeOptions.html#structfield.keep_partial_tracks)
/// for the one exception).
#[derive(Debug, Error)]
pub enum Error {
    /// The backing byte source could not be opened or read.
    #[error("midi source unavailable: {0}")]
    SourceUnavailable(#[source] io::Error),

    /// The file is not a MIDI file, or is inconsistent in a way that prevents decoding it.
    #[error("invalid midi at {at}: {kind}")]
    Format { at: Position, kind: FormatError },

    /// A fixed-width field, a varlen integer, a status byte or an event payload runs past the
    /// available bytes.
    #[error("truncated midi at {at}: failed to read {what}")]
    Truncated { at: Position, what: &'static str },
}
impl Error {
    /// Where the error happened, if it happened inside the file data.
    pub fn position(&self) -> Option<Position> {
        match self {
            Error::SourceUnavailable(_) => None,
            Error::Format { at, .. } | Error::Truncated { at, .. } => Some(*at),
        }
    }

    /// The index of the track that failed, if the failure is attributable to one track.
    pub fn track(&self) -> Option<usize> {
        self.position().and_then(|at| at.track)
    }

    /// The format error kind, if this is a format error.
    pub fn format_kind(&self) -> Option<&FormatError> {
        match self {
            Error::Format { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Whether the error only concerns the contents of a single track.
    pub(crate) fn is_track_local(&self) -> bool {
        match self {
            Error::SourceUnavailable(_) => false,
            Error::Truncated { at, .. } => at.track.is_some(),
            Error::Format { at, kind } => {
                at.track.is_some()
                    && matches!(kind, FormatError::NoRunningStatus | FormatError::VarlenTooLong)
            }
        }
    }
}

/// What exact part of the MIDI format was not respected.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum FormatError {
    #[error("expected `MThd` header chunk, found {0:02X?}")]
    BadMagic([u8; 4]),
    #[error("header declares {declared} tracks but only {found} track chunks were found")]
    TrackCountMismatch { declared: u16, found: u16 },
    #[error("{extra} track chunks found after the {declared} declared tracks")]
    UndeclaredTracks { declared: u16, extra: usize },
    #[error("event missing status with no running status active")]
    NoRunningStatus,
    #[error("varlen integer larger than 4 bytes")]
    VarlenTooLong,
    #[error("track ended without an end-of-track event")]
    MissingEndOfTrack,
    #[error("{len} bytes of trailing data after the end-of-track event")]
    TrailingData { len: usize },
}

/// A non-fatal irregularity found while decoding.
///
/// Warnings are collected in [`MidiFile::warnings`](struct.MidiFile.html#structfield.warnings)
/// and logged through `tracing` as they are found.
/// Callers decide whether a file with warnings should be trusted; in particular, several
/// `UnknownEvent` warnings are a strong signal of a corrupted file.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum Warning {
    #[error("unknown event with status {status:#04x} at {at}, skipped {skipped} bytes")]
    UnknownEvent {
        at: Position,
        status: u8,
        skipped: usize,
    },
    #[error("track ended without an end-of-track event at {at}")]
    MissingEndOfTrack { at: Position },
    #[error("{len} bytes of trailing data after end-of-track at {at}")]
    TrailingData { at: Position, len: usize },
    #[error("track chunk at {at} declares {declared} bytes but only {available} are available")]
    TruncatedChunk {
        at: Position,
        declared: u32,
        available: usize,
    },
    #[error("track {track} cut short: {reason}")]
    TrackCutShort { track: usize, reason: String },
    #[error("{extra} track chunks found after the {declared} declared tracks")]
    UndeclaredTracks { declared: u16, extra: usize },
}
impl Warning {
    /// The strict-mode error equivalent to this warning, if it has one.
    pub(crate) fn escalate(&self) -> Option<Error> {
        let (at, kind) = match *self {
            Warning::MissingEndOfTrack { at } => (at, FormatError::MissingEndOfTrack),
            Warning::TrailingData { at, len } => (at, FormatError::TrailingData { len }),
            Warning::UndeclaredTracks { declared, extra } => (
                Position::file(0),
                FormatError::UndeclaredTracks { declared, extra },
            ),
            _ => return None,
        };
        Some(Error::Format { at, kind })
    }
}

/// A low-level decoding failure, before it is tied to a position in the file.
///
/// Primitive readers work on bare slices and have no idea where they are in the file, so they
/// produce these; the chunk and track layers turn them into an `Error` with a `Position`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) enum Fault {
    Truncated(&'static str),
    Format(FormatError),
}
impl Fault {
    #[inline]
    pub(crate) fn at(self, at: Position) -> Error {
        match self {
            Fault::Truncated(what) => Error::Truncated { at, what },
            Fault::Format(kind) => Error::Format { at, kind },
        }
    }
}
impl From<FormatError> for Fault {
    #[inline]
    fn from(kind: FormatError) -> Fault {
        Fault::Format(kind)
    }
}

macro_rules! err_truncated {
    ($what:expr) => {{
        $crate::error::Fault::Truncated($what)
    }};
}

/// The result type used by the MIDI decoder.
pub type Result<T> = StdResult<T, Error>;
pub(crate) use core::result::Result as StdResult;
