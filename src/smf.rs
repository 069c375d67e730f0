//! A whole decode session: header, track location, per-track decoding and the consistency
//! checks between them.

use crate::{
    chunk::{ChunkReader, Header, Locator, TrackChunk},
    event::EventKind,
    merge::{merge, MergedEvent},
    prelude::*,
    track::{Track, TrackDecoder},
};

/// Knobs for a decode session.
///
/// `DecodeOptions::default()` gives the documented behaviour of the decoder: byte-scanning track
/// location, single-byte meta lengths, and fatal track errors.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DecodeOptions {
    /// Turn reportable inconsistencies (missing End-Of-Track, trailing bytes after it, more
    /// track chunks than declared) into errors instead of warnings.
    ///
    /// Defaults to whether the `strict` crate feature is enabled.
    pub strict: bool,
    /// When a track fails to decode, keep the events decoded before the failure and record a
    /// `Warning::TrackCutShort` instead of failing the whole file.
    /// Track chunks longer than the file are also accepted, with a `Warning::TruncatedChunk`.
    ///
    /// Header errors and track count mismatches are always fatal.
    pub keep_partial_tracks: bool,
    /// How to find track chunks.
    pub locator: Locator,
    /// Read meta, SysEx and unknown event lengths as varlen integers (as the SMF standard
    /// prescribes) instead of single bytes.
    pub varlen_lengths: bool,
    /// Decode tracks on the rayon thread pool.
    #[cfg(feature = "parallel")]
    pub parallel: bool,
}
impl Default for DecodeOptions {
    fn default() -> DecodeOptions {
        DecodeOptions {
            strict: cfg!(feature = "strict"),
            keep_partial_tracks: false,
            locator: Locator::Scan,
            varlen_lengths: false,
            #[cfg(feature = "parallel")]
            parallel: true,
        }
    }
}

/// A decoded Standard Midi File.
///
/// Tracks are kept in file order and hold delta times; use [`merged`](#method.merged) to get a
/// single time-ordered event sequence.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MidiFile<'a> {
    pub header: Header,
    pub tracks: Vec<Track<'a>>,
    /// Non-fatal irregularities found while decoding, in file order.
    ///
    /// `Warning::UndeclaredTracks` always comes last, after the warnings of every declared track.
    pub warnings: Vec<Warning>,
}
impl<'a> MidiFile<'a> {
    /// Decode a file with the default options.
    pub fn parse(raw: &'a [u8]) -> Result<MidiFile<'a>> {
        decode_with(raw, &DecodeOptions::default())
    }

    /// Decode a file with the given options.
    pub fn parse_with(raw: &'a [u8], options: &DecodeOptions) -> Result<MidiFile<'a>> {
        decode_with(raw, options)
    }

    /// The amount of events with an unrecognized status byte across all tracks.
    ///
    /// Callers may want to distrust files where this is not zero.
    pub fn unknown_event_count(&self) -> usize {
        self.tracks.iter().map(Track::unknown_count).sum()
    }

    /// All events of all tracks in a single sequence, ordered by absolute tick time.
    pub fn merged(&self) -> Vec<MergedEvent<'a>> {
        merge(self)
    }
}

/// Decode a file with the default options.
pub fn decode(raw: &[u8]) -> Result<MidiFile<'_>> {
    decode_with(raw, &DecodeOptions::default())
}

/// Decode a file with the given options.
pub fn decode_with<'a>(raw: &'a [u8], options: &DecodeOptions) -> Result<MidiFile<'a>> {
    let mut warnings = Vec::new();
    let mut chunks =
        ChunkReader::new(raw, options.locator).lenient_chunks(options.keep_partial_tracks);
    let header = chunks.read_header()?;
    tracing::debug!(
        format = header.format,
        tracks = header.track_count,
        division = header.division,
        "decoding midi file"
    );

    //Locate exactly as many tracks as declared
    let mut located = Vec::with_capacity(header.track_count as usize);
    let mut chunk_warnings = Vec::with_capacity(header.track_count as usize);
    for track in 0..header.track_count {
        let mut found = Vec::new();
        match chunks.next_track(track as usize, &mut found)? {
            Some(chunk) => {
                located.push(chunk);
                chunk_warnings.push(found);
            }
            None => bail!(Error::Format {
                at: Position::file(chunks.offset()),
                kind: FormatError::TrackCountMismatch {
                    declared: header.track_count,
                    found: track,
                },
            }),
        }
    }
    let extra = count_extra_tracks(chunks);

    let decoded = decode_tracks(located, options)?;
    let mut tracks = Vec::with_capacity(decoded.len());
    for ((track, track_warnings), found) in decoded.into_iter().zip(chunk_warnings) {
        //Already logged by the chunk reader
        warnings.extend(found);
        for warning in track_warnings {
            record(&mut warnings, warning, options)?;
        }
        tracks.push(track);
    }
    if extra > 0 {
        //These chunks come after every declared track
        record(
            &mut warnings,
            Warning::UndeclaredTracks {
                declared: header.track_count,
                extra,
            },
            options,
        )?;
    }
    Ok(MidiFile {
        header,
        tracks,
        warnings,
    })
}

/// Log a warning and keep it, or fail with the equivalent error in strict mode.
fn record(warnings: &mut Vec<Warning>, warning: Warning, options: &DecodeOptions) -> Result<()> {
    if options.strict {
        if let Some(err) = warning.escalate() {
            return Err(err);
        }
    }
    tracing::warn!("{}", warning);
    warnings.push(warning);
    Ok(())
}

fn count_extra_tracks(mut chunks: ChunkReader<'_>) -> usize {
    let mut scratch = Vec::new();
    let mut extra = 0;
    while let Ok(Some(_)) = chunks.next_track(0, &mut scratch) {
        extra += 1;
    }
    extra
}

fn decode_tracks<'a>(
    located: Vec<TrackChunk<'a>>,
    options: &DecodeOptions,
) -> Result<Vec<(Track<'a>, Vec<Warning>)>> {
    #[cfg(feature = "parallel")]
    {
        if options.parallel && located.len() > 1 {
            use rayon::prelude::*;

            return located
                .into_par_iter()
                .enumerate()
                .map(|(index, chunk)| decode_track(index, chunk, options))
                .collect();
        }
    }
    //Fall back to single-threaded
    located
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| decode_track(index, chunk, options))
        .collect()
}

/// Decode one track chunk with a fresh decoding context.
///
/// Warnings are returned rather than recorded, so that tracks can be decoded in any order and
/// still report in file order.
fn decode_track<'a>(
    index: usize,
    chunk: TrackChunk<'a>,
    options: &DecodeOptions,
) -> Result<(Track<'a>, Vec<Warning>)> {
    let mut warnings = Vec::new();
    let mut events = Vec::with_capacity(chunk.data.len() / 3);
    let mut decoder =
        TrackDecoder::for_chunk(index, chunk).varlen_lengths(options.varlen_lengths);
    let mut cut_short = false;
    while let Some(ev) = decoder.next() {
        match ev {
            Ok(ev) => {
                if let EventKind::Unknown { status, data } = ev.kind {
                    warnings.push(Warning::UnknownEvent {
                        at: Position::track(index, decoder.last_offset()),
                        status,
                        skipped: data.len(),
                    });
                }
                events.push(ev);
            }
            Err(err) if options.keep_partial_tracks && err.is_track_local() => {
                warnings.push(Warning::TrackCutShort {
                    track: index,
                    reason: err.to_string(),
                });
                cut_short = true;
            }
            Err(err) => return Err(err),
        }
    }
    let track = Track::new(events);
    if !cut_short {
        if !track.is_terminated() {
            warnings.push(Warning::MissingEndOfTrack {
                at: Position::track(index, decoder.offset()),
            });
        } else if !decoder.unread().is_empty() {
            warnings.push(Warning::TrailingData {
                at: Position::track(index, decoder.offset()),
                len: decoder.unread().len(),
            });
        }
    }
    tracing::debug!(
        track = index,
        events = track.len(),
        warnings = warnings.len(),
        "decoded track"
    );
    Ok((track, warnings))
}
