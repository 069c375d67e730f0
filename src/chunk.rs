//! Specific to the chunk packaging of Standard Midi Files: the header chunk and locating the
//! track chunks.

use crate::prelude::*;
use crate::timing::{Format, Timing};

const HEADER_MAGIC: &[u8; 4] = b"MThd";
const TRACK_MAGIC: &[u8; 4] = b"MTrk";

/// How track chunks are found after the header.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Locator {
    /// Scan forward byte by byte for the literal `MTrk` marker.
    ///
    /// Any other chunk, and any stray byte between chunks, is simply skipped over.
    Scan,
    /// Read each chunk id and length, and skip non-track chunks by their declared length.
    Chunked,
}
impl Default for Locator {
    fn default() -> Locator {
        Locator::Scan
    }
}

/// A MIDI file header, with its fields as stored in the file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Header {
    /// Size of the header chunk data, conventionally 6.
    pub header_size: u32,
    /// Raw format field (0, 1 or 2). See `format_kind()`.
    pub format: u16,
    /// The amount of track chunks the file declares.
    pub track_count: u16,
    /// Raw division field (ticks per quarter note, or SMPTE timing). See `timing()`.
    pub division: u16,
}
impl Header {
    pub fn new(header_size: u32, format: u16, track_count: u16, division: u16) -> Header {
        Header {
            header_size,
            format,
            track_count,
            division,
        }
    }

    /// The format field, if it is one of the three defined formats.
    pub fn format_kind(&self) -> Option<Format> {
        Format::from_raw(self.format)
    }

    /// The division field, interpreted.
    pub fn timing(&self) -> Option<Timing> {
        Timing::from_division(self.division)
    }

    fn read(raw: &mut &[u8]) -> StdResult<Header, Fault> {
        let header_size = u32::read(raw)?;
        let format = u16::read(raw)?;
        let track_count = u16::read(raw)?;
        let division = u16::read(raw)?;
        Ok(Header::new(header_size, format, track_count, division))
    }
}

/// The raw payload of a track chunk.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct TrackChunk<'a> {
    /// Absolute file offset of the first payload byte.
    pub offset: usize,
    pub data: &'a [u8],
}

/// Reads the header chunk and locates the track chunks of a file.
#[derive(Clone, Debug)]
pub struct ChunkReader<'a> {
    file: &'a [u8],
    /// Starts at the current index, ends at EOF.
    raw: &'a [u8],
    locator: Locator,
    /// Use whatever is left of the file when a chunk is longer than the file.
    lenient_chunks: bool,
}
impl<'a> ChunkReader<'a> {
    pub fn new(file: &'a [u8], locator: Locator) -> ChunkReader<'a> {
        ChunkReader {
            file,
            raw: file,
            locator,
            lenient_chunks: false,
        }
    }

    /// Accept track chunks whose declared length runs past the end of the file, using the
    /// remainder of the file as their payload.
    pub fn lenient_chunks(mut self, enable: bool) -> ChunkReader<'a> {
        self.lenient_chunks = enable;
        self
    }

    /// The absolute file offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.file.len() - self.raw.len()
    }

    /// Get the remaining unread bytes.
    pub fn unread(&self) -> &'a [u8] {
        self.raw
    }

    /// Read the header chunk at the start of the file.
    ///
    /// Leaves the reader right after the header fields (`Locator::Scan`), or right after the
    /// whole header chunk as sized by its declared length (`Locator::Chunked`).
    pub fn read_header(&mut self) -> Result<Header> {
        let at = Position::file(self.offset());
        let magic = self
            .raw
            .split_checked(4)
            .ok_or(err_truncated!("the header chunk id").at(at))?;
        if magic != HEADER_MAGIC {
            let mut found = [0; 4];
            found.copy_from_slice(magic);
            bail!(Error::Format {
                at,
                kind: FormatError::BadMagic(found),
            });
        }
        let mut raw = self.raw;
        let header = Header::read(&mut raw).map_err(|fault| fault.at(at))?;
        self.raw = raw;
        if self.locator == Locator::Chunked {
            //Skip any extra header bytes
            let extra = (header.header_size as usize).saturating_sub(6);
            self.raw = &self.raw[extra.min(self.raw.len())..];
        }
        tracing::trace!(
            format = header.format,
            tracks = header.track_count,
            division = header.division,
            "read midi header"
        );
        Ok(header)
    }

    /// Locate the next track chunk and extract its payload.
    ///
    /// Returns `Ok(None)` if the file ends before another track chunk is found.
    /// `track` is the index the chunk will get, used for error positions.
    pub fn next_track(
        &mut self,
        track: usize,
        warnings: &mut Vec<Warning>,
    ) -> Result<Option<TrackChunk<'a>>> {
        let found = match self.locator {
            Locator::Scan => self.scan_marker(),
            Locator::Chunked => self.skip_to_track(track)?,
        };
        if !found {
            return Ok(None);
        }
        let at = Position::track(track, self.offset());
        let len = u32::read(&mut self.raw)
            .map_err(|_| err_truncated!("the track chunk length").at(at))?;
        let offset = self.offset();
        let data = match self.raw.split_checked(len as usize) {
            Some(data) => data,
            None => {
                ensure!(
                    self.lenient_chunks,
                    err_truncated!("the track chunk payload").at(at)
                );
                let warning = Warning::TruncatedChunk {
                    at,
                    declared: len,
                    available: self.raw.len(),
                };
                tracing::warn!("{}", warning);
                warnings.push(warning);
                mem::replace(&mut self.raw, &[])
            }
        };
        tracing::trace!(track, offset, len = data.len(), "located track chunk");
        Ok(Some(TrackChunk { offset, data }))
    }

    /// Advance right past the next `MTrk` marker, or to EOF if there is none.
    fn scan_marker(&mut self) -> bool {
        match self
            .raw
            .windows(TRACK_MAGIC.len())
            .position(|window| window == TRACK_MAGIC)
        {
            Some(idx) => {
                self.raw = &self.raw[idx + TRACK_MAGIC.len()..];
                true
            }
            None => {
                self.raw = &[];
                false
            }
        }
    }

    /// Read chunk ids and skip chunks by their declared length until a track chunk id is found.
    /// Leaves the reader right after that id.
    fn skip_to_track(&mut self, track: usize) -> Result<bool> {
        loop {
            if self.raw.is_empty() {
                return Ok(false);
            }
            let at = Position::track(track, self.offset());
            let id = self
                .raw
                .split_checked(4)
                .ok_or(err_truncated!("a chunk id").at(at))?;
            if id == TRACK_MAGIC {
                return Ok(true);
            }
            //Unknown chunk, just skip it and read the next one
            let len = u32::read(&mut self.raw)
                .map_err(|_| err_truncated!("a chunk length").at(at))?;
            tracing::trace!(offset = at.offset, len, "skipping unknown chunk");
            let skip = (len as usize).min(self.raw.len());
            self.raw = &self.raw[skip..];
        }
    }
}
