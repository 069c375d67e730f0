#![allow(dead_code)]

/// Wrap a payload in a chunk with the given id.
pub fn chunk(id: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut raw = id.to_vec();
    raw.extend_from_slice(&(data.len() as u32).to_be_bytes());
    raw.extend_from_slice(data);
    raw
}

/// A 6-byte header chunk.
pub fn header(format: u16, track_count: u16, division: u16) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&format.to_be_bytes());
    data.extend_from_slice(&track_count.to_be_bytes());
    data.extend_from_slice(&division.to_be_bytes());
    chunk(b"MThd", &data)
}

/// A complete file with one `MTrk` chunk per payload.
pub fn smf(format: u16, track_count: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut raw = header(format, track_count, 96);
    for track in tracks {
        raw.extend(chunk(b"MTrk", track));
    }
    raw
}

/// Offset of the first track payload in files built by `smf`.
pub const FIRST_PAYLOAD: usize = 14 + 8;

pub const END_OF_TRACK: &[u8] = &[0xFF, 0x2F, 0x00];

/// Track payload builder, one event at a time.
#[derive(Default)]
pub struct TrackBuilder {
    raw: Vec<u8>,
}
impl TrackBuilder {
    pub fn new() -> TrackBuilder {
        TrackBuilder::default()
    }

    pub fn event(mut self, delta: u32, bytes: &[u8]) -> TrackBuilder {
        self.raw.extend(vlq(delta));
        self.raw.extend_from_slice(bytes);
        self
    }

    pub fn note_on(self, delta: u32, channel: u8, key: u8) -> TrackBuilder {
        self.event(delta, &[0x90 | channel, key, 100])
    }

    pub fn end(self, delta: u32) -> Vec<u8> {
        self.event(delta, END_OF_TRACK).raw
    }

    pub fn unterminated(self) -> Vec<u8> {
        self.raw
    }
}

pub fn vlq(mut int: u32) -> Vec<u8> {
    let mut bytes = vec![(int & 0x7F) as u8];
    int >>= 7;
    while int > 0 {
        bytes.push((int & 0x7F) as u8 | 0x80);
        int >>= 7;
    }
    bytes.reverse();
    bytes
}
