//! All sort of events and their decoders.

use crate::{
    channel::{DecoderContext, MidiMessage},
    prelude::*,
    primitive::read_len_slice,
    timing::Fps,
};
use std::borrow::Cow;

/// The contents of a track event, without its timing.
///
/// Timing lives in `TrackEvent` (delta ticks) and `MergedEvent` (absolute ticks).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventKind<'a> {
    /// A channel voice message, status `0x80..=0xEF`.
    Midi { channel: u4, message: MidiMessage },
    /// A System Exclusive packet.
    ///
    /// The data bytes do not include the `0xF0`/`0xF7` status or the length.
    SysEx { form: SysExForm, data: &'a [u8] },
    /// A `0xFF` meta event.
    Meta(MetaMessage<'a>),
    /// An event with a status byte that cannot appear in a track (system common or realtime
    /// statuses other than `0xF0` and `0xF7`).
    ///
    /// The byte after the status is taken as a length and that many bytes are skipped; they are
    /// kept here uninterpreted.
    /// Several of these in a file usually mean that the file is corrupted.
    Unknown { status: u8, data: &'a [u8] },
}
impl<'a> EventKind<'a> {
    /// Decode the event at the front of `raw`, after its delta time.
    ///
    /// Advances the slice and updates `ctx`.
    /// On failure the slice may be left anywhere inside the broken event.
    pub(crate) fn read(
        raw: &mut &'a [u8],
        ctx: &mut DecoderContext,
        varlen_lengths: bool,
    ) -> StdResult<EventKind<'a>, Fault> {
        let status = ctx.resolve_status(raw)?;
        if status >= 0xF0 {
            //System events cancel running status
            *ctx.running_status_mut() = None;
        }
        Ok(match status {
            0x80..=0xEF => {
                let (channel, message) = ctx.read_channel(status, raw)?;
                EventKind::Midi { channel, message }
            }
            0xFF => EventKind::Meta(MetaMessage::read(raw, varlen_lengths)?),
            0xF0 => EventKind::SysEx {
                form: SysExForm::F0,
                data: read_len_slice(raw, varlen_lengths)?,
            },
            0xF7 => EventKind::SysEx {
                form: SysExForm::F7,
                data: read_len_slice(raw, varlen_lengths)?,
            },
            _ => EventKind::Unknown {
                status,
                data: read_len_slice(raw, varlen_lengths)?,
            },
        })
    }

    /// Whether this is the End-Of-Track meta event.
    #[inline]
    pub fn is_end_of_track(&self) -> bool {
        matches!(self, EventKind::Meta(MetaMessage::EndOfTrack))
    }

    /// A human-readable name for the event type, like `"Note On"` or `"Tempo"`.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Midi { message, .. } => message.name(),
            EventKind::SysEx {
                form: SysExForm::F0,
                ..
            } => "SysEx F0",
            EventKind::SysEx {
                form: SysExForm::F7,
                ..
            } => "SysEx F7",
            EventKind::Meta(meta) => meta.name(),
            EventKind::Unknown { .. } => "Unknown",
        }
    }
}

/// The two shapes a System Exclusive event can take in a track.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum SysExForm {
    /// A complete message or the first packet of a split message, introduced by `0xF0`.
    F0,
    /// A continuation packet or an escape sequence, introduced by `0xF7`.
    F7,
}

/// The payload of a meta event, interpreted according to its type byte.
///
/// A payload too short for its meta type is kept as `Unknown` instead.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum MetaMessage<'a> {
    /// Big-endian integer over the whole payload (zero if the payload is empty).
    SequenceNumber(u32),
    // Text-like types `0x01..=0x09`, raw bytes with no particular encoding.
    Text(&'a [u8]),
    Copyright(&'a [u8]),
    /// Track name, or sequence name in the first track of a format 1 file.
    SequenceName(&'a [u8]),
    InstrumentName(&'a [u8]),
    Lyric(&'a [u8]),
    Marker(&'a [u8]),
    CuePoint(&'a [u8]),
    ProgramName(&'a [u8]),
    DeviceName(&'a [u8]),
    /// Channel that the following SysEx and meta events refer to.
    MidiChannelPrefix(u8),
    /// Output port for the track.
    PortDesignation(u8),
    /// Must be the last event of every track.
    EndOfTrack,
    /// Microseconds per quarter note.
    Tempo(u24),
    SmpteOffset(SmpteOffset),
    TimeSignature(TimeSignature),
    KeySignature(KeySignature),
    SequencerSpecific(&'a [u8]),
    /// Any other type byte, or a payload too short for its type, kept as-is.
    Unknown(u8, &'a [u8]),
}
impl<'a> MetaMessage<'a> {
    /// Decode a meta event, starting right after its `0xFF` status byte.
    fn read(raw: &mut &'a [u8], varlen_lengths: bool) -> StdResult<MetaMessage<'a>, Fault> {
        let type_byte = u8::read(raw).map_err(|_| err_truncated!("a meta message type"))?;
        let data = read_len_slice(raw, varlen_lengths)?;
        Ok(MetaMessage::from_payload(type_byte, data))
    }

    /// Interpret the payload of a meta event of the given type.
    pub fn from_payload(type_byte: u8, data: &'a [u8]) -> MetaMessage<'a> {
        match (type_byte, data) {
            (0x00, _) if data.len() <= 4 => MetaMessage::SequenceNumber(
                data.iter().fold(0, |acc, byte| acc << 8 | *byte as u32),
            ),
            (0x01, _) => MetaMessage::Text(data),
            (0x02, _) => MetaMessage::Copyright(data),
            (0x03, _) => MetaMessage::SequenceName(data),
            (0x04, _) => MetaMessage::InstrumentName(data),
            (0x05, _) => MetaMessage::Lyric(data),
            (0x06, _) => MetaMessage::Marker(data),
            (0x07, _) => MetaMessage::CuePoint(data),
            (0x08, _) => MetaMessage::ProgramName(data),
            (0x09, _) => MetaMessage::DeviceName(data),
            (0x20, &[channel, ..]) => MetaMessage::MidiChannelPrefix(channel),
            (0x21, &[port, ..]) => MetaMessage::PortDesignation(port),
            (0x2F, _) => MetaMessage::EndOfTrack,
            (0x51, &[a, b, c, ..]) => {
                MetaMessage::Tempo(u24::new((a as u32) << 16 | (b as u32) << 8 | c as u32))
            }
            (0x54, &[hour, minute, second, frame, subframe, ..]) => {
                MetaMessage::SmpteOffset(SmpteOffset {
                    hour,
                    minute,
                    second,
                    frame,
                    subframe,
                })
            }
            (0x58, &[numerator, denominator_power, clocks_per_tick, notated_32nd_per_quarter, ..]) => {
                MetaMessage::TimeSignature(TimeSignature {
                    numerator,
                    denominator_power,
                    clocks_per_tick,
                    notated_32nd_per_quarter,
                })
            }
            (0x59, &[sf, mi, ..]) => MetaMessage::KeySignature(KeySignature { sf: sf as i8, mi }),
            (0x7F, _) => MetaMessage::SequencerSpecific(data),
            _ => MetaMessage::Unknown(type_byte, data),
        }
    }

    /// The raw meta type byte this message was decoded from.
    pub fn meta_type(&self) -> u8 {
        match self {
            MetaMessage::SequenceNumber(_) => 0x00,
            MetaMessage::Text(_) => 0x01,
            MetaMessage::Copyright(_) => 0x02,
            MetaMessage::SequenceName(_) => 0x03,
            MetaMessage::InstrumentName(_) => 0x04,
            MetaMessage::Lyric(_) => 0x05,
            MetaMessage::Marker(_) => 0x06,
            MetaMessage::CuePoint(_) => 0x07,
            MetaMessage::ProgramName(_) => 0x08,
            MetaMessage::DeviceName(_) => 0x09,
            MetaMessage::MidiChannelPrefix(_) => 0x20,
            MetaMessage::PortDesignation(_) => 0x21,
            MetaMessage::EndOfTrack => 0x2F,
            MetaMessage::Tempo(_) => 0x51,
            MetaMessage::SmpteOffset(_) => 0x54,
            MetaMessage::TimeSignature(_) => 0x58,
            MetaMessage::KeySignature(_) => 0x59,
            MetaMessage::SequencerSpecific(_) => 0x7F,
            MetaMessage::Unknown(type_byte, _) => *type_byte,
        }
    }

    /// The text of the text-like meta events (`0x01..=0x09`), decoded as lossy UTF-8.
    pub fn text(&self) -> Option<Cow<'a, str>> {
        match *self {
            MetaMessage::Text(data)
            | MetaMessage::Copyright(data)
            | MetaMessage::SequenceName(data)
            | MetaMessage::InstrumentName(data)
            | MetaMessage::Lyric(data)
            | MetaMessage::Marker(data)
            | MetaMessage::CuePoint(data)
            | MetaMessage::ProgramName(data)
            | MetaMessage::DeviceName(data) => Some(String::from_utf8_lossy(data)),
            _ => None,
        }
    }

    /// A human-readable name for the meta type.
    pub fn name(&self) -> &'static str {
        match self {
            MetaMessage::SequenceNumber(_) => "Sequence Number",
            MetaMessage::Text(_) => "Text",
            MetaMessage::Copyright(_) => "Copyright Notice",
            MetaMessage::SequenceName(_) => "Sequence Name",
            MetaMessage::InstrumentName(_) => "Instrument Name",
            MetaMessage::Lyric(_) => "Lyrics",
            MetaMessage::Marker(_) => "Marker",
            MetaMessage::CuePoint(_) => "Cue Point",
            MetaMessage::ProgramName(_) => "Program Name",
            MetaMessage::DeviceName(_) => "Device Name",
            MetaMessage::MidiChannelPrefix(_) => "MIDI Channel Prefix",
            MetaMessage::PortDesignation(_) => "Port Designation",
            MetaMessage::EndOfTrack => "Track Termination",
            MetaMessage::Tempo(_) => "Tempo",
            MetaMessage::SmpteOffset(_) => "SMPTE Offset",
            MetaMessage::TimeSignature(_) => "Time Signature",
            MetaMessage::KeySignature(_) => "Key Signature",
            MetaMessage::SequencerSpecific(_) => "Sequencer Specific",
            MetaMessage::Unknown(..) => "Unknown Meta",
        }
    }
}

/// The SMPTE time at which a track should start, as raw bytes.
///
/// No range checking is done on the fields.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct SmpteOffset {
    /// Hour byte. Bits 5 and 6 carry the fps code, see `hour()` and `fps()`.
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
    /// Hundredths of a frame.
    pub subframe: u8,
}
impl SmpteOffset {
    /// The hour, without the fps bits.
    #[inline]
    pub fn hour(&self) -> u8 {
        bit_range(self.hour, 0..5)
    }

    /// The frame rate encoded in the hour byte.
    #[inline]
    pub fn fps(&self) -> Fps {
        Fps::from_code(bit_range(self.hour, 5..7))
    }
}

/// A time signature, as stored in the file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct TimeSignature {
    pub numerator: u8,
    /// The denominator as a power of two (`3` means eighths).
    pub denominator_power: u8,
    /// MIDI clocks per metronome click.
    pub clocks_per_tick: u8,
    /// Notated 32nd notes in a MIDI quarter note (24 MIDI clocks).
    pub notated_32nd_per_quarter: u8,
}
impl TimeSignature {
    /// The actual denominator, `2^denominator_power`.
    ///
    /// Returns `None` if the power does not fit in a `u32`.
    #[inline]
    pub fn denominator(&self) -> Option<u32> {
        1u32.checked_shl(self.denominator_power as u32)
    }
}

/// A key signature, as stored in the file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct KeySignature {
    /// Negative numbers are an amount of flats, positive numbers an amount of sharps.
    pub sf: i8,
    /// `0` for a major key, `1` for a minor key.
    pub mi: u8,
}
impl KeySignature {
    pub fn accidentals(&self) -> Accidentals {
        match self.sf {
            sf if sf < 0 => Accidentals::Flats(sf.unsigned_abs()),
            0 => Accidentals::Natural,
            sf => Accidentals::Sharps(sf as u8),
        }
    }

    /// `None` if `mi` is neither `0` nor `1`.
    pub fn mode(&self) -> Option<Mode> {
        match self.mi {
            0 => Some(Mode::Major),
            1 => Some(Mode::Minor),
            _ => None,
        }
    }
}

/// The accidentals in a key signature.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Accidentals {
    Flats(u8),
    /// C major or A minor.
    Natural,
    Sharps(u8),
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Mode {
    Major,
    Minor,
}
