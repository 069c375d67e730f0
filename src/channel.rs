//! Channel voice messages and the per-track state needed to decode them.

use crate::prelude::*;

/// Decoding state carried from one event to the next within a single track.
///
/// MIDI running status is defined per track, so a fresh context is created for every track and
/// it is never shared across track boundaries.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct DecoderContext {
    running_status: Option<u8>,
    omni_off: [bool; 16],
}
impl DecoderContext {
    /// A context with no running status and omni mode untouched on every channel.
    pub fn new() -> DecoderContext {
        DecoderContext::default()
    }

    /// The last explicit channel status byte, if any.
    ///
    /// Meta, SysEx and unknown events clear it.
    pub fn running_status(&self) -> Option<u8> {
        self.running_status
    }

    /// Direct access to the running status, for callers driving a decoder by hand.
    pub fn running_status_mut(&mut self) -> &mut Option<u8> {
        &mut self.running_status
    }

    /// Whether an Omni Off (controller `0x7C`) message has been seen on the given channel.
    pub fn omni_off(&self, channel: u4) -> bool {
        self.omni_off[channel.as_int() as usize]
    }

    /// Figure out the status byte of the event at the front of `raw`.
    ///
    /// If the first byte has its top bit set it is consumed as the status byte.
    /// Otherwise it is the first data byte of an event reusing the running status, and it is left
    /// in place.
    pub(crate) fn resolve_status(&self, raw: &mut &[u8]) -> StdResult<u8, Fault> {
        let status = *raw.first().ok_or(err_truncated!("a status byte"))?;
        if status < 0x80 {
            Ok(self
                .running_status
                .ok_or(Fault::Format(FormatError::NoRunningStatus))?)
        } else {
            *raw = &raw[1..];
            Ok(status)
        }
    }

    /// Decode the data bytes of a channel voice message with an already-resolved status byte in
    /// the `0x80..=0xEF` range.
    ///
    /// Updates the running status and the omni flags.
    pub(crate) fn read_channel(
        &mut self,
        status: u8,
        raw: &mut &[u8],
    ) -> StdResult<(u4, MidiMessage), Fault> {
        let channel = u4::from(status);
        let message = match status >> 4 {
            0x8 => MidiMessage::NoteOff {
                key: u7::read(raw)?,
                vel: u7::read(raw)?,
            },
            0x9 => MidiMessage::NoteOn {
                key: u7::read(raw)?,
                vel: u7::read(raw)?,
            },
            0xA => MidiMessage::PolyKeyPressure {
                key: u7::read(raw)?,
                pressure: u7::read(raw)?,
            },
            0xB => {
                let controller = u7::read(raw)?;
                let value = u7::read(raw)?;
                let mut mono_channels = u7::new(0);
                if controller == MidiMessage::OMNI_OFF {
                    self.omni_off[channel.as_int() as usize] = true;
                } else if controller == MidiMessage::MONO_MODE_ON && self.omni_off(channel) {
                    //Mode 4: omni off + mono carries the amount of channels
                    mono_channels = u7::read(raw)?;
                }
                MidiMessage::ControlChange {
                    controller,
                    value,
                    mono_channels,
                }
            }
            0xC => MidiMessage::ProgramChange {
                program: u7::read(raw)?,
            },
            0xD => MidiMessage::ChannelPressure {
                pressure: u7::read(raw)?,
            },
            0xE => {
                //LSB comes first
                let lsb = u7::read(raw)?.as_int() as u16;
                let msb = u7::read(raw)?.as_int() as u16;
                MidiMessage::PitchBend {
                    bend: PitchBend(u14::from(msb << 7 | lsb)),
                }
            }
            _ => panic!("decoded channel message before checking that status is in range"),
        };
        self.running_status = Some(status);
        Ok((channel, message))
    }
}

/// A channel voice message, without its channel.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum MidiMessage {
    /// `0x8n key vel`
    NoteOff { key: u7, vel: u7 },
    /// `0x9n key vel`
    ///
    /// A velocity of zero is conventionally a note off.
    NoteOn { key: u7, vel: u7 },
    /// `0xAn key pressure`, aftertouch on a single key.
    PolyKeyPressure { key: u7, pressure: u7 },
    /// `0xBn controller value`, also carrying the channel mode messages (`0x78..=0x7F`).
    ControlChange {
        controller: u7,
        value: u7,
        /// The amount of channels for a Mono Mode On (`0x7E`) message sent after Omni Off
        /// (`0x7C`) on the same channel.
        ///
        /// Zero for every other message.
        mono_channels: u7,
    },
    /// `0xCn program`
    ProgramChange { program: u7 },
    /// `0xDn pressure`, aftertouch on the whole channel.
    ChannelPressure { pressure: u7 },
    /// `0xEn lsb msb`
    PitchBend { bend: PitchBend },
}
impl MidiMessage {
    /// The controller number treated as Omni Off.
    pub const OMNI_OFF: u8 = 0x7C;
    /// The controller number for Mono Mode On.
    pub const MONO_MODE_ON: u8 = 0x7E;

    /// The high nibble of the status byte, `0x8..=0xE`.
    pub fn status_nibble(&self) -> u8 {
        match self {
            MidiMessage::NoteOff { .. } => 0x8,
            MidiMessage::NoteOn { .. } => 0x9,
            MidiMessage::PolyKeyPressure { .. } => 0xA,
            MidiMessage::ControlChange { .. } => 0xB,
            MidiMessage::ProgramChange { .. } => 0xC,
            MidiMessage::ChannelPressure { .. } => 0xD,
            MidiMessage::PitchBend { .. } => 0xE,
        }
    }

    /// A human-readable name for the message type.
    pub fn name(&self) -> &'static str {
        match self {
            MidiMessage::NoteOff { .. } => "Note Off",
            MidiMessage::NoteOn { .. } => "Note On",
            MidiMessage::PolyKeyPressure { .. } => "Polyphonic Key Pressure",
            MidiMessage::ControlChange { .. } => "Control Change",
            MidiMessage::ProgramChange { .. } => "Program Change",
            MidiMessage::ChannelPressure { .. } => "Channel Pressure",
            MidiMessage::PitchBend { .. } => "Pitch Bend",
        }
    }
}

/// A 14-bit pitch bend, centered at `0x2000`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct PitchBend(pub u14);
impl PitchBend {
    /// The raw 14-bit value, `(MSB << 7) | LSB`.
    #[inline]
    pub fn as_raw(self) -> u16 {
        self.0.as_int()
    }

    /// Signed bend, `-0x2000` fully down to `0x1FFF` fully up.
    #[inline]
    pub fn as_int(self) -> i16 {
        self.as_raw() as i16 - 0x2000
    }

    /// Bend scaled to `-1.0..1.0`.
    #[inline]
    pub fn as_f32(self) -> f32 {
        self.as_int() as f32 / 8192.0
    }
}
