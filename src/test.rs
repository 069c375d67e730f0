use crate::{
    channel::DecoderContext,
    chunk::{ChunkReader, Locator},
    error::{Fault, FormatError},
    event::{Accidentals, EventKind, KeySignature, MetaMessage, Mode, SysExForm, TimeSignature},
    num::{u24, u28, u4, u7},
    primitive::read_vlq_raw,
    timing::Timing,
    Error, Fps, MidiMessage,
};

/// Encode a varlen integer, most significant group first.
fn encode_vlq(mut int: u32) -> Vec<u8> {
    let mut bytes = vec![(int & 0x7F) as u8];
    int >>= 7;
    while int > 0 {
        bytes.push((int & 0x7F) as u8 | 0x80);
        int >>= 7;
    }
    bytes.reverse();
    bytes
}

/// Decode every event in `raw` with a single context.
fn read_all(mut raw: &[u8]) -> Result<Vec<EventKind>, Fault> {
    let mut ctx = DecoderContext::new();
    let mut events = Vec::new();
    while !raw.is_empty() {
        events.push(EventKind::read(&mut raw, &mut ctx, false)?);
    }
    Ok(events)
}

fn note_on(channel: u8, key: u8, vel: u8) -> EventKind<'static> {
    EventKind::Midi {
        channel: u4::new(channel),
        message: MidiMessage::NoteOn {
            key: u7::new(key),
            vel: u7::new(vel),
        },
    }
}

fn control(channel: u8, controller: u8, value: u8, mono_channels: u8) -> EventKind<'static> {
    EventKind::Midi {
        channel: u4::new(channel),
        message: MidiMessage::ControlChange {
            controller: u7::new(controller),
            value: u7::new(value),
            mono_channels: u7::new(mono_channels),
        },
    }
}

mod vlq {
    use super::*;

    #[test]
    fn reference_values() {
        let cases: &[(u32, &[u8])] = &[
            (0x00, &[0x00]),
            (0x40, &[0x40]),
            (0x7F, &[0x7F]),
            (0x80, &[0x81, 0x00]),
            (0x2000, &[0xC0, 0x00]),
            (0x3FFF, &[0xFF, 0x7F]),
            (0x4000, &[0x81, 0x80, 0x00]),
            (0x10_0000, &[0xC0, 0x80, 0x00]),
            (0x1F_FFFF, &[0xFF, 0xFF, 0x7F]),
            (0x20_0000, &[0x81, 0x80, 0x80, 0x00]),
            (0x800_0000, &[0xC0, 0x80, 0x80, 0x00]),
            (0xFFF_FFFF, &[0xFF, 0xFF, 0xFF, 0x7F]),
        ];
        for &(int, bytes) in cases {
            let mut raw = bytes;
            assert_eq!(
                read_vlq_raw(&mut raw),
                Ok((u28::new(int), bytes.len())),
                "decoding {:02X?}",
                bytes
            );
            assert!(raw.is_empty());
            assert_eq!(encode_vlq(int), bytes);
        }
    }

    #[test]
    fn round_trip() {
        let mut int = 1u32;
        while int < 1 << 28 {
            for &n in &[int - 1, int, int + 1] {
                let encoded = encode_vlq(n);
                let mut raw = &encoded[..];
                let (decoded, len) = crate::num::read_vlq(&mut raw).unwrap();
                assert_eq!(decoded.as_int(), n);
                assert_eq!(len, encoded.len());
            }
            int = int * 3 + 1;
        }
    }

    #[test]
    fn stops_at_first_terminating_byte() {
        let mut raw: &[u8] = &[0x83, 0x60, 0x90];
        assert_eq!(read_vlq_raw(&mut raw), Ok((u28::new(0x1E0), 2)));
        assert_eq!(raw, &[0x90]);
    }

    #[test]
    fn truncated() {
        let mut raw: &[u8] = &[0x81, 0x80];
        assert_eq!(
            read_vlq_raw(&mut raw),
            Err(Fault::Truncated("a varlen integer"))
        );
        let mut raw: &[u8] = &[];
        match crate::num::read_vlq(&mut raw) {
            Err(Error::Truncated { at, .. }) => assert_eq!(at.offset, 0),
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn longer_than_four_bytes() {
        let mut raw: &[u8] = &[0x81, 0x80, 0x80, 0x80, 0x00];
        assert_eq!(
            read_vlq_raw(&mut raw),
            Err(Fault::Format(FormatError::VarlenTooLong))
        );
    }
}

mod channel {
    use super::*;

    #[test]
    fn running_status() {
        let events = read_all(&[0x90, 60, 100, 62, 101]).unwrap();
        assert_eq!(events, vec![note_on(0, 60, 100), note_on(0, 62, 101)]);
    }

    #[test]
    fn running_status_is_the_resolved_status() {
        let events = read_all(&[0x93, 60, 100, 62, 101, 64, 102]).unwrap();
        assert_eq!(
            events,
            vec![note_on(3, 60, 100), note_on(3, 62, 101), note_on(3, 64, 102)]
        );
    }

    #[test]
    fn no_running_status() {
        assert_eq!(
            read_all(&[60, 100]),
            Err(Fault::Format(FormatError::NoRunningStatus))
        );
    }

    #[test]
    fn system_events_cancel_running_status() {
        let systems: [&[u8]; 4] = [
            &[0xFF, 0x01, 0x00],
            &[0xF0, 0x01, 0xF7],
            &[0xF7, 0x00],
            &[0xF4, 0x00],
        ];
        for system in systems.iter() {
            let mut raw = vec![0x91, 60, 100];
            raw.extend_from_slice(system);
            raw.extend_from_slice(&[62, 101]);
            let mut slice = &raw[..];
            let mut ctx = DecoderContext::new();
            assert_eq!(
                EventKind::read(&mut slice, &mut ctx, false),
                Ok(note_on(1, 60, 100))
            );
            EventKind::read(&mut slice, &mut ctx, false).unwrap();
            assert_eq!(ctx.running_status(), None);
            assert_eq!(
                EventKind::read(&mut slice, &mut ctx, false),
                Err(Fault::Format(FormatError::NoRunningStatus)),
                "data byte after {:02X?}",
                system
            );
        }
    }

    #[test]
    fn explicit_status_after_system_event() {
        let events = read_all(&[0x91, 60, 100, 0xFF, 0x01, 0x00, 0x91, 62, 101, 64, 102]).unwrap();
        assert_eq!(
            events,
            vec![
                note_on(1, 60, 100),
                EventKind::Meta(MetaMessage::Text(b"")),
                note_on(1, 62, 101),
                note_on(1, 64, 102),
            ]
        );
    }

    #[test]
    fn data_bytes_are_masked() {
        let events = read_all(&[0x90, 60, 0xE4]).unwrap();
        assert_eq!(events, vec![note_on(0, 60, 100)]);
    }

    #[test]
    fn every_message_type() {
        let events = read_all(&[
            0x82, 1, 2, //
            0xA3, 3, 4, //
            0xC4, 5, //
            0xD5, 6, //
            0xE6, 0x00, 0x40, //
            0xEF, 0x7F, 0x7F,
        ])
        .unwrap();
        let expected = [
            (2, MidiMessage::NoteOff {
                key: u7::new(1),
                vel: u7::new(2),
            }),
            (3, MidiMessage::PolyKeyPressure {
                key: u7::new(3),
                pressure: u7::new(4),
            }),
            (4, MidiMessage::ProgramChange { program: u7::new(5) }),
            (5, MidiMessage::ChannelPressure {
                pressure: u7::new(6),
            }),
        ];
        for (ev, (channel, message)) in events.iter().zip(expected.iter()) {
            assert_eq!(
                *ev,
                EventKind::Midi {
                    channel: u4::new(*channel),
                    message: *message,
                }
            );
        }
        match events[4] {
            EventKind::Midi {
                message: MidiMessage::PitchBend { bend },
                ..
            } => {
                assert_eq!(bend.as_raw(), 0x2000);
                assert_eq!(bend.as_int(), 0);
            }
            other => panic!("expected pitch bend, got {:?}", other),
        }
        match events[5] {
            EventKind::Midi {
                channel,
                message: MidiMessage::PitchBend { bend },
            } => {
                assert_eq!(channel, 15);
                assert_eq!(bend.as_raw(), 0x3FFF);
            }
            other => panic!("expected pitch bend, got {:?}", other),
        }
    }

    #[test]
    fn truncated_message() {
        assert_eq!(
            read_all(&[0x90, 60]),
            Err(Fault::Truncated("a data byte"))
        );
    }

    #[test]
    fn mono_mode_without_omni_off() {
        let mut raw: &[u8] = &[0xB0, 0x7E, 0x00, 0x05];
        let mut ctx = DecoderContext::new();
        let ev = EventKind::read(&mut raw, &mut ctx, false).unwrap();
        assert_eq!(ev, control(0, 0x7E, 0, 0));
        assert_eq!(raw, &[0x05]);
    }

    #[test]
    fn mono_mode_after_omni_off() {
        let events = read_all(&[0xB0, 0x7C, 0x00, 0xB0, 0x7E, 0x00, 0x04]).unwrap();
        assert_eq!(
            events,
            vec![control(0, 0x7C, 0, 0), control(0, 0x7E, 0, 4)]
        );
    }

    #[test]
    fn omni_off_is_per_channel() {
        let mut raw: &[u8] = &[0xB1, 0x7C, 0x00, 0xB0, 0x7E, 0x00];
        let mut ctx = DecoderContext::new();
        EventKind::read(&mut raw, &mut ctx, false).unwrap();
        assert!(ctx.omni_off(u4::new(1)));
        assert!(!ctx.omni_off(u4::new(0)));
        let ev = EventKind::read(&mut raw, &mut ctx, false).unwrap();
        assert_eq!(ev, control(0, 0x7E, 0, 0));
        assert!(raw.is_empty());
    }
}

mod meta {
    use super::*;

    #[test]
    fn tempo() {
        assert_eq!(
            MetaMessage::from_payload(0x51, &[0x07, 0xA1, 0x20]),
            MetaMessage::Tempo(u24::new(500_000))
        );
    }

    #[test]
    fn short_payloads_are_unknown() {
        assert_eq!(
            MetaMessage::from_payload(0x51, &[0x07, 0xA1]),
            MetaMessage::Unknown(0x51, &[0x07, 0xA1])
        );
        assert_eq!(
            MetaMessage::from_payload(0x58, &[4]),
            MetaMessage::Unknown(0x58, &[4])
        );
        assert_eq!(
            MetaMessage::from_payload(0x20, &[]),
            MetaMessage::Unknown(0x20, &[])
        );
    }

    #[test]
    fn time_signature_denominator_is_a_power_of_two() {
        let sig = MetaMessage::from_payload(0x58, &[6, 3, 24, 8]);
        let expected = TimeSignature {
            numerator: 6,
            denominator_power: 3,
            clocks_per_tick: 24,
            notated_32nd_per_quarter: 8,
        };
        assert_eq!(sig, MetaMessage::TimeSignature(expected));
        //2^3, not 3^2
        assert_eq!(expected.denominator(), Some(8));
        let quarter = TimeSignature {
            denominator_power: 2,
            ..expected
        };
        assert_eq!(quarter.denominator(), Some(4));
    }

    #[test]
    fn key_signature() {
        let key = match MetaMessage::from_payload(0x59, &[0xFD, 1]) {
            MetaMessage::KeySignature(key) => key,
            other => panic!("expected key signature, got {:?}", other),
        };
        assert_eq!(key.sf, -3);
        assert_eq!(key.accidentals(), Accidentals::Flats(3));
        assert_eq!(key.mode(), Some(Mode::Minor));

        let c_major = KeySignature { sf: 0, mi: 0 };
        assert_eq!(c_major.accidentals(), Accidentals::Natural);
        assert_eq!(c_major.mode(), Some(Mode::Major));
        assert_eq!(
            KeySignature { sf: 2, mi: 7 }.accidentals(),
            Accidentals::Sharps(2)
        );
        assert_eq!(KeySignature { sf: 2, mi: 7 }.mode(), None);
    }

    #[test]
    fn sequence_number_and_single_bytes() {
        assert_eq!(
            MetaMessage::from_payload(0x00, &[0x01, 0x02]),
            MetaMessage::SequenceNumber(0x0102)
        );
        assert_eq!(
            MetaMessage::from_payload(0x00, &[]),
            MetaMessage::SequenceNumber(0)
        );
        assert_eq!(
            MetaMessage::from_payload(0x20, &[9]),
            MetaMessage::MidiChannelPrefix(9)
        );
        assert_eq!(
            MetaMessage::from_payload(0x21, &[2]),
            MetaMessage::PortDesignation(2)
        );
    }

    #[test]
    fn smpte_offset() {
        let smpte = match MetaMessage::from_payload(0x54, &[0x41, 2, 3, 4, 5]) {
            MetaMessage::SmpteOffset(smpte) => smpte,
            other => panic!("expected smpte offset, got {:?}", other),
        };
        assert_eq!(smpte.hour, 0x41);
        assert_eq!(smpte.hour(), 1);
        assert_eq!(smpte.fps(), Fps::Fps29);
        assert_eq!(
            (smpte.minute, smpte.second, smpte.frame, smpte.subframe),
            (2, 3, 4, 5)
        );
    }

    #[test]
    fn text_events() {
        let events = read_all(&[0xFF, 0x03, 5, b'P', b'i', b'a', b'n', b'o']).unwrap();
        let meta = match events[0] {
            EventKind::Meta(meta) => meta,
            other => panic!("expected meta event, got {:?}", other),
        };
        assert_eq!(meta, MetaMessage::SequenceName(b"Piano"));
        assert_eq!(meta.text().as_deref(), Some("Piano"));
        assert_eq!(meta.meta_type(), 0x03);
        assert_eq!(events[0].name(), "Sequence Name");
    }

    #[test]
    fn end_of_track() {
        let events = read_all(&[0xFF, 0x2F, 0x00]).unwrap();
        assert!(events[0].is_end_of_track());
        assert_eq!(events[0].name(), "Track Termination");
    }

    #[test]
    fn sysex_forms() {
        let events = read_all(&[0xF0, 3, 0x43, 0x12, 0xF7, 0xF7, 1, 0x7F]).unwrap();
        assert_eq!(
            events,
            vec![
                EventKind::SysEx {
                    form: SysExForm::F0,
                    data: &[0x43, 0x12, 0xF7],
                },
                EventKind::SysEx {
                    form: SysExForm::F7,
                    data: &[0x7F],
                },
            ]
        );
    }

    #[test]
    fn unknown_status_is_skipped() {
        let events = read_all(&[0xF4, 2, 9, 9, 0x90, 60, 100]).unwrap();
        assert_eq!(
            events,
            vec![
                EventKind::Unknown {
                    status: 0xF4,
                    data: &[9, 9],
                },
                note_on(0, 60, 100),
            ]
        );
    }

    #[test]
    fn truncated_payload() {
        assert_eq!(
            read_all(&[0xFF, 0x01, 4, b'a']),
            Err(Fault::Truncated("a length-prefixed payload"))
        );
    }

    #[test]
    fn varlen_lengths() {
        let mut raw = vec![0xFF, 0x01, 0x81, 0x00];
        raw.extend(std::iter::repeat(b'x').take(128));
        let mut slice = &raw[..];
        let ev = EventKind::read(&mut slice, &mut DecoderContext::new(), true).unwrap();
        match ev {
            EventKind::Meta(MetaMessage::Text(text)) => assert_eq!(text.len(), 128),
            other => panic!("expected text, got {:?}", other),
        }
        assert!(slice.is_empty());
    }
}

mod chunk {
    use super::*;

    const HEADER: &[u8] = &[b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 1, 0, 2, 0x01, 0xE0];

    fn file(body: &[u8]) -> Vec<u8> {
        let mut raw = HEADER.to_vec();
        raw.extend_from_slice(body);
        raw
    }

    #[test]
    fn header_fields() {
        let raw = file(&[]);
        let mut reader = ChunkReader::new(&raw, Locator::Scan);
        let header = reader.read_header().unwrap();
        assert_eq!(header.header_size, 6);
        assert_eq!(header.format, 1);
        assert_eq!(header.track_count, 2);
        assert_eq!(header.division, 480);
        assert_eq!(header.timing(), Some(Timing::Metrical(480.into())));
        assert_eq!(reader.offset(), 14);
    }

    #[test]
    fn bad_magic() {
        let mut raw = file(&[]);
        raw[..4].copy_from_slice(b"RIFF");
        let err = ChunkReader::new(&raw, Locator::Scan)
            .read_header()
            .unwrap_err();
        assert_eq!(
            err.format_kind(),
            Some(&FormatError::BadMagic(*b"RIFF"))
        );
    }

    #[test]
    fn scan_skips_stray_bytes() {
        let raw = file(b"junkMTrk\0\0\0\x02ab");
        let mut reader = ChunkReader::new(&raw, Locator::Scan);
        reader.read_header().unwrap();
        let mut warnings = Vec::new();
        let chunk = reader.next_track(0, &mut warnings).unwrap().unwrap();
        assert_eq!(chunk.data, b"ab");
        assert_eq!(chunk.offset, 14 + 4 + 4 + 4);
        assert_eq!(reader.next_track(1, &mut warnings).unwrap(), None);
        assert!(warnings.is_empty());
    }

    #[test]
    fn chunked_skips_by_length() {
        //The unknown chunk contains a fake track marker that only the scanner would see
        let raw = file(b"XFIH\0\0\0\x0CMTrk\0\0\0\x00xxxxMTrk\0\0\0\x01z");
        let mut warnings = Vec::new();

        let mut chunked = ChunkReader::new(&raw, Locator::Chunked);
        chunked.read_header().unwrap();
        let chunk = chunked.next_track(0, &mut warnings).unwrap().unwrap();
        assert_eq!(chunk.data, b"z");

        let mut scan = ChunkReader::new(&raw, Locator::Scan);
        scan.read_header().unwrap();
        let chunk = scan.next_track(0, &mut warnings).unwrap().unwrap();
        assert_eq!(chunk.data, b"");
    }

    #[test]
    fn chunk_longer_than_file() {
        let raw = file(b"MTrk\0\0\0\x10ab");
        let mut warnings = Vec::new();

        let mut reader = ChunkReader::new(&raw, Locator::Scan);
        reader.read_header().unwrap();
        match reader.next_track(0, &mut warnings) {
            Err(Error::Truncated { at, .. }) => {
                assert_eq!(at.track, Some(0));
                assert_eq!(at.offset, 18);
            }
            other => panic!("expected truncation, got {:?}", other),
        }

        let mut reader = ChunkReader::new(&raw, Locator::Scan).lenient_chunks(true);
        reader.read_header().unwrap();
        let chunk = reader.next_track(0, &mut warnings).unwrap().unwrap();
        assert_eq!(chunk.data, b"ab");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn timecode_division() {
        assert_eq!(
            Timing::from_division(0xE728),
            Some(Timing::Timecode(Fps::Fps25, 40))
        );
        assert_eq!(Timing::from_division(0xF028), None);
    }
}
