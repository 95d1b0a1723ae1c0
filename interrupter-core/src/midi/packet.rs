//! USB-MIDI event packet decoding.
//!
//! A bulk transfer carries a run of 4-byte event packets:
//!
//! ```text
//! byte 0: cable number (high nibble) | code index number (low nibble)
//! byte 1: MIDI status
//! byte 2: note
//! byte 3: velocity
//! ```
//!
//! Only Note-On (CIN `0x9`) and Note-Off (CIN `0x8`) are decoded. Other
//! packets are skipped, as are trailing bytes that do not make up a whole
//! packet.

use core::slice::ChunksExact;

use crate::constants::MIDI_EVENT_BYTES;

const CIN_NOTE_OFF: u8 = 0x8;
const CIN_NOTE_ON: u8 = 0x9;

/// Key state carried by a [`MidiMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NoteState {
    On,
    Off,
}

/// One decoded note event.
///
/// Note-Off messages always carry a velocity of 0; the release velocity on
/// the wire is not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MidiMessage {
    pub note: u8,
    pub velocity: u8,
    pub state: NoteState,
}

impl MidiMessage {
    /// Decode one 4-byte event packet. `None` for anything but note events.
    pub fn from_packet(packet: [u8; MIDI_EVENT_BYTES]) -> Option<Self> {
        let [header, _status, note, velocity] = packet;
        match header & 0x0F {
            CIN_NOTE_ON => Some(MidiMessage {
                note,
                velocity,
                state: NoteState::On,
            }),
            CIN_NOTE_OFF => Some(MidiMessage {
                note,
                velocity: 0,
                state: NoteState::Off,
            }),
            _ => None,
        }
    }

    pub fn is_on(&self) -> bool {
        self.state == NoteState::On
    }
}

/// Iterator over the note messages in a received transfer.
pub struct Packets<'a> {
    chunks: ChunksExact<'a, u8>,
}

impl Iterator for Packets<'_> {
    type Item = MidiMessage;

    fn next(&mut self) -> Option<MidiMessage> {
        for chunk in self.chunks.by_ref() {
            let packet = [chunk[0], chunk[1], chunk[2], chunk[3]];
            if let Some(msg) = MidiMessage::from_packet(packet) {
                return Some(msg);
            }
        }
        None
    }
}

/// Decode every note message in `data`, in order.
pub fn decode_packets(data: &[u8]) -> Packets<'_> {
    Packets {
        chunks: data.chunks_exact(MIDI_EVENT_BYTES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_carries_velocity() {
        let msg = MidiMessage::from_packet([0x09, 0x90, 60, 100]);
        assert_eq!(
            msg,
            Some(MidiMessage {
                note: 60,
                velocity: 100,
                state: NoteState::On,
            })
        );
    }

    #[test]
    fn note_off_drops_release_velocity() {
        let msg = MidiMessage::from_packet([0x08, 0x80, 60, 77]).unwrap();
        assert_eq!(msg.note, 60);
        assert_eq!(msg.velocity, 0);
        assert!(!msg.is_on());
    }

    #[test]
    fn cable_number_is_ignored() {
        let msg = MidiMessage::from_packet([0x39, 0x91, 64, 1]).unwrap();
        assert!(msg.is_on());
        assert_eq!(msg.note, 64);
    }

    #[test]
    fn other_code_indices_are_skipped() {
        // Control change, pitch bend, then a note-on.
        let data = [
            0x0B, 0xB0, 7, 127, //
            0x0E, 0xE0, 0, 64, //
            0x09, 0x90, 62, 90,
        ];
        let msgs: Vec<_> = decode_packets(&data).collect();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].note, 62);
    }

    #[test]
    fn full_transfer_decodes_in_order() {
        let mut data = [0u8; 64];
        for (i, packet) in data.chunks_exact_mut(4).enumerate() {
            let cin = if i % 2 == 0 { 0x09 } else { 0x08 };
            packet.copy_from_slice(&[cin, 0, i as u8, 10]);
        }

        let msgs: Vec<_> = decode_packets(&data).collect();
        assert_eq!(msgs.len(), 16);
        assert!(msgs.iter().enumerate().all(|(i, m)| m.note == i as u8));
        assert_eq!(msgs[1].state, NoteState::Off);
    }

    #[test]
    fn partial_trailing_packet_is_ignored() {
        let data = [0x09, 0x90, 60, 100, 0x09, 0x90];
        assert_eq!(decode_packets(&data).count(), 1);
        assert_eq!(decode_packets(&[]).count(), 0);
    }
}
