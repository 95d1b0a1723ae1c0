//! Device name decoded from the USB product string.

use core::fmt;

use heapless::Vec;

use crate::constants::DEVICE_NAME_CAPACITY;

/// Single-byte projection of a UTF-16 product string.
///
/// Code units above `0xFF` are dropped and the rest kept as Latin-1 bytes.
/// This is a display aid, not Unicode decoding: surrogate pairs and
/// anything outside Basic Latin / Latin-1 Supplement simply disappear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceName {
    bytes: Vec<u8, DEVICE_NAME_CAPACITY>,
}

impl DeviceName {
    pub const fn new() -> Self {
        DeviceName { bytes: Vec::new() }
    }

    /// Transcode `units`, truncating at the name capacity.
    pub fn from_utf16_latin1(units: &[u16]) -> Self {
        let mut bytes = Vec::new();
        for byte in units.iter().filter_map(|&u| u8::try_from(u).ok()) {
            if bytes.push(byte).is_err() {
                break;
            }
        }
        DeviceName { bytes }
    }

    /// Latin-1 bytes of the name.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for &b in self.bytes.iter() {
            f.write_char(char::from(b))?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceName {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=[u8]:a}", self.as_bytes());
    }
}
