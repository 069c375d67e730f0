//! Fixed-width and variable-length integers as they are laid out in SMF data.
//!
//! Every reader here takes a `&mut &[u8]` and advances it past whatever it consumed.
//! Readers only know about the slice they are handed, so they fail with a bare `Fault` that the
//! caller ties to a file position.

use crate::prelude::*;

/// Split off the first `at` bytes of a slice, if there are that many.
pub(crate) trait SplitChecked: Sized {
    fn split_checked(&mut self, at: usize) -> Option<Self>;
}
impl<'a> SplitChecked for &'a [u8] {
    #[inline]
    fn split_checked(&mut self, at: usize) -> Option<&'a [u8]> {
        let head = self.get(..at)?;
        *self = &self[at..];
        Some(head)
    }
}

/// Big-endian reads of plain unsigned integers.
pub(crate) trait IntRead: Sized {
    fn read(raw: &mut &[u8]) -> StdResult<Self, Fault>;
}

macro_rules! int_read {
    ($($int:ty => $what:expr),* $(,)?) => {$(
        impl IntRead for $int {
            #[inline]
            fn read(raw: &mut &[u8]) -> StdResult<$int, Fault> {
                let bytes = raw
                    .split_checked(mem::size_of::<$int>())
                    .ok_or(err_truncated!($what))?;
                let mut buf = [0; mem::size_of::<$int>()];
                buf.copy_from_slice(bytes);
                Ok(<$int>::from_be_bytes(buf))
            }
        }
    )*};
}
int_read! {
    u8 => "a byte",
    u16 => "a 16-bit field",
    u32 => "a 32-bit field",
}

/// Unsigned integers narrower than their storage type.
///
/// Building one from the storage type keeps only the low bits, the same way a MIDI data byte
/// with its top bit set is read as its low 7 bits.
/// Use `try_from` to reject out-of-range values instead.
macro_rules! narrow_int {
    ($(#[$doc:meta])* $name:ident($inner:ty), $bits:expr) => {
        $(#[$doc])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
        #[repr(transparent)]
        #[allow(non_camel_case_types)]
        pub struct $name($inner);
        impl $name {
            const MASK: $inner = (1 << $bits) - 1;

            /// Keep the low bits of `raw`.
            #[inline]
            pub const fn new(raw: $inner) -> $name {
                $name(raw & Self::MASK)
            }

            /// `None` if `raw` does not fit.
            #[inline]
            pub fn try_from(raw: $inner) -> Option<$name> {
                if raw & !Self::MASK == 0 {
                    Some($name(raw))
                } else {
                    None
                }
            }

            #[inline]
            pub const fn max_value() -> $name {
                $name(Self::MASK)
            }

            #[inline]
            pub const fn as_int(self) -> $inner {
                self.0
            }
        }
        impl From<$inner> for $name {
            #[inline]
            fn from(raw: $inner) -> $name {
                $name::new(raw)
            }
        }
        impl From<$name> for $inner {
            #[inline]
            fn from(int: $name) -> $inner {
                int.0
            }
        }
        impl PartialEq<$inner> for $name {
            #[inline]
            fn eq(&self, other: &$inner) -> bool {
                self.0 == *other
            }
        }
        impl PartialOrd<$inner> for $name {
            #[inline]
            fn partial_cmp(&self, other: &$inner) -> Option<core::cmp::Ordering> {
                self.0.partial_cmp(other)
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
narrow_int!(
    /// Ticks per quarter note in a metrical header division.
    u15(u16),
    15
);
narrow_int!(
    /// A pitch bend value, two 7-bit data bytes combined.
    u14(u16),
    14
);
narrow_int!(
    /// A MIDI data byte.
    u7(u8),
    7
);
narrow_int!(
    /// A MIDI channel.
    u4(u8),
    4
);
narrow_int!(
    /// Microseconds per quarter note in a tempo event.
    u24(u32),
    24
);
narrow_int!(
    /// A delta time or length, decoded from a varlen integer of at most 4 bytes.
    u28(u32),
    28
);

impl u7 {
    /// Read one data byte, dropping its top bit.
    #[inline]
    pub(crate) fn read(raw: &mut &[u8]) -> StdResult<u7, Fault> {
        match raw.split_checked(1) {
            Some(byte) => Ok(u7::new(byte[0])),
            None => Err(err_truncated!("a data byte")),
        }
    }
}

/// Decode one variable-length quantity from the front of `raw`, advancing it.
///
/// Every byte contributes its bottom 7 bits, most significant group first, and the quantity ends
/// at the first byte with its top bit clear.
/// Returns the decoded value and the amount of bytes it took.
///
/// Running out of bytes before the terminating byte is a truncation error.
/// Since MIDI varlen ints hold at most 28 bits, a quantity that has not ended after 4 bytes is a
/// format error.
/// Error positions are relative to the start of `raw`.
pub fn read_vlq(raw: &mut &[u8]) -> Result<(u28, usize)> {
    let total = raw.len();
    read_vlq_raw(raw).map_err(|fault| fault.at(Position::file(total - raw.len())))
}

pub(crate) fn read_vlq_raw(raw: &mut &[u8]) -> StdResult<(u28, usize), Fault> {
    let mut int = 0u32;
    for len in 1..=4 {
        let byte = u8::read(raw).map_err(|_| err_truncated!("a varlen integer"))?;
        int = (int << 7) | bit_range(byte, 0..7) as u32;
        if byte & 0x80 == 0 {
            return Ok((u28::new(int), len));
        }
    }
    Err(FormatError::VarlenTooLong.into())
}

/// Read a length followed by that many bytes.
///
/// The length is a single byte unless `varlen` is set, in which case it is a varlen integer.
pub(crate) fn read_len_slice<'a>(raw: &mut &'a [u8], varlen: bool) -> StdResult<&'a [u8], Fault> {
    let len = if varlen {
        read_vlq_raw(raw)?.0.as_int() as usize
    } else {
        u8::read(raw).map_err(|_| err_truncated!("a length byte"))? as usize
    };
    raw.split_checked(len)
        .ok_or(err_truncated!("a length-prefixed payload"))
}
