//! Variable-length integer encoding and decoding
//!
//! This module implements Google's Protocol Buffers variable-length integer encoding.
//! Each byte uses:
//! - 7 bits for the value
//! - 1 "continuation" bit to indicate if more bytes follow
//!
//! `usize` is omitted to prevent behavior from depending on the target architecture.

use crate::{Error, ReadBuffer, WriteBuffer};
use core::{
    fmt::Debug,
    ops::{BitOrAssign, Shl, ShrAssign},
};

const BITS_PER_BYTE: usize = 8;
const DATA_BITS_PER_BYTE: usize = 7;
const DATA_BITS_MASK: u8 = 0x7F;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// A trait for unsigned integers that can be varint encoded.
pub trait UInt:
    Copy
    + Default
    + Debug
    + Eq
    + From<u8>
    + Sized
    + ShrAssign<usize>
    + Shl<usize, Output = Self>
    + BitOrAssign<Self>
    + PartialOrd
{
    /// Returns the number of leading zeros in the integer.
    fn leading_zeros(self) -> u32;

    /// Returns the least significant byte of the integer.
    fn as_u8(self) -> u8;
}

// Implements the `UInt` trait for all unsigned integer types.
macro_rules! impl_uint {
    ($type:ty) => {
        impl UInt for $type {
            #[inline]
            fn leading_zeros(self) -> u32 {
                self.leading_zeros()
            }

            #[inline]
            fn as_u8(self) -> u8 {
                self as u8
            }
        }
    };
}
impl_uint!(u8);
impl_uint!(u16);
impl_uint!(u32);
impl_uint!(u64);

/// Encodes an unsigned integer as a varint.
///
/// No capacity check is performed: bytes are pushed one at a time and the first rejected push
/// aborts with [Error::WriteRejected], leaving the bytes pushed so far in the buffer. Callers that
/// need all-or-nothing writes must check [WriteBuffer::available] against [size] first.
pub fn write<T: UInt>(value: T, buf: &mut impl WriteBuffer) -> Result<(), Error> {
    let continuation_threshold = T::from(CONTINUATION_BIT_MASK);
    let mut val = value;
    while val >= continuation_threshold {
        buf.try_push(val.as_u8() | CONTINUATION_BIT_MASK)?;
        val >>= DATA_BITS_PER_BYTE;
    }

    // `as_u8()` does not truncate the value or leave a continuation bit.
    buf.try_push(val.as_u8())
}

/// Decodes an unsigned integer from a varint.
pub fn read<T: UInt>(buf: &mut impl ReadBuffer) -> Result<T, Error> {
    let first = buf.pop().ok_or(Error::EndOfBuffer)?;
    read_from(first, buf)
}

/// Decodes an unsigned integer from a varint whose first byte has already been popped.
pub(crate) fn read_from<T: UInt>(first: u8, buf: &mut impl ReadBuffer) -> Result<T, Error> {
    let max_bits = core::mem::size_of::<T>() * BITS_PER_BYTE;
    let mut result: T = T::from(0);
    let mut shift = 0;
    let mut byte = first;

    // Loop over all the bytes.
    loop {
        // If this must be the last byte, check for overflow (i.e. set bits beyond the size of T).
        // Because the continuation bit is the most-significant bit, this check also rejects a
        // continuation bit on the last byte, so `shift` never exceeds `max_bits`.
        let remaining_bits = max_bits - shift;
        if remaining_bits <= DATA_BITS_PER_BYTE {
            let relevant_bits = BITS_PER_BYTE - byte.leading_zeros() as usize;
            if relevant_bits > remaining_bits {
                return Err(Error::InvalidVarint);
            }
        }

        // Write the 7 bits of data to the result.
        result |= T::from(byte & DATA_BITS_MASK) << shift;

        // If the continuation bit is not set, return.
        if byte & CONTINUATION_BIT_MASK == 0 {
            return Ok(result);
        }

        // Each byte has 7 bits of data.
        shift += DATA_BITS_PER_BYTE;
        byte = buf.pop().ok_or(Error::EndOfBuffer)?;
    }
}

/// Calculates the number of bytes needed to encode an unsigned integer as a varint.
pub fn size<T: UInt>(value: T) -> usize {
    let total_bits = core::mem::size_of::<T>() * BITS_PER_BYTE;
    let leading_zeros = value.leading_zeros() as usize;
    let data_bits = total_bits - leading_zeros;
    usize::max(1, data_bits.div_ceil(DATA_BITS_PER_BYTE))
}

/// Encodes a length prefix.
pub fn write_len(len: usize, buf: &mut impl WriteBuffer) -> Result<(), Error> {
    write(len as u64, buf)
}

/// Calculates the number of bytes needed to encode a length prefix.
pub fn size_len(len: usize) -> usize {
    size(len as u64)
}

/// Decodes a length prefix.
pub fn read_len(buf: &mut impl ReadBuffer) -> Result<usize, Error> {
    let len32 = read::<u32>(buf)?;
    usize::try_from(len32).map_err(|_| Error::InvalidVarint)
}
