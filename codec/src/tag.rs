//! Field tags.
//!
//! Every field occurrence on the wire starts with a tag: the varint encoding of
//! `(field_number << 3) | wire_type`.

use crate::{varint, Error, ReadBuffer, WriteBuffer};

/// Largest field number that fits in a tag (29 bits).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

const WIRE_TYPE_BITS: u32 = 3;
const WIRE_TYPE_MASK: u32 = (1 << WIRE_TYPE_BITS) - 1;

/// How a field's payload is laid out on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    /// A single varint.
    Varint = 0,
    /// Eight little-endian bytes. Only skipped, never produced.
    Fixed64 = 1,
    /// A varint length followed by that many bytes (packed arrays, nested messages).
    LengthDelimited = 2,
    /// Four little-endian bytes. Only skipped, never produced.
    Fixed32 = 5,
}

impl TryFrom<u8> for WireType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            5 => Ok(Self::Fixed32),
            // Groups (3, 4) are deprecated and 6, 7 are unassigned.
            _ => Err(Error::InvalidWireType(value)),
        }
    }
}

/// Combines a field number and wire type into the raw tag value.
pub const fn make_tag(number: u32, wire_type: WireType) -> u32 {
    (number << WIRE_TYPE_BITS) | wire_type as u32
}

/// A field number paired with the wire type of the payload that follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    number: u32,
    wire_type: WireType,
}

impl Tag {
    /// Creates a tag, rejecting field numbers outside `1..=MAX_FIELD_NUMBER`.
    pub fn new(number: u32, wire_type: WireType) -> Result<Self, Error> {
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(Error::InvalidFieldNumber(number));
        }
        Ok(Self { number, wire_type })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    /// Returns the raw tag value.
    pub fn value(&self) -> u32 {
        make_tag(self.number, self.wire_type)
    }

    /// Returns the number of bytes [Tag::write] produces.
    pub fn encode_size(&self) -> usize {
        varint::size(self.value())
    }

    pub fn write(&self, buf: &mut impl WriteBuffer) -> Result<(), Error> {
        varint::write(self.value(), buf)
    }

    /// Reads a tag, failing with [Error::EndOfBuffer] if the source is empty.
    pub fn read(buf: &mut impl ReadBuffer) -> Result<Self, Error> {
        Self::read_next(buf)?.ok_or(Error::EndOfBuffer)
    }

    /// Reads a tag, returning `None` if the source is exhausted before the first byte.
    ///
    /// Running out of bytes after the first byte is still an error.
    pub fn read_next(buf: &mut impl ReadBuffer) -> Result<Option<Self>, Error> {
        let Some(first) = buf.pop() else {
            return Ok(None);
        };
        let value: u32 = varint::read_from(first, buf)?;
        let wire_type = WireType::try_from((value & WIRE_TYPE_MASK) as u8)?;
        Self::new(value >> WIRE_TYPE_BITS, wire_type).map(Some)
    }
}
