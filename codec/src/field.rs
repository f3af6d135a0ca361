//! Message fields.
//!
//! A [Field] knows how to write itself under a field number, how large that write is, and how to
//! absorb one occurrence read from the wire. Messages are ordered lists of fields (see
//! [crate::message!]).

use crate::{
    tag::{make_tag, Tag, WireType},
    varint::{self, UInt},
    Error, ReadBuffer, WriteBuffer,
};

/// A field of a [crate::Message].
pub trait Field {
    /// Writes the field (tag included) under `number`.
    ///
    /// Fields that are absent on the wire (a default scalar, an empty repeated field) write
    /// nothing and succeed.
    fn write(&self, number: u32, buf: &mut impl WriteBuffer) -> Result<(), Error>;

    /// Returns the number of bytes [Field::write] produces under `number`.
    fn encode_size(&self, number: u32) -> usize;

    /// Reads one occurrence of the field. The tag has already been consumed.
    fn read(&mut self, tag: Tag, buf: &mut impl ReadBuffer) -> Result<(), Error>;
}

/// A singular unsigned integer field.
///
/// The field is omitted from the wire while it holds the default value (zero).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scalar<T: UInt>(T);

impl<T: UInt> Scalar<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn get(&self) -> T {
        self.0
    }

    pub fn set(&mut self, value: T) {
        self.0 = value;
    }

    /// Returns true if the field holds the default value and is therefore omitted.
    pub fn is_default(&self) -> bool {
        self.0 == T::default()
    }

    /// Resets the field to the default value.
    pub fn clear(&mut self) {
        self.0 = T::default();
    }
}

impl<T: UInt> From<T> for Scalar<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: UInt> Field for Scalar<T> {
    fn write(&self, number: u32, buf: &mut impl WriteBuffer) -> Result<(), Error> {
        if self.is_default() {
            return Ok(());
        }

        // No capacity reservation: a rejected push leaves a partial field behind.
        Tag::new(number, WireType::Varint)?.write(buf)?;
        varint::write(self.0, buf)
    }

    fn encode_size(&self, number: u32) -> usize {
        if self.is_default() {
            return 0;
        }
        varint::size(make_tag(number, WireType::Varint)) + varint::size(self.0)
    }

    fn read(&mut self, tag: Tag, buf: &mut impl ReadBuffer) -> Result<(), Error> {
        if tag.wire_type() != WireType::Varint {
            return Err(Error::WireTypeMismatch {
                field: tag.number(),
                expected: WireType::Varint,
                found: tag.wire_type(),
            });
        }
        self.0 = varint::read(buf)?;
        Ok(())
    }
}
