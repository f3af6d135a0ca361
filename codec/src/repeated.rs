//! Repeated fields with a fixed maximum number of elements.
//!
//! Elements live in an inline array of `N` slots plus a length counter, so a repeated field
//! never allocates. Appending to a full field fails without modifying it.
//!
//! # Capacity checks
//!
//! A [RepeatedScalar] is written as a single packed block and checks the sink's capacity once,
//! before writing anything: either the whole block lands or nothing does.
//!
//! A [RepeatedMessage] writes every element as its own length-delimited occurrence. It checks the
//! capacity for the whole array up front and again before each element. If an element check
//! fails, the elements already written stay in the sink.

use crate::{
    tag::{make_tag, Tag, WireType},
    varint::{self, UInt},
    Error, Field, Limited, Message, ReadBuffer, WriteBuffer,
};
use core::fmt;
use tracing::debug;

/// A repeated unsigned integer field holding at most `N` elements.
#[derive(Clone)]
pub struct RepeatedScalar<T: UInt, const N: usize> {
    items: [T; N],
    len: usize,
}

impl<T: UInt, const N: usize> RepeatedScalar<T, N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a field holding `values`, failing if there are more than `N`.
    pub fn from_slice(values: &[T]) -> Result<Self, Error> {
        let mut field = Self::new();
        for &value in values {
            field.push(value)?;
        }
        Ok(field)
    }

    /// Returns the maximum number of elements.
    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Returns the element at `index`, or `None` if `index >= len()`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).copied()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.as_slice().iter().copied()
    }

    /// Appends `value`, failing with [Error::Full] if the field already holds `N` elements.
    pub fn push(&mut self, value: T) -> Result<(), Error> {
        if self.is_full() {
            debug!(capacity = N, "repeated field full");
            return Err(Error::Full(N));
        }
        self.items[self.len] = value;
        self.len += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Returns the size of the packed payload (excluding tag and length prefix).
    fn payload_size(&self) -> usize {
        self.iter().map(varint::size).sum()
    }
}

impl<T: UInt, const N: usize> Default for RepeatedScalar<T, N> {
    fn default() -> Self {
        Self {
            items: [T::default(); N],
            len: 0,
        }
    }
}

impl<T: UInt, const N: usize> PartialEq for RepeatedScalar<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: UInt, const N: usize> Eq for RepeatedScalar<T, N> {}

impl<T: UInt, const N: usize> fmt::Debug for RepeatedScalar<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<T: UInt, const N: usize> Field for RepeatedScalar<T, N> {
    fn write(&self, number: u32, buf: &mut impl WriteBuffer) -> Result<(), Error> {
        // Presence depends on the length only: zero-valued elements are always written.
        if self.is_empty() {
            return Ok(());
        }

        let tag = Tag::new(number, WireType::LengthDelimited)?;
        let payload = self.payload_size();
        let required = tag.encode_size() + varint::size_len(payload) + payload;
        let available = buf.available();
        if available < required {
            debug!(field = number, required, available, "insufficient capacity for packed field");
            return Err(Error::CapacityExceeded {
                required,
                available,
            });
        }

        tag.write(buf)?;
        varint::write_len(payload, buf)?;
        for value in self.iter() {
            varint::write(value, buf)?;
        }
        Ok(())
    }

    fn encode_size(&self, number: u32) -> usize {
        if self.is_empty() {
            return 0;
        }
        let payload = self.payload_size();
        let tag = make_tag(number, WireType::LengthDelimited);
        varint::size(tag) + varint::size_len(payload) + payload
    }

    fn read(&mut self, tag: Tag, buf: &mut impl ReadBuffer) -> Result<(), Error> {
        match tag.wire_type() {
            // Unpacked encoders emit one tagged varint per element.
            WireType::Varint => {
                let value = varint::read(buf)?;
                self.push(value)
            }
            WireType::LengthDelimited => {
                let len = varint::read_len(buf)?;
                let mut payload = Limited::new(buf, len);
                while !payload.is_exhausted() {
                    let value = varint::read(&mut payload).map_err(|err| payload.map_eof(err))?;
                    self.push(value)?;
                }
                Ok(())
            }
            found => Err(Error::WireTypeMismatch {
                field: tag.number(),
                expected: WireType::LengthDelimited,
                found,
            }),
        }
    }
}

/// A repeated nested message field holding at most `N` elements.
#[derive(Clone)]
pub struct RepeatedMessage<M: Message, const N: usize> {
    items: [M; N],
    len: usize,
}

impl<M: Message, const N: usize> RepeatedMessage<M, N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the maximum number of elements.
    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Returns the element at `index`, or `None` if `index >= len()`.
    pub fn get(&self, index: usize) -> Option<&M> {
        self.as_slice().get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut M> {
        self.items[..self.len].get_mut(index)
    }

    pub fn as_slice(&self) -> &[M] {
        &self.items[..self.len]
    }

    pub fn iter(&self) -> core::slice::Iter<'_, M> {
        self.as_slice().iter()
    }

    /// Appends `message`, failing with [Error::Full] if the field already holds `N` elements.
    pub fn push(&mut self, message: M) -> Result<(), Error> {
        if self.is_full() {
            debug!(capacity = N, "repeated field full");
            return Err(Error::Full(N));
        }
        self.items[self.len] = message;
        self.len += 1;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// Returns the encoded size of one element (tag, length prefix and body).
fn element_size(tag_size: usize, message: &impl Message) -> usize {
    let body = message.serialized_size();
    tag_size + varint::size_len(body) + body
}

impl<M: Message, const N: usize> Default for RepeatedMessage<M, N> {
    fn default() -> Self {
        Self {
            items: core::array::from_fn(|_| M::default()),
            len: 0,
        }
    }
}

impl<M: Message + PartialEq, const N: usize> PartialEq for RepeatedMessage<M, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<M: Message + Eq, const N: usize> Eq for RepeatedMessage<M, N> {}

impl<M: Message + fmt::Debug, const N: usize> fmt::Debug for RepeatedMessage<M, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<M: Message, const N: usize> Field for RepeatedMessage<M, N> {
    fn write(&self, number: u32, buf: &mut impl WriteBuffer) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }

        // Nothing is written if the array as a whole cannot fit.
        let tag = Tag::new(number, WireType::LengthDelimited)?;
        let required = self.encode_size(number);
        let available = buf.available();
        if available < required {
            debug!(field = number, required, available, "insufficient capacity for message array");
            return Err(Error::CapacityExceeded {
                required,
                available,
            });
        }

        // Each element is written whole or not at all.
        for message in self.iter() {
            let body = message.serialized_size();
            let required = tag.encode_size() + varint::size_len(body) + body;
            let available = buf.available();
            if available < required {
                debug!(field = number, required, available, "insufficient capacity for message");
                return Err(Error::CapacityExceeded {
                    required,
                    available,
                });
            }
            tag.write(buf)?;
            varint::write_len(body, buf)?;
            message.serialize(buf)?;
        }
        Ok(())
    }

    fn encode_size(&self, number: u32) -> usize {
        let tag_size = varint::size(make_tag(number, WireType::LengthDelimited));
        self.iter()
            .map(|message| element_size(tag_size, message))
            .sum()
    }

    fn read(&mut self, tag: Tag, buf: &mut impl ReadBuffer) -> Result<(), Error> {
        if tag.wire_type() != WireType::LengthDelimited {
            return Err(Error::WireTypeMismatch {
                field: tag.number(),
                expected: WireType::LengthDelimited,
                found: tag.wire_type(),
            });
        }
        if self.is_full() {
            debug!(field = tag.number(), capacity = N, "repeated field full");
            return Err(Error::Full(N));
        }

        // The slot only becomes part of the field once its body decoded completely.
        let len = varint::read_len(buf)?;
        let slot = &mut self.items[self.len];
        *slot = M::default();
        let mut body = Limited::new(buf, len);
        slot.deserialize(&mut body).map_err(|err| body.map_eof(err))?;
        body.finish()?;
        self.len += 1;
        Ok(())
    }
}
