//! Byte sinks and sources driven by the codec.
//!
//! The codec never owns or allocates storage. It pushes bytes into a [WriteBuffer] and pops them
//! from a [ReadBuffer], both borrowed for the duration of a single call. Any [bytes::BufMut] is a
//! [WriteBuffer] and any [bytes::Buf] is a [ReadBuffer], so `&mut [u8]`, `Vec<u8>`, `BytesMut`,
//! `&[u8]` and `Bytes` can be used directly.

use crate::Error;
use bytes::{Buf, BufMut};

/// A byte sink with a queryable remaining capacity.
pub trait WriteBuffer {
    /// Appends a single byte, returning `false` if the buffer refused it.
    fn push(&mut self, byte: u8) -> bool;

    /// Returns the number of bytes that can still be pushed.
    fn available(&self) -> usize;

    /// Appends a single byte, failing with [Error::WriteRejected] if the buffer refused it.
    fn try_push(&mut self, byte: u8) -> Result<(), Error> {
        if self.push(byte) {
            Ok(())
        } else {
            Err(Error::WriteRejected)
        }
    }
}

/// A byte source.
pub trait ReadBuffer {
    /// Removes and returns the next byte, or `None` once the source is exhausted.
    fn pop(&mut self) -> Option<u8>;

    /// Returns the number of bytes left to pop.
    fn remaining(&self) -> usize;
}

impl<B: BufMut> WriteBuffer for B {
    #[inline]
    fn push(&mut self, byte: u8) -> bool {
        if !self.has_remaining_mut() {
            return false;
        }
        self.put_u8(byte);
        true
    }

    #[inline]
    fn available(&self) -> usize {
        self.remaining_mut()
    }
}

impl<B: Buf> ReadBuffer for B {
    #[inline]
    fn pop(&mut self) -> Option<u8> {
        if !self.has_remaining() {
            return None;
        }
        Some(self.get_u8())
    }

    #[inline]
    fn remaining(&self) -> usize {
        Buf::remaining(self)
    }
}

/// A view over a [ReadBuffer] that yields at most `limit` bytes.
///
/// Length-delimited payloads (packed arrays, nested messages, skipped fields) are decoded through
/// a `Limited` so that a payload can never read past the length announced in its prefix.
pub struct Limited<'a, R: ReadBuffer> {
    inner: &'a mut R,
    limit: usize,
    consumed: usize,
}

impl<'a, R: ReadBuffer> Limited<'a, R> {
    /// Limits `inner` to the next `limit` bytes.
    pub fn new(inner: &'a mut R, limit: usize) -> Self {
        Self {
            inner,
            limit,
            consumed: 0,
        }
    }

    /// Returns the number of bytes popped so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Returns true once all `limit` bytes have been popped.
    pub fn is_exhausted(&self) -> bool {
        self.consumed == self.limit
    }

    /// Translates an [Error::EndOfBuffer] raised while reading through this view.
    ///
    /// Running into the limit (rather than into the end of the underlying source) means the
    /// payload is larger than its announced length, which is reported as [Error::LengthMismatch].
    pub fn map_eof(&self, err: Error) -> Error {
        match err {
            Error::EndOfBuffer if self.is_exhausted() => Error::LengthMismatch(self.limit),
            err => err,
        }
    }

    /// Verifies that exactly `limit` bytes were consumed.
    pub fn finish(&self) -> Result<(), Error> {
        if !self.is_exhausted() {
            // The only way to stop early is for the underlying source to run dry.
            return Err(Error::EndOfBuffer);
        }
        Ok(())
    }
}

impl<R: ReadBuffer> ReadBuffer for Limited<'_, R> {
    fn pop(&mut self) -> Option<u8> {
        if self.is_exhausted() {
            return None;
        }
        let byte = self.inner.pop()?;
        self.consumed += 1;
        Some(byte)
    }

    fn remaining(&self) -> usize {
        usize::min(self.limit - self.consumed, self.inner.remaining())
    }
}
