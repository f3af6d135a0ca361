//! Messages: ordered sets of numbered fields.
//!
//! # Wire format
//!
//! A message body is the concatenation of its present fields, in ascending field number:
//!
//! ```text
//! +-----+----------+---------+-----+----------+---------+-----+
//! | tag | [length] | payload | tag | [length] | payload | ... |
//! +-----+----------+---------+-----+----------+---------+-----+
//! ```
//!
//! Default scalars and empty repeated fields contribute no bytes, so an all-default message
//! encodes to nothing. Decoding reads fields until the source is exhausted at a tag boundary and
//! skips fields with unknown numbers.

use crate::{
    tag::{Tag, WireType, MAX_FIELD_NUMBER},
    varint, Error, Limited, ReadBuffer, WriteBuffer,
};
use tracing::trace;

/// A message composed of [crate::Field]s.
///
/// Implementations are usually generated with [crate::message!].
pub trait Message: Default {
    /// Writes every field in ascending field number, stopping at the first failure.
    ///
    /// A failed call may leave a partial message in `buf`; see [crate::repeated] for the
    /// guarantees each field gives.
    fn serialize(&self, buf: &mut impl WriteBuffer) -> Result<(), Error>;

    /// Returns the number of bytes [Message::serialize] produces.
    fn serialized_size(&self) -> usize;

    /// Reads one occurrence of the field registered under `tag`'s number.
    ///
    /// Returns `Ok(false)` (without consuming anything) if no field has that number.
    fn read_field(&mut self, tag: Tag, buf: &mut impl ReadBuffer) -> Result<bool, Error>;

    /// Reads fields into `self` until `buf` is exhausted.
    ///
    /// Fields merge like protobuf: scalars take the last value read, repeated fields append.
    fn deserialize(&mut self, buf: &mut impl ReadBuffer) -> Result<(), Error> {
        while let Some(tag) = Tag::read_next(buf)? {
            if !self.read_field(tag, buf)? {
                let (field, wire_type) = (tag.number(), tag.wire_type());
                trace!(field, ?wire_type, "skipping unknown field");
                skip(wire_type, buf)?;
            }
        }
        trace!("reached end of message");
        Ok(())
    }

    /// Decodes a message from `buf`, starting from all defaults.
    fn decode(buf: &mut impl ReadBuffer) -> Result<Self, Error> {
        let mut message = Self::default();
        message.deserialize(buf)?;
        Ok(message)
    }

    /// Encodes the message into a newly allocated buffer.
    #[cfg(feature = "std")]
    fn to_bytes(&self) -> Result<bytes::BytesMut, Error> {
        let mut buf = bytes::BytesMut::with_capacity(self.serialized_size());
        self.serialize(&mut buf)?;
        Ok(buf)
    }
}

/// Discards the payload of a field whose tag has already been read.
pub fn skip(wire_type: WireType, buf: &mut impl ReadBuffer) -> Result<(), Error> {
    let len = match wire_type {
        WireType::Varint => return varint::read::<u64>(buf).map(|_| ()),
        WireType::Fixed64 => 8,
        WireType::Fixed32 => 4,
        WireType::LengthDelimited => varint::read_len(buf)?,
    };
    let mut payload = Limited::new(buf, len);
    while payload.pop().is_some() {}
    payload.finish()
}

/// Returns true if `numbers` are valid field numbers in strictly ascending order.
///
/// Used by [crate::message!] to reject bad field lists at compile time.
pub const fn valid_field_numbers(numbers: &[u32]) -> bool {
    let mut i = 0;
    while i < numbers.len() {
        let number = numbers[i];
        if number == 0 || number > MAX_FIELD_NUMBER {
            return false;
        }
        if i > 0 && numbers[i - 1] >= number {
            return false;
        }
        i += 1;
    }
    true
}

/// Declares a message struct and implements [Message] for it.
///
/// Each entry maps a field number to a public struct field holding a [crate::Field]. Entries
/// must be listed in strictly ascending field number; anything else fails to compile. A
/// `<NAME>_FIELD` constant is generated for every field.
///
/// ```
/// use picobuf::{message, Message, RepeatedScalar, Scalar};
///
/// message! {
///     /// A reading from a sensor.
///     pub struct Reading<const N: usize> {
///         1 => id: Scalar<u32>,
///         2 => samples: RepeatedScalar<u16, N>,
///     }
/// }
///
/// let mut reading = Reading::<4>::default();
/// reading.id.set(1);
/// reading.samples.push(7).unwrap();
///
/// let mut storage = [0u8; 16];
/// let mut buf = &mut storage[..];
/// reading.serialize(&mut buf).unwrap();
/// assert_eq!(storage[..5], [0x08, 0x01, 0x12, 0x01, 0x07]);
/// assert_eq!(Reading::<4>::SAMPLES_FIELD, 2);
/// ```
#[macro_export]
macro_rules! message {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident $(<const $cap:ident: usize>)? {
            $(
                $(#[$field_attr:meta])*
                $number:literal => $field:ident: $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        $vis struct $name $(<const $cap: usize>)? {
            $(
                $(#[$field_attr])*
                pub $field: $ty,
            )*
        }

        const _: () = assert!(
            $crate::message::valid_field_numbers(&[$($number),*]),
            "field numbers must be in 1..=536870911 and strictly ascending"
        );

        $crate::paste::paste! {
            impl $(<const $cap: usize>)? $name $(<$cap>)? {
                $(
                    #[doc = concat!("Field number of `", stringify!($field), "`.")]
                    pub const [<$field:upper _FIELD>]: u32 = $number;
                )*
            }
        }

        impl $(<const $cap: usize>)? $crate::Message for $name $(<$cap>)? {
            #[allow(unused_variables)]
            fn serialize(
                &self,
                buf: &mut impl $crate::WriteBuffer,
            ) -> ::core::result::Result<(), $crate::Error> {
                $( $crate::Field::write(&self.$field, $number, buf)?; )*
                Ok(())
            }

            #[allow(unused_variables)]
            fn serialized_size(&self) -> usize {
                0 $( + $crate::Field::encode_size(&self.$field, $number) )*
            }

            #[allow(unused_variables)]
            fn read_field(
                &mut self,
                tag: $crate::Tag,
                buf: &mut impl $crate::ReadBuffer,
            ) -> ::core::result::Result<bool, $crate::Error> {
                match tag.number() {
                    $( $number => $crate::Field::read(&mut self.$field, tag, buf).map(|_| true), )*
                    _ => Ok(false),
                }
            }
        }
    };
}
