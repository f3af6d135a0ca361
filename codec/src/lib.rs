//! Serialize protobuf-compatible messages into fixed-capacity buffers.
//!
//! # Overview
//!
//! A binary serialization library for targets without (or avoiding) dynamic memory:
//! - Encode structured messages into any byte sink with a known remaining capacity
//! - Decode a tag/length/value byte stream back into typed, fixed-capacity structures
//!
//! Output is byte-compatible with Protocol Buffers (proto3, packed repeated scalars).
//!
//! # Supported Fields
//!
//! - [Scalar]: a `u8`, `u16`, `u32` or `u64`, omitted from the wire while zero
//! - [RepeatedScalar]: up to `N` unsigned integers, written as one packed block
//! - [RepeatedMessage]: up to `N` nested messages, each written as its own occurrence
//!
//! Messages are declared with [message!], which lays out the struct and implements [Message].
//! Unknown fields are skipped when decoding.
//!
//! # Buffers
//!
//! The codec pushes bytes into a [WriteBuffer] and pops them from a [ReadBuffer]. Every
//! [bytes::BufMut] and [bytes::Buf] qualifies, including plain slices.
//!
//! # Failure
//!
//! Every operation returns a `Result`. A failed serialization may leave bytes in the sink:
//! scalar fields are written byte by byte, packed repeated scalars are written whole or not at
//! all, and repeated messages are written whole or not at all per element.
//!
//! # Example
//!
//! ```
//! use picobuf::{message, Message, RepeatedMessage, RepeatedScalar, Scalar};
//!
//! message! {
//!     pub struct Point {
//!         1 => x: Scalar<u32>,
//!         2 => y: Scalar<u32>,
//!     }
//! }
//!
//! message! {
//!     pub struct Path<const N: usize> {
//!         1 => id: Scalar<u32>,
//!         2 => weights: RepeatedScalar<u32, N>,
//!         3 => points: RepeatedMessage<Point, N>,
//!     }
//! }
//!
//! let mut path = Path::<4>::default();
//! path.id.set(7);
//! path.weights.push(1).unwrap();
//! path.weights.push(2).unwrap();
//! let mut point = Point::default();
//! point.x.set(3);
//! path.points.push(point).unwrap();
//!
//! // Encode into a fixed-size array.
//! let mut storage = [0u8; 32];
//! let mut sink = &mut storage[..];
//! path.serialize(&mut sink).unwrap();
//! let len = path.serialized_size();
//! assert_eq!(
//!     storage[..len],
//!     [0x08, 0x07, 0x12, 0x02, 0x01, 0x02, 0x1A, 0x02, 0x08, 0x03]
//! );
//!
//! // Decode it back.
//! let decoded = Path::<4>::decode(&mut &storage[..len]).unwrap();
//! assert_eq!(decoded, path);
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod buffer;
pub mod error;
pub mod field;
pub mod message;
pub mod repeated;
pub mod tag;
pub mod varint;

// Re-export main types and traits
pub use buffer::{Limited, ReadBuffer, WriteBuffer};
pub use error::Error;
pub use field::{Field, Scalar};
pub use message::Message;
pub use repeated::{RepeatedMessage, RepeatedScalar};
pub use tag::{Tag, WireType};

// Hidden from docs because it is needed by `message!`.
#[doc(hidden)]
pub use ::paste;
