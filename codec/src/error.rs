//! Error types for codec operations

use crate::tag::WireType;
use thiserror::Error;

/// Error type for codec operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("invalid varint")]
    InvalidVarint,
    #[error("invalid wire type: {0}")]
    InvalidWireType(u8),
    #[error("invalid field number: {0}")]
    InvalidFieldNumber(u32),
    #[error("field {field} expects wire type {expected:?}, found {found:?}")]
    WireTypeMismatch {
        field: u32,
        expected: WireType,
        found: WireType,
    },
    #[error("content does not fit announced length: {0} bytes")]
    LengthMismatch(usize),
    #[error("capacity exceeded: {required} > {available}")]
    CapacityExceeded { required: usize, available: usize },
    #[error("repeated field full: capacity {0}")]
    Full(usize),
    #[error("write rejected by buffer")]
    WriteRejected,
}
