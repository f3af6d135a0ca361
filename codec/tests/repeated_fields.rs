//! Integration tests for messages with repeated fields.

use picobuf::{
    message, Error, Message, ReadBuffer, RepeatedMessage, RepeatedScalar, Scalar, WriteBuffer,
};
use std::{cell::RefCell, collections::VecDeque};
use test_case::test_case;

const Y_SIZE: usize = 3;

message! {
    /// Two scalars around a packed array.
    pub struct RepeatedFields<const N: usize> {
        1 => x: Scalar<u32>,
        2 => y: RepeatedScalar<u32, N>,
        3 => z: Scalar<u32>,
    }
}

message! {
    pub struct RepeatedNestedMessage {
        1 => u: Scalar<u32>,
        2 => v: Scalar<u32>,
    }
}

message! {
    /// Two scalars around an array of nested messages.
    pub struct RepeatedMessages<const N: usize> {
        1 => x: Scalar<u32>,
        2 => y: RepeatedMessage<RepeatedNestedMessage, N>,
        3 => z: Scalar<u32>,
    }
}

/// A buffer operation observed by [ScriptedSink].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    Available(usize),
    Push(u8),
}

/// A sink that accepts every push and answers capacity queries from a script, recording the
/// order in which the codec talks to it.
#[derive(Default)]
struct ScriptedSink {
    answers: RefCell<VecDeque<usize>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedSink {
    fn new(answers: &[usize]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
            calls: RefCell::default(),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn pushed(&self) -> Vec<u8> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Push(byte) => Some(*byte),
                Call::Available(_) => None,
            })
            .collect()
    }
}

impl WriteBuffer for ScriptedSink {
    fn push(&mut self, byte: u8) -> bool {
        self.calls.borrow_mut().push(Call::Push(byte));
        true
    }

    fn available(&self) -> usize {
        let answer = self
            .answers
            .borrow_mut()
            .pop_front()
            .expect("unexpected capacity query");
        self.calls.borrow_mut().push(Call::Available(answer));
        answer
    }
}

/// A source that only supports popping; `remaining()` always reports zero.
struct PopOnly<'a> {
    bytes: &'a [u8],
    pops: usize,
}

impl<'a> PopOnly<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pops: 0 }
    }
}

impl ReadBuffer for PopOnly<'_> {
    fn pop(&mut self) -> Option<u8> {
        self.pops += 1;
        let (&first, rest) = self.bytes.split_first()?;
        self.bytes = rest;
        Some(first)
    }

    fn remaining(&self) -> usize {
        0
    }
}

fn pushes(bytes: &[u8]) -> Vec<Call> {
    bytes.iter().copied().map(Call::Push).collect()
}

fn fields(x: u32, y: &[u32], z: u32) -> RepeatedFields<Y_SIZE> {
    RepeatedFields {
        x: Scalar::new(x),
        y: RepeatedScalar::from_slice(y).unwrap(),
        z: Scalar::new(z),
    }
}

fn nested(u: u32, v: u32) -> RepeatedNestedMessage {
    RepeatedNestedMessage {
        u: Scalar::new(u),
        v: Scalar::new(v),
    }
}

#[test]
fn test_construction() {
    let msg = RepeatedFields::<Y_SIZE>::default();
    assert_eq!(msg.y.capacity(), Y_SIZE);
    let msg2 = RepeatedMessages::<Y_SIZE>::default();
    assert_eq!(msg2.y.capacity(), Y_SIZE);
}

#[test]
fn test_serialize_empty_fields() {
    let msg = RepeatedFields::<Y_SIZE>::default();
    let mut sink = ScriptedSink::new(&[]);
    msg.serialize(&mut sink).unwrap();
    assert!(sink.calls().is_empty());
    assert_eq!(msg.serialized_size(), 0);
}

#[test]
fn test_serialize_empty_message() {
    let msg = RepeatedMessages::<Y_SIZE>::default();
    let mut sink = ScriptedSink::new(&[]);
    msg.serialize(&mut sink).unwrap();
    assert!(sink.calls().is_empty());
    assert_eq!(msg.serialized_size(), 0);
}

#[test_case(&[0, 0, 0], 6, &[0x12, 0x03, 0x00, 0x00, 0x00]; "zeros")]
#[test_case(&[0, 1, 0], 5, &[0x12, 0x03, 0x00, 0x01, 0x00]; "zero one zero")]
#[test_case(&[1, 1, 1], 5, &[0x12, 0x03, 0x01, 0x01, 0x01]; "ones")]
#[test_case(
    &[u32::MAX, u32::MAX, u32::MAX],
    17,
    &[
        0x12, 0x0F, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF, 0xFF,
        0xFF, 0x0F,
    ];
    "max"
)]
fn test_serialize_array(y: &[u32], available: usize, expected: &[u8]) {
    let msg = fields(0, y, 0);

    // One capacity query, then the whole packed block.
    let mut sink = ScriptedSink::new(&[available]);
    msg.serialize(&mut sink).unwrap();
    let mut calls = vec![Call::Available(available)];
    calls.extend(pushes(expected));
    assert_eq!(sink.calls(), calls);
    assert_eq!(msg.serialized_size(), expected.len());
}

#[test]
fn test_serialize_array_zero_messages() {
    let mut msg = RepeatedMessages::<Y_SIZE>::default();
    for _ in 0..Y_SIZE {
        msg.y.push(nested(0, 0)).unwrap();
    }

    // A query for the array, then a query before each element.
    let mut sink = ScriptedSink::new(&[6, 2, 2, 2]);
    msg.serialize(&mut sink).unwrap();
    let mut expected = vec![Call::Available(6)];
    for _ in 0..Y_SIZE {
        expected.extend([Call::Available(2), Call::Push(0x12), Call::Push(0x00)]);
    }
    assert_eq!(sink.calls(), expected);
    assert_eq!(msg.serialized_size(), 6);
}

#[test]
fn test_serialize_one() {
    let msg = fields(1, &[1, 1, 1], 1);
    let mut sink = ScriptedSink::new(&[9]);
    msg.serialize(&mut sink).unwrap();

    // The scalar is pushed without a capacity query.
    let mut expected = pushes(&[0x08, 0x01]);
    expected.push(Call::Available(9));
    expected.extend(pushes(&[0x12, 0x03, 0x01, 0x01, 0x01, 0x18, 0x01]));
    assert_eq!(sink.calls(), expected);
}

#[test]
fn test_serialize_max() {
    let msg = fields(u32::MAX, &[u32::MAX; 3], u32::MAX);
    let mut sink = ScriptedSink::new(&[17]);
    msg.serialize(&mut sink).unwrap();

    let mut expected = pushes(&[0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    expected.push(Call::Available(17));
    expected.extend(pushes(&[
        0x12, 0x0F, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF, 0xFF,
        0xFF, 0x0F, // y
        0x18, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, // z
    ]));
    assert_eq!(sink.calls(), expected);
    assert_eq!(msg.serialized_size(), 29);
}

#[test]
fn test_serialize_insufficient_capacity() {
    // The packed array refuses to start, after the first scalar has already landed.
    let msg = fields(1, &[1, 1, 1], 1);
    let mut sink = ScriptedSink::new(&[4]);
    assert_eq!(
        msg.serialize(&mut sink),
        Err(Error::CapacityExceeded {
            required: 5,
            available: 4,
        })
    );
    assert_eq!(sink.pushed(), [0x08, 0x01]);
}

#[test]
fn test_serialize_into_slice() {
    let msg = fields(1, &[1, 1, 1], 1);

    let mut storage = [0u8; 9];
    let mut sink = &mut storage[..];
    msg.serialize(&mut sink).unwrap();
    assert_eq!(
        storage,
        [0x08, 0x01, 0x12, 0x03, 0x01, 0x01, 0x01, 0x18, 0x01]
    );

    // A slice one byte short rejects the final scalar byte.
    let mut storage = [0u8; 8];
    let mut sink = &mut storage[..];
    assert_eq!(msg.serialize(&mut sink), Err(Error::WriteRejected));
}

#[test]
fn test_deserialize_empty() {
    let mut msg = RepeatedFields::<Y_SIZE>::default();
    let mut source = PopOnly::new(&[]);
    msg.deserialize(&mut source).unwrap();
    assert_eq!(msg, RepeatedFields::default());
    assert_eq!(source.pops, 1);
}

#[test]
fn test_deserialize_one() {
    let referee = [
        0x08, 0x01, // x
        0x12, 0x03, 0x01, 0x01, 0x01, // y
        0x18, 0x01, // z
    ];
    let mut msg = RepeatedFields::<Y_SIZE>::default();
    let mut source = PopOnly::new(&referee);
    msg.deserialize(&mut source).unwrap();

    // Every byte, then the pop that signals the end of the stream.
    assert_eq!(source.pops, referee.len() + 1);
    assert_eq!(msg.x.get(), 1);
    assert_eq!(msg.y.len(), 3);
    assert_eq!(msg.y.get(0), Some(1));
    assert_eq!(msg.y.get(1), Some(1));
    assert_eq!(msg.y.get(2), Some(1));
    assert_eq!(msg.z.get(), 1);
}

#[test]
fn test_deserialize_max() {
    let referee = [
        0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, // x
        0x12, 0x0F, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, 0xFF, 0xFF, 0xFF,
        0xFF, 0x0F, // y
        0x18, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F, // z
    ];
    let msg = RepeatedFields::<Y_SIZE>::decode(&mut PopOnly::new(&referee)).unwrap();
    assert_eq!(msg, fields(u32::MAX, &[u32::MAX; 3], u32::MAX));
}

#[test]
fn test_deserialize_messages() {
    let referee = [
        0x08, 0x05, // x
        0x12, 0x00, // y[0]
        0x12, 0x04, 0x08, 0x01, 0x10, 0x02, // y[1]
        0x18, 0x06, // z
    ];
    let msg = RepeatedMessages::<Y_SIZE>::decode(&mut &referee[..]).unwrap();
    assert_eq!(msg.x.get(), 5);
    assert_eq!(msg.y.as_slice(), &[nested(0, 0), nested(1, 2)]);
    assert_eq!(msg.z.get(), 6);
}

#[test]
fn test_deserialize_over_capacity() {
    let referee = [0x12, 0x04, 0x01, 0x01, 0x01, 0x01];
    assert_eq!(
        RepeatedFields::<Y_SIZE>::decode(&mut &referee[..]),
        Err(Error::Full(Y_SIZE))
    );
}

#[test]
fn test_capacity_boundary() {
    let mut msg = RepeatedFields::<Y_SIZE>::default();
    for value in 0..Y_SIZE as u32 {
        msg.y.push(value).unwrap();
    }
    assert_eq!(msg.y.push(99), Err(Error::Full(Y_SIZE)));
    assert_eq!(msg.y.len(), Y_SIZE);
    assert_eq!(msg.y.get(Y_SIZE), None);

    let mut msg = RepeatedMessages::<Y_SIZE>::default();
    for value in 0..Y_SIZE as u32 {
        msg.y.push(nested(value, value)).unwrap();
    }
    assert_eq!(msg.y.push(nested(99, 99)), Err(Error::Full(Y_SIZE)));
    assert_eq!(msg.y.len(), Y_SIZE);
}

#[test]
fn test_roundtrip() {
    let values = [0, 1, 127, 128, 300, 0x0FFF_FFFF, u32::MAX];
    for &x in &values {
        for &v in &values {
            let msg = fields(x, &[v, x, 0], v);
            let mut buf: Vec<u8> = Vec::new();
            msg.serialize(&mut buf).unwrap();
            assert_eq!(buf.len(), msg.serialized_size());
            assert_eq!(RepeatedFields::decode(&mut &buf[..]).unwrap(), msg);

            let mut msg = RepeatedMessages::<Y_SIZE>::default();
            msg.x.set(x);
            msg.y.push(nested(x, v)).unwrap();
            msg.y.push(nested(v, 0)).unwrap();
            msg.z.set(v);
            let mut buf: Vec<u8> = Vec::new();
            msg.serialize(&mut buf).unwrap();
            assert_eq!(buf.len(), msg.serialized_size());
            assert_eq!(RepeatedMessages::decode(&mut &buf[..]).unwrap(), msg);
        }
    }
}

#[test]
fn test_traced_decode_of_unknown_fields() {
    // Skipping is logged at trace level; make sure a subscriber does not change the outcome.
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();

    let referee = [0x08, 0x01, 0x20, 0x05, 0x2A, 0x01, 0xAA, 0x18, 0x02];
    let msg = RepeatedFields::<Y_SIZE>::decode(&mut &referee[..]).unwrap();
    assert_eq!(msg, fields(1, &[], 2));
}
