#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use picobuf::{message, Error, Message, RepeatedMessage, RepeatedScalar, Scalar};

message! {
    struct Leaf {
        1 => a: Scalar<u8>,
        3 => b: RepeatedScalar<u64, 4>,
    }
}

message! {
    struct Root {
        1 => id: Scalar<u32>,
        2 => values: RepeatedScalar<u32, 8>,
        5 => leaves: RepeatedMessage<Leaf, 3>,
        16 => tail: Scalar<u64>,
    }
}

#[derive(Arbitrary, Debug)]
struct LeafInput {
    a: u8,
    b: Vec<u64>,
}

#[derive(Arbitrary, Debug)]
struct RootInput {
    id: u32,
    values: Vec<u32>,
    leaves: Vec<LeafInput>,
    tail: u64,
    sink_len: u8,
}

#[derive(Arbitrary, Debug)]
enum FuzzInput {
    Decode(Vec<u8>),
    Roundtrip(RootInput),
}

fn build(input: &RootInput) -> Root {
    let mut root = Root::default();
    root.id.set(input.id);
    for &value in input.values.iter().take(8) {
        root.values.push(value).unwrap();
    }
    for leaf_input in input.leaves.iter().take(3) {
        let mut leaf = Leaf::default();
        leaf.a.set(leaf_input.a);
        for &value in leaf_input.b.iter().take(4) {
            leaf.b.push(value).unwrap();
        }
        root.leaves.push(leaf).unwrap();
    }
    root.tail.set(input.tail);
    root
}

fn fuzz(input: FuzzInput) {
    match input {
        FuzzInput::Decode(bytes) => {
            // Arbitrary bytes either decode or fail cleanly; whatever decodes re-encodes.
            let Ok(root) = Root::decode(&mut &bytes[..]) else {
                return;
            };
            let mut buf: Vec<u8> = Vec::new();
            root.serialize(&mut buf).expect("Failed to re-encode a decoded message!");
            assert_eq!(buf.len(), root.serialized_size());
            let again =
                Root::decode(&mut &buf[..]).expect("Failed to decode a re-encoded message!");
            assert_eq!(root, again);
        }
        FuzzInput::Roundtrip(input) => {
            let root = build(&input);

            let mut buf: Vec<u8> = Vec::new();
            root.serialize(&mut buf).expect("Failed to encode into an unbounded buffer!");
            assert_eq!(buf.len(), root.serialized_size());
            let decoded =
                Root::decode(&mut &buf[..]).expect("Failed to decode an encoded message!");
            assert_eq!(root, decoded);

            // A bounded sink either takes the whole message or reports why it could not.
            let mut storage = vec![0u8; input.sink_len as usize];
            let mut sink = &mut storage[..];
            match root.serialize(&mut sink) {
                Ok(()) => assert!(buf.len() <= input.sink_len as usize),
                Err(Error::CapacityExceeded { .. }) | Err(Error::WriteRejected) => {
                    assert!(buf.len() > input.sink_len as usize)
                }
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
