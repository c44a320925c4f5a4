//! The reference scenario and whole-call flows.

use crate::common::*;
use proptest::prelude::*;

#[test]
fn foo_bar_baz_stream() {
    let (root, sink) = root_encoder();
    root.message(&Foo(1));
    {
        let bar = root.message_group(&Bar);
        bar.message(&Baz(5));
    }

    let chunks = decode(&sink);
    assert_eq!(chunks.len(), 7);
    assert!(matches!(&chunks[0], Chunk::TypeDef { id: TypeId(0), name, .. } if name == "test.Foo"));
    assert_eq!(
        chunks[1],
        Chunk::Object {
            id: ChunkId(1),
            parent: ChunkId(0),
            type_id: TypeId(0),
            message: vec![0x08, 0x01],
        }
    );
    assert!(matches!(&chunks[2], Chunk::TypeDef { id: TypeId(1), name, .. } if name == "test.Bar"));
    assert_eq!(
        chunks[3],
        Chunk::GroupOpen {
            id: ChunkId(2),
            parent: ChunkId(0),
            type_id: TypeId(1),
            message: vec![],
        }
    );
    assert!(matches!(&chunks[4], Chunk::TypeDef { id: TypeId(2), name, .. } if name == "test.Baz"));
    assert_eq!(
        chunks[5],
        Chunk::Object {
            id: ChunkId(3),
            parent: ChunkId(2),
            type_id: TypeId(2),
            message: vec![0x08, 0x0a],
        }
    );
    assert_eq!(chunks[6], Chunk::GroupEnd { group: ChunkId(2) });
}

#[test]
fn foo_bar_baz_tail_bytes() {
    let (root, sink) = root_encoder();
    root.message(&Foo(1));
    for _ in 0..2 {
        let bar = root.message_group(&Bar);
        bar.message(&Baz(5));
    }
    let bytes = sink.contents();
    assert!(bytes.starts_with(HEADER_V2));

    // Second Baz: last id 4, parent 4 -> delta 1, tag 3
    // Its group end: last id 5, group 4 -> delta 2, tag 0
    let tail = &bytes[bytes.len() - 8..];
    assert_eq!(tail, &[0x08, 0x02, 0x06, 0x08, 0x0a, 0x04, 0x04, 0x00]);
}

#[test]
fn call_with_command_group() {
    let (session, sink) = open_session(CaptureConfig::for_testing());
    let memory = app_memory(0x4000, b"vertices and indices");

    let mut call = session.begin_call(1, memory);
    call.enter(&Foo(7));
    call.read(0x4000, 8);
    call.write(0x4000 + 13, 7);
    assert_eq!(call.exit(), 2);

    let chunks = decode(&sink);
    assert_eq!(
        object_names(&chunks),
        vec![
            "test.Foo",
            "tracespy.Resource",
            "tracespy.MemoryObservation",
            "tracespy.Resource",
            "tracespy.MemoryObservation",
        ]
    );
    let parents: Vec<ChunkId> = chunks.iter().filter_map(Chunk::parent).collect();
    assert_eq!(parents[0], ChunkId::ROOT);
    assert!(parents[1..].iter().all(|p| *p == ChunkId(1)));
    assert_eq!(chunks.last(), Some(&Chunk::GroupEnd { group: ChunkId(1) }));
}

#[test]
fn legacy_stream_is_rejected() {
    let legacy = tracespy::Header::Legacy { major: 1, minor: 1 }.to_bytes();
    assert!(StreamReader::read_all(&legacy).is_err());
}

#[derive(Debug, Clone)]
enum Op {
    Object,
    Open,
    Close,
}

#[derive(Debug, PartialEq)]
enum Shape {
    Object { id: u64, parent: u64 },
    Open { id: u64, parent: u64 },
    End { group: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Object), Just(Op::Open), Just(Op::Close)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn nesting_reconstructs(ops in prop::collection::vec(op(), 0..60)) {
        let (root, sink) = root_encoder();
        let mut stack: Vec<(u64, Box<dyn Encoder>)> = Vec::new();
        let mut expected = Vec::new();
        let mut next_id = 1;

        for op in &ops {
            let parent = stack.last().map(|(id, _)| *id).unwrap_or(0);
            match op {
                Op::Object => {
                    match stack.last() {
                        Some((_, group)) => group.message(&Foo(next_id)),
                        None => root.message(&Foo(next_id)),
                    }
                    expected.push(Shape::Object { id: next_id, parent });
                    next_id += 1;
                }
                Op::Open => {
                    let group = match stack.last() {
                        Some((_, group)) => group.message_group(&Bar),
                        None => root.message_group(&Bar),
                    };
                    expected.push(Shape::Open { id: next_id, parent });
                    stack.push((next_id, group));
                    next_id += 1;
                }
                Op::Close => {
                    if let Some((id, group)) = stack.pop() {
                        drop(group);
                        expected.push(Shape::End { group: id });
                    }
                }
            }
        }
        while let Some((id, group)) = stack.pop() {
            drop(group);
            expected.push(Shape::End { group: id });
        }

        let actual: Vec<Shape> = decode(&sink)
            .into_iter()
            .filter_map(|c| match c {
                Chunk::Object { id, parent, .. } => Some(Shape::Object { id: id.0, parent: parent.0 }),
                Chunk::GroupOpen { id, parent, .. } => Some(Shape::Open { id: id.0, parent: parent.0 }),
                Chunk::GroupEnd { group } => Some(Shape::End { group: group.0 }),
                Chunk::TypeDef { .. } => None,
            })
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
