//! Snapshots of live state share the capture's resource set.

use crate::common::*;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracespy::{reference_type, PoolMemory, SerializeContext, Slice, StateObject};

static BUFFER: Lazy<Arc<TypeDescriptor>> = Lazy::new(|| {
    Arc::new(
        TypeDescriptor::new("vk.Buffer")
            .with_field("handle", 1, FieldKind::UInt64)
            .with_field("memory", 2, FieldKind::Message(Slice::type_descriptor())),
    )
});

static DEVICE: Lazy<TypeDescriptor> = Lazy::new(|| {
    TypeDescriptor::new("vk.Device")
        .with_repeated_field("buffers", 1, FieldKind::Message(reference_type(&BUFFER)))
});

struct Buffer {
    handle: u64,
    memory: Slice,
}

impl StateObject for Buffer {
    fn descriptor(&self) -> &TypeDescriptor {
        &BUFFER
    }
    fn serialize(&self, ctx: &mut SerializeContext<'_>, out: &mut Vec<u8>) {
        MessageWriter::new(out).uint(1, self.handle);
        ctx.slice(out, 2, self.memory);
    }
}

struct Device {
    buffers: Vec<Arc<dyn StateObject>>,
}

impl StateObject for Device {
    fn descriptor(&self) -> &TypeDescriptor {
        &DEVICE
    }
    fn serialize(&self, ctx: &mut SerializeContext<'_>, out: &mut Vec<u8>) {
        for b in &self.buffers {
            ctx.reference(out, 1, b);
        }
    }
}

fn buffer(handle: u64, pool: PoolId, size: u64) -> Arc<dyn StateObject> {
    Arc::new(Buffer {
        handle,
        memory: Slice {
            pool,
            base: 0,
            size,
        },
    })
}

#[test]
fn snapshot_reuses_resources_seen_by_calls() {
    let (session, sink) = open_session(CaptureConfig::for_testing());

    let mut call = session.begin_call(1, app_memory(0x4000, b"vertex-data"));
    call.read(0x4000, 11);
    call.exit();

    let pool = session.arena().adopt(b"vertex-data".to_vec());
    let root = Device {
        buffers: vec![buffer(7, pool, 11)],
    };
    let stats = session.snapshot(&root, |_| {});
    assert_eq!(stats.pools_observed, 1);
    assert_eq!(stats.references, 1);

    let chunks = decode(&sink);
    assert_eq!(count_objects(&chunks, "tracespy.Resource"), 1);
    assert_eq!(count_objects(&chunks, "tracespy.MemoryObservation"), 2);

    let names = object_names(&chunks);
    let begin = names
        .iter()
        .position(|n| n == "tracespy.GlobalStateBegin")
        .unwrap();
    assert_eq!(names[begin + 1], "vk.Device");
    assert_eq!(names[begin + 2], "tracespy.MemoryObservation");
}

#[test]
fn created_pools_precede_the_root() {
    let (session, sink) = open_session(CaptureConfig::for_testing());
    let mut staged = Vec::new();
    let stats = session.snapshot(&Device { buffers: Vec::new() }, |s| {
        let init: &mut dyn FnMut(&PoolMemory) = &mut |m| m.store(0, b"staged");
        staged.push(s.create_pool(6, Some(init)));
        staged.push(s.create_pool(4096, None));
        staged.push(s.create_pool(128, None));
    });
    assert_eq!(stats.pools_created, 3);
    assert_eq!(stats.pools_observed, 0);

    // Stand-in pools die with the snapshot
    for pool in &staged {
        assert!(!session.arena().contains(*pool));
    }

    let chunks = decode(&sink);
    assert_eq!(
        object_names(&chunks),
        vec![
            "tracespy.GlobalStateBegin",
            "tracespy.Resource",
            "tracespy.MemoryObservation",
            // Empty resource, written once for both virtual pools
            "tracespy.Resource",
            "tracespy.MemoryObservation",
            "tracespy.MemoryObservation",
            "vk.Device",
        ]
    );
}

#[test]
fn each_snapshot_observes_pools_again() {
    let (session, sink) = open_session(CaptureConfig::for_testing());
    let pool = session.arena().adopt(vec![3; 32]);
    let root = Device {
        buffers: vec![buffer(1, pool, 32), buffer(2, pool, 16)],
    };

    let first = session.snapshot(&root, |_| {});
    let second = session.snapshot(&root, |_| {});
    assert_eq!(first, second);
    assert_eq!(first.pools_observed, 1);

    let chunks = decode(&sink);
    assert_eq!(count_objects(&chunks, "tracespy.GlobalStateBegin"), 2);
    assert_eq!(count_objects(&chunks, "tracespy.Resource"), 1);
    assert_eq!(count_objects(&chunks, "tracespy.MemoryObservation"), 2);
    // Type definitions are per stream, not per snapshot
    assert_eq!(
        type_names(&chunks)
            .iter()
            .filter(|n| *n == "vk.Device")
            .count(),
        1
    );
}
