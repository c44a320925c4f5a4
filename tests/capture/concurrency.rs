//! Concurrent emission through one root encoder.

use crate::common::*;
use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 200;

#[test]
fn concurrent_groups_never_share_ids() {
    let (root, sink) = root_encoder();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let root = Arc::clone(&root);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let group = root.message_group(&Bar);
                for i in 0..PER_THREAD {
                    group.message(&Foo((t * PER_THREAD + i) as u64));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // The decoder rejects forward and dangling parent references.
    let chunks = decode(&sink);

    let mut ids = Vec::new();
    let mut children: HashMap<ChunkId, usize> = HashMap::new();
    let mut opens = Vec::new();
    for c in &chunks {
        match c {
            Chunk::Object { id, parent, .. } => {
                ids.push(*id);
                assert!(parent < id);
                *children.entry(*parent).or_default() += 1;
            }
            Chunk::GroupOpen { id, parent, .. } => {
                ids.push(*id);
                assert_eq!(*parent, ChunkId::ROOT);
                opens.push(*id);
            }
            _ => {}
        }
    }

    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());
    // Numbers follow stream order
    assert_eq!(sorted, ids);

    assert_eq!(opens.len(), THREADS);
    for group in &opens {
        assert_eq!(children.get(group), Some(&PER_THREAD));
    }
    let ends = chunks
        .iter()
        .filter(|c| matches!(c, Chunk::GroupEnd { .. }))
        .count();
    assert_eq!(ends, THREADS);
}

#[test]
fn concurrent_registration_defines_each_type_once() {
    let (root, sink) = root_encoder();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let root = Arc::clone(&root);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut ids = Vec::new();
                for _ in 0..50 {
                    ids.push(root.register_type(Foo(0).descriptor()).0);
                    ids.push(root.register_type(Baz(0).descriptor()).0);
                }
                ids
            })
        })
        .collect();

    let mut seen = Vec::new();
    for h in handles {
        seen.extend(h.join().unwrap());
    }
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 2);

    let chunks = decode(&sink);
    assert_eq!(type_names(&chunks).len(), 2);
    assert_eq!(root.type_count(), 2);
}

#[test]
fn concurrent_calls_share_resources() {
    let (session, sink) = open_session(CaptureConfig::for_testing());
    let session = Arc::new(session);
    let memory = app_memory(0, &[0xAB; 64]);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let session = Arc::clone(&session);
            let memory = Arc::clone(&memory);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..20 {
                    let mut call = session.begin_call(1, Arc::clone(&memory));
                    call.enter(&Foo(1));
                    call.read(0, 32);
                    call.exit();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let chunks = decode(&sink);
    let total = THREADS * 20;
    assert_eq!(count_objects(&chunks, "tracespy.Resource"), 1);
    assert_eq!(count_objects(&chunks, "tracespy.MemoryObservation"), total);

    // The resource precedes every observation of it
    let names = object_names(&chunks);
    let first_resource = names.iter().position(|n| n == "tracespy.Resource");
    let first_observation = names.iter().position(|n| n == "tracespy.MemoryObservation");
    assert!(first_resource < first_observation);
}
