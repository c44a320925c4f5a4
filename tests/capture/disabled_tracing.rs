//! Untraced calls cost nothing and write nothing.

use crate::common::*;
use std::sync::Arc;
use tracespy::{NullEncoder, ObserverConfig, SeenResources};

#[test]
fn null_encoder_records_nothing() {
    let seen = Arc::new(SeenResources::new());
    let memory = app_memory(0, &[7; 256]);
    let mut observer = CallObserver::new(
        Arc::new(NullEncoder),
        Arc::clone(&seen),
        memory,
        &ObserverConfig::default(),
    );

    for i in 0..10_000u64 {
        observer.begin(1);
        observer.encoder().message(&Foo(i));
        observer.read(i % 200, 32);
        observer.write((i * 7) % 200, 16);
        assert!(observer.pending().is_empty());
        observer.exit();
    }
    assert!(seen.is_empty());
}

#[test]
fn suspended_session_writes_only_header() {
    let (session, sink) = open_session(CaptureConfig::for_testing().with_start_suspended(true));
    let memory = app_memory(0, &[7; 256]);
    for i in 0..10_000u64 {
        let mut call = session.begin_call(1, memory.clone());
        call.enter(&Foo(i));
        call.read(i % 200, 32);
        call.write(0, 8);
        call.exit();
    }
    assert_eq!(sink.contents(), HEADER_V2.to_vec());
    assert_eq!(session.call_counts(), (10_000, 0));
}

#[test]
fn unwatched_api_is_not_traced() {
    let (session, sink) = open_session(CaptureConfig::for_testing().with_watched_apis([3]));
    let memory = app_memory(0, b"payload");

    let mut call = session.begin_call(1, memory.clone());
    call.read(0, 7);
    call.exit();
    assert_eq!(sink.contents(), HEADER_V2.to_vec());

    let mut call = session.begin_call(3, memory);
    call.read(0, 7);
    call.exit();
    assert_eq!(count_objects(&decode(&sink), "tracespy.MemoryObservation"), 1);
}
