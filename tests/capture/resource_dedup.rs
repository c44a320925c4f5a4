//! Content-addressed resources are written once per capture.

use crate::common::*;

fn observation_digests(chunks: &[Chunk]) -> Vec<Vec<u8>> {
    let names = type_names(chunks);
    chunks
        .iter()
        .filter(|c| {
            c.type_id()
                .map(|t| names[t.0 as usize] == "tracespy.MemoryObservation")
                .unwrap_or(false)
        })
        .filter_map(Chunk::message)
        .map(|m| {
            let fields = decode_fields(m).unwrap();
            fields[3].1.as_bytes().unwrap().to_vec()
        })
        .collect()
}

#[test]
fn identical_content_one_resource_two_observations() {
    let (session, sink) = open_session(CaptureConfig::for_testing());
    let mut bytes = vec![0u8; 64];
    bytes[..8].copy_from_slice(b"sameblob");
    bytes[32..40].copy_from_slice(b"sameblob");
    let memory = app_memory(0x10000, &bytes);

    let mut call = session.begin_call(1, memory);
    call.read(0x10000, 8);
    call.read(0x10000 + 32, 8);
    call.exit();

    let chunks = decode(&sink);
    assert_eq!(count_objects(&chunks, "tracespy.Resource"), 1);
    let digests = observation_digests(&chunks);
    assert_eq!(digests.len(), 2);
    assert_eq!(digests[0], digests[1]);
    assert_eq!(
        digests[0],
        tracespy::ResourceId::for_content(b"sameblob").as_bytes().to_vec()
    );
}

#[test]
fn dedup_spans_calls_and_memory_sources() {
    let (session, sink) = open_session(CaptureConfig::for_testing());
    let sources = [
        (app_memory(0, b"texture-bits"), 0),
        (app_memory(0x9000, b"texture-bits"), 0x9000),
    ];

    for (memory, base) in sources {
        let mut call = session.begin_call(2, memory);
        call.write(base, 12);
        call.exit();
    }

    let chunks = decode(&sink);
    assert_eq!(count_objects(&chunks, "tracespy.Resource"), 1);
    assert_eq!(count_objects(&chunks, "tracespy.MemoryObservation"), 2);
    assert_eq!(session.resources().len(), 1);
}

#[test]
fn merged_ranges_hash_as_one() {
    let (session, sink) = open_session(
        CaptureConfig::for_testing()
            .with_observer(tracespy::ObserverConfig::new().with_merge_threshold(4)),
    );
    let memory = app_memory(0, b"0123456789abcdef");

    let mut call = session.begin_call(1, memory);
    call.read(0, 4);
    call.read(6, 4);
    assert_eq!(call.pending().len(), 1);
    call.exit();

    let chunks = decode(&sink);
    assert_eq!(count_objects(&chunks, "tracespy.MemoryObservation"), 1);
    assert_eq!(
        observation_digests(&chunks)[0],
        tracespy::ResourceId::for_content(b"0123456789").as_bytes().to_vec()
    );
}
