//! A broken sink degrades the capture to no-ops.

use crate::common::*;
use std::io::{self, Write};
use tracespy::IoSink;

#[test]
fn short_write_stops_all_sink_traffic() {
    let sink = ShortWriteSink::new(HEADER_V2.len() + 8);
    let session = CaptureSession::open(Box::new(sink.clone()), CaptureConfig::for_testing()).unwrap();
    let memory = app_memory(0, &[1; 128]);

    let mut call = session.begin_call(1, memory.clone());
    call.enter(&Foo(1));
    call.read(0, 128);
    call.exit();
    assert!(!session.is_healthy());

    let calls = sink.calls();
    for _ in 0..100 {
        let mut call = session.begin_call(1, memory.clone());
        call.enter(&Foo(2));
        call.write(0, 64);
        call.exit();
        session.encoder().message(&Baz(-1));
    }
    assert!(!session.flush());
    assert_eq!(sink.calls(), calls);
}

#[test]
fn truncated_capture_decodes_up_to_the_break() {
    // Header plus exactly the first type definition and object
    let sizing = MemorySink::new();
    {
        let enc = PackEncoder::new(Box::new(sizing.clone()), &WriterConfig::for_testing());
        enc.message(&Foo(1));
    }
    let budget = sizing.contents().len();

    let sink = ShortWriteSink::new(budget);
    let enc = PackEncoder::new(Box::new(sink.clone()), &WriterConfig::for_testing());
    enc.message(&Foo(1));
    assert!(enc.is_healthy());
    enc.message(&Bar);
    assert!(!enc.is_healthy());
    enc.message(&Foo(2));

    let chunks = StreamReader::read_all(&sink.contents()).unwrap();
    assert_eq!(object_names(&chunks), vec!["test.Foo"]);
}

struct HangUp {
    accepted: usize,
}

impl Write for HangUp {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.accepted > 0 {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer hung up"));
        }
        self.accepted += buf.len();
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn broken_pipe_marks_session_unhealthy() {
    let sink = IoSink::new(HangUp { accepted: 0 });
    let session = CaptureSession::open(Box::new(sink), CaptureConfig::for_testing()).unwrap();
    assert!(session.is_healthy());
    session.encoder().message(&Foo(1));
    assert!(!session.is_healthy());
    // Still safe to use
    let mut call = session.begin_call(1, app_memory(0, b"abc"));
    call.read(0, 3);
    call.exit();
}
