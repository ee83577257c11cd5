//! Integration test: destination reset ordering.
//!
//! Records accepted before `reset` go to the old destination, records
//! accepted after it go to the new one, and `reset` hands the old
//! destination back only once it holds everything it is owed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ringlog_arena::ArenaConfig;
use ringlog_engine::{Handlers, LogWriter, ResetError, WriterConfig};
use ringlog_test_utils::fixtures::SkipCounter;
use ringlog_test_utils::{SharedSink, SlowSink};

fn config(capacity: usize, max_segments: usize) -> WriterConfig {
    WriterConfig {
        arena: ArenaConfig {
            capacity,
            max_segments,
        },
        flush_period: Duration::from_millis(10),
    }
}

#[test]
fn old_destination_is_complete_when_reset_returns() {
    let first = SharedSink::new();
    let second = SharedSink::new();
    let writer = LogWriter::new(first.clone(), config(4096, 100), Handlers::default()).unwrap();

    writer.write_record(b"alpha ");
    writer.write_record(b"beta");
    let returned = writer.reset(second.clone()).unwrap();
    assert_eq!(returned.contents(), b"alpha beta");
    assert_eq!(first.contents(), b"alpha beta");

    writer.write_record(b"gamma");
    writer.shutdown();
    assert_eq!(second.contents(), b"gamma");
    assert_eq!(first.contents(), b"alpha beta");
}

#[test]
fn reset_waits_for_a_slow_destination() {
    let first = SharedSink::new();
    let slow = SlowSink::new(first.clone(), Duration::from_millis(30));
    let writer = LogWriter::new(
        slow,
        config(64 * 1024, 1000),
        Handlers::default(),
    )
    .unwrap();

    for i in 0..50u32 {
        writer.write_record(format!("{i};").as_bytes());
    }
    let expected: String = (0..50u32).map(|i| format!("{i};")).collect();

    let old = writer
        .reset(SlowSink::new(SharedSink::new(), Duration::ZERO))
        .unwrap();
    assert_eq!(old.inner.text(), expected);
}

#[test]
fn reset_clears_skipping() {
    let skips = SkipCounter::new();
    let handlers = Handlers::default().on_skip(skips.handler());
    let mut cfg = config(16, 100);
    cfg.flush_period = Duration::from_secs(60);
    let second = SharedSink::new();
    let writer = LogWriter::new(SharedSink::new(), cfg, handlers).unwrap();

    for _ in 0..8 {
        writer.write_record(b"ab");
    }
    assert!(writer.is_skipping());

    writer.reset(second.clone()).unwrap();
    assert!(!writer.is_skipping());
    assert_eq!(writer.buffered_bytes(), 0);

    writer.write_record(b"ok");
    writer.shutdown();
    assert_eq!(second.contents(), b"ok");
    assert_eq!(skips.get(), 1);
}

#[test]
fn concurrent_writes_split_cleanly_across_reset() {
    let first = SharedSink::new();
    let second = SharedSink::new();
    let writer = Arc::new(
        LogWriter::new(first.clone(), config(1 << 20, 100_000), Handlers::default()).unwrap(),
    );
    let stop = Arc::new(AtomicBool::new(false));

    let producer = {
        let writer = Arc::clone(&writer);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut seq = 0u32;
            while !stop.load(Ordering::SeqCst) || seq < 100 {
                writer.write_record(format!("{seq:06}\n").as_bytes());
                seq += 1;
            }
            seq
        })
    };

    thread::sleep(Duration::from_millis(5));
    writer.reset(second.clone()).unwrap();
    stop.store(true, Ordering::SeqCst);
    let written = producer.join().unwrap();
    let report = writer.shutdown();
    assert_eq!(report.metrics.records_skipped, 0);

    let parse = |sink: &SharedSink| -> Vec<u32> {
        sink.text().lines().map(|l| l.parse().unwrap()).collect()
    };
    let before = parse(&first);
    let after = parse(&second);

    let all: Vec<u32> = before.iter().chain(after.iter()).copied().collect();
    assert_eq!(all, (0..written).collect::<Vec<_>>());
}

#[test]
fn reset_after_shutdown_returns_the_sink() {
    let writer = LogWriter::new(SharedSink::new(), config(64, 10), Handlers::default()).unwrap();
    writer.shutdown();

    let spare = SharedSink::new();
    match writer.reset(spare) {
        Err(ResetError::Shutdown(sink)) => assert!(sink.is_empty()),
        other => panic!("expected shutdown error, got {other:?}"),
    }
}
