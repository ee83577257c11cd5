//! Integration test: overflow handling and hysteresis.
//!
//! When the ring buffer or segment queue is full the writer drops records
//! without blocking, reports each drop, and only resumes once at least
//! half the buffer is free again.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ringlog_arena::ArenaConfig;
use ringlog_engine::{Handlers, LogWriter, WriterConfig};
use ringlog_test_utils::fixtures::SkipCounter;
use ringlog_test_utils::{wait_until, SharedSink, SlowSink};

fn config(capacity: usize, max_segments: usize, flush_ms: u64) -> WriterConfig {
    WriterConfig {
        arena: ArenaConfig {
            capacity,
            max_segments,
        },
        flush_period: Duration::from_millis(flush_ms),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn fourth_record_is_dropped_when_arena_is_full() {
    init_tracing();
    let inner = SharedSink::new();
    let sink = SlowSink::new(inner.clone(), Duration::from_millis(20));
    let skips = SkipCounter::new();
    let handlers = Handlers::default().on_skip(skips.handler());
    let writer = LogWriter::new(sink, config(8, 3, 100), handlers).unwrap();

    for record in [b"t1", b"t2", b"t3", b"t4"] {
        assert_eq!(writer.write_record(record), 2);
    }
    assert!(writer.is_skipping());

    let report = writer.shutdown();
    assert_eq!(inner.contents(), b"t1t2t3");
    assert_eq!(skips.get(), 1);
    assert_eq!(report.metrics.records_skipped, 1);
    assert_eq!(report.metrics.skip_transitions, 1);
}

#[test]
fn one_transition_for_a_run_of_drops() {
    init_tracing();
    let skips = SkipCounter::new();
    let handlers = Handlers::default().on_skip(skips.handler());
    let writer = LogWriter::new(SharedSink::new(), config(16, 100, 10_000), handlers).unwrap();

    for _ in 0..7 {
        writer.write_record(b"ab");
    }
    for _ in 0..5 {
        writer.write_record(b"ab");
    }

    let metrics = writer.metrics();
    assert_eq!(metrics.records_accepted, 7);
    assert_eq!(metrics.records_skipped, 5);
    assert_eq!(metrics.skip_transitions, 1);
    assert_eq!(skips.get(), 5);
}

#[test]
fn skipping_drops_records_that_would_fit() {
    let skips = SkipCounter::new();
    let handlers = Handlers::default().on_skip(skips.handler());
    let writer = LogWriter::new(SharedSink::new(), config(16, 100, 10_000), handlers).unwrap();

    // 14 of 15 usable bytes taken; a 2-byte record trips Skipping.
    for _ in 0..7 {
        writer.write_record(b"ab");
    }
    writer.write_record(b"cd");
    assert!(writer.is_skipping());

    // One byte is still free, but nothing is accepted until a release.
    writer.write_record(b"x");
    assert_eq!(skips.get(), 2);
    assert_eq!(writer.buffered_bytes(), 14);
}

#[test]
fn segment_ceiling_triggers_skipping() {
    let skips = SkipCounter::new();
    let handlers = Handlers::default().on_skip(skips.handler());
    let sink = SlowSink::new(SharedSink::new(), Duration::from_millis(200));
    let writer = LogWriter::new(sink, config(16 * 1024, 2, 10_000), handlers).unwrap();

    // A full coalescing block keeps the worker inside the slow write, so
    // the small records that follow pile up in the queue.
    writer.write_record(&[b'a'; 4096]);
    for _ in 0..3 {
        writer.write_record(b"r");
    }

    // Plenty of bytes were free; only the queue ceiling can have tripped.
    assert!(skips.get() >= 1);
    assert_eq!(writer.metrics().skip_transitions, 1);
}

#[test]
fn writing_resumes_after_the_buffer_drains() {
    let sink = SharedSink::new();
    let skips = SkipCounter::new();
    let handlers = Handlers::default().on_skip(skips.handler());
    let writer = LogWriter::new(sink.clone(), config(16, 100, 20), handlers).unwrap();

    for _ in 0..8 {
        writer.write_record(b"ab");
    }
    assert!(wait_until(Duration::from_secs(2), || !writer.is_skipping()));

    writer.write_record(b"zz");
    writer.shutdown();
    assert!(sink.text().ends_with("zz"));
    assert!(skips.get() >= 1);
}

#[test]
fn producers_do_not_wait_on_a_slow_destination() {
    let inner = SharedSink::new();
    let sink = SlowSink::new(inner.clone(), Duration::from_millis(50));
    let writer = LogWriter::new(sink, config(1 << 16, 1000, 1), Handlers::default()).unwrap();

    let start = Instant::now();
    for i in 0..200u32 {
        writer.write_record(format!("{i}\n").as_bytes());
    }
    assert!(start.elapsed() < Duration::from_millis(500));

    let report = writer.shutdown();
    assert_eq!(inner.len() as u64, report.metrics.bytes_flushed);
}

#[test]
fn oversized_record_is_dropped_without_blocking_later_writes() {
    let sink = SharedSink::new();
    let skips = SkipCounter::new();
    let handlers = Handlers::default().on_skip(skips.handler());
    let writer = LogWriter::new(sink.clone(), config(32, 100, 10), handlers).unwrap();

    assert_eq!(writer.write_record(&[b'x'; 40]), 40);
    assert!(!writer.is_skipping());
    writer.write_record(b"fits");
    writer.shutdown();

    assert_eq!(sink.contents(), b"fits");
    assert_eq!(skips.get(), 1);
}

#[test]
fn overflow_event_routed_into_the_writer_does_not_block() {
    let sink = SharedSink::new();
    let writer = Arc::new(
        LogWriter::new(sink.clone(), config(16, 100, 10_000), Handlers::default()).unwrap(),
    );

    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let producer = {
        let writer = Arc::clone(&writer);
        thread::spawn(move || {
            let subscriber = tracing_subscriber::fmt()
                .with_writer(Arc::clone(&writer))
                .finish();
            tracing::subscriber::with_default(subscriber, || {
                for _ in 0..10 {
                    writer.write_record(b"ab");
                }
            });
            let _ = done_tx.send(());
        })
    };

    assert!(
        done_rx.recv_timeout(Duration::from_secs(5)).is_ok(),
        "producer blocked while logging the overflow"
    );
    producer.join().unwrap();

    // The warning itself lands on a writer that is already skipping.
    let metrics = writer.metrics();
    assert_eq!(metrics.records_accepted, 7);
    assert_eq!(metrics.skip_transitions, 1);
    assert!(metrics.records_skipped >= 3);
}
