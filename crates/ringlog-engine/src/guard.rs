//! Fault boundary around the destination.
//!
//! Every call into the sink, and into the caller's write-error handler,
//! goes through this module. A returned error and a panic both come back
//! as a [`SinkError`], so the worker has one failure path and never
//! unwinds.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use ringlog_core::{SinkError, WriteErrorHandler};

/// Write all of `bytes` to `sink`.
pub(crate) fn write_guarded<W: Write>(sink: &mut W, bytes: &[u8]) -> Result<(), SinkError> {
    // The sink is reused after a panic; callers accept whatever state it
    // was left in, the same as after a returned error.
    match panic::catch_unwind(AssertUnwindSafe(|| sink.write_all(bytes))) {
        Ok(result) => result.map_err(SinkError::Io),
        Err(payload) => Err(SinkError::from_panic(payload)),
    }
}

/// Flush `sink`.
pub(crate) fn flush_guarded<W: Write>(sink: &mut W) -> Result<(), SinkError> {
    match panic::catch_unwind(AssertUnwindSafe(|| sink.flush())) {
        Ok(result) => result.map_err(SinkError::Io),
        Err(payload) => Err(SinkError::from_panic(payload)),
    }
}

/// Run the write-error handler. A panic inside it is returned instead of
/// unwinding through the worker.
pub(crate) fn call_handler<W>(
    handler: &mut WriteErrorHandler<W>,
    sink: &mut W,
    err: &SinkError,
) -> Result<(), SinkError> {
    panic::catch_unwind(AssertUnwindSafe(|| handler(sink, err))).map_err(SinkError::from_panic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("no space left"))
        }
        fn flush(&mut self) -> io::Result<()> {
            panic!("flush exploded")
        }
    }

    struct Exploding;

    impl Write for Exploding {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            panic!("write exploded")
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn successful_write_passes_through() {
        let mut sink = Vec::new();
        assert!(write_guarded(&mut sink, b"hello").is_ok());
        assert!(flush_guarded(&mut sink).is_ok());
        assert_eq!(sink, b"hello");
    }

    #[test]
    fn returned_error_becomes_io() {
        match write_guarded(&mut Broken, b"x") {
            Err(SinkError::Io(e)) => assert!(e.to_string().contains("no space left")),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn write_panic_becomes_panicked() {
        match write_guarded(&mut Exploding, b"x") {
            Err(SinkError::Panicked { message }) => assert_eq!(message, "write exploded"),
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[test]
    fn flush_panic_becomes_panicked() {
        match flush_guarded(&mut Broken) {
            Err(SinkError::Panicked { message }) => assert_eq!(message, "flush exploded"),
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[test]
    fn handler_panic_is_contained() {
        let mut handler: WriteErrorHandler<Vec<u8>> =
            Box::new(|_sink: &mut Vec<u8>, _err: &SinkError| panic!("handler exploded"));
        let err = SinkError::Io(io::Error::other("disk full"));
        match call_handler(&mut handler, &mut Vec::new(), &err) {
            Err(SinkError::Panicked { message }) => assert_eq!(message, "handler exploded"),
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[test]
    fn handler_sees_sink_and_error() {
        let mut handler: WriteErrorHandler<Vec<u8>> =
            Box::new(|sink: &mut Vec<u8>, err: &SinkError| {
                sink.extend_from_slice(err.to_string().as_bytes())
            });
        let mut sink = Vec::new();
        let err = SinkError::Panicked {
            message: "boom".into(),
        };
        assert!(call_handler(&mut handler, &mut sink, &err).is_ok());
        assert_eq!(sink, b"destination panicked: boom");
    }
}
