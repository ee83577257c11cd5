//! Test utilities and mock destinations for ringlog development.
//!
//! Provides [`Write`] implementations with controllable behaviour
//! ([`SharedSink`], [`SlowSink`], [`FailingSink`], [`BrokenSink`],
//! [`PanickingSink`]) and
//! handler fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// In-memory destination whose contents stay readable after the writer
/// has taken ownership of a clone.
#[derive(Clone, Debug, Default)]
pub struct SharedSink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Contents as UTF-8, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sleeps for a fixed delay before every write.
#[derive(Clone, Debug)]
pub struct SlowSink<W> {
    pub inner: W,
    pub delay: Duration,
}

impl<W> SlowSink<W> {
    pub fn new(inner: W, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<W: Write> Write for SlowSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        thread::sleep(self.delay);
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Returns an error from the first `fail_remaining` writes, then behaves
/// like its inner [`SharedSink`].
#[derive(Clone, Debug)]
pub struct FailingSink {
    pub inner: SharedSink,
    pub fail_remaining: usize,
}

impl FailingSink {
    pub fn new(inner: SharedSink, failures: usize) -> Self {
        Self {
            inner,
            fail_remaining: failures,
        }
    }

    /// Stop failing.
    pub fn heal(&mut self) {
        self.fail_remaining = 0;
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_remaining > 0 {
            self.fail_remaining -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "destination gone"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fails every write and every flush.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrokenSink;

impl Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "write refused"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "flush refused"))
    }
}

/// Panics inside the first `panic_remaining` writes, then behaves like
/// its inner [`SharedSink`].
#[derive(Clone, Debug)]
pub struct PanickingSink {
    pub inner: SharedSink,
    pub panic_remaining: usize,
}

impl PanickingSink {
    pub fn new(inner: SharedSink, panics: usize) -> Self {
        Self {
            inner,
            panic_remaining: panics,
        }
    }
}

impl Write for PanickingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.panic_remaining > 0 {
            self.panic_remaining -= 1;
            panic!("destination exploded");
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Poll `condition` every millisecond until it holds or `timeout` passes.
/// Returns whether it held.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_sink_clones_see_the_same_buffer() {
        let sink = SharedSink::new();
        let mut clone = sink.clone();
        clone.write_all(b"abc").unwrap();
        assert_eq!(sink.contents(), b"abc");
        assert_eq!(sink.text(), "abc");
    }

    #[test]
    fn failing_sink_recovers_after_budget() {
        let sink = SharedSink::new();
        let mut failing = FailingSink::new(sink.clone(), 1);
        assert!(failing.write(b"lost").is_err());
        failing.write_all(b"kept").unwrap();
        assert_eq!(sink.contents(), b"kept");
    }

    #[test]
    fn wait_until_times_out() {
        assert!(!wait_until(Duration::from_millis(5), || false));
        assert!(wait_until(Duration::from_millis(5), || true));
    }
}
