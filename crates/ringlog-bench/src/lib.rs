//! Benchmark profiles for the ringlog buffered writer.
//!
//! - [`reference_profile`]: 4 MiB arena, default segment ceiling and timer
//! - [`pressure_profile`]: 64 KiB arena that overflows under sustained load
//! - [`record_of`]: deterministic newline-terminated payloads

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::time::Duration;

use ringlog_arena::ArenaConfig;
use ringlog_engine::WriterConfig;

/// Writer sized so the benchmark loop never overflows.
pub fn reference_profile() -> WriterConfig {
    WriterConfig {
        arena: ArenaConfig::with_capacity(4 * 1024 * 1024),
        flush_period: WriterConfig::DEFAULT_FLUSH_PERIOD,
    }
}

/// Writer small enough that a tight loop spends time in `Skipping`.
pub fn pressure_profile() -> WriterConfig {
    WriterConfig {
        arena: ArenaConfig {
            capacity: 64 * 1024,
            max_segments: 1024,
        },
        flush_period: Duration::from_millis(1),
    }
}

/// A `len`-byte record: `len - 1` copies of `fill` and a trailing newline.
pub fn record_of(len: usize, fill: u8) -> Vec<u8> {
    let mut record = vec![fill; len.saturating_sub(1)];
    if len > 0 {
        record.push(b'\n');
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_validate() {
        reference_profile().validate().unwrap();
        pressure_profile().validate().unwrap();
    }

    #[test]
    fn record_has_requested_length() {
        assert_eq!(record_of(0, b'x'), b"");
        assert_eq!(record_of(1, b'x'), b"\n");
        assert_eq!(record_of(4, b'x'), b"xxx\n");
    }
}
