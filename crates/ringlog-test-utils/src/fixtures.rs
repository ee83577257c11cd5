//! Handler fixtures that record what a writer reported.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use ringlog_core::SinkError;

/// Sums the counts passed to a skip handler.
#[derive(Clone, Debug, Default)]
pub struct SkipCounter {
    count: Arc<AtomicU64>,
}

impl SkipCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A skip handler feeding this counter.
    pub fn handler(&self) -> impl Fn(u64) + Send + Sync + 'static {
        let count = Arc::clone(&self.count);
        move |n: u64| {
            count.fetch_add(n, Ordering::SeqCst);
        }
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

/// Collects the rendered messages passed to a write-error handler.
#[derive(Clone, Debug, Default)]
pub struct ErrorLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A write-error handler feeding this log. Ignores the destination.
    pub fn handler<W: 'static>(&self) -> impl FnMut(&mut W, &SinkError) + Send + 'static {
        let messages = Arc::clone(&self.messages);
        move |_sink: &mut W, err: &SinkError| {
            messages
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(err.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
