//! In-memory sink

use crate::core::{Result, Sink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sink that keeps everything written to it in memory.
///
/// Clones share the same buffer, so one clone can be handed to a logger
/// while another inspects what arrived.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    buf: Mutex<Vec<u8>>,
    writes: AtomicU64,
    flushes: AtomicU64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.inner.buf.lock().clone()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.inner.buf.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents_string().lines().map(str::to_string).collect()
    }

    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::Relaxed)
    }

    pub fn flush_count(&self) -> u64 {
        self.inner.flushes.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.inner.buf.lock().clear();
    }
}

impl Sink for MemorySink {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.inner.buf.lock().extend_from_slice(buf);
        self.inner.writes.fetch_add(1, Ordering::Relaxed);
        Ok(buf.len())
    }

    fn flush(&self) -> Result<()> {
        self.inner.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
