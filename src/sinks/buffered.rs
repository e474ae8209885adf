//! Buffered sink decorator
//!
//! Collects writes in memory and hands them to the wrapped sink either when
//! the buffer would overflow its capacity or when the periodic flush fires.

use crate::core::ticker::FlushTicker;
use crate::core::{Result, Sink};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Default buffer capacity (256 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 256 * 1024;

/// Default periodic flush interval
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

struct BufferedShared {
    inner: Arc<dyn Sink>,
    buf: Mutex<Vec<u8>>,
    capacity: usize,
}

impl BufferedShared {
    /// Hand pending bytes to the wrapped sink. Bytes stay buffered if the
    /// sink rejects them so the next flush can retry.
    fn drain(&self, buf: &mut Vec<u8>) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        self.inner.write(buf)?;
        buf.clear();
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut buf = self.buf.lock();
        self.drain(&mut buf)?;
        self.inner.flush()
    }
}

/// Sink decorator that batches writes in memory
///
/// # Example
///
/// ```
/// use logtee::sinks::{BufferedSink, MemorySink};
/// use logtee::Sink;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let target = MemorySink::new();
/// let sink = BufferedSink::new(Arc::new(target.clone()), 1024, Duration::from_secs(30)).unwrap();
///
/// sink.write(b"buffered\n").unwrap();
/// assert!(target.contents().is_empty());
///
/// sink.flush().unwrap();
/// assert_eq!(target.contents_string(), "buffered\n");
/// ```
pub struct BufferedSink {
    shared: Arc<BufferedShared>,
    ticker: Mutex<Option<FlushTicker>>,
    name: String,
}

impl BufferedSink {
    /// Wrap `inner`; a zero `flush_interval` disables the periodic flush
    pub fn new(inner: Arc<dyn Sink>, capacity: usize, flush_interval: Duration) -> Result<Self> {
        let name = format!("buffered({})", inner.name());
        let shared = Arc::new(BufferedShared {
            inner,
            buf: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        });

        let ticker = if flush_interval.is_zero() {
            None
        } else {
            let periodic = Arc::clone(&shared);
            Some(FlushTicker::spawn("logtee-buffered-flush", flush_interval, move || {
                if let Err(e) = periodic.flush() {
                    tracing::error!(sink = %periodic.inner.name(), error = %e, "periodic flush failed");
                }
            })?)
        };

        Ok(Self {
            shared,
            ticker: Mutex::new(ticker),
            name,
        })
    }

    /// Wrap `inner` with the default capacity and interval
    pub fn with_defaults(inner: Arc<dyn Sink>) -> Result<Self> {
        Self::new(inner, DEFAULT_BUFFER_SIZE, DEFAULT_FLUSH_INTERVAL)
    }

    /// Bytes currently waiting for a flush
    pub fn buffered_len(&self) -> usize {
        self.shared.buf.lock().len()
    }
}

impl Sink for BufferedSink {
    fn write(&self, data: &[u8]) -> Result<usize> {
        let mut buf = self.shared.buf.lock();

        if buf.len() + data.len() > self.shared.capacity {
            self.shared.drain(&mut buf)?;
        }

        if data.len() >= self.shared.capacity {
            self.shared.inner.write(data)?;
        } else {
            buf.extend_from_slice(data);
        }
        Ok(data.len())
    }

    fn flush(&self) -> Result<()> {
        self.shared.flush()
    }

    fn close(&self) -> Result<()> {
        if let Some(mut ticker) = self.ticker.lock().take() {
            ticker.stop();
        }
        self.shared.flush()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for BufferedSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(sink = %self.name, error = %e, "final flush failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoggerError;
    use crate::sinks::MemorySink;
    use std::thread;

    fn buffered(capacity: usize, interval: Duration) -> (MemorySink, BufferedSink) {
        let target = MemorySink::new();
        let sink = BufferedSink::new(Arc::new(target.clone()), capacity, interval).unwrap();
        (target, sink)
    }

    #[test]
    fn test_overflow_drains_before_append() {
        let (target, sink) = buffered(10, Duration::ZERO);

        sink.write(b"12345").unwrap();
        sink.write(b"6789").unwrap();
        assert_eq!(target.write_count(), 0);
        assert_eq!(sink.buffered_len(), 9);

        sink.write(b"abc").unwrap();
        assert_eq!(target.contents_string(), "123456789");
        assert_eq!(sink.buffered_len(), 3);
    }

    #[test]
    fn test_oversized_write_goes_straight_through() {
        let (target, sink) = buffered(4, Duration::ZERO);

        sink.write(b"ab").unwrap();
        sink.write(b"0123456789").unwrap();
        assert_eq!(target.contents_string(), "ab0123456789");
        assert_eq!(sink.buffered_len(), 0);
    }

    #[test]
    fn test_periodic_flush() {
        let (target, sink) = buffered(DEFAULT_BUFFER_SIZE, Duration::from_millis(20));

        sink.write(b"tick\n").unwrap();
        thread::sleep(Duration::from_millis(150));

        assert_eq!(target.contents_string(), "tick\n");
        assert!(target.flush_count() >= 1);
    }

    #[test]
    fn test_close_flushes_pending() {
        let (target, sink) = buffered(DEFAULT_BUFFER_SIZE, DEFAULT_FLUSH_INTERVAL);
        sink.write(b"pending\n").unwrap();
        sink.close().unwrap();
        assert_eq!(target.contents_string(), "pending\n");
    }

    #[test]
    fn test_failed_drain_keeps_bytes() {
        struct Broken;
        impl Sink for Broken {
            fn write(&self, _buf: &[u8]) -> Result<usize> {
                Err(LoggerError::writer("disk gone"))
            }
            fn flush(&self) -> Result<()> {
                Ok(())
            }
            fn name(&self) -> &str {
                "broken"
            }
        }

        let sink = BufferedSink::new(Arc::new(Broken), 8, Duration::ZERO).unwrap();
        sink.write(b"12345").unwrap();
        assert!(sink.write(b"6789").is_err());
        assert_eq!(sink.buffered_len(), 5);
        assert!(sink.flush().is_err());
        assert_eq!(sink.buffered_len(), 5);
    }
}
