//! Count and time triggered batching in front of a [`Notifier`]

use super::notifier::Notifier;
use crate::core::ticker::FlushTicker;
use crate::core::{Result, Sink};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Pending bytes above which a write forces a flush (1 MiB)
pub const MAX_PENDING_BYTES: usize = 1024 * 1024;

/// Default flush interval for alert batches
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(3);

/// Default record count that triggers an inline flush
pub const DEFAULT_REPORT_COUNT: i64 = 20;

#[derive(Default)]
struct Pending {
    bytes: Vec<u8>,
    // End offset of each record in `bytes`
    ends: Vec<usize>,
}

impl Pending {
    fn count(&self) -> usize {
        self.ends.len()
    }

    /// Split into one message per record and reset
    fn take_messages(&mut self) -> Vec<String> {
        let mut messages = Vec::with_capacity(self.ends.len());
        let mut start = 0;
        for &end in &self.ends {
            let record = String::from_utf8_lossy(&self.bytes[start..end]);
            messages.push(record.trim_end().to_string());
            start = end;
        }
        self.bytes.clear();
        self.ends.clear();
        messages
    }
}

struct ReporterShared {
    notifier: Box<dyn Notifier>,
    pending: Mutex<Pending>,
    max_count: i64,
    max_bytes: usize,
}

impl ReporterShared {
    fn flush_locked(&self, pending: &mut Pending) -> Result<()> {
        if pending.count() == 0 {
            return Ok(());
        }
        let messages = pending.take_messages();
        self.notifier.report(&messages)
    }

    fn sync(&self) -> Result<()> {
        let mut pending = self.pending.lock();
        self.flush_locked(&mut pending)
    }
}

/// Batches high-severity records and forwards them to a [`Notifier`].
///
/// A batch is sent when `max_count` records are pending, when pending bytes
/// pass 1 MiB, on every tick of the flush interval, and on close. A batch
/// the notifier rejects is dropped.
///
/// # Example
///
/// ```
/// use logtee::report::{BufferedReporter, Notifier};
/// use logtee::{Result, Sink};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Collect(Arc<Mutex<Vec<Vec<String>>>>);
///
/// impl Notifier for Collect {
///     fn report(&self, messages: &[String]) -> Result<()> {
///         self.0.lock().unwrap().push(messages.to_vec());
///         Ok(())
///     }
/// }
///
/// let batches = Arc::new(Mutex::new(Vec::new()));
/// let reporter =
///     BufferedReporter::new(Box::new(Collect(batches.clone())), 2, Duration::ZERO).unwrap();
///
/// reporter.write(b"first\n").unwrap();
/// reporter.write(b"second\n").unwrap();
/// assert_eq!(batches.lock().unwrap()[0], vec!["first", "second"]);
/// ```
pub struct BufferedReporter {
    shared: Arc<ReporterShared>,
    ticker: Mutex<Option<FlushTicker>>,
}

impl BufferedReporter {
    /// `max_count <= 0` disables the count trigger; a zero interval disables the ticker
    pub fn new(notifier: Box<dyn Notifier>, max_count: i64, flush_interval: Duration) -> Result<Self> {
        let shared = Arc::new(ReporterShared {
            notifier,
            pending: Mutex::new(Pending::default()),
            max_count,
            max_bytes: MAX_PENDING_BYTES,
        });

        let ticker = if flush_interval.is_zero() {
            None
        } else {
            let periodic = Arc::clone(&shared);
            Some(FlushTicker::spawn("logtee-report-flush", flush_interval, move || {
                if let Err(e) = periodic.sync() {
                    tracing::error!(error = %e, "report flush failed");
                }
            })?)
        };

        Ok(Self {
            shared,
            ticker: Mutex::new(ticker),
        })
    }

    /// Send every pending record as one batch
    pub fn sync(&self) -> Result<()> {
        self.shared.sync()
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending.lock().count()
    }

    pub fn pending_bytes(&self) -> usize {
        self.shared.pending.lock().bytes.len()
    }
}

/// JSON records are re-rendered indented so alerts stay readable
fn render_record(data: &[u8]) -> Vec<u8> {
    match serde_json::from_slice::<serde_json::Value>(data) {
        Ok(value @ serde_json::Value::Object(_)) => match serde_json::to_vec_pretty(&value) {
            Ok(mut pretty) => {
                pretty.push(b'\n');
                pretty
            }
            Err(_) => data.to_vec(),
        },
        _ => data.to_vec(),
    }
}

impl Sink for BufferedReporter {
    fn write(&self, data: &[u8]) -> Result<usize> {
        let record = render_record(data);
        let mut pending = self.shared.pending.lock();

        pending.bytes.extend_from_slice(&record);
        let end = pending.bytes.len();
        pending.ends.push(end);

        let count_reached =
            self.shared.max_count > 0 && pending.count() as i64 >= self.shared.max_count;
        if count_reached || pending.bytes.len() >= self.shared.max_bytes {
            self.shared.flush_locked(&mut pending)?;
        }
        Ok(data.len())
    }

    fn flush(&self) -> Result<()> {
        self.sync()
    }

    fn close(&self) -> Result<()> {
        if let Some(mut ticker) = self.ticker.lock().take() {
            ticker.stop();
        }
        self.sync()
    }

    fn name(&self) -> &str {
        "report"
    }
}

impl Drop for BufferedReporter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(error = %e, "final report flush failed");
        }
    }
}
