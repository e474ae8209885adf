//! Alert reporting for high-severity records

pub mod buffered;
pub mod notifier;

pub use buffered::{BufferedReporter, DEFAULT_REPORT_COUNT, DEFAULT_REPORT_INTERVAL, MAX_PENDING_BYTES};
pub use notifier::{new_notifier, Notifier, NotifierKind, SlackNotifier, REPORT_TIMEOUT};
