//! Runtime-adjustable minimum severity

use super::log_level::LogLevel;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Shared, atomically updated severity threshold.
///
/// Clones share the same value, so the handle held by the control endpoint
/// and the one held by the primary route always agree.
///
/// # Example
///
/// ```
/// use logtee::{LevelController, LogLevel};
///
/// let controller = LevelController::new(LogLevel::Info);
/// let route_view = controller.clone();
///
/// controller.set_level(LogLevel::Error);
/// assert!(!route_view.enabled(LogLevel::Warn));
/// assert!(route_view.enabled(LogLevel::Error));
/// ```
#[derive(Debug, Clone)]
pub struct LevelController {
    level: Arc<AtomicU8>,
}

impl LevelController {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: Arc::new(AtomicU8::new(level as u8)),
        }
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Release);
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }
}

impl Default for LevelController {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}
