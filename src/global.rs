//! Process-wide default logger
//!
//! Nothing is installed implicitly. Applications that want a global handle
//! call [`init`] once at start-up; [`replace`] swaps it atomically later,
//! for example after reloading configuration.

use crate::core::{Logger, LoggerError, Result};
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::sync::Arc;

static DEFAULT: ArcSwapOption<Logger> = ArcSwapOption::const_empty();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Install the default logger. Fails if one is already installed.
pub fn init(logger: Logger) -> Result<()> {
    let _guard = INIT_LOCK.lock();
    if DEFAULT.load().is_some() {
        return Err(LoggerError::other("default logger already initialized"));
    }
    DEFAULT.store(Some(Arc::new(logger)));
    Ok(())
}

/// Install `logger`, returning the previous default if there was one
pub fn replace(logger: Logger) -> Option<Logger> {
    let _guard = INIT_LOCK.lock();
    DEFAULT
        .swap(Some(Arc::new(logger)))
        .map(|previous| previous.as_ref().clone())
}

/// The current default logger
pub fn get() -> Option<Logger> {
    DEFAULT.load_full().map(|logger| logger.as_ref().clone())
}
