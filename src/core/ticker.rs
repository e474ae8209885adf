//! Periodic background task with an explicit stop signal

use super::error::{LoggerError, Result};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// Runs a closure on its own thread once per interval until stopped.
///
/// Stopping closes the signal channel, wakes the thread immediately and joins
/// it; dropping the ticker stops it as well.
pub struct FlushTicker {
    stop: Option<Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FlushTicker {
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| {
                LoggerError::io_operation("spawn flush ticker", format!("thread '{}'", name), e)
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            // A tick that ends up dropping its owner must not join itself.
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::error!("flush ticker thread panicked");
            }
        }
    }
}

impl Drop for FlushTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
