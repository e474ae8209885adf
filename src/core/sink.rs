//! Sink trait for byte-level log destinations

use super::error::Result;

/// Append-only byte destination with an explicit flush.
///
/// Sinks are shared between routes and background flush tasks, so every
/// method takes `&self`; implementations guard their own state.
pub trait Sink: Send + Sync {
    /// Write one encoded record, returning the number of bytes accepted
    fn write(&self, buf: &[u8]) -> Result<usize>;

    fn flush(&self) -> Result<()>;

    /// Stop any background work and flush what is pending
    fn close(&self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;
}
