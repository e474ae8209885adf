//! Console sink implementation

use crate::core::{LoggerError, Result, Sink};
use parking_lot::Mutex;
use std::io::{self, Write};

/// Locked standard-output sink.
///
/// Any other writer can be substituted with [`ConsoleSink::with_writer`],
/// which is how tests observe console output.
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Sink for ConsoleSink {
    fn write(&self, buf: &[u8]) -> Result<usize> {
        self.out
            .lock()
            .write_all(buf)
            .map_err(|e| LoggerError::io_operation("writing to console", "write failed", e))?;
        Ok(buf.len())
    }

    fn flush(&self) -> Result<()> {
        self.out.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_reach_writer() {
        let target = Shared::default();
        let sink = ConsoleSink::with_writer(target.clone());

        assert_eq!(sink.write(b"hello\n").unwrap(), 6);
        sink.write(b"world\n").unwrap();
        sink.flush().unwrap();

        assert_eq!(&*target.0.lock(), b"hello\nworld\n");
        assert_eq!(sink.name(), "console");
    }
}
