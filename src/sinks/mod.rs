//! Sink implementations

pub mod buffered;
pub mod console;
pub mod memory;
pub mod rotating_file;

pub use buffered::{BufferedSink, DEFAULT_BUFFER_SIZE, DEFAULT_FLUSH_INTERVAL};
pub use console::ConsoleSink;
pub use memory::MemorySink;
pub use rotating_file::{RotatingFileSink, RotationPolicy};

pub use crate::core::Sink;
