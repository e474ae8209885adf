//! File logging with an error file, console echo and a level endpoint
//!
//! Run with `cargo run --example file_logging`, then try
//! `curl 'http://127.0.0.1:9090/updateLevel?level=debug'` while it runs.

use logtee::{info, warn, Config, LogContext, LogLevel};
use std::thread;
use std::time::Duration;

fn main() -> logtee::Result<()> {
    let config = Config::from_toml_str(
        r#"
        name = "demo"
        level = "info"
        mode = "file"
        filename = "logs/demo.log"
        errorFileName = "logs/demo.err.log"
        maxSize = 10
        maxBackUp = 3
        console = true
        async = true
        port = 9090
        "#,
    )?;
    let logger = config.build()?;

    let worker = logger.with_field("component", "worker");
    for round in 0..10 {
        info!(worker, "round {} started", round);
        worker.debug("only visible after /updateLevel?level=debug");
        if round % 3 == 0 {
            worker.log_with_context(
                LogLevel::Error,
                "round failed",
                LogContext::new().with_field("round", round),
            );
        }
        thread::sleep(Duration::from_millis(500));
    }

    warn!(logger, "shutting down at level {}", logger.level());
    logger.shutdown()
}
