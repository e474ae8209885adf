//! Alert notifiers
//!
//! A notifier delivers a batch of pre-rendered text messages to an external
//! alerting channel.

use crate::core::{LoggerError, Result};
use crossbeam_channel::{bounded, unbounded, Sender};
use serde::Serialize;
use std::str::FromStr;
use std::thread;
use std::time::Duration;

/// Timeout applied to every outbound alert request
pub const REPORT_TIMEOUT: Duration = Duration::from_secs(5);

pub trait Notifier: Send + Sync {
    fn report(&self, messages: &[String]) -> Result<()>;
}

/// Supported alerting integrations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Slack,
}

impl NotifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifierKind::Slack => "slack",
        }
    }
}

impl FromStr for NotifierKind {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slack" => Ok(NotifierKind::Slack),
            other => Err(LoggerError::config(
                "ReportConfig",
                format!("unsupported report type: '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct SlackMessage {
    text: String,
}

impl SlackMessage {
    /// All messages in one code block, newline separated
    fn from_batch(messages: &[String]) -> Self {
        Self {
            text: format!("```\n{}\n```", messages.join("\n")),
        }
    }
}

struct Delivery {
    message: SlackMessage,
    reply: Sender<Result<()>>,
}

/// Posts batches to a Slack incoming-webhook URL.
///
/// Requests run on a dedicated worker thread that owns the blocking HTTP
/// client, so `report` may be called from plain threads and from inside an
/// async runtime alike.
pub struct SlackNotifier {
    jobs: Option<Sender<Delivery>>,
    worker: Option<thread::JoinHandle<()>>,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(webhook_url, REPORT_TIMEOUT)
    }

    pub fn with_timeout(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = webhook_url.into();
        if url.trim().is_empty() {
            return Err(LoggerError::config("ReportConfig", "slack webhook url (token) is empty"));
        }

        let (jobs, queue) = unbounded::<Delivery>();
        let worker = thread::Builder::new()
            .name("logtee-slack".to_string())
            .spawn(move || {
                let client = reqwest::blocking::Client::builder().timeout(timeout).build();
                for delivery in queue.iter() {
                    let result = match client {
                        Ok(ref client) => post(client, &url, &delivery.message),
                        Err(ref e) => Err(LoggerError::report(
                            "slack",
                            format!("create client failed: {}", e),
                        )),
                    };
                    let _ = delivery.reply.send(result);
                }
            })
            .map_err(|e| LoggerError::io_operation("spawn slack worker", "thread spawn failed", e))?;

        Ok(Self {
            jobs: Some(jobs),
            worker: Some(worker),
            timeout,
        })
    }
}

fn post(client: &reqwest::blocking::Client, url: &str, message: &SlackMessage) -> Result<()> {
    let response = client
        .post(url)
        .json(message)
        .send()
        .map_err(|e| LoggerError::report("slack", format!("send request failed: {}", e)))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(LoggerError::ReportStatus {
            status: status.as_u16(),
        });
    }
    Ok(())
}

impl Notifier for SlackNotifier {
    fn report(&self, messages: &[String]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let jobs = self
            .jobs
            .as_ref()
            .ok_or_else(|| LoggerError::report("slack", "notifier closed"))?;
        let (reply, answer) = bounded(1);
        jobs.send(Delivery {
            message: SlackMessage::from_batch(messages),
            reply,
        })
        .map_err(|_| LoggerError::report("slack", "worker stopped"))?;

        // The client timeout bounds the request; the extra second covers
        // connection setup on the worker.
        answer
            .recv_timeout(self.timeout + Duration::from_secs(1))
            .map_err(|_| LoggerError::report("slack", "no response from worker"))?
    }
}

impl Drop for SlackNotifier {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Build the notifier for a configured integration
pub fn new_notifier(kind: NotifierKind, token: &str) -> Result<Box<dyn Notifier>> {
    match kind {
        NotifierKind::Slack => Ok(Box::new(SlackNotifier::new(token)?)),
    }
}
