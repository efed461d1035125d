// ── Error sinks ──
//
// The core reports failures; it never decides how they are shown.
// `LogErrorSink` writes them to the tracing pipeline, `ChannelErrorSink`
// hands them to the embedding application over an mpsc channel.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::CoreError;

/// Receives errors the providers cannot handle themselves.
pub trait ErrorSink: Send + Sync + 'static {
    /// `message` is a short human-readable summary suitable for a toast
    /// or status line; `error` carries the details.
    fn handle_error(&self, error: &CoreError, message: &str);
}

/// Logs every error at `ERROR` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn handle_error(&self, err: &CoreError, message: &str) {
        error!(error = %err, "{message}");
    }
}

/// An error as delivered by [`ChannelErrorSink`].
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    /// Rendered error, including its source chain.
    pub error: String,
    pub at: DateTime<Utc>,
}

/// Forwards errors to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelErrorSink {
    tx: mpsc::UnboundedSender<ErrorReport>,
}

impl ChannelErrorSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ErrorReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ErrorSink for ChannelErrorSink {
    fn handle_error(&self, err: &CoreError, message: &str) {
        let report = ErrorReport {
            message: message.to_owned(),
            error: render_chain(err),
            at: Utc::now(),
        };
        if self.tx.send(report).is_err() {
            debug!(error = %err, "error receiver dropped; logging instead");
            error!(error = %err, "{message}");
        }
    }
}

fn render_chain(err: &CoreError) -> String {
    let mut rendered = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !rendered.contains(&cause_text) {
            rendered.push_str(": ");
            rendered.push_str(&cause_text);
        }
        source = cause.source();
    }
    rendered
}
