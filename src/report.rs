//! Where the "storage unavailable" condition is reported.
//!
//! SYSTEM CONTEXT
//! ==============
//! Stores report at most once per call. Hosts that want the message on screen
//! or in telemetry install their own sink; the default only logs.

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;

/// Receiver for human-readable storage health messages.
pub trait ReportSink: Send + Sync {
    fn storage_unavailable(&self, message: &str);
}

/// Default sink: a `tracing` error event.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn storage_unavailable(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Route `tracing`/`log` output to the browser console.
///
/// Safe to call more than once; later calls are no-ops.
#[cfg(feature = "hydrate")]
pub fn init_browser_logging() {
    if console_log::init_with_level(log::Level::Info).is_err() {
        tracing::debug!("browser logger already installed");
    }
}
