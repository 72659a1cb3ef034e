//! Structured flow logging.
//!
//! Session context comes from the enclosing tracing span; the logger adds
//! the flow name and elapsed time so every line of a run can be grouped.

use tokio::time::Instant;
use tracing::{error, info, warn};

/// Logger for one run of a flow.
#[derive(Debug, Clone)]
pub struct FlowLogger {
    flow: &'static str,
    started: Instant,
}

impl FlowLogger {
    /// Start timing a flow run.
    pub fn new(flow: &'static str) -> Self {
        Self {
            flow,
            started: Instant::now(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(flow = self.flow, "Flow started: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(flow = self.flow, "Flow warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(flow = self.flow, "Flow error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            flow = self.flow,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Flow completed: {}", message
        );
    }
}
