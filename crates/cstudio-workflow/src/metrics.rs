//! Generation metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const GENERATION_REQUESTS_TOTAL: &str = "cstudio_generation_requests_total";
    pub const GENERATION_DURATION_SECONDS: &str = "cstudio_generation_duration_seconds";
    pub const VIDEO_POLLS_TOTAL: &str = "cstudio_video_polls_total";
    pub const BATCH_SLOTS_TOTAL: &str = "cstudio_batch_slots_total";
}

/// Record one remote generation call.
pub fn record_generation(kind: &str, success: bool, duration_secs: f64) {
    let labels = [
        ("kind", kind.to_string()),
        ("outcome", if success { "success" } else { "failure" }.to_string()),
    ];
    counter!(names::GENERATION_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one status check of a video operation.
pub fn record_video_poll() {
    counter!(names::VIDEO_POLLS_TOTAL).increment(1);
}

/// Record the final status of a batch slot.
pub fn record_batch_slot(status: &str) {
    let labels = [("status", status.to_string())];
    counter!(names::BATCH_SLOTS_TOTAL, &labels).increment(1);
}
