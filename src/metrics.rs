//! Metrics for observability.
//!
//! Exports Prometheus-compatible metrics for:
//! - Batch planning and outcome (planned vs. replicated)
//! - Artifact stores and render failures
//! - Target folder creation
//! - Deactivations
//! - Content tree commits
//! - Reference scans
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `replication_` and follow Prometheus conventions:
//! - Counters end in `_total`
//! - Gauges represent current state
//! - Histograms track distributions (duration, size)
//!
//! # Usage
//!
//! ```rust,no_run
//! use content_replication::metrics;
//! use std::time::Duration;
//!
//! // After an activation batch
//! metrics::record_batch("activate", 12, 11, Duration::from_millis(250));
//!
//! // After a failed render
//! metrics::record_artifact_failure("html", "render_status");
//! ```

use metrics::{counter, gauge, histogram};
use std::time::Duration;

// =============================================================================
// Batch Metrics
// =============================================================================

/// Record a finished batch. `planned - replicated` is the partial-failure count.
pub fn record_batch(operation: &str, planned: usize, replicated: usize, duration: Duration) {
    let op = operation.to_string();

    counter!("replication_batches_total", "operation" => op.clone()).increment(1);
    counter!("replication_batch_planned_total", "operation" => op.clone())
        .increment(planned as u64);
    counter!("replication_batch_replicated_total", "operation" => op.clone())
        .increment(replicated as u64);

    let failed = planned.saturating_sub(replicated);
    if failed > 0 {
        counter!("replication_batch_failed_total", "operation" => op.clone())
            .increment(failed as u64);
    }

    histogram!("replication_batch_duration_seconds", "operation" => op.clone())
        .record(duration.as_secs_f64());
    histogram!("replication_batch_size", "operation" => op).record(planned as f64);
}

/// Record entries dropped from a plan (duplicates, excluded names, metadata children).
pub fn record_plan_skipped(reason: &str, count: usize) {
    if count > 0 {
        counter!("replication_plan_skipped_total", "reason" => reason.to_string())
            .increment(count as u64);
    }
}

/// Gauge for the batch state machine.
pub fn set_batch_state(state: &str) {
    // Encode state as numeric for alerting
    let value = match state {
        "Idle" => 0.0,
        "ResolvingReferences" => 1.0,
        "BuildingSet" => 2.0,
        "Replicating" => 3.0,
        "Committing" => 4.0,
        "Done" => 5.0,
        _ => -1.0,
    };
    gauge!("replication_batch_state").set(value);
}

// =============================================================================
// Artifact Metrics
// =============================================================================

/// Record one artifact written to the target.
pub fn record_artifact_stored(kind: &str, extension: &str, bytes: usize) {
    counter!(
        "replication_artifacts_stored_total",
        "kind" => kind.to_string(),
        "extension" => extension.to_string()
    )
    .increment(1);
    histogram!("replication_artifact_size_bytes", "kind" => kind.to_string()).record(bytes as f64);
}

/// Record a failed render/store for one extension of one node.
pub fn record_artifact_failure(extension: &str, error_kind: &str) {
    counter!(
        "replication_artifact_failures_total",
        "extension" => extension.to_string(),
        "error" => error_kind.to_string()
    )
    .increment(1);
}

/// Record a replication stamp write.
pub fn record_stamp(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("replication_stamps_total", "status" => status).increment(1);
}

/// Record a folder created on the target.
pub fn record_folder_created() {
    counter!("replication_folders_created_total").increment(1);
}

// =============================================================================
// Deactivation / Commit Metrics
// =============================================================================

/// Record a deactivation by node kind.
pub fn record_deactivation(kind: &str, removed: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "replication_deactivations_total",
        "kind" => kind.to_string(),
        "status" => status
    )
    .increment(1);
    if removed > 0 {
        counter!("replication_deactivated_nodes_total", "kind" => kind.to_string())
            .increment(removed as u64);
    }
}

/// Record the end-of-batch content tree commit.
pub fn record_commit(success: bool, duration: Duration) {
    let status = if success { "success" } else { "failure" };
    counter!("replication_commits_total", "status" => status).increment(1);
    histogram!("replication_commit_duration_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Reference Scan Metrics
// =============================================================================

/// Record a reference scan (`forward` or `reverse`).
pub fn record_reference_scan(direction: &str, found: usize, duration: Duration) {
    counter!("replication_reference_scans_total", "direction" => direction.to_string())
        .increment(1);
    histogram!("replication_reference_scan_found", "direction" => direction.to_string())
        .record(found as f64);
    histogram!(
        "replication_reference_scan_duration_seconds",
        "direction" => direction.to_string()
    )
    .record(duration.as_secs_f64());
}
