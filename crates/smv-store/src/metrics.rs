//! Store metrics collection.
//!
//! Standardized counters for monitoring store writes by collection.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Total store writes by collection and operation.
    pub const WRITES_TOTAL: &str = "smv_store_writes_total";

    /// Total transactional storyboard commits.
    pub const COMMITS_TOTAL: &str = "smv_store_commits_total";
}

/// Record a write against a collection.
pub fn record_write(collection: &'static str, operation: &'static str) {
    counter!(
        names::WRITES_TOTAL,
        "collection" => collection,
        "operation" => operation
    )
    .increment(1);
}

/// Record a transactional storyboard commit.
pub fn record_commit() {
    counter!(names::COMMITS_TOTAL).increment(1);
}
