//! Prometheus metric names and recording helpers

pub const SUBMISSIONS_TOTAL: &str = "commentguard_submissions_total";
pub const DEDUP_HITS_TOTAL: &str = "commentguard_dedup_hits_total";
pub const BATCHES_TOTAL: &str = "commentguard_batches_total";
pub const BATCH_SIZE: &str = "commentguard_batch_size";
pub const FALLBACK_TOTAL: &str = "commentguard_fallback_total";
pub const ITEM_FAILURES_TOTAL: &str = "commentguard_item_failures_total";
pub const IMPLICIT_CLEAN_TOTAL: &str = "commentguard_implicit_clean_total";
pub const DISPATCH_LATENCY_US: &str = "commentguard_dispatch_latency_us";

/// Register descriptions with the installed recorder
pub fn describe() {
    ::metrics::describe_counter!(SUBMISSIONS_TOTAL, "Accepted classification submissions");
    ::metrics::describe_counter!(
        DEDUP_HITS_TOTAL,
        "Submissions collapsed onto an already-buffered dedup key"
    );
    ::metrics::describe_counter!(BATCHES_TOTAL, "Batch calls dispatched, by trigger");
    ::metrics::describe_histogram!(BATCH_SIZE, "Distinct items per dispatched batch");
    ::metrics::describe_counter!(
        FALLBACK_TOTAL,
        "Batches retried item by item, by failure kind"
    );
    ::metrics::describe_counter!(
        ITEM_FAILURES_TOTAL,
        "Items whose final result was an error, by failure kind"
    );
    ::metrics::describe_counter!(
        IMPLICIT_CLEAN_TOTAL,
        "Items absent from a batch response and resolved as clean"
    );
    ::metrics::describe_histogram!(
        DISPATCH_LATENCY_US,
        ::metrics::Unit::Microseconds,
        "Backend round-trip latency by call kind"
    );
}

pub fn record_submission(dedup_hit: bool) {
    ::metrics::counter!(SUBMISSIONS_TOTAL).increment(1);
    if dedup_hit {
        ::metrics::counter!(DEDUP_HITS_TOTAL).increment(1);
    }
}

pub fn record_batch(trigger: &'static str, items: usize) {
    ::metrics::counter!(BATCHES_TOTAL, "trigger" => trigger).increment(1);
    ::metrics::histogram!(BATCH_SIZE).record(items as f64);
}

pub fn record_fallback(reason: &'static str) {
    ::metrics::counter!(FALLBACK_TOTAL, "reason" => reason).increment(1);
}

pub fn record_item_failure(kind: &'static str) {
    ::metrics::counter!(ITEM_FAILURES_TOTAL, "kind" => kind).increment(1);
}

pub fn record_implicit_clean(count: usize) {
    if count > 0 {
        ::metrics::counter!(IMPLICIT_CLEAN_TOTAL).increment(count as u64);
    }
}

pub fn record_dispatch_latency(call: &'static str, latency_us: u64) {
    ::metrics::histogram!(DISPATCH_LATENCY_US, "call" => call).record(latency_us as f64);
}
