use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Progress tracker for operations that process multiple items
/// Provides periodic progress updates and a final summary to reduce log noise
pub struct ProgressTracker {
    operation: String,
    total: usize,
    succeeded: usize,
    failed: usize,
    skipped: usize,
    start_time: Instant,
    progress_interval: usize, // Log every N items
    last_progress_log: usize,
    error_counts: HashMap<String, usize>, // Track errors by category
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `operation` - Name used in log lines (e.g., "Plex watchlist remove")
    /// * `total` - Total number of items to process
    /// * `progress_interval` - Log progress every N items
    pub fn new(operation: impl Into<String>, total: usize, progress_interval: usize) -> Self {
        let operation = operation.into();
        if total > progress_interval {
            info!("{}: {} items to process", operation, total);
        }
        Self {
            operation,
            total,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    /// Interval used by the sync phases: every 10 items for small batches, 50 otherwise
    pub fn for_batch(operation: impl Into<String>, total: usize) -> Self {
        let interval = if total < 50 { 10 } else { 50 };
        Self::new(operation, total, interval)
    }

    pub fn record_succeeded(&mut self) {
        self.succeeded += 1;
    }

    /// Record that an item failed to process with a specific error category
    /// This allows grouping errors by type in the summary
    pub fn record_failed_with_error(&mut self, error_category: &str) {
        self.failed += 1;
        *self.error_counts.entry(error_category.to_string()).or_insert(0) += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Log progress if interval has been reached
    ///
    /// # Arguments
    /// * `current` - Current item index (1-based, e.g., idx + 1 from enumerate)
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log >= self.progress_interval && current < self.total {
            let elapsed = self.start_time.elapsed();
            let rate = if elapsed.as_secs_f64() > 0.0 {
                current as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            };
            info!(
                "{}: {}/{} ({:.1} items/sec) | Done: {} | Failed: {} | Skipped: {}",
                self.operation, current, self.total, rate,
                self.succeeded, self.failed, self.skipped
            );
            self.last_progress_log = current;
        }
    }

    /// Log final summary of the operation
    pub fn log_summary(&self) {
        if self.total == 0 {
            return;
        }
        let elapsed = self.start_time.elapsed();
        if self.failed > 0 {
            warn!(
                "{} completed: {} total in {:.1}s | Done: {} | Failed: {} | Skipped: {}",
                self.operation, self.total, elapsed.as_secs_f64(),
                self.succeeded, self.failed, self.skipped
            );

            let mut error_entries: Vec<_> = self.error_counts.iter().collect();
            error_entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let error_summary: Vec<String> = error_entries
                .iter()
                .map(|(category, count)| format!("{}: {}", category, count))
                .collect();
            info!("Error breakdown: {}", error_summary.join(", "));
        } else {
            info!(
                "{} completed: {} total in {:.1}s | Done: {} | Skipped: {}",
                self.operation, self.total, elapsed.as_secs_f64(),
                self.succeeded, self.skipped
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut tracker = ProgressTracker::for_batch("test", 4);
        tracker.record_succeeded();
        tracker.record_failed_with_error("api_error");
        tracker.record_failed_with_error("api_error");
        tracker.record_skipped();
        for current in 1..=4 {
            tracker.log_progress(current);
        }
        tracker.log_summary();

        assert_eq!(tracker.succeeded, 1);
        assert_eq!(tracker.failed, 2);
        assert_eq!(tracker.skipped, 1);
        assert_eq!(tracker.error_counts.get("api_error"), Some(&2));
    }
}
