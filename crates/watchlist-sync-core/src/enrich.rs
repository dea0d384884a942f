use tracing::{debug, info, warn};
use watchlist_sync_models::WatchlistEntry;
use watchlist_sync_sources::{PlexWatchlist, ProgressTracker};

/// Fill in external ids for Plex entries that arrived without GUIDs
///
/// Returns the entries whose lookup failed together with the error message.
/// Failed entries stay in `entries` without ids.
pub async fn enrich_entries(plex: &dyn PlexWatchlist, entries: &mut [WatchlistEntry]) -> Vec<(WatchlistEntry, String)> {
    let pending = entries.iter().filter(|e| e.ids.is_empty()).count();
    if pending == 0 {
        return Vec::new();
    }

    info!("Looking up ids for {} Plex entries without GUIDs", pending);
    let mut tracker = ProgressTracker::for_batch("Plex id lookup", pending);
    let mut failures = Vec::new();
    let mut current = 0;

    for entry in entries.iter_mut().filter(|e| e.ids.is_empty()) {
        current += 1;
        match plex.lookup_ids(entry).await {
            Ok(ids) if ids.is_empty() => {
                debug!("Plex has no external ids for {}", entry.label());
                tracker.record_skipped();
            }
            Ok(ids) => {
                debug!("{} resolved to {:?}", entry.label(), ids.display_id());
                entry.ids.merge(&ids);
                tracker.record_succeeded();
            }
            Err(e) => {
                warn!("Id lookup failed for {}: {}", entry.label(), e);
                tracker.record_failed_with_error("lookup_error");
                failures.push((entry.clone(), e.to_string()));
            }
        }
        tracker.log_progress(current);
    }

    tracker.log_summary();
    failures
}
