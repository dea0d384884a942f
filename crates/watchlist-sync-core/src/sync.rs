use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};
use watchlist_sync_config::SyncSettings;
use watchlist_sync_models::{FilmRecord, UnmatchedReason, WatchlistEntry};
use watchlist_sync_sources::{LetterboxdClient, LetterboxdSource, PlexClient, PlexWatchlist, ProgressTracker};
use crate::diff::{exclude_watched, plex_only, PlannedAddition, Reconciler};
use crate::enrich::enrich_entries;
use crate::error::{Collection, SyncError};
use crate::fallback::{matcher_for, FallbackMatcher};
use crate::report::{ActionKind, FailedAction, ReportedItem, SyncReport, UnmatchedFilm};

/// Runs one Letterboxd to Plex reconciliation
///
/// Phases run strictly in order: authenticate, fetch, enrich, plan, remove, add.
/// Anything failing before the remove phase aborts the run with no mutation;
/// per-record failures afterwards are collected into the [`SyncReport`].
pub struct SyncOrchestrator {
    letterboxd: Box<dyn LetterboxdSource>,
    plex: Box<dyn PlexWatchlist>,
    username: String,
    fallback: Box<dyn FallbackMatcher>,
    dry_run: bool,
}

impl SyncOrchestrator {
    pub fn new(
        letterboxd: Box<dyn LetterboxdSource>,
        plex: Box<dyn PlexWatchlist>,
        username: impl Into<String>,
        fallback: Box<dyn FallbackMatcher>,
    ) -> Self {
        Self {
            letterboxd,
            plex,
            username: username.into(),
            fallback,
            dry_run: false,
        }
    }

    /// Build the HTTP-backed collaborators from resolved settings
    pub fn from_settings(settings: &SyncSettings) -> Result<Self, SyncError> {
        let letterboxd = LetterboxdClient::new(settings.letterboxd_base_url.clone(), settings.letterboxd_timeout)
            .map_err(SyncError::Setup)?;
        let plex = PlexClient::new(
            &settings.plex_token,
            settings.plex_server_url.clone(),
            &settings.plex_discover_url,
            settings.plex_timeout,
        )
        .map_err(SyncError::Setup)?;

        Ok(Self::new(
            Box::new(letterboxd),
            Box::new(plex),
            settings.letterboxd_username.clone(),
            matcher_for(settings.fallback),
        ))
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let mut report = SyncReport::new(Utc::now(), self.dry_run, self.fallback.name());
        info!(
            "Starting sync for Letterboxd user '{}' (fallback: {}, dry run: {})",
            self.username,
            self.fallback.name(),
            self.dry_run
        );

        self.plex.authenticate().await.map_err(SyncError::Authentication)?;

        let (mut plex_watchlist, letterboxd_watchlist, letterboxd_watched) = self.fetch_all().await?;

        for (entry, error) in enrich_entries(self.plex.as_ref(), &mut plex_watchlist).await {
            report.plex_lookup_failed.push(UnmatchedFilm {
                film: ReportedItem::from_entry(&entry),
                reason: UnmatchedReason::LookupError(error),
            });
        }

        let reconciler = Reconciler::new(self.plex.as_ref(), self.fallback.as_ref());
        let to_remove = reconciler.compute_removals(&plex_watchlist, &letterboxd_watched);

        let (to_watch, already_watched) =
            exclude_watched(&letterboxd_watchlist, &letterboxd_watched, self.fallback.as_ref());
        for film in &already_watched {
            debug!("{} is on both Letterboxd lists; not adding", film.label());
        }
        report.skipped_watched = already_watched
            .iter()
            .map(|film| ReportedItem::from_film(film, None))
            .collect();

        let only_on_plex = plex_only(
            &plex_watchlist,
            &letterboxd_watchlist,
            &letterboxd_watched,
            self.fallback.as_ref(),
        );
        for entry in &only_on_plex {
            debug!("Only on Plex: {}", entry.label());
        }
        report.plex_only = only_on_plex.len();

        let additions = reconciler.compute_additions(&plex_watchlist, &to_watch).await;
        report.already_present = additions.already_present;
        report.unmatched.extend(additions.unmatched.iter().map(|(film, reason)| UnmatchedFilm {
            film: ReportedItem::from_film(film, None),
            reason: reason.clone(),
        }));

        info!(
            "Plan: {} to remove, {} to add, {} already present, {} unmatched",
            to_remove.len(),
            additions.to_add.len(),
            additions.already_present,
            report.unmatched.len()
        );

        if self.dry_run {
            info!("Dry run: no changes made to the Plex watchlist");
            report.removed = to_remove.iter().map(ReportedItem::from_entry).collect();
            report.added = additions
                .to_add
                .iter()
                .map(|a| ReportedItem::from_film(&a.film, Some(&a.rating_key)))
                .collect();
        } else {
            self.apply_removals(&to_remove, &mut report).await;
            self.apply_additions(&additions.to_add, &mut report).await;
        }

        report.duration_secs = started.elapsed().as_secs_f64();
        info!(
            "Sync finished in {:.1}s: {} removed, {} added, {} unmatched, {} failed",
            report.duration_secs,
            report.removed.len(),
            report.added.len(),
            report.unmatched.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn fetch_all(&self) -> Result<(Vec<WatchlistEntry>, Vec<FilmRecord>, Vec<FilmRecord>), SyncError> {
        let plex_watchlist = self
            .plex
            .get_watchlist()
            .await
            .map_err(SyncError::fetch(Collection::PlexWatchlist))?;
        let letterboxd_watchlist = self
            .letterboxd
            .get_watchlist(&self.username)
            .await
            .map_err(SyncError::fetch(Collection::LetterboxdWatchlist))?;
        let letterboxd_watched = self
            .letterboxd
            .get_watched(&self.username)
            .await
            .map_err(SyncError::fetch(Collection::LetterboxdWatched))?;

        info!(
            "Fetched {} Plex watchlist entries, {} Letterboxd watchlist films, {} watched films",
            plex_watchlist.len(),
            letterboxd_watchlist.len(),
            letterboxd_watched.len()
        );
        Ok((plex_watchlist, letterboxd_watchlist, letterboxd_watched))
    }

    async fn apply_removals(&self, to_remove: &[WatchlistEntry], report: &mut SyncReport) {
        let mut tracker = ProgressTracker::for_batch("Plex watchlist remove", to_remove.len());
        for (idx, entry) in to_remove.iter().enumerate() {
            match self.plex.remove_from_watchlist(&entry.rating_key).await {
                Ok(()) => {
                    info!("Removed {} from Plex watchlist", entry.label());
                    tracker.record_succeeded();
                    report.removed.push(ReportedItem::from_entry(entry));
                }
                Err(e) => {
                    warn!("Failed to remove {} from Plex watchlist: {}", entry.label(), e);
                    tracker.record_failed_with_error("remove_error");
                    report.failed.push(FailedAction {
                        action: ActionKind::Remove,
                        item: ReportedItem::from_entry(entry),
                        error: e.to_string(),
                    });
                }
            }
            tracker.log_progress(idx + 1);
        }
        tracker.log_summary();
    }

    async fn apply_additions(&self, to_add: &[PlannedAddition], report: &mut SyncReport) {
        let mut tracker = ProgressTracker::for_batch("Plex watchlist add", to_add.len());
        for (idx, addition) in to_add.iter().enumerate() {
            let item = ReportedItem::from_film(&addition.film, Some(&addition.rating_key));
            match self.plex.add_to_watchlist(&addition.rating_key).await {
                Ok(()) => {
                    info!("Added {} to Plex watchlist", addition.film.label());
                    tracker.record_succeeded();
                    report.added.push(item);
                }
                Err(e) => {
                    warn!("Failed to add {} to Plex watchlist: {}", addition.film.label(), e);
                    tracker.record_failed_with_error("add_error");
                    report.failed.push(FailedAction {
                        action: ActionKind::Add,
                        item,
                        error: e.to_string(),
                    });
                }
            }
            tracker.log_progress(idx + 1);
        }
        tracker.log_summary();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::TitleYearMatcher;
    use crate::test_support::{entry, film, FakeLetterboxd, FakePlex};
    use std::sync::Arc;

    // Lets a test keep inspecting the fake after handing it to the orchestrator
    struct Shared(Arc<FakePlex>);

    #[async_trait::async_trait]
    impl PlexWatchlist for Shared {
        async fn authenticate(&self) -> Result<(), watchlist_sync_sources::SourceError> {
            self.0.authenticate().await
        }
        async fn get_watchlist(&self) -> Result<Vec<WatchlistEntry>, watchlist_sync_sources::SourceError> {
            self.0.get_watchlist().await
        }
        async fn lookup_ids(
            &self,
            entry: &WatchlistEntry,
        ) -> Result<watchlist_sync_models::ExternalIds, watchlist_sync_sources::SourceError> {
            self.0.lookup_ids(entry).await
        }
        async fn discover(&self, film: &FilmRecord) -> Result<Vec<WatchlistEntry>, watchlist_sync_sources::SourceError> {
            self.0.discover(film).await
        }
        async fn add_to_watchlist(&self, rating_key: &str) -> Result<(), watchlist_sync_sources::SourceError> {
            self.0.add_to_watchlist(rating_key).await
        }
        async fn remove_from_watchlist(&self, rating_key: &str) -> Result<(), watchlist_sync_sources::SourceError> {
            self.0.remove_from_watchlist(rating_key).await
        }
    }

    fn orchestrator(letterboxd: FakeLetterboxd, plex: &Arc<FakePlex>) -> SyncOrchestrator {
        SyncOrchestrator::new(
            Box::new(letterboxd),
            Box::new(Shared(Arc::clone(plex))),
            "cinephile",
            Box::new(TitleYearMatcher),
        )
    }

    fn scenario_letterboxd() -> FakeLetterboxd {
        FakeLetterboxd {
            watchlist: vec![
                film("Movie B (2021)", None, Some("tt2")),
                film("Unknown Film", None, None),
            ],
            watched: vec![film("Movie A (2020)", None, Some("tt1"))],
            fail_watched: false,
        }
    }

    fn scenario_plex() -> FakePlex {
        FakePlex::with_watchlist(vec![entry("k1", "Movie A", Some(2020), Some("tt1"))])
            .with_candidate("Movie B (2021)", entry("k2", "Movie B", Some(2021), Some("tt2")))
    }

    #[tokio::test]
    async fn test_sync_removes_watched_and_adds_watchlist() {
        let plex = Arc::new(scenario_plex());
        let report = orchestrator(scenario_letterboxd(), &plex).sync().await.unwrap();

        assert_eq!(plex.mutations(), vec!["remove k1".to_string(), "add k2".to_string()]);
        assert_eq!(plex.rating_keys(), vec!["k2".to_string()]);

        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].external_id.as_deref(), Some("tt1"));
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].rating_key.as_deref(), Some("k2"));
        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.unmatched[0].film.title, "Unknown Film");
        assert_eq!(report.unmatched[0].reason, UnmatchedReason::NoExternalId);
        assert!(report.failed.is_empty());
        assert!(!report.dry_run);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let plex = Arc::new(scenario_plex());
        orchestrator(scenario_letterboxd(), &plex).sync().await.unwrap();
        let mutations_after_first = plex.mutations().len();

        let report = orchestrator(scenario_letterboxd(), &plex).sync().await.unwrap();
        assert!(report.removed.is_empty());
        assert!(report.added.is_empty());
        assert_eq!(report.already_present, 1);
        assert_eq!(plex.mutations().len(), mutations_after_first);
    }

    #[tokio::test]
    async fn test_watched_wins_over_watchlist() {
        let plex = Arc::new(
            FakePlex::with_watchlist(vec![entry("k1", "Movie A", Some(2020), Some("tt1"))])
                .with_candidate("Movie A", entry("k1", "Movie A", Some(2020), Some("tt1"))),
        );
        let letterboxd = FakeLetterboxd {
            watchlist: vec![film("Movie A", Some(2020), Some("tt1"))],
            watched: vec![film("Movie A", Some(2020), Some("tt1"))],
            fail_watched: false,
        };

        let report = orchestrator(letterboxd, &plex).sync().await.unwrap();
        assert_eq!(plex.mutations(), vec!["remove k1".to_string()]);
        assert_eq!(report.skipped_watched.len(), 1);
        assert!(report.added.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_error_is_reported_and_run_continues() {
        let mut fake = scenario_plex();
        fake.failing_discover.insert("Movie B (2021)".to_string());
        fake.watchlist.lock().unwrap().push(entry("k8", "Mystery", None, None));
        fake.failing_lookup.insert("k8".to_string());
        let plex = Arc::new(fake);

        let report = orchestrator(scenario_letterboxd(), &plex).sync().await.unwrap();

        assert_eq!(plex.mutations(), vec!["remove k1".to_string()]);
        let lookup_errors: Vec<&str> = report
            .unmatched
            .iter()
            .filter(|u| matches!(u.reason, UnmatchedReason::LookupError(_)))
            .map(|u| u.film.title.as_str())
            .collect();
        assert_eq!(lookup_errors, vec!["Movie B (2021)"]);

        assert_eq!(report.plex_lookup_failed.len(), 1);
        assert_eq!(report.plex_lookup_failed[0].film.rating_key.as_deref(), Some("k8"));
        assert!(matches!(report.plex_lookup_failed[0].reason, UnmatchedReason::LookupError(_)));
        assert!(report.has_problems());
    }

    #[tokio::test]
    async fn test_enrichment_fills_missing_ids_before_removal() {
        let mut fake = FakePlex::with_watchlist(vec![entry("k1", "Movie A", Some(2020), None)]);
        fake.metadata
            .insert("k1".to_string(), watchlist_sync_models::ExternalIds::with_imdb("tt1"));
        let plex = Arc::new(fake);
        let letterboxd = FakeLetterboxd {
            watched: vec![film("A Different Title", Some(1999), Some("tt1"))],
            ..FakeLetterboxd::default()
        };

        let report = orchestrator(letterboxd, &plex).sync().await.unwrap();
        assert_eq!(plex.mutations(), vec!["remove k1".to_string()]);
        assert_eq!(report.removed[0].external_id.as_deref(), Some("tt1"));
    }

    #[tokio::test]
    async fn test_failed_mutation_is_reported_and_run_continues() {
        let mut fake = scenario_plex();
        fake.failing_mutation.insert("k1".to_string());
        let plex = Arc::new(fake);

        let report = orchestrator(scenario_letterboxd(), &plex).sync().await.unwrap();

        assert_eq!(plex.mutations(), vec!["add k2".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].action, ActionKind::Remove);
        assert_eq!(report.failed[0].item.rating_key.as_deref(), Some("k1"));
        assert_eq!(report.added.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_aborts_before_mutation() {
        let plex = Arc::new(scenario_plex());
        let letterboxd = FakeLetterboxd {
            fail_watched: true,
            ..scenario_letterboxd()
        };

        let err = orchestrator(letterboxd, &plex).sync().await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Fetch {
                collection: Collection::LetterboxdWatched,
                ..
            }
        ));
        assert_eq!(err.to_string(), "failed to fetch Letterboxd watched films: connection reset");
        assert!(plex.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_token_is_fatal() {
        let mut fake = scenario_plex();
        fake.reject_token = true;
        let plex = Arc::new(fake);

        let err = orchestrator(scenario_letterboxd(), &plex).sync().await.unwrap_err();
        assert!(matches!(err, SyncError::Authentication(_)));
        assert!(plex.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_plans_without_mutating() {
        let plex = Arc::new(scenario_plex());
        let report = orchestrator(scenario_letterboxd(), &plex)
            .with_dry_run(true)
            .sync()
            .await
            .unwrap();

        assert!(plex.mutations().is_empty());
        assert!(report.dry_run);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.added.len(), 1);
        assert_eq!(plex.rating_keys(), vec!["k1".to_string()]);
    }

    #[tokio::test]
    async fn test_report_serializes_to_json() {
        let plex = Arc::new(scenario_plex());
        let report = orchestrator(scenario_letterboxd(), &plex).sync().await.unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["fallback_matcher"], "title_year");
        assert_eq!(json["unmatched"][0]["title"], "Unknown Film");
        assert_eq!(json["unmatched"][0]["reason"]["kind"], "no_external_id");
        assert_eq!(json["added"][0]["rating_key"], "k2");
    }
}
