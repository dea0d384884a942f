pub mod diff;
pub mod enrich;
pub mod error;
pub mod fallback;
pub mod id_matching;
pub mod report;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use diff::{compute_removals, exclude_watched, plex_only, select_candidate, Additions, PlannedAddition, Reconciler};
pub use error::{Collection, SyncError};
pub use fallback::{matcher_for, DisabledMatcher, FallbackMatcher, TitleYearMatcher};
pub use report::{ActionKind, FailedAction, ReportedItem, SyncReport, UnmatchedFilm};
pub use sync::SyncOrchestrator;
