pub mod external_ids;
pub mod film;
pub mod match_result;
pub mod watchlist;

pub use external_ids::ExternalIds;
pub use film::FilmRecord;
pub use match_result::{MatchResult, UnmatchedReason};
pub use watchlist::{PlexMediaType, WatchlistEntry};
