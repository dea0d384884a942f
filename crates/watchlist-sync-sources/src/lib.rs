pub mod error;
pub mod letterboxd;
pub mod plex;
pub mod progress;
pub mod traits;

#[cfg(test)]
mod test_server;

pub use error::SourceError;
pub use letterboxd::LetterboxdClient;
pub use plex::PlexClient;
pub use progress::ProgressTracker;
pub use traits::{LetterboxdSource, PlexWatchlist};
