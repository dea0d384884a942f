pub mod api;
pub mod client;
pub mod guid;

pub use client::PlexClient;
