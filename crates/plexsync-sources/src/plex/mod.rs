pub mod api;
pub mod client;

pub use api::verify_token as verify_plex_token;
pub use client::PlexClient;
