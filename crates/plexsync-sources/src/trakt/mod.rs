pub mod api;
pub mod auth;
pub mod client;
pub mod queue;

pub use client::TraktClient;
