pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{Config, PlexConfig, SyncOptions, TraktConfig};
pub use credentials::{CredentialKey, CredentialStore};
pub use paths::{PathManager, PathOrigin};
