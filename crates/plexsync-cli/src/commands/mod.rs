pub mod config;
pub mod inspect;
pub mod prompts;
pub mod sync;
pub mod sync_ui;
