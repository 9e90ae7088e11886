pub mod actions;
pub mod config;
pub mod drive;
pub mod error;
pub mod llm;
pub mod logging;
pub mod oauth;
pub mod plugin;
pub mod service;
pub mod templates;
pub mod twitter;
pub mod types;

pub use config::Config;
pub use error::MemeClawError;
pub use oauth::{generate_auth_header, Credentials};
pub use plugin::MemePlugin;
