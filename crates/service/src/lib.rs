//! Service wiring for the filevault sharing engine.
//!
//! This crate turns a TOML [`Config`] into a running [`ServiceState`]:
//! - Config loading with defaults for every field
//! - State management (stores, connection registry, resource tree, sharing)
//! - A tracing-backed mailer standing in for a real email transport
//! - Process setup (tracing subscriber, panic logging, graceful shutdown)

pub mod config;
pub mod mailer;
pub mod process;
pub mod state;

// Re-export key types for convenience
pub use config::{Config, ConfigError};
pub use mailer::LogMailer;
pub use state::{State as ServiceState, StateSetupError};
