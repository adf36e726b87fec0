//! Configuration loading and types.

mod settings;

pub use settings::{expand_env_vars, ApiSettings, Settings, SettingsError, WorkerSettings};
