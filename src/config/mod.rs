//! Configuration management for the session agent
//!
//! This module handles loading and merging configuration from the TOML
//! file, environment variables, and defaults.

pub mod settings;

pub use settings::Settings;
