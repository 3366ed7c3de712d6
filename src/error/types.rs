//! Error type definitions
//!
//! Defines the error taxonomy for the session agent. Each failure mode of
//! the login handshake maps onto exactly one variant, so a caller can tell
//! "fix your config" from "retry later" from "the firmware changed".

use thiserror::Error;

/// Main error type for the session agent
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration problems: missing credentials, unusable base URL
    #[error("configuration error: {0}")]
    Config(String),

    /// A request could not be constructed; no network activity happened
    #[error("request construction error: {0}")]
    Construction(String),

    /// Network failure at any handshake step; never retried internally
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response diverged from the observed session contract
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The device rejected the credential login
    #[error("login rejected: {body}")]
    Auth {
        /// Trimmed response body, kept for diagnostics
        body: String,
    },

    /// Reading or writing the persisted session id failed
    #[error("session persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new construction error
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    /// Create a new protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an auth error carrying the raw device response
    pub fn auth(body: impl Into<String>) -> Self {
        Self::Auth { body: body.into() }
    }

    /// Create a new persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}
