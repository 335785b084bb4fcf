//! Core error types for eyerest-core.
//!
//! This module defines the error hierarchy using thiserror. Channel and
//! announcer failures are side-effect errors: they are reported to the host
//! and never stop the reminder clock.

use std::path::PathBuf;
use thiserror::Error;

use crate::collaborators::Channel;

/// Core error type for eyerest-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Volume channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Speech or alarm playback errors
    #[error("Announcer error: {0}")]
    Announce(#[from] AnnounceError),

    /// Scheduler invariant violations
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Threshold table construction errors
    #[error("Threshold error: {0}")]
    Threshold(#[from] ThresholdError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a volume collaborator call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    /// A setter rejected the setpoint (device gone, session closed, ...)
    #[error("Failed to set {channel} to {percent}%: {message}")]
    SetFailed {
        channel: Channel,
        percent: f64,
        message: String,
    },

    /// The current channel-A level could not be read
    #[error("Failed to read channel level: {message}")]
    ReadFailed { message: String },
}

/// Failure of a fire-and-forget notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnounceError {
    #[error("Speech failed: {0}")]
    Speech(String),

    #[error("Alarm playback failed: {0}")]
    Alarm(String),
}

/// Scheduler invariant violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// A timer was observed to resolve twice. This must never happen.
    #[error("Timer {task_id} resolved twice (fire and cancel both took effect)")]
    RaceAnomaly { task_id: uuid::Uuid },
}

/// Threshold table errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThresholdError {
    /// Multipliers must be strictly increasing
    #[error("Threshold multipliers must be strictly increasing: {previous} is followed by {next}")]
    NotIncreasing { previous: String, next: String },

    /// A multiplier had a zero numerator or denominator
    #[error("Invalid threshold multiplier {num}/{den}")]
    InvalidMultiplier { num: u64, den: u64 },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home/config directory unavailable
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
