//! Core error types for round-table

use rt_protocol::ProtocolError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for round-table
#[derive(Error, Debug)]
pub enum RtError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Routing error
    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    /// Scheduler error
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Every configured child failed to start
    #[error("No children started")]
    NoChildren,
}

/// Configuration-related errors. All of them abort the run before spawning.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two children share a name (compared case-insensitively)
    #[error("Duplicate child name \"{0}\"")]
    DuplicateName(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Errors starting a single child
#[derive(Error, Debug)]
pub enum SpawnError {
    /// The OS refused to start the process
    #[error("[{name}] failed to start {cmd}: {source}")]
    Launch {
        name: String,
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    /// A redirected pipe was not available after spawning
    #[error("[{name}] {pipe} pipe unavailable")]
    MissingPipe { name: String, pipe: &'static str },

    /// A child with this name is already registered
    #[error("Child \"{0}\" is already registered")]
    DuplicateName(String),
}

/// Errors interpreting an operator line
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RoutingError {
    /// Target is not registered or has exited
    #[error("child \"{0}\" not found or exited")]
    UnknownChild(String),
}

/// Errors delivering a transcript to a child
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The child's stdin has already been closed
    #[error("stdin of \"{0}\" is closed")]
    StdinClosed(String),

    /// Writing to the child's stdin failed
    #[error("failed to write to \"{name}\": {source}")]
    Write {
        name: String,
        #[source]
        source: ProtocolError,
    },
}

/// Errors controlling the autonomous loop
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulerError {
    /// Some children still owe a reply
    #[error("children still talking: {}", .0.join(", "))]
    ChildrenTalking(Vec<String>),

    /// Loop is already active
    #[error("loop is already running")]
    AlreadyRunning,

    /// Loop is not active
    #[error("loop is not running")]
    NotRunning,

    /// Nobody left to address
    #[error("no live children")]
    NoLiveChildren,
}
