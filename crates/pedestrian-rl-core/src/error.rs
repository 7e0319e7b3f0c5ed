//! Error type shared by the agent crates

use thiserror::Error;

/// Everything that can go wrong driving an agent
#[derive(Error, Debug)]
pub enum AgentError {
    /// An episode operation was called out of order
    #[error("Episode lifecycle violated: {0}")]
    Lifecycle(String),

    /// The action could not be turned into movement
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Configuration rejected before an episode starts
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A vector had the wrong number of components
    #[error("Expected {expected} components, got {actual}")]
    WrongLength {
        /// Required length
        expected: usize,
        /// Length received
        actual: usize,
    },

    /// JSON (de)serialisation of parameters or step info failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the agent crates
pub type Result<T> = std::result::Result<T, AgentError>;
