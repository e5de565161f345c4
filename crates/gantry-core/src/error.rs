//! Error types for Gantry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Workflow errors
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("Invalid workflow definition: {0}")]
    InvalidWorkflow(String),

    #[error("Workflow validation failed: {0}")]
    WorkflowValidation(String),

    // Job errors
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Workspace provisioning failed: {0}")]
    WorkspaceProvisioning(String),

    #[error("Job timeout after {minutes} minutes")]
    JobTimeout { minutes: u32 },

    // Step errors
    #[error("Step {step} could not be spawned: {message}")]
    StepSpawn { step: String, message: String },

    #[error("Built-in action failed: {0}")]
    ActionFailed(String),

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::InvalidWorkflow(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
