use crate::types::Stage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("not initialized: run 'docpipe init'")]
    NotInitialized,

    #[error("feature name '{0}' normalizes to an empty slug")]
    EmptyName(String),

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("no {stage} document for '{slug}': run 'docpipe {}' first", .stage.command())]
    NotFound { stage: Stage, slug: String },

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid stage: {0}")]
    InvalidStage(String),

    #[error("malformed document at {path}: {reason}")]
    MalformedDocument { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
