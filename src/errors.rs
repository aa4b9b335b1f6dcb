/*!
 * Error types for the contentqa pipeline.
 *
 * The pipeline distinguishes "the content is bad" from "the pipeline is
 * broken". Stage-local failures are absorbed into the report as degraded
 * stages; orchestration-level failures end the run and map to stable
 * machine-readable codes, using the thiserror crate for ergonomic error
 * definitions.
 */

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::quality::model::{IssueKind, Stage};

/// Message returned to callers for internal failures. The detail is logged, never exposed.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal pipeline error";

/// Errors that can occur while running the quality pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Malformed input (missing content or requirements). Never retried.
    #[error("Validation error: {0}")]
    Validation(String),

    /// One analyzer failed or timed out. Recorded in the report, not fatal.
    #[error("Stage {stage} degraded: {reason}")]
    StageDegraded {
        /// Stage that failed
        stage: Stage,
        /// Why it failed
        reason: String,
    },

    /// No corrector is available for a high-severity issue
    #[error("Refinement error for {kind} issue: {message}")]
    Refinement {
        /// Issue kind that could not be corrected
        kind: IssueKind,
        /// Human-readable detail
        message: String,
    },

    /// Unexpected failure outside the categories above
    #[error("Pipeline internal error: {0}")]
    Internal(String),

    /// The caller cancelled the run
    #[error("Pipeline run was cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StageDegraded { .. } => "STAGE_DEGRADED",
            Self::Refinement { .. } => "REFINEMENT_ERROR",
            Self::Internal(_) => "PIPELINE_INTERNAL_ERROR",
            Self::Cancelled => "PIPELINE_CANCELLED",
        }
    }

    /// Whether the error ends the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::StageDegraded { .. })
    }

    /// Whether the error is the caller's fault (4xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Message safe to hand back to a caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", error))
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Internal(error.to_string())
    }
}

/// Error body of the request/response contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code
    pub code: String,
    /// Caller-facing message
    pub message: String,
}

/// Response returned instead of a report when a run fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Error details
    pub error: ErrorBody,
}

impl From<&PipelineError> for ErrorResponse {
    fn from(error: &PipelineError) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: error.code().to_string(),
                message: error.public_message(),
            },
        }
    }
}
