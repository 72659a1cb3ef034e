//! Workflow error types.

use thiserror::Error;

use cstudio_genai::GenAiError;
use cstudio_models::{MediaError, SlotTransitionError};

pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider error: {0}")]
    Provider(#[from] GenAiError),

    #[error("{label}: {source}")]
    AnalysisFailed {
        /// Message shown in place of the analysis
        label: &'static str,
        #[source]
        source: GenAiError,
    },

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Slot error: {0}")]
    Slot(#[from] SlotTransitionError),

    #[error("Video generation finished without a video URI")]
    MissingVideoUri,

    #[error("Video generation failed: {0}")]
    OperationFailed(String),

    #[error("Video generation timed out after {attempts} polls ({elapsed_secs}s)")]
    PollTimeout { attempts: u32, elapsed_secs: u64 },

    #[error("Cancelled")]
    Cancelled,
}

impl WorkflowError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Rejected before any remote call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_) | WorkflowError::Media(_))
    }

    /// Failure reported by, or caused by, the remote provider.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            WorkflowError::Provider(_)
                | WorkflowError::AnalysisFailed { .. }
                | WorkflowError::InvalidResponse(_)
                | WorkflowError::MissingVideoUri
                | WorkflowError::OperationFailed(_)
        )
    }
}
