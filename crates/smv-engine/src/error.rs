//! Engine error types.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Pipeline failed: {0}")]
    PipelineFailed(String),

    #[error("Pipeline timed out after {attempts} attempts")]
    PipelineTimeout { attempts: u32 },

    #[error("Video synthesis failed: {0}")]
    VideoFailed(String),

    #[error("Video synthesis timed out after {attempts} attempts")]
    VideoTimeout { attempts: u32 },

    #[error("Expected artifact missing from completed job: {0}")]
    ArtifactMissing(String),

    #[error("Invalid storyboard artifact: {0}")]
    InvalidArtifact(#[from] serde_json::Error),

    #[error("Story not found: {0}")]
    StoryNotFound(i64),

    #[error("Shot not found: {0}")]
    ShotNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Remote error: {0}")]
    Remote(#[from] smv_client::RemoteError),

    #[error("Store error: {0}")]
    Store(#[from] smv_store::StoreError),

    #[error("Media error: {0}")]
    Media(#[from] smv_media::MediaError),
}

impl EngineError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Check if this failure terminated a poll loop.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            EngineError::PipelineTimeout { .. } | EngineError::VideoTimeout { .. }
        )
    }
}
