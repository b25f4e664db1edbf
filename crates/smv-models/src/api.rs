//! Wire DTOs for the remote pipeline API.
//!
//! Field names follow the service's snake_case JSON exactly.

use serde::{Deserialize, Serialize};

/// `POST start_pipeline/` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPipelineRequest {
    pub story: String,
    pub style: String,
}

/// `POST start_pipeline/` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPipelineResponse {
    pub task_id: String,
    pub status: String,
}

/// `GET status/{task_id}/` response.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineStatusResponse {
    /// queued | processing | completed | failed
    pub overall_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storyboard_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audios: Option<Vec<String>>,
    /// processing | ready | failed, present for video jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_status: Option<String>,
    /// Output file name of a finished video job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST start_video/` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartVideoResponse {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
