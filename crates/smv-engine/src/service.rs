//! Trait seam over the generation service.
//!
//! Orchestrators depend on this trait rather than on `PipelineClient`
//! directly so tests can drive them with a mock service.

use async_trait::async_trait;
use bytes::Bytes;

use smv_client::{PipelineClient, RemoteResult};
use smv_models::{PipelineStatusResponse, StoryStyle};

/// Remote generation service operations used by the orchestrators.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Submit a storyboard job, returning its id.
    async fn submit_storyboard(&self, synopsis: &str, style: StoryStyle) -> RemoteResult<String>;

    /// Poll a storyboard job.
    async fn storyboard_status(&self, job_id: &str) -> RemoteResult<PipelineStatusResponse>;

    /// Download a named artifact.
    async fn download_artifact(&self, job_id: &str, file_name: &str) -> RemoteResult<Bytes>;

    /// Fetch a fully-qualified artifact URL.
    async fn fetch_url(&self, url: &str) -> RemoteResult<Bytes>;

    /// Submit a per-shot video job.
    async fn submit_shot_video(
        &self,
        job_id: &str,
        file_name: &str,
        image: Bytes,
    ) -> RemoteResult<String>;

    /// Poll a per-shot video job.
    async fn shot_video_status(&self, job_id: &str) -> RemoteResult<PipelineStatusResponse>;

    /// Resolve a service-returned file name into a fully-qualified URL.
    fn artifact_url(&self, job_id: &str, file_name: &str) -> String;
}

#[async_trait]
impl GenerationService for PipelineClient {
    async fn submit_storyboard(&self, synopsis: &str, style: StoryStyle) -> RemoteResult<String> {
        PipelineClient::submit_storyboard(self, synopsis, style).await
    }

    async fn storyboard_status(&self, job_id: &str) -> RemoteResult<PipelineStatusResponse> {
        PipelineClient::storyboard_status(self, job_id).await
    }

    async fn download_artifact(&self, job_id: &str, file_name: &str) -> RemoteResult<Bytes> {
        PipelineClient::download_artifact(self, job_id, file_name).await
    }

    async fn fetch_url(&self, url: &str) -> RemoteResult<Bytes> {
        PipelineClient::fetch_url(self, url).await
    }

    async fn submit_shot_video(
        &self,
        job_id: &str,
        file_name: &str,
        image: Bytes,
    ) -> RemoteResult<String> {
        PipelineClient::submit_shot_video(self, job_id, file_name, image).await
    }

    async fn shot_video_status(&self, job_id: &str) -> RemoteResult<PipelineStatusResponse> {
        PipelineClient::shot_video_status(self, job_id).await
    }

    fn artifact_url(&self, job_id: &str, file_name: &str) -> String {
        PipelineClient::artifact_url(self, job_id, file_name)
    }
}
