//! Typed client for the StoryMV generation pipeline service.
//!
//! All operations are thin request/response bindings: submit a storyboard
//! job, poll its status, download named artifacts, submit a per-shot video
//! job, and poll that. Orchestration (poll loops, bounded attempts) lives
//! in `smv-engine`; this crate only speaks the wire protocol.

pub mod error;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::debug;
use url::Url;

use smv_models::{
    PipelineStatusResponse, StartPipelineRequest, StartPipelineResponse, StartVideoResponse,
    StoryStyle,
};

pub use error::{RemoteError, RemoteResult};

/// Infer the multipart content type of an image from its file name.
pub fn image_content_type(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}

/// Client for the generation pipeline's HTTP API.
#[derive(Debug, Clone)]
pub struct PipelineClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PipelineClient {
    /// Create a client for the service at `base_url`.
    ///
    /// A trailing slash is appended if missing so relative joins keep the
    /// full base path.
    pub fn new(base_url: &str) -> RemoteResult<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(&normalized)?,
        })
    }

    /// Build a client around an existing reqwest client (shared pools).
    pub fn with_http(http: reqwest::Client, base_url: &str) -> RemoteResult<Self> {
        let mut client = Self::new(base_url)?;
        client.http = http;
        Ok(client)
    }

    /// Base address of the service.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Submit a storyboard generation job. Returns the job id.
    pub async fn submit_storyboard(
        &self,
        synopsis: &str,
        style: StoryStyle,
    ) -> RemoteResult<String> {
        let url = self.base_url.join("start_pipeline/")?;
        let body = StartPipelineRequest {
            story: synopsis.to_string(),
            style: style.label().to_string(),
        };
        let resp = self.http.post(url).json(&body).send().await?;
        let resp: StartPipelineResponse = Self::check(resp).await?.json().await?;
        debug!(job_id = %resp.task_id, "Storyboard job submitted");
        Ok(resp.task_id)
    }

    /// Poll the status of a storyboard (or video) job.
    pub async fn storyboard_status(&self, job_id: &str) -> RemoteResult<PipelineStatusResponse> {
        let url = self.base_url.join(&format!("status/{job_id}/"))?;
        let resp = self.http.get(url).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Download a named artifact produced by a job.
    pub async fn download_artifact(&self, job_id: &str, file_name: &str) -> RemoteResult<Bytes> {
        let url = self.base_url.join(&format!("download/{job_id}/{file_name}"))?;
        let resp = self.http.get(url).send().await?;
        Ok(Self::check(resp).await?.bytes().await?)
    }

    /// Submit a per-shot video synthesis job from image bytes.
    ///
    /// Returns the video job id; the service may reuse the submitted
    /// job id (`StartVideoResponse::task_id` echoes it back).
    pub async fn submit_shot_video(
        &self,
        job_id: &str,
        file_name: &str,
        image: Bytes,
    ) -> RemoteResult<String> {
        let url = self.base_url.join("start_video/")?;
        let part = Part::bytes(image.to_vec())
            .file_name(file_name.to_string())
            .mime_str(image_content_type(file_name))
            .map_err(RemoteError::Transport)?;
        let form = Form::new()
            .part("file", part)
            .text("task_id", job_id.to_string());
        let resp = self.http.post(url).multipart(form).send().await?;
        let resp: StartVideoResponse = Self::check(resp).await?.json().await?;
        debug!(job_id = %resp.task_id, "Shot video job submitted");
        Ok(resp.task_id)
    }

    /// Poll a per-shot video job. The same status payload carries the
    /// `video_status` / `video` fields for video jobs.
    pub async fn shot_video_status(&self, job_id: &str) -> RemoteResult<PipelineStatusResponse> {
        self.storyboard_status(job_id).await
    }

    /// Fetch an arbitrary fully-qualified URL (resolved artifact links).
    pub async fn fetch_url(&self, url: &str) -> RemoteResult<Bytes> {
        let resp = self.http.get(url).send().await?;
        Ok(Self::check(resp).await?.bytes().await?)
    }

    /// Service health probe.
    pub async fn health(&self) -> RemoteResult<()> {
        let url = self.base_url.join("pipeline_health")?;
        let resp = self.http.get(url).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Resolve a service-returned file name into a fully-qualified URL.
    ///
    /// Absolute URLs pass through unchanged; anything else is joined
    /// under `download/{job_id}/` on the base address.
    pub fn artifact_url(&self, job_id: &str, file_name: &str) -> String {
        if file_name.starts_with("http://") || file_name.starts_with("https://") {
            return file_name.to_string();
        }
        match self.base_url.join(&format!("download/{job_id}/{file_name}")) {
            Ok(url) => url.to_string(),
            // Join only fails on malformed names; fall back to naive concat
            Err(_) => format!("{}download/{job_id}/{file_name}", self.base_url),
        }
    }

    /// Map non-2xx responses to `RemoteError::Http` with the body attached.
    async fn check(resp: reqwest::Response) -> RemoteResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(RemoteError::http(status.as_u16(), body))
    }
}
