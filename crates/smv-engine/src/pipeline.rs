//! Storyboard pipeline orchestrator.
//!
//! Drives one storyboard-generation job end to end: submit the synopsis,
//! poll at a fixed interval up to a bounded attempt count, download and
//! parse the storyboard artifact, and derive the ordered shot list with
//! resolved artifact URLs. No partial result ever escapes: the caller
//! receives either a complete blueprint or the first terminal failure.

use std::sync::Arc;
use std::time::Duration;

use smv_models::{Scene, ShotStatus, StoryStyle, Storyboard, TransitionType};

use crate::error::{EngineError, EngineResult};
use crate::logging::JobLogger;
use crate::service::GenerationService;

/// Overall status value that completes the poll loop.
const STATUS_COMPLETED: &str = "completed";
/// Overall status value that terminates the poll loop with a failure.
const STATUS_FAILED: &str = "failed";

/// One shot of a freshly generated storyboard.
#[derive(Debug, Clone)]
pub struct ShotBlueprint {
    pub title: String,
    pub prompt: String,
    pub narration: String,
    pub thumbnail_url: Option<String>,
    pub audio_url: Option<String>,
    pub transition: TransitionType,
    pub status: ShotStatus,
}

/// A fully-formed story blueprint plus the job id for audit linkage.
#[derive(Debug, Clone)]
pub struct StoryBlueprint {
    pub job_id: String,
    pub synopsis: String,
    pub style: StoryStyle,
    pub shots: Vec<ShotBlueprint>,
    /// Per-scene audio artifact URLs, in scene order
    pub audio_urls: Vec<String>,
}

/// Orchestrator for storyboard-generation jobs.
pub struct PipelineOrchestrator<S> {
    service: Arc<S>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl<S: GenerationService> PipelineOrchestrator<S> {
    pub fn new(service: Arc<S>, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            service,
            poll_interval,
            max_attempts,
        }
    }

    /// Run one storyboard job to completion.
    pub async fn run(&self, synopsis: &str, style: StoryStyle) -> EngineResult<StoryBlueprint> {
        let job_id = self.submit(synopsis, style).await?;
        self.await_blueprint(&job_id, synopsis, style).await
    }

    /// Submit a storyboard job, returning its id without waiting.
    pub async fn submit(&self, synopsis: &str, style: StoryStyle) -> EngineResult<String> {
        Ok(self.service.submit_storyboard(synopsis, style).await?)
    }

    /// Wait for a submitted job and derive its blueprint.
    pub async fn await_blueprint(
        &self,
        job_id: &str,
        synopsis: &str,
        style: StoryStyle,
    ) -> EngineResult<StoryBlueprint> {
        let logger = JobLogger::new(job_id, "storyboard_pipeline");
        logger.log_start("storyboard job submitted");

        let status = self.poll_until_complete(job_id, &logger).await?;

        let file_name = status
            .storyboard_file
            .ok_or_else(|| EngineError::ArtifactMissing("storyboard_file".to_string()))?;
        let bytes = self.service.download_artifact(job_id, &file_name).await?;
        let storyboard = Storyboard::from_json(&bytes)?;
        logger.log_progress(&format!("storyboard parsed: {} scenes", storyboard.scenes.len()));

        let images = status.images.unwrap_or_default();
        let audios = status.audios.unwrap_or_default();

        let shots = storyboard
            .scenes
            .iter()
            .enumerate()
            .map(|(index, scene)| self.build_shot(job_id, index, scene, &images, &audios))
            .collect();

        let audio_urls = audios
            .iter()
            .map(|name| self.service.artifact_url(job_id, name))
            .collect();

        logger.log_completion("blueprint ready");
        Ok(StoryBlueprint {
            job_id: job_id.to_string(),
            synopsis: synopsis.to_string(),
            style,
            shots,
            audio_urls,
        })
    }

    /// Poll until the job completes, fails, or the attempt bound is hit.
    async fn poll_until_complete(
        &self,
        job_id: &str,
        logger: &JobLogger,
    ) -> EngineResult<smv_models::PipelineStatusResponse> {
        for attempt in 0..self.max_attempts {
            let status = self.service.storyboard_status(job_id).await?;
            match status.overall_status.as_str() {
                STATUS_FAILED => {
                    let reason = status.error.unwrap_or_else(|| "unknown error".to_string());
                    logger.log_error(&reason);
                    return Err(EngineError::PipelineFailed(reason));
                }
                STATUS_COMPLETED => return Ok(status),
                other => {
                    if attempt % 10 == 0 {
                        logger.log_progress(&format!("status {other}, attempt {attempt}"));
                    }
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        logger.log_error("poll attempt bound exceeded");
        Err(EngineError::PipelineTimeout {
            attempts: self.max_attempts,
        })
    }

    /// Build the shot for scene `index`, pairing the image and audio
    /// artifacts positionally and cycling the transition default.
    fn build_shot(
        &self,
        job_id: &str,
        index: usize,
        scene: &Scene,
        images: &[String],
        audios: &[String],
    ) -> ShotBlueprint {
        let thumbnail_url = images
            .get(index)
            .map(|name| self.service.artifact_url(job_id, name));
        let audio_url = audios
            .get(index)
            .map(|name| self.service.artifact_url(job_id, name));
        ShotBlueprint {
            title: scene.scene_title.clone(),
            prompt: scene.visual_prompt(),
            narration: scene.narration.clone(),
            thumbnail_url,
            audio_url,
            transition: TransitionType::cycle(index),
            status: ShotStatus::Ready,
        }
    }
}
