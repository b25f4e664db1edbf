//! Per-shot video synthesis orchestrator.
//!
//! Turns one ready shot image into a synthesized video segment: fetch
//! the shot's image, re-submit it to the generation service under the
//! storyboard job it came from, then poll the video status at a fixed
//! interval up to a bounded attempt count.

use std::sync::Arc;
use std::time::Duration;

use smv_models::Shot;
use url::Url;

use crate::error::{EngineError, EngineResult};
use crate::logging::JobLogger;
use crate::service::GenerationService;

/// Video status value that completes the poll loop.
const VIDEO_STATUS_READY: &str = "ready";
/// Video status value that terminates the poll loop with a failure.
const VIDEO_STATUS_FAILED: &str = "failed";

/// Extract the pipeline job id from an artifact download URL.
///
/// Artifact URLs carry the job id as the path segment following
/// `download`; anything else yields `None`.
pub fn job_id_from_artifact_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    segments
        .find(|segment| *segment == "download")
        .and_then(|_| segments.next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// The file-name tail of an artifact URL, used as the upload name.
fn file_name_from_url(url: &str) -> String {
    url.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("shot.png")
        .to_string()
}

/// Result of a finished shot video job.
#[derive(Debug, Clone)]
pub struct VideoJobOutcome {
    /// Remote job id the video was synthesized under
    pub job_id: String,
    /// Fully-qualified URL of the finished segment
    pub video_url: String,
}

/// Orchestrator for per-shot video synthesis jobs.
pub struct VideoJobOrchestrator<S> {
    service: Arc<S>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl<S: GenerationService> VideoJobOrchestrator<S> {
    pub fn new(service: Arc<S>, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            service,
            poll_interval,
            max_attempts,
        }
    }

    /// Synthesize a video segment for `shot`, returning its URL.
    ///
    /// The shot must carry a thumbnail produced by a storyboard job; the
    /// job id is recovered from that URL so the service can associate
    /// the video with the original pipeline run.
    pub async fn run(&self, shot: &Shot) -> EngineResult<VideoJobOutcome> {
        let thumbnail_url = shot
            .thumbnail_url
            .as_deref()
            .ok_or_else(|| EngineError::invalid_input("shot has no image to synthesize from"))?;
        let job_id = job_id_from_artifact_url(thumbnail_url).ok_or_else(|| {
            EngineError::invalid_input(format!("no job id in image url: {thumbnail_url}"))
        })?;

        let logger = JobLogger::new(&job_id, "shot_video");
        logger.log_start(&format!("synthesizing video for shot {}", shot.id));

        let image = self.service.fetch_url(thumbnail_url).await?;
        let file_name = file_name_from_url(thumbnail_url);
        let video_job_id = self
            .service
            .submit_shot_video(&job_id, &file_name, image)
            .await?;

        for attempt in 0..self.max_attempts {
            let status = self.service.shot_video_status(&video_job_id).await?;
            match status.video_status.as_deref() {
                Some(VIDEO_STATUS_FAILED) => {
                    let reason = status.error.unwrap_or_else(|| "unknown error".to_string());
                    logger.log_error(&reason);
                    return Err(EngineError::VideoFailed(reason));
                }
                Some(VIDEO_STATUS_READY) => {
                    let file = status
                        .video
                        .ok_or_else(|| EngineError::ArtifactMissing("video".to_string()))?;
                    let video_url = self.service.artifact_url(&video_job_id, &file);
                    logger.log_completion(&format!("video ready: {file}"));
                    return Ok(VideoJobOutcome {
                        job_id: video_job_id,
                        video_url,
                    });
                }
                _ => {
                    if attempt % 10 == 0 {
                        logger.log_progress(&format!("video pending, attempt {attempt}"));
                    }
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        logger.log_error("video poll attempt bound exceeded");
        Err(EngineError::VideoTimeout {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MockGenerationService;
    use smv_models::PipelineStatusResponse;

    fn shot_with_thumbnail(url: &str) -> Shot {
        let mut shot = Shot::new(1, "opening");
        shot.thumbnail_url = Some(url.to_string());
        shot
    }

    #[test]
    fn test_job_id_from_artifact_url() {
        assert_eq!(
            job_id_from_artifact_url("http://pipe/api/download/job-42/scene_0.png").as_deref(),
            Some("job-42")
        );
        assert_eq!(
            job_id_from_artifact_url("http://pipe/download/abc/x.png").as_deref(),
            Some("abc")
        );
        assert!(job_id_from_artifact_url("http://pipe/other/abc/x.png").is_none());
        assert!(job_id_from_artifact_url("not a url").is_none());
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("http://pipe/download/j/scene_0.png"),
            "scene_0.png"
        );
        assert_eq!(file_name_from_url("http://pipe/download/j/"), "shot.png");
    }

    #[tokio::test(start_paused = true)]
    async fn video_job_resolves_to_artifact_url() {
        let mut service = MockGenerationService::new();
        service
            .expect_fetch_url()
            .returning(|_| Ok(bytes::Bytes::from_static(b"png")));
        service
            .expect_submit_shot_video()
            .withf(|job, name, _| job == "job-1" && name == "scene_0.png")
            .returning(|_, _, _| Ok("job-1".to_string()));
        service.expect_shot_video_status().returning(|_| {
            Ok(PipelineStatusResponse {
                overall_status: "completed".to_string(),
                video_status: Some("ready".to_string()),
                video: Some("shot_video.mp4".to_string()),
                ..Default::default()
            })
        });
        service
            .expect_artifact_url()
            .returning(|job, name| format!("http://pipe/download/{job}/{name}"));

        let orchestrator =
            VideoJobOrchestrator::new(Arc::new(service), Duration::from_secs(1), 120);
        let shot = shot_with_thumbnail("http://pipe/download/job-1/scene_0.png");
        let outcome = orchestrator.run(&shot).await.unwrap();
        assert_eq!(outcome.job_id, "job-1");
        assert_eq!(outcome.video_url, "http://pipe/download/job-1/shot_video.mp4");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_video_status_surfaces_service_error() {
        let mut service = MockGenerationService::new();
        service
            .expect_fetch_url()
            .returning(|_| Ok(bytes::Bytes::from_static(b"png")));
        service
            .expect_submit_shot_video()
            .returning(|_, _, _| Ok("job-1".to_string()));
        service.expect_shot_video_status().returning(|_| {
            Ok(PipelineStatusResponse {
                overall_status: "completed".to_string(),
                video_status: Some("failed".to_string()),
                error: Some("gpu exhausted".to_string()),
                ..Default::default()
            })
        });

        let orchestrator =
            VideoJobOrchestrator::new(Arc::new(service), Duration::from_secs(1), 120);
        let shot = shot_with_thumbnail("http://pipe/download/job-1/scene_0.png");
        let err = orchestrator.run(&shot).await.unwrap_err();
        match err {
            EngineError::VideoFailed(reason) => assert_eq!(reason, "gpu exhausted"),
            other => panic!("expected VideoFailed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pending_forever_times_out_at_bound() {
        let mut service = MockGenerationService::new();
        service
            .expect_fetch_url()
            .returning(|_| Ok(bytes::Bytes::from_static(b"png")));
        service
            .expect_submit_shot_video()
            .returning(|_, _, _| Ok("job-1".to_string()));
        service
            .expect_shot_video_status()
            .times(120)
            .returning(|_| {
                Ok(PipelineStatusResponse {
                    overall_status: "completed".to_string(),
                    video_status: Some("processing".to_string()),
                    ..Default::default()
                })
            });

        let orchestrator =
            VideoJobOrchestrator::new(Arc::new(service), Duration::from_secs(1), 120);
        let shot = shot_with_thumbnail("http://pipe/download/job-1/scene_0.png");
        let err = orchestrator.run(&shot).await.unwrap_err();
        assert!(matches!(err, EngineError::VideoTimeout { attempts: 120 }));
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn shot_without_thumbnail_is_rejected() {
        let service = MockGenerationService::new();
        let orchestrator =
            VideoJobOrchestrator::new(Arc::new(service), Duration::from_secs(1), 120);
        let shot = Shot::new(1, "opening");
        let err = orchestrator.run(&shot).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn thumbnail_without_job_id_is_rejected() {
        let service = MockGenerationService::new();
        let orchestrator =
            VideoJobOrchestrator::new(Arc::new(service), Duration::from_secs(1), 120);
        let shot = shot_with_thumbnail("http://pipe/static/scene_0.png");
        let err = orchestrator.run(&shot).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
