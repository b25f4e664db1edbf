//! Story Repository: the composition root.
//!
//! The single writer of the store. Wires the pipeline and video
//! orchestrators to the entity store and the media assembler, keeps the
//! task registry current, and exposes the observation streams. Every
//! operation leaves the store consistent whether it succeeds or fails.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use smv_media::{ExportDestination, ExportedMedia, MediaAssembler, SegmentSource};
use smv_models::{
    AssetItem, Shot, Story, StoryStyle, Task, TaskKind, TaskStatus, TransitionType,
    VideoTaskState,
};
use smv_store::{StoryStore, StoryWithShots};
use tokio::sync::watch;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::pipeline::{PipelineOrchestrator, ShotBlueprint};
use crate::service::GenerationService;
use crate::video::{job_id_from_artifact_url, VideoJobOrchestrator};

/// Synopsis of the story seeded into an empty store.
const SEED_SYNOPSIS: &str = "一位孤独的摄影师在雨夜的城市中寻找遗失的记忆。";

/// Edits applied by [`StoryRepository::update_shot_details`]. Absent
/// fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ShotDetails {
    pub prompt: Option<String>,
    pub narration: Option<String>,
    pub transition: Option<TransitionType>,
}

/// The application-facing entry point for story generation and media
/// assembly.
pub struct StoryRepository<S> {
    store: StoryStore,
    service: Arc<S>,
    assembler: MediaAssembler,
    pipeline: PipelineOrchestrator<S>,
    video: VideoJobOrchestrator<S>,
}

impl<S: GenerationService> StoryRepository<S> {
    pub fn new(service: Arc<S>, store: StoryStore, config: &EngineConfig) -> Self {
        let assembler = MediaAssembler::new(&config.work_dir, &config.media_root)
            .with_ffmpeg_timeout(config.ffmpeg_timeout.as_secs());
        Self {
            store,
            service: Arc::clone(&service),
            assembler,
            pipeline: PipelineOrchestrator::new(
                Arc::clone(&service),
                config.pipeline_poll_interval,
                config.pipeline_max_attempts,
            ),
            video: VideoJobOrchestrator::new(
                service,
                config.video_poll_interval,
                config.video_max_attempts,
            ),
        }
    }

    // ---- Story creation ----

    /// Generate a storyboard for `synopsis` and commit the resulting
    /// story and shots in one transaction.
    pub async fn create_story(&self, synopsis: &str, style: StoryStyle) -> EngineResult<Story> {
        let synopsis = synopsis.trim();
        if synopsis.is_empty() {
            return Err(EngineError::invalid_input("synopsis must not be empty"));
        }

        let job_id = self.pipeline.submit(synopsis, style).await?;
        self.store
            .upsert_task(
                Task::new(&job_id, TaskKind::Pipeline, TaskStatus::Processing)
                    .with_title(smv_models::derive_title(synopsis)),
            )
            .await;

        let blueprint = match self.pipeline.await_blueprint(&job_id, synopsis, style).await {
            Ok(blueprint) => blueprint,
            Err(e) => {
                self.store
                    .upsert_task(
                        Task::new(&job_id, TaskKind::Pipeline, TaskStatus::Failed)
                            .with_title(smv_models::derive_title(synopsis))
                            .with_message(e.to_string()),
                    )
                    .await;
                return Err(e);
            }
        };

        let mut story = Story::new(synopsis, style);
        story.preview_audio_urls = blueprint.audio_urls.clone();
        let shots: Vec<Shot> = blueprint
            .shots
            .iter()
            .map(|bp| shot_from_blueprint(story.id, bp))
            .collect();

        self.store
            .commit_storyboard(story.clone(), shots, None)
            .await?;
        self.store
            .upsert_task(
                Task::new(&job_id, TaskKind::Pipeline, TaskStatus::Completed)
                    .with_story(story.id)
                    .with_title(&story.title),
            )
            .await;
        info!(story_id = story.id, job_id = %job_id, "Story created");
        Ok(story)
    }

    /// Seed one story when the store is empty. Returns whether a story
    /// was seeded.
    pub async fn ensure_seed_data(&self) -> EngineResult<bool> {
        if self.store.count_stories().await > 0 {
            return Ok(false);
        }
        let story = Story::new(SEED_SYNOPSIS, StoryStyle::Cinematic);
        info!(story_id = story.id, "Seeding initial story");
        self.store.upsert_story(story).await;
        Ok(true)
    }

    // ---- Shot editing ----

    /// Apply user edits to a shot's prompt, narration or transition.
    pub async fn update_shot_details(
        &self,
        shot_id: &str,
        details: ShotDetails,
    ) -> EngineResult<Shot> {
        let mut shot = self.require_shot(shot_id).await?;
        if let Some(prompt) = details.prompt {
            shot.prompt = prompt;
        }
        if let Some(narration) = details.narration {
            shot.narration = narration;
        }
        if let Some(transition) = details.transition {
            shot.transition = transition;
        }
        self.store.upsert_shot(shot.clone()).await;
        Ok(shot)
    }

    /// Regenerate a shot from its storyboard job's latest artifacts.
    ///
    /// The shot is marked `Generating` for the duration; any failure
    /// reverts it to `Ready` with its previous image intact.
    pub async fn regenerate_shot(&self, shot_id: &str) -> EngineResult<Shot> {
        let shot = self.require_shot(shot_id).await?;
        let previous = shot.clone();

        let mut generating = shot.clone();
        generating.status = smv_models::ShotStatus::Generating;
        self.store.upsert_shot(generating).await;

        match self.rebuild_shot(shot).await {
            Ok(rebuilt) => {
                self.store.upsert_shot(rebuilt.clone()).await;
                Ok(rebuilt)
            }
            Err(e) => {
                let mut reverted = previous;
                reverted.status = smv_models::ShotStatus::Ready;
                warn!(shot_id, error = %e, "Shot regeneration failed, reverting");
                self.store.upsert_shot(reverted).await;
                Err(e)
            }
        }
    }

    /// Re-derive a shot from the storyboard job it came from.
    async fn rebuild_shot(&self, mut shot: Shot) -> EngineResult<Shot> {
        let thumbnail_url = shot
            .thumbnail_url
            .as_deref()
            .ok_or_else(|| EngineError::invalid_input("shot has no image to regenerate from"))?;
        let job_id = job_id_from_artifact_url(thumbnail_url).ok_or_else(|| {
            EngineError::invalid_input(format!("no job id in image url: {thumbnail_url}"))
        })?;

        let joined = self
            .store
            .story_with_shots(shot.story_id)
            .await
            .ok_or(EngineError::StoryNotFound(shot.story_id))?;
        let index = joined
            .shots
            .iter()
            .position(|s| s.id == shot.id)
            .ok_or_else(|| EngineError::ShotNotFound(shot.id.clone()))?;

        let status = self.service.storyboard_status(&job_id).await?;
        let file_name = status
            .storyboard_file
            .ok_or_else(|| EngineError::ArtifactMissing("storyboard_file".to_string()))?;
        let bytes = self.service.download_artifact(&job_id, &file_name).await?;
        let storyboard = smv_models::Storyboard::from_json(&bytes)?;
        let scene = storyboard
            .scenes
            .get(index)
            .ok_or_else(|| EngineError::ArtifactMissing(format!("scene {index}")))?;

        shot.title = scene.scene_title.clone();
        shot.prompt = scene.visual_prompt();
        shot.narration = scene.narration.clone();
        if let Some(image) = status.images.as_ref().and_then(|images| images.get(index)) {
            shot.thumbnail_url = Some(self.service.artifact_url(&job_id, image));
        }
        shot.status = smv_models::ShotStatus::Ready;
        Ok(shot)
    }

    // ---- Video synthesis ----

    /// Synthesize the video segment for one shot.
    ///
    /// The shot is `Generating` while the job runs; success stores the
    /// segment URL and `Ready`, failure stores `Error` with the url
    /// cleared. The task registry tracks the job either way.
    pub async fn request_video_for_shot(&self, shot_id: &str) -> EngineResult<Shot> {
        let shot = self.require_shot(shot_id).await?;
        self.store
            .update_shot_video(shot_id, None, VideoTaskState::Generating)
            .await?;

        let job_id = shot
            .thumbnail_url
            .as_deref()
            .and_then(job_id_from_artifact_url);
        if let Some(job_id) = &job_id {
            self.store
                .upsert_task(
                    Task::new(job_id, TaskKind::Video, TaskStatus::Generating)
                        .with_story(shot.story_id)
                        .with_shot(&shot.id)
                        .with_title(&shot.title),
                )
                .await;
        }

        match self.video.run(&shot).await {
            Ok(outcome) => {
                self.store
                    .update_shot_video(
                        shot_id,
                        Some(outcome.video_url.clone()),
                        VideoTaskState::Ready,
                    )
                    .await?;
                // Terminal update reuses the submission-time record key,
                // even when the pipeline issued a distinct video job id,
                // so the `Generating` record never strands.
                let task_id = job_id.as_deref().unwrap_or(&outcome.job_id);
                self.store
                    .upsert_task(
                        Task::new(task_id, TaskKind::Video, TaskStatus::Ready)
                            .with_story(shot.story_id)
                            .with_shot(&shot.id)
                            .with_title(&shot.title)
                            .with_video_url(&outcome.video_url),
                    )
                    .await;
                self.require_shot(shot_id).await
            }
            Err(e) => {
                self.store
                    .update_shot_video(shot_id, None, VideoTaskState::Error)
                    .await?;
                if let Some(job_id) = &job_id {
                    self.store
                        .upsert_task(
                            Task::new(job_id, TaskKind::Video, TaskStatus::Failed)
                                .with_story(shot.story_id)
                                .with_shot(&shot.id)
                                .with_title(&shot.title)
                                .with_message(e.to_string()),
                        )
                        .await;
                }
                Err(e)
            }
        }
    }

    /// Synthesize videos for every shot of a story, sequentially.
    ///
    /// Only shots with a resolved image are submitted; a shot whose
    /// image never generated is left untouched. One shot's failure
    /// never aborts the batch: the failed shot is left in `Error`
    /// state and the remaining shots still run. The batch itself only
    /// fails if the story does not exist.
    pub async fn request_videos_for_all_shots(
        &self,
        story_id: i64,
    ) -> EngineResult<StoryWithShots> {
        let joined = self.require_story_with_shots(story_id).await?;
        for shot in &joined.shots {
            if shot.video_status == VideoTaskState::Ready || shot.thumbnail_url.is_none() {
                continue;
            }
            if let Err(e) = self.request_video_for_shot(&shot.id).await {
                warn!(story_id, shot_id = %shot.id, error = %e, "Shot video failed");
            }
        }
        self.require_story_with_shots(story_id).await
    }

    /// Full story-level video run: fan out over all shots, then
    /// finalize the story from whatever segments became ready.
    pub async fn request_video(&self, story_id: i64) -> EngineResult<Story> {
        let mut story = self
            .store
            .get_story(story_id)
            .await
            .ok_or(EngineError::StoryNotFound(story_id))?;
        story.video_state = VideoTaskState::Generating;
        self.store.upsert_story(story).await;

        self.request_videos_for_all_shots(story_id).await?;

        match self.finalize_video(story_id).await {
            Ok(story) => Ok(story),
            Err(e) => {
                if let Some(mut story) = self.store.get_story(story_id).await {
                    story.video_state = VideoTaskState::Error;
                    self.store.upsert_story(story).await;
                }
                Err(e)
            }
        }
    }

    /// Mark a story's video Ready from its shots' finished segments and
    /// publish the derived asset.
    ///
    /// Requires at least one ready segment. The asset reuses the story
    /// id, so re-finalizing replaces the previous asset.
    pub async fn finalize_video(&self, story_id: i64) -> EngineResult<Story> {
        let joined = self.require_story_with_shots(story_id).await?;
        let urls: Vec<String> = joined
            .shots
            .iter()
            .filter_map(|s| s.video_url.clone())
            .collect();
        let first = urls
            .first()
            .cloned()
            .ok_or_else(|| EngineError::VideoFailed("no shot videos to finalize".to_string()))?;

        let mut story = joined.story;
        story.preview_urls = urls;
        story.preview_url = Some(first.clone());
        story.video_state = VideoTaskState::Ready;

        let thumbnail = joined.shots.iter().find_map(|s| s.thumbnail_url.clone());
        let asset =
            AssetItem::for_finished_story(story.id, &story.title, story.style, first, thumbnail);

        self.store.upsert_story(story.clone()).await;
        self.store.upsert_asset(asset).await;
        info!(story_id, "Story video finalized");
        Ok(story)
    }

    // ---- Media assembly ----

    /// Assemble a story's finished segments into one exported file.
    pub async fn export_story(
        &self,
        story_id: i64,
        destination: ExportDestination,
    ) -> EngineResult<ExportedMedia> {
        let joined = self.require_story_with_shots(story_id).await?;
        let segments: Vec<SegmentSource> = joined
            .shots
            .iter()
            .filter_map(|s| s.video_url.as_deref())
            .map(SegmentSource::parse)
            .collect();
        let audio: Vec<SegmentSource> = joined
            .story
            .preview_audio_urls
            .iter()
            .map(|url| SegmentSource::parse(url))
            .collect();
        Ok(self
            .assembler
            .export(&segments, &audio, &joined.story.title, destination)
            .await?)
    }

    /// Merge a story's preview audio into a single track, best effort.
    pub async fn merge_preview_audio(&self, story_id: i64) -> Option<PathBuf> {
        let joined = self.store.story_with_shots(story_id).await?;
        let segments: Vec<SegmentSource> = joined
            .story
            .preview_audio_urls
            .iter()
            .map(|url| SegmentSource::parse(url))
            .collect();
        self.assembler.merge_audio(&segments).await
    }

    // ---- Assets ----

    pub async fn delete_asset(&self, asset_id: i64) {
        self.store.delete_asset(asset_id).await;
    }

    pub async fn assets(&self, query: Option<&str>) -> Vec<AssetItem> {
        self.store.assets(query).await
    }

    // ---- Reads and observation pass-throughs ----

    pub async fn story_with_shots(&self, story_id: i64) -> Option<StoryWithShots> {
        self.store.story_with_shots(story_id).await
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.store.tasks().await
    }

    pub async fn observe_stories(&self) -> watch::Receiver<Vec<StoryWithShots>> {
        self.store.observe_stories().await
    }

    pub async fn observe_story(&self, story_id: i64) -> watch::Receiver<Option<StoryWithShots>> {
        self.store.observe_story(story_id).await
    }

    pub async fn observe_tasks(&self) -> watch::Receiver<Vec<Task>> {
        self.store.observe_tasks().await
    }

    pub async fn observe_assets(&self) -> watch::Receiver<Vec<AssetItem>> {
        self.store.observe_assets().await
    }

    // ---- Internals ----

    async fn require_shot(&self, shot_id: &str) -> EngineResult<Shot> {
        self.store
            .get_shot(shot_id)
            .await
            .ok_or_else(|| EngineError::ShotNotFound(shot_id.to_string()))
    }

    async fn require_story_with_shots(&self, story_id: i64) -> EngineResult<StoryWithShots> {
        self.store
            .story_with_shots(story_id)
            .await
            .ok_or(EngineError::StoryNotFound(story_id))
    }
}

/// Materialize one blueprint shot under `story_id`.
fn shot_from_blueprint(story_id: i64, bp: &ShotBlueprint) -> Shot {
    let mut shot = Shot::new(story_id, &bp.title);
    shot.prompt = bp.prompt.clone();
    shot.narration = bp.narration.clone();
    shot.thumbnail_url = bp.thumbnail_url.clone();
    shot.audio_url = bp.audio_url.clone();
    shot.transition = bp.transition;
    shot.status = bp.status;
    shot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MockGenerationService;
    use smv_models::{PipelineStatusResponse, ShotStatus};

    fn test_config() -> EngineConfig {
        EngineConfig {
            work_dir: std::env::temp_dir().join("smv-test-work").display().to_string(),
            media_root: std::env::temp_dir().join("smv-test-media").display().to_string(),
            ..EngineConfig::default()
        }
    }

    fn repository(service: MockGenerationService) -> StoryRepository<MockGenerationService> {
        StoryRepository::new(Arc::new(service), StoryStore::new(), &test_config())
    }

    fn storyboard_json(scene_count: usize) -> bytes::Bytes {
        let scenes: Vec<serde_json::Value> = (0..scene_count)
            .map(|i| {
                serde_json::json!({
                    "scene_title": format!("scene {i}"),
                    "narration": format!("narration {i}")
                })
            })
            .collect();
        bytes::Bytes::from(serde_json::to_vec(&serde_json::json!({ "scenes": scenes })).unwrap())
    }

    fn mock_with_urls() -> MockGenerationService {
        let mut service = MockGenerationService::new();
        service
            .expect_artifact_url()
            .returning(|job, name| format!("http://pipe/download/{job}/{name}"));
        service
    }

    fn ready_video_status(file: &str) -> PipelineStatusResponse {
        PipelineStatusResponse {
            overall_status: "completed".to_string(),
            video_status: Some("ready".to_string()),
            video: Some(file.to_string()),
            ..Default::default()
        }
    }

    async fn seeded_shot(repo: &StoryRepository<MockGenerationService>, story_id: i64) -> Shot {
        let story = {
            let mut s = Story::new("synopsis", StoryStyle::Cinematic);
            s.id = story_id;
            s
        };
        repo.store.upsert_story(story).await;
        let mut shot = Shot::new(story_id, "opening");
        shot.thumbnail_url = Some(format!("http://pipe/download/job-{story_id}/scene_0.png"));
        shot.status = ShotStatus::Ready;
        repo.store.upsert_shot(shot.clone()).await;
        shot
    }

    #[tokio::test]
    async fn create_story_commits_story_shots_and_task() {
        let mut service = mock_with_urls();
        service
            .expect_submit_storyboard()
            .returning(|_, _| Ok("job-9".to_string()));
        service.expect_storyboard_status().returning(|_| {
            Ok(PipelineStatusResponse {
                overall_status: "completed".to_string(),
                storyboard_file: Some("storyboard.json".to_string()),
                images: Some(vec!["scene_0.png".to_string(), "scene_1.png".to_string()]),
                audios: Some(vec!["scene_0.wav".to_string(), "scene_1.wav".to_string()]),
                ..Default::default()
            })
        });
        service
            .expect_download_artifact()
            .returning(|_, _| Ok(storyboard_json(2)));

        let repo = repository(service);
        let story = repo
            .create_story("一位孤独的摄影师在雨夜的城市中寻找遗失的记忆。", StoryStyle::Cinematic)
            .await
            .unwrap();

        assert_eq!(story.title.chars().count(), 18);
        assert_eq!(story.preview_audio_urls.len(), 2);

        let joined = repo.story_with_shots(story.id).await.unwrap();
        assert_eq!(joined.shots.len(), 2);
        assert_eq!(joined.shots[0].title, "scene 0");
        assert_eq!(
            joined.shots[1].thumbnail_url.as_deref(),
            Some("http://pipe/download/job-9/scene_1.png")
        );
        assert_eq!(joined.shots[0].transition, TransitionType::KenBurns);
        assert_eq!(joined.shots[1].transition, TransitionType::Crossfade);

        let tasks = repo.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "job-9");
        assert_eq!(tasks[0].status, TaskStatus::Completed);
        assert_eq!(tasks[0].story_id, Some(story.id));
    }

    #[tokio::test]
    async fn create_story_rejects_blank_synopsis() {
        let repo = repository(MockGenerationService::new());
        let err = repo
            .create_story("   ", StoryStyle::Cinematic)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert!(repo.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn create_story_failure_records_failed_task() {
        let mut service = mock_with_urls();
        service
            .expect_submit_storyboard()
            .returning(|_, _| Ok("job-9".to_string()));
        service.expect_storyboard_status().returning(|_| {
            Ok(PipelineStatusResponse {
                overall_status: "failed".to_string(),
                error: Some("llm exploded".to_string()),
                ..Default::default()
            })
        });

        let repo = repository(service);
        let err = repo
            .create_story("synopsis", StoryStyle::Cinematic)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::PipelineFailed(_)));

        let tasks = repo.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::Failed);
        assert!(tasks[0].message.as_deref().unwrap().contains("llm exploded"));
        assert!(repo.observe_stories().await.borrow().is_empty());
    }

    #[tokio::test]
    async fn request_video_for_shot_stores_url_and_ready_state() {
        let mut service = mock_with_urls();
        service
            .expect_fetch_url()
            .returning(|_| Ok(bytes::Bytes::from_static(b"png")));
        service
            .expect_submit_shot_video()
            .returning(|_, _, _| Ok("job-1".to_string()));
        service
            .expect_shot_video_status()
            .returning(|_| Ok(ready_video_status("shot_video.mp4")));

        let repo = repository(service);
        let shot = seeded_shot(&repo, 1).await;

        let updated = repo.request_video_for_shot(&shot.id).await.unwrap();
        assert_eq!(updated.video_status, VideoTaskState::Ready);
        assert_eq!(
            updated.video_url.as_deref(),
            Some("http://pipe/download/job-1/shot_video.mp4")
        );
        assert!(updated.video_invariant_holds());

        let tasks = repo.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].kind, TaskKind::Video);
        assert_eq!(tasks[0].status, TaskStatus::Ready);
        assert!(tasks[0].video_url.is_some());
    }

    #[tokio::test]
    async fn batch_video_isolates_per_shot_failures() {
        let mut service = mock_with_urls();
        service
            .expect_fetch_url()
            .returning(|_| Ok(bytes::Bytes::from_static(b"png")));
        // Shot 2's image upload fails; the others succeed
        service
            .expect_submit_shot_video()
            .withf(|_, name, _| name == "scene_1.png")
            .returning(|_, _, _| {
                Err(smv_client::RemoteError::http(500, "worker crashed"))
            });
        service
            .expect_submit_shot_video()
            .returning(|job, _, _| Ok(job.to_string()));
        service
            .expect_shot_video_status()
            .returning(|_| Ok(ready_video_status("shot_video.mp4")));

        let repo = repository(service);
        let story = {
            let mut s = Story::new("synopsis", StoryStyle::Cinematic);
            s.id = 7;
            s
        };
        repo.store.upsert_story(story).await;
        for i in 0..3 {
            let mut shot = Shot::new(7, format!("shot {i}"));
            shot.thumbnail_url = Some(format!("http://pipe/download/job-7/scene_{i}.png"));
            shot.status = ShotStatus::Ready;
            repo.store.upsert_shot(shot).await;
        }

        let joined = repo.request_videos_for_all_shots(7).await.unwrap();
        assert_eq!(joined.shots[0].video_status, VideoTaskState::Ready);
        assert_eq!(joined.shots[1].video_status, VideoTaskState::Error);
        assert!(joined.shots[1].video_url.is_none());
        assert_eq!(joined.shots[2].video_status, VideoTaskState::Ready);
        assert!(joined.shots.iter().all(|s| s.video_invariant_holds()));
    }

    #[tokio::test]
    async fn batch_video_leaves_imageless_shots_untouched() {
        let mut service = mock_with_urls();
        service
            .expect_fetch_url()
            .returning(|_| Ok(bytes::Bytes::from_static(b"png")));
        service
            .expect_submit_shot_video()
            .returning(|job, _, _| Ok(job.to_string()));
        service
            .expect_shot_video_status()
            .returning(|_| Ok(ready_video_status("shot_video.mp4")));

        let repo = repository(service);
        let story = {
            let mut s = Story::new("synopsis", StoryStyle::Cinematic);
            s.id = 8;
            s
        };
        repo.store.upsert_story(story).await;
        let mut with_image = Shot::new(8, "shot 0");
        with_image.thumbnail_url = Some("http://pipe/download/job-8/scene_0.png".to_string());
        with_image.status = ShotStatus::Ready;
        repo.store.upsert_shot(with_image).await;
        // Image generation never produced a frame for this one
        let mut without_image = Shot::new(8, "shot 1");
        without_image.status = ShotStatus::Error;
        repo.store.upsert_shot(without_image).await;

        let joined = repo.request_videos_for_all_shots(8).await.unwrap();
        assert_eq!(joined.shots[0].video_status, VideoTaskState::Ready);
        assert_eq!(joined.shots[1].video_status, VideoTaskState::Idle);
        assert!(joined.shots[1].video_url.is_none());
        assert_eq!(repo.tasks().await.len(), 1);
    }

    #[tokio::test]
    async fn video_task_keeps_one_record_when_pipeline_issues_new_job_id() {
        let mut service = mock_with_urls();
        service
            .expect_fetch_url()
            .returning(|_| Ok(bytes::Bytes::from_static(b"png")));
        service
            .expect_submit_shot_video()
            .returning(|_, _, _| Ok("video-99".to_string()));
        service
            .expect_shot_video_status()
            .returning(|_| Ok(ready_video_status("shot_video.mp4")));

        let repo = repository(service);
        let shot = seeded_shot(&repo, 21).await;

        let updated = repo.request_video_for_shot(&shot.id).await.unwrap();
        assert_eq!(
            updated.video_url.as_deref(),
            Some("http://pipe/download/video-99/shot_video.mp4")
        );

        // Submission and terminal updates land on the same record
        let tasks = repo.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "job-21");
        assert_eq!(tasks[0].status, TaskStatus::Ready);
    }

    #[tokio::test]
    async fn finalize_video_publishes_asset_reusing_story_id() {
        let repo = repository(mock_with_urls());
        let shot = seeded_shot(&repo, 11).await;
        repo.store
            .update_shot_video(
                &shot.id,
                Some("http://pipe/download/job-11/shot_video.mp4".to_string()),
                VideoTaskState::Ready,
            )
            .await
            .unwrap();

        let story = repo.finalize_video(11).await.unwrap();
        assert_eq!(story.video_state, VideoTaskState::Ready);
        assert_eq!(
            story.preview_url.as_deref(),
            Some("http://pipe/download/job-11/shot_video.mp4")
        );
        assert_eq!(story.preview_urls.len(), 1);

        let assets = repo.assets(None).await;
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, 11);
        assert_eq!(assets[0].source_story_id, 11);
    }

    #[tokio::test]
    async fn finalize_video_without_segments_fails() {
        let repo = repository(mock_with_urls());
        seeded_shot(&repo, 12).await;
        let err = repo.finalize_video(12).await.unwrap_err();
        assert!(matches!(err, EngineError::VideoFailed(_)));
        assert!(repo.assets(None).await.is_empty());
    }

    #[tokio::test]
    async fn regenerate_shot_failure_reverts_to_previous_image() {
        let mut service = mock_with_urls();
        service
            .expect_storyboard_status()
            .returning(|_| Err(smv_client::RemoteError::http(502, "pipeline down")));

        let repo = repository(service);
        let shot = seeded_shot(&repo, 13).await;
        let prior_thumbnail = shot.thumbnail_url.clone();

        let err = repo.regenerate_shot(&shot.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Remote(_)));

        let reverted = repo.store.get_shot(&shot.id).await.unwrap();
        assert_eq!(reverted.status, ShotStatus::Ready);
        assert_eq!(reverted.thumbnail_url, prior_thumbnail);
    }

    #[tokio::test]
    async fn regenerate_shot_rebuilds_from_latest_artifacts() {
        let mut service = mock_with_urls();
        service.expect_storyboard_status().returning(|_| {
            Ok(PipelineStatusResponse {
                overall_status: "completed".to_string(),
                storyboard_file: Some("storyboard.json".to_string()),
                images: Some(vec!["scene_0_v2.png".to_string()]),
                ..Default::default()
            })
        });
        service
            .expect_download_artifact()
            .returning(|_, _| Ok(storyboard_json(1)));

        let repo = repository(service);
        let shot = seeded_shot(&repo, 14).await;

        let rebuilt = repo.regenerate_shot(&shot.id).await.unwrap();
        assert_eq!(rebuilt.title, "scene 0");
        assert_eq!(rebuilt.narration, "narration 0");
        assert_eq!(
            rebuilt.thumbnail_url.as_deref(),
            Some("http://pipe/download/job-14/scene_0_v2.png")
        );
        assert_eq!(rebuilt.status, ShotStatus::Ready);
    }

    #[tokio::test]
    async fn update_shot_details_applies_only_present_fields() {
        let repo = repository(mock_with_urls());
        let shot = seeded_shot(&repo, 15).await;

        let updated = repo
            .update_shot_details(
                &shot.id,
                ShotDetails {
                    narration: Some("new narration".to_string()),
                    transition: Some(TransitionType::VolumeMix),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.narration, "new narration");
        assert_eq!(updated.transition, TransitionType::VolumeMix);
        assert_eq!(updated.prompt, shot.prompt);
    }

    #[tokio::test]
    async fn ensure_seed_data_seeds_only_empty_store() {
        let repo = repository(mock_with_urls());
        assert!(repo.ensure_seed_data().await.unwrap());
        assert!(!repo.ensure_seed_data().await.unwrap());
        let stories = repo.observe_stories().await.borrow().clone();
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].story.style, StoryStyle::Cinematic);
    }

    #[tokio::test]
    async fn export_without_segments_is_rejected() {
        let repo = repository(mock_with_urls());
        seeded_shot(&repo, 16).await;
        let err = repo
            .export_story(16, ExportDestination::Library)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Media(smv_media::MediaError::NoSegments)
        ));
    }
}
