//! Keyed entity store and task registry for StoryMV.
//!
//! Four collections (Story, Shot, Task, AssetItem) with upsert-by-id
//! semantics, a transactional storyboard commit, and change-notifying
//! observation streams built on `tokio::sync::watch`. The Story
//! Repository in `smv-engine` is the only writer; everything here is
//! mechanism, not policy.

pub mod error;
pub mod metrics;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

use smv_models::{AssetItem, Shot, Story, Task, VideoTaskState};

pub use error::{StoreError, StoreResult};

/// Join projection of a story and its shots, in scene order.
#[derive(Debug, Clone)]
pub struct StoryWithShots {
    pub story: Story,
    pub shots: Vec<Shot>,
}

struct Inner {
    stories: Vec<Story>,
    shots: Vec<Shot>,
    tasks: Vec<Task>,
    assets: Vec<AssetItem>,
    stories_tx: watch::Sender<Vec<StoryWithShots>>,
    tasks_tx: watch::Sender<Vec<Task>>,
    assets_tx: watch::Sender<Vec<AssetItem>>,
    story_observers: HashMap<i64, watch::Sender<Option<StoryWithShots>>>,
}

impl Inner {
    fn story_with_shots(&self, story_id: i64) -> Option<StoryWithShots> {
        let story = self.stories.iter().find(|s| s.id == story_id)?.clone();
        let shots = self
            .shots
            .iter()
            .filter(|s| s.story_id == story_id)
            .cloned()
            .collect();
        Some(StoryWithShots { story, shots })
    }

    /// Refresh every observation stream from the current collections.
    ///
    /// Called at the end of each write while the write lock is held, so
    /// observers always see a consistent snapshot.
    fn notify(&mut self) {
        let mut projections: Vec<StoryWithShots> = self
            .stories
            .iter()
            .map(|s| self.story_with_shots(s.id).expect("story just listed"))
            .collect();
        projections.sort_by(|a, b| b.story.created_at.cmp(&a.story.created_at));
        self.stories_tx.send_replace(projections);

        let mut tasks = self.tasks.clone();
        tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.tasks_tx.send_replace(tasks);

        let mut assets = self.assets.clone();
        assets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.assets_tx.send_replace(assets);

        // Drop per-story channels whose last receiver went away, then
        // refresh the survivors
        self.story_observers
            .retain(|_, tx| tx.receiver_count() > 0);
        for (story_id, tx) in &self.story_observers {
            tx.send_replace(self.story_with_shots(*story_id));
        }
    }
}

/// In-process keyed store with observation streams.
#[derive(Clone)]
pub struct StoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for StoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryStore {
    pub fn new() -> Self {
        let (stories_tx, _) = watch::channel(Vec::new());
        let (tasks_tx, _) = watch::channel(Vec::new());
        let (assets_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(RwLock::new(Inner {
                stories: Vec::new(),
                shots: Vec::new(),
                tasks: Vec::new(),
                assets: Vec::new(),
                stories_tx,
                tasks_tx,
                assets_tx,
                story_observers: HashMap::new(),
            })),
        }
    }

    // ---- Stories ----

    pub async fn upsert_story(&self, story: Story) {
        let mut inner = self.inner.write().await;
        match inner.stories.iter_mut().find(|s| s.id == story.id) {
            Some(existing) => *existing = story,
            None => inner.stories.push(story),
        }
        metrics::record_write("story", "upsert");
        inner.notify();
    }

    pub async fn get_story(&self, story_id: i64) -> Option<Story> {
        let inner = self.inner.read().await;
        inner.stories.iter().find(|s| s.id == story_id).cloned()
    }

    pub async fn count_stories(&self) -> usize {
        self.inner.read().await.stories.len()
    }

    /// Join-query used by every orchestrator read.
    pub async fn story_with_shots(&self, story_id: i64) -> Option<StoryWithShots> {
        self.inner.read().await.story_with_shots(story_id)
    }

    // ---- Shots ----

    pub async fn upsert_shot(&self, shot: Shot) {
        let mut inner = self.inner.write().await;
        match inner.shots.iter_mut().find(|s| s.id == shot.id) {
            Some(existing) => *existing = shot,
            None => inner.shots.push(shot),
        }
        metrics::record_write("shot", "upsert");
        inner.notify();
    }

    pub async fn get_shot(&self, shot_id: &str) -> Option<Shot> {
        let inner = self.inner.read().await;
        inner.shots.iter().find(|s| s.id == shot_id).cloned()
    }

    pub async fn delete_shots_for_story(&self, story_id: i64) {
        let mut inner = self.inner.write().await;
        inner.shots.retain(|s| s.story_id != story_id);
        metrics::record_write("shot", "delete_for_story");
        inner.notify();
    }

    /// Update a shot's video url and state together.
    ///
    /// Enforces the invariant that `video_url` is `Some` exactly when
    /// `state == Ready`: non-ready states clear the url, and a Ready
    /// state without a url is rejected.
    pub async fn update_shot_video(
        &self,
        shot_id: &str,
        video_url: Option<String>,
        state: VideoTaskState,
    ) -> StoreResult<()> {
        if state == VideoTaskState::Ready && video_url.is_none() {
            return Err(StoreError::invariant(format!(
                "shot {shot_id}: Ready video state requires a video url"
            )));
        }
        let mut inner = self.inner.write().await;
        let shot = inner
            .shots
            .iter_mut()
            .find(|s| s.id == shot_id)
            .ok_or_else(|| StoreError::ShotNotFound(shot_id.to_string()))?;
        shot.video_status = state;
        shot.video_url = if state == VideoTaskState::Ready {
            video_url
        } else {
            None
        };
        metrics::record_write("shot", "update_video");
        inner.notify();
        Ok(())
    }

    // ---- Task registry ----

    /// Upsert a task record. Replaces the full record by id, no merge.
    pub async fn upsert_task(&self, task: Task) {
        let mut inner = self.inner.write().await;
        debug!(task_id = %task.id, status = %task.status, "Task upsert");
        match inner.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => inner.tasks.push(task),
        }
        metrics::record_write("task", "upsert");
        inner.notify();
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.read().await.tasks.clone()
    }

    // ---- Assets ----

    pub async fn upsert_asset(&self, asset: AssetItem) {
        let mut inner = self.inner.write().await;
        match inner.assets.iter_mut().find(|a| a.id == asset.id) {
            Some(existing) => *existing = asset,
            None => inner.assets.push(asset),
        }
        metrics::record_write("asset", "upsert");
        inner.notify();
    }

    pub async fn delete_asset(&self, asset_id: i64) {
        let mut inner = self.inner.write().await;
        inner.assets.retain(|a| a.id != asset_id);
        metrics::record_write("asset", "delete");
        inner.notify();
    }

    /// Assets filtered by a case-insensitive title query.
    pub async fn assets(&self, query: Option<&str>) -> Vec<AssetItem> {
        let inner = self.inner.read().await;
        let needle = query.map(str::to_lowercase).filter(|q| !q.is_empty());
        inner
            .assets
            .iter()
            .filter(|a| match &needle {
                Some(q) => a.title.to_lowercase().contains(q),
                None => true,
            })
            .cloned()
            .collect()
    }

    // ---- Transactional storyboard commit ----

    /// Atomically commit a freshly created story: upsert the story,
    /// delete-and-reinsert its shot set, and optionally create the
    /// derived asset. Observers see the whole commit or none of it.
    pub async fn commit_storyboard(
        &self,
        story: Story,
        shots: Vec<Shot>,
        asset: Option<AssetItem>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let story_id = story.id;
        match inner.stories.iter_mut().find(|s| s.id == story_id) {
            Some(existing) => *existing = story,
            None => inner.stories.push(story),
        }
        inner.shots.retain(|s| s.story_id != story_id);
        inner.shots.extend(shots);
        if let Some(asset) = asset {
            match inner.assets.iter_mut().find(|a| a.id == asset.id) {
                Some(existing) => *existing = asset,
                None => inner.assets.push(asset),
            }
        }
        metrics::record_commit();
        inner.notify();
        info!(story_id, "Storyboard committed");
        Ok(())
    }

    // ---- Observation streams ----

    pub async fn observe_stories(&self) -> watch::Receiver<Vec<StoryWithShots>> {
        self.inner.read().await.stories_tx.subscribe()
    }

    /// Observe a single story (and its shots). The stream yields `None`
    /// until the story exists and after it is deleted.
    pub async fn observe_story(&self, story_id: i64) -> watch::Receiver<Option<StoryWithShots>> {
        let mut inner = self.inner.write().await;
        let current = inner.story_with_shots(story_id);
        inner
            .story_observers
            .entry(story_id)
            .or_insert_with(|| watch::channel(current).0)
            .subscribe()
    }

    pub async fn observe_tasks(&self) -> watch::Receiver<Vec<Task>> {
        self.inner.read().await.tasks_tx.subscribe()
    }

    pub async fn observe_assets(&self) -> watch::Receiver<Vec<AssetItem>> {
        self.inner.read().await.assets_tx.subscribe()
    }
}
