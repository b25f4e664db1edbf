//! Task records: observability for one asynchronous job's lifecycle.
//!
//! Tasks are a parallel, queryable log keyed loosely by story/shot ids.
//! They are non-authoritative for media correctness and safe to lose;
//! the latest state is upserted by id, no history is kept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of remote job a task tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Storyboard generation pipeline
    Pipeline,
    /// Per-shot video synthesis
    Video,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Pipeline => "pipeline",
            TaskKind::Video => "video",
        }
    }
}

/// Closed set of task states, serialized as the service's lowercase strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Queued,
    Processing,
    Completed,
    Failed,
    Generating,
    Ready,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Generating => "generating",
            TaskStatus::Ready => "ready",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Ready)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One submitted remote job's latest observable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Remote job id
    pub id: String,
    /// Job kind
    pub kind: TaskKind,
    /// Latest status
    pub status: TaskStatus,
    /// Human-readable failure message, if any
    pub message: Option<String>,
    /// When the task record was first created
    pub created_at: DateTime<Utc>,
    /// When the record was last upserted
    pub updated_at: DateTime<Utc>,
    /// Story this job affects, if known
    pub story_id: Option<i64>,
    /// Shot this job affects, if known
    pub shot_id: Option<String>,
    /// Display title for the affected entity
    pub title: Option<String>,
    /// Resolved output URL on success
    pub video_url: Option<String>,
}

impl Task {
    /// Create a fresh task record in the given state.
    pub fn new(id: impl Into<String>, kind: TaskKind, status: TaskStatus) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind,
            status,
            message: None,
            created_at: now,
            updated_at: now,
            story_id: None,
            shot_id: None,
            title: None,
            video_url: None,
        }
    }

    pub fn with_story(mut self, story_id: i64) -> Self {
        self.story_id = Some(story_id);
        self
    }

    pub fn with_shot(mut self, shot_id: impl Into<String>) -> Self {
        self.shot_id = Some(shot_id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = Some(url.into());
        self
    }
}
