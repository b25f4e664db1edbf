//! Story aggregate and related enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visual style requested for a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoryStyle {
    #[default]
    Cinematic,
    Animation,
    Realistic,
}

impl StoryStyle {
    /// Wire label understood by the generation service.
    pub fn label(&self) -> &'static str {
        match self {
            StoryStyle::Cinematic => "Movie",
            StoryStyle::Animation => "Animation",
            StoryStyle::Realistic => "Realistic",
        }
    }

    /// Parse a wire label, falling back to `Cinematic` for unknown values.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Animation" => StoryStyle::Animation,
            "Realistic" => StoryStyle::Realistic,
            _ => StoryStyle::Cinematic,
        }
    }
}

impl std::fmt::Display for StoryStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Lifecycle of a story's (or shot's) video synthesis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoTaskState {
    #[default]
    Idle,
    Generating,
    Ready,
    Error,
}

impl VideoTaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoTaskState::Idle => "idle",
            VideoTaskState::Generating => "generating",
            VideoTaskState::Ready => "ready",
            VideoTaskState::Error => "error",
        }
    }

    /// Terminal states receive no further transitions from the orchestrator.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoTaskState::Ready | VideoTaskState::Error)
    }
}

impl std::fmt::Display for VideoTaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Default title when a synopsis is blank.
const FALLBACK_TITLE: &str = "Untitled story";

/// Maximum characters of synopsis carried into the title.
const TITLE_MAX_CHARS: usize = 18;

/// A story project: one synopsis plus the shots derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    /// Unique identifier, minted from epoch millis at creation
    pub id: i64,
    /// Display title derived from the synopsis
    pub title: String,
    /// The synopsis the storyboard was generated from
    pub synopsis: String,
    /// Requested visual style
    pub style: StoryStyle,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Lifecycle of the story-level video
    pub video_state: VideoTaskState,
    /// Fully-qualified URL of the finished video, if any
    pub preview_url: Option<String>,
    /// Per-shot preview video URLs, in shot order
    #[serde(default)]
    pub preview_urls: Vec<String>,
    /// Per-shot preview audio URLs, in shot order
    #[serde(default)]
    pub preview_audio_urls: Vec<String>,
}

impl Story {
    /// Create a story with an id minted from the current time.
    pub fn new(synopsis: impl Into<String>, style: StoryStyle) -> Self {
        let synopsis = synopsis.into();
        let now = Utc::now();
        Self {
            id: now.timestamp_millis(),
            title: derive_title(&synopsis),
            synopsis,
            style,
            created_at: now,
            video_state: VideoTaskState::Idle,
            preview_url: None,
            preview_urls: Vec::new(),
            preview_audio_urls: Vec::new(),
        }
    }
}

/// Derive a story title from the first characters of the synopsis.
pub fn derive_title(synopsis: &str) -> String {
    let trimmed = synopsis.trim();
    if trimmed.is_empty() {
        return FALLBACK_TITLE.to_string();
    }
    trimmed.chars().take(TITLE_MAX_CHARS).collect()
}
