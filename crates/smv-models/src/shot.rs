//! Shots: the per-scene unit of a story.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::story::VideoTaskState;

/// Generation state of a shot's storyboard image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShotStatus {
    #[default]
    NotGenerated,
    Generating,
    Ready,
}

impl ShotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotStatus::NotGenerated => "not_generated",
            ShotStatus::Generating => "generating",
            ShotStatus::Ready => "ready",
        }
    }
}

/// Transition applied when a shot's segment enters the assembled video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    #[default]
    KenBurns,
    Crossfade,
    VolumeMix,
}

impl TransitionType {
    pub const ALL: [TransitionType; 3] = [
        TransitionType::KenBurns,
        TransitionType::Crossfade,
        TransitionType::VolumeMix,
    ];

    /// Deterministic default for the shot at `index`: cycle through the
    /// variants in scene order.
    pub fn cycle(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransitionType::KenBurns => "Ken Burns",
            TransitionType::Crossfade => "Crossfade",
            TransitionType::VolumeMix => "Volume Mix",
        }
    }
}

impl std::fmt::Display for TransitionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One scene of a story, with its own prompt, narration, image and
/// optional audio/video artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shot {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owning story
    pub story_id: i64,
    /// Scene title from the storyboard
    pub title: String,
    /// Visual prompt used for image/video synthesis
    pub prompt: String,
    /// Narration text for the scene
    pub narration: String,
    /// Fully-qualified URL of the scene image, if generated
    pub thumbnail_url: Option<String>,
    /// Storyboard-image generation state
    pub status: ShotStatus,
    /// Transition into this shot
    pub transition: TransitionType,
    /// Fully-qualified URL of the synthesized video segment.
    /// Invariant: `Some` exactly when `video_status == Ready`.
    pub video_url: Option<String>,
    /// Fully-qualified URL of the scene audio, if any
    pub audio_url: Option<String>,
    /// Video synthesis state for this shot
    pub video_status: VideoTaskState,
}

impl Shot {
    /// Create a shot with a fresh id and idle video state.
    pub fn new(story_id: i64, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            story_id,
            title: title.into(),
            prompt: String::new(),
            narration: String::new(),
            thumbnail_url: None,
            status: ShotStatus::NotGenerated,
            transition: TransitionType::default(),
            video_url: None,
            audio_url: None,
            video_status: VideoTaskState::Idle,
        }
    }

    /// Check the video-url invariant for this shot.
    pub fn video_invariant_holds(&self) -> bool {
        (self.video_status == VideoTaskState::Ready) == self.video_url.is_some()
    }
}
