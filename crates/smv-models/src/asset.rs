//! Finished-video assets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::story::StoryStyle;

/// A finished, browsable video artifact derived from a story.
///
/// The id reuses the source story's id by convention, but the asset is
/// logically independent and user-deletable without affecting the story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetItem {
    pub id: i64,
    pub title: String,
    pub style: StoryStyle,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Playable location of the finished video
    pub preview_uri: Option<String>,
    /// Story this asset was derived from
    pub source_story_id: i64,
}

impl AssetItem {
    /// Build the asset for a story whose video just became ready.
    pub fn for_finished_story(
        story_id: i64,
        title: impl Into<String>,
        style: StoryStyle,
        preview_url: impl Into<String>,
        thumbnail_url: Option<String>,
    ) -> Self {
        let preview_url = preview_url.into();
        Self {
            id: story_id,
            title: title.into(),
            style,
            thumbnail_url: thumbnail_url.or_else(|| Some(preview_url.clone())),
            created_at: Utc::now(),
            preview_uri: Some(preview_url),
            source_story_id: story_id,
        }
    }
}
