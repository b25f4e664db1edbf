//! Storyboard artifact format.
//!
//! The pipeline's storyboard artifact is a JSON document of ordered
//! scenes. Scene order defines shot order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Separator between joined prompt fields.
const PROMPT_SEPARATOR: &str = "；";

/// The storyboard JSON downloaded from the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storyboard {
    pub scenes: Vec<Scene>,
}

/// One scene of a storyboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub scene_title: String,
    pub narration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgm_suggestion: Option<String>,
    /// Structured visual prompt fields. May be empty, in which case the
    /// narration doubles as the visual prompt.
    #[serde(default)]
    pub prompt: BTreeMap<String, String>,
}

impl Scene {
    /// Build the visual prompt string for this scene.
    ///
    /// Prompt fields are joined as `key：value` pairs with a fixed
    /// separator; an empty map falls back to the narration text.
    pub fn visual_prompt(&self) -> String {
        if self.prompt.is_empty() {
            return self.narration.clone();
        }
        self.prompt
            .iter()
            .map(|(k, v)| format!("{k}：{v}"))
            .collect::<Vec<_>>()
            .join(PROMPT_SEPARATOR)
    }
}

impl Storyboard {
    /// Parse a storyboard from raw JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
