//! Shared data models for the StoryMV backend.
//!
//! This crate provides Serde-serializable types for:
//! - Stories, shots, and finished-video assets
//! - Task records for async job observability
//! - The storyboard artifact produced by the generation pipeline
//! - Wire DTOs for the remote pipeline API

pub mod api;
pub mod asset;
pub mod shot;
pub mod story;
pub mod storyboard;
pub mod task;

// Re-export common types
pub use api::{PipelineStatusResponse, StartPipelineRequest, StartPipelineResponse, StartVideoResponse};
pub use asset::AssetItem;
pub use shot::{Shot, ShotStatus, TransitionType};
pub use story::{derive_title, Story, StoryStyle, VideoTaskState};
pub use storyboard::{Scene, Storyboard};
pub use task::{Task, TaskKind, TaskStatus};
