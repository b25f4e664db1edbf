//! Orchestration engine for StoryMV.
//!
//! Ties the remote generation service, the entity store, and the media
//! assembler together: the pipeline orchestrator turns a synopsis into
//! a committed story, the video orchestrator synthesizes per-shot
//! segments, and the Story Repository is the application-facing entry
//! point that keeps everything consistent.

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod repository;
pub mod service;
pub mod video;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use logging::JobLogger;
pub use pipeline::{PipelineOrchestrator, ShotBlueprint, StoryBlueprint};
pub use repository::{ShotDetails, StoryRepository};
pub use service::GenerationService;
pub use video::{job_id_from_artifact_url, VideoJobOrchestrator, VideoJobOutcome};
