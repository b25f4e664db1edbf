//! Engine configuration.

use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the generation pipeline service
    pub pipeline_base_url: String,
    /// Poll interval for storyboard jobs
    pub pipeline_poll_interval: Duration,
    /// Attempt bound for storyboard jobs
    pub pipeline_max_attempts: u32,
    /// Poll interval for per-shot video jobs
    pub video_poll_interval: Duration,
    /// Attempt bound for per-shot video jobs
    pub video_max_attempts: u32,
    /// Scratch directory for media assembly
    pub work_dir: String,
    /// Root under which export destination folders live
    pub media_root: String,
    /// FFmpeg invocation timeout
    pub ffmpeg_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pipeline_base_url: "http://localhost:8000/api".to_string(),
            pipeline_poll_interval: Duration::from_secs(1),
            pipeline_max_attempts: 60,
            video_poll_interval: Duration::from_secs(1),
            video_max_attempts: 120,
            work_dir: "/tmp/smv".to_string(),
            media_root: "/tmp/smv-media".to_string(),
            ffmpeg_timeout: Duration::from_secs(600),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            pipeline_base_url: std::env::var("SMV_PIPELINE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
            pipeline_poll_interval: Duration::from_millis(
                std::env::var("SMV_PIPELINE_POLL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            pipeline_max_attempts: std::env::var("SMV_PIPELINE_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            video_poll_interval: Duration::from_millis(
                std::env::var("SMV_VIDEO_POLL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            video_max_attempts: std::env::var("SMV_VIDEO_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
            work_dir: std::env::var("SMV_WORK_DIR").unwrap_or_else(|_| "/tmp/smv".to_string()),
            media_root: std::env::var("SMV_MEDIA_ROOT")
                .unwrap_or_else(|_| "/tmp/smv-media".to_string()),
            ffmpeg_timeout: Duration::from_secs(
                std::env::var("SMV_FFMPEG_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }
}
