//! Media assembly: ordered concatenation plus audio muxing.
//!
//! Given an ordered list of video segment locations and optional audio
//! segments, produce one muxed mp4 at a chosen destination. Segments
//! are expected to share codec/container parameters because they come
//! from the same upstream generator, so concatenation runs with stream
//! copy and no re-encode. That assumption is documented, not verified.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fetch::{materialize, SegmentSource};

/// MIME type of every exported file.
pub const EXPORT_MIME_TYPE: &str = "video/mp4";

/// Where an exported file is staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportDestination {
    /// Primary media library
    Library,
    /// General downloads
    Downloads,
}

impl ExportDestination {
    /// Logical folder under the media root.
    pub fn folder(&self) -> &'static str {
        match self {
            ExportDestination::Library => "movies/library",
            ExportDestination::Downloads => "downloads",
        }
    }
}

/// Reference to a finished export.
#[derive(Debug, Clone)]
pub struct ExportedMedia {
    /// Final location of the file
    pub path: PathBuf,
    /// Display name (`{title}.mp4`)
    pub display_name: String,
    /// Always `video/mp4`
    pub mime_type: &'static str,
}

/// The media assembly engine.
#[derive(Debug, Clone)]
pub struct MediaAssembler {
    http: reqwest::Client,
    /// Scratch space for materialized segments and intermediates
    work_dir: PathBuf,
    /// Root under which destination folders live
    media_root: PathBuf,
    /// Per-invocation FFmpeg timeout
    ffmpeg_timeout_secs: u64,
}

impl MediaAssembler {
    pub fn new(work_dir: impl Into<PathBuf>, media_root: impl Into<PathBuf>) -> Self {
        Self {
            http: reqwest::Client::new(),
            work_dir: work_dir.into(),
            media_root: media_root.into(),
            ffmpeg_timeout_secs: 600,
        }
    }

    /// Share an existing reqwest client (connection pools).
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_ffmpeg_timeout(mut self, secs: u64) -> Self {
        self.ffmpeg_timeout_secs = secs;
        self
    }

    /// Assemble ordered video segments (plus optional audio) into one
    /// exported file at the chosen destination.
    ///
    /// The whole run works inside a uniquely named staging directory;
    /// all temporaries are removed on success and failure alike. Any
    /// FFmpeg failure or I/O error aborts the export with no partial
    /// output left behind.
    pub async fn export(
        &self,
        video_segments: &[SegmentSource],
        audio_segments: &[SegmentSource],
        title: &str,
        destination: ExportDestination,
    ) -> MediaResult<ExportedMedia> {
        // Rejected before any filesystem or network work happens.
        if video_segments.is_empty() {
            return Err(MediaError::NoSegments);
        }

        let staging = self.staging_dir();
        fs::create_dir_all(&staging).await?;

        let result = self
            .export_in(&staging, video_segments, audio_segments, title, destination)
            .await;

        // Cleanup runs regardless of outcome.
        if let Err(e) = fs::remove_dir_all(&staging).await {
            warn!("Failed to clean staging dir {}: {}", staging.display(), e);
        }

        result
    }

    async fn export_in(
        &self,
        staging: &Path,
        video_segments: &[SegmentSource],
        audio_segments: &[SegmentSource],
        title: &str,
        destination: ExportDestination,
    ) -> MediaResult<ExportedMedia> {
        // 1. Materialize every segment locally.
        let mut local_videos = Vec::with_capacity(video_segments.len());
        for source in video_segments {
            local_videos.push(materialize(&self.http, source, staging, "mp4").await?);
        }

        // 2–3. Single segment skips concatenation entirely.
        let assembled = self
            .concat_segments(staging, &local_videos, "video_concat.mp4")
            .await?;

        // 4. Merge audio and mux it onto the assembled video.
        let finished = if audio_segments.is_empty() {
            assembled
        } else {
            let mut local_audios = Vec::with_capacity(audio_segments.len());
            for source in audio_segments {
                local_audios.push(materialize(&self.http, source, staging, "wav").await?);
            }
            let merged = self
                .concat_segments(staging, &local_audios, "audio_concat.wav")
                .await?;

            let muxed = staging.join("muxed.mp4");
            // Video stream copied, audio transcoded to the target codec,
            // trimmed to the shorter stream.
            let cmd = FfmpegCommand::new(&muxed)
                .input(&assembled)
                .input(&merged)
                .map("0:v:0")
                .map("1:a:0")
                .video_codec("copy")
                .audio_codec("aac")
                .shortest();
            self.runner().run(&cmd).await?;
            muxed
        };

        // 5. Stage into the destination folder.
        let dest_dir = self.media_root.join(destination.folder());
        fs::create_dir_all(&dest_dir).await?;
        let display_name = display_name(title);
        let final_path = dest_dir.join(&display_name);
        fs::copy(&finished, &final_path).await?;

        info!(
            "Exported {} segment(s) to {}",
            video_segments.len(),
            final_path.display()
        );

        Ok(ExportedMedia {
            path: final_path,
            display_name,
            mime_type: EXPORT_MIME_TYPE,
        })
    }

    /// Merge audio segments into one playable file, best effort.
    ///
    /// Used as a preview aid: failures return `None` rather than an
    /// error. The merged file lands under `previews/` in the work dir
    /// and survives the call; intermediates do not.
    pub async fn merge_audio(&self, segments: &[SegmentSource]) -> Option<PathBuf> {
        if segments.is_empty() {
            return None;
        }

        let staging = self.staging_dir();
        if fs::create_dir_all(&staging).await.is_err() {
            return None;
        }

        let result = self.merge_audio_in(&staging, segments).await;

        if let Err(e) = fs::remove_dir_all(&staging).await {
            warn!("Failed to clean staging dir {}: {}", staging.display(), e);
        }

        match result {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Audio merge skipped: {}", e);
                None
            }
        }
    }

    async fn merge_audio_in(
        &self,
        staging: &Path,
        segments: &[SegmentSource],
    ) -> MediaResult<PathBuf> {
        let mut local = Vec::with_capacity(segments.len());
        for source in segments {
            local.push(materialize(&self.http, source, staging, "wav").await?);
        }
        let merged = self
            .concat_segments(staging, &local, "audio_concat.wav")
            .await?;

        let previews = self.work_dir.join("previews");
        fs::create_dir_all(&previews).await?;
        let ext = merged
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("wav");
        let out = previews.join(format!("merged_{}.{ext}", Uuid::new_v4().simple()));
        fs::copy(&merged, &out).await?;
        Ok(out)
    }

    /// Concatenate already-local segments with stream copy.
    ///
    /// One segment is the fast path: the file is used as-is with no
    /// FFmpeg invocation at all.
    async fn concat_segments(
        &self,
        staging: &Path,
        segments: &[PathBuf],
        output_name: &str,
    ) -> MediaResult<PathBuf> {
        match segments {
            [] => Err(MediaError::NoSegments),
            [single] => Ok(single.clone()),
            many => {
                let manifest = staging.join(format!("{output_name}.txt"));
                fs::write(&manifest, concat_manifest(many)).await?;

                let output = staging.join(output_name);
                let cmd = FfmpegCommand::new(&output)
                    .input_with_args(["-f", "concat", "-safe", "0"], &manifest)
                    .codec_copy();
                self.runner().run(&cmd).await?;
                Ok(output)
            }
        }
    }

    fn runner(&self) -> FfmpegRunner {
        FfmpegRunner::new().with_timeout(self.ffmpeg_timeout_secs)
    }

    /// Unique staging directory for one export run.
    fn staging_dir(&self) -> PathBuf {
        self.work_dir.join(format!(
            "export_{}_{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        ))
    }
}

/// Render the concat demuxer manifest for an ordered segment list.
fn concat_manifest(segments: &[PathBuf]) -> String {
    let mut out = String::new();
    for path in segments {
        let escaped = path.to_string_lossy().replace('\'', "'\\''");
        out.push_str(&format!("file '{escaped}'\n"));
    }
    out
}

/// Sanitized `{title}.mp4` display name.
fn display_name(title: &str) -> String {
    let safe: String = title
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let safe = safe.trim();
    if safe.is_empty() {
        "storyboard.mp4".to_string()
    } else {
        format!("{safe}.mp4")
    }
}
