//! Segment materialization.
//!
//! Every export first brings all segment sources onto local disk:
//! remote locations are fetched over HTTP, local ones are copied.
//! Each materialized file gets a unique name so concurrent exports
//! never collide in the shared work directory.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};

/// Location of one media segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentSource {
    /// Fetched over HTTP(S)
    Remote(String),
    /// Copied from the local filesystem
    Local(PathBuf),
}

impl SegmentSource {
    /// Parse a location string: absolute URLs become `Remote`,
    /// everything else is a local path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            SegmentSource::Remote(location.to_string())
        } else {
            SegmentSource::Local(PathBuf::from(location))
        }
    }

    /// File extension of the source, if it has one.
    fn extension(&self) -> Option<String> {
        let name = match self {
            SegmentSource::Remote(url) => url.rsplit('/').next()?.split('?').next()?,
            SegmentSource::Local(path) => path.file_name()?.to_str()?,
        };
        let (_, ext) = name.rsplit_once('.')?;
        if ext.is_empty() || ext.len() > 5 {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }
}

/// Materialize a segment into `dir` under a unique name.
pub async fn materialize(
    http: &reqwest::Client,
    source: &SegmentSource,
    dir: &Path,
    default_ext: &str,
) -> MediaResult<PathBuf> {
    let ext = source.extension().unwrap_or_else(|| default_ext.to_string());
    let dest = dir.join(format!("seg_{}.{ext}", Uuid::new_v4().simple()));

    match source {
        SegmentSource::Remote(url) => {
            debug!("Fetching segment {} -> {}", url, dest.display());
            let resp = http.get(url).send().await?;
            if !resp.status().is_success() {
                return Err(MediaError::download_failed(format!(
                    "GET {url} returned {}",
                    resp.status()
                )));
            }
            let bytes = resp.bytes().await?;
            fs::write(&dest, &bytes).await?;
        }
        SegmentSource::Local(path) => {
            if !path.exists() {
                return Err(MediaError::FileNotFound(path.clone()));
            }
            debug!("Copying segment {} -> {}", path.display(), dest.display());
            fs::copy(path, &dest).await?;
        }
    }

    Ok(dest)
}
