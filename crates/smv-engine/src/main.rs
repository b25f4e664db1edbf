//! StoryMV engine binary.
//!
//! Demonstrates a full generation run against a live pipeline service:
//! seed data, health check, storyboard creation, per-shot video
//! synthesis, and a library export of the finished story.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smv_client::PipelineClient;
use smv_engine::{EngineConfig, StoryRepository};
use smv_media::ExportDestination;
use smv_models::StoryStyle;
use smv_store::StoryStore;

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("smv=info".parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting smv-engine");

    let config = EngineConfig::from_env();
    info!("Engine config: {:?}", config);

    let client = match PipelineClient::new(&config.pipeline_base_url) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create pipeline client: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = client.health().await {
        warn!("Pipeline service health check failed: {}", e);
    }

    let repository = StoryRepository::new(Arc::new(client), StoryStore::new(), &config);

    if let Err(e) = repository.ensure_seed_data().await {
        error!("Failed to seed store: {}", e);
        std::process::exit(1);
    }

    // One end-to-end run when a synopsis is provided
    let Ok(synopsis) = std::env::var("SMV_SYNOPSIS") else {
        info!("Set SMV_SYNOPSIS to run a full generation");
        return;
    };
    let style = std::env::var("SMV_STYLE")
        .map(|s| StoryStyle::from_label(&s))
        .unwrap_or_default();

    let story = match repository.create_story(&synopsis, style).await {
        Ok(story) => story,
        Err(e) => {
            error!("Story creation failed: {}", e);
            std::process::exit(1);
        }
    };
    info!(story_id = story.id, title = %story.title, "Story created");

    let story = match repository.request_video(story.id).await {
        Ok(story) => story,
        Err(e) => {
            error!("Video synthesis failed: {}", e);
            std::process::exit(1);
        }
    };
    info!(story_id = story.id, "Story video ready");

    match repository
        .export_story(story.id, ExportDestination::Library)
        .await
    {
        Ok(exported) => {
            info!(path = %exported.path.display(), "Exported {}", exported.display_name)
        }
        Err(e) => error!("Export failed: {}", e),
    }
}
