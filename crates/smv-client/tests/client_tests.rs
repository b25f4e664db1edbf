//! Wire-level tests for the pipeline client against a mock server.

use wiremock::matchers::{body_json_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use smv_client::{PipelineClient, RemoteError};
use smv_models::StoryStyle;

#[tokio::test]
async fn submit_storyboard_returns_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start_pipeline/"))
        .and(body_json_string(
            r#"{"story":"a rainy night","style":"Movie"}"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "task_id": "job-42",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = PipelineClient::new(&server.uri()).unwrap();
    let job_id = client
        .submit_storyboard("a rainy night", StoryStyle::Cinematic)
        .await
        .unwrap();
    assert_eq!(job_id, "job-42");
}

#[tokio::test]
async fn storyboard_status_deserializes_optional_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/job-42/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "overall_status": "completed",
            "storyboard_file": "storyboard.json",
            "images": ["scene_0.png", "scene_1.png"]
        })))
        .mount(&server)
        .await;

    let client = PipelineClient::new(&server.uri()).unwrap();
    let status = client.storyboard_status("job-42").await.unwrap();
    assert_eq!(status.overall_status, "completed");
    assert_eq!(status.storyboard_file.as_deref(), Some("storyboard.json"));
    assert_eq!(status.images.unwrap().len(), 2);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn download_artifact_returns_raw_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/job-42/storyboard.json"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"{\"scenes\":[]}".to_vec()))
        .mount(&server)
        .await;

    let client = PipelineClient::new(&server.uri()).unwrap();
    let bytes = client
        .download_artifact("job-42", "storyboard.json")
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"{\"scenes\":[]}");
}

#[tokio::test]
async fn submit_shot_video_posts_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start_video/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "task_id": "video-7",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = PipelineClient::new(&server.uri()).unwrap();
    let job_id = client
        .submit_shot_video("job-42", "scene_0.png", bytes::Bytes::from_static(b"png"))
        .await
        .unwrap();
    assert_eq!(job_id, "video-7");
}

#[tokio::test]
async fn non_2xx_maps_to_http_error_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/missing/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such job"))
        .mount(&server)
        .await;

    let client = PipelineClient::new(&server.uri()).unwrap();
    let err = client.storyboard_status("missing").await.unwrap_err();
    match err {
        RemoteError::Http { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no such job");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn health_probe_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pipeline_health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})))
        .mount(&server)
        .await;

    let client = PipelineClient::new(&server.uri()).unwrap();
    client.health().await.unwrap();
}
