use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use yt_transcript_service::server::{router, AppState};
use yt_transcript_service::{
    Segment, TrackDescriptor, TranscriptError, TranscriptPipeline, TranscriptProvider, VideoId,
};

/// Provider stand-in that serves a fixed track list and echoes the chosen track in its segments
struct FakeProvider {
    tracks: Result<Vec<(&'static str, bool)>, TranscriptError>,
}

#[async_trait]
impl TranscriptProvider for FakeProvider {
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<TrackDescriptor>, TranscriptError> {
        let tracks = self.tracks.clone()?;
        Ok(tracks
            .into_iter()
            .map(|(lang, generated)| TrackDescriptor {
                video_id: video_id.clone(),
                language_code: lang.to_string(),
                language_name: lang.to_string(),
                is_generated: generated,
                base_url: format!("fake://{}/{}", lang, generated),
            })
            .collect())
    }

    async fn fetch_track(&self, track: &TrackDescriptor) -> Result<Vec<Segment>, TranscriptError> {
        let tier = if track.is_generated { "generated" } else { "manual" };
        Ok(vec![
            Segment::new(tier, 0.0, 1.0),
            Segment::new(track.language_code.clone(), 1.0, 1.0),
        ])
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

fn app(tracks: Result<Vec<(&'static str, bool)>, TranscriptError>) -> Router {
    let pipeline = TranscriptPipeline::new(
        Arc::new(FakeProvider { tracks }),
        vec!["ru".to_string(), "en".to_string()],
    );
    router(AppState::new(pipeline))
}

async fn post_transcript(app: Router, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/get-transcript")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_endpoints_report_ok() {
    for uri in ["/", "/health"] {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let res = app(Ok(vec![])).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "yt-transcript-service");
    }
}

#[tokio::test]
async fn manual_russian_track_is_preferred() {
    let (status, json) = post_transcript(
        app(Ok(vec![("en", true), ("ru", false)])),
        r#"{"url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["video_id"], "dQw4w9WgXcQ");
    assert_eq!(json["language"], "ru");
    assert_eq!(json["is_generated"], false);
    assert_eq!(json["transcript"], "manual ru");
}

#[tokio::test]
async fn generated_english_is_used_when_nothing_manual_matches() {
    let (status, json) = post_transcript(
        app(Ok(vec![("en", true)])),
        r#"{"url": "https://youtu.be/dQw4w9WgXcQ"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["language"], "en");
    assert_eq!(json["is_generated"], true);
    assert_eq!(json["transcript"], "generated en");
}

#[tokio::test]
async fn unmatched_languages_are_not_silently_substituted() {
    let (status, json) = post_transcript(
        app(Ok(vec![("de", false), ("fr", true)])),
        r#"{"url": "https://www.youtube.com/shorts/dQw4w9WgXcQ"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "No suitable transcript found");
    assert_eq!(json["kind"], "no_suitable_transcript");
}

#[tokio::test]
async fn invalid_url_is_reported_without_crashing() {
    let (status, json) = post_transcript(app(Ok(vec![])), r#"{"url": "not a url"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid YouTube URL");
    assert_eq!(json["kind"], "invalid_input");
}

#[tokio::test]
async fn missing_url_is_required() {
    for body in [r#"{}"#, r#"{"url": ""}"#, r#"{"url": null}"#] {
        let (status, json) = post_transcript(app(Ok(vec![])), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "URL is required");
        assert_eq!(json["kind"], "invalid_input");
    }
}

#[tokio::test]
async fn malformed_body_is_invalid_input() {
    let (status, json) = post_transcript(app(Ok(vec![])), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["kind"], "invalid_input");
}

#[tokio::test]
async fn provider_failures_map_to_stable_kinds() {
    let cases = [
        (
            TranscriptError::TranscriptsDisabled(VideoId::new("dQw4w9WgXcQ")),
            StatusCode::NOT_FOUND,
            "transcripts_disabled",
        ),
        (
            TranscriptError::VideoUnavailable(VideoId::new("dQw4w9WgXcQ"), "Private video".into()),
            StatusCode::NOT_FOUND,
            "video_unavailable",
        ),
        (TranscriptError::RateLimited, StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        (
            TranscriptError::TransportFailure("connection reset".into()),
            StatusCode::BAD_GATEWAY,
            "transport_failure",
        ),
    ];

    for (error, expected_status, expected_kind) in cases {
        let (status, json) = post_transcript(
            app(Err(error)),
            r#"{"url": "https://www.youtube.com/embed/dQw4w9WgXcQ"}"#,
        )
        .await;
        assert_eq!(status, expected_status);
        assert_eq!(json["kind"], expected_kind);
        assert!(json["error"].as_str().is_some_and(|msg| !msg.is_empty()));
    }
}
