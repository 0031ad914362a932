use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::provider::{Segment, TrackDescriptor, TranscriptProvider};
use crate::resolver::{resolve, VideoId};
use crate::TranscriptError;

/// Transcript returned for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Resolved video id
    pub video_id: VideoId,

    /// Language code of the chosen track; always one of the preferred languages
    pub language: String,

    /// Whether the chosen track was produced by speech recognition
    pub is_generated: bool,

    /// Segment texts joined by single spaces
    pub transcript: String,
}

/// Pick the best track: manual captions first, then generated ones, each tier
/// scanned in preference order.
pub fn select_track<'a>(
    tracks: &'a [TrackDescriptor],
    preferred_languages: &[String],
) -> Option<&'a TrackDescriptor> {
    find_in_tier(tracks, preferred_languages, false)
        .or_else(|| find_in_tier(tracks, preferred_languages, true))
}

fn find_in_tier<'a>(
    tracks: &'a [TrackDescriptor],
    preferred_languages: &[String],
    generated: bool,
) -> Option<&'a TrackDescriptor> {
    preferred_languages.iter().find_map(|lang| {
        tracks
            .iter()
            .find(|track| track.is_generated == generated && track.language_code == *lang)
    })
}

/// Flatten segments into one string, separated by single spaces
pub fn join_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve, select and fetch: everything one transcript request needs
pub struct TranscriptPipeline {
    provider: Arc<dyn TranscriptProvider>,
    languages: Vec<String>,
}

impl TranscriptPipeline {
    pub fn new(provider: Arc<dyn TranscriptProvider>, languages: Vec<String>) -> Self {
        Self {
            provider,
            languages,
        }
    }

    /// Preferred languages, most preferred first
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Transcribe from a user supplied URL
    pub async fn transcribe_from_url(
        &self,
        url: Option<&str>,
    ) -> Result<TranscriptResult, TranscriptError> {
        let url = url.filter(|u| !u.is_empty()).ok_or_else(|| {
            TranscriptError::InvalidInput("URL is required".to_string())
        })?;

        let video_id = resolve(url)
            .ok_or_else(|| TranscriptError::InvalidInput("Invalid YouTube URL".to_string()))?;

        self.transcribe(&video_id).await
    }

    /// Select the best track for a video and flatten it to text
    pub async fn transcribe(&self, video_id: &VideoId) -> Result<TranscriptResult, TranscriptError> {
        let tracks = self.provider.list_tracks(video_id).await?;

        let track = select_track(&tracks, &self.languages).ok_or_else(|| {
            tracing::info!(
                %video_id,
                available = ?tracks.iter().map(|t| t.language_code.as_str()).collect::<Vec<_>>(),
                "no track in preferred languages"
            );
            TranscriptError::NoSuitableTranscript(video_id.clone())
        })?;

        tracing::info!(
            %video_id,
            language = %track.language_code,
            generated = track.is_generated,
            provider = self.provider.provider_name(),
            "selected caption track"
        );

        let segments = self.provider.fetch_track(track).await?;
        let transcript = join_segments(&segments);

        tracing::debug!(
            %video_id,
            segment_count = segments.len(),
            chars = transcript.len(),
            "transcript assembled"
        );

        Ok(TranscriptResult {
            video_id: video_id.clone(),
            language: track.language_code.clone(),
            is_generated: track.is_generated,
            transcript,
        })
    }
}
