use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod youtube;

use crate::resolver::VideoId;
use crate::TranscriptError;

pub use youtube::YoutubeProvider;

/// One caption track a provider reports for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Video the track belongs to
    pub video_id: VideoId,

    /// Language code as reported by the provider (`ru`, `en`, `pt-BR`, ...)
    pub language_code: String,

    /// Human readable language name
    pub language_name: String,

    /// Produced by automatic speech recognition rather than uploaded by a person
    pub is_generated: bool,

    /// Provider-specific handle used to fetch the track body
    pub base_url: String,
}

/// Timed fragment of transcript text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

impl Segment {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// Source of caption tracks for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Enumerate every caption track available for the video
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<TrackDescriptor>, TranscriptError>;

    /// Fetch the ordered segments of one track
    async fn fetch_track(&self, track: &TrackDescriptor) -> Result<Vec<Segment>, TranscriptError>;

    /// Get the name of this provider
    fn provider_name(&self) -> &'static str;
}
