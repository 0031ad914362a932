//! yt-transcript-service - resolve YouTube links and return their caption transcript
//!
//! The library exposes the pieces used by the `yt-transcript` binary: a URL resolver,
//! a provider abstraction over YouTube's caption endpoints, the manual-then-generated
//! track selector, and the axum router that serves it all as JSON.

pub mod cli;
pub mod config;
pub mod output;
pub mod provider;
pub mod resolver;
pub mod server;
pub mod transcribe;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use provider::{Segment, TrackDescriptor, TranscriptProvider};
pub use resolver::{resolve, VideoId};
pub use transcribe::{TranscriptPipeline, TranscriptResult};

use serde::Serialize;

/// Result type used by process-level code (config, CLI, server start-up)
pub type Result<T> = anyhow::Result<T>;

/// Stable, machine-readable error category reported alongside every error message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    TranscriptsDisabled,
    VideoUnavailable,
    NoSuitableTranscript,
    RateLimited,
    TransportFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::TranscriptsDisabled => "transcripts_disabled",
            ErrorKind::VideoUnavailable => "video_unavailable",
            ErrorKind::NoSuitableTranscript => "no_suitable_transcript",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::TransportFailure => "transport_failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors a single transcript request can end in
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Transcripts are disabled for video {0}")]
    TranscriptsDisabled(VideoId),

    #[error("Video {0} is unavailable: {1}")]
    VideoUnavailable(VideoId, String),

    #[error("No suitable transcript found")]
    NoSuitableTranscript(VideoId),

    #[error("Too many requests to YouTube, try again later")]
    RateLimited,

    #[error("Transport failure: {0}")]
    TransportFailure(String),
}

impl TranscriptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranscriptError::InvalidInput(_) => ErrorKind::InvalidInput,
            TranscriptError::TranscriptsDisabled(_) => ErrorKind::TranscriptsDisabled,
            TranscriptError::VideoUnavailable(..) => ErrorKind::VideoUnavailable,
            TranscriptError::NoSuitableTranscript(_) => ErrorKind::NoSuitableTranscript,
            TranscriptError::RateLimited => ErrorKind::RateLimited,
            TranscriptError::TransportFailure(_) => ErrorKind::TransportFailure,
        }
    }
}

impl From<reqwest::Error> for TranscriptError {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            return TranscriptError::RateLimited;
        }
        TranscriptError::TransportFailure(err.to_string())
    }
}
