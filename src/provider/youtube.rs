use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Proxy, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{Segment, TrackDescriptor, TranscriptProvider};
use crate::config::{Config, ProxyEndpoint};
use crate::resolver::VideoId;
use crate::TranscriptError;

const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

static API_KEY_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).ok());

static MARKUP_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[^>]*>").ok());

/// InnerTube player response, reduced to what caption listing needs
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    tracklist: Option<CaptionTracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTracklist {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl TrackName {
    fn text(&self) -> Option<String> {
        self.simple_text
            .clone()
            .or_else(|| self.runs.first().map(|run| run.text.clone()))
    }
}

/// Caption provider backed by YouTube's watch page, InnerTube player API and timed-text XML
pub struct YoutubeProvider {
    client: Client,
    base_url: String,
}

impl YoutubeProvider {
    /// Build a provider from the service configuration (timeout and proxy settings)
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let timeout = Duration::from_secs(config.provider.request_timeout_secs);
        let proxy = config.proxy.resolve()?;
        let client = build_client(timeout, proxy.as_ref())?;
        Ok(Self::with_client(client, YOUTUBE_BASE_URL))
    }

    /// Use a prepared client against the given origin (tests point this at a local server)
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_watch_page(&self, video_id: &VideoId) -> Result<String, TranscriptError> {
        let url = format!(
            "{}/watch?v={}",
            self.base_url,
            urlencoding::encode(video_id.as_str())
        );
        tracing::debug!(%video_id, "fetching watch page");

        let response = self.client.get(&url).send().await?;
        let html = check_status(response)?.text().await?;
        Ok(html)
    }

    async fn fetch_player(
        &self,
        video_id: &VideoId,
        api_key: &str,
    ) -> Result<PlayerResponse, TranscriptError> {
        let url = format!(
            "{}/youtubei/v1/player?key={}",
            self.base_url,
            urlencoding::encode(api_key)
        );
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id.as_str()
        });
        tracing::debug!(%video_id, "calling innertube player endpoint");

        let response = self.client.post(&url).json(&body).send().await?;
        let text = check_status(response)?.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            TranscriptError::TransportFailure(format!("Failed to parse player response: {}", e))
        })
    }
}

#[async_trait]
impl TranscriptProvider for YoutubeProvider {
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<TrackDescriptor>, TranscriptError> {
        let html = self.fetch_watch_page(video_id).await?;
        let api_key = extract_api_key(&html)?;
        let player = self.fetch_player(video_id, &api_key).await?;

        assert_playability(video_id, player.playability_status.as_ref())?;
        let tracks = caption_tracks(video_id, player)?;

        tracing::debug!(%video_id, track_count = tracks.len(), "listed caption tracks");
        Ok(tracks)
    }

    async fn fetch_track(&self, track: &TrackDescriptor) -> Result<Vec<Segment>, TranscriptError> {
        if track.base_url.contains("&exp=xpe") {
            return Err(TranscriptError::TransportFailure(format!(
                "Caption track {} for video {} requires a PO token",
                track.language_code, track.video_id
            )));
        }

        tracing::debug!(
            video_id = %track.video_id,
            language = %track.language_code,
            generated = track.is_generated,
            "fetching caption track"
        );

        let response = self.client.get(&track.base_url).send().await?;
        let xml = check_status(response)?.text().await?;
        parse_caption_xml(&xml)
    }

    fn provider_name(&self) -> &'static str {
        "YouTube"
    }
}

/// Build the HTTP client shared by every provider call
pub fn build_client(timeout: Duration, proxy: Option<&ProxyEndpoint>) -> crate::Result<Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        reqwest::header::HeaderValue::from_static("en-US"),
    );

    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout);

    if let Some(endpoint) = proxy {
        let mut upstream = Proxy::all(&endpoint.url)?;
        if let Some(username) = &endpoint.username {
            upstream = upstream.basic_auth(username, endpoint.password.as_deref().unwrap_or(""));
        }
        builder = builder.proxy(upstream);

        // Scraping relays re-sign TLS with their own certificate
        if endpoint.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        tracing::info!(mode = %endpoint.mode, proxy = %endpoint.url, "routing provider calls through proxy");
    }

    Ok(builder.build()?)
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TranscriptError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TranscriptError::RateLimited);
    }
    if !status.is_success() {
        return Err(TranscriptError::TransportFailure(format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown error")
        )));
    }
    Ok(response)
}

fn extract_api_key(html: &str) -> Result<String, TranscriptError> {
    if html.contains("class=\"g-recaptcha\"") {
        return Err(TranscriptError::RateLimited);
    }

    API_KEY_RE
        .as_ref()
        .and_then(|re| re.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|key| key.as_str().to_string())
        .ok_or_else(|| {
            TranscriptError::TransportFailure("Could not find InnerTube API key on watch page".to_string())
        })
}

fn assert_playability(
    video_id: &VideoId,
    playability: Option<&PlayabilityStatus>,
) -> Result<(), TranscriptError> {
    let Some(playability) = playability else {
        return Ok(());
    };

    let status = playability.status.as_deref().unwrap_or("OK");
    if status == "OK" {
        return Ok(());
    }

    let reason = playability
        .reason
        .clone()
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| status.to_string());

    if status == "LOGIN_REQUIRED" && reason.contains("not a bot") {
        return Err(TranscriptError::RateLimited);
    }

    Err(TranscriptError::VideoUnavailable(video_id.clone(), reason))
}

fn caption_tracks(
    video_id: &VideoId,
    player: PlayerResponse,
) -> Result<Vec<TrackDescriptor>, TranscriptError> {
    let tracks: Vec<TrackDescriptor> = player
        .captions
        .and_then(|c| c.tracklist)
        .map(|t| t.caption_tracks)
        .unwrap_or_default()
        .into_iter()
        .map(|track| TrackDescriptor {
            video_id: video_id.clone(),
            language_name: track
                .name
                .as_ref()
                .and_then(TrackName::text)
                .unwrap_or_else(|| track.language_code.clone()),
            is_generated: track.kind.as_deref() == Some("asr"),
            base_url: track.base_url.replace("&fmt=srv3", ""),
            language_code: track.language_code,
        })
        .collect();

    if tracks.is_empty() {
        return Err(TranscriptError::TranscriptsDisabled(video_id.clone()));
    }
    Ok(tracks)
}

/// Parse a timed-text document (`<transcript><text start=".." dur="..">..</text></transcript>`)
fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>, TranscriptError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current: Option<(f64, f64)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = 0.0;
                let mut duration = 0.0;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value);
                    match attr.key.as_ref() {
                        b"start" => start = value.parse::<f64>().unwrap_or(0.0),
                        b"dur" => duration = value.parse::<f64>().unwrap_or(0.0),
                        _ => {}
                    }
                }
                current = Some((start, duration));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((start, duration)) = current.take() {
                    let raw = e.unescape().map_err(|err| {
                        TranscriptError::TransportFailure(format!("Malformed caption text: {}", err))
                    })?;
                    let text = strip_markup(&html_escape::decode_html_entities(&raw));
                    if !text.is_empty() {
                        segments.push(Segment::new(text, start, duration));
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TranscriptError::TransportFailure(format!(
                    "Error parsing caption XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(segments)
}

fn strip_markup(text: &str) -> String {
    match MARKUP_RE.as_ref() {
        Some(re) => re.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}
