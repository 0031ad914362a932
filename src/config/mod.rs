use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const WEBSHARE_PROXY_URL: &str = "http://p.webshare.io:80";
const RELAY_PROXY_URL: &str = "http://proxy-server.scraperapi.com:8001";
const RELAY_PROXY_USER: &str = "scraperapi";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Transcript selection settings
    #[serde(default)]
    pub transcript: TranscriptConfig,

    /// Caption provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Optional upstream proxy used to reach the caption provider
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Preferred caption languages, most preferred first
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Upper bound for each call to the caption provider
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Explicit upstream proxy URL
    pub url: Option<String>,

    /// Proxy username (Webshare rotating proxy when no `url` is set)
    pub username: Option<String>,

    /// Proxy password
    pub password: Option<String>,

    /// API key for a scraping relay used in proxy mode
    pub relay_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human readable ones
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            languages: vec!["ru".to_string(), "en".to_string()],
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 20,
        }
    }
}

/// How provider traffic leaves the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMode {
    Explicit,
    Webshare,
    Relay,
}

impl std::fmt::Display for ProxyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyMode::Explicit => write!(f, "explicit"),
            ProxyMode::Webshare => write!(f, "webshare"),
            ProxyMode::Relay => write!(f, "relay"),
        }
    }
}

/// Fully resolved proxy target; credentials are kept apart from the URL so they never get logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub mode: ProxyMode,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub accept_invalid_certs: bool,
}

impl ProxyConfig {
    /// Turn the configured settings into a single proxy target, or `None` for direct calls
    pub fn resolve(&self) -> Result<Option<ProxyEndpoint>> {
        let url = non_empty(&self.url);
        let username = non_empty(&self.username);
        let password = non_empty(&self.password);
        let relay_api_key = non_empty(&self.relay_api_key);

        if username.is_some() != password.is_some() {
            anyhow::bail!("Proxy username and password must be configured together");
        }
        if relay_api_key.is_some() && (url.is_some() || username.is_some()) {
            anyhow::bail!("Configure either a proxy or a relay API key, not both");
        }

        let endpoint = match (url, username, password, relay_api_key) {
            (Some(url), username, password, None) => {
                let mut parsed = url::Url::parse(url)
                    .with_context(|| format!("Invalid proxy URL: {}", url))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    anyhow::bail!("Proxy URL must use HTTP or HTTPS protocol");
                }

                let mut username = username.map(str::to_string);
                let mut password = password.map(str::to_string);
                let url = if parsed.username().is_empty() && parsed.password().is_none() {
                    url.to_string()
                } else {
                    // Separately configured credentials win over userinfo embedded in the URL
                    if username.is_none() {
                        username = Some(decode_userinfo(parsed.username())?);
                        password = parsed.password().map(decode_userinfo).transpose()?;
                    }
                    parsed
                        .set_username("")
                        .and_then(|_| parsed.set_password(None))
                        .map_err(|_| anyhow::anyhow!("Proxy URL credentials could not be removed"))?;
                    parsed.to_string()
                };

                ProxyEndpoint {
                    mode: ProxyMode::Explicit,
                    url,
                    username,
                    password,
                    accept_invalid_certs: false,
                }
            }
            (None, Some(username), Some(password), None) => ProxyEndpoint {
                mode: ProxyMode::Webshare,
                url: WEBSHARE_PROXY_URL.to_string(),
                username: Some(format!("{}-rotate", username)),
                password: Some(password.to_string()),
                accept_invalid_certs: false,
            },
            (None, None, None, Some(key)) => ProxyEndpoint {
                mode: ProxyMode::Relay,
                url: RELAY_PROXY_URL.to_string(),
                username: Some(RELAY_PROXY_USER.to_string()),
                password: Some(key.to_string()),
                accept_invalid_certs: true,
            },
            _ => return Ok(None),
        };

        Ok(Some(endpoint))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn decode_userinfo(value: &str) -> Result<String> {
    Ok(urlencoding::decode(value)
        .context("Proxy URL credentials are not valid UTF-8")?
        .into_owned())
}

impl Config {
    /// Environment variables consulted by [`Config::apply_env_overrides`]
    pub const ENV_OVERRIDES: [&'static str; 8] = [
        "YT_TRANSCRIPT_HOST",
        "YT_TRANSCRIPT_PORT",
        "YT_TRANSCRIPT_LANGUAGES",
        "YT_TRANSCRIPT_TIMEOUT_SECS",
        "PROXY_URL",
        "PROXY_USERNAME",
        "PROXY_PASSWORD",
        "RELAY_API_KEY",
    ];

    /// Load configuration from file (or defaults), then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_file() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Candidate config file locations, in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        // Current directory first for easy testing
        let mut paths = vec![PathBuf::from("config.yaml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("yt-transcript-service").join("config.yaml"));
        }
        paths
    }

    /// Configuration file in effect, if one exists
    pub fn config_file() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.exists())
    }

    /// Overlay settings taken from the environment; empty values are ignored
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = get("YT_TRANSCRIPT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("YT_TRANSCRIPT_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("YT_TRANSCRIPT_PORT is not a valid port: {}", port))?;
        }
        if let Some(languages) = get("YT_TRANSCRIPT_LANGUAGES") {
            self.transcript.languages = languages
                .split(',')
                .map(|lang| lang.trim().to_string())
                .filter(|lang| !lang.is_empty())
                .collect();
        }
        if let Some(timeout) = get("YT_TRANSCRIPT_TIMEOUT_SECS") {
            self.provider.request_timeout_secs = timeout.parse().with_context(|| {
                format!("YT_TRANSCRIPT_TIMEOUT_SECS is not a number: {}", timeout)
            })?;
        }
        if let Some(url) = get("PROXY_URL") {
            self.proxy.url = Some(url);
        }
        if let Some(username) = get("PROXY_USERNAME") {
            self.proxy.username = Some(username);
        }
        if let Some(password) = get("PROXY_PASSWORD") {
            self.proxy.password = Some(password);
        }
        if let Some(key) = get("RELAY_API_KEY") {
            self.proxy.relay_api_key = Some(key);
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.transcript.languages.is_empty() {
            anyhow::bail!("At least one preferred transcript language must be configured");
        }
        if self.provider.request_timeout_secs == 0 {
            anyhow::bail!("Provider request timeout must be greater than zero");
        }
        self.proxy.resolve()?;
        Ok(())
    }

    /// Display current configuration with secrets redacted
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Listen Address: {}:{}", self.server.host, self.server.port);
        println!("  Languages: {}", self.transcript.languages.join(", "));
        println!("  Provider Timeout: {}s", self.provider.request_timeout_secs);
        match self.proxy.resolve() {
            Ok(Some(endpoint)) => {
                println!("  Proxy: {} ({})", endpoint.url, endpoint.mode);
                if endpoint.username.is_some() {
                    println!("  Proxy Credentials: ********");
                }
            }
            Ok(None) => println!("  Proxy: none (direct)"),
            Err(e) => println!("  Proxy: invalid ({})", e),
        }
        println!("  JSON Logs: {}", self.logging.json);
        if let Some(path) = Self::config_file() {
            println!("  Config File: {}", path.display());
        }
    }
}
