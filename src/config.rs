use thiserror::Error;

pub const DEFAULT_SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_ACCOUNTS_BASE: &str = "https://accounts.spotify.com";
pub const DEFAULT_YTMUSIC_API_BASE: &str = "https://music.youtube.com/youtubei/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16, got '{0}'")]
    InvalidPort(String),

    #[error("FRONTEND_URL is not a valid origin: '{0}'")]
    InvalidOrigin(String),
}

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Pre-issued token used instead of the client credentials exchange.
    pub bearer_token: Option<String>,
    pub api_base: String,
    pub accounts_base: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            bearer_token: None,
            api_base: DEFAULT_SPOTIFY_API_BASE.to_string(),
            accounts_base: DEFAULT_SPOTIFY_ACCOUNTS_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub ytmusic_api_base: String,
    pub frontend_url: String,
    pub market: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spotify: SpotifyConfig::default(),
            ytmusic_api_base: DEFAULT_YTMUSIC_API_BASE.to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            market: "IN".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let spotify = SpotifyConfig {
            client_id: get("SPOTIFY_CLIENT_ID").or_else(|| get("SPOTIPY_CLIENT_ID")),
            client_secret: get("SPOTIFY_CLIENT_SECRET").or_else(|| get("SPOTIPY_CLIENT_SECRET")),
            bearer_token: get("SPOTIFY_BEARER_TOKEN"),
            api_base: get("SPOTIFY_API_BASE").unwrap_or(defaults.spotify.api_base),
            accounts_base: get("SPOTIFY_ACCOUNTS_BASE").unwrap_or(defaults.spotify.accounts_base),
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };

        let frontend_url = get("FRONTEND_URL").unwrap_or(defaults.frontend_url);
        if !(frontend_url.starts_with("http://") || frontend_url.starts_with("https://")) {
            return Err(ConfigError::InvalidOrigin(frontend_url));
        }

        Ok(Self {
            spotify,
            ytmusic_api_base: get("YTMUSIC_API_BASE").unwrap_or(defaults.ytmusic_api_base),
            frontend_url,
            market: get("MARKET").unwrap_or(defaults.market),
            port,
        })
    }
}
