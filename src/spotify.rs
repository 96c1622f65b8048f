use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::SourceCatalog;
use crate::config::SpotifyConfig;
use crate::types::Track;

const PAGE_LIMIT: u32 = 100;

static PLAYLIST_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/playlist/([^?#/\s]+)").expect("Invalid playlist regex")
});

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error(
        "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET must be set (or use SPOTIFY_BEARER_TOKEN)"
    )]
    MissingCredentials,

    #[error("Failed to get access token: {status} - {body}")]
    TokenExchange { status: u16, body: String },

    #[error("Could not find a playlist id in '{0}'")]
    InvalidReference(String),

    #[error("Failed to fetch {what}: {status}")]
    Upstream { what: &'static str, status: u16 },

    #[error("Spotify request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Clone)]
struct TokenCache {
    access_token: String,
    expires_at: Instant,
}

pub struct SpotifyClient {
    config: SpotifyConfig,
    client: reqwest::Client,
    token_cache: Mutex<Option<TokenCache>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    track: Option<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    name: Option<String>,
    #[serde(default)]
    artists: Vec<NamedRef>,
    album: Option<NamedRef>,
    #[serde(default)]
    is_local: bool,
    restrictions: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistMeta {
    name: String,
}

/// Pulls the playlist id out of an `open.spotify.com/playlist/{id}?si=...` link.
pub fn extract_playlist_id(playlist_ref: &str) -> Result<String, SpotifyError> {
    PLAYLIST_ID_REGEX
        .captures(playlist_ref)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| SpotifyError::InvalidReference(playlist_ref.to_string()))
}

impl SpotifyClient {
    pub fn new(config: SpotifyConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            token_cache: Mutex::new(None),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.config.bearer_token.is_some()
            || (self.config.client_id.is_some() && self.config.client_secret.is_some())
    }

    async fn get_access_token(&self) -> Result<String, SpotifyError> {
        if let Some(ref token) = self.config.bearer_token {
            warn!("Using SPOTIFY_BEARER_TOKEN override; it expires after about an hour");
            return Ok(token.clone());
        }

        let (client_id, client_secret) =
            match (&self.config.client_id, &self.config.client_secret) {
                (Some(id), Some(secret)) => (id, secret),
                _ => return Err(SpotifyError::MissingCredentials),
            };

        let mut cache = self.token_cache.lock().await;
        if let Some(ref cached) = *cache {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        debug!("Requesting Spotify access token");
        let url = format!("{}/api/token", self.config.accounts_base);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ];

        let response = self.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::TokenExchange { status, body });
        }

        let token_response: TokenResponse = response.json().await?;

        // Refresh a minute early
        let expires_at =
            Instant::now() + Duration::from_secs(token_response.expires_in.saturating_sub(60));
        *cache = Some(TokenCache {
            access_token: token_response.access_token.clone(),
            expires_at,
        });

        info!("Obtained Spotify access token");
        Ok(token_response.access_token)
    }

    pub async fn get_all_tracks(
        &self,
        playlist_ref: &str,
        market: &str,
    ) -> Result<Vec<Track>, SpotifyError> {
        let playlist_id = extract_playlist_id(playlist_ref)?;
        let access_token = self.get_access_token().await?;

        info!("Fetching tracks of playlist {} for market {}", playlist_id, market);

        let mut next = Some(format!(
            "{}/playlists/{}/tracks?market={}&limit={}",
            self.config.api_base,
            urlencoding::encode(&playlist_id),
            urlencoding::encode(market),
            PAGE_LIMIT
        ));
        let mut tracks = Vec::new();
        let mut page_count = 0;

        while let Some(url) = next.take() {
            page_count += 1;

            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", access_token))
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let text = response.text().await.unwrap_or_default();
                warn!("Failed to fetch tracks. Status: {}, Response: {}", status, text);
                return Err(SpotifyError::Upstream {
                    what: "tracks",
                    status,
                });
            }

            let page: PlaylistPage = response.json().await?;
            debug!("Got {} items in page {}", page.items.len(), page_count);

            tracks.extend(page.items.into_iter().filter_map(into_track));

            next = page.next.filter(|n| !n.is_empty() && n != "null");
        }

        info!(
            "Fetched {} tracks from playlist {} in {} page(s)",
            tracks.len(),
            playlist_id,
            page_count
        );
        Ok(tracks)
    }

    pub async fn get_playlist_name(&self, playlist_ref: &str) -> Result<String, SpotifyError> {
        let playlist_id = extract_playlist_id(playlist_ref)?;
        let access_token = self.get_access_token().await?;

        let url = format!(
            "{}/playlists/{}",
            self.config.api_base,
            urlencoding::encode(&playlist_id)
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .query(&[("fields", "name")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            warn!("Failed to fetch playlist name. Status: {}, Response: {}", status, text);
            return Err(SpotifyError::Upstream {
                what: "playlist name",
                status,
            });
        }

        let meta: PlaylistMeta = response.json().await?;
        info!("Playlist name: {}", meta.name);
        Ok(meta.name)
    }
}

#[async_trait]
impl SourceCatalog for SpotifyClient {
    async fn fetch_tracks(
        &self,
        playlist_ref: &str,
        market: &str,
    ) -> Result<Vec<Track>, SpotifyError> {
        self.get_all_tracks(playlist_ref, market).await
    }

    async fn fetch_playlist_name(&self, playlist_ref: &str) -> Result<String, SpotifyError> {
        self.get_playlist_name(playlist_ref).await
    }
}

/// Local files, restricted tracks, removed entries and artist-less items
/// cannot be transferred and are dropped without counting as misses.
fn into_track(item: PlaylistItem) -> Option<Track> {
    let track = item.track?;
    if track.is_local || is_truthy(track.restrictions.as_ref()) {
        debug!(
            "Skipping track {:?}: local={}, restricted={}",
            track.name,
            track.is_local,
            track.restrictions.is_some()
        );
        return None;
    }

    let artists: Vec<String> = track.artists.into_iter().filter_map(|a| a.name).collect();
    if artists.is_empty() {
        debug!("Skipping track {:?}: no artists", track.name);
        return None;
    }

    Some(Track {
        name: track.name.unwrap_or_default(),
        artists,
        album: track.album.and_then(|a| a.name).unwrap_or_default(),
    })
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
    }
}
