use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use sha1::{Digest, Sha1};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{SongResult, TargetCatalog, TargetConnector};
use crate::headers::HeaderSet;
use crate::types::Privacy;

pub const ORIGIN: &str = "https://music.youtube.com";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:88.0) Gecko/20100101 Firefox/88.0";

/// Search params selecting the "Songs" filter.
const SONGS_FILTER_PARAMS: &str = "EgWKAQIIAWoMEA4QChADEAQQCRAF";

const REQUIRED_HEADERS: [&str; 2] = ["cookie", "x-goog-authuser"];
const IGNORED_HEADERS: [&str; 3] = ["host", "content-length", "accept-encoding"];
const SAPISID_COOKIES: [&str; 2] = ["__Secure-3PAPISID", "SAPISID"];

#[derive(Debug, Error)]
pub enum YtMusicError {
    #[error("The following entries are missing in your headers: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    #[error("Your cookie is missing the required value __Secure-3PAPISID")]
    MissingSapisid,

    #[error("Header '{0}' is not a valid HTTP header")]
    InvalidHeader(String),

    #[error("YouTube Music {endpoint} request failed: {status}")]
    Upstream { endpoint: &'static str, status: u16 },

    #[error("Unexpected YouTube Music response: {0}")]
    UnexpectedResponse(String),

    #[error("YouTube Music request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Opens browser-authenticated sessions against the InnerTube API.
pub struct YtMusicConnector {
    base_url: String,
}

impl YtMusicConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl TargetConnector for YtMusicConnector {
    fn connect(&self, headers: &HeaderSet) -> Result<Box<dyn TargetCatalog>, YtMusicError> {
        let session = YtMusicSession::from_headers(&self.base_url, headers)?;
        Ok(Box::new(session))
    }
}

/// One user's authenticated session. Lives only as long as the request that
/// created it.
pub struct YtMusicSession {
    base_url: String,
    client: reqwest::Client,
    sapisid: String,
}

impl std::fmt::Debug for YtMusicSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YtMusicSession")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl YtMusicSession {
    pub fn from_headers(base_url: &str, headers: &HeaderSet) -> Result<Self, YtMusicError> {
        let request_headers = browser_headers(headers)?;

        let cookie = request_headers
            .get("cookie")
            .and_then(|c| c.to_str().ok())
            .unwrap_or_default();
        let sapisid = sapisid_from_cookie(cookie).ok_or(YtMusicError::MissingSapisid)?;

        debug!(
            "Built YouTube Music session with {} headers, cookie length {}",
            request_headers.len(),
            cookie.len()
        );

        let client = reqwest::Client::builder()
            .default_headers(request_headers)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            sapisid,
        })
    }

    async fn send(&self, endpoint: &'static str, mut body: Value) -> Result<Value, YtMusicError> {
        body["context"] = client_context(time::OffsetDateTime::now_utc().date());

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let authorization = sapisid_hash(timestamp, &self.sapisid, ORIGIN);

        let response = self
            .client
            .post(format!("{}/{}", self.base_url, endpoint))
            .query(&[("alt", "json"), ("prettyPrint", "false")])
            .header(AUTHORIZATION, authorization)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            debug!("YouTube Music {} returned {}: {}", endpoint, status, text);
            return Err(YtMusicError::Upstream { endpoint, status });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TargetCatalog for YtMusicSession {
    async fn search_songs(&self, query: &str) -> Result<Vec<SongResult>, YtMusicError> {
        let body = json!({
            "query": query,
            "params": SONGS_FILTER_PARAMS,
        });
        let response = self.send("search", body).await?;
        Ok(parse_song_results(&response))
    }

    async fn create_playlist(
        &self,
        title: &str,
        description: &str,
        privacy: Privacy,
        video_ids: &[String],
    ) -> Result<String, YtMusicError> {
        let mut body = json!({
            "title": title,
            "description": description,
            "privacyStatus": privacy.as_str(),
        });
        if !video_ids.is_empty() {
            body["videoIds"] = json!(video_ids);
        }

        let response = self.send("playlist/create", body).await?;
        let playlist_id = response
            .get("playlistId")
            .and_then(|id| id.as_str())
            .ok_or_else(|| YtMusicError::UnexpectedResponse("no playlistId".to_string()))?;

        info!(
            "Created YouTube Music playlist {} with {} songs",
            playlist_id,
            video_ids.len()
        );
        Ok(playlist_id.to_string())
    }
}

/// Lowercases names, drops headers the browser owns, and pins the ones the
/// API expects from a desktop web client.
fn browser_headers(headers: &HeaderSet) -> Result<HeaderMap, YtMusicError> {
    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|required| headers.get(required).is_none())
        .map(|required| required.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(YtMusicError::MissingHeaders(missing));
    }

    let mut map = HeaderMap::new();
    for (name, value) in headers.iter() {
        let name = name.to_ascii_lowercase();
        if name.starts_with(':') || name.starts_with("sec") || IGNORED_HEADERS.contains(&name.as_str())
        {
            continue;
        }
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| YtMusicError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| YtMusicError::InvalidHeader(name.clone()))?;
        map.insert(header_name, header_value);
    }

    map.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    map.insert("accept", HeaderValue::from_static("*/*"));
    map.insert("content-type", HeaderValue::from_static("application/json"));
    map.insert("origin", HeaderValue::from_static(ORIGIN));
    Ok(map)
}

pub fn sapisid_from_cookie(cookie: &str) -> Option<String> {
    let pairs: Vec<(&str, &str)> = cookie
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .collect();

    SAPISID_COOKIES.iter().find_map(|wanted| {
        pairs
            .iter()
            .find(|(name, value)| name == wanted && !value.is_empty())
            .map(|(_, value)| value.to_string())
    })
}

pub fn sapisid_hash(timestamp: u64, sapisid: &str, origin: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{} {} {}", timestamp, sapisid, origin).as_bytes());
    format!(
        "SAPISIDHASH {}_{}",
        timestamp,
        hex::encode(hasher.finalize())
    )
}

fn client_context(today: time::Date) -> Value {
    json!({
        "client": {
            "clientName": "WEB_REMIX",
            "clientVersion": client_version(today),
            "hl": "en",
        },
        "user": {},
    })
}

fn client_version(today: time::Date) -> String {
    format!(
        "1.{:04}{:02}{:02}.01.00",
        today.year(),
        u8::from(today.month()),
        today.day()
    )
}

/// Songs from the shelves of a filtered search response. Entries without a
/// playable video id are skipped.
pub fn parse_song_results(response: &Value) -> Vec<SongResult> {
    let sections = response
        .pointer("/contents/tabbedSearchResultsRenderer/tabs/0/tabRenderer/content")
        .or_else(|| response.get("contents"))
        .and_then(|content| content.pointer("/sectionListRenderer/contents"))
        .and_then(|c| c.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[]);

    sections
        .iter()
        .filter_map(|section| section.pointer("/musicShelfRenderer/contents"))
        .filter_map(|c| c.as_array())
        .flatten()
        .filter_map(|item| item.get("musicResponsiveListItemRenderer"))
        .filter_map(|data| {
            let video_id = data
                .pointer("/playlistItemData/videoId")
                .or_else(|| {
                    data.pointer(
                        "/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId",
                    )
                })
                .and_then(|v| v.as_str())?;
            let title = data
                .pointer("/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text")
                .and_then(|t| t.as_str())
                .unwrap_or_default();
            Some(SongResult {
                video_id: video_id.to_string(),
                title: title.to_string(),
            })
        })
        .collect()
}
