use serde::{Deserialize, Serialize};

/// A playable source track. Always has at least one artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
}

impl Track {
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or_default()
    }

    /// `"{name} {primary artist}"`, used both as search query and miss label.
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.primary_artist())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    #[serde(rename = "count")]
    pub missed_count: usize,
    #[serde(rename = "tracks")]
    pub missed_tracks: Vec<String>,
}

impl MigrationReport {
    pub fn record_miss(&mut self, label: String) {
        self.missed_count += 1;
        self.missed_tracks.push(label);
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateRequest {
    #[serde(default)]
    pub playlist_link: String,
    #[serde(default)]
    pub auth_headers: String,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub message: String,
    pub missed_tracks: MigrationReport,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privacy {
    Private,
}

impl Privacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::Private => "PRIVATE",
        }
    }
}
