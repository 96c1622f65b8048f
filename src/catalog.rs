use async_trait::async_trait;

use crate::headers::HeaderSet;
use crate::spotify::SpotifyError;
use crate::types::{Privacy, Track};
use crate::ytmusic::YtMusicError;

/// Where playlists are read from.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    async fn fetch_tracks(
        &self,
        playlist_ref: &str,
        market: &str,
    ) -> Result<Vec<Track>, SpotifyError>;

    async fn fetch_playlist_name(&self, playlist_ref: &str) -> Result<String, SpotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongResult {
    pub video_id: String,
    pub title: String,
}

/// An authenticated session on the catalog playlists are written to.
#[async_trait]
pub trait TargetCatalog: Send + Sync {
    /// Song search, in the catalog's own ranking order.
    async fn search_songs(&self, query: &str) -> Result<Vec<SongResult>, YtMusicError>;

    /// Returns the new playlist's id.
    async fn create_playlist(
        &self,
        title: &str,
        description: &str,
        privacy: Privacy,
        video_ids: &[String],
    ) -> Result<String, YtMusicError>;
}

/// Opens a per-request [`TargetCatalog`] session from user-supplied headers.
pub trait TargetConnector: Send + Sync {
    fn connect(&self, headers: &HeaderSet) -> Result<Box<dyn TargetCatalog>, YtMusicError>;
}
