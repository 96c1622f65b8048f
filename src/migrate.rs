use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::catalog::{SourceCatalog, TargetConnector};
use crate::headers::{normalize, HeaderError};
use crate::matcher::match_all;
use crate::observer::{MigrationObserver, TracingObserver};
use crate::spotify::SpotifyError;
use crate::types::{MigrationReport, Privacy};
use crate::ytmusic::YtMusicError;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Headers(#[from] HeaderError),

    #[error(transparent)]
    Session(#[from] YtMusicError),
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Failed to setup YouTube Music API: {0}")]
    Setup(#[source] SetupError),

    #[error(transparent)]
    Source(#[from] SpotifyError),

    #[error("No songs found on YouTube Music")]
    NoMatches,

    #[error(transparent)]
    Target(#[from] YtMusicError),
}

/// Runs one playlist migration from start to finish.
///
/// Every call gets its own target session; nothing is shared between calls
/// except the source client.
pub struct Migrator {
    source: Arc<dyn SourceCatalog>,
    target: Arc<dyn TargetConnector>,
    observer: Arc<dyn MigrationObserver>,
    market: String,
}

impl Migrator {
    pub fn new(
        source: Arc<dyn SourceCatalog>,
        target: Arc<dyn TargetConnector>,
        market: impl Into<String>,
    ) -> Self {
        Self {
            source,
            target,
            observer: Arc::new(TracingObserver),
            market: market.into(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn MigrationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub async fn migrate(
        &self,
        playlist_ref: &str,
        raw_credentials: &str,
    ) -> Result<MigrationReport, MigrationError> {
        let headers = normalize(raw_credentials)
            .map_err(|e| MigrationError::Setup(SetupError::from(e)))?;
        let session = self
            .target
            .connect(&headers)
            .map_err(|e| MigrationError::Setup(SetupError::from(e)))?;

        let tracks = self.source.fetch_tracks(playlist_ref, &self.market).await?;
        let name = self.source.fetch_playlist_name(playlist_ref).await?;
        self.observer.tracks_fetched(&name, tracks.len());

        let (video_ids, report) =
            match_all(session.as_ref(), &tracks, self.observer.as_ref()).await?;

        info!(
            "Creating YouTube Music playlist: {} with {} songs",
            name,
            video_ids.len()
        );
        let playlist_id = session
            .create_playlist(&name, "", Privacy::Private, &video_ids)
            .await?;
        self.observer.playlist_created(&playlist_id, &report);

        Ok(report)
    }
}
