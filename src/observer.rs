use tracing::{info, warn};

use crate::types::{MigrationReport, Track};

/// Migration progress hooks. Every method defaults to a no-op.
pub trait MigrationObserver: Send + Sync {
    fn tracks_fetched(&self, _playlist_name: &str, _count: usize) {}

    fn track_matched(&self, _track: &Track, _video_id: &str) {}

    fn track_missed(&self, _track: &Track, _reason: &str) {}

    fn playlist_created(&self, _playlist_id: &str, _report: &MigrationReport) {}
}

/// Emits progress as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MigrationObserver for TracingObserver {
    fn tracks_fetched(&self, playlist_name: &str, count: usize) {
        info!("Fetched {} tracks from '{}'", count, playlist_name);
    }

    fn track_matched(&self, track: &Track, video_id: &str) {
        tracing::debug!("Matched '{}' -> {}", track.label(), video_id);
    }

    fn track_missed(&self, track: &Track, reason: &str) {
        warn!("{} not found on YouTube Music: {}", track.label(), reason);
    }

    fn playlist_created(&self, playlist_id: &str, report: &MigrationReport) {
        info!(
            "Created playlist {} ({} tracks missed)",
            playlist_id, report.missed_count
        );
    }
}
