use tracing::info;

use crate::catalog::TargetCatalog;
use crate::migrate::MigrationError;
use crate::observer::MigrationObserver;
use crate::types::{MigrationReport, Track};

/// Resolves each track to the first song the target search returns.
///
/// Empty results and search errors become misses; the loop never retries or
/// stops early. Fails with [`MigrationError::NoMatches`] only when nothing
/// matched at all.
pub async fn match_all(
    target: &dyn TargetCatalog,
    tracks: &[Track],
    observer: &dyn MigrationObserver,
) -> Result<(Vec<String>, MigrationReport), MigrationError> {
    let mut video_ids = Vec::with_capacity(tracks.len());
    let mut report = MigrationReport::default();

    for track in tracks {
        let query = track.label();
        match target.search_songs(&query).await {
            Ok(results) => match results.into_iter().next() {
                Some(first) => {
                    observer.track_matched(track, &first.video_id);
                    video_ids.push(first.video_id);
                }
                None => {
                    observer.track_missed(track, "no results");
                    report.record_miss(query);
                }
            },
            Err(e) => {
                observer.track_missed(track, &e.to_string());
                report.record_miss(query);
            }
        }
    }

    info!("Found {} songs on YouTube Music", video_ids.len());
    if video_ids.is_empty() {
        return Err(MigrationError::NoMatches);
    }
    Ok((video_ids, report))
}
