//! End-to-end migrations against in-process fakes of both catalogs.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tunetransfer::config::SpotifyConfig;
use tunetransfer::migrate::{MigrationError, Migrator};
use tunetransfer::spotify::SpotifyClient;
use tunetransfer::ytmusic::YtMusicConnector;

const HEADERS: &str = "cookie: __Secure-3PAPISID=abc; SID=1\nx-goog-authuser: 0";

#[derive(Clone, Default)]
struct Catalogs {
    playlist_items: Arc<Vec<Value>>,
    findable: Arc<HashSet<String>>,
    searches: Arc<Mutex<Vec<String>>>,
    cookies: Arc<Mutex<Vec<String>>>,
    created: Arc<Mutex<Vec<Value>>>,
}

async fn token() -> Json<Value> {
    Json(json!({ "access_token": "tok", "token_type": "Bearer", "expires_in": 3600 }))
}

async fn tracks(State(c): State<Catalogs>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if id != "abc123" {
        return (StatusCode::NOT_FOUND, Json(json!({})));
    }
    (
        StatusCode::OK,
        Json(json!({ "items": c.playlist_items.as_slice(), "next": null })),
    )
}

async fn playlist(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({ "name": "Road Trip" }))
}

async fn search(
    State(c): State<Catalogs>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let query = body["query"].as_str().unwrap_or_default().to_string();
    if let Some(cookie) = headers.get("cookie").and_then(|h| h.to_str().ok()) {
        c.cookies.lock().unwrap().push(cookie.to_string());
    }
    c.searches.lock().unwrap().push(query.clone());

    let items: Vec<Value> = if c.findable.contains(&query) {
        vec![json!({
            "musicResponsiveListItemRenderer": {
                "playlistItemData": { "videoId": format!("yt-{}", query.len()) }
            }
        })]
    } else {
        Vec::new()
    };
    Json(json!({
        "contents": { "tabbedSearchResultsRenderer": { "tabs": [{ "tabRenderer": { "content": {
            "sectionListRenderer": { "contents": [{ "musicShelfRenderer": { "contents": items } }] }
        } } }] } }
    }))
}

async fn create(State(c): State<Catalogs>, Json(body): Json<Value>) -> Json<Value> {
    c.created.lock().unwrap().push(body);
    Json(json!({ "playlistId": "PLnew" }))
}

async fn setup(items: Vec<Value>, findable: &[&str]) -> (Migrator, Catalogs) {
    let catalogs = Catalogs {
        playlist_items: Arc::new(items),
        findable: Arc::new(findable.iter().map(|s| s.to_string()).collect()),
        ..Catalogs::default()
    };
    let app = Router::new()
        .route("/api/token", post(token))
        .route("/v1/playlists/:id/tracks", get(tracks))
        .route("/v1/playlists/:id", get(playlist))
        .route("/youtubei/v1/search", post(search))
        .route("/youtubei/v1/playlist/create", post(create))
        .with_state(catalogs.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let spotify = SpotifyClient::new(SpotifyConfig {
        client_id: Some("id".to_string()),
        client_secret: Some("secret".to_string()),
        bearer_token: None,
        api_base: format!("{}/v1", base),
        accounts_base: base.clone(),
    });
    let migrator = Migrator::new(
        Arc::new(spotify),
        Arc::new(YtMusicConnector::new(format!("{}/youtubei/v1", base))),
        "IN",
    );
    (migrator, catalogs)
}

fn item(name: &str, artist: &str, is_local: bool) -> Value {
    json!({
        "track": {
            "name": name,
            "artists": [{ "name": artist }],
            "album": { "name": "Album" },
            "is_local": is_local
        }
    })
}

#[tokio::test]
async fn local_tracks_are_skipped_and_the_rest_migrated() {
    let (migrator, catalogs) = setup(
        vec![
            item("Helicopter", "Bloc Party", false),
            item("Voice Memo", "Me", true),
            item("Banquet", "Bloc Party", false),
        ],
        &["Helicopter Bloc Party", "Banquet Bloc Party"],
    )
    .await;

    let report = migrator
        .migrate("https://open.spotify.com/playlist/abc123?si=xyz", HEADERS)
        .await
        .unwrap();

    assert_eq!(report.missed_count, 0);
    assert!(report.missed_tracks.is_empty());
    assert_eq!(
        *catalogs.searches.lock().unwrap(),
        vec!["Helicopter Bloc Party", "Banquet Bloc Party"]
    );

    let created = catalogs.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["title"], "Road Trip");
    assert_eq!(created[0]["privacyStatus"], "PRIVATE");
    assert_eq!(created[0]["videoIds"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn decoded_debug_block_is_stripped_before_setup() {
    let (migrator, catalogs) = setup(
        vec![item("Helicopter", "Bloc Party", false)],
        &["Helicopter Bloc Party"],
    )
    .await;

    let raw = "x-goog-authuser\n0\nx-client-data\nCIa2yQEI\nDecoded:\n\
               message ClientVariations {\n  // Active client experiment variation IDs.\n\
               repeated int32 variation_id = [3300134, 3313321];\n}\n\
               cookie\n__Secure-3PAPISID=abc; SID=1\n";

    let report = migrator
        .migrate("https://open.spotify.com/playlist/abc123", raw)
        .await
        .unwrap();

    assert_eq!(report.missed_count, 0);
    assert_eq!(
        *catalogs.cookies.lock().unwrap(),
        vec!["__Secure-3PAPISID=abc; SID=1"]
    );
    assert_eq!(catalogs.created.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn nothing_found_fails_without_creating_a_playlist() {
    let (migrator, catalogs) = setup(
        vec![item("Obscure", "Nobody", false), item("Rare", "Nobody", false)],
        &[],
    )
    .await;

    let err = migrator
        .migrate("https://open.spotify.com/playlist/abc123", HEADERS)
        .await
        .unwrap_err();

    assert!(matches!(err, MigrationError::NoMatches));
    assert_eq!(err.to_string(), "No songs found on YouTube Music");
    assert_eq!(catalogs.searches.lock().unwrap().len(), 2);
    assert!(catalogs.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_playlist_surfaces_upstream_status() {
    let (migrator, catalogs) = setup(vec![], &[]).await;

    let err = migrator
        .migrate("https://open.spotify.com/playlist/gone", HEADERS)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Failed to fetch tracks: 404");
    assert!(catalogs.searches.lock().unwrap().is_empty());
}
