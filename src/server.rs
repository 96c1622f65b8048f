use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;
use crate::migrate::Migrator;
use crate::types::{CreateRequest, CreateResponse, MessageResponse};

#[derive(Clone)]
pub struct AppState {
    pub migrator: Arc<Migrator>,
}

pub fn build_router(state: AppState, allowed_origin: &str) -> Result<Router, ConfigError> {
    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|_| ConfigError::InvalidOrigin(allowed_origin.to_string()))?;
    info!("Configured CORS for frontend URL: {}", allowed_origin);

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Ok(Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route("/create", post(create_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state))
}

async fn home_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Server Online".to_string(),
    })
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn create_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected /create body: {}", rejection.body_text());
            return failure(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    info!("Processing playlist: {}", request.playlist_link);
    debug!("Auth headers length: {}", request.auth_headers.len());

    match state
        .migrator
        .migrate(&request.playlist_link, &request.auth_headers)
        .await
    {
        Ok(report) => {
            info!(
                "Playlist created successfully! Missed {} tracks",
                report.missed_count
            );
            (
                StatusCode::OK,
                Json(CreateResponse {
                    message: "Playlist created successfully!".to_string(),
                    missed_tracks: report,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Error creating playlist: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(MessageResponse { message })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SongResult, SourceCatalog, TargetCatalog, TargetConnector};
    use crate::headers::HeaderSet;
    use crate::spotify::SpotifyError;
    use crate::types::{Privacy, Track};
    use crate::ytmusic::YtMusicError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct OneTrack;

    #[async_trait]
    impl SourceCatalog for OneTrack {
        async fn fetch_tracks(&self, _: &str, _: &str) -> Result<Vec<Track>, SpotifyError> {
            Ok(vec![
                Track {
                    name: "Helicopter".to_string(),
                    artists: vec!["Bloc Party".to_string()],
                    album: "Silent Alarm".to_string(),
                },
                Track {
                    name: "Unknown".to_string(),
                    artists: vec!["Nobody".to_string()],
                    album: String::new(),
                },
            ])
        }

        async fn fetch_playlist_name(&self, _: &str) -> Result<String, SpotifyError> {
            Ok("Mix".to_string())
        }
    }

    struct Connector;

    #[async_trait]
    impl TargetCatalog for Connector {
        async fn search_songs(&self, query: &str) -> Result<Vec<SongResult>, YtMusicError> {
            if query == "Unknown Nobody" {
                return Ok(Vec::new());
            }
            Ok(vec![SongResult {
                video_id: "v".to_string(),
                title: query.to_string(),
            }])
        }

        async fn create_playlist(
            &self,
            _: &str,
            _: &str,
            _: Privacy,
            _: &[String],
        ) -> Result<String, YtMusicError> {
            Ok("PL".to_string())
        }
    }

    impl TargetConnector for Connector {
        fn connect(&self, _: &HeaderSet) -> Result<Box<dyn TargetCatalog>, YtMusicError> {
            Ok(Box::new(Connector))
        }
    }

    fn app() -> Router {
        let migrator = Migrator::new(Arc::new(OneTrack), Arc::new(Connector), "IN");
        build_router(
            AppState {
                migrator: Arc::new(migrator),
            },
            "http://localhost:5173",
        )
        .unwrap()
    }

    async fn call(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_create(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/create")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn home_reports_online() {
        let (status, body) = call(Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Server Online" }));
    }

    #[tokio::test]
    async fn create_returns_missed_tracks() {
        let body = json!({
            "playlist_link": "https://open.spotify.com/playlist/abc",
            "auth_headers": "cookie: SAPISID=x\nx-goog-authuser: 0",
        });
        let (status, body) = call(post_create(&body.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Playlist created successfully!");
        assert_eq!(
            body["missed_tracks"],
            json!({ "count": 1, "tracks": ["Unknown Nobody"] })
        );
    }

    #[tokio::test]
    async fn failures_return_message_only() {
        let body = json!({ "playlist_link": "https://open.spotify.com/playlist/abc" });
        let (status, body) = call(post_create(&body.to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "message": "Failed to setup YouTube Music API: Headers cannot be empty" })
        );
    }

    #[tokio::test]
    async fn unparseable_body_is_a_bad_request() {
        let (status, body) = call(post_create("not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn cors_preflight_allows_frontend() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/create")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );
    }
}
