//! HTTP surface for the feed (axum).
//!
//! Authentication is handled upstream; the authenticated user arrives in the
//! `x-user-id` header.

use crate::error::FeedError;
use crate::feed::FeedQuery;
use crate::service::FeedService;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

pub const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FeedService>,
}

/// Envelope for non-feed responses
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub success: bool,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("missing x-user-id header")]
    MissingUser,

    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingUser => StatusCode::UNAUTHORIZED,
            ApiError::Feed(err) => match err {
                FeedError::Validation(_) => StatusCode::BAD_REQUEST,
                FeedError::Dependency { .. } => StatusCode::BAD_GATEWAY,
                FeedError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                FeedError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Feed(FeedError::Dependency { .. }) => "A dependency failed while building the feed.".to_string(),
            ApiError::Feed(FeedError::Internal(_)) => "Internal server error.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        if code.is_server_error() {
            error!(error = ?self, "home feed request failed");
        }
        let body = MessageBody {
            success: false,
            message: self.public_message(),
        };
        (code, Json(body)).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/home", get(home))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// GET /api/health
async fn health() -> impl IntoResponse {
    Json(MessageBody {
        success: true,
        message: "OK".to_string(),
    })
}

/// GET /api/home?lat=&lng=&page=&limit=
async fn home(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingUser)?;

    let response = state.service.home(user_id, &query).await?;

    Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PlacesRecordBuilder;
    use crate::clock::FixedClock;
    use crate::models::{GeoPoint, Venue};
    use crate::provider::VenueProvider;
    use crate::service::{FeedDependencies, FeedSettings};
    use crate::store::{MemoryCatalogStore, MemoryFavoriteStore};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use http_body_util::BodyExt;
    use tower::ServiceExt; // oneshot

    struct FixtureProvider {
        fail: bool,
    }

    #[async_trait]
    impl VenueProvider for FixtureProvider {
        async fn fetch_nearby(&self, _origin: GeoPoint, _radius_meters: f64) -> anyhow::Result<Vec<Venue>> {
            if self.fail {
                return Err(anyhow!("provider quota exceeded"));
            }
            Ok((0..6)
                .map(|i| Venue {
                    place_id: format!("place-{}", i),
                    name: format!("Bar {}", i),
                    vicinity: Some("Main St".to_string()),
                    location: None,
                    types: vec!["bar".to_string()],
                    rating: Some(4.0),
                    user_ratings_total: Some(60 - i),
                    photos: vec![],
                    weekday_text: vec![],
                })
                .collect())
        }

        fn provider_name(&self) -> &str {
            "fixture"
        }
    }

    fn make_router(fail: bool) -> Router {
        let service = FeedService::new(
            FeedDependencies {
                provider: Arc::new(FixtureProvider { fail }),
                catalog: Arc::new(MemoryCatalogStore::new()),
                builder: Arc::new(PlacesRecordBuilder::new()),
                favorites: Arc::new(MemoryFavoriteStore::new()),
                clock: Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 10, 17, 12, 0, 0).unwrap())),
            },
            FeedSettings::default(),
        );
        build_router(AppState {
            service: Arc::new(service),
        })
    }

    async fn call(router: Router, uri: &str, user: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        let resp = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .expect("oneshot failed");
        let status = resp.status();
        let bytes = resp.into_body().collect().await.expect("body collect failed").to_bytes();
        (status, serde_json::from_slice(&bytes).expect("body is not valid JSON"))
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = call(make_router(false), "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn test_home_with_zero_coordinates() {
        let (status, json) = call(make_router(false), "/api/home?lat=0&lng=0&limit=1&page=2", Some("user-1")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Bars retrieved successfully.");
        assert_eq!(json["data"]["top"].as_array().unwrap().len(), 4);
        assert_eq!(json["data"]["top"][0]["barType"], "Bar");

        let bars = json["data"]["bars"].as_array().unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0]["name"], "Bar 5");
        assert_eq!(bars[0]["isFavorite"], false);

        assert_eq!(json["pagination"]["page"], 2);
        assert_eq!(json["pagination"]["limit"], 1);
        assert_eq!(json["pagination"]["total"], 2);
        assert_eq!(json["pagination"]["totalPages"], 2);
    }

    #[tokio::test]
    async fn test_missing_coordinates_is_bad_request() {
        let (status, json) = call(make_router(false), "/api/home?lat=12.5", Some("user-1")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Latitude and longitude are required.");
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthorized() {
        let (status, json) = call(make_router(false), "/api/home?lat=1&lng=1", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway() {
        let (status, json) = call(make_router(true), "/api/home?lat=1&lng=1", Some("user-1")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["message"], "A dependency failed while building the feed.");
    }
}
