// HTTP routes: the map page, the airport GeoJSON and the per-airport detail lookup.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::airports::{self, AIRPORTS_FILE};
use crate::config::Settings;
use crate::detail::{self, AirportQuery};
use crate::error::AppError;
use crate::places::PlacesApi;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");
const TOKEN_PLACEHOLDER: &str = "{{MAPBOX_ACCESS_TOKEN}}";

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub places: Arc<dyn PlacesApi>,
}

pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.settings.web_root);
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "ok" }))
        .route("/airports", get(get_airports))
        .route("/airport-detail", get(get_airport_detail))
        .fallback_service(assets)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    // JSON string literal, so the token is safe inside the page script.
    let token = serde_json::to_string(&state.settings.mapbox_access_token)?;
    Ok(Html(INDEX_TEMPLATE.replace(TOKEN_PLACEHOLDER, &token)))
}

async fn get_airports(State(state): State<AppState>) -> Result<Response, AppError> {
    let path = state.settings.web_root.join(AIRPORTS_FILE);
    let collection = tokio::task::spawn_blocking(move || airports::load_file(&path))
        .await
        .map_err(|e| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, e), None))??;

    info!(features = collection.features.len(), "serving airports");
    Ok(([(CONTENT_TYPE, "application/geo+json")], Json(collection)).into_response())
}

async fn get_airport_detail(
    State(state): State<AppState>,
    Query(query): Query<AirportQuery>,
) -> Result<Json<detail::AirportDetail>, AppError> {
    let found = detail::enrich(state.places.as_ref(), &query, &state.settings.google_api_key).await?;
    let detail = found.found_or(|| format!("no place found for '{}'", query.name))?;
    Ok(Json(detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::PHOTO_MAX_WIDTH;
    use crate::places::{
        DetailsRequest, DetailsResponse, NearbyResult, NearbySearchRequest, NearbySearchResponse, PhotoRequest,
        PhotoResponse, PlaceDetails, PlacesStatus,
    };
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::path::PathBuf;
    use tower::ServiceExt;

    // Knows exactly one airport, has no photos for it.
    struct OnePlace;

    #[async_trait]
    impl PlacesApi for OnePlace {
        async fn nearby_search(&self, request: &NearbySearchRequest<'_>) -> Result<NearbySearchResponse, AppError> {
            if request.name != "Goroka Airport" {
                return Ok(NearbySearchResponse {
                    status: Some(PlacesStatus::ZeroResults),
                    ..Default::default()
                });
            }
            Ok(NearbySearchResponse {
                status: Some(PlacesStatus::Ok),
                results: vec![NearbyResult {
                    place_id: "ChIJ-goroka".to_string(),
                    ..Default::default()
                }],
                error_message: None,
            })
        }

        async fn details(&self, _request: &DetailsRequest<'_>) -> Result<DetailsResponse, AppError> {
            Ok(DetailsResponse {
                status: Some(PlacesStatus::Ok),
                result: Some(PlaceDetails {
                    formatted_address: Some("Goroka, Papua New Guinea".to_string()),
                    ..Default::default()
                }),
                error_message: None,
            })
        }

        async fn photo(&self, request: &PhotoRequest<'_>) -> Result<PhotoResponse, AppError> {
            assert_eq!(request.max_width, PHOTO_MAX_WIDTH);
            Ok(PhotoResponse::default())
        }
    }

    fn app_with_root(web_root: PathBuf) -> Router {
        router(AppState {
            settings: Arc::new(Settings {
                web_root,
                google_api_key: "key".to_string(),
                mapbox_access_token: "pk.\"quoted\"".to_string(),
            }),
            places: Arc::new(OnePlace),
        })
    }

    fn app() -> Router {
        app_with_root(PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/wwwroot")))
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn airports_are_served_as_feature_collection() {
        let (status, body) = fetch(app(), "/airports").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        let goroka = &json["features"][0];
        assert_eq!(goroka["properties"]["name"], "Goroka Airport");
        assert_eq!(goroka["properties"]["iataCode"], "GKA");
        assert_eq!(goroka["geometry"]["coordinates"], serde_json::json!([-6.081689, 145.391881]));
    }

    #[tokio::test]
    async fn missing_airports_file_is_a_server_error() {
        let (status, _) = fetch(app_with_root(PathBuf::from("/definitely/not/here")), "/airports").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn airport_detail_found() {
        let (status, body) = fetch(
            app(),
            "/airport-detail?name=Goroka%20Airport&latitude=-6.081689&longitude=145.391881",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["address"], "Goroka, Papua New Guinea");
        assert_eq!(json["photo"], serde_json::Value::Null);
        assert_eq!(json["photoCredit"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn unknown_airport_is_a_bad_request() {
        let (status, _) = fetch(app(), "/airport-detail?name=Nowhere&latitude=1&longitude=2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unparseable_coordinates_are_rejected() {
        let (status, _) = fetch(app(), "/airport-detail?name=Goroka&latitude=north&longitude=2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn index_embeds_escaped_mapbox_token() {
        let (status, body) = fetch(app(), "/").await;
        assert_eq!(status, StatusCode::OK);

        let page = String::from_utf8(body).unwrap();
        assert!(page.contains(r#""pk.\"quoted\"""#));
        assert!(!page.contains(TOKEN_PLACEHOLDER));
    }

    #[tokio::test]
    async fn health_and_static_files() {
        let (status, body) = fetch(app(), "/health").await;
        assert_eq!((status, body.as_slice()), (StatusCode::OK, b"ok".as_slice()));

        let (status, body) = fetch(app(), "/airports.dat").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).starts_with("1,"));
    }
}
