// Client for the Google Places web service: nearby search, place details and photos.

use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::AppError;

pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const DETAIL_FIELDS: &str = "formatted_address,international_phone_number,website";

lazy_static! {
    static ref HTTP_CLIENT: reqwest::Client = reqwest::Client::builder()
        .user_agent(APP_USER_AGENT)
        .build()
        .unwrap_or_default();
}

/// Status field every Places JSON response carries.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacesStatus {
    Ok,
    ZeroResults,
    NotFound,
    InvalidRequest,
    OverQueryLimit,
    RequestDenied,
    UnknownError,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    // Places expects "lat,lng".
    fn to_query(self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone)]
pub struct NearbySearchRequest<'a> {
    pub key: &'a str,
    pub name: &'a str,
    pub location: Location,
    pub radius: u32,
}

#[derive(Debug, Clone)]
pub struct DetailsRequest<'a> {
    pub key: &'a str,
    pub place_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct PhotoRequest<'a> {
    pub key: &'a str,
    pub photo_reference: &'a str,
    pub max_width: u32,
}

#[derive(Deserialize, Debug, Default)]
pub struct NearbySearchResponse {
    pub status: Option<PlacesStatus>,
    #[serde(default)]
    pub results: Vec<NearbyResult>,
    pub error_message: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct NearbyResult {
    pub place_id: String,
    pub name: Option<String>,
    pub photos: Option<Vec<PlacePhoto>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PlacePhoto {
    pub photo_reference: String,
    #[serde(default)]
    pub html_attributions: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct DetailsResponse {
    pub status: Option<PlacesStatus>,
    pub result: Option<PlaceDetails>,
    pub error_message: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PlaceDetails {
    pub formatted_address: Option<String>,
    pub international_phone_number: Option<String>,
    pub website: Option<String>,
}

/// Raw image bytes, `None` when the service sent nothing usable.
#[derive(Debug, Default)]
pub struct PhotoResponse {
    pub buffer: Option<Vec<u8>>,
}

#[async_trait]
pub trait PlacesApi: Send + Sync {
    async fn nearby_search(&self, request: &NearbySearchRequest<'_>) -> Result<NearbySearchResponse, AppError>;

    async fn details(&self, request: &DetailsRequest<'_>) -> Result<DetailsResponse, AppError>;

    async fn photo(&self, request: &PhotoRequest<'_>) -> Result<PhotoResponse, AppError>;
}

#[derive(Clone)]
pub struct GooglePlacesClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for GooglePlacesClient {
    fn default() -> Self {
        Self::new(DEFAULT_PLACES_BASE_URL)
    }
}

impl GooglePlacesClient {
    pub fn new(base_url: &str) -> Self {
        GooglePlacesClient {
            http: HTTP_CLIENT.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, what: &str, url: &str) -> Result<T, AppError> {
        let response = self.http.get(url).send().await.map_err(AppError::Network)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(AppError::Api(format!(
                "Places {} request failed (Status: {}). Details: {}",
                what, status, text
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Api(format!("Failed to parse JSON response from Places {}: {}", what, e)))
    }
}

#[async_trait]
impl PlacesApi for GooglePlacesClient {
    async fn nearby_search(&self, request: &NearbySearchRequest<'_>) -> Result<NearbySearchResponse, AppError> {
        let url = format!(
            "{}/nearbysearch/json?location={}&radius={}&name={}&key={}",
            self.base_url,
            urlencoding::encode(&request.location.to_query()),
            request.radius,
            urlencoding::encode(request.name),
            urlencoding::encode(request.key),
        );
        debug!(name = request.name, location = ?request.location, "nearby search");
        let response: NearbySearchResponse = self.get_json("nearby search", &url).await?;
        if response.status != Some(PlacesStatus::Ok) {
            info!(status = ?response.status, message = ?response.error_message, "nearby search returned no usable result");
        }
        Ok(response)
    }

    async fn details(&self, request: &DetailsRequest<'_>) -> Result<DetailsResponse, AppError> {
        let url = format!(
            "{}/details/json?place_id={}&fields={}&key={}",
            self.base_url,
            urlencoding::encode(request.place_id),
            urlencoding::encode(DETAIL_FIELDS),
            urlencoding::encode(request.key),
        );
        debug!(place_id = request.place_id, "place details");
        let response: DetailsResponse = self.get_json("details", &url).await?;
        if response.status != Some(PlacesStatus::Ok) {
            info!(status = ?response.status, message = ?response.error_message, "place details returned no usable result");
        }
        Ok(response)
    }

    async fn photo(&self, request: &PhotoRequest<'_>) -> Result<PhotoResponse, AppError> {
        let url = format!(
            "{}/photo?maxwidth={}&photo_reference={}&key={}",
            self.base_url,
            request.max_width,
            urlencoding::encode(request.photo_reference),
            urlencoding::encode(request.key),
        );
        debug!(max_width = request.max_width, "place photo");
        let response = self.http.get(&url).send().await.map_err(AppError::Network)?;
        if !response.status().is_success() {
            info!(status = %response.status(), "place photo unavailable");
            return Ok(PhotoResponse::default());
        }

        let bytes = response.bytes().await.map_err(AppError::Network)?;
        Ok(PhotoResponse {
            buffer: (!bytes.is_empty()).then(|| bytes.to_vec()),
        })
    }
}
