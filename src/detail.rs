// Airport detail lookup: nearby search -> place details -> photo.
// Each stage needs the previous one's output, so they run strictly in order.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::places::{
    DetailsRequest, DetailsResponse, Location, NearbySearchRequest, NearbySearchResponse, PhotoRequest,
    PhotoResponse, PlacesApi, PlacesStatus,
};

pub const SEARCH_RADIUS_METERS: u32 = 1000;
pub const PHOTO_MAX_WIDTH: u32 = 400;

#[derive(Deserialize, Debug, Clone)]
pub struct AirportQuery {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AirportDetail {
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub photo: Option<String>, // base64
    pub photo_credit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    pub place_id: String,
    pub photo_reference: Option<String>,
    pub photo_attribution: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    /// Turns `NotFound` into the client-visible error.
    pub fn found_or(self, what: impl FnOnce() -> String) -> Result<T, AppError> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(AppError::NotFound(what())),
        }
    }
}

/// First result of a successful nearby search, with its first photo if any.
pub fn select_candidate(response: NearbySearchResponse) -> Lookup<PlaceCandidate> {
    if response.status != Some(PlacesStatus::Ok) {
        return Lookup::NotFound;
    }
    let first = match response.results.into_iter().next() {
        Some(result) => result,
        None => return Lookup::NotFound,
    };

    let first_photo = first.photos.and_then(|photos| photos.into_iter().next());
    let (photo_reference, photo_attribution) = match first_photo {
        Some(photo) => (Some(photo.photo_reference), photo.html_attributions.into_iter().next()),
        None => (None, None),
    };

    debug!(place_id = %first.place_id, name = ?first.name, has_photo = photo_reference.is_some(), "selected place");
    Lookup::Found(PlaceCandidate {
        place_id: first.place_id,
        photo_reference,
        photo_attribution,
    })
}

pub fn detail_from_response(response: DetailsResponse) -> Lookup<AirportDetail> {
    if response.status != Some(PlacesStatus::Ok) {
        return Lookup::NotFound;
    }
    match response.result {
        Some(result) => Lookup::Found(AirportDetail {
            address: result.formatted_address,
            phone: result.international_phone_number,
            website: result.website,
            ..Default::default()
        }),
        None => Lookup::NotFound,
    }
}

/// Attaches the photo when the service returned bytes. Leaves `detail` alone otherwise.
pub fn attach_photo(detail: &mut AirportDetail, response: PhotoResponse, credit: Option<String>) {
    if let Some(buffer) = response.buffer.filter(|b| !b.is_empty()) {
        detail.photo = Some(BASE64.encode(buffer));
        detail.photo_credit = credit;
    }
}

pub async fn enrich<P>(api: &P, query: &AirportQuery, credential: &str) -> Result<Lookup<AirportDetail>, AppError>
where
    P: PlacesApi + ?Sized,
{
    let search = api
        .nearby_search(&NearbySearchRequest {
            key: credential,
            name: &query.name,
            location: Location {
                latitude: query.latitude,
                longitude: query.longitude,
            },
            radius: SEARCH_RADIUS_METERS,
        })
        .await?;
    let candidate = match select_candidate(search) {
        Lookup::Found(candidate) => candidate,
        Lookup::NotFound => return Ok(Lookup::NotFound),
    };

    let details = api
        .details(&DetailsRequest {
            key: credential,
            place_id: &candidate.place_id,
        })
        .await?;
    let mut detail = match detail_from_response(details) {
        Lookup::Found(detail) => detail,
        Lookup::NotFound => return Ok(Lookup::NotFound),
    };

    if let Some(reference) = candidate.photo_reference.as_deref() {
        let photo = api
            .photo(&PhotoRequest {
                key: credential,
                photo_reference: reference,
                max_width: PHOTO_MAX_WIDTH,
            })
            .await;
        match photo {
            Ok(response) => attach_photo(&mut detail, response, candidate.photo_attribution),
            Err(e) => warn!(place_id = %candidate.place_id, error = %e, "photo lookup failed, returning detail without photo"),
        }
    }

    Ok(Lookup::Found(detail))
}
