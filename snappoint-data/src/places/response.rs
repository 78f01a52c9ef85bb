//! Google Places Nearby Search response types.
//!
//! Only the fields the engine stores are modelled; everything else in the
//! payload is ignored.
//!
//! See: <https://developers.google.com/maps/documentation/places/web-service/search-nearby>

use geo::Coord;
use serde::Deserialize;
use snappoint_core::{Candidate, PlaceMetadata};

/// Top-level Nearby Search payload.
#[derive(Debug, Deserialize)]
pub struct NearbySearchResponse {
    /// Status code such as `"OK"` or `"OVER_QUERY_LIMIT"`.
    pub status: String,
    /// Results in provider order.
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    /// Continuation token for the next page.
    pub next_page_token: Option<String>,
    /// Diagnostic text sent with error statuses.
    pub error_message: Option<String>,
}

/// One place in a Nearby Search payload.
#[derive(Debug, Deserialize)]
pub struct PlaceResult {
    pub place_id: String,
    pub name: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub vicinity: Option<String>,
    pub business_status: Option<String>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub plus_code: Option<PlusCode>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct Photo {
    pub photo_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct PlusCode {
    pub global_code: Option<String>,
}

impl From<PlaceResult> for Candidate {
    fn from(result: PlaceResult) -> Self {
        let metadata = PlaceMetadata {
            address: result.vicinity,
            business_status: result.business_status,
            photo_references: result
                .photos
                .into_iter()
                .map(|photo| photo.photo_reference)
                .collect(),
            plus_code: result.plus_code.and_then(|code| code.global_code),
            icon: result.icon.filter(|icon| !icon.is_empty()),
        };
        Self {
            external_id: result.place_id,
            name: result.name,
            location: Coord {
                x: result.geometry.location.lng,
                y: result.geometry.location.lat,
            },
            categories: result.types,
            rating: result.rating,
            review_count: result.user_ratings_total,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "html_attributions": [],
        "next_page_token": "CpQCAgEAAFxg8o",
        "results": [
            {
                "business_status": "OPERATIONAL",
                "geometry": {
                    "location": { "lat": 41.0256, "lng": 28.9741 },
                    "viewport": {
                        "northeast": { "lat": 41.03, "lng": 28.98 },
                        "southwest": { "lat": 41.02, "lng": 28.97 }
                    }
                },
                "icon": "https://maps.gstatic.com/mapfiles/place_api/icons/museum-71.png",
                "name": "Galata Tower",
                "photos": [
                    { "height": 800, "width": 600, "html_attributions": [], "photo_reference": "ph-1" }
                ],
                "place_id": "ChIJ7Z2w",
                "plus_code": { "compound_code": "2XGF+6M", "global_code": "8GHC2XGF+6M" },
                "rating": 4.6,
                "types": ["tourist_attraction", "point_of_interest"],
                "user_ratings_total": 98213,
                "vicinity": "Bereketzade, Galata Kulesi"
            },
            {
                "geometry": { "location": { "lat": 41.0, "lng": 29.0 } },
                "name": "Unrated Corner",
                "place_id": "ChIJbare",
                "types": []
            }
        ],
        "status": "OK"
    }"#;

    #[test]
    fn deserialises_a_full_page() {
        let response: NearbySearchResponse =
            serde_json::from_str(PAGE).expect("should deserialise");
        assert_eq!(response.status, "OK");
        assert_eq!(response.next_page_token.as_deref(), Some("CpQCAgEAAFxg8o"));
        assert_eq!(response.results.len(), 2);
    }

    #[test]
    fn converts_results_into_candidates() {
        let response: NearbySearchResponse =
            serde_json::from_str(PAGE).expect("should deserialise");
        let mut candidates = response.results.into_iter().map(Candidate::from);

        let tower = candidates.next().expect("first result");
        assert_eq!(tower.external_id, "ChIJ7Z2w");
        assert_eq!(tower.location, Coord { x: 28.9741, y: 41.0256 });
        assert_eq!(tower.review_count, Some(98_213));
        assert_eq!(tower.metadata.photo_references, ["ph-1"]);
        assert_eq!(tower.metadata.plus_code.as_deref(), Some("8GHC2XGF+6M"));
        assert_eq!(
            tower.metadata.address.as_deref(),
            Some("Bereketzade, Galata Kulesi")
        );

        let bare = candidates.next().expect("second result");
        assert_eq!(bare.rating, None);
        assert!(bare.categories.is_empty());
        assert_eq!(bare.metadata, PlaceMetadata::default());
    }

    #[test]
    fn error_payloads_need_no_results() {
        let json = r#"{ "status": "REQUEST_DENIED", "error_message": "The provided API key is invalid." }"#;
        let response: NearbySearchResponse =
            serde_json::from_str(json).expect("should deserialise");
        assert!(response.results.is_empty());
        assert_eq!(
            response.error_message.as_deref(),
            Some("The provided API key is invalid.")
        );
    }
}
