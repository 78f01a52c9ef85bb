//! Check-in geofence validation.

use geo::Coord;
use serde::Serialize;
use snappoint_core::{Place, haversine_m};
use snappoint_scorer::{RadiusClass, RadiusTable};

/// Outcome of checking a user's position against a place's geofence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckIn {
    /// Place being checked into.
    pub place_id: u64,
    /// Great-circle distance from the user to the place, whole metres.
    #[serde(rename = "distance_meters")]
    pub distance_m: u64,
    /// Allowed radius in metres.
    pub post_radius: u32,
    /// Area of the geofence in square metres.
    pub coverage_area: f64,
    /// Size band of the geofence.
    pub radius_type: RadiusClass,
    /// Human-readable size band.
    pub radius_description: &'static str,
    /// Whether the user may post here.
    #[serde(rename = "is_within_radius")]
    pub within_radius: bool,
    /// Metres beyond the radius, present only when outside it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_difference: Option<i64>,
}

/// Resolves geofences and measures a user's distance to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckInValidator {
    radii: RadiusTable,
}

impl CheckInValidator {
    /// Validator over a custom radius table.
    #[must_use]
    pub const fn new(radii: RadiusTable) -> Self {
        Self { radii }
    }

    /// Check `user` against the geofence of `place`.
    ///
    /// The comparison uses the exact distance and is inclusive; the reported
    /// distance and difference are truncated to whole metres.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use snappoint_core::{Place, PlaceDraft};
    /// use snappoint_discovery::CheckInValidator;
    ///
    /// let mut draft = PlaceDraft::user_created("Corner Cafe", Coord { x: 29.0, y: 41.0 }, 20);
    /// draft.categories = vec!["cafe".to_owned()];
    /// let place = Place::from_draft(7, draft);
    ///
    /// let check = CheckInValidator::default().validate(&place, Coord { x: 29.0, y: 41.0001 });
    /// assert!(check.within_radius);
    /// assert_eq!(check.post_radius, 25);
    /// assert_eq!(check.distance_difference, None);
    /// ```
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "distances are non-negative and far below u64::MAX metres"
    )]
    pub fn validate(&self, place: &Place, user: Coord<f64>) -> CheckIn {
        let distance = haversine_m(user, place.location);
        let fence = self.radii.resolve(&place.categories);
        let within_radius = fence.contains(distance);
        let distance_m = distance.trunc() as u64;
        let distance_difference = (!within_radius).then(|| {
            i64::try_from(distance_m)
                .unwrap_or(i64::MAX)
                .saturating_sub(i64::from(fence.radius_m))
        });
        if !within_radius {
            log::debug!(
                "user is {distance_m} m from place {} but the geofence is {} m",
                place.id,
                fence.radius_m
            );
        }
        CheckIn {
            place_id: place.id,
            distance_m,
            post_radius: fence.radius_m,
            coverage_area: fence.coverage_area_m2,
            radius_type: fence.class,
            radius_description: fence.description(),
            within_radius,
            distance_difference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use snappoint_core::PlaceDraft;

    #[fixture]
    fn museum() -> Place {
        let mut draft = PlaceDraft::user_created("Museum", Coord { x: 29.0, y: 41.0 }, 40);
        draft.categories = vec!["museum".to_owned()];
        Place::from_draft(3, draft)
    }

    #[rstest]
    fn inside_the_fence_has_no_difference(museum: Place) {
        let check = CheckInValidator::default().validate(&museum, museum.location);
        assert!(check.within_radius);
        assert_eq!(check.distance_m, 0);
        assert_eq!(check.distance_difference, None);
    }

    #[rstest]
    fn outside_the_fence_reports_the_shortfall(museum: Place) {
        // About 1.1 km north of the museum.
        let user = Coord { x: 29.0, y: 41.01 };
        let check = CheckInValidator::default().validate(&museum, user);
        assert!(!check.within_radius);
        let expected = i64::try_from(check.distance_m).expect("fits")
            - i64::from(check.post_radius);
        assert_eq!(check.distance_difference, Some(expected));
        assert!(expected > 0);
    }

    #[rstest]
    fn serialises_with_wire_names(museum: Place) {
        let check = CheckInValidator::default().validate(&museum, museum.location);
        let json = serde_json::to_value(&check).expect("serialise");
        assert_eq!(json.get("is_within_radius"), Some(&serde_json::Value::Bool(true)));
        assert!(json.get("distance_meters").is_some());
        assert!(json.get("distance_difference").is_none());
    }
}
