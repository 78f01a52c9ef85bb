//! Spherical distance helpers.
//!
//! Every distance in the engine uses the same Haversine formula on a sphere
//! of radius [`EARTH_RADIUS_KM`], so radius queries, spacing rules and
//! check-in validation agree with each other.

use geo::{Coord, Rect};

/// Mean Earth radius used by every distance computation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two WGS84 points in kilometres.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use snappoint_core::haversine_km;
///
/// let a = Coord { x: 0.0, y: 0.0 };
/// let b = Coord { x: 1.0, y: 0.0 };
/// let d = haversine_km(a, b);
/// assert!((d - 111.195).abs() < 0.01);
/// ```
#[must_use]
pub fn haversine_km(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let d_lat = (b.y - a.y).to_radians();
    let d_lon = (b.x - a.x).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `h` fractionally past 1 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two WGS84 points in metres.
#[must_use]
pub fn haversine_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    haversine_km(a, b) * 1000.0
}

/// Bounding rectangles that contain every point within `radius_km` of
/// `center`.
///
/// The rectangles are a prefilter: callers must still compare the exact
/// Haversine distance. One rectangle is returned unless the circle crosses
/// the antimeridian, in which case the area is split in two. Circles that
/// reach a pole cover the full longitude range.
#[must_use]
pub fn search_bounds(center: Coord<f64>, radius_km: f64) -> Vec<Rect<f64>> {
    let angular = radius_km / EARTH_RADIUS_KM;
    let d_lat = angular.to_degrees();
    let min_lat = (center.y - d_lat).max(-90.0);
    let max_lat = (center.y + d_lat).min(90.0);

    let lat_rad = center.y.to_radians();
    let ratio = angular.sin() / lat_rad.cos();
    if !(ratio.is_finite() && ratio < 1.0) || max_lat >= 90.0 || min_lat <= -90.0 {
        return vec![Rect::new(
            Coord { x: -180.0, y: min_lat },
            Coord { x: 180.0, y: max_lat },
        )];
    }

    let d_lon = ratio.asin().to_degrees();
    let west = center.x - d_lon;
    let east = center.x + d_lon;
    if west < -180.0 {
        vec![
            Rect::new(Coord { x: -180.0, y: min_lat }, Coord { x: east, y: max_lat }),
            Rect::new(
                Coord { x: west + 360.0, y: min_lat },
                Coord { x: 180.0, y: max_lat },
            ),
        ]
    } else if east > 180.0 {
        vec![
            Rect::new(Coord { x: west, y: min_lat }, Coord { x: 180.0, y: max_lat }),
            Rect::new(
                Coord { x: -180.0, y: min_lat },
                Coord { x: east - 360.0, y: max_lat },
            ),
        ]
    } else {
        vec![Rect::new(
            Coord { x: west, y: min_lat },
            Coord { x: east, y: max_lat },
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Intersects;
    use rstest::rstest;

    fn coord(lat: f64, lon: f64) -> Coord<f64> {
        Coord { x: lon, y: lat }
    }

    #[rstest]
    fn distance_to_self_is_zero() {
        let p = coord(41.0, 29.0);
        assert!(haversine_km(p, p).abs() < 1e-12);
    }

    #[rstest]
    fn distance_is_symmetric() {
        let a = coord(41.0082, 28.9784);
        let b = coord(39.9334, 32.8597);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[rstest]
    fn istanbul_to_ankara_is_about_350_km() {
        let d = haversine_km(coord(41.0082, 28.9784), coord(39.9334, 32.8597));
        assert!((345.0..355.0).contains(&d), "distance was {d}");
    }

    #[rstest]
    #[case(coord(41.0, 29.0), 10.0)]
    #[case(coord(0.0, 179.95), 20.0)]
    #[case(coord(-33.9, -179.99), 5.0)]
    fn bounds_contain_points_on_the_circle(#[case] center: Coord<f64>, #[case] radius_km: f64) {
        let bounds = search_bounds(center, radius_km);
        for bearing in (0..360).step_by(15) {
            let point = destination(center, f64::from(bearing), radius_km * 0.999);
            assert!(
                bounds.iter().any(|r| r.intersects(&point)),
                "point {point:?} at bearing {bearing} escaped {bounds:?}"
            );
        }
    }

    #[rstest]
    fn polar_circle_spans_all_longitudes() {
        let bounds = search_bounds(coord(89.99, 0.0), 5.0);
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds[0].min().x, -180.0);
        assert_eq!(bounds[0].max().x, 180.0);
    }

    #[rstest]
    fn antimeridian_circle_splits() {
        let bounds = search_bounds(coord(0.0, 179.95), 20.0);
        assert_eq!(bounds.len(), 2);
    }

    fn destination(origin: Coord<f64>, bearing_deg: f64, distance_km: f64) -> Coord<f64> {
        let delta = distance_km / EARTH_RADIUS_KM;
        let theta = bearing_deg.to_radians();
        let lat1 = origin.y.to_radians();
        let lon1 = origin.x.to_radians();
        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
        let mut lon = lon2.to_degrees();
        if lon > 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }
        Coord {
            x: lon,
            y: lat2.to_degrees(),
        }
    }
}
