//! Ellipsoidal surface distances.
//!
//! Distances use Karney's geodesic algorithm on the WGS84 ellipsoid (via
//! `geo::Geodesic`). The model's distance features were computed with the same
//! class of formula, so a spherical approximation would shift their
//! distribution by a few tenths of a percent.

use geo::{Distance, Geodesic, Point};

use crate::domain::GeoPoint;

fn to_point(p: GeoPoint) -> Point<f64> {
    // geo points are (x = longitude, y = latitude).
    Point::new(p.longitude, p.latitude)
}

/// Geodesic distance between two coordinates, in meters.
pub fn geodesic_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    Geodesic.distance(to_point(a), to_point(b))
}

/// Index and distance (m) of the closest candidate to `origin`.
///
/// Returns `None` for an empty candidate list.
pub fn nearest(origin: GeoPoint, candidates: &[GeoPoint]) -> Option<(usize, f64)> {
    candidates
        .iter()
        .enumerate()
        .map(|(idx, p)| (idx, geodesic_distance_m(origin, *p)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
