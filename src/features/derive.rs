//! Request → feature vector.
//!
//! Order of work:
//! 1) validate the request and compute the pure features (lease, storey)
//! 2) geocode `block + " " + street` (the only side effect)
//! 3) geodesic distances to the nearest station and the CBD
//! 4) assemble the vector in model order, applying the log transforms
//!
//! Everything before step 2 fails fast so malformed input never costs a
//! network round-trip.

use serde::Serialize;

use crate::data::Geocoder;
use crate::domain::{
    FLOOR_AREA_MAX_SQM, FeatureVector, GeoPoint, LEASE_COMMENCE_MIN, PipelineSettings, PredictionRequest,
    TransitStationCoordinate,
};
use crate::error::AppError;
use crate::features::{lease_remaining_years, storey_median};
use crate::io::reference::ReferenceStore;
use crate::math::{geodesic_distance_m, nearest};

/// Feature vector plus the intermediate values that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Derivation {
    pub query_address: String,
    pub origin: GeoPoint,
    /// Address text of the geocoder's first hit, when it reports one.
    pub matched_address: Option<String>,
    pub matched_postal: Option<String>,
    pub nearest_station: TransitStationCoordinate,
    pub lease_remaining_years: i32,
    pub storey_median: f64,
    pub features: FeatureVector,
}

/// Derive the model input for one request.
pub fn derive(
    request: &PredictionRequest,
    geocoder: &dyn Geocoder,
    store: &ReferenceStore,
    settings: &PipelineSettings,
) -> Result<FeatureVector, AppError> {
    derive_detailed(request, geocoder, store, settings).map(|d| d.features)
}

/// Like [`derive`], but keeps the intermediate values for reporting.
pub fn derive_detailed(
    request: &PredictionRequest,
    geocoder: &dyn Geocoder,
    store: &ReferenceStore,
    settings: &PipelineSettings,
) -> Result<Derivation, AppError> {
    validate_request(request, settings)?;

    let lease_years = lease_remaining_years(request.lease_commence_date, settings.lease_baseline_year);
    let storey = storey_median(&request.storey_range)?;
    if !(storey > 0.0) {
        return Err(AppError::invalid_input(format!(
            "Storey range '{}' must describe positive floors.",
            request.storey_range
        )));
    }

    let query_address = request.query_address();
    let response = geocoder.search(&query_address)?;
    let hit = response.first().ok_or_else(|| {
        AppError::geocoding_not_found(format!("No location found for '{query_address}'."))
    })?;
    let origin = hit.point();
    if !origin.is_valid() {
        return Err(AppError::geocoding_unavailable(format!(
            "Geocoder returned an invalid coordinate for '{query_address}'."
        )));
    }

    let stations = store.all_transit_station_coordinates();
    let (station_idx, min_transit) = nearest(origin, stations)
        .ok_or_else(|| AppError::data_load("Reference dataset has no transit stations."))?;
    let cbd = geodesic_distance_m(origin, settings.cbd);

    let features = assemble(cbd, min_transit, request.floor_area_sqm, lease_years, storey)?;

    tracing::debug!(
        query = %query_address,
        lat = origin.latitude,
        lon = origin.longitude,
        cbd_m = cbd,
        mrt_m = min_transit,
        "derived features"
    );

    Ok(Derivation {
        query_address,
        origin,
        matched_address: hit.address.clone(),
        matched_postal: hit.postal.clone(),
        nearest_station: stations[station_idx],
        lease_remaining_years: lease_years,
        storey_median: storey,
        features,
    })
}

/// Range checks that do not need the network.
pub fn validate_request(request: &PredictionRequest, settings: &PipelineSettings) -> Result<(), AppError> {
    if request.street_name.trim().is_empty() {
        return Err(AppError::invalid_input("Street name is required."));
    }
    if request.block.trim().is_empty() {
        return Err(AppError::invalid_input("Block number is required."));
    }

    let area = request.floor_area_sqm;
    if !(area.is_finite() && area > 0.0 && area <= FLOOR_AREA_MAX_SQM) {
        return Err(AppError::invalid_input(format!(
            "Floor area must be in (0, {FLOOR_AREA_MAX_SQM}] sqm, got {area}."
        )));
    }

    let year = request.lease_commence_date;
    let max_year = settings.lease_baseline_year;
    if !(LEASE_COMMENCE_MIN..=max_year).contains(&year) {
        return Err(AppError::invalid_input(format!(
            "Lease commence date must be in [{LEASE_COMMENCE_MIN}, {max_year}], got {year}."
        )));
    }

    Ok(())
}

/// Build the vector in model order: `[cbd, mrt, ln(area), lease, ln(storey)]`.
pub fn assemble(
    cbd_distance_m: f64,
    nearest_transit_distance_m: f64,
    floor_area_sqm: f64,
    lease_remaining_years: i32,
    storey_median: f64,
) -> Result<FeatureVector, AppError> {
    if !(floor_area_sqm > 0.0) {
        return Err(AppError::invalid_input(format!(
            "Floor area must be positive to take its logarithm, got {floor_area_sqm}."
        )));
    }
    if !(storey_median > 0.0) {
        return Err(AppError::invalid_input(format!(
            "Storey median must be positive to take its logarithm, got {storey_median}."
        )));
    }

    Ok(FeatureVector {
        cbd_distance_m,
        nearest_transit_distance_m,
        floor_area_log: floor_area_sqm.ln(),
        lease_remaining_years: f64::from(lease_remaining_years),
        storey_median_log: storey_median.ln(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use geo::{Destination, Geodesic, Point};

    use super::*;
    use crate::data::{GeocodeHit, GeocodeResponse};
    use crate::domain::{CBD_COORDINATE, LocationRecord};
    use crate::error::ErrorKind;

    struct StubGeocoder {
        hit: Option<GeoPoint>,
        calls: Cell<usize>,
        last_query: std::cell::RefCell<String>,
    }

    impl StubGeocoder {
        fn at(p: GeoPoint) -> Self {
            Self {
                hit: Some(p),
                calls: Cell::new(0),
                last_query: Default::default(),
            }
        }

        fn nothing() -> Self {
            Self {
                hit: None,
                calls: Cell::new(0),
                last_query: Default::default(),
            }
        }
    }

    impl Geocoder for StubGeocoder {
        fn search(&self, query: &str) -> Result<GeocodeResponse, AppError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_query.borrow_mut() = query.to_string();
            Ok(match self.hit {
                Some(p) => GeocodeResponse {
                    found: 1,
                    results: vec![GeocodeHit {
                        latitude: p.latitude,
                        longitude: p.longitude,
                        address: Some(query.to_string()),
                        postal: Some("560406".to_string()),
                    }],
                },
                None => GeocodeResponse::not_found(),
            })
        }
    }

    fn offset(origin: GeoPoint, bearing_deg: f64, meters: f64) -> GeoPoint {
        let p = Geodesic.destination(Point::new(origin.longitude, origin.latitude), bearing_deg, meters);
        GeoPoint::new(p.y(), p.x())
    }

    fn store_with(stations: &[GeoPoint]) -> ReferenceStore {
        let records = stations
            .iter()
            .enumerate()
            .map(|(i, p)| LocationRecord {
                address: format!("STREET {i}"),
                block: format!("{i}"),
                latitude: p.latitude,
                longitude: p.longitude,
            })
            .collect();
        ReferenceStore::from_records(records).unwrap()
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            street_name: "ANG MO KIO AVE 10".to_string(),
            block: "406".to_string(),
            floor_area_sqm: 90.0,
            lease_commence_date: 1990,
            storey_range: "10 TO 12".to_string(),
        }
    }

    #[test]
    fn feature_vector_matches_hand_computed_values() {
        // Origin sits exactly on the CBD reference point.
        let origin = CBD_COORDINATE;
        let store = store_with(&[offset(origin, 45.0, 500.0)]);
        let geocoder = StubGeocoder::at(origin);

        let v = derive(&request(), &geocoder, &store, &PipelineSettings::default()).unwrap();
        let arr = v.to_array();

        assert!(arr[0].abs() < 1e-6, "cbd distance {}", arr[0]);
        assert!((arr[1] - 500.0).abs() < 1e-6, "mrt distance {}", arr[1]);
        assert_eq!(arr[2], 90.0_f64.ln());
        assert_eq!(arr[3], 66.0);
        assert_eq!(arr[4], 11.0_f64.ln());
        assert_eq!(*geocoder.last_query.borrow(), "406 ANG MO KIO AVE 10");

        let d = derive_detailed(&request(), &geocoder, &store, &PipelineSettings::default()).unwrap();
        assert_eq!(d.matched_address.as_deref(), Some("406 ANG MO KIO AVE 10"));
        assert_eq!(d.matched_postal.as_deref(), Some("560406"));
    }

    #[test]
    fn nearest_of_two_stations_is_used() {
        let origin = GeoPoint::new(1.3691, 103.8454);
        let store = store_with(&[offset(origin, 10.0, 1200.0), offset(origin, 250.0, 500.0)]);
        let geocoder = StubGeocoder::at(origin);

        let d = derive_detailed(&request(), &geocoder, &store, &PipelineSettings::default()).unwrap();
        assert!((d.features.nearest_transit_distance_m - 500.0).abs() < 1e-6);
        assert_eq!(d.nearest_station, store.all_transit_station_coordinates()[1]);

        let expected_cbd = geodesic_distance_m(origin, CBD_COORDINATE);
        assert!((d.features.cbd_distance_m - expected_cbd).abs() < 1e-9);
        assert_eq!(d.lease_remaining_years, 66);
        assert_eq!(d.storey_median, 11.0);
    }

    #[test]
    fn zero_results_is_not_found() {
        let store = store_with(&[CBD_COORDINATE]);
        let geocoder = StubGeocoder::nothing();

        let err = derive(&request(), &geocoder, &store, &PipelineSettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GeocodingNotFound);
        assert_eq!(geocoder.calls.get(), 1);
    }

    #[test]
    fn invalid_input_never_reaches_geocoder() {
        let store = store_with(&[CBD_COORDINATE]);
        let geocoder = StubGeocoder::at(CBD_COORDINATE);
        let settings = PipelineSettings::default();

        let cases = [
            PredictionRequest {
                storey_range: "10-12".to_string(),
                ..request()
            },
            PredictionRequest {
                floor_area_sqm: 0.0,
                ..request()
            },
            PredictionRequest {
                floor_area_sqm: 500.5,
                ..request()
            },
            PredictionRequest {
                lease_commence_date: 1959,
                ..request()
            },
            PredictionRequest {
                lease_commence_date: 2024,
                ..request()
            },
            PredictionRequest {
                block: "  ".to_string(),
                ..request()
            },
        ];

        for req in cases {
            let err = derive(&req, &geocoder, &store, &settings).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{req:?}");
        }
        assert_eq!(geocoder.calls.get(), 0);
    }

    #[test]
    fn later_baseline_widens_accepted_years() {
        let settings = PipelineSettings {
            lease_baseline_year: 2025,
            ..PipelineSettings::default()
        };
        let req = PredictionRequest {
            lease_commence_date: 2024,
            ..request()
        };
        assert!(validate_request(&req, &settings).is_ok());
    }

    #[test]
    fn non_positive_storey_median_is_rejected_before_geocoding() {
        let store = store_with(&[CBD_COORDINATE]);
        let geocoder = StubGeocoder::at(CBD_COORDINATE);
        let req = PredictionRequest {
            storey_range: "-3 TO 1".to_string(),
            ..request()
        };
        let err = derive(&req, &geocoder, &store, &PipelineSettings::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(geocoder.calls.get(), 0);
    }

    #[test]
    fn assemble_rejects_non_positive_area() {
        let err = assemble(1.0, 1.0, -1.0, 60, 5.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
