//! Offline geocoding against the reference table.
//!
//! Matches `"<block> <street>"` queries against the dataset's own
//! `(block, address)` pairs. Handy without network access; results are only as
//! precise as the reference coordinates.

use std::sync::Arc;

use crate::data::geocoder::{GeocodeHit, GeocodeResponse, Geocoder};
use crate::error::AppError;
use crate::io::reference::{ReferenceStore, normalize_key};

pub struct ReferenceGeocoder {
    store: Arc<ReferenceStore>,
}

impl ReferenceGeocoder {
    pub fn new(store: Arc<ReferenceStore>) -> Self {
        Self { store }
    }
}

impl Geocoder for ReferenceGeocoder {
    /// The query is `"<block> <street>"`: the first token is the block and the
    /// rest is the street.
    fn search(&self, query: &str) -> Result<GeocodeResponse, AppError> {
        let key = normalize_key(query);
        let hit = key
            .split_once(' ')
            .and_then(|(block, address)| self.store.find(block, address))
            .map(|r| GeocodeHit {
                latitude: r.latitude,
                longitude: r.longitude,
                address: Some(format!("{} {}", r.block, r.address)),
                postal: None,
            });

        tracing::debug!(query = %key, found = hit.is_some(), "offline geocode");
        Ok(match hit {
            Some(hit) => GeocodeResponse {
                found: 1,
                results: vec![hit],
            },
            None => GeocodeResponse::not_found(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<ReferenceStore> {
        let csv = "address,block_no,latitude,longitude\n\
                   BEDOK NORTH RD,216,1.3273,103.9361\n\
                   BEDOK NORTH RD,217,1.3276,103.9365\n";
        Arc::new(ReferenceStore::from_reader(csv.as_bytes()).unwrap())
    }

    #[test]
    fn resolves_block_and_street() {
        let geocoder = ReferenceGeocoder::new(store());
        let resp = geocoder.search("217 bedok north rd").unwrap();
        assert_eq!(resp.found, 1);
        assert_eq!(resp.first().unwrap().longitude, 103.9365);
    }

    #[test]
    fn unknown_address_is_zero_found() {
        let geocoder = ReferenceGeocoder::new(store());
        let resp = geocoder.search("1 NOWHERE LANE").unwrap();
        assert_eq!(resp.found, 0);
        assert_eq!(geocoder.search("217").unwrap().found, 0);
        assert_eq!(geocoder.search("").unwrap().found, 0);
    }

    #[test]
    fn block_must_match_exactly() {
        let geocoder = ReferenceGeocoder::new(store());
        assert_eq!(geocoder.search("21 BEDOK NORTH RD").unwrap().found, 0);
        let resp = geocoder.search("  216   Bedok North Rd ").unwrap();
        assert_eq!(resp.first().unwrap().latitude, 1.3273);
    }
}
