//! Geocoding capability.
//!
//! The pipeline only needs "free-text address in, coordinates out". Keeping it
//! behind a trait lets the CLI swap the live OneMap client for an offline
//! lookup, and lets tests inject canned responses.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::GeoPoint;
use crate::error::AppError;
use crate::io::reference::normalize_key;

/// One candidate match for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeHit {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub postal: Option<String>,
}

impl GeocodeHit {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Search outcome: `found == 0` means no match, otherwise `results[0]` is the
/// best candidate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub found: usize,
    pub results: Vec<GeocodeHit>,
}

impl GeocodeResponse {
    pub fn not_found() -> Self {
        Self::default()
    }

    /// First result, if the search matched anything.
    pub fn first(&self) -> Option<&GeocodeHit> {
        if self.found == 0 {
            return None;
        }
        self.results.first()
    }
}

pub trait Geocoder {
    /// Resolve a free-text address.
    ///
    /// A zero-result search is `Ok` with `found == 0`; `Err` is reserved for
    /// the geocoder itself being unreachable or misbehaving.
    fn search(&self, query: &str) -> Result<GeocodeResponse, AppError>;
}

impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn search(&self, query: &str) -> Result<GeocodeResponse, AppError> {
        (**self).search(query)
    }
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    fn search(&self, query: &str) -> Result<GeocodeResponse, AppError> {
        (**self).search(query)
    }
}

/// Memoizes responses from an inner geocoder for the life of the process.
///
/// Errors pass through uncached so a transient outage can be retried.
pub struct CachingGeocoder<G> {
    inner: G,
    cache: RefCell<HashMap<String, GeocodeResponse>>,
}

impl<G: Geocoder> CachingGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

impl<G: Geocoder> Geocoder for CachingGeocoder<G> {
    fn search(&self, query: &str) -> Result<GeocodeResponse, AppError> {
        let key = normalize_key(query);
        if let Some(hit) = self.cache.borrow().get(&key) {
            tracing::debug!(query = %key, "geocode cache hit");
            return Ok(hit.clone());
        }

        let response = self.inner.search(query)?;
        self.cache.borrow_mut().insert(key, response.clone());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct CountingGeocoder {
        calls: Cell<usize>,
        fail: bool,
    }

    impl Geocoder for CountingGeocoder {
        fn search(&self, _query: &str) -> Result<GeocodeResponse, AppError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(AppError::geocoding_unavailable("down"));
            }
            Ok(GeocodeResponse {
                found: 1,
                results: vec![GeocodeHit {
                    latitude: 1.3,
                    longitude: 103.8,
                    address: None,
                    postal: None,
                }],
            })
        }
    }

    #[test]
    fn first_is_none_when_nothing_found() {
        assert!(GeocodeResponse::not_found().first().is_none());
    }

    #[test]
    fn cache_calls_inner_once_per_normalized_query() {
        let cached = CachingGeocoder::new(CountingGeocoder {
            calls: Cell::new(0),
            fail: false,
        });
        cached.search("406 ang mo kio ave 10").unwrap();
        cached.search("406  ANG MO KIO AVE 10 ").unwrap();
        assert_eq!(cached.inner.calls.get(), 1);
        assert_eq!(cached.len(), 1);

        cached.search("108 ANG MO KIO AVE 4").unwrap();
        assert_eq!(cached.inner.calls.get(), 2);
    }

    #[test]
    fn cache_does_not_store_errors() {
        let cached = CachingGeocoder::new(CountingGeocoder {
            calls: Cell::new(0),
            fail: true,
        });
        assert!(cached.search("1 FOO ST").is_err());
        assert!(cached.search("1 FOO ST").is_err());
        assert_eq!(cached.inner.calls.get(), 2);
        assert!(cached.is_empty());
    }
}
