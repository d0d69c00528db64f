//! Geocoding: the capability trait and its implementations.
//!
//! - `geocoder`: trait, response types and the caching decorator
//! - `onemap`: live OneMap search client (blocking, bounded timeout)
//! - `offline`: lookup against the reference dataset

pub mod geocoder;
pub mod offline;
pub mod onemap;

pub use geocoder::{CachingGeocoder, GeocodeHit, GeocodeResponse, Geocoder};
pub use offline::ReferenceGeocoder;
pub use onemap::OneMapClient;
