//! OneMap search API integration.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::geocoder::{GeocodeHit, GeocodeResponse, Geocoder};
use crate::domain::AppConfig;
use crate::error::AppError;

pub struct OneMapClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl OneMapClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, token: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
            timeout,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::new(
            config.geocoder_url.clone(),
            config.geocoder_timeout,
            config.geocoder_token.clone(),
        )
    }
}

impl Geocoder for OneMapClient {
    fn search(&self, query: &str) -> Result<GeocodeResponse, AppError> {
        let mut req = self.client.get(&self.base_url).query(&[
            ("searchVal", query),
            ("returnGeom", "Y"),
            ("getAddrDetails", "Y"),
            ("pageNum", "1"),
        ]);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        tracing::debug!(%query, url = %self.base_url, "geocoding");

        let resp = req.send().map_err(|e| {
            if e.is_timeout() {
                AppError::geocoding_unavailable(format!("OneMap request timed out after {:?}.", self.timeout))
            } else {
                AppError::geocoding_unavailable(format!("OneMap request failed: {e}"))
            }
        })?;

        if !resp.status().is_success() {
            return Err(AppError::geocoding_unavailable(format!(
                "OneMap request failed with status {}.",
                resp.status()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::geocoding_unavailable(format!("Failed to read OneMap response: {e}")))?;

        let response = decode_search_response(&body)?;
        tracing::debug!(%query, found = response.found, "geocoded");
        Ok(response)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    found: usize,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct SearchResult {
    latitude: RawCoordinate,
    longitude: RawCoordinate,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    postal: Option<String>,
}

/// OneMap sends coordinates as strings; tolerate plain numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawCoordinate {
    fn value(&self) -> Option<f64> {
        let v = match self {
            RawCoordinate::Number(v) => *v,
            RawCoordinate::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        if v.is_finite() { Some(v) } else { None }
    }
}

/// Decode a OneMap search body into a `GeocodeResponse`.
///
/// Only the first result is consulted downstream, so it must carry valid
/// coordinates; later results with unusable coordinates are dropped.
pub fn decode_search_response(body: &str) -> Result<GeocodeResponse, AppError> {
    let raw: SearchResponse = serde_json::from_str(body)
        .map_err(|e| AppError::geocoding_unavailable(format!("Failed to parse OneMap response: {e}")))?;

    let mut results = Vec::with_capacity(raw.results.len());
    for (idx, r) in raw.results.into_iter().enumerate() {
        let (Some(latitude), Some(longitude)) = (r.latitude.value(), r.longitude.value()) else {
            if idx == 0 {
                return Err(AppError::geocoding_unavailable(
                    "OneMap's first result has invalid coordinates.",
                ));
            }
            tracing::debug!(result = idx + 1, "dropping OneMap result with invalid coordinates");
            continue;
        };
        results.push(GeocodeHit {
            latitude,
            longitude,
            address: r.address,
            postal: r.postal,
        });
    }

    Ok(GeocodeResponse {
        found: raw.found,
        results,
    })
}
