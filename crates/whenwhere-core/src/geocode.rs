//! Address to coordinate lookup.
//!
//! [`NominatimGeocoder`] talks to any Nominatim-compatible `search`
//! endpoint. [`DisabledGeocoder`] refuses every lookup and is used when
//! geocoding is turned off or the HTTP client cannot be built.

use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::error::GeocodeError;
use crate::location::Coordinate;
use crate::storage::GeocoderConfig;

pub trait Geocoder {
    /// Resolve a one-line address to a coordinate.
    fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

/// Geocoder that always fails with [`GeocodeError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeocoder;

impl Geocoder for DisabledGeocoder {
    fn geocode(&self, _address: &str) -> Result<Coordinate, GeocodeError> {
        Err(GeocodeError::Disabled)
    }
}

/// One search hit. Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client: Client,
    endpoint: Url,
}

impl NominatimGeocoder {
    /// # Errors
    /// Returns an error if `endpoint` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| GeocodeError::Request(format!("invalid endpoint '{endpoint}': {e}")))?;
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        Self::new(
            &config.endpoint,
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn search_url(&self, address: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "json")
            .append_pair("limit", "1");
        url
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let url = self.search_url(address);
        tracing::debug!(%url, "geocoding address");

        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(GeocodeError::Request(format!("HTTP {status}: {text}")));
        }

        let places: Vec<Place> = resp
            .json()
            .map_err(|e| GeocodeError::Malformed(e.to_string()))?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NoResult(address.to_string()))?;
        parse_place(&place)
    }
}

fn parse_place(place: &Place) -> Result<Coordinate, GeocodeError> {
    let parse = |field: &str, raw: &str, limit: f64| -> Result<f64, GeocodeError> {
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| GeocodeError::Malformed(format!("{field} '{raw}' is not a number")))?;
        if !value.is_finite() || value.abs() > limit {
            return Err(GeocodeError::Malformed(format!("{field} {value} out of range")));
        }
        Ok(value)
    };
    Ok(Coordinate::new(
        parse("lat", &place.lat, 90.0)?,
        parse("lon", &place.lon, 180.0)?,
    ))
}

/// The geocoder the configuration asks for. Falls back to
/// [`DisabledGeocoder`] when the HTTP client cannot be set up.
pub fn geocoder_from_config(config: &GeocoderConfig) -> Box<dyn Geocoder> {
    if !config.enabled {
        return Box::new(DisabledGeocoder);
    }
    match NominatimGeocoder::from_config(config) {
        Ok(geocoder) => Box::new(geocoder),
        Err(e) => {
            tracing::warn!(error = %e, "geocoder unavailable, continuing without it");
            Box::new(DisabledGeocoder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn geocoder_for(server: &mockito::Server) -> NominatimGeocoder {
        NominatimGeocoder::new(
            &format!("{}/search", server.url()),
            "whenwhere-test",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn parses_first_result() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "1 Main St, Springfield".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .match_header("user-agent", "whenwhere-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"lat": "44.0462", "lon": "-123.0220", "display_name": "x"}]"#)
            .create();

        let coord = geocoder_for(&server).geocode("1 Main St, Springfield").unwrap();
        assert_eq!(coord, Coordinate::new(44.0462, -123.0220));
        mock.assert();
    }

    #[test]
    fn empty_result_is_no_result() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create();

        let err = geocoder_for(&server).geocode("nowhere").unwrap_err();
        assert!(matches!(err, GeocodeError::NoResult(ref a) if a == "nowhere"));
    }

    #[test]
    fn http_error_is_request_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("busy")
            .create();

        let err = geocoder_for(&server).geocode("anywhere").unwrap_err();
        assert!(matches!(err, GeocodeError::Request(ref m) if m.contains("503")));
    }

    #[test]
    fn bad_coordinates_are_malformed() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"lat": "north", "lon": "0"}]"#)
            .create();

        let err = geocoder_for(&server).geocode("anywhere").unwrap_err();
        assert!(matches!(err, GeocodeError::Malformed(_)));
    }

    #[test]
    fn disabled_geocoder_refuses() {
        assert!(matches!(
            DisabledGeocoder.geocode("1 Main St"),
            Err(GeocodeError::Disabled)
        ));
        let config = GeocoderConfig {
            enabled: false,
            ..GeocoderConfig::default()
        };
        assert!(matches!(
            geocoder_from_config(&config).geocode("1 Main St"),
            Err(GeocodeError::Disabled)
        ));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(NominatimGeocoder::new("not a url", "ua", Duration::from_secs(1)).is_err());
    }
}
