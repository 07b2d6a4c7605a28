//! Location resolution pipeline.
//!
//! Turns free-text location input into an Overpass bounding-box query URL:
//! direct-coordinate detection, intersection detection, geocoding with a
//! single alternate-format retry, candidate selection, and the
//! latitude-adjusted bounding-box computation.

use thiserror::Error;
use tracing::debug;

use super::nominatim::{GeocodeCandidate, GeocodeClient, GeocodeError};

/// Rough meters per degree of latitude at the equator.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Substrings flagging a probable street-intersection query.
const INTERSECTION_KEYWORDS: [&str; 4] = [" and ", " & ", " at ", " intersection "];

/// Errors from resolving a location.
///
/// These never cross the tool boundary as errors; the caller renders them
/// into a human-readable `Error: ...` string.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Geocoding API request timed out")]
    Timeout,

    #[error("Network error when geocoding location: {0}")]
    Transport(String),

    #[error("Location '{0}' not found")]
    NotFound(String),

    #[error("Invalid location format: {0}")]
    InvalidFormat(String),
}

impl From<GeocodeError> for LocationError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::Timeout => Self::Timeout,
            GeocodeError::Transport(msg) => Self::Transport(msg),
            GeocodeError::Status(code) => {
                Self::Transport(format!("geocoding service returned status {}", code))
            }
            GeocodeError::Malformed(msg) => Self::Transport(msg),
        }
    }
}

/// An axis-aligned search area in longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Build a box of `box_size_meters` around a center point.
    ///
    /// The longitude half-width is widened by 1/cos(latitude) so the box
    /// spans roughly the same ground distance in both axes.
    pub fn around(lat: f64, lon: f64, box_size_meters: f64) -> Self {
        let lat_offset = box_size_meters / METERS_PER_DEGREE;
        let lon_offset = box_size_meters / (METERS_PER_DEGREE * lat.to_radians().cos().abs());

        Self {
            min_lon: lon - lon_offset,
            min_lat: lat - lat_offset,
            max_lon: lon + lon_offset,
            max_lat: lat + lat_offset,
        }
    }
}

/// Try to read the input as a direct "lat, lon" coordinate pair.
///
/// Accepts exactly two comma-separated floats with latitude in [-90, 90]
/// and longitude in [-180, 180]; anything else falls through to geocoding.
pub fn parse_direct_coordinates(location: &str) -> Option<(f64, f64)> {
    if !location.contains(',') {
        return None;
    }

    let parts: Vec<&str> = location.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return None;
    }

    let lat: f64 = parts[0].parse().ok()?;
    let lon: f64 = parts[1].parse().ok()?;

    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        debug!("Parsed direct coordinates: lat={}, lon={}", lat, lon);
        Some((lat, lon))
    } else {
        None
    }
}

/// Check if a location string might name a street intersection.
pub fn is_potential_intersection(location: &str) -> bool {
    let lower = location.to_lowercase();
    INTERSECTION_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// Rewrite an intersection query to the alternate conjunction form,
/// toggling `" and "` and `" & "`.
pub fn toggle_intersection_format(location: &str) -> String {
    let lower = location.to_lowercase();
    if lower.contains(" and ") {
        lower.replace(" and ", " & ")
    } else if lower.contains(" & ") {
        lower.replace(" & ", " and ")
    } else {
        location.to_string()
    }
}

/// Pick one candidate from a non-empty result list.
///
/// Intersection queries prefer the first candidate whose type or class
/// denotes a highway; otherwise the highest-ranked candidate wins.
pub fn select_candidate(
    candidates: &[GeocodeCandidate],
    is_intersection: bool,
) -> &GeocodeCandidate {
    if is_intersection {
        for candidate in candidates {
            let type_is_road = candidate
                .kind
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains("highway"));
            let class_is_road = candidate.class.as_deref() == Some("highway");
            if type_is_road || class_is_road {
                return candidate;
            }
        }
    }

    &candidates[0]
}

/// Build the Overpass map URL for a bounding box.
///
/// Coordinates appear in min-lon, min-lat, max-lon, max-lat order.
pub fn overpass_url(base_url: &str, bbox: &BoundingBox) -> String {
    format!(
        "{}?bbox={},{},{},{}",
        base_url, bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat
    )
}

/// Resolve a location description to an Overpass bounding-box URL.
///
/// Direct coordinate input skips geocoding entirely. Intersection-style
/// queries that geocode to nothing get exactly one retry with the
/// alternate conjunction format before resolution fails.
pub fn resolve_location(
    client: &GeocodeClient,
    overpass_base: &str,
    location: &str,
    box_size_meters: f64,
) -> Result<String, LocationError> {
    let (lat, lon) = match parse_direct_coordinates(location) {
        Some(coords) => coords,
        None => {
            let is_intersection = is_potential_intersection(location);
            if is_intersection {
                debug!("Processing as potential intersection: {}", location);
            }

            let mut candidates = client.search(location)?;

            if candidates.is_empty() && is_intersection {
                let alternate = toggle_intersection_format(location);
                debug!("Retrying with modified intersection query: {}", alternate);
                candidates = client.search(&alternate)?;
            }

            if candidates.is_empty() {
                return Err(LocationError::NotFound(location.to_string()));
            }

            let selected = select_candidate(&candidates, is_intersection);
            debug!("Selected location: {}", selected.display_name);

            let lat: f64 = selected
                .lat
                .parse()
                .map_err(|_| LocationError::InvalidFormat(selected.lat.clone()))?;
            let lon: f64 = selected
                .lon
                .parse()
                .map_err(|_| LocationError::InvalidFormat(selected.lon.clone()))?;
            (lat, lon)
        }
    };

    let bbox = BoundingBox::around(lat, lon, box_size_meters);
    Ok(overpass_url(overpass_base, &bbox))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(kind: Option<&str>, class: Option<&str>) -> GeocodeCandidate {
        serde_json::from_value(serde_json::json!({
            "display_name": "somewhere",
            "lat": "40.0",
            "lon": "-74.0",
            "type": kind,
            "class": class,
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_direct_coordinates() {
        let (lat, lon) = parse_direct_coordinates("40.7128, -74.0060").unwrap();
        assert_eq!(lat, 40.7128);
        assert_eq!(lon, -74.0060);
    }

    #[test]
    fn test_parse_direct_coordinates_out_of_range() {
        // Longitude out of range falls through to geocoding.
        assert!(parse_direct_coordinates("0,200").is_none());
        assert!(parse_direct_coordinates("91,0").is_none());
        assert!(parse_direct_coordinates("-91,0").is_none());
        assert!(parse_direct_coordinates("0,-181").is_none());
    }

    #[test]
    fn test_parse_direct_coordinates_rejects_text() {
        assert!(parse_direct_coordinates("Borough Market, London").is_none());
        assert!(parse_direct_coordinates("no comma here").is_none());
        assert!(parse_direct_coordinates("1,2,3").is_none());
    }

    #[test]
    fn test_intersection_detection() {
        assert!(is_potential_intersection("5th Ave and 23rd St, New York"));
        assert!(is_potential_intersection("5th Ave & 23rd St"));
        assert!(is_potential_intersection("Broadway at Wall St"));
        assert!(is_potential_intersection("the intersection of A and B"));
        assert!(is_potential_intersection("Main AND First"));
        assert!(!is_potential_intersection("Borough Market, London"));
        // "Sandy Lane" contains "and" but not as a word
        assert!(!is_potential_intersection("Sandy Lane"));
    }

    #[test]
    fn test_toggle_intersection_format() {
        assert_eq!(
            toggle_intersection_format("5th Ave and 23rd St"),
            "5th ave & 23rd st"
        );
        assert_eq!(
            toggle_intersection_format("5th Ave & 23rd St"),
            "5th ave and 23rd st"
        );
        assert_eq!(toggle_intersection_format("no conjunction"), "no conjunction");
    }

    #[test]
    fn test_select_candidate_prefers_highway_for_intersections() {
        let candidates = vec![
            candidate(Some("marketplace"), Some("amenity")),
            candidate(Some("tertiary"), Some("highway")),
        ];
        let selected = select_candidate(&candidates, true);
        assert_eq!(selected.class.as_deref(), Some("highway"));
    }

    #[test]
    fn test_select_candidate_highway_in_type() {
        let candidates = vec![
            candidate(Some("residential"), Some("place")),
            candidate(Some("highway_junction"), Some("other")),
        ];
        let selected = select_candidate(&candidates, true);
        assert_eq!(selected.kind.as_deref(), Some("highway_junction"));
    }

    #[test]
    fn test_select_candidate_falls_back_to_first() {
        let candidates = vec![
            candidate(Some("marketplace"), Some("amenity")),
            candidate(Some("park"), Some("leisure")),
        ];
        assert_eq!(
            select_candidate(&candidates, true).kind.as_deref(),
            Some("marketplace")
        );
        assert_eq!(
            select_candidate(&candidates, false).kind.as_deref(),
            Some("marketplace")
        );
    }

    #[test]
    fn test_bounding_box_equal_offsets_at_equator() {
        let bbox = BoundingBox::around(0.0, 10.0, 100.0);
        let lat_offset = bbox.max_lat - 0.0;
        let lon_offset = bbox.max_lon - 10.0;
        assert!((lat_offset - lon_offset).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box_latitude_adjustment_at_60_degrees() {
        // cos(60°) = 0.5, so the longitude offset doubles.
        let bbox = BoundingBox::around(60.0, 0.0, 100.0);
        let lat_offset = bbox.max_lat - 60.0;
        let lon_offset = bbox.max_lon;
        assert!((lon_offset / lat_offset - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_overpass_url_coordinate_order() {
        let bbox = BoundingBox {
            min_lon: -1.0,
            min_lat: -2.0,
            max_lon: 1.0,
            max_lat: 2.0,
        };
        assert_eq!(
            overpass_url("https://overpass-api.de/api/map", &bbox),
            "https://overpass-api.de/api/map?bbox=-1,-2,1,2"
        );
    }

    #[test]
    fn test_resolve_direct_coordinates_skips_geocoding() {
        // Points the client at an unroutable address: if geocoding were
        // invoked this would fail, so success proves the skip.
        let config = crate::core::config::GeocodingConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
            ..Default::default()
        };
        let client = GeocodeClient::new(&config).unwrap();

        let url = resolve_location(
            &client,
            "https://overpass-api.de/api/map",
            "40.7128, -74.0060",
            100.0,
        )
        .unwrap();

        assert!(url.starts_with("https://overpass-api.de/api/map?bbox="));
        assert!(url.contains("40.7"));
    }

    /// Local geocoder stub that answers every search with an empty candidate
    /// list and records the request line of each hit.
    fn spawn_empty_geocoder(hits: std::sync::Arc<std::sync::Mutex<Vec<String>>>) -> String {
        use std::io::{BufRead, BufReader, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let mut stream = match stream {
                    Ok(s) => s,
                    Err(_) => break,
                };
                let mut request_line = String::new();
                {
                    let mut reader = BufReader::new(&stream);
                    if reader.read_line(&mut request_line).is_err() {
                        continue;
                    }
                    // Drain headers up to the blank line.
                    loop {
                        let mut line = String::new();
                        match reader.read_line(&mut line) {
                            Ok(0) => break,
                            Ok(_) if line == "\r\n" => break,
                            Ok(_) => {}
                            Err(_) => break,
                        }
                    }
                }
                hits.lock().unwrap().push(request_line);

                let body = "[]";
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        format!("http://{}", addr)
    }

    fn stub_client(base_url: String) -> GeocodeClient {
        let config = crate::core::config::GeocodingConfig {
            base_url,
            timeout_secs: 5,
            ..Default::default()
        };
        GeocodeClient::new(&config).unwrap()
    }

    #[test]
    fn test_intersection_retries_once_with_alternate_format() {
        let hits = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let client = stub_client(spawn_empty_geocoder(hits.clone()));

        let err = resolve_location(
            &client,
            "https://overpass-api.de/api/map",
            "5th Ave and 23rd St",
            100.0,
        )
        .unwrap_err();

        assert!(matches!(err, LocationError::NotFound(_)));
        assert!(err.to_string().contains("5th Ave and 23rd St"));

        let hits = hits.lock().unwrap();
        // Original query, then exactly one toggled retry - never a third.
        assert_eq!(hits.len(), 2);
        assert!(hits[0].contains("q=5th+Ave+and+23rd+St"));
        assert!(hits[1].contains("q=5th+ave+%26+23rd+st"));
    }

    #[test]
    fn test_plain_location_not_found_without_retry() {
        let hits = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let client = stub_client(spawn_empty_geocoder(hits.clone()));

        let err = resolve_location(
            &client,
            "https://overpass-api.de/api/map",
            "Borough Market",
            100.0,
        )
        .unwrap_err();

        assert!(matches!(err, LocationError::NotFound(_)));
        assert!(err.to_string().contains("Borough Market"));
        assert_eq!(hits.lock().unwrap().len(), 1);
    }

    // Integration tests (require network, run with: cargo test -- --ignored)
    #[ignore]
    #[test]
    fn test_resolve_named_location_live() {
        let config = crate::core::config::GeocodingConfig::default();
        let client = GeocodeClient::new(&config).unwrap();
        let url = resolve_location(
            &client,
            &config.overpass_url,
            "Borough Market, London",
            100.0,
        )
        .unwrap();
        assert!(url.contains("bbox="));
    }
}
