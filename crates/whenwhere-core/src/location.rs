//! Named locations and distance checks.
//!
//! Distances use the haversine great-circle formula on a spherical Earth
//! with a mean radius of 3958.8 miles. The threshold check is strict: a
//! candidate exactly at the threshold is not "within" it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;

pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Default radius for "the user is at this location".
pub const DEFAULT_THRESHOLD_MILES: f64 = 1.0;

pub const LOCATION_NAME_MAX_LENGTH: usize = 10;

/// Address keys a location accepts, in display order.
pub const ADDRESS_FIELDS: [&str; 4] = ["street", "city", "zip", "state"];

/// Latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Great-circle distance between two coordinates, in miles.
pub fn distance_between(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1.0 for antipodal points.
    2.0 * EARTH_RADIUS_MILES * h.sqrt().min(1.0).asin()
}

/// Whether `candidate` lies strictly closer than `threshold_miles`.
pub fn within_distance(current: Coordinate, candidate: Coordinate, threshold_miles: f64) -> bool {
    distance_between(current, candidate) < threshold_miles
}

/// True when `ids` is empty or contains `candidate_id`.
pub fn includes_location_or_empty<S: AsRef<str>>(ids: &[S], candidate_id: &str) -> bool {
    ids.is_empty() || ids.iter().any(|id| id.as_ref() == candidate_id)
}

/// Postal address. Only the fields in [`ADDRESS_FIELDS`] exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub state: Option<String>,
}

impl Address {
    /// Build an address from untrusted key/value pairs.
    ///
    /// Values are trimmed and blank values dropped.
    ///
    /// # Errors
    /// Every key outside [`ADDRESS_FIELDS`] is reported as a validation
    /// error on `address`.
    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Result<Self, ValidationErrors>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut address = Address::default();
        let mut errors = ValidationErrors::new();
        for (key, value) in fields {
            let value = value.as_ref().trim();
            let value = (!value.is_empty()).then(|| value.to_string());
            match key.as_ref() {
                "street" => address.street = value,
                "city" => address.city = value,
                "zip" => address.zip = value,
                "state" => address.state = value,
                other => errors.add("address", format!("has unknown field '{other}'")),
            }
        }
        errors.into_result().map(|()| address)
    }

    fn fields(&self) -> [Option<&str>; 4] {
        [
            self.street.as_deref(),
            self.city.as_deref(),
            self.zip.as_deref(),
            self.state.as_deref(),
        ]
    }

    pub fn is_blank(&self) -> bool {
        self.fields().iter().all(|f| f.map_or(true, |v| v.trim().is_empty()))
    }

    /// Single-line form handed to the geocoder: present fields joined by
    /// ", " in street, city, zip, state order.
    pub fn one_line(&self) -> String {
        self.fields()
            .iter()
            .filter_map(|f| f.map(str::trim).filter(|v| !v.is_empty()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A named place owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub address: Address,
    /// Filled in by the geocoder; `None` until the address resolves.
    pub coordinate: Option<Coordinate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Location {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            address: Address::default(),
            coordinate: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Lowercase the name, then capitalize each whitespace-separated word.
    pub fn normalize_name(&mut self) {
        self.name = self
            .name
            .to_lowercase()
            .split_whitespace()
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");
    }

    /// Field rules that need no store lookup. Name uniqueness is checked by
    /// the save workflow.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.user_id.trim().is_empty() {
            errors.add("user", "can't be blank");
        }
        if self.name.trim().is_empty() {
            errors.add("name", "can't be blank");
        } else if self.name.chars().count() > LOCATION_NAME_MAX_LENGTH {
            errors.add(
                "name",
                format!("is too long (maximum is {LOCATION_NAME_MAX_LENGTH} characters)"),
            );
        }
        errors.into_result()
    }

    /// Whether this location's coordinate lies within `threshold_miles` of
    /// `current`. Ungeocoded locations never do.
    pub fn is_near(&self, current: Coordinate, threshold_miles: f64) -> bool {
        self.coordinate
            .map_or(false, |c| within_distance(current, c, threshold_miles))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SF: Coordinate = Coordinate { latitude: 37.7749, longitude: -122.4194 };
    const LA: Coordinate = Coordinate { latitude: 34.0522, longitude: -118.2437 };

    #[test]
    fn identical_points_have_zero_distance() {
        assert_eq!(distance_between(SF, SF), 0.0);
        assert!(within_distance(SF, SF, 0.001));
        assert!(within_distance(SF, SF, DEFAULT_THRESHOLD_MILES));
    }

    #[test]
    fn known_distance_is_close() {
        // SF to LA is roughly 347 miles along the great circle.
        let d = distance_between(SF, LA);
        assert!((d - 347.4).abs() < 1.0, "got {d}");
        assert!((distance_between(LA, SF) - d).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        let expected = EARTH_RADIUS_MILES * std::f64::consts::PI / 180.0;
        assert!((distance_between(a, b) - expected).abs() < 1e-9);
    }

    #[test]
    fn threshold_is_strict() {
        let a = Coordinate::new(40.0, -75.0);
        let b = Coordinate::new(40.01, -75.0);
        let d = distance_between(a, b);
        assert!(!within_distance(a, b, d));
        assert!(within_distance(a, b, d + 1e-9));
        assert!(!within_distance(a, b, d - 1e-9));
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let d = distance_between(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - EARTH_RADIUS_MILES * std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn includes_location_or_empty_rules() {
        let none: [&str; 0] = [];
        assert!(includes_location_or_empty(&none, "home"));
        assert!(includes_location_or_empty(&["home", "work"], "work"));
        assert!(!includes_location_or_empty(&["home"], "work"));
    }

    #[test]
    fn address_rejects_unknown_fields() {
        let err = Address::from_fields([("street", "1 Main St"), ("country", "US")]).unwrap_err();
        assert!(err.has("address"));
        assert_eq!(err.len(), 1);
    }

    #[test]
    fn address_one_line_skips_blanks() {
        let address = Address::from_fields([
            ("city", " Springfield "),
            ("street", "742 Evergreen Terrace"),
            ("zip", ""),
            ("state", "OR"),
        ])
        .unwrap();
        assert_eq!(address.zip, None);
        assert_eq!(address.one_line(), "742 Evergreen Terrace, Springfield, OR");
        assert!(!address.is_blank());
        assert!(Address::default().is_blank());
        assert_eq!(Address::default().one_line(), "");
    }

    #[test]
    fn normalize_name_capitalizes_words() {
        let mut loc = Location::new("user-1", "  the   GYM ");
        loc.normalize_name();
        assert_eq!(loc.name, "The Gym");
    }

    #[test]
    fn validate_name_rules() {
        assert!(Location::new("user-1", "Home").validate().is_ok());
        assert!(Location::new("user-1", "").validate().unwrap_err().has("name"));
        assert!(Location::new("user-1", "Grandmas House").validate().unwrap_err().has("name"));
        assert!(Location::new("", "Home").validate().unwrap_err().has("user"));
    }

    #[test]
    fn ungeocoded_location_is_never_near() {
        let mut loc = Location::new("user-1", "Work");
        assert!(!loc.is_near(SF, 100.0));
        loc.coordinate = Some(Coordinate::new(37.7750, -122.4195));
        assert!(loc.is_near(SF, DEFAULT_THRESHOLD_MILES));
        assert!(!loc.is_near(LA, DEFAULT_THRESHOLD_MILES));
    }
}
