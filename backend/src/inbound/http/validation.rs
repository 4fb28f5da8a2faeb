//! Request payload validation helpers.
//!
//! Validation failures return [`Error::invalid_request`] with a structured
//! `details` object naming the offending field, so clients can highlight
//! the right input without parsing messages.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{Error, GeoPoint};

/// The camelCase wire name of a request field.
#[derive(Debug, Clone, Copy)]
pub struct FieldName(&'static str);

impl FieldName {
    /// Wrap a wire field name.
    pub fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The wrapped name.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Parse a UUID field.
///
/// # Errors
/// Returns [`Error::invalid_request`] naming `field` when the value does
/// not parse.
pub fn parse_uuid(value: impl AsRef<str>, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value.as_ref()).map_err(|_| {
        Error::invalid_request(format!("{} must be a UUID", field.as_str())).with_details(json!({
            "field": field.as_str(),
            "code": "invalid_uuid",
            "value": value.as_ref(),
        }))
    })
}

/// Parse an optional latitude/longitude pair into a [`GeoPoint`].
///
/// Both or neither coordinate must be present.
///
/// # Errors
/// Returns [`Error::invalid_request`] for half-specified or out-of-range
/// coordinates.
pub fn parse_optional_point(
    lat: Option<f64>,
    lng: Option<f64>,
    field: FieldName,
) -> Result<Option<GeoPoint>, Error> {
    match (lat, lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).map(Some).map_err(|e| {
            Error::invalid_request(e.to_string()).with_details(json!({
                "field": field.as_str(),
                "code": "coordinates_out_of_range",
            }))
        }),
        _ => Err(
            Error::invalid_request(format!("{} requires both lat and lng", field.as_str()))
                .with_details(json!({
                    "field": field.as_str(),
                    "code": "incomplete_coordinates",
                })),
        ),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn parse_uuid_names_the_field() {
        let error = parse_uuid("nope", FieldName::new("rideId")).expect_err("invalid uuid");
        assert_eq!(
            error.details().and_then(|d| d["field"].as_str()),
            Some("rideId")
        );
    }

    #[rstest]
    fn parse_uuid_accepts_valid_input() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_uuid(id.to_string(), FieldName::new("rideId")).expect("valid uuid"),
            id
        );
    }

    #[rstest]
    #[case(Some(1.0), None)]
    #[case(None, Some(1.0))]
    fn half_specified_coordinates_are_rejected(#[case] lat: Option<f64>, #[case] lng: Option<f64>) {
        assert!(parse_optional_point(lat, lng, FieldName::new("pickupPoint")).is_err());
    }

    #[rstest]
    fn absent_coordinates_are_none() {
        assert_eq!(
            parse_optional_point(None, None, FieldName::new("pickupPoint")).expect("valid"),
            None
        );
    }

    #[rstest]
    fn out_of_range_coordinates_are_rejected() {
        assert!(parse_optional_point(Some(91.0), Some(0.0), FieldName::new("pickupPoint")).is_err());
    }
}
