//! Route endpoints and coordinate value objects.

use serde::{Deserialize, Serialize};

/// Validation errors for [`GeoPoint`] coordinates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoPointValidationError {
    /// Latitude must lie within [-90, 90] degrees.
    #[error("latitude must be within [-90, 90] degrees")]
    LatitudeOutOfRange,
    /// Longitude must lie within [-180, 180] degrees.
    #[error("longitude must be within [-180, 180] degrees")]
    LongitudeOutOfRange,
}

/// A WGS84 coordinate pair.
///
/// # Examples
/// ```
/// use backend::domain::GeoPoint;
///
/// let point = GeoPoint::new(48.8566, 2.3522).expect("valid coordinates");
/// assert_eq!(point.lat(), 48.8566);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Create a validated coordinate pair.
    ///
    /// # Errors
    /// Returns a [`GeoPointValidationError`] when either axis is out of
    /// range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoPointValidationError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(GeoPointValidationError::LatitudeOutOfRange);
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(GeoPointValidationError::LongitudeOutOfRange);
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Linear interpolation toward `target` by `fraction` in `[0, 1]`.
    ///
    /// This exists solely for the opt-in driver position simulation; the
    /// production path receives positions from the client.
    pub fn step_towards(&self, target: Self, fraction: f64) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        Self {
            lat: self.lat + (target.lat - self.lat) * fraction,
            lng: self.lng + (target.lng - self.lng) * fraction,
        }
    }
}

/// A route endpoint: free-text label plus an optional geocoded coordinate.
///
/// Geocoding is owned by an external collaborator, so the coordinate may be
/// absent while the text never is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Location {
    text: String,
    point: Option<GeoPoint>,
}

impl Location {
    /// Create a location from a non-blank label and optional coordinate.
    ///
    /// Returns `None` when the label is blank after trimming.
    pub fn new(text: impl Into<String>, point: Option<GeoPoint>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self { text, point })
    }

    /// Free-text label as entered by the passenger.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Geocoded coordinate, when the external geocoder resolved one.
    pub fn point(&self) -> Option<GeoPoint> {
        self.point
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(90.1, 0.0)]
    #[case(-90.1, 0.0)]
    fn rejects_out_of_range_latitude(#[case] lat: f64, #[case] lng: f64) {
        assert_eq!(
            GeoPoint::new(lat, lng),
            Err(GeoPointValidationError::LatitudeOutOfRange)
        );
    }

    #[rstest]
    #[case(0.0, 180.5)]
    #[case(0.0, -180.5)]
    fn rejects_out_of_range_longitude(#[case] lat: f64, #[case] lng: f64) {
        assert_eq!(
            GeoPoint::new(lat, lng),
            Err(GeoPointValidationError::LongitudeOutOfRange)
        );
    }

    #[rstest]
    fn step_towards_interpolates_linearly() {
        let from = GeoPoint::new(0.0, 0.0).expect("valid origin");
        let to = GeoPoint::new(10.0, -10.0).expect("valid target");
        let half = from.step_towards(to, 0.5);
        assert_eq!(half.lat(), 5.0);
        assert_eq!(half.lng(), -5.0);
    }

    #[rstest]
    fn step_towards_clamps_fraction() {
        let from = GeoPoint::new(0.0, 0.0).expect("valid origin");
        let to = GeoPoint::new(10.0, 10.0).expect("valid target");
        assert_eq!(from.step_towards(to, 7.0), to);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_location_text_is_rejected(#[case] text: &str) {
        assert!(Location::new(text, None).is_none());
    }
}
