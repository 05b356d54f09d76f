//! Parses raw `"lat,lng"` cell text into a coordinate pair.

use placemark_geocoder::CoordinatePair;
use thiserror::Error;

/// Why a coordinate cell could not be parsed. Always row-local: callers
/// skip the row, they never abort the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The cell was empty after trimming.
    #[error("empty coordinates")]
    EmptyInput,

    /// No comma separator.
    #[error("invalid format, expected 'lat,lng'")]
    BadFormat,

    /// The latitude side did not parse as a decimal number.
    #[error("invalid latitude: {0:?}")]
    BadLatitude(String),

    /// The longitude side did not parse as a decimal number.
    #[error("invalid longitude: {0:?}")]
    BadLongitude(String),
}

/// Parses a coordinate cell.
///
/// The input is trimmed, split on the first comma, and each side is
/// trimmed and parsed as `f64`. No range validation — out-of-range
/// values pass through to the geocoder.
///
/// # Errors
///
/// Returns [`ParseError`] naming which part of the text was unusable.
pub fn parse_coordinates(text: &str) -> Result<CoordinatePair, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let Some((lat, lng)) = text.split_once(',') else {
        return Err(ParseError::BadFormat);
    };

    let lat = lat.trim();
    let lng = lng.trim();

    let latitude = lat
        .parse::<f64>()
        .map_err(|_| ParseError::BadLatitude(lat.to_string()))?;
    let longitude = lng
        .parse::<f64>()
        .map_err(|_| ParseError::BadLongitude(lng.to_string()))?;

    Ok(CoordinatePair {
        latitude,
        longitude,
    })
}
