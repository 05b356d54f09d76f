//! Nominatim reverse-geocode response model.
//!
//! Only the fields placemark consumes are modeled. Every field defaults
//! to empty so partial responses (common outside well-mapped areas)
//! deserialize cleanly.

use serde::Deserialize;

/// Top-level response from the Nominatim `/reverse` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReverseResponse {
    /// Free-text display name. Empty means "no result".
    #[serde(default)]
    pub display_name: String,
    /// Structured address breakdown (`addressdetails=1`).
    #[serde(default)]
    pub address: AddressDetails,
}

/// The nested address breakdown.
///
/// Field availability is language- and locale-dependent; `subdistrict`,
/// `district` and `province` appear for some Southeast Asian locales
/// where `suburb`/`county`/`state` do not.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressDetails {
    #[serde(default)]
    pub house_number: String,
    #[serde(default)]
    pub road: String,
    #[serde(default)]
    pub suburb: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub state_district: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub subdistrict: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub province: String,
}
