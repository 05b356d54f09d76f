#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reverse-geocoding client for placemark.
//!
//! Resolves coordinate pairs to human-readable administrative locations
//! using the Nominatim / `OpenStreetMap` reverse endpoint. The public
//! instance is free but rate limited, so the client carries a bounded
//! retry loop with exponential backoff plus an escalating penalty for
//! explicit HTTP 429 responses (see [`retry::RetryPolicy`]).
//!
//! Duplicate coordinates are common in tabular inputs, so resolved
//! locations are kept in an in-memory [`cache::ResolutionCache`] keyed by
//! the coordinate pair quantized to six decimal places.
//!
//! Service tunables (endpoint, user agent, timeouts, retry delays) are
//! embedded at compile time from `services/nominatim.toml` via the
//! [`registry`] module.

pub mod address;
pub mod cache;
pub mod nominatim;
pub mod registry;
pub mod response;
pub mod retry;

use thiserror::Error;

/// A parsed latitude/longitude pair (WGS84). Immutable once parsed.
///
/// No range validation is performed — out-of-range values are passed
/// through to the geocoder, which may reject them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatePair {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// A resolved administrative location.
///
/// Any of the fields may be empty when the upstream response lacked the
/// corresponding breakdown — empty is a valid, final value, not an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Display address assembled from the address breakdown.
    pub full_address: String,
    /// District (or the closest available analogue).
    pub district: String,
    /// Province / state (or the closest available analogue).
    pub province: String,
}

/// Errors from reverse-geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network-level failure after all attempts.
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP 429 on the final attempt.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Non-success status that is not retryable (or 5xx on the final
    /// attempt).
    #[error("API returned status {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// 2xx response with an empty display name — a valid negative, not
    /// a transient fault.
    #[error("no address found for coordinates")]
    NoResult,

    /// Response body could not be decoded after all attempts.
    #[error("malformed response body")]
    MalformedResponse,

    /// All attempts were consumed without a terminal outcome.
    #[error("failed after {0} attempts")]
    RetriesExhausted(u32),
}
