//! Nominatim / `OpenStreetMap` reverse-geocode client.
//!
//! One public entry point, [`reverse_geocode`], wraps a single logical
//! resolution in a bounded retry loop:
//!
//! - network failures, HTTP 5xx, and undecodable bodies are retried
//!   with exponential backoff (2 s, 4 s before the 2nd/3rd attempts);
//! - HTTP 429 additionally sleeps an escalating penalty (10 s, 20 s)
//!   before the next attempt;
//! - other client errors and empty results are terminal — a 404 or an
//!   empty `display_name` will not change on retry.
//!
//! The caller is responsible for pacing requests between calls; see
//! the worker pool's per-request delay.
//!
//! See <https://nominatim.org/release-docs/develop/api/Reverse/>

use crate::registry::ServiceConfig;
use crate::response::ReverseResponse;
use crate::{CoordinatePair, GeocodeError, ResolvedLocation, address};

/// Builds the HTTP client used for all reverse-geocode requests,
/// carrying the identifying `User-Agent` from the service config.
///
/// # Errors
///
/// Returns [`GeocodeError::Network`] if the TLS backend fails to
/// initialize.
pub fn build_client(config: &ServiceConfig) -> Result<reqwest::Client, GeocodeError> {
    Ok(reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()?)
}

/// Resolves a coordinate pair to an administrative location.
///
/// # Errors
///
/// Returns a terminal [`GeocodeError`] once the retry budget is spent
/// (or immediately, for non-retryable failures): [`RateLimited`],
/// [`Upstream`], [`Network`], [`NoResult`], or [`MalformedResponse`].
///
/// [`RateLimited`]: GeocodeError::RateLimited
/// [`Upstream`]: GeocodeError::Upstream
/// [`Network`]: GeocodeError::Network
/// [`NoResult`]: GeocodeError::NoResult
/// [`MalformedResponse`]: GeocodeError::MalformedResponse
pub async fn reverse_geocode(
    client: &reqwest::Client,
    config: &ServiceConfig,
    pair: CoordinatePair,
) -> Result<ResolvedLocation, GeocodeError> {
    let policy = config.retry_policy();

    for attempt in 0..policy.max_attempts {
        let backoff = policy.backoff(attempt);
        if !backoff.is_zero() {
            tokio::time::sleep(backoff).await;
        }

        let response = client
            .get(&config.base_url)
            .query(&[
                ("lat", format!("{:.6}", pair.latitude)),
                ("lon", format!("{:.6}", pair.longitude)),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("accept-language", config.language.clone()),
            ])
            .timeout(config.request_timeout())
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                if policy.is_last_attempt(attempt) {
                    return Err(GeocodeError::Network(e));
                }
                log::debug!("Attempt {}: network error, retrying: {e}", attempt + 1);
                continue;
            }
        };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            if policy.is_last_attempt(attempt) {
                return Err(GeocodeError::RateLimited);
            }
            let penalty = policy.rate_limit_penalty(attempt);
            log::warn!(
                "Attempt {}: rate limited, waiting {:.0}s",
                attempt + 1,
                penalty.as_secs_f64()
            );
            tokio::time::sleep(penalty).await;
            continue;
        }

        if !status.is_success() {
            let retryable = status.is_server_error();
            if retryable && !policy.is_last_attempt(attempt) {
                log::debug!("Attempt {}: status {status}, retrying", attempt + 1);
                continue;
            }
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let decoded = match response.json::<ReverseResponse>().await {
            Ok(d) => d,
            Err(e) => {
                if policy.is_last_attempt(attempt) {
                    return Err(GeocodeError::MalformedResponse);
                }
                log::debug!("Attempt {}: undecodable body, retrying: {e}", attempt + 1);
                continue;
            }
        };

        // An empty display name is a valid negative, not a transient
        // fault — never retried.
        if decoded.display_name.is_empty() {
            return Err(GeocodeError::NoResult);
        }

        let (district, province) = address::extract_district_and_province(&decoded);
        return Ok(ResolvedLocation {
            full_address: address::format_full_address(&decoded),
            district,
            province,
        });
    }

    Err(GeocodeError::RetriesExhausted(policy.max_attempts))
}
