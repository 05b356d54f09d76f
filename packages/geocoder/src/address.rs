//! Address assembly from a Nominatim address breakdown.
//!
//! Nominatim's breakdown fields vary by country and locale:
//! - Thailand/Cambodia responses may carry `subdistrict`/`district`/
//!   `province` where western responses carry `suburb`/`county`/`state`.
//! - Sparse rural results may carry nothing but a display name.
//!
//! This module turns a breakdown into a display address and picks a
//! district and province through ordered fallbacks. A best-effort scan
//! of the free-text display name is the last resort for the district;
//! it is heuristic and locale-specific, and must stay behind the
//! structured fallbacks.

use crate::response::ReverseResponse;

/// Assembles a one-line display address from the breakdown.
///
/// Joins, in order, whichever of {house-number + road, subdistrict or
/// suburb, district or county or state-district, province or state or
/// city, postcode, country} are non-empty. Falls back to the raw
/// display name when the breakdown is entirely empty.
#[must_use]
pub fn format_full_address(resp: &ReverseResponse) -> String {
    let addr = &resp.address;
    let mut parts: Vec<String> = Vec::new();

    if !addr.house_number.is_empty() && !addr.road.is_empty() {
        parts.push(format!("{} {}", addr.house_number, addr.road));
    } else if !addr.road.is_empty() {
        parts.push(addr.road.clone());
    } else if !addr.house_number.is_empty() {
        parts.push(addr.house_number.clone());
    }

    if !addr.subdistrict.is_empty() {
        parts.push(addr.subdistrict.clone());
    } else if !addr.suburb.is_empty() {
        parts.push(addr.suburb.clone());
    }

    if !addr.district.is_empty() {
        parts.push(addr.district.clone());
    } else if !addr.county.is_empty() {
        parts.push(addr.county.clone());
    } else if !addr.state_district.is_empty() {
        parts.push(addr.state_district.clone());
    }

    if !addr.province.is_empty() {
        parts.push(addr.province.clone());
    } else if !addr.state.is_empty() {
        parts.push(addr.state.clone());
    } else if !addr.city.is_empty() {
        parts.push(addr.city.clone());
    }

    if !addr.postcode.is_empty() {
        parts.push(addr.postcode.clone());
    }

    if !addr.country.is_empty() {
        parts.push(addr.country.clone());
    }

    if parts.is_empty() {
        return resp.display_name.clone();
    }

    parts.join(", ")
}

/// Picks a district and a province from the breakdown through
/// independent ordered fallbacks.
///
/// District: district → county → `state_district` → subdistrict →
/// suburb → city (only when no province field is present) → display
/// name scan. Province: province → state → city → country. Either may
/// legitimately resolve to an empty string.
#[must_use]
pub fn extract_district_and_province(resp: &ReverseResponse) -> (String, String) {
    let addr = &resp.address;

    let district = if !addr.district.is_empty() {
        addr.district.clone()
    } else if !addr.county.is_empty() {
        addr.county.clone()
    } else if !addr.state_district.is_empty() {
        addr.state_district.clone()
    } else if !addr.subdistrict.is_empty() {
        addr.subdistrict.clone()
    } else if !addr.suburb.is_empty() {
        addr.suburb.clone()
    } else if !addr.city.is_empty() && addr.province.is_empty() {
        addr.city.clone()
    } else {
        district_from_display_name(resp)
    };

    let province = if !addr.province.is_empty() {
        addr.province.clone()
    } else if !addr.state.is_empty() {
        addr.state.clone()
    } else if !addr.city.is_empty() {
        addr.city.clone()
    } else {
        addr.country.clone()
    };

    (district, province)
}

/// Best-effort recovery of a district from the comma-separated display
/// name.
///
/// Common pattern: `[road], [subdistrict], [district], [province],
/// [country]` — the district usually sits third from the end. Walks
/// from that position downward and returns the first segment that is
/// non-empty and not one of the breakdown's known province/country/
/// city/state values.
fn district_from_display_name(resp: &ReverseResponse) -> String {
    let addr = &resp.address;
    let parts: Vec<&str> = resp.display_name.split(',').collect();

    if parts.len() < 3 {
        return String::new();
    }

    let start = parts.len() - 3;
    for i in (0..=start).rev() {
        let part = parts[i].trim();
        if !part.is_empty()
            && part != addr.province
            && part != addr.country
            && part != addr.city
            && part != addr.state
        {
            return part.to_string();
        }
    }

    String::new()
}
