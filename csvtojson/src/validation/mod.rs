//! Header validation.
//!
//! Runs once, after the header row is read and before any record is
//! transformed, so that a bad configuration never produces partial output.
//!
//! Two checks, in order:
//!
//! 1. **Mapping completeness** - every mapping key must be an incoming header.
//! 2. **Injection clashes** - no injection key may equal an output key the
//!    headers would produce (the mapped name when a mapping is set, the
//!    header itself otherwise).
//!
//! Each check collects every offending key before failing. A failing first
//! check returns without running the second.

use std::collections::HashSet;

use crate::config::{Settings, StringMap};
use crate::error::ValidationError;

/// Validate `settings` against the incoming `headers`.
pub fn validate_headers(settings: &Settings, headers: &[String]) -> Result<(), ValidationError> {
    if let Some(ref mapping) = settings.field_mapping {
        validate_mapping(mapping, headers)?;
    }

    if let Some(ref injection) = settings.injection {
        validate_injection(injection, settings.field_mapping.as_ref(), headers)?;
    }

    Ok(())
}

/// Mapping keys that do not name any header, in mapping order.
pub fn missing_headers(mapping: &StringMap, headers: &[String]) -> Vec<String> {
    let present: HashSet<&str> = headers.iter().map(String::as_str).collect();
    mapping
        .keys()
        .filter(|key| !present.contains(key.as_str()))
        .cloned()
        .collect()
}

/// Injection keys that collide with an output key, in injection order.
pub fn clashing_keys(
    injection: &StringMap,
    mapping: Option<&StringMap>,
    headers: &[String],
) -> Vec<String> {
    let output_keys = output_keys(mapping, headers);
    injection
        .keys()
        .filter(|key| output_keys.contains(key.as_str()))
        .cloned()
        .collect()
}

/// Keys the headers produce in every output object.
///
/// Headers missing from a mapping are dropped and so produce nothing.
pub fn output_keys<'a>(mapping: Option<&'a StringMap>, headers: &'a [String]) -> HashSet<&'a str> {
    match mapping {
        Some(mapping) => headers
            .iter()
            .filter_map(|header| mapping.get(header))
            .map(String::as_str)
            .collect(),
        None => headers.iter().map(String::as_str).collect(),
    }
}

fn validate_mapping(mapping: &StringMap, headers: &[String]) -> Result<(), ValidationError> {
    let missing = missing_headers(mapping, headers);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingHeaders(missing))
    }
}

fn validate_injection(
    injection: &StringMap,
    mapping: Option<&StringMap>,
    headers: &[String],
) -> Result<(), ValidationError> {
    let clashing = clashing_keys(injection, mapping, headers);
    if clashing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::ClashingInjectionKeys(clashing))
    }
}
