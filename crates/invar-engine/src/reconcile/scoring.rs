//! Similarity scoring between azure-side and legacy-side records.
//!
//! Weighted aggregate over the identity signals both records actually
//! carry: exact hardware ids, exact network identifiers, and fuzzy name
//! similarity. Signals absent on either side drop out of the weighted
//! denominator so sparse records are not penalized for data a source
//! never provides.

use strsim::{jaro_winkler, normalized_levenshtein};

use invar_core::types::SourceRecord;

/// Attribute keys carrying hardware identity.
const HARDWARE_KEYS: [&str; 2] = ["bios_uuid", "serial_number"];

/// Attribute keys carrying network identity.
const NETWORK_KEYS: [&str; 2] = ["mac_address", "ip_address"];

/// Weights and acceptance threshold for the matcher.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Minimum score for an automatic match.
    pub auto_accept_threshold: f64,
    /// Weight of exact hardware-id signals (bios uuid, serial number).
    pub hardware_weight: f64,
    /// Weight of exact network-id signals (mac, ip).
    pub network_weight: f64,
    /// Weight of fuzzy name similarity.
    pub name_weight: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            auto_accept_threshold: 0.7,
            hardware_weight: 0.4,
            network_weight: 0.3,
            name_weight: 0.3,
        }
    }
}

/// Score a candidate pair in [0, 1].
#[must_use]
pub fn score_pair(azure: &SourceRecord, legacy: &SourceRecord, config: &MatchConfig) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;

    if let Some(score) = exact_signal(azure, legacy, &HARDWARE_KEYS) {
        weighted += score * config.hardware_weight;
        total_weight += config.hardware_weight;
    }
    if let Some(score) = exact_signal(azure, legacy, &NETWORK_KEYS) {
        weighted += score * config.network_weight;
        total_weight += config.network_weight;
    }
    if let Some(score) = name_similarity(azure, legacy) {
        weighted += score * config.name_weight;
        total_weight += config.name_weight;
    }

    if total_weight == 0.0 {
        return 0.0;
    }
    (weighted / total_weight).clamp(0.0, 1.0)
}

/// Fraction of comparable keys whose values match case-insensitively,
/// `None` when no key is present on both sides.
fn exact_signal(azure: &SourceRecord, legacy: &SourceRecord, keys: &[&str]) -> Option<f64> {
    let mut compared = 0u32;
    let mut matched = 0u32;

    for key in keys {
        if let (Some(a), Some(b)) = (azure.attribute(key), legacy.attribute(key)) {
            compared += 1;
            if a.eq_ignore_ascii_case(b) {
                matched += 1;
            }
        }
    }

    (compared > 0).then(|| f64::from(matched) / f64::from(compared))
}

/// Fuzzy similarity over the best available name, `None` when either
/// side has no usable name.
fn name_similarity(azure: &SourceRecord, legacy: &SourceRecord) -> Option<f64> {
    let a = normalize(azure.attribute("fqdn").unwrap_or(&azure.display_name));
    let b = normalize(legacy.attribute("fqdn").unwrap_or(&legacy.display_name));

    if a.is_empty() || b.is_empty() {
        return None;
    }
    Some(0.5 * jaro_winkler(&a, &b) + 0.5 * normalized_levenshtein(&a, &b))
}

/// Normalize a name for comparison (lowercase, trim, collapse spaces).
fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
