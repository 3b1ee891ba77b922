//! Test conditions encoded in recording identifiers.
//!
//! Recordings are named like `monotribe_cutoff_50_resonance_30.wav`: an
//! optional device prefix followed by alternating key and value tokens
//! separated by underscores.

use std::collections::BTreeMap;

use serde::Serialize;

/// A key/value pair whose value is not a number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedPair {
    /// Key token.
    pub key: String,
    /// Value token that failed to parse.
    pub value: String,
}

/// Conditions parsed from one identifier, plus the pairs that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedConditions {
    /// Condition name to value.
    pub values: BTreeMap<String, f64>,
    /// Pairs skipped because the value was not numeric.
    pub malformed: Vec<MalformedPair>,
}

/// Parse test conditions from a recording identifier.
///
/// A trailing `.wav` is ignored. When the second token is numeric the
/// identifier has no prefix and pairing starts at the first token
/// (`cutoff_50_resonance_30`); otherwise the first token is a prefix and
/// pairing starts after it (`monotribe_cutoff_50`). Only finite numbers
/// count as values. Pairs with any other value are reported in
/// [`ParsedConditions::malformed`] and parsing continues; a trailing key with
/// no value is dropped.
///
/// ```rust
/// use tribecal_calibrate::parse_conditions;
///
/// let parsed = parse_conditions("monotribe_cutoff_50_resonance_30.wav");
/// assert_eq!(parsed.values["cutoff"], 50.0);
/// assert_eq!(parsed.values["resonance"], 30.0);
/// ```
pub fn parse_conditions(identifier: &str) -> ParsedConditions {
    let stem = identifier.strip_suffix(".wav").unwrap_or(identifier);
    let tokens: Vec<&str> = stem.split('_').collect();

    let has_prefix = tokens.len() > 1 && finite_value(tokens[1]).is_none();
    let start = usize::from(has_prefix);

    let mut parsed = ParsedConditions::default();
    for pair in tokens[start..].chunks_exact(2) {
        let (key, value) = (pair[0], pair[1]);
        match finite_value(value) {
            Some(v) => {
                parsed.values.insert(key.to_string(), v);
            }
            None => {
                tracing::warn!(identifier, key, value, "skipping malformed condition");
                parsed.malformed.push(MalformedPair {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }

    parsed
}

/// A token as a condition value. `inf` and `nan` parse as floats but are not values.
fn finite_value(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}
