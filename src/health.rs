//! Structural and schema-version health of a stored record.
//!
//! Works on the raw JSON tree rather than the typed [`Record`] so a broken
//! document can say what is wrong with it instead of just failing to decode.

use std::cmp::Ordering;
use std::collections::HashSet;

use semver::Version;
use serde_json::Value;

use crate::record::Record;
use crate::timestamp::revive_u64;

#[cfg(test)]
#[path = "health_test.rs"]
mod tests;

/// Outcome of [`crate::PreferenceStore::check_record`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordStatus {
    /// The backend failed the availability probe.
    Unavailable,
    /// No record, or an empty value, is stored.
    Missing,
    /// The stored text is not a well-formed record.
    Malformed(String),
    /// The record was written by an older schema than the running one.
    Stale { found: Version, current: Version },
    Healthy,
}

impl RecordStatus {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Classify stored text against the running schema version.
pub(crate) fn inspect(raw: &str, current: &Version) -> RecordStatus {
    if raw.trim().is_empty() {
        return RecordStatus::Missing;
    }
    let tree: Value = match serde_json::from_str(raw) {
        Ok(tree) => tree,
        Err(e) => return RecordStatus::Malformed(format!("not JSON: {e}")),
    };
    let found = match check_structure(&tree) {
        Ok(found) => found,
        Err(reason) => return RecordStatus::Malformed(reason),
    };
    if let Err(e) = serde_json::from_value::<Record>(tree) {
        return RecordStatus::Malformed(format!("record does not decode: {e}"));
    }
    // Precedence ignores build metadata; prerelease still sorts below release.
    if found.cmp_precedence(current) == Ordering::Less {
        return RecordStatus::Stale { found, current: current.clone() };
    }
    RecordStatus::Healthy
}

/// Check required fields and code uniqueness; returns the stored schema version.
fn check_structure(tree: &Value) -> Result<Version, String> {
    let root = tree.as_object().ok_or("record is not a JSON object")?;
    let meta = root
        .get("meta")
        .and_then(Value::as_object)
        .ok_or("meta is missing or not an object")?;

    if !meta.get("userId").is_some_and(|id| revive_u64(id).is_ok()) {
        return Err("meta.userId is missing or not a non-negative integer".to_owned());
    }

    let raw_version = meta
        .get("schemaVersion")
        .or_else(|| meta.get("version"))
        .and_then(Value::as_str)
        .ok_or("meta.schemaVersion is missing or not a string")?;
    let version = Version::parse(raw_version.trim())
        .map_err(|e| format!("meta.schemaVersion '{raw_version}' is not semver: {e}"))?;

    let preferences = root
        .get("preferences")
        .and_then(Value::as_array)
        .ok_or("preferences is missing or not an array")?;
    let mut seen = HashSet::new();
    for (idx, entry) in preferences.iter().enumerate() {
        let code = entry
            .get("code")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("preferences[{idx}] has no string code"))?;
        if !seen.insert(code) {
            return Err(format!("duplicate preference code '{code}'"));
        }
    }

    Ok(version)
}
