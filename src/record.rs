//! Persisted record model: one user's metadata plus an ordered preference list.
//!
//! DESIGN
//! ======
//! Preferences are a `Vec`, not a map, because order (insertion, then
//! in-place update) must round-trip through storage. Lookup is linear; the
//! list holds a handful of entries. Codes are unique; a stored list that
//! repeats a code is collapsed on decode to the first entry for it.

use std::collections::HashSet;

use semver::Version;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::PackageInfo;
use crate::timestamp::{Timestamp, revive_u64};

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;

/// Record metadata, written once at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(deserialize_with = "revive_u64")]
    pub user_id: u64,
    #[serde(alias = "code")]
    pub schema_code: String,
    #[serde(alias = "time")]
    pub created_at: Timestamp,
    #[serde(alias = "version")]
    pub schema_version: Version,
}

/// One named setting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub code: String,
    #[serde(default)]
    pub value: Value,
    #[serde(alias = "time")]
    pub updated_at: Timestamp,
}

/// The whole persisted document for one storage key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub meta: Meta,
    #[serde(default)]
    pub preferences: Vec<Preference>,
}

impl Record {
    /// A fresh record with no preferences, stamped with the current schema.
    #[must_use]
    pub fn new(package: &PackageInfo, user_id: u64, now: Timestamp) -> Self {
        Self {
            meta: Meta {
                user_id,
                schema_code: package.schema_code(),
                created_at: now,
                schema_version: package.version().clone(),
            },
            preferences: Vec::new(),
        }
    }

    /// Decode a stored document. `None` for empty or undecodable text.
    #[must_use]
    pub fn decode(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        match serde_json::from_str::<Self>(raw) {
            Ok(mut record) => {
                record.dedup_codes();
                Some(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored preference record failed to decode; treating as absent");
                None
            }
        }
    }

    /// Keep only the first entry for each code.
    fn dedup_codes(&mut self) {
        let before = self.preferences.len();
        let mut seen = HashSet::new();
        self.preferences.retain(|p| seen.insert(p.code.clone()));
        let dropped = before - self.preferences.len();
        if dropped > 0 {
            tracing::warn!(dropped, "stored preference record repeats codes; keeping the first of each");
        }
    }

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a preference value cannot be encoded.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    #[must_use]
    pub fn find(&self, code: &str) -> Option<&Preference> {
        self.preferences.iter().find(|p| p.code == code)
    }

    /// Overwrite `code` in place, or append it when new.
    pub fn upsert(&mut self, code: &str, value: Value, now: Timestamp) {
        if let Some(existing) = self.preferences.iter_mut().find(|p| p.code == code) {
            existing.value = value;
            existing.updated_at = now;
        } else {
            self.preferences.push(Preference { code: code.to_owned(), value, updated_at: now });
        }
    }

    /// `code -> value` view of the preference list.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.preferences
            .iter()
            .map(|p| (p.code.clone(), p.value.clone()))
            .collect()
    }
}
