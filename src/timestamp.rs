//! Write-time stamps carried by records and preferences.
//!
//! DESIGN
//! ======
//! The canonical value is whole epoch seconds. The wire triplet
//! `{epochSeconds, iso8601, displayString}` is rendered from it on encode, and
//! on decode only the epoch field is trusted; the text forms are recomputed.
//! Storage is text, so the epoch may come back as a float (fractional
//! seconds) or a numeric string and is revived to an integer here.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

#[cfg(test)]
#[path = "timestamp_test.rs"]
mod tests;

/// A point in time with second precision, stored as UTC epoch seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    epoch_seconds: i64,
}

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        Self::from_epoch_seconds(OffsetDateTime::now_utc().unix_timestamp())
    }

    #[must_use]
    pub const fn from_epoch_seconds(epoch_seconds: i64) -> Self {
        Self { epoch_seconds }
    }

    #[must_use]
    pub const fn epoch_seconds(self) -> i64 {
        self.epoch_seconds
    }

    fn datetime(self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.epoch_seconds).ok()
    }

    /// RFC 3339 rendering, e.g. `2026-10-17T09:30:00Z`.
    ///
    /// Empty when the epoch is outside the representable calendar range.
    #[must_use]
    pub fn iso8601(self) -> String {
        self.datetime()
            .and_then(|dt| dt.format(&Rfc3339).ok())
            .unwrap_or_default()
    }

    /// Human-readable rendering, e.g. `Saturday, October 17, 2026 9:30:00 AM UTC`.
    #[must_use]
    pub fn display_string(self) -> String {
        let format = format_description!(
            "[weekday], [month repr:long] [day padding:none], [year] [hour repr:12 padding:none]:[minute]:[second] [period] UTC"
        );
        self.datetime()
            .and_then(|dt| dt.format(&format).ok())
            .unwrap_or_default()
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("Timestamp", 3)?;
        out.serialize_field("epochSeconds", &self.epoch_seconds)?;
        out.serialize_field("iso8601", &self.iso8601())?;
        out.serialize_field("displayString", &self.display_string())?;
        out.end()
    }
}

/// Accepted encodings for a stored timestamp.
#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampWire {
    Triplet {
        #[serde(rename = "epochSeconds", alias = "unix", deserialize_with = "revive_i64")]
        epoch_seconds: i64,
    },
    Bare(#[serde(deserialize_with = "revive_i64")] i64),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let epoch_seconds = match TimestampWire::deserialize(deserializer)? {
            TimestampWire::Triplet { epoch_seconds } | TimestampWire::Bare(epoch_seconds) => epoch_seconds,
        };
        Ok(Self::from_epoch_seconds(epoch_seconds))
    }
}

/// Loose numeric input as it may come back from text storage.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

fn loose_to_i64(raw: LooseNumber) -> Option<i64> {
    match raw {
        LooseNumber::Int(v) => Some(v),
        LooseNumber::Float(v) => float_to_i64(v),
        LooseNumber::Text(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(v) => Some(v),
                Err(_) => s.parse::<f64>().ok().and_then(float_to_i64),
            }
        }
    }
}

// Float-to-int `as` saturates, so only non-finite input is rejected.
#[allow(clippy::cast_possible_truncation)]
fn float_to_i64(v: f64) -> Option<i64> {
    v.is_finite().then(|| v.trunc() as i64)
}

/// Revive an integer stored as a number, a float, or numeric text.
pub(crate) fn revive_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = LooseNumber::deserialize(deserializer)?;
    loose_to_i64(raw).ok_or_else(|| de::Error::custom("expected an integer or numeric text"))
}

/// Revive a non-negative integer stored as a number, a float, or numeric text.
pub(crate) fn revive_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = revive_i64(deserializer)?;
    u64::try_from(value).map_err(|_| de::Error::custom("expected a non-negative integer"))
}
