//! Preference store: read, initialize, reset and update one persisted record.
//!
//! SYSTEM CONTEXT
//! ==============
//! UI code reads through `reactive_get` (see `reactive`), which lands here.
//! Every reading or mutating call first probes the backend with a sentinel
//! write/read/remove. A failed probe is reported once to the [`ReportSink`]
//! and the call short-circuits.
//!
//! DESIGN
//! ======
//! One record per storage key; there is no embedded per-user list. The user
//! id only seeds `meta.userId` when a record is created. Every write persists
//! the whole record.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::backend::{BackendError, StorageBackend};
use crate::config::PackageInfo;
use crate::error::PrefError;
use crate::health::{self, RecordStatus};
use crate::record::{Preference, Record};
use crate::report::{ReportSink, TracingSink};
use crate::timestamp::Timestamp;

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

/// User id seeded into records when the caller does not choose one.
pub const DEFAULT_USER_ID: u64 = 0;

const PROBE_VALUE: &str = "here";

/// Persisted user preferences scoped to one package namespace.
pub struct PreferenceStore<B> {
    backend: B,
    package: PackageInfo,
    user_id: u64,
    sink: Arc<dyn ReportSink>,
    clock: fn() -> Timestamp,
}

impl<B> std::fmt::Debug for PreferenceStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("namespace", &self.package.name())
            .field("schema_version", &self.package.version().to_string())
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl<B: StorageBackend> PreferenceStore<B> {
    pub fn new(backend: B, package: PackageInfo) -> Self {
        Self {
            backend,
            package,
            user_id: DEFAULT_USER_ID,
            sink: Arc::new(TracingSink),
            clock: Timestamp::now,
        }
    }

    /// User id for records that `set_preference` has to create.
    #[must_use]
    pub fn with_user_id(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    pub fn package(&self) -> &PackageInfo {
        &self.package
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    // =========================================================================
    // AVAILABILITY
    // =========================================================================

    /// Trial write, read-back and remove of the sentinel key.
    pub fn is_storage_available(&self) -> bool {
        self.probe().is_ok()
    }

    fn probe(&self) -> Result<(), BackendError> {
        let key = self.package.probe_key();
        self.backend.set(&key, PROBE_VALUE)?;
        let read_back = self.backend.get(&key)?;
        if read_back.as_deref() != Some(PROBE_VALUE) {
            return Err(BackendError::Rejected("probe value did not read back".into()));
        }
        self.backend.remove(&key)
    }

    fn ensure_available(&self) -> Result<(), PrefError> {
        self.probe().map_err(|e| self.unavailable(&e))
    }

    fn unavailable(&self, cause: &BackendError) -> PrefError {
        let err = PrefError::StorageUnavailable { namespace: self.package.name().to_owned() };
        tracing::debug!(namespace = self.package.name(), error = %cause, "storage backend failed");
        self.sink.storage_unavailable(&err.to_string());
        err
    }

    // =========================================================================
    // RECORD
    // =========================================================================

    fn load_raw(&self) -> Result<Option<String>, PrefError> {
        self.backend
            .get(self.package.storage_key())
            .map_err(|e| self.unavailable(&e))
    }

    fn load(&self) -> Result<Option<Record>, PrefError> {
        Ok(self.load_raw()?.as_deref().and_then(Record::decode))
    }

    fn store(&self, record: &Record) -> Result<(), PrefError> {
        let raw = record.encode()?;
        self.backend
            .set(self.package.storage_key(), &raw)
            .map_err(|e| self.unavailable(&e))
    }

    fn fresh(&self, user_id: u64) -> Record {
        Record::new(&self.package, user_id, (self.clock)())
    }

    /// Read the stored record.
    ///
    /// `Ok(None)` when nothing is stored, the value is empty, or it does not
    /// decode.
    ///
    /// # Errors
    ///
    /// [`PrefError::StorageUnavailable`] when the backend fails.
    pub fn read_record(&self) -> Result<Option<Record>, PrefError> {
        self.ensure_available()?;
        self.load()
    }

    /// Write a default record for `user_id` unless one already exists.
    ///
    /// Returns `true` when a record was written. An undecodable stored value
    /// counts as absent and is replaced.
    ///
    /// # Errors
    ///
    /// [`PrefError::StorageUnavailable`] when the backend fails.
    pub fn initialize_record(&self, user_id: u64) -> Result<bool, PrefError> {
        self.ensure_available()?;
        if self.load()?.is_some() {
            return Ok(false);
        }
        self.store(&self.fresh(user_id))?;
        tracing::debug!(namespace = self.package.name(), user_id, "preference record initialized");
        Ok(true)
    }

    /// Overwrite whatever is stored with a default record for `user_id`.
    ///
    /// # Errors
    ///
    /// [`PrefError::StorageUnavailable`] when the backend fails.
    pub fn reset_record(&self, user_id: u64) -> Result<(), PrefError> {
        self.ensure_available()?;
        self.store(&self.fresh(user_id))?;
        tracing::debug!(namespace = self.package.name(), user_id, "preference record reset");
        Ok(())
    }

    /// Delete the stored record entirely.
    ///
    /// # Errors
    ///
    /// [`PrefError::StorageUnavailable`] when the backend fails.
    pub fn remove_record(&self) -> Result<(), PrefError> {
        self.ensure_available()?;
        self.backend
            .remove(self.package.storage_key())
            .map_err(|e| self.unavailable(&e))
    }

    // =========================================================================
    // PREFERENCES
    // =========================================================================

    /// All preferences in stored order; empty when no record exists.
    ///
    /// # Errors
    ///
    /// [`PrefError::StorageUnavailable`] when the backend fails.
    pub fn get_preferences(&self) -> Result<Vec<Preference>, PrefError> {
        Ok(self.read_record()?.map(|r| r.preferences).unwrap_or_default())
    }

    /// All preferences as `code -> value`; empty when no record exists.
    ///
    /// # Errors
    ///
    /// [`PrefError::StorageUnavailable`] when the backend fails.
    pub fn get_preference_map(&self) -> Result<Map<String, Value>, PrefError> {
        Ok(self.read_record()?.map(|r| r.to_map()).unwrap_or_default())
    }

    /// Value stored under `code`, or `default` when there is none or storage
    /// is unavailable.
    pub fn get_preference(&self, code: &str, default: Value) -> Value {
        match self.read_record() {
            Ok(Some(record)) => record.find(code).map_or(default, |p| p.value.clone()),
            Ok(None) | Err(_) => default,
        }
    }

    /// Typed read of `code`. `None` when absent, unavailable, or not a `T`.
    pub fn get_preference_as<T: DeserializeOwned>(&self, code: &str) -> Option<T> {
        match self.get_preference(code, Value::Null) {
            Value::Null => None,
            value => serde_json::from_value(value).ok(),
        }
    }

    /// Store `value` under `code`, overwriting in place or appending.
    ///
    /// Creates the record (seeded with this store's user id) when none exists.
    ///
    /// # Errors
    ///
    /// [`PrefError::StorageUnavailable`] when the backend fails, and
    /// [`PrefError::Encode`] when `value` is not representable as JSON.
    pub fn set_preference<V: Serialize>(&self, code: &str, value: V) -> Result<(), PrefError> {
        let value = serde_json::to_value(value)?;
        self.ensure_available()?;
        let mut record = match self.load()? {
            Some(record) => record,
            None => self.fresh(self.user_id),
        };
        record.upsert(code, value, (self.clock)());
        self.store(&record)?;
        tracing::debug!(namespace = self.package.name(), code, "preference written");
        Ok(())
    }

    // =========================================================================
    // HEALTH
    // =========================================================================

    /// Structural and schema-version health of the stored record.
    pub fn check_record(&self) -> RecordStatus {
        if self.ensure_available().is_err() {
            return RecordStatus::Unavailable;
        }
        match self.load_raw() {
            Ok(Some(raw)) => health::inspect(&raw, self.package.version()),
            Ok(None) => RecordStatus::Missing,
            Err(_) => RecordStatus::Unavailable,
        }
    }

    /// `true` only when a well-formed, current-schema record is stored.
    pub fn validate_record(&self) -> bool {
        self.check_record().is_healthy()
    }
}
