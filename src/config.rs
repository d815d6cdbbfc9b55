//! Package identity that scopes the storage key and the schema version.
//!
//! SYSTEM CONTEXT
//! ==============
//! Loaded once when the host starts and injected into the store. Nothing in
//! this crate reads package metadata from ambient global state.

use semver::Version;

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

/// Env var naming the storage namespace (usually the host package name).
pub const NAMESPACE_ENV: &str = "USERPREF_NAMESPACE";
/// Env var carrying the current schema version. Defaults to this crate's version.
pub const SCHEMA_VERSION_ENV: &str = "USERPREF_SCHEMA_VERSION";

const PROBE_SUFFIX: &str = ":test";
const SCHEMA_CODE_SUFFIX: &str = ":user:metadata";

/// Error returned when package identity is incomplete or malformed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("package name must not be blank")]
    BlankName,
    #[error("missing config: env var {0} not set")]
    MissingVar(&'static str),
    #[error("invalid schema version '{raw}': {source}")]
    InvalidVersion {
        raw: String,
        #[source]
        source: semver::Error,
    },
}

/// Immutable name + version pair for the host package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageInfo {
    name: String,
    version: Version,
}

impl PackageInfo {
    /// Build package identity from a name and a semantic version string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BlankName`] for an empty or whitespace name and
    /// [`ConfigError::InvalidVersion`] when `version` is not valid semver.
    pub fn new(name: impl Into<String>, version: &str) -> Result<Self, ConfigError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(ConfigError::BlankName);
        }
        let version = parse_version(version)?;
        Ok(Self { name, version })
    }

    /// Build package identity from environment variables.
    ///
    /// Required:
    /// - `USERPREF_NAMESPACE`
    ///
    /// Optional:
    /// - `USERPREF_SCHEMA_VERSION`: defaults to this crate's own version
    ///
    /// # Errors
    ///
    /// See [`PackageInfo::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build package identity from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when the namespace is absent, or
    /// the errors of [`PackageInfo::new`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = lookup(NAMESPACE_ENV).ok_or(ConfigError::MissingVar(NAMESPACE_ENV))?;
        let version = lookup(SCHEMA_VERSION_ENV).unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_owned());
        Self::new(name, &version)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema version records written now are stamped with.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Key holding the single persisted record.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.name
    }

    /// Sentinel key used by the availability probe.
    #[must_use]
    pub fn probe_key(&self) -> String {
        format!("{}{PROBE_SUFFIX}", self.name)
    }

    /// Constant written to `meta.schemaCode`.
    #[must_use]
    pub fn schema_code(&self) -> String {
        format!("{}{SCHEMA_CODE_SUFFIX}", self.name)
    }
}

fn parse_version(raw: &str) -> Result<Version, ConfigError> {
    let trimmed = raw.trim();
    Version::parse(trimmed).map_err(|source| ConfigError::InvalidVersion { raw: trimmed.to_owned(), source })
}

/// Capture the calling crate's `CARGO_PKG_NAME` and `CARGO_PKG_VERSION`.
///
/// Expands to a `Result<PackageInfo, ConfigError>`.
#[macro_export]
macro_rules! package_info {
    () => {
        $crate::PackageInfo::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    };
}
