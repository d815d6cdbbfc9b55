//! Package-scoped user preference storage over browser `localStorage`.
//!
//! A [`PreferenceStore`] keeps one JSON record per package namespace: a small
//! metadata block plus an ordered list of `code -> value` preferences. It runs
//! on any [`StorageBackend`]; in the browser that is [`BrowserStorage`]
//! (`hydrate` feature). [`PrefsContext`] exposes the store as Leptos reactive
//! state.
//!
//! Storage failures never panic and never leak backend detail: they are
//! reported once to a [`ReportSink`] and returned as
//! [`PrefError::StorageUnavailable`]. Missing or corrupt data reads as
//! `None` or the caller's default.

pub mod backend;
pub mod config;
pub mod error;
pub mod health;
pub mod reactive;
pub mod record;
pub mod report;
pub mod store;
pub mod timestamp;

#[cfg(feature = "hydrate")]
pub use backend::BrowserStorage;
#[cfg(not(target_arch = "wasm32"))]
pub use backend::FileStorage;
pub use backend::{BackendError, MemoryStorage, StorageBackend, UnavailableStorage};
pub use config::{ConfigError, PackageInfo};
pub use error::PrefError;
pub use health::RecordStatus;
pub use reactive::{PrefView, PrefsContext, ReactiveOptions, provide_prefs, use_prefs};
pub use record::{Meta, Preference, Record};
#[cfg(feature = "hydrate")]
pub use report::init_browser_logging;
pub use report::{ReportSink, TracingSink};
pub use store::{DEFAULT_USER_ID, PreferenceStore};
pub use timestamp::Timestamp;
