//! Leptos bindings: preferences as reactive state.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components read preferences during render through [`PrefsContext::watch`]
//! or [`PrefsContext::get`]. `localStorage` has no change feed for the page
//! that writes it, so the context carries a revision signal that writes made
//! through it bump; reads track that signal and recompute.
//!
//! TRADE-OFFS
//! ==========
//! Writes that bypass the context (another tab, devtools) are only seen after
//! [`PrefsContext::notify_changed`]. With `hydrate`,
//! [`PrefsContext::listen_for_storage_events`] wires that to the browser's
//! cross-tab `storage` event.

use std::sync::Arc;

use leptos::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::StorageBackend;
use crate::error::PrefError;
use crate::store::PreferenceStore;

#[cfg(test)]
#[path = "reactive_test.rs"]
mod tests;

/// What a reactive read should return.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReactiveOptions {
    /// A single preference code; `None` (or empty) selects the whole mapping.
    pub code: Option<String>,
}

impl ReactiveOptions {
    /// Select every preference as a `code -> value` mapping.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Select one preference's value.
    #[must_use]
    pub fn code(code: impl Into<String>) -> Self {
        Self { code: Some(code.into()) }
    }
}

/// Result of a reactive read.
#[derive(Clone, Debug, PartialEq)]
pub enum PrefView {
    /// Value of the requested code, `Null` when unset.
    Single(Value),
    /// Every stored preference.
    All(Map<String, Value>),
}

impl PrefView {
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Single(value) => Some(value),
            Self::All(_) => None,
        }
    }

    #[must_use]
    pub fn mapping(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Single(_) => None,
            Self::All(map) => Some(map),
        }
    }
}

impl<B: StorageBackend> PreferenceStore<B> {
    /// Render-safe read: one value when `options.code` is set, else the mapping.
    ///
    /// Never writes and never fails; unavailable storage reads as `Null` or an
    /// empty mapping.
    pub fn reactive_get(&self, options: &ReactiveOptions) -> PrefView {
        match options.code.as_deref().filter(|code| !code.is_empty()) {
            Some(code) => PrefView::Single(self.get_preference(code, Value::Null)),
            None => PrefView::All(self.get_preference_map().unwrap_or_default()),
        }
    }
}

/// Shared store plus the revision signal reads subscribe to.
pub struct PrefsContext<B> {
    store: Arc<PreferenceStore<B>>,
    revision: RwSignal<u64>,
}

impl<B> Clone for PrefsContext<B> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), revision: self.revision }
    }
}

impl<B> PrefsContext<B>
where
    B: StorageBackend + Send + Sync + 'static,
{
    pub fn new(store: PreferenceStore<B>) -> Self {
        Self { store: Arc::new(store), revision: RwSignal::new(0) }
    }

    pub fn store(&self) -> &PreferenceStore<B> {
        &self.store
    }

    /// Number of changes seen so far (untracked).
    pub fn revision(&self) -> u64 {
        self.revision.get_untracked()
    }

    /// Tracked read for use inside a component or effect.
    pub fn get(&self, options: &ReactiveOptions) -> PrefView {
        self.revision.track();
        self.store.reactive_get(options)
    }

    /// Derived signal that recomputes whenever the revision moves.
    pub fn watch(&self, options: ReactiveOptions) -> Signal<PrefView> {
        let store = Arc::clone(&self.store);
        let revision = self.revision;
        Signal::derive(move || {
            revision.track();
            store.reactive_get(&options)
        })
    }

    /// Tell readers that storage changed outside this context.
    pub fn notify_changed(&self) {
        self.revision.update(|rev| *rev = rev.wrapping_add(1));
    }

    /// [`PreferenceStore::set_preference`], then notify readers.
    ///
    /// # Errors
    ///
    /// Same as [`PreferenceStore::set_preference`].
    pub fn set_preference<V: Serialize>(&self, code: &str, value: V) -> Result<(), PrefError> {
        self.store.set_preference(code, value)?;
        self.notify_changed();
        Ok(())
    }

    /// [`PreferenceStore::initialize_record`]; notifies only when a record was written.
    ///
    /// # Errors
    ///
    /// Same as [`PreferenceStore::initialize_record`].
    pub fn initialize_record(&self, user_id: u64) -> Result<bool, PrefError> {
        let written = self.store.initialize_record(user_id)?;
        if written {
            self.notify_changed();
        }
        Ok(written)
    }

    /// [`PreferenceStore::reset_record`], then notify readers.
    ///
    /// # Errors
    ///
    /// Same as [`PreferenceStore::reset_record`].
    pub fn reset_record(&self, user_id: u64) -> Result<(), PrefError> {
        self.store.reset_record(user_id)?;
        self.notify_changed();
        Ok(())
    }

    /// [`PreferenceStore::remove_record`], then notify readers.
    ///
    /// # Errors
    ///
    /// Same as [`PreferenceStore::remove_record`].
    pub fn remove_record(&self) -> Result<(), PrefError> {
        self.store.remove_record()?;
        self.notify_changed();
        Ok(())
    }

    /// Bump the revision when another tab changes this store's key.
    #[cfg(feature = "hydrate")]
    pub fn listen_for_storage_events(&self) -> WindowListenerHandle {
        let key = self.store.package().storage_key().to_owned();
        let ctx = self.clone();
        window_event_listener(leptos::ev::storage, move |ev| {
            // A `None` key means the whole storage area was cleared.
            if ev.key().is_none_or(|changed| changed == key) {
                ctx.notify_changed();
            }
        })
    }
}

/// Create a [`PrefsContext`] and provide it to descendant components.
pub fn provide_prefs<B>(store: PreferenceStore<B>) -> PrefsContext<B>
where
    B: StorageBackend + Send + Sync + 'static,
{
    let ctx = PrefsContext::new(store);
    provide_context(ctx.clone());
    ctx
}

/// The [`PrefsContext`] provided by an ancestor, if any.
pub fn use_prefs<B>() -> Option<PrefsContext<B>>
where
    B: StorageBackend + Send + Sync + 'static,
{
    use_context::<PrefsContext<B>>()
}
