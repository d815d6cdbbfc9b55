use super::*;
use crate::backend::{MemoryStorage, UnavailableStorage};
use crate::config::PackageInfo;
use leptos::prelude::{Get, Owner};
use serde_json::json;

fn package() -> PackageInfo {
    PackageInfo::new("my-app", "1.0.0").expect("package")
}

fn memory_store() -> PreferenceStore<MemoryStorage> {
    PreferenceStore::new(MemoryStorage::new(), package())
}

// =============================================================
// ReactiveOptions / PrefView
// =============================================================

#[test]
fn options_default_selects_mapping() {
    assert_eq!(ReactiveOptions::all(), ReactiveOptions { code: None });
    assert_eq!(ReactiveOptions::code("theme").code.as_deref(), Some("theme"));
}

#[test]
fn view_accessors_match_variant() {
    let single = PrefView::Single(json!(1));
    assert_eq!(single.value(), Some(&json!(1)));
    assert!(single.mapping().is_none());

    let all = PrefView::All(Map::new());
    assert!(all.value().is_none());
    assert!(all.mapping().is_some_and(Map::is_empty));
}

// =============================================================
// reactive_get
// =============================================================

#[test]
fn reactive_get_with_code_returns_value() {
    let store = memory_store();
    store.set_preference("theme", "dark").expect("set");
    assert_eq!(store.reactive_get(&ReactiveOptions::code("theme")), PrefView::Single(json!("dark")));
}

#[test]
fn reactive_get_missing_code_is_null() {
    let store = memory_store();
    assert_eq!(store.reactive_get(&ReactiveOptions::code("theme")), PrefView::Single(Value::Null));
}

#[test]
fn reactive_get_without_code_returns_mapping() {
    let store = memory_store();
    store.set_preference("theme", "dark").expect("set");
    store.set_preference("fontSize", 14).expect("set");

    let view = store.reactive_get(&ReactiveOptions::all());
    let map = view.mapping().expect("mapping");
    assert_eq!(map.len(), 2);
    assert_eq!(map["fontSize"], json!(14));
}

#[test]
fn reactive_get_empty_code_selects_mapping() {
    let store = memory_store();
    store.set_preference("theme", "dark").expect("set");
    let view = store.reactive_get(&ReactiveOptions::code(""));
    assert!(view.mapping().is_some());
}

#[test]
fn reactive_get_does_not_create_a_record() {
    let store = memory_store();
    store.reactive_get(&ReactiveOptions::all());
    store.reactive_get(&ReactiveOptions::code("theme"));
    assert!(store.backend().is_empty());
}

#[test]
fn reactive_get_on_unavailable_storage_is_empty() {
    let store = PreferenceStore::new(UnavailableStorage, package());
    assert_eq!(store.reactive_get(&ReactiveOptions::all()), PrefView::All(Map::new()));
    assert_eq!(store.reactive_get(&ReactiveOptions::code("theme")), PrefView::Single(Value::Null));
}

// =============================================================
// PrefsContext
// =============================================================

#[test]
fn context_writes_bump_revision() {
    let ctx = PrefsContext::new(memory_store());
    assert_eq!(ctx.revision(), 0);

    assert!(ctx.initialize_record(1).expect("init"));
    assert_eq!(ctx.revision(), 1);

    assert!(!ctx.initialize_record(1).expect("init again"));
    assert_eq!(ctx.revision(), 1);

    ctx.set_preference("theme", "dark").expect("set");
    ctx.reset_record(2).expect("reset");
    ctx.remove_record().expect("remove");
    assert_eq!(ctx.revision(), 4);
}

#[test]
fn context_failed_write_keeps_revision() {
    let ctx = PrefsContext::new(PreferenceStore::new(UnavailableStorage, package()));
    assert!(ctx.set_preference("theme", "dark").is_err());
    assert_eq!(ctx.revision(), 0);
}

#[test]
fn watched_signal_reflects_context_writes() {
    let ctx = PrefsContext::new(memory_store());
    let theme = ctx.watch(ReactiveOptions::code("theme"));
    assert_eq!(theme.get(), PrefView::Single(Value::Null));

    ctx.set_preference("theme", "dark").expect("set");
    assert_eq!(theme.get(), PrefView::Single(json!("dark")));
}

#[test]
fn external_write_is_seen_after_notify() {
    let ctx = PrefsContext::new(memory_store());
    ctx.store().set_preference("theme", "dark").expect("set");
    ctx.notify_changed();
    assert_eq!(ctx.revision(), 1);
    assert_eq!(ctx.get(&ReactiveOptions::code("theme")), PrefView::Single(json!("dark")));
}

#[test]
fn clones_share_store_and_revision() {
    let ctx = PrefsContext::new(memory_store());
    let other = ctx.clone();
    other.set_preference("theme", "dark").expect("set");
    assert_eq!(ctx.revision(), 1);
    assert_eq!(ctx.store().get_preference("theme", Value::Null), json!("dark"));
}

// =============================================================
// provide_prefs / use_prefs
// =============================================================

#[test]
fn provided_context_is_shared_with_descendants() {
    let owner = Owner::new();
    owner.with(|| {
        let ctx = provide_prefs(memory_store());
        let child = Owner::new();
        child.with(|| {
            let found = use_prefs::<MemoryStorage>().expect("provided context");
            found.set_preference("theme", "dark").expect("set");
        });
        assert_eq!(ctx.revision(), 1);
        assert_eq!(ctx.get(&ReactiveOptions::code("theme")), PrefView::Single(json!("dark")));
    });
}

#[test]
fn use_prefs_without_provider_is_none() {
    let owner = Owner::new();
    owner.with(|| {
        assert!(use_prefs::<MemoryStorage>().is_none());
        provide_prefs(memory_store());
        assert!(use_prefs::<UnavailableStorage>().is_none());
    });
}
