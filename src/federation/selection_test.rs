use super::catalog::ConfiguredCatalog;
use super::selection::{SelectionError, SourceRegistry};
use crate::test_helpers::factories::SourceFactory;

fn registry() -> SourceRegistry {
    SourceRegistry::new(vec![
        SourceFactory::sparql("a"),
        SourceFactory::sparql("b"),
        SourceFactory::compound("c"),
    ])
}

#[test]
fn new_registry_selects_nothing() {
    let registry = registry();
    assert_eq!(registry.entries().len(), 3);
    assert_eq!(registry.selected().count(), 0);
    assert!(registry.entries().iter().all(|e| !e.disabled));
}

#[test]
fn toggle_flips_selection() {
    let mut registry = registry();
    assert_eq!(registry.toggle("b"), Ok(true));
    assert_eq!(registry.selected_identifiers(), vec!["b"]);
    assert_eq!(registry.toggle("b"), Ok(false));
    assert!(registry.selected_identifiers().is_empty());
}

#[test]
fn unknown_source_is_rejected() {
    let mut registry = registry();
    assert_eq!(
        registry.toggle("zzz"),
        Err(SelectionError::UnknownSource("zzz".into()))
    );
    assert_eq!(
        registry.set_selected("zzz", true),
        Err(SelectionError::UnknownSource("zzz".into()))
    );
}

#[test]
fn disabled_source_cannot_be_selected_but_can_be_cleared() {
    let mut registry = registry();
    registry.set_selected("a", true).unwrap();
    registry.set_disabled("a", true).unwrap();

    assert_eq!(
        registry.set_selected("a", true),
        Err(SelectionError::SourceDisabled("a".into()))
    );
    assert_eq!(registry.toggle("a"), Ok(false));
    assert!(!registry.get("a").unwrap().selected);
}

#[test]
fn select_exactly_replaces_previous_selection() {
    let mut registry = registry();
    registry.select_exactly(&["a", "b"]);
    registry.select_exactly(&["c", "unknown"]);

    assert_eq!(registry.selected_identifiers(), vec!["c"]);
}

#[test]
fn select_exactly_keeps_registry_order() {
    let mut registry = registry();
    registry.select_exactly(&["c", "a"]);
    assert_eq!(registry.selected_identifiers(), vec!["a", "c"]);
}

#[test]
fn from_catalog_applies_default_selection() {
    let catalog = ConfiguredCatalog::new(
        vec![SourceFactory::sparql("a"), SourceFactory::compound("c")],
        vec!["c".to_string()],
    );
    let registry = SourceRegistry::from_catalog(&catalog);

    assert_eq!(registry.entries().len(), 2);
    assert_eq!(registry.selected_identifiers(), vec!["c"]);
}
