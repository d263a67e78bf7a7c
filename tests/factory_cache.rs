mod common;

use common::{fixture_factory, write_class_file};
use php_static_reflection::finder::CallbackFinder;
use php_static_reflection::reflect::ReflectionFactory;
use php_static_reflection::{Error, Value};

#[test]
fn unknown_classes_are_not_found_until_their_source_is_parsed() {
    let factory = ReflectionFactory::new(CallbackFinder::new(|_| None));
    let err = factory.get_class("Missing").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    factory.parse_source("<?php class Missing {}").unwrap();
    assert!(factory.get_class("Missing").is_ok());
}

#[test]
fn a_parsed_file_caches_every_entity_it_defines() -> anyhow::Result<()> {
    let (_dir, factory) = fixture_factory(&[(
        "Bundle",
        r#"<?php
        class Bundle {}
        class Sidecar {}
        function bundle_helper() {}
    "#,
    )]);
    factory.get_class("Bundle")?;
    // Sidecar and the helper came along even though the finder would never
    // locate them by name.
    assert!(factory.has_class("Sidecar"));
    assert!(factory.get_function("bundle_helper").is_ok());
    Ok(())
}

#[test]
fn a_file_not_defining_the_requested_class_is_not_found() {
    let (_dir, factory) = fixture_factory(&[("Wrong", "<?php class SomethingElse {}")]);
    let err = factory.get_class("Wrong").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    // What the mispointed file did define is cached anyway.
    assert!(factory.has_class("SomethingElse"));
}

#[test]
fn leading_backslashes_are_ignored_in_lookups() {
    let factory = ReflectionFactory::new(CallbackFinder::new(|_| None));
    factory
        .parse_source("<?php namespace App; class Thing {}")
        .unwrap();
    assert!(factory.get_class(r"\App\Thing").is_ok());
    assert!(factory.get_class(r"App\Thing").is_ok());
}

#[test]
fn unload_allows_reparsing_a_mutated_source() -> anyhow::Result<()> {
    let (dir, factory) = fixture_factory(&[(
        "Config",
        "<?php class Config { const VERSION = 1; }",
    )]);
    let config = factory.get_class("Config")?;
    assert_eq!(
        config.get_constant(&factory, "VERSION")?,
        Some(Value::Int(1))
    );

    write_class_file(
        dir.path(),
        "Config",
        "<?php class Config { const VERSION = 2; }",
    );
    // Still the cached entity until it is evicted.
    assert_eq!(
        factory
            .get_class("Config")?
            .get_constant(&factory, "VERSION")?,
        Some(Value::Int(1))
    );

    factory.unload_class("Config");
    assert_eq!(
        factory
            .get_class("Config")?
            .get_constant(&factory, "VERSION")?,
        Some(Value::Int(2))
    );
    Ok(())
}

#[test]
fn functions_can_be_unloaded_independently() {
    let factory = ReflectionFactory::new(CallbackFinder::new(|_| None));
    factory
        .parse_source("<?php function once() {} class Keeper {}")
        .unwrap();
    assert!(factory.has_function("once"));
    factory.unload_function("once");
    assert!(!factory.has_function("once"));
    assert!(factory.has_class("Keeper"));
}

#[test]
fn first_definition_wins_on_repeated_parses() {
    let factory = ReflectionFactory::new(CallbackFinder::new(|_| None));
    factory
        .parse_source("<?php class Dup { const V = 'first'; }")
        .unwrap();
    factory
        .parse_source("<?php class Dup { const V = 'second'; }")
        .unwrap();
    let class = factory.get_class("Dup").unwrap();
    assert_eq!(
        class.get_constant(&factory, "V").unwrap(),
        Some(Value::String("first".into()))
    );
}

#[test]
fn callback_finders_delegate_to_the_host() {
    let (dir, _unused) = fixture_factory(&[("Target", "<?php class Target {}")]);
    let base = dir.path().to_path_buf();
    let factory = ReflectionFactory::new(CallbackFinder::new(move |name| {
        (name == "Target").then(|| base.join("Target.php"))
    }));
    assert!(factory.get_class("Target").is_ok());
    assert!(matches!(
        factory.get_class("Other"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn a_failed_parse_leaves_previously_cached_entities_intact() {
    let (dir, factory) = fixture_factory(&[("Good", "<?php class Good {}")]);
    factory.get_class("Good").unwrap();

    write_class_file(dir.path(), "Bad", "<?php class Bad {");
    assert!(factory.get_class("Bad").is_err());
    assert!(factory.has_class("Good"));
    assert!(!factory.has_class("Bad"));
}
