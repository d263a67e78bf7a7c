mod common;

use common::source_factory;
use php_static_reflection::{Error, Value};

#[test]
fn parent_members_fill_slots_the_child_leaves_empty() {
    let factory = source_factory(
        r#"<?php
        class Base {
            const K = 1;
            public $shared = 'base';
            private $secret = 'hidden';
            public function plain() {}
            public function overridden($base_version) {}
        }
        class Child extends Base {
            public function overridden($child_version) {}
        }
    "#,
    );
    let child = factory.get_class("Child").unwrap();

    assert!(child.has_method(&factory, "plain").unwrap());
    let overridden = child.method(&factory, "overridden").unwrap().unwrap();
    assert_eq!(overridden.parameters()[0].name(), "child_version");
    assert_eq!(overridden.declaring_class_name(), "Child");

    // Inherited members keep their original declaring class.
    let plain = child.method(&factory, "plain").unwrap().unwrap();
    assert_eq!(plain.declaring_class_name(), "Base");

    assert!(child.has_property(&factory, "shared").unwrap());
    assert!(!child.has_property(&factory, "secret").unwrap());

    assert_eq!(
        child.get_constant(&factory, "K").unwrap(),
        Some(Value::Int(1))
    );
}

#[test]
fn resolving_twice_does_not_duplicate_members() {
    let factory = source_factory(
        r#"<?php
        class Base { public function a() {} public function b() {} }
        class Child extends Base { public function c() {} }
    "#,
    );
    let child = factory.get_class("Child").unwrap();
    let first = child.methods(&factory, None).unwrap();
    let second = child.methods(&factory, None).unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    let names: Vec<&str> = second.iter().map(|m| m.name()).collect();
    assert_eq!(names, ["c", "a", "b"]);
}

#[test]
fn grandparent_members_arrive_through_the_chain() {
    let factory = source_factory(
        r#"<?php
        class A { public function oldest() {} const ROOT = 'a'; }
        class B extends A { public function middle() {} }
        class C extends B { }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    assert!(class.has_method(&factory, "oldest").unwrap());
    assert!(class.has_method(&factory, "middle").unwrap());
    assert_eq!(
        class.get_constant(&factory, "ROOT").unwrap(),
        Some(Value::String("a".into()))
    );
}

#[test]
fn trait_methods_beat_parent_methods() {
    let factory = source_factory(
        r#"<?php
        class P { public function m($from_parent) {} }
        trait T { public function m($from_trait) {} }
        class C extends P { use T; }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let m = class.method(&factory, "m").unwrap().unwrap();
    assert_eq!(m.parameters()[0].name(), "from_trait");
}

#[test]
fn interface_constants_merge_into_implementors() {
    let factory = source_factory(
        r#"<?php
        interface HasLimit { const LIMIT = 10; }
        interface HasName { const NAME = 'iface'; }
        class Impl implements HasLimit, HasName {
            const NAME = 'own';
        }
    "#,
    );
    let class = factory.get_class("Impl").unwrap();
    assert_eq!(
        class.get_constant(&factory, "LIMIT").unwrap(),
        Some(Value::Int(10))
    );
    // The implementor's own redeclaration wins.
    assert_eq!(
        class.get_constant(&factory, "NAME").unwrap(),
        Some(Value::String("own".into()))
    );
}

#[test]
fn interfaces_extend_interfaces() {
    let factory = source_factory(
        r#"<?php
        interface Root { const DEPTH = 0; }
        interface Nested extends Root {}
        class Impl implements Nested {}
    "#,
    );
    let class = factory.get_class("Impl").unwrap();
    assert_eq!(
        class.get_constant(&factory, "DEPTH").unwrap(),
        Some(Value::Int(0))
    );
}

#[test]
fn parent_class_and_interface_queries() {
    let factory = source_factory(
        r#"<?php
        interface Marker {}
        class Base {}
        class Leaf extends Base implements Marker {}
    "#,
    );
    let leaf = factory.get_class("Leaf").unwrap();
    assert_eq!(leaf.parent_class_name(), Some("Base"));
    let parent = leaf.parent_class(&factory).unwrap().unwrap();
    assert_eq!(parent.name(), "Base");
    assert!(leaf.implements_interface("Marker"));
    assert!(!leaf.implements_interface("Absent"));
    let interfaces = leaf.interfaces(&factory).unwrap();
    assert!(interfaces.contains_key("Marker"));
}

#[test]
fn implementing_a_class_is_a_composition_error() {
    let factory = source_factory(
        r#"<?php
        class NotAnInterface {}
        class Wrong implements NotAnInterface {}
    "#,
    );
    let class = factory.get_class("Wrong").unwrap();
    let err = class.get_constant(&factory, "ANY").unwrap_err();
    assert!(matches!(err, Error::Composition(_)));
}

#[test]
fn inheritance_cycles_are_detected() {
    let factory = source_factory(
        r#"<?php
        class Alpha extends Beta {}
        class Beta extends Alpha {}
    "#,
    );
    let class = factory.get_class("Alpha").unwrap();
    let err = class.methods(&factory, None).unwrap_err();
    assert!(matches!(err, Error::Resolution(_)));
    assert!(err.to_string().contains("Circular"), "{}", err);
}

#[test]
fn missing_parents_surface_as_not_found() {
    let factory = source_factory("<?php class Orphan extends NeverDefined {}");
    let class = factory.get_class("Orphan").unwrap();
    let err = class.methods(&factory, None).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn default_properties_collect_evaluated_defaults() {
    let factory = source_factory(
        r#"<?php
        class D {
            const BASE = 2;
            public $a = self::BASE * 5;
            public $b;
        }
    "#,
    );
    let class = factory.get_class("D").unwrap();
    let defaults = class.default_properties(&factory).unwrap();
    assert_eq!(defaults.get("a"), Some(&Some(Value::Int(10))));
    assert_eq!(defaults.get("b"), Some(&None));
}
