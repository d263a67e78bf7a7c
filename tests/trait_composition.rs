mod common;

use common::source_factory;
use php_static_reflection::Error;

#[test]
fn precedence_rule_picks_the_declared_winner() {
    let factory = source_factory(
        r#"<?php
        trait A { public function hello($from_a) { return 'a'; } }
        trait B { public function hello($from_b) { return 'b'; } }
        class C {
            use A, B {
                B::hello insteadof A;
            }
        }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let hello = class.method(&factory, "hello").unwrap().unwrap();
    // The composed method is rebound to the using class, body taken from B.
    assert_eq!(hello.declaring_class_name(), "C");
    assert_eq!(hello.parameters()[0].name(), "from_b");
}

#[test]
fn unresolved_collision_is_a_composition_error() {
    let factory = source_factory(
        r#"<?php
        trait A { public function hello() {} }
        trait B { public function hello() {} }
        class C { use A, B; }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let err = class.methods(&factory, None).unwrap_err();
    assert!(matches!(err, Error::Composition(_)));
    assert!(err.to_string().contains("collides"), "{}", err);
}

#[test]
fn bare_alias_keeps_both_names_with_identical_parameters() {
    let factory = source_factory(
        r#"<?php
        trait A { public function hello($who, $greeting = 'hi') {} }
        class C {
            use A {
                hello as welcome;
            }
        }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    assert!(class.has_method(&factory, "hello").unwrap());
    assert!(class.has_method(&factory, "welcome").unwrap());
    let hello = class.method(&factory, "hello").unwrap().unwrap();
    let welcome = class.method(&factory, "welcome").unwrap().unwrap();
    let names = |m: &php_static_reflection::ReflectionMethod| {
        m.parameters().iter().map(|p| p.name().to_string()).collect::<Vec<_>>()
    };
    assert_eq!(names(&hello), names(&welcome));
}

#[test]
fn alias_can_override_visibility_without_renaming() {
    let factory = source_factory(
        r#"<?php
        trait A { public function hello() {} }
        class C {
            use A {
                hello as protected;
            }
        }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let hello = class.method(&factory, "hello").unwrap().unwrap();
    assert!(hello.is_protected());
    assert!(!hello.is_public());
}

#[test]
fn excluded_trait_method_stays_reachable_through_an_alias() {
    let factory = source_factory(
        r#"<?php
        trait A { public function hello($from_a) {} }
        trait B { public function hello($from_b) {} }
        class C {
            use A, B {
                B::hello insteadof A;
                A::hello as helloFromA;
            }
        }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let main = class.method(&factory, "hello").unwrap().unwrap();
    assert_eq!(main.parameters()[0].name(), "from_b");
    let aliased = class.method(&factory, "helloFromA").unwrap().unwrap();
    assert_eq!(aliased.parameters()[0].name(), "from_a");
    assert_eq!(
        class.trait_aliases().get("helloFromA").map(String::as_str),
        Some("A::hello")
    );
}

#[test]
fn precedence_rule_must_name_declared_traits() {
    let factory = source_factory(
        r#"<?php
        trait A { public function hello() {} }
        class C {
            use A {
                B::hello insteadof A;
            }
        }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let err = class.methods(&factory, None).unwrap_err();
    assert!(err.to_string().contains("wasn't added"), "{}", err);
}

#[test]
fn precedence_rule_must_name_an_existing_method() {
    let factory = source_factory(
        r#"<?php
        trait A { public function hello() {} }
        trait C { public function other() {} }
        class X {
            use A, C {
                A::hello insteadof C;
            }
        }
    "#,
    );
    let class = factory.get_class("X").unwrap();
    let err = class.methods(&factory, None).unwrap_err();
    assert!(err.to_string().contains("does not exist"), "{}", err);
}

#[test]
fn alias_of_an_unknown_method_is_rejected() {
    let factory = source_factory(
        r#"<?php
        trait A { public function hello() {} }
        class C {
            use A {
                missing as present;
            }
        }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let err = class.methods(&factory, None).unwrap_err();
    assert!(matches!(err, Error::Composition(_)));
    assert!(err.to_string().contains("does not exist"), "{}", err);
}

#[test]
fn alias_colliding_with_another_trait_method_is_rejected() {
    let factory = source_factory(
        r#"<?php
        trait A { public function hello() {} }
        trait B { public function hi() {} }
        class C {
            use A, B {
                hello as hi;
            }
        }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let err = class.methods(&factory, None).unwrap_err();
    assert!(err.to_string().contains("collisions"), "{}", err);
}

#[test]
fn using_a_non_trait_is_rejected() {
    let factory = source_factory(
        r#"<?php
        class NotATrait {}
        class C { use NotATrait; }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let err = class.methods(&factory, None).unwrap_err();
    assert!(err.to_string().contains("not a trait"), "{}", err);
}

#[test]
fn trait_properties_and_constants_flow_into_the_class() {
    let factory = source_factory(
        r#"<?php
        trait Counting {
            public $count = 0;
            public function increment() { return ++$this->count; }
        }
        class Widget { use Counting; }
    "#,
    );
    let class = factory.get_class("Widget").unwrap();
    assert!(class.has_property(&factory, "count").unwrap());
    assert!(class.has_method(&factory, "increment").unwrap());
}

#[test]
fn own_methods_win_over_trait_methods() {
    let factory = source_factory(
        r#"<?php
        trait T { public function run($from_trait) {} }
        class C {
            use T;
            public function run($own) {}
        }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let run = class.method(&factory, "run").unwrap().unwrap();
    assert_eq!(run.parameters()[0].name(), "own");
}
