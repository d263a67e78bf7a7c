use php_static_reflection::Parser;

fn parse_err(source: &str) -> String {
    let mut parser = Parser::new();
    let err = parser.parse_source(source).unwrap_err();
    assert!(parser.classes().is_empty());
    err.to_string()
}

#[test]
fn duplicate_access_modifiers_are_rejected() {
    let message = parse_err("<?php class A { public public function f() {} }");
    assert!(
        message.contains("Multiple access type modifiers are not allowed"),
        "{}",
        message
    );
    let message = parse_err("<?php class A { public protected $x; }");
    assert!(message.contains("Multiple access type modifiers are not allowed"));
}

#[test]
fn duplicate_static_modifier_is_rejected() {
    let message = parse_err("<?php class A { static static function f() {} }");
    assert!(
        message.contains("Multiple static modifiers are not allowed"),
        "{}",
        message
    );
}

#[test]
fn abstract_and_final_conflict_on_members() {
    let message = parse_err("<?php class A { abstract final function f(); }");
    assert!(
        message.contains("Cannot use the final modifier on an abstract class member"),
        "{}",
        message
    );
    let message = parse_err("<?php class A { final abstract function f(); }");
    assert!(message.contains("Cannot use the final modifier on an abstract class member"));
}

#[test]
fn abstract_and_final_conflict_on_classes() {
    let message = parse_err("<?php final abstract class A {}");
    assert!(
        message.contains("Cannot use the final modifier on an abstract class"),
        "{}",
        message
    );
    let message = parse_err("<?php abstract abstract class A {}");
    assert!(message.contains("Multiple abstract modifiers are not allowed"));
}

#[test]
fn abstract_methods_cannot_have_a_body() {
    let message = parse_err("<?php abstract class A { abstract function f() {} }");
    assert!(message.contains("cannot contain body"), "{}", message);
    let message = parse_err("<?php interface I { function f() {} }");
    assert!(message.contains("cannot contain body"), "{}", message);
}

#[test]
fn concrete_methods_must_have_a_body() {
    let message = parse_err("<?php class A { function f(); }");
    assert!(message.contains("must contain body"), "{}", message);
}

#[test]
fn properties_cannot_be_abstract_or_final() {
    let message = parse_err("<?php class A { abstract $x; }");
    assert!(
        message.contains("Properties cannot be declared abstract"),
        "{}",
        message
    );
    let message = parse_err("<?php class A { final $x; }");
    assert!(message.contains("Properties cannot be declared final"));
}
