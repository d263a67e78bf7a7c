mod common;

use common::source_factory;
use php_static_reflection::{Parser, TypeHint, Value};

#[test]
fn positions_hints_and_passing_modes() {
    let mut parser = Parser::new();
    parser
        .parse_source(
            r#"<?php
            namespace App;
            use Vendor\Collection;
            function transform(array $rows, callable $fn, Collection $into, &$out, ...$extra) {}
        "#,
        )
        .unwrap();
    let function = &parser.functions()[r"App\transform"];
    let parameters = function.parameters();
    assert_eq!(parameters.len(), 5);

    assert_eq!(parameters[0].position(), 0);
    assert!(parameters[0].is_array());
    assert!(!parameters[0].allows_null());

    assert!(parameters[1].is_callable());

    assert_eq!(parameters[2].type_hint(), Some(&TypeHint::ClassName(r"Vendor\Collection".into())));
    assert_eq!(parameters[2].class_name(), Some(r"Vendor\Collection"));

    assert!(parameters[3].is_passed_by_reference());
    assert!(!parameters[3].can_be_passed_by_value());

    assert!(parameters[4].is_variadic());
    assert_eq!(parameters[4].position(), 4);
    assert_eq!(function.number_of_required_parameters(), 4);
}

#[test]
fn untyped_parameters_allow_null() {
    let mut parser = Parser::new();
    parser
        .parse_source("<?php function f($anything) {}")
        .unwrap();
    let parameter = &parser.functions()["f"].parameters()[0];
    assert!(parameter.allows_null());
    assert!(parameter.type_hint().is_none());
    assert!(!parameter.is_optional());
}

#[test]
fn defaults_evaluate_lazily() {
    let factory = source_factory(
        r#"<?php
        class Paginator {
            const PER_PAGE = 25;
            public function slice($offset = 0, $limit = self::PER_PAGE, $order = array('id')) {}
        }
    "#,
    );
    let class = factory.get_class("Paginator").unwrap();
    let slice = class.method(&factory, "slice").unwrap().unwrap();
    let parameters = slice.parameters();

    assert_eq!(
        parameters[0].default_value(&factory).unwrap(),
        Some(Value::Int(0))
    );
    assert_eq!(
        parameters[1].default_value(&factory).unwrap(),
        Some(Value::Int(25))
    );
    assert!(matches!(
        parameters[2].default_value(&factory).unwrap(),
        Some(Value::Array(_))
    ));
    assert_eq!(slice.number_of_required_parameters(), 0);
}

#[test]
fn bare_constant_defaults_keep_their_symbolic_name() {
    let factory = source_factory(
        r#"<?php
        function report($level = PHP_INT_MAX, $scale = M_PI, $sum = PHP_INT_MAX + 1) {}
    "#,
    );
    let function = factory.get_function("report").unwrap();
    let parameters = function.parameters();

    assert!(parameters[0].is_default_value_constant());
    assert_eq!(
        parameters[0].default_value_constant_name(),
        Some("PHP_INT_MAX")
    );
    assert_eq!(
        parameters[0].default_value(&factory).unwrap(),
        Some(Value::Int(i64::MAX))
    );

    assert_eq!(parameters[1].default_value_constant_name(), Some("M_PI"));

    // An expression, not a bare name: no symbolic spelling survives.
    assert!(!parameters[2].is_default_value_constant());
    assert!(parameters[2].default_value_constant_name().is_none());
}

#[test]
fn class_constant_defaults_are_not_symbolic() {
    let factory = source_factory(
        r#"<?php
        class C {
            const K = 3;
            public function f($x = self::K) {}
        }
    "#,
    );
    let class = factory.get_class("C").unwrap();
    let method = class.method(&factory, "f").unwrap().unwrap();
    let parameter = &method.parameters()[0];
    assert!(!parameter.is_default_value_constant());
    assert_eq!(parameter.default_value(&factory).unwrap(), Some(Value::Int(3)));
}

#[test]
fn declaring_function_keys_point_back_to_the_owner() {
    let factory = source_factory(
        r#"<?php
        class Owner { public function act($x) {} }
        function free_standing($y) {}
    "#,
    );
    let class = factory.get_class("Owner").unwrap();
    let act = class.method(&factory, "act").unwrap().unwrap();
    assert_eq!(act.parameters()[0].declaring_function_name(), "Owner::act");

    let function = factory.get_function("free_standing").unwrap();
    assert_eq!(
        function.parameters()[0].declaring_function_name(),
        "free_standing"
    );
}

#[test]
fn reference_variadics_parse_in_order() {
    let mut parser = Parser::new();
    parser
        .parse_source("<?php function collect(&...$refs) {}")
        .unwrap();
    let parameter = &parser.functions()["collect"].parameters()[0];
    assert!(parameter.is_passed_by_reference());
    assert!(parameter.is_variadic());
    assert_eq!(parameter.name(), "refs");
}
