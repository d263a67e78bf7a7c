use php_static_reflection::Parser;

#[test]
fn declarations_are_qualified_by_the_current_namespace() {
    let mut parser = Parser::new();
    parser
        .parse_source(
            r#"<?php
            namespace App\Models;
            class User {}
            interface Persistable {}
            function hydrate() {}
        "#,
        )
        .unwrap();
    assert!(parser.classes().contains_key(r"App\Models\User"));
    assert!(parser.classes().contains_key(r"App\Models\Persistable"));
    assert!(parser.functions().contains_key(r"App\Models\hydrate"));
}

#[test]
fn use_aliases_resolve_parent_and_interface_names() {
    let mut parser = Parser::new();
    parser
        .parse_source(
            r#"<?php
            namespace App;
            use Vendor\Lib\Base as LibBase;
            use Other\Thing;
            class User extends LibBase implements Thing, \External\Iface {}
        "#,
        )
        .unwrap();
    let class = &parser.classes()[r"App\User"];
    assert_eq!(class.parent_class_name(), Some(r"Vendor\Lib\Base"));
    assert_eq!(
        class.interface_names(),
        [r"Other\Thing".to_string(), r"External\Iface".to_string()]
    );
}

#[test]
fn aliases_apply_to_the_first_segment_only() {
    let mut parser = Parser::new();
    parser
        .parse_source(
            r#"<?php
            namespace App;
            use Vendor\Lib as L;
            class A extends L\Widget {}
            class B extends Unknown\Widget {}
        "#,
        )
        .unwrap();
    assert_eq!(
        parser.classes()[r"App\A"].parent_class_name(),
        Some(r"Vendor\Lib\Widget")
    );
    // No alias match: the name is relative to the current namespace.
    assert_eq!(
        parser.classes()[r"App\B"].parent_class_name(),
        Some(r"App\Unknown\Widget")
    );
}

#[test]
fn namespace_relative_names_ignore_aliases() {
    let mut parser = Parser::new();
    parser
        .parse_source(
            r#"<?php
            namespace App;
            use Vendor\Q;
            class P extends namespace\Q {}
        "#,
        )
        .unwrap();
    assert_eq!(
        parser.classes()[r"App\P"].parent_class_name(),
        Some(r"App\Q")
    );
}

#[test]
fn braced_and_global_namespace_blocks() {
    let mut parser = Parser::new();
    parser
        .parse_source(
            r#"<?php
            namespace A {
                class One {}
            }
            namespace {
                class Two {}
            }
            namespace B\C {
                class Three {}
            }
        "#,
        )
        .unwrap();
    let names: Vec<&String> = parser.classes().keys().collect();
    assert_eq!(names, [r"A\One", "Two", r"B\C\Three"]);
}

#[test]
fn function_and_const_imports_do_not_alias_classes() {
    let mut parser = Parser::new();
    parser
        .parse_source(
            r#"<?php
            namespace App;
            use function Vendor\helper;
            use const Vendor\FLAG;
            use Vendor\Widget;
            class Holder extends Widget {}
        "#,
        )
        .unwrap();
    assert_eq!(
        parser.classes()[r"App\Holder"].parent_class_name(),
        Some(r"Vendor\Widget")
    );
}

#[test]
fn grouped_use_list_registers_every_alias() {
    let mut parser = Parser::new();
    parser
        .parse_source(
            r#"<?php
            use Vendor\One, Vendor\Two as Double;
            class A extends One implements Double {}
        "#,
        )
        .unwrap();
    let class = &parser.classes()["A"];
    assert_eq!(class.parent_class_name(), Some(r"Vendor\One"));
    assert_eq!(class.interface_names(), [r"Vendor\Two".to_string()]);
}

#[test]
fn short_and_namespace_name_accessors() {
    let mut parser = Parser::new();
    parser
        .parse_source("<?php namespace Deep\\Nest; class Leaf {}")
        .unwrap();
    let class = &parser.classes()[r"Deep\Nest\Leaf"];
    assert_eq!(class.short_name(), "Leaf");
    assert_eq!(class.namespace_name(), r"Deep\Nest");
    assert!(class.in_namespace());
}
