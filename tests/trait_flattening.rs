mod common;

use common::{class, reflector_for};
use php_reflector::reflection::{MemberModifiers, ReflectionFunctionAbstract};

fn method_names(class: &php_reflector::reflection::ReflectionClass) -> Vec<String> {
    class
        .get_methods(None)
        .expect("methods")
        .iter()
        .map(|method| method.get_name().to_string())
        .collect()
}

#[test]
fn test_own_method_wins_over_parent() {
    let reflector = reflector_for(
        r#"<?php
        class Animal {
            public function speak() {}
            public function sleep() {}
        }
        class Dog extends Animal {
            public function speak() {}
            public function fetch() {}
        }
    "#,
    );

    let dog = reflector.reflect_class("Dog").expect("reflect Dog");
    assert_eq!(method_names(&dog), vec!["speak", "fetch", "sleep"]);

    let speak = dog.get_method("SPEAK").expect("lookup").expect("speak");
    assert_eq!(speak.get_declaring_class_name(), "Dog");
    let sleep = dog.get_method("sleep").expect("lookup").expect("sleep");
    assert_eq!(sleep.get_declaring_class_name(), "Animal");
    assert_eq!(sleep.get_implementing_class_name(), "Animal");
}

#[test]
fn test_precedence_excludes_the_losing_copy() {
    let class = class(
        r#"<?php
        trait A { public function foo() { return 'A'; } }
        trait B { public function foo() { return 'B'; } }
        class C {
            use A, B { B::foo insteadof A; }
        }
    "#,
        "C",
    );

    assert_eq!(method_names(&class), vec!["foo"]);
    let foo = class.get_method("foo").expect("lookup").expect("foo");
    assert_eq!(foo.get_declaring_class_name(), "B");
    assert_eq!(foo.get_implementing_class_name(), "C");
    assert_eq!(foo.get_implementing_class().expect("implementing").get_name(), "C");
}

#[test]
fn test_aliases_add_entries_with_their_own_visibility() {
    let class = class(
        r#"<?php
        trait TA {
            public function foo() {}
        }
        trait TB {
            public function bar() {}
        }
        class AliasUser {
            use TA, TB {
                TA::foo as fooAlias;
                bar as baz;
                TB::bar as private barAlias;
                TB::bar as private;
            }
        }
    "#,
        "AliasUser",
    );

    let aliases = class.get_trait_aliases().expect("aliases");
    assert_eq!(aliases.get("fooAlias").map(String::as_str), Some("TA::foo"));
    assert_eq!(aliases.get("baz").map(String::as_str), Some("TB::bar"));
    assert_eq!(aliases.get("barAlias").map(String::as_str), Some("TB::bar"));
    assert_eq!(aliases.len(), 3);

    assert_eq!(
        method_names(&class),
        vec!["foo", "fooAlias", "bar", "baz", "barAlias"]
    );

    let foo_alias = class.get_method("fooalias").expect("lookup").expect("alias");
    assert_eq!(foo_alias.get_alias_name(), Some("fooAlias"));
    assert_eq!(foo_alias.get_declaring_class_name(), "TA");
    assert_eq!(foo_alias.get_implementing_class_name(), "AliasUser");

    let bar = class.get_method("bar").expect("lookup").expect("bar");
    assert!(bar.is_private());
    let baz = class.get_method("baz").expect("lookup").expect("baz");
    assert!(baz.is_public());
    let bar_alias = class.get_method("barAlias").expect("lookup").expect("barAlias");
    assert!(bar_alias.is_private());

    let private = class
        .get_methods(Some(MemberModifiers::PRIVATE))
        .expect("private methods");
    assert_eq!(private.len(), 2);
}

#[test]
fn test_trait_methods_are_distinct_per_class() {
    let reflector = reflector_for(
        r#"<?php
        trait Greets { public function hello() {} }
        class First { use Greets; }
        class Second { use Greets { hello as protected; } }
    "#,
    );

    let first = reflector.reflect_class("First").expect("reflect First");
    let second = reflector.reflect_class("Second").expect("reflect Second");
    let first_hello = first.get_method("hello").expect("lookup").expect("hello");
    let second_hello = second.get_method("hello").expect("lookup").expect("hello");

    assert!(first_hello.is_public());
    assert!(second_hello.is_protected());
    assert_eq!(first_hello.get_implementing_class_name(), "First");
    assert_eq!(second_hello.get_implementing_class_name(), "Second");

    let greets = reflector.reflect_class("Greets").expect("reflect Greets");
    let original = greets.get_method("hello").expect("lookup").expect("hello");
    assert!(original.is_public());
    assert_eq!(original.get_implementing_class_name(), "Greets");
}

#[test]
fn test_concrete_trait_method_replaces_own_abstract_one() {
    let class = class(
        r#"<?php
        trait Runs { public function run() { return 1; } }
        abstract class Job {
            use Runs;
            abstract public function run();
        }
    "#,
        "Job",
    );

    let run = class.get_method("run").expect("lookup").expect("run");
    assert!(!run.is_abstract());
    assert_eq!(run.get_declaring_class_name(), "Runs");
}

#[test]
fn test_own_concrete_method_beats_trait() {
    let class = class(
        r#"<?php
        trait Greets { public function hello() { return 'trait'; } }
        class Own {
            use Greets;
            public function hello() { return 'own'; }
        }
    "#,
        "Own",
    );

    let hello = class.get_method("hello").expect("lookup").expect("hello");
    assert_eq!(hello.get_declaring_class_name(), "Own");
    assert_eq!(method_names(&class), vec!["hello"]);
}

#[test]
fn test_trait_method_beats_inherited_one() {
    let class = class(
        r#"<?php
        trait Greets { public function hello() { return 'trait'; } }
        class ParentGreeter { public function hello() { return 'parent'; } }
        class ChildGreeter extends ParentGreeter { use Greets; }
    "#,
        "ChildGreeter",
    );

    let hello = class.get_method("hello").expect("lookup").expect("hello");
    assert_eq!(hello.get_declaring_class_name(), "Greets");
    assert_eq!(hello.get_implementing_class_name(), "ChildGreeter");
}

#[test]
fn test_base_trait_child_scenario() {
    let class = class(
        r#"<?php
        class Base { public $x = 1; }
        trait T { public function hi() {} }
        class Child extends Base { use T; public function hi() {} }
    "#,
        "Child",
    );

    let methods = class.get_methods(None).expect("methods");
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].get_name(), "hi");
    assert_eq!(methods[0].get_declaring_class_name(), "Child");

    let properties = class.get_properties(None).expect("properties");
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0].get_name(), "x");
    assert_eq!(properties[0].get_declaring_class_name(), "Base");
    assert_eq!(
        class.get_default_properties().expect("defaults").get("x"),
        Some(&php_reflector::compiler::Value::Int(1))
    );
}

#[test]
fn test_trait_properties_and_constants_are_imported() {
    let class = class(
        r#"<?php
        trait HasLabel {
            public const PREFIX = 'label:';
            protected string $label = self::PREFIX . 'none';
        }
        class Widget { use HasLabel; }
    "#,
        "Widget",
    );

    assert_eq!(class.get_trait_names(), vec!["HasLabel"]);
    let label = class.get_property("label").expect("lookup").expect("label");
    assert_eq!(label.get_declaring_class_name(), "HasLabel");
    assert_eq!(
        label.get_implementing_class().expect("implementing").get_name(),
        "Widget"
    );
    assert_eq!(
        label.get_default_value().expect("default"),
        php_reflector::compiler::Value::String("label:none".to_string())
    );
    assert!(class.has_constant("PREFIX").expect("constants"));
}

#[test]
fn test_using_a_class_as_trait_fails() {
    let class = class(
        r#"<?php
        class NotATrait {}
        class User { use NotATrait; }
    "#,
        "User",
    );

    assert!(class.get_traits().is_err());
    assert!(class.get_methods(None).is_err());
}
