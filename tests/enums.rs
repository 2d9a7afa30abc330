mod common;

use common::{class, reflector_for};
use php_reflector::compiler::Value;
use php_reflector::reflection::ReflectionFunctionAbstract;

#[test]
fn test_backed_enum_synthesizes_members() {
    let suit = class(
        r#"<?php
        enum Suit: string {
            case Hearts = 'H';
            case Spades = 'S';

            public function color(): string { return 'Red'; }
        }
    "#,
        "Suit",
    );

    assert!(suit.is_enum());
    assert!(suit.is_backed_enum());
    assert_eq!(suit.get_backing_type().expect("backing type").get_name(), "string");

    let properties: Vec<_> = suit
        .get_immediate_properties(None)
        .iter()
        .map(|property| property.get_name().to_string())
        .collect();
    assert_eq!(properties, vec!["name", "value"]);

    let methods: Vec<_> = suit
        .get_immediate_methods(None)
        .iter()
        .map(|method| method.get_name().to_string())
        .collect();
    assert_eq!(methods, vec!["color", "cases", "from", "tryFrom"]);

    let value = suit.get_property("value").expect("lookup").expect("value");
    assert!(value.is_readonly());
    assert_eq!(value.get_type().expect("typed").to_string(), "string");
    assert_eq!(value.get_declaring_class_name(), "Suit");

    let try_from = suit.get_method("tryfrom").expect("lookup").expect("tryFrom");
    assert!(try_from.is_static());
    assert_eq!(
        try_from.get_return_type().expect("return type").to_string(),
        "?static"
    );
    assert_eq!(try_from.get_number_of_parameters(), 1);

    assert_eq!(
        suit.get_interface_names().expect("interfaces"),
        vec!["UnitEnum", "BackedEnum"]
    );
}

#[test]
fn test_pure_enum_only_has_name_and_cases() {
    let status = class(
        r#"<?php
        enum Status {
            case Active;
            case Archived;
        }
    "#,
        "Status",
    );

    assert!(!status.is_backed_enum());
    assert!(status.get_backing_type().is_none());

    let properties: Vec<_> = status
        .get_immediate_properties(None)
        .iter()
        .map(|property| property.get_name().to_string())
        .collect();
    assert_eq!(properties, vec!["name"]);

    let methods: Vec<_> = status
        .get_immediate_methods(None)
        .iter()
        .map(|method| method.get_name().to_string())
        .collect();
    assert_eq!(methods, vec!["cases"]);
    assert!(!status.has_method("from").expect("lookup"));
    assert_eq!(status.get_interface_names().expect("interfaces"), vec!["UnitEnum"]);
}

#[test]
fn test_cases_values_and_constants() {
    let reflector = reflector_for(
        r#"<?php
        namespace Cards;

        enum Suit: int {
            case Hearts = 1;
            case Spades = self::BASE * 2;

            const BASE = 10;
            const DEFAULT = self::Hearts;
        }
    "#,
    );

    let suit = reflector.reflect_class("Cards\\Suit").expect("reflect Suit");
    let cases: Vec<_> = suit
        .get_cases()
        .iter()
        .map(|case| case.get_name().to_string())
        .collect();
    assert_eq!(cases, vec!["Hearts", "Spades"]);
    assert!(suit.has_case("Spades"));
    assert!(!suit.has_case("spades"));

    let spades = suit.get_case("Spades").expect("Spades");
    assert_eq!(spades.get_enum_name(), "Cards\\Suit");
    assert_eq!(spades.get_backing_value().expect("backing"), Some(Value::Int(20)));
    assert_eq!(
        spades.get_value(),
        Value::EnumCase {
            class: "Cards\\Suit".to_string(),
            case: "Spades".to_string(),
        }
    );

    assert!(!suit.has_constant("Hearts").expect("cases are not constants"));
    assert_eq!(
        suit.get_constant("DEFAULT").expect("DEFAULT"),
        Some(Value::EnumCase {
            class: "Cards\\Suit".to_string(),
            case: "Hearts".to_string(),
        })
    );
}

#[test]
fn test_marker_interfaces_expose_their_properties() {
    let reflector = reflector_for("<?php");

    let unit = reflector.reflect_class("UnitEnum").expect("UnitEnum");
    assert!(unit.is_internal());
    assert!(unit.has_property("name").expect("lookup"));

    let backed = reflector.reflect_class("BackedEnum").expect("BackedEnum");
    let value = backed.get_property("value").expect("lookup").expect("value");
    assert_eq!(value.get_type().expect("typed").to_string(), "int|string");
    assert!(backed.has_property("name").expect("inherited from UnitEnum"));
}
