mod common;

use common::{class, reflector_for};
use php_reflector::compiler::Value;
use php_reflector::locator::StringSourceLocator;
use php_reflector::reflection::MemberModifiers;
use php_reflector::{ReflectionError, Reflector};
use std::rc::Rc;

#[test]
fn test_arithmetic_and_self_references() {
    let class = class(
        r#"<?php
        class Config {
            const SUM = 1 + 2;
            const OTHER = 5;
            const COPY = self::OTHER;
            const LABEL = 'v' . self::SUM;
            const FLAGS = [self::OTHER => 'five', 'sum' => self::SUM * 2];
        }
    "#,
        "Config",
    );

    assert_eq!(class.get_constant("SUM").expect("SUM"), Some(Value::Int(3)));
    assert_eq!(class.get_constant("COPY").expect("COPY"), Some(Value::Int(5)));
    assert_eq!(
        class.get_constant("LABEL").expect("LABEL"),
        Some(Value::String("v3".to_string()))
    );
    let Some(Value::Array(flags)) = class.get_constant("FLAGS").expect("FLAGS") else {
        panic!("expected an array");
    };
    assert_eq!(flags.len(), 2);
    assert_eq!(class.get_constant("MISSING").expect("lookup"), None);

    let copy = class
        .get_reflection_constant("COPY")
        .expect("lookup")
        .expect("COPY");
    assert_eq!(
        copy.get_value_constant_name().expect("constant name"),
        Some("Config::OTHER".to_string())
    );
}

#[test]
fn test_undeclared_constant_fails_to_compile() {
    let class = class(
        r#"<?php
        class Broken {
            const GOOD = 1;
            const BAD = UNDECLARED_THING;
        }
    "#,
        "Broken",
    );

    let err = class.get_constant("BAD").expect_err("undeclared constant");
    assert!(matches!(err, ReflectionError::UnableToCompile { .. }), "{err:?}");
    assert!(err.to_string().contains("UNDECLARED_THING"));

    // Other constants of the same class are unaffected.
    assert_eq!(class.get_constant("GOOD").expect("GOOD"), Some(Value::Int(1)));
    // The failure is memoized.
    assert_eq!(class.get_constant("BAD").expect_err("still failing"), err);
}

#[test]
fn test_recursive_constants_fail_to_compile() {
    let class = class(
        r#"<?php
        class Loop {
            const A = self::B;
            const B = self::A;
        }
    "#,
        "Loop",
    );

    let err = class.get_constant("A").expect_err("recursive constant");
    let ReflectionError::UnableToCompile { message, .. } = &err else {
        panic!("expected a compile error, got {err:?}");
    };
    assert!(message.starts_with("Recursive constant reference"), "{message}");
}

#[test]
fn test_global_constants_from_const_and_define() {
    let reflector = reflector_for(
        r#"<?php
        namespace App;

        const VERSION = '1.0';
        const MAJOR = 1, MINOR = MAJOR + 1;
        define('APP_NAME', 'demo');

        class Info {
            const FULL = VERSION . '-' . \APP_NAME;
            const LIMIT = PHP_INT_MAX;
        }
    "#,
    );

    let version = reflector.reflect_constant("App\\VERSION").expect("VERSION");
    assert_eq!(version.get_short_name(), "VERSION");
    assert_eq!(version.get_namespace_name(), "App");
    assert_eq!(version.get_value().expect("value"), Value::String("1.0".to_string()));

    let minor = reflector.reflect_constant("app\\MINOR").expect("MINOR");
    assert_eq!(minor.get_value().expect("value"), Value::Int(2));

    let name = reflector.reflect_constant("APP_NAME").expect("APP_NAME");
    assert!(!name.in_namespace());
    assert_eq!(name.get_value().expect("value"), Value::String("demo".to_string()));

    let info = reflector.reflect_class("App\\Info").expect("Info");
    assert_eq!(
        info.get_constant("FULL").expect("FULL"),
        Some(Value::String("1.0-demo".to_string()))
    );
    assert_eq!(
        info.get_constant("LIMIT").expect("LIMIT"),
        Some(Value::Int(i64::MAX))
    );
    let limit = info
        .get_reflection_constant("LIMIT")
        .expect("lookup")
        .expect("LIMIT");
    assert_eq!(
        limit.get_value_constant_name().expect("name"),
        Some("PHP_INT_MAX".to_string())
    );
}

#[test]
fn test_constant_visibility_and_inheritance() {
    let reflector = reflector_for(
        r#"<?php
        interface HasCode {
            const CODE = 'iface';
        }
        class Base implements HasCode {
            public const SHARED = 'base';
            private const SECRET = 'hidden';
            protected const GUARDED = 'guarded';
        }
        final class Derived extends Base {
            final public const SHARED = 'derived';
        }
    "#,
    );

    let derived = reflector.reflect_class("Derived").expect("Derived");
    let names: Vec<_> = derived
        .get_constants(None)
        .expect("constants")
        .keys()
        .cloned()
        .collect();
    assert_eq!(names, vec!["SHARED", "GUARDED", "CODE"]);
    assert!(!derived.has_constant("SECRET").expect("lookup"));
    assert!(!derived.has_constant("shared").expect("case-sensitive"));

    let shared = derived
        .get_reflection_constant("SHARED")
        .expect("lookup")
        .expect("SHARED");
    assert!(shared.is_final());
    assert_eq!(shared.get_declaring_class_name(), "Derived");

    let protected = derived
        .get_constants(Some(MemberModifiers::PROTECTED))
        .expect("protected constants");
    assert_eq!(protected.len(), 1);
    assert_eq!(protected.get("GUARDED"), Some(&Value::String("guarded".to_string())));

    let base = reflector.reflect_class("Base").expect("Base");
    assert_eq!(base.get_immediate_reflection_constants(None).len(), 3);
    let secret = base
        .get_reflection_constant("SECRET")
        .expect("lookup")
        .expect("SECRET");
    assert!(secret.is_private());
}

#[test]
fn test_class_name_and_magic_constants() {
    let class = class(
        r#"<?php
        namespace Shop;
        class Cart {
            const SELF_NAME = self::class;
            const OTHER_NAME = Item::class;
            const NS = __NAMESPACE__;
            const CLS = __CLASS__;
        }
    "#,
        "Shop\\Cart",
    );

    let value = |name: &str| class.get_constant(name).expect(name).expect(name);
    assert_eq!(value("SELF_NAME"), Value::String("Shop\\Cart".to_string()));
    assert_eq!(value("OTHER_NAME"), Value::String("Shop\\Item".to_string()));
    assert_eq!(value("NS"), Value::String("Shop".to_string()));
    assert_eq!(value("CLS"), Value::String("Shop\\Cart".to_string()));
}

#[test]
fn test_calls_and_instantiation_are_not_compiled() {
    let class = class(
        r#"<?php
        class Dynamic {
            const CALL = strlen('abc');
            const MADE = new \stdClass();
        }
    "#,
        "Dynamic",
    );

    for name in ["CALL", "MADE"] {
        assert!(matches!(
            class.get_constant(name),
            Err(ReflectionError::UnableToCompile { .. })
        ));
    }
}

#[test]
fn test_constant_names_are_case_sensitive() {
    let reflector = reflector_for(
        r#"<?php
        class C {
            const a = 1;
            const A = self::a;
        }
        const lower = 2;
        const LOWER = lower;
    "#,
    );

    let c = reflector.reflect_class("C").expect("C");
    assert_eq!(c.get_constant("A").expect("A"), Some(Value::Int(1)));
    assert_eq!(c.get_constant("a").expect("a"), Some(Value::Int(1)));

    let upper = reflector.reflect_constant("LOWER").expect("LOWER");
    assert_eq!(upper.get_value().expect("value"), Value::Int(2));
    assert_eq!(
        upper.get_value_expression_constant_name().expect("name"),
        Some("lower".to_string())
    );
    let lower = reflector.reflect_constant("lower").expect("lower");
    assert_eq!(lower.get_value().expect("value"), Value::Int(2));
}

#[test]
fn test_malformed_define_is_skipped_when_enumerating() {
    let reflector = Reflector::new(Rc::new(StringSourceLocator::new(
        r#"<?php
        const GOOD = 1;
        define('LEGACY', 1, true);
        define('OTHER', 2);
    "#,
    )));

    let constants = reflector.reflect_all_constants().expect("constants");
    let names: Vec<_> = constants
        .iter()
        .map(|constant| constant.get_name().to_string())
        .collect();
    assert_eq!(names, vec!["GOOD", "OTHER"]);

    assert!(matches!(
        reflector.reflect_constant("LEGACY"),
        Err(ReflectionError::InvalidStructure(_))
    ));
}
