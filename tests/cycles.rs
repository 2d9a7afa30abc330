mod common;

use common::reflector_for;
use php_reflector::ReflectionError;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Runs `check` on its own thread and fails if it does not finish in time.
fn within_timeout<T: Send + 'static>(check: impl FnOnce() -> T + Send + 'static) -> T {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(check());
    });
    rx.recv_timeout(Duration::from_secs(5))
        .expect("reflection did not terminate")
}

#[test]
fn test_inheritance_cycle_is_reported() {
    let result = within_timeout(|| {
        let reflector = reflector_for(
            r#"<?php
            class A extends B {}
            class B extends A {}
        "#,
        );
        let a = reflector.reflect_class("A")?;
        a.get_parent_class().map(|_| ())
    });

    assert_eq!(
        result,
        Err(ReflectionError::CircularReference {
            chain: vec!["A".into(), "B".into(), "A".into()]
        })
    );
}

#[test]
fn test_inheritance_chain_of_a_cycle_fails() {
    let result = within_timeout(|| {
        let reflector = reflector_for("<?php class Loop extends Loop {}");
        let class = reflector.reflect_class("Loop")?;
        class.get_inheritance_chain().map(|chain| chain.len())
    });

    assert!(matches!(result, Err(ReflectionError::CircularReference { .. })));
}

#[test]
fn test_method_lookup_on_a_cycle_fails() {
    let result = within_timeout(|| {
        let reflector = reflector_for(
            r#"<?php
            class First extends Third { public function a() {} }
            class Second extends First {}
            class Third extends Second {}
        "#,
        );
        let class = reflector.reflect_class("Second")?;
        class.get_methods(None).map(|methods| methods.len())
    });

    assert!(matches!(result, Err(ReflectionError::CircularReference { .. })));
}

#[test]
fn test_interface_cycle_is_reported() {
    let result = within_timeout(|| {
        let reflector = reflector_for(
            r#"<?php
            interface Left extends Right {}
            interface Right extends Left {}
        "#,
        );
        let left = reflector.reflect_class("Left")?;
        left.get_interface_names().map(|names| names.len())
    });

    assert!(matches!(result, Err(ReflectionError::CircularReference { .. })));
}

#[test]
fn test_unrelated_accessors_survive_a_cycle() {
    let result = within_timeout(|| {
        let reflector = reflector_for(
            r#"<?php
            class A extends B { const NAME = 'a'; }
            class B extends A {}
        "#,
        );
        let a = reflector.reflect_class("A")?;
        let parent_failed = a.get_parent_class().is_err();
        Ok::<_, ReflectionError>((parent_failed, a.get_short_name().to_string()))
    });

    assert_eq!(result, Ok((true, "A".to_string())));
}
