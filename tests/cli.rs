use std::fs;
use std::path::Path;
use std::process::Command;

fn reflect(file: &Path, args: &[&str]) -> serde_json::Value {
    let output = Command::new(env!("CARGO_BIN_EXE_php-reflect"))
        .arg("--file")
        .arg(file)
        .args(args)
        .output()
        .expect("Failed to run php-reflect");
    assert!(
        output.status.success(),
        "php-reflect failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("JSON output")
}

#[test]
fn test_single_class_and_constant() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("shop.php");
    fs::write(
        &file,
        "<?php namespace Shop; const VERSION = 3; class Cart implements \\Countable { public function count(): int {} }",
    )
    .expect("write source file");

    let cart = reflect(&file, &["--kind", "class", "Shop\\Cart"]);
    assert_eq!(cart["name"], "Shop\\Cart");
    assert_eq!(cart["interfaces"][0], "Countable");
    assert_eq!(cart["methods"][0]["return_type"], "int");

    let version = reflect(&file, &["--kind", "constant", "Shop\\VERSION"]);
    assert_eq!(version["name"], "Shop\\VERSION");
    assert_eq!(version["value"], 3);
}
