mod common;

use common::{CountingLocator, counting_reflector};
use php_reflector::compiler::Value;
use php_reflector::locator::{
    AggregateSourceLocator, AutoloadSourceLocator, DirectoriesSourceLocator,
    MemoizingSourceLocator, MemorySourceLocator, PhpInternalSourceLocator,
    SingleFileSourceLocator, SourceLocator,
};
use php_reflector::reflection::ReflectionFunctionAbstract;
use php_reflector::stubs::{StubData, StubProvider};
use php_reflector::{IdentifierType, ReflectionError, Reflector};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::rc::Rc;

fn write(path: &Path, code: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create directories");
    }
    fs::write(path, code).expect("write source file");
}

#[test]
fn test_single_file_locator() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("greeter.php");
    write(
        &path,
        "<?php\nfunction greet(string $name): string { return $name; }\nclass Greeter {}\n",
    );

    let locator = SingleFileSourceLocator::new(&path).expect("locator");
    let reflector = Reflector::new(Rc::new(locator));

    let class = reflector.reflect_class("Greeter").expect("Greeter");
    assert_eq!(class.get_file_name(), Some(path.display().to_string().as_str()));
    assert_eq!(class.get_start_line(), 3);

    let function = reflector.reflect_function("GREET").expect("greet");
    assert_eq!(function.get_name(), "greet");
    assert_eq!(function.get_start_line(), 2);

    let err = reflector.reflect_class("Missing").expect_err("not declared");
    assert!(err.is_not_found());
}

#[test]
fn test_single_file_locator_requires_an_existing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = SingleFileSourceLocator::new(dir.path().join("absent.php"));
    assert!(matches!(result, Err(ReflectionError::Io { .. })));
}

#[test]
fn test_directories_locator_scans_recursively() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir.path().join("src/Model/User.php"), "<?php namespace App\\Model; class User {}");
    write(
        &dir.path().join("src/Model/Admin.php"),
        "<?php namespace App\\Model; class Admin extends User {}",
    );
    write(&dir.path().join("src/helpers.php"), "<?php function helper() {}");
    write(&dir.path().join("src/notes.txt"), "<?php class NotPhp {}");

    let locator = DirectoriesSourceLocator::new([dir.path().join("src")]).expect("locator");
    let reflector = Reflector::new(Rc::new(locator));

    let admin = reflector.reflect_class("App\\Model\\Admin").expect("Admin");
    assert_eq!(
        admin.get_parent_class().expect("parent").map(|p| p.get_name().to_string()),
        Some("App\\Model\\User".to_string())
    );
    assert!(reflector.reflect_function("helper").is_ok());
    assert!(reflector.try_reflect_class("NotPhp").expect("lookup").is_none());

    let mut classes: Vec<_> = reflector
        .reflect_all_classes()
        .expect("all classes")
        .iter()
        .map(|class| class.get_name().to_string())
        .collect();
    classes.sort();
    assert_eq!(classes, vec!["App\\Model\\Admin", "App\\Model\\User"]);
}

#[test]
fn test_directories_locator_rejects_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("file.php");
    write(&file, "<?php");
    assert!(DirectoriesSourceLocator::new([file]).is_err());
}

#[test]
fn test_autoload_psr4_and_class_map() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        &dir.path().join("lib/Http/Request.php"),
        "<?php namespace Acme\\Http; class Request {}",
    );
    write(
        &dir.path().join("legacy/old.php"),
        "<?php class Legacy_Thing {}",
    );

    let locator = AutoloadSourceLocator::new()
        .with_psr4("Acme\\", [dir.path().join("lib")])
        .with_class_map([("Legacy_Thing", dir.path().join("legacy/old.php"))]);
    let reflector = Reflector::new(Rc::new(locator));

    let request = reflector.reflect_class("Acme\\Http\\Request").expect("Request");
    assert!(request.get_file_name().is_some_and(|file| file.ends_with("Request.php")));
    assert!(reflector.reflect_class("legacy_thing").is_ok());
    assert!(reflector.try_reflect_class("Acme\\Http\\Response").expect("lookup").is_none());
    assert!(reflector.reflect_function("anything").is_err());
}

#[test]
fn test_memory_locator_prefers_newest_snippet() {
    let memory = Rc::new(MemorySourceLocator::new());
    memory.add("<?php class Snippet { const VERSION = 1; }");
    let reflector = Reflector::new(memory.clone());

    let first = reflector.reflect_class("Snippet").expect("first");
    assert_eq!(
        first.get_constant("VERSION").expect("VERSION"),
        Some(php_reflector::compiler::Value::Int(1))
    );
    assert!(first.get_located_source().is_evaled());

    memory.add_named("<?php class Snippet { const VERSION = 2; }", "eval://2");
    let second = reflector.reflect_class("Snippet").expect("second");
    assert_eq!(
        second.get_constant("VERSION").expect("VERSION"),
        Some(php_reflector::compiler::Value::Int(2))
    );
    assert_eq!(second.get_file_name(), Some("eval://2"));
    assert_eq!(memory.len(), 2);
}

#[test]
fn test_aggregate_tries_locators_in_order() {
    let first = MemorySourceLocator::new();
    first.add("<?php class Shared { const FROM = 'first'; }");
    let second = MemorySourceLocator::new();
    second.add("<?php class Shared { const FROM = 'second'; } class OnlySecond {}");

    let aggregate = AggregateSourceLocator::new(vec![Rc::new(first), Rc::new(second)]);
    assert_eq!(aggregate.len(), 2);
    let reflector = Reflector::new(Rc::new(aggregate));

    let shared = reflector.reflect_class("Shared").expect("Shared");
    assert_eq!(
        shared.get_constant("FROM").expect("FROM"),
        Some(php_reflector::compiler::Value::String("first".to_string()))
    );
    assert!(reflector.reflect_class("OnlySecond").is_ok());

    let names: Vec<_> = reflector
        .reflect_all_classes()
        .expect("all classes")
        .iter()
        .map(|class| class.get_name().to_string())
        .collect();
    assert_eq!(names, vec!["Shared", "OnlySecond"]);
}

#[test]
fn test_memoizing_locator_caches_hits_and_misses() {
    let counting = Rc::new(CountingLocator::new("<?php class Cached {}"));
    let memoizing = MemoizingSourceLocator::new(counting.clone());
    let reflector = Reflector::new(Rc::new(memoizing));

    reflector.reflect_class("Cached").expect("first lookup");
    reflector.reflect_class("cached").expect("second lookup");
    assert_eq!(counting.lookups(), 1);

    assert!(reflector.try_reflect_class("Absent").expect("lookup").is_none());
    assert!(reflector.try_reflect_class("Absent").expect("lookup").is_none());
    assert_eq!(counting.lookups(), 2);
}

#[test]
fn test_internal_locator_serves_stub_functions() {
    let reflector = Reflector::new(Rc::new(PhpInternalSourceLocator::default()));

    let strlen = reflector.reflect_function("strlen").expect("strlen");
    assert!(strlen.is_internal());
    assert_eq!(strlen.get_extension_name(), Some("Core"));
    assert_eq!(strlen.get_number_of_parameters(), 1);

    let countable = reflector.reflect_class("Countable").expect("Countable");
    assert!(countable.is_interface());
    assert_eq!(countable.get_extension_name(), Some("Core"));
}

#[test]
fn test_lookups_are_memoized_per_object() {
    let (reflector, counting) = counting_reflector(
        r#"<?php
        interface Named {}
        class Root implements Named { public function root() {} }
        class Leaf extends Root { public function leaf() {} }
    "#,
    );

    let leaf = reflector.reflect_class("Leaf").expect("Leaf");
    let first = leaf.get_methods(None).expect("methods");
    let after_first = counting.lookups();

    let second = leaf.get_methods(None).expect("methods again");
    assert_eq!(counting.lookups(), after_first);
    assert_eq!(first.len(), second.len());
    assert!(first.iter().zip(&second).all(|(a, b)| Rc::ptr_eq(a, b)));

    leaf.get_interface_names().expect("interfaces");
    let after_interfaces = counting.lookups();
    leaf.get_interface_names().expect("interfaces again");
    leaf.get_properties(None).expect("properties");
    leaf.get_properties(None).expect("properties again");
    assert_eq!(counting.lookups(), after_interfaces);
}

#[test]
fn test_compiled_values_are_memoized() {
    let (reflector, counting) = counting_reflector(
        r#"<?php
        class Y { const B = 2; }
        class X {
            const A = Y::B;
            public $limit = Y::B;
            public function run($size = Y::B) {}
        }
    "#,
    );
    let x = reflector.reflect_class("X").expect("X");

    let before = counting.lookups();
    assert_eq!(x.get_constant("A").expect("A"), Some(Value::Int(2)));
    let after_first = counting.lookups();
    assert!(after_first > before);
    assert_eq!(x.get_constant("A").expect("A again"), Some(Value::Int(2)));
    assert_eq!(counting.lookups(), after_first);

    let run = x.get_method("run").expect("lookup").expect("run");
    let size = run.get_parameter("size").expect("size");
    let before = counting.lookups();
    assert_eq!(size.get_default_value().expect("default"), Value::Int(2));
    let after_first = counting.lookups();
    assert!(after_first > before);
    assert_eq!(size.get_default_value().expect("default again"), Value::Int(2));
    assert!(size.is_default_value_constant().expect("constant"));
    assert_eq!(counting.lookups(), after_first);

    let limit = x.get_property("limit").expect("lookup").expect("limit");
    let before = counting.lookups();
    assert_eq!(limit.get_default_value().expect("default"), Value::Int(2));
    let after_first = counting.lookups();
    assert!(after_first > before);
    assert_eq!(limit.get_default_value().expect("default again"), Value::Int(2));
    assert_eq!(counting.lookups(), after_first);
}

/// Serves stub text read at runtime, such as a stubs directory on disk.
struct RuntimeStubs {
    source: String,
}

impl StubProvider for RuntimeStubs {
    fn stub_for(&self, kind: IdentifierType, name: &str) -> Option<StubData> {
        let wanted = name.trim_start_matches('\\').eq_ignore_ascii_case("Ds\\Vector");
        (kind == IdentifierType::Class && wanted).then(|| StubData {
            stub: Cow::Owned(self.source.clone()),
            extension_name: Some("ds".to_string()),
            file_name: Some("ds.php".to_string()),
        })
    }

    fn names(&self, kind: IdentifierType) -> Vec<String> {
        match kind {
            IdentifierType::Class => vec!["Ds\\Vector".to_string()],
            _ => Vec::new(),
        }
    }
}

#[test]
fn test_stub_provider_serves_runtime_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ds.php");
    write(&path, "<?php namespace Ds; final class Vector implements \\Countable { public function count(): int {} }");
    let provider = RuntimeStubs {
        source: fs::read_to_string(&path).expect("read stub"),
    };
    let locator = PhpInternalSourceLocator::new(Box::new(provider));
    let reflector = Reflector::new(Rc::new(locator));

    let vector = reflector.reflect_class("ds\\vector").expect("Vector");
    assert!(vector.is_internal());
    assert!(vector.is_final());
    assert_eq!(vector.get_extension_name(), Some("ds"));
    assert_eq!(vector.get_file_name(), Some("ds.php"));

    let again = reflector.reflect_class("Ds\\Vector").expect("Vector again");
    assert!(Rc::ptr_eq(vector.get_located_source(), again.get_located_source()));
    assert_eq!(reflector.reflect_all_classes().expect("classes").len(), 1);
}

#[test]
fn test_locator_trait_objects_compose() {
    let locators: Vec<Rc<dyn SourceLocator>> = vec![
        Rc::new(CountingLocator::new("<?php function composed() {}")),
        Rc::new(PhpInternalSourceLocator::default()),
    ];
    let reflector = Reflector::new(Rc::new(AggregateSourceLocator::new(locators)));
    let function = reflector.reflect_function("composed").expect("composed");
    assert!(function.is_user_defined());
    assert!(reflector.reflect_class("Stringable").expect("stub").is_internal());
}
