mod common;

use common::reflector_for;
use php_reflector::ReflectionError;
use php_reflector::compiler::Value;
use php_reflector::reflection::{ArgumentKey, AttributeTarget, ReflectionFunctionAbstract};

const CONTROLLER: &str = r#"<?php
namespace App\Http;

#[\Attribute(\Attribute::TARGET_ALL | \Attribute::IS_REPEATABLE)]
class Tag
{
    public function __construct(public string $name, public int $weight = 0) {}
}

#[\Attribute]
class Route {}

#[\Attribute]
class Get extends Route {}

#[Tag('a'), Tag(name: 'b', weight: 2)]
#[Get]
class Controller
{
    #[Tag('const')]
    const VERSION = 1;

    #[Tag('property')]
    public $handler;

    #[Get('/index')]
    public function index(#[\SensitiveParameter] string $secret) {}
}
"#;

#[test]
fn test_class_attributes_and_arguments() {
    let reflector = reflector_for(CONTROLLER);
    let controller = reflector.reflect_class("App\\Http\\Controller").expect("Controller");

    let attributes = controller.get_attributes();
    let names: Vec<_> = attributes.iter().map(|a| a.get_name().to_string()).collect();
    assert_eq!(names, vec!["App\\Http\\Tag", "App\\Http\\Tag", "App\\Http\\Get"]);
    assert!(attributes[0].is_repeated());
    assert!(attributes[1].is_repeated());
    assert!(!attributes[2].is_repeated());
    assert_eq!(attributes[0].get_target(), AttributeTarget::CLASS);
    assert_eq!(attributes[0].get_start_line(), Some(16));

    let first = attributes[0].get_arguments().expect("arguments");
    assert_eq!(
        first.get(&ArgumentKey::Position(0)),
        Some(&Value::String("a".to_string()))
    );
    let second = attributes[1].get_arguments().expect("arguments");
    assert_eq!(
        second.get(&ArgumentKey::Name("name".to_string())),
        Some(&Value::String("b".to_string()))
    );
    assert_eq!(
        second.get(&ArgumentKey::Name("weight".to_string())),
        Some(&Value::Int(2))
    );
    assert!(attributes[2].get_arguments().expect("arguments").is_empty());

    assert!(matches!(
        attributes[0].new_instance(),
        Err(ReflectionError::NotImplemented(_))
    ));
}

#[test]
fn test_filtering_attributes() {
    let reflector = reflector_for(CONTROLLER);
    let controller = reflector.reflect_class("App\\Http\\Controller").expect("Controller");

    assert_eq!(controller.get_attributes_by_name("App\\Http\\Tag").len(), 2);
    assert_eq!(controller.get_attributes_by_name("\\app\\http\\TAG").len(), 2);
    assert!(controller.get_attributes_by_name("Tag").is_empty());

    let routes = controller
        .get_attributes_by_instance("App\\Http\\Route")
        .expect("by instance");
    let names: Vec<_> = routes.iter().map(|a| a.get_name().to_string()).collect();
    assert_eq!(names, vec!["App\\Http\\Get"]);
}

#[test]
fn test_member_attribute_targets() {
    let reflector = reflector_for(CONTROLLER);
    let controller = reflector.reflect_class("App\\Http\\Controller").expect("Controller");

    let index = controller.get_method("index").expect("lookup").expect("index");
    let method_attributes = index.get_attributes();
    assert_eq!(method_attributes.len(), 1);
    assert_eq!(method_attributes[0].get_target(), AttributeTarget::METHOD);
    assert_eq!(
        method_attributes[0].get_arguments().expect("arguments").get(&ArgumentKey::Position(0)),
        Some(&Value::String("/index".to_string()))
    );

    let secret = index.get_parameter("secret").expect("secret");
    let parameter_attributes = secret.get_attributes_by_name("SensitiveParameter");
    assert_eq!(parameter_attributes.len(), 1);
    assert_eq!(parameter_attributes[0].get_target(), AttributeTarget::PARAMETER);

    let handler = controller.get_property("handler").expect("lookup").expect("handler");
    assert_eq!(handler.get_attributes()[0].get_target(), AttributeTarget::PROPERTY);

    let version = controller
        .get_reflection_constant("VERSION")
        .expect("lookup")
        .expect("VERSION");
    let constant_attributes = version.get_attributes_by_name("App\\Http\\Tag");
    assert_eq!(constant_attributes.len(), 1);
    assert_eq!(constant_attributes[0].get_target(), AttributeTarget::CLASS_CONSTANT);
}

#[test]
fn test_functions_have_function_target() {
    let reflector = reflector_for(
        r#"<?php
        #[Deprecated]
        function legacy() {}
    "#,
    );
    let legacy = reflector.reflect_function("legacy").expect("legacy");
    assert_eq!(legacy.get_attributes()[0].get_target(), AttributeTarget::FUNCTION);
    assert!(legacy.is_deprecated());
}
