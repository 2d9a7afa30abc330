use anyhow::Context;
use clap::{Parser, ValueEnum};
use php_reflector::compiler::Value;
use php_reflector::locator::{
    AggregateSourceLocator, DirectoriesSourceLocator, MemoizingSourceLocator,
    PhpInternalSourceLocator, SingleFileSourceLocator, SourceLocator,
};
use php_reflector::reflection::{
    ReflectionClass, ReflectionConstant, ReflectionFunctionAbstract, ReflectionParameter,
};
use php_reflector::{Reflector, ReflectorConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "php-reflect")]
#[command(about = "Reflect PHP classes, functions and constants without running them", long_about = None)]
struct Cli {
    /// Directory to scan for .php files (repeatable)
    #[arg(short, long = "dir")]
    dirs: Vec<PathBuf>,

    /// Single file to include (repeatable)
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    /// Modelled PHP_VERSION_ID
    #[arg(long, default_value_t = 80300)]
    php_version: u32,

    /// Kind of symbol to reflect
    #[arg(short, long, value_enum, default_value_t = Kind::Class)]
    kind: Kind,

    /// Reflect every symbol of the kind instead of one name
    #[arg(long)]
    all: bool,

    /// Fully-qualified name to reflect
    #[arg(name = "NAME")]
    name: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Class,
    Function,
    Constant,
}

#[derive(Serialize)]
struct ParameterSummary {
    name: String,
    #[serde(rename = "type")]
    ty: Option<String>,
    optional: bool,
    variadic: bool,
    by_reference: bool,
    default: Option<Value>,
}

#[derive(Serialize)]
struct FunctionSummary {
    name: String,
    file: Option<String>,
    lines: (usize, usize),
    modifiers: Vec<&'static str>,
    parameters: Vec<ParameterSummary>,
    return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    declaring_class: Option<String>,
}

#[derive(Serialize)]
struct PropertySummary {
    name: String,
    modifiers: Vec<&'static str>,
    #[serde(rename = "type")]
    ty: Option<String>,
    default: Option<Value>,
    declaring_class: String,
}

#[derive(Serialize)]
struct ClassSummary {
    name: String,
    kind: String,
    file: Option<String>,
    lines: (usize, usize),
    internal: bool,
    parent: Option<String>,
    interfaces: Vec<String>,
    traits: Vec<String>,
    constants: indexmap::IndexMap<String, Value>,
    cases: Vec<String>,
    properties: Vec<PropertySummary>,
    methods: Vec<FunctionSummary>,
}

#[derive(Serialize)]
struct ConstantSummary {
    name: String,
    file: Option<String>,
    value: Value,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let reflector = build_reflector(&cli)?;

    let output = match (cli.all, cli.name.as_deref()) {
        (true, _) => reflect_all(&reflector, cli.kind)?,
        (false, Some(name)) => reflect_one(&reflector, cli.kind, name)?,
        (false, None) => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            return Ok(());
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn build_reflector(cli: &Cli) -> anyhow::Result<Reflector> {
    let mut aggregate = AggregateSourceLocator::default();
    if !cli.dirs.is_empty() {
        let directories = DirectoriesSourceLocator::new(cli.dirs.clone())
            .context("Failed to open source directories")?;
        aggregate = aggregate.with(Rc::new(directories));
    }
    for file in &cli.files {
        let locator = SingleFileSourceLocator::new(file.clone())
            .with_context(|| format!("Failed to open {}", file.display()))?;
        aggregate = aggregate.with(Rc::new(locator));
    }
    aggregate = aggregate.with(Rc::new(PhpInternalSourceLocator::default()));
    let locator: Rc<dyn SourceLocator> = Rc::new(MemoizingSourceLocator::new(Rc::new(aggregate)));
    Ok(Reflector::with_config(
        locator,
        ReflectorConfig {
            php_version_id: cli.php_version,
        },
    ))
}

fn reflect_one(reflector: &Reflector, kind: Kind, name: &str) -> anyhow::Result<serde_json::Value> {
    Ok(match kind {
        Kind::Class => serde_json::to_value(class_summary(&*reflector.reflect_class(name)?)?)?,
        Kind::Function => serde_json::to_value(function_summary(&*reflector.reflect_function(name)?, None))?,
        Kind::Constant => serde_json::to_value(constant_summary(&*reflector.reflect_constant(name)?)?)?,
    })
}

fn reflect_all(reflector: &Reflector, kind: Kind) -> anyhow::Result<serde_json::Value> {
    Ok(match kind {
        Kind::Class => {
            let classes = reflector.reflect_all_classes()?;
            let summaries = classes
                .iter()
                .map(|class| class_summary(class))
                .collect::<anyhow::Result<Vec<_>>>()?;
            serde_json::to_value(summaries)?
        }
        Kind::Function => {
            let functions = reflector.reflect_all_functions()?;
            let summaries: Vec<_> = functions
                .iter()
                .map(|function| function_summary(&**function, None))
                .collect();
            serde_json::to_value(summaries)?
        }
        Kind::Constant => {
            let constants = reflector.reflect_all_constants()?;
            let summaries = constants
                .iter()
                .map(|constant| constant_summary(constant))
                .collect::<anyhow::Result<Vec<_>>>()?;
            serde_json::to_value(summaries)?
        }
    })
}

fn parameter_summary(param: &ReflectionParameter) -> ParameterSummary {
    ParameterSummary {
        name: param.get_name().to_string(),
        ty: param.get_type().map(|ty| ty.to_string()),
        optional: param.is_optional(),
        variadic: param.is_variadic(),
        by_reference: param.is_passed_by_reference(),
        default: param
            .is_default_value_available()
            .then(|| param.get_default_value().ok())
            .flatten(),
    }
}

fn function_summary(
    function: &dyn ReflectionFunctionAbstract,
    method: Option<(&[&'static str], &str)>,
) -> FunctionSummary {
    let (modifiers, declaring_class) = match method {
        Some((modifiers, class)) => (modifiers.to_vec(), Some(class.to_string())),
        None => (Vec::new(), None),
    };
    FunctionSummary {
        name: function.get_name().to_string(),
        file: function.get_file_name().map(str::to_string),
        lines: (function.get_start_line(), function.get_end_line()),
        modifiers,
        parameters: function
            .get_parameters()
            .iter()
            .map(|param| parameter_summary(param))
            .collect(),
        return_type: function
            .get_return_type()
            .or_else(|| function.get_tentative_return_type())
            .map(|ty| ty.to_string()),
        declaring_class,
    }
}

fn class_summary(class: &ReflectionClass) -> anyhow::Result<ClassSummary> {
    let kind = format!("{:?}", class.get_kind()).to_ascii_lowercase();
    let parent = if class.is_interface() || class.is_trait() {
        None
    } else {
        class.get_parent_class()?.map(|parent| parent.get_name().to_string())
    };
    let properties = class
        .get_properties(None)?
        .iter()
        .map(|property| PropertySummary {
            name: property.get_name().to_string(),
            modifiers: property.get_modifiers().names(),
            ty: property.get_type().map(|ty| ty.to_string()),
            default: property
                .has_default_value()
                .then(|| property.get_default_value().ok())
                .flatten(),
            declaring_class: property.get_declaring_class_name().to_string(),
        })
        .collect();
    let methods = class
        .get_methods(None)?
        .iter()
        .map(|method| {
            let modifiers = method.get_modifiers().names();
            function_summary(&**method, Some((modifiers.as_slice(), method.get_declaring_class_name())))
        })
        .collect();
    Ok(ClassSummary {
        name: class.get_name().to_string(),
        kind,
        file: class.get_file_name().map(str::to_string),
        lines: (class.get_start_line(), class.get_end_line()),
        internal: class.is_internal(),
        parent,
        interfaces: class.get_interface_names()?,
        traits: class.get_trait_names(),
        constants: class.get_constants(None)?,
        cases: class
            .get_cases()
            .iter()
            .map(|case| case.get_name().to_string())
            .collect(),
        properties,
        methods,
    })
}

fn constant_summary(constant: &ReflectionConstant) -> anyhow::Result<ConstantSummary> {
    Ok(ConstantSummary {
        name: constant.get_name().to_string(),
        file: constant.get_file_name().map(str::to_string),
        value: constant.get_value()?,
    })
}
