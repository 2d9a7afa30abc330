//! Constant-expression compiler.
//!
//! Evaluates the initializer expressions found in declarations (constant
//! values, property and parameter defaults, attribute arguments) without
//! executing any code. Constant references are resolved through the
//! [`Reflector`], so compiling one expression may locate and parse other
//! sources.

pub mod builtin_constants;
pub mod operators;
pub mod value;

pub use value::{ArrayKey, ArrayValue, Value};

use crate::error::{ReflectionError, Result};
use crate::locator::LocatedSource;
use crate::parser::ast::{BinaryOp, Expr, MagicConstKind, Name};
use crate::reflection::{ClassHandle, ReflectionClass};
use crate::reflector::Reflector;
use builtin_constants::intrinsic_constant;
use std::path::Path;
use std::rc::Rc;

/// Result of compiling an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledValue {
    pub value: Value,
    /// Set when the root expression was a constant reference such as `FOO`
    /// or `Foo::BAR`: the name it referred to.
    pub constant_name: Option<String>,
}

/// Where an expression appears: the file, namespace, class and function that
/// `self`, `static`, `parent` and the magic constants refer to.
#[derive(Clone)]
pub struct CompilerContext {
    reflector: Reflector,
    source: Option<Rc<LocatedSource>>,
    namespace: Option<String>,
    class: Option<ClassHandle>,
    function: Option<String>,
    property: Option<String>,
}

impl CompilerContext {
    pub fn new(reflector: Reflector) -> Self {
        Self {
            reflector,
            source: None,
            namespace: None,
            class: None,
            function: None,
            property: None,
        }
    }

    pub fn with_source(mut self, source: Rc<LocatedSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_class(mut self, class: ClassHandle) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn reflector(&self) -> &Reflector {
        &self.reflector
    }

    pub fn source(&self) -> Option<&Rc<LocatedSource>> {
        self.source.as_ref()
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class.as_ref().map(ClassHandle::name)
    }

    pub fn function_name(&self) -> Option<&str> {
        self.function.as_deref()
    }

    fn file_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.file_name())
    }

    fn line_of(&self, expr: &Expr) -> Option<usize> {
        self.source
            .as_ref()
            .map(|source| source.lines(expr.span()).0)
    }

    fn error(&self, expr: &Expr, message: impl Into<String>) -> ReflectionError {
        ReflectionError::unable_to_compile(message, self.file_name(), self.line_of(expr))
    }

    fn current_class(&self, expr: &Expr, keyword: &str) -> Result<Rc<ReflectionClass>> {
        match &self.class {
            Some(class) => class.resolve(&self.reflector),
            None => Err(self.error(
                expr,
                format!("Cannot use \"{keyword}\" when no class scope is active"),
            )),
        }
    }
}

/// Compiles `expr` in `context`.
pub fn compile(expr: &Expr, context: &CompilerContext) -> Result<CompiledValue> {
    let compiler = Compiler { context };
    let (value, constant_name) = match expr {
        Expr::ConstFetch { name, .. } => {
            let (value, resolved) = compiler.constant(name, expr)?;
            (value, Some(resolved))
        }
        Expr::ClassConstFetch {
            class, constant, ..
        } if !constant.name.eq_ignore_ascii_case("class") => {
            let (value, resolved) = compiler.class_constant(class, &constant.name, expr)?;
            (value, Some(resolved))
        }
        _ => (compiler.eval(expr)?, None),
    };
    Ok(CompiledValue {
        value,
        constant_name,
    })
}

struct Compiler<'a> {
    context: &'a CompilerContext,
}

impl Compiler<'_> {
    fn eval(&self, expr: &Expr) -> Result<Value> {
        let context = self.context;
        match expr {
            Expr::Int { value, .. } => Ok(Value::Int(*value)),
            Expr::Float { value, .. } => Ok(Value::Float(*value)),
            Expr::String { value, .. } => Ok(Value::String(value.clone())),
            Expr::Bool { value, .. } => Ok(Value::Bool(*value)),
            Expr::Null { .. } => Ok(Value::Null),
            Expr::Array { items, .. } => self.array(items, expr),
            Expr::ConstFetch { name, .. } => Ok(self.constant(name, expr)?.0),
            Expr::ClassConstFetch {
                class, constant, ..
            } => {
                if constant.name.eq_ignore_ascii_case("class") {
                    self.class_name(class, expr).map(Value::String)
                } else {
                    Ok(self.class_constant(class, &constant.name, expr)?.0)
                }
            }
            Expr::MagicConst { kind, .. } => self.magic(*kind, expr),
            Expr::Unary { op, expr: inner, .. } => {
                let operand = self.eval(inner)?;
                operators::unary(*op, &operand).map_err(|message| context.error(expr, message))
            }
            Expr::Binary {
                left, op, right, ..
            } => self.binary(left, *op, right, expr),
            Expr::Ternary {
                condition,
                if_true,
                if_false,
                ..
            } => {
                let condition = self.eval(condition)?;
                if condition.to_bool() {
                    match if_true {
                        Some(if_true) => self.eval(if_true),
                        None => Ok(condition),
                    }
                } else {
                    self.eval(if_false)
                }
            }
            Expr::ArrayDimFetch { array, dim, .. } => {
                let array = self.eval(array)?;
                let dim = self.eval(dim)?;
                self.dim_fetch(array, &dim, expr)
            }
            Expr::PropertyFetch {
                target,
                property,
                nullsafe,
                ..
            } => {
                let target = self.eval(target)?;
                self.property_fetch(target, &property.name, *nullsafe, expr)
            }
            Expr::New { class, .. } => Err(context.error(
                expr,
                format!("Unable to compile \"new {}\" without executing code", class.original),
            )),
            Expr::Call { name, .. } => Err(context.error(
                expr,
                format!("Unable to compile call to function {}()", name.original),
            )),
            Expr::Unsupported { .. } => {
                Err(context.error(expr, "Unable to compile unsupported expression"))
            }
        }
    }

    fn binary(&self, left: &Expr, op: BinaryOp, right: &Expr, expr: &Expr) -> Result<Value> {
        match op {
            BinaryOp::And => Ok(Value::Bool(
                self.eval(left)?.to_bool() && self.eval(right)?.to_bool(),
            )),
            BinaryOp::Or => Ok(Value::Bool(
                self.eval(left)?.to_bool() || self.eval(right)?.to_bool(),
            )),
            BinaryOp::Coalesce => match self.eval(left)? {
                Value::Null => self.eval(right),
                value => Ok(value),
            },
            _ => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                operators::binary(op, &left, &right)
                    .map_err(|message| self.context.error(expr, message))
            }
        }
    }

    fn array(&self, items: &[crate::parser::ast::ArrayItem], expr: &Expr) -> Result<Value> {
        let mut array = ArrayValue::new();
        for item in items {
            let value = self.eval(&item.value)?;
            if item.unpack {
                let Value::Array(spread) = value else {
                    return Err(self.context.error(expr, "Only arrays can be unpacked"));
                };
                for (key, value) in spread.iter() {
                    match key {
                        ArrayKey::Int(_) => array.push(value.clone()),
                        ArrayKey::Str(_) => array.insert(key.clone(), value.clone()),
                    }
                }
                continue;
            }
            match &item.key {
                Some(key) => {
                    let key = self.eval(key)?;
                    let key = key.to_array_key().ok_or_else(|| {
                        self.context
                            .error(expr, format!("Illegal offset type {}", key.type_name()))
                    })?;
                    array.insert(key, value);
                }
                None => array.push(value),
            }
        }
        Ok(Value::Array(array))
    }

    fn dim_fetch(&self, array: Value, dim: &Value, expr: &Expr) -> Result<Value> {
        match array {
            Value::Array(array) => {
                let key = dim.to_array_key().ok_or_else(|| {
                    self.context
                        .error(expr, format!("Illegal offset type {}", dim.type_name()))
                })?;
                Ok(array.get(&key).cloned().unwrap_or(Value::Null))
            }
            Value::String(s) => {
                let Some(value::Number::Int(offset)) = dim.to_number() else {
                    return Err(self.context.error(expr, "Cannot access offset of type string"));
                };
                let bytes = s.as_bytes();
                let index = if offset < 0 {
                    bytes.len() as i64 + offset
                } else {
                    offset
                };
                Ok(Value::String(
                    usize::try_from(index)
                        .ok()
                        .and_then(|i| bytes.get(i))
                        .map(|b| char::from(*b).to_string())
                        .unwrap_or_default(),
                ))
            }
            Value::EnumCase { .. } => Err(self.context.error(expr, "Cannot use object as array")),
            _ => Ok(Value::Null),
        }
    }

    fn property_fetch(
        &self,
        target: Value,
        property: &str,
        nullsafe: bool,
        expr: &Expr,
    ) -> Result<Value> {
        let Value::EnumCase { class, case } = target else {
            if nullsafe && target == Value::Null {
                return Ok(Value::Null);
            }
            return Err(self.context.error(
                expr,
                format!("Attempt to read property \"{property}\" on {}", target.type_name()),
            ));
        };
        match property {
            "name" => Ok(Value::String(case)),
            "value" => {
                let enum_class = self.context.reflector.reflect_class(&class)?;
                let backing = match enum_class.get_case(&case) {
                    Some(case) => case.get_backing_value()?,
                    None => None,
                };
                backing.ok_or_else(|| {
                    self.context.error(
                        expr,
                        format!("Undefined property {class}::$value"),
                    )
                })
            }
            _ => Err(self
                .context
                .error(expr, format!("Undefined property {class}::${property}"))),
        }
    }

    /// Bare constant: the namespaced name, then the global fallback, then the
    /// engine-intrinsic table.
    fn constant(&self, name: &Name, expr: &Expr) -> Result<(Value, String)> {
        let reflector = &self.context.reflector;
        let candidates = std::iter::once(name.resolved.as_str()).chain(name.fallback.as_deref());
        for candidate in candidates {
            match reflector.reflect_constant(candidate) {
                Ok(constant) => return Ok((constant.get_value()?, constant.get_name().to_string())),
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err),
            }
        }
        let global = name.fallback.as_deref().unwrap_or(&name.resolved);
        if let Some(value) = intrinsic_constant(global, reflector.config()) {
            return Ok((value, global.trim_start_matches('\\').to_string()));
        }
        Err(self
            .context
            .error(expr, format!("Undefined constant \"{}\"", name.original)))
    }

    fn class_for(&self, class: &Name, expr: &Expr) -> Result<Rc<ReflectionClass>> {
        let context = self.context;
        match class.lowercase_resolved().as_str() {
            keyword @ ("self" | "static") => context.current_class(expr, keyword),
            "parent" => context
                .current_class(expr, "parent")?
                .get_parent_class()?
                .ok_or_else(|| {
                    context.error(expr, "Cannot use \"parent\" when current class scope has no parent")
                }),
            _ => match context.reflector.reflect_class(&class.resolved) {
                Err(err) if err.is_not_found() => Err(context.error(
                    expr,
                    format!("Class \"{}\" not found", class.resolved),
                )),
                other => other,
            },
        }
    }

    /// `Foo::class`, which never needs the class itself to exist.
    fn class_name(&self, class: &Name, expr: &Expr) -> Result<String> {
        let context = self.context;
        match class.lowercase_resolved().as_str() {
            keyword @ ("self" | "static") => context
                .class_name()
                .map(str::to_string)
                .ok_or_else(|| {
                    context.error(
                        expr,
                        format!("Cannot use \"{keyword}\" when no class scope is active"),
                    )
                }),
            "parent" => {
                let class = context.current_class(expr, "parent")?;
                class
                    .get_parent_class_name()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        context.error(expr, "Cannot use \"parent\" when current class scope has no parent")
                    })
            }
            _ => Ok(class.resolved.clone()),
        }
    }

    fn class_constant(&self, class: &Name, constant: &str, expr: &Expr) -> Result<(Value, String)> {
        let reflection = self.class_for(class, expr)?;
        let class_name = reflection.get_name().to_string();
        if reflection.is_enum() && reflection.has_case(constant) {
            return Ok((
                Value::EnumCase {
                    class: class_name.clone(),
                    case: constant.to_string(),
                },
                format!("{class_name}::{constant}"),
            ));
        }
        match reflection.get_reflection_constant(constant)? {
            Some(reflection_constant) => Ok((
                reflection_constant.get_value()?,
                format!("{class_name}::{constant}"),
            )),
            None => Err(self
                .context
                .error(expr, format!("Undefined constant {class_name}::{constant}"))),
        }
    }

    fn magic(&self, kind: MagicConstKind, expr: &Expr) -> Result<Value> {
        let context = self.context;
        let text = match kind {
            MagicConstKind::Line => {
                return Ok(Value::Int(context.line_of(expr).unwrap_or(0) as i64));
            }
            MagicConstKind::File => context.file_name().unwrap_or_default().to_string(),
            MagicConstKind::Dir => context
                .file_name()
                .and_then(|file| Path::new(file).parent())
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
            MagicConstKind::Namespace => context.namespace.clone().unwrap_or_default(),
            MagicConstKind::Class => context.class_name().unwrap_or_default().to_string(),
            MagicConstKind::Trait => match &context.class {
                Some(handle) => {
                    let class = handle.resolve(&context.reflector)?;
                    if class.is_trait() {
                        class.get_name().to_string()
                    } else {
                        String::new()
                    }
                }
                None => String::new(),
            },
            MagicConstKind::Function => context.function.clone().unwrap_or_default(),
            MagicConstKind::Method => match (context.class_name(), context.function.as_deref()) {
                (Some(class), Some(function)) => format!("{class}::{function}"),
                (None, Some(function)) => function.to_string(),
                _ => String::new(),
            },
            MagicConstKind::Property => context.property.clone().unwrap_or_default(),
        };
        Ok(Value::String(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{ClassMember, Stmt};
    use crate::parser::parse;

    fn first_class_constant(code: &str) -> Rc<Expr> {
        let program = parse(code.as_bytes());
        let mut found = None;
        program.for_each_statement(|stmt| {
            if let Stmt::ClassLike(class) = stmt
                && let Some(ClassMember::Const(consts)) = class.members.first()
            {
                found = Some(consts.consts[0].value.clone());
            }
        });
        found.expect("class constant")
    }

    #[test]
    fn test_literal_arithmetic() {
        let reflector = Reflector::for_source("<?php");
        let context = CompilerContext::new(reflector);
        let expr = first_class_constant("<?php class X { const A = 1 + 2 * 3 . 'x'; }");
        let compiled = compile(&expr, &context).expect("compiles");
        assert_eq!(compiled.value, Value::String("7x".into()));
        assert_eq!(compiled.constant_name, None);
    }

    #[test]
    fn test_intrinsic_constant_keeps_its_name() {
        let reflector = Reflector::for_source("<?php");
        let context = CompilerContext::new(reflector).with_namespace(Some("App".into()));
        let expr = first_class_constant("<?php namespace App; class X { const A = PHP_INT_SIZE; }");
        let compiled = compile(&expr, &context).expect("compiles");
        assert_eq!(compiled.value, Value::Int(8));
        assert_eq!(compiled.constant_name.as_deref(), Some("PHP_INT_SIZE"));
    }

    #[test]
    fn test_unsupported_expressions_fail() {
        let reflector = Reflector::for_source("<?php");
        let context = CompilerContext::new(reflector);
        let expr = first_class_constant("<?php class X { const A = new Foo(); }");
        assert!(matches!(
            compile(&expr, &context),
            Err(ReflectionError::UnableToCompile { .. })
        ));
        let expr = first_class_constant("<?php class X { const A = UNDEFINED_THING; }");
        assert!(matches!(
            compile(&expr, &context),
            Err(ReflectionError::UnableToCompile { .. })
        ));
    }

    #[test]
    fn test_arrays_and_spread() {
        let reflector = Reflector::for_source("<?php");
        let context = CompilerContext::new(reflector);
        let expr =
            first_class_constant("<?php class X { const A = ['a' => 1, 5 => 'x', 'y', ...[7, 'a' => 2]]; }");
        let Value::Array(array) = compile(&expr, &context).expect("compiles").value else {
            panic!("expected array");
        };
        let keys: Vec<String> = array.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "5", "6", "7"]);
        assert_eq!(array.get(&ArrayKey::Str("a".into())), Some(&Value::Int(2)));
    }
}
