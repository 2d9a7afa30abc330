use super::attribute::{self, AttributeTarget, ReflectionAttribute};
use super::function::FunctionLike;
use super::types::{ReflectionType, collapse_nullable};
use super::{ClassHandle, ReflectionClass, ReflectionFunction, ReflectionMethod};
use crate::compiler::{CompiledValue, CompilerContext, Value, compile};
use crate::error::{ReflectionError, Result};
use crate::locator::LocatedSource;
use crate::parser::ast::{FunctionDecl, Param};
use crate::reflector::Reflector;
use std::cell::OnceCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Back-reference from a parameter to the function that declares it.
#[derive(Debug, Clone)]
pub enum DeclaringFunction {
    Function {
        /// `None` for closures, which cannot be looked up again by name.
        name: Option<String>,
        function: Weak<ReflectionFunction>,
    },
    Method {
        class: ClassHandle,
        name: String,
        method: Weak<ReflectionMethod>,
    },
}

#[derive(Debug, Clone)]
pub enum FunctionRef {
    Function(Rc<ReflectionFunction>),
    Method(Rc<ReflectionMethod>),
}

impl FunctionRef {
    pub fn get_name(&self) -> &str {
        use super::ReflectionFunctionAbstract;
        match self {
            FunctionRef::Function(function) => function.get_name(),
            FunctionRef::Method(method) => method.get_name(),
        }
    }
}

pub struct ReflectionParameter {
    reflector: Reflector,
    source: Rc<LocatedSource>,
    function: Rc<FunctionDecl>,
    position: usize,
    declaring: DeclaringFunction,
    class: Option<ClassHandle>,
    context: CompilerContext,
    default: OnceCell<Result<CompiledValue>>,
    attributes: OnceCell<Vec<Rc<ReflectionAttribute>>>,
}

impl fmt::Debug for ReflectionParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionParameter")
            .field("name", &self.param().name.name)
            .field("position", &self.position)
            .finish()
    }
}

impl ReflectionParameter {
    pub(crate) fn new(core: &FunctionLike, position: usize, declaring: DeclaringFunction) -> Self {
        Self {
            reflector: core.reflector.clone(),
            source: core.source.clone(),
            function: core.decl.clone(),
            position,
            declaring,
            class: core.class.clone(),
            context: core.context.clone(),
            default: OnceCell::new(),
            attributes: OnceCell::new(),
        }
    }

    fn param(&self) -> &Param {
        &self.function.params[self.position]
    }

    /// Name without the leading `$`.
    pub fn get_name(&self) -> &str {
        &self.param().name.name
    }

    pub fn get_position(&self) -> usize {
        self.position
    }

    /// Variadic, or defaulted with only optional parameters after it.
    pub fn is_optional(&self) -> bool {
        self.function.params[self.position..]
            .iter()
            .all(|param| param.variadic || param.default.is_some())
    }

    pub fn is_variadic(&self) -> bool {
        self.param().variadic
    }

    pub fn is_passed_by_reference(&self) -> bool {
        self.param().by_ref
    }

    pub fn can_be_passed_by_value(&self) -> bool {
        !self.param().by_ref
    }

    /// Constructor parameters with a visibility or `readonly` modifier.
    pub fn is_promoted(&self) -> bool {
        !self.param().modifiers.is_empty()
    }

    pub fn has_type(&self) -> bool {
        self.param().ty.is_some()
    }

    /// The declared type. A `null` default makes the type implicitly
    /// nullable.
    pub fn get_type(&self) -> Option<ReflectionType> {
        let param = self.param();
        let implicitly_nullable = param
            .default
            .as_ref()
            .is_some_and(|default| default.is_null_literal());
        param.ty.as_ref().map(|node| {
            collapse_nullable(ReflectionType::create_from_node(
                &self.reflector,
                self.class.as_ref(),
                node,
                implicitly_nullable,
            ))
        })
    }

    pub fn allows_null(&self) -> bool {
        self.get_type().is_none_or(|ty| ty.allows_null())
    }

    pub fn is_default_value_available(&self) -> bool {
        self.param().default.is_some()
    }

    fn compiled_default(&self) -> Result<CompiledValue> {
        self.default
            .get_or_init(|| match &self.param().default {
                Some(default) => compile(default, &self.context),
                None => Err(ReflectionError::InvalidStructure(format!(
                    "parameter ${} has no default value",
                    self.get_name()
                ))),
            })
            .clone()
    }

    pub fn get_default_value(&self) -> Result<Value> {
        Ok(self.compiled_default()?.value)
    }

    pub fn is_default_value_constant(&self) -> Result<bool> {
        Ok(self.compiled_default()?.constant_name.is_some())
    }

    /// `FOO` or `Class::FOO` when the default is a constant reference.
    pub fn get_default_value_constant_name(&self) -> Result<Option<String>> {
        Ok(self.compiled_default()?.constant_name)
    }

    pub fn get_declaring_function(&self) -> Result<FunctionRef> {
        match &self.declaring {
            DeclaringFunction::Function { name, function } => {
                if let Some(function) = function.upgrade() {
                    return Ok(FunctionRef::Function(function));
                }
                match name {
                    Some(name) => Ok(FunctionRef::Function(self.reflector.reflect_function(name)?)),
                    None => Err(ReflectionError::InvalidStructure(
                        "the declaring closure is no longer available".to_string(),
                    )),
                }
            }
            DeclaringFunction::Method {
                class,
                name,
                method,
            } => {
                if let Some(method) = method.upgrade() {
                    return Ok(FunctionRef::Method(method));
                }
                let class = class.resolve(&self.reflector)?;
                class
                    .get_method(name)?
                    .map(FunctionRef::Method)
                    .ok_or_else(|| ReflectionError::MethodDoesNotExist {
                        class: class.get_name().to_string(),
                        method: name.clone(),
                    })
            }
        }
    }

    /// The class whose method declares this parameter, if any.
    pub fn get_declaring_class(&self) -> Result<Option<Rc<ReflectionClass>>> {
        self.class
            .as_ref()
            .map(|class| class.resolve(&self.reflector))
            .transpose()
    }

    pub fn get_attributes(&self) -> Vec<Rc<ReflectionAttribute>> {
        self.attributes
            .get_or_init(|| {
                attribute::from_groups(&self.param().attributes, AttributeTarget::PARAMETER, &self.context)
            })
            .clone()
    }

    pub fn get_attributes_by_name(&self, name: &str) -> Vec<Rc<ReflectionAttribute>> {
        attribute::by_name(&self.get_attributes(), name)
    }

    pub fn get_attributes_by_instance(&self, class_name: &str) -> Result<Vec<Rc<ReflectionAttribute>>> {
        attribute::by_instance(&self.get_attributes(), class_name)
    }

    pub fn get_start_line(&self) -> usize {
        self.source.lines(self.param().span).0
    }

    pub fn get_end_line(&self) -> usize {
        self.source.lines(self.param().span).1
    }

    pub fn get_start_column(&self) -> usize {
        self.source.columns(self.param().span).0
    }

    pub fn get_end_column(&self) -> usize {
        self.source.columns(self.param().span).1
    }
}
