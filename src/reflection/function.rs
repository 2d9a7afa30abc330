use super::attribute::{self, AttributeTarget, ReflectionAttribute};
use super::parameter::{DeclaringFunction, ReflectionParameter};
use super::types::{ReflectionType, collapse_nullable};
use super::{ClassHandle, doc_is_deprecated};
use crate::compiler::CompilerContext;
use crate::error::{ReflectionError, Result};
use crate::identifier::split_name;
use crate::locator::LocatedSource;
use crate::parser::ast::{FunctionDecl, FunctionKind, Modifier};
use crate::reflector::Reflector;
use std::cell::OnceCell;
use std::fmt;
use std::rc::{Rc, Weak};

const CLOSURE_NAME: &str = "{closure}";

/// State shared by functions, closures and methods.
pub struct FunctionLike {
    pub(crate) reflector: Reflector,
    pub(crate) source: Rc<LocatedSource>,
    pub(crate) decl: Rc<FunctionDecl>,
    pub(crate) context: CompilerContext,
    pub(crate) class: Option<ClassHandle>,
    target: AttributeTarget,
    parameters: OnceCell<Vec<Rc<ReflectionParameter>>>,
    attributes: OnceCell<Vec<Rc<ReflectionAttribute>>>,
}

impl FunctionLike {
    pub(crate) fn new(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        decl: Rc<FunctionDecl>,
        class: Option<ClassHandle>,
        name: &str,
    ) -> Self {
        let mut context = CompilerContext::new(reflector.clone())
            .with_source(source.clone())
            .with_namespace(decl.namespace.clone())
            .with_function(name);
        if let Some(class) = &class {
            context = context.with_class(class.clone());
        }
        let target = if class.is_some() {
            AttributeTarget::METHOD
        } else {
            AttributeTarget::FUNCTION
        };
        Self {
            reflector: reflector.clone(),
            source,
            decl,
            context,
            class,
            target,
            parameters: OnceCell::new(),
            attributes: OnceCell::new(),
        }
    }

    fn has_tentative_marker(&self) -> bool {
        self.source.is_internal()
            && self
                .decl
                .doc_comment
                .as_ref()
                .is_some_and(|doc| doc.text.contains("@tentative-return-type"))
    }

    fn declared_return_type(&self) -> Option<ReflectionType> {
        self.decl.return_type.as_ref().map(|node| {
            collapse_nullable(ReflectionType::create_from_node(
                &self.reflector,
                self.class.as_ref(),
                node,
                false,
            ))
        })
    }
}

/// Accessors common to functions and methods, as PHP's
/// `ReflectionFunctionAbstract` defines them.
pub trait ReflectionFunctionAbstract {
    fn function_like(&self) -> &FunctionLike;

    /// Back-reference handed to each parameter.
    fn declaring_function(&self) -> DeclaringFunction;

    fn get_name(&self) -> &str;

    fn get_parameters(&self) -> Vec<Rc<ReflectionParameter>> {
        let core = self.function_like();
        core.parameters
            .get_or_init(|| {
                let owner = self.declaring_function();
                (0..core.decl.params.len())
                    .map(|position| {
                        Rc::new(ReflectionParameter::new(
                            core,
                            position,
                            owner.clone(),
                        ))
                    })
                    .collect()
            })
            .clone()
    }

    fn get_parameter(&self, name: &str) -> Option<Rc<ReflectionParameter>> {
        self.get_parameters()
            .into_iter()
            .find(|param| param.get_name() == name)
    }

    fn get_number_of_parameters(&self) -> usize {
        self.function_like().decl.params.len()
    }

    fn get_number_of_required_parameters(&self) -> usize {
        self.get_parameters()
            .iter()
            .filter(|param| !param.is_optional())
            .count()
    }

    fn has_return_type(&self) -> bool {
        self.get_return_type().is_some()
    }

    /// Declared return type. Engine-provided functions whose return type is
    /// only tentative report `None` here.
    fn get_return_type(&self) -> Option<ReflectionType> {
        let core = self.function_like();
        if core.has_tentative_marker() {
            return None;
        }
        core.declared_return_type()
    }

    fn has_tentative_return_type(&self) -> bool {
        self.get_tentative_return_type().is_some()
    }

    fn get_tentative_return_type(&self) -> Option<ReflectionType> {
        let core = self.function_like();
        if !core.has_tentative_marker() {
            return None;
        }
        core.declared_return_type()
    }

    fn returns_reference(&self) -> bool {
        self.function_like().decl.by_ref
    }

    fn is_variadic(&self) -> bool {
        self.function_like().decl.params.iter().any(|p| p.variadic)
    }

    fn is_generator(&self) -> bool {
        self.function_like().decl.is_generator
    }

    fn is_closure(&self) -> bool {
        matches!(
            self.function_like().decl.kind,
            FunctionKind::Closure | FunctionKind::ArrowFunction
        )
    }

    fn is_internal(&self) -> bool {
        self.function_like().source.is_internal()
    }

    fn is_user_defined(&self) -> bool {
        !self.is_internal()
    }

    fn get_extension_name(&self) -> Option<&str> {
        self.function_like().source.extension_name()
    }

    fn get_file_name(&self) -> Option<&str> {
        self.function_like().source.file_name()
    }

    fn get_located_source(&self) -> &Rc<LocatedSource> {
        &self.function_like().source
    }

    fn get_doc_comment(&self) -> Option<&str> {
        self.function_like()
            .decl
            .doc_comment
            .as_ref()
            .map(|doc| doc.text.as_str())
    }

    /// `@deprecated` in the doc comment or a `#[\Deprecated]` attribute.
    fn is_deprecated(&self) -> bool {
        doc_is_deprecated(self.get_doc_comment())
            || !self.get_attributes_by_name("Deprecated").is_empty()
    }

    fn get_start_line(&self) -> usize {
        let core = self.function_like();
        core.source.lines(core.decl.span).0
    }

    fn get_end_line(&self) -> usize {
        let core = self.function_like();
        core.source.lines(core.decl.span).1
    }

    fn get_start_column(&self) -> usize {
        let core = self.function_like();
        core.source.columns(core.decl.span).0
    }

    fn get_end_column(&self) -> usize {
        let core = self.function_like();
        core.source.columns(core.decl.span).1
    }

    /// Source text between the braces of the body.
    fn get_body_code(&self) -> Option<&str> {
        let core = self.function_like();
        let body = core.decl.body?;
        let text = core.source.source();
        let inner_start = (body.start + 1).min(body.end);
        let inner_end = body.end.saturating_sub(1).max(inner_start);
        text.get(inner_start..inner_end).map(str::trim)
    }

    fn get_attributes(&self) -> Vec<Rc<ReflectionAttribute>> {
        let core = self.function_like();
        core.attributes
            .get_or_init(|| attribute::from_groups(&core.decl.attributes, core.target, &core.context))
            .clone()
    }

    fn get_attributes_by_name(&self, name: &str) -> Vec<Rc<ReflectionAttribute>> {
        attribute::by_name(&self.get_attributes(), name)
    }

    fn get_attributes_by_instance(&self, class_name: &str) -> Result<Vec<Rc<ReflectionAttribute>>> {
        attribute::by_instance(&self.get_attributes(), class_name)
    }
}

/// A function, closure or arrow function.
pub struct ReflectionFunction {
    this: Weak<ReflectionFunction>,
    core: FunctionLike,
    name: String,
}

impl fmt::Debug for ReflectionFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionFunction")
            .field("name", &self.name)
            .finish()
    }
}

impl ReflectionFunction {
    pub(crate) fn new(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        decl: Rc<FunctionDecl>,
    ) -> Rc<Self> {
        let name = decl.fqn.clone().unwrap_or_else(|| match &decl.namespace {
            Some(namespace) => format!("{namespace}\\{CLOSURE_NAME}"),
            None => CLOSURE_NAME.to_string(),
        });
        Rc::new_cyclic(|this| ReflectionFunction {
            this: this.clone(),
            core: FunctionLike::new(reflector, source, decl, None, &name),
            name,
        })
    }

    pub fn get_short_name(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn get_namespace_name(&self) -> &str {
        self.core.decl.namespace.as_deref().unwrap_or_default()
    }

    pub fn in_namespace(&self) -> bool {
        self.core.decl.namespace.is_some()
    }

    /// Closures declared with `static`.
    pub fn is_static(&self) -> bool {
        self.core.decl.modifiers.contains(&Modifier::Static)
    }

    pub fn is_arrow_function(&self) -> bool {
        self.core.decl.kind == FunctionKind::ArrowFunction
    }

    pub fn is_disabled(&self) -> bool {
        false
    }

    pub fn invoke(&self) -> Result<()> {
        Err(ReflectionError::NotImplemented(
            "invoking a function requires executing code",
        ))
    }

    pub fn invoke_args(&self) -> Result<()> {
        self.invoke()
    }

    pub fn get_closure(&self) -> Result<()> {
        Err(ReflectionError::NotImplemented(
            "creating a closure requires executing code",
        ))
    }

    pub fn try_clone(&self) -> Result<Rc<Self>> {
        Err(ReflectionError::Uncloneable("ReflectionFunction".to_string()))
    }
}

impl ReflectionFunctionAbstract for ReflectionFunction {
    fn function_like(&self) -> &FunctionLike {
        &self.core
    }

    fn declaring_function(&self) -> DeclaringFunction {
        DeclaringFunction::Function {
            name: (!self.is_closure()).then(|| self.name.clone()),
            function: self.this.clone(),
        }
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}
