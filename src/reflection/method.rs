use super::function::{FunctionLike, ReflectionFunctionAbstract};
use super::modifiers::MemberModifiers;
use super::parameter::DeclaringFunction;
use super::{ClassHandle, ReflectionClass};
use crate::error::{ReflectionError, Result};
use crate::locator::LocatedSource;
use crate::parser::ast::FunctionDecl;
use crate::reflector::Reflector;
use std::fmt;
use std::rc::{Rc, Weak};

pub struct ReflectionMethod {
    this: Weak<ReflectionMethod>,
    core: FunctionLike,
    name: String,
    alias_name: Option<String>,
    declaring: ClassHandle,
    implementing: ClassHandle,
    modifiers: MemberModifiers,
    /// Whether the declaring class-like is a plain class; only those may
    /// declare a constructor named after themselves.
    declared_in_class: bool,
}

impl fmt::Debug for ReflectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionMethod")
            .field("class", &self.implementing.name())
            .field("name", &self.name)
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

/// Where a method is declared.
pub(crate) struct MethodOrigin {
    pub class: ClassHandle,
    pub is_interface: bool,
    pub is_class: bool,
}

impl ReflectionMethod {
    pub(crate) fn new(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        decl: Rc<FunctionDecl>,
        origin: MethodOrigin,
    ) -> Rc<Self> {
        let name = decl
            .name
            .as_ref()
            .map(|ident| ident.name.clone())
            .unwrap_or_default();
        let mut modifiers = MemberModifiers::from_ast(&decl.modifiers);
        if origin.is_interface {
            modifiers |= MemberModifiers::ABSTRACT;
        }
        Self::build(
            reflector,
            source,
            decl,
            name,
            None,
            origin.class.clone(),
            origin.class,
            modifiers,
            origin.is_class,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        decl: Rc<FunctionDecl>,
        name: String,
        alias_name: Option<String>,
        declaring: ClassHandle,
        implementing: ClassHandle,
        modifiers: MemberModifiers,
        declared_in_class: bool,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| ReflectionMethod {
            this: this.clone(),
            core: FunctionLike::new(reflector, source, decl, Some(implementing.clone()), &name),
            name,
            alias_name,
            declaring,
            implementing,
            modifiers,
            declared_in_class,
        })
    }

    /// A copy of this method imported into `implementing`, optionally under
    /// an alias and with adjusted modifiers.
    pub(crate) fn rebind(
        &self,
        implementing: ClassHandle,
        alias: Option<String>,
        modifiers: MemberModifiers,
    ) -> Rc<Self> {
        let name = alias.clone().unwrap_or_else(|| self.name.clone());
        Self::build(
            &self.core.reflector,
            self.core.source.clone(),
            self.core.decl.clone(),
            name,
            alias.or_else(|| self.alias_name.clone()),
            self.declaring.clone(),
            implementing,
            modifiers,
            self.declared_in_class,
        )
    }

    pub fn get_short_name(&self) -> &str {
        &self.name
    }

    /// The alias this method was imported under from a trait.
    pub fn get_alias_name(&self) -> Option<&str> {
        self.alias_name.as_deref()
    }

    pub fn get_modifiers(&self) -> MemberModifiers {
        self.modifiers
    }

    pub fn is_public(&self) -> bool {
        self.modifiers.contains(MemberModifiers::PUBLIC)
    }

    pub fn is_protected(&self) -> bool {
        self.modifiers.contains(MemberModifiers::PROTECTED)
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.contains(MemberModifiers::PRIVATE)
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(MemberModifiers::STATIC)
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.contains(MemberModifiers::FINAL)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(MemberModifiers::ABSTRACT)
    }

    /// `__construct`, or a method named exactly like its class when that
    /// class is declared outside any namespace.
    pub fn is_constructor(&self) -> bool {
        if self.name.eq_ignore_ascii_case("__construct") {
            return true;
        }
        self.declared_in_class
            && !self.declaring.name().contains('\\')
            && self.name == self.declaring.name()
    }

    pub fn is_destructor(&self) -> bool {
        self.name.eq_ignore_ascii_case("__destruct")
    }

    pub fn get_declaring_class(&self) -> Result<Rc<ReflectionClass>> {
        self.declaring.resolve(&self.core.reflector)
    }

    pub fn get_declaring_class_name(&self) -> &str {
        self.declaring.name()
    }

    /// The class this method was reached through: the using class for trait
    /// methods, otherwise the declaring class.
    pub fn get_implementing_class(&self) -> Result<Rc<ReflectionClass>> {
        self.implementing.resolve(&self.core.reflector)
    }

    pub fn get_implementing_class_name(&self) -> &str {
        self.implementing.name()
    }

    /// The method this one overrides or implements: a method of an
    /// interface the implementing class implements directly, else the
    /// nearest ancestor declaration that is abstract or has no prototype of
    /// its own.
    pub fn get_prototype(&self) -> Result<Rc<ReflectionMethod>> {
        let class = self.get_implementing_class()?;
        for interface in class.get_immediate_interfaces()? {
            if let Some(method) = interface.get_method(&self.name)? {
                return Ok(method);
            }
        }
        if let Some(parent) = class.parent_class_or_none()?
            && let Some(method) = parent.get_method(&self.name)?
            && let Some(prototype) = method.find_prototype()?
            && (!self.is_constructor() || prototype.is_abstract())
        {
            return Ok(prototype);
        }
        Err(ReflectionError::MethodPrototypeNotFound {
            class: self.implementing.name().to_string(),
            method: self.name.clone(),
        })
    }

    pub fn has_prototype(&self) -> Result<bool> {
        match self.get_prototype() {
            Ok(_) => Ok(true),
            Err(ReflectionError::MethodPrototypeNotFound { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn find_prototype(&self) -> Result<Option<Rc<ReflectionMethod>>> {
        let this = self.this.upgrade();
        if self.is_abstract() {
            return Ok(this);
        }
        if self.is_private() {
            return Ok(None);
        }
        match self.get_prototype() {
            Ok(prototype) => Ok(Some(prototype)),
            Err(ReflectionError::MethodPrototypeNotFound { .. }) => Ok(this),
            Err(err) => Err(err),
        }
    }

    pub fn invoke(&self) -> Result<()> {
        Err(ReflectionError::NotImplemented(
            "invoking a method requires executing code",
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
        Err(ReflectionError::Uncloneable("ReflectionMethod".to_string()))
    }
}

impl ReflectionFunctionAbstract for ReflectionMethod {
    fn function_like(&self) -> &FunctionLike {
        &self.core
    }

    fn declaring_function(&self) -> DeclaringFunction {
        DeclaringFunction::Method {
            class: self.implementing.clone(),
            name: self.name.clone(),
            method: self.this.clone(),
        }
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}
