use super::attribute::{self, AttributeTarget, ReflectionAttribute};
use super::modifiers::MemberModifiers;
use super::types::{ReflectionType, collapse_nullable};
use super::{ClassHandle, ReflectionClass, doc_is_deprecated};
use crate::compiler::{CompiledValue, CompilerContext, Value, compile};
use crate::error::{ReflectionError, Result};
use crate::locator::LocatedSource;
use crate::parser::ast::{AttributeGroup, DocComment, ExprId, FunctionDecl, Modifier, PropertyDecl, TypeNode};
use crate::parser::span::Span;
use crate::reflector::Reflector;
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum PropertyNode {
    Declared { decl: Rc<PropertyDecl>, index: usize },
    /// A constructor parameter with a visibility or `readonly` modifier.
    Promoted { constructor: Rc<FunctionDecl>, index: usize },
}

/// The class-like a property is declared in.
#[derive(Clone)]
pub(crate) struct PropertyOrigin {
    pub class: ClassHandle,
    pub namespace: Option<String>,
    pub readonly_class: bool,
}

pub struct ReflectionProperty {
    reflector: Reflector,
    source: Rc<LocatedSource>,
    node: PropertyNode,
    name: String,
    declaring: ClassHandle,
    implementing: ClassHandle,
    modifiers: MemberModifiers,
    context: CompilerContext,
    accessible: Cell<bool>,
    static_value: RefCell<Option<Value>>,
    default: OnceCell<Result<Option<CompiledValue>>>,
    attributes: OnceCell<Vec<Rc<ReflectionAttribute>>>,
}

impl fmt::Debug for ReflectionProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionProperty")
            .field("class", &self.implementing.name())
            .field("name", &self.name)
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

impl ReflectionProperty {
    pub(crate) fn declared(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        decl: Rc<PropertyDecl>,
        index: usize,
        origin: &PropertyOrigin,
    ) -> Rc<Self> {
        let name = decl.entries[index].name.name.clone();
        let modifiers = modifiers_of(&decl.modifiers, origin.readonly_class);
        Self::build(
            reflector,
            source,
            PropertyNode::Declared { decl, index },
            name,
            origin.class.clone(),
            origin,
            modifiers,
        )
    }

    pub(crate) fn promoted(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        constructor: Rc<FunctionDecl>,
        index: usize,
        origin: &PropertyOrigin,
    ) -> Rc<Self> {
        let param = &constructor.params[index];
        let name = param.name.name.clone();
        let modifiers = modifiers_of(&param.modifiers, origin.readonly_class);
        Self::build(
            reflector,
            source,
            PropertyNode::Promoted { constructor, index },
            name,
            origin.class.clone(),
            origin,
            modifiers,
        )
    }

    fn build(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        node: PropertyNode,
        name: String,
        declaring: ClassHandle,
        origin: &PropertyOrigin,
        modifiers: MemberModifiers,
    ) -> Rc<Self> {
        let context = CompilerContext::new(reflector.clone())
            .with_source(source.clone())
            .with_namespace(origin.namespace.clone())
            .with_class(origin.class.clone())
            .with_property(name.clone());
        Rc::new(ReflectionProperty {
            reflector: reflector.clone(),
            source,
            node,
            name,
            declaring,
            implementing: origin.class.clone(),
            modifiers,
            context,
            accessible: Cell::new(false),
            static_value: RefCell::new(None),
            default: OnceCell::new(),
            attributes: OnceCell::new(),
        })
    }

    /// A fresh copy of this property as seen from `implementing`, which
    /// imports it through a trait.
    pub(crate) fn rebind(&self, implementing: ClassHandle, namespace: Option<String>) -> Rc<Self> {
        let origin = PropertyOrigin {
            class: implementing,
            namespace,
            readonly_class: false,
        };
        Self::build(
            &self.reflector,
            self.source.clone(),
            self.node.clone(),
            self.name.clone(),
            self.declaring.clone(),
            &origin,
            self.modifiers,
        )
    }

    pub fn get_name(&self) -> &str {
        &self.name
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

    pub fn is_readonly(&self) -> bool {
        self.modifiers.contains(MemberModifiers::READONLY)
    }

    pub fn is_promoted(&self) -> bool {
        matches!(self.node, PropertyNode::Promoted { .. })
    }

    /// Declared properties are always default properties; dynamic ones are
    /// never reflected.
    pub fn is_default(&self) -> bool {
        true
    }

    pub fn has_hooks(&self) -> bool {
        match &self.node {
            PropertyNode::Declared { decl, .. } => decl.has_hooks,
            PropertyNode::Promoted { .. } => false,
        }
    }

    fn type_node(&self) -> Option<&TypeNode> {
        match &self.node {
            PropertyNode::Declared { decl, .. } => decl.ty.as_ref(),
            PropertyNode::Promoted { constructor, index } => constructor.params[*index].ty.as_ref(),
        }
    }

    fn default_expr(&self) -> Option<&ExprId> {
        match &self.node {
            PropertyNode::Declared { decl, index } => decl.entries[*index].default.as_ref(),
            PropertyNode::Promoted { .. } => None,
        }
    }

    fn span(&self) -> Span {
        match &self.node {
            PropertyNode::Declared { decl, index } => decl.entries[*index].span,
            PropertyNode::Promoted { constructor, index } => constructor.params[*index].span,
        }
    }

    fn doc(&self) -> Option<&DocComment> {
        match &self.node {
            PropertyNode::Declared { decl, .. } => decl.doc_comment.as_ref(),
            PropertyNode::Promoted { constructor, index } => constructor.params[*index].doc_comment.as_ref(),
        }
    }

    fn attribute_groups(&self) -> &[AttributeGroup] {
        match &self.node {
            PropertyNode::Declared { decl, .. } => &decl.attributes,
            PropertyNode::Promoted { constructor, index } => &constructor.params[*index].attributes,
        }
    }

    pub fn has_type(&self) -> bool {
        self.type_node().is_some()
    }

    pub fn get_type(&self) -> Option<ReflectionType> {
        self.type_node().map(|node| {
            collapse_nullable(ReflectionType::create_from_node(
                &self.reflector,
                Some(&self.implementing),
                node,
                false,
            ))
        })
    }

    pub fn allows_null(&self) -> bool {
        self.get_type().is_none_or(|ty| ty.allows_null())
    }

    /// Untyped properties implicitly default to `null`; typed and promoted
    /// properties only have a default when one is written.
    pub fn has_default_value(&self) -> bool {
        match &self.node {
            PropertyNode::Declared { decl, index } => {
                decl.entries[*index].default.is_some() || decl.ty.is_none()
            }
            PropertyNode::Promoted { .. } => false,
        }
    }

    fn compiled_default(&self) -> Result<Option<CompiledValue>> {
        self.default
            .get_or_init(|| {
                self.default_expr()
                    .map(|expr| compile(expr, &self.context))
                    .transpose()
            })
            .clone()
    }

    /// The compiled default, or `null` when none is declared.
    pub fn get_default_value(&self) -> Result<Value> {
        Ok(self
            .compiled_default()?
            .map(|compiled| compiled.value)
            .unwrap_or(Value::Null))
    }

    pub fn get_default_value_constant_name(&self) -> Result<Option<String>> {
        Ok(self.compiled_default()?.and_then(|compiled| compiled.constant_name))
    }

    pub fn get_doc_comment(&self) -> Option<&str> {
        self.doc().map(|doc| doc.text.as_str())
    }

    pub fn is_deprecated(&self) -> bool {
        doc_is_deprecated(self.get_doc_comment())
    }

    pub fn get_declaring_class(&self) -> Result<Rc<ReflectionClass>> {
        self.declaring.resolve(&self.reflector)
    }

    pub fn get_declaring_class_name(&self) -> &str {
        self.declaring.name()
    }

    pub fn get_implementing_class(&self) -> Result<Rc<ReflectionClass>> {
        self.implementing.resolve(&self.reflector)
    }

    pub fn set_accessible(&self, accessible: bool) {
        self.accessible.set(accessible);
    }

    /// Public properties are always accessible; others once marked so.
    pub fn is_accessible(&self) -> bool {
        self.is_public() || self.accessible.get()
    }

    fn check_static_access(&self) -> Result<()> {
        if !self.is_static() {
            return Err(ReflectionError::NotImplemented(
                "instance property values require an object",
            ));
        }
        if !self.is_accessible() {
            return Err(ReflectionError::PropertyNotAccessible {
                class: self.implementing.name().to_string(),
                property: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Current value of a static property: the last value set through this
    /// reflection, else the declared default.
    pub fn get_value(&self) -> Result<Value> {
        self.check_static_access()?;
        self.current_value()
    }

    /// Value of a static property without the accessibility check.
    pub(crate) fn current_value(&self) -> Result<Value> {
        if let Some(value) = self.static_value.borrow().as_ref() {
            return Ok(value.clone());
        }
        self.get_default_value()
    }

    pub fn set_value(&self, value: Value) -> Result<()> {
        self.check_static_access()?;
        *self.static_value.borrow_mut() = Some(value);
        Ok(())
    }

    pub fn get_attributes(&self) -> Vec<Rc<ReflectionAttribute>> {
        self.attributes
            .get_or_init(|| {
                attribute::from_groups(self.attribute_groups(), AttributeTarget::PROPERTY, &self.context)
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
        self.source.lines(self.span()).0
    }

    pub fn get_end_line(&self) -> usize {
        self.source.lines(self.span()).1
    }

    pub fn get_start_column(&self) -> usize {
        self.source.columns(self.span()).0
    }

    pub fn get_end_column(&self) -> usize {
        self.source.columns(self.span()).1
    }

    pub fn try_clone(&self) -> Result<Rc<Self>> {
        Err(ReflectionError::Uncloneable("ReflectionProperty".to_string()))
    }
}

fn modifiers_of(modifiers: &[Modifier], readonly_class: bool) -> MemberModifiers {
    let mut bits = MemberModifiers::from_ast(modifiers);
    if readonly_class && !bits.contains(MemberModifiers::STATIC) {
        bits |= MemberModifiers::READONLY;
    }
    bits
}
