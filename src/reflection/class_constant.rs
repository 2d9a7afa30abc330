use super::attribute::{self, AttributeTarget, ReflectionAttribute};
use super::modifiers::MemberModifiers;
use super::types::{ReflectionType, collapse_nullable};
use super::{ClassHandle, ReflectionClass, constant_memo, doc_is_deprecated};
use crate::compiler::{CompiledValue, CompilerContext, Value, compile};
use crate::error::{ReflectionError, Result};
use crate::locator::LocatedSource;
use crate::parser::ast::ClassConstDecl;
use crate::reflector::Reflector;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

pub struct ReflectionClassConstant {
    reflector: Reflector,
    source: Rc<LocatedSource>,
    decl: Rc<ClassConstDecl>,
    index: usize,
    declaring: ClassHandle,
    implementing: ClassHandle,
    modifiers: MemberModifiers,
    context: CompilerContext,
    value: OnceCell<Result<CompiledValue>>,
    attributes: OnceCell<Vec<Rc<ReflectionAttribute>>>,
}

impl fmt::Debug for ReflectionClassConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionClassConstant")
            .field("class", &self.implementing.name())
            .field("name", &self.get_name())
            .finish()
    }
}

impl ReflectionClassConstant {
    pub(crate) fn new(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        decl: Rc<ClassConstDecl>,
        index: usize,
        class: ClassHandle,
        namespace: Option<String>,
    ) -> Rc<Self> {
        let modifiers = MemberModifiers::from_ast(&decl.modifiers);
        Self::build(reflector, source, decl, index, class.clone(), class, namespace, modifiers)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        decl: Rc<ClassConstDecl>,
        index: usize,
        declaring: ClassHandle,
        implementing: ClassHandle,
        namespace: Option<String>,
        modifiers: MemberModifiers,
    ) -> Rc<Self> {
        let context = CompilerContext::new(reflector.clone())
            .with_source(source.clone())
            .with_namespace(namespace)
            .with_class(implementing.clone());
        Rc::new(ReflectionClassConstant {
            reflector: reflector.clone(),
            source,
            decl,
            index,
            declaring,
            implementing,
            modifiers,
            context,
            value: OnceCell::new(),
            attributes: OnceCell::new(),
        })
    }

    /// A copy imported into `implementing` through a trait.
    pub(crate) fn rebind(&self, implementing: ClassHandle, namespace: Option<String>) -> Rc<Self> {
        Self::build(
            &self.reflector,
            self.source.clone(),
            self.decl.clone(),
            self.index,
            self.declaring.clone(),
            implementing,
            namespace,
            self.modifiers,
        )
    }

    pub fn get_name(&self) -> &str {
        &self.decl.consts[self.index].name.name
    }

    fn compiled(&self) -> Result<CompiledValue> {
        let key = format!("{}::{}", self.implementing.name(), self.get_name());
        constant_memo(&self.reflector, &self.value, "class constant", &key, || {
            compile(&self.decl.consts[self.index].value, &self.context)
        })
    }

    /// The compiled value. A constant whose initializer refers back to
    /// itself fails to compile.
    pub fn get_value(&self) -> Result<Value> {
        Ok(self.compiled()?.value)
    }

    pub fn get_value_constant_name(&self) -> Result<Option<String>> {
        Ok(self.compiled()?.constant_name)
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

    pub fn is_final(&self) -> bool {
        self.modifiers.contains(MemberModifiers::FINAL)
    }

    pub fn has_type(&self) -> bool {
        self.decl.ty.is_some()
    }

    pub fn get_type(&self) -> Option<ReflectionType> {
        self.decl.ty.as_ref().map(|node| {
            collapse_nullable(ReflectionType::create_from_node(
                &self.reflector,
                Some(&self.implementing),
                node,
                false,
            ))
        })
    }

    pub fn get_doc_comment(&self) -> Option<&str> {
        self.decl.doc_comment.as_ref().map(|doc| doc.text.as_str())
    }

    pub fn is_deprecated(&self) -> bool {
        doc_is_deprecated(self.get_doc_comment())
            || !self.get_attributes_by_name("Deprecated").is_empty()
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

    pub fn get_attributes(&self) -> Vec<Rc<ReflectionAttribute>> {
        self.attributes
            .get_or_init(|| {
                attribute::from_groups(&self.decl.attributes, AttributeTarget::CLASS_CONSTANT, &self.context)
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
        self.source.lines(self.decl.consts[self.index].span).0
    }

    pub fn get_end_line(&self) -> usize {
        self.source.lines(self.decl.consts[self.index].span).1
    }

    pub fn get_start_column(&self) -> usize {
        self.source.columns(self.decl.consts[self.index].span).0
    }

    pub fn get_end_column(&self) -> usize {
        self.source.columns(self.decl.consts[self.index].span).1
    }

    pub fn try_clone(&self) -> Result<Rc<Self>> {
        Err(ReflectionError::Uncloneable("ReflectionClassConstant".to_string()))
    }
}
