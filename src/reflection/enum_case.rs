use super::attribute::{self, AttributeTarget, ReflectionAttribute};
use super::{ClassHandle, ReflectionClass, constant_memo, doc_is_deprecated};
use crate::compiler::{CompilerContext, Value, compile};
use crate::error::{ReflectionError, Result};
use crate::locator::LocatedSource;
use crate::parser::ast::EnumCaseDecl;
use crate::reflector::Reflector;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

pub struct ReflectionEnumCase {
    reflector: Reflector,
    source: Rc<LocatedSource>,
    decl: Rc<EnumCaseDecl>,
    enum_class: ClassHandle,
    context: CompilerContext,
    backing: OnceCell<Result<Option<Value>>>,
    attributes: OnceCell<Vec<Rc<ReflectionAttribute>>>,
}

impl fmt::Debug for ReflectionEnumCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionEnumCase")
            .field("enum", &self.enum_class.name())
            .field("name", &self.decl.name.name)
            .finish()
    }
}

impl ReflectionEnumCase {
    pub(crate) fn new(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        decl: Rc<EnumCaseDecl>,
        enum_class: ClassHandle,
        namespace: Option<String>,
    ) -> Rc<Self> {
        let context = CompilerContext::new(reflector.clone())
            .with_source(source.clone())
            .with_namespace(namespace)
            .with_class(enum_class.clone());
        Rc::new(ReflectionEnumCase {
            reflector: reflector.clone(),
            source,
            decl,
            enum_class,
            context,
            backing: OnceCell::new(),
            attributes: OnceCell::new(),
        })
    }

    pub fn get_name(&self) -> &str {
        &self.decl.name.name
    }

    pub fn get_enum(&self) -> Result<Rc<ReflectionClass>> {
        self.enum_class.resolve(&self.reflector)
    }

    pub fn get_enum_name(&self) -> &str {
        self.enum_class.name()
    }

    /// The case itself, as a value.
    pub fn get_value(&self) -> Value {
        Value::EnumCase {
            class: self.enum_class.name().to_string(),
            case: self.decl.name.name.clone(),
        }
    }

    /// The scalar a backed case is declared with; `None` for pure cases.
    pub fn get_backing_value(&self) -> Result<Option<Value>> {
        let key = format!("{}::{}", self.enum_class.name(), self.get_name());
        constant_memo(&self.reflector, &self.backing, "enum case", &key, || {
            self.decl
                .value
                .as_ref()
                .map(|expr| compile(expr, &self.context).map(|compiled| compiled.value))
                .transpose()
        })
    }

    pub fn get_doc_comment(&self) -> Option<&str> {
        self.decl.doc_comment.as_ref().map(|doc| doc.text.as_str())
    }

    pub fn is_deprecated(&self) -> bool {
        doc_is_deprecated(self.get_doc_comment())
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
        self.source.lines(self.decl.span).0
    }

    pub fn get_end_line(&self) -> usize {
        self.source.lines(self.decl.span).1
    }

    pub fn try_clone(&self) -> Result<Rc<Self>> {
        Err(ReflectionError::Uncloneable("ReflectionEnumCase".to_string()))
    }
}
