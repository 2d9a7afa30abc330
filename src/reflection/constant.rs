use super::attribute::{self, AttributeTarget, ReflectionAttribute};
use super::{constant_memo, doc_is_deprecated};
use crate::compiler::{CompiledValue, CompilerContext, Value, compile};
use crate::error::{ReflectionError, Result};
use crate::identifier::split_name;
use crate::locator::LocatedSource;
use crate::parser::ast::{CallStmt, ConstStmt, DocComment, Expr};
use crate::parser::span::Span;
use crate::reflector::Reflector;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum ConstantNode {
    Const { stmt: Rc<ConstStmt>, index: usize },
    Define(Rc<CallStmt>),
}

/// A global constant, declared with `const` or `define()`.
pub struct ReflectionConstant {
    reflector: Reflector,
    source: Rc<LocatedSource>,
    node: ConstantNode,
    name: String,
    context: CompilerContext,
    value: OnceCell<Result<CompiledValue>>,
    attributes: OnceCell<Vec<Rc<ReflectionAttribute>>>,
}

impl fmt::Debug for ReflectionConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectionConstant")
            .field("name", &self.name)
            .finish()
    }
}

impl ReflectionConstant {
    pub(crate) fn from_const(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        stmt: Rc<ConstStmt>,
        index: usize,
    ) -> Rc<Self> {
        let short = &stmt.consts[index].name.name;
        let name = match &stmt.namespace {
            Some(namespace) => format!("{namespace}\\{short}"),
            None => short.clone(),
        };
        let namespace = stmt.namespace.clone();
        Self::build(reflector, source, ConstantNode::Const { stmt, index }, name, namespace)
    }

    /// `call` must already be known to have a literal name and a value.
    pub(crate) fn from_define(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        call: Rc<CallStmt>,
        name: String,
    ) -> Rc<Self> {
        let namespace = call.namespace.clone();
        Self::build(reflector, source, ConstantNode::Define(call), name, namespace)
    }

    fn build(
        reflector: &Reflector,
        source: Rc<LocatedSource>,
        node: ConstantNode,
        name: String,
        namespace: Option<String>,
    ) -> Rc<Self> {
        let context = CompilerContext::new(reflector.clone())
            .with_source(source.clone())
            .with_namespace(namespace);
        Rc::new(ReflectionConstant {
            reflector: reflector.clone(),
            source,
            node,
            name,
            context,
            value: OnceCell::new(),
            attributes: OnceCell::new(),
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_short_name(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn get_namespace_name(&self) -> &str {
        split_name(&self.name).0.unwrap_or_default()
    }

    pub fn in_namespace(&self) -> bool {
        self.name.contains('\\')
    }

    fn value_expr(&self) -> &Expr {
        match &self.node {
            ConstantNode::Const { stmt, index } => &stmt.consts[*index].value,
            ConstantNode::Define(call) => &call.args[1].value,
        }
    }

    fn compiled(&self) -> Result<CompiledValue> {
        constant_memo(&self.reflector, &self.value, "constant", &self.name, || {
            compile(self.value_expr(), &self.context)
        })
    }

    pub fn get_value(&self) -> Result<Value> {
        Ok(self.compiled()?.value)
    }

    /// The constant the value expression refers to, when it is a bare
    /// constant reference.
    pub fn get_value_expression_constant_name(&self) -> Result<Option<String>> {
        Ok(self.compiled()?.constant_name)
    }

    fn doc(&self) -> Option<&DocComment> {
        match &self.node {
            ConstantNode::Const { stmt, .. } => stmt.doc_comment.as_ref(),
            ConstantNode::Define(call) => call.doc_comment.as_ref(),
        }
    }

    fn span(&self) -> Span {
        match &self.node {
            ConstantNode::Const { stmt, index } => stmt.consts[*index].span,
            ConstantNode::Define(call) => call.span,
        }
    }

    pub fn get_doc_comment(&self) -> Option<&str> {
        self.doc().map(|doc| doc.text.as_str())
    }

    pub fn is_deprecated(&self) -> bool {
        doc_is_deprecated(self.get_doc_comment())
    }

    pub fn is_internal(&self) -> bool {
        self.source.is_internal()
    }

    pub fn is_user_defined(&self) -> bool {
        !self.source.is_internal()
    }

    pub fn get_extension_name(&self) -> Option<&str> {
        self.source.extension_name()
    }

    pub fn get_file_name(&self) -> Option<&str> {
        self.source.file_name()
    }

    pub fn get_located_source(&self) -> &Rc<LocatedSource> {
        &self.source
    }

    /// Attributes of a `const` statement; `define()` calls carry none.
    pub fn get_attributes(&self) -> Vec<Rc<ReflectionAttribute>> {
        self.attributes
            .get_or_init(|| match &self.node {
                ConstantNode::Const { stmt, .. } => {
                    attribute::from_groups(&stmt.attributes, AttributeTarget::ALL, &self.context)
                }
                ConstantNode::Define(_) => Vec::new(),
            })
            .clone()
    }

    pub fn get_attributes_by_name(&self, name: &str) -> Vec<Rc<ReflectionAttribute>> {
        attribute::by_name(&self.get_attributes(), name)
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
        Err(ReflectionError::Uncloneable("ReflectionConstant".to_string()))
    }
}
