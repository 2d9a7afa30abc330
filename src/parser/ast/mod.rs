//! Owned, declaration-level syntax tree.
//!
//! Names in this tree are already resolved against the enclosing namespace and
//! `use` imports, so consumers never perform name resolution themselves.

use crate::parser::span::{LineInfo, Span};
use serde::Serialize;
use std::rc::Rc;

pub type ExprId = Rc<Expr>;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParseError {
    pub span: Span,
    pub message: &'static str,
}

impl ParseError {
    pub fn to_human_readable(&self, source: &[u8]) -> String {
        self.to_human_readable_with_path(source, None)
    }

    pub fn to_human_readable_with_path(&self, source: &[u8], path: Option<&str>) -> String {
        let Some(LineInfo {
            line,
            column,
            line_text,
        }) = self.span.line_info(source)
        else {
            return format!("error: {}", self.message);
        };

        let line_str = String::from_utf8_lossy(line_text);
        let gutter_width = line.to_string().len();
        let padding = std::cmp::min(line_text.len(), column.saturating_sub(1));
        let highlight_len = std::cmp::max(
            1,
            std::cmp::min(self.span.len(), line_text.len().saturating_sub(padding)),
        );

        let marker = format!("{}{}", " ".repeat(padding), "^".repeat(highlight_len));

        let location = match path {
            Some(path) => format!("{path}:{line}:{column}"),
            None => format!("line {line}, column {column}"),
        };

        format!(
            "error: {}\n --> {}\n{gutter}|\n{line_no:>width$} | {line_src}\n{gutter}| {marker}",
            self.message,
            location,
            gutter = " ".repeat(gutter_width + 1),
            line_no = line,
            width = gutter_width,
            line_src = line_str,
            marker = marker,
        )
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
    /// Closures and arrow functions found anywhere in skipped code, in source order.
    pub closures: Vec<Rc<FunctionDecl>>,
    pub errors: Vec<ParseError>,
    pub span: Span,
}

impl Program {
    /// Visits every top-level statement, descending into namespace blocks.
    pub fn for_each_statement<'a>(&'a self, mut f: impl FnMut(&'a Stmt)) {
        fn walk<'a>(statements: &'a [Stmt], f: &mut impl FnMut(&'a Stmt)) {
            for stmt in statements {
                if let Stmt::Namespace { body, .. } = stmt {
                    walk(body, f);
                } else {
                    f(stmt);
                }
            }
        }
        walk(&self.statements, &mut f);
    }
}

#[derive(Debug, Serialize)]
pub enum Stmt {
    ClassLike(Rc<ClassLikeDecl>),
    Function(Rc<FunctionDecl>),
    Const(Rc<ConstStmt>),
    /// A call statement such as `define('NAME', value);`.
    Call(Rc<CallStmt>),
    Namespace {
        name: Option<String>,
        body: Vec<Stmt>,
        span: Span,
    },
    /// Any statement the declaration parser skips over.
    Nop {
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::ClassLike(decl) => decl.span,
            Stmt::Function(decl) => decl.span,
            Stmt::Const(decl) => decl.span,
            Stmt::Call(call) => call.span,
            Stmt::Namespace { span, .. } => *span,
            Stmt::Nop { span } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NameKind {
    Unqualified,
    Qualified,
    FullyQualified,
    /// `self`, `parent` or `static`.
    Special,
}

/// A name as written plus its fully-qualified resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Name {
    pub original: String,
    pub resolved: String,
    /// Global fallback for unqualified function and constant names inside a namespace.
    pub fallback: Option<String>,
    pub kind: NameKind,
    pub span: Span,
}

impl Name {
    pub fn is_special(&self) -> bool {
        self.kind == NameKind::Special
    }

    pub fn lowercase_resolved(&self) -> String {
        self.resolved.to_ascii_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    PublicSet,
    ProtectedSet,
    PrivateSet,
    Static,
    Abstract,
    Final,
    Readonly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocComment {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: Name,
    pub args: Vec<Arg>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeGroup {
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct Arg {
    pub name: Option<Ident>,
    pub value: ExprId,
    pub unpack: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassLikeKind {
    Class,
    Interface,
    Trait,
    Enum,
}

#[derive(Debug, Serialize)]
pub struct ClassLikeDecl {
    pub kind: ClassLikeKind,
    pub attributes: Vec<AttributeGroup>,
    pub modifiers: Vec<Modifier>,
    pub name: Ident,
    pub fqn: String,
    pub namespace: Option<String>,
    /// Parent class for classes; parent interfaces for interfaces.
    pub extends: Vec<Name>,
    pub implements: Vec<Name>,
    /// Scalar backing type of a backed enum.
    pub backing_type: Option<TypeNode>,
    pub members: Vec<ClassMember>,
    pub doc_comment: Option<DocComment>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum ClassMember {
    Method(Rc<FunctionDecl>),
    Property(Rc<PropertyDecl>),
    Const(Rc<ClassConstDecl>),
    TraitUse(Rc<TraitUseDecl>),
    Case(Rc<EnumCaseDecl>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FunctionKind {
    Function,
    Method,
    Closure,
    ArrowFunction,
}

#[derive(Debug, Serialize)]
pub struct FunctionDecl {
    pub kind: FunctionKind,
    pub attributes: Vec<AttributeGroup>,
    pub modifiers: Vec<Modifier>,
    /// `None` for closures and arrow functions.
    pub name: Option<Ident>,
    pub fqn: Option<String>,
    pub namespace: Option<String>,
    pub by_ref: bool,
    pub params: Vec<Param>,
    pub return_type: Option<TypeNode>,
    /// Span of the body; `None` for abstract and interface methods.
    pub body: Option<Span>,
    pub is_generator: bool,
    pub doc_comment: Option<DocComment>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub attributes: Vec<AttributeGroup>,
    /// Promotion modifiers (constructor property promotion).
    pub modifiers: Vec<Modifier>,
    pub name: Ident,
    pub ty: Option<TypeNode>,
    pub default: Option<ExprId>,
    pub by_ref: bool,
    pub variadic: bool,
    pub doc_comment: Option<DocComment>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct PropertyDecl {
    pub attributes: Vec<AttributeGroup>,
    pub modifiers: Vec<Modifier>,
    pub ty: Option<TypeNode>,
    pub entries: Vec<PropertyEntry>,
    pub has_hooks: bool,
    pub doc_comment: Option<DocComment>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyEntry {
    pub name: Ident,
    pub default: Option<ExprId>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct ClassConstDecl {
    pub attributes: Vec<AttributeGroup>,
    pub modifiers: Vec<Modifier>,
    pub ty: Option<TypeNode>,
    pub consts: Vec<ConstItem>,
    pub doc_comment: Option<DocComment>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstItem {
    pub name: Ident,
    pub value: ExprId,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct TraitUseDecl {
    pub traits: Vec<Name>,
    pub adaptations: Vec<TraitAdaptation>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraitMethodRef {
    pub trait_name: Option<Name>,
    pub method: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum TraitAdaptation {
    Precedence {
        method: TraitMethodRef,
        insteadof: Vec<Name>,
        span: Span,
    },
    Alias {
        method: TraitMethodRef,
        alias: Option<Ident>,
        visibility: Option<Modifier>,
        span: Span,
    },
}

#[derive(Debug, Serialize)]
pub struct EnumCaseDecl {
    pub attributes: Vec<AttributeGroup>,
    pub name: Ident,
    pub value: Option<ExprId>,
    pub doc_comment: Option<DocComment>,
    pub span: Span,
}

/// `const A = 1, B = 2;` at namespace level.
#[derive(Debug, Serialize)]
pub struct ConstStmt {
    pub attributes: Vec<AttributeGroup>,
    pub namespace: Option<String>,
    pub consts: Vec<ConstItem>,
    pub doc_comment: Option<DocComment>,
    pub span: Span,
}

#[derive(Debug, Serialize)]
pub struct CallStmt {
    pub name: Name,
    pub args: Vec<Arg>,
    pub namespace: Option<String>,
    pub doc_comment: Option<DocComment>,
    pub span: Span,
}

impl CallStmt {
    pub fn is_define(&self) -> bool {
        self.name.resolved.eq_ignore_ascii_case("define")
            || self
                .name
                .fallback
                .as_deref()
                .is_some_and(|f| f.eq_ignore_ascii_case("define"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum TypeNode {
    /// Builtin keyword type (`int`, `?`-less `null`, `self`, `static`, ...) or a class name.
    Named { name: Name, builtin: bool },
    Nullable { inner: Box<TypeNode>, span: Span },
    Union { types: Vec<TypeNode>, span: Span },
    Intersection { types: Vec<TypeNode>, span: Span },
}

impl TypeNode {
    pub fn span(&self) -> Span {
        match self {
            TypeNode::Named { name, .. } => name.span,
            TypeNode::Nullable { span, .. }
            | TypeNode::Union { span, .. }
            | TypeNode::Intersection { span, .. } => *span,
        }
    }
}

#[derive(Debug, Serialize)]
pub enum Expr {
    Int {
        value: i64,
        span: Span,
    },
    Float {
        value: f64,
        span: Span,
    },
    String {
        value: String,
        span: Span,
    },
    Bool {
        value: bool,
        span: Span,
    },
    Null {
        span: Span,
    },
    Array {
        items: Vec<ArrayItem>,
        span: Span,
    },
    ConstFetch {
        name: Name,
        span: Span,
    },
    ClassConstFetch {
        class: Name,
        constant: Ident,
        span: Span,
    },
    MagicConst {
        kind: MagicConstKind,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        expr: ExprId,
        span: Span,
    },
    Binary {
        left: ExprId,
        op: BinaryOp,
        right: ExprId,
        span: Span,
    },
    Ternary {
        condition: ExprId,
        if_true: Option<ExprId>,
        if_false: ExprId,
        span: Span,
    },
    ArrayDimFetch {
        array: ExprId,
        dim: ExprId,
        span: Span,
    },
    PropertyFetch {
        target: ExprId,
        property: Ident,
        nullsafe: bool,
        span: Span,
    },
    New {
        class: Name,
        args: Vec<Arg>,
        span: Span,
    },
    Call {
        name: Name,
        args: Vec<Arg>,
        span: Span,
    },
    /// Anything outside the constant-expression grammar.
    Unsupported {
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Int { span, .. }
            | Expr::Float { span, .. }
            | Expr::String { span, .. }
            | Expr::Bool { span, .. }
            | Expr::Null { span }
            | Expr::Array { span, .. }
            | Expr::ConstFetch { span, .. }
            | Expr::ClassConstFetch { span, .. }
            | Expr::MagicConst { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Ternary { span, .. }
            | Expr::ArrayDimFetch { span, .. }
            | Expr::PropertyFetch { span, .. }
            | Expr::New { span, .. }
            | Expr::Call { span, .. }
            | Expr::Unsupported { span } => *span,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, Expr::Null { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrayItem {
    pub key: Option<ExprId>,
    pub value: ExprId,
    pub unpack: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    Concat,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Coalesce,
    Spaceship,
    Pow,
    ShiftLeft,
    ShiftRight,
    LogicalXor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MagicConstKind {
    Dir,
    File,
    Line,
    Function,
    Class,
    Trait,
    Method,
    Namespace,
    Property,
}

impl MagicConstKind {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "__dir__" => MagicConstKind::Dir,
            "__file__" => MagicConstKind::File,
            "__line__" => MagicConstKind::Line,
            "__function__" => MagicConstKind::Function,
            "__class__" => MagicConstKind::Class,
            "__trait__" => MagicConstKind::Trait,
            "__method__" => MagicConstKind::Method,
            "__namespace__" => MagicConstKind::Namespace,
            "__property__" => MagicConstKind::Property,
            _ => return None,
        })
    }
}
