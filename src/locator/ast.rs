//! Picks declaration nodes for an identity out of a parsed program.

use crate::identifier::{Identifier, IdentifierType};
use crate::parser::ast::{CallStmt, ClassLikeDecl, ConstStmt, Expr, FunctionDecl, Program, Stmt};
use crate::parser::span::Span;
use std::rc::Rc;

/// A top-level node that declares a reflectable symbol.
#[derive(Debug, Clone)]
pub enum DeclarationNode {
    ClassLike(Rc<ClassLikeDecl>),
    Function(Rc<FunctionDecl>),
    /// One item of a `const A = 1, B = 2;` statement.
    Const { stmt: Rc<ConstStmt>, index: usize },
    /// A `define('NAME', value)` call.
    DefineCall(Rc<CallStmt>),
}

impl DeclarationNode {
    pub fn identifier_type(&self) -> IdentifierType {
        match self {
            DeclarationNode::ClassLike(_) => IdentifierType::Class,
            DeclarationNode::Function(_) => IdentifierType::Function,
            DeclarationNode::Const { .. } | DeclarationNode::DefineCall(_) => {
                IdentifierType::Constant
            }
        }
    }

    /// Fully-qualified declared name, if it can be read off the node.
    pub fn declared_name(&self) -> Option<String> {
        match self {
            DeclarationNode::ClassLike(decl) => Some(decl.fqn.clone()),
            DeclarationNode::Function(decl) => decl.fqn.clone(),
            DeclarationNode::Const { stmt, index } => {
                let item = stmt.consts.get(*index)?;
                Some(match &stmt.namespace {
                    Some(ns) => format!("{ns}\\{}", item.name.name),
                    None => item.name.name.clone(),
                })
            }
            DeclarationNode::DefineCall(call) => define_name(call),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            DeclarationNode::ClassLike(decl) => decl.span,
            DeclarationNode::Function(decl) => decl.span,
            DeclarationNode::Const { stmt, .. } => stmt.span,
            DeclarationNode::DefineCall(call) => call.span,
        }
    }
}

/// The literal name passed as the first argument of a `define()` call.
pub fn define_name(call: &CallStmt) -> Option<String> {
    match call.args.first().map(|arg| &*arg.value) {
        Some(Expr::String { value, .. }) => Some(value.trim_start_matches('\\').to_string()),
        _ => None,
    }
}

fn collect(program: &Program, kind: IdentifierType) -> Vec<DeclarationNode> {
    let mut found = Vec::new();
    program.for_each_statement(|stmt| match (stmt, kind) {
        (Stmt::ClassLike(decl), IdentifierType::Class) => {
            found.push(DeclarationNode::ClassLike(decl.clone()))
        }
        (Stmt::Function(decl), IdentifierType::Function) => {
            found.push(DeclarationNode::Function(decl.clone()))
        }
        (Stmt::Const(stmt), IdentifierType::Constant) => {
            for index in 0..stmt.consts.len() {
                found.push(DeclarationNode::Const {
                    stmt: stmt.clone(),
                    index,
                });
            }
        }
        (Stmt::Call(call), IdentifierType::Constant) if call.is_define() => {
            found.push(DeclarationNode::DefineCall(call.clone()))
        }
        _ => {}
    });
    found
}

/// All declarations of `kind`, in source order.
pub fn declarations_of_type(program: &Program, kind: IdentifierType) -> Vec<DeclarationNode> {
    collect(program, kind)
}

/// The first declaration in `program` matching `identifier`.
pub fn find_declaration(program: &Program, identifier: &Identifier) -> Option<DeclarationNode> {
    collect(program, identifier.kind())
        .into_iter()
        .find(|node| {
            node.declared_name()
                .is_some_and(|name| identifier.matches(&name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_find_class_case_insensitively() {
        let program = parse(b"<?php namespace App; class Foo {} function bar() {}");
        let node = find_declaration(&program, &Identifier::class("app\\FOO"));
        assert!(matches!(node, Some(DeclarationNode::ClassLike(_))));
        assert!(find_declaration(&program, &Identifier::function("App\\BAR")).is_some());
        assert!(find_declaration(&program, &Identifier::class("App\\bar")).is_none());
    }

    #[test]
    fn test_find_constants_from_const_and_define() {
        let program = parse(b"<?php namespace App; const A = 1, B = 2; define('GLOBAL_C', 3);");
        let Some(DeclarationNode::Const { index, .. }) =
            find_declaration(&program, &Identifier::constant("app\\B"))
        else {
            panic!("expected const item");
        };
        assert_eq!(index, 1);
        assert!(matches!(
            find_declaration(&program, &Identifier::constant("GLOBAL_C")),
            Some(DeclarationNode::DefineCall(_))
        ));
        assert!(find_declaration(&program, &Identifier::constant("App\\b")).is_none());
        assert_eq!(declarations_of_type(&program, IdentifierType::Constant).len(), 3);
    }
}
