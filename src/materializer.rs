//! Builds the reflection for one top-level declaration node.

use crate::error::{ReflectionError, Result};
use crate::locator::LocatedSource;
use crate::locator::ast::{DeclarationNode, define_name};
use crate::reflection::{ReflectionClass, ReflectionConstant, ReflectionFunction};
use crate::reflector::Reflector;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Reflection {
    Class(Rc<ReflectionClass>),
    Function(Rc<ReflectionFunction>),
    Constant(Rc<ReflectionConstant>),
}

/// Classes, interfaces, traits and enums all become a [`ReflectionClass`];
/// `const` items and `define()` calls become a [`ReflectionConstant`].
///
/// A `define()` call must have exactly two arguments, the first a literal
/// string, or it is an invalid constant declaration.
pub fn materialize(
    reflector: &Reflector,
    node: &DeclarationNode,
    source: &Rc<LocatedSource>,
) -> Result<Reflection> {
    Ok(match node {
        DeclarationNode::ClassLike(decl) => {
            Reflection::Class(ReflectionClass::new(reflector, source.clone(), decl.clone()))
        }
        DeclarationNode::Function(decl) => {
            Reflection::Function(ReflectionFunction::new(reflector, source.clone(), decl.clone()))
        }
        DeclarationNode::Const { stmt, index } => {
            if *index >= stmt.consts.len() {
                return Err(ReflectionError::invalid_constant_declaration());
            }
            Reflection::Constant(ReflectionConstant::from_const(
                reflector,
                source.clone(),
                stmt.clone(),
                *index,
            ))
        }
        DeclarationNode::DefineCall(call) => {
            let name = define_name(call)
                .filter(|_| call.args.len() == 2 && call.args.iter().all(|arg| arg.name.is_none() && !arg.unpack))
                .ok_or_else(ReflectionError::invalid_constant_declaration)?;
            Reflection::Constant(ReflectionConstant::from_define(
                reflector,
                source.clone(),
                call.clone(),
                name,
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::IdentifierType;
    use crate::locator::ast::declarations_of_type;

    fn first_constant(code: &str) -> (Reflector, Rc<LocatedSource>, DeclarationNode) {
        let reflector = Reflector::for_source("<?php");
        let source = Rc::new(LocatedSource::new(code, None));
        let node = declarations_of_type(&source.program(), IdentifierType::Constant)
            .into_iter()
            .next()
            .expect("a constant declaration");
        (reflector, source, node)
    }

    #[test]
    fn test_define_with_literal_name() {
        let (reflector, source, node) = first_constant("<?php define('APP_VERSION', '1.2');");
        let Ok(Reflection::Constant(constant)) = materialize(&reflector, &node, &source) else {
            panic!("expected a constant");
        };
        assert_eq!(constant.get_name(), "APP_VERSION");
    }

    #[test]
    fn test_malformed_define_is_rejected() {
        for code in [
            "<?php define('ONLY_NAME');",
            "<?php define($name, 1);",
            "<?php define('A', 1, true);",
        ] {
            let (reflector, source, node) = first_constant(code);
            let err = materialize(&reflector, &node, &source).expect_err(code);
            assert_eq!(err, ReflectionError::invalid_constant_declaration(), "{code}");
        }
    }
}
