use super::{Parser, UseKind};
use crate::parser::ast::{Name, NameKind, TypeNode};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;

/// Type keywords that never resolve against the namespace.
pub(crate) const BUILTIN_TYPES: &[&str] = &[
    "int", "float", "string", "bool", "array", "callable", "iterable", "object", "mixed", "void",
    "null", "never", "false", "true",
];

pub(crate) fn is_builtin_type(name: &str) -> bool {
    BUILTIN_TYPES.iter().any(|t| t.eq_ignore_ascii_case(name))
}

impl<'src> Parser<'src> {
    fn at_type_start(&self) -> bool {
        matches!(
            self.current_token.kind,
            TokenKind::Question | TokenKind::OpenParen | TokenKind::NsSeparator
        ) || self.current_token.kind.is_identifier_like()
    }

    /// An `&` that joins intersection members rather than marking a by-ref parameter.
    fn at_intersection_ampersand(&self) -> bool {
        self.at(TokenKind::Ampersand)
            && (self.next_token.kind.is_identifier_like()
                || matches!(
                    self.next_token.kind,
                    TokenKind::Question | TokenKind::OpenParen | TokenKind::NsSeparator
                ))
    }

    fn parse_type_atomic(&mut self) -> Option<TypeNode> {
        let start = self.current_token.span.start;
        if self.eat(TokenKind::Question) {
            let inner = self.parse_type_atomic()?;
            Some(TypeNode::Nullable {
                inner: Box::new(inner),
                span: Span::new(start, self.prev_end),
            })
        } else if self.eat(TokenKind::OpenParen) {
            let ty = self.parse_type_intersection()?;
            self.expect(TokenKind::CloseParen, "Expected ')' in type");
            Some(ty)
        } else if self.at_type_start() {
            let (original, kind, span) = self.parse_raw_name();
            if kind == NameKind::Unqualified && is_builtin_type(&original) {
                let resolved = original.to_ascii_lowercase();
                Some(TypeNode::Named {
                    name: Name {
                        original,
                        resolved,
                        fallback: None,
                        kind,
                        span,
                    },
                    builtin: true,
                })
            } else {
                Some(TypeNode::Named {
                    name: self.resolve_name(original, kind, span, UseKind::Class),
                    builtin: false,
                })
            }
        } else {
            None
        }
    }

    fn parse_type_intersection(&mut self) -> Option<TypeNode> {
        let start = self.current_token.span.start;
        let first = self.parse_type_atomic()?;
        if !self.at_intersection_ampersand() {
            return Some(first);
        }

        let mut types = vec![first];
        while self.at_intersection_ampersand() {
            self.bump();
            match self.parse_type_atomic() {
                Some(ty) => types.push(ty),
                None => break,
            }
        }
        Some(TypeNode::Intersection {
            types,
            span: Span::new(start, self.prev_end),
        })
    }

    pub(super) fn parse_type(&mut self) -> Option<TypeNode> {
        let start = self.current_token.span.start;
        let first = self.parse_type_intersection()?;
        if !self.at(TokenKind::Pipe) {
            return Some(first);
        }

        let mut types = vec![first];
        while self.eat(TokenKind::Pipe) {
            match self.parse_type_intersection() {
                Some(ty) => types.push(ty),
                None => {
                    self.error("Expected type after '|'");
                    break;
                }
            }
        }
        Some(TypeNode::Union {
            types,
            span: Span::new(start, self.prev_end),
        })
    }
}
