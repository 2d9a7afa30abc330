use super::{Parser, UseKind};
use crate::parser::ast::{Attribute, AttributeGroup};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;

impl<'src> Parser<'src> {
    pub(super) fn parse_attributes(&mut self) -> Vec<AttributeGroup> {
        let mut groups = Vec::new();
        while self.at(TokenKind::Attribute) {
            let start = self.current_token.span.start;
            self.bump(); // Eat #[

            let mut attributes = Vec::new();
            while !matches!(self.current_token.kind, TokenKind::CloseBracket | TokenKind::Eof) {
                let name = self.parse_name(UseKind::Class);
                let args = if self.at(TokenKind::OpenParen) {
                    self.parse_call_arguments()
                } else {
                    Vec::new()
                };

                attributes.push(Attribute {
                    span: Span::new(name.span.start, self.prev_end),
                    name,
                    args,
                });

                // Trailing comma is allowed.
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }

            self.expect(TokenKind::CloseBracket, "Expected ']' to close attribute");
            groups.push(AttributeGroup {
                attributes,
                span: Span::new(start, self.prev_end),
            });
        }
        groups
    }
}
