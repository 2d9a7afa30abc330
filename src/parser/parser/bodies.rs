use super::Parser;
use crate::parser::ast::{FunctionDecl, FunctionKind, Modifier};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;
use std::rc::Rc;

impl<'src> Parser<'src> {
    /// Skips a `{ ... }` body. Returns its span and whether it yields.
    ///
    /// Closures and arrow functions inside the body are parsed and recorded;
    /// a `yield` inside them does not count for the enclosing body.
    pub(super) fn skip_body(&mut self) -> (Span, bool) {
        let start = self.current_token.span.start;
        let mut depth = 0usize;
        let mut is_generator = false;

        loop {
            match self.current_token.kind {
                TokenKind::OpenBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::CloseBrace => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                    if depth == 0 {
                        break;
                    }
                }
                TokenKind::Eof => {
                    self.error("Unterminated body");
                    break;
                }
                TokenKind::Yield => {
                    is_generator = true;
                    self.bump();
                }
                _ if self.at_closure_start() => self.parse_closure(),
                _ => self.bump(),
            }
        }

        (Span::new(start, self.prev_end.max(start)), is_generator)
    }

    pub(super) fn skip_braces(&mut self) {
        self.skip_body();
    }

    /// Skips the expression body of an arrow function, leaving the
    /// terminating token in place.
    fn skip_arrow_body(&mut self) -> (Span, bool) {
        let start = self.current_token.span.start;
        let mut depth = 0usize;
        let mut is_generator = false;

        loop {
            match self.current_token.kind {
                TokenKind::Eof | TokenKind::CloseTag => break,
                TokenKind::SemiColon
                | TokenKind::Comma
                | TokenKind::CloseParen
                | TokenKind::CloseBracket
                | TokenKind::CloseBrace
                    if depth == 0 =>
                {
                    break;
                }
                TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                    depth -= 1;
                    self.bump();
                }
                TokenKind::Yield => {
                    is_generator = true;
                    self.bump();
                }
                _ if self.at_closure_start() => self.parse_closure(),
                _ => self.bump(),
            }
        }

        (Span::new(start, self.prev_end.max(start)), is_generator)
    }

    pub(super) fn at_closure_start(&self) -> bool {
        if matches!(
            self.prev_kind,
            TokenKind::Arrow | TokenKind::NullSafeArrow | TokenKind::DoubleColon
        ) {
            return false;
        }

        match self.current_token.kind {
            TokenKind::Function | TokenKind::Fn => match self.next_token.kind {
                TokenKind::OpenParen => true,
                TokenKind::Ampersand => self.peek_third() == TokenKind::OpenParen,
                _ => false,
            },
            TokenKind::Static => {
                matches!(self.next_token.kind, TokenKind::Function | TokenKind::Fn)
                    && matches!(
                        self.peek_third(),
                        TokenKind::OpenParen | TokenKind::Ampersand
                    )
            }
            _ => false,
        }
    }

    pub(super) fn parse_closure(&mut self) {
        let start = self.current_token.span.start;
        let doc_comment = self.take_doc_comment();

        let mut modifiers = Vec::new();
        if self.eat(TokenKind::Static) {
            modifiers.push(Modifier::Static);
        }

        let is_arrow = self.at(TokenKind::Fn);
        self.bump(); // Eat function / fn
        let by_ref = self.eat(TokenKind::Ampersand);
        let params = self.parse_parameters();

        if !is_arrow && self.eat(TokenKind::Use) && self.at(TokenKind::OpenParen) {
            self.skip_parens();
        }

        let return_type = if self.eat(TokenKind::Colon) {
            self.parse_type()
        } else {
            None
        };

        let (body, is_generator) = if is_arrow {
            self.expect(TokenKind::DoubleArrow, "Expected '=>' in arrow function");
            self.skip_arrow_body()
        } else if self.at(TokenKind::OpenBrace) {
            self.skip_body()
        } else {
            self.error("Expected closure body");
            (Span::new(self.prev_end, self.prev_end), false)
        };

        self.closures.push(Rc::new(FunctionDecl {
            kind: if is_arrow {
                FunctionKind::ArrowFunction
            } else {
                FunctionKind::Closure
            },
            attributes: Vec::new(),
            modifiers,
            name: None,
            fqn: None,
            namespace: self.scope.namespace.clone(),
            by_ref,
            params,
            return_type,
            body: Some(body),
            is_generator,
            doc_comment,
            span: Span::new(start, self.prev_end),
        }));
    }

    pub(super) fn skip_parens(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current_token.kind {
                TokenKind::OpenParen => depth += 1,
                TokenKind::CloseParen => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                }
                TokenKind::Eof => return,
                _ => {}
            }
            self.bump();
        }
    }
}
