use super::{Parser, UseKind};
use crate::parser::ast::{AttributeGroup, CallStmt, ConstItem, ConstStmt, DocComment, Stmt};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;
use std::rc::Rc;

impl<'src> Parser<'src> {
    pub(super) fn parse_namespace(&mut self) -> Stmt {
        let start = self.current_token.span.start;
        self.bump(); // Eat namespace

        let name = if self.at(TokenKind::OpenBrace) {
            None
        } else {
            let (text, _, _) = self.parse_raw_name();
            Some(text.trim_start_matches('\\').to_string())
        };
        self.scope.enter_namespace(name.clone());

        let mut body = Vec::new();
        if self.eat(TokenKind::OpenBrace) {
            while !matches!(self.current_token.kind, TokenKind::CloseBrace | TokenKind::Eof) {
                self.parse_statement(&mut body);
            }
            self.expect(TokenKind::CloseBrace, "Expected '}' to close namespace");
            self.scope.enter_namespace(None);
        } else {
            self.expect_semicolon();
            while !self.at(TokenKind::Eof) && !self.at_namespace_declaration() {
                self.parse_statement(&mut body);
            }
        }

        Stmt::Namespace {
            name,
            body,
            span: Span::new(start, self.prev_end),
        }
    }

    fn at_namespace_declaration(&self) -> bool {
        self.at(TokenKind::Namespace)
            && !matches!(
                self.next_token.kind,
                TokenKind::NsSeparator | TokenKind::OpenParen
            )
    }

    /// Parses one statement, pushing any declarations it contains onto `out`.
    pub(super) fn parse_statement(&mut self, out: &mut Vec<Stmt>) {
        let start = self.current_token.span.start;
        let doc_comment = self.take_doc_comment();

        match self.current_token.kind {
            TokenKind::OpenTag | TokenKind::CloseTag | TokenKind::InlineHtml => {
                self.bump();
                out.push(Stmt::Nop {
                    span: Span::new(start, self.prev_end),
                });
            }
            TokenKind::CloseBrace => {
                self.error("Unexpected '}'");
                self.bump();
            }
            TokenKind::SemiColon => {
                self.bump();
            }
            TokenKind::OpenBrace => {
                self.bump();
                self.parse_block(out);
            }
            TokenKind::Use => self.parse_use(),
            TokenKind::Namespace if self.at_namespace_declaration() => {
                // Nested namespace declarations are invalid; treat as a new scope.
                self.error("Namespace declaration statement cannot be nested");
                out.push(self.parse_namespace());
            }
            TokenKind::Attribute => {
                let attributes = self.parse_attributes();
                let doc_comment = doc_comment.or_else(|| self.take_doc_comment());
                if self.at_class_like_start() {
                    out.push(Stmt::ClassLike(
                        self.parse_class_like(attributes, doc_comment, start),
                    ));
                } else if self.at(TokenKind::Function) && self.at_named_function() {
                    out.push(Stmt::Function(self.parse_function(
                        attributes,
                        doc_comment,
                        start,
                    )));
                } else if self.at(TokenKind::Const) {
                    out.push(self.parse_const_stmt(attributes, doc_comment, start));
                } else {
                    self.parse_other_statement(out, start);
                }
            }
            _ if self.at_class_like_start() => {
                out.push(Stmt::ClassLike(
                    self.parse_class_like(Vec::new(), doc_comment, start),
                ));
            }
            TokenKind::Function if self.at_named_function() => {
                out.push(Stmt::Function(self.parse_function(
                    Vec::new(),
                    doc_comment,
                    start,
                )));
            }
            TokenKind::Const => out.push(self.parse_const_stmt(Vec::new(), doc_comment, start)),
            TokenKind::Identifier | TokenKind::NsSeparator if self.at_simple_call() => {
                self.parse_call_statement(out, doc_comment, start);
            }
            _ => self.parse_other_statement(out, start),
        }
    }

    fn parse_block(&mut self, out: &mut Vec<Stmt>) {
        while !matches!(self.current_token.kind, TokenKind::CloseBrace | TokenKind::Eof) {
            self.parse_statement(out);
        }
        self.eat(TokenKind::CloseBrace);
    }

    fn at_class_like_start(&self) -> bool {
        match self.current_token.kind {
            TokenKind::Class => self.next_token.kind.is_identifier_like(),
            TokenKind::Interface | TokenKind::Trait => true,
            TokenKind::Abstract | TokenKind::Final | TokenKind::Readonly => matches!(
                self.next_token.kind,
                TokenKind::Class | TokenKind::Abstract | TokenKind::Final | TokenKind::Readonly
            ),
            TokenKind::Identifier => {
                self.current_is_keyword("enum") && self.next_token.kind.is_identifier_like()
            }
            _ => false,
        }
    }

    fn at_named_function(&self) -> bool {
        match self.next_token.kind {
            TokenKind::Ampersand => self.peek_third().is_identifier_like(),
            kind => kind.is_identifier_like(),
        }
    }

    /// `name(` or `\name(` at statement start.
    fn at_simple_call(&self) -> bool {
        if self.at(TokenKind::NsSeparator) {
            return self.next_token.kind == TokenKind::Identifier
                && self.peek_third() == TokenKind::OpenParen;
        }
        self.next_token.kind == TokenKind::OpenParen
    }

    pub(super) fn parse_use(&mut self) {
        self.bump(); // Eat use

        let mut kind = UseKind::Class;
        if self.eat(TokenKind::Function) {
            kind = UseKind::Function;
        } else if self.eat(TokenKind::Const) {
            kind = UseKind::Const;
        }

        loop {
            let (prefix, _, _) = self.parse_raw_name();
            let prefix = prefix.trim_start_matches('\\').to_string();

            if self.at(TokenKind::NsSeparator) && self.next_token.kind == TokenKind::OpenBrace {
                self.bump();
                self.bump();
                while !matches!(self.current_token.kind, TokenKind::CloseBrace | TokenKind::Eof) {
                    let mut item_kind = kind;
                    if self.eat(TokenKind::Function) {
                        item_kind = UseKind::Function;
                    } else if self.eat(TokenKind::Const) {
                        item_kind = UseKind::Const;
                    }
                    let (name, _, _) = self.parse_raw_name();
                    if name.is_empty() {
                        self.bump();
                        continue;
                    }
                    self.parse_use_alias(item_kind, format!("{prefix}\\{name}"));
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::CloseBrace, "Expected '}' to close group use");
            } else if !prefix.is_empty() {
                self.parse_use_alias(kind, prefix);
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.expect_semicolon();
    }

    fn parse_use_alias(&mut self, kind: UseKind, target: String) {
        let alias = if self.eat(TokenKind::As) {
            match self.parse_ident() {
                Some(ident) => ident.name,
                None => return,
            }
        } else {
            target.rsplit('\\').next().unwrap_or(&target).to_string()
        };
        self.scope.import(kind, target, alias);
    }

    pub(super) fn parse_const_stmt(
        &mut self,
        attributes: Vec<AttributeGroup>,
        doc_comment: Option<DocComment>,
        start: usize,
    ) -> Stmt {
        self.bump(); // Eat const
        let consts = self.parse_const_items();
        self.expect_semicolon();

        Stmt::Const(Rc::new(ConstStmt {
            attributes,
            namespace: self.scope.namespace.clone(),
            consts,
            doc_comment,
            span: Span::new(start, self.prev_end),
        }))
    }

    /// `NAME = expr, NAME = expr` as shared by global and class constants.
    pub(super) fn parse_const_items(&mut self) -> Vec<ConstItem> {
        let mut consts = Vec::new();
        loop {
            let start = self.current_token.span.start;
            let Some(name) = self.parse_ident() else {
                self.sync_to_statement_end();
                break;
            };
            self.expect(TokenKind::Eq, "Expected '=' in constant declaration");
            let value = self.parse_const_expr();
            consts.push(ConstItem {
                name,
                value,
                span: Span::new(start, self.prev_end),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        consts
    }

    fn parse_call_statement(
        &mut self,
        out: &mut Vec<Stmt>,
        doc_comment: Option<DocComment>,
        start: usize,
    ) {
        let name = self.parse_name(UseKind::Function);
        let args = self.parse_call_arguments();

        if matches!(
            self.current_token.kind,
            TokenKind::SemiColon | TokenKind::CloseTag | TokenKind::Eof
        ) {
            self.eat(TokenKind::SemiColon);
            out.push(Stmt::Call(Rc::new(CallStmt {
                name,
                args,
                namespace: self.scope.namespace.clone(),
                doc_comment,
                span: Span::new(start, self.prev_end),
            })));
        } else {
            // Call used inside a larger expression.
            self.parse_other_statement(out, start);
        }
    }

    /// Skips a statement the declaration parser does not model, still
    /// descending into blocks and capturing closures.
    pub(super) fn parse_other_statement(&mut self, out: &mut Vec<Stmt>, start: usize) {
        let mut depth = 0usize;
        loop {
            match self.current_token.kind {
                TokenKind::Eof => break,
                TokenKind::CloseTag if depth == 0 => break,
                TokenKind::CloseBrace if depth == 0 => break,
                TokenKind::SemiColon if depth == 0 => {
                    self.bump();
                    break;
                }
                TokenKind::OpenBrace if depth == 0 => {
                    self.bump();
                    out.push(Stmt::Nop {
                        span: Span::new(start, self.prev_end),
                    });
                    self.parse_block(out);
                    return;
                }
                TokenKind::OpenBrace => {
                    self.skip_braces();
                }
                TokenKind::OpenParen | TokenKind::OpenBracket => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::CloseParen | TokenKind::CloseBracket => {
                    depth = depth.saturating_sub(1);
                    self.bump();
                }
                _ if self.at_closure_start() => self.parse_closure(),
                _ => self.bump(),
            }
        }

        out.push(Stmt::Nop {
            span: Span::new(start, self.prev_end.max(start)),
        });
    }
}
