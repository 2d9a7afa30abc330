use crate::parser::ast::{DocComment, FunctionDecl, Ident, Name, NameKind, ParseError, Program};
use crate::parser::lexer::{
    Lexer,
    token::{Token, TokenKind},
};
use crate::parser::span::Span;
use std::collections::HashMap;
use std::rc::Rc;

mod attributes;
mod bodies;
mod definitions;
mod expr;
mod stmt;
mod strings;
mod types;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum UseKind {
    Class,
    Function,
    Const,
}

/// Namespace and `use` imports in effect at the current position.
#[derive(Debug, Default)]
pub(super) struct NameScope {
    pub(super) namespace: Option<String>,
    classes: HashMap<String, String>,
    functions: HashMap<String, String>,
    constants: HashMap<String, String>,
}

impl NameScope {
    pub(super) fn enter_namespace(&mut self, namespace: Option<String>) {
        *self = NameScope {
            namespace,
            ..NameScope::default()
        };
    }

    pub(super) fn import(&mut self, kind: UseKind, target: String, alias: String) {
        match kind {
            UseKind::Class => self.classes.insert(alias.to_ascii_lowercase(), target),
            UseKind::Function => self.functions.insert(alias.to_ascii_lowercase(), target),
            // Constant aliases are case-sensitive.
            UseKind::Const => self.constants.insert(alias, target),
        };
    }

    pub(super) fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}\\{name}"),
            None => name.to_string(),
        }
    }

    fn resolve_qualified(&self, name: &str) -> String {
        let (first, rest) = name.split_once('\\').unwrap_or((name, ""));
        match self.classes.get(&first.to_ascii_lowercase()) {
            Some(target) if rest.is_empty() => target.clone(),
            Some(target) => format!("{target}\\{rest}"),
            None => self.qualify(name),
        }
    }

    /// Resolves `original` for the given symbol kind, returning the resolved
    /// name and, for unqualified functions and constants, the global fallback.
    pub(super) fn resolve(
        &self,
        original: &str,
        kind: NameKind,
        symbol: UseKind,
    ) -> (String, Option<String>) {
        match kind {
            NameKind::FullyQualified => (original.trim_start_matches('\\').to_string(), None),
            NameKind::Special => (original.to_ascii_lowercase(), None),
            NameKind::Qualified => {
                if let Some(rest) = strip_namespace_prefix(original) {
                    (self.qualify(rest), None)
                } else {
                    (self.resolve_qualified(original), None)
                }
            }
            NameKind::Unqualified => {
                let imported = match symbol {
                    UseKind::Class => self.classes.get(&original.to_ascii_lowercase()),
                    UseKind::Function => self.functions.get(&original.to_ascii_lowercase()),
                    UseKind::Const => self.constants.get(original),
                };
                if let Some(target) = imported {
                    return (target.clone(), None);
                }
                match (symbol, &self.namespace) {
                    (UseKind::Class, _) | (_, None) => (self.qualify(original), None),
                    (_, Some(_)) => (self.qualify(original), Some(original.to_string())),
                }
            }
        }
    }
}

fn strip_namespace_prefix(name: &str) -> Option<&str> {
    let (head, rest) = name.split_once('\\')?;
    head.eq_ignore_ascii_case("namespace").then_some(rest)
}

pub struct Parser<'src> {
    pub(super) lexer: Lexer<'src>,
    pub(super) source: &'src [u8],
    pub(super) current_token: Token,
    pub(super) next_token: Token,
    pub(super) prev_kind: TokenKind,
    pub(super) prev_end: usize,
    pub(super) errors: Vec<ParseError>,
    pub(super) current_doc_comment: Option<Span>,
    pub(super) next_doc_comment: Option<Span>,
    pub(super) scope: NameScope,
    pub(super) closures: Vec<Rc<FunctionDecl>>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src [u8]) -> Self {
        let eof = Token {
            kind: TokenKind::Eof,
            span: Span::default(),
        };
        let mut parser = Self {
            lexer: Lexer::new(source),
            source,
            current_token: eof,
            next_token: eof,
            prev_kind: TokenKind::Eof,
            prev_end: 0,
            errors: Vec::new(),
            current_doc_comment: None,
            next_doc_comment: None,
            scope: NameScope::default(),
            closures: Vec::new(),
        };
        parser.bump();
        parser.bump();
        parser
    }

    fn bump(&mut self) {
        self.prev_kind = self.current_token.kind;
        self.prev_end = self.current_token.span.end;
        self.current_token = self.next_token;
        self.current_doc_comment = self.next_doc_comment;
        self.next_doc_comment = None;
        loop {
            let token = self.lexer.next().unwrap_or(Token {
                kind: TokenKind::Eof,
                span: Span::new(self.source.len(), self.source.len()),
            });
            if token.kind == TokenKind::DocComment {
                self.next_doc_comment = Some(token.span);
            } else if token.kind != TokenKind::Comment {
                self.next_token = token;
                break;
            }
        }
    }

    /// Kind of the token after `next_token`.
    fn peek_third(&self) -> TokenKind {
        let mut lexer = self.lexer.clone();
        loop {
            match lexer.next() {
                Some(token) if matches!(token.kind, TokenKind::Comment | TokenKind::DocComment) => {
                }
                Some(token) => return token.kind,
                None => return TokenKind::Eof,
            }
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_token.kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &'static str) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(message);
            false
        }
    }

    fn error(&mut self, message: &'static str) {
        self.errors.push(ParseError {
            span: self.current_token.span,
            message,
        });
    }

    fn current_text(&self) -> String {
        String::from_utf8_lossy(self.current_token.text(self.source)).into_owned()
    }

    fn current_is_keyword(&self, keyword: &str) -> bool {
        self.at(TokenKind::Identifier)
            && self
                .current_token
                .text(self.source)
                .eq_ignore_ascii_case(keyword.as_bytes())
    }

    fn take_doc_comment(&mut self) -> Option<DocComment> {
        let span = self.current_doc_comment.take()?;
        Some(DocComment {
            text: String::from_utf8_lossy(span.as_str(self.source)).into_owned(),
            span,
        })
    }

    fn expect_semicolon(&mut self) {
        match self.current_token.kind {
            TokenKind::SemiColon => self.bump(),
            // Implicit semicolon at close tag or EOF
            TokenKind::CloseTag | TokenKind::Eof => {}
            _ => {
                self.error("Missing semicolon");
                self.sync_to_statement_end();
            }
        }
    }

    fn sync_to_statement_end(&mut self) {
        while !matches!(
            self.current_token.kind,
            TokenKind::SemiColon | TokenKind::CloseBrace | TokenKind::CloseTag | TokenKind::Eof
        ) {
            self.bump();
        }
        self.eat(TokenKind::SemiColon);
    }

    /// Parses an identifier-like token (semi-reserved keywords included).
    fn parse_ident(&mut self) -> Option<Ident> {
        if self.current_token.kind.is_identifier_like() {
            let ident = Ident {
                name: self.current_text(),
                span: self.current_token.span,
            };
            self.bump();
            Some(ident)
        } else {
            self.error("Expected identifier");
            None
        }
    }

    fn parse_variable_ident(&mut self) -> Option<Ident> {
        if self.at(TokenKind::Variable) {
            let text = self.current_text();
            let ident = Ident {
                name: text.trim_start_matches('$').to_string(),
                span: self.current_token.span,
            };
            self.bump();
            Some(ident)
        } else {
            self.error("Expected variable");
            None
        }
    }

    /// Reads a possibly qualified name as written, without resolving it.
    fn parse_raw_name(&mut self) -> (String, NameKind, Span) {
        let start = self.current_token.span.start;
        let mut text = String::new();
        let mut kind = NameKind::Unqualified;

        if self.at(TokenKind::NsSeparator) {
            kind = NameKind::FullyQualified;
            text.push('\\');
            self.bump();
        } else if self.at(TokenKind::Namespace) && self.next_token.kind == TokenKind::NsSeparator {
            kind = NameKind::Qualified;
            text.push_str("namespace\\");
            self.bump();
            self.bump();
        }

        loop {
            if self.current_token.kind.is_identifier_like() {
                text.push_str(&self.current_text());
                self.bump();
            } else {
                break;
            }

            if self.at(TokenKind::NsSeparator) && self.next_token.kind.is_identifier_like() {
                text.push('\\');
                if kind == NameKind::Unqualified {
                    kind = NameKind::Qualified;
                }
                self.bump();
            } else {
                break;
            }
        }

        if text.is_empty() {
            self.error("Expected name");
        }

        if kind == NameKind::Unqualified
            && ["self", "parent", "static"]
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&text))
        {
            kind = NameKind::Special;
        }

        (text, kind, Span::new(start, self.prev_end.max(start)))
    }

    pub(super) fn parse_name(&mut self, symbol: UseKind) -> Name {
        let (original, kind, span) = self.parse_raw_name();
        self.resolve_name(original, kind, span, symbol)
    }

    pub(super) fn resolve_name(
        &self,
        original: String,
        kind: NameKind,
        span: Span,
        symbol: UseKind,
    ) -> Name {
        let (resolved, fallback) = self.scope.resolve(&original, kind, symbol);
        Name {
            original,
            resolved,
            fallback,
            kind,
            span,
        }
    }

    pub fn parse_program(mut self) -> Program {
        let mut statements = Vec::new();

        while !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Namespace)
                && self.next_token.kind != TokenKind::NsSeparator
                && self.next_token.kind != TokenKind::OpenParen
            {
                statements.push(self.parse_namespace());
            } else {
                self.parse_statement(&mut statements);
            }
        }

        let span = Span::new(0, self.source.len());
        let mut closures = self.closures;
        closures.sort_by_key(|closure| closure.span.start);
        Program {
            statements,
            closures,
            errors: self.errors,
            span,
        }
    }
}
