use crate::parser::span::Span;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a [u8]) -> &'a [u8] {
        self.span.as_str(source)
    }

    pub fn line(&self, source: &[u8]) -> usize {
        source
            .get(..self.span.start)
            .unwrap_or_default()
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize)]
pub enum TokenKind {
    // Keywords
    Abstract,
    Array,
    As,
    Case,
    Class,
    Const,
    Extends,
    Final,
    Fn,
    Function,
    Implements,
    Insteadof,
    Interface,
    Namespace,
    New,
    Private,
    Protected,
    Public,
    PrivateSet,
    ProtectedSet,
    PublicSet,
    Readonly,
    Static,
    Trait,
    Use,
    Yield,
    LogicalAnd, // and
    LogicalOr,  // or
    LogicalXor, // xor
    InstanceOf,

    // Identifiers & Literals
    Identifier,
    Variable,
    LNumber,
    DNumber,
    StringLiteral,
    /// Double-quoted, heredoc or backtick string containing interpolation.
    TemplateString,
    InlineHtml,
    NsSeparator, // \
    Dollar,

    // Comments
    Comment,
    DocComment,

    // Symbols
    Arrow,         // ->
    NullSafeArrow, // ?->
    DoubleArrow,   // =>
    DoubleColon,   // ::
    Ellipsis,      // ...

    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Dot,
    Pow, // **
    Inc,
    Dec,

    Eq,       // =
    AssignOp, // +=, -=, .=, ??= ...

    EqEq,      // ==
    EqEqEq,    // ===
    Bang,      // !
    BangEq,    // != and <>
    BangEqEq,  // !==
    Lt,        // <
    LtEq,      // <=
    Gt,        // >
    GtEq,      // >=
    Spaceship, // <=>

    Ampersand, // &
    Pipe,      // |
    Caret,     // ^
    BitNot,    // ~
    Sl,        // <<
    Sr,        // >>

    AmpersandAmpersand, // &&
    PipePipe,           // ||
    Question,           // ?
    Coalesce,           // ??
    At,                 // @

    SemiColon,
    Colon,
    Comma,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Attribute, // #[

    OpenTag,     // <?php
    OpenTagEcho, // <?=
    CloseTag,    // ?>

    Eof,

    // Error token for lexing failures
    Error,
}

impl TokenKind {
    /// Keywords that may still be used as member, constant or label names.
    pub fn is_semi_reserved(self) -> bool {
        matches!(
            self,
            TokenKind::Abstract
                | TokenKind::Array
                | TokenKind::As
                | TokenKind::Case
                | TokenKind::Class
                | TokenKind::Const
                | TokenKind::Extends
                | TokenKind::Final
                | TokenKind::Fn
                | TokenKind::Function
                | TokenKind::Implements
                | TokenKind::Insteadof
                | TokenKind::Interface
                | TokenKind::Namespace
                | TokenKind::New
                | TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Public
                | TokenKind::Readonly
                | TokenKind::Static
                | TokenKind::Trait
                | TokenKind::Use
                | TokenKind::Yield
                | TokenKind::LogicalAnd
                | TokenKind::LogicalOr
                | TokenKind::LogicalXor
                | TokenKind::InstanceOf
        )
    }

    pub fn is_identifier_like(self) -> bool {
        self == TokenKind::Identifier || self.is_semi_reserved()
    }

    pub fn is_member_modifier(self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::PublicSet
                | TokenKind::ProtectedSet
                | TokenKind::PrivateSet
                | TokenKind::Static
                | TokenKind::Abstract
                | TokenKind::Final
                | TokenKind::Readonly
        )
    }
}
