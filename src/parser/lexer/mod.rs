pub mod token;

use crate::parser::span::Span;
use memchr::{memchr, memchr3};
use token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerState {
    Initial,
    Scripting,
}

fn keyword_lookup(text: &[u8]) -> TokenKind {
    let lower = text.to_ascii_lowercase();
    match lower.as_slice() {
        b"abstract" => TokenKind::Abstract,
        b"and" => TokenKind::LogicalAnd,
        b"array" => TokenKind::Array,
        b"as" => TokenKind::As,
        b"case" => TokenKind::Case,
        b"class" => TokenKind::Class,
        b"const" => TokenKind::Const,
        b"extends" => TokenKind::Extends,
        b"final" => TokenKind::Final,
        b"fn" => TokenKind::Fn,
        b"function" => TokenKind::Function,
        b"implements" => TokenKind::Implements,
        b"instanceof" => TokenKind::InstanceOf,
        b"insteadof" => TokenKind::Insteadof,
        b"interface" => TokenKind::Interface,
        b"namespace" => TokenKind::Namespace,
        b"new" => TokenKind::New,
        b"or" => TokenKind::LogicalOr,
        b"private" => TokenKind::Private,
        b"protected" => TokenKind::Protected,
        b"public" | b"var" => TokenKind::Public,
        b"readonly" => TokenKind::Readonly,
        b"static" => TokenKind::Static,
        b"trait" => TokenKind::Trait,
        b"use" => TokenKind::Use,
        b"xor" => TokenKind::LogicalXor,
        b"yield" => TokenKind::Yield,
        _ => TokenKind::Identifier,
    }
}

fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

fn is_binary_digit(c: u8) -> bool {
    c == b'0' || c == b'1'
}

fn is_octal_digit(c: u8) -> bool {
    (b'0'..=b'7').contains(&c)
}

/// Byte-oriented PHP tokenizer.
///
/// Strings, heredocs and nowdocs are produced as single tokens; whether they
/// contain interpolation is reported through [`TokenKind::TemplateString`] so
/// the parser never needs to descend into them.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    input: &'src [u8],
    cursor: usize,
    state: LexerState,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src [u8]) -> Self {
        let mut cursor = 0;
        if input.starts_with(b"#!") {
            cursor = memchr(b'\n', input).map(|pos| pos + 1).unwrap_or(input.len());
        }

        Self {
            input,
            cursor,
            state: LexerState::Initial,
        }
    }

    pub fn slice(&self, span: Span) -> &'src [u8] {
        span.as_str(self.input)
    }

    pub fn input(&self) -> &'src [u8] {
        self.input
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.cursor).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.cursor + offset).copied()
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }

    fn advance_n(&mut self, n: usize) {
        self.cursor += n;
    }

    fn skip_whitespace(&mut self) {
        while self.cursor < self.input.len() && self.input[self.cursor].is_ascii_whitespace() {
            self.cursor += 1;
        }
    }

    fn read_identifier(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80 {
                self.cursor += 1;
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> TokenKind {
        let mut is_float = false;

        if self.peek() == Some(b'0') {
            let radix_digits: Option<fn(u8) -> bool> = match self.peek_at(1) {
                Some(b'x' | b'X') => Some(is_hex_digit),
                Some(b'b' | b'B') => Some(is_binary_digit),
                Some(b'o' | b'O') => Some(is_octal_digit),
                _ => None,
            };
            if let Some(is_digit) = radix_digits {
                self.advance_n(2);
                while let Some(c) = self.peek() {
                    if is_digit(c) || c == b'_' {
                        self.advance();
                    } else {
                        break;
                    }
                }
                return TokenKind::LNumber;
            }
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == b'_' {
                self.advance();
            } else if c == b'.' {
                if is_float {
                    break;
                }
                is_float = true;
                self.advance();
            } else if (c == b'e' || c == b'E')
                && self
                    .peek_at(1)
                    .is_some_and(|n| n.is_ascii_digit() || n == b'+' || n == b'-')
            {
                is_float = true;
                self.advance();
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.advance();
                }
            } else {
                break;
            }
        }

        if is_float {
            TokenKind::DNumber
        } else {
            TokenKind::LNumber
        }
    }

    fn consume_single_line_comment(&mut self) -> TokenKind {
        while self.cursor < self.input.len() {
            let remaining = &self.input[self.cursor..];
            match memchr3(b'\n', b'\r', b'?', remaining) {
                Some(pos) => {
                    self.cursor += pos;
                    if self.input[self.cursor] == b'?' {
                        if self.peek_at(1) == Some(b'>') {
                            break;
                        }
                        self.cursor += 1;
                    } else {
                        break;
                    }
                }
                None => {
                    self.cursor = self.input.len();
                    break;
                }
            }
        }
        TokenKind::Comment
    }

    fn consume_multi_line_comment(&mut self) -> TokenKind {
        let is_doc = self.peek() == Some(b'*') && self.peek_at(1) != Some(b'/');
        if is_doc {
            self.advance();
        }

        while self.cursor < self.input.len() {
            let remaining = &self.input[self.cursor..];
            match memchr(b'*', remaining) {
                Some(pos) => {
                    self.cursor += pos + 1;
                    if self.peek() == Some(b'/') {
                        self.advance();
                        return if is_doc {
                            TokenKind::DocComment
                        } else {
                            TokenKind::Comment
                        };
                    }
                }
                None => {
                    self.cursor = self.input.len();
                    break;
                }
            }
        }

        TokenKind::Error // Unterminated comment
    }

    fn read_single_quoted(&mut self) -> TokenKind {
        while let Some(c) = self.peek() {
            self.advance();
            if c == b'\\' {
                if self.peek().is_some() {
                    self.advance();
                }
                continue;
            }
            if c == b'\'' {
                return TokenKind::StringLiteral;
            }
        }
        TokenKind::Error
    }

    fn starts_interpolation(&self, at: usize) -> bool {
        match self.input.get(at) {
            Some(b'$') => self
                .input
                .get(at + 1)
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == b'_' || *n == b'{' || *n >= 0x80),
            Some(b'{') => self.input.get(at + 1) == Some(&b'$'),
            _ => false,
        }
    }

    fn read_quoted(&mut self, quote: u8) -> TokenKind {
        let mut interpolated = quote == b'`';
        while let Some(c) = self.peek() {
            if c == quote {
                self.advance();
                return if interpolated {
                    TokenKind::TemplateString
                } else {
                    TokenKind::StringLiteral
                };
            } else if c == b'\\' {
                self.advance();
                if self.peek().is_some() {
                    self.advance();
                }
            } else {
                if self.starts_interpolation(self.cursor) {
                    interpolated = true;
                }
                self.advance();
            }
        }
        TokenKind::Error
    }

    /// Reads `<<<LABEL ... LABEL` as one token. The cursor sits after `<<<`.
    fn read_heredoc(&mut self) -> TokenKind {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.advance();
        }

        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => {
                self.advance();
                Some(q)
            }
            _ => None,
        };

        let label_start = self.cursor;
        self.read_identifier();
        let label = &self.input[label_start..self.cursor];
        if label.is_empty() {
            return TokenKind::Error;
        }

        if let Some(q) = quote {
            if self.peek() != Some(q) {
                return TokenKind::Error;
            }
            self.advance();
        }

        match memchr(b'\n', &self.input[self.cursor..]) {
            Some(pos) => self.cursor += pos + 1,
            None => return TokenKind::Error,
        }

        let is_nowdoc = quote == Some(b'\'');
        let mut interpolated = false;
        loop {
            if self.cursor >= self.input.len() {
                return TokenKind::Error;
            }
            let line_start = self.cursor;
            let mut probe = line_start;
            while matches!(self.input.get(probe), Some(b' ' | b'\t')) {
                probe += 1;
            }
            if self.input[probe..].starts_with(label) {
                let after = self.input.get(probe + label.len()).copied();
                if !after.is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80) {
                    self.cursor = probe + label.len();
                    break;
                }
            }

            let line_end = memchr(b'\n', &self.input[line_start..])
                .map(|pos| line_start + pos + 1)
                .unwrap_or(self.input.len());
            if !is_nowdoc && !interpolated {
                let mut i = line_start;
                while i < line_end {
                    if self.input[i] == b'\\' {
                        i += 2;
                        continue;
                    }
                    if self.starts_interpolation(i) {
                        interpolated = true;
                        break;
                    }
                    i += 1;
                }
            }
            self.cursor = line_end;
        }

        if interpolated {
            TokenKind::TemplateString
        } else {
            TokenKind::StringLiteral
        }
    }

    /// `public(set)` style asymmetric visibility.
    fn check_set_visibility(&mut self, normal: TokenKind, set: TokenKind) -> TokenKind {
        if self.input[self.cursor..].len() >= 5
            && self.input[self.cursor..self.cursor + 5].eq_ignore_ascii_case(b"(set)")
        {
            self.advance_n(5);
            set
        } else {
            normal
        }
    }

    fn next_in_initial(&mut self) -> Token {
        let start = self.cursor;
        while self.cursor < self.input.len() {
            match memchr(b'<', &self.input[self.cursor..]) {
                Some(pos) => self.cursor += pos,
                None => {
                    self.cursor = self.input.len();
                    break;
                }
            }

            let rest = &self.input[self.cursor..];
            let tag = if rest.len() >= 5 && rest[..5].eq_ignore_ascii_case(b"<?php") {
                Some((5, TokenKind::OpenTag))
            } else if rest.starts_with(b"<?=") {
                Some((3, TokenKind::OpenTagEcho))
            } else {
                None
            };

            if let Some((len, kind)) = tag {
                if self.cursor > start {
                    return Token {
                        kind: TokenKind::InlineHtml,
                        span: Span::new(start, self.cursor),
                    };
                }
                let tag_start = self.cursor;
                self.advance_n(len);
                if kind == TokenKind::OpenTag && self.peek().is_some_and(|c| c.is_ascii_whitespace())
                {
                    self.advance();
                }
                self.state = LexerState::Scripting;
                return Token {
                    kind,
                    span: Span::new(tag_start, self.cursor),
                };
            }
            self.advance();
        }

        if self.cursor > start {
            return Token {
                kind: TokenKind::InlineHtml,
                span: Span::new(start, self.cursor),
            };
        }

        Token {
            kind: TokenKind::Eof,
            span: Span::new(self.cursor, self.cursor),
        }
    }

    fn next_in_scripting(&mut self) -> Token {
        self.skip_whitespace();

        if self.cursor >= self.input.len() {
            return Token {
                kind: TokenKind::Eof,
                span: Span::new(self.cursor, self.cursor),
            };
        }

        let start = self.cursor;
        let char = self.input[self.cursor];
        self.advance();

        let kind = match char {
            b'$' => {
                if self
                    .peek()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == b'_' || c >= 0x80)
                {
                    self.read_identifier();
                    TokenKind::Variable
                } else {
                    TokenKind::Dollar
                }
            }
            b'\\' => TokenKind::NsSeparator,
            b'\'' => self.read_single_quoted(),
            b'"' => self.read_quoted(b'"'),
            b'`' => self.read_quoted(b'`'),
            b'#' => {
                if self.peek() == Some(b'[') {
                    self.advance();
                    TokenKind::Attribute
                } else {
                    self.consume_single_line_comment()
                }
            }
            b';' => TokenKind::SemiColon,
            b':' => {
                if self.peek() == Some(b':') {
                    self.advance();
                    TokenKind::DoubleColon
                } else {
                    TokenKind::Colon
                }
            }
            b',' => TokenKind::Comma,
            b'{' => TokenKind::OpenBrace,
            b'}' => TokenKind::CloseBrace,
            b'(' => TokenKind::OpenParen,
            b')' => TokenKind::CloseParen,
            b'[' => TokenKind::OpenBracket,
            b']' => TokenKind::CloseBracket,
            b'~' => TokenKind::BitNot,
            b'@' => TokenKind::At,
            b'+' => match self.peek() {
                Some(b'+') => {
                    self.advance();
                    TokenKind::Inc
                }
                Some(b'=') => {
                    self.advance();
                    TokenKind::AssignOp
                }
                _ => TokenKind::Plus,
            },
            b'-' => match self.peek() {
                Some(b'>') => {
                    self.advance();
                    TokenKind::Arrow
                }
                Some(b'-') => {
                    self.advance();
                    TokenKind::Dec
                }
                Some(b'=') => {
                    self.advance();
                    TokenKind::AssignOp
                }
                _ => TokenKind::Minus,
            },
            b'*' => {
                if self.peek() == Some(b'*') {
                    self.advance();
                    if self.peek() == Some(b'=') {
                        self.advance();
                        TokenKind::AssignOp
                    } else {
                        TokenKind::Pow
                    }
                } else if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::AssignOp
                } else {
                    TokenKind::Asterisk
                }
            }
            b'/' => match self.peek() {
                Some(b'/') => self.consume_single_line_comment(),
                Some(b'*') => {
                    self.advance();
                    self.consume_multi_line_comment()
                }
                Some(b'=') => {
                    self.advance();
                    TokenKind::AssignOp
                }
                _ => TokenKind::Slash,
            },
            b'%' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::AssignOp
                } else {
                    TokenKind::Percent
                }
            }
            b'.' => {
                if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') {
                    self.advance_n(2);
                    TokenKind::Ellipsis
                } else if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::AssignOp
                } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.cursor = start;
                    self.read_number();
                    TokenKind::DNumber
                } else {
                    TokenKind::Dot
                }
            }
            b'=' => match (self.peek(), self.peek_at(1)) {
                (Some(b'='), Some(b'=')) => {
                    self.advance_n(2);
                    TokenKind::EqEqEq
                }
                (Some(b'='), _) => {
                    self.advance();
                    TokenKind::EqEq
                }
                (Some(b'>'), _) => {
                    self.advance();
                    TokenKind::DoubleArrow
                }
                _ => TokenKind::Eq,
            },
            b'!' => match (self.peek(), self.peek_at(1)) {
                (Some(b'='), Some(b'=')) => {
                    self.advance_n(2);
                    TokenKind::BangEqEq
                }
                (Some(b'='), _) => {
                    self.advance();
                    TokenKind::BangEq
                }
                _ => TokenKind::Bang,
            },
            b'<' => {
                if self.input[self.cursor..].starts_with(b"<<") {
                    self.advance_n(2);
                    self.read_heredoc()
                } else {
                    match (self.peek(), self.peek_at(1)) {
                        (Some(b'<'), Some(b'=')) => {
                            self.advance_n(2);
                            TokenKind::AssignOp
                        }
                        (Some(b'<'), _) => {
                            self.advance();
                            TokenKind::Sl
                        }
                        (Some(b'='), Some(b'>')) => {
                            self.advance_n(2);
                            TokenKind::Spaceship
                        }
                        (Some(b'='), _) => {
                            self.advance();
                            TokenKind::LtEq
                        }
                        (Some(b'>'), _) => {
                            self.advance();
                            TokenKind::BangEq
                        }
                        _ => TokenKind::Lt,
                    }
                }
            }
            b'>' => match (self.peek(), self.peek_at(1)) {
                (Some(b'>'), Some(b'=')) => {
                    self.advance_n(2);
                    TokenKind::AssignOp
                }
                (Some(b'>'), _) => {
                    self.advance();
                    TokenKind::Sr
                }
                (Some(b'='), _) => {
                    self.advance();
                    TokenKind::GtEq
                }
                _ => TokenKind::Gt,
            },
            b'&' => match self.peek() {
                Some(b'&') => {
                    self.advance();
                    TokenKind::AmpersandAmpersand
                }
                Some(b'=') => {
                    self.advance();
                    TokenKind::AssignOp
                }
                _ => TokenKind::Ampersand,
            },
            b'|' => match self.peek() {
                Some(b'|') => {
                    self.advance();
                    TokenKind::PipePipe
                }
                Some(b'=') => {
                    self.advance();
                    TokenKind::AssignOp
                }
                _ => TokenKind::Pipe,
            },
            b'^' => {
                if self.peek() == Some(b'=') {
                    self.advance();
                    TokenKind::AssignOp
                } else {
                    TokenKind::Caret
                }
            }
            b'?' => match (self.peek(), self.peek_at(1)) {
                (Some(b'>'), _) => {
                    self.advance();
                    if self.peek() == Some(b'\n') {
                        self.advance();
                    }
                    self.state = LexerState::Initial;
                    TokenKind::CloseTag
                }
                (Some(b'?'), Some(b'=')) => {
                    self.advance_n(2);
                    TokenKind::AssignOp
                }
                (Some(b'?'), _) => {
                    self.advance();
                    TokenKind::Coalesce
                }
                (Some(b'-'), Some(b'>')) => {
                    self.advance_n(2);
                    TokenKind::NullSafeArrow
                }
                _ => TokenKind::Question,
            },
            c if c.is_ascii_digit() => {
                self.cursor = start;
                self.read_number()
            }
            c if c.is_ascii_alphabetic() || c == b'_' || c >= 0x80 => {
                self.read_identifier();
                let kind = keyword_lookup(&self.input[start..self.cursor]);
                match kind {
                    TokenKind::Public => self.check_set_visibility(kind, TokenKind::PublicSet),
                    TokenKind::Protected => {
                        self.check_set_visibility(kind, TokenKind::ProtectedSet)
                    }
                    TokenKind::Private => self.check_set_visibility(kind, TokenKind::PrivateSet),
                    _ => kind,
                }
            }
            _ => TokenKind::Error,
        };

        Token {
            kind,
            span: Span::new(start, self.cursor),
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        Some(match self.state {
            LexerState::Initial => self.next_in_initial(),
            LexerState::Scripting => self.next_in_scripting(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(code: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(code.as_bytes());
        let mut out = Vec::new();
        loop {
            let token = lexer.next().expect("lexer always yields");
            if token.kind == TokenKind::Eof {
                break;
            }
            out.push(token.kind);
        }
        out
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("<?php CLASS Foo EXTENDS Bar {}"),
            vec![
                TokenKind::OpenTag,
                TokenKind::Class,
                TokenKind::Identifier,
                TokenKind::Extends,
                TokenKind::Identifier,
                TokenKind::OpenBrace,
                TokenKind::CloseBrace,
            ]
        );
    }

    #[test]
    fn test_interpolated_strings_are_flagged() {
        assert_eq!(
            kinds(r#"<?php "plain" "with $var" 'single $x'"#),
            vec![
                TokenKind::OpenTag,
                TokenKind::StringLiteral,
                TokenKind::TemplateString,
                TokenKind::StringLiteral,
            ]
        );
    }

    #[test]
    fn test_heredoc_and_nowdoc() {
        let code = "<?php $a = <<<EOT\n  hello {$name}\n  EOT;\n$b = <<<'EOT'\nraw $x\nEOT;\n";
        let tokens = kinds(code);
        assert!(tokens.contains(&TokenKind::TemplateString));
        assert!(tokens.contains(&TokenKind::StringLiteral));
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::SemiColon).count(), 2);
    }

    #[test]
    fn test_doc_comment_and_numbers() {
        assert_eq!(
            kinds("<?php /** doc */ 0x1F 1_000 1.5e3 .5"),
            vec![
                TokenKind::OpenTag,
                TokenKind::DocComment,
                TokenKind::LNumber,
                TokenKind::LNumber,
                TokenKind::DNumber,
                TokenKind::DNumber,
            ]
        );
    }

    #[test]
    fn test_close_tag_returns_to_html() {
        assert_eq!(
            kinds("<?php echo 1 ?>\n<b>x</b>"),
            vec![
                TokenKind::OpenTag,
                TokenKind::Identifier,
                TokenKind::LNumber,
                TokenKind::CloseTag,
                TokenKind::InlineHtml,
            ]
        );
    }

    #[test]
    fn test_asymmetric_visibility() {
        assert_eq!(
            kinds("<?php public private(set)"),
            vec![TokenKind::OpenTag, TokenKind::Public, TokenKind::PrivateSet]
        );
    }
}
