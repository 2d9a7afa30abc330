use super::strings::{parse_float_literal, parse_int_literal, unquote_string};
use super::{Parser, UseKind};
use crate::parser::ast::{
    Arg, ArrayItem, BinaryOp, Expr, ExprId, Ident, MagicConstKind, NameKind, UnaryOp,
};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;
use std::rc::Rc;

const TERNARY_BP: u8 = 40;
const UNARY_BP: u8 = 180;

fn binary_op_for(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::LogicalOr | TokenKind::PipePipe => BinaryOp::Or,
        TokenKind::LogicalAnd | TokenKind::AmpersandAmpersand => BinaryOp::And,
        TokenKind::LogicalXor => BinaryOp::LogicalXor,
        TokenKind::Coalesce => BinaryOp::Coalesce,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Ampersand => BinaryOp::BitAnd,
        TokenKind::EqEq => BinaryOp::EqEq,
        TokenKind::BangEq => BinaryOp::NotEq,
        TokenKind::EqEqEq => BinaryOp::EqEqEq,
        TokenKind::BangEqEq => BinaryOp::NotEqEq,
        TokenKind::Spaceship => BinaryOp::Spaceship,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::LtEq,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::GtEq,
        TokenKind::Sl => BinaryOp::ShiftLeft,
        TokenKind::Sr => BinaryOp::ShiftRight,
        TokenKind::Plus => BinaryOp::Plus,
        TokenKind::Minus => BinaryOp::Minus,
        TokenKind::Dot => BinaryOp::Concat,
        TokenKind::Asterisk => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::Pow => BinaryOp::Pow,
        _ => return None,
    })
}

/// Binding power of a binary operator, written with the token that
/// introduced it since `or` and `||` differ only in precedence.
fn infix_binding_power(kind: TokenKind, op: BinaryOp) -> (u8, u8) {
    match (kind, op) {
        (TokenKind::LogicalOr, _) => (10, 11),
        (TokenKind::LogicalXor, _) => (20, 21),
        (TokenKind::LogicalAnd, _) => (30, 31),
        (_, BinaryOp::Coalesce) => (51, 50), // Right associative
        (_, BinaryOp::Or) => (60, 61),
        (_, BinaryOp::And) => (70, 71),
        (_, BinaryOp::BitOr) => (80, 81),
        (_, BinaryOp::BitXor) => (90, 91),
        (_, BinaryOp::BitAnd) => (100, 101),
        (
            _,
            BinaryOp::EqEq
            | BinaryOp::NotEq
            | BinaryOp::EqEqEq
            | BinaryOp::NotEqEq
            | BinaryOp::Spaceship,
        ) => (110, 111),
        (_, BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq) => (120, 121),
        (_, BinaryOp::Concat) => (125, 126),
        (_, BinaryOp::ShiftLeft | BinaryOp::ShiftRight) => (130, 131),
        (_, BinaryOp::Plus | BinaryOp::Minus) => (140, 141),
        (_, BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod) => (150, 151),
        (_, BinaryOp::Pow) => (191, 190), // Right associative
        _ => (0, 0),
    }
}

impl<'src> Parser<'src> {
    /// Parses an expression in a constant-expression position (defaults,
    /// constant values, attribute arguments). Anything the grammar does not
    /// model collapses into [`Expr::Unsupported`] spanning the whole expression.
    pub(super) fn parse_const_expr(&mut self) -> ExprId {
        let start = self.current_token.span.start;
        let expr = self.parse_expr(0);
        if self.at_expr_terminator() {
            expr
        } else {
            self.skip_to_expr_terminator();
            Rc::new(Expr::Unsupported {
                span: Span::new(start, self.prev_end.max(start)),
            })
        }
    }

    fn at_expr_terminator(&self) -> bool {
        matches!(
            self.current_token.kind,
            TokenKind::Comma
                | TokenKind::SemiColon
                | TokenKind::CloseParen
                | TokenKind::CloseBracket
                | TokenKind::CloseBrace
                | TokenKind::OpenBrace
                | TokenKind::DoubleArrow
                | TokenKind::CloseTag
                | TokenKind::Eof
        )
    }

    /// Consumes balanced tokens up to a depth-0 `,` `;` `)` `]` `}` or `=>`.
    fn skip_to_expr_terminator(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current_token.kind {
                TokenKind::Eof | TokenKind::CloseTag => return,
                TokenKind::Comma
                | TokenKind::SemiColon
                | TokenKind::DoubleArrow
                | TokenKind::CloseParen
                | TokenKind::CloseBracket
                | TokenKind::CloseBrace
                    if depth == 0 =>
                {
                    return;
                }
                TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::Attribute => {
                    depth += 1
                }
                TokenKind::OpenBrace => {
                    self.skip_braces();
                    continue;
                }
                TokenKind::CloseParen | TokenKind::CloseBracket => depth -= 1,
                _ if self.at_closure_start() => {
                    self.parse_closure();
                    continue;
                }
                _ => {}
            }
            self.bump();
        }
    }

    pub(super) fn parse_call_arguments(&mut self) -> Vec<Arg> {
        let mut args = Vec::new();
        if !self.eat(TokenKind::OpenParen) {
            return args;
        }

        while !matches!(self.current_token.kind, TokenKind::CloseParen | TokenKind::Eof) {
            let start = self.current_token.span.start;
            let mut name = None;
            let mut unpack = false;

            // Named argument: identifier-like token followed by :
            if self.current_token.kind.is_identifier_like()
                && self.next_token.kind == TokenKind::Colon
            {
                name = Some(Ident {
                    name: self.current_text(),
                    span: self.current_token.span,
                });
                self.bump(); // Identifier
                self.bump(); // Colon
            } else if self.eat(TokenKind::Ellipsis) {
                if self.at(TokenKind::CloseParen) {
                    // First-class callable syntax `foo(...)`.
                    args.push(Arg {
                        name: None,
                        value: Rc::new(Expr::Unsupported {
                            span: Span::new(start, self.prev_end),
                        }),
                        unpack: false,
                        span: Span::new(start, self.prev_end),
                    });
                    break;
                }
                unpack = true;
            }

            let value = self.parse_const_expr();
            args.push(Arg {
                name,
                value,
                unpack,
                span: Span::new(start, self.prev_end),
            });

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        if !self.eat(TokenKind::CloseParen) {
            self.error("Expected ')' to close argument list");
            self.skip_to_expr_terminator();
            self.eat(TokenKind::CloseParen);
        }
        args
    }

    pub(super) fn parse_expr(&mut self, min_bp: u8) -> ExprId {
        let mut left = self.parse_nud();

        loop {
            let kind = self.current_token.kind;
            let start = left.span().start;

            match kind {
                TokenKind::OpenBracket => {
                    self.bump();
                    let dim = self.parse_const_expr();
                    self.expect(TokenKind::CloseBracket, "Expected ']'");
                    left = Rc::new(Expr::ArrayDimFetch {
                        array: left,
                        dim,
                        span: Span::new(start, self.prev_end),
                    });
                    continue;
                }
                TokenKind::Arrow | TokenKind::NullSafeArrow => {
                    self.bump();
                    let Some(property) = self.parse_ident() else {
                        return Rc::new(Expr::Unsupported {
                            span: Span::new(start, self.prev_end),
                        });
                    };
                    if self.at(TokenKind::OpenParen) {
                        // Method call
                        self.skip_parens();
                        left = Rc::new(Expr::Unsupported {
                            span: Span::new(start, self.prev_end),
                        });
                    } else {
                        left = Rc::new(Expr::PropertyFetch {
                            target: left,
                            property,
                            nullsafe: kind == TokenKind::NullSafeArrow,
                            span: Span::new(start, self.prev_end),
                        });
                    }
                    continue;
                }
                TokenKind::Question => {
                    if TERNARY_BP < min_bp {
                        break;
                    }
                    self.bump();
                    let if_true = if self.eat(TokenKind::Colon) {
                        None
                    } else {
                        let expr = self.parse_expr(TERNARY_BP + 1);
                        self.expect(TokenKind::Colon, "Expected ':' in ternary");
                        Some(expr)
                    };
                    let if_false = self.parse_expr(TERNARY_BP + 1);
                    left = Rc::new(Expr::Ternary {
                        condition: left,
                        if_true,
                        if_false,
                        span: Span::new(start, self.prev_end),
                    });
                    continue;
                }
                _ => {}
            }

            let Some(op) = binary_op_for(kind) else {
                break;
            };
            let (l_bp, r_bp) = infix_binding_power(kind, op);
            if l_bp < min_bp {
                break;
            }

            self.bump();
            let right = self.parse_expr(r_bp);
            left = Rc::new(Expr::Binary {
                left,
                op,
                right,
                span: Span::new(start, self.prev_end),
            });
        }

        left
    }

    fn parse_unary(&mut self, op: UnaryOp) -> ExprId {
        let start = self.current_token.span.start;
        self.bump();
        let expr = self.parse_expr(UNARY_BP);
        Rc::new(Expr::Unary {
            op,
            expr,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_nud(&mut self) -> ExprId {
        let start = self.current_token.span.start;
        let span = self.current_token.span;

        match self.current_token.kind {
            TokenKind::LNumber => {
                let text = self.current_token.text(self.source);
                self.bump();
                Rc::new(match parse_int_literal(text) {
                    Ok(value) => Expr::Int { value, span },
                    Err(value) => Expr::Float { value, span },
                })
            }
            TokenKind::DNumber => {
                let value = parse_float_literal(self.current_token.text(self.source));
                self.bump();
                Rc::new(Expr::Float { value, span })
            }
            TokenKind::StringLiteral => {
                let value = unquote_string(self.current_token.text(self.source));
                self.bump();
                Rc::new(Expr::String { value, span })
            }
            TokenKind::Minus => self.parse_unary(UnaryOp::Minus),
            TokenKind::Plus => self.parse_unary(UnaryOp::Plus),
            TokenKind::Bang => {
                // `!` binds looser than arithmetic: `!$a + 1` is `!($a + 1)`.
                self.bump();
                let expr = self.parse_expr(160);
                Rc::new(Expr::Unary {
                    op: UnaryOp::Not,
                    expr,
                    span: Span::new(start, self.prev_end),
                })
            }
            TokenKind::BitNot => self.parse_unary(UnaryOp::BitNot),
            TokenKind::At => {
                self.bump();
                self.parse_expr(UNARY_BP)
            }
            TokenKind::OpenParen => {
                self.bump();
                let expr = self.parse_expr(0);
                if !self.eat(TokenKind::CloseParen) {
                    self.skip_to_expr_terminator();
                    self.eat(TokenKind::CloseParen);
                    return Rc::new(Expr::Unsupported {
                        span: Span::new(start, self.prev_end),
                    });
                }
                expr
            }
            TokenKind::OpenBracket => {
                self.bump();
                let items = self.parse_array_items(TokenKind::CloseBracket);
                Rc::new(Expr::Array {
                    items,
                    span: Span::new(start, self.prev_end),
                })
            }
            TokenKind::Array if self.next_token.kind == TokenKind::OpenParen => {
                self.bump();
                self.bump();
                let items = self.parse_array_items(TokenKind::CloseParen);
                Rc::new(Expr::Array {
                    items,
                    span: Span::new(start, self.prev_end),
                })
            }
            TokenKind::New if self.next_token.kind != TokenKind::Class => {
                self.bump();
                if !matches!(
                    self.current_token.kind,
                    TokenKind::Identifier
                        | TokenKind::NsSeparator
                        | TokenKind::Static
                        | TokenKind::Namespace
                ) {
                    return self.unsupported_from(start);
                }
                let class = self.parse_name(UseKind::Class);
                let args = self.parse_call_arguments();
                Rc::new(Expr::New {
                    class,
                    args,
                    span: Span::new(start, self.prev_end),
                })
            }
            TokenKind::Identifier
            | TokenKind::NsSeparator
            | TokenKind::Static
            | TokenKind::Namespace => self.parse_name_expr(),
            _ if self.current_token.kind.is_semi_reserved()
                && self.next_token.kind == TokenKind::DoubleColon =>
            {
                self.parse_name_expr()
            }
            _ => self.unsupported_from(start),
        }
    }

    fn unsupported_from(&mut self, start: usize) -> ExprId {
        if self.at_expr_terminator() {
            self.error("Expected expression");
        } else {
            self.skip_to_expr_terminator();
        }
        Rc::new(Expr::Unsupported {
            span: Span::new(start, self.prev_end.max(start)),
        })
    }

    /// A name in expression position: constant, class constant, call or literal keyword.
    fn parse_name_expr(&mut self) -> ExprId {
        let start = self.current_token.span.start;
        let (original, kind, span) = self.parse_raw_name();

        if self.eat(TokenKind::DoubleColon) {
            let class = self.resolve_name(original, kind, span, UseKind::Class);
            if !self.current_token.kind.is_identifier_like() {
                // Static property or dynamic fetch.
                return self.unsupported_from(start);
            }
            let constant = Ident {
                name: self.current_text(),
                span: self.current_token.span,
            };
            self.bump();
            if self.at(TokenKind::OpenParen) {
                // Static method call
                self.skip_parens();
                return Rc::new(Expr::Unsupported {
                    span: Span::new(start, self.prev_end),
                });
            }
            return Rc::new(Expr::ClassConstFetch {
                class,
                constant,
                span: Span::new(start, self.prev_end),
            });
        }

        if self.at(TokenKind::OpenParen) {
            let name = self.resolve_name(original, kind, span, UseKind::Function);
            let args = self.parse_call_arguments();
            return Rc::new(Expr::Call {
                name,
                args,
                span: Span::new(start, self.prev_end),
            });
        }

        let bare = original.trim_start_matches('\\');
        let is_plain = matches!(kind, NameKind::Unqualified | NameKind::FullyQualified)
            && !bare.contains('\\');
        if is_plain {
            match bare.to_ascii_lowercase().as_str() {
                "true" => return Rc::new(Expr::Bool { value: true, span }),
                "false" => return Rc::new(Expr::Bool { value: false, span }),
                "null" => return Rc::new(Expr::Null { span }),
                _ => {}
            }
        }
        if kind == NameKind::Unqualified {
            if let Some(magic) = MagicConstKind::from_name(&original) {
                return Rc::new(Expr::MagicConst { kind: magic, span });
            }
        }

        Rc::new(Expr::ConstFetch {
            name: self.resolve_name(original, kind, span, UseKind::Const),
            span,
        })
    }

    fn parse_array_items(&mut self, close: TokenKind) -> Vec<ArrayItem> {
        let mut items = Vec::new();
        while !self.at(close) && !self.at(TokenKind::Eof) {
            let start = self.current_token.span.start;
            if self.at(TokenKind::Comma) {
                // Skipped entry in list() style destructuring.
                self.bump();
                continue;
            }

            let unpack = self.eat(TokenKind::Ellipsis);
            let first = if self.at(TokenKind::Ampersand) {
                self.unsupported_from(start)
            } else {
                self.parse_const_expr()
            };

            let item = if self.eat(TokenKind::DoubleArrow) {
                let value = if self.at(TokenKind::Ampersand) {
                    self.unsupported_from(self.current_token.span.start)
                } else {
                    self.parse_const_expr()
                };
                ArrayItem {
                    key: Some(first),
                    value,
                    unpack,
                    span: Span::new(start, self.prev_end),
                }
            } else {
                ArrayItem {
                    key: None,
                    value: first,
                    unpack,
                    span: Span::new(start, self.prev_end),
                }
            };
            items.push(item);

            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(close, "Expected end of array");
        items
    }
}
