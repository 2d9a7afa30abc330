use super::{Parser, UseKind};
use crate::parser::ast::{
    AttributeGroup, ClassConstDecl, ClassLikeDecl, ClassLikeKind, ClassMember, DocComment,
    EnumCaseDecl, FunctionDecl, FunctionKind, Ident, Modifier, Param, ParseError, PropertyDecl,
    PropertyEntry, TraitAdaptation, TraitMethodRef, TraitUseDecl,
};
use crate::parser::lexer::token::TokenKind;
use crate::parser::span::Span;
use std::rc::Rc;

fn modifier_for(kind: TokenKind) -> Option<Modifier> {
    Some(match kind {
        TokenKind::Public => Modifier::Public,
        TokenKind::Protected => Modifier::Protected,
        TokenKind::Private => Modifier::Private,
        TokenKind::PublicSet => Modifier::PublicSet,
        TokenKind::ProtectedSet => Modifier::ProtectedSet,
        TokenKind::PrivateSet => Modifier::PrivateSet,
        TokenKind::Static => Modifier::Static,
        TokenKind::Abstract => Modifier::Abstract,
        TokenKind::Final => Modifier::Final,
        TokenKind::Readonly => Modifier::Readonly,
        _ => return None,
    })
}

impl<'src> Parser<'src> {
    fn parse_modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        while let Some(modifier) = modifier_for(self.current_token.kind) {
            if modifiers.contains(&modifier) {
                self.error("Multiple identical modifiers are not allowed");
            } else {
                modifiers.push(modifier);
            }
            self.bump();
        }
        modifiers
    }

    pub(super) fn parse_class_like(
        &mut self,
        attributes: Vec<AttributeGroup>,
        doc_comment: Option<DocComment>,
        start: usize,
    ) -> Rc<ClassLikeDecl> {
        let modifiers = self.parse_modifiers();
        let kind = match self.current_token.kind {
            TokenKind::Interface => ClassLikeKind::Interface,
            TokenKind::Trait => ClassLikeKind::Trait,
            TokenKind::Identifier if self.current_is_keyword("enum") => ClassLikeKind::Enum,
            _ => ClassLikeKind::Class,
        };
        self.bump(); // Eat class / interface / trait / enum

        let name = self.parse_ident().unwrap_or(Ident {
            name: String::new(),
            span: self.current_token.span,
        });
        let fqn = self.scope.qualify(&name.name);

        let backing_type = if kind == ClassLikeKind::Enum && self.eat(TokenKind::Colon) {
            self.parse_type()
        } else {
            None
        };

        let mut extends = Vec::new();
        if self.eat(TokenKind::Extends) {
            loop {
                extends.push(self.parse_name(UseKind::Class));
                if kind != ClassLikeKind::Interface || !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        let mut implements = Vec::new();
        if self.eat(TokenKind::Implements) {
            loop {
                implements.push(self.parse_name(UseKind::Class));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }

        let mut members = Vec::new();
        if self.expect(TokenKind::OpenBrace, "Expected '{'") {
            while !matches!(self.current_token.kind, TokenKind::CloseBrace | TokenKind::Eof) {
                let before = self.current_token.span.start;
                if let Some(member) = self.parse_class_member(kind) {
                    members.push(member);
                }
                if self.current_token.span.start == before && !self.at(TokenKind::CloseBrace) {
                    self.error("Unexpected token in class body");
                    self.bump();
                }
            }
            self.expect(TokenKind::CloseBrace, "Expected '}' to close class body");
        }

        Rc::new(ClassLikeDecl {
            kind,
            attributes,
            modifiers,
            name,
            fqn,
            namespace: self.scope.namespace.clone(),
            extends,
            implements,
            backing_type,
            members,
            doc_comment,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_class_member(&mut self, owner: ClassLikeKind) -> Option<ClassMember> {
        let mut doc_comment = self.take_doc_comment();
        let start = self.current_token.span.start;
        let attributes = self.parse_attributes();
        if doc_comment.is_none() {
            doc_comment = self.take_doc_comment();
        }

        if self.at(TokenKind::Use) {
            return Some(ClassMember::TraitUse(self.parse_trait_use(start)));
        }

        if self.eat(TokenKind::Case) {
            let name = self.parse_ident()?;
            let value = if self.eat(TokenKind::Eq) {
                Some(self.parse_const_expr())
            } else {
                None
            };
            if owner != ClassLikeKind::Enum {
                self.errors.push(ParseError {
                    span: name.span,
                    message: "case not allowed here",
                });
            }
            self.expect_semicolon();
            return Some(ClassMember::Case(Rc::new(EnumCaseDecl {
                attributes,
                name,
                value,
                doc_comment,
                span: Span::new(start, self.prev_end),
            })));
        }

        let modifiers = self.parse_modifiers();
        if doc_comment.is_none() {
            doc_comment = self.take_doc_comment();
        }

        match self.current_token.kind {
            TokenKind::Const => {
                self.bump();
                // `const int X = 1;` carries a type before the name.
                let ty = if self.next_token.kind != TokenKind::Eq {
                    self.parse_type()
                } else {
                    None
                };
                let consts = self.parse_const_items();
                self.expect_semicolon();
                Some(ClassMember::Const(Rc::new(ClassConstDecl {
                    attributes,
                    modifiers,
                    ty,
                    consts,
                    doc_comment,
                    span: Span::new(start, self.prev_end),
                })))
            }
            TokenKind::Function => {
                let mut method = self.parse_function_like(
                    FunctionKind::Method,
                    attributes,
                    modifiers,
                    doc_comment,
                    start,
                );
                method.fqn = None;
                Some(ClassMember::Method(Rc::new(method)))
            }
            _ => self
                .parse_property(attributes, modifiers, doc_comment, start)
                .map(ClassMember::Property),
        }
    }

    fn parse_property(
        &mut self,
        attributes: Vec<AttributeGroup>,
        modifiers: Vec<Modifier>,
        doc_comment: Option<DocComment>,
        start: usize,
    ) -> Option<Rc<PropertyDecl>> {
        let ty = if self.at(TokenKind::Variable) {
            None
        } else {
            self.parse_type()
        };

        if !self.at(TokenKind::Variable) {
            self.error("Expected property name");
            self.sync_to_statement_end();
            return None;
        }

        let mut entries = Vec::new();
        let mut has_hooks = false;
        loop {
            let entry_start = self.current_token.span.start;
            let Some(name) = self.parse_variable_ident() else {
                break;
            };
            let default = if self.eat(TokenKind::Eq) {
                Some(self.parse_const_expr())
            } else {
                None
            };
            entries.push(PropertyEntry {
                name,
                default,
                span: Span::new(entry_start, self.prev_end),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        if self.at(TokenKind::OpenBrace) {
            has_hooks = true;
            self.skip_braces();
        } else {
            self.expect_semicolon();
        }

        Some(Rc::new(PropertyDecl {
            attributes,
            modifiers,
            ty,
            entries,
            has_hooks,
            doc_comment,
            span: Span::new(start, self.prev_end),
        }))
    }

    fn parse_trait_use(&mut self, start: usize) -> Rc<TraitUseDecl> {
        self.bump(); // Eat use
        let mut traits = Vec::new();
        loop {
            traits.push(self.parse_name(UseKind::Class));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        let mut adaptations = Vec::new();
        if self.eat(TokenKind::OpenBrace) {
            while !matches!(self.current_token.kind, TokenKind::CloseBrace | TokenKind::Eof) {
                let Some(method) = self.parse_trait_method_ref() else {
                    self.sync_to_statement_end();
                    continue;
                };
                let adaptation_start = method.span.start;

                if self.eat(TokenKind::Insteadof) {
                    let mut insteadof = Vec::new();
                    loop {
                        insteadof.push(self.parse_name(UseKind::Class));
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                    adaptations.push(TraitAdaptation::Precedence {
                        method,
                        insteadof,
                        span: Span::new(adaptation_start, self.prev_end),
                    });
                } else if self.eat(TokenKind::As) {
                    let visibility = match self.current_token.kind {
                        TokenKind::Public | TokenKind::Protected | TokenKind::Private => {
                            let modifier = modifier_for(self.current_token.kind);
                            self.bump();
                            modifier
                        }
                        _ => None,
                    };
                    let alias = if self.current_token.kind.is_identifier_like() {
                        self.parse_ident()
                    } else {
                        None
                    };
                    adaptations.push(TraitAdaptation::Alias {
                        method,
                        alias,
                        visibility,
                        span: Span::new(adaptation_start, self.prev_end),
                    });
                } else {
                    self.error("Expected insteadof or as in trait adaptation");
                }

                self.expect_semicolon();
            }
            self.expect(TokenKind::CloseBrace, "Expected '}' to close trait adaptations");
        } else {
            self.expect_semicolon();
        }

        Rc::new(TraitUseDecl {
            traits,
            adaptations,
            span: Span::new(start, self.prev_end),
        })
    }

    fn parse_trait_method_ref(&mut self) -> Option<TraitMethodRef> {
        let start = self.current_token.span.start;

        if self.next_token.kind == TokenKind::DoubleColon
            || self.at(TokenKind::NsSeparator)
            || self.next_token.kind == TokenKind::NsSeparator
        {
            let trait_name = self.parse_name(UseKind::Class);
            self.expect(TokenKind::DoubleColon, "Expected '::' in trait method reference");
            let method = self.parse_ident()?;
            return Some(TraitMethodRef {
                trait_name: Some(trait_name),
                span: Span::new(start, method.span.end),
                method,
            });
        }

        let method = self.parse_ident()?;
        Some(TraitMethodRef {
            trait_name: None,
            span: Span::new(start, method.span.end),
            method,
        })
    }

    pub(super) fn parse_function(
        &mut self,
        attributes: Vec<AttributeGroup>,
        doc_comment: Option<DocComment>,
        start: usize,
    ) -> Rc<FunctionDecl> {
        Rc::new(self.parse_function_like(
            FunctionKind::Function,
            attributes,
            Vec::new(),
            doc_comment,
            start,
        ))
    }

    /// Parses `function &name(params): type { body }` with the cursor on `function`.
    fn parse_function_like(
        &mut self,
        kind: FunctionKind,
        attributes: Vec<AttributeGroup>,
        modifiers: Vec<Modifier>,
        doc_comment: Option<DocComment>,
        start: usize,
    ) -> FunctionDecl {
        self.bump(); // Eat function
        let by_ref = self.eat(TokenKind::Ampersand);
        let name = self.parse_ident();
        let fqn = name.as_ref().map(|n| self.scope.qualify(&n.name));
        let params = self.parse_parameters();

        let return_type = if self.eat(TokenKind::Colon) {
            let ty = self.parse_type();
            if ty.is_none() {
                self.error("Expected return type");
            }
            ty
        } else {
            None
        };

        let (body, is_generator) = if self.at(TokenKind::OpenBrace) {
            let (span, is_generator) = self.skip_body();
            (Some(span), is_generator)
        } else {
            self.expect_semicolon();
            (None, false)
        };

        FunctionDecl {
            kind,
            attributes,
            modifiers,
            name,
            fqn,
            namespace: self.scope.namespace.clone(),
            by_ref,
            params,
            return_type,
            body,
            is_generator,
            doc_comment,
            span: Span::new(start, self.prev_end),
        }
    }

    pub(super) fn parse_parameters(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if !self.expect(TokenKind::OpenParen, "Expected '(' for parameter list") {
            return params;
        }

        while !matches!(self.current_token.kind, TokenKind::CloseParen | TokenKind::Eof) {
            match self.parse_param() {
                Some(param) => params.push(param),
                None => {
                    // Recover at the next parameter boundary.
                    while !matches!(
                        self.current_token.kind,
                        TokenKind::Comma
                            | TokenKind::CloseParen
                            | TokenKind::OpenBrace
                            | TokenKind::SemiColon
                            | TokenKind::Eof
                    ) {
                        self.bump();
                    }
                    if matches!(self.current_token.kind, TokenKind::OpenBrace | TokenKind::SemiColon) {
                        return params;
                    }
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::CloseParen, "Expected ')' to close parameter list");
        params
    }

    fn parse_param(&mut self) -> Option<Param> {
        let mut doc_comment = self.take_doc_comment();
        let start = self.current_token.span.start;
        let attributes = self.parse_attributes();
        let modifiers = self.parse_modifiers();
        if doc_comment.is_none() {
            doc_comment = self.take_doc_comment();
        }

        let ty = if matches!(
            self.current_token.kind,
            TokenKind::Variable | TokenKind::Ampersand | TokenKind::Ellipsis
        ) {
            None
        } else {
            self.parse_type()
        };

        let by_ref = self.eat(TokenKind::Ampersand);
        let variadic = self.eat(TokenKind::Ellipsis);
        let name = self.parse_variable_ident()?;

        let default = if self.eat(TokenKind::Eq) {
            Some(self.parse_const_expr())
        } else {
            None
        };

        // Hooks on a promoted parameter.
        if !modifiers.is_empty() && self.at(TokenKind::OpenBrace) {
            self.skip_braces();
        }

        Some(Param {
            attributes,
            modifiers,
            name,
            ty,
            default,
            by_ref,
            variadic,
            doc_comment,
            span: Span::new(start, self.prev_end),
        })
    }
}
