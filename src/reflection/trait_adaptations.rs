//! Lookup tables for the adaptations of `use Trait { ... }` blocks.
//!
//! Tables are keyed by `trait::method`, lowercased, where `trait` is the
//! fully-qualified trait name. A method reference without a trait name is
//! attributed to the first trait of its `use` block that has the method.

use super::modifiers::MemberModifiers;
use crate::error::Result;
use crate::parser::ast::{ClassLikeDecl, ClassMember, TraitAdaptation, TraitMethodRef, TraitUseDecl};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitAlias {
    pub alias: String,
    pub visibility: Option<MemberModifiers>,
}

#[derive(Debug, Clone, Default)]
pub struct TraitAdaptations {
    aliases: HashMap<String, SmallVec<[TraitAlias; 1]>>,
    modifiers: HashMap<String, MemberModifiers>,
    /// Excluded copy -> trait that takes precedence over it.
    precedences: HashMap<String, String>,
    /// Alias -> `Trait::method` as written.
    alias_targets: IndexMap<String, String>,
}

pub fn method_hash(trait_name: &str, method: &str) -> String {
    format!(
        "{}::{}",
        trait_name.trim_start_matches('\\').to_ascii_lowercase(),
        method.to_ascii_lowercase()
    )
}

impl TraitAdaptations {
    /// Reads every `use` block of `decl`. `owner_of` names the trait of an
    /// unqualified method reference, given the block it appears in.
    pub fn build(
        decl: &ClassLikeDecl,
        owner_of: impl Fn(&TraitUseDecl, &str) -> Result<Option<String>>,
    ) -> Result<Self> {
        let mut tables = TraitAdaptations::default();
        for member in &decl.members {
            let ClassMember::TraitUse(trait_use) = member else {
                continue;
            };
            for adaptation in &trait_use.adaptations {
                match adaptation {
                    TraitAdaptation::Precedence {
                        method, insteadof, ..
                    } => {
                        let Some(winner) = trait_of(trait_use, method, &owner_of)? else {
                            continue;
                        };
                        for loser in insteadof {
                            tables.precedences.insert(
                                method_hash(&loser.resolved, &method.method.name),
                                winner.clone(),
                            );
                        }
                    }
                    TraitAdaptation::Alias {
                        method,
                        alias,
                        visibility,
                        ..
                    } => {
                        let Some(trait_name) = trait_of(trait_use, method, &owner_of)? else {
                            tracing::warn!(
                                method = %method.method.name,
                                class = %decl.fqn,
                                "trait alias refers to a method no used trait declares"
                            );
                            continue;
                        };
                        let hash = method_hash(&trait_name, &method.method.name);
                        let visibility = (*visibility).and_then(MemberModifiers::visibility_from);
                        match alias {
                            Some(alias) => {
                                tables.alias_targets.insert(
                                    alias.name.clone(),
                                    format!("{trait_name}::{}", method.method.name),
                                );
                                tables.aliases.entry(hash).or_default().push(TraitAlias {
                                    alias: alias.name.clone(),
                                    visibility,
                                });
                            }
                            None => {
                                if let Some(visibility) = visibility {
                                    tables.modifiers.insert(hash, visibility);
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(tables)
    }

    /// Aliases a trait method is additionally exposed under.
    pub fn aliases_for(&self, hash: &str) -> &[TraitAlias] {
        self.aliases
            .get(hash)
            .map(|aliases| aliases.as_slice())
            .unwrap_or_default()
    }

    /// Visibility override for a trait method under its own name.
    pub fn visibility_for(&self, hash: &str) -> Option<MemberModifiers> {
        self.modifiers.get(hash).copied()
    }

    /// The trait whose method replaces this copy under an `insteadof` rule,
    /// or `None` when the copy is kept.
    pub fn precedence_winner(&self, hash: &str) -> Option<&str> {
        self.precedences.get(hash).map(String::as_str)
    }

    /// Alias name -> `Trait::method`, in declaration order.
    pub fn alias_targets(&self) -> &IndexMap<String, String> {
        &self.alias_targets
    }
}

fn trait_of(
    trait_use: &TraitUseDecl,
    method: &TraitMethodRef,
    owner_of: &impl Fn(&TraitUseDecl, &str) -> Result<Option<String>>,
) -> Result<Option<String>> {
    match &method.trait_name {
        Some(name) => Ok(Some(name.resolved.clone())),
        None => owner_of(trait_use, &method.method.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Stmt;
    use crate::parser::parse;

    #[test]
    fn test_tables() {
        let program = parse(
            b"<?php class C { use A, B { B::foo insteadof A; A::foo as protected aFoo; bar as private; } }",
        );
        let mut decl = None;
        program.for_each_statement(|stmt| {
            if let Stmt::ClassLike(class) = stmt {
                decl = Some(class.clone());
            }
        });
        let decl = decl.expect("class");
        let tables = TraitAdaptations::build(&decl, |_, method| {
            Ok((method == "bar").then(|| "B".to_string()))
        })
        .expect("tables");

        assert_eq!(tables.precedence_winner("a::foo"), Some("B"));
        assert_eq!(tables.precedence_winner("b::foo"), None);
        assert_eq!(
            tables.aliases_for("a::foo"),
            &[TraitAlias {
                alias: "aFoo".into(),
                visibility: Some(MemberModifiers::PROTECTED)
            }]
        );
        assert_eq!(tables.visibility_for("b::bar"), Some(MemberModifiers::PRIVATE));
        assert_eq!(tables.alias_targets().get("aFoo").map(String::as_str), Some("A::foo"));
    }
}
