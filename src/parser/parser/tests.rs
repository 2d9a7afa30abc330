use crate::parser::ast::{
    ClassLikeDecl, ClassLikeKind, ClassMember, Expr, FunctionKind, Modifier, NameKind, Program,
    Stmt, TraitAdaptation, TypeNode,
};
use crate::parser::parse;
use std::rc::Rc;

fn classes(program: &Program) -> Vec<Rc<ClassLikeDecl>> {
    let mut out = Vec::new();
    program.for_each_statement(|stmt| {
        if let Stmt::ClassLike(decl) = stmt {
            out.push(decl.clone());
        }
    });
    out
}

fn only_class(code: &str) -> Rc<ClassLikeDecl> {
    let program = parse(code.as_bytes());
    assert!(program.errors.is_empty(), "errors: {:?}", program.errors);
    let mut all = classes(&program);
    assert_eq!(all.len(), 1);
    all.remove(0)
}

#[test]
fn test_namespace_and_use_resolution() {
    let class = only_class(
        "<?php namespace App\\Models; use Lib\\Base as Parent_; use Lib\\{Contracts\\Jsonable, Other};
         final class User extends Parent_ implements Jsonable, \\Countable, Sub\\Thing {}",
    );
    assert_eq!(class.fqn, "App\\Models\\User");
    assert_eq!(class.namespace.as_deref(), Some("App\\Models"));
    assert_eq!(class.modifiers, vec![Modifier::Final]);
    assert_eq!(class.extends[0].resolved, "Lib\\Base");
    let implemented: Vec<_> = class.implements.iter().map(|n| n.resolved.as_str()).collect();
    assert_eq!(
        implemented,
        vec!["Lib\\Contracts\\Jsonable", "Countable", "App\\Models\\Sub\\Thing"]
    );
}

#[test]
fn test_braced_namespaces() {
    let program = parse(b"<?php namespace A { class X {} } namespace { class Y {} }");
    let names: Vec<_> = classes(&program).iter().map(|c| c.fqn.clone()).collect();
    assert_eq!(names, vec!["A\\X", "Y"]);
}

#[test]
fn test_members_and_doc_comments() {
    let class = only_class(
        "<?php
        /** Class doc */
        abstract class Foo {
            /** const doc */
            final public const int A = 1, B = self::A + 1;
            protected static ?string $name = null, $other;
            /** ctor */
            public function __construct(private readonly int $id = 0, string ...$rest) {}
            abstract protected function &bar(): static;
        }",
    );
    assert_eq!(class.kind, ClassLikeKind::Class);
    assert_eq!(
        class.doc_comment.as_ref().map(|d| d.text.as_str()),
        Some("/** Class doc */")
    );
    assert_eq!(class.members.len(), 4);

    let ClassMember::Const(consts) = &class.members[0] else {
        panic!("expected constants");
    };
    assert_eq!(consts.consts.len(), 2);
    assert!(consts.ty.is_some());
    assert_eq!(consts.modifiers, vec![Modifier::Final, Modifier::Public]);
    assert!(matches!(&*consts.consts[1].value, Expr::Binary { .. }));

    let ClassMember::Property(props) = &class.members[1] else {
        panic!("expected properties");
    };
    assert_eq!(props.entries.len(), 2);
    assert!(matches!(props.ty, Some(TypeNode::Nullable { .. })));

    let ClassMember::Method(ctor) = &class.members[2] else {
        panic!("expected constructor");
    };
    assert_eq!(ctor.doc_comment.as_ref().map(|d| d.text.as_str()), Some("/** ctor */"));
    assert_eq!(ctor.params.len(), 2);
    assert_eq!(ctor.params[0].modifiers, vec![Modifier::Private, Modifier::Readonly]);
    assert!(ctor.params[1].variadic);

    let ClassMember::Method(bar) = &class.members[3] else {
        panic!("expected method");
    };
    assert!(bar.by_ref);
    assert!(bar.body.is_none());
    let Some(TypeNode::Named { name, .. }) = &bar.return_type else {
        panic!("expected named return type");
    };
    assert_eq!(name.kind, NameKind::Special);
}

#[test]
fn test_trait_adaptations() {
    let class = only_class(
        "<?php class C { use A, B { B::foo insteadof A; A::foo as protected aliased; bar as private; } }",
    );
    let ClassMember::TraitUse(trait_use) = &class.members[0] else {
        panic!("expected trait use");
    };
    assert_eq!(trait_use.traits.len(), 2);
    assert_eq!(trait_use.adaptations.len(), 3);
    assert!(matches!(
        &trait_use.adaptations[0],
        TraitAdaptation::Precedence { insteadof, .. } if insteadof[0].resolved == "A"
    ));
    assert!(matches!(
        &trait_use.adaptations[1],
        TraitAdaptation::Alias { alias: Some(alias), visibility: Some(Modifier::Protected), .. }
            if alias.name == "aliased"
    ));
    assert!(matches!(
        &trait_use.adaptations[2],
        TraitAdaptation::Alias { alias: None, visibility: Some(Modifier::Private), method, .. }
            if method.trait_name.is_none()
    ));
}

#[test]
fn test_enum_with_cases() {
    let class = only_class("<?php enum Suit: string implements HasLabel { case Hearts = 'H'; case Spades = 'S'; const Wild = self::Spades; }");
    assert_eq!(class.kind, ClassLikeKind::Enum);
    assert!(class.backing_type.is_some());
    let cases = class
        .members
        .iter()
        .filter(|m| matches!(m, ClassMember::Case(_)))
        .count();
    assert_eq!(cases, 2);
}

#[test]
fn test_function_bodies_are_skipped_and_generators_detected() {
    let program = parse(
        b"<?php
        function gen() { foreach ([1, 2] as $x) { yield $x; } }
        function plain() { $f = function () { yield 1; }; return $f; }",
    );
    let mut functions = Vec::new();
    program.for_each_statement(|stmt| {
        if let Stmt::Function(decl) = stmt {
            functions.push(decl.clone());
        }
    });
    assert_eq!(functions.len(), 2);
    assert!(functions[0].is_generator);
    assert!(!functions[1].is_generator);
    assert_eq!(program.closures.len(), 1);
    assert!(program.closures[0].is_generator);
}

#[test]
fn test_closures_and_arrow_functions_are_captured() {
    let program = parse(
        b"<?php
$a = static fn (int $x): int => $x * 2;
$b = function (string $s) use ($a) { return $s; };
$obj->fn(1);
",
    );
    assert_eq!(program.closures.len(), 2);
    assert_eq!(program.closures[0].kind, FunctionKind::ArrowFunction);
    assert_eq!(program.closures[0].modifiers, vec![Modifier::Static]);
    assert_eq!(program.closures[1].kind, FunctionKind::Closure);
    assert_eq!(program.closures[1].params[0].name.name, "s");
}

#[test]
fn test_define_calls_and_const_statements() {
    let program = parse(b"<?php namespace Ns; const A = 1, B = 'two'; define('C', A + 1); \\define('D', 1);");
    let mut calls = 0;
    let mut consts = 0;
    program.for_each_statement(|stmt| match stmt {
        Stmt::Call(call) => {
            assert!(call.is_define());
            calls += 1;
        }
        Stmt::Const(decl) => consts += decl.consts.len(),
        _ => {}
    });
    assert_eq!(calls, 2);
    assert_eq!(consts, 2);
}

#[test]
fn test_declarations_inside_conditional_blocks() {
    let program = parse(b"<?php if (!function_exists('helper')) { function helper() {} } else { class Fallback {} }");
    let mut found = Vec::new();
    program.for_each_statement(|stmt| match stmt {
        Stmt::Function(f) => found.push(f.fqn.clone().unwrap_or_default()),
        Stmt::ClassLike(c) => found.push(c.fqn.clone()),
        _ => {}
    });
    assert_eq!(found, vec!["helper", "Fallback"]);
}

#[test]
fn test_unqualified_function_and_const_names_keep_fallback() {
    let program = parse(b"<?php namespace Ns; use const Other\\LIMIT; class X { const A = PHP_EOL; const B = LIMIT; const C = strlen('x'); }");
    let class = classes(&program).remove(0);
    let ClassMember::Const(consts) = &class.members[0] else {
        panic!("expected constant");
    };
    let Expr::ConstFetch { name, .. } = &*consts.consts[0].value else {
        panic!("expected constant fetch");
    };
    assert_eq!(name.resolved, "Ns\\PHP_EOL");
    assert_eq!(name.fallback.as_deref(), Some("PHP_EOL"));

    let ClassMember::Const(consts) = &class.members[1] else {
        panic!("expected constant");
    };
    let Expr::ConstFetch { name, .. } = &*consts.consts[0].value else {
        panic!("expected constant fetch");
    };
    assert_eq!(name.resolved, "Other\\LIMIT");
    assert!(name.fallback.is_none());

    let ClassMember::Const(consts) = &class.members[2] else {
        panic!("expected constant");
    };
    assert!(matches!(&*consts.consts[0].value, Expr::Call { .. }));
}

#[test]
fn test_unsupported_default_values_do_not_derail_parsing() {
    let class = only_class("<?php class X { public function f($a = [1, 'k' => 2], $b = PHP_INT_MAX ** 2, $c = $d->e) {} }");
    let ClassMember::Method(method) = &class.members[0] else {
        panic!("expected method");
    };
    assert_eq!(method.params.len(), 3);
    assert!(matches!(
        method.params[0].default.as_deref(),
        Some(Expr::Array { items, .. }) if items.len() == 2
    ));
    assert!(matches!(
        method.params[2].default.as_deref(),
        Some(Expr::PropertyFetch { .. }) | Some(Expr::Unsupported { .. })
    ));
}

#[test]
fn test_dnf_and_intersection_types() {
    let class = only_class("<?php class X { public function f((A&B)|null $a, A&B $b, int &$c) {} }");
    let ClassMember::Method(method) = &class.members[0] else {
        panic!("expected method");
    };
    assert!(matches!(method.params[0].ty, Some(TypeNode::Union { .. })));
    assert!(matches!(method.params[1].ty, Some(TypeNode::Intersection { .. })));
    assert!(matches!(method.params[2].ty, Some(TypeNode::Named { .. })));
    assert!(method.params[2].by_ref);
}

#[test]
fn test_attributes_are_attached() {
    let class = only_class("<?php #[Attr(1, name: 'x'), Other] #[Third] class X { #[Deprecated] public function f() {} }");
    assert_eq!(class.attributes.len(), 2);
    assert_eq!(class.attributes[0].attributes.len(), 2);
    assert_eq!(class.attributes[0].attributes[0].args.len(), 2);
    assert_eq!(
        class.attributes[0].attributes[0].args[1]
            .name
            .as_ref()
            .map(|n| n.name.as_str()),
        Some("name")
    );
    let ClassMember::Method(method) = &class.members[0] else {
        panic!("expected method");
    };
    assert_eq!(method.attributes.len(), 1);
}

#[test]
fn test_errors_are_recovered() {
    let program = parse(b"<?php class A { public function f( {} } class B {}");
    assert!(!program.errors.is_empty());
    let names: Vec<_> = classes(&program).iter().map(|c| c.fqn.clone()).collect();
    assert!(names.contains(&"A".to_string()));
}
