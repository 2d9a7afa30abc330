pub mod ast;
pub mod lexer;
pub mod line_index;
pub mod parser;
pub mod span;

pub use span::Span;

/// Parses PHP source into a declaration-level [`ast::Program`].
///
/// Parsing never fails: syntax errors are collected on the program and the
/// parser recovers at the next statement or member boundary.
pub fn parse(source: &[u8]) -> ast::Program {
    parser::Parser::new(source).parse_program()
}
