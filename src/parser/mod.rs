//! Parser for wiki markup

pub mod ast;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::{parse, parse_with_tags};
pub use lexer::ExtensionTags;
