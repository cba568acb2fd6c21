//! Expression engine
//!
//! Lexer, parser and tree-walking interpreter for the JavaScript subset
//! event directives run: statements separated by `;`, assignment and update
//! operators, conditionals, logical/comparison/arithmetic operators, member
//! access and object literals.

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
mod interpreter;

pub use interpreter::{Interpreter, Locals};
pub use parser::{Parser, ParseError};
