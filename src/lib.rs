//! The Ember compiler as a library.
//!
//! Pipeline:  source → lexer → parser → AST → LLVM IR → JIT / native binary
//!
//! The binary driver in `main.rs` wires these together; integration tests
//! use the same entry points.

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod parser;
