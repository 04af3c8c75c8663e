//! LLVM-backed compiler — lowers the AST to native code via Inkwell.

pub mod codegen;
pub mod compiler;
pub mod linker;
pub mod stdlib_registry;

pub use compiler::Compiler;
