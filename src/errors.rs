//! Ember error reporting — structured errors, pretty coloured diagnostics.
//!
//! Library code never terminates the process: every phase returns a
//! [`Result`] whose error bubbles up to the driver, which calls [`report`]
//! and exits. The first error of a phase ends that phase.

use std::fmt;

/// The phase of compilation where an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Driver,
    Lex,
    Parse,
    Codegen,
    Backend,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Driver  => write!(f, "driver"),
            Phase::Lex     => write!(f, "lex"),
            Phase::Parse   => write!(f, "parse"),
            Phase::Codegen => write!(f, "codegen"),
            Phase::Backend => write!(f, "backend"),
        }
    }
}

/// A structured compiler error.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub phase: Phase,
    pub message: String,
    pub hint: Option<String>,
}

/// Result alias used across every compiler phase.
pub type Result<T> = std::result::Result<T, CompileError>;

impl CompileError {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self { phase, message: message.into(), hint: None }
    }

    pub fn with_hint(phase: Phase, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self { phase, message: message.into(), hint: Some(hint.into()) }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.phase, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {hint}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// A failed instruction build is a generator bug, not a user error.
impl From<inkwell::builder::BuilderError> for CompileError {
    fn from(err: inkwell::builder::BuilderError) -> Self {
        CompileError::new(Phase::Backend, format!("instruction build failed: {err}"))
    }
}

/// Print an error to stderr with red colouring (ANSI).
pub fn report(err: &CompileError) {
    eprintln!(
        "\x1b[1;31merror\x1b[0m\x1b[1m[{}]:\x1b[0m {}",
        err.phase, err.message,
    );
    if let Some(hint) = &err.hint {
        eprintln!("  \x1b[1;36mhint:\x1b[0m {hint}");
    }
}

/// Print a status/info message with a coloured `[ember]` prefix.
pub fn info(message: impl fmt::Display) {
    eprintln!("\x1b[1;34m[ember]\x1b[0m {message}");
}

/// Print a success message in green.
pub fn success(message: impl fmt::Display) {
    eprintln!("\x1b[1;32m[ember]\x1b[0m {message}");
}
