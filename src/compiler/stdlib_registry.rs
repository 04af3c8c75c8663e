//! Registry of external runtime functions callable from Ember code.
//!
//! The code generator consults this table before resolving a call as a
//! user-defined function. Every entry is a C-linkage variadic formatter
//! with the `i32 (ptr, ...)` shape; it is declared in the module the
//! first time a call site needs it.

/// Describes one external runtime function.
#[derive(Clone, Copy, Debug)]
pub struct ExternalFn {
    /// The name used in Ember source code.
    pub name: &'static str,
    /// The C symbol to declare and link against.
    pub symbol: &'static str,
}

const TABLE: &[ExternalFn] = &[
    ExternalFn { name: "printf", symbol: "printf" },
];

/// Look up an external function by its Ember-visible name.
pub fn lookup(name: &str) -> Option<&'static ExternalFn> {
    TABLE.iter().find(|f| f.name == name)
}
