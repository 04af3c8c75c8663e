//! Code generation — walks the AST and emits LLVM IR.
//!
//! The generator runs in two passes over the top level. The declaration
//! pass creates every function prototype and global before any body is
//! generated, so functions and globals may reference each other out of
//! declaration order. The definition pass then emits each function body
//! against its existing prototype, strictly in source order.
//!
//! Split across:
//!
//! - [`func`]  — prototypes, globals, function-body definition
//! - [`stmt`]  — statement lowering and control flow
//! - [`expr`]  — expression lowering
//! - [`types`] — declared-type → LLVM-type mapping

pub mod expr;
pub mod func;
pub mod stmt;
pub mod types;

use std::collections::HashMap;

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{FunctionValue, GlobalValue, IntValue, PointerValue};
use inkwell::IntPredicate;

use crate::ast::{Program, Stmt, Type};
use crate::errors::{CompileError, Phase, Result};

/// A local variable binding: name → stack slot.
struct Local<'ctx> {
    name: String,
    ptr: PointerValue<'ctx>,
    ty: BasicTypeEnum<'ctx>,
}

/// A module-level variable.
struct GlobalVar<'ctx> {
    value: GlobalValue<'ctx>,
    ty: BasicTypeEnum<'ctx>,
}

/// A declared function together with its source-level return type.
///
/// The declared type is stored here instead of being re-derived from the
/// LLVM function value later.
struct FnInfo<'ctx> {
    value: FunctionValue<'ctx>,
    return_type: Option<Type>,
}

/// Holds all state for one codegen session over one module.
///
/// The local symbol table is a flat stack of bindings: entering a lexical
/// scope records the current length, leaving it truncates back to that
/// length. Lookup scans newest-first, then falls back to globals.
pub struct CodeGen<'a, 'ctx> {
    context: &'ctx Context,
    module: &'a Module<'ctx>,
    builder: &'a Builder<'ctx>,
    locals: Vec<Local<'ctx>>,
    globals: HashMap<String, GlobalVar<'ctx>>,
    functions: HashMap<String, FnInfo<'ctx>>,
    /// Declared return type of the function currently being defined.
    current_return: Option<Type>,
    /// Name of the function currently being defined, for diagnostics.
    current_fn: String,
}

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    pub fn new(
        context: &'ctx Context,
        module: &'a Module<'ctx>,
        builder: &'a Builder<'ctx>,
    ) -> Self {
        Self {
            context,
            module,
            builder,
            locals: Vec::new(),
            globals: HashMap::new(),
            functions: HashMap::new(),
            current_return: None,
            current_fn: String::new(),
        }
    }

    /// Lower a full [`Program`] to LLVM IR.
    pub fn compile(&mut self, program: &Program) -> Result<()> {
        // Pass 1 — declare every prototype and global.
        for stmt in &program.statements {
            match stmt {
                Stmt::FuncDecl { name, params, return_type, .. } => {
                    self.declare_prototype(name, params, *return_type)?;
                }
                Stmt::GlobalVarDecl { ty, name, init } => {
                    self.define_global(*ty, name, init)?;
                }
                other => {
                    return Err(self.semantic_error(format!(
                        "unsupported top-level statement: {other:?}"
                    )));
                }
            }
        }

        // Pass 2 — emit each function body against its prototype.
        for stmt in &program.statements {
            if let Stmt::FuncDecl { name, params, return_type, body } = stmt {
                self.define_function(name, params, *return_type, body)?;
            }
        }

        Ok(())
    }

    // ── shared helpers ──────────────────────────────────────────────

    fn semantic_error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(Phase::Codegen, message)
    }

    /// Resolve a name to its storage slot: locals newest-first, then globals.
    fn lookup_variable(&self, name: &str) -> Option<(PointerValue<'ctx>, BasicTypeEnum<'ctx>)> {
        if let Some(local) = self.locals.iter().rev().find(|l| l.name == name) {
            return Some((local.ptr, local.ty));
        }
        self.globals
            .get(name)
            .map(|g| (g.value.as_pointer_value(), g.ty))
    }

    /// The function whose body the builder cursor is currently inside.
    fn current_function(&self) -> FunctionValue<'ctx> {
        self.builder
            .get_insert_block()
            .expect("builder has an insert block during codegen")
            .get_parent()
            .expect("insert block belongs to a function")
    }

    /// Build an alloca spliced into the *start* of the current function's
    /// entry block, regardless of where the builder cursor is.
    ///
    /// The backend expects allocation instructions in a stable position at
    /// function entry; the store of the initial value still happens at the
    /// cursor.
    fn build_entry_alloca(
        &self,
        name: &str,
        ty: BasicTypeEnum<'ctx>,
    ) -> Result<PointerValue<'ctx>> {
        let entry = self
            .current_function()
            .get_first_basic_block()
            .expect("function has an entry block");

        let tmp = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first) => tmp.position_before(&first),
            None => tmp.position_at_end(entry),
        }

        Ok(tmp.build_alloca(ty, name)?)
    }

    /// Coerce a value to an `i1` condition. Comparison results pass
    /// through; wider integers are compared against zero.
    fn build_condition(
        &self,
        value: inkwell::values::BasicValueEnum<'ctx>,
        what: &str,
    ) -> Result<IntValue<'ctx>> {
        if !value.is_int_value() {
            return Err(self.semantic_error(format!("{what} must be an int or bool value")));
        }
        let int = value.into_int_value();
        if int.get_type().get_bit_width() == 1 {
            return Ok(int);
        }
        let zero = int.get_type().const_zero();
        Ok(self
            .builder
            .build_int_compare(IntPredicate::NE, int, zero, "cond")?)
    }
}
