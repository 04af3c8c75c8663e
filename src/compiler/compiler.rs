//! LLVM-backed compiler for the Ember language.
//!
//! This is the top-level coordinator. The heavy lifting is split across:
//!
//! - [`codegen`](super::codegen)                 — AST → LLVM IR lowering
//! - [`stdlib_registry`](super::stdlib_registry) — external runtime functions
//! - [`linker`](super::linker)                   — native binary production

use std::path::Path;

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::execution_engine::JitFunction;
use inkwell::module::Module;
use inkwell::passes::PassBuilderOptions;
use inkwell::targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::OptimizationLevel;

use crate::ast::Program;
use crate::errors::{CompileError, Phase, Result};

use super::codegen::CodeGen;

/// Holds LLVM state for a single compilation unit.
pub struct Compiler<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
}

impl<'ctx> Compiler<'ctx> {
    /// Create a new compiler targeting the given LLVM module name.
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();
        Self { context, module, builder }
    }

    // ── codegen entry point ─────────────────────────────────────

    /// Lower a full [`Program`] to LLVM IR, then verify the module.
    ///
    /// A verification failure indicates a generator bug, not a user
    /// error, and is reported as a backend failure.
    pub fn compile(&self, program: &Program) -> Result<()> {
        CodeGen::new(self.context, &self.module, &self.builder).compile(program)?;

        self.module.verify().map_err(|message| {
            CompileError::new(
                Phase::Backend,
                format!("module verification failed: {}", message.to_string().trim_end()),
            )
        })
    }

    // ── output helpers ──────────────────────────────────────────

    /// Return the LLVM IR as a string.
    pub fn ir_string(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Write textual LLVM IR for the external toolchain.
    pub fn write_ir_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.ir_string()).map_err(|e| {
            CompileError::new(
                Phase::Backend,
                format!("failed to write IR to {}: {e}", path.display()),
            )
        })
    }

    /// Run LLVM's default optimization pipeline over the module.
    pub fn optimize(&self) -> Result<()> {
        let machine = native_target_machine()?;
        self.module
            .run_passes("default<O2>", &machine, PassBuilderOptions::create())
            .map_err(|message| {
                CompileError::new(
                    Phase::Backend,
                    format!("optimization pipeline failed: {message}"),
                )
            })
    }

    // ── execution ───────────────────────────────────────────────

    /// JIT-execute the entry function and return its result.
    pub fn run_jit(&self) -> Result<i32> {
        let engine = self
            .module
            .create_jit_execution_engine(OptimizationLevel::None)
            .map_err(|message| {
                CompileError::new(
                    Phase::Backend,
                    format!("failed to create execution engine: {message}"),
                )
            })?;

        // Prototype shape is enforced at codegen time: i32 main().
        let main: JitFunction<'_, unsafe extern "C" fn() -> i32> =
            unsafe { engine.get_function("main") }.map_err(|_| {
                CompileError::with_hint(
                    Phase::Backend,
                    "no 'main' function in module",
                    "declare an entry point: func main():int { ... }",
                )
            })?;

        Ok(unsafe { main.call() })
    }
}

/// A target machine for the host, used by the optimizer.
fn native_target_machine() -> Result<TargetMachine> {
    Target::initialize_native(&InitializationConfig::default()).map_err(|message| {
        CompileError::new(Phase::Backend, format!("failed to initialise native target: {message}"))
    })?;

    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple).map_err(|message| {
        CompileError::new(Phase::Backend, format!("unsupported target triple: {message}"))
    })?;

    target
        .create_target_machine(
            &triple,
            "generic",
            "",
            OptimizationLevel::Default,
            RelocMode::Default,
            CodeModel::Default,
        )
        .ok_or_else(|| CompileError::new(Phase::Backend, "failed to create target machine"))
}
