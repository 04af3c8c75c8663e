//! Expression lowering.
//!
//! [`CodeGen::codegen_expr`] returns `Some(value)` when the expression
//! produces a result and `None` for calls to void functions.

use inkwell::types::{BasicMetadataTypeEnum, BasicTypeEnum};
use inkwell::values::BasicValueEnum;
use inkwell::IntPredicate;

use crate::ast::{BinOp, Expr, IncDecOp, UnaryOp};
use crate::errors::Result;

use super::CodeGen;

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    /// Lower `expr` and require it to produce a value.
    pub(super) fn expect_value(
        &mut self,
        expr: &Expr,
        what: &str,
    ) -> Result<BasicValueEnum<'ctx>> {
        self.codegen_expr(expr)?
            .ok_or_else(|| self.semantic_error(format!("{what} does not produce a value")))
    }

    /// Lower a single expression to LLVM IR.
    pub(super) fn codegen_expr(&mut self, expr: &Expr) -> Result<Option<BasicValueEnum<'ctx>>> {
        match expr {
            // ── integer literal ─────────────────────────────────────
            Expr::IntLiteral(text) => {
                let value: i32 = text.parse().map_err(|_| {
                    self.semantic_error(format!("integer literal '{text}' is out of range"))
                })?;
                Ok(Some(
                    self.context.i32_type().const_int(value as u64, true).into(),
                ))
            }

            // ── string literal ──────────────────────────────────────
            Expr::StringLiteral(text) => {
                let global = self.builder.build_global_string_ptr(text, "str")?;
                Ok(Some(global.as_pointer_value().into()))
            }

            // ── boolean literal ─────────────────────────────────────
            Expr::BoolLiteral(b) => Ok(Some(
                self.context.bool_type().const_int(*b as u64, false).into(),
            )),

            // ── variable reference ──────────────────────────────────
            Expr::Identifier(name) => {
                let (ptr, ty) = self
                    .lookup_variable(name)
                    .ok_or_else(|| self.semantic_error(format!("undefined variable: '{name}'")))?;
                Ok(Some(self.builder.build_load(ty, ptr, name)?))
            }

            // ── unary operation ─────────────────────────────────────
            Expr::Unary { op, operand } => {
                let value = self.expect_value(operand, "unary operand")?;
                match op {
                    UnaryOp::Neg => {
                        if !value.is_int_value()
                            || value.into_int_value().get_type().get_bit_width() == 1
                        {
                            return Err(self.semantic_error(format!(
                                "unary '-' requires an int operand, got {}",
                                super::types::describe(value.get_type()),
                            )));
                        }
                        let int = value.into_int_value();
                        let zero = int.get_type().const_zero();
                        Ok(Some(self.builder.build_int_sub(zero, int, "negtmp")?.into()))
                    }
                    UnaryOp::Not => {
                        // Coerce to i1 first, then flip with xor true.
                        let bit = self.build_condition(value, "operand of '!'")?;
                        let one = self.context.bool_type().const_int(1, false);
                        Ok(Some(self.builder.build_xor(bit, one, "nottmp")?.into()))
                    }
                }
            }

            // ── increment / decrement ───────────────────────────────
            //
            // Loads the current value, stores old±1 back, and yields the
            // pre- or post-update value. Sequenced exactly once.
            Expr::IncDec { op, target, is_prefix } => {
                let (ptr, ty) = self.lookup_variable(target).ok_or_else(|| {
                    self.semantic_error(format!("undefined variable: '{target}'"))
                })?;

                let old = self.builder.build_load(ty, ptr, "cur")?;
                if !old.is_int_value() || old.into_int_value().get_type().get_bit_width() == 1 {
                    return Err(self.semantic_error(format!(
                        "'{}' requires an int variable, but '{target}' is not int",
                        match op {
                            IncDecOp::Increment => "++",
                            IncDecOp::Decrement => "--",
                        },
                    )));
                }

                let old = old.into_int_value();
                let one = old.get_type().const_int(1, false);
                let new = match op {
                    IncDecOp::Increment => self.builder.build_int_add(old, one, "inctmp")?,
                    IncDecOp::Decrement => self.builder.build_int_sub(old, one, "dectmp")?,
                };
                self.builder.build_store(ptr, new)?;

                Ok(Some(if *is_prefix { new.into() } else { old.into() }))
            }

            // ── binary operation ────────────────────────────────────
            Expr::Binary { left, op, right } => {
                let lhs = self.expect_value(left, "left operand")?;
                let rhs = self.expect_value(right, "right operand")?;

                if !lhs.is_int_value() || !rhs.is_int_value() {
                    return Err(self.semantic_error(format!(
                        "binary operator {op:?} requires int or bool operands"
                    )));
                }
                let lhs = lhs.into_int_value();
                let rhs = rhs.into_int_value();
                if lhs.get_type() != rhs.get_type() {
                    return Err(self.semantic_error(format!(
                        "binary operator {op:?} applied to mismatched operand types"
                    )));
                }

                let value = match op {
                    BinOp::Add => self.builder.build_int_add(lhs, rhs, "addtmp")?,
                    BinOp::Sub => self.builder.build_int_sub(lhs, rhs, "subtmp")?,
                    BinOp::Mul => self.builder.build_int_mul(lhs, rhs, "multmp")?,
                    BinOp::Div => self.builder.build_int_signed_div(lhs, rhs, "divtmp")?,
                    BinOp::Rem => self.builder.build_int_signed_rem(lhs, rhs, "modtmp")?,
                    BinOp::Eq => {
                        self.builder.build_int_compare(IntPredicate::EQ, lhs, rhs, "eqtmp")?
                    }
                    BinOp::Ne => {
                        self.builder.build_int_compare(IntPredicate::NE, lhs, rhs, "netmp")?
                    }
                    BinOp::Lt => {
                        self.builder.build_int_compare(IntPredicate::SLT, lhs, rhs, "lttmp")?
                    }
                    BinOp::Gt => {
                        self.builder.build_int_compare(IntPredicate::SGT, lhs, rhs, "gttmp")?
                    }
                };
                Ok(Some(value.into()))
            }

            // ── function call ───────────────────────────────────────
            Expr::Call { callee, args } => self.codegen_call(callee, args),
        }
    }

    /// Lower a call: registered external functions first, then
    /// user-defined functions.
    fn codegen_call(
        &mut self,
        callee: &str,
        args: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        if crate::compiler::stdlib_registry::lookup(callee).is_some() {
            return self.codegen_external_call(callee, args);
        }

        let info = self
            .functions
            .get(callee)
            .ok_or_else(|| self.semantic_error(format!("undefined function: '{callee}'")))?;
        let fn_val = info.value;

        let param_types = fn_val.get_type().get_param_types();
        if args.len() != param_types.len() {
            return Err(self.semantic_error(format!(
                "function '{callee}' expects {} argument(s), got {}",
                param_types.len(),
                args.len(),
            )));
        }

        let mut llvm_args = Vec::with_capacity(args.len());
        for (i, (arg, param_ty)) in args.iter().zip(&param_types).enumerate() {
            let value = self.expect_value(arg, "call argument")?;
            if BasicMetadataTypeEnum::from(value.get_type()) != BasicMetadataTypeEnum::from(*param_ty) {
                let declared = BasicTypeEnum::try_from(*param_ty)
                    .map(super::types::describe)
                    .unwrap_or("unsupported");
                return Err(self.semantic_error(format!(
                    "argument {} of call to '{callee}' is {} but the parameter is declared {declared}",
                    i + 1,
                    super::types::describe(value.get_type()),
                )));
            }
            llvm_args.push(value.into());
        }

        let call = self.builder.build_call(fn_val, &llvm_args, "calltmp")?;
        Ok(call.try_as_basic_value().left())
    }

    /// Declare (once) and call a registered external variadic function,
    /// marshalling the arguments for C linkage.
    fn codegen_external_call(
        &mut self,
        callee: &str,
        args: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let ext = crate::compiler::stdlib_registry::lookup(callee)
            .expect("caller checked the registry");

        let fn_val = match self.module.get_function(ext.symbol) {
            Some(f) => f,
            None => {
                let ptr = self.context.ptr_type(inkwell::AddressSpace::default());
                let fn_type = self.context.i32_type().fn_type(&[ptr.into()], true);
                self.module.add_function(ext.symbol, fn_type, None)
            }
        };

        if args.is_empty() {
            return Err(self.semantic_error(format!(
                "'{callee}' requires at least a format string argument"
            )));
        }

        let mut llvm_args = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.expect_value(arg, "call argument")?;
            // C default argument promotion: bools widen to i32.
            let value = if value.is_int_value()
                && value.into_int_value().get_type().get_bit_width() < 32
            {
                self.builder
                    .build_int_z_extend(value.into_int_value(), self.context.i32_type(), "widen")?
                    .into()
            } else {
                value
            };
            llvm_args.push(value.into());
        }

        let call = self.builder.build_call(fn_val, &llvm_args, "calltmp")?;
        Ok(call.try_as_basic_value().left())
    }
}
