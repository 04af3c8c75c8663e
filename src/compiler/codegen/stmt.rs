//! Statement lowering and control flow.
//!
//! Every lowering method returns `true` when it generated a terminator on
//! every path through the statement, so enclosing blocks know not to emit
//! further instructions or an extra jump. A basic block gets exactly one
//! terminator.

use crate::ast::{AssignOp, Block, Expr, Stmt, Type};
use crate::errors::Result;

use super::types;
use super::{CodeGen, Local};

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    /// Lower a block in its own lexical scope.
    ///
    /// Returns `true` if the block ended in a statement that terminated
    /// every path; statements after that point are unreachable and are
    /// not emitted.
    pub(super) fn codegen_block(&mut self, block: &Block) -> Result<bool> {
        let scope = self.locals.len();

        let mut terminated = false;
        for stmt in &block.statements {
            terminated = self.codegen_stmt(stmt)?;
            if terminated {
                break;
            }
        }

        self.locals.truncate(scope);
        Ok(terminated)
    }

    /// Lower a single statement. Returns `true` if it terminated the
    /// current path (a return, or an if/else whose arms all return).
    pub(super) fn codegen_stmt(&mut self, stmt: &Stmt) -> Result<bool> {
        match stmt {
            Stmt::VarDecl { ty, name, init } => {
                self.codegen_var_decl(*ty, name, init)?;
                Ok(false)
            }

            Stmt::Assign { name, op, value } => {
                self.codegen_assign(name, *op, value)?;
                Ok(false)
            }

            Stmt::Return(value) => {
                self.codegen_return(value.as_ref())?;
                Ok(true)
            }

            Stmt::Expr(expr) => {
                // Evaluated for its side effect; the result is dropped.
                self.codegen_expr(expr)?;
                Ok(false)
            }

            Stmt::Block(block) => self.codegen_block(block),

            Stmt::If { condition, then_block, else_ifs, else_block } => {
                self.codegen_if(condition, then_block, else_ifs, else_block.as_ref())
            }

            Stmt::While { condition, body } => {
                self.codegen_while(condition, body)?;
                Ok(false)
            }

            Stmt::GlobalVarDecl { name, .. } => Err(self.semantic_error(format!(
                "global '{name}' declared outside file scope"
            ))),

            Stmt::FuncDecl { name, .. } => Err(self.semantic_error(format!(
                "nested function '{name}' is not supported"
            ))),
        }
    }

    /// `int x = expr;` — slot hoisted to function entry, store at the
    /// declaration point.
    fn codegen_var_decl(&mut self, ty: Type, name: &str, init: &Expr) -> Result<()> {
        let declared = types::basic_type(self.context, ty);

        let value = self.expect_value(init, "variable initializer")?;
        if value.get_type() != declared {
            return Err(self.semantic_error(format!(
                "'{name}' is declared {ty} but its initializer is {}",
                types::describe(value.get_type()),
            )));
        }

        let slot = self.build_entry_alloca(name, declared)?;
        self.builder.build_store(slot, value)?;
        self.locals.push(Local { name: name.to_string(), ptr: slot, ty: declared });
        Ok(())
    }

    /// `x = expr;` and the compound forms `+= -= *= /=`.
    fn codegen_assign(&mut self, name: &str, op: AssignOp, value: &Expr) -> Result<()> {
        let (ptr, ty) = self
            .lookup_variable(name)
            .ok_or_else(|| self.semantic_error(format!("undefined variable: '{name}'")))?;

        let new_val = self.expect_value(value, "assignment value")?;

        let store_val = match op {
            AssignOp::Assign => {
                if new_val.get_type() != ty {
                    return Err(self.semantic_error(format!(
                        "cannot assign a {} value to '{name}' of type {}",
                        types::describe(new_val.get_type()),
                        types::describe(ty),
                    )));
                }
                new_val
            }
            compound => {
                let current = self.builder.build_load(ty, ptr, "cur")?;
                if !current.is_int_value() || !new_val.is_int_value() {
                    return Err(self.semantic_error(format!(
                        "compound assignment to '{name}' requires int operands"
                    )));
                }
                let lhs = current.into_int_value();
                let rhs = new_val.into_int_value();
                let result = match compound {
                    AssignOp::AddAssign => self.builder.build_int_add(lhs, rhs, "addtmp")?,
                    AssignOp::SubAssign => self.builder.build_int_sub(lhs, rhs, "subtmp")?,
                    AssignOp::MulAssign => self.builder.build_int_mul(lhs, rhs, "multmp")?,
                    AssignOp::DivAssign => {
                        self.builder.build_int_signed_div(lhs, rhs, "divtmp")?
                    }
                    AssignOp::Assign => unreachable!("handled above"),
                };
                result.into()
            }
        };

        self.builder.build_store(ptr, store_val)?;
        Ok(())
    }

    fn codegen_return(&mut self, value: Option<&Expr>) -> Result<()> {
        match (self.current_return, value) {
            (Some(ty), Some(expr)) => {
                let v = self.expect_value(expr, "return value")?;
                if v.get_type() != types::basic_type(self.context, ty) {
                    return Err(self.semantic_error(format!(
                        "function '{}' is declared to return {ty} but returns {}",
                        self.current_fn,
                        types::describe(v.get_type()),
                    )));
                }
                self.builder.build_return(Some(&v))?;
            }
            (None, None) => {
                self.builder.build_return(None)?;
            }
            (None, Some(_)) => {
                return Err(self.semantic_error(format!(
                    "void function '{}' cannot return a value",
                    self.current_fn,
                )));
            }
            (Some(ty), None) => {
                return Err(self.semantic_error(format!(
                    "function '{}' must return a value of type {ty}",
                    self.current_fn,
                )));
            }
        }
        Ok(())
    }

    /// Lower an if / else-if* / else chain.
    ///
    /// One block per arm plus one shared merge block. An arm only jumps to
    /// the merge block if it did not already return; when every arm
    /// returns and an else is present, the merge block is unreachable and
    /// is removed again.
    fn codegen_if(
        &mut self,
        condition: &Expr,
        then_block: &Block,
        else_ifs: &[(Expr, Block)],
        else_block: Option<&Block>,
    ) -> Result<bool> {
        let function = self.current_function();
        let merge_bb = self.context.append_basic_block(function, "ifcont");
        let mut merge_reachable = false;

        // (condition, body) for the `if` and every `else if`.
        let arms = std::iter::once((condition, then_block))
            .chain(else_ifs.iter().map(|(c, b)| (c, b)));
        let arm_count = 1 + else_ifs.len();

        for (i, (cond, body)) in arms.enumerate() {
            let cond_val = self.expect_value(cond, "if condition")?;
            let cond_bit = self.build_condition(cond_val, "if condition")?;

            let then_bb = self.context.append_basic_block(function, "then");
            let is_last_arm = i + 1 == arm_count;
            let next_bb = if !is_last_arm {
                self.context.append_basic_block(function, "elseif")
            } else if else_block.is_some() {
                self.context.append_basic_block(function, "else")
            } else {
                merge_reachable = true;
                merge_bb
            };

            self.builder.build_conditional_branch(cond_bit, then_bb, next_bb)?;

            self.builder.position_at_end(then_bb);
            if !self.codegen_block(body)? {
                self.builder.build_unconditional_branch(merge_bb)?;
                merge_reachable = true;
            }

            self.builder.position_at_end(next_bb);
        }

        // The builder now sits in the else block (or the merge block when
        // there is no else).
        if let Some(body) = else_block {
            if !self.codegen_block(body)? {
                self.builder.build_unconditional_branch(merge_bb)?;
                merge_reachable = true;
            }
        }

        if merge_reachable {
            self.builder.position_at_end(merge_bb);
            Ok(false)
        } else {
            // Every arm returned: the statement terminates the path.
            merge_bb
                .remove_from_function()
                .map_err(|()| self.semantic_error("failed to drop unreachable merge block"))?;
            Ok(true)
        }
    }

    /// Lower a while loop: condition block, body block, exit block. The
    /// condition is re-entered after every body execution.
    fn codegen_while(&mut self, condition: &Expr, body: &Block) -> Result<()> {
        let function = self.current_function();
        let cond_bb = self.context.append_basic_block(function, "while_cond");
        let body_bb = self.context.append_basic_block(function, "while_body");
        let end_bb = self.context.append_basic_block(function, "while_end");

        self.builder.build_unconditional_branch(cond_bb)?;

        self.builder.position_at_end(cond_bb);
        let cond_val = self.expect_value(condition, "while condition")?;
        let cond_bit = self.build_condition(cond_val, "while condition")?;
        self.builder.build_conditional_branch(cond_bit, body_bb, end_bb)?;

        self.builder.position_at_end(body_bb);
        if !self.codegen_block(body)? {
            // Loop back unless the body already returned.
            self.builder.build_unconditional_branch(cond_bb)?;
        }

        self.builder.position_at_end(end_bb);
        Ok(())
    }
}
