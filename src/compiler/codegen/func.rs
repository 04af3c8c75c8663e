//! Prototype declaration, global definition and function-body emission.

use inkwell::types::{BasicMetadataTypeEnum, BasicType};

use crate::ast::{BinOp, Block, Expr, Param, Type, UnaryOp};
use crate::errors::Result;

use super::types;
use super::{CodeGen, FnInfo, GlobalVar, Local};

/// A constant-folded global initializer.
enum Folded {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Folded {
    fn describe(&self) -> &'static str {
        match self {
            Folded::Int(_)  => "int",
            Folded::Bool(_) => "bool",
            Folded::Str(_)  => "string",
        }
    }
}

impl<'a, 'ctx> CodeGen<'a, 'ctx> {
    // ── declaration pass ────────────────────────────────────────────

    /// Create a function signature without generating a body, so later
    /// bodies can call it regardless of declaration order.
    pub(super) fn declare_prototype(
        &mut self,
        name: &str,
        params: &[Param],
        return_type: Option<Type>,
    ) -> Result<()> {
        if self.functions.contains_key(name) {
            return Err(self.semantic_error(format!("function '{name}' is defined twice")));
        }

        // The entry function is JIT-executed as `i32 main()`.
        if name == "main" && (return_type != Some(Type::Int) || !params.is_empty()) {
            return Err(self.semantic_error(
                "'main' must be declared as 'func main():int' with no parameters",
            ));
        }

        let param_types: Vec<BasicMetadataTypeEnum<'ctx>> = params
            .iter()
            .map(|p| types::basic_type(self.context, p.ty).into())
            .collect();

        let fn_type = match return_type {
            Some(ty) => types::basic_type(self.context, ty).fn_type(&param_types, false),
            None => self.context.void_type().fn_type(&param_types, false),
        };

        let value = self.module.add_function(name, fn_type, None);
        self.functions.insert(name.to_string(), FnInfo { value, return_type });
        Ok(())
    }

    /// Allocate a module-level storage slot and fold its initializer.
    ///
    /// Globals are initialized before any body exists, so the initializer
    /// must be a constant expression.
    pub(super) fn define_global(&mut self, ty: Type, name: &str, init: &Expr) -> Result<()> {
        if self.globals.contains_key(name) {
            return Err(self.semantic_error(format!("global '{name}' is defined twice")));
        }

        let llvm_ty = types::basic_type(self.context, ty);
        let folded = self.fold_constant(name, init)?;
        let global = self.module.add_global(llvm_ty, None, name);

        match (ty, folded) {
            (Type::Int, Folded::Int(v)) => {
                let v = i32::try_from(v).map_err(|_| {
                    self.semantic_error(format!("initializer for '{name}' overflows int"))
                })?;
                global.set_initializer(&self.context.i32_type().const_int(v as u64, true));
            }
            (Type::Bool, Folded::Bool(b)) => {
                global.set_initializer(&self.context.bool_type().const_int(b as u64, false));
            }
            (Type::Str, Folded::Str(s)) => {
                // The global holds a pointer to a private constant buffer.
                let bytes = self.context.const_string(s.as_bytes(), true);
                let data = self.module.add_global(bytes.get_type(), None, &format!("{name}.str"));
                data.set_initializer(&bytes);
                data.set_constant(true);
                global.set_initializer(&data.as_pointer_value());
            }
            (declared, other) => {
                return Err(self.semantic_error(format!(
                    "global '{name}' is declared {declared} but its initializer is {}",
                    other.describe(),
                )));
            }
        }

        self.globals.insert(name.to_string(), GlobalVar { value: global, ty: llvm_ty });
        Ok(())
    }

    /// Evaluate a global initializer at compile time.
    fn fold_constant(&self, name: &str, expr: &Expr) -> Result<Folded> {
        let non_constant = || {
            self.semantic_error(format!(
                "initializer for global '{name}' must be a constant expression"
            ))
        };

        match expr {
            Expr::IntLiteral(text) => {
                let v: i32 = text.parse().map_err(|_| {
                    self.semantic_error(format!("integer literal '{text}' is out of range"))
                })?;
                Ok(Folded::Int(v as i64))
            }
            Expr::BoolLiteral(b) => Ok(Folded::Bool(*b)),
            Expr::StringLiteral(s) => Ok(Folded::Str(s.clone())),

            Expr::Unary { op, operand } => match (op, self.fold_constant(name, operand)?) {
                (UnaryOp::Neg, Folded::Int(v)) => Ok(Folded::Int(-v)),
                (UnaryOp::Not, Folded::Bool(b)) => Ok(Folded::Bool(!b)),
                _ => Err(non_constant()),
            },

            Expr::Binary { left, op, right } => {
                let (l, r) = match (
                    self.fold_constant(name, left)?,
                    self.fold_constant(name, right)?,
                ) {
                    (Folded::Int(l), Folded::Int(r)) => (l, r),
                    _ => return Err(non_constant()),
                };
                match op {
                    BinOp::Add => Ok(Folded::Int(l.wrapping_add(r))),
                    BinOp::Sub => Ok(Folded::Int(l.wrapping_sub(r))),
                    BinOp::Mul => Ok(Folded::Int(l.wrapping_mul(r))),
                    BinOp::Div | BinOp::Rem if r == 0 => Err(self.semantic_error(format!(
                        "division by zero in initializer for global '{name}'"
                    ))),
                    BinOp::Div => Ok(Folded::Int(l / r)),
                    BinOp::Rem => Ok(Folded::Int(l % r)),
                    BinOp::Eq => Ok(Folded::Bool(l == r)),
                    BinOp::Ne => Ok(Folded::Bool(l != r)),
                    BinOp::Lt => Ok(Folded::Bool(l < r)),
                    BinOp::Gt => Ok(Folded::Bool(l > r)),
                }
            }

            // Identifiers, calls and increments need runtime state.
            _ => Err(non_constant()),
        }
    }

    // ── definition pass ─────────────────────────────────────────────

    /// Emit the body of a function against the prototype created in the
    /// declaration pass.
    pub(super) fn define_function(
        &mut self,
        name: &str,
        params: &[Param],
        return_type: Option<Type>,
        body: &Block,
    ) -> Result<()> {
        let fn_val = self
            .functions
            .get(name)
            .expect("prototype was created in the declaration pass")
            .value;

        let entry = self.context.append_basic_block(fn_val, "entry");
        self.builder.position_at_end(entry);
        self.current_return = return_type;
        self.current_fn = name.to_string();

        // Function-body scope: parameters plus every local in the body.
        let scope = self.locals.len();

        // Bind each parameter to its own stack slot.
        for (i, param) in params.iter().enumerate() {
            let ty = types::basic_type(self.context, param.ty);
            let slot = self.build_entry_alloca(&param.name, ty)?;
            let arg = fn_val
                .get_nth_param(i as u32)
                .expect("prototype arity matches the parameter list");
            self.builder.build_store(slot, arg)?;
            self.locals.push(Local { name: param.name.clone(), ptr: slot, ty });
        }

        let terminated = self.codegen_block(body)?;
        self.locals.truncate(scope);

        if !terminated {
            match return_type {
                // Void functions get an implicit return.
                None => {
                    self.builder.build_return(None)?;
                }
                Some(ty) => {
                    return Err(self.semantic_error(format!(
                        "function '{name}' is declared to return {ty} but control can \
                         reach the end of its body without a return",
                    )));
                }
            }
        }

        Ok(())
    }
}
