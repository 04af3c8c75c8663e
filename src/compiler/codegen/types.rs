//! Declared-type → LLVM-type mapping.
//!
//! `int` is a 32-bit integer, `bool` a 1-bit integer and `string` an
//! opaque pointer (to NUL-terminated bytes).

use inkwell::context::Context;
use inkwell::types::BasicTypeEnum;
use inkwell::AddressSpace;

use crate::ast::Type;

/// The LLVM representation of a declared type keyword.
pub fn basic_type<'ctx>(context: &'ctx Context, ty: Type) -> BasicTypeEnum<'ctx> {
    match ty {
        Type::Int  => context.i32_type().into(),
        Type::Bool => context.bool_type().into(),
        Type::Str  => context.ptr_type(AddressSpace::default()).into(),
    }
}

/// Human-readable name of an LLVM value type, for mismatch diagnostics.
pub fn describe(ty: BasicTypeEnum<'_>) -> &'static str {
    match ty {
        BasicTypeEnum::IntType(int) if int.get_bit_width() == 1 => "bool",
        BasicTypeEnum::IntType(_) => "int",
        BasicTypeEnum::PointerType(_) => "string",
        _ => "unsupported",
    }
}
