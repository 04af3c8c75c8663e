//! End-to-end tests: source text through parsing, codegen, verification
//! and JIT execution.

use indoc::indoc;

use ember::compiler::Compiler;
use ember::errors::{CompileError, Phase};
use ember::parser::Parser;

/// Compile `source` into a verified module and return its textual IR.
fn compile_ir(source: &str) -> Result<String, CompileError> {
    let program = Parser::new(source)?.parse_program()?;
    let context = inkwell::context::Context::create();
    let compiler = Compiler::new(&context, "test");
    compiler.compile(&program)?;
    Ok(compiler.ir_string())
}

/// Compile `source` and JIT-execute its `main`.
fn run(source: &str) -> Result<i32, CompileError> {
    let program = Parser::new(source)?.parse_program()?;
    let context = inkwell::context::Context::create();
    let compiler = Compiler::new(&context, "test");
    compiler.compile(&program)?;
    compiler.run_jit()
}

// ── execution scenarios ─────────────────────────────────────────────

#[test]
fn returns_constant() {
    let source = "func main():int { return 42; }";
    assert_eq!(run(source).unwrap(), 42);
}

#[test]
fn arrow_function_and_call() {
    let source = indoc! {"
        func add(a:int, b:int):int => a + b;
        func main():int { return add(2, 3); }
    "};
    assert_eq!(run(source).unwrap(), 5);
}

#[test]
fn global_with_compound_assignment() {
    let source = indoc! {"
        int g = 10;
        func main():int {
            g += 5;
            return g;
        }
    "};
    assert_eq!(run(source).unwrap(), 15);
}

#[test]
fn if_else_where_both_branches_return() {
    let source = indoc! {"
        func main():int {
            int x = 0;
            if (x == 0) {
                return 1;
            } else {
                return 2;
            }
        }
    "};
    assert_eq!(run(source).unwrap(), 1);
}

#[test]
fn else_if_chain_picks_middle_branch() {
    let source = indoc! {"
        func classify(x:int):int {
            if (x < 0) {
                return 0;
            } else if (x == 0) {
                return 1;
            } else {
                return 2;
            }
        }
        func main():int { return classify(0); }
    "};
    assert_eq!(run(source).unwrap(), 1);
}

#[test]
fn while_loop_accumulates() {
    let source = indoc! {"
        func main():int {
            int sum = 0;
            int i = 0;
            while (i < 5) {
                sum += i;
                i++;
            }
            return sum;
        }
    "};
    assert_eq!(run(source).unwrap(), 10);
}

#[test]
fn arithmetic_precedence_and_remainder() {
    let source = indoc! {"
        func main():int {
            return 1 + 2 * 3 + 10 % 3 + 9 / 2;
        }
    "};
    // 1 + 6 + 1 + 4
    assert_eq!(run(source).unwrap(), 12);
}

#[test]
fn prefix_and_postfix_increment_values() {
    let source = indoc! {"
        func main():int {
            int x = 5;
            int a = x++;
            int b = ++x;
            return a * 100 + b * 10 + x;
        }
    "};
    // a = 5 (old), b = 7 (new), x = 7
    assert_eq!(run(source).unwrap(), 577);
}

#[test]
fn functions_may_reference_later_definitions() {
    let source = indoc! {"
        func main():int { return helper() - 1; }
        func helper():int => 43;
    "};
    assert_eq!(run(source).unwrap(), 42);
}

#[test]
fn bool_returns_and_conditions() {
    let source = indoc! {"
        func positive(x:int):bool => x > 0;
        func main():int {
            if (positive(5)) {
                return 1;
            }
            return 0;
        }
    "};
    assert_eq!(run(source).unwrap(), 1);
}

#[test]
fn int_condition_coerces_to_nonzero_check() {
    let source = indoc! {"
        func main():int {
            int x = 3;
            if (x) {
                return 1;
            }
            return 0;
        }
    "};
    assert_eq!(run(source).unwrap(), 1);
}

#[test]
fn unary_not_and_negation() {
    let source = indoc! {"
        func main():int {
            int x = -3;
            if (!(x > 0)) {
                return 0 - x;
            }
            return 0;
        }
    "};
    assert_eq!(run(source).unwrap(), 3);
}

#[test]
fn void_function_gets_implicit_return() {
    let source = indoc! {"
        func noop() { int x = 1; x += 1; }
        func main():int {
            noop();
            return 7;
        }
    "};
    assert_eq!(run(source).unwrap(), 7);
}

#[test]
fn bare_return_exits_a_void_function_early() {
    let source = indoc! {"
        int g = 0;
        func bump() {
            g += 1;
            return;
        }
        func main():int {
            bump();
            bump();
            return g;
        }
    "};
    assert_eq!(run(source).unwrap(), 2);
}

#[test]
fn global_initializer_constant_folds() {
    let source = indoc! {"
        int g = 2 * 3 + 4;
        func main():int { return g; }
    "};
    assert_eq!(run(source).unwrap(), 10);
}

// ── semantic failures ───────────────────────────────────────────────

#[test]
fn undefined_variable_is_named_in_diagnostic() {
    let err = run("func main():int { return x; }").unwrap_err();
    assert_eq!(err.phase, Phase::Codegen);
    assert!(err.message.contains("undefined variable: 'x'"), "{}", err.message);
}

#[test]
fn undefined_function_is_named_in_diagnostic() {
    let err = run("func main():int { return missing(); }").unwrap_err();
    assert_eq!(err.phase, Phase::Codegen);
    assert!(err.message.contains("undefined function: 'missing'"), "{}", err.message);
}

#[test]
fn missing_return_names_the_function() {
    let source = indoc! {"
        func f():int { int x = 1; }
        func main():int { return f(); }
    "};
    let err = run(source).unwrap_err();
    assert_eq!(err.phase, Phase::Codegen);
    assert!(err.message.contains("'f'"), "{}", err.message);
    assert!(err.message.contains("return"), "{}", err.message);
}

#[test]
fn block_scope_ends_at_closing_brace() {
    let source = indoc! {"
        func main():int {
            if (1 < 2) {
                int inner = 5;
                inner += 1;
            }
            return inner;
        }
    "};
    let err = run(source).unwrap_err();
    assert!(err.message.contains("undefined variable: 'inner'"), "{}", err.message);
}

#[test]
fn declared_type_is_enforced() {
    let err = run("func main():int { int x = true; return 0; }").unwrap_err();
    assert_eq!(err.phase, Phase::Codegen);
    assert!(err.message.contains("declared int"), "{}", err.message);
}

#[test]
fn call_argument_types_are_enforced() {
    let source = indoc! {"
        func id(a:int):int => a;
        func main():int { return id(true); }
    "};
    let err = run(source).unwrap_err();
    assert_eq!(err.phase, Phase::Codegen);
    assert!(err.message.contains("call to 'id'"), "{}", err.message);
    assert!(err.message.contains("declared int"), "{}", err.message);
}

#[test]
fn unary_minus_rejects_bool_operand() {
    let err = run("func main():int { return -true; }").unwrap_err();
    assert_eq!(err.phase, Phase::Codegen);
    assert!(err.message.contains("unary '-'"), "{}", err.message);
}

#[test]
fn non_constant_global_initializer_is_rejected() {
    let source = indoc! {"
        int g = f();
        func f():int => 1;
        func main():int { return g; }
    "};
    let err = run(source).unwrap_err();
    assert!(err.message.contains("constant expression"), "{}", err.message);
}

#[test]
fn wrong_arity_call_is_rejected() {
    let source = indoc! {"
        func add(a:int, b:int):int => a + b;
        func main():int { return add(1); }
    "};
    let err = run(source).unwrap_err();
    assert!(err.message.contains("expects 2 argument(s)"), "{}", err.message);
}

#[test]
fn main_signature_is_enforced() {
    let err = run("func main() { return; }").unwrap_err();
    assert!(err.message.contains("'main'"), "{}", err.message);
}

// ── emitted IR shape ────────────────────────────────────────────────

#[test]
fn printf_is_declared_variadic_once() {
    let source = indoc! {r#"
        func main():int {
            printf("a: %d\n", 1);
            printf("b: %d\n", 2);
            return 0;
        }
    "#};
    let ir = compile_ir(source).unwrap();
    assert_eq!(ir.matches("declare i32 @printf(ptr, ...)").count(), 1, "{ir}");
}

#[test]
fn locals_are_hoisted_to_the_entry_block() {
    let source = indoc! {"
        func main():int {
            int i = 0;
            while (i < 3) {
                int inside = i * 2;
                i += inside + 1;
            }
            return i;
        }
    "};
    let ir = compile_ir(source).unwrap();

    // Both allocas must sit in the entry block, before the first branch.
    let entry = ir
        .split("entry:")
        .nth(1)
        .and_then(|rest| rest.split("while_cond:").next())
        .expect("IR has an entry block followed by the loop header");
    assert_eq!(entry.matches("alloca").count(), 2, "{ir}");
    assert_eq!(ir.matches("alloca").count(), 2, "{ir}");
}

#[test]
fn string_global_is_emitted_as_constant_data() {
    let source = indoc! {r#"
        string greeting = "hi";
        func main():int {
            printf(greeting);
            return 0;
        }
    "#};
    let ir = compile_ir(source).unwrap();
    assert!(ir.contains("@greeting.str"), "{ir}");
}
