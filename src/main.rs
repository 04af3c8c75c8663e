//! Ember compiler driver.
//!
//! Usage:
//!   ember <file.em>                  # compile and JIT-execute in-process
//!   ember <file.em> -o prog         # emit IR and link a native binary
//!   ember <file.em> --print-ir      # also dump the LLVM IR to stdout
//!   ember <file.em> --optimize      # run LLVM's default pipeline first
//!
//! Pipeline:  source → lexer → parser → AST → LLVM IR → JIT / native binary
//!
//! Exit code 0 on full success; 1 on any lex/parse/codegen/backend
//! failure. In JIT mode the process exits with `main`'s result, like a
//! natively compiled run would.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use ember::compiler::{linker, Compiler};
use ember::errors::{self, CompileError, Phase, Result};
use ember::parser::Parser;

struct Options {
    source_path: PathBuf,
    output: Option<PathBuf>,
    optimize: bool,
    print_ir: bool,
}

fn parse_args() -> Result<Options> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut source_path = None;
    let mut output = None;
    let mut optimize = false;
    let mut print_ir = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" => {
                let path = iter.next().ok_or_else(|| {
                    CompileError::new(Phase::Driver, "expected output path after -o")
                })?;
                output = Some(PathBuf::from(path));
            }
            "--optimize" | "-O" => optimize = true,
            "--print-ir" | "-p" => print_ir = true,
            other if other.starts_with('-') => {
                return Err(CompileError::new(
                    Phase::Driver,
                    format!("unknown option: {other}"),
                ));
            }
            _ => source_path = Some(PathBuf::from(arg)),
        }
    }

    let source_path = source_path.ok_or_else(|| {
        CompileError::with_hint(
            Phase::Driver,
            "no input file specified",
            "usage: ember <source.em> [-o output] [--optimize|-O] [--print-ir|-p]",
        )
    })?;

    Ok(Options { source_path, output, optimize, print_ir })
}

fn run(opts: &Options) -> Result<i32> {
    let source = fs::read_to_string(&opts.source_path).map_err(|e| {
        CompileError::new(
            Phase::Driver,
            format!("could not read {}: {e}", opts.source_path.display()),
        )
    })?;

    // ── Lex + parse ─────────────────────────────────────────────
    let mut parser = Parser::new(&source)?;
    let program = parser.parse_program()?;

    // ── LLVM codegen ────────────────────────────────────────────
    let context = inkwell::context::Context::create();
    let compiler = Compiler::new(&context, "ember");
    compiler.compile(&program)?;

    if opts.optimize {
        compiler.optimize()?;
    }
    if opts.print_ir {
        print!("{}", compiler.ir_string());
    }

    match &opts.output {
        // ── Emit IR and hand it to the external toolchain ───────
        Some(output_path) => {
            let ir_path = output_path.with_extension("ll");
            compiler.write_ir_file(&ir_path)?;
            errors::info(format!("wrote IR → {}", ir_path.display()));

            linker::build_binary(&ir_path, output_path)?;
            errors::success(format!("done → {}", output_path.display()));
            Ok(0)
        }

        // ── Run in-process ──────────────────────────────────────
        None => {
            let result = compiler.run_jit()?;
            errors::info(format!("main returned {result}"));
            Ok(result)
        }
    }
}

fn main() {
    let opts = match parse_args() {
        Ok(opts) => opts,
        Err(err) => {
            errors::report(&err);
            process::exit(1);
        }
    };

    match run(&opts) {
        Ok(code) => process::exit(code),
        Err(err) => {
            errors::report(&err);
            process::exit(1);
        }
    }
}
