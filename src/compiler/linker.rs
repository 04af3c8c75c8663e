//! Native binary production — hands the textual IR to an external
//! toolchain. Clang compiles `.ll` files directly and links libc, which
//! resolves the `printf` runtime function.

use std::path::Path;
use std::process::Command;

use crate::errors::{CompileError, Phase, Result};

/// Compile an LLVM IR file into a native executable at `output_path`.
pub fn build_binary(ir_path: &Path, output_path: &Path) -> Result<()> {
    let ir = ir_path.to_string_lossy();
    let out = output_path.to_string_lossy();

    let candidates: &[&str] = &["clang", "clang-18", "clang-17"];

    for cmd in candidates {
        let result = Command::new(cmd)
            .args([ir.as_ref(), "-Wno-override-module", "-o", out.as_ref()])
            .output();

        match result {
            Ok(output) if output.status.success() => return Ok(()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                eprintln!("[{cmd}] link failed:\n{stderr}");
            }
            Err(_) => continue,
        }
    }

    Err(CompileError::with_hint(
        Phase::Backend,
        "no working toolchain found to build a native binary",
        "install clang and make sure it's on your PATH",
    ))
}
