use std::fs;
use std::path::Path;

use crate::error::CoreError;
use crate::generator::{FunctionSymbol, Generator};
use crate::parser::parse;
use crate::runtime::Runtime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationArtifact {
    /// Complete C++ translation unit, ready for the native compiler.
    pub cpp: String,
    pub functions: Vec<FunctionSymbol>,
}

pub fn compile(source: &str, runtime: &Runtime) -> Result<CompilationArtifact, CoreError> {
    let program = parse(source)?;
    let code = Generator::new().run(&program)?;
    Ok(CompilationArtifact {
        cpp: code.render(runtime),
        functions: code.functions,
    })
}

pub fn compile_file(
    path: impl AsRef<Path>,
    runtime: &Runtime,
) -> Result<CompilationArtifact, CoreError> {
    let source = fs::read_to_string(path)?;
    compile(&source, runtime)
}
