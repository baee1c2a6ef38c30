pub mod span;
pub mod diagnostics;
pub mod config;
pub mod ir;
pub mod js;
pub mod lower;
pub mod typetest;

pub use config::EmitOptions;
pub use diagnostics::CompileError;

use tracing::debug;

/// Lower an IR program to the target AST without synthesizing predicates.
/// The returned required set names every predicate the lowered code calls.
pub fn lower(program: &ir::Program, options: &EmitOptions) -> Result<lower::Lowered, CompileError> {
    let defs = program.type_defs();
    lower::lower_program(program, &defs, options)
}

/// Lower an IR program and prepend the synthesized type-test predicates
/// (lower → synthesize → assemble).
pub fn compile(program: &ir::Program, options: &EmitOptions) -> Result<js::Program, CompileError> {
    let defs = program.type_defs();
    let lowered = lower::lower_program(program, &defs, options)?;
    let predicates = typetest::synthesize(&lowered.required, &defs, options)?;
    debug!(
        decls = lowered.program.decls.len(),
        required = lowered.required.len(),
        predicates = predicates.len(),
        "compiled program"
    );

    let mut decls = predicates;
    decls.extend(lowered.program.decls);
    Ok(js::Program { decls })
}

/// Compile an IR program to target source text.
pub fn compile_to_string(program: &ir::Program, options: &EmitOptions) -> Result<String, CompileError> {
    let output = compile(program, options)?;
    Ok(js::render(&output, options))
}

/// Compile a JSON hand-off document to target source text.
pub fn compile_json(source: &str, options: &EmitOptions) -> Result<String, CompileError> {
    let program = ir::Program::from_json(source)?;
    compile_to_string(&program, options)
}
