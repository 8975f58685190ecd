//! The backend driver.

use crate::{
    AllocationReport, CodegenError, JasminEmitter, Lowerer, RegisterAllocator,
    ir::ClassUnit,
    transform::{self, OptStats},
};
use jmmc_ast::{Ast, SymbolTable};
use jmmc_config::{CompilerConfig, EmitKind, Stage};
use jmmc_interface::{Result, diagnostics::DiagCtxt};

/// Everything the backend produced for one compilation unit.
#[derive(Debug, Default)]
pub struct Artifacts {
    /// Statistics of the optimization loop, if it ran.
    pub opt_stats: Option<OptStats>,
    /// The optimized AST, rendered as a tree.
    pub ast: Option<String>,
    /// The lowered class, after register allocation.
    pub unit: Option<ClassUnit>,
    /// One report per method when the allocator ran.
    pub allocation: Vec<AllocationReport>,
    pub jasmin: Option<String>,
}

impl Artifacts {
    /// Returns the text of the given output, if the pipeline got that far.
    pub fn output(&self, kind: EmitKind) -> Option<String> {
        match kind {
            EmitKind::Ast => self.ast.clone(),
            EmitKind::Ir => self.unit.as_ref().map(ToString::to_string),
            EmitKind::Jasmin => self.jasmin.clone(),
        }
    }
}

/// Runs every stage on `ast`.
///
/// See [`compile_until`].
pub fn compile(ast: &mut Ast, config: &CompilerConfig, dcx: &DiagCtxt) -> Result<Artifacts> {
    compile_until(ast, config, None, dcx)
}

/// Runs the backend on `ast`, stopping after `stop_after` if given.
///
/// Internal errors abort the unit and are reported as fatal diagnostics. Methods that do not fit
/// in the register budget are reported as errors but still compiled with their original
/// numbering, so the returned artifacts are complete; check [`DiagCtxt::has_errors`] afterwards.
#[instrument(name = "compile", level = "debug", skip_all)]
pub fn compile_until(
    ast: &mut Ast,
    config: &CompilerConfig,
    stop_after: Option<Stage>,
    dcx: &DiagCtxt,
) -> Result<Artifacts> {
    let runs = |stage: Stage| stop_after.is_none_or(|last| stage <= last);
    let fatal = |stage: Stage, err: CodegenError| dcx.fatal(err.to_string()).stage(stage).emit();
    let mut artifacts = Artifacts::default();

    if config.optimize {
        let stats = transform::optimize(ast).map_err(|e| fatal(Stage::Optimization, e))?;
        artifacts.opt_stats = Some(stats);
    }
    artifacts.ast = Some(ast.to_tree_string(ast.root()));
    if !runs(Stage::Generation) {
        return Ok(artifacts);
    }

    let table = SymbolTable::build(ast).map_err(|e| fatal(Stage::Generation, e.into()))?;
    let mut unit =
        Lowerer::new(ast, &table).lower().map_err(|e| fatal(Stage::Generation, e))?;

    if runs(Stage::Allocation) {
        artifacts.allocation = RegisterAllocator::new(dcx, config.register_allocation)
            .run(&mut unit)
            .map_err(|e| fatal(Stage::Allocation, e))?;
    }
    if runs(Stage::Backend) {
        let jasmin = JasminEmitter::new(&unit).emit().map_err(|e| fatal(Stage::Backend, e))?;
        artifacts.jasmin = Some(jasmin);
    }
    artifacts.unit = Some(unit);
    Ok(artifacts)
}
