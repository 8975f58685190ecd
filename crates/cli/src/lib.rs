#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(test, allow(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

use clap::Parser as _;
use jmmc_ast::Ast;
use jmmc_codegen::Artifacts;
use jmmc_config::{EmitKind, Opts};
use jmmc_interface::{Result, diagnostics::DiagCtxt, pluralize};
use std::{
    collections::BTreeSet,
    io::{self, Read as _, Write as _},
    path::Path,
};

pub mod utils;

/// Parses command line arguments.
pub fn parse_args<I, T>(itr: I) -> Result<Opts, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Opts::try_parse_from(itr)
}

/// Runs the compiler with diagnostics printed to stderr.
pub fn run_compiler_args(opts: Opts) -> Result<()> {
    let color = match opts.color {
        clap::ColorChoice::Always => jmmc_interface::ColorChoice::Always,
        clap::ColorChoice::Auto => jmmc_interface::ColorChoice::Auto,
        clap::ColorChoice::Never => jmmc_interface::ColorChoice::Never,
    };
    let mut dcx = DiagCtxt::with_stderr_emitter(color);
    if opts.no_warnings {
        dcx = dcx.disable_warnings();
    }
    let compiler = Compiler { dcx, opts };
    let r = compiler.run_default();
    compiler.finish_diagnostics().and(r)
}

/// One invocation of the compiler.
pub struct Compiler {
    pub dcx: DiagCtxt,
    pub opts: Opts,
}

impl Compiler {
    /// Reads the input AST, runs the backend and writes every requested output.
    pub fn run_default(&self) -> Result<()> {
        let Self { dcx, opts } = self;

        let emit = {
            let mut set = BTreeSet::new();
            for &kind in &opts.emit {
                if !set.insert(kind) {
                    return Err(dcx.err(format!("cannot specify `--emit {kind}` twice")).emit());
                }
            }
            set
        };
        let config = opts.compiler_config().map_err(|e| dcx.err(e.to_string()).emit())?;

        let source = self.read_input()?;
        let mut ast = Ast::from_json(&source).map_err(|e| {
            dcx.err(format!("invalid AST in {}", opts.input.display())).note(e.to_string()).emit()
        })?;
        let class = ast
            .class_decl()
            .and_then(|id| ast.name(id))
            .map(str::to_string)
            .map_err(|e| dcx.err(e.to_string()).emit())?;
        debug!(%class, ?config, "compiling");

        let artifacts = jmmc_codegen::compile_until(&mut ast, &config, opts.stop_after, dcx)?;
        for kind in emit {
            self.write_output(&artifacts, &class, kind)?;
        }
        Ok(())
    }

    fn read_input(&self) -> Result<String> {
        let path = &self.opts.input;
        let r = if path == Path::new("-") {
            let mut s = String::new();
            io::stdin().lock().read_to_string(&mut s).map(|_| s)
        } else {
            std::fs::read_to_string(path)
        };
        r.map_err(|e| self.dcx.err(format!("failed to read {}: {e}", path.display())).emit())
    }

    fn write_output(&self, artifacts: &Artifacts, class: &str, kind: EmitKind) -> Result<()> {
        let Some(text) = artifacts.output(kind) else {
            let stage = self.opts.stop_after.map(|s| s.to_string()).unwrap_or_default();
            self.dcx.warn(format!("no {kind} output: stopped after {stage}")).emit();
            return Ok(());
        };

        let Some(out_dir) = &self.opts.out_dir else {
            let mut stdout = io::stdout().lock();
            return writeln!(stdout, "{}", text.trim_end())
                .map_err(|e| self.dcx.err(format!("failed to write to stdout: {e}")).emit());
        };
        let path = out_dir.join(format!("{class}.{}", kind.extension()));
        std::fs::create_dir_all(out_dir)
            .and_then(|()| std::fs::write(&path, text))
            .map_err(|e| self.dcx.err(format!("failed to write {}: {e}", path.display())).emit())?;
        debug!(path = %path.display(), "wrote output");
        Ok(())
    }

    /// Prints the error summary, returning `Err` if anything failed.
    pub fn finish_diagnostics(&self) -> Result<()> {
        let count = self.dcx.err_count();
        if count > 0 {
            let msg = format!("aborting due to {count} previous error{}", pluralize!(count));
            self.dcx.note(msg).emit();
        }
        self.dcx.has_errors()
    }
}
