use super::{
    Diag, DiagBuilder, DiagMsg, DynEmitter, EmissionGuarantee, ErrorGuaranteed, HumanEmitter,
    InMemoryEmitter, Level, SilentEmitter,
};
use anstream::ColorChoice;
use jmmc_data_structures::sync::{Lock, RwLock};
use std::sync::Arc;

/// A handler deals with errors and other compiler output.
///
/// Diagnostics are counted and forwarded to the emitter as soon as they are emitted.
pub struct DiagCtxt {
    inner: Lock<DiagCtxtInner>,
}

struct DiagCtxtInner {
    emitter: Box<DynEmitter>,

    /// The number of errors that have been emitted, fatal ones included.
    err_count: usize,
    warn_count: usize,

    can_emit_warnings: bool,
}

impl DiagCtxt {
    /// Creates a new `DiagCtxt` with the given diagnostics emitter.
    pub fn new(emitter: Box<DynEmitter>) -> Self {
        Self {
            inner: Lock::new(DiagCtxtInner {
                emitter,
                err_count: 0,
                warn_count: 0,
                can_emit_warnings: true,
            }),
        }
    }

    /// Creates a new `DiagCtxt` with a stderr emitter.
    pub fn with_stderr_emitter(color: ColorChoice) -> Self {
        Self::new(Box::new(HumanEmitter::stderr(color)))
    }

    /// Creates a new `DiagCtxt` with an in-memory emitter, returning the buffer it writes to.
    pub fn with_buffer_emitter() -> (Self, Arc<RwLock<Vec<Diag>>>) {
        let (emitter, buffer) = InMemoryEmitter::new();
        (Self::new(Box::new(emitter)), buffer)
    }

    /// Creates a new `DiagCtxt` with a silent emitter.
    pub fn with_silent_emitter() -> Self {
        Self::new(Box::new(SilentEmitter)).disable_warnings()
    }

    /// Disables emitting warnings.
    pub fn disable_warnings(mut self) -> Self {
        self.inner.get_mut().can_emit_warnings = false;
        self
    }

    /// Emits the given diagnostic with this context.
    ///
    /// Returns a guarantee if the diagnostic is an error.
    pub fn emit_diagnostic(&self, diagnostic: Diag) -> Option<ErrorGuaranteed> {
        self.inner.lock().emit_diagnostic(diagnostic)
    }

    /// Returns the number of errors that have been emitted.
    #[inline]
    pub fn err_count(&self) -> usize {
        self.inner.lock().err_count
    }

    /// Returns the number of warnings that have been emitted.
    #[inline]
    pub fn warn_count(&self) -> usize {
        self.inner.lock().warn_count
    }

    /// Returns `Err` if any errors have been emitted.
    pub fn has_errors(&self) -> Result<(), ErrorGuaranteed> {
        if self.inner.lock().err_count > 0 {
            #[allow(deprecated)]
            Err(ErrorGuaranteed::new_unchecked())
        } else {
            Ok(())
        }
    }
}

/// Diagnostic constructors.
impl DiagCtxt {
    /// Creates a builder at the given `level` with the given `msg`.
    pub fn diag<G: EmissionGuarantee>(
        &self,
        level: Level,
        msg: impl Into<DiagMsg>,
    ) -> DiagBuilder<'_, G> {
        DiagBuilder::new(self, level, msg)
    }

    /// Creates a builder at the `Fatal` level with the given `msg`.
    pub fn fatal(&self, msg: impl Into<DiagMsg>) -> DiagBuilder<'_, ErrorGuaranteed> {
        self.diag(Level::Fatal, msg)
    }

    /// Creates a builder at the `Error` level with the given `msg`.
    pub fn err(&self, msg: impl Into<DiagMsg>) -> DiagBuilder<'_, ErrorGuaranteed> {
        self.diag(Level::Error, msg)
    }

    /// Creates a builder at the `Warning` level with the given `msg`.
    ///
    /// Attempting to `.emit()` the builder will only emit if `can_emit_warnings` is `true`.
    pub fn warn(&self, msg: impl Into<DiagMsg>) -> DiagBuilder<'_, ()> {
        self.diag(Level::Warning, msg)
    }

    /// Creates a builder at the `Note` level with the given `msg`.
    pub fn note(&self, msg: impl Into<DiagMsg>) -> DiagBuilder<'_, ()> {
        self.diag(Level::Note, msg)
    }
}

impl DiagCtxtInner {
    fn emit_diagnostic(&mut self, mut diagnostic: Diag) -> Option<ErrorGuaranteed> {
        if diagnostic.level == Level::Warning && !self.can_emit_warnings {
            return None;
        }

        trace!(
            level = %diagnostic.level,
            stage = ?diagnostic.stage,
            msg = %diagnostic.msg,
            "emitting diagnostic"
        );
        self.emitter.emit_diagnostic(&mut diagnostic);

        if diagnostic.is_error() {
            self.err_count += 1;
            #[allow(deprecated)]
            Some(ErrorGuaranteed::new_unchecked())
        } else {
            if diagnostic.level == Level::Warning {
                self.warn_count += 1;
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmmc_config::Stage;

    #[test]
    fn counts_and_buffers() {
        let (dcx, buffer) = DiagCtxt::with_buffer_emitter();
        assert!(dcx.has_errors().is_ok());

        dcx.warn("unused variable `x`").emit();
        let _guar = dcx
            .err("method `foo` needs 3 registers")
            .stage(Stage::Allocation)
            .note("only 2 are available")
            .emit();

        assert_eq!(dcx.err_count(), 1);
        assert_eq!(dcx.warn_count(), 1);
        assert!(dcx.has_errors().is_err());

        let diags = buffer.read();
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[1].stage, Some(Stage::Allocation));
        assert_eq!(diags[1].children.len(), 1);
    }

    #[test]
    fn disabled_warnings() {
        let (dcx, buffer) = DiagCtxt::with_buffer_emitter();
        let dcx = dcx.disable_warnings();
        dcx.warn("ignored").emit();
        assert_eq!(dcx.warn_count(), 0);
        assert!(buffer.read().is_empty());
    }

    #[test]
    fn fatal_is_an_error() {
        let dcx = DiagCtxt::with_silent_emitter();
        let _guar = dcx.fatal("unsupported node `Foo`").emit();
        assert_eq!(dcx.err_count(), 1);
    }
}
