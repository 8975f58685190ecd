use super::{Diag, DiagCtxt, DiagMsg, ErrorGuaranteed, Level};
use jmmc_config::Stage;
use std::{
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

/// Trait for types that `DiagBuilder::emit` can return as a "guarantee" (or "proof") token
/// that the emission happened.
pub trait EmissionGuarantee: Sized {
    /// Implementation of `DiagBuilder::emit`, fully controlled by each `impl` of
    /// `EmissionGuarantee`, to make it impossible to create a value of `Self` without actually
    /// performing the emission.
    fn emit_producing_guarantee(db: DiagBuilder<'_, Self>) -> Self;
}

impl EmissionGuarantee for ErrorGuaranteed {
    fn emit_producing_guarantee(db: DiagBuilder<'_, Self>) -> Self {
        debug_assert!(
            db.diagnostic.is_error(),
            "emitted non-error ({:?}) diagnostic from `DiagBuilder<ErrorGuaranteed>`",
            db.diagnostic.level,
        );
        let DiagBuilder { dcx, diagnostic, .. } = db;
        dcx.emit_diagnostic(*diagnostic).unwrap_or_else(|| {
            #[allow(deprecated)]
            ErrorGuaranteed::new_unchecked()
        })
    }
}

impl EmissionGuarantee for () {
    fn emit_producing_guarantee(db: DiagBuilder<'_, Self>) -> Self {
        let DiagBuilder { dcx, diagnostic, .. } = db;
        let _ = dcx.emit_diagnostic(*diagnostic);
    }
}

/// Used for emitting structured error messages and other diagnostic information.
#[must_use = "diagnostics must be emitted"]
pub struct DiagBuilder<'a, G: EmissionGuarantee> {
    dcx: &'a DiagCtxt,
    diagnostic: Box<Diag>,
    _marker: PhantomData<G>,
}

impl<G: EmissionGuarantee> fmt::Debug for DiagBuilder<'_, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.diagnostic.fmt(f)
    }
}

impl<G: EmissionGuarantee> Deref for DiagBuilder<'_, G> {
    type Target = Diag;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.diagnostic
    }
}

impl<G: EmissionGuarantee> DerefMut for DiagBuilder<'_, G> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.diagnostic
    }
}

impl<'a, G: EmissionGuarantee> DiagBuilder<'a, G> {
    /// Creates a new `DiagBuilder`.
    pub fn new(dcx: &'a DiagCtxt, level: Level, msg: impl Into<DiagMsg>) -> Self {
        Self { dcx, diagnostic: Box::new(Diag::new(level, msg)), _marker: PhantomData }
    }

    /// Returns the [`DiagCtxt`].
    #[inline]
    pub fn dcx(&self) -> &DiagCtxt {
        self.dcx
    }

    /// Emits the diagnostic.
    pub fn emit(self) -> G {
        G::emit_producing_guarantee(self)
    }
}

/// Forwards methods to [`Diag`].
macro_rules! forward {
    (
        $(
            $(#[$attrs:meta])*
            $vis:vis fn $n:ident($($name:ident: $ty:ty),* $(,)?);
        )*
    ) => {
        $(
            $(#[$attrs])*
            #[doc = concat!("See [`Diag::", stringify!($n), "()`].")]
            $vis fn $n(mut self, $($name: $ty),*) -> Self {
                self.diagnostic.$n($($name),*);
                self
            }
        )*
    };
}

/// Forwarded methods to [`Diag`].
impl<G: EmissionGuarantee> DiagBuilder<'_, G> {
    forward! {
        pub fn stage(stage: Stage);
        pub fn note(msg: impl Into<DiagMsg>);
        pub fn help(msg: impl Into<DiagMsg>);
    }
}
