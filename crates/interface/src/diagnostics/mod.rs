//! Diagnostics implementation.
//!
//! Modeled after [`rustc_errors`](https://github.com/rust-lang/rust/blob/master/compiler/rustc_errors/src/diagnostic.rs),
//! without source spans: backend diagnostics are attributed to a [`Stage`] and, where relevant,
//! a method name carried in the message.

use jmmc_config::Stage;
use std::{borrow::Cow, fmt};

mod builder;
pub use builder::{DiagBuilder, EmissionGuarantee};

mod context;
pub use context::DiagCtxt;

mod emitter;
pub use emitter::{DynEmitter, Emitter, HumanEmitter, InMemoryEmitter, SilentEmitter};

/// Useful type to use with [`Result`] indicate that an error has already been reported to the user,
/// so no need to continue checking.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ErrorGuaranteed(());

impl ErrorGuaranteed {
    /// Creates a new `ErrorGuaranteed`.
    ///
    /// Use of this method is discouraged; emit a diagnostic through a [`DiagCtxt`] instead.
    #[inline]
    #[deprecated = "use `dcx.err(...).emit()` instead"]
    pub const fn new_unchecked() -> Self {
        Self(())
    }
}

/// Diagnostic message.
pub type DiagMsg = Cow<'static, str>;

/// Diagnostic level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// An error that aborts the compilation unit, such as an unsupported construct reaching the
    /// backend.
    Fatal,

    /// An error that fails the current item but lets the rest of the unit continue, such as a
    /// method that does not fit in its register budget.
    Error,

    /// A warning. Does not prevent compilation from finishing.
    Warning,

    /// A message giving additional context.
    Note,

    /// A message suggesting how to fix something.
    Help,
}

impl Level {
    /// Returns the string representation of the level.
    pub fn to_str(self) -> &'static str {
        match self {
            Self::Fatal | Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
            Self::Help => "help",
        }
    }

    /// Returns whether this level is an error.
    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, Self::Fatal | Self::Error)
    }

    /// Returns the style of this level.
    pub const fn style(self) -> anstyle::Style {
        anstyle::Style::new().bold().fg_color(Some(anstyle::Color::Ansi(self.ansi_color())))
    }

    const fn ansi_color(self) -> anstyle::AnsiColor {
        match self {
            Self::Fatal | Self::Error => anstyle::AnsiColor::BrightRed,
            Self::Warning => anstyle::AnsiColor::BrightYellow,
            Self::Note => anstyle::AnsiColor::BrightGreen,
            Self::Help => anstyle::AnsiColor::BrightCyan,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A "sub"-diagnostic attached to a parent diagnostic.
/// For example, a note attached to an error.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubDiagnostic {
    pub level: Level,
    pub msg: DiagMsg,
}

/// A diagnostic.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diag {
    pub(crate) level: Level,
    pub stage: Option<Stage>,
    pub msg: DiagMsg,
    pub children: Vec<SubDiagnostic>,
}

impl Diag {
    /// Creates a new `Diag` with a single message.
    pub fn new(level: Level, msg: impl Into<DiagMsg>) -> Self {
        Self { level, stage: None, msg: msg.into(), children: Vec::new() }
    }

    /// Returns whether this diagnostic is an error.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.level.is_error()
    }

    /// Returns the level of this diagnostic.
    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Sets the stage that produced this diagnostic.
    pub fn stage(&mut self, stage: Stage) -> &mut Self {
        self.stage = Some(stage);
        self
    }

    /// Add a note to this diagnostic.
    pub fn note(&mut self, msg: impl Into<DiagMsg>) -> &mut Self {
        self.sub(Level::Note, msg)
    }

    /// Add a help message attached to this diagnostic.
    pub fn help(&mut self, msg: impl Into<DiagMsg>) -> &mut Self {
        self.sub(Level::Help, msg)
    }

    fn sub(&mut self, level: Level, msg: impl Into<DiagMsg>) -> &mut Self {
        self.children.push(SubDiagnostic { level, msg: msg.into() });
        self
    }
}

/// Plain-text rendering, without colors.
impl fmt::Display for Diag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        emitter::human::write_diag(f, self, false)
    }
}
