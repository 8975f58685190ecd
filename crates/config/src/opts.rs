//! jmmc CLI arguments.

use crate::{CompilerConfig, ConfigError, EmitKind, RegisterAllocation, Stage};
use std::path::PathBuf;

#[cfg(feature = "clap")]
use clap::{ColorChoice, Parser, ValueHint};

/// Optimizing backend for the jmm teaching language.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "clap", derive(Parser))]
#[cfg_attr(feature = "clap", command(
    name = "jmmc",
    version = crate::VERSION,
    arg_required_else_help = true,
))]
#[allow(clippy::manual_non_exhaustive)]
pub struct Opts {
    /// Typed AST to compile, in JSON form.
    ///
    /// `-` specifies standard input.
    #[cfg_attr(feature = "clap", arg(value_hint = ValueHint::FilePath))]
    pub input: PathBuf,

    /// Run constant folding and propagation before lowering.
    #[cfg_attr(feature = "clap", arg(long, short = 'O'))]
    pub optimize: bool,
    /// Register budget: `-1` disables allocation, `0` reports the registers used, `N` caps them.
    #[cfg_attr(
        feature = "clap",
        arg(long, short = 'r', default_value_t = -1, allow_negative_numbers = true)
    )]
    pub register_allocation: i64,
    /// Extra `key=value` configuration entries, applied after the flags above.
    #[cfg_attr(feature = "clap", arg(long = "config", short = 'c', value_name = "KEY=VALUE"))]
    pub config: Vec<ConfigEntry>,

    /// Directory to write output files. Outputs are printed to stdout if unset.
    #[cfg_attr(feature = "clap", arg(long, short = 'o', value_hint = ValueHint::DirPath))]
    pub out_dir: Option<PathBuf>,
    /// Comma separated list of types of output for the compiler to emit.
    #[cfg_attr(feature = "clap", arg(long, value_delimiter = ',', default_value = "jasmin"))]
    pub emit: Vec<EmitKind>,
    /// Stop execution after the given backend stage.
    #[cfg_attr(feature = "clap", arg(long, value_enum))]
    pub stop_after: Option<Stage>,

    /// Coloring.
    #[cfg(feature = "clap")]
    #[cfg_attr(
        feature = "clap",
        arg(help_heading = "Display options", long, value_enum, default_value = "auto")
    )]
    pub color: ColorChoice,
    /// Whether to disable warnings.
    #[cfg_attr(feature = "clap", arg(help_heading = "Display options", long))]
    pub no_warnings: bool,

    // Allows `Opts { x: y, ..Default::default() }`.
    #[doc(hidden)]
    #[cfg_attr(feature = "clap", arg(skip))]
    pub _non_exhaustive: (),
}

impl Opts {
    /// Resolves the backend configuration from the flags and the `-c` entries.
    pub fn compiler_config(&self) -> Result<CompilerConfig, ConfigError> {
        let mut config = CompilerConfig {
            optimize: self.optimize,
            register_allocation: RegisterAllocation::from_raw(self.register_allocation)?,
        };
        for entry in &self.config {
            config.set(&entry.key, &entry.value)?;
        }
        Ok(config)
    }
}

/// A single `key=value` configuration entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for ConfigEntry {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s.split_once('=').ok_or_else(|| ConfigError::MissingEquals(s.into()))?;
        Ok(Self { key: key.trim().to_string(), value: value.trim().to_string() })
    }
}
