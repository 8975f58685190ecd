#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::{fmt, num::NonZeroU32, str::FromStr};

#[macro_use]
mod macros;

mod opts;
pub use opts::{ConfigEntry, Opts};

mod utils;

/// The current version of the compiler.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

str_enum! {
    /// Backend stage.
    ///
    /// Used both to tag diagnostics and to stop the pipeline early.
    #[derive(strum::EnumIs)]
    #[strum(serialize_all = "lowercase")]
    pub enum Stage {
        /// AST constant folding and propagation.
        #[strum(to_string = "optimization", serialize = "optimized")]
        Optimization,
        /// Lowering of the AST into the three-address IR.
        #[strum(to_string = "generation", serialize = "ir")]
        Generation,
        /// Liveness analysis and register allocation.
        #[strum(to_string = "allocation", serialize = "regalloc")]
        Allocation,
        /// Jasmin emission.
        #[strum(to_string = "backend", serialize = "jasmin")]
        Backend,
    }
}

str_enum! {
    /// Type of output for the compiler to emit.
    #[derive(strum::EnumIs)]
    #[strum(serialize_all = "kebab-case")]
    pub enum EmitKind {
        /// The optimized AST, printed as an indented tree.
        Ast,
        /// The three-address IR.
        Ir,
        /// Jasmin assembly.
        Jasmin,
    }
}

impl EmitKind {
    /// Returns the file extension used when writing this output to disk.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Ast => "ast",
            Self::Ir => "ollir",
            Self::Jasmin => "j",
        }
    }
}

/// Errors produced while reading configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value `{value}` for `{key}`: expected a boolean")]
    InvalidBool { key: &'static str, value: String },
    #[error("invalid value `{value}` for `{key}`: {source}")]
    InvalidInt {
        key: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("invalid register budget {0}: expected -1, 0 or a positive number")]
    InvalidRegisterBudget(i64),
    #[error("malformed configuration entry `{0}`: missing '='")]
    MissingEquals(String),
}

/// How the register allocator runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RegisterAllocation {
    /// Slots are taken directly from the symbol table numbering. Spelled `-1`.
    #[default]
    Disabled,
    /// Liveness and coloring run and report the registers used, without a cap. Spelled `0`.
    Unbounded,
    /// Coloring must fit in the given number of registers.
    Bounded(NonZeroU32),
}

impl RegisterAllocation {
    /// Converts the raw integer used by configuration maps.
    pub fn from_raw(raw: i64) -> Result<Self, ConfigError> {
        match raw {
            -1 => Ok(Self::Disabled),
            0 => Ok(Self::Unbounded),
            n if n > 0 => u32::try_from(n)
                .ok()
                .and_then(NonZeroU32::new)
                .map(Self::Bounded)
                .ok_or(ConfigError::InvalidRegisterBudget(n)),
            n => Err(ConfigError::InvalidRegisterBudget(n)),
        }
    }

    /// Returns the raw integer representation.
    pub fn to_raw(self) -> i64 {
        match self {
            Self::Disabled => -1,
            Self::Unbounded => 0,
            Self::Bounded(n) => n.get() as i64,
        }
    }

    /// Returns `true` if the allocator runs at all.
    #[inline]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Returns the register cap, if any.
    #[inline]
    pub fn budget(self) -> Option<u32> {
        match self {
            Self::Bounded(n) => Some(n.get()),
            Self::Disabled | Self::Unbounded => None,
        }
    }
}

impl fmt::Display for RegisterAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_raw().fmt(f)
    }
}

impl FromStr for RegisterAllocation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().parse::<i64>().map_err(|source| ConfigError::InvalidInt {
            key: CompilerConfig::REGISTER_ALLOCATION_KEY,
            value: s.to_string(),
            source,
        })?;
        Self::from_raw(raw)
    }
}

/// Options consumed by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Runs the constant folding and propagation loop before lowering.
    pub optimize: bool,
    /// Register allocator mode.
    pub register_allocation: RegisterAllocation,
}

impl CompilerConfig {
    /// Key of the `optimize` flag.
    pub const OPTIMIZE_KEY: &'static str = "optimize";
    /// Key of the register budget.
    pub const REGISTER_ALLOCATION_KEY: &'static str = "registerAllocation";

    /// Builds a configuration from `key = value` pairs.
    ///
    /// Missing keys keep their defaults and unknown keys are ignored, since the same map usually
    /// carries options for other compiler stages.
    pub fn from_map<'a, I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();
        for (key, value) in entries {
            config.set(key, value)?;
        }
        Ok(config)
    }

    /// Sets a single option. Returns `Ok(false)` if the key is not a backend option.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool, ConfigError> {
        match key {
            Self::OPTIMIZE_KEY => {
                self.optimize = utils::parse_bool(value).ok_or_else(|| {
                    ConfigError::InvalidBool { key: Self::OPTIMIZE_KEY, value: value.to_string() }
                })?;
            }
            Self::REGISTER_ALLOCATION_KEY => self.register_allocation = value.parse()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_enum() {
        for &value in EmitKind::ALL {
            let s = value.to_str();
            assert_eq!(value.to_string(), s);
            assert_eq!(value, s.parse().unwrap());

            let json_s = format!("\"{value}\"");
            assert_eq!(serde_json::to_string(&value).unwrap(), json_s);
            assert_eq!(serde_json::from_str::<EmitKind>(&json_s).unwrap(), value);
        }
    }

    #[test]
    fn stage_aliases() {
        assert_eq!("ir".parse::<Stage>().unwrap(), Stage::Generation);
        assert_eq!("jasmin".parse::<Stage>().unwrap(), Stage::Backend);
        assert_eq!(Stage::Allocation.to_str(), "allocation");
    }

    #[test]
    fn defaults() {
        let config = CompilerConfig::from_map([]).unwrap();
        assert!(!config.optimize);
        assert_eq!(config.register_allocation, RegisterAllocation::Disabled);
    }

    #[test]
    fn from_map() {
        let config = CompilerConfig::from_map([
            ("inputFile", "Foo.jmm"),
            ("optimize", "true"),
            ("registerAllocation", "3"),
        ])
        .unwrap();
        assert!(config.optimize);
        assert_eq!(config.register_allocation.budget(), Some(3));

        let unbounded = CompilerConfig::from_map([("registerAllocation", "0")]).unwrap();
        assert!(unbounded.register_allocation.is_enabled());
        assert_eq!(unbounded.register_allocation.budget(), None);
    }

    #[test]
    fn invalid_values() {
        let err = CompilerConfig::from_map([("optimize", "maybe")]).unwrap_err();
        assert_eq!(err.to_string(), "invalid value `maybe` for `optimize`: expected a boolean");

        let err = CompilerConfig::from_map([("registerAllocation", "-2")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegisterBudget(-2)));

        let err = CompilerConfig::from_map([("registerAllocation", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInt { .. }));
    }
}
