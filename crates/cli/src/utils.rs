//! Utility functions used by the jmmc CLI.

use jmmc_interface::diagnostics::DiagCtxt;

/// Where log lines go.
#[derive(Default)]
pub enum LogDestination {
    Stdout,
    /// Keeps stdout free for compiler outputs.
    #[default]
    Stderr,
}

#[cfg(feature = "tracing")]
impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogDestination {
    type Writer = Box<dyn std::io::Write>;

    fn make_writer(&'a self) -> Self::Writer {
        match self {
            Self::Stdout => Box::new(std::io::stdout().lock()),
            Self::Stderr => Box::new(std::io::stderr().lock()),
        }
    }
}

/// Initializes the tracing logger from `RUST_LOG`.
pub fn init_logger(dst: LogDestination) {
    #[cfg(not(feature = "tracing"))]
    {
        let _ = dst;
        if std::env::var_os("RUST_LOG").is_some() {
            let msg = "`RUST_LOG` is set, but \"tracing\" support was not enabled at compile time";
            DiagCtxt::with_stderr_emitter(Default::default()).warn(msg).emit();
        }
    }

    #[cfg(feature = "tracing")]
    if let Err(e) = try_init_logger(dst) {
        let _ = DiagCtxt::with_stderr_emitter(Default::default()).fatal(e).emit();
    }
}

#[cfg(feature = "tracing")]
fn try_init_logger(dst: LogDestination) -> Result<(), String> {
    use tracing_subscriber::prelude::*;

    tracing_subscriber::Registry::default()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(dst))
        .try_init()
        .map_err(|e| e.to_string())
}
