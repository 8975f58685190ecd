use super::{Diag, Emitter, io_panic};
use crate::diagnostics::Level;
use anstream::{AutoStream, ColorChoice};
use anstyle::{AnsiColor, Style};
use std::{
    fmt,
    io::{self, Write},
    sync::OnceLock,
};

type Writer = dyn Write + Send + 'static;

const HEADER_MSG: Style = Style::new().bold();
const GUTTER: Style =
    Style::new().bold().fg_color(Some(anstyle::Color::Ansi(AnsiColor::BrightBlue)));

/// Diagnostic emitter that emits to an arbitrary [`io::Write`] writer in human-readable format.
///
/// ```text
/// error[allocation]: method `foo` needs 3 registers but only 2 are available
///   = note: `-r 0` reports the registers a method uses without a cap
/// ```
pub struct HumanEmitter {
    writer: AutoStream<Box<Writer>>,
}

impl Emitter for HumanEmitter {
    fn emit_diagnostic(&mut self, diagnostic: &mut Diag) {
        let color = self.supports_color();
        let mut s = String::new();
        // Formatting into a `String` cannot fail.
        let _ = write_diag(&mut s, diagnostic, color);
        self.writer
            .write_all(s.as_bytes())
            .and_then(|()| self.writer.flush())
            .unwrap_or_else(|e| io_panic(e));
    }

    fn supports_color(&self) -> bool {
        match self.writer.current_choice() {
            ColorChoice::AlwaysAnsi | ColorChoice::Always => true,
            ColorChoice::Auto | ColorChoice::Never => false,
        }
    }
}

impl HumanEmitter {
    /// Creates a new `HumanEmitter` that writes to given writer.
    ///
    /// Note that a color choice of `Auto` will be treated as `Never` because the writer opaque
    /// at this point.
    pub fn new<W: Write + Send + 'static>(writer: W, color: ColorChoice) -> Self {
        Self { writer: AutoStream::new(Box::new(writer), color) }
    }

    /// Creates a new `HumanEmitter` that writes to stderr.
    pub fn stderr(color_choice: ColorChoice) -> Self {
        // `io::Stderr` is not buffered.
        Self::new(io::BufWriter::new(io::stderr()), stderr_choice(color_choice))
    }
}

fn stderr_choice(color_choice: ColorChoice) -> ColorChoice {
    static AUTO: OnceLock<ColorChoice> = OnceLock::new();
    if color_choice == ColorChoice::Auto {
        *AUTO.get_or_init(|| AutoStream::choice(&io::stderr()))
    } else {
        color_choice
    }
}

/// Renders a diagnostic: a header line followed by one indented line per sub-diagnostic.
pub(crate) fn write_diag(w: &mut impl fmt::Write, diag: &Diag, color: bool) -> fmt::Result {
    let paint = |style: Style| if color { style } else { Style::new() };

    let level = paint(diag.level.style());
    write!(w, "{level}{}", diag.level)?;
    if let Some(stage) = diag.stage {
        write!(w, "[{stage}]")?;
    }
    write!(w, "{level:#}")?;
    let header = paint(HEADER_MSG);
    writeln!(w, "{header}: {}{header:#}", diag.msg)?;

    let gutter = paint(GUTTER);
    for child in &diag.children {
        let level = paint(Level::style(child.level));
        writeln!(w, "  {gutter}={gutter:#} {level}{}{level:#}: {}", child.level, child.msg)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmmc_config::Stage;
    use snapbox::{assert_data_eq, str};

    #[test]
    fn plain_rendering() {
        let mut diag =
            Diag::new(Level::Error, "method `foo` needs 3 registers but only 2 are available");
        diag.stage(Stage::Allocation).note("no variables were renumbered");
        assert_data_eq!(
            diag.to_string().trim_end(),
            str![[r#"
error[allocation]: method `foo` needs 3 registers but only 2 are available
  = note: no variables were renumbered"#]]
        );
    }

    #[test]
    fn without_stage() {
        let diag = Diag::new(Level::Warning, "nothing to emit");
        assert_data_eq!(diag.to_string().trim_end(), str!["warning: nothing to emit"]);
    }

    #[test]
    fn colored_header() {
        let mut out = String::new();
        write_diag(&mut out, &Diag::new(Level::Fatal, "boom"), true).unwrap();
        assert!(out.starts_with(&Level::Fatal.style().render().to_string()));
        assert!(out.contains("error"));
    }
}
