use crate::sc::CompileError;
use crate::span::Span;

/// A compiler diagnostic (error, warning, or hint).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    fn report<'a>(
        &'a self,
        filename: &'a str,
        colored: bool,
    ) -> ariadne::Report<'a, (&'a str, std::ops::Range<usize>)> {
        use ariadne::{Color, Config, Label, Report, ReportKind};

        let (kind, color) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let mut report = Report::build(kind, filename, self.span.start as usize)
            .with_config(Config::default().with_color(colored))
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.range()))
                    .with_message(&self.message)
                    .with_color(color),
            );
        for note in &self.notes {
            report = report.with_note(note);
        }
        if let Some(help) = &self.help {
            report = report.with_help(help);
        }
        report.finish()
    }

    /// Render the diagnostic to stderr using ariadne.
    ///
    /// Without source text (e.g. a job file that carries no `source`) the
    /// diagnostic degrades to a one-line `error: message`.
    pub fn render(&self, filename: &str, source: Option<&str>) {
        use ariadne::Source;

        match source {
            Some(source) if !self.span.is_dummy() => {
                if self
                    .report(filename, true)
                    .eprint((filename, Source::from(source)))
                    .is_err()
                {
                    eprintln!("{}", self.plain());
                }
            }
            _ => eprintln!("{}", self.plain()),
        }
    }

    /// Render into a string without colours.
    pub fn render_to_string(&self, filename: &str, source: &str) -> String {
        use ariadne::Source;

        let mut buf = Vec::new();
        match self
            .report(filename, false)
            .write((filename, Source::from(source)), &mut buf)
        {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.plain(),
        }
    }

    fn plain(&self) -> String {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        let mut line = format!("{}: {}", prefix, self.message);
        for note in &self.notes {
            line.push_str(&format!("\n  note: {}", note));
        }
        if let Some(help) = &self.help {
            line.push_str(&format!("\n  help: {}", help));
        }
        line
    }
}

impl From<&CompileError> for Diagnostic {
    fn from(err: &CompileError) -> Self {
        Diagnostic::error(err.message.clone(), err.span).with_note(format!("{}", err.kind))
    }
}

impl From<CompileError> for Diagnostic {
    fn from(err: CompileError) -> Self {
        Diagnostic::from(&err)
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: Option<&str>) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}
