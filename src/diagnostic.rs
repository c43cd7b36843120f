use std::io::Write;

use crate::error::GenError;
use crate::span::Span;

/// A generator diagnostic (error or warning) about a manifest.
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

    /// A generation error, labelled at the first mention of the offending
    /// name in the manifest text. Instantiation context becomes notes.
    pub fn from_gen_error(err: &GenError, manifest: &str) -> Self {
        let mut notes = Vec::new();
        let mut current = err;
        while let GenError::Instantiation {
            backend,
            skeleton,
            function,
            varity,
            harity,
            source,
        } = current
        {
            notes.push(format!(
                "while generating {} {} for '{}' (Varity {}, Harity {})",
                backend, skeleton, function, varity, harity
            ));
            current = source;
        }

        let culprit = match current {
            GenError::UnknownFunction(name)
            | GenError::TypeCycle(name)
            | GenError::RecursiveCall(name) => Some(name),
            GenError::ShapeMismatch { function, .. }
            | GenError::ReservedName { function, .. }
            | GenError::DuplicateParam { function, .. } => Some(function),
            GenError::UnknownUserType { name, .. } => Some(name),
            GenError::DisallowedCall { callee, .. } => Some(callee),
            GenError::InvalidIdentifier { name, .. } => Some(name),
            _ => None,
        };
        let span = culprit
            .and_then(|name| locate(manifest, name))
            .unwrap_or_else(Span::dummy);

        let mut diag = Diagnostic::error(current.to_string(), span);
        diag.notes = notes;
        if let GenError::DisallowedCall { .. } = current {
            diag = diag.with_help("add the function to `--fnames` to allow it".to_string());
        }
        diag
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::Source;

        if let Err(e) = self
            .report(filename, true)
            .eprint((filename, Source::from(source)))
        {
            eprintln!("error: {}: {}", self.message, e);
        }
    }

    /// Render without colors into `out`.
    pub fn write_to(&self, filename: &str, source: &str, out: &mut impl Write) -> std::io::Result<()> {
        use ariadne::Source;

        self.report(filename, false)
            .write((filename, Source::from(source)), out)
    }

    fn report<'a>(
        &'a self,
        filename: &'a str,
        color: bool,
    ) -> ariadne::Report<'a, (&'a str, std::ops::Range<usize>)> {
        use ariadne::{Color, Config, Label, Report, ReportKind};

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let label_color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let mut report = Report::build(kind, filename, self.span.start as usize)
            .with_config(Config::default().with_color(color))
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.start as usize..self.span.end as usize))
                    .with_message(&self.message)
                    .with_color(label_color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        report.finish()
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}

/// Span of the first quoted occurrence of `name` in `source`.
fn locate(source: &str, name: &str) -> Option<Span> {
    let quoted = format!("\"{}\"", name);
    let start = source.find(&quoted)? + 1;
    Some(Span::new(0, start as u32, (start + name.len()) as u32))
}
