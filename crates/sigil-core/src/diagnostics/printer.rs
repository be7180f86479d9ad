//! Builder-pattern printer for rendering diagnostics.
//!
//! Without source text, each diagnostic renders as one plain line:
//!
//! ```text
//! <path>:<line>:<col>: <severity>[<code>]: <message>
//! ```
//!
//! With source text attached, diagnostics render as annotated snippets with
//! the offending source line underlined.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};

use super::{Diagnostics, Severity};
use crate::Interner;

/// Builder for rendering diagnostics with various options.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    interner: &'s Interner,
    source: Option<&'s str>,
    colored: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics, interner: &'s Interner) -> Self {
        Self {
            diagnostics,
            interner,
            source: None,
            colored: false,
        }
    }

    /// Attach the source text of the file the diagnostics point into,
    /// enabling annotated snippet rendering.
    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let Some(source) = self.source else {
            return self.format_plain(w);
        };

        if self.diagnostics.is_empty() {
            return Ok(());
        }

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }

            let Some(range) = byte_range(source, diag.span.line, diag.span.col) else {
                // Span does not land in the source; fall back to the plain line.
                writeln!(w, "{}", self.plain_line(diag))?;
                continue;
            };

            let mut snippet = Snippet::source(source).line_start(1).annotation(
                AnnotationKind::Primary
                    .span(range)
                    .label(&diag.message),
            );

            if let Some(path) = diag.span.path.and_then(|p| self.interner.try_resolve(p)) {
                snippet = snippet.path(path);
            }

            let level = severity_to_level(diag.severity);
            let title_group = level.primary_title(&diag.message).element(snippet);
            let report: Vec<Group> = vec![title_group];

            write!(w, "{}", renderer.render(&report))?;
        }

        Ok(())
    }

    fn format_plain(&self, w: &mut impl Write) -> std::fmt::Result {
        for diag in self.diagnostics.iter() {
            writeln!(w, "{}", self.plain_line(diag))?;
        }
        Ok(())
    }

    fn plain_line(&self, diag: &super::Diagnostic) -> String {
        format!(
            "{}: {}[{}]: {}",
            diag.span.display(self.interner),
            diag.severity,
            diag.code.as_u32(),
            diag.message
        )
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Note => Level::NOTE,
        Severity::Warning => Level::WARNING,
        Severity::Error | Severity::Fatal => Level::ERROR,
    }
}

/// Convert a 1-based line/col into a byte range inside `source`.
fn byte_range(source: &str, line: u32, col: u32) -> Option<std::ops::Range<usize>> {
    if line == 0 {
        return None;
    }
    let line_start = if line == 1 {
        0
    } else {
        let mut seen = 1u32;
        let mut start = None;
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                seen += 1;
                if seen == line {
                    start = Some(i + 1);
                    break;
                }
            }
        }
        start?
    };

    let offset = line_start + (col.max(1) as usize - 1);
    if offset >= source.len() {
        if source.is_empty() {
            return None;
        }
        return Some(source.len() - 1..source.len());
    }
    Some(offset..offset + 1)
}
