use miette::{Diagnostic as MietteDiagnostic, SourceSpan};
use thiserror::Error;

use crate::position::line_col_to_offset;

/// Severity of a diagnostic, per the LSP `DiagnosticSeverity` four-level model.
/// TL's own `fatal`/`verbose`/`trace` levels collapse onto these (see
/// [`Severity::from_tl_level`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

impl Severity {
    /// Maps a TL VM log level (`fatal`, `error`, `warning`, `info`, `verbose`,
    /// `trace`) onto the four LSP severities.
    pub fn from_tl_level(level: &str) -> Self {
        match level {
            "fatal" | "error" => Severity::Error,
            "warning" => Severity::Warning,
            "info" => Severity::Information,
            _ => Severity::Hint,
        }
    }
}

/// A zero-based line, zero-based column position. AST tokens carry a
/// 1-based line (see [`crate::vm::ast::Token`]); callers building a
/// diagnostic from a token must subtract 1 from its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Builds a diagnostic-ready, zero-based position from a 1-based/0-based AST token.
    pub fn from_token(token: crate::vm::ast::Token) -> Self {
        Self { line: token.line.saturating_sub(1), column: token.column }
    }
}

/// A half-open `[start, end)` source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn point(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }
}

/// A single diagnostic raised by the analyzer, one file-scoped occurrence of
/// an `L-000N` code.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: String,
    pub range: Range,
    pub message: String,
    pub severity: Severity,
    pub source: &'static str,
}

impl Diagnostic {
    pub fn new(
        code: impl Into<String>,
        range: Range,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self { code: code.into(), range, message: message.into(), severity, source: "tl" }
    }
}

/// A warning not tied to a specific file (e.g. a malformed workspace mount).
#[derive(Debug, Clone, serde::Serialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
}

/// The result of checking a single file from the `check` CLI.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: String,
    pub valid: bool,
    pub errors: Vec<Diagnostic>,
    pub skipped: bool,
    /// Whether this result represents a tool error (exit code 2) rather than
    /// a diagnostic (exit code 1).
    pub tool_error: bool,
}

impl FileResult {
    pub fn valid(path: &str) -> Self {
        Self { path: path.to_string(), valid: true, errors: vec![], skipped: false, tool_error: false }
    }

    pub fn skipped(path: &str) -> Self {
        Self { path: path.to_string(), valid: true, errors: vec![], skipped: true, tool_error: false }
    }

    pub fn invalid(path: &str, errors: Vec<Diagnostic>) -> Self {
        let valid = !errors.iter().any(|d| d.severity == Severity::Error);
        Self { path: path.to_string(), valid, errors, skipped: false, tool_error: false }
    }

    pub fn tool_error(path: &str, errors: Vec<Diagnostic>) -> Self {
        Self { path: path.to_string(), valid: false, errors, skipped: false, tool_error: true }
    }
}

/// Miette-compatible error for rendering a single diagnostic against its
/// source file in the `check` CLI's human output.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RenderableDiagnostic {
    pub message: String,
    pub src: miette::NamedSource<String>,
    pub span: Option<SourceSpan>,
    pub severity: miette::Severity,
}

impl MietteDiagnostic for RenderableDiagnostic {
    fn severity(&self) -> Option<miette::Severity> {
        Some(self.severity)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        self.span.map(|span| {
            Box::new(std::iter::once(miette::LabeledSpan::new(None, span.offset(), span.len())))
                as Box<dyn Iterator<Item = miette::LabeledSpan>>
        })
    }
}

/// A lightweight diagnostic for tool-level errors/warnings that don't have
/// source code (config load failures, workspace mount issues, and the like).
///
/// Renders through miette as:
///   × failed to read workspace folder: No such file or directory
///   ⚠ skipping mount: marker file not found
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ToolDiagnostic {
    message: String,
    severity: miette::Severity,
}

impl ToolDiagnostic {
    pub fn error(msg: impl Into<String>) -> Self {
        Self { message: msg.into(), severity: miette::Severity::Error }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self { message: msg.into(), severity: miette::Severity::Warning }
    }
}

impl MietteDiagnostic for ToolDiagnostic {
    fn severity(&self) -> Option<miette::Severity> {
        Some(self.severity)
    }
}

impl Diagnostic {
    /// Convert to a miette-renderable diagnostic, resolving the line/column
    /// range back to a byte span via the file's precomputed line starts.
    pub fn to_renderable(&self, file_path: &str, source: &str, line_starts: &[usize]) -> RenderableDiagnostic {
        let start = line_col_to_offset(line_starts, self.range.start.line + 1, self.range.start.column);
        let end = line_col_to_offset(line_starts, self.range.end.line + 1, self.range.end.column).max(start);
        let severity = match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Information | Severity::Hint => miette::Severity::Advice,
        };
        RenderableDiagnostic {
            message: format!("{}: {}", self.code, self.message),
            src: miette::NamedSource::new(file_path, source.to_owned()),
            span: Some(SourceSpan::new(start.into(), end - start)),
            severity,
        }
    }
}
