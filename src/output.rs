//! Human and JSON renderers for the `check` CLI's batch results. Adapted
//! from a dual-format `run_check` renderer, with the schema/cache-specific
//! fields (there is no schema cache in this crate) stripped and
//! `Diagnostic`'s line/column range substituted for a byte-offset
//! `JsonLocation`.

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use owo_colors::Stream::Stderr;
use owo_colors::{OwoColorize, Style};
use serde::Serialize;

use crate::diagnostic::{FileResult, Severity, ToolDiagnostic, Warning};
use crate::position::compute_line_starts;

/// Summary statistics for a `check` run.
pub struct Summary {
    pub checked_files: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
    pub skipped_files: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub duration: Duration,
    pub jobs: usize,
    pub has_tool_error: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Human,
    Json,
}

fn plural(n: usize, singular: &str, plural_form: &str) -> String {
    if n == 1 { format!("{n} {singular}") } else { format!("{n} {plural_form}") }
}

fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        let secs = d.as_secs_f64();
        if secs < 10.0 { format!("{secs:.1}s") } else { format!("{}s", secs.round() as u64) }
    }
}

/// Write a verbose diagnostic message to stderr with dimmed styling.
pub fn verbose_log(stderr: &mut impl Write, msg: &str) {
    let line = format!("[verbose] {msg}");
    let _ = writeln!(stderr, "{}", line.if_supports_color(Stderr, |text| text.dimmed()));
}

/// Render results in human format using miette, given each checked file's
/// source text (needed to resolve a line/column range back to a byte span).
pub fn render_human(
    results: &[FileResult],
    warnings: &[Warning],
    summary: &Summary,
    sources: &HashMap<&str, &str>,
    stderr: &mut impl Write,
) {
    for warning in warnings {
        let diag = ToolDiagnostic::warning(format!("{}: {}", warning.code, warning.message));
        let _ = writeln!(stderr, "{:?}", miette::Report::new(diag));
    }

    for result in results {
        if result.skipped || result.errors.is_empty() {
            continue;
        }
        let source = sources.get(result.path.as_str()).copied().unwrap_or("");
        let line_starts = compute_line_starts(source);
        for diag in &result.errors {
            let renderable = diag.to_renderable(&result.path, source, &line_starts);
            let report = miette::Report::new(renderable);
            let _ = writeln!(stderr, "{report:?}");
        }
    }

    let _ = writeln!(stderr);
    let duration = format_duration(summary.duration);
    if summary.invalid_files == 0 {
        let msg = format!(
            "{} {} ({})",
            "✓",
            if summary.checked_files == 0 {
                "No files checked".to_string()
            } else {
                format!("All {} valid", plural(summary.checked_files, "file", "files"))
            },
            duration,
        );
        let style = Style::new().green().bold();
        let _ = writeln!(stderr, "{}", msg.if_supports_color(Stderr, |text| text.style(style)));
        if summary.skipped_files > 0 {
            let meta = format!("  Skipped {} (no primary-extension match)", plural(summary.skipped_files, "file", "files"));
            let _ = writeln!(stderr, "{}", meta.if_supports_color(Stderr, |text| text.dimmed()));
        }
    } else {
        let primary =
            format!("{} Found {} in {}", "✗", plural(summary.total_errors, "error", "errors"), plural(summary.invalid_files, "file", "files"));
        let style = Style::new().red().bold();
        let _ = writeln!(stderr, "{}", primary.if_supports_color(Stderr, |text| text.style(style)));

        let mut meta = format!("  Checked {}", plural(summary.checked_files, "file", "files"));
        if summary.skipped_files > 0 {
            meta.push_str(&format!(", skipped {}", plural(summary.skipped_files, "file", "files")));
        }
        meta.push_str(&format!(" ({duration})"));
        let _ = writeln!(stderr, "{}", meta.if_supports_color(Stderr, |text| text.dimmed()));
    }
}

// --- Typed JSON output structures ---

#[derive(Serialize)]
struct JsonOutput<'a> {
    version: u32,
    valid: bool,
    warnings: &'a [Warning],
    files: Vec<JsonFileResult>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonFileResult {
    path: String,
    valid: bool,
    errors: Vec<JsonError>,
}

#[derive(Serialize)]
struct JsonError {
    code: String,
    message: String,
    severity: Severity,
    range: JsonRange,
}

#[derive(Serialize)]
struct JsonRange {
    start: JsonPosition,
    end: JsonPosition,
}

#[derive(Serialize)]
struct JsonPosition {
    line: usize,
    column: usize,
}

#[derive(Serialize)]
struct JsonSummary {
    checked_files: usize,
    valid_files: usize,
    invalid_files: usize,
    skipped_files: usize,
    errors: usize,
    warnings: usize,
    duration_ms: u64,
}

/// Render results in JSON format.
pub fn render_json(results: &[FileResult], warnings: &[Warning], summary: &Summary, stdout: &mut impl Write) {
    let json_output = build_json_output(results, warnings, summary);
    let json_str = serde_json::to_string_pretty(&json_output).unwrap();
    let _ = writeln!(stdout, "{json_str}");
}

fn build_json_output<'a>(results: &[FileResult], warnings: &'a [Warning], summary: &Summary) -> JsonOutput<'a> {
    let files: Vec<JsonFileResult> = results
        .iter()
        .filter(|r| !r.skipped)
        .map(|r| {
            let errors: Vec<JsonError> = r
                .errors
                .iter()
                .map(|e| JsonError {
                    code: e.code.clone(),
                    message: e.message.clone(),
                    severity: e.severity,
                    range: JsonRange {
                        start: JsonPosition { line: e.range.start.line, column: e.range.start.column },
                        end: JsonPosition { line: e.range.end.line, column: e.range.end.column },
                    },
                })
                .collect();

            JsonFileResult { path: r.path.clone(), valid: r.valid, errors }
        })
        .collect();

    JsonOutput {
        version: 1,
        valid: summary.invalid_files == 0 && !summary.has_tool_error,
        warnings,
        files,
        summary: JsonSummary {
            checked_files: summary.checked_files,
            valid_files: summary.valid_files,
            invalid_files: summary.invalid_files,
            skipped_files: summary.skipped_files,
            errors: summary.total_errors,
            warnings: summary.total_warnings,
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Diagnostic, Position, Range};

    #[test]
    fn json_output_omits_skipped_files() {
        let results = vec![FileResult::skipped("a.tl"), FileResult::valid("b.tl")];
        let summary = Summary {
            checked_files: 2,
            valid_files: 2,
            invalid_files: 0,
            skipped_files: 1,
            total_errors: 0,
            total_warnings: 0,
            duration: Duration::from_millis(5),
            jobs: 1,
            has_tool_error: false,
        };
        let output = build_json_output(&results, &[], &summary);
        assert_eq!(output.files.len(), 1);
        assert_eq!(output.files[0].path, "b.tl");
    }

    #[test]
    fn json_error_carries_line_column_range() {
        let diag = Diagnostic::new(
            "L-0002",
            Range { start: Position { line: 1, column: 3 }, end: Position { line: 1, column: 3 } },
            "Variable '_x' not defined.".to_string(),
            Severity::Warning,
        );
        let results = vec![FileResult::invalid("a.tl", vec![diag])];
        let summary = Summary {
            checked_files: 1,
            valid_files: 0,
            invalid_files: 0,
            skipped_files: 0,
            total_errors: 0,
            total_warnings: 1,
            duration: Duration::from_millis(1),
            jobs: 1,
            has_tool_error: false,
        };
        let output = build_json_output(&results, &[], &summary);
        assert_eq!(output.files[0].errors[0].range.start.line, 1);
        assert_eq!(output.files[0].errors[0].range.start.column, 3);
    }
}
