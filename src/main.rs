use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use rayon::prelude::*;

use tl_lsp::diagnostic::{FileResult, ToolDiagnostic, Warning};
use tl_lsp::discover;
use tl_lsp::output::{self, Format, Summary};
use tl_lsp::transport::HeaderErrorPolicy;
use tl_lsp::vm::{Adapter, DefaultAdapter};
use tl_lsp::workspace::PRIMARY_EXT;

#[derive(Parser)]
#[command(name = "tl-lsp", version, about = "Language server for TL")]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the language server over stdio
    Serve {
        /// How to handle a malformed protocol header
        #[arg(long, value_enum, default_value = "skip")]
        on_header_error: HeaderErrorArg,
    },

    /// Analyze files without starting the protocol server
    Check(CheckArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum HeaderErrorArg {
    Fatal,
    Skip,
}

impl From<HeaderErrorArg> for HeaderErrorPolicy {
    fn from(value: HeaderErrorArg) -> Self {
        match value {
            HeaderErrorArg::Fatal => HeaderErrorPolicy::Fatal,
            HeaderErrorArg::Skip => HeaderErrorPolicy::Skip,
        }
    }
}

#[derive(clap::Args)]
struct CheckArgs {
    /// File or directory paths to analyze; directories are walked for
    /// primary-extension files honoring `.gitignore`
    paths: Vec<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "human")]
    format: Format,

    /// Number of concurrent jobs (1..=256)
    #[arg(short = 'j', long, default_value = "10", value_parser = clap::value_parser!(u16).range(1..=256))]
    jobs: u16,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Serve { on_header_error } => {
            run_serve(on_header_error.into());
            ExitCode::SUCCESS
        }
        Commands::Check(args) => run_check(args),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "tl-lsp", &mut std::io::stdout());
            ExitCode::SUCCESS
        }
    }
}

/// Stderr-only structured logging, controlled by `-v`/`-vv` and `TL_LSP_LOG`;
/// stdout is reserved for the framed protocol stream when serving.
fn init_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("TL_LSP_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run_serve(policy: HeaderErrorPolicy) {
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().expect("failed to build tokio runtime");
    runtime.block_on(async {
        let adapter: Arc<dyn Adapter> = Arc::new(DefaultAdapter::new());
        tl_lsp::server::run_server(adapter, policy).await;
    });
}

fn run_check(args: CheckArgs) -> ExitCode {
    let start = Instant::now();
    let mut stderr = std::io::stderr().lock();

    rayon::ThreadPoolBuilder::new().num_threads(args.jobs as usize).build_global().ok();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            let diag = ToolDiagnostic::error(format!("cannot determine current directory: {e}"));
            let _ = writeln!(stderr, "{:?}", miette::Report::new(diag));
            return ExitCode::from(2);
        }
    };

    let mut early_warnings: Vec<Warning> = Vec::new();
    let files_to_check = if args.paths.is_empty() {
        let (files, walk_warnings) = discover::discover_by_extension(&cwd, PRIMARY_EXT);
        early_warnings.extend(walk_warnings);
        files
    } else {
        let mut files = Vec::new();
        for path in &args.paths {
            let resolved = if path.is_absolute() { path.clone() } else { cwd.join(path) };
            if resolved.is_dir() {
                let (found, walk_warnings) = discover::discover_by_extension(&resolved, PRIMARY_EXT);
                early_warnings.extend(walk_warnings);
                files.extend(found);
            } else {
                files.push(resolved);
            }
        }
        files
    };

    if files_to_check.is_empty() {
        if args.format == Format::Human {
            let diag = ToolDiagnostic::warning("no files to check".to_string());
            let _ = writeln!(stderr, "{:?}", miette::Report::new(diag));
        }
        return ExitCode::SUCCESS;
    }

    let mut has_file_read_error = false;
    let file_contents: Vec<(String, String)> = files_to_check
        .iter()
        .filter_map(|path| {
            let path_str = path.display().to_string();
            match std::fs::read_to_string(path) {
                Ok(content) => Some((path_str, content)),
                Err(e) => {
                    let diag = ToolDiagnostic::error(format!("could not read {path_str}: {e}"));
                    let _ = writeln!(stderr, "{:?}", miette::Report::new(diag));
                    has_file_read_error = true;
                    None
                }
            }
        })
        .collect();

    let sources: HashMap<&str, &str> = file_contents.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();

    let adapter = DefaultAdapter::new();
    let globals = tl_lsp::analyzer::GlobalTable::new();
    let results: Vec<FileResult> = file_contents
        .par_iter()
        .map(|(path, content)| {
            let output = tl_lsp::analyzer::run_pipeline(&adapter, std::path::Path::new(path), path, content, &globals);
            FileResult::invalid(path, output.diagnostics)
        })
        .collect();

    let checked = results.len();
    let invalid = results.iter().filter(|r| !r.valid).count();
    let valid = checked - invalid;
    let total_errors: usize = results.iter().map(|r| r.errors.len()).sum();
    let has_tool_error = has_file_read_error;

    let summary = Summary {
        checked_files: checked,
        valid_files: valid,
        invalid_files: invalid,
        skipped_files: 0,
        total_errors,
        total_warnings: early_warnings.len(),
        duration: start.elapsed(),
        jobs: args.jobs as usize,
        has_tool_error,
    };

    match args.format {
        Format::Human => output::render_human(&results, &early_warnings, &summary, &sources, &mut stderr),
        Format::Json => {
            let mut stdout = std::io::stdout().lock();
            output::render_json(&results, &early_warnings, &summary, &mut stdout);
        }
    }

    if has_tool_error {
        ExitCode::from(2)
    } else if invalid > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
