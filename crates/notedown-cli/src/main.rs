//! notedown - render notedown documents to HTML

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use notedown_core::{
    ConfigError, Diagnostic, DiagnosticSeverity, ExtensionError, Notedown, NotedownConfig, Theme,
};
use notedown_renderer::{PageOptions, Renderer};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const CONFIG_FILE: &str = "notedown.toml";
const LOG_ENV: &str = "NOTEDOWN_LOG";

#[derive(Parser, Debug)]
#[command(name = "notedown")]
#[command(version, about = "Render notedown documents to HTML", long_about = None)]
#[command(after_help = "EXAMPLES:
    notedown lecture.nd > lecture.html    Render a standalone page
    notedown --raw < notes.nd             Render the body fragment only
    notedown --headings notes.nd          Print the numbered outline as JSON")]
struct Cli {
    /// Input file (reads stdin when omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Print the rendered fragment without the page wrapper
    #[arg(long)]
    raw: bool,

    /// Color theme: auto, light or dark
    #[arg(long, value_parser = parse_theme)]
    theme: Option<Theme>,

    /// Page title (defaults to the input file name)
    #[arg(long)]
    title: Option<String>,

    /// Config file (defaults to ./notedown.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not inline the stylesheet
    #[arg(long)]
    no_css: bool,

    /// Do not syntax-highlight code blocks
    #[arg(long)]
    no_highlight: bool,

    /// Report diagnostics on stderr
    #[arg(long, value_enum, value_name = "FORMAT")]
    diagnostics: Option<DiagnosticsMode>,

    /// Print the heading outline as JSON instead of HTML
    #[arg(long)]
    headings: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DiagnosticsMode {
    Json,
    Pretty,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Extension(#[from] ExtensionError),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;
    let source = read_source(cli.input.as_deref())?;

    let mut session = Notedown::new();
    let rendered = session.render(&source)?;

    if let Some(mode) = cli.diagnostics {
        emit_diagnostics(&rendered.diagnostics, mode)?;
    }

    if cli.headings {
        println!("{}", serde_json::to_string_pretty(&rendered.headings)?);
        return Ok(());
    }

    let renderer = Renderer::new(cli.theme.unwrap_or(config.page.theme));
    let body = if config.render.highlight_code && !cli.no_highlight {
        renderer.highlight_html(&rendered.html)
    } else {
        rendered.html
    };

    if cli.raw {
        println!("{body}");
        return Ok(());
    }

    let title = cli
        .title
        .clone()
        .or_else(|| config.page.title.clone())
        .unwrap_or_else(|| default_title(cli.input.as_deref()));
    let mut options = PageOptions::from_config(&config);
    if cli.no_css {
        options.inline_css = false;
    }
    print!("{}", renderer.embed_html(&body, &title, &options));
    Ok(())
}

fn parse_theme(value: &str) -> Result<Theme, String> {
    value.parse()
}

fn load_config(explicit: Option<&Path>) -> Result<NotedownConfig, ConfigError> {
    if let Some(path) = explicit {
        return NotedownConfig::load(path);
    }
    let path = Path::new(CONFIG_FILE);
    if path.is_file() {
        NotedownConfig::load(path)
    } else {
        debug!("no {CONFIG_FILE}; using defaults");
        Ok(NotedownConfig::default())
    }
}

fn read_source(input: Option<&Path>) -> Result<String, CliError> {
    match input {
        Some(path) => fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Stdin)?;
            Ok(buffer)
        }
    }
}

fn default_title(input: Option<&Path>) -> String {
    input
        .and_then(|path| path.file_stem())
        .and_then(|stem| stem.to_str())
        .unwrap_or("notedown")
        .to_string()
}

fn emit_diagnostics(diagnostics: &[Diagnostic], mode: DiagnosticsMode) -> Result<(), CliError> {
    match mode {
        DiagnosticsMode::Json => {
            eprintln!("{}", serde_json::to_string_pretty(diagnostics)?);
        }
        DiagnosticsMode::Pretty => {
            for diagnostic in diagnostics {
                eprintln!("{}", diagnostic_to_pretty(diagnostic));
            }
        }
    }
    Ok(())
}

fn diagnostic_to_pretty(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
    };
    let start_line = diagnostic.range.start.line + 1;
    let start_col = diagnostic.range.start.character + 1;
    format!(
        "{}:{}:{} {} {}",
        start_line, start_col, severity, diagnostic.code, diagnostic.message
    )
}
