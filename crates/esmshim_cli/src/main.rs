//! esmshim: rewrite ES modules into CommonJS script bodies.
//!
//! Usage:
//!   esmshim [options] [file...]
//!
//! Without `--out-dir` the transformed code is printed to stdout.

use clap::Parser as ClapParser;
use esmshim_compiler::{collect_diagnostics, Program};
use esmshim_core::LineMap;
use esmshim_diagnostics::{Diagnostic, DiagnosticCategory};
use esmshim_options::{
    default_config_json, discover_source_files, parse_config_file, ConfigError, EsmShimConfig,
    ImportPlacement, CONFIG_FILE_NAME,
};
use miette::{NamedSource, Report};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(ClapParser, Debug)]
#[command(name = "esmshim", version, about = "Rewrite ES modules into CommonJS script bodies")]
struct Cli {
    /// Module files to transform.
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Path to esmshim.json.
    #[arg(short = 'p', long = "project")]
    project: Option<String>,

    /// Write `.js` files to this directory, mirroring the input paths.
    #[arg(long = "out-dir")]
    out_dir: Option<String>,

    /// URL each file path is joined to when resolving its imports.
    #[arg(long = "base-url")]
    base_url: Option<String>,

    /// Emit require bindings before all other statements.
    #[arg(long = "hoist-imports")]
    hoist_imports: bool,

    /// Always write `imported: local` in destructured requires.
    #[arg(long = "explicit-renames")]
    explicit_renames: bool,

    /// Do not wrap modules using top-level await.
    #[arg(long = "no-await-wrapper")]
    no_await_wrapper: bool,

    /// Fail on syntax errors instead of emitting the fallback rewrite.
    #[arg(long)]
    strict: bool,

    /// Print the parsed module AST as JSON.
    #[arg(long = "print-ast")]
    print_ast: bool,

    /// Initialize an esmshim.json file.
    #[arg(long)]
    init: bool,

    /// List the files being transformed.
    #[arg(long = "list-files")]
    list_files: bool,

    /// Log pipeline progress (same as RUST_LOG=debug).
    #[arg(short = 'v', long)]
    verbose: bool,
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GRAY: &str = "\x1b[90m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.init {
        run_init();
        return;
    }

    let exit_code = run_transform(&cli);
    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// A resolved set of inputs: files, the project file (if any) and the
/// directory module paths are relative to.
struct Inputs {
    files: Vec<String>,
    config: Option<EsmShimConfig>,
    root_dir: Option<PathBuf>,
}

fn run_transform(cli: &Cli) -> i32 {
    let start = Instant::now();

    let inputs = match resolve_inputs(cli) {
        Ok(inputs) => inputs,
        Err(err) => {
            print_error(&err.to_string());
            return 1;
        }
    };

    if inputs.files.is_empty() {
        print_error("No input files found.");
        return 1;
    }

    if cli.list_files {
        for f in &inputs.files {
            eprintln!("{}", f);
        }
    }

    // CLI options override esmshim.json
    let config = inputs.config.unwrap_or_default();
    let mut options = config.transform_options();
    if cli.hoist_imports {
        options.import_placement = ImportPlacement::BeforeStatements;
    }
    if cli.explicit_renames {
        options.explicit_import_renames = true;
    }
    if cli.no_await_wrapper {
        options.wrap_top_level_await = false;
    }

    let mut program = Program::new(inputs.files, options);
    program.root_dir = inputs.root_dir;
    program.base_url = cli.base_url.clone().or(config.base_url);
    program.out_dir = cli.out_dir.clone().or(config.out_dir).map(PathBuf::from);

    if let Err(e) = program.load_root_files() {
        print_error(&format!("Failed to load source files: {}", e));
        return 1;
    }

    if cli.print_ast {
        return print_ast(&program);
    }

    if cli.strict {
        if let Some(code) = check_syntax(&program) {
            return code;
        }
    }

    let results = program.emit();

    let use_color = is_terminal();
    let diagnostics = collect_diagnostics(&results);
    for diag in diagnostics.diagnostics() {
        let source_text = diag
            .file
            .as_deref()
            .and_then(|file| program.source_files().iter().find(|(name, _)| name == file))
            .map(|(_, text)| text.as_str());
        print_diagnostic(diag, source_text, use_color);
    }

    if program.out_dir.is_some() {
        if let Err(e) = program.write_output_files(&results) {
            print_error(&format!("Failed to write output files: {}", e));
            return 1;
        }
    } else {
        let with_headers = results.len() > 1;
        for result in &results {
            if with_headers {
                println!("// {}", result.file_name);
            }
            println!("{}", result.output.code);
        }
    }

    let fallbacks = results.iter().filter(|r| r.output.used_fallback).count();
    debug!(
        "Transformed {} modules ({} via fallback, {} errors) in {:.2}s",
        results.len(),
        fallbacks,
        diagnostics.error_count(),
        start.elapsed().as_secs_f64()
    );
    if use_color && program.out_dir.is_some() {
        let color = if diagnostics.has_errors() { YELLOW } else { GRAY };
        eprintln!(
            "{}Transformed {} modules in {:.2}s.{}",
            color,
            results.len(),
            start.elapsed().as_secs_f64(),
            RESET
        );
    }

    0
}

/// Render the first syntax error with its source; returns the exit code.
fn check_syntax(program: &Program) -> Option<i32> {
    for (file_name, source_text) in program.source_files() {
        if let Err(err) = esmshim_parser::parse_program(source_text) {
            let report = Report::new(err).with_source_code(NamedSource::new(file_name, source_text.clone()));
            eprintln!("{:?}", report);
            return Some(2);
        }
    }
    None
}

fn print_ast(program: &Program) -> i32 {
    for (file_name, source_text) in program.source_files() {
        let ast = match esmshim_parser::parse_program(source_text) {
            Ok(ast) => ast,
            Err(err) => {
                let report = Report::new(err).with_source_code(NamedSource::new(file_name, source_text.clone()));
                eprintln!("{:?}", report);
                return 2;
            }
        };
        match serde_json::to_string_pretty(&ast) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                print_error(&format!("Failed to serialize AST of {}: {}", file_name, e));
                return 1;
            }
        }
    }
    0
}

fn run_init() {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        print_error("An esmshim.json file already exists in the current directory.");
        process::exit(1);
    }

    match std::fs::write(config_path, format!("{}\n", default_config_json())) {
        Ok(()) => println!("Successfully created an esmshim.json file."),
        Err(e) => {
            print_error(&format!("Failed to create esmshim.json: {}", e));
            process::exit(1);
        }
    }
}

fn resolve_inputs(cli: &Cli) -> Result<Inputs, ConfigError> {
    if let Some(ref project) = cli.project {
        load_inputs_from_config(project)
    } else if !cli.files.is_empty() {
        Ok(Inputs {
            files: cli.files.clone(),
            config: None,
            root_dir: std::env::current_dir().ok(),
        })
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        load_inputs_from_config(CONFIG_FILE_NAME)
    } else {
        Ok(Inputs {
            files: Vec::new(),
            config: None,
            root_dir: None,
        })
    }
}

fn load_inputs_from_config(path: &str) -> Result<Inputs, ConfigError> {
    let config = parse_config_file(path)?;
    let root_dir = Path::new(path)
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());

    let files = discover_source_files(
        &root_dir,
        &config.include_patterns(),
        &config.exclude_patterns(),
        config.files.as_deref(),
    );
    debug!("Discovered {} files under {}", files.len(), root_dir);

    Ok(Inputs {
        files,
        config: Some(config),
        root_dir: Some(PathBuf::from(root_dir)),
    })
}

/// Print a diagnostic as `file(line:col): category ESM<code>: message`.
fn print_diagnostic(diag: &Diagnostic, source_text: Option<&str>, use_color: bool) {
    let location = match (&diag.file, diag.span) {
        (Some(file), Some(span)) => match source_text {
            Some(text) => format!("{}({})", file, LineMap::new(text).line_and_column_of(span.start)),
            None => format!("{}({})", file, span.start),
        },
        (Some(file), None) => file.clone(),
        (None, _) => String::new(),
    };

    if !use_color {
        if location.is_empty() {
            eprintln!("{} ESM{}: {}", diag.category, diag.code, diag.message_text);
        } else {
            eprintln!("{}: {} ESM{}: {}", location, diag.category, diag.code, diag.message_text);
        }
        return;
    }

    let color = match diag.category {
        DiagnosticCategory::Error => RED,
        DiagnosticCategory::Warning => YELLOW,
        DiagnosticCategory::Message => GRAY,
    };
    if !location.is_empty() {
        eprint!("{}{}{}: ", CYAN, location, RESET);
    }
    eprintln!(
        "{}{}{}{} {}ESM{}{}: {}",
        BOLD, color, diag.category, RESET, GRAY, diag.code, RESET, diag.message_text
    );
}

fn print_error(msg: &str) {
    if is_terminal() {
        eprintln!("{}{}error{}: {}", BOLD, RED, RESET, msg);
    } else {
        eprintln!("error: {}", msg);
    }
}

fn is_terminal() -> bool {
    std::io::stderr().is_terminal()
}
