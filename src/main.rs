//! Gridcalc - evaluate spreadsheet formulas from the command line.

mod demo;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use gridcalc_core::storage::{CsvMode, to_csv_string};
use gridcalc_core::{CellRef, Document, EngineConfig};
use gridcalc_engine::builtins::BUILTINS;
use gridcalc_engine::engine::{FormulaResult, format_number};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: gridcalc [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula and print the result");
    eprintln!("  -s, --set <REF=VALUE>     Set a cell before evaluating (can be repeated)");
    eprintln!("  --demo                    Load the demo sheet (printed unless -c or --csv)");
    eprintln!("  --csv                     Print the sheet as CSV with formulas");
    eprintln!("  --functions               List the built-in functions");
    eprintln!("  --config <FILE>           Read engine settings from a TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  -v, --verbose             Log to stderr (filter with RUST_LOG)");
    eprintln!("  -h, --help                Print help");
}

#[derive(Default)]
struct Options {
    command: Option<String>,
    cells: Vec<String>,
    demo: bool,
    csv: bool,
    functions: bool,
    config_file: Option<PathBuf>,
    no_config: bool,
    verbose: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires a formula");
                    std::process::exit(1);
                }
                options.command = Some(args[i].to_string());
            }
            "-s" | "--set" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --set requires REF=VALUE");
                    std::process::exit(1);
                }
                options.cells.push(args[i].to_string());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                options.config_file = Some(PathBuf::from(&args[i]));
            }
            "--demo" => options.demo = true,
            "--csv" => options.csv = true,
            "--functions" => options.functions = true,
            "--no-config" => options.no_config = true,
            "-v" | "--verbose" => options.verbose = true,
            arg => {
                eprintln!("Error: Unknown argument: {}", arg);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    if options.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    match run(&options) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridcalc")?;
    Some(proj.config_dir().join("config.toml"))
}

fn load_config(options: &Options) -> Result<EngineConfig> {
    if let Some(path) = &options.config_file {
        return EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }
    if options.no_config {
        return Ok(EngineConfig::default());
    }
    match user_config_path() {
        Some(path) => EngineConfig::load_or_default(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Text shown for a formula result: the error code, the string, or the number.
fn render_result(result: &FormulaResult, precision: usize) -> String {
    match (result.error, &result.text) {
        (Some(err), _) => err.to_string(),
        (None, Some(text)) => text.clone(),
        (None, None) => format_number(result.value, precision),
    }
}

/// Returns the process exit code.
fn run(options: &Options) -> Result<i32> {
    if options.functions {
        for builtin in BUILTINS {
            println!("{:<8} {}", builtin.name, builtin.description);
        }
        return Ok(0);
    }

    let config = load_config(options)?;
    let mut doc = Document::with_config(&config).context("Failed to create sheet")?;
    tracing::info!(rows = config.rows, cols = config.cols, "sheet ready");

    if options.demo {
        demo::populate(&mut doc.sheet).context("Failed to build demo sheet")?;
    }

    for assignment in &options.cells {
        let (name, value) = assignment.split_once('=').with_context(|| {
            format!("Invalid --set value: '{}'. Expected REF=VALUE", assignment)
        })?;
        let at = CellRef::parse(name)
            .with_context(|| format!("Invalid cell reference: '{}'", name))?;
        doc.set_cell_from_input(at.row, at.col, value)
            .with_context(|| format!("Failed to set {}", at))?;
        tracing::debug!(cell = %at, value, "set cell");
    }

    if let Some(formula) = &options.command {
        let result = doc.sheet.evaluate(formula);
        println!("{}", render_result(&result, config.default_precision));
        return Ok(if result.error.is_some() { 1 } else { 0 });
    }

    if options.csv {
        print!("{}", to_csv_string(&doc.sheet, CsvMode::PreserveFormulas));
        return Ok(0);
    }

    if options.demo {
        print!("{}", demo::render(&doc.sheet));
        return Ok(0);
    }

    print_usage();
    Ok(1)
}
