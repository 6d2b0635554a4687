//! TagScript command line interface.
//!
//! Converts a TagScript file into its JSON document.
//!
//! ```bash
//! # input.tag -> output.json
//! tagscript
//!
//! # Print compact JSON for another file
//! tagscript recipe.tag --stdout --compact
//!
//! # Fail on missing tags and report every diagnostic
//! tagscript recipe.tag --validate
//! ```

mod error;

use clap::Parser;
use error::CliError;
use std::path::PathBuf;
use std::process::ExitCode;
use tagscript_parser::{
    read_source, validate, Encoding, ErrorReporter, MappingSplit, OperatorOrder, ParserConfig,
    TagScriptParser,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tagscript")]
#[command(version, about = "Convert TagScript files to JSON", long_about = None)]
struct Cli {
    /// TagScript file to read
    #[arg(default_value = "input.tag")]
    input: PathBuf,

    /// File to write the JSON document to
    #[arg(short, long, default_value = "output.json")]
    output: PathBuf,

    /// Write the JSON document to stdout instead of the output file
    #[arg(long)]
    stdout: bool,

    /// Write JSON on a single line
    #[arg(long)]
    compact: bool,

    /// Text encoding of the input (utf-8, utf-8-sig, ascii, latin-1)
    #[arg(short, long, default_value = "utf-8")]
    encoding: String,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Fail on the first malformed line instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Try comparison operators in the legacy order (`=` before `>=`)
    #[arg(long)]
    legacy_operators: bool,

    /// Split parameter blocks on every comma, ignoring nesting
    #[arg(long)]
    legacy_mappings: bool,

    /// Check for missing TASK/ACTION/GOAL and undefined calls
    #[arg(long)]
    validate: bool,
}

impl Cli {
    fn parser_config(&self) -> ParserConfig {
        let mut config = ParserConfig::new().with_strict(self.strict);
        if self.legacy_operators {
            config = config.with_operator_order(OperatorOrder::Legacy);
        }
        if self.legacy_mappings {
            config = config.with_mapping_split(MappingSplit::Legacy);
        }
        config
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let encoding: Encoding = cli.encoding.parse()?;
    let source = read_source(&cli.input, encoding)?;
    debug!(input = %cli.input.display(), %encoding, bytes = source.len(), "read input");

    let parser = TagScriptParser::with_config(cli.parser_config());
    let (document, diagnostics) = parser.parse_with_diagnostics(&source)?;

    if cli.validate {
        let report = validate(&document, &diagnostics);
        let reporter = ErrorReporter::new(cli.input.display().to_string(), &source);
        reporter.report_all(report.iter()).map_err(CliError::Report)?;
        if !report.is_ok() {
            return Err(CliError::Validation {
                errors: report.errors.len(),
            });
        }
    }

    let json = document.to_json(!cli.compact)?;
    if cli.stdout {
        println!("{}", json);
    } else {
        std::fs::write(&cli.output, format!("{}\n", json))
            .map_err(|e| CliError::io(&cli.output, e))?;
        info!(output = %cli.output.display(), "wrote document");
    }

    eprintln!("Parsed {}", cli.input.display());
    for (category, count) in document.summary().entries() {
        if count > 0 {
            eprintln!("  {}: {}", category, count);
        }
    }
    if !cli.stdout {
        eprintln!("Wrote {}", cli.output.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
