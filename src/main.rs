//! Cartola Converter CLI
//!
//! Reads a bank statement export and writes canonical transaction CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- cartola.txt > transactions.csv
//! cargo run -- -f banco_de_chile_tarjeta_credito_facturados_xls estado.xlsx -o out.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `CARTOLA_SCHEMA_DIR`: Directory holding the bundled schema files

use cartola_converter::registry::{default_schema_dir, DEFAULT_FORMAT};
use cartola_converter::{write_output, DecodeOptions, Result, SchemaRegistry, StatementConverter};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

/// Convert a bank statement export to canonical transaction CSV.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Input statement file, or '-' for stdin (text statements only)
    #[arg(default_value = "-")]
    input: String,

    /// Format name from the schema registry, or a path to a schema file
    #[arg(short, long, default_value = DEFAULT_FORMAT)]
    fields: String,

    /// Output CSV file, or '-' for stdout
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Directory holding the registry's schema files
    #[arg(long, env = "CARTOLA_SCHEMA_DIR")]
    schema_dir: Option<PathBuf>,

    /// Fail on dates and amounts that cannot be parsed instead of
    /// substituting the raw text or zero
    #[arg(long)]
    strict: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let schema_dir = cli.schema_dir.unwrap_or_else(default_schema_dir);
    let registry = SchemaRegistry::with_builtin(&schema_dir);
    let schema = registry.load(&cli.fields)?;

    let converter =
        StatementConverter::new(schema).with_options(DecodeOptions { strict: cli.strict });

    let transactions = if cli.input == "-" {
        converter.convert_reader(io::stdin().lock())?
    } else {
        converter.convert_file(Path::new(&cli.input))?
    };

    if cli.output == "-" {
        let stdout = io::stdout();
        let handle = stdout.lock();
        write_output(&transactions, handle)?;
    } else {
        let file = File::create(&cli.output)?;
        write_output(&transactions, BufWriter::new(file))?;
    }

    Ok(())
}
