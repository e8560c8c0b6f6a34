//! smelter: Rebuild CSV rows from a JSON document's leaf stream
//!
//! Usage:
//!   # Sample document with its sample columns, via jq
//!   smelter
//!
//!   # Pick the columns; the first one marks where each row starts
//!   smelter --input people.json --columns "id, name, email"
//!
//!   # Walk the document in-process instead of running jq
//!   smelter --source native --input people.json --columns "id, name" -o people.csv
//!
//!   # Use another uid column and read the source twice instead of caching
//!   smelter --input people.json --columns "name, id" --uid id --cache none

// Use MiMalloc allocator for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use smelter::config::{DEFAULT_CACHE_ROWS, DEFAULT_INPUT, DEFAULT_OUTPUT};
use smelter::{CacheKind, ColumnSpec, Smelter, SourceKind, SourceSettings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "smelter")]
#[command(about = "Rebuild CSV rows from a flattened JSON leaf stream", long_about = None)]
struct Args {
    /// Input document
    #[arg(long, short = 'i', default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Comma-separated column names; the first is the row uid unless --uid is given
    #[arg(long, short = 'c')]
    columns: Option<String>,

    /// Column whose repeat at the same depth starts a new row
    #[arg(long, short = 'u')]
    uid: Option<String>,

    /// CSV file to write (truncated if it exists)
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// How the leaf stream is produced
    #[arg(long, value_enum, default_value_t = SourceKind::Jq)]
    source: SourceKind,

    /// jq executable for --source jq
    #[arg(long, default_value = "jq")]
    jq: String,

    /// Ask jq to flush every record as it is produced
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    unbuffered: bool,

    /// Where the first pass is kept for the write pass
    #[arg(long, value_enum, default_value_t = CacheKind::Memory)]
    cache: CacheKind,

    /// Rows the cache may hold before the source is read again
    #[arg(long, default_value_t = DEFAULT_CACHE_ROWS)]
    cache_rows: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let spec = ColumnSpec::resolve(args.columns.as_deref(), args.uid.as_deref(), &args.input)
        .context("invalid column settings")?;

    let source = SourceSettings {
        kind: args.source,
        input: &args.input,
        jq_program: &args.jq,
        unbuffered: args.unbuffered,
    }
    .build();

    let mut smelter = Smelter::new(source, spec).with_cache(args.cache.build(args.cache_rows));
    let report = smelter
        .run(&args.output)
        .with_context(|| format!("failed to smelt {}", args.input.display()))?;

    println!(
        "fieldnames completed in {:.4} seconds",
        report.fieldname_pass.as_secs_f64()
    );
    println!(
        "csv write completed in {:.4} seconds",
        report.write_pass.as_secs_f64()
    );

    Ok(())
}
