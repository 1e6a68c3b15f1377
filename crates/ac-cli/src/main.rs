//! Address Combiner CLI
//!
//! Command-line tool for merging address lists, removing duplicate
//! addresses, and exporting the unique result.

use ac_core::{
    default_output_path, export, parse_table, render_preview, BlankAddressPolicy, JobFile,
    OutputFormat, DEFAULT_PREVIEW_ROWS,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ac-cli")]
#[command(about = "Combine address lists and remove duplicate addresses", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine input files and write the unique addresses
    Combine {
        /// Input CSV or xlsx files, in precedence order (repeat the flag)
        #[arg(short, long = "input", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file path (defaults to <Mon>_Addresses.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (csv or json)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Drop rows with a blank address instead of keeping one of them
        #[arg(long)]
        drop_blank: bool,

        /// Print a preview of this many rows before writing
        #[arg(long)]
        preview: Option<usize>,
    },

    /// Show the summary and first rows without writing anything
    Preview {
        /// Input CSV or xlsx files, in precedence order
        #[arg(short, long = "input", required = true)]
        inputs: Vec<PathBuf>,

        /// Maximum number of rows to display
        #[arg(short, long, default_value_t = DEFAULT_PREVIEW_ROWS)]
        limit: usize,

        /// Drop rows with a blank address instead of keeping one of them
        #[arg(long)]
        drop_blank: bool,
    },

    /// Show the columns and first addresses of a single input file
    Inspect {
        /// Path to a CSV or xlsx file
        #[arg(short, long)]
        file: PathBuf,

        /// Number of addresses to list
        #[arg(short, long, default_value_t = DEFAULT_PREVIEW_ROWS)]
        limit: usize,
    },

    /// Explain which rows share an address and which one was kept
    Explain {
        /// Input CSV or xlsx files, in precedence order
        #[arg(short, long = "input", required = true)]
        inputs: Vec<PathBuf>,

        /// Address to look up (any spelling)
        #[arg(short, long)]
        address: String,
    },

    /// Run a job file
    Run {
        /// Path to job file (JSON)
        #[arg(short, long)]
        job: PathBuf,
    },

    /// Create a job file template
    CreateJob {
        /// Output path for the job file
        #[arg(short, long)]
        output: PathBuf,

        /// Input files to include
        #[arg(short, long = "input")]
        inputs: Vec<PathBuf>,

        /// Output file the job should write
        #[arg(long)]
        export_to: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; RUST_LOG overrides the -v level
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands) -> ac_core::Result<()> {
    match command {
        Commands::Combine {
            inputs,
            output,
            format,
            drop_blank,
            preview,
        } => cmd_combine(&inputs, output, &format, drop_blank, preview),
        Commands::Preview {
            inputs,
            limit,
            drop_blank,
        } => cmd_preview(&inputs, limit, drop_blank),
        Commands::Inspect { file, limit } => cmd_inspect(&file, limit),
        Commands::Explain { inputs, address } => cmd_explain(&inputs, &address),
        Commands::Run { job } => cmd_run(&job),
        Commands::CreateJob {
            output,
            inputs,
            export_to,
        } => cmd_create_job(&output, &inputs, export_to),
    }
}

fn policy(drop_blank: bool) -> BlankAddressPolicy {
    if drop_blank {
        BlankAddressPolicy::Exclude
    } else {
        BlankAddressPolicy::Collapse
    }
}

fn job_for(inputs: &[PathBuf], drop_blank: bool) -> JobFile {
    let mut job = JobFile::new(inputs.iter().cloned());
    job.blank_addresses = policy(drop_blank);
    job
}

fn cmd_combine(
    inputs: &[PathBuf],
    output: Option<PathBuf>,
    format: &str,
    drop_blank: bool,
    preview: Option<usize>,
) -> ac_core::Result<()> {
    let format: OutputFormat = format.parse()?;
    let output = output.unwrap_or_else(|| default_output_path(format));

    let result = job_for(inputs, drop_blank).evaluate()?;

    if let Some(limit) = preview {
        println!("{}", render_preview(&result, limit));
    }

    export(&result, &output, format)?;
    println!(
        "Saved {} unique addresses to {}",
        result.row_count(),
        output.display()
    );

    Ok(())
}

fn cmd_preview(inputs: &[PathBuf], limit: usize, drop_blank: bool) -> ac_core::Result<()> {
    let result = job_for(inputs, drop_blank).evaluate()?;
    print!("{}", render_preview(&result, limit));
    Ok(())
}

fn cmd_inspect(file: &Path, limit: usize) -> ac_core::Result<()> {
    let table = parse_table(file)?;

    println!("File: {}", file.display());
    println!("Columns: {}", table.column_names().join(", "));
    println!("Rows: {}", table.row_count());
    println!();

    if !table.has_column("Address") {
        println!("File does NOT have a column named 'Address'");
        return Ok(());
    }

    let addresses: Vec<String> = table
        .column_cells("Address")
        .map(|c| c.to_string_value())
        .collect();
    let blank = addresses.iter().filter(|a| a.trim().is_empty()).count();

    println!("Addresses (first {}):", limit.min(addresses.len()));
    for (i, address) in addresses.iter().take(limit).enumerate() {
        println!("  {:>4}  {}", i + 1, address);
    }
    if addresses.len() > limit {
        println!("... ({} more rows)", addresses.len() - limit);
    }
    if blank > 0 {
        println!();
        println!("Blank addresses: {}", blank);
    }

    Ok(())
}

fn cmd_explain(inputs: &[PathBuf], address: &str) -> ac_core::Result<()> {
    let result = job_for(inputs, false).evaluate()?;
    let explained = result.explain(address);
    debug!(key = %explained.key, "explaining address");

    println!("Address: {}", address);
    println!("Key: {}", explained.key);
    println!();

    let Some(survivor) = explained.survivor else {
        println!("No row has this address.");
        return Ok(());
    };

    println!("Kept: {}", survivor.provenance);
    println!("  {}", survivor.record.values().join(" | "));

    if explained.discarded.is_empty() {
        println!();
        println!("No duplicates.");
        return Ok(());
    }

    println!();
    println!("Discarded duplicates ({}):", explained.discarded.len());
    for dup in &explained.discarded {
        println!("  {}: {}", dup.provenance, dup.record.values().join(" | "));
    }

    Ok(())
}

fn cmd_run(job_path: &Path) -> ac_core::Result<()> {
    let job = JobFile::load(job_path)?;

    println!("Running job with {} input files", job.inputs.len());
    for (i, input) in job.inputs.iter().enumerate() {
        println!("  {}: {}", job.label_for(i), input.path.display());
    }
    println!();

    let outcome = job.run()?;

    print!("{}", render_preview(&outcome.result, job.preview_rows));
    println!();
    println!(
        "Saved {} unique addresses to {}",
        outcome.result.row_count(),
        outcome.output.display()
    );

    Ok(())
}

fn cmd_create_job(
    output: &Path,
    inputs: &[PathBuf],
    export_to: Option<PathBuf>,
) -> ac_core::Result<()> {
    let mut job = if inputs.is_empty() {
        JobFile::new(["file1.csv", "file2.csv"])
    } else {
        JobFile::new(inputs.iter().cloned())
    };
    job.output = export_to;

    job.save(output)?;
    println!("Created job file: {}", output.display());
    println!("Inputs: {}", job.inputs.len());
    println!();
    println!("Edit the file to configure your run, then run:");
    println!("  ac-cli run --job {}", output.display());

    Ok(())
}
