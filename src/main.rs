//! CLI entry point for the CS135 log decoder.
//!
//! Subcommands:
//! - `decode`: decode files and print the accept/discard summary.
//! - `dump`: decode files and write the profile table as CSV.
//! - `export`: decode files and write the netCDF products.
//!
//! All subcommands share the same decoder; only the output side differs.

// Global allocator (Microsoft Rust Guidelines: M-MIMALLOC-APPS)
#[cfg(not(test))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use cs135_decode::export::{csv, netcdf, Product};
use cs135_decode::metadata::SiteMetadata;
use cs135_decode::table::ProfileTable;
use cs135_decode::{decode_files, logging, DecodeStats};

#[derive(Parser)]
#[command(name = "cs135_decode")]
#[command(about = "Decode Campbell Scientific CS135 ceilometer logs", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode files and print a summary of accepted and discarded records
    Decode {
        /// Input log files, processed in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode files and write the profile table as CSV
    Dump {
        /// Input log files, processed in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode files and write netCDF products
    Export {
        /// Input log files, processed in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory, created if absent
        #[arg(short, long)]
        output: PathBuf,

        /// TOML file with site/instrument metadata
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// Products to generate
        #[arg(
            short,
            long,
            value_enum,
            num_args = 1..,
            default_values_t = [Product::AerosolBackscatter, Product::CloudBase]
        )]
        products: Vec<Product>,
    },
}

#[derive(Serialize)]
struct Summary {
    records: usize,
    stats: DecodeStats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Decode { files, json } => {
            let output = decode_files(&files)?;
            let summary = Summary {
                records: output.records.len(),
                stats: output.stats,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
        }
        Commands::Dump { files, output } => {
            let decoded = decode_files(&files)?;
            let table = ProfileTable::from_records(decoded.records)?;
            match output {
                Some(path) => csv::write_table_to_path(&table, path)?,
                None => csv::write_table(&table, io::stdout().lock())?,
            }
        }
        Commands::Export {
            files,
            output,
            metadata,
            products,
        } => {
            let site = match metadata {
                Some(path) => SiteMetadata::load(path)?,
                None => SiteMetadata::default(),
            };
            let decoded = decode_files(&files)?;
            let table = ProfileTable::from_records(decoded.records)?;
            for product in products {
                let path = netcdf::write_product(&table, &site, &output, product)?;
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("records accepted:   {}", summary.records);
    println!("checksum failures:  {}", summary.stats.checksum_failures);
    println!("malformed records:  {}", summary.stats.malformed);
    println!("unsupported msgs:   {}", summary.stats.unsupported);
    println!("truncated records:  {}", summary.stats.truncated);
    println!("merges recovered:   {}", summary.stats.merges_recovered);
}
