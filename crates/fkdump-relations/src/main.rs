//! CLI entry point for fkdump.
//!
//! Dumps the records of one model plus everything they relate to, either as a
//! single fixture on stdout or as one fixture file per model type.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use fkdump_core::config::{self, DEFAULT_DB_ALIAS};
use fkdump_relations::{DirectorySink, DumpEngine, DumpRequest};

#[derive(Parser)]
#[command(name = "fkdump")]
#[command(about = "Dump fixtures for a model and the records it relates to")]
struct Cli {
    /// Model to dump, as app_label.ModelName.
    type_name: String,

    /// Output format: json, yaml or xml (default from config).
    #[arg(long)]
    format: Option<String>,

    /// Indent level for pretty-printed output.
    #[arg(long)]
    indent: Option<usize>,

    /// Relation hops to follow from the dumped records.
    #[arg(short = 'd', long, default_value_t = 0)]
    max_depth: u32,

    /// Database alias to read from.
    #[arg(long, default_value = DEFAULT_DB_ALIAS)]
    database: String,

    /// Primary key to dump; repeat for several. Omit to dump every record.
    #[arg(long = "id")]
    ids: Vec<String>,

    /// Model (app_label.ModelName) never to follow; repeatable.
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Config file prefix.
    #[arg(short, long, default_value = "fkdump")]
    config: String,

    /// Write one fixture file per model into this existing directory.
    #[arg(long)]
    split_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let settings = config::load(&cli.config)?;
    let engine = DumpEngine::open(&settings, &cli.database)?;

    let request = DumpRequest::new(&cli.type_name)
        .with_format(cli.format.as_deref().unwrap_or(&settings.dump.format))
        .with_indent(cli.indent.or(settings.dump.indent))
        .with_max_depth(cli.max_depth)
        .with_ids(cli.ids)
        .with_exclude(cli.exclude);

    match cli.split_dir {
        Some(dir) => {
            if cli.max_depth > 0 {
                tracing::warn!("--max-depth has no effect with --split-dir; following every relation");
            }
            let mut sink = DirectorySink::new(dir);
            let report = engine.split(&request, &mut sink)?;
            if let Some(failure) = report.failure {
                anyhow::bail!(
                    "Failed to write {} after {} fixture(s): {}",
                    failure.name,
                    report.written.len(),
                    failure.reason
                );
            }
            for fixture in &report.written {
                eprintln!("{} ({} records)", fixture.name, fixture.records);
            }
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            engine.write(&request, &mut out)?;
            writeln!(out)?;
        }
    }

    Ok(())
}
