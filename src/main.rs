use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use complexity_atlas::{DEFAULT_SEARCH_LIMIT, LayoutConfig, NetworkProcessor, load_network};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, global = true, default_value = "classes.json")]
    classes: PathBuf,

    #[arg(long, global = true, default_value = "theorems.json")]
    theorems: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Trim the network down to the given classes and print the laid-out result.
    Trim {
        select: Vec<String>,

        #[arg(long, conflicts_with = "select")]
        all: bool,

        #[arg(long, default_value_t = 1500.0)]
        width: f64,

        #[arg(long, default_value_t = 1000.0)]
        height: f64,
    },
    /// Fuzzy search over class ids and names.
    Search {
        #[arg(default_value = "")]
        query: String,

        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Classes on some containment chain from SOURCE up to TARGET.
    Between { source: String, target: String },
    /// Direct neighbours of a class.
    Connected {
        id: String,

        #[arg(long)]
        co_class: bool,
    },
    /// How two classes relate.
    Relation { a: String, b: String },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let (registry, report) = load_network(&args.classes, &args.theorems)?;
    if report.skipped() > 0 {
        info!(
            classes = report.classes_skipped,
            theorems = report.theorems_skipped,
            "some records were skipped"
        );
    }

    match args.command {
        Command::Trim {
            select,
            all,
            width,
            height,
        } => {
            let mut processor = NetworkProcessor::with_config(registry, LayoutConfig::with_canvas(width, height));
            if all {
                processor.registry_mut().select_all();
            }
            for id in &select {
                if !processor.select_class(id) && !processor.is_class_selected(id) {
                    bail!("unknown class {id}");
                }
            }
            print_json(&processor.trimmed_network())
        }
        Command::Search { query, limit } => print_json(&registry.search(&query, limit)),
        Command::Between { source, target } => print_json(&registry.classes_between(&source, &target)),
        Command::Connected { id, co_class } => print_json(&registry.connected_classes(&id, co_class)),
        Command::Relation { a, b } => {
            let relation = registry.relationship(&a, &b);
            print_json(&json!({ "a": a, "b": b, "relation": relation }))
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).context("failed to write output")?;
    writeln!(stdout).context("failed to write output")?;
    Ok(())
}
