//! Nestor CLI - Nest flat JSON collections along dependency chains
//!
//! # Main Commands
//!
//! ```bash
//! nestor transform response.json -m matrix.json          # Nest with a matrix
//! nestor transform response.json -m list.json --flat     # Nest with a flat list
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! nestor validate matrix.json                     # Report every matrix problem
//! nestor resolve response.json content.venues     # Print the value at a path
//! nestor example-matrix                           # Show the demo matrix
//! nestor example-document                         # Show the demo document
//! ```

use clap::{Parser, Subcommand};
use nestor::{
    example_document, example_list_value, example_matrix, read_json, resolve_str, run,
    validate_matrix, DependencyList, PipelineOptions, Resolution,
    TransformOptions, UnmatchedPolicy,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "nestor")]
#[command(about = "Nest id-linked JSON collections along dependency chains", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Nest referenced entities into a document
    Transform {
        /// Input JSON document
        document: PathBuf,

        /// Dependency matrix file (or flat list with --flat)
        #[arg(short, long)]
        matrix: PathBuf,

        /// Treat the matrix file as an unordered flat dependency list
        #[arg(long)]
        flat: bool,

        /// Write null for foreign keys without a match
        #[arg(long)]
        null_unmatched: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Validate a dependency matrix file
    Validate {
        /// Matrix JSON file
        input: PathBuf,

        /// Validate as a flat dependency list
        #[arg(long)]
        flat: bool,
    },

    /// Print the value found at a dot path
    Resolve {
        /// Input JSON document
        document: PathBuf,

        /// Dot-separated path, e.g. content.venues
        path: String,
    },

    /// Show example dependency matrix
    ExampleMatrix {
        /// Show the flat list form instead
        #[arg(long)]
        flat: bool,
    },

    /// Show example document
    ExampleDocument,
}

fn main() {
    // Load .env file (if present), e.g. for RUST_LOG
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "nestor=warn".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transform {
            document,
            matrix,
            flat,
            null_unmatched,
            output,
            compact,
        } => {
            let options = PipelineOptions {
                flat,
                transform: TransformOptions {
                    unmatched: if null_unmatched {
                        UnmatchedPolicy::Null
                    } else {
                        UnmatchedPolicy::Omit
                    },
                },
            };
            cmd_transform(&document, &matrix, &options, output.as_deref(), compact)
        }

        Commands::Validate { input, flat } => cmd_validate(&input, flat),

        Commands::Resolve { document, path } => cmd_resolve(&document, &path),

        Commands::ExampleMatrix { flat } => cmd_example_matrix(flat),

        Commands::ExampleDocument => cmd_example_document(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_transform(
    document: &Path,
    matrix: &Path,
    options: &PipelineOptions,
    output: Option<&Path>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", document.display());
    eprintln!("   Matrix: {}{}", matrix.display(), if options.flat { " (flat list)" } else { "" });

    let report = run(document, matrix, options)?;

    eprintln!("\n⚙️  Chains:");
    for chain in &report.chains {
        match (&chain.destination, &chain.key_name) {
            (Some(destination), Some(key)) => eprintln!(
                "   [{}] {}.{}: {} enriched, {} unmatched",
                chain.index, destination, key, chain.enriched, chain.unmatched
            ),
            _ => eprintln!("   [{}] empty chain", chain.index),
        }
        if chain.duplicate_ids > 0 {
            eprintln!("       ⚠️  {} duplicate identifiers", chain.duplicate_ids);
        }
    }

    let json = to_json(&report.document, compact)?;
    write_output(&json, output)?;

    eprintln!("\n✨ {}", report.summary());
    Ok(())
}

fn cmd_validate(input: &Path, flat: bool) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let raw = read_json(input)?;

    if flat {
        let list = DependencyList::from_value(&raw)?;
        let order = list.ordered()?;
        eprintln!("✅ Valid dependency list ({} descriptors)", order.len());
        for (position, hop) in order {
            eprintln!(
                "   [{}] {} -> {}.{}",
                position, hop.source_path, hop.destination_path, hop.key_name
            );
        }
        return Ok(());
    }

    match validate_matrix(&raw) {
        Ok(matrix) => {
            eprintln!("✅ Valid matrix ({} chains)", matrix.chains().len());
            eprintln!("   Collections: {}", matrix.referenced_paths().join(", "));
            for (index, chain) in matrix.chains().iter().enumerate() {
                let route: Vec<String> = chain.hops().iter().map(|h| h.source_path.to_string()).collect();
                match chain.terminal() {
                    Some(last) => eprintln!(
                        "   [{}] {} -> {}.{}",
                        index,
                        route.join(" -> "),
                        last.destination_path,
                        last.key_name
                    ),
                    None => eprintln!("   [{}] empty", index),
                }
            }
            Ok(())
        }
        Err(errors) => {
            eprintln!("\n❌ {} problem(s):", errors.len());
            for err in &errors {
                eprintln!("   - {}", err);
            }
            std::process::exit(1);
        }
    }
}

fn cmd_resolve(document: &Path, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let document = read_json(document)?;

    match resolve_str(&document, path)? {
        Resolution::Found(value) => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(())
        }
        Resolution::Absent => Err(format!("Nothing found at path: {}", path).into()),
    }
}

fn cmd_example_matrix(flat: bool) -> Result<(), Box<dyn std::error::Error>> {
    let json = if flat {
        serde_json::to_string_pretty(&example_list_value())?
    } else {
        example_matrix().to_json()?
    };
    println!("{}", json);
    Ok(())
}

fn cmd_example_document() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&example_document())?);
    Ok(())
}

fn to_json(value: &Value, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
