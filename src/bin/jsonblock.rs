use std::fs;
use std::path::PathBuf;
use std::process::exit;

use anyhow::Context;
use clap::Parser;
use jsonblock::plugins::RequiredKeys;
use jsonblock::{Document, DocumentParser, ParseConfig, UnterminatedPolicy};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Parse a document and print its embedded JSON blocks", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    JSONBLOCK_UNTERMINATED     error|consume (default: error)
    JSONBLOCK_READER_CAPACITY  Reader buffer size in bytes
    JSONBLOCK_FRONT_MATTER     true|false (default: true)
    RUST_LOG                   Log filter, e.g. jsonblock=debug

EXAMPLES:
    jsonblock notes.md                         # Print all nodes as JSON
    jsonblock notes.md --require id            # Every json block must have an \"id\" key
    jsonblock notes.md --unterminated consume  # Tolerate an object left open at the end
    jsonblock --schema                         # Print the output JSON schema")]
struct Args {
    /// Document to parse
    #[arg(required_unless_present = "schema")]
    file: Option<PathBuf>,

    /// Policy for an object still open at end of document: error, consume
    #[arg(long)]
    unterminated: Option<UnterminatedPolicy>,

    /// Treat a leading object as an ordinary json block
    #[arg(long)]
    no_front_matter: bool,

    /// Key every json block must contain (repeatable)
    #[arg(long = "require", value_name = "KEY")]
    required: Vec<String>,

    /// Print the JSON schema of the output and exit
    #[arg(long)]
    schema: bool,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.schema {
        let schema = schemars::schema_for!(Document);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let Some(path) = args.file else {
        anyhow::bail!("no document given");
    };
    let source = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut config = ParseConfig::from_env();
    if let Some(policy) = args.unterminated {
        config.unterminated = policy;
    }
    if args.no_front_matter {
        config.front_matter = false;
    }

    let mut parser = DocumentParser::with_config(&config);
    if !args.required.is_empty() {
        parser.register_extension("required-keys", RequiredKeys::new("json", args.required));
    }

    let document = match parser.parse(&source) {
        Ok(document) => document,
        Err(err) => {
            eprintln!("{}: {}", path.display(), err);
            exit(1);
        }
    };

    let output = if args.compact {
        serde_json::to_string(&document)?
    } else {
        serde_json::to_string_pretty(&document)?
    };
    println!("{output}");
    Ok(())
}
