//! Wikiflat CLI
//!
//! Usage:
//!   wikiflat [OPTIONS] [FILE]
//!
//! Options:
//!   -s, --site <FILE>    Site description (TOML format)
//!   -t, --title <TITLE>  Title of the page being flattened
//!   -u, --unhandled      List unresolved magic words and templates on stderr
//!   -h, --help           Print help
//!
//! Log verbosity follows `RUST_LOG` (default `warn`).

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wikiflat::{flatten_with_config, EvalError, FlattenConfig, FlattenError, Site};

#[derive(Parser)]
#[command(name = "wikiflat")]
#[command(about = "Flatten wiki markup by evaluating magic words and templates")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Site description with namespaces and magic words (TOML format)
    #[arg(short, long)]
    site: Option<PathBuf>,

    /// Title of the page being flattened
    #[arg(short, long)]
    title: Option<String>,

    /// List unresolved magic words and templates on stderr
    #[arg(short, long)]
    unhandled: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Load site
    let site = match &cli.site {
        Some(path) => match Site::from_file(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading site '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Site::default(),
    };

    // Read input
    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let mut config = FlattenConfig::new().with_site(site);
    if let Some(title) = cli.title {
        config = config.with_title(title);
    }

    match flatten_with_config(&source, &config) {
        Ok(result) => {
            print!("{}", result.text());
            if cli.unhandled {
                for word in result.unhandled_words().iter() {
                    eprintln!("unhandled: {}", word);
                }
            }
        }
        Err(FlattenError::Eval(EvalError::Parse(errors))) => {
            for error in &errors {
                eprint!("{}", error.format(&source, &filename));
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
