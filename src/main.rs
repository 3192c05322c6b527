use std::fs;
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use pyjs::config::{CaseConvention, Scoping, TranslateOptions};
use pyjs::{backend, lexer, logging, server};

#[derive(Parser)]
#[command(name = "pyjs")]
#[command(version)]
#[command(about = "Translate Python programs to JavaScript")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a Python file (or stdin)
    Translate {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,

        /// Output language
        #[arg(short, long, default_value = "javascript")]
        target: String,

        /// Options file (YAML)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Convert snake_case function names to camelCase
        #[arg(long)]
        camel_case: bool,

        /// Track declarations per function instead of once per run
        #[arg(long)]
        lexical_scoping: bool,

        /// Print untranslated constructs to stderr
        #[arg(long)]
        report: bool,
    },

    /// Print the diagnostic token stream as JSON
    Tokens {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
    },

    /// Serve the translator over HTTP
    Serve {
        /// Listen address
        #[arg(long, default_value = "127.0.0.1:5000")]
        addr: SocketAddr,

        /// Options file (YAML)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Translate {
            file,
            target,
            config,
            camel_case,
            lexical_scoping,
            report,
        } => {
            let mut options = load_options(config.as_deref())?;
            if camel_case {
                options.case_convention = CaseConvention::SnakeToCamel;
            }
            if lexical_scoping {
                options.scoping = Scoping::Lexical;
            }

            let source = read_source(file.as_deref())?;
            let backend =
                backend(&target, &options).ok_or_else(|| anyhow!("Unknown target '{target}'"))?;
            let translation = backend.translate_source(&source)?;
            if !translation.code.is_empty() {
                println!("{}", translation.code);
            }
            if report {
                for degradation in &translation.degradations {
                    eprintln!(
                        "untranslated {} at line {} in {}",
                        degradation.kind, degradation.line, degradation.scope
                    );
                }
            }
        }
        Commands::Tokens { file } => {
            let source = read_source(file.as_deref())?;
            let records = lexer::token_records(&source)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Serve { addr, config } => {
            let options = load_options(config.as_deref())?;
            let runtime = tokio::runtime::Runtime::new().context("Starting async runtime")?;
            runtime.block_on(server::serve(addr, options))?;
        }
    }
    Ok(())
}

fn load_options(path: Option<&Path>) -> Result<TranslateOptions> {
    match path {
        Some(path) => Ok(TranslateOptions::load(path)?),
        None => Ok(TranslateOptions::default()),
    }
}

fn read_source(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        return fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()));
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Reading stdin")?;
    Ok(buffer)
}
