use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wallscript::{Resolver, ResolverConfig, ResolvedBlock, Script, Session};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "wallscript")]
#[command(
    version,
    about = "Resolve variables, math and functions in a map script",
    long_about = None
)]
struct Cli {
    /// Script to resolve (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Return partially resolved values instead of failing
    #[arg(long)]
    lenient: bool,

    /// Maximum resolution passes per value
    #[arg(long, default_value_t = ResolverConfig::default().max_passes)]
    max_passes: usize,

    /// Maximum nesting depth for the fallback on malformed spans
    #[arg(long, default_value_t = ResolverConfig::default().max_depth)]
    max_depth: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Print the final value of a global variable after the run
    #[arg(long, value_name = "NAME")]
    show_var: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallscript=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let source = match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading '{}'", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };

    let config = ResolverConfig {
        max_passes: cli.max_passes,
        max_depth: cli.max_depth,
        lenient: cli.lenient,
        ..ResolverConfig::default()
    };
    let resolver = Resolver::default().with_config(config);

    let mut script = Script::parse(&source)?;
    let mut session = Session::new(&resolver);
    let blocks = session.run(&mut script)?;

    match cli.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&blocks)?),
        Format::Text => print_text(&blocks),
    }

    for name in &cli.show_var {
        println!("{} = {}", name, session.variable(name)?);
    }

    Ok(())
}

fn print_text(blocks: &[ResolvedBlock]) {
    for block in blocks {
        println!(
            "[{}] {}:{}",
            block.index,
            block.name,
            block.data.as_deref().unwrap_or("")
        );
        for (i, record) in block.records.iter().enumerate() {
            if block.records.len() > 1 {
                println!("  #{}", i);
            }
            for field in record {
                println!("    {}: {}", field.name, field.value.as_deref().unwrap_or(""));
            }
        }
    }
}
