use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use byteconv_api::error::TransformError;
use byteconv_api::json::{record_from_json, record_to_json};
use byteconv_config_hcl::HclParser;
use byteconv_engine::{ByteconvConfig, ConfigParser, EngineError, TransformChain, TransformRegistry};
use byteconv_transform_bytes::{
    Charset, DEFAULT_SOURCE_CHARSET, DEFAULT_TARGET_CHARSET, Hex, UnmappableAction, convert,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "byteconv", about = "Re-encode record fields as bytes under another charset")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one string and print its bytes under both charsets.
    Convert {
        #[arg(default_value = "This is a binary string")]
        text: String,
        #[arg(long, default_value = DEFAULT_SOURCE_CHARSET)]
        source: String,
        #[arg(long, default_value = DEFAULT_TARGET_CHARSET)]
        target: String,
    },
    /// Run newline-delimited JSON records through the configured transforms.
    Apply {
        /// Path to the pipeline configuration (TOML or HCL).
        #[arg(long, default_value = "pipeline.toml", env = "BYTECONV_CONFIG")]
        config: PathBuf,
        /// Read records from this file instead of stdin.
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Convert { text, source, target } => {
            run_convert(&text, &source, &target).map_err(EngineError::from)
        }
        Command::Apply { config, input } => run_apply(&config, input.as_deref()),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "byteconv failed");
        std::process::exit(1);
    }
}

fn run_convert(text: &str, source: &str, target: &str) -> Result<(), TransformError> {
    let source = Charset::for_name(source)?;
    let target = Charset::for_name(target)?;

    let source_bytes = source.encode(text, UnmappableAction::Replace)?;
    println!("Source String Hex: {}", Hex(&source_bytes));

    let converted = convert(text, &source, &target)?;
    println!("Converted String Hex: {}", Hex(&converted));
    println!("Converted String:<start>{}<end>", target.decode(&converted));
    Ok(())
}

fn run_apply(config_path: &Path, input: Option<&Path>) -> Result<(), EngineError> {
    tracing::info!(config = %config_path.display(), "loading configuration");
    let hcl = HclParser;
    let config = ByteconvConfig::load(config_path, &[&hcl as &dyn ConfigParser])?;

    tracing::info!(transforms = config.transforms.len(), "bootstrapping transform chain");
    let mut chain = TransformChain::bootstrap(&config, &TransformRegistry::with_builtins())?;

    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(|e| {
            EngineError::Config(format!("{}: {e}", path.display()))
        })?)),
        None => Box::new(std::io::stdin().lock()),
    };
    let mut out = BufWriter::new(std::io::stdout().lock());

    let mut count = 0usize;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let ctx = format!("line {}", i + 1);
        let record = record_from_json(&line).map_err(|e| EngineError::from(e).with_context(&ctx))?;
        let record = chain.apply(record).map_err(|e| e.with_context(&ctx))?;

        serde_json::to_writer(&mut out, &record_to_json(&record)).map_err(std::io::Error::from)?;
        writeln!(out)?;
        count += 1;
    }
    out.flush()?;

    chain.close();
    tracing::info!(records = count, "done");
    Ok(())
}
