use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use prost::Message as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "protoc-gen-tagwire")]
#[command(about = "protoc plugin emitting reflection-free Rust proto3 codecs", long_about = None)]
struct Cli {
    /// Serialized FileDescriptorSet (from `protoc --descriptor_set_out`).
    /// When omitted, the binary runs as a protoc plugin over stdin/stdout.
    #[arg(long, value_name = "FILE", requires = "out_dir")]
    descriptor_set: Option<PathBuf>,

    /// Directory to write generated sources into (standalone mode).
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

fn main() {
    // stdout is the plugin protocol channel, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match (&cli.descriptor_set, &cli.out_dir) {
        (Some(set), Some(dir)) => run_standalone(set, dir),
        _ => run_plugin(),
    };
    if let Err(err) = result {
        eprintln!("protoc-gen-tagwire: {err}");
        std::process::exit(1);
    }
}

fn run_plugin() -> Result<(), tagwirec::Error> {
    let mut input = Vec::new();
    std::io::stdin().read_to_end(&mut input)?;
    let output = tagwirec::plugin::run(&input)?;
    std::io::stdout().write_all(&output)?;
    Ok(())
}

fn run_standalone(set_path: &Path, out_dir: &Path) -> Result<(), tagwirec::Error> {
    let bytes = std::fs::read(set_path)?;
    let set = prost_types::FileDescriptorSet::decode(bytes.as_slice())?;

    std::fs::create_dir_all(out_dir)?;
    for file in &set.file {
        let content = tagwirec::generate_file(file)?;
        let target = out_dir.join(tagwirec::plugin::output_name(file.name()));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, content)?;
        info!(file = %target.display(), "wrote codec");
    }
    std::fs::write(out_dir.join(tagwirec::RUNTIME_FILE_NAME), tagwirec::RUNTIME_SOURCE)?;
    Ok(())
}
