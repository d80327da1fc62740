use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::build::{cmd_build, BuildArgs};
use cli::check::{cmd_check, CheckArgs};
use cli::hash::cmd_hash;

#[derive(Parser)]
#[command(
    name = "subcurv",
    version,
    about = "SubCurv shape compiler: shape functions to GLSL, OpenCL C and C++"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile job files to target source
    Build(BuildArgs),
    /// Compile job files without writing output
    Check(CheckArgs),
    /// Show content hashes of compiled functions
    Hash {
        /// Input job file
        input: PathBuf,
        /// Show full 256-bit hashes instead of short form
        #[arg(long)]
        full: bool,
        /// Target dialect (default: the job's, else glsl)
        #[arg(long)]
        target: Option<String>,
    },
    /// List supported target dialects
    Targets,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,subcurv=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => cmd_build(args),
        Command::Check(args) => cmd_check(args),
        Command::Hash {
            input,
            full,
            target,
        } => cmd_hash(input, full, target.as_deref()),
        Command::Targets => cli::cmd_targets(),
    }
}
