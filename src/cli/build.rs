use std::path::PathBuf;
use std::process;

use clap::Args;
use rayon::prelude::*;
use tracing::info;

use super::{compile_input, parse_target};

#[derive(Args)]
pub struct BuildArgs {
    /// Input job files (.json)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Output file (default: <input> with the target's extension; "-" for stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Target dialect: glsl, opencl or cpp (default: the job's, else glsl)
    #[arg(long)]
    pub target: Option<String>,
}

pub fn cmd_build(args: BuildArgs) {
    let BuildArgs {
        inputs,
        output,
        target,
    } = args;
    let target = parse_target(target.as_deref());
    if output.is_some() && inputs.len() > 1 {
        eprintln!("error: --output requires a single input");
        process::exit(1);
    }

    let results: Vec<_> = inputs
        .par_iter()
        .map(|input| compile_input(input, target))
        .collect();

    let mut failed = 0;
    for (input, result) in inputs.iter().zip(results) {
        let (code, target) = match result {
            Ok(compiled) => compiled,
            Err(failure) => {
                failure.render(input);
                failed += 1;
                continue;
            }
        };
        let out_path = output
            .clone()
            .unwrap_or_else(|| input.with_extension(target.extension()));
        if out_path.as_os_str() == "-" {
            print!("{}", code);
            continue;
        }
        if let Err(e) = std::fs::write(&out_path, &code) {
            eprintln!("error: cannot write '{}': {}", out_path.display(), e);
            process::exit(1);
        }
        info!(input = %input.display(), target = target.name(), bytes = code.len(), "wrote");
        eprintln!("Compiled -> {}", out_path.display());
    }

    if failed > 0 {
        eprintln!("error: {} of {} jobs failed", failed, inputs.len());
        process::exit(1);
    }
}
