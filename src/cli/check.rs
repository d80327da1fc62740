use std::path::PathBuf;
use std::process;

use clap::Args;
use rayon::prelude::*;

use super::{compile_input, parse_target};

#[derive(Args)]
pub struct CheckArgs {
    /// Input job files (.json)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Target dialect: glsl, opencl or cpp (default: the job's, else glsl)
    #[arg(long)]
    pub target: Option<String>,
}

pub fn cmd_check(args: CheckArgs) {
    let CheckArgs { inputs, target } = args;
    let target = parse_target(target.as_deref());

    let results: Vec<_> = inputs
        .par_iter()
        .map(|input| compile_input(input, target).map(|(_, target)| target))
        .collect();

    let mut ok = true;
    for (input, result) in inputs.iter().zip(results) {
        match result {
            Ok(target) => eprintln!("OK: {} ({})", input.display(), target),
            Err(failure) => {
                failure.render(input);
                ok = false;
            }
        }
    }
    if !ok {
        process::exit(1);
    }
}
