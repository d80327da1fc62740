use std::path::PathBuf;
use std::process;

use subcurv::diagnostic::render_diagnostics;

use super::parse_target;

pub fn cmd_hash(input: PathBuf, full: bool, target: Option<&str>) {
    let filename = input.display().to_string();
    let job = match subcurv::load_job(&input) {
        Ok(job) => job,
        Err(errors) => {
            render_diagnostics(&errors, &filename, None);
            process::exit(1);
        }
    };
    let target = match subcurv::job_options(&job, parse_target(target)) {
        Ok(options) => options.target,
        Err(errors) => {
            render_diagnostics(&errors, &filename, None);
            process::exit(1);
        }
    };
    let hashes = match subcurv::hash_job(&job, target) {
        Ok(hashes) => hashes,
        Err(errors) => {
            render_diagnostics(&errors, &filename, job.source.as_deref());
            process::exit(1);
        }
    };

    eprintln!("Job: {} ({})", filename, target);
    for (name, hash) in hashes {
        if full {
            println!("  {} {}", hash.to_hex(), name);
        } else {
            println!("  {} {}", hash, name);
        }
    }
}
