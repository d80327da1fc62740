pub mod build;
pub mod check;
pub mod hash;

use std::path::Path;
use std::process;

use subcurv::diagnostic::{render_diagnostics, Diagnostic};
use subcurv::Target;

/// Resolve a `--target` flag; exits on an unknown name.
pub fn parse_target(target: Option<&str>) -> Option<Target> {
    let name = target?;
    match name.parse() {
        Ok(target) => Some(target),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

/// A job that failed, with the source text its spans refer to.
pub struct Failure {
    pub errors: Vec<Diagnostic>,
    pub source: Option<String>,
}

impl Failure {
    pub fn render(&self, input: &Path) {
        render_diagnostics(&self.errors, &input.display().to_string(), self.source.as_deref());
    }
}

/// Load and compile one job file. Safe to call from worker threads:
/// everything the compiler builds stays inside this call.
pub fn compile_input(input: &Path, target: Option<Target>) -> Result<(String, Target), Failure> {
    let job = subcurv::load_job(input).map_err(|errors| Failure {
        errors,
        source: None,
    })?;
    let fail = |errors| Failure {
        errors,
        source: job.source.clone(),
    };
    let options = subcurv::job_options(&job, target).map_err(fail)?;
    let code = subcurv::compile_job(&job, &options).map_err(fail)?;
    Ok((code, options.target))
}

pub fn cmd_targets() {
    for target in Target::ALL {
        let header = target.dialect().header().trim_end();
        println!("  {:<8} .{:<5} {}", target.name(), target.extension(), header);
    }
}
