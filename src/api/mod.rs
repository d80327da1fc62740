use std::path::Path;

use tracing::{debug, info};

use crate::diagnostic::{render_diagnostics, Diagnostic};
use crate::dialect::Target;
use crate::hash::{hash_function, ContentHash};
use crate::job::Job;
use crate::program::{FunctionDef, Program};
use crate::sc::{CompileError, ScCompiler};


/// Options controlling compilation: target dialect and output framing.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Target dialect.
    pub target: Target,
    /// Emit the dialect header (e.g. `#version 150`) before everything else.
    pub header: bool,
    /// Mark the constant and body sections of each function with comments.
    pub section_comments: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            target: Target::Glsl,
            header: true,
            section_comments: true,
        }
    }
}

impl CompileOptions {
    pub fn for_target(target: Target) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    pub fn with_header(mut self, on: bool) -> Self {
        self.header = on;
        self
    }

    pub fn with_section_comments(mut self, on: bool) -> Self {
        self.section_comments = on;
        self
    }
}

fn to_diagnostics(errors: Vec<CompileError>) -> Vec<Diagnostic> {
    errors.into_iter().map(Diagnostic::from).collect()
}

/// Resolve options for a job. An explicit target wins over the job's own,
/// which wins over the default.
pub fn job_options(job: &Job, target: Option<Target>) -> Result<CompileOptions, Vec<Diagnostic>> {
    let target = match target {
        Some(target) => target,
        None => job
            .target()
            .map_err(|e| vec![e.to_diagnostic()])?
            .unwrap_or_default(),
    };
    Ok(CompileOptions::for_target(target))
}

/// Load a job file from disk.
pub fn load_job(path: &Path) -> Result<Job, Vec<Diagnostic>> {
    Job::load(path).map_err(|e| vec![e.to_diagnostic()])
}

/// Compile an assembled program.
pub fn compile_program(program: &Program, options: &CompileOptions) -> Result<String, Vec<Diagnostic>> {
    debug!(
        target = options.target.name(),
        uniforms = program.uniforms.len(),
        functions = program.functions.len(),
        "compiling program"
    );
    program.emit(options).map_err(to_diagnostics)
}

/// Compile every function of a job into one source file.
pub fn compile_job(job: &Job, options: &CompileOptions) -> Result<String, Vec<Diagnostic>> {
    let program = job.to_program().map_err(|e| vec![e.to_diagnostic()])?;
    compile_program(&program, options)
}

/// Compile a job without keeping the output.
pub fn check_job(job: &Job, options: &CompileOptions) -> Result<(), Vec<Diagnostic>> {
    compile_job(job, options).map(|_| ())
}

/// Compile a job given as JSON text, rendering any diagnostics to stderr.
pub fn compile_source(
    json: &str,
    filename: &str,
    target: Option<Target>,
) -> Result<String, Vec<Diagnostic>> {
    let job = match Job::from_json(json) {
        Ok(job) => job,
        Err(e) => {
            let errors = vec![e.to_diagnostic()];
            render_diagnostics(&errors, filename, None);
            return Err(errors);
        }
    };
    let result = job_options(&job, target).and_then(|options| compile_job(&job, &options));
    if let Err(errors) = &result {
        render_diagnostics(errors, filename, job.source.as_deref());
    } else {
        info!(file = filename, "compiled");
    }
    result
}

/// Compile a single function, with the dialect header if the options ask for it.
pub fn compile_function(def: &FunctionDef, options: &CompileOptions) -> Result<String, Vec<Diagnostic>> {
    let mut sc = ScCompiler::with_options(options);
    if options.header {
        sc.write_raw(sc.dialect().header());
        sc.write_raw("\n");
    }
    sc.define_function(&def.name, &def.params, &def.result, &def.function)
        .map_err(|e| vec![Diagnostic::from(e)])?;
    Ok(sc.into_output())
}

/// Content hash of every function in a job, in declaration order.
pub fn hash_job(job: &Job, target: Target) -> Result<Vec<(String, ContentHash)>, Vec<Diagnostic>> {
    let program = job.to_program().map_err(|e| vec![e.to_diagnostic()])?;
    let mut hashes = Vec::new();
    let mut errors = Vec::new();
    for def in &program.functions {
        match hash_function(target, def) {
            Ok(hash) => hashes.push((def.name.clone(), hash)),
            Err(e) => errors.push(Diagnostic::from(e)),
        }
    }
    if errors.is_empty() {
        Ok(hashes)
    } else {
        Err(errors)
    }
}
