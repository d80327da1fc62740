//! SubCurv: the shape compiler.
//!
//! SubCurv is a statically typed subset of the shape language that maps
//! directly onto GLSL, OpenCL C and C++. The compiler works on function
//! *values*: nonlocals captured by closures become compile time constants,
//! and intermediate function calls are inline expanded, so the generated
//! code needs neither first-class functions nor runtime polymorphism.
//!
//! Output is SSA style: every evaluated node becomes one assignment to a
//! fresh variable `r<N>`. Pure nodes (those that read no local variables)
//! are written to a separate *constants* stream that precedes the function
//! body, and are shared between occurrences through a scoped cache.

mod constant;
mod constify;
mod error;
mod expr;
mod frame;
mod handle;
mod index;
mod stmt;
pub mod types;
mod unify;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::api::CompileOptions;
use crate::dialect::{Dialect, Target};
use crate::op::{Op, OpRef};
use crate::span::Span;
use crate::value::{Module, Value};

pub use error::{CompileError, ErrorKind, ScResult};
pub use frame::Frame;
pub use handle::ScValue;
pub use types::{Scalar, Ty};

/// CSE entries are keyed by the nonlocal module as well as the node:
/// nonlocal slots only mean something relative to their module.
type CacheKey = (usize, OpRef);
type OpCache = HashMap<CacheKey, ScValue>;

/// Compiler state for one output program.
///
/// Functions are compiled one at a time with `define_function`; each one
/// starts with fresh caches, so nothing leaks from one function into the
/// next. Successfully compiled functions accumulate in the output text.
pub struct ScCompiler {
    target: Target,
    dialect: &'static dyn Dialect,
    section_comments: bool,
    out: String,
    constants: String,
    body: String,
    in_constants: bool,
    depth: usize,
    valcount: u32,
    valcache: HashMap<Value, ScValue>,
    opcaches: Vec<OpCache>,
    root: Rc<Module>,
}

impl ScCompiler {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            dialect: target.dialect(),
            section_comments: true,
            out: String::new(),
            constants: String::new(),
            body: String::new(),
            in_constants: false,
            depth: 0,
            valcount: 0,
            valcache: HashMap::new(),
            opcaches: vec![OpCache::new()],
            root: Rc::new(Module::new()),
        }
    }

    pub fn with_options(options: &CompileOptions) -> Self {
        Self::new(options.target).with_section_comments(options.section_comments)
    }

    /// Emit the `/* constants */` and `/* body */` markers.
    pub fn with_section_comments(mut self, on: bool) -> Self {
        self.section_comments = on;
        self
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    /// Text of everything emitted so far.
    pub fn output(&self) -> &str {
        &self.out
    }

    pub fn into_output(self) -> String {
        self.out
    }

    /// Append text outside any function (headers, declarations).
    pub fn write_raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Compile `func` into a target-language function called `name`.
    ///
    /// A single parameter is passed to the function as is; several are
    /// passed as a list. The compiled result must have exactly the declared
    /// type. On failure nothing is written to the output.
    pub fn define_function(
        &mut self,
        name: &str,
        param_types: &[Ty],
        result_type: &Ty,
        func: &Value,
    ) -> ScResult<()> {
        debug!(
            name,
            target = %self.target,
            params = ?param_types.iter().map(Ty::display).collect::<Vec<_>>(),
            result = %result_type,
            "compiling function"
        );
        let callee = func.callable().ok_or_else(|| {
            CompileError::unsupported_value(Span::dummy(), format!("{} is not a function", func))
        })?;
        for ty in param_types.iter().chain(std::iter::once(result_type)) {
            self.check_supported(ty, Span::dummy())?;
        }

        self.begin_function();
        let params: Vec<ScValue> = param_types
            .iter()
            .map(|ty| self.new_value(ty.clone()))
            .collect();
        let arg = match params.as_slice() {
            [single] => Op::compiled(single.clone()),
            _ => Op::list(params.iter().cloned().map(Op::compiled).collect()),
        };
        let mut frame = self.root_frame();
        let outcome = callee
            .sc_call_expr(self, &arg, Span::dummy(), &mut frame)
            .and_then(|result| {
                if result.ty == *result_type {
                    Ok(result)
                } else {
                    Err(CompileError::new(
                        ErrorKind::ResultTypeMismatch,
                        Span::dummy(),
                        format!(
                            "{} function returns {}, expected {}",
                            name, result.ty, result_type
                        ),
                    ))
                }
            });
        let code = self.end_function();
        let result = outcome?;

        let mut text = self.dialect.signature(name, &params, result_type);
        text.push_str("{\n");
        text.push_str(&self.dialect.prologue(&params));
        text.push_str(&code);
        text.push_str(&self.dialect.epilogue(&result));
        text.push_str("}\n");
        self.out.push_str(&text);
        debug!(name, values = self.valcount, "compiled function");
        Ok(())
    }

    /// Reset per-function state: value numbering, constant dedup, CSE.
    pub fn begin_function(&mut self) {
        self.valcount = 0;
        self.valcache.clear();
        self.opcaches.clear();
        self.opcaches.push(OpCache::new());
        self.constants.clear();
        self.body.clear();
        self.in_constants = false;
        self.depth = 0;
    }

    /// Drain the constants and body streams into function text.
    fn end_function(&mut self) -> String {
        let mut code = String::new();
        if self.section_comments {
            code.push_str("  /* constants */\n");
        }
        code.push_str(&std::mem::take(&mut self.constants));
        if self.section_comments {
            code.push_str("  /* body */\n");
        }
        code.push_str(&std::mem::take(&mut self.body));
        code
    }

    pub(crate) fn new_value(&mut self, ty: Ty) -> ScValue {
        let value = ScValue::new(self.valcount, ty);
        self.valcount += 1;
        value
    }

    /// Write one statement to the current stream.
    pub(crate) fn emit(&mut self, line: &str) {
        let depth = if self.in_constants { 0 } else { self.depth };
        let stream = if self.in_constants {
            &mut self.constants
        } else {
            &mut self.body
        };
        for _ in 0..=depth {
            stream.push_str("  ");
        }
        stream.push_str(line);
        stream.push('\n');
    }

    /// Declare a fresh variable of type `ty` initialized to `init`.
    pub fn bind(&mut self, ty: Ty, init: &str, span: Span) -> ScResult<ScValue> {
        self.check_supported(&ty, span)?;
        if matches!(ty, Ty::Array(..)) && !self.dialect.first_class_arrays() {
            return Err(CompileError::unsupported_value(
                span,
                format!("{} values can't be copied in {}", ty, self.dialect.name()),
            ));
        }
        let value = self.new_value(ty);
        let line = self.dialect.declare(&value.ty, &value.to_string(), init);
        self.emit(&line);
        Ok(value)
    }

    pub(crate) fn check_supported(&self, ty: &Ty, span: Span) -> ScResult<()> {
        if self.dialect.supports(ty) {
            Ok(())
        } else {
            Err(CompileError::unsupported_value(
                span,
                format!("type {} is not supported by {}", ty, self.dialect.name()),
            ))
        }
    }

    /// True while output goes to the constants stream.
    pub(crate) fn in_constants(&self) -> bool {
        self.in_constants
    }

    /// Run `f` with pure output going to the constants stream (`true`) or
    /// the body (`false`). The previous setting is restored on every exit.
    pub(crate) fn with_purity<R>(&mut self, pure: bool, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = std::mem::replace(&mut self.in_constants, pure);
        let result = f(self);
        self.in_constants = saved;
        result
    }

    /// Run `f` inside a nested CSE scope, e.g. a loop body or an `if` arm.
    /// Entries made inside are dropped when the scope ends, error or not.
    pub(crate) fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.opcaches.push(OpCache::new());
        self.depth += 1;
        trace!(scopes = self.opcaches.len(), "push scope");
        let result = f(self);
        self.depth -= 1;
        self.opcaches.pop();
        trace!(scopes = self.opcaches.len(), "pop scope");
        result
    }

    /// Frame for code outside any closure, e.g. a reactive expression.
    /// All such frames share one module so their CSE entries agree.
    pub(crate) fn root_frame(&self) -> Frame {
        Frame::new(0, self.root.clone())
    }

    /// Number of CSE scopes currently open.
    pub fn scope_depth(&self) -> usize {
        self.opcaches.len()
    }

    fn cached(&self, key: &CacheKey) -> Option<ScValue> {
        self.opcaches
            .iter()
            .rev()
            .find_map(|cache| cache.get(key))
            .cloned()
    }

    fn remember(&mut self, key: CacheKey, value: ScValue) {
        if let Some(cache) = self.opcaches.last_mut() {
            cache.insert(key, value);
        }
    }
}
