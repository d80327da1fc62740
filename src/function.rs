//! Function values and their code generation hook.
//!
//! The compiler never inspects a function: a call `f(arg)` folds `f` to a
//! value and hands the unevaluated argument expression to its
//! `sc_call_expr`, which emits whatever code the call needs. Builtins and
//! user closures plug in the same way.

use std::fmt;
use std::rc::Rc;

use crate::op::{OpKind, OpRef, Pattern};
use crate::sc::{CompileError, Frame, ScCompiler, ScResult, ScValue};
use crate::span::Span;
use crate::value::Module;

/// A function value the shape compiler can inline.
pub trait ScFunction: fmt::Debug {
    fn name(&self) -> &str;

    /// Generate code for a call with argument expression `arg`, evaluated in
    /// the caller's frame.
    fn sc_call_expr(
        &self,
        sc: &mut ScCompiler,
        arg: &OpRef,
        span: Span,
        caller: &mut Frame,
    ) -> ScResult<ScValue>;
}

/// A user-defined function: a parameter pattern and a body closed over
/// its nonlocal bindings.
pub struct Closure {
    pub name: String,
    pub pattern: Pattern,
    pub body: OpRef,
    pub nonlocals: Rc<Module>,
    /// Size of the call frame.
    pub nslots: usize,
}

impl Closure {
    pub fn new(
        name: &str,
        pattern: Pattern,
        body: OpRef,
        nonlocals: Rc<Module>,
        nslots: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            pattern,
            body,
            nonlocals,
            nslots,
        }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("nslots", &self.nslots)
            .finish()
    }
}

impl ScFunction for Closure {
    fn name(&self) -> &str {
        &self.name
    }

    /// Inline expansion: bind the argument in a fresh frame, compile the body.
    fn sc_call_expr(
        &self,
        sc: &mut ScCompiler,
        arg: &OpRef,
        _span: Span,
        caller: &mut Frame,
    ) -> ScResult<ScValue> {
        let mut bindings = Vec::new();
        sc.match_pattern(&self.pattern, arg, caller, &mut bindings)?;
        let mut frame = Frame::new(self.nslots, self.nonlocals.clone())
            .with_constant_slots(sc.in_constants());
        for (slot, value) in bindings {
            frame.bind(slot, value, false);
        }
        sc.compile_expr(&self.body, &mut frame)
    }
}

/// Compile the argument of an `N`-argument builtin.
///
/// A list literal of exactly `N` elements is compiled element by element,
/// left to right. Any other argument must compile to a list value of count
/// `N`, which is split into its components.
pub fn tuple_args<const N: usize>(
    sc: &mut ScCompiler,
    name: &str,
    arg: &OpRef,
    span: Span,
    caller: &mut Frame,
) -> ScResult<[ScValue; N]> {
    let mut args = Vec::with_capacity(N);
    match &arg.kind {
        OpKind::List(items) if items.len() == N => {
            for item in items {
                args.push(sc.compile_expr(item, caller)?);
            }
        }
        _ => {
            let list = sc.compile_expr(arg, caller)?;
            if !list.ty.is_list() || list.ty.count() != N || list.ty.plex_array_rank() > 1 {
                return Err(CompileError::type_mismatch(
                    span,
                    format!("{}: expected {} arguments, got {}", name, N, list.ty),
                ));
            }
            for i in 0..N {
                args.push(sc.element(&list, i, span)?);
            }
        }
    }
    args.try_into().map_err(|args: Vec<ScValue>| {
        CompileError::type_mismatch(
            span,
            format!("{}: expected {} arguments, got {}", name, N, args.len()),
        )
    })
}
