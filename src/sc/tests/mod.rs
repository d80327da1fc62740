mod basics;

use std::rc::Rc;

use crate::dialect::Target;
use crate::function::Closure;
use crate::op::{OpRef, Pattern};
use crate::sc::{ScCompiler, ScResult, Ty};
use crate::value::{Module, Value};

/// A one-parameter closure bound to slot 0.
pub(super) fn closure(nslots: usize, body: OpRef, module: Module) -> Value {
    closure_with(Pattern::Slot(0), nslots, body, module)
}

pub(super) fn closure_with(pattern: Pattern, nslots: usize, body: OpRef, module: Module) -> Value {
    Value::function(Closure::new("f", pattern, body, Rc::new(module), nslots))
}

pub(super) fn compile(target: Target, params: &[Ty], result: Ty, func: &Value) -> ScResult<String> {
    let mut sc = ScCompiler::new(target);
    sc.define_function("f", params, &result, func)?;
    Ok(sc.into_output())
}

pub(super) fn glsl(params: &[Ty], result: Ty, func: &Value) -> ScResult<String> {
    compile(Target::Glsl, params, result, func)
}
