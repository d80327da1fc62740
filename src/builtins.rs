//! Standard math functions available to shape code.
//!
//! Each builtin is a function value whose `sc_call_expr` emits a call to
//! the corresponding target-language intrinsic. Scalar functions apply
//! elementwise to numeric vectors, as they do in GLSL.

use std::rc::Rc;

use crate::function::{tuple_args, ScFunction};
use crate::op::OpRef;
use crate::sc::{CompileError, Frame, ScCompiler, ScResult, ScValue, Ty};
use crate::span::Span;
use crate::value::{Module, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Prim {
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Max,
    Min,
    Pow,
    Atan2,
    Mag,
    Dot,
}

impl Prim {
    pub const ALL: [Prim; 15] = [
        Prim::Sqrt,
        Prim::Abs,
        Prim::Floor,
        Prim::Ceil,
        Prim::Sin,
        Prim::Cos,
        Prim::Tan,
        Prim::Exp,
        Prim::Log,
        Prim::Max,
        Prim::Min,
        Prim::Pow,
        Prim::Atan2,
        Prim::Mag,
        Prim::Dot,
    ];

    /// Name in shape code.
    pub fn name(self) -> &'static str {
        match self {
            Prim::Sqrt => "sqrt",
            Prim::Abs => "abs",
            Prim::Floor => "floor",
            Prim::Ceil => "ceil",
            Prim::Sin => "sin",
            Prim::Cos => "cos",
            Prim::Tan => "tan",
            Prim::Exp => "exp",
            Prim::Log => "log",
            Prim::Max => "max",
            Prim::Min => "min",
            Prim::Pow => "pow",
            Prim::Atan2 => "atan2",
            Prim::Mag => "mag",
            Prim::Dot => "dot",
        }
    }

    /// GLSL intrinsic; other dialects translate it through `math_fn`.
    pub fn glsl_name(self) -> &'static str {
        match self {
            Prim::Atan2 => "atan",
            Prim::Mag => "length",
            other => other.name(),
        }
    }

    pub fn from_name(name: &str) -> Option<Prim> {
        Prim::ALL.into_iter().find(|p| p.name() == name)
    }

    fn arity(self) -> usize {
        match self {
            Prim::Max | Prim::Min | Prim::Pow | Prim::Atan2 | Prim::Dot => 2,
            _ => 1,
        }
    }
}

/// A builtin function value.
#[derive(Debug)]
pub struct Builtin {
    pub prim: Prim,
}

impl ScFunction for Builtin {
    fn name(&self) -> &str {
        self.prim.name()
    }

    fn sc_call_expr(
        &self,
        sc: &mut ScCompiler,
        arg: &OpRef,
        span: Span,
        caller: &mut Frame,
    ) -> ScResult<ScValue> {
        let name = self.prim.name();
        let glsl = self.prim.glsl_name();
        if self.prim.arity() == 1 {
            let x = sc.compile_expr(arg, caller)?;
            return match self.prim {
                Prim::Mag if x.ty.is_num_vec() => sc.unary_call(Ty::Num, glsl, &x, span),
                Prim::Mag => Err(wrong_arg(name, &x.ty, span)),
                _ if x.ty.is_num() || x.ty.is_num_vec() => {
                    sc.unary_call(x.ty.clone(), glsl, &x, span)
                }
                _ => Err(wrong_arg(name, &x.ty, span)),
            };
        }
        let [a, b] = tuple_args::<2>(sc, name, arg, span, caller)?;
        let (x, y) = sc.plex_unify(&a, &b, span)?;
        if !(x.ty.is_num() || x.ty.is_num_vec()) {
            return Err(wrong_arg(name, &x.ty, span));
        }
        match self.prim {
            Prim::Dot if x.ty.is_num_vec() => sc.bincall(Ty::Num, glsl, &x, &y, span),
            Prim::Dot => Err(wrong_arg(name, &x.ty, span)),
            _ => sc.bincall(x.ty.clone(), glsl, &x, &y, span),
        }
    }
}

fn wrong_arg(name: &str, ty: &Ty, span: Span) -> CompileError {
    CompileError::type_mismatch(span, format!("{}: argument of type {} not supported", name, ty))
}

/// The function value bound to a builtin name.
pub fn builtin_value(name: &str) -> Option<Value> {
    Prim::from_name(name).map(|prim| Value::function(Builtin { prim }))
}

/// A module binding every builtin by name, for resolving nonlocals.
pub fn builtins_module() -> Rc<Module> {
    let mut module = Module::new();
    for prim in Prim::ALL {
        module.define(prim.name(), Value::function(Builtin { prim }));
    }
    Rc::new(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for prim in Prim::ALL {
            assert_eq!(Prim::from_name(prim.name()), Some(prim));
        }
        assert_eq!(Prim::from_name("cbrt"), None);
        assert_eq!(Prim::Atan2.glsl_name(), "atan");
        assert_eq!(Prim::Mag.glsl_name(), "length");
    }

    #[test]
    fn test_builtins_module_binds_every_name() {
        let module = builtins_module();
        assert_eq!(module.len(), Prim::ALL.len());
        let sqrt = module.lookup("sqrt").and_then(Value::callable);
        assert_eq!(sqrt.map(|f| f.name().to_string()), Some("sqrt".to_string()));
        assert!(builtin_value("nope").is_none());
    }
}
