//! OpenCL C 1.1 kernel source.
//!
//! Vector types are spelled `floatN`/`uintN` and built with compound
//! literals. There are no matrix types and no boolean vectors.

use super::{format_number, Dialect, Target};
use crate::sc::{Scalar, Ty};

pub struct OpenCl;

impl Dialect for OpenCl {
    fn target(&self) -> Target {
        Target::OpenCl
    }

    fn type_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Vec(Scalar::Num, n) => format!("float{}", n),
            Ty::Vec(Scalar::Bool, n) => format!("bool{}", n),
            Ty::Vec(Scalar::Bool32, n) => format!("uint{}", n),
            Ty::Array(base, _) => format!("{}[{}]", self.type_name(base), ty.flat_len()),
            other => other.display(),
        }
    }

    fn supports(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Error | Ty::Mat(_) | Ty::Vec(Scalar::Bool, _) => false,
            Ty::Array(base, _) => self.supports(base),
            _ => true,
        }
    }

    fn construct(&self, ty: &Ty, args: &str) -> String {
        format!("({})({})", self.type_name(ty), args)
    }

    fn int_cast(&self, expr: &str) -> String {
        format!("(int)({})", expr)
    }

    fn uint_cast(&self, expr: &str) -> String {
        format!("(uint)({})", expr)
    }

    fn num_literal(&self, x: f64) -> String {
        format_number(x, "f")
    }

    /// OpenCL vectors can't be subscripted; index through a pointer to
    /// the first component.
    fn vector_index(&self, base: &str, elem: &Ty, index: &str) -> String {
        format!("(({}*)&{})[{}]", self.type_name(elem), base, index)
    }

    fn equal(&self, lhs: &str, rhs: &str, ty: &Ty) -> String {
        if ty.is_vec() {
            format!("all({} == {})", lhs, rhs)
        } else {
            format!("({} == {})", lhs, rhs)
        }
    }

    fn math_fn(&self, glsl_name: &'static str) -> &'static str {
        match glsl_name {
            "abs" => "fabs",
            "atan" => "atan2",
            "max" => "fmax",
            "min" => "fmin",
            other => other,
        }
    }

    fn header(&self) -> &'static str {
        "/* OpenCL C 1.1 */\n"
    }

    fn uniform_decl(&self, ty: &Ty, identifier: &str, init: &str) -> String {
        format!("__constant {} {} = {};\n", self.type_name(ty), identifier, init)
    }
}
