//! GLSL 1.50 fragment shader source.

use super::{Dialect, Target};
use crate::sc::Ty;

pub struct Glsl;

impl Dialect for Glsl {
    fn target(&self) -> Target {
        Target::Glsl
    }

    /// Arrays are declared with their flattened length: GLSL 1.50 has no
    /// arrays of arrays, so multi-dimensional data is stored row-major.
    fn type_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Array(base, _) => format!("{}[{}]", base.display(), ty.flat_len()),
            other => other.display(),
        }
    }

    fn first_class_arrays(&self) -> bool {
        true
    }

    fn declare_array(&self, ty: &Ty, name: &str, init: &str) -> String {
        let ty_name = self.type_name(ty);
        format!("{} {} = {}({});", ty_name, name, ty_name, init)
    }

    fn header(&self) -> &'static str {
        "#version 150\n"
    }

    fn uniform_decl(&self, ty: &Ty, identifier: &str, _init: &str) -> String {
        format!("uniform {} {};\n", self.type_name(ty), identifier)
    }
}
