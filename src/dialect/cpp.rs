//! C++ using the GLM vector library, exported with C linkage.
//!
//! Functions take their parameters through `const T*` pointers and write
//! the result through a `T* result` pointer, so the host can call them
//! through a plain C ABI.

use super::{Dialect, Target};
use crate::sc::{ScValue, Ty};

pub struct Cpp;

impl Dialect for Cpp {
    fn target(&self) -> Target {
        Target::Cpp
    }

    fn type_name(&self, ty: &Ty) -> String {
        ty.display()
    }

    /// GLM swizzles need `GLM_FORCE_SWIZZLE`; build vectors explicitly.
    fn has_swizzle(&self) -> bool {
        false
    }

    fn signature(&self, name: &str, params: &[ScValue], result: &Ty) -> String {
        let mut args: Vec<String> = params
            .iter()
            .enumerate()
            .map(|(i, p)| format!("const {}* param{}", self.type_name(&p.ty), i))
            .collect();
        args.push(format!("{}* result", self.type_name(result)));
        format!("extern \"C\" void {}({})\n", name, args.join(", "))
    }

    fn prologue(&self, params: &[ScValue]) -> String {
        params
            .iter()
            .enumerate()
            .map(|(i, p)| format!("  {} {} = *param{};\n", self.type_name(&p.ty), p, i))
            .collect()
    }

    fn epilogue(&self, result: &ScValue) -> String {
        format!("  *result = {};\n", result)
    }

    fn header(&self) -> &'static str {
        "#include <cmath>\n#include <glm/glm.hpp>\nusing namespace glm;\n"
    }

    fn uniform_decl(&self, ty: &Ty, identifier: &str, init: &str) -> String {
        format!("static {} {} = {};\n", self.type_name(ty), identifier, init)
    }

    /// `not` is a C++ keyword; GLM spells the function `not_`.
    fn bvec_not(&self, arg: &str) -> String {
        format!("not_({})", arg)
    }
}
