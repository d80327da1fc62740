//! Output dialects: GLSL, OpenCL C and C++ (GLM).
//!
//! The compiler never branches on the target itself. Every spelling that
//! differs between dialects (type names, constructors, component access,
//! function signatures, literals) is asked of the `Dialect` in use.
//! Dialects change syntax only; the type system and unification rules are
//! the same for all of them.

mod cpp;
mod glsl;
mod opencl;

use std::fmt;
use std::str::FromStr;

use crate::sc::{ScValue, Ty};

pub use cpp::Cpp;
pub use glsl::Glsl;
pub use opencl::OpenCl;

/// Component letters for vectors of up to four elements.
pub const COMPONENT_LETTERS: [char; 4] = ['x', 'y', 'z', 'w'];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    #[default]
    Glsl,
    OpenCl,
    Cpp,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Glsl, Target::OpenCl, Target::Cpp];

    /// Look up a target by name or alias.
    pub fn from_name(name: &str) -> Option<Target> {
        match name.to_ascii_lowercase().as_str() {
            "glsl" | "frag" => Some(Target::Glsl),
            "opencl" | "cl" | "opencl11" => Some(Target::OpenCl),
            "cpp" | "c++" | "cxx" => Some(Target::Cpp),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Target::Glsl => "glsl",
            Target::OpenCl => "opencl",
            Target::Cpp => "cpp",
        }
    }

    /// Default file extension for emitted source.
    pub fn extension(self) -> &'static str {
        match self {
            Target::Glsl => "frag",
            Target::OpenCl => "cl",
            Target::Cpp => "cpp",
        }
    }

    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Target::Glsl => &Glsl,
            Target::OpenCl => &OpenCl,
            Target::Cpp => &Cpp,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::from_name(s).ok_or_else(|| {
            format!(
                "unknown target '{}' (expected one of: glsl, opencl, cpp)",
                s
            )
        })
    }
}

/// Create the dialect for a target name.
pub fn create_dialect(name: &str) -> Option<&'static dyn Dialect> {
    Target::from_name(name).map(Target::dialect)
}

/// Target-language spelling for everything the compiler emits.
///
/// Default methods give the GLSL spelling; dialects override what differs.
pub trait Dialect {
    fn target(&self) -> Target;

    fn name(&self) -> &'static str {
        self.target().name()
    }

    /// Spelling of a type in declarations.
    fn type_name(&self, ty: &Ty) -> String;

    /// Whether values of this type can be declared in the dialect.
    fn supports(&self, ty: &Ty) -> bool {
        !ty.is_error()
    }

    /// Whether an array value can be copied with a plain declaration.
    fn first_class_arrays(&self) -> bool {
        false
    }

    /// Constructor call building a value of `ty` from `args`.
    fn construct(&self, ty: &Ty, args: &str) -> String {
        format!("{}({})", self.type_name(ty), args)
    }

    fn int_cast(&self, expr: &str) -> String {
        format!("int({})", expr)
    }

    fn uint_cast(&self, expr: &str) -> String {
        format!("uint({})", expr)
    }

    fn num_literal(&self, x: f64) -> String {
        format_number(x, "")
    }

    fn bool_literal(&self, b: bool) -> &'static str {
        if b {
            "true"
        } else {
            "false"
        }
    }

    fn uint_literal(&self, n: u32) -> String {
        format!("{}u", n)
    }

    /// Whether `v.xyz` selects several components at once.
    fn has_swizzle(&self) -> bool {
        true
    }

    /// Component `i` of a value of type `ty`, with `i` known at compile time.
    fn component(&self, base: &str, ty: &Ty, i: usize) -> String {
        match ty {
            Ty::Vec(..) => match COMPONENT_LETTERS.get(i) {
                Some(letter) => format!("{}.{}", base, letter),
                None => format!("{}[{}]", base, i),
            },
            Ty::Bool32 => self.bit_test(base, &self.uint_literal(i as u32)),
            _ => format!("{}[{}]", base, i),
        }
    }

    /// Runtime index into a vector. `index` is already an int expression.
    fn vector_index(&self, base: &str, _elem: &Ty, index: &str) -> String {
        format!("{}[{}]", base, index)
    }

    /// Test one bit of a packed boolean mask. `bit` is a uint expression.
    fn bit_test(&self, base: &str, bit: &str) -> String {
        format!("(({} >> {}) & 1u) != 0u", base, bit)
    }

    fn declare(&self, ty: &Ty, name: &str, init: &str) -> String {
        format!("{} {} = {};", self.type_name(ty), name, init)
    }

    /// Declaration of an array constant from its flattened initializer list.
    fn declare_array(&self, ty: &Ty, name: &str, init: &str) -> String {
        format!(
            "{} {}[] = {{{}}};",
            self.type_name(&ty.plex_array_base()),
            name,
            init
        )
    }

    fn equal(&self, lhs: &str, rhs: &str, _ty: &Ty) -> String {
        format!("({} == {})", lhs, rhs)
    }

    fn matrix_comp_mult(&self, lhs: &str, rhs: &str) -> String {
        format!("matrixCompMult({},{})", lhs, rhs)
    }

    /// Componentwise negation of a boolean vector.
    fn bvec_not(&self, arg: &str) -> String {
        format!("not({})", arg)
    }

    /// Name of a math builtin, given its GLSL name.
    fn math_fn(&self, glsl_name: &'static str) -> &'static str {
        glsl_name
    }

    fn signature(&self, name: &str, params: &[ScValue], result: &Ty) -> String {
        let params: Vec<String> = params
            .iter()
            .map(|p| format!("{} {}", self.type_name(&p.ty), p))
            .collect();
        format!("{} {}({})\n", self.type_name(result), name, params.join(", "))
    }

    /// Statements run before the body, e.g. reading pointer parameters.
    fn prologue(&self, _params: &[ScValue]) -> String {
        String::new()
    }

    fn epilogue(&self, result: &ScValue) -> String {
        format!("  return {};\n", result)
    }

    /// Text placed at the top of an assembled program.
    fn header(&self) -> &'static str;

    /// Declaration of a shader parameter. `init` is its initial value.
    fn uniform_decl(&self, ty: &Ty, identifier: &str, init: &str) -> String;
}

/// Shortest round-trip decimal spelling of a number as an expression.
///
/// Negative numbers are parenthesized so they can follow any operator, and
/// non-finite numbers are written as constant divisions.
pub fn format_number(x: f64, suffix: &str) -> String {
    if x.is_nan() {
        return format!("(0.0{s}/0.0{s})", s = suffix);
    }
    if x.is_infinite() {
        let sign = if x < 0.0 { "-" } else { "" };
        return format!("({}1.0{s}/0.0{s})", sign, s = suffix);
    }
    let text = format!("{:?}{}", x, suffix);
    if x.is_sign_negative() {
        format!("({})", text)
    } else {
        text
    }
}
