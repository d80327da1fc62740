//! SubCurv: compiles shape functions over a resolved operation tree into
//! GLSL, OpenCL C or C++ source.

pub mod api;
pub mod builtins;
pub mod diagnostic;
pub mod dialect;
pub mod function;
pub mod hash;
pub mod job;
pub mod op;
pub mod program;
pub mod sc;
pub mod span;
pub mod value;

// Re-export public API: `subcurv::compile_job()` etc.
pub use api::*;
pub use dialect::Target;
pub use program::{export_shape, FunctionDef, Program};
pub use sc::{CompileError, ErrorKind, ScCompiler, Ty};
pub use value::{Module, UniformVariable, Value};
