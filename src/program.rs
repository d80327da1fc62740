//! Program assembly: dialect header, uniform declarations and a list of
//! compiled functions, in that order.

use std::rc::Rc;

use crate::api::CompileOptions;
use crate::sc::{CompileError, ScCompiler, Ty};
use crate::span::Span;
use crate::value::{UniformVariable, Value};

/// One function to compile: the target-language name, parameter types,
/// declared result type and the function value itself.
#[derive(Clone, Debug)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Ty>,
    pub result: Ty,
    pub function: Value,
}

impl FunctionDef {
    pub fn new(name: &str, params: Vec<Ty>, result: Ty, function: Value) -> Self {
        Self {
            name: name.to_string(),
            params,
            result,
            function,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Program {
    pub uniforms: Vec<Rc<UniformVariable>>,
    pub functions: Vec<FunctionDef>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// A shape: `dist` maps a point `[x,y,z,t]` to a signed distance and
    /// `colour` maps it to an RGB triple.
    pub fn shape(dist: Value, colour: Value) -> Self {
        Self::new()
            .with_function(FunctionDef::new("dist", vec![Ty::num_vec(4)], Ty::Num, dist))
            .with_function(FunctionDef::new(
                "colour",
                vec![Ty::num_vec(4)],
                Ty::num_vec(3),
                colour,
            ))
    }

    pub fn with_uniform(mut self, uniform: Rc<UniformVariable>) -> Self {
        self.uniforms.push(uniform);
        self
    }

    pub fn with_function(mut self, def: FunctionDef) -> Self {
        self.functions.push(def);
        self
    }

    /// Emit the whole program with one compiler instance.
    ///
    /// Every function is attempted even after an earlier one fails; a
    /// failed function contributes nothing to the output, so the errors
    /// of all functions are reported together.
    pub fn emit(&self, options: &CompileOptions) -> Result<String, Vec<CompileError>> {
        let mut sc = ScCompiler::with_options(options);
        let mut errors = Vec::new();
        if options.header {
            sc.write_raw(sc.dialect().header());
        }
        for uv in &self.uniforms {
            if let Err(e) = declare_uniform(&mut sc, uv) {
                errors.push(e);
            }
        }
        if options.header || !self.uniforms.is_empty() {
            sc.write_raw("\n");
        }
        for (i, def) in self.functions.iter().enumerate() {
            if i > 0 {
                sc.write_raw("\n");
            }
            if let Err(e) = sc.define_function(&def.name, &def.params, &def.result, &def.function) {
                errors.push(e);
            }
        }
        if errors.is_empty() {
            Ok(sc.into_output())
        } else {
            Err(errors)
        }
    }
}

fn declare_uniform(sc: &mut ScCompiler, uv: &UniformVariable) -> Result<(), CompileError> {
    sc.check_supported(&uv.ty, Span::dummy())?;
    let actual = uv.value.sc_type();
    if actual != uv.ty {
        return Err(CompileError::type_mismatch(
            Span::dummy(),
            format!(
                "uniform {} declared {} has initial value of type {}",
                uv.name, uv.ty, actual
            ),
        ));
    }
    let init = sc.literal(&uv.value, Span::dummy())?;
    let decl = sc.dialect().uniform_decl(&uv.ty, &uv.identifier, &init);
    sc.write_raw(&decl);
    Ok(())
}

/// Compile a shape's `dist` and `colour` functions into one program,
/// declaring `uniforms` ahead of them.
pub fn export_shape(
    dist: &Value,
    colour: &Value,
    uniforms: &[Rc<UniformVariable>],
    options: &CompileOptions,
) -> Result<String, Vec<CompileError>> {
    let program = uniforms
        .iter()
        .cloned()
        .fold(Program::shape(dist.clone(), colour.clone()), Program::with_uniform);
    program.emit(options)
}
