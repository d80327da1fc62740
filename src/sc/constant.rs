//! Constant emission: runtime values to target-language initializers.

use tracing::trace;

use super::error::{CompileError, ScResult};
use super::handle::ScValue;
use super::types::Ty;
use super::ScCompiler;
use crate::span::Span;
use crate::value::Value;

impl ScCompiler {
    /// Bind a runtime value to a fresh variable in the constants stream.
    ///
    /// Each distinct value is emitted once per function; later requests for
    /// an equal value return the same handle.
    pub fn emit_constant(&mut self, value: &Value, span: Span) -> ScResult<ScValue> {
        if let Some(cached) = self.valcache.get(value) {
            trace!(value = %value, handle = %cached, "constant cache hit");
            return Ok(cached.clone());
        }
        let ty = value.sc_type();
        if ty.is_error() {
            return Err(CompileError::unsupported_value(
                span,
                format!("value {} is not supported", value),
            ));
        }
        let result = self.with_purity(true, |sc| {
            let init = sc.render(value, &ty, span, true)?;
            if ty.is_plex() {
                sc.bind(ty.clone(), &init, span)
            } else {
                sc.check_supported(&ty, span)?;
                let array = sc.new_value(ty.clone());
                let line = sc.dialect.declare_array(&ty, &array.to_string(), &init);
                sc.emit(&line);
                Ok(array)
            }
        })?;
        self.valcache.insert(value.clone(), result.clone());
        Ok(result)
    }

    /// Initializer text for a value with no runtime parts, emitting nothing.
    /// Used for uniform declarations outside any function.
    pub fn literal(&mut self, value: &Value, span: Span) -> ScResult<String> {
        let ty = value.sc_type();
        if ty.is_error() {
            return Err(CompileError::unsupported_value(
                span,
                format!("value {} is not supported", value),
            ));
        }
        self.render(value, &ty, span, false)
    }

    /// Render `value` as an expression of type `ty`. Reactive values are
    /// compiled in place when `runtime` is set; otherwise they are rejected.
    fn render(&mut self, value: &Value, ty: &Ty, span: Span, runtime: bool) -> ScResult<String> {
        match value {
            Value::Reactive(re) if runtime => {
                let mut frame = self.root_frame();
                let compiled = self.compile_expr(&re.expr, &mut frame)?;
                if compiled.ty != re.ty {
                    return Err(CompileError::type_mismatch(
                        span,
                        format!(
                            "reactive value declared {} compiles to {}",
                            re.ty, compiled.ty
                        ),
                    ));
                }
                Ok(compiled.to_string())
            }
            Value::Uniform(uv) if runtime => Ok(uv.identifier.clone()),
            Value::Reactive(_) | Value::Uniform(_) => Err(CompileError::unsupported_value(
                span,
                format!("{} is not known until the shader runs", value),
            )),
            Value::Num(x) => Ok(self.dialect.num_literal(*x)),
            Value::Bool(b) => Ok(self.dialect.bool_literal(*b).to_string()),
            Value::List(items) => match ty {
                Ty::Bool32 => {
                    let mut mask = 0u32;
                    for (bit, item) in items.iter().enumerate() {
                        match item {
                            Value::Bool(true) => mask |= 1 << bit,
                            Value::Bool(false) => {}
                            _ => {
                                return Err(CompileError::unsupported_value(
                                    span,
                                    format!("{} is not a constant boolean mask", value),
                                ))
                            }
                        }
                    }
                    Ok(self.dialect.uint_literal(mask))
                }
                Ty::Vec(..) | Ty::Mat(_) => {
                    let elem = ty.elem_type();
                    let mut args = Vec::with_capacity(items.len());
                    for item in items.iter() {
                        args.push(self.render(item, &elem, span, runtime)?);
                    }
                    Ok(self.dialect.construct(ty, &args.join(",")))
                }
                Ty::Array(base, dims) => {
                    let mut flat = Vec::with_capacity(ty.flat_len());
                    self.flatten(value, base, dims.len(), span, runtime, &mut flat)?;
                    Ok(flat.join(","))
                }
                _ => Err(CompileError::unsupported_value(
                    span,
                    format!("value {} is not supported", value),
                )),
            },
            Value::Record(_) | Value::Function(_) => Err(CompileError::unsupported_value(
                span,
                format!("value {} is not supported", value),
            )),
        }
    }

    /// Row-major flattening of an array value down to its base elements.
    fn flatten(
        &mut self,
        value: &Value,
        base: &Ty,
        levels: usize,
        span: Span,
        runtime: bool,
        out: &mut Vec<String>,
    ) -> ScResult<()> {
        if levels == 0 {
            out.push(self.render(value, base, span, runtime)?);
            return Ok(());
        }
        let items = value.as_list().ok_or_else(|| {
            CompileError::unsupported_value(span, format!("{} is not an array", value))
        })?;
        for item in items {
            self.flatten(item, base, levels - 1, span, runtime, out)?;
        }
        Ok(())
    }
}
