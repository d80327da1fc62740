//! Indexing: component access, swizzles and runtime array indexing.

use super::error::{CompileError, ScResult};
use super::frame::Frame;
use super::handle::ScValue;
use super::types::Ty;
use super::ScCompiler;
use crate::dialect::COMPONENT_LETTERS;
use crate::op::{OpKind, OpRef};
use crate::span::Span;
use crate::value::Value;

/// A constant component index, checked against `count`.
pub(crate) fn component_number(value: &Value, count: usize, span: Span) -> ScResult<usize> {
    let x = value.as_num().ok_or_else(|| {
        CompileError::bad_index(span, format!("index must be a number, got {}", value))
    })?;
    if x.fract() != 0.0 || x < 0.0 || x >= count as f64 {
        return Err(CompileError::bad_index(
            span,
            format!("got {}, expected 0..{}", x, count.saturating_sub(1)),
        ));
    }
    Ok(x as usize)
}

impl ScCompiler {
    /// Extract component `i` of a list value into a fresh variable.
    pub fn element(&mut self, value: &ScValue, i: usize, span: Span) -> ScResult<ScValue> {
        if value.ty.plex_array_rank() > 1 {
            return Err(CompileError::bad_index(
                span,
                format!("can't extract a row of {}", value.ty),
            ));
        }
        let init = self.dialect.component(&value.to_string(), &value.ty, i);
        self.bind(value.ty.elem_type(), &init, span)
    }

    /// Compile `array[i]`, `array[i,j]` or `array[i,j,k]`. The indices are
    /// given as a list expression.
    pub fn index_list(
        &mut self,
        array: &ScValue,
        indices: &OpRef,
        frame: &mut Frame,
    ) -> ScResult<ScValue> {
        let OpKind::List(items) = &indices.kind else {
            return Err(CompileError::bad_index(
                indices.span,
                "expected '[index]' expression",
            ));
        };
        let span = indices.span;
        match items.as_slice() {
            [i] => self.index_expr(array, i, frame),
            [i, j] => {
                let i = self.compile_index(i, frame)?;
                let j = self.compile_index(j, frame)?;
                self.index2(array, &i, &j, span)
            }
            [i, j, k] => {
                let i = self.compile_index(i, frame)?;
                let j = self.compile_index(j, frame)?;
                let k = self.compile_index(k, frame)?;
                self.index3(array, &i, &j, &k, span)
            }
            _ => Err(CompileError::bad_index(
                span,
                format!(
                    "index list has {} components: only 1..3 supported",
                    items.len()
                ),
            )),
        }
    }

    /// Compile `array[index]` with a single index expression.
    pub fn index_expr(
        &mut self,
        array: &ScValue,
        index: &OpRef,
        frame: &mut Frame,
    ) -> ScResult<ScValue> {
        let span = index.span;
        if array.ty.is_plex() {
            if let Some(value) = self.try_constify(index, frame) {
                if !value.is_runtime() {
                    return self.constant_index(array, &value, span);
                }
            }
        }
        let rank = array.ty.plex_array_rank();
        if rank > 1 {
            return Err(CompileError::bad_index(
                span,
                format!(
                    "can't index a {}D array of {} with a single index",
                    rank,
                    array.ty.plex_array_base()
                ),
            ));
        }
        let ix = self.compile_index(index, frame)?;
        let base = array.to_string();
        let (ty, init) = match &array.ty {
            Ty::Bool32 => {
                let bit = self.dialect.uint_cast(&ix.to_string());
                (Ty::Bool, self.dialect.bit_test(&base, &bit))
            }
            Ty::Vec(..) => {
                let elem = array.ty.elem_type();
                let int = self.dialect.int_cast(&ix.to_string());
                let init = self.dialect.vector_index(&base, &elem, &int);
                (elem, init)
            }
            Ty::Mat(_) | Ty::Array(..) => {
                let int = self.dialect.int_cast(&ix.to_string());
                (array.ty.elem_type(), format!("{}[{}]", base, int))
            }
            other => {
                return Err(CompileError::bad_index(
                    span,
                    format!("type {}: not an array", other),
                ))
            }
        };
        self.bind(ty, &init, span)
    }

    /// Component selection with an index known at compile time. A list of
    /// 2 to 4 component numbers selects a swizzle.
    fn constant_index(&mut self, array: &ScValue, index: &Value, span: Span) -> ScResult<ScValue> {
        let count = array.ty.count();
        let Some(items) = index.as_list() else {
            let i = component_number(index, count, span)?;
            return self.element(array, i, span);
        };
        let Ty::Vec(scalar, _) = array.ty else {
            return Err(CompileError::bad_index(
                span,
                format!("type {}: can't select a list of components", array.ty),
            ));
        };
        if !(2..=4).contains(&items.len()) {
            return Err(CompileError::bad_index(
                span,
                "list index vector must have between 2 and 4 elements",
            ));
        }
        let picks = items
            .iter()
            .map(|item| component_number(item, count, span))
            .collect::<ScResult<Vec<_>>>()?;
        let ty = Ty::Vec(scalar, picks.len() as u8);
        let base = array.to_string();
        let init = if self.dialect.has_swizzle() {
            let letters: String = picks.iter().map(|&i| COMPONENT_LETTERS[i]).collect();
            format!("{}.{}", base, letters)
        } else {
            let args: Vec<String> = picks
                .iter()
                .map(|&i| self.dialect.component(&base, &array.ty, i))
                .collect();
            self.dialect.construct(&ty, &args.join(","))
        };
        self.bind(ty, &init, span)
    }

    fn compile_index(&mut self, index: &OpRef, frame: &mut Frame) -> ScResult<ScValue> {
        let ix = self.compile_expr(index, frame)?;
        if !ix.ty.is_num() {
            return Err(CompileError::type_mismatch(
                index.span,
                format!("index must be a number, got {}", ix.ty),
            ));
        }
        Ok(ix)
    }

    fn index2(&mut self, array: &ScValue, i: &ScValue, j: &ScValue, span: Span) -> ScResult<ScValue> {
        let d = self.dialect;
        let (ii, jj) = (d.int_cast(&i.to_string()), d.int_cast(&j.to_string()));
        let base = array.to_string();
        let (ty, init) = match &array.ty {
            Ty::Array(elem, dims) if dims.len() == 2 => (
                (**elem).clone(),
                format!("{}[{}*{}+{}]", base, ii, dims[1], jj),
            ),
            Ty::Array(elem, dims) if dims.len() == 1 && elem.is_vec() => {
                let scalar = elem.elem_type();
                let row = format!("{}[{}]", base, ii);
                (scalar.clone(), d.vector_index(&row, &scalar, &jj))
            }
            Ty::Mat(_) => (Ty::Num, format!("{}[{}][{}]", base, ii, jj)),
            _ => {
                return Err(CompileError::bad_index(
                    span,
                    "2 indexes (a[i,j]) not supported for this array",
                ))
            }
        };
        self.bind(ty, &init, span)
    }

    fn index3(
        &mut self,
        array: &ScValue,
        i: &ScValue,
        j: &ScValue,
        k: &ScValue,
        span: Span,
    ) -> ScResult<ScValue> {
        let d = self.dialect;
        match &array.ty {
            Ty::Array(elem, dims) if dims.len() == 2 && elem.is_vec() => {
                let scalar = elem.elem_type();
                let row = format!(
                    "{}[{}*{}+{}]",
                    array,
                    d.int_cast(&i.to_string()),
                    dims[1],
                    d.int_cast(&j.to_string())
                );
                let init = d.vector_index(&row, &scalar, &d.int_cast(&k.to_string()));
                self.bind(scalar, &init, span)
            }
            _ => Err(CompileError::bad_index(
                span,
                "3 indexes (a[i,j,k]) not supported for this array",
            )),
        }
    }
}
