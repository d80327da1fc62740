//! Type unification: broadcasting and elementwise extension.
//!
//! The `try_*` helpers decide on types alone before emitting anything, so
//! a failed call leaves the output streams untouched.

use super::error::{CompileError, ScResult};
use super::handle::ScValue;
use super::types::Ty;
use super::ScCompiler;
use crate::span::Span;

/// Can a value of type `from` be replicated into every component of `to`?
fn broadcastable(from: &Ty, to: &Ty) -> bool {
    if !matches!(to, Ty::Vec(..) | Ty::Mat(_) | Ty::Bool32) {
        return false;
    }
    let elem = to.elem_type();
    *from == elem || broadcastable(from, &elem)
}

/// Can `from` be converted to `to` component by component?
fn elementwise(from: &Ty, to: &Ty) -> bool {
    from != to
        && matches!(to, Ty::Vec(..) | Ty::Mat(_))
        && matches!(from, Ty::Vec(..) | Ty::Mat(_))
        && from.count() == to.count()
        && extendable(&from.elem_type(), &to.elem_type())
}

fn extendable(from: &Ty, to: &Ty) -> bool {
    from == to || elementwise(from, to) || broadcastable(from, to)
}

impl ScCompiler {
    /// Replicate `value` across every component of `target`, broadcasting
    /// further into nested element types as needed.
    pub fn try_broadcast(
        &mut self,
        value: &ScValue,
        target: &Ty,
        span: Span,
    ) -> ScResult<Option<ScValue>> {
        if !broadcastable(&value.ty, target) {
            return Ok(None);
        }
        let elem_ty = target.elem_type();
        let elem = if value.ty == elem_ty {
            value.clone()
        } else {
            match self.try_broadcast(value, &elem_ty, span)? {
                Some(elem) => elem,
                None => return Ok(None),
            }
        };
        let init = if let Ty::Bool32 = target {
            // true is all ones, false all zeros
            let negated = format!("-{}", self.dialect.int_cast(&elem.to_string()));
            self.dialect.uint_cast(&negated)
        } else {
            let name = elem.to_string();
            let args = vec![name.as_str(); target.count()];
            self.dialect.construct(target, &args.join(","))
        };
        self.bind(target.clone(), &init, span).map(Some)
    }

    /// Convert a list value to a list type of the same count by extending
    /// each component to the target element type.
    pub fn try_elementwise(
        &mut self,
        value: &ScValue,
        target: &Ty,
        span: Span,
    ) -> ScResult<Option<ScValue>> {
        if !elementwise(&value.ty, target) {
            return Ok(None);
        }
        let elem_ty = target.elem_type();
        let mut args = Vec::with_capacity(target.count());
        for i in 0..target.count() {
            let component = self.element(value, i, span)?;
            match self.try_extend(&component, &elem_ty, span)? {
                Some(extended) => args.push(extended.to_string()),
                None => return Ok(None),
            }
        }
        let init = self.dialect.construct(target, &args.join(","));
        self.bind(target.clone(), &init, span).map(Some)
    }

    pub fn try_extend(
        &mut self,
        value: &ScValue,
        target: &Ty,
        span: Span,
    ) -> ScResult<Option<ScValue>> {
        if value.ty == *target {
            return Ok(Some(value.clone()));
        }
        if value.ty.is_list() && target.is_list() && value.ty.count() == target.count() {
            return self.try_elementwise(value, target, span);
        }
        if target.is_list() {
            return self.try_broadcast(value, target, span);
        }
        Ok(None)
    }

    /// Bring two operands to a common type. The lower rank operand is
    /// extended to the type of the other.
    pub fn unify(
        &mut self,
        a: &ScValue,
        b: &ScValue,
        span: Span,
    ) -> ScResult<Option<(ScValue, ScValue)>> {
        if a.ty == b.ty {
            return Ok(Some((a.clone(), b.clone())));
        }
        let (a_list, b_list) = (a.ty.is_list(), b.ty.is_list());
        if a_list && b_list && a.ty.count() == b.ty.count() {
            if a.ty.rank() < b.ty.rank() {
                let ext = self.try_elementwise(a, &b.ty, span)?;
                return Ok(ext.map(|a| (a, b.clone())));
            }
            if b.ty.rank() < a.ty.rank() {
                let ext = self.try_elementwise(b, &a.ty, span)?;
                return Ok(ext.map(|b| (a.clone(), b)));
            }
            return Ok(None);
        }
        if a_list && !b_list {
            let ext = self.try_broadcast(b, &a.ty, span)?;
            return Ok(ext.map(|b| (a.clone(), b)));
        }
        if b_list && !a_list {
            let ext = self.try_broadcast(a, &b.ty, span)?;
            return Ok(ext.map(|a| (a, b.clone())));
        }
        Ok(None)
    }

    /// `unify` restricted to plex operands, failing with a type mismatch.
    pub fn plex_unify(
        &mut self,
        a: &ScValue,
        b: &ScValue,
        span: Span,
    ) -> ScResult<(ScValue, ScValue)> {
        for arg in [a, b] {
            if !arg.ty.is_plex() {
                return Err(CompileError::type_mismatch(
                    span,
                    format!("argument with type {} is not a plex value", arg.ty),
                ));
            }
        }
        self.unify(a, b, span)?.ok_or_else(|| {
            CompileError::type_mismatch(
                span,
                format!("{}, {} not convertible to a common type", a.ty, b.ty),
            )
        })
    }
}

