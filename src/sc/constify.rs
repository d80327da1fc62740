//! Compile-time evaluation of operation nodes.

use super::error::{CompileError, ScResult};
use super::frame::Frame;
use super::ScCompiler;
use crate::op::{Op, OpKind, UnaryOp};
use crate::value::Value;

impl ScCompiler {
    /// Fold `op` to a runtime value without emitting code.
    ///
    /// Succeeds for literals, captured nonlocals, field selection on a
    /// foldable record, lists of foldable elements and negation of a
    /// foldable number. Anything else yields `None`.
    pub fn try_constify(&self, op: &Op, frame: &Frame) -> Option<Value> {
        match &op.kind {
            OpKind::Constant(value) => Some(value.clone()),
            OpKind::Nonlocal(slot) => frame.nonlocal(*slot, op.span).ok(),
            OpKind::Symbolic(name) => frame.symbol(name, op.span).ok(),
            OpKind::Dot { base, field } => {
                let base = self.try_constify(base, frame)?;
                base.field(field).cloned()
            }
            OpKind::List(items) => items
                .iter()
                .map(|item| self.try_constify(item, frame))
                .collect::<Option<Vec<_>>>()
                .map(Value::list),
            OpKind::Unary {
                op: UnaryOp::Neg,
                arg,
            } => match self.try_constify(arg, frame)? {
                Value::Num(x) => Some(Value::Num(-x)),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn constify(&self, op: &Op, frame: &Frame) -> ScResult<Value> {
        self.try_constify(op, frame)
            .ok_or_else(|| CompileError::not_constant(op.span))
    }
}
