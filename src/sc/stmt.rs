//! Statement compilation: definitions, assignment and control flow.

use super::error::{CompileError, ScResult};
use super::frame::Frame;
use super::handle::ScValue;
use super::index::component_number;
use super::types::Ty;
use super::ScCompiler;
use crate::op::{Locative, Op, OpKind, OpRef, Pattern};
use crate::span::Span;
use crate::value::Value;

impl ScCompiler {
    /// Compile a statement into the body stream, or into the constants
    /// stream when `frame` only holds constants.
    pub fn compile_stmt(&mut self, op: &OpRef, frame: &mut Frame) -> ScResult<()> {
        let constant = frame.is_constant();
        self.with_purity(constant, |sc| sc.exec(op, frame))
    }

    fn exec(&mut self, op: &OpRef, frame: &mut Frame) -> ScResult<()> {
        let span = op.span;
        match &op.kind {
            OpKind::Null => Ok(()),
            OpKind::Compound(stmts) => {
                for stmt in stmts {
                    self.exec(stmt, frame)?;
                }
                Ok(())
            }
            OpKind::Block { stmts, body } => {
                for stmt in stmts {
                    self.exec(stmt, frame)?;
                }
                self.exec(body, frame)
            }
            OpKind::Define { pattern, definiens } => {
                let mut bindings = Vec::new();
                self.match_pattern(pattern, definiens, frame, &mut bindings)?;
                for (slot, value) in bindings {
                    if value.ty.is_plex() {
                        // a private copy, so assignment never touches a shared constant
                        let copy = self.bind(value.ty.clone(), &value.to_string(), span)?;
                        frame.bind(slot, copy, true);
                    } else {
                        frame.bind(slot, value, false);
                    }
                }
                Ok(())
            }
            OpKind::Assign { locative, expr } => {
                let value = self.compile_expr(expr, frame)?;
                let (target, ty) = self.locative(locative, frame, span)?;
                if value.ty != ty {
                    return Err(CompileError::type_mismatch(
                        span,
                        format!("can't assign {} to a location of type {}", value.ty, ty),
                    ));
                }
                self.emit(&format!("{} = {};", target, value));
                Ok(())
            }
            OpKind::If { cond, then } => {
                let cond = self.compile_expr_as(cond, &Ty::Bool, frame)?;
                self.emit(&format!("if ({}) {{", cond));
                self.with_scope(|sc| sc.exec(then, frame))?;
                self.emit("}");
                Ok(())
            }
            OpKind::IfElse { cond, then, els } => {
                let cond = self.compile_expr_as(cond, &Ty::Bool, frame)?;
                self.emit(&format!("if ({}) {{", cond));
                self.with_scope(|sc| sc.exec(then, frame))?;
                self.emit("} else {");
                self.with_scope(|sc| sc.exec(els, frame))?;
                self.emit("}");
                Ok(())
            }
            OpKind::While { cond, body } => {
                self.emit("while (true) {");
                self.with_scope(|sc| {
                    let cond = sc.compile_expr_as(cond, &Ty::Bool, frame)?;
                    sc.emit(&format!("if (!{}) break;", cond));
                    sc.exec(body, frame)
                })?;
                self.emit("}");
                Ok(())
            }
            OpKind::For {
                pattern,
                list,
                cond,
                body,
            } => self.exec_for(pattern, list, cond.as_ref(), body, frame),
            other => Err(CompileError::unsupported_node(
                span,
                format!("this action is not supported: {}", other.name()),
            )),
        }
    }

    /// `for (pattern in first..last by step while cond) body` as a counted loop.
    fn exec_for(
        &mut self,
        pattern: &Pattern,
        list: &OpRef,
        cond: Option<&OpRef>,
        body: &OpRef,
        frame: &mut Frame,
    ) -> ScResult<()> {
        let OpKind::Range {
            first,
            last,
            step,
            half_open,
        } = &list.kind
        else {
            return Err(CompileError::unsupported_node(list.span, "not a range"));
        };
        let first = self.compile_expr_as(first, &Ty::Num, frame)?;
        let last = self.compile_expr_as(last, &Ty::Num, frame)?;
        let step = match step {
            Some(step) => self.compile_expr_as(step, &Ty::Num, frame)?,
            None => self.emit_constant(&Value::Num(1.0), list.span)?,
        };
        let i = self.new_value(Ty::Num);
        let cmp = if *half_open { "<" } else { "<=" };
        self.emit(&format!(
            "for (float {i}={first};{i}{cmp}{last};{i}+={step}) {{"
        ));
        self.with_scope(|sc| {
            let mut bindings = Vec::new();
            sc.match_value(pattern, &i, list.span, &mut bindings)?;
            for (slot, value) in bindings {
                frame.bind(slot, value, false);
            }
            if let Some(cond) = cond {
                let cond = sc.compile_expr_as(cond, &Ty::Bool, frame)?;
                sc.emit(&format!("if (!{}) break;", cond));
            }
            sc.exec(body, frame)
        })?;
        self.emit("}");
        Ok(())
    }

    /// Bind the value of `expr` to `pattern`. A list pattern matched against
    /// a list literal of the same length is matched element by element.
    pub fn match_pattern(
        &mut self,
        pattern: &Pattern,
        expr: &OpRef,
        frame: &mut Frame,
        out: &mut Vec<(usize, ScValue)>,
    ) -> ScResult<()> {
        match (pattern, &expr.kind) {
            (Pattern::List(pats), OpKind::List(items)) if pats.len() == items.len() => {
                for (pat, item) in pats.iter().zip(items) {
                    self.match_pattern(pat, item, frame, out)?;
                }
                Ok(())
            }
            _ => {
                let value = self.compile_expr(expr, frame)?;
                self.match_value(pattern, &value, expr.span, out)
            }
        }
    }

    /// Bind an already compiled value to `pattern`, extracting components
    /// for list patterns.
    pub fn match_value(
        &mut self,
        pattern: &Pattern,
        value: &ScValue,
        span: Span,
        out: &mut Vec<(usize, ScValue)>,
    ) -> ScResult<()> {
        match pattern {
            Pattern::Slot(slot) => {
                out.push((*slot, value.clone()));
                Ok(())
            }
            Pattern::Wildcard => Ok(()),
            Pattern::List(pats) => {
                if !value.ty.is_list() || value.ty.count() != pats.len() {
                    return Err(CompileError::type_mismatch(
                        span,
                        format!(
                            "pattern expects a list of {} elements, got {}",
                            pats.len(),
                            value.ty
                        ),
                    ));
                }
                for (i, pat) in pats.iter().enumerate() {
                    let elem = self.element(value, i, span)?;
                    self.match_value(pat, &elem, span, out)?;
                }
                Ok(())
            }
        }
    }

    /// Render the left side of an assignment, returning the target text
    /// and its type.
    fn locative(&mut self, loc: &Locative, frame: &mut Frame, span: Span) -> ScResult<(String, Ty)> {
        match loc {
            Locative::Local(slot) => {
                if !frame.is_mutable(*slot) {
                    return Err(CompileError::not_assignable(
                        span,
                        "this variable is not assignable",
                    ));
                }
                let value = frame.get(*slot, span)?;
                Ok((value.to_string(), value.ty))
            }
            Locative::Indexed { base, index } => {
                let (target, ty) = self.locative(base, frame, span)?;
                let index = match &index.kind {
                    OpKind::List(items) if items.len() == 1 => &items[0],
                    _ => {
                        return Err(CompileError::not_assignable(
                            index.span,
                            "expected '[index]' expression",
                        ))
                    }
                };
                self.component_target(&target, &ty, index, frame)
            }
            Locative::Lens { base, lens } => {
                let (target, ty) = self.locative(base, frame, span)?;
                self.component_target(&target, &ty, lens, frame)
            }
            Locative::Slice { .. } => Err(CompileError::not_assignable(
                span,
                "can't assign to a slice",
            )),
            Locative::Expr(_) => Err(CompileError::not_assignable(
                span,
                "expression is not assignable",
            )),
        }
    }

    fn component_target(
        &self,
        base: &str,
        ty: &Ty,
        index: &Op,
        frame: &Frame,
    ) -> ScResult<(String, Ty)> {
        if !matches!(ty, Ty::Vec(..) | Ty::Mat(_)) {
            return Err(CompileError::not_assignable(
                index.span,
                format!("type {}: can't assign to a component", ty),
            ));
        }
        let value = self.try_constify(index, frame).ok_or_else(|| {
            CompileError::not_assignable(index.span, "can't assign through a non-constant index")
        })?;
        if value.is_runtime() {
            return Err(CompileError::not_assignable(
                index.span,
                "can't assign through a reactive index",
            ));
        }
        let i = component_number(&value, ty.count(), index.span)?;
        Ok((self.dialect.component(base, ty, i), ty.elem_type()))
    }
}
