//! Expression compilation with common subexpression elimination.

use std::rc::Rc;

use tracing::trace;

use super::error::{CompileError, ScResult};
use super::frame::Frame;
use super::handle::ScValue;
use super::types::{Scalar, Ty, MAX_VEC_COUNT};
use super::ScCompiler;
use crate::op::{BinaryOp, Op, OpKind, OpRef, UnaryOp};
use crate::span::Span;

impl ScCompiler {
    /// Compile an expression, returning the variable that holds its value.
    ///
    /// Pure nodes are looked up in the scoped CSE caches first, innermost
    /// scope outward, and recorded in the innermost scope once compiled.
    /// Their code goes to the constants stream; everything else goes to
    /// the body, except inside a call expanded from a pure expression,
    /// where local reads only ever see constants.
    pub fn compile_expr(&mut self, op: &OpRef, frame: &mut Frame) -> ScResult<ScValue> {
        if !op.pure {
            let constant = frame.is_constant();
            return self.with_purity(constant, |sc| sc.eval(op, frame));
        }
        let key = (Rc::as_ptr(frame.nonlocals()) as usize, op.clone());
        if let Some(hit) = self.cached(&key) {
            trace!(op = op.kind.name(), handle = %hit, "cse hit");
            return Ok(hit);
        }
        let value = self.with_purity(true, |sc| sc.eval(op, frame))?;
        self.remember(key, value.clone());
        Ok(value)
    }

    /// Compile an expression that must have exactly type `ty`.
    pub fn compile_expr_as(&mut self, op: &OpRef, ty: &Ty, frame: &mut Frame) -> ScResult<ScValue> {
        let value = self.compile_expr(op, frame)?;
        if value.ty != *ty {
            return Err(CompileError::type_mismatch(
                op.span,
                format!("wrong argument type: expected {}, got {}", ty, value.ty),
            ));
        }
        Ok(value)
    }

    fn eval(&mut self, op: &OpRef, frame: &mut Frame) -> ScResult<ScValue> {
        let span = op.span;
        match &op.kind {
            OpKind::Constant(value) => self.emit_constant(value, span),
            OpKind::Local(slot) => frame.get(*slot, span),
            OpKind::Nonlocal(slot) => {
                let value = frame.nonlocal(*slot, span)?;
                self.emit_constant(&value, span)
            }
            OpKind::Symbolic(name) => {
                let value = frame.symbol(name, span)?;
                self.emit_constant(&value, span)
            }
            OpKind::Compiled(value) => Ok(value.clone()),
            OpKind::List(items) => self.compile_list(op, items, frame),
            OpKind::Dot { .. } => {
                let value = self.constify(op, frame)?;
                self.emit_constant(&value, span)
            }
            OpKind::Call { func, arg } => self.compile_call(func, arg, span, frame),
            OpKind::Index { base, index } => {
                let array = self.compile_array(base, frame)?;
                self.index_expr(&array, index, frame)
            }
            OpKind::Slice { base, indices } => {
                let array = self.compile_array(base, frame)?;
                self.index_list(&array, indices, frame)
            }
            OpKind::Unary { op: unop, arg } => {
                let arg = self.compile_expr(arg, frame)?;
                self.compile_unary(*unop, &arg, span)
            }
            OpKind::Binary { op: binop, lhs, rhs } => {
                let lhs = self.compile_expr(lhs, frame)?;
                let rhs = self.compile_expr(rhs, frame)?;
                self.compile_binary(*binop, &lhs, &rhs, span)
            }
            // Both operands are always evaluated.
            OpKind::Or(a, b) => self.compile_logical("||", a, b, span, frame),
            OpKind::And(a, b) => self.compile_logical("&&", a, b, span, frame),
            OpKind::IfElse { cond, then, els } => {
                let cond = self.compile_expr_as(cond, &Ty::Bool, frame)?;
                let then = self.compile_expr(then, frame)?;
                let els = self.compile_expr(els, frame)?;
                if then.ty != els.ty {
                    return Err(CompileError::type_mismatch(
                        span,
                        format!(
                            "if: type mismatch in 'then' and 'else' arms ({},{})",
                            then.ty, els.ty
                        ),
                    ));
                }
                let init = format!("({} ? {} : {})", cond, then, els);
                self.bind(then.ty.clone(), &init, span)
            }
            OpKind::Block { stmts, body } => {
                for stmt in stmts {
                    self.compile_stmt(stmt, frame)?;
                }
                self.compile_expr(body, frame)
            }
            other => Err(CompileError::unsupported_node(
                span,
                format!("this expression is not supported: {}", other.name()),
            )),
        }
    }

    fn compile_array(&mut self, base: &OpRef, frame: &mut Frame) -> ScResult<ScValue> {
        let array = self.compile_expr(base, frame)?;
        if !array.ty.is_list() {
            return Err(CompileError::bad_index(
                base.span,
                format!("type {}: not an array", array.ty),
            ));
        }
        Ok(array)
    }

    /// `[a, b, ...]`: a vector constructor for 2 to 4 scalars, otherwise a
    /// folded constant.
    fn compile_list(&mut self, op: &Op, items: &[OpRef], frame: &mut Frame) -> ScResult<ScValue> {
        if op.pure {
            if let Some(value) = self.try_constify(op, frame) {
                if !value.sc_type().is_error() {
                    return self.emit_constant(&value, op.span);
                }
            }
        }
        if !(2..=MAX_VEC_COUNT).contains(&items.len()) {
            let value = self.constify(op, frame)?;
            return self.emit_constant(&value, op.span);
        }
        let mut elems: Vec<ScValue> = Vec::with_capacity(items.len());
        for item in items {
            let elem = self.compile_expr(item, frame)?;
            if !matches!(elem.ty, Ty::Num | Ty::Bool | Ty::Bool32 | Ty::Vec(Scalar::Num, _)) {
                return Err(CompileError::type_mismatch(
                    item.span,
                    format!(
                        "vector elements must be Num, Bool, Bool32 or Num_Vec; got type: {}",
                        elem.ty
                    ),
                ));
            }
            if let Some(first) = elems.first() {
                if first.ty != elem.ty {
                    return Err(CompileError::type_mismatch(
                        item.span,
                        format!(
                            "vector elements must have uniform type; got types {} and {}",
                            first.ty, elem.ty
                        ),
                    ));
                }
            }
            elems.push(elem);
        }
        let ty = Ty::list(&elems[0].ty, elems.len());
        if ty.is_error() {
            return Err(CompileError::type_mismatch(
                op.span,
                format!("can't build a list of {} {}", elems.len(), elems[0].ty),
            ));
        }
        let args: Vec<String> = elems.iter().map(ScValue::to_string).collect();
        let init = self.dialect.construct(&ty, &args.join(","));
        self.bind(ty, &init, op.span)
    }

    /// `f(arg)`: a call of a function value, or indexing of a list.
    fn compile_call(
        &mut self,
        func: &OpRef,
        arg: &OpRef,
        span: Span,
        frame: &mut Frame,
    ) -> ScResult<ScValue> {
        if let Some(value) = self.try_constify(func, frame) {
            if let Some(callee) = value.callable() {
                return callee.sc_call_expr(self, arg, span, frame);
            }
            if !value.is_runtime() && value.sc_type().is_error() {
                return Err(CompileError::unsupported_value(
                    func.span,
                    format!("{} is not an array or function", value),
                ));
            }
        }
        let array = self.compile_expr(func, frame)?;
        if !array.ty.is_list() {
            return Err(CompileError::bad_index(
                func.span,
                format!("type {}: not an array or function", array.ty),
            ));
        }
        self.index_list(&array, arg, frame)
    }

    fn compile_logical(
        &mut self,
        symbol: &str,
        a: &OpRef,
        b: &OpRef,
        span: Span,
        frame: &mut Frame,
    ) -> ScResult<ScValue> {
        let a = self.compile_expr_as(a, &Ty::Bool, frame)?;
        let b = self.compile_expr_as(b, &Ty::Bool, frame)?;
        let init = format!("({} {} {})", a, symbol, b);
        self.bind(Ty::Bool, &init, span)
    }

    pub fn compile_unary(&mut self, op: UnaryOp, arg: &ScValue, span: Span) -> ScResult<ScValue> {
        let init = match (op, &arg.ty) {
            (UnaryOp::Neg, ty) if ty.is_numeric() => format!("-{}", arg),
            (UnaryOp::Not, Ty::Bool) => format!("!{}", arg),
            (UnaryOp::Not, Ty::Bool32) => format!("~{}", arg),
            (UnaryOp::Not, Ty::Vec(Scalar::Bool, _)) => {
                self.dialect.bvec_not(&arg.to_string())
            }
            (UnaryOp::Neg, ty) => {
                return Err(CompileError::type_mismatch(
                    span,
                    format!("can't negate a value of type {}", ty),
                ))
            }
            (UnaryOp::Not, ty) => {
                return Err(CompileError::type_mismatch(
                    span,
                    format!("'!' requires a boolean, got {}", ty),
                ))
            }
        };
        self.bind(arg.ty.clone(), &init, span)
    }

    pub fn compile_binary(
        &mut self,
        op: BinaryOp,
        lhs: &ScValue,
        rhs: &ScValue,
        span: Span,
    ) -> ScResult<ScValue> {
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => {
                let (x, y) = self.plex_unify(lhs, rhs, span)?;
                if !x.ty.is_numeric() {
                    return Err(CompileError::type_mismatch(
                        span,
                        format!("'{}' requires numbers, got {}", op.symbol(), x.ty),
                    ));
                }
                let ty = x.ty.clone();
                match op {
                    BinaryOp::Pow if ty.is_mat() => Err(CompileError::type_mismatch(
                        span,
                        format!("'^' is not defined for {}", ty),
                    )),
                    BinaryOp::Pow => self.bincall(ty, "pow", &x, &y, span),
                    BinaryOp::Mul if ty.is_mat() => {
                        let init = self.dialect.matrix_comp_mult(&x.to_string(), &y.to_string());
                        self.bind(ty, &init, span)
                    }
                    _ => self.binop(ty, &x, op.symbol(), &y, span),
                }
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                if !lhs.ty.is_num() || !rhs.ty.is_num() {
                    return Err(CompileError::type_mismatch(
                        span,
                        format!(
                            "'{}' requires numbers, got {} and {}",
                            op.symbol(),
                            lhs.ty,
                            rhs.ty
                        ),
                    ));
                }
                self.binop(Ty::Bool, lhs, op.symbol(), rhs, span)
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                let (x, y) = self.plex_unify(lhs, rhs, span)?;
                let test = self.dialect.equal(&x.to_string(), &y.to_string(), &x.ty);
                let init = if op == BinaryOp::Ne {
                    format!("!{}", test)
                } else {
                    test
                };
                self.bind(Ty::Bool, &init, span)
            }
        }
    }

    /// `x op y` with both operands already unified.
    pub fn binop(&mut self, rtype: Ty, x: &ScValue, op: &str, y: &ScValue, span: Span) -> ScResult<ScValue> {
        let init = format!("{}{}{}", x, op, y);
        self.bind(rtype, &init, span)
    }

    /// Two-argument math builtin, spelled for the current dialect.
    pub fn bincall(
        &mut self,
        rtype: Ty,
        name: &'static str,
        x: &ScValue,
        y: &ScValue,
        span: Span,
    ) -> ScResult<ScValue> {
        let init = format!("{}({},{})", self.dialect.math_fn(name), x, y);
        self.bind(rtype, &init, span)
    }

    pub fn unary_call(&mut self, rtype: Ty, name: &'static str, x: &ScValue, span: Span) -> ScResult<ScValue> {
        let init = format!("{}({})", self.dialect.math_fn(name), x);
        self.bind(rtype, &init, span)
    }
}
