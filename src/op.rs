//! The resolved operation tree consumed by the shape compiler.
//!
//! Locals are already assigned frame slots and nonlocals resolved against
//! the enclosing closure's module. Purity is computed bottom-up when a node
//! is built, together with a structural hash that ignores source spans, so
//! syntactically identical subtrees compare and hash equal.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::sc::ScValue;
use crate::span::Span;
use crate::value::Value;

pub type OpRef = Rc<Op>;

pub struct Op {
    pub kind: OpKind,
    /// True iff this node and all descendants read no local variables and
    /// perform no actions.
    pub pure: bool,
    pub span: Span,
    hash: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<BinaryOp> {
        const ALL: [BinaryOp; 11] = [
            BinaryOp::Add,
            BinaryOp::Sub,
            BinaryOp::Mul,
            BinaryOp::Div,
            BinaryOp::Pow,
            BinaryOp::Lt,
            BinaryOp::Le,
            BinaryOp::Gt,
            BinaryOp::Ge,
            BinaryOp::Eq,
            BinaryOp::Ne,
        ];
        ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

/// Binding target of a definition, a function parameter or a loop variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    Slot(usize),
    Wildcard,
    List(Vec<Pattern>),
}

/// Left side of an assignment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Locative {
    Local(usize),
    /// `base[i]`; the index is a one-element list expression.
    Indexed { base: Box<Locative>, index: OpRef },
    /// `base.lens` where the lens is a component number.
    Lens { base: Box<Locative>, lens: OpRef },
    /// `base[i..j]`.
    Slice { base: Box<Locative>, indices: OpRef },
    /// Any other expression; never assignable.
    Expr(OpRef),
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    Constant(Value),
    Local(usize),
    Nonlocal(usize),
    Symbolic(String),
    /// An already compiled value, e.g. a function parameter.
    Compiled(ScValue),
    List(Vec<OpRef>),
    Range {
        first: OpRef,
        last: OpRef,
        step: Option<OpRef>,
        half_open: bool,
    },
    Dot {
        base: OpRef,
        field: String,
    },
    Call {
        func: OpRef,
        arg: OpRef,
    },
    Index {
        base: OpRef,
        index: OpRef,
    },
    Slice {
        base: OpRef,
        indices: OpRef,
    },
    Unary {
        op: UnaryOp,
        arg: OpRef,
    },
    Binary {
        op: BinaryOp,
        lhs: OpRef,
        rhs: OpRef,
    },
    Or(OpRef, OpRef),
    And(OpRef, OpRef),
    IfElse {
        cond: OpRef,
        then: OpRef,
        els: OpRef,
    },
    If {
        cond: OpRef,
        then: OpRef,
    },
    While {
        cond: OpRef,
        body: OpRef,
    },
    For {
        pattern: Pattern,
        list: OpRef,
        cond: Option<OpRef>,
        body: OpRef,
    },
    Block {
        stmts: Vec<OpRef>,
        body: OpRef,
    },
    Compound(Vec<OpRef>),
    Define {
        pattern: Pattern,
        definiens: OpRef,
    },
    Assign {
        locative: Locative,
        expr: OpRef,
    },
    Null,
}

impl OpKind {
    /// Short node name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Constant(_) => "constant",
            OpKind::Local(_) => "local variable",
            OpKind::Nonlocal(_) => "nonlocal variable",
            OpKind::Symbolic(_) => "symbolic reference",
            OpKind::Compiled(_) => "compiled value",
            OpKind::List(_) => "list",
            OpKind::Range { .. } => "range",
            OpKind::Dot { .. } => "field selection",
            OpKind::Call { .. } => "call",
            OpKind::Index { .. } => "index",
            OpKind::Slice { .. } => "slice",
            OpKind::Unary { .. } => "unary operation",
            OpKind::Binary { .. } => "binary operation",
            OpKind::Or(..) => "or",
            OpKind::And(..) => "and",
            OpKind::IfElse { .. } => "if-else",
            OpKind::If { .. } => "if",
            OpKind::While { .. } => "while",
            OpKind::For { .. } => "for",
            OpKind::Block { .. } => "block",
            OpKind::Compound(_) => "statement list",
            OpKind::Define { .. } => "definition",
            OpKind::Assign { .. } => "assignment",
            OpKind::Null => "empty statement",
        }
    }

    fn is_pure(&self) -> bool {
        match self {
            OpKind::Constant(_) | OpKind::Nonlocal(_) | OpKind::Symbolic(_) => true,
            OpKind::Local(_)
            | OpKind::Compiled(_)
            | OpKind::While { .. }
            | OpKind::For { .. }
            | OpKind::Block { .. }
            | OpKind::Compound(_)
            | OpKind::Define { .. }
            | OpKind::Assign { .. }
            | OpKind::Null => false,
            OpKind::List(items) => items.iter().all(|op| op.pure),
            OpKind::Range {
                first, last, step, ..
            } => first.pure && last.pure && step.as_ref().map_or(true, |s| s.pure),
            OpKind::Dot { base, .. } => base.pure,
            OpKind::Call { func, arg } => func.pure && arg.pure,
            OpKind::Index { base, index } => base.pure && index.pure,
            OpKind::Slice { base, indices } => base.pure && indices.pure,
            OpKind::Unary { arg, .. } => arg.pure,
            OpKind::Binary { lhs, rhs, .. } => lhs.pure && rhs.pure,
            OpKind::Or(a, b) | OpKind::And(a, b) => a.pure && b.pure,
            OpKind::IfElse { cond, then, els } => cond.pure && then.pure && els.pure,
            OpKind::If { cond, then } => cond.pure && then.pure,
        }
    }
}

impl Op {
    pub fn new(kind: OpKind) -> OpRef {
        Op::with_span(kind, Span::dummy())
    }

    pub fn with_span(kind: OpKind, span: Span) -> OpRef {
        let pure = kind.is_pure();
        let mut hasher = DefaultHasher::new();
        kind.hash(&mut hasher);
        Rc::new(Op {
            kind,
            pure,
            span,
            hash: hasher.finish(),
        })
    }

    pub fn constant(value: Value) -> OpRef {
        Op::new(OpKind::Constant(value))
    }

    pub fn num(x: f64) -> OpRef {
        Op::constant(Value::Num(x))
    }

    pub fn local(slot: usize) -> OpRef {
        Op::new(OpKind::Local(slot))
    }

    pub fn nonlocal(slot: usize) -> OpRef {
        Op::new(OpKind::Nonlocal(slot))
    }

    pub fn compiled(value: ScValue) -> OpRef {
        Op::new(OpKind::Compiled(value))
    }

    pub fn list(items: Vec<OpRef>) -> OpRef {
        Op::new(OpKind::List(items))
    }

    pub fn call(func: OpRef, arg: OpRef) -> OpRef {
        Op::new(OpKind::Call { func, arg })
    }

    pub fn index(base: OpRef, index: OpRef) -> OpRef {
        Op::new(OpKind::Index { base, index })
    }

    pub fn binary(op: BinaryOp, lhs: OpRef, rhs: OpRef) -> OpRef {
        Op::new(OpKind::Binary { op, lhs, rhs })
    }

    pub fn unary(op: UnaryOp, arg: OpRef) -> OpRef {
        Op::new(OpKind::Unary { op, arg })
    }

    pub fn if_else(cond: OpRef, then: OpRef, els: OpRef) -> OpRef {
        Op::new(OpKind::IfElse { cond, then, els })
    }

    pub fn block(stmts: Vec<OpRef>, body: OpRef) -> OpRef {
        Op::new(OpKind::Block { stmts, body })
    }

    pub fn define(pattern: Pattern, definiens: OpRef) -> OpRef {
        Op::new(OpKind::Define { pattern, definiens })
    }

    pub fn assign(locative: Locative, expr: OpRef) -> OpRef {
        Op::new(OpKind::Assign { locative, expr })
    }

    pub fn structural_hash(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for Op {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.kind == other.kind
    }
}

impl Eq for Op {}

impl Hash for Op {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if !self.pure {
            write!(f, "!")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purity_is_bottom_up() {
        let pure = Op::binary(BinaryOp::Add, Op::nonlocal(0), Op::num(1.0));
        assert!(pure.pure);
        let impure = Op::binary(BinaryOp::Add, Op::local(0), Op::num(1.0));
        assert!(!impure.pure);
        assert!(!Op::list(vec![pure.clone(), impure]).pure);
        assert!(Op::list(vec![pure.clone(), pure]).pure);
    }

    #[test]
    fn test_structural_equality_ignores_span() {
        let a = Op::with_span(OpKind::Nonlocal(3), Span::new(0, 1, 2));
        let b = Op::with_span(OpKind::Nonlocal(3), Span::new(0, 7, 9));
        assert_eq!(a, b);
        assert_eq!(a.structural_hash(), b.structural_hash());
        let sum_a = Op::binary(BinaryOp::Add, a, Op::num(1.0));
        let sum_b = Op::binary(BinaryOp::Add, b, Op::num(1.0));
        assert_eq!(sum_a, sum_b);
        assert_ne!(sum_a, Op::binary(BinaryOp::Sub, Op::nonlocal(3), Op::num(1.0)));
    }

    #[test]
    fn test_statements_are_impure() {
        let stmt = Op::define(Pattern::Slot(0), Op::num(2.0));
        assert!(!stmt.pure);
        assert!(!Op::new(OpKind::Null).pure);
    }
}
