//! Compile jobs: a JSON description of uniforms and the functions to
//! compile, as handed over by a host application or written by hand.
//!
//! ```json
//! {
//!   "target": "glsl",
//!   "uniforms": [{ "name": "radius", "type": "float", "value": 1.0 }],
//!   "functions": [{
//!     "name": "dist",
//!     "params": ["vec4"],
//!     "result": "float",
//!     "function": {
//!       "kind": "closure", "param": 0, "nslots": 1,
//!       "nonlocals": [{ "name": "r", "value": { "kind": "uniform", "name": "radius" } }],
//!       "body": { "op": "binary", "operator": "-",
//!                 "lhs": { "op": "call", "func": { "op": "const", "value": { "kind": "builtin", "name": "mag" } },
//!                          "arg": { "op": "index", "base": { "op": "local", "slot": 0 },
//!                                   "index": { "op": "const", "value": [0, 1, 2] } } },
//!                 "rhs": { "op": "nonlocal", "slot": 0 } }
//!     }
//!   }]
//! }
//! ```
//!
//! Types use GLSL spellings. Values are numbers, booleans, lists, or
//! objects tagged by `kind`; operation nodes are objects tagged by `op`.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builtins::builtin_value;
use crate::diagnostic::Diagnostic;
use crate::dialect::Target;
use crate::function::Closure;
use crate::op::{BinaryOp, Locative, Op, OpKind, OpRef, Pattern, UnaryOp};
use crate::program::{FunctionDef, Program};
use crate::sc::Ty;
use crate::span::Span;
use crate::value::{Module, UniformVariable, Value};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid job file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{context}: {message}")]
    Invalid { context: String, message: String },
}

impl JobError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string(), Span::dummy())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Source text the spans refer to, for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uniforms: Vec<UniformDoc>,
    pub functions: Vec<FunctionDoc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UniformDoc {
    pub name: String,
    /// Target-language identifier; defaults to `rv_<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(rename = "type")]
    pub ty: String,
    pub value: ValueDoc,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionDoc {
    pub name: String,
    pub params: Vec<String>,
    pub result: String,
    pub function: ValueDoc,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueDoc {
    Bool(bool),
    Num(f64),
    List(Vec<ValueDoc>),
    Object(Box<ObjectDoc>),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectDoc {
    Record {
        fields: BTreeMap<String, ValueDoc>,
    },
    Closure {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        param: PatternDoc,
        nslots: usize,
        /// Captured bindings; slot numbers follow the order given.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        nonlocals: Vec<BindingDoc>,
        body: OpDoc,
    },
    Builtin {
        name: String,
    },
    /// Reference to one of the job's uniforms.
    Uniform {
        name: String,
    },
    Reactive {
        #[serde(rename = "type")]
        ty: String,
        expr: OpDoc,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BindingDoc {
    pub name: String,
    pub value: ValueDoc,
}

/// A slot number, `"_"`, or a list of patterns.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternDoc {
    Slot(usize),
    Wildcard(String),
    List(Vec<PatternDoc>),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpDoc {
    #[serde(flatten)]
    pub kind: OpKindDoc,
    /// Byte range into the job's `source`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<[u32; 2]>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpKindDoc {
    Const {
        value: ValueDoc,
    },
    Local {
        slot: usize,
    },
    Nonlocal {
        slot: usize,
    },
    Symbol {
        name: String,
    },
    List {
        items: Vec<OpDoc>,
    },
    Range {
        first: Box<OpDoc>,
        last: Box<OpDoc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<Box<OpDoc>>,
        #[serde(default)]
        half_open: bool,
    },
    Dot {
        base: Box<OpDoc>,
        field: String,
    },
    Call {
        func: Box<OpDoc>,
        arg: Box<OpDoc>,
    },
    Index {
        base: Box<OpDoc>,
        index: Box<OpDoc>,
    },
    Slice {
        base: Box<OpDoc>,
        indices: Box<OpDoc>,
    },
    Unary {
        operator: String,
        arg: Box<OpDoc>,
    },
    Binary {
        operator: String,
        lhs: Box<OpDoc>,
        rhs: Box<OpDoc>,
    },
    Or {
        lhs: Box<OpDoc>,
        rhs: Box<OpDoc>,
    },
    And {
        lhs: Box<OpDoc>,
        rhs: Box<OpDoc>,
    },
    If {
        cond: Box<OpDoc>,
        then: Box<OpDoc>,
        #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
        els: Option<Box<OpDoc>>,
    },
    While {
        cond: Box<OpDoc>,
        body: Box<OpDoc>,
    },
    For {
        pattern: PatternDoc,
        list: Box<OpDoc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cond: Option<Box<OpDoc>>,
        body: Box<OpDoc>,
    },
    Block {
        stmts: Vec<OpDoc>,
        body: Box<OpDoc>,
    },
    Seq {
        stmts: Vec<OpDoc>,
    },
    Define {
        pattern: PatternDoc,
        value: Box<OpDoc>,
    },
    Assign {
        target: Box<LocativeDoc>,
        value: Box<OpDoc>,
    },
    Null,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "loc", rename_all = "snake_case")]
pub enum LocativeDoc {
    Local {
        slot: usize,
    },
    Index {
        base: Box<LocativeDoc>,
        index: OpDoc,
    },
    Lens {
        base: Box<LocativeDoc>,
        lens: OpDoc,
    },
    Slice {
        base: Box<LocativeDoc>,
        indices: OpDoc,
    },
}

impl Job {
    pub fn from_json(text: &str) -> Result<Job, JobError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Job, JobError> {
        let text = std::fs::read_to_string(path).map_err(|source| JobError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Job::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, JobError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The target named in the job, if any.
    pub fn target(&self) -> Result<Option<Target>, JobError> {
        self.target
            .as_deref()
            .map(|name| {
                name.parse::<Target>().map_err(|message| JobError::Invalid {
                    context: "target".to_string(),
                    message,
                })
            })
            .transpose()
    }

    /// Build the program: uniforms first, so functions can refer to them.
    pub fn to_program(&self) -> Result<Program, JobError> {
        let mut loader = Loader::default();
        let mut program = Program::new();
        for doc in &self.uniforms {
            let uv = loader
                .uniform(doc)
                .map_err(|message| invalid(format!("uniform {}", doc.name), message))?;
            loader.uniforms.insert(doc.name.clone(), uv.clone());
            program = program.with_uniform(uv);
        }
        for doc in &self.functions {
            let def = loader
                .function(doc)
                .map_err(|message| invalid(format!("function {}", doc.name), message))?;
            program = program.with_function(def);
        }
        Ok(program)
    }
}

fn invalid(context: String, message: String) -> JobError {
    JobError::Invalid { context, message }
}

fn parse_type(text: &str) -> Result<Ty, String> {
    text.parse()
}

/// Converts documents to values, resolving uniform references.
#[derive(Default)]
struct Loader {
    uniforms: BTreeMap<String, Rc<UniformVariable>>,
}

impl Loader {
    fn uniform(&self, doc: &UniformDoc) -> Result<Rc<UniformVariable>, String> {
        let identifier = doc
            .identifier
            .clone()
            .unwrap_or_else(|| format!("rv_{}", doc.name));
        Ok(Rc::new(UniformVariable {
            name: doc.name.clone(),
            identifier,
            ty: parse_type(&doc.ty)?,
            value: self.value(&doc.value)?,
        }))
    }

    fn function(&self, doc: &FunctionDoc) -> Result<FunctionDef, String> {
        let params = doc
            .params
            .iter()
            .map(|p| parse_type(p))
            .collect::<Result<Vec<_>, _>>()?;
        let result = parse_type(&doc.result)?;
        Ok(FunctionDef::new(&doc.name, params, result, self.value(&doc.function)?))
    }

    fn value(&self, doc: &ValueDoc) -> Result<Value, String> {
        match doc {
            ValueDoc::Bool(b) => Ok(Value::Bool(*b)),
            ValueDoc::Num(x) => Ok(Value::Num(*x)),
            ValueDoc::List(items) => Ok(Value::list(
                items
                    .iter()
                    .map(|item| self.value(item))
                    .collect::<Result<_, _>>()?,
            )),
            ValueDoc::Object(object) => self.object(object),
        }
    }

    fn object(&self, doc: &ObjectDoc) -> Result<Value, String> {
        match doc {
            ObjectDoc::Record { fields } => {
                let fields = fields
                    .iter()
                    .map(|(name, value)| Ok((name.clone(), self.value(value)?)))
                    .collect::<Result<Vec<_>, String>>()?;
                Ok(Value::record(fields))
            }
            ObjectDoc::Closure {
                name,
                param,
                nslots,
                nonlocals,
                body,
            } => {
                let mut module = Module::new();
                for binding in nonlocals {
                    module.define(&binding.name, self.value(&binding.value)?);
                }
                let closure = Closure::new(
                    name.as_deref().unwrap_or("lambda"),
                    pattern(param)?,
                    self.op(body)?,
                    Rc::new(module),
                    *nslots,
                );
                Ok(Value::function(closure))
            }
            ObjectDoc::Builtin { name } => {
                builtin_value(name).ok_or_else(|| format!("unknown builtin '{}'", name))
            }
            ObjectDoc::Uniform { name } => self
                .uniforms
                .get(name)
                .map(|uv| Value::Uniform(uv.clone()))
                .ok_or_else(|| format!("unknown uniform '{}'", name)),
            ObjectDoc::Reactive { ty, expr } => Ok(Value::reactive(parse_type(ty)?, self.op(expr)?)),
        }
    }

    fn op(&self, doc: &OpDoc) -> Result<OpRef, String> {
        let span = doc
            .span
            .map(|[start, end]| Span::new(0, start, end))
            .unwrap_or_default();
        let kind = match &doc.kind {
            OpKindDoc::Const { value } => OpKind::Constant(self.value(value)?),
            OpKindDoc::Local { slot } => OpKind::Local(*slot),
            OpKindDoc::Nonlocal { slot } => OpKind::Nonlocal(*slot),
            OpKindDoc::Symbol { name } => OpKind::Symbolic(name.clone()),
            OpKindDoc::List { items } => OpKind::List(self.ops(items)?),
            OpKindDoc::Range {
                first,
                last,
                step,
                half_open,
            } => OpKind::Range {
                first: self.op(first)?,
                last: self.op(last)?,
                step: step.as_deref().map(|s| self.op(s)).transpose()?,
                half_open: *half_open,
            },
            OpKindDoc::Dot { base, field } => OpKind::Dot {
                base: self.op(base)?,
                field: field.clone(),
            },
            OpKindDoc::Call { func, arg } => OpKind::Call {
                func: self.op(func)?,
                arg: self.op(arg)?,
            },
            OpKindDoc::Index { base, index } => OpKind::Index {
                base: self.op(base)?,
                index: self.op(index)?,
            },
            OpKindDoc::Slice { base, indices } => OpKind::Slice {
                base: self.op(base)?,
                indices: self.op(indices)?,
            },
            OpKindDoc::Unary { operator, arg } => {
                let op = match operator.as_str() {
                    "-" => UnaryOp::Neg,
                    "!" => UnaryOp::Not,
                    other => return Err(format!("unknown unary operator '{}'", other)),
                };
                OpKind::Unary {
                    op,
                    arg: self.op(arg)?,
                }
            }
            OpKindDoc::Binary { operator, lhs, rhs } => OpKind::Binary {
                op: BinaryOp::from_symbol(operator)
                    .ok_or_else(|| format!("unknown binary operator '{}'", operator))?,
                lhs: self.op(lhs)?,
                rhs: self.op(rhs)?,
            },
            OpKindDoc::Or { lhs, rhs } => OpKind::Or(self.op(lhs)?, self.op(rhs)?),
            OpKindDoc::And { lhs, rhs } => OpKind::And(self.op(lhs)?, self.op(rhs)?),
            OpKindDoc::If { cond, then, els } => match els {
                Some(els) => OpKind::IfElse {
                    cond: self.op(cond)?,
                    then: self.op(then)?,
                    els: self.op(els)?,
                },
                None => OpKind::If {
                    cond: self.op(cond)?,
                    then: self.op(then)?,
                },
            },
            OpKindDoc::While { cond, body } => OpKind::While {
                cond: self.op(cond)?,
                body: self.op(body)?,
            },
            OpKindDoc::For {
                pattern: pat,
                list,
                cond,
                body,
            } => OpKind::For {
                pattern: pattern(pat)?,
                list: self.op(list)?,
                cond: cond.as_deref().map(|c| self.op(c)).transpose()?,
                body: self.op(body)?,
            },
            OpKindDoc::Block { stmts, body } => OpKind::Block {
                stmts: self.ops(stmts)?,
                body: self.op(body)?,
            },
            OpKindDoc::Seq { stmts } => OpKind::Compound(self.ops(stmts)?),
            OpKindDoc::Define { pattern: pat, value } => OpKind::Define {
                pattern: pattern(pat)?,
                definiens: self.op(value)?,
            },
            OpKindDoc::Assign { target, value } => OpKind::Assign {
                locative: self.locative(target)?,
                expr: self.op(value)?,
            },
            OpKindDoc::Null => OpKind::Null,
        };
        Ok(Op::with_span(kind, span))
    }

    fn ops(&self, docs: &[OpDoc]) -> Result<Vec<OpRef>, String> {
        docs.iter().map(|doc| self.op(doc)).collect()
    }

    fn locative(&self, doc: &LocativeDoc) -> Result<Locative, String> {
        Ok(match doc {
            LocativeDoc::Local { slot } => Locative::Local(*slot),
            LocativeDoc::Index { base, index } => Locative::Indexed {
                base: Box::new(self.locative(base)?),
                index: self.op(index)?,
            },
            LocativeDoc::Lens { base, lens } => Locative::Lens {
                base: Box::new(self.locative(base)?),
                lens: self.op(lens)?,
            },
            LocativeDoc::Slice { base, indices } => Locative::Slice {
                base: Box::new(self.locative(base)?),
                indices: self.op(indices)?,
            },
        })
    }
}

fn pattern(doc: &PatternDoc) -> Result<Pattern, String> {
    match doc {
        PatternDoc::Slot(slot) => Ok(Pattern::Slot(*slot)),
        PatternDoc::Wildcard(s) if s == "_" => Ok(Pattern::Wildcard),
        PatternDoc::Wildcard(s) => Err(format!("bad pattern '{}': expected a slot or '_'", s)),
        PatternDoc::List(items) => Ok(Pattern::List(
            items.iter().map(pattern).collect::<Result<_, _>>()?,
        )),
    }
}
