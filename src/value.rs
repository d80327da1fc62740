//! Host runtime values as seen by the shape compiler.
//!
//! Values reach the compiler as literals in the operation tree, as captured
//! nonlocals of a closure, or as the function being compiled. Numbers,
//! booleans and lists fold into target-language constants; records only
//! serve field selection; reactive expressions and uniform variables stand
//! for inputs not known until the shader runs.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::function::ScFunction;
use crate::op::OpRef;
use crate::sc::types::Ty;

#[derive(Clone, Debug)]
pub enum Value {
    Num(f64),
    Bool(bool),
    List(Rc<Vec<Value>>),
    Record(Rc<BTreeMap<String, Value>>),
    Function(Rc<dyn ScFunction>),
    Reactive(Rc<ReactiveExpr>),
    Uniform(Rc<UniformVariable>),
}

/// A typed expression over uniform variables, compiled wherever the value
/// is used instead of being folded to a literal.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ReactiveExpr {
    pub ty: Ty,
    pub expr: OpRef,
}

/// A shader parameter exposed as a uniform input.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct UniformVariable {
    /// Name in the host program.
    pub name: String,
    /// Target-language identifier.
    pub identifier: String,
    pub ty: Ty,
    /// Initial value, used where the dialect has no uniform storage.
    pub value: Value,
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(items))
    }

    pub fn nums(items: &[f64]) -> Value {
        Value::list(items.iter().map(|x| Value::Num(*x)).collect())
    }

    pub fn record<I, K>(fields: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Record(Rc::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn function(f: impl ScFunction + 'static) -> Value {
        Value::Function(Rc::new(f))
    }

    pub fn reactive(ty: Ty, expr: OpRef) -> Value {
        Value::Reactive(Rc::new(ReactiveExpr { ty, expr }))
    }

    pub fn uniform(name: &str, identifier: &str, ty: Ty, value: Value) -> Value {
        Value::Uniform(Rc::new(UniformVariable {
            name: name.to_string(),
            identifier: identifier.to_string(),
            ty,
            value,
        }))
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// The function to invoke when this value is called: a function value
    /// itself, or the `call` field of a record.
    pub fn callable(&self) -> Option<Rc<dyn ScFunction>> {
        match self {
            Value::Function(f) => Some(f.clone()),
            Value::Record(fields) => match fields.get("call") {
                Some(Value::Function(f)) => Some(f.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// A reactive or uniform value: known only when the shader runs.
    pub fn is_runtime(&self) -> bool {
        matches!(self, Value::Reactive(_) | Value::Uniform(_))
    }

    /// The shader type of this value, or `Ty::Error` if it has none.
    pub fn sc_type(&self) -> Ty {
        match self {
            Value::Num(_) => Ty::Num,
            Value::Bool(_) => Ty::Bool,
            Value::Reactive(re) => re.ty.clone(),
            Value::Uniform(uv) => uv.ty.clone(),
            Value::List(items) => {
                let Some(first) = items.first() else {
                    return Ty::Error;
                };
                let elem = first.sc_type();
                if items[1..].iter().any(|item| item.sc_type() != elem) {
                    return Ty::Error;
                }
                Ty::list(&elem, items.len())
            }
            Value::Record(_) | Value::Function(_) => Ty::Error,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Reactive(a), Value::Reactive(b)) => a == b,
            (Value::Uniform(a), Value::Uniform(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Num(x) => x.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::List(items) => items.hash(state),
            Value::Record(fields) => fields.hash(state),
            Value::Function(f) => (Rc::as_ptr(f) as *const () as usize).hash(state),
            Value::Reactive(re) => re.hash(state),
            Value::Uniform(uv) => uv.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", name, value)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Reactive(re) => write!(f, "<reactive {}>", re.ty),
            Value::Uniform(uv) => write!(f, "{}", uv.name),
        }
    }
}

/// Captured nonlocal bindings of a closure, by slot and by name.
#[derive(Debug, Default)]
pub struct Module {
    slots: Vec<Value>,
    dictionary: BTreeMap<String, usize>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, returning its slot. Rebinding a name
    /// replaces the value in its existing slot.
    pub fn define(&mut self, name: &str, value: Value) -> usize {
        if let Some(&slot) = self.dictionary.get(name) {
            self.slots[slot] = value;
            return slot;
        }
        let slot = self.slots.len();
        self.slots.push(value);
        self.dictionary.insert(name.to_string(), slot);
        slot
    }

    pub fn get(&self, slot: usize) -> Option<&Value> {
        self.slots.get(slot)
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.dictionary.get(name).and_then(|&slot| self.slots.get(slot))
    }

    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.dictionary.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sc::types::Scalar;

    #[test]
    fn test_sc_type_of_lists() {
        assert_eq!(Value::nums(&[1.0, 2.0, 3.0]).sc_type(), Ty::num_vec(3));
        let bools = Value::list(vec![Value::Bool(true); 32]);
        assert_eq!(bools.sc_type(), Ty::Bool32);
        let mat = Value::list(vec![Value::nums(&[1.0, 0.0]), Value::nums(&[0.0, 1.0])]);
        assert_eq!(mat.sc_type(), Ty::Mat(2));
        let grid = Value::list(vec![Value::nums(&[1.0, 2.0, 3.0, 4.0, 5.0]); 2]);
        assert_eq!(grid.sc_type(), Ty::Array(Box::new(Ty::Num), vec![2, 5]));
        let bvec = Value::list(vec![Value::Bool(true), Value::Bool(false)]);
        assert_eq!(bvec.sc_type(), Ty::Vec(Scalar::Bool, 2));
    }

    #[test]
    fn test_sc_type_rejects_mixed_and_unrepresentable() {
        assert!(Value::list(vec![]).sc_type().is_error());
        assert!(Value::list(vec![Value::Num(1.0), Value::Bool(true)]).sc_type().is_error());
        assert!(Value::record([("a", Value::Num(1.0))]).sc_type().is_error());
    }

    #[test]
    fn test_num_equality_is_bitwise() {
        assert_eq!(Value::Num(1.5), Value::Num(1.5));
        assert_ne!(Value::Num(0.0), Value::Num(-0.0));
        assert_eq!(Value::Num(f64::NAN), Value::Num(f64::NAN));
    }

    #[test]
    fn test_module_define_and_lookup() {
        let mut m = Module::new();
        let a = m.define("a", Value::Num(1.0));
        let b = m.define("b", Value::Num(2.0));
        assert_eq!((a, b), (0, 1));
        assert_eq!(m.define("a", Value::Num(3.0)), 0);
        assert_eq!(m.lookup("a"), Some(&Value::Num(3.0)));
        assert_eq!(m.get(1), Some(&Value::Num(2.0)));
        assert_eq!(m.len(), 2);
        assert!(m.lookup("c").is_none());
    }
}
