use std::rc::Rc;

use super::error::{CompileError, ScResult};
use super::handle::ScValue;
use crate::span::Span;
use crate::value::{Module, Value};

#[derive(Clone, Debug)]
struct Slot {
    value: ScValue,
    mutable: bool,
}

/// Bindings visible while compiling one function body: compiled local
/// slots plus the captured nonlocals of the closure being expanded.
#[derive(Debug)]
pub struct Frame {
    slots: Vec<Option<Slot>>,
    nonlocals: Rc<Module>,
    /// Set when the frame belongs to a call expanded from a pure
    /// expression: every slot then holds a constants-stream value.
    constant: bool,
}

impl Frame {
    pub fn new(nslots: usize, nonlocals: Rc<Module>) -> Self {
        Self {
            slots: vec![None; nslots],
            nonlocals,
            constant: false,
        }
    }

    pub fn with_constant_slots(mut self, constant: bool) -> Self {
        self.constant = constant;
        self
    }

    /// True if code reading this frame's locals belongs in the constants stream.
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    pub fn nonlocals(&self) -> &Rc<Module> {
        &self.nonlocals
    }

    pub fn get(&self, slot: usize, span: Span) -> ScResult<ScValue> {
        match self.slots.get(slot) {
            Some(Some(s)) => Ok(s.value.clone()),
            _ => Err(CompileError::unsupported_node(
                span,
                format!("local variable {} used before definition", slot),
            )),
        }
    }

    pub fn bind(&mut self, slot: usize, value: ScValue, mutable: bool) {
        if slot >= self.slots.len() {
            self.slots.resize(slot + 1, None);
        }
        self.slots[slot] = Some(Slot { value, mutable });
    }

    pub fn is_mutable(&self, slot: usize) -> bool {
        matches!(self.slots.get(slot), Some(Some(s)) if s.mutable)
    }

    pub fn nonlocal(&self, slot: usize, span: Span) -> ScResult<Value> {
        self.nonlocals.get(slot).cloned().ok_or_else(|| {
            CompileError::unsupported_node(span, format!("undefined nonlocal slot {}", slot))
        })
    }

    pub fn symbol(&self, name: &str, span: Span) -> ScResult<Value> {
        self.nonlocals.lookup(name).cloned().ok_or_else(|| {
            CompileError::unsupported_node(span, format!("{}: not defined", name))
        })
    }
}
