use std::fmt;

use super::types::Ty;

/// A compiled value: the name of an emitted target-language binding and
/// its type. Displays as the variable name `r<N>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScValue {
    pub index: u32,
    pub ty: Ty,
}

impl ScValue {
    pub fn new(index: u32, ty: Ty) -> Self {
        Self { index, ty }
    }
}

impl fmt::Display for ScValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.index)
    }
}
