//! Content addressing for compiled functions.
//!
//! A function's identity is the BLAKE3 hash of the code it compiles to,
//! emitted under a fixed name with no section markers. Properties:
//! - Renaming a function does not change its hash.
//! - Renaming captured bindings does not change its hash.
//! - Any change to the emitted code, including the target dialect,
//!   changes the hash.
//!
//! Host applications use these hashes as keys for caching compiled
//! shader programs.

use std::collections::BTreeMap;

use crate::dialect::Target;
use crate::program::FunctionDef;
use crate::sc::{ScCompiler, ScResult};

// Version byte for hash stability
const HASH_VERSION: u8 = 1;

/// Name every function is compiled under before hashing.
const CANONICAL_NAME: &str = "f";

// ─── Content Hash ──────────────────────────────────────────────────

/// A 256-bit BLAKE3 content hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Zero hash (used as placeholder).
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Display as full hex.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Display as short base-32 (8 characters, 40 bits).
    pub fn to_short(&self) -> String {
        const ALPHABET: &[u8] = b"0123456789abcdefghjkmnpqrstuvwxyz";
        let val = u64::from_be_bytes([
            0, 0, 0, self.0[0], self.0[1], self.0[2], self.0[3], self.0[4],
        ]);
        let mut result = String::with_capacity(8);
        for i in (0..8).rev() {
            let idx = ((val >> (i * 5)) & 0x1F) as usize;
            result.push(ALPHABET[idx] as char);
        }
        result
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

// ─── Hashing ───────────────────────────────────────────────────────

/// Hash emitted source text for a target.
pub fn hash_text(target: Target, text: &str) -> ContentHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[HASH_VERSION]);
    hasher.update(target.name().as_bytes());
    hasher.update(&[0]);
    hasher.update(text.as_bytes());
    ContentHash(*hasher.finalize().as_bytes())
}

/// Compile one function in isolation and hash the result.
pub fn hash_function(target: Target, def: &FunctionDef) -> ScResult<ContentHash> {
    let mut sc = ScCompiler::new(target).with_section_comments(false);
    sc.define_function(CANONICAL_NAME, &def.params, &def.result, &def.function)?;
    Ok(hash_text(target, sc.output()))
}

/// Hash every function, keyed by name.
pub fn hash_functions(
    target: Target,
    defs: &[FunctionDef],
) -> ScResult<BTreeMap<String, ContentHash>> {
    defs.iter()
        .map(|def| Ok((def.name.clone(), hash_function(target, def)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::function::Closure;
    use crate::op::{BinaryOp, Op, Pattern};
    use crate::sc::Ty;
    use crate::value::{Module, Value};

    fn scaled(name: &str, binding: &str, op: BinaryOp, k: f64) -> FunctionDef {
        let mut module = Module::new();
        module.define(binding, Value::Num(k));
        let body = Op::binary(op, Op::local(0), Op::nonlocal(0));
        let f = Closure::new(name, Pattern::Slot(0), body, Rc::new(module), 1);
        FunctionDef::new(name, vec![Ty::Num], Ty::Num, Value::function(f))
    }

    #[test]
    fn test_renaming_does_not_change_hash() {
        let a = scaled("grow", "k", BinaryOp::Mul, 2.0);
        let b = scaled("double", "factor", BinaryOp::Mul, 2.0);
        assert_eq!(
            hash_function(Target::Glsl, &a).unwrap(),
            hash_function(Target::Glsl, &b).unwrap(),
            "renamed function and binding should produce same hash"
        );
    }

    #[test]
    fn test_different_code_different_hash() {
        let a = scaled("f", "k", BinaryOp::Mul, 2.0);
        let b = scaled("f", "k", BinaryOp::Add, 2.0);
        let c = scaled("f", "k", BinaryOp::Mul, 3.0);
        let ha = hash_function(Target::Glsl, &a).unwrap();
        assert_ne!(ha, hash_function(Target::Glsl, &b).unwrap());
        assert_ne!(ha, hash_function(Target::Glsl, &c).unwrap());
    }

    #[test]
    fn test_target_is_part_of_hash() {
        let a = scaled("f", "k", BinaryOp::Mul, 2.0);
        assert_ne!(
            hash_function(Target::Glsl, &a).unwrap(),
            hash_function(Target::Cpp, &a).unwrap()
        );
    }

    #[test]
    fn test_hash_display() {
        let hash = ContentHash([0xAB; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert_eq!(hash.to_short().len(), 8);
        assert_eq!(format!("{}", hash), format!("#{}", hash.to_short()));
    }

    #[test]
    fn test_hash_deterministic() {
        let a = scaled("f", "k", BinaryOp::Sub, 1.0);
        let h1 = hash_functions(Target::OpenCl, &[a.clone()]).unwrap();
        let h2 = hash_functions(Target::OpenCl, &[a]).unwrap();
        assert_eq!(h1, h2);
        assert_ne!(h1["f"], ContentHash::zero());
    }

    #[test]
    fn test_failed_compile_has_no_hash() {
        let mut def = scaled("f", "k", BinaryOp::Mul, 2.0);
        def.result = Ty::num_vec(2);
        assert!(hash_function(Target::Glsl, &def).is_err());
    }
}
