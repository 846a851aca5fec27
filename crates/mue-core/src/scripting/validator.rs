//! # Argument Validator
//!
//! Guards every native callable: positional arguments are checked against a
//! declared signature before any codec or backend call runs.

use super::codec::Category;
use crate::errors::BridgeError;
use rhai::Dynamic;
use std::any::TypeId;

/// Declared signature of a native callable.
#[derive(Copy, Clone, Debug)]
pub struct Signature {
    pub name: &'static str,
    pub params: &'static [Category],
}

impl Signature {
    pub const fn new(name: &'static str, params: &'static [Category]) -> Self {
        Self { name, params }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Rhai argument types for registration. Every slot accepts any value so that
    /// mismatches reach `check` instead of failing function resolution.
    pub fn arg_types(&self) -> Vec<TypeId> {
        vec![TypeId::of::<Dynamic>(); self.arity()]
    }

    /// Reports the first argument whose category differs from the declaration.
    /// Arguments are only inspected, never consumed.
    pub fn check(&self, args: &[&mut Dynamic]) -> Result<(), BridgeError> {
        for (index, (arg, expected)) in args.iter().zip(self.params).enumerate() {
            if !expected.matches(arg) {
                return Err(BridgeError::TypeMismatch {
                    function: self.name,
                    position: index + 1,
                    expected: *expected,
                    found: arg.type_name().to_string(),
                });
            }
        }
        Ok(())
    }
}
