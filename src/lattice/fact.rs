//! Per-program-point dataflow facts mapping a variable to its lattice
//! value. Variables absent from a `CPFact` are implicitly `UNDEF`.

use std::collections::HashMap;
use std::fmt;

use crate::ir::VarId;
use crate::lattice::value::Value;

#[derive(Clone, Default)]
pub struct CPFact {
    values: HashMap<VarId, Value>,
}

impl CPFact {
    pub fn new() -> Self {
        CPFact { values: HashMap::new() }
    }

    pub fn get(&self, var: VarId) -> Value {
        self.values.get(&var).copied().unwrap_or(Value::Undef)
    }

    /// Sets `var`'s value, returning whether the fact changed.
    pub fn update(&mut self, var: VarId, value: Value) -> bool {
        if self.get(var) == value {
            return false;
        }
        self.values.insert(var, value);
        true
    }

    pub fn remove(&mut self, var: VarId) -> Option<Value> {
        self.values.remove(&var)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, Value)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn copy_from(&mut self, other: &CPFact) {
        self.values = other.values.clone();
    }
}

impl fmt::Debug for CPFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}
