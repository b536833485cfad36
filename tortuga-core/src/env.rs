//! Dynamic-scope frames, bindings, property lists, and the PRNG.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::value::Value;

/// A variable cell. `value: None` means the name exists but has no value
/// (created by `LOCAL`/`GLOBAL`, or a missing actual argument).
#[derive(Clone, Debug, Default)]
pub struct Binding {
    pub value: Option<Value>,
    pub buried: bool,
    pub traced: bool,
    pub stepped: bool,
}

impl Binding {
    pub fn new(value: Option<Value>) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }
}

/// One level of the dynamic environment stack. Keys are case-folded
/// (uppercased) names. The `test` slot is the sidecar written by `TEST`
/// and consulted by `IFT`/`IFF`; it is not a named binding.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    vars: HashMap<String, Binding>,
    pub test: Option<bool>,
}

impl Frame {
    pub fn get(&self, folded: &str) -> Option<&Binding> {
        self.vars.get(folded)
    }

    pub fn get_mut(&mut self, folded: &str) -> Option<&mut Binding> {
        self.vars.get_mut(folded)
    }

    pub fn insert(&mut self, name: &str, binding: Binding) {
        self.vars.insert(name.to_uppercase(), binding);
    }

    pub fn remove(&mut self, folded: &str) -> Option<Binding> {
        self.vars.remove(folded)
    }

    pub fn contains(&self, folded: &str) -> bool {
        self.vars.contains_key(folded)
    }

    pub fn names(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }

    pub fn bindings_mut(&mut self) -> impl Iterator<Item = (&String, &mut Binding)> {
        self.vars.iter_mut()
    }
}

/// Process-wide property-list table, orthogonal to scopes. Both the plist
/// name and the property name are case-folded.
#[derive(Clone, Debug, Default)]
pub struct PlistTable {
    lists: HashMap<String, HashMap<String, Value>>,
}

impl PlistTable {
    pub fn put(&mut self, plist: &str, prop: &str, value: Value) {
        self.lists
            .entry(plist.to_uppercase())
            .or_default()
            .insert(prop.to_uppercase(), value);
    }

    pub fn get(&self, plist: &str, prop: &str) -> Option<&Value> {
        self.lists
            .get(&plist.to_uppercase())
            .and_then(|props| props.get(&prop.to_uppercase()))
    }

    pub fn remove(&mut self, plist: &str, prop: &str) {
        let key = plist.to_uppercase();
        if let Some(props) = self.lists.get_mut(&key) {
            props.remove(&prop.to_uppercase());
            if props.is_empty() {
                self.lists.remove(&key);
            }
        }
    }

    pub fn remove_list(&mut self, plist: &str) {
        self.lists.remove(&plist.to_uppercase());
    }

    /// Flat `[prop value prop value …]` snapshot of one plist.
    pub fn pairs(&self, plist: &str) -> Vec<Value> {
        let mut out = Vec::new();
        if let Some(props) = self.lists.get(&plist.to_uppercase()) {
            let mut keys: Vec<&String> = props.keys().collect();
            keys.sort();
            for key in keys {
                out.push(Value::word(key));
                out.push(props[key].clone());
            }
        }
        out
    }

    pub fn names(&self) -> Vec<String> {
        self.lists.keys().cloned().collect()
    }

    pub fn has(&self, plist: &str) -> bool {
        self.lists.contains_key(&plist.to_uppercase())
    }

    pub fn clear(&mut self) {
        self.lists.clear();
    }
}

/// Seedable PRNG behind `RANDOM` / `RERANDOM`.
pub struct Prng {
    rng: StdRng,
}

impl Default for Prng {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Prng {
    /// Restart the sequence from a seed (`RERANDOM`).
    pub fn reseed(&mut self, seed: i64) {
        self.rng = StdRng::seed_from_u64(seed as u64);
    }

    /// Uniform integer in `[0, max)`.
    pub fn below(&mut self, max: i64) -> i64 {
        if max <= 0 {
            0
        } else {
            self.rng.gen_range(0..max)
        }
    }

    /// Uniform integer in `[low, high]`.
    pub fn between(&mut self, low: i64, high: i64) -> i64 {
        if low >= high {
            low
        } else {
            self.rng.gen_range(low..=high)
        }
    }
}
