//! Name tables with a stable iteration order

use std::collections::HashMap;

use serde::Serialize;

/// A name→value table paired with its ordered name list.
///
/// Templates iterate in `names` order; lookups go through the map.
#[derive(Debug, Clone, Serialize)]
pub struct NameTable<V> {
    names: Vec<String>,
    #[serde(skip)]
    by_name: HashMap<String, V>,
    #[serde(skip)]
    values: Vec<V>,
}

impl<V> Default for NameTable<V> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            by_name: HashMap::new(),
            values: Vec::new(),
        }
    }
}

impl<V: Clone> NameTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; a repeated name keeps its first value
    pub fn push(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return;
        }
        self.by_name.insert(name.clone(), value.clone());
        self.names.push(name);
        self.values.push(value);
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Names in table order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values in table order
    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<V: Clone> FromIterator<(String, V)> for NameTable<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, value) in iter {
            table.push(name, value);
        }
        table
    }
}
