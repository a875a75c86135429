//! Table of people allowed through the gate

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Person {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "departamento")]
    pub department: String,
}

impl Person {
    pub fn new(name: &str, department: &str) -> Self {
        Self {
            name: name.to_owned(),
            department: department.to_owned(),
        }
    }
}

/// Authorized identifiers, keyed by the exact text the relay sends.
///
/// Serializes as a plain `{"<id>": {"nome": .., "departamento": ..}}` map.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Registry(BTreeMap<String, Person>);

impl Registry {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, id: &str, person: Person) {
        self.0.insert(id.to_owned(), person);
    }

    pub fn lookup(&self, id: &str) -> Option<&Person> {
        self.0.get(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Person)> {
        self.0.iter().map(|(id, person)| (id.as_str(), person))
    }
}

impl Default for Registry {
    /// The demo staff the gate ships with.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.insert("12345", Person::new("João Silva", "TI"));
        registry.insert("67890", Person::new("Maria Santos", "RH"));
        registry.insert("11111", Person::new("Pedro Costa", "Financeiro"));
        registry.insert("22222", Person::new("Ana Oliveira", "Marketing"));
        registry.insert("99999", Person::new("Admin", "Administração"));
        registry
    }
}
