use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::models::transaction::RecordKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(Uuid);

impl LabelId {
    pub fn new() -> Self {
        LabelId(Uuid::new_v4())
    }
}

impl Default for LabelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LabelId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(LabelId)
    }
}

/// A user-defined tag. `transactions` is the back-collection of records carrying it and is
/// only changed through the record's label operations.
#[derive(Debug, Clone)]
pub struct Label {
    id: LabelId,
    name: String,
    transactions: Vec<RecordKey>,
}

impl Label {
    pub fn new(name: &str) -> Self {
        Self::with_id(LabelId::new(), name)
    }

    pub fn with_id(id: LabelId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            transactions: Vec::new(),
        }
    }

    pub fn id(&self) -> LabelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transactions(&self) -> &[RecordKey] {
        &self.transactions
    }

    pub fn contains(&self, key: RecordKey) -> bool {
        self.transactions.contains(&key)
    }

    pub(crate) fn link(&mut self, key: RecordKey) {
        self.transactions.push(key);
    }

    // Removes one occurrence, mirroring the record side.
    pub(crate) fn unlink(&mut self, key: RecordKey) {
        if let Some(pos) = self.transactions.iter().position(|k| *k == key) {
            self.transactions.remove(pos);
        }
    }

    pub(crate) fn rekey(&mut self, from: RecordKey, to: RecordKey) {
        if let Some(entry) = self.transactions.iter_mut().find(|k| **k == from) {
            *entry = to;
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Owns every label known to one unit of work, keyed by id.
#[derive(Debug, Default)]
pub struct LabelRegistry {
    labels: HashMap<LabelId, Label>,
    order: Vec<LabelId>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `label`, replacing nothing if a label with the same id is already registered.
    pub fn insert(&mut self, label: Label) -> LabelId {
        let id = label.id();
        if !self.labels.contains_key(&id) {
            self.order.push(id);
            self.labels.insert(id, label);
        }
        id
    }

    pub fn create(&mut self, name: &str) -> LabelId {
        self.insert(Label::new(name))
    }

    pub fn get_or_create(&mut self, name: &str) -> LabelId {
        match self.find_by_name(name) {
            Some(label) => label.id(),
            None => self.create(name),
        }
    }

    pub fn get(&self, id: LabelId) -> Option<&Label> {
        self.labels.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: LabelId) -> Option<&mut Label> {
        self.labels.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: LabelId) -> Option<Label> {
        self.order.retain(|existing| *existing != id);
        self.labels.remove(&id)
    }

    /// Drops every link to `key` from every label.
    pub(crate) fn forget(&mut self, key: RecordKey) {
        for label in self.labels.values_mut() {
            label.transactions.retain(|k| *k != key);
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Label> {
        self.iter().find(|label| label.name() == name)
    }

    pub fn contains(&self, id: LabelId) -> bool {
        self.labels.contains_key(&id)
    }

    /// Labels in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.order.iter().filter_map(|id| self.labels.get(id))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
