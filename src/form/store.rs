use std::sync::Arc;

use indexmap::IndexMap;

use super::{
    descriptor::{FieldDescriptor, FieldValue},
    error::UnknownField,
};

/// Field map as it travels over the wire, keyed by field name.
pub type FieldsByName = IndexMap<String, FieldDescriptor>;

/// Which value lands in the store for a field named by a patch response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatchMergePolicy {
    /// Re-apply the value the editor sent to every field the response names.
    #[default]
    IssuedValue,
    /// Take whatever value the server echoed back for each field.
    ServerValue,
}

/// Immutable snapshot of every field in an attribute instance.
///
/// Cloning is cheap and every update hands back a new snapshot, so a
/// renderer holding an older clone keeps seeing consistent data.
#[derive(Debug, Clone, Default)]
pub struct FieldValueStore {
    fields: Arc<FieldsByName>,
}

impl FieldValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields_by_name(fields: FieldsByName) -> Self {
        let fields = fields
            .into_iter()
            .map(|(name, mut descriptor)| {
                if descriptor.field.is_empty() {
                    descriptor.field = name.clone();
                }
                (name, descriptor)
            })
            .collect();
        Self {
            fields: Arc::new(fields),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.get(name).map(|descriptor| &descriptor.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields
            .iter()
            .map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// True when both handles point at the same underlying snapshot.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.fields, &b.fields)
    }

    pub fn with_value(&self, name: &str, value: FieldValue) -> Result<Self, UnknownField> {
        let Some(current) = self.fields.get(name) else {
            return Err(UnknownField(name.to_string()));
        };
        let mut next = (*self.fields).clone();
        next.insert(name.to_string(), current.with_value(value));
        Ok(Self {
            fields: Arc::new(next),
        })
    }

    /// Folds a patch response into a new snapshot.
    ///
    /// Every field named in any response document is updated, not only the
    /// one that was edited. Returns the new snapshot and the touched names in
    /// response order; fields the response does not name keep their value.
    pub fn merge_patch<'a, I>(
        &self,
        documents: I,
        issued: &FieldValue,
        policy: PatchMergePolicy,
    ) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = &'a FieldsByName>,
    {
        let mut next = (*self.fields).clone();
        let mut changed: Vec<String> = Vec::new();
        for document in documents {
            for (name, echoed) in document {
                let base = next.get(name).unwrap_or(echoed);
                let value = match policy {
                    PatchMergePolicy::IssuedValue => issued.clone(),
                    PatchMergePolicy::ServerValue => echoed.value.clone(),
                };
                let mut merged = base.with_value(value);
                if merged.field.is_empty() {
                    merged.field = name.clone();
                }
                next.insert(name.clone(), merged);
                if !changed.iter().any(|seen| seen == name) {
                    changed.push(name.clone());
                }
            }
        }
        if changed.is_empty() {
            return (self.clone(), changed);
        }
        (
            Self {
                fields: Arc::new(next),
            },
            changed,
        )
    }

    /// Mandatory fields that still have no value, in store order.
    pub fn missing_mandatory(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, descriptor)| descriptor.blocks_completion())
            .map(|(name, _)| name.clone())
            .collect()
    }
}
