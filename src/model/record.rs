//! Record instances
//!
//! A record exclusively owns one resolved value per declared field, stored
//! by slot in declaration order. Equality, iteration and the mapping
//! projection only ever see declared fields.
//!
//! Two read styles exist with distinct failure kinds:
//! - `get` (attribute-style) fails with an Access error
//! - `lookup` / indexing (index-style) fails with a Lookup error

use std::fmt;
use std::ops::Index;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::observability::{log_event_with_fields, Event};

use super::declaration::Model;
use super::errors::{ModelError, ModelResult};
use super::value::{Mapping, Value};

/// A built record
#[derive(Clone)]
pub struct Record {
    model: Model,
    /// One value per schema slot
    values: Vec<Value>,
    /// Instance state set by an initializer, outside the schema
    state: Mapping,
}

impl Record {
    pub(crate) fn new(model: Model, values: Vec<Value>) -> Self {
        debug_assert_eq!(model.schema().len(), values.len());
        Self {
            model,
            values,
            state: Mapping::new(),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Attribute-style read by field name or alias, then initializer state.
    pub fn get(&self, name: &str) -> ModelResult<&Value> {
        if let Some(slot) = self.model.schema().slot(name) {
            return Ok(&self.values[slot]);
        }
        self.state
            .get(name)
            .ok_or_else(|| ModelError::unknown_attribute(self.model.name(), name))
    }

    /// Index-style read by field name or alias.
    pub fn lookup(&self, key: &str) -> ModelResult<&Value> {
        self.model
            .schema()
            .slot(key)
            .map(|slot| &self.values[slot])
            .ok_or_else(|| ModelError::unknown_key(self.model.name(), key))
    }

    /// Returns true if `key` is a declared field name or alias
    pub fn contains_key(&self, key: &str) -> bool {
        self.model.schema().contains(key)
    }

    /// Write a declared field.
    ///
    /// The mutability check happens first; the new value then goes through
    /// the same null/fallback/cast resolution as construction input.
    pub fn set(&mut self, name: &str, raw: impl Into<Value>) -> ModelResult<()> {
        let schema = self.model.schema();
        let slot = schema
            .slot(name)
            .ok_or_else(|| ModelError::unknown_attribute(self.model.name(), name))?;
        let (field, attr) = schema.field(slot);

        if !attr.is_mutable(self.model.is_mutable()) {
            return Err(ModelError::immutable_attribute(self.model.name(), field));
        }

        let value = attr.resolve_field(Some(field), &raw.into())?;
        self.values[slot] = value;

        log_event_with_fields(
            Event::FieldWritten,
            &[("model", self.model.name()), ("field", field)],
        );
        Ok(())
    }

    /// Instance state outside the schema
    pub fn state(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// Assign instance state.
    ///
    /// Declared names go through `set` and its mutability check.
    pub fn set_state(&mut self, key: &str, value: impl Into<Value>) -> ModelResult<()> {
        if self.contains_key(key) {
            return self.set(key, value);
        }
        self.state.insert(key, value);
        Ok(())
    }

    /// Field name → value in declaration order
    pub fn to_mapping(&self) -> Mapping {
        self.iter()
            .map(|(name, value)| (name, value.clone()))
            .collect()
    }

    /// Same as `to_mapping`
    pub fn attributes(&self) -> Mapping {
        self.to_mapping()
    }

    pub fn into_mapping(self) -> Mapping {
        let names: Vec<String> = self.model.schema().names().map(str::to_string).collect();
        names.into_iter().zip(self.values).collect()
    }

    pub fn iter(&self) -> Fields<'_> {
        Fields {
            record: self,
            slot: 0,
        }
    }

    /// Declared field names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.model.schema().names()
    }
}

/// Iterator over a record's declared fields
pub struct Fields<'a> {
    record: &'a Record,
    slot: usize,
}

impl<'a> Iterator for Fields<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.record;
        if self.slot >= record.values.len() {
            return None;
        }
        let (name, _) = record.model.schema().field(self.slot);
        let value = &record.values[self.slot];
        self.slot += 1;
        Some((name, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.record.values.len() - self.slot;
        (remaining, Some(remaining))
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a str, &'a Value);
    type IntoIter = Fields<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(name, value)| {
                other
                    .iter()
                    .find(|(other_name, _)| *other_name == name)
                    .is_some_and(|(_, other_value)| other_value == value)
            })
    }
}

/// Index-style access. Panics on unknown keys; use `lookup` to handle them.
impl Index<&str> for Record {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        match self.lookup(key) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.model.name())?;
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
