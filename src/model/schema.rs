//! Record schemas
//!
//! A schema is the ordered list of attributes of one model, merged across
//! inheritance. It is assembled once when the model is declared and never
//! changes afterwards.

use std::collections::HashMap;

use super::attribute::Attribute;
use super::errors::{ModelError, ModelResult};

/// Ordered, immutable collection of named attributes
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Attributes in declaration order
    fields: Vec<(String, Attribute)>,
    /// Field names and aliases → slot in `fields`
    keys: HashMap<String, usize>,
}

impl Schema {
    /// Creates a schema, checking that names and aliases are unique.
    pub fn new(model: &str, fields: Vec<(String, Attribute)>) -> ModelResult<Self> {
        let mut keys = HashMap::with_capacity(fields.len());

        for (slot, (name, _)) in fields.iter().enumerate() {
            if name.is_empty() {
                return Err(ModelError::declaration_invalid(model, "empty field name"));
            }
            if keys.insert(name.clone(), slot).is_some() {
                return Err(ModelError::declaration_invalid(
                    model,
                    format!("field '{}' declared twice", name),
                ));
            }
        }

        // Aliases second, so a collision is reported against the field name
        for (slot, (name, attr)) in fields.iter().enumerate() {
            if let Some(alias) = attr.alias_name() {
                if alias == name {
                    continue;
                }
                if let Some(&other) = keys.get(alias) {
                    return Err(ModelError::declaration_invalid(
                        model,
                        format!(
                            "alias '{}' of field '{}' collides with field '{}'",
                            alias, name, fields[other].0
                        ),
                    ));
                }
                keys.insert(alias.to_string(), slot);
            }
        }

        Ok(Self { fields, keys })
    }

    /// Computes a subtype schema.
    ///
    /// Fields of `own` replace same-named base fields in place; new fields
    /// are appended in their declared order.
    pub fn merge(model: &str, base: &Schema, own: Vec<(String, Attribute)>) -> ModelResult<Self> {
        let mut fields = base.fields.clone();
        for (name, attr) in own {
            match fields.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = attr,
                None => fields.push((name, attr)),
            }
        }
        Self::new(model, fields)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolves a field name or alias to its storage slot
    pub fn slot(&self, key: &str) -> Option<usize> {
        self.keys.get(key).copied()
    }

    /// Returns the field name and attribute at `slot`
    ///
    /// Panics if `slot` is out of range.
    pub fn field(&self, slot: usize) -> (&str, &Attribute) {
        let (name, attr) = &self.fields[slot];
        (name, attr)
    }

    /// Looks up an attribute by field name or alias
    pub fn get(&self, key: &str) -> Option<&Attribute> {
        self.slot(key).map(|slot| &self.fields[slot].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.fields.iter().map(|(name, attr)| (name.as_str(), attr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::casters;
    use crate::model::errors::ErrorKind;

    fn field(name: &str, attr: Attribute) -> (String, Attribute) {
        (name.to_string(), attr)
    }

    #[test]
    fn test_slots_follow_declaration_order() {
        let schema = Schema::new(
            "T",
            vec![
                field("foo", Attribute::new(casters::string())),
                field("bar", Attribute::new(casters::integer()).alias("@bar")),
            ],
        )
        .unwrap();

        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["foo", "bar"]);
        assert_eq!(schema.slot("foo"), Some(0));
        assert_eq!(schema.slot("bar"), Some(1));
        assert_eq!(schema.slot("@bar"), Some(1));
        assert_eq!(schema.slot("baz"), None);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let result = Schema::new(
            "T",
            vec![
                field("foo", Attribute::new(casters::string())),
                field("foo", Attribute::new(casters::integer())),
            ],
        );
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Declaration);
    }

    #[test]
    fn test_alias_collision_rejected() {
        let result = Schema::new(
            "T",
            vec![
                field("foo", Attribute::new(casters::string())),
                field("bar", Attribute::new(casters::string()).alias("foo")),
            ],
        );
        let err = result.unwrap_err();
        assert!(err.message().contains("collides"));
    }

    #[test]
    fn test_merge_overrides_in_place_and_appends() {
        let base = Schema::new(
            "Base",
            vec![
                field("a", Attribute::new(casters::string())),
                field("b", Attribute::new(casters::string())),
            ],
        )
        .unwrap();

        let merged = Schema::merge(
            "Child",
            &base,
            vec![
                field("c", Attribute::new(casters::float())),
                field("a", Attribute::new(casters::integer())),
            ],
        )
        .unwrap();

        assert_eq!(merged.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(merged.get("a").unwrap().caster().name(), "int");
        assert_eq!(merged.get("b").unwrap().caster().name(), "string");
        // base untouched
        assert_eq!(base.get("a").unwrap().caster().name(), "string");
        assert_eq!(base.len(), 2);
    }
}
