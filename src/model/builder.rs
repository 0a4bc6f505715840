//! Record construction
//!
//! Construction is a single synchronous pass:
//! 1. Partition input keys into declared (by name or alias) and undeclared
//! 2. Reject undeclared keys unless allowed or named by the initializer
//! 3. Reject absent fields unless they have a default or missing is allowed
//! 4. Resolve every field in declaration order
//! 5. Hand positional arguments and named keywords to the initializer
//!
//! Steps 2 and 3 run before any caster is invoked, so structural problems
//! are always reported first. A failed call yields no record at all.

use crate::observability::{log_event_with_fields, Event};

use super::declaration::{InitArgs, Model};
use super::errors::{ModelError, ModelResult};
use super::options::BuildOptions;
use super::record::Record;
use super::value::{Mapping, Value};

/// Builds records of one model under one set of options.
///
/// Builder does not retain anything between calls.
pub struct RecordBuilder<'a> {
    model: &'a Model,
    options: &'a BuildOptions,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(model: &'a Model, options: &'a BuildOptions) -> Self {
        Self { model, options }
    }

    /// Builds a record from keyword input and optional positional arguments.
    ///
    /// # Errors
    ///
    /// - Structural: input is not a mapping, an undeclared key is present,
    ///   a field is absent, a field is given twice, or positional arguments
    ///   are given to a model without initializer
    /// - Value: null for a non-nullable field, or a caster rejected input
    /// - Domain: a caster or the initializer raised its own error
    pub fn build(&self, positional: Vec<Value>, input: Value) -> ModelResult<Record> {
        let result = self.build_record(positional, input);

        match &result {
            Ok(record) => {
                let fields = record.len().to_string();
                log_event_with_fields(
                    Event::RecordBuilt,
                    &[("model", self.model.name()), ("fields", fields.as_str())],
                );
            }
            Err(err) => {
                log_event_with_fields(
                    Event::RecordRejected,
                    &[
                        ("model", self.model.name()),
                        ("code", err.code().code()),
                        ("field", err.field().unwrap_or("")),
                    ],
                );
            }
        }

        result
    }

    fn build_record(&self, positional: Vec<Value>, input: Value) -> ModelResult<Record> {
        let model = self.model;
        let name = model.name();
        let schema = model.schema();

        let input = match input {
            Value::Map(mapping) => mapping,
            Value::Record(record) => record.to_mapping(),
            other => return Err(ModelError::malformed_input(name, other.type_name())),
        };

        let (mut supplied, leftovers) = self.partition(input)?;

        let initializer = model.initializer();
        if initializer.is_none() && !positional.is_empty() {
            return Err(ModelError::unexpected_positional(name, positional.len()));
        }

        // Keywords named by the initializer are forwarded; every other
        // undeclared key falls under the unknown-field policy.
        let (keywords, unknown): (Mapping, Mapping) = leftovers
            .into_iter()
            .partition(|(key, _)| initializer.is_some() && model.accepts_keyword(key));

        if let Some(key) = unknown.keys().next() {
            if !self.options.unknown_allowed(model.allows_unknown()) {
                return Err(ModelError::unexpected_field(name, key));
            }
        }
        for key in unknown.keys() {
            log_event_with_fields(
                Event::UnknownFieldDiscarded,
                &[("model", name), ("field", key)],
            );
        }

        if !self.options.allow_missing {
            for (slot, (field, attr)) in schema.iter().enumerate() {
                if supplied[slot].is_none() && !attr.has_default() {
                    return Err(ModelError::missing_field(name, field));
                }
            }
        }

        let mut values = Vec::with_capacity(schema.len());
        for (slot, (field, attr)) in schema.iter().enumerate() {
            let value = match supplied[slot].take() {
                Some(raw) => attr.resolve_field(Some(field), &raw)?,
                // A fallback applies before the default
                None if attr.has_fallback() => attr.resolve_field(Some(field), &Value::Null)?,
                None => match attr.produce_default(field) {
                    Some(default) => default?,
                    // Only reachable with allow_missing: absent behaves as null
                    None => attr.resolve_field(Some(field), &Value::Null)?,
                },
            };
            values.push(value);
        }

        let mut record = Record::new(model.clone(), values);

        if let Some(init) = initializer {
            let args = InitArgs {
                positional,
                keywords,
            };
            init(&mut record, args).map_err(|e| ModelError::initializer_failed(name, e))?;
        }

        Ok(record)
    }

    /// Splits input into per-slot raw values and undeclared leftovers.
    fn partition(&self, input: Mapping) -> ModelResult<(Vec<Option<Value>>, Mapping)> {
        let schema = self.model.schema();
        let mut supplied: Vec<Option<Value>> = vec![None; schema.len()];
        let mut leftovers = Mapping::new();

        for (key, value) in input {
            match schema.slot(&key) {
                Some(slot) => {
                    if supplied[slot].is_some() {
                        let (field, _) = schema.field(slot);
                        return Err(ModelError::supplied_twice(self.model.name(), field));
                    }
                    supplied[slot] = Some(value);
                }
                None => {
                    leftovers.insert(key, value);
                }
            }
        }

        Ok((supplied, leftovers))
    }
}
