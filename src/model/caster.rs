//! Casters: raw value → typed value converters
//!
//! A caster is an opaque, shareable function. Two forms are distinguished
//! because their resolution needs the engine itself:
//! - a nested model, which builds (or freshly copies) a record
//! - a list of some item caster, which reports failing elements by index

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::declaration::Model;
use super::errors::{ModelError, ModelResult};
use super::value::Value;

/// Failure signalled by a caster
#[derive(Debug, Error)]
pub enum CastError {
    /// Input has a type the caster does not accept
    #[error("expected {expected}, got {actual}")]
    Invalid { expected: String, actual: &'static str },

    /// Input has an accepted type but could not be parsed
    #[error("cannot parse {input:?} as {expected}")]
    Unparseable { expected: &'static str, input: String },

    /// Caster-specific error, passed to the caller unchanged
    #[error(transparent)]
    Domain(Box<dyn StdError + Send + Sync + 'static>),
}

impl CastError {
    pub fn invalid(expected: impl Into<String>, actual: &Value) -> Self {
        CastError::Invalid {
            expected: expected.into(),
            actual: actual.type_name(),
        }
    }

    pub fn domain(err: impl StdError + Send + Sync + 'static) -> Self {
        CastError::Domain(Box::new(err))
    }

    /// Placeholder error for casters that are declared but not provided yet
    pub fn not_implemented() -> Self {
        CastError::domain(NotImplemented)
    }
}

/// Raised by placeholder casters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("not implemented")]
pub struct NotImplemented;

type CastFn = dyn Fn(&Value) -> Result<Value, CastError> + Send + Sync;

#[derive(Clone)]
enum CasterKind {
    Function(Arc<CastFn>),
    Model(Model),
    List(Box<Caster>),
}

/// A named converter from raw values to typed values.
///
/// Cheap to clone; clones share the underlying function.
#[derive(Clone)]
pub struct Caster {
    name: Cow<'static, str>,
    kind: CasterKind,
}

impl Caster {
    /// Wrap any unary conversion function
    pub fn new<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, CastError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: CasterKind::Function(Arc::new(f)),
        }
    }

    /// Caster that coerces mappings (or records) into records of `model`
    pub fn model(model: &Model) -> Self {
        Self {
            name: Cow::Owned(model.name().to_string()),
            kind: CasterKind::Model(model.clone()),
        }
    }

    /// Caster for lists whose elements each go through `item`
    pub fn list(item: Caster) -> Self {
        Self {
            name: Cow::Owned(format!("list<{}>", item.name)),
            kind: CasterKind::List(Box::new(item)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the nested model if this caster builds records
    pub fn as_model(&self) -> Option<&Model> {
        match &self.kind {
            CasterKind::Model(m) => Some(m),
            _ => None,
        }
    }

    /// Apply the caster to a present, non-null raw value
    pub fn cast(&self, raw: &Value) -> ModelResult<Value> {
        self.apply(None, raw)
    }

    pub(crate) fn apply(&self, field: Option<&str>, raw: &Value) -> ModelResult<Value> {
        match &self.kind {
            CasterKind::Function(f) => f(raw).map_err(|e| ModelError::from_cast(field, e)),
            CasterKind::Model(model) => {
                let nested = coerce_record(model, raw);
                match field {
                    Some(name) => nested.map_err(|e| e.within(name)),
                    None => nested,
                }
            }
            CasterKind::List(item) => {
                let items = raw.as_list().ok_or_else(|| {
                    ModelError::from_cast(field, CastError::invalid(self.name.as_ref(), raw))
                })?;
                let prefix = field.unwrap_or("");
                items
                    .iter()
                    .enumerate()
                    .map(|(i, elem)| {
                        let elem_path = format!("{}[{}]", prefix, i);
                        item.apply(Some(&elem_path), elem)
                    })
                    .collect::<ModelResult<Vec<_>>>()
                    .map(Value::List)
            }
        }
    }
}

impl fmt::Debug for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Caster").field(&self.name).finish()
    }
}

/// Resolve a raw value into a record of `model`.
///
/// A record of the same model is copied, never shared. Anything mapping-like
/// is built through the model's own rules.
fn coerce_record(model: &Model, raw: &Value) -> ModelResult<Value> {
    match raw {
        Value::Record(record) if record.model().same_as(model) => {
            Ok(Value::Record(record.clone()))
        }
        Value::Record(record) => model.build(record.to_mapping()).map(Value::from),
        Value::Map(mapping) => model.build(mapping.clone()).map(Value::from),
        other => Err(ModelError::from_cast(
            None,
            CastError::invalid(format!("mapping or {} record", model.name()), other),
        )),
    }
}
