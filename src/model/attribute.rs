//! Attribute specifications
//!
//! An `Attribute` describes one field: how raw input is cast, what happens
//! on null, and (for stacked declarations) its alias, mutability and
//! default. Attributes are immutable once their model is built.

use std::fmt;
use std::sync::Arc;

use super::caster::Caster;
use super::declaration::Model;
use super::errors::{ModelError, ModelResult};
use super::value::{Mapping, Value};

/// Zero-argument value producer
pub type Producer = Arc<dyn Fn() -> Value + Send + Sync>;

/// Substitute for a null input. Used verbatim, never cast.
#[derive(Clone)]
pub enum Fallback {
    Value(Value),
    Producer(Producer),
}

impl Fallback {
    fn produce(&self) -> Value {
        match self {
            Fallback::Value(v) => v.clone(),
            Fallback::Producer(f) => f(),
        }
    }
}

/// Substitute for an absent field. Produced fresh for every record.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Producer(Producer),
    /// A record of this model built from empty input
    Record(Model),
}

impl DefaultValue {
    fn produce(&self, field: &str) -> ModelResult<Value> {
        match self {
            DefaultValue::Value(v) => Ok(v.clone()),
            DefaultValue::Producer(f) => Ok(f()),
            DefaultValue::Record(model) => model
                .build(Mapping::new())
                .map(Value::from)
                .map_err(|e| e.within(field)),
        }
    }
}

/// Specification for a single field
#[derive(Clone)]
pub struct Attribute {
    caster: Caster,
    nullable: bool,
    fallback: Option<Fallback>,
    alias: Option<String>,
    /// Field-level override of the model's mutability
    mutable: Option<bool>,
    default: Option<DefaultValue>,
    help: Option<String>,
}

impl Attribute {
    /// Create a non-nullable attribute with no fallback
    pub fn new(caster: Caster) -> Self {
        Self {
            caster,
            nullable: false,
            fallback: None,
            alias: None,
            mutable: None,
            default: None,
            help: None,
        }
    }

    /// Create an attribute holding records of `model`
    pub fn record(model: &Model) -> Self {
        Self::new(Caster::model(model))
    }

    /// Accept null as a final value.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Accept null, and treat an absent field as null.
    pub fn optional(mut self) -> Self {
        self.nullable = true;
        if self.default.is_none() {
            self.default = Some(DefaultValue::Value(Value::Null));
        }
        self
    }

    /// Use `value` whenever the input resolves to null.
    pub fn fallback(mut self, value: impl Into<Value>) -> Self {
        self.fallback = Some(Fallback::Value(value.into()));
        self
    }

    /// Call `producer` whenever the input resolves to null.
    pub fn fallback_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.fallback = Some(Fallback::Producer(Arc::new(producer)));
        self
    }

    /// Second key for the same field.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = Some(mutable);
        self
    }

    /// Use a copy of `value` when the field is absent.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Call `producer` when the field is absent.
    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Producer(Arc::new(producer)));
        self
    }

    /// Build an empty record of `model` when the field is absent.
    pub fn default_record(mut self, model: &Model) -> Self {
        self.default = Some(DefaultValue::Record(model.clone()));
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    pub fn caster(&self) -> &Caster {
        &self.caster
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Field-level mutability, falling back to the model's
    pub fn is_mutable(&self, model_default: bool) -> bool {
        self.mutable.unwrap_or(model_default)
    }

    /// Resolve a present raw value (possibly null) into the stored value.
    ///
    /// Null takes the fallback, then null if nullable, and fails otherwise.
    /// Anything else always goes through the caster.
    pub fn resolve(&self, raw: &Value) -> ModelResult<Value> {
        self.resolve_field(None, raw)
    }

    pub(crate) fn resolve_field(&self, field: Option<&str>, raw: &Value) -> ModelResult<Value> {
        if raw.is_null() {
            if let Some(fallback) = &self.fallback {
                return Ok(fallback.produce());
            }
            if self.nullable {
                return Ok(Value::Null);
            }
            return Err(ModelError::null_value(field));
        }
        self.caster.apply(field, raw)
    }

    /// Produce the default for an absent field, if one is declared
    pub(crate) fn produce_default(&self, field: &str) -> Option<ModelResult<Value>> {
        self.default.as_ref().map(|d| d.produce(field))
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("caster", &self.caster.name())
            .field("nullable", &self.nullable)
            .field("fallback", &self.fallback.is_some())
            .field("alias", &self.alias)
            .field("mutable", &self.mutable)
            .field("default", &self.default.is_some())
            .finish()
    }
}
