//! Model declarations
//!
//! A `Model` is a declared record type: a frozen schema plus type-level
//! policy (mutability, unknown-field handling) and an optional
//! initializer. Models are built with `Model::declare(..)`, stacking one
//! attribute per call, optionally extending a base model.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::observability::{log_event_with_fields, Event};

use super::attribute::Attribute;
use super::builder::RecordBuilder;
use super::errors::{ModelError, ModelResult};
use super::options::BuildOptions;
use super::record::Record;
use super::schema::Schema;
use super::value::{Mapping, Value};

/// Error type user initializers may return
pub type InitError = Box<dyn StdError + Send + Sync + 'static>;

/// Custom initializer run after declared fields are assigned.
///
/// Receives the record (declared fields already readable) and whatever
/// arguments were not consumed by the schema.
pub type Initializer = Arc<dyn Fn(&mut Record, InitArgs) -> Result<(), InitError> + Send + Sync>;

/// Arguments left over for an initializer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitArgs {
    pub positional: Vec<Value>,
    /// Keyword inputs that matched no declared field or alias
    pub keywords: Mapping,
}

impl InitArgs {
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords.get(name)
    }
}

struct ModelInner {
    name: String,
    schema: Schema,
    mutable: bool,
    allow_unknown: bool,
    initializer: Option<Initializer>,
    /// Undeclared keywords forwarded to the initializer
    init_keywords: Vec<String>,
    base: Option<Model>,
}

/// Handle to a declared record type.
///
/// Clones share the same immutable metadata and can be used from any thread.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Start declaring a model
    pub fn declare(name: impl Into<String>) -> ModelDeclaration {
        ModelDeclaration {
            name: name.into(),
            fields: Vec::new(),
            base: None,
            mutable: None,
            allow_unknown: None,
            initializer: None,
            init_keywords: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Type-level mutability default for fields without their own setting
    pub fn is_mutable(&self) -> bool {
        self.inner.mutable
    }

    /// Type-level unknown-field policy
    pub fn allows_unknown(&self) -> bool {
        self.inner.allow_unknown
    }

    pub fn base(&self) -> Option<&Model> {
        self.inner.base.as_ref()
    }

    pub fn has_initializer(&self) -> bool {
        self.inner.initializer.is_some()
    }

    pub(crate) fn initializer(&self) -> Option<&Initializer> {
        self.inner.initializer.as_ref()
    }

    /// Keywords the initializer accepts besides the declared fields
    pub fn initializer_keywords(&self) -> impl Iterator<Item = &str> {
        self.inner.init_keywords.iter().map(String::as_str)
    }

    pub(crate) fn accepts_keyword(&self, key: &str) -> bool {
        self.inner.init_keywords.iter().any(|k| k == key)
    }

    /// Looks up an attribute by field name or alias
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.inner.schema.get(key)
    }

    /// Identity comparison: the same declaration, not an equal one
    pub fn same_as(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns true if `other` is this model or one of its bases
    pub fn extends(&self, other: &Model) -> bool {
        let mut current = Some(self);
        while let Some(model) = current {
            if model.same_as(other) {
                return true;
            }
            current = model.base();
        }
        false
    }

    /// Build a record with default options
    pub fn build(&self, input: impl Into<Value>) -> ModelResult<Record> {
        self.build_with(input, &BuildOptions::default())
    }

    /// Build a record with explicit options
    pub fn build_with(&self, input: impl Into<Value>, options: &BuildOptions) -> ModelResult<Record> {
        RecordBuilder::new(self, options).build(Vec::new(), input.into())
    }

    /// Inverse of `Record::to_mapping`
    pub fn from_mapping(
        &self,
        mapping: Mapping,
        allow_missing: bool,
        allow_unknown: bool,
    ) -> ModelResult<Record> {
        let options = BuildOptions {
            allow_missing,
            allow_unknown: Some(allow_unknown),
        };
        self.build_with(mapping, &options)
    }

    /// Build a record passing positional arguments to the initializer
    pub fn construct(
        &self,
        positional: Vec<Value>,
        input: impl Into<Value>,
        options: &BuildOptions,
    ) -> ModelResult<Record> {
        RecordBuilder::new(self, options).build(positional, input.into())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("fields", &self.inner.schema.names().collect::<Vec<_>>())
            .field("mutable", &self.inner.mutable)
            .field("allow_unknown", &self.inner.allow_unknown)
            .field("base", &self.inner.base.as_ref().map(|b| b.name()))
            .finish()
    }
}

/// Builder accumulating a model declaration
pub struct ModelDeclaration {
    name: String,
    fields: Vec<(String, Attribute)>,
    base: Option<Model>,
    mutable: Option<bool>,
    allow_unknown: Option<bool>,
    initializer: Option<Initializer>,
    init_keywords: Option<Vec<String>>,
}

impl ModelDeclaration {
    /// Stack one attribute onto the declaration
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.fields.push((name.into(), attribute));
        self
    }

    /// Inherit all fields of `base`, overriding same-named ones
    pub fn extends(mut self, base: &Model) -> Self {
        self.base = Some(base.clone());
        self
    }

    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = Some(mutable);
        self
    }

    pub fn allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = Some(allow);
        self
    }

    pub fn initializer<F>(mut self, init: F) -> Self
    where
        F: Fn(&mut Record, InitArgs) -> Result<(), InitError> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(init));
        self
    }

    /// Undeclared keywords handed to the initializer.
    ///
    /// Any other undeclared key is subject to the unknown-field policy.
    pub fn initializer_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.init_keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    /// Freeze the declaration into a model
    pub fn build(self) -> ModelResult<Model> {
        let ModelDeclaration {
            name,
            fields,
            base,
            mutable,
            allow_unknown,
            initializer,
            init_keywords,
        } = self;

        // Within one declaration a name may appear only once; overriding is
        // what `extends` is for.
        for (i, (field, _)) in fields.iter().enumerate() {
            if fields[..i].iter().any(|(earlier, _)| earlier == field) {
                return Err(ModelError::declaration_invalid(
                    &name,
                    format!("field '{}' declared twice", field),
                ));
            }
        }

        let schema = match &base {
            Some(base) => Schema::merge(&name, base.schema(), fields)?,
            None => Schema::new(&name, fields)?,
        };

        let inherited = |pick: fn(&Model) -> bool| base.as_ref().map(pick).unwrap_or(false);
        let mutable = mutable.unwrap_or_else(|| inherited(Model::is_mutable));
        let allow_unknown = allow_unknown.unwrap_or_else(|| inherited(Model::allows_unknown));
        let initializer = initializer.or_else(|| base.as_ref().and_then(|b| b.initializer().cloned()));
        let init_keywords = init_keywords
            .or_else(|| {
                base.as_ref()
                    .map(|b| b.initializer_keywords().map(str::to_string).collect())
            })
            .unwrap_or_default();

        if !init_keywords.is_empty() && initializer.is_none() {
            return Err(ModelError::declaration_invalid(
                &name,
                "initializer keywords declared without an initializer",
            ));
        }
        if let Some(key) = init_keywords.iter().find(|k| schema.contains(k.as_str())) {
            return Err(ModelError::declaration_invalid(
                &name,
                format!("initializer keyword '{}' collides with a field", key),
            ));
        }

        let field_count = schema.len().to_string();
        log_event_with_fields(
            Event::ModelDeclared,
            &[
                ("model", name.as_str()),
                ("fields", field_count.as_str()),
                ("base", base.as_ref().map(|b| b.name()).unwrap_or("")),
            ],
        );

        Ok(Model {
            inner: Arc::new(ModelInner {
                name,
                schema,
                mutable,
                allow_unknown,
                initializer,
                init_keywords,
                base,
            }),
        })
    }
}
