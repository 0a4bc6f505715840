//! Model registry and declaration files
//!
//! Declaration files are JSON:
//!
//! ```json
//! {"models": [
//!   {"name": "Address", "fields": [{"name": "city", "type": "string"}]},
//!   {"name": "User", "fields": [
//!     {"name": "name", "type": "string"},
//!     {"name": "address", "type": "Address", "optional": true}
//!   ]}
//! ]}
//! ```
//!
//! A field `type` is a built-in caster name, `list<...>` of a type, or the
//! name of a model declared earlier. A file is loaded all-or-nothing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event};

use super::attribute::Attribute;
use super::caster::Caster;
use super::casters;
use super::declaration::Model;
use super::errors::{ModelError, ModelResult};
use super::value::Value;

/// Top-level structure of a declaration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarationFile {
    pub models: Vec<ModelDecl>,
}

/// One declared model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDecl {
    pub name: String,
    /// Name of an already declared base model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_unknown: Option<bool>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

/// One declared field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub optional: bool,
    /// Used verbatim on null
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Value>,
    /// Cast once at load time, copied into every record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// Named models, each declared exactly once
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Model>,
    /// Registration order
    order: Vec<String>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model under its own name.
    ///
    /// Models are immutable once declared: registering a name twice fails.
    pub fn register(&mut self, model: Model) -> ModelResult<()> {
        if self.models.contains_key(model.name()) {
            return Err(ModelError::redeclared(model.name()));
        }
        self.order.push(model.name().to_string());
        self.models.insert(model.name().to_string(), model);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Like `get`, failing with a declaration error
    pub fn require(&self, name: &str) -> ModelResult<&Model> {
        self.get(name).ok_or_else(|| ModelError::unknown_model(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Model names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Loads declarations from a JSON string. Returns the number of models.
    pub fn load_str(&mut self, source: &str, origin: &str) -> ModelResult<usize> {
        let mut staged = Vec::new();
        self.stage(source, origin, &mut staged)?;
        self.commit(staged, origin)
    }

    /// Loads one declaration file
    pub fn load_file(&mut self, path: &Path) -> ModelResult<usize> {
        let origin = path.display().to_string();
        let content = read_source(path)?;
        self.load_str(&content, &origin)
    }

    /// Loads every `*.json` file of a directory, in file name order.
    ///
    /// Later files may refer to models of earlier ones. The directory is
    /// loaded as a whole: if any file fails, nothing is registered.
    pub fn load_dir(&mut self, dir: &Path) -> ModelResult<usize> {
        let origin = dir.display().to_string();
        let entries = fs::read_dir(dir).map_err(|e| {
            ModelError::malformed_declaration(
                origin.as_str(),
                format!("Failed to read directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                ModelError::malformed_declaration(
                    origin.as_str(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut staged = Vec::new();
        for path in &paths {
            let content = read_source(path)?;
            self.stage(&content, &path.display().to_string(), &mut staged)?;
        }
        self.commit(staged, &origin)
    }

    /// Declares every model of one source on top of `staged`
    fn stage(&self, source: &str, origin: &str, staged: &mut Vec<Model>) -> ModelResult<()> {
        let file: DeclarationFile = serde_json::from_str(source)
            .map_err(|e| ModelError::malformed_declaration(origin, format!("Invalid JSON: {}", e)))?;

        staged.reserve(file.models.len());
        for decl in &file.models {
            if self.contains(&decl.name) || staged.iter().any(|m| m.name() == decl.name) {
                return Err(ModelError::redeclared(&decl.name));
            }
            let model = self.declare(decl, staged)?;
            staged.push(model);
        }
        Ok(())
    }

    fn commit(&mut self, staged: Vec<Model>, origin: &str) -> ModelResult<usize> {
        let count = staged.len();
        for model in staged {
            self.register(model)?;
        }

        let loaded = count.to_string();
        log_event_with_fields(
            Event::ModelsLoaded,
            &[("origin", origin), ("models", loaded.as_str())],
        );
        Ok(count)
    }

    fn find<'a>(&'a self, name: &str, staged: &'a [Model]) -> Option<&'a Model> {
        self.get(name)
            .or_else(|| staged.iter().find(|m| m.name() == name))
    }

    fn caster_for(&self, type_name: &str, staged: &[Model]) -> Option<Caster> {
        let type_name = type_name.trim();
        if let Some(inner) = type_name
            .strip_prefix("list<")
            .and_then(|s| s.strip_suffix('>'))
        {
            return self.caster_for(inner, staged).map(Caster::list);
        }
        casters::by_name(type_name).or_else(|| self.find(type_name, staged).map(Caster::model))
    }

    fn declare(&self, decl: &ModelDecl, staged: &[Model]) -> ModelResult<Model> {
        let mut declaration = Model::declare(decl.name.clone());

        if let Some(base) = &decl.extends {
            let base = self
                .find(base, staged)
                .ok_or_else(|| ModelError::unknown_model(base))?;
            declaration = declaration.extends(base);
        }
        if let Some(mutable) = decl.mutable {
            declaration = declaration.mutable(mutable);
        }
        if let Some(allow) = decl.allow_unknown {
            declaration = declaration.allow_unknown(allow);
        }

        for field in &decl.fields {
            let caster = self.caster_for(&field.type_name, staged).ok_or_else(|| {
                ModelError::declaration_invalid(
                    &decl.name,
                    format!("field '{}' has unknown type '{}'", field.name, field.type_name),
                )
            })?;

            let mut attr = Attribute::new(caster);
            if field.nullable {
                attr = attr.nullable();
            }
            if let Some(fallback) = &field.fallback {
                attr = attr.fallback(fallback.clone());
            }
            if let Some(default) = &field.default {
                let value = attr.caster().cast(default).map_err(|e| {
                    ModelError::declaration_invalid(
                        &decl.name,
                        format!("default of field '{}' is invalid: {}", field.name, e.message()),
                    )
                })?;
                attr = attr.default(value);
            }
            if field.optional {
                attr = attr.optional();
            }
            if let Some(alias) = &field.alias {
                attr = attr.alias(alias.clone());
            }
            if let Some(mutable) = field.mutable {
                attr = attr.mutable(mutable);
            }
            if let Some(help) = &field.help {
                attr = attr.help(help.clone());
            }

            declaration = declaration.attribute(field.name.clone(), attr);
        }

        declaration.build()
    }
}

fn read_source(path: &Path) -> ModelResult<String> {
    fs::read_to_string(path).map_err(|e| {
        ModelError::malformed_declaration(
            path.display().to_string(),
            format!("Failed to read file: {}", e),
        )
    })
}
