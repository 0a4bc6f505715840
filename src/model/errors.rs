//! Model error types
//!
//! Error codes:
//! - MODEL_DECLARATION_INVALID (DECLARATION)
//! - MODEL_REDECLARED (DECLARATION)
//! - MODEL_UNKNOWN (DECLARATION)
//! - MODEL_MISSING_FIELD (STRUCTURAL)
//! - MODEL_UNEXPECTED_FIELD (STRUCTURAL)
//! - MODEL_MALFORMED_INPUT (STRUCTURAL)
//! - MODEL_NULL_VALUE (VALUE)
//! - MODEL_INVALID_VALUE (VALUE)
//! - MODEL_DOMAIN_ERROR (DOMAIN)
//! - MODEL_UNKNOWN_ATTRIBUTE (ACCESS)
//! - MODEL_IMMUTABLE_ATTRIBUTE (ACCESS)
//! - MODEL_UNKNOWN_KEY (LOOKUP)

use std::error::Error;
use std::fmt;

use super::caster::CastError;

/// The broad class of a model error.
///
/// Structural problems are always reported before value problems for the
/// same construction call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The model declaration itself is inconsistent
    Declaration,
    /// Missing required field, unexpected field, malformed input shape
    Structural,
    /// Null for a non-nullable field, or a caster rejected the input
    Value,
    /// Attribute-style read of an unknown field, or write to an immutable one
    Access,
    /// Index-style read of an unknown key
    Lookup,
    /// Error raised by user code (caster or initializer), passed through
    Domain,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Declaration => "DECLARATION",
            ErrorKind::Structural => "STRUCTURAL",
            ErrorKind::Value => "VALUE",
            ErrorKind::Access => "ACCESS",
            ErrorKind::Lookup => "LOOKUP",
            ErrorKind::Domain => "DOMAIN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Model-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorCode {
    /// Duplicate field, colliding alias, bad declaration file
    ModelDeclarationInvalid,
    /// A model name was registered twice
    ModelRedeclared,
    /// A referenced model name is not registered
    ModelUnknown,
    /// Declared field absent and missing fields not allowed
    ModelMissingField,
    /// Undeclared field present and unknown fields not allowed
    ModelUnexpectedField,
    /// Input is not a mapping, or a field was supplied twice
    ModelMalformedInput,
    /// Null for a non-nullable field without fallback
    ModelNullValue,
    /// Caster rejected the input
    ModelInvalidValue,
    /// Caster or initializer raised its own error
    ModelDomainError,
    /// Attribute-style access to an unknown field
    ModelUnknownAttribute,
    /// Write to an immutable field
    ModelImmutableAttribute,
    /// Index-style access to an unknown key
    ModelUnknownKey,
}

impl ModelErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ModelErrorCode::ModelDeclarationInvalid => "MODEL_DECLARATION_INVALID",
            ModelErrorCode::ModelRedeclared => "MODEL_REDECLARED",
            ModelErrorCode::ModelUnknown => "MODEL_UNKNOWN",
            ModelErrorCode::ModelMissingField => "MODEL_MISSING_FIELD",
            ModelErrorCode::ModelUnexpectedField => "MODEL_UNEXPECTED_FIELD",
            ModelErrorCode::ModelMalformedInput => "MODEL_MALFORMED_INPUT",
            ModelErrorCode::ModelNullValue => "MODEL_NULL_VALUE",
            ModelErrorCode::ModelInvalidValue => "MODEL_INVALID_VALUE",
            ModelErrorCode::ModelDomainError => "MODEL_DOMAIN_ERROR",
            ModelErrorCode::ModelUnknownAttribute => "MODEL_UNKNOWN_ATTRIBUTE",
            ModelErrorCode::ModelImmutableAttribute => "MODEL_IMMUTABLE_ATTRIBUTE",
            ModelErrorCode::ModelUnknownKey => "MODEL_UNKNOWN_KEY",
        }
    }

    /// Returns the kind this code belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelErrorCode::ModelDeclarationInvalid
            | ModelErrorCode::ModelRedeclared
            | ModelErrorCode::ModelUnknown => ErrorKind::Declaration,
            ModelErrorCode::ModelMissingField
            | ModelErrorCode::ModelUnexpectedField
            | ModelErrorCode::ModelMalformedInput => ErrorKind::Structural,
            ModelErrorCode::ModelNullValue | ModelErrorCode::ModelInvalidValue => ErrorKind::Value,
            ModelErrorCode::ModelDomainError => ErrorKind::Domain,
            ModelErrorCode::ModelUnknownAttribute | ModelErrorCode::ModelImmutableAttribute => {
                ErrorKind::Access
            }
            ModelErrorCode::ModelUnknownKey => ErrorKind::Lookup,
        }
    }
}

impl fmt::Display for ModelErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Model error type with full context
#[derive(Debug)]
pub struct ModelError {
    code: ModelErrorCode,
    message: String,
    /// Field path (e.g. "address.city") if applicable
    field: Option<String>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ModelError {
    fn new(code: ModelErrorCode, message: impl Into<String>, field: Option<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field,
            source: None,
        }
    }

    /// Create a declaration error
    pub fn declaration_invalid(model: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ModelErrorCode::ModelDeclarationInvalid,
            format!("Model '{}' declaration invalid: {}", model, reason.into()),
            None,
        )
    }

    /// Create a malformed declaration file error
    pub fn malformed_declaration(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            ModelErrorCode::ModelDeclarationInvalid,
            format!("Malformed declaration '{}': {}", path.into(), reason.into()),
            None,
        )
    }

    /// Create a model redeclared error
    pub fn redeclared(model: &str) -> Self {
        Self::new(
            ModelErrorCode::ModelRedeclared,
            format!("Model '{}' is already declared and is immutable", model),
            None,
        )
    }

    /// Create an unknown model error
    pub fn unknown_model(model: &str) -> Self {
        Self::new(
            ModelErrorCode::ModelUnknown,
            format!("Model '{}' not found", model),
            None,
        )
    }

    /// Create a missing required field error
    pub fn missing_field(model: &str, field: &str) -> Self {
        Self::new(
            ModelErrorCode::ModelMissingField,
            format!("{}: missing required field '{}'", model, field),
            Some(field.to_string()),
        )
    }

    /// Create an unexpected field error
    pub fn unexpected_field(model: &str, field: &str) -> Self {
        Self::new(
            ModelErrorCode::ModelUnexpectedField,
            format!("{}: unexpected field '{}'", model, field),
            Some(field.to_string()),
        )
    }

    /// Create an error for positional arguments given to a model without initializer
    pub fn unexpected_positional(model: &str, count: usize) -> Self {
        Self::new(
            ModelErrorCode::ModelUnexpectedField,
            format!("{}: takes no positional arguments ({} given)", model, count),
            None,
        )
    }

    /// Create an error for non-mapping input
    pub fn malformed_input(model: &str, actual: &str) -> Self {
        Self::new(
            ModelErrorCode::ModelMalformedInput,
            format!("{}: expected mapping input, got {}", model, actual),
            None,
        )
    }

    /// Create an error for a field supplied under both its name and alias
    pub fn supplied_twice(model: &str, field: &str) -> Self {
        Self::new(
            ModelErrorCode::ModelMalformedInput,
            format!("{}: field '{}' supplied more than once", model, field),
            Some(field.to_string()),
        )
    }

    /// Create a null value error
    pub fn null_value(field: Option<&str>) -> Self {
        let message = match field {
            Some(name) => format!("field '{}' is not nullable and has no fallback", name),
            None => "value is not nullable and has no fallback".to_string(),
        };
        Self::new(ModelErrorCode::ModelNullValue, message, field.map(str::to_string))
    }

    /// Convert a caster failure into a model error.
    ///
    /// Domain errors keep their original error as source and get the
    /// `Domain` kind; everything else is a value error.
    pub fn from_cast(field: Option<&str>, err: CastError) -> Self {
        let field_owned = field.map(str::to_string);
        let prefix = match field {
            Some(name) => format!("field '{}'", name),
            None => "value".to_string(),
        };
        match err {
            CastError::Domain(source) => Self {
                code: ModelErrorCode::ModelDomainError,
                message: format!("{}: {}", prefix, source),
                field: field_owned,
                source: Some(source),
            },
            other => Self {
                code: ModelErrorCode::ModelInvalidValue,
                message: format!("{}: {}", prefix, other),
                field: field_owned,
                source: Some(Box::new(other)),
            },
        }
    }

    /// Wrap an error raised by a user initializer
    pub fn initializer_failed(model: &str, source: Box<dyn Error + Send + Sync + 'static>) -> Self {
        Self {
            code: ModelErrorCode::ModelDomainError,
            message: format!("{}: initializer failed: {}", model, source),
            field: None,
            source: Some(source),
        }
    }

    /// Create an unknown attribute error (attribute-style access)
    pub fn unknown_attribute(model: &str, name: &str) -> Self {
        Self::new(
            ModelErrorCode::ModelUnknownAttribute,
            format!("'{}' record has no attribute '{}'", model, name),
            Some(name.to_string()),
        )
    }

    /// Create an immutable attribute error
    pub fn immutable_attribute(model: &str, name: &str) -> Self {
        Self::new(
            ModelErrorCode::ModelImmutableAttribute,
            format!("'{}' attribute '{}' is immutable", model, name),
            Some(name.to_string()),
        )
    }

    /// Create an unknown key error (index-style access)
    pub fn unknown_key(model: &str, key: &str) -> Self {
        Self::new(
            ModelErrorCode::ModelUnknownKey,
            format!("'{}' record has no key '{}'", model, key),
            Some(key.to_string()),
        )
    }

    /// Prefix the field path with an enclosing field name.
    ///
    /// Used when a nested record fails to build.
    pub fn within(mut self, parent: &str) -> Self {
        self.field = Some(match self.field.take() {
            Some(inner) => format!("{}.{}", parent, inner),
            None => parent.to_string(),
        });
        self.message = format!("{}: {}", parent, self.message);
        self
    }

    /// Returns the error code
    pub fn code(&self) -> ModelErrorCode {
        self.code
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field path if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the user error raised by a caster or initializer, if it is an `E`
    pub fn domain_error<E: Error + 'static>(&self) -> Option<&E> {
        if self.kind() != ErrorKind::Domain {
            return None;
        }
        self.source.as_ref().and_then(|e| e.downcast_ref::<E>())
    }

    /// Returns whether this error was detected before any value was cast
    pub fn is_structural(&self) -> bool {
        self.kind() == ErrorKind::Structural
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind(), self.code.code(), self.message)
    }
}

impl Error for ModelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
