//! Declarative record models
//!
//! A model declares named attributes. Each attribute carries a caster that
//! turns raw input into a typed value, plus the rules for missing and null
//! input: nullability, fallback, default, alias and mutability.
//!
//! Building a record from a mapping runs in two stages:
//! 1. Structural checks over the whole input (unknown keys, missing fields,
//!    names supplied twice). Nothing is cast until these pass.
//! 2. Per-field resolution in declaration order.
//!
//! Every failure is a [`ModelError`] whose [`ErrorKind`] says whether the
//! input shape, a value, an attribute access or a key lookup was at fault.
//! Errors raised by a caster's own domain logic are carried unchanged and
//! can be recovered with [`ModelError::domain_error`].

mod attribute;
mod builder;
mod caster;
pub mod casters;
mod declaration;
mod errors;
mod options;
mod record;
mod registry;
mod schema;
mod value;

pub use attribute::{Attribute, DefaultValue, Fallback, Producer};
pub use builder::RecordBuilder;
pub use caster::{CastError, Caster, NotImplemented};
pub use declaration::{InitArgs, InitError, Initializer, Model, ModelDeclaration};
pub use errors::{ErrorKind, ModelError, ModelErrorCode, ModelResult};
pub use options::BuildOptions;
pub use record::{Fields, Record};
pub use registry::{DeclarationFile, FieldDecl, ModelRegistry, ModelDecl};
pub use schema::Schema;
pub use value::{Mapping, Value};
