//! simple-model - declarative record models
//!
//! Declare a model as a set of named attributes, each with a caster and
//! rules for null, missing and unknown input, then build validated,
//! comparable records from loosely typed mappings.
//!
//! ```
//! use simple_model::model::{casters, Attribute, Model};
//! use serde_json::json;
//!
//! let user = Model::declare("User")
//!     .attribute("name", Attribute::new(casters::string()))
//!     .attribute("age", Attribute::new(casters::integer()).default(0))
//!     .build()
//!     .unwrap();
//!
//! let record = user.build(json!({"name": "ada", "age": "36"})).unwrap();
//! assert_eq!(record.get("age").unwrap().as_i64(), Some(36));
//! ```

pub mod cli;
pub mod model;
pub mod observability;
