//! Construction options
//!
//! Controls how a construction call treats absent and undeclared fields.

use serde::{Deserialize, Serialize};

/// Options for one construction call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Treat absent fields as null instead of failing (default: false)
    #[serde(default)]
    pub allow_missing: bool,

    /// Discard undeclared fields instead of failing.
    /// `None` defers to the model's own policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_unknown: Option<bool>,
}

impl BuildOptions {
    /// Strict options: nothing missing, unknown fields per model
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    pub fn allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = Some(allow);
        self
    }

    /// Effective unknown-field policy given the model's default
    pub fn unknown_allowed(&self, model_default: bool) -> bool {
        self.allow_unknown.unwrap_or(model_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_strict() {
        let options = BuildOptions::default();
        assert!(!options.allow_missing);
        assert_eq!(options.allow_unknown, None);
        assert!(!options.unknown_allowed(false));
        assert!(options.unknown_allowed(true));
    }

    #[test]
    fn test_call_overrides_model_policy() {
        let options = BuildOptions::new().allow_unknown(false);
        assert!(!options.unknown_allowed(true));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let options: BuildOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, BuildOptions::default());

        let options: BuildOptions =
            serde_json::from_str(r#"{"allow_missing": true, "allow_unknown": false}"#).unwrap();
        assert!(options.allow_missing);
        assert_eq!(options.allow_unknown, Some(false));
    }
}
