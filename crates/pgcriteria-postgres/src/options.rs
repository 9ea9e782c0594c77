//! Rendering configuration for criterion compilation.

use serde::{Deserialize, Serialize};

/// Controls how each compiled clause is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionOptions {
    /// Separator written before a clause when the builder is already dirty
    pub joint: String,
    /// The selector is a complete expression; skip the alias prefix
    pub is_dynamic: bool,
    /// Encode array operands as a JSON array instead of a native array
    pub is_json: bool,
    /// Cast applied to the selector: `(selector)::cast`
    pub selector_cast: Option<String>,
    /// Functions wrapping the selector, outermost first
    pub selector_funcs: Vec<String>,
    /// Functions wrapping the placeholder, outermost first
    pub placeholder_funcs: Vec<String>,
}

impl Default for CompositionOptions {
    fn default() -> Self {
        Self::and()
    }
}

impl CompositionOptions {
    /// Clauses joined with `AND`, selectors qualified with the table alias.
    pub fn and() -> Self {
        Self {
            joint: " AND ".to_string(),
            is_dynamic: false,
            is_json: false,
            selector_cast: None,
            selector_funcs: Vec::new(),
            placeholder_funcs: Vec::new(),
        }
    }

    pub fn or() -> Self {
        Self {
            joint: " OR ".to_string(),
            ..Self::and()
        }
    }

    /// Options for computed columns whose selector is already an expression.
    pub fn dynamic_and() -> Self {
        Self {
            is_dynamic: true,
            ..Self::and()
        }
    }

    pub fn with_joint(mut self, joint: &str) -> Self {
        self.joint = joint.to_string();
        self
    }

    pub fn dynamic(mut self) -> Self {
        self.is_dynamic = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.is_json = true;
        self
    }

    /// Sets the selector cast. An empty cast clears it.
    pub fn with_selector_cast(mut self, cast: &str) -> Self {
        self.selector_cast = (!cast.is_empty()).then(|| cast.to_string());
        self
    }

    pub fn with_selector_func(mut self, func: &str) -> Self {
        self.selector_funcs.push(func.to_string());
        self
    }

    pub fn with_placeholder_func(mut self, func: &str) -> Self {
        self.placeholder_funcs.push(func.to_string());
        self
    }

    /// The cast to apply, ignoring an empty one.
    pub(crate) fn cast(&self) -> Option<&str> {
        self.selector_cast.as_deref().filter(|c| !c.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_and() {
        let opts = CompositionOptions::default();
        assert_eq!(opts.joint, " AND ");
        assert!(!opts.is_dynamic);
        assert!(!opts.is_json);
        assert_eq!(opts.cast(), None);
    }

    #[test]
    fn test_presets() {
        assert_eq!(CompositionOptions::or().joint, " OR ");
        let dynamic = CompositionOptions::dynamic_and();
        assert!(dynamic.is_dynamic);
        assert_eq!(dynamic.joint, " AND ");
    }

    #[test]
    fn test_builder_methods() {
        let opts = CompositionOptions::and()
            .with_joint(", ")
            .json()
            .with_selector_cast("text")
            .with_selector_func("lower")
            .with_selector_func("trim")
            .with_placeholder_func("lower");
        assert_eq!(opts.joint, ", ");
        assert!(opts.is_json);
        assert_eq!(opts.cast(), Some("text"));
        assert_eq!(opts.selector_funcs, vec!["lower", "trim"]);
        assert_eq!(opts.placeholder_funcs, vec!["lower"]);
    }

    #[test]
    fn test_empty_cast_is_ignored() {
        let opts = CompositionOptions::and().with_selector_cast("");
        assert_eq!(opts.selector_cast, None);

        let opts = CompositionOptions {
            selector_cast: Some(String::new()),
            ..CompositionOptions::and()
        };
        assert_eq!(opts.cast(), None);
    }

    #[test]
    fn test_deserialize_partial() {
        let opts: CompositionOptions = serde_json::from_str(r#"{"is_json":true}"#).unwrap();
        assert!(opts.is_json);
        assert_eq!(opts.joint, " AND ");
    }
}
