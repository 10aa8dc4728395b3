//! Per-paragraph execution context

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Context handed to every execution call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpreterContext {
    /// Note the paragraph belongs to
    pub note_id: String,

    /// Paragraph being executed (cancel/progress are keyed on it)
    pub paragraph_id: String,

    /// Full paragraph text, including the `%repl` prefix if any
    #[serde(default)]
    pub paragraph_text: Option<String>,

    /// Name the paragraph used to select its interpreter
    #[serde(default)]
    pub repl_name: Option<String>,

    /// User running the paragraph
    #[serde(default)]
    pub user_name: Option<String>,

    /// Paragraph-local properties, e.g. `%sh(timeout=5)`
    #[serde(default)]
    pub local_properties: BTreeMap<String, String>,
}

impl InterpreterContext {
    pub fn new(note_id: impl Into<String>, paragraph_id: impl Into<String>) -> Self {
        Self {
            note_id: note_id.into(),
            paragraph_id: paragraph_id.into(),
            ..Default::default()
        }
    }

    pub fn with_paragraph_text(mut self, text: impl Into<String>) -> Self {
        self.paragraph_text = Some(text.into());
        self
    }

    pub fn with_repl_name(mut self, name: impl Into<String>) -> Self {
        self.repl_name = Some(name.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user_name = Some(user.into());
        self
    }

    pub fn with_local_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.local_properties.insert(key.into(), value.into());
        self
    }

    pub fn local_property(&self, key: &str) -> Option<&str> {
        self.local_properties.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = InterpreterContext::new("note1", "p1")
            .with_paragraph_text("%sh echo hi")
            .with_repl_name("sh")
            .with_user("alice")
            .with_local_property("timeout", "5");

        assert_eq!(ctx.note_id, "note1");
        assert_eq!(ctx.paragraph_id, "p1");
        assert_eq!(ctx.paragraph_text.as_deref(), Some("%sh echo hi"));
        assert_eq!(ctx.repl_name.as_deref(), Some("sh"));
        assert_eq!(ctx.user_name.as_deref(), Some("alice"));
        assert_eq!(ctx.local_property("timeout"), Some("5"));
        assert_eq!(ctx.local_property("missing"), None);
    }

    #[test]
    fn test_context_deserializes_with_defaults() {
        let ctx: InterpreterContext =
            serde_json::from_str(r#"{"note_id":"n","paragraph_id":"p"}"#).unwrap();
        assert_eq!(ctx, InterpreterContext::new("n", "p"));
    }
}
