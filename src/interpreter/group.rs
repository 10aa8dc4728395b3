//! Interpreter group: interpreters that share a session and hooks

use super::hooks::HookRegistry;

#[derive(Debug)]
pub struct InterpreterGroup {
    id: String,
    hooks: HookRegistry,
}

impl InterpreterGroup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hooks: HookRegistry::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }
}
