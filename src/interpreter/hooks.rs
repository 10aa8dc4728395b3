//! Paragraph hook registry
//!
//! Hooks are commands an interpreter runs around paragraph execution. The
//! registry only stores them, keyed by scope (a note id or the global
//! scope), interpreter class name and event.

use std::collections::HashMap;
use std::str::FromStr;

use parking_lot::RwLock;

use crate::error::{InterpreterError, Result};

/// Scope key used when no note id is given
pub const GLOBAL_SCOPE: &str = "_GLOBAL_";

/// Events a hook can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookType {
    PreExec,
    PostExec,
    PreExecDev,
    PostExecDev,
}

impl HookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookType::PreExec => "pre_exec",
            HookType::PostExec => "post_exec",
            HookType::PreExecDev => "pre_exec_dev",
            HookType::PostExecDev => "post_exec_dev",
        }
    }
}

impl FromStr for HookType {
    type Err = InterpreterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pre_exec" => Ok(HookType::PreExec),
            "post_exec" => Ok(HookType::PostExec),
            "pre_exec_dev" => Ok(HookType::PreExecDev),
            "post_exec_dev" => Ok(HookType::PostExecDev),
            _ => Err(InterpreterError::InvalidHook {
                event: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for HookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// scope -> class name -> event -> command
type HookTable = HashMap<String, HashMap<String, HashMap<HookType, String>>>;

/// Thread-safe hook storage shared by an interpreter group
#[derive(Debug, Default)]
pub struct HookRegistry {
    hooks: RwLock<HookTable>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `cmd` for `event`, replacing any previous command
    pub fn register(
        &self,
        note_id: Option<&str>,
        class_name: &str,
        event: &str,
        cmd: &str,
    ) -> Result<()> {
        let event: HookType = event.parse()?;
        let scope = note_id.unwrap_or(GLOBAL_SCOPE);

        self.hooks
            .write()
            .entry(scope.to_string())
            .or_default()
            .entry(class_name.to_string())
            .or_default()
            .insert(event, cmd.to_string());
        Ok(())
    }

    /// Look up a command. Unknown events simply have no hook.
    pub fn get(&self, note_id: Option<&str>, class_name: &str, event: &str) -> Option<String> {
        let event: HookType = event.parse().ok()?;
        let scope = note_id.unwrap_or(GLOBAL_SCOPE);

        self.hooks
            .read()
            .get(scope)
            .and_then(|classes| classes.get(class_name))
            .and_then(|events| events.get(&event))
            .cloned()
    }

    pub fn unregister(&self, note_id: Option<&str>, class_name: &str, event: &str) {
        let Ok(event) = event.parse::<HookType>() else {
            return;
        };
        let scope = note_id.unwrap_or(GLOBAL_SCOPE);

        let mut hooks = self.hooks.write();
        if let Some(classes) = hooks.get_mut(scope) {
            if let Some(events) = classes.get_mut(class_name) {
                events.remove(&event);
                if events.is_empty() {
                    classes.remove(class_name);
                }
            }
            if classes.is_empty() {
                hooks.remove(scope);
            }
        }
    }

    /// Number of registered commands across all scopes
    pub fn len(&self) -> usize {
        self.hooks
            .read()
            .values()
            .flat_map(|classes| classes.values())
            .map(|events| events.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
