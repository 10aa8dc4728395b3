//! # Interpreter Abstraction Layer
//!
//! Trait and implementations for notebook interpreters.
//!
//! ## Overview
//!
//! - [`Interpreter`] - Core trait every backend implements
//! - [`LazyOpenInterpreter`] - Decorator that opens the wrapped interpreter on first use
//! - [`ShellInterpreter`] - Runs statements with `sh -c`
//! - [`MockInterpreter`] - Test interpreter with configurable failures
//!
//! ## Interpreter Trait
//!
//! ```rust,ignore
//! pub trait Interpreter: Send + Sync {
//!     fn base(&self) -> &InterpreterBase;
//!     fn open(&self) -> Result<()>;
//!     fn close(&self) -> Result<()>;
//!     fn interpret(&self, st: &str, ctx: &InterpreterContext) -> Result<InterpreterResult>;
//!     fn cancel(&self, ctx: &InterpreterContext) -> Result<()>;
//!     fn form_type(&self) -> Result<FormType>;
//!     fn progress(&self, ctx: &InterpreterContext) -> Result<u8>;
//!     // ...plus accessors with defaults backed by `base()`
//! }
//! ```
//!
//! [`LazyOpenInterpreter`] overrides every accessor to forward to the wrapped
//! interpreter, so its class name and state are the delegate's.
//!
//! Calls are blocking. Async callers go through [`crate::runtime::AsyncInterpreter`].
//!
//! ## Creating Interpreters
//!
//! ```rust
//! use nbinterp::config::InterpreterSetting;
//! use nbinterp::interpreter::{create_interpreter, Interpreter};
//!
//! let setting = InterpreterSetting::new("sh", "shell");
//! let sh = create_interpreter(&setting, None).unwrap();
//! assert!(sh.class_name().ends_with("ShellInterpreter"));
//!
//! let unknown = create_interpreter(&InterpreterSetting::new("x", "cobol"), None);
//! assert!(unknown.is_err());
//! ```

mod base;
mod completion;
mod context;
mod group;
pub mod hooks;
mod lazy;
pub mod loader;
mod mock;
mod result;
mod scheduler;
pub mod shell;

pub use base::{InterpreterBase, Properties};
pub use completion::InterpreterCompletion;
pub use context::InterpreterContext;
pub use group::InterpreterGroup;
pub use hooks::{HookRegistry, HookType};
pub use lazy::LazyOpenInterpreter;
pub use loader::{ContextLoader, LoaderGuard};
pub use mock::MockInterpreter;
pub use result::{Code, InterpreterResult, MessageType, ResultMessage};
pub use scheduler::{Scheduler, SerialScheduler};
pub use shell::ShellInterpreter;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::InterpreterSetting;
use crate::error::{InterpreterError, Result};

/// Property holding code to run before each paragraph
pub const PRECODE_PROPERTY: &str = "precode";

// ============================================================================
// FORM TYPE
// ============================================================================

/// How dynamic forms in a paragraph are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormType {
    /// The interpreter renders forms itself
    Native,
    /// `${name=default}` substitution before interpreting
    Simple,
    /// No form support
    None,
}

// ============================================================================
// INTERPRETER TRAIT
// ============================================================================

/// Core trait that all interpreters implement
///
/// `open` acquires whatever the backend needs (process, connection, symbol
/// tables); `close` releases it. Everything else assumes an opened
/// interpreter unless documented otherwise.
pub trait Interpreter: Send + Sync {
    /// Shared state (properties, user, group, hooks, lifecycle lock)
    fn base(&self) -> &InterpreterBase;

    /// Acquire backend resources
    fn open(&self) -> Result<()>;

    /// Release backend resources
    fn close(&self) -> Result<()>;

    /// Run one statement
    fn interpret(&self, st: &str, ctx: &InterpreterContext) -> Result<InterpreterResult>;

    /// Stop the statement running for `ctx`, if any
    fn cancel(&self, ctx: &InterpreterContext) -> Result<()>;

    fn form_type(&self) -> Result<FormType>;

    /// Progress of the running statement in percent
    fn progress(&self, ctx: &InterpreterContext) -> Result<u8>;

    /// Completion candidates for `buf` at byte offset `cursor`
    fn completion(
        &self,
        _buf: &str,
        _cursor: usize,
        _ctx: &InterpreterContext,
    ) -> Result<Vec<InterpreterCompletion>> {
        Ok(Vec::new())
    }

    /// Run the `precode` property through `interpret`, if set
    fn execute_precode(&self, ctx: &InterpreterContext) -> Result<Option<InterpreterResult>> {
        match self.property(PRECODE_PROPERTY) {
            Some(precode) if !precode.trim().is_empty() => {
                self.interpret(&precode, ctx).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn class_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn properties(&self) -> Properties {
        self.base().properties()
    }

    fn set_properties(&self, properties: Properties) {
        self.base().set_properties(properties);
    }

    fn property(&self, key: &str) -> Option<String> {
        self.base().property(key)
    }

    fn user_name(&self) -> Option<String> {
        self.base().user_name()
    }

    fn set_user_name(&self, user_name: &str) {
        self.base().set_user_name(user_name);
    }

    fn interpreter_group(&self) -> Option<Arc<InterpreterGroup>> {
        self.base().interpreter_group()
    }

    fn set_interpreter_group(&self, group: Arc<InterpreterGroup>) {
        self.base().set_interpreter_group(group);
    }

    fn classloader_urls(&self) -> Vec<Url> {
        self.base().classloader_urls()
    }

    fn set_classloader_urls(&self, urls: Vec<Url>) {
        self.base().set_classloader_urls(urls);
    }

    fn scheduler(&self) -> Arc<dyn Scheduler> {
        self.base().scheduler()
    }

    /// Register `cmd` for `event` in the group's hook registry
    ///
    /// `note_id = None` registers in the global scope.
    fn register_hook(&self, note_id: Option<&str>, event: &str, cmd: &str) -> Result<()> {
        let group = self
            .interpreter_group()
            .ok_or_else(|| InterpreterError::NoInterpreterGroup {
                class_name: self.class_name().to_string(),
            })?;
        group.hooks().register(note_id, self.class_name(), event, cmd)
    }

    fn hook(&self, note_id: Option<&str>, event: &str) -> Option<String> {
        self.interpreter_group()
            .and_then(|group| group.hooks().get(note_id, self.class_name(), event))
    }

    fn unregister_hook(&self, note_id: Option<&str>, event: &str) {
        if let Some(group) = self.interpreter_group() {
            group.hooks().unregister(note_id, self.class_name(), event);
        }
    }
}

/// Implemented by decorators that wrap another interpreter
pub trait WrappedInterpreter {
    fn inner_interpreter(&self) -> &Arc<dyn Interpreter>;
}

// ============================================================================
// INTERPRETER FACTORY
// ============================================================================

/// Build an interpreter from its configuration
///
/// # Supported Classes
///
/// | Class | Description |
/// |-------|-------------|
/// | `shell` | [`ShellInterpreter`] |
/// | `mock` | [`MockInterpreter`] |
///
/// The result is wrapped in [`LazyOpenInterpreter`] unless `setting.lazy` is false.
pub fn create_interpreter(
    setting: &InterpreterSetting,
    group: Option<Arc<InterpreterGroup>>,
) -> Result<Arc<dyn Interpreter>> {
    let interpreter: Arc<dyn Interpreter> = match setting.class.to_lowercase().as_str() {
        "shell" => Arc::new(ShellInterpreter::new()),
        "mock" => Arc::new(MockInterpreter::new()),
        _ => {
            return Err(InterpreterError::UnknownInterpreter {
                class: setting.class.clone(),
            })
        }
    };

    interpreter.set_properties(setting.properties.clone());
    interpreter.set_classloader_urls(setting.classloader_urls.clone());
    if let Some(user) = &setting.user {
        interpreter.set_user_name(user);
    }
    if let Some(group) = group {
        interpreter.set_interpreter_group(group);
    }

    tracing::debug!(
        name = %setting.name,
        class_name = %interpreter.class_name(),
        lazy = setting.lazy,
        "Created interpreter"
    );

    if setting.lazy {
        Ok(Arc::new(LazyOpenInterpreter::new(interpreter)))
    } else {
        Ok(interpreter)
    }
}

// ============================================================================
// TESTS
// ============================================================================
