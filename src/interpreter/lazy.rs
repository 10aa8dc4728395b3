//! Lazy-open decorator
//!
//! Opening an interpreter can mean spawning a process or loading a symbol
//! table. [`LazyOpenInterpreter`] defers that until the first call that
//! needs it and guarantees the wrapped interpreter is opened at most once
//! per open/close cycle, however many threads race on it.
//!
//! ```text
//!            open() ok
//!   Unopened ─────────► Opened
//!      ▲  │                │
//!      │  └─ open() err ─┐ │ close()
//!      └─────────────────┴─┘
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use url::Url;

use super::loader::LoaderGuard;
use super::{
    FormType, Interpreter, InterpreterBase, InterpreterCompletion, InterpreterContext,
    InterpreterGroup, InterpreterResult, Properties, Scheduler, WrappedInterpreter,
};
use crate::error::{InterpreterError, Result};

/// Interpreter wrapper for lazy initialization
///
/// Identity follows the wrapped interpreter. Every accessor, `class_name`
/// included, reports the delegate.
pub struct LazyOpenInterpreter {
    inner: Arc<dyn Interpreter>,
    /// True once `inner.open()` succeeded and until `close()` completes
    opened: AtomicBool,
}

impl LazyOpenInterpreter {
    pub fn new(inner: Arc<dyn Interpreter>) -> Self {
        Self {
            inner,
            opened: AtomicBool::new(false),
        }
    }

    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Release whatever a failed open left behind and wrap its cause
    ///
    /// A failing cleanup is logged and dropped so the caller always sees
    /// the error that broke `open`.
    fn abort_open(&self, cause: InterpreterError) -> InterpreterError {
        let class_name = self.inner.class_name().to_string();
        tracing::warn!(
            class_name = %class_name,
            error = %cause,
            "Exception while trying to open interpreter"
        );

        match catch_unwind(AssertUnwindSafe(|| self.inner.close())) {
            Ok(Ok(())) => {}
            Ok(Err(close_err)) => tracing::warn!(
                class_name = %class_name,
                error = %close_err,
                "Failed to release interpreter after failed open"
            ),
            Err(payload) => tracing::warn!(
                class_name = %class_name,
                error = %InterpreterError::from_panic(payload.as_ref()),
                "Failed to release interpreter after failed open"
            ),
        }

        InterpreterError::Initialization {
            class_name,
            cause: Box::new(cause),
        }
    }
}

impl WrappedInterpreter for LazyOpenInterpreter {
    fn inner_interpreter(&self) -> &Arc<dyn Interpreter> {
        &self.inner
    }
}

impl std::fmt::Debug for LazyOpenInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyOpenInterpreter")
            .field("inner", &self.inner.class_name())
            .field("opened", &self.is_open())
            .finish()
    }
}

impl Interpreter for LazyOpenInterpreter {
    fn base(&self) -> &InterpreterBase {
        self.inner.base()
    }

    fn class_name(&self) -> &str {
        self.inner.class_name()
    }

    fn open(&self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        let _lifecycle = self.inner.base().lifecycle().lock();
        if self.is_open() {
            return Ok(());
        }

        match catch_unwind(AssertUnwindSafe(|| self.inner.open())) {
            Ok(Ok(())) => {
                self.opened.store(true, Ordering::Release);
                tracing::debug!(class_name = %self.inner.class_name(), "Interpreter opened");
                Ok(())
            }
            Ok(Err(e)) => Err(self.abort_open(e)),
            Err(payload) => Err(self.abort_open(InterpreterError::from_panic(payload.as_ref()))),
        }
    }

    fn close(&self) -> Result<()> {
        let _lifecycle = self.inner.base().lifecycle().lock();
        if self.is_open() {
            self.inner.close()?;
            self.opened.store(false, Ordering::Release);
            tracing::debug!(class_name = %self.inner.class_name(), "Interpreter closed");
        }
        Ok(())
    }

    fn interpret(&self, st: &str, ctx: &InterpreterContext) -> Result<InterpreterResult> {
        self.open()?;
        let _loader = LoaderGuard::capture();
        self.inner.interpret(st, ctx)
    }

    fn cancel(&self, ctx: &InterpreterContext) -> Result<()> {
        if self.is_open() {
            self.inner.cancel(ctx)
        } else {
            Ok(())
        }
    }

    fn form_type(&self) -> Result<FormType> {
        self.inner.form_type()
    }

    fn progress(&self, ctx: &InterpreterContext) -> Result<u8> {
        if self.is_open() {
            self.inner.progress(ctx)
        } else {
            Ok(0)
        }
    }

    fn completion(
        &self,
        buf: &str,
        cursor: usize,
        ctx: &InterpreterContext,
    ) -> Result<Vec<InterpreterCompletion>> {
        self.open()?;
        self.inner.completion(buf, cursor, ctx)
    }

    fn execute_precode(&self, ctx: &InterpreterContext) -> Result<Option<InterpreterResult>> {
        self.inner.execute_precode(ctx)
    }

    fn properties(&self) -> Properties {
        self.inner.properties()
    }

    fn set_properties(&self, properties: Properties) {
        self.inner.set_properties(properties);
    }

    fn property(&self, key: &str) -> Option<String> {
        self.inner.property(key)
    }

    fn user_name(&self) -> Option<String> {
        self.inner.user_name()
    }

    fn set_user_name(&self, user_name: &str) {
        self.inner.set_user_name(user_name);
    }

    fn interpreter_group(&self) -> Option<Arc<InterpreterGroup>> {
        self.inner.interpreter_group()
    }

    fn set_interpreter_group(&self, group: Arc<InterpreterGroup>) {
        self.inner.set_interpreter_group(group);
    }

    fn classloader_urls(&self) -> Vec<Url> {
        self.inner.classloader_urls()
    }

    fn set_classloader_urls(&self, urls: Vec<Url>) {
        self.inner.set_classloader_urls(urls);
    }

    fn scheduler(&self) -> Arc<dyn Scheduler> {
        self.inner.scheduler()
    }

    fn register_hook(&self, note_id: Option<&str>, event: &str, cmd: &str) -> Result<()> {
        self.inner.register_hook(note_id, event, cmd)
    }

    fn hook(&self, note_id: Option<&str>, event: &str) -> Option<String> {
        self.inner.hook(note_id, event)
    }

    fn unregister_hook(&self, note_id: Option<&str>, event: &str) {
        self.inner.unregister_hook(note_id, event);
    }
}
