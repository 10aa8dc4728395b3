//! Mock interpreter for testing
//!
//! Returns configurable responses, simulates slow or failing opens and
//! counts every call. Essential for unit tests and CI pipelines.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::loader::{self, ContextLoader};
use super::{
    FormType, Interpreter, InterpreterBase, InterpreterCompletion, InterpreterContext,
    InterpreterResult,
};
use crate::error::{InterpreterError, Result};

/// Mock interpreter that returns predefined responses
#[derive(Debug, Default)]
pub struct MockInterpreter {
    base: InterpreterBase,
    open_delay: Duration,
    /// Remaining opens that should fail
    open_failures: AtomicUsize,
    panic_on_open: bool,
    fail_close: bool,
    progress: u8,
    completions: Vec<InterpreterCompletion>,
    leak_loader: Option<Arc<ContextLoader>>,
    responses: Mutex<VecDeque<String>>,
    statements: Mutex<Vec<String>>,
    opened: AtomicBool,
    open_calls: AtomicUsize,
    close_calls: AtomicUsize,
    interpret_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    progress_calls: AtomicUsize,
    completion_calls: AtomicUsize,
}

impl MockInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside `open`
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// Fail the next `times` opens with `InterpreterError::Open`
    pub fn failing_open(self, times: usize) -> Self {
        self.open_failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn panicking_open(mut self) -> Self {
        self.panic_on_open = true;
        self
    }

    /// Every `close` fails with `InterpreterError::Close`
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_completions(mut self, completions: Vec<InterpreterCompletion>) -> Self {
        self.completions = completions;
        self
    }

    /// Install `loader` on the calling thread during `interpret` and leave it there
    pub fn leaking_loader(mut self, loader: Arc<ContextLoader>) -> Self {
        self.leak_loader = Some(loader);
        self
    }

    /// Add a response to the queue; the default echoes the statement
    pub fn queue_response(&self, response: impl Into<String>) {
        self.responses.lock().push_back(response.into());
    }

    /// Statements interpreted so far, in order
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn interpret_calls(&self) -> usize {
        self.interpret_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn progress_calls(&self) -> usize {
        self.progress_calls.load(Ordering::SeqCst)
    }

    pub fn completion_calls(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst)
    }
}

impl Interpreter for MockInterpreter {
    fn base(&self) -> &InterpreterBase {
        &self.base
    }

    fn open(&self) -> Result<()> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        if !self.open_delay.is_zero() {
            std::thread::sleep(self.open_delay);
        }
        if self.panic_on_open {
            panic!("mock open panicked");
        }

        let should_fail = self
            .open_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(InterpreterError::Open {
                reason: "mock open failure".to_string(),
            });
        }

        self.opened.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(InterpreterError::Close {
                reason: "mock close failure".to_string(),
            });
        }
        self.opened.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn interpret(&self, st: &str, _ctx: &InterpreterContext) -> Result<InterpreterResult> {
        self.interpret_calls.fetch_add(1, Ordering::SeqCst);
        self.statements.lock().push(st.to_string());

        if let Some(leak) = &self.leak_loader {
            loader::replace(Some(Arc::clone(leak)));
        }

        let response = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| st.to_string());
        Ok(InterpreterResult::success(response))
    }

    fn cancel(&self, _ctx: &InterpreterContext) -> Result<()> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn form_type(&self) -> Result<FormType> {
        Ok(FormType::Native)
    }

    fn progress(&self, _ctx: &InterpreterContext) -> Result<u8> {
        self.progress_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.progress)
    }

    fn completion(
        &self,
        _buf: &str,
        _cursor: usize,
        _ctx: &InterpreterContext,
    ) -> Result<Vec<InterpreterCompletion>> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.completions.clone())
    }
}
