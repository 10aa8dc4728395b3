//! Async bridge for blocking interpreters
//!
//! Interpreter calls block (they wait on processes, sockets, locks). From a
//! tokio runtime they must run on the blocking pool, the same way the CLI
//! providers shell out through `spawn_blocking`.
//!
//! ```rust,ignore
//! let sh = AsyncInterpreter::new(create_interpreter(&setting, None)?);
//! let result = sh.interpret("echo hi", InterpreterContext::new("n", "p")).await?;
//! ```

use std::sync::Arc;

use tokio::task::JoinError;

use crate::error::{InterpreterError, Result};
use crate::interpreter::{Interpreter, InterpreterCompletion, InterpreterContext, InterpreterResult};

/// Cloneable async handle to a shared interpreter
#[derive(Clone)]
pub struct AsyncInterpreter {
    inner: Arc<dyn Interpreter>,
}

impl AsyncInterpreter {
    pub fn new(inner: Arc<dyn Interpreter>) -> Self {
        Self { inner }
    }

    /// The wrapped interpreter, for synchronous accessors
    pub fn interpreter(&self) -> &Arc<dyn Interpreter> {
        &self.inner
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Interpreter) -> Result<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(inner.as_ref()))
            .await
            .map_err(join_error)?
    }

    pub async fn open(&self) -> Result<()> {
        self.blocking(|i| i.open()).await
    }

    pub async fn close(&self) -> Result<()> {
        self.blocking(|i| i.close()).await
    }

    pub async fn interpret(
        &self,
        st: impl Into<String>,
        ctx: InterpreterContext,
    ) -> Result<InterpreterResult> {
        let st = st.into();
        self.blocking(move |i| i.interpret(&st, &ctx)).await
    }

    pub async fn cancel(&self, ctx: InterpreterContext) -> Result<()> {
        self.blocking(move |i| i.cancel(&ctx)).await
    }

    pub async fn progress(&self, ctx: InterpreterContext) -> Result<u8> {
        self.blocking(move |i| i.progress(&ctx)).await
    }

    pub async fn completion(
        &self,
        buf: impl Into<String>,
        cursor: usize,
        ctx: InterpreterContext,
    ) -> Result<Vec<InterpreterCompletion>> {
        let buf = buf.into();
        self.blocking(move |i| i.completion(&buf, cursor, &ctx)).await
    }
}

impl std::fmt::Debug for AsyncInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncInterpreter")
            .field("inner", &self.inner.class_name())
            .finish()
    }
}

fn join_error(err: JoinError) -> InterpreterError {
    if err.is_panic() {
        InterpreterError::from_panic(err.into_panic().as_ref())
    } else {
        InterpreterError::Execution {
            reason: format!("blocking task cancelled: {}", err),
        }
    }
}
