//! nbinterp - lazily opened notebook interpreters
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`interpreter`] | `Interpreter` trait, lazy-open decorator, shell and mock backends |
//! | [`runtime`] | Async bridge onto tokio's blocking pool |
//! | [`config`] | TOML interpreter settings |
//! | [`error`] | Error types with fix suggestions |

pub mod interpreter;
pub mod runtime;

pub mod config;
pub mod error;

pub use config::{InterpreterSetting, NbConfig};
pub use error::{FixSuggestion, InterpreterError};
pub use interpreter::{
    create_interpreter, Interpreter, InterpreterContext, InterpreterResult, LazyOpenInterpreter,
    WrappedInterpreter,
};
pub use runtime::AsyncInterpreter;
