// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Interpreter Error Types with Error Codes
//!
//! Error code ranges:
//! - NBI-000-009: Lifecycle errors (open/close)
//! - NBI-010-019: Execution errors
//! - NBI-020-029: Hook errors
//! - NBI-030-039: Factory errors
//! - NBI-040-049: Configuration errors
//! - NBI-090-099: IO errors

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InterpreterError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for codes and help text.
#[derive(Error, Debug, Diagnostic)]
pub enum InterpreterError {
    // ═══════════════════════════════════════════
    // LIFECYCLE ERRORS (000-009)
    // ═══════════════════════════════════════════
    /// Raised by the lazy decorator when the wrapped interpreter failed to open.
    #[error("[NBI-001] Failed to open interpreter '{class_name}': {cause}")]
    #[diagnostic(
        code(nbinterp::initialization),
        help("The interpreter stays closed; the next call will try to open it again")
    )]
    Initialization {
        class_name: String,
        #[source]
        cause: Box<InterpreterError>,
    },

    #[error("[NBI-002] Open failed: {reason}")]
    #[diagnostic(code(nbinterp::open))]
    Open { reason: String },

    #[error("[NBI-003] Interpreter '{class_name}' is not open")]
    #[diagnostic(code(nbinterp::not_open))]
    NotOpen { class_name: String },

    #[error("[NBI-004] Close failed: {reason}")]
    #[diagnostic(code(nbinterp::close))]
    Close { reason: String },

    // ═══════════════════════════════════════════
    // EXECUTION ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[NBI-010] Execution failed: {reason}")]
    #[diagnostic(code(nbinterp::execution))]
    Execution { reason: String },

    #[error("[NBI-011] Completion failed: {reason}")]
    #[diagnostic(code(nbinterp::completion))]
    Completion { reason: String },

    #[error("[NBI-012] Interpreter panicked: {message}")]
    #[diagnostic(code(nbinterp::panicked))]
    Panicked { message: String },

    // ═══════════════════════════════════════════
    // HOOK ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[NBI-020] Hook event '{event}' is not valid")]
    #[diagnostic(
        code(nbinterp::invalid_hook),
        help("Use one of: pre_exec, post_exec, pre_exec_dev, post_exec_dev")
    )]
    InvalidHook { event: String },

    #[error("[NBI-021] Interpreter '{class_name}' has no interpreter group")]
    #[diagnostic(code(nbinterp::no_group))]
    NoInterpreterGroup { class_name: String },

    // ═══════════════════════════════════════════
    // FACTORY ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[NBI-030] Unknown interpreter class: '{class}'. Available: shell, mock")]
    #[diagnostic(code(nbinterp::unknown_interpreter))]
    UnknownInterpreter { class: String },

    #[error("[NBI-031] Interpreter '{name}' is not configured")]
    #[diagnostic(code(nbinterp::not_configured))]
    InterpreterNotConfigured { name: String },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[NBI-040] Configuration error: {reason}")]
    #[diagnostic(code(nbinterp::config))]
    ConfigError { reason: String },

    #[error("[NBI-041] Invalid value '{value}' for property '{key}'")]
    #[diagnostic(code(nbinterp::invalid_property))]
    InvalidProperty { key: String, value: String },

    // ═══════════════════════════════════════════
    // IO ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[NBI-090] IO error: {0}")]
    #[diagnostic(code(nbinterp::io))]
    Io(#[from] std::io::Error),
}

impl InterpreterError {
    /// Error code, e.g. "NBI-001"
    pub fn code(&self) -> &'static str {
        match self {
            Self::Initialization { .. } => "NBI-001",
            Self::Open { .. } => "NBI-002",
            Self::NotOpen { .. } => "NBI-003",
            Self::Close { .. } => "NBI-004",
            Self::Execution { .. } => "NBI-010",
            Self::Completion { .. } => "NBI-011",
            Self::Panicked { .. } => "NBI-012",
            Self::InvalidHook { .. } => "NBI-020",
            Self::NoInterpreterGroup { .. } => "NBI-021",
            Self::UnknownInterpreter { .. } => "NBI-030",
            Self::InterpreterNotConfigured { .. } => "NBI-031",
            Self::ConfigError { .. } => "NBI-040",
            Self::InvalidProperty { .. } => "NBI-041",
            Self::Io(_) => "NBI-090",
        }
    }

    /// Build a `Panicked` error from a caught panic payload
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { message }
    }
}

impl FixSuggestion for InterpreterError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            Self::Initialization { cause, .. } => cause.fix_suggestion(),
            Self::Open { .. } => Some("Check the interpreter properties (e.g. shell.command)"),
            Self::NotOpen { .. } => Some("Wrap the interpreter with LazyOpenInterpreter or call open() first"),
            Self::Close { .. } => None,
            Self::Execution { .. } => Some("Check the statement and the interpreter backend"),
            Self::Completion { .. } => None,
            Self::Panicked { .. } => Some("This is a bug in the interpreter implementation"),
            Self::InvalidHook { .. } => {
                Some("Use one of: pre_exec, post_exec, pre_exec_dev, post_exec_dev")
            }
            Self::NoInterpreterGroup { .. } => {
                Some("Attach an InterpreterGroup before registering hooks")
            }
            Self::UnknownInterpreter { .. } => Some("Set class = \"shell\" or \"mock\""),
            Self::InterpreterNotConfigured { .. } => {
                Some("Add an [[interpreter]] entry with that name, or run `nbinterp list`")
            }
            Self::ConfigError { .. } => Some("Check TOML syntax in the config file"),
            Self::InvalidProperty { .. } => Some("Fix the property value in the config file"),
            Self::Io(_) => Some("Check file path and permissions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_initialization_error_keeps_cause_as_source() {
        let err = InterpreterError::Initialization {
            class_name: "shell".to_string(),
            cause: Box::new(InterpreterError::Open {
                reason: "no such binary".to_string(),
            }),
        };

        assert_eq!(err.code(), "NBI-001");
        assert!(err.to_string().contains("shell"));
        assert!(err.to_string().contains("no such binary"));

        let source = err.source().expect("cause should be the source");
        assert!(source.to_string().contains("NBI-002"));
    }

    #[test]
    fn test_initialization_fix_comes_from_cause() {
        let err = InterpreterError::Initialization {
            class_name: "shell".to_string(),
            cause: Box::new(InterpreterError::Open {
                reason: "x".to_string(),
            }),
        };
        assert_eq!(
            err.fix_suggestion(),
            Some("Check the interpreter properties (e.g. shell.command)")
        );
    }

    #[test]
    fn test_from_panic_payloads() {
        let static_str: Box<dyn std::any::Any + Send> = Box::new("boom");
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn std::any::Any + Send> = Box::new(42_u32);

        assert!(InterpreterError::from_panic(static_str.as_ref())
            .to_string()
            .contains("boom"));
        assert!(InterpreterError::from_panic(owned.as_ref())
            .to_string()
            .contains("bang"));
        assert!(InterpreterError::from_panic(other.as_ref())
            .to_string()
            .contains("non-string"));
    }

    #[test]
    fn test_all_codes_have_prefix() {
        let errors = vec![
            InterpreterError::NotOpen {
                class_name: "x".into(),
            },
            InterpreterError::InvalidHook { event: "x".into() },
            InterpreterError::UnknownInterpreter { class: "x".into() },
            InterpreterError::ConfigError { reason: "x".into() },
        ];
        for err in errors {
            assert!(err.to_string().starts_with(&format!("[{}]", err.code())));
        }
    }
}
