//! Interpreter results

use serde::{Deserialize, Serialize};

/// Outcome of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    Success,
    /// Statement needs more input (e.g. an open block)
    Incomplete,
    Error,
    /// Leave the paragraph's previous output in place
    KeepPreviousResult,
}

/// How the front end should render a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Html,
    Angular,
    Table,
    Img,
    Svg,
    Null,
}

/// One block of output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub data: String,
}

impl ResultMessage {
    pub fn new(kind: MessageType, data: impl Into<String>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self::new(MessageType::Text, data)
    }
}

/// Result of interpreting one statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterResult {
    pub code: Code,
    #[serde(default)]
    pub messages: Vec<ResultMessage>,
}

impl InterpreterResult {
    pub fn new(code: Code) -> Self {
        Self {
            code,
            messages: Vec::new(),
        }
    }

    /// Successful result with a single text message
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Code::Success).with_text(text)
    }

    /// Error result with a single text message
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Code::Error).with_text(text)
    }

    pub fn with_message(mut self, message: ResultMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_message(ResultMessage::text(text))
    }

    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }

    /// Concatenated data of all text messages
    pub fn text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.kind == MessageType::Text)
            .map(|m| m.data.as_str())
            .collect()
    }
}
