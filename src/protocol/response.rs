//! Response definitions
//!
//! Represents responses to clients.

use serde::{Deserialize, Serialize};

use crate::error::LodeError;

/// Successful result of a command
///
/// Serialized as a bare JSON string or a JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    List(Vec<String>),
}

impl Payload {
    pub fn text(text: impl Into<String>) -> Self {
        Payload::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Payload::List(items) => Some(items),
            Payload::Text(_) => None,
        }
    }
}

/// A response to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The command succeeded
    Ok(Payload),

    /// The command failed; carries the error description
    Error(String),
}

impl Response {
    pub fn ok(payload: Payload) -> Self {
        Response::Ok(payload)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(message.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Response::Ok(payload) => Some(payload),
            Response::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Response::Error(message) => Some(message),
            Response::Ok(_) => None,
        }
    }
}

impl From<LodeError> for Response {
    fn from(err: LodeError) -> Self {
        Response::Error(err.to_string())
    }
}
