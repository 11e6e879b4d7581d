//! Argument grammar for command usage templates.
//!
//! A usage template describes the words that follow a command:
//!
//! ```text
//! <target:channel> [count:int] <message...>
//! ```
//!
//! - bare words are literals that must appear verbatim;
//! - `<name>` / `<name:type>` are required parameters;
//! - `[name]` / `[name:type]` are optional parameters;
//! - a trailing `...` on the last parameter captures the rest of the input.
//!
//! The parameter type decides which prefix of the input a parameter
//! consumes and how the matched text is converted. `word` is the default
//! type; `int` and `text` are always available, and callers may register
//! their own [`Parameter`]s.

mod parameter;
mod parser;

pub use parameter::{ChannelConverter, Converter, IntConverter, Parameter, ParameterMap};
pub use parser::Parser;

use crate::platform::Channel;
use std::collections::HashMap;

/// A converted parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Text, as matched.
    Text(String),
    /// A signed integer.
    Integer(i64),
    /// A resolved channel reference.
    Channel(Channel),
}

/// Parameters extracted from a message by a [`Parser`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    values: HashMap<String, Value>,
}

impl ParsedArgs {
    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// The value of parameter `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The value of text parameter `name`.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name)? {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The value of integer parameter `name`.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name)? {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The value of channel parameter `name`.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        match self.values.get(name)? {
            Value::Channel(channel) => Some(channel),
            _ => None,
        }
    }

    /// Whether parameter `name` was supplied.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of supplied parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
