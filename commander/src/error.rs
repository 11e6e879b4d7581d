//! Unified error types for commander.
//!
//! Every module reports failures through its own error enum; all of them
//! convert into [`CommanderError`], which is what the public configuration
//! surface (`connect`, `add_command_check`, config loading) returns.
//!
//! Chat-visible failures (bad arguments, unknown help topics) are *not*
//! errors at this level: they travel to the channel as ordinary
//! [`Response`](crate::response::Response) payloads.

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for commander operations.
#[derive(Debug, thiserror::Error)]
pub enum CommanderError {
    /// `connect` was called twice, or configuration was attempted after
    /// the commander started receiving events.
    #[error("commander already connected")]
    AlreadyConnected,

    /// Messages were dispatched before `connect`.
    #[error("commander not connected")]
    NotConnected,

    /// Command tree error.
    #[error("command: {0}")]
    Command(#[from] CommandError),

    /// Platform client error.
    #[error("platform: {0}")]
    Platform(#[from] PlatformError),

    /// Argument grammar error.
    #[error("args: {0}")]
    Args(#[from] ArgsError),

    /// Configuration error.
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Task join error.
    #[error("task: {0}")]
    Task(String),

    /// Generic internal error.
    #[error("{0}")]
    Internal(String),
}

impl CommanderError {
    /// Create a config error from a string.
    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(ConfigError::Invalid(msg.into()))
    }

    /// Create an internal error.
    #[inline]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<tokio::task::JoinError> for CommanderError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// Result type alias for commander operations.
pub type Result<T> = std::result::Result<T, CommanderError>;

// ============================================================================
// Command Tree Errors
// ============================================================================

/// Error type for building and invoking the command tree.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Command tokens must be a single non-empty word.
    #[error("invalid command token {0:?}")]
    InvalidToken(String),

    /// A child with the same token is already registered.
    #[error("command {0:?} already registered")]
    Duplicate(String),

    /// The node was invoked but has no handler attached.
    #[error("no command handler defined for {0:?}")]
    NoHandler(String),

    /// The dispatcher stopped draining the response pipe.
    #[error("response pipe closed")]
    PipeClosed,
}

impl CommandError {
    /// Create a missing handler error.
    #[inline]
    pub fn no_handler(path: impl Into<String>) -> Self {
        Self::NoHandler(path.into())
    }
}

/// Result type for command tree operations.
pub type CommandResult<T> = std::result::Result<T, CommandError>;

// ============================================================================
// Platform Errors
// ============================================================================

/// Error type reported by [`Platform`](crate::platform::Platform) clients.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// A channel, guild, member or user lookup failed.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up ("channel", "guild", ...).
        kind: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// Failed to send something to a channel.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The client is not connected to the platform.
    #[error("not connected")]
    NotConnected,

    /// The inbound event stream was already taken or closed.
    #[error("event stream unavailable")]
    EventStream,

    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Any other client failure.
    #[error("{0}")]
    Request(String),
}

impl PlatformError {
    /// Create a not found error.
    #[inline]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a send failed error.
    #[inline]
    pub fn send(msg: impl Into<String>) -> Self {
        Self::SendFailed(msg.into())
    }
}

/// Result type for platform operations.
pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

// ============================================================================
// Argument Grammar Errors
// ============================================================================

/// Error type for compiling usage templates and parsing arguments.
#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    /// The usage template could not be compiled.
    #[error("invalid usage template: {0}")]
    Template(String),

    /// The template references a parameter type that is not registered.
    #[error("unknown parameter type `{0}`")]
    UnknownType(String),

    /// A parameter type pattern is not a valid regex.
    #[error("invalid parameter pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A required parameter is missing from the input.
    #[error("missing parameter `{0}`")]
    Missing(String),

    /// A literal word of the template did not match.
    #[error("expected `{expected}`, found `{found}`")]
    Literal {
        /// The literal the template requires.
        expected: String,
        /// What the input contained instead.
        found: String,
    },

    /// The input for a parameter did not match its type.
    #[error("`{found}` is not a valid {kind} for `{name}`")]
    Mismatch {
        /// Parameter name.
        name: String,
        /// Parameter type name.
        kind: String,
        /// The offending input.
        found: String,
    },

    /// A converter rejected the matched text.
    #[error("could not convert `{name}`: {reason}")]
    Convert {
        /// Parameter name.
        name: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// Input remained after the whole template was matched.
    #[error("unexpected input `{0}`")]
    Unexpected(String),
}

impl ArgsError {
    /// Create a template error.
    #[inline]
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Create a conversion error.
    #[inline]
    pub fn convert(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Convert {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for argument grammar operations.
pub type ArgsResult<T> = std::result::Result<T, ArgsError>;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid value.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an invalid value error.
    #[inline]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ============================================================================
// Error Context Extension
// ============================================================================

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<CommanderError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            CommanderError::Internal(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            CommanderError::Internal(format!("{}: {}", f(), err))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
