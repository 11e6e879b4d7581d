//! Commander - a command tree dispatcher for chat bots.
//!
//! Commands are registered as a tree of literal words. Each inbound message
//! that is addressed to the bot (by mention, prefix or direct message) is
//! walked through the tree, and the deepest matching command runs on its own
//! task, streaming responses back to the channel in order.
//!
//! # Architecture
//!
//! - **Commander** ([`commander`]) - connection lifecycle and per-message
//!   dispatch
//! - **Command tree** ([`command`]) - nodes, handlers and resolution
//! - **Responses** ([`response`]) - payloads and the response pipe
//! - **Arguments** ([`args`]) - usage templates bound to handlers
//! - **Platform** ([`platform`]) - the chat client boundary, with a console
//!   implementation in [`platforms`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use commander::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut commander = Commander::new();
//!     commander
//!         .command("echo")?
//!         .set_description("Repeat a message")
//!         .bind("<text...>", handler_fn(|ctx, res| async move {
//!             let text = ctx.params.as_ref().and_then(|p| p.str("text")).unwrap_or_default();
//!             let _ = res.text(text).await;
//!             res.finish();
//!         }), ParameterMap::new())?;
//!     commander.add_command_check(checks::prefix("!"))?;
//!
//!     let platform = Arc::new(ConsolePlatform::new(ConsoleConfig::default()));
//!     commander.connect(platform).await?;
//!     commander.closed().await
//! }
//! ```

pub mod args;
mod bind;
pub mod checks;
pub mod command;
pub mod commander;
pub mod config;
pub mod context;
pub mod error;
pub mod help;
pub mod platform;
pub mod platforms;
pub mod response;
pub mod util;

#[cfg(test)]
mod testing;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error types (centralized)
    pub use crate::error::{
        ArgsError, ArgsResult, CommandError, CommandResult, CommanderError, ConfigError,
        ConfigResult, ErrorContext, PlatformError, PlatformResult, Result,
    };

    // Commander
    pub use crate::commander::{Commander, Outcome};

    // Command tree
    pub use crate::command::{CommandHandler, CommandNode, FnHandler, Resolution, handler_fn};
    pub use crate::context::CommandContext;
    pub use crate::response::{Attachment, Embed, EmbedField, Responder, Response, Responses};

    // Addressing
    pub use crate::checks::{self, CommandCheck, Mention};

    // Arguments
    pub use crate::args::{Converter, Parameter, ParameterMap, ParsedArgs, Parser, Value};

    // Platform
    pub use crate::platform::{Channel, Emoji, Guild, Member, Message, Platform, User};
    pub use crate::platforms::{ConsoleConfig, ConsolePlatform};

    // Config
    pub use crate::config::{
        CommanderConfig, ConfigIssue, IssueLevel, config_path, load_config, save_config,
    };

    pub use std::sync::Arc;
}
