//! The message dispatcher.
//!
//! A [`Commander`] is configured first (commands and address checks) and
//! then connected to a [`Platform`]. Connecting resolves the bot's own
//! identity, takes the platform's message stream and freezes the command
//! tree; from then on every inbound message is handled on its own task:
//!
//! 1. messages authored by the bot itself are ignored;
//! 2. channel, guild and member metadata is resolved into a
//!    [`CommandContext`];
//! 3. the message must be addressed to the bot, either by a leading mention
//!    or by one of the registered [`CommandCheck`]s;
//! 4. the addressed text is walked through the command tree, and an
//!    invocable node is called with the remaining text.
//!
//! Unknown commands are dropped silently.

use crate::checks::{CommandCheck, Mention};
use crate::command::CommandNode;
use crate::context::CommandContext;
use crate::error::{CommanderError, Result};
use crate::help;
use crate::platform::{Message, Platform, User};
use crate::util::panic_message;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, trace, warn};

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The bot wrote the message itself.
    Ignored,
    /// Neither the mention nor any check matched.
    NotAddressed,
    /// The walk ended on a node without a handler.
    NotFound {
        /// Tokens consumed before the walk stopped.
        path: String,
    },
    /// A command ran and its responses were delivered.
    Invoked {
        /// The resolved command path.
        path: String,
    },
}

#[derive(Default)]
struct Setup {
    commands: CommandNode,
    checks: Vec<Box<dyn CommandCheck>>,
}

enum Phase {
    Unconnected(Setup),
    Connected {
        dispatcher: Arc<Dispatcher>,
        intake: Option<JoinHandle<()>>,
    },
}

/// Routes platform messages to commands.
///
/// ```rust,ignore
/// let mut commander = Commander::new();
/// commander
///     .command("ping")?
///     .set_description("Check the bot is alive")
///     .set_handler(handler_fn(|_ctx, res| async move {
///         let _ = res.text("pong").await;
///         res.finish();
///     }));
/// commander.add_command_check(checks::prefix("!"))?;
/// commander.connect(platform).await?;
/// commander.closed().await?;
/// ```
pub struct Commander {
    phase: Phase,
}

impl std::fmt::Debug for Commander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commander")
            .field("connected", &self.is_connected())
            .field("commands", self.commands())
            .finish_non_exhaustive()
    }
}

impl Default for Commander {
    fn default() -> Self {
        Self::new()
    }
}

impl Commander {
    /// Create an unconnected commander with the built-in `help` command.
    #[must_use]
    pub fn new() -> Self {
        let mut setup = Setup::default();
        setup.commands.insert("help", help::command());
        Self {
            phase: Phase::Unconnected(setup),
        }
    }

    /// The root of the command tree.
    #[must_use]
    pub fn commands(&self) -> &CommandNode {
        match &self.phase {
            Phase::Unconnected(setup) => &setup.commands,
            Phase::Connected { dispatcher, .. } => dispatcher.commands.as_ref(),
        }
    }

    /// Mutable access to the root of the command tree.
    ///
    /// # Errors
    ///
    /// [`CommanderError::AlreadyConnected`] once connected.
    pub fn commands_mut(&mut self) -> Result<&mut CommandNode> {
        match &mut self.phase {
            Phase::Unconnected(setup) => Ok(&mut setup.commands),
            Phase::Connected { .. } => Err(CommanderError::AlreadyConnected),
        }
    }

    /// Register a top-level command.
    ///
    /// # Errors
    ///
    /// Fails once connected, or if `token` is invalid or already taken.
    pub fn command(&mut self, token: &str) -> Result<&mut CommandNode> {
        Ok(self.commands_mut()?.command(token)?)
    }

    /// Add a check that recognises addressed messages.
    ///
    /// Checks run in the order they were added, after the mention check.
    ///
    /// # Errors
    ///
    /// [`CommanderError::AlreadyConnected`] once connected.
    pub fn add_command_check(&mut self, check: impl CommandCheck + 'static) -> Result<()> {
        match &mut self.phase {
            Phase::Unconnected(setup) => {
                setup.checks.push(Box::new(check));
                Ok(())
            }
            Phase::Connected { .. } => Err(CommanderError::AlreadyConnected),
        }
    }

    /// Whether [`connect`](Self::connect) has succeeded.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self.phase, Phase::Connected { .. })
    }

    /// The bot account, once connected.
    #[must_use]
    pub fn me(&self) -> Option<&User> {
        match &self.phase {
            Phase::Unconnected(_) => None,
            Phase::Connected { dispatcher, .. } => Some(&dispatcher.me),
        }
    }

    /// Attach to `platform` and start handling its messages.
    ///
    /// Nothing changes if the identity lookup or subscription fails, so the
    /// call may be retried.
    ///
    /// # Errors
    ///
    /// [`CommanderError::AlreadyConnected`] on a second call, or the
    /// platform error from the identity lookup or subscription.
    pub async fn connect(&mut self, platform: Arc<dyn Platform>) -> Result<()> {
        if self.is_connected() {
            return Err(CommanderError::AlreadyConnected);
        }

        let me = platform.current_user().await?;
        let mention = Mention::new(&me.id)
            .map_err(|e| CommanderError::internal(format!("mention pattern for {me}: {e}")))?;
        let events = platform.subscribe().await?;

        let Phase::Unconnected(setup) = &mut self.phase else {
            return Err(CommanderError::AlreadyConnected);
        };
        let Setup { commands, checks } = std::mem::take(setup);

        info!(
            user = %me,
            commands = commands.children().len(),
            checks = checks.len(),
            "commander connected"
        );

        let dispatcher = Arc::new(Dispatcher {
            platform,
            me,
            mention,
            checks,
            commands: Arc::new(commands),
        });
        let intake = tokio::spawn(Arc::clone(&dispatcher).run(events));
        self.phase = Phase::Connected {
            dispatcher,
            intake: Some(intake),
        };
        Ok(())
    }

    /// Handle one message directly, bypassing the subscription.
    ///
    /// # Errors
    ///
    /// [`CommanderError::NotConnected`] before connecting, a platform error
    /// if the message context cannot be resolved, or a command error if the
    /// invocation fails.
    pub async fn dispatch(&self, message: Message) -> Result<Outcome> {
        match &self.phase {
            Phase::Connected { dispatcher, .. } => dispatcher.handle(message).await,
            Phase::Unconnected(_) => Err(CommanderError::NotConnected),
        }
    }

    /// Wait until the message stream ends and every invocation started from
    /// it has finished.
    ///
    /// # Errors
    ///
    /// [`CommanderError::NotConnected`] before connecting, or a task error if
    /// the intake loop failed.
    pub async fn closed(&mut self) -> Result<()> {
        match &mut self.phase {
            Phase::Connected { intake, .. } => {
                if let Some(handle) = intake.take() {
                    handle.await?;
                }
                Ok(())
            }
            Phase::Unconnected(_) => Err(CommanderError::NotConnected),
        }
    }
}

/// Connected state shared by every message task.
struct Dispatcher {
    platform: Arc<dyn Platform>,
    me: User,
    mention: Mention,
    checks: Vec<Box<dyn CommandCheck>>,
    commands: Arc<CommandNode>,
}

impl Dispatcher {
    async fn run(self: Arc<Self>, mut events: mpsc::Receiver<Message>) {
        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                message = events.recv() => {
                    let Some(message) = message else { break };
                    trace!(message = %message.id, channel = %message.channel_id, "message received");
                    let dispatcher = Arc::clone(&self);
                    tasks.spawn(async move { dispatcher.process(message).await });
                }
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        info!(in_flight = tasks.len(), "message stream closed");
        while tasks.join_next().await.is_some() {}
    }

    async fn process(&self, message: Message) {
        let id = message.id.clone();
        match AssertUnwindSafe(self.handle(message)).catch_unwind().await {
            Ok(Ok(outcome)) => trace!(message = %id, ?outcome, "message processed"),
            Ok(Err(e)) => warn!(message = %id, error = %e, "failed to process message"),
            Err(panic) => error!(
                message = %id,
                panic = %panic_message(panic.as_ref()),
                "message processing panicked"
            ),
        }
    }

    async fn handle(&self, message: Message) -> Result<Outcome> {
        if message.author.id == self.me.id {
            return Ok(Outcome::Ignored);
        }

        let started = Instant::now();
        let mut ctx = CommandContext::resolve(
            Arc::clone(&self.platform),
            Arc::clone(&self.commands),
            message,
        )
        .await?;

        let Some(content) = self.address(&ctx) else {
            return Ok(Outcome::NotAddressed);
        };
        debug!(content = %content, "possible command incoming");

        let resolution = self.commands.resolve(&content);
        let path = resolution.path.join(" ");
        if !resolution.node.is_invocable() {
            debug!(path = %path, rest = %resolution.rest, "no command found");
            return Ok(Outcome::NotFound { path });
        }

        ctx.content = resolution.rest.to_string();
        ctx.path.clone_from(&path);
        debug!(
            command = %path,
            author = %ctx.author,
            channel = %ctx.channel,
            guild = ?ctx.guild.as_ref().map(|g| g.name.as_str()),
            "found a valid command"
        );

        if let Err(e) = self.platform.typing(&ctx.channel.id).await {
            warn!(channel = %ctx.channel.id, error = %e, "failed to send typing indicator");
        }

        resolution.node.call(ctx).await?;
        debug!(command = %path, elapsed = ?started.elapsed(), "command finished");
        Ok(Outcome::Invoked { path })
    }

    /// The text after the addressing prefix, if the message is addressed to
    /// the bot.
    fn address(&self, ctx: &CommandContext) -> Option<String> {
        self.mention
            .strip(&ctx.content)
            .or_else(|| self.checks.iter().find_map(|check| check.check(ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks;
    use crate::testing::NullPlatform;

    #[test]
    fn test_new_has_help() {
        let commander = Commander::new();
        let help = commander.commands().child("help").unwrap();
        assert!(help.is_invocable());
        assert!(!commander.is_connected());
        assert!(commander.me().is_none());
    }

    #[test]
    fn test_configure_before_connect() {
        let mut commander = Commander::new();
        commander.command("ping").unwrap().set_description("pong");
        assert!(commander.command("ping").is_err());
        assert!(commander.add_command_check(checks::prefix("!")).is_ok());
        assert_eq!(commander.commands().children().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_connect_keeps_setup() {
        let mut commander = Commander::new();
        commander.command("ping").unwrap();

        // Subscription fails on the null platform.
        let err = commander.connect(Arc::new(NullPlatform)).await.unwrap_err();
        assert!(matches!(err, CommanderError::Platform(_)));
        assert!(!commander.is_connected());
        assert!(commander.commands().child("ping").is_some());
        assert!(commander.command("later").is_ok());
    }

    #[tokio::test]
    async fn test_not_connected_errors() {
        let mut commander = Commander::new();
        let message = Message::new("m", "10", User::new("2", "alice"), "ping");
        assert!(matches!(
            commander.dispatch(message).await,
            Err(CommanderError::NotConnected)
        ));
        assert!(matches!(
            commander.closed().await,
            Err(CommanderError::NotConnected)
        ));
    }
}
