//! Per-invocation context.

use crate::args::ParsedArgs;
use crate::command::CommandNode;
use crate::error::{PlatformError, PlatformResult};
use crate::platform::{Channel, Guild, Member, Message, Platform, User};
use std::sync::Arc;

/// Everything a command knows about the message that invoked it.
///
/// One context is built per inbound message and handed to exactly one
/// handler; it is never shared between invocations.
pub struct CommandContext {
    /// Whether the message came from a private channel.
    pub is_private: bool,
    /// The original message.
    pub message: Message,
    /// The channel the message was posted in.
    pub channel: Channel,
    /// The guild, for guild channels.
    pub guild: Option<Guild>,
    /// The message author.
    pub author: User,
    /// The author's guild membership, for guild channels.
    pub member: Option<Member>,
    /// Residual text: the addressing prefix and command path removed.
    pub content: String,
    /// The resolved command path, words joined by single spaces.
    pub path: String,
    /// Parsed arguments, when the command was bound to a usage template.
    pub params: Option<ParsedArgs>,
    platform: Arc<dyn Platform>,
    commands: Arc<CommandNode>,
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("is_private", &self.is_private)
            .field("channel", &self.channel)
            .field("author", &self.author)
            .field("content", &self.content)
            .field("path", &self.path)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl CommandContext {
    /// Build a context for a message in an already known channel.
    ///
    /// Guild and member are left empty; see [`with_guild`](Self::with_guild).
    pub fn new(
        platform: Arc<dyn Platform>,
        commands: Arc<CommandNode>,
        message: Message,
        channel: Channel,
    ) -> Self {
        Self {
            is_private: channel.is_private,
            author: message.author.clone(),
            content: message.content.clone(),
            message,
            channel,
            guild: None,
            member: None,
            path: String::new(),
            params: None,
            platform,
            commands,
        }
    }

    /// Attach guild metadata.
    #[must_use]
    pub fn with_guild(mut self, guild: Guild, member: Member) -> Self {
        self.guild = Some(guild);
        self.member = Some(member);
        self
    }

    /// Resolve channel, guild and member metadata for `message`.
    ///
    /// Any failed lookup aborts context construction for this message.
    ///
    /// # Errors
    ///
    /// The platform error from the channel, guild or member lookup.
    pub async fn resolve(
        platform: Arc<dyn Platform>,
        commands: Arc<CommandNode>,
        message: Message,
    ) -> PlatformResult<Self> {
        let channel = platform.channel(&message.channel_id).await?;
        if channel.is_private {
            return Ok(Self::new(platform, commands, message, channel));
        }

        let guild_id = channel
            .guild_id
            .clone()
            .ok_or_else(|| PlatformError::not_found("guild", format!("for channel {channel}")))?;
        let guild = platform.guild(&guild_id).await?;
        let member = platform.guild_member(&guild.id, &message.author.id).await?;

        Ok(Self::new(platform, commands, message, channel).with_guild(guild, member))
    }

    /// The platform client.
    #[must_use]
    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    /// A shared handle to the platform client.
    #[must_use]
    pub fn platform_handle(&self) -> Arc<dyn Platform> {
        Arc::clone(&self.platform)
    }

    /// The root of the command tree.
    #[must_use]
    pub fn commands(&self) -> &CommandNode {
        &self.commands
    }

    /// Markup for a custom guild emoji, or `alternative` when the guild has
    /// none by that name (or the message is private).
    #[must_use]
    pub fn emoji(&self, code: &str, alternative: &str) -> String {
        self.guild
            .as_ref()
            .filter(|_| !self.is_private)
            .and_then(|guild| guild.emoji_markup(code))
            .unwrap_or_else(|| alternative.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::platform::{Emoji, Guild, Member};
    use crate::testing;

    fn guild() -> Guild {
        Guild {
            id: "1".into(),
            name: "home".into(),
            emojis: vec![Emoji {
                id: "99".into(),
                name: "PartyParrot".into(),
            }],
        }
    }

    #[test]
    fn test_emoji_in_guild() {
        let ctx = testing::context("hi", false);
        let member = Member {
            user: ctx.author.clone(),
            nick: None,
        };
        let ctx = ctx.with_guild(guild(), member);
        assert_eq!(ctx.emoji("partyparrot", ":bird:"), "<:partyparrot:99>");
        assert_eq!(ctx.emoji("missing", ":x:"), ":x:");
    }

    #[test]
    fn test_emoji_private() {
        let ctx = testing::context("hi", true);
        assert_eq!(ctx.emoji("partyparrot", ":bird:"), ":bird:");
    }

    #[test]
    fn test_new_copies_message() {
        let ctx = testing::context("  ping  ", true);
        assert!(ctx.is_private);
        assert_eq!(ctx.content, "  ping  ");
        assert_eq!(ctx.author, ctx.message.author);
        assert!(ctx.params.is_none());
    }
}
