//! Platform client boundary.
//!
//! The commander never talks to a chat network directly. Everything it needs
//! from the outside world (identity lookups, outbound sends and the inbound
//! message stream) goes through the [`Platform`] trait, so the same command
//! tree can run against a real chat service, the console, or a test double.

use crate::error::PlatformResult;
use crate::response::{Attachment, Embed};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// A platform user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: String,
    /// Display name.
    pub username: String,
    /// Discriminator shown after the name.
    #[serde(default)]
    pub discriminator: String,
    /// Whether the account is a bot.
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Create a user with an empty discriminator.
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            discriminator: String::new(),
            bot: false,
        }
    }

    /// The mention markup that addresses this user.
    #[must_use]
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.discriminator.is_empty() {
            write!(f, "{} ({})", self.username, self.id)
        } else {
            write!(f, "{}#{} ({})", self.username, self.discriminator, self.id)
        }
    }
}

/// A text channel, either inside a guild or a private conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Unique channel identifier.
    pub id: String,
    /// Channel name.
    pub name: String,
    /// Owning guild, `None` for private channels.
    pub guild_id: Option<String>,
    /// Whether this is a direct-message channel.
    pub is_private: bool,
}

impl Channel {
    /// Create a guild text channel.
    pub fn guild(
        id: impl Into<String>,
        name: impl Into<String>,
        guild_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guild_id: Some(guild_id.into()),
            is_private: false,
        }
    }

    /// Create a private channel.
    pub fn private(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guild_id: None,
            is_private: true,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.id)
    }
}

/// A custom guild emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    /// Emoji identifier.
    pub id: String,
    /// Emoji name as typed between colons.
    pub name: String,
}

/// A guild (server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    /// Unique guild identifier.
    pub id: String,
    /// Guild name.
    pub name: String,
    /// Custom emojis available in the guild.
    #[serde(default)]
    pub emojis: Vec<Emoji>,
}

impl Guild {
    /// Markup for the custom emoji named `code` (case-insensitive).
    #[must_use]
    pub fn emoji_markup(&self, code: &str) -> Option<String> {
        let code = code.to_lowercase();
        self.emojis
            .iter()
            .find(|emoji| emoji.name.to_lowercase() == code)
            .map(|emoji| format!("<:{code}:{}>", emoji.id))
    }
}

impl fmt::Display for Guild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.id)
    }
}

/// A user's membership in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// The member's account.
    pub user: User,
    /// Guild-specific nickname.
    pub nick: Option<String>,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.user, self.nick.as_deref().unwrap_or_default())
    }
}

/// An inbound message-create event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: String,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Author of the message.
    pub author: User,
    /// Raw text content.
    pub content: String,
}

impl Message {
    /// Create a new message.
    pub fn new(
        id: impl Into<String>,
        channel_id: impl Into<String>,
        author: User,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            channel_id: channel_id.into(),
            author,
            content: content.into(),
        }
    }
}

/// Client for a chat platform.
///
/// Implementations own the network session. The commander resolves the bot
/// identity once, subscribes to the message stream once, and from then on
/// only performs lookups and channel-scoped sends.
#[async_trait]
pub trait Platform: Send + Sync {
    /// The account the client is logged in as.
    async fn current_user(&self) -> PlatformResult<User>;

    /// Look up a channel by id.
    async fn channel(&self, id: &str) -> PlatformResult<Channel>;

    /// Look up a guild by id.
    async fn guild(&self, id: &str) -> PlatformResult<Guild>;

    /// Look up a user's membership in a guild.
    async fn guild_member(&self, guild_id: &str, user_id: &str) -> PlatformResult<Member>;

    /// Send a plain text message.
    async fn send_message(&self, channel_id: &str, content: &str) -> PlatformResult<()>;

    /// Send a rich embed.
    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> PlatformResult<()>;

    /// Upload a file.
    async fn send_file(&self, channel_id: &str, file: &Attachment) -> PlatformResult<()>;

    /// Upload a file with a caption.
    async fn send_file_with_message(
        &self,
        channel_id: &str,
        content: &str,
        file: &Attachment,
    ) -> PlatformResult<()>;

    /// Show the typing indicator in a channel.
    async fn typing(&self, channel_id: &str) -> PlatformResult<()>;

    /// Take the stream of message-create events.
    ///
    /// Called once per connection; the stream ends when the session closes.
    async fn subscribe(&self) -> PlatformResult<mpsc::Receiver<Message>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        let mut user = User::new("42", "alice");
        assert_eq!(user.to_string(), "alice (42)");
        user.discriminator = "0001".into();
        assert_eq!(user.to_string(), "alice#0001 (42)");
        assert_eq!(user.mention(), "<@42>");

        let channel = Channel::guild("7", "general", "1");
        assert_eq!(channel.to_string(), "general <7>");
        assert!(!channel.is_private);

        let member = Member {
            user,
            nick: Some("al".into()),
        };
        assert_eq!(member.to_string(), "alice#0001 (42) (al)");
    }

    #[test]
    fn test_emoji_markup() {
        let guild = Guild {
            id: "1".into(),
            name: "home".into(),
            emojis: vec![Emoji {
                id: "5".into(),
                name: "Wave".into(),
            }],
        };
        assert_eq!(guild.emoji_markup("WAVE").as_deref(), Some("<:wave:5>"));
        assert!(guild.emoji_markup("nope").is_none());
    }

    #[test]
    fn test_private_channel() {
        let channel = Channel::private("9", "dm");
        assert!(channel.is_private);
        assert!(channel.guild_id.is_none());
    }
}
