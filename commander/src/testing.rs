//! Test doubles shared by the unit tests.

use crate::command::CommandNode;
use crate::context::CommandContext;
use crate::error::{PlatformError, PlatformResult};
use crate::platform::{Channel, Guild, Member, Message, Platform, User};
use crate::response::{Attachment, Embed};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A platform that knows one guild channel (`"10"` in guild `"1"`) and
/// accepts every send.
#[derive(Debug, Default)]
pub struct NullPlatform;

#[async_trait]
impl Platform for NullPlatform {
    async fn current_user(&self) -> PlatformResult<User> {
        Ok(User::new("1000", "bot"))
    }

    async fn channel(&self, id: &str) -> PlatformResult<Channel> {
        match id {
            "10" => Ok(Channel::guild("10", "general", "1")),
            _ => Err(PlatformError::not_found("channel", id)),
        }
    }

    async fn guild(&self, id: &str) -> PlatformResult<Guild> {
        Err(PlatformError::not_found("guild", id))
    }

    async fn guild_member(&self, _guild_id: &str, user_id: &str) -> PlatformResult<Member> {
        Err(PlatformError::not_found("member", user_id))
    }

    async fn send_message(&self, _channel_id: &str, _content: &str) -> PlatformResult<()> {
        Ok(())
    }

    async fn send_embed(&self, _channel_id: &str, _embed: &Embed) -> PlatformResult<()> {
        Ok(())
    }

    async fn send_file(&self, _channel_id: &str, _file: &Attachment) -> PlatformResult<()> {
        Ok(())
    }

    async fn send_file_with_message(
        &self,
        _channel_id: &str,
        _content: &str,
        _file: &Attachment,
    ) -> PlatformResult<()> {
        Ok(())
    }

    async fn typing(&self, _channel_id: &str) -> PlatformResult<()> {
        Ok(())
    }

    async fn subscribe(&self) -> PlatformResult<mpsc::Receiver<Message>> {
        Err(PlatformError::EventStream)
    }
}

/// A context for `content` posted by user `"2"`, in a private channel or in
/// the guild channel `"10"`.
pub fn context(content: &str, private: bool) -> CommandContext {
    context_with(content, private, Arc::new(CommandNode::new()))
}

/// Like [`context`], with a specific command tree.
pub fn context_with(content: &str, private: bool, commands: Arc<CommandNode>) -> CommandContext {
    let channel = if private {
        Channel::private("20", "dm")
    } else {
        Channel::guild("10", "general", "1")
    };
    let message = Message::new("m1", channel.id.clone(), User::new("2", "alice"), content);
    CommandContext::new(Arc::new(NullPlatform), commands, message, channel)
}
