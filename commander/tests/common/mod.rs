//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use async_trait::async_trait;
use commander::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// The bot's own user id.
pub const BOT_ID: &str = "1000";
/// A guild text channel in guild `"1"`.
pub const GUILD_CHANNEL: &str = "10";
/// A private channel.
pub const DM_CHANNEL: &str = "20";
/// A guild channel whose guild cannot be resolved.
pub const BROKEN_CHANNEL: &str = "30";

/// One outbound platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { channel: String, content: String },
    Embed { channel: String, embed: Embed },
    File { channel: String, filename: String, caption: Option<String> },
    Typing { channel: String },
}

impl Sent {
    pub fn text(channel: &str, content: &str) -> Self {
        Self::Text {
            channel: channel.to_string(),
            content: content.to_string(),
        }
    }
}

/// A platform that serves fixed metadata and records every send in order.
pub struct RecordingPlatform {
    channels: HashMap<String, Channel>,
    guilds: HashMap<String, Guild>,
    sent: Mutex<Vec<Sent>>,
    events: Mutex<Option<mpsc::Receiver<Message>>>,
}

impl RecordingPlatform {
    /// A platform plus the sender feeding its message stream.
    pub fn new() -> (Arc<Self>, mpsc::Sender<Message>) {
        let (tx, rx) = mpsc::channel(16);
        let channels = [
            Channel::guild(GUILD_CHANNEL, "general", "1"),
            Channel::private(DM_CHANNEL, "dm"),
            Channel::guild(BROKEN_CHANNEL, "orphan", "404"),
        ]
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();
        let guilds = HashMap::from([(
            "1".to_string(),
            Guild {
                id: "1".into(),
                name: "home".into(),
                emojis: vec![Emoji {
                    id: "77".into(),
                    name: "Wave".into(),
                }],
            },
        )]);

        let platform = Arc::new(Self {
            channels,
            guilds,
            sent: Mutex::new(Vec::new()),
            events: Mutex::new(Some(rx)),
        });
        (platform, tx)
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Sends other than typing indicators.
    pub fn replies(&self) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| !matches!(s, Sent::Typing { .. }))
            .collect()
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn current_user(&self) -> PlatformResult<User> {
        let mut me = User::new(BOT_ID, "bot");
        me.bot = true;
        Ok(me)
    }

    async fn channel(&self, id: &str) -> PlatformResult<Channel> {
        self.channels
            .get(id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("channel", id))
    }

    async fn guild(&self, id: &str) -> PlatformResult<Guild> {
        self.guilds
            .get(id)
            .cloned()
            .ok_or_else(|| PlatformError::not_found("guild", id))
    }

    async fn guild_member(&self, _guild_id: &str, user_id: &str) -> PlatformResult<Member> {
        Ok(Member {
            user: User::new(user_id, "member"),
            nick: Some("nick".into()),
        })
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> PlatformResult<()> {
        self.record(Sent::text(channel_id, content));
        Ok(())
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> PlatformResult<()> {
        self.record(Sent::Embed {
            channel: channel_id.to_string(),
            embed: embed.clone(),
        });
        Ok(())
    }

    async fn send_file(&self, channel_id: &str, file: &Attachment) -> PlatformResult<()> {
        self.record(Sent::File {
            channel: channel_id.to_string(),
            filename: file.filename.clone(),
            caption: None,
        });
        Ok(())
    }

    async fn send_file_with_message(
        &self,
        channel_id: &str,
        content: &str,
        file: &Attachment,
    ) -> PlatformResult<()> {
        self.record(Sent::File {
            channel: channel_id.to_string(),
            filename: file.filename.clone(),
            caption: Some(content.to_string()),
        });
        Ok(())
    }

    async fn typing(&self, channel_id: &str) -> PlatformResult<()> {
        self.record(Sent::Typing {
            channel: channel_id.to_string(),
        });
        Ok(())
    }

    async fn subscribe(&self) -> PlatformResult<mpsc::Receiver<Message>> {
        self.events
            .lock()
            .unwrap()
            .take()
            .ok_or(PlatformError::EventStream)
    }
}

/// A message from user `"2"`.
pub fn message(channel: &str, content: &str) -> Message {
    Message::new("m1", channel, User::new("2", "alice"), content)
}

/// A handler that replies with fixed text.
pub fn reply(text: &'static str) -> impl CommandHandler {
    handler_fn(move |_ctx, res: Responder| async move {
        let _ = res.text(text).await;
        res.finish();
    })
}

/// A handler that echoes its residual content, prefixed with its path.
pub fn echo_path() -> impl CommandHandler {
    handler_fn(|ctx: CommandContext, res: Responder| async move {
        let _ = res.text(format!("{}|{}", ctx.path, ctx.content)).await;
        res.finish();
    })
}

/// A commander with `ping` and `echo`, connected to a fresh platform.
pub async fn connected() -> (Commander, Arc<RecordingPlatform>, mpsc::Sender<Message>) {
    let mut commander = Commander::new();
    commander
        .command("ping")
        .unwrap()
        .set_description("Check the bot is alive")
        .set_handler(reply("pong"));
    commander
        .command("echo")
        .unwrap()
        .set_description("Repeat a message\nEverything after the command is sent back.")
        .set_handler(echo_path());

    let (platform, tx) = connect(&mut commander).await;
    (commander, platform, tx)
}

/// Connect `commander` to a fresh platform.
pub async fn connect(commander: &mut Commander) -> (Arc<RecordingPlatform>, mpsc::Sender<Message>) {
    let (platform, tx) = RecordingPlatform::new();
    let handle: Arc<dyn Platform> = platform.clone();
    commander.connect(handle).await.unwrap();
    (platform, tx)
}
