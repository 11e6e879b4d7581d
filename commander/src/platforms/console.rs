//! Console platform.
//!
//! Runs a bot in the terminal: every line read from stdin becomes a message
//! from the console user in a single private channel, and everything the bot
//! sends is written to stdout.

use crate::error::{PlatformError, PlatformResult};
use crate::platform::{Channel, Guild, Member, Message, Platform, User};
use crate::response::{Attachment, Embed};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

const BOT_ID: &str = "1";
const USER_ID: &str = "2";
const CHANNEL_ID: &str = "100";

/// Inbound queue depth.
const EVENT_CAPACITY: usize = 32;

/// Console platform configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Name the bot answers under.
    pub bot_name: String,
    /// Name of the person typing.
    pub user: String,
    /// Name of the console channel.
    pub channel: String,
    /// Prompt printed before each input line.
    pub prompt: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bot_name: "commander".to_string(),
            user: "you".to_string(),
            channel: "console".to_string(),
            prompt: "> ".to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Create a default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bot name.
    #[must_use]
    pub fn bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = name.into();
        self
    }

    /// Set the user name.
    #[must_use]
    pub fn user(mut self, name: impl Into<String>) -> Self {
        self.user = name.into();
        self
    }

    /// Set the prompt.
    #[must_use]
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

/// A [`Platform`] over stdin and stdout.
///
/// ```rust,ignore
/// let platform = Arc::new(ConsolePlatform::new(ConsoleConfig::default()));
/// commander.connect(platform).await?;
/// ```
pub struct ConsolePlatform {
    config: ConsoleConfig,
    out: Mutex<Box<dyn Write + Send>>,
    subscribed: AtomicBool,
}

impl std::fmt::Debug for ConsolePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsolePlatform")
            .field("config", &self.config)
            .field("subscribed", &self.subscribed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ConsolePlatform {
    /// Create a console platform writing to stdout.
    #[must_use]
    pub fn new(config: ConsoleConfig) -> Self {
        Self::with_writer(config, io::stdout())
    }

    /// Create a console platform writing to `out`.
    pub fn with_writer(config: ConsoleConfig, out: impl Write + Send + 'static) -> Self {
        Self {
            config,
            out: Mutex::new(Box::new(out)),
            subscribed: AtomicBool::new(false),
        }
    }

    /// The account typing into the console.
    #[must_use]
    pub fn console_user(&self) -> User {
        User::new(USER_ID, &self.config.user)
    }

    /// The single console channel.
    #[must_use]
    pub fn console_channel(&self) -> Channel {
        Channel::private(CHANNEL_ID, &self.config.channel)
    }

    fn write(&self, text: &str) -> PlatformResult<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| PlatformError::send("console writer poisoned"))?;
        writeln!(out, "{}: {text}", self.config.bot_name)?;
        out.flush()?;
        Ok(())
    }

    fn check_channel(channel_id: &str) -> PlatformResult<()> {
        if channel_id == CHANNEL_ID {
            Ok(())
        } else {
            Err(PlatformError::not_found("channel", channel_id))
        }
    }
}

/// Plain-text rendering of an embed.
#[must_use]
pub fn render_embed(embed: &Embed) -> String {
    let mut lines = Vec::new();
    if let Some(title) = &embed.title {
        lines.push(format!("== {title} =="));
    }
    if let Some(url) = &embed.url {
        lines.push(url.clone());
    }
    if let Some(description) = &embed.description {
        lines.push(description.clone());
    }
    for field in &embed.fields {
        lines.push(format!("{}: {}", field.name, field.value));
    }
    if let Some(footer) = &embed.footer {
        lines.push(format!("-- {footer}"));
    }
    lines.join("\n")
}

fn file_marker(file: &Attachment) -> String {
    format!("[file {}, {} bytes]", file.filename, file.data.len())
}

#[async_trait]
impl Platform for ConsolePlatform {
    async fn current_user(&self) -> PlatformResult<User> {
        let mut me = User::new(BOT_ID, &self.config.bot_name);
        me.bot = true;
        Ok(me)
    }

    async fn channel(&self, id: &str) -> PlatformResult<Channel> {
        Self::check_channel(id)?;
        Ok(self.console_channel())
    }

    async fn guild(&self, id: &str) -> PlatformResult<Guild> {
        Err(PlatformError::not_found("guild", id))
    }

    async fn guild_member(&self, _guild_id: &str, user_id: &str) -> PlatformResult<Member> {
        Err(PlatformError::not_found("member", user_id))
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> PlatformResult<()> {
        Self::check_channel(channel_id)?;
        self.write(content)
    }

    async fn send_embed(&self, channel_id: &str, embed: &Embed) -> PlatformResult<()> {
        Self::check_channel(channel_id)?;
        self.write(&render_embed(embed))
    }

    async fn send_file(&self, channel_id: &str, file: &Attachment) -> PlatformResult<()> {
        Self::check_channel(channel_id)?;
        self.write(&file_marker(file))
    }

    async fn send_file_with_message(
        &self,
        channel_id: &str,
        content: &str,
        file: &Attachment,
    ) -> PlatformResult<()> {
        Self::check_channel(channel_id)?;
        self.write(&format!("{content}\n{}", file_marker(file)))
    }

    async fn typing(&self, channel_id: &str) -> PlatformResult<()> {
        trace!(channel = %channel_id, "typing");
        Ok(())
    }

    async fn subscribe(&self) -> PlatformResult<mpsc::Receiver<Message>> {
        if self.subscribed.swap(true, Ordering::SeqCst) {
            return Err(PlatformError::EventStream);
        }
        self.spawn_reader(|| io::stdin().lock())
    }
}

impl ConsolePlatform {
    /// Start the input thread over the reader built by `input`.
    ///
    /// The thread is detached. It blocks on input and outlives the runtime
    /// until the next line arrives or input ends.
    fn spawn_reader<R, F>(&self, input: F) -> PlatformResult<mpsc::Receiver<Message>>
    where
        R: BufRead,
        F: FnOnce() -> R + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        let user = self.console_user();
        let prompt = self.config.prompt.clone();

        thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || read_lines(input(), &tx, &user, &prompt))?;

        Ok(rx)
    }
}

fn read_lines(input: impl BufRead, tx: &mpsc::Sender<Message>, user: &User, prompt: &str) {
    let mut next_id = 0_u64;
    show_prompt(prompt);

    for line in input.lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();
        if matches!(trimmed, "exit" | "quit") {
            break;
        }
        if !trimmed.is_empty() {
            next_id += 1;
            let message = Message::new(next_id.to_string(), CHANNEL_ID, user.clone(), trimmed);
            if tx.blocking_send(message).is_err() {
                debug!("console reader stopping, receiver dropped");
                return;
            }
        }
        show_prompt(prompt);
    }
    info!("console input closed");
}

fn show_prompt(prompt: &str) {
    let mut out = io::stdout().lock();
    let _ = write!(out, "{prompt}");
    let _ = out.flush();
}
