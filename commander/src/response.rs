//! Response payloads and the pipe that carries them.
//!
//! A running command owns a [`Responder`]; the dispatcher owns the matching
//! [`Responses`] stream and forwards every payload to the platform in the
//! order it was sent. The pipe closes when the responder is finished or
//! dropped, which is what ends an invocation.

use crate::error::{CommandError, CommandResult, PlatformResult};
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use tracing::warn;

/// How many payloads may be in flight before the handler waits for the
/// dispatcher to catch up.
const PIPE_CAPACITY: usize = 16;

/// A file to upload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown in the channel.
    pub filename: String,
    /// File contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment.
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("filename", &self.filename)
            .field("len", &self.data.len())
            .finish()
    }
}

/// A field inside an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field title.
    pub name: String,
    /// Field body.
    pub value: String,
    /// Render next to neighbouring inline fields.
    #[serde(default)]
    pub inline: bool,
}

/// Structured rich content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Title line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Main body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Link attached to the title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Accent colour as `0xRRGGBB`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// Named fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    /// Footer text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Embed {
    /// Create an empty embed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the title link.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the accent colour.
    #[must_use]
    pub const fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Set the footer.
    #[must_use]
    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// One payload emitted by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Plain text.
    Text(String),
    /// Rich embedded content.
    Embed(Embed),
    /// A file upload with an optional caption.
    File {
        /// The file.
        file: Attachment,
        /// Text sent alongside the file.
        caption: Option<String>,
    },
    /// A user-facing failure.
    Error {
        /// Short human explanation.
        message: String,
        /// Technical detail, shown in a code block.
        cause: Option<String>,
    },
}

impl Response {
    /// A plain text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// An embed response.
    #[must_use]
    pub const fn embed(embed: Embed) -> Self {
        Self::Embed(embed)
    }

    /// A file upload.
    pub fn file(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::File {
            file: Attachment::new(filename, data),
            caption: None,
        }
    }

    /// A file upload with a caption.
    pub fn file_with_message(
        filename: impl Into<String>,
        data: impl Into<Vec<u8>>,
        message: impl Into<String>,
    ) -> Self {
        Self::File {
            file: Attachment::new(filename, data),
            caption: Some(message.into()),
        }
    }

    /// An error response carrying the underlying cause.
    pub fn error(cause: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }

    /// An error response without technical detail.
    pub fn error_message(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            cause: None,
        }
    }

    /// The text a plain-text send would carry, if this payload is sent as
    /// text.
    #[must_use]
    pub fn render_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Error {
                message,
                cause: Some(cause),
            } => Some(format!("{message}\n```{cause}```")),
            Self::Error {
                message,
                cause: None,
            } => Some(message.clone()),
            Self::Embed(_) | Self::File { .. } => None,
        }
    }

    /// Forward this payload to a channel.
    ///
    /// # Errors
    ///
    /// The platform error from the send.
    pub async fn deliver(&self, platform: &dyn Platform, channel_id: &str) -> PlatformResult<()> {
        match self {
            Self::Embed(embed) => platform.send_embed(channel_id, embed).await,
            Self::File {
                file,
                caption: Some(caption),
            } if !caption.is_empty() => {
                platform
                    .send_file_with_message(channel_id, caption, file)
                    .await
            }
            Self::File { file, .. } => platform.send_file(channel_id, file).await,
            Self::Text(_) | Self::Error { .. } => {
                let text = self.render_text().unwrap_or_default();
                platform.send_message(channel_id, &text).await
            }
        }
    }
}

/// Create a fresh response pipe for one invocation.
#[must_use]
pub fn pipe() -> (Responder, Responses) {
    let (tx, rx) = mpsc::channel(PIPE_CAPACITY);
    (
        Responder {
            tx,
            finished: false,
        },
        Responses { rx },
    )
}

/// The sending half of a response pipe, owned by the running command.
///
/// Calling [`finish`](Self::finish) closes the pipe and ends the invocation.
/// Dropping the responder closes it too, but logs a warning since the
/// command never said it was done.
#[derive(Debug)]
pub struct Responder {
    tx: mpsc::Sender<Response>,
    finished: bool,
}

impl Responder {
    /// Emit a payload. Waits while the dispatcher is behind.
    ///
    /// # Errors
    ///
    /// [`CommandError::PipeClosed`] once the receiving side is gone.
    pub async fn send(&self, response: Response) -> CommandResult<()> {
        self.tx
            .send(response)
            .await
            .map_err(|_| CommandError::PipeClosed)
    }

    /// Emit a plain text payload.
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub async fn text(&self, text: impl Into<String>) -> CommandResult<()> {
        self.send(Response::text(text)).await
    }

    /// Emit an error payload.
    ///
    /// # Errors
    ///
    /// As for [`send`](Self::send).
    pub async fn error(&self, cause: impl fmt::Display, message: impl Into<String>) -> CommandResult<()> {
        self.send(Response::error(cause, message)).await
    }

    /// Signal that no more payloads follow.
    pub fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if !self.finished {
            warn!("command returned without finishing its responses; closing pipe");
        }
    }
}

/// The receiving half of a response pipe, drained by the dispatcher.
#[derive(Debug)]
pub struct Responses {
    rx: mpsc::Receiver<Response>,
}

impl Responses {
    /// Next payload, or `None` once the command is done.
    pub async fn next(&mut self) -> Option<Response> {
        self.rx.recv().await
    }
}
