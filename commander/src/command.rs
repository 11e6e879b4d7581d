//! The command tree.
//!
//! Every [`CommandNode`] may carry a handler, child nodes keyed by a literal
//! word, or both. Resolution walks the tree from the root, consuming one
//! leading word per level for as long as an exact child match exists.

use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult};
use crate::response::{self, Responder};
use crate::util::panic_message;
use async_trait::async_trait;
use futures::FutureExt;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, trace, warn};

/// Implementation of a command.
///
/// A handler receives the invocation context and the sending half of the
/// response pipe. It emits zero or more payloads and then calls
/// [`Responder::finish`]. The handler runs on its own task; the dispatcher
/// forwards payloads while it runs.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command.
    async fn handle(&self, ctx: CommandContext, responder: Responder);
}

/// Adapter that turns an async closure into a [`CommandHandler`].
#[derive(Debug, Clone, Copy)]
pub struct FnHandler<F>(F);

/// Wrap an async closure as a command handler.
///
/// ```rust,ignore
/// node.set_handler(handler_fn(|_ctx, res| async move {
///     let _ = res.text("pong").await;
///     res.finish();
/// }));
/// ```
pub const fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(CommandContext, Responder) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(CommandContext, Responder) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn handle(&self, ctx: CommandContext, responder: Responder) {
        (self.0)(ctx, responder).await;
    }
}

/// A node in the command tree.
#[derive(Default)]
pub struct CommandNode {
    pub(crate) description: String,
    pub(crate) usage: String,
    pub(crate) handler: Option<Arc<dyn CommandHandler>>,
    children: BTreeMap<String, CommandNode>,
}

impl std::fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandNode")
            .field("description", &self.description)
            .field("usage", &self.usage)
            .field("invocable", &self.handler.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Result of walking the tree for one message.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// The deepest node reached.
    pub node: &'a CommandNode,
    /// Tokens consumed on the way, in order.
    pub path: Vec<&'a str>,
    /// Text left after the consumed tokens.
    pub rest: &'a str,
}

impl CommandNode {
    /// Create an empty node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a child under `token` and return it for configuration.
    ///
    /// Tokens are matched literally against the first word of the remaining
    /// message, so they must be non-empty and contain no whitespace. A token
    /// can only be registered once; use [`child_mut`](Self::child_mut) to
    /// extend an existing child.
    ///
    /// # Errors
    ///
    /// [`CommandError::InvalidToken`] for an empty or spaced token, and
    /// [`CommandError::Duplicate`] if the token is taken.
    pub fn command(&mut self, token: &str) -> CommandResult<&mut Self> {
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(CommandError::InvalidToken(token.to_string()));
        }
        if self.children.contains_key(token) {
            return Err(CommandError::Duplicate(token.to_string()));
        }
        Ok(self.insert(token, Self::new()))
    }

    pub(crate) fn insert(&mut self, token: &str, node: Self) -> &mut Self {
        self.children.entry(token.to_string()).or_insert(node)
    }

    /// The child registered under `token`.
    #[must_use]
    pub fn child(&self, token: &str) -> Option<&Self> {
        self.children.get(token)
    }

    /// Mutable access to the child registered under `token`.
    pub fn child_mut(&mut self, token: &str) -> Option<&mut Self> {
        self.children.get_mut(token)
    }

    /// Direct children in lexicographic token order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = (&str, &Self)> {
        self.children.iter().map(|(token, node)| (token.as_str(), node))
    }

    /// Whether the node has child commands.
    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether the node can be invoked directly.
    #[must_use]
    pub fn is_invocable(&self) -> bool {
        self.handler.is_some()
    }

    /// Free-text description; the first line is used in summaries.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared argument template.
    #[must_use]
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Set the description.
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    /// Set the usage shown in help output.
    pub fn set_usage(&mut self, usage: impl Into<String>) -> &mut Self {
        self.usage = usage.into();
        self
    }

    /// Attach a handler that receives the raw residual text.
    pub fn set_handler(&mut self, handler: impl CommandHandler + 'static) -> &mut Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Follow `path` exactly, one child per token.
    #[must_use]
    pub fn find(&self, path: &[&str]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |node, token| node.children.get(*token))
    }

    /// Walk the tree greedily along the leading words of `content`.
    ///
    /// The walk stops at the first word without an exact child match and
    /// never backtracks.
    #[must_use]
    pub fn resolve<'a>(&'a self, content: &'a str) -> Resolution<'a> {
        let mut node = self;
        let mut path = Vec::new();
        let mut rest = content.trim();

        while let Some(word) = rest.split_whitespace().next() {
            let Some(child) = node.children.get(word) else {
                break;
            };
            node = child;
            path.push(word);
            rest = rest[word.len()..].trim();
        }

        Resolution { node, path, rest }
    }

    /// Invoke this node's handler and forward its responses.
    ///
    /// The handler runs on its own task. Payloads are delivered to the
    /// context's channel in emission order; the call returns once the
    /// response pipe is closed. Delivery failures are logged and do not stop
    /// the drain.
    ///
    /// # Errors
    ///
    /// [`CommandError::NoHandler`] if the node cannot be invoked.
    pub async fn call(&self, ctx: CommandContext) -> CommandResult<()> {
        let handler = self
            .handler
            .clone()
            .ok_or_else(|| CommandError::no_handler(ctx.path.clone()))?;

        let platform = ctx.platform_handle();
        let channel_id = ctx.channel.id.clone();
        let path = ctx.path.clone();
        let (responder, mut responses) = response::pipe();

        let task_path = path.clone();
        tokio::spawn(async move {
            if let Err(panic) = AssertUnwindSafe(handler.handle(ctx, responder))
                .catch_unwind()
                .await
            {
                error!(
                    command = %task_path,
                    panic = %panic_message(panic.as_ref()),
                    "command handler panicked"
                );
            }
        });

        while let Some(response) = responses.next().await {
            trace!(command = %path, channel = %channel_id, "forwarding response");
            if let Err(e) = response.deliver(platform.as_ref(), &channel_id).await {
                warn!(command = %path, channel = %channel_id, error = %e, "failed to deliver response");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> impl CommandHandler {
        handler_fn(|_ctx, res: Responder| async move { res.finish() })
    }

    fn tree() -> CommandNode {
        let mut root = CommandNode::new();
        let a = root.command("a").unwrap();
        a.command("b").unwrap().set_handler(noop());
        root.command("ping").unwrap().set_handler(noop());
        root
    }

    #[test]
    fn test_register_rejects_bad_tokens() {
        let mut root = CommandNode::new();
        assert!(matches!(root.command(""), Err(CommandError::InvalidToken(_))));
        assert!(matches!(
            root.command("two words"),
            Err(CommandError::InvalidToken(_))
        ));
        assert!(matches!(root.command("tab\there"), Err(CommandError::InvalidToken(_))));
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut root = CommandNode::new();
        root.command("ping").unwrap().set_description("first");
        assert!(matches!(root.command("ping"), Err(CommandError::Duplicate(_))));
        assert_eq!(root.child("ping").unwrap().description(), "first");

        root.child_mut("ping").unwrap().command("sub").unwrap();
        assert!(root.find(&["ping", "sub"]).is_some());
    }

    #[test]
    fn test_resolve_exact_path() {
        let root = tree();
        let res = root.resolve("a b  some  args ");
        assert_eq!(res.path, ["a", "b"]);
        assert_eq!(res.rest, "some  args");
        assert!(res.node.is_invocable());
    }

    #[test]
    fn test_resolve_stops_at_first_miss() {
        let root = tree();
        let res = root.resolve("a c");
        assert_eq!(res.path, ["a"]);
        assert_eq!(res.rest, "c");
        assert!(!res.node.is_invocable());
    }

    #[test]
    fn test_resolve_no_partial_tokens() {
        let root = tree();
        let res = root.resolve("pingpong");
        assert!(res.path.is_empty());
        assert_eq!(res.rest, "pingpong");

        let res = root.resolve("Ping");
        assert!(res.path.is_empty());
    }

    #[test]
    fn test_children_sorted() {
        let mut root = CommandNode::new();
        for token in ["b", "a", "c"] {
            root.command(token).unwrap();
        }
        let tokens: Vec<_> = root.children().map(|(t, _)| t).collect();
        assert_eq!(tokens, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_call_without_handler() {
        let root = tree();
        let mut ctx = crate::testing::context("", true);
        ctx.path = "a".into();
        let err = root.child("a").unwrap().call(ctx).await.unwrap_err();
        assert!(matches!(err, CommandError::NoHandler(path) if path == "a"));
    }

    #[tokio::test]
    async fn test_call_drains_until_finished() {
        let mut node = CommandNode::new();
        node.set_handler(handler_fn(|_ctx, res: Responder| async move {
            let _ = res.text("one").await;
            let _ = res.text("two").await;
            res.finish();
        }));
        assert!(node.call(crate::testing::context("", true)).await.is_ok());
    }

    #[test]
    fn test_find() {
        let root = tree();
        assert!(root.find(&[]).is_some());
        assert!(root.find(&["a", "b"]).unwrap().is_invocable());
        assert!(root.find(&["a", "x"]).is_none());
    }
}
