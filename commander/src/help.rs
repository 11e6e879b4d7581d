//! The built-in `help` command.
//!
//! `help a b` shows the usage and description of the command at `a b`
//! followed by a one-line summary of each direct child:
//!
//! ```text
//! `a b <target:channel>`
//! Do b things.
//!
//! **Available nested Commands**
//! *(call help and the subcommand for details)*
//! ├ `a b c`: First line of c
//! └ `a b d`: First line of d
//! ```

use crate::command::{CommandHandler, CommandNode};
use crate::context::CommandContext;
use crate::response::{Responder, Response};
use async_trait::async_trait;
use tracing::debug;

const NESTED_HEADER: &str =
    "\n\n**Available nested Commands**\n*(call help and the subcommand for details)*";
const BRANCH: &str = "├";
const LAST_BRANCH: &str = "└";

/// The node registered under `help` on every commander.
pub(crate) fn command() -> CommandNode {
    let mut node = CommandNode::new();
    node.set_description("Search for help for a specific command")
        .set_usage("[command...]")
        .set_handler(HelpCommand);
    node
}

/// Looks up a command path and renders its help text.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelpCommand;

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn handle(&self, ctx: CommandContext, responder: Responder) {
        let path: Vec<&str> = ctx.content.split_whitespace().collect();
        let response = match ctx.commands().find(&path) {
            Some(node) => Response::text(render(&path.join(" "), node)),
            None => Response::error_message("Command not found..."),
        };
        if let Err(e) = responder.send(response).await {
            debug!(error = %e, "help reply dropped");
        }
        responder.finish();
    }
}

/// Help text for `node`, reached via `path`.
#[must_use]
pub fn render(path: &str, node: &CommandNode) -> String {
    let mut out = String::new();
    if node.is_invocable() {
        out.push_str(&format!("`{}`\n", command_line(path, node.usage())));
    }
    out.push_str(node.description());
    out.push_str(&render_subcommands(path, node));
    out
}

/// The nested-commands section for `node`, empty without children.
#[must_use]
pub fn render_subcommands(path: &str, node: &CommandNode) -> String {
    if !node.has_children() {
        return String::new();
    }

    let last = node.children().len() - 1;
    let mut out = String::from(NESTED_HEADER);
    for (i, (token, child)) in node.children().enumerate() {
        let glyph = if i == last { LAST_BRANCH } else { BRANCH };
        let summary = child.description().lines().next().unwrap_or_default();
        out.push_str(&format!(
            "\n{glyph} `{}`: {summary}",
            command_line(path, token)
        ));
    }
    out
}

fn command_line(path: &str, tail: &str) -> String {
    [path, tail]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::handler_fn;
    use crate::response;
    use crate::testing;
    use std::sync::Arc;

    fn noop() -> impl CommandHandler {
        handler_fn(|_ctx, res: Responder| async move { res.finish() })
    }

    fn tree() -> CommandNode {
        let mut root = CommandNode::new();
        root.insert("help", command());
        let a = root.command("a").unwrap();
        a.set_description("Group a\nmore detail");
        for token in ["c", "b", "d"] {
            a.command(token)
                .unwrap()
                .set_description(format!("Does {token}\nignored"))
                .set_handler(noop());
        }
        root.command("echo")
            .unwrap()
            .set_description("Repeat text")
            .set_usage("<text...>")
            .set_handler(noop());
        root
    }

    async fn ask(content: &str) -> Vec<Response> {
        let ctx = testing::context_with(content, true, Arc::new(tree()));
        let (responder, mut responses) = response::pipe();
        tokio::spawn(async move { HelpCommand.handle(ctx, responder).await });
        let mut out = Vec::new();
        while let Some(res) = responses.next().await {
            out.push(res);
        }
        out
    }

    #[test]
    fn test_leaf_without_children() {
        let root = tree();
        let text = render("echo", root.child("echo").unwrap());
        assert_eq!(text, "`echo <text...>`\nRepeat text");
        assert!(!text.contains("Available nested Commands"));
    }

    #[test]
    fn test_children_sorted_with_last_glyph() {
        let root = tree();
        let text = render("a", root.child("a").unwrap());
        assert_eq!(
            text,
            "Group a\nmore detail\n\n**Available nested Commands**\n\
             *(call help and the subcommand for details)*\n\
             ├ `a b`: Does b\n├ `a c`: Does c\n└ `a d`: Does d"
        );
    }

    #[test]
    fn test_single_child_uses_last_glyph() {
        let mut node = CommandNode::new();
        node.command("only").unwrap().set_description("One");
        let text = render_subcommands("x", &node);
        assert!(text.ends_with("\n└ `x only`: One"));
        assert!(!text.contains(BRANCH));
    }

    #[tokio::test]
    async fn test_help_root_lists_top_level() {
        let out = ask("").await;
        assert_eq!(out.len(), 1);
        let text = out[0].render_text().unwrap();
        assert!(text.contains("├ `a`: Group a\n├ `echo`: Repeat text\n└ `help`: Search for help"));
    }

    #[tokio::test]
    async fn test_help_nested_path() {
        let out = ask("a  b").await;
        assert_eq!(out, vec![Response::text("`a b`\nDoes b\nignored")]);
    }

    #[tokio::test]
    async fn test_help_not_found() {
        let out = ask("a x").await;
        assert_eq!(out, vec![Response::error_message("Command not found...")]);
    }

    #[tokio::test]
    async fn test_help_with_closed_pipe() {
        let ctx = testing::context_with("a", true, Arc::new(tree()));
        let (responder, responses) = response::pipe();
        drop(responses);
        HelpCommand.handle(ctx, responder).await;
    }

    #[test]
    fn test_command_line() {
        assert_eq!(command_line("", "help"), "help");
        assert_eq!(command_line("a b", ""), "a b");
        assert_eq!(command_line("a", "<n:int>"), "a <n:int>");
    }
}
