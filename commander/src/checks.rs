//! Deciding whether a message is addressed to the bot.
//!
//! A message is a command when it starts with a mention of the bot, or when
//! one of the registered [`CommandCheck`]s accepts it. Checks run in
//! registration order and the first one that matches supplies the text the
//! command tree is walked with.

use crate::context::CommandContext;
use regex::Regex;

/// A predicate that recognises messages addressed to the bot.
///
/// Returns the residual text (addressing prefix removed) when the message is
/// a command, `None` otherwise. Implemented for plain closures:
///
/// ```rust,ignore
/// commander.add_command_check(|ctx: &CommandContext| {
///     ctx.content.strip_prefix("bot,").map(|rest| rest.trim().to_string())
/// })?;
/// ```
pub trait CommandCheck: Send + Sync {
    /// Check one message.
    fn check(&self, ctx: &CommandContext) -> Option<String>;
}

impl<F> CommandCheck for F
where
    F: Fn(&CommandContext) -> Option<String> + Send + Sync,
{
    fn check(&self, ctx: &CommandContext) -> Option<String> {
        self(ctx)
    }
}

/// Accept messages starting with `prefix`, e.g. `"!"`.
pub fn prefix(prefix: impl Into<String>) -> impl CommandCheck {
    let prefix = prefix.into();
    move |ctx: &CommandContext| {
        ctx.content
            .strip_prefix(prefix.as_str())
            .map(|rest| rest.trim().to_string())
    }
}

/// Accept every message sent in a private channel.
#[must_use]
pub fn direct_messages() -> impl CommandCheck {
    |ctx: &CommandContext| ctx.is_private.then(|| ctx.content.trim().to_string())
}

/// Matches a leading mention of the bot (`<@ID>` or `<@!ID>`).
#[derive(Debug, Clone)]
pub struct Mention {
    pattern: Regex,
}

impl Mention {
    /// Build the matcher for the user `user_id`.
    ///
    /// # Errors
    ///
    /// Only if the escaped pattern fails to compile.
    pub fn new(user_id: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!("^<@!?{}>", regex::escape(user_id)))?;
        Ok(Self { pattern })
    }

    /// Whether `content` starts with the mention.
    #[must_use]
    pub fn matches(&self, content: &str) -> bool {
        self.pattern.is_match(content)
    }

    /// The content after the mention, trimmed, if it starts with one.
    #[must_use]
    pub fn strip(&self, content: &str) -> Option<String> {
        self.pattern
            .find(content)
            .map(|m| content[m.end()..].trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_mention_forms() {
        let mention = Mention::new("1000").unwrap();
        assert_eq!(mention.strip("<@1000> ping").as_deref(), Some("ping"));
        assert_eq!(mention.strip("<@!1000>   help  me ").as_deref(), Some("help  me"));
        assert_eq!(mention.strip("<@1000>").as_deref(), Some(""));
        assert!(mention.strip("hey <@1000> ping").is_none());
        assert!(!mention.matches("<@10000> ping"));
        assert!(!mention.matches("<@100> ping"));
    }

    #[test]
    fn test_mention_escapes_id() {
        let mention = Mention::new("a.b").unwrap();
        assert!(mention.matches("<@a.b> x"));
        assert!(!mention.matches("<@axb> x"));
    }

    #[test]
    fn test_prefix_check() {
        let check = prefix("!");
        assert_eq!(
            check.check(&testing::context("!ping  now", false)).as_deref(),
            Some("ping  now")
        );
        assert!(check.check(&testing::context("ping", false)).is_none());
    }

    #[test]
    fn test_direct_messages_check() {
        let check = direct_messages();
        assert_eq!(
            check.check(&testing::context(" ping ", true)).as_deref(),
            Some("ping")
        );
        assert!(check.check(&testing::context("ping", false)).is_none());
    }

    #[test]
    fn test_closure_check() {
        let check = |ctx: &CommandContext| (ctx.content == "yes").then(String::new);
        assert_eq!(check.check(&testing::context("yes", true)).as_deref(), Some(""));
        assert!(check.check(&testing::context("no", true)).is_none());
    }
}
