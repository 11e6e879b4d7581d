//! Binding handlers to usage templates.

use crate::args::{Parameter, ParameterMap, Parser};
use crate::command::{CommandHandler, CommandNode};
use crate::context::CommandContext;
use crate::error::ArgsResult;
use crate::response::{Responder, Response};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A handler that only runs once its arguments parse.
struct BoundHandler {
    parser: Arc<Parser>,
    inner: Arc<dyn CommandHandler>,
}

#[async_trait]
impl CommandHandler for BoundHandler {
    async fn handle(&self, mut ctx: CommandContext, responder: Responder) {
        let platform = ctx.platform_handle();
        match self.parser.parse(&ctx.content, platform.as_ref()).await {
            Ok(args) => {
                ctx.params = Some(args);
                self.inner.handle(ctx, responder).await;
            }
            Err(e) => {
                debug!(command = %ctx.path, error = %e, "argument parsing failed");
                let message = format!(
                    "failed to parse command, make sure to use the expected format of `{}`",
                    self.parser.usage()
                );
                if let Err(e) = responder.send(Response::error(e, message)).await {
                    debug!(command = %ctx.path, error = %e, "parse error reply dropped");
                }
                responder.finish();
            }
        }
    }
}

impl CommandNode {
    /// Attach `handler` behind a usage template.
    ///
    /// The template is compiled against the built-in types, the `channel`
    /// type and `parameters`; a `channel` entry in `parameters` is replaced.
    /// On invocation the residual text is parsed first: on success the
    /// handler sees the result in [`CommandContext::params`], on failure a
    /// single error response quoting the usage is sent and the handler is
    /// not called.
    ///
    /// # Errors
    ///
    /// The compile error if `usage` is malformed or names an unknown type.
    /// The node is left unchanged.
    pub fn bind(
        &mut self,
        usage: &str,
        handler: impl CommandHandler + 'static,
        mut parameters: ParameterMap,
    ) -> ArgsResult<Arc<Parser>> {
        parameters.insert("channel".to_string(), Parameter::channel());
        let parser = Arc::new(Parser::compile(usage, parameters)?);

        self.set_usage(parser.usage());
        self.set_handler(BoundHandler {
            parser: Arc::clone(&parser),
            inner: Arc::new(handler),
        });
        Ok(parser)
    }
}
