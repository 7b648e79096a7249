//! The per-message dispatch pipeline.
//!
//! validate message -> strip invocation -> resolve -> build context ->
//! validate context -> rate limit -> execute
//!
//! Every step runs in order for one event. Any rejection before execution
//! drops the event silently; handler errors and panics are logged and
//! counted but never escape the pipeline.

use super::rate_limit::{RateLimitManager, RateLimitScope};
use super::validation::{
    ContextValidator, MessageValidator, check_context, check_message, context_validators,
    message_validators,
};
use crate::command::{Command, CommandTree, Context, NodeId};
use crate::error::Abort;
use crate::platform::ChatClient;
use crate::prefix::PrefixStore;
use crate::telemetry::{CommandTimer, spans};
use futures_util::FutureExt;
use opbot_proto::{Arguments, MessageEvent, UserId, mention};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{Instrument, debug, error, warn};

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran and returned `Ok`.
    Executed(NodeId),
    /// The handler ran and failed or panicked.
    Failed(NodeId),
    /// Dropped before any handler ran.
    Aborted(Abort),
}

/// Text left after the invocation marker.
struct Invocation {
    args: Arguments,
    via_mention: bool,
}

/// Routes messages to command handlers.
pub struct CommandProcessor {
    tree: Arc<CommandTree>,
    client: Arc<dyn ChatClient>,
    prefixes: Arc<dyn PrefixStore>,
    rate_limits: Arc<RateLimitManager>,
    message_validators: Vec<Arc<dyn MessageValidator>>,
    context_validators: Vec<Arc<dyn ContextValidator>>,
    owner: OnceCell<UserId>,
}

impl CommandProcessor {
    /// Processor with the default validator chains.
    pub fn new(
        tree: Arc<CommandTree>,
        client: Arc<dyn ChatClient>,
        prefixes: Arc<dyn PrefixStore>,
        rate_limits: Arc<RateLimitManager>,
    ) -> Self {
        Self {
            tree,
            client,
            prefixes,
            rate_limits,
            message_validators: message_validators(),
            context_validators: context_validators(),
            owner: OnceCell::new(),
        }
    }

    /// Use `owner` instead of asking the platform for the application owner.
    pub fn with_owner(self, owner: Option<UserId>) -> Self {
        let owner = match owner {
            Some(id) => OnceCell::new_with(Some(id)),
            None => OnceCell::new(),
        };
        Self { owner, ..self }
    }

    pub fn tree(&self) -> &Arc<CommandTree> {
        &self.tree
    }

    pub fn rate_limits(&self) -> &Arc<RateLimitManager> {
        &self.rate_limits
    }

    /// Process `event` on its own task.
    pub fn spawn_message(self: &Arc<Self>, event: MessageEvent) {
        let processor = Arc::clone(self);
        tokio::spawn(async move {
            processor.process_message(event).await;
        });
    }

    /// Run the full pipeline for one message.
    pub async fn process_message(&self, event: MessageEvent) -> DispatchOutcome {
        let span = spans::message(event.id, event.channel_id, event.guild_id);
        let outcome = self.dispatch(event).instrument(span).await;
        if let DispatchOutcome::Aborted(abort) = &outcome {
            crate::metrics::record_abort(abort.reason());
        }
        outcome
    }

    async fn dispatch(&self, event: MessageEvent) -> DispatchOutcome {
        if let Err(name) = check_message(&self.message_validators, &event).await {
            return DispatchOutcome::Aborted(Abort::InvalidMessage(name));
        }
        let Some(user) = event.author.clone() else {
            return DispatchOutcome::Aborted(Abort::InvalidMessage("source"));
        };

        let prefix = self.prefixes.prefix(event.guild_id);
        let Some(invocation) = self.strip_invocation(&event.content, &prefix) else {
            return DispatchOutcome::Aborted(Abort::NoInvocation);
        };

        let Some(resolved) = self.tree.resolve(&invocation.args) else {
            debug!(alias = invocation.args.alias(), "No command matched");
            return DispatchOutcome::Aborted(Abort::Unresolved);
        };
        let node_id = resolved.id;
        let handler = Arc::clone(&resolved.node.handler);
        let command = Arc::clone(&resolved.node.properties);

        let guild = match event.guild_id {
            Some(guild_id) => match self.client.guild(guild_id).await {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!(guild = %guild_id, error = %e, "Guild lookup failed");
                    return DispatchOutcome::Aborted(Abort::Rejected("guild_lookup"));
                }
            },
            None => None,
        };

        let was_bot_mentioned =
            invocation.via_mention || event.mentions_user(self.client.current_user());
        let ctx = Context {
            is_bot_owner: self.is_bot_owner(user.id).await,
            is_direct_message: event.is_direct(),
            was_bot_mentioned,
            guild,
            user,
            args: resolved.args,
            path: resolved.path,
            command,
            prefix,
            client: Arc::clone(&self.client),
            tree: Arc::clone(&self.tree),
            message: event,
        };

        if let Err(name) = check_context(&self.context_validators, &ctx).await {
            debug!(command = %ctx.command.id, validator = name, "Invocation rejected");
            return DispatchOutcome::Aborted(Abort::Rejected(name));
        }

        let scope = RateLimitScope::for_invocation(&ctx.command.rate_limits, ctx.guild_id(), ctx.user.id);
        if !self.rate_limits.is_allowed(node_id, &ctx.command.rate_limits, scope) {
            crate::metrics::record_rate_limited();
            return DispatchOutcome::Aborted(Abort::RateLimited);
        }

        let span = spans::command(&ctx.command.id, ctx.alias(), ctx.user.id);
        self.execute(node_id, handler, ctx).instrument(span).await
    }

    async fn execute(
        &self,
        node_id: NodeId,
        handler: Arc<dyn Command>,
        ctx: Context,
    ) -> DispatchOutcome {
        let command_id = ctx.command.id.clone();
        let timer = CommandTimer::new(command_id.clone());
        let result = AssertUnwindSafe(handler.execute(&ctx)).catch_unwind().await;
        drop(timer);

        let outcome = match result {
            Ok(Ok(())) => {
                debug!("Command completed");
                DispatchOutcome::Executed(node_id)
            }
            Ok(Err(e)) => {
                warn!(error = %e, code = e.error_code(), "Command failed");
                crate::metrics::record_command_error(&command_id, e.error_code());
                DispatchOutcome::Failed(node_id)
            }
            Err(_) => {
                error!("Command panicked");
                crate::metrics::record_command_error(&command_id, "panic");
                DispatchOutcome::Failed(node_id)
            }
        };

        if ctx.command.permissions.remove_invocation
            && ctx.guild.is_some()
            && let Err(e) = self.client.delete_message(ctx.channel_id(), ctx.message.id).await
        {
            debug!(error = %e, "Could not remove invocation message");
        }
        outcome
    }

    /// Strip a leading self-mention or the prefix. The mention wins.
    fn strip_invocation(&self, content: &str, prefix: &str) -> Option<Invocation> {
        let content = content.trim_start();
        let head = Arguments::parse(Some(content));
        if mention::is_mention_of(head.alias(), self.client.current_user()) {
            return Some(Invocation {
                args: head.next(),
                via_mention: true,
            });
        }
        let rest = content.strip_prefix(prefix).filter(|_| !prefix.is_empty())?;
        Some(Invocation {
            args: Arguments::parse(Some(rest)),
            via_mention: false,
        })
    }

    async fn is_bot_owner(&self, user: UserId) -> bool {
        let owner = self
            .owner
            .get_or_try_init(|| self.client.application_owner())
            .await;
        match owner {
            Ok(owner) => *owner == user,
            Err(e) => {
                warn!(error = %e, "Application owner lookup failed");
                false
            }
        }
    }
}
