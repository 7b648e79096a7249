//! Command manual and listing.

use crate::command::{Command, CommandMetadata, CommandProperties, Context};
use crate::error::CommandResult;
use async_trait::async_trait;
use opbot_proto::mention::format_user_mention;

/// How a command path is typed in this context.
fn invocation_text(ctx: &Context, props: &CommandProperties, path: &str) -> String {
    if props.permissions.require_bot_mention {
        format!("{} `{path}`", format_user_mention(ctx.client.current_user()))
    } else {
        format!("`{}{path}`", ctx.prefix)
    }
}

fn policy_summary(props: &CommandProperties) -> String {
    let policy = &props.permissions;
    let mut lines = vec![policy.required.to_string()];
    for (flag, name) in [
        (policy.require_guild_owner, "requires guild owner"),
        (policy.require_bot_owner, "requires bot owner"),
        (policy.require_bot_mention, "requires bot mention"),
        (policy.require_direct_message, "direct messages only"),
        (!policy.allow_direct_message, "not available in direct messages"),
    ] {
        if flag {
            lines.push(name.to_owned());
        }
    }
    lines.join("\n")
}

pub struct Help;

#[async_trait]
impl Command for Help {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("help")
            .aliases(["help", "man"])
            .description("Displays the manual for a provided command alias.")
            .usage("%A <command alias>")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let query = ctx.args.next();
        if query.is_empty() {
            let usage = ctx.command.descriptor.usage_for(ctx.alias());
            ctx.reply(format!("Usage: `{}{usage}`", ctx.prefix)).await?;
            return Ok(());
        }
        let Some(found) = ctx.tree.resolve(&query) else {
            ctx.reply(format!("No command found for `{}`.", query.alias()))
                .await?;
            return Ok(());
        };

        let props = &found.node.properties;
        let path = found.path.join(" ");
        let invocation = invocation_text(ctx, props, &path);
        let sub_commands: Vec<String> = ctx
            .tree
            .children_of(found.id)
            .map(|child| {
                let alias = child.properties.primary_alias();
                format!("{alias}: {invocation} `{alias}` `...`")
            })
            .collect();

        let manual = format!(
            "**Command Manual**\n\
             **ID:** {}\n\
             **Aliases:** {}\n\
             **Permissions Required:** {}\n\
             **Description:** {}\n\
             **Usage:** {}\n\
             **Sub-commands:** {}",
            props.id,
            props.aliases.join(", "),
            policy_summary(props),
            props.descriptor.description,
            props.descriptor.usage_for(&invocation),
            if sub_commands.is_empty() {
                "N/A".to_owned()
            } else {
                format!("\n{}", sub_commands.join("\n"))
            }
        );
        ctx.reply(manual).await?;
        Ok(())
    }
}

/// Lists top-level commands the caller could run here.
pub struct AllCommands;

impl AllCommands {
    fn visible(ctx: &Context, props: &CommandProperties) -> bool {
        let policy = &props.permissions;
        (!ctx.is_direct_message || policy.allow_direct_message)
            && (!policy.require_bot_owner || ctx.is_bot_owner)
            && (ctx.guild.is_none() || !policy.require_guild_owner || ctx.is_guild_owner())
    }
}

#[async_trait]
impl Command for AllCommands {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("all")
            .aliases(["all", "commands"])
            .description("Displays all available top-level commands.")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let (mention_only, prefixed): (Vec<_>, Vec<_>) = ctx
            .tree
            .top_level()
            .map(|node| node.properties.as_ref())
            .filter(|props| Self::visible(ctx, props))
            .partition(|props| props.permissions.require_bot_mention);

        fn sorted_aliases<'a>(props: Vec<&'a CommandProperties>) -> Vec<&'a str> {
            let mut aliases: Vec<&str> = props
                .iter()
                .flat_map(|p| p.aliases.iter().map(String::as_str))
                .collect();
            aliases.sort_unstable();
            aliases
        }
        let prefixed = sorted_aliases(prefixed)
            .into_iter()
            .map(|a| format!("`{}{a}`", ctx.prefix))
            .collect::<Vec<_>>()
            .join(" ");
        let mention = format_user_mention(ctx.client.current_user());
        let mention_only = sorted_aliases(mention_only)
            .into_iter()
            .map(|a| format!("{mention} `{a}`"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut listing = format!("**List of all top-level commands**\n{prefixed}");
        if !mention_only.is_empty() {
            listing.push_str(&format!(
                "\n**Commands that require an `@` mention to the bot**\n{mention_only}"
            ));
        }
        if let Some(help) = ctx.tree.find_by_id("help") {
            let first = help.properties.primary_alias();
            listing.push_str(&format!(
                "\n**More information about a command**\n`{p}{first} <command alias>` e.g. `{p}{first} {first}`",
                p = ctx.prefix
            ));
        }
        ctx.reply(listing).await?;
        Ok(())
    }
}
