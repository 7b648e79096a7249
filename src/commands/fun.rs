use crate::command::{Command, CommandMetadata, Context};
use crate::error::CommandResult;
use async_trait::async_trait;
use opbot_proto::emoji;
use rand::Rng;
use rand::seq::SliceRandom;

const DEFAULT_ROLL_BOUND: u64 = 100;

/// Upper bound for `roll`; anything unparsable or zero falls back to 100.
fn roll_bound(arguments: Option<&str>) -> u64 {
    arguments
        .and_then(|a| a.split_whitespace().next())
        .and_then(|a| a.parse::<u64>().ok())
        .filter(|b| *b > 0)
        .unwrap_or(DEFAULT_ROLL_BOUND)
}

pub struct Roll;

#[async_trait]
impl Command for Roll {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("roll")
            .description(
                "Rolls a random number out of the provided bound (inclusive). \
                 Defaults to 100 if no bound is given.",
            )
            .usage("%A | %A <bound>")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let bound = roll_bound(ctx.arguments());
        let value = rand::thread_rng().gen_range(0..=bound);
        ctx.reply(value.to_string()).await?;
        Ok(())
    }
}

const ANSWERS: [&str; 20] = [
    "It is certain",
    "It is decidedly so",
    "Without a doubt",
    "Yes, definitely",
    "You may rely on it",
    "As I see it, yes",
    "Most likely",
    "Outlook good",
    "Yes",
    "Signs point to yes",
    "Reply hazy try again",
    "Ask again later",
    "Better not tell you now",
    "Cannot predict now",
    "Concentrate and ask again",
    "Don't count on it",
    "My reply is no",
    "My sources say no",
    "Outlook not so good",
    "Very doubtful",
];

pub struct EightBall;

#[async_trait]
impl Command for EightBall {
    fn metadata(&self) -> CommandMetadata {
        CommandMetadata::new("8ball")
            .description("The magic 8-ball sees all.")
            .usage("%A <question>")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        // No question, no answer.
        let Some(question) = ctx.arguments() else {
            return Ok(());
        };
        let answer = ANSWERS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(ANSWERS[0]);
        ctx.reply(format!(
            "**Question:** {question}\n{}**: {answer}**",
            emoji::EIGHT_BALL
        ))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roll_bound_fallbacks() {
        assert_eq!(roll_bound(None), 100);
        assert_eq!(roll_bound(Some("6")), 6);
        assert_eq!(roll_bound(Some("20 sided")), 20);
        assert_eq!(roll_bound(Some("0")), 100);
        assert_eq!(roll_bound(Some("-5")), 100);
        assert_eq!(roll_bound(Some("lots")), 100);
    }
}
