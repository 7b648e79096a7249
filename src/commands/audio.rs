//! Guild audio commands.
//!
//! Every command here is guild-only. Playing requires the bot to be in a
//! voice channel already; `join` puts it in the caller's.

use super::format;
use crate::audio::{
    AudioHandle, AudioRegistry, AudioSearchSelection, JoinOutcome, OfferOutcome, PlayerState,
    QueryKind, SelectionOutcome,
};
use crate::command::{Command, CommandMetadata, Context, PermissionPolicy};
use crate::error::{CommandError, CommandResult};
use async_trait::async_trait;
use opbot_proto::{GuildId, ReactionEmoji, emoji};
use std::sync::Arc;
use tracing::{debug, warn};

/// Queue entries listed by `queue` and `nowplaying`.
const QUEUE_PREVIEW: usize = 10;

const NOT_CONNECTED: &str = "I'm not in a voice channel. Use `join` first.";

fn guild_of(ctx: &Context) -> Result<GuildId, CommandError> {
    ctx.guild_id().ok_or(CommandError::GuildOnly)
}

fn audio_metadata(id: &str, description: &str) -> CommandMetadata {
    CommandMetadata::new(id)
        .description(description)
        .permissions(PermissionPolicy::guild_only())
}

/// Session for the caller's guild if the bot is in voice there.
async fn connected_session(
    audio: &AudioRegistry,
    guild: GuildId,
) -> Result<Option<AudioHandle>, CommandError> {
    let Some(handle) = audio.get(guild) else {
        return Ok(None);
    };
    let snapshot = handle.snapshot().await?;
    Ok((snapshot.state != PlayerState::Idle).then_some(handle))
}

fn describe_offer(outcome: &OfferOutcome) -> String {
    match (&outcome.started, outcome.queued) {
        (Some(track), 0) => format!("Now playing {track}."),
        (Some(track), queued) => {
            format!("Now playing {track}. Added **{queued}** more tracks to the queue.")
        }
        (None, 1) => "Added **1** track to the queue.".to_owned(),
        (None, queued) => format!("Added **{queued}** tracks to the queue."),
    }
}

pub struct Join {
    pub audio: Arc<AudioRegistry>,
}

#[async_trait]
impl Command for Join {
    fn metadata(&self) -> CommandMetadata {
        audio_metadata(
            "join",
            "Makes the bot join the voice channel that the calling user is in.",
        )
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = guild_of(ctx)?;
        let Some(channel) = self.audio.voice().voice_channel_of(guild, ctx.user.id).await? else {
            ctx.reply("You need to be in a voice channel first.").await?;
            return Ok(());
        };
        match self.audio.get_or_create(guild).join(channel).await? {
            JoinOutcome::Joined(channel) => {
                ctx.reply(format!("Joined <#{channel}>.")).await?;
            }
            JoinOutcome::AlreadyConnected(_) => debug!("Already in the caller's voice channel"),
        }
        Ok(())
    }
}

pub struct Leave {
    pub audio: Arc<AudioRegistry>,
}

#[async_trait]
impl Command for Leave {
    fn metadata(&self) -> CommandMetadata {
        audio_metadata("leave", "Makes the bot leave the voice channel if it is in one.")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = guild_of(ctx)?;
        if let Some(handle) = self.audio.get(guild)
            && handle.leave().await?
        {
            ctx.reply("Left the voice channel.").await?;
        }
        Ok(())
    }
}

pub struct Youtube {
    pub audio: Arc<AudioRegistry>,
}

#[async_trait]
impl Command for Youtube {
    fn metadata(&self) -> CommandMetadata {
        audio_metadata(
            "youtube",
            "Searches on YouTube and plays the first search result, or plays a specified youtube link.",
        )
        .aliases(["youtube", "yt"])
        .usage("%A <query> | %A <youtube URL>")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = guild_of(ctx)?;
        let Some(query) = ctx.arguments() else {
            return Err(CommandError::InvalidArgument("missing query".into()));
        };
        let Some(handle) = connected_session(&self.audio, guild).await? else {
            ctx.reply(NOT_CONNECTED).await?;
            return Ok(());
        };

        let expand = self.audio.query(query).kind == QueryKind::PlaylistLink;
        let tracks: Vec<_> = self
            .audio
            .load(query, expand)
            .await
            .into_iter()
            .map(|t| t.requested_by(ctx.user.id))
            .collect();
        if tracks.is_empty() {
            ctx.reply(format!("No results found for **{query}**.")).await?;
            return Ok(());
        }

        let outcome = handle.offer(tracks).await?;
        ctx.reply(describe_offer(&outcome)).await?;
        Ok(())
    }
}

/// Offers search results and lets the caller pick one by reaction.
pub struct YoutubeSearch {
    pub audio: Arc<AudioRegistry>,
}

#[async_trait]
impl Command for YoutubeSearch {
    fn metadata(&self) -> CommandMetadata {
        audio_metadata(
            "youtube_search",
            "Searches on YouTube and lets you pick one of the results by reacting with its number.",
        )
        .aliases(["youtube_search", "yts"])
        .usage("%A <query>")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = guild_of(ctx)?;
        let Some(query) = ctx.arguments() else {
            return Err(CommandError::InvalidArgument("missing query".into()));
        };
        let Some(handle) = connected_session(&self.audio, guild).await? else {
            ctx.reply(NOT_CONNECTED).await?;
            return Ok(());
        };

        let mut tracks = self.audio.load(query, true).await;
        tracks.truncate(self.audio.max_search_results());
        if tracks.is_empty() {
            ctx.reply(format!("No results found for **{query}**.")).await?;
            return Ok(());
        }

        let listing = format!(
            "**Search results for {query}**\n{}\nReact with a number to pick a track.",
            format::numbered(&tracks)
        );
        let channel = ctx.channel_id();
        let message = ctx.reply(listing).await?;
        let count = tracks.len();
        let waiter = self
            .audio
            .selections()
            .open(message, AudioSearchSelection::new(ctx.user.id, tracks));

        for digit in emoji::DIGITS.iter().take(count) {
            ctx.client
                .add_reaction(channel, message, &ReactionEmoji::unicode(*digit))
                .await?;
        }

        match waiter.wait().await {
            SelectionOutcome::Selected { index, track } => {
                if let Err(e) = ctx.client.remove_all_reactions(channel, message).await {
                    warn!(error = %e, "Could not clear selection reactions");
                }
                if let Some(digit) = emoji::digit(index) {
                    ctx.client
                        .add_reaction(channel, message, &ReactionEmoji::unicode(digit))
                        .await?;
                }
                let outcome = handle.offer(vec![track.requested_by(ctx.user.id)]).await?;
                ctx.reply(describe_offer(&outcome)).await?;
            }
            SelectionOutcome::TimedOut => {
                if let Err(e) = ctx.client.remove_all_reactions(channel, message).await {
                    warn!(error = %e, "Could not clear selection reactions");
                }
                ctx.client
                    .add_reaction(channel, message, &ReactionEmoji::unicode(emoji::TIMER))
                    .await?;
            }
        }
        Ok(())
    }
}

pub struct Next {
    pub audio: Arc<AudioRegistry>,
}

#[async_trait]
impl Command for Next {
    fn metadata(&self) -> CommandMetadata {
        audio_metadata("next", "Plays the next audio track if one exists.").aliases(["next", "skip"])
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = guild_of(ctx)?;
        let Some(handle) = connected_session(&self.audio, guild).await? else {
            return Ok(());
        };
        match handle.next().await? {
            Some(track) => ctx.reply(format!("Now playing {track}.")).await?,
            None => ctx.reply("The queue is empty.").await?,
        };
        Ok(())
    }
}

pub struct Shuffle {
    pub audio: Arc<AudioRegistry>,
}

#[async_trait]
impl Command for Shuffle {
    fn metadata(&self) -> CommandMetadata {
        audio_metadata("shuffle", "Shuffles all enqueued audio tracks.")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = guild_of(ctx)?;
        let Some(handle) = connected_session(&self.audio, guild).await? else {
            return Ok(());
        };
        let queued = handle.shuffle().await?;
        ctx.reply(format!("Shuffled **{queued}** tracks.")).await?;
        Ok(())
    }
}

pub struct Clear {
    pub audio: Arc<AudioRegistry>,
}

#[async_trait]
impl Command for Clear {
    fn metadata(&self) -> CommandMetadata {
        audio_metadata("clear", "Clears the current audio queue.")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = guild_of(ctx)?;
        let Some(handle) = self.audio.get(guild) else {
            return Ok(());
        };
        if handle.clear_queue().await? > 0 {
            ctx.reply("Queue has been cleared!").await?;
        }
        Ok(())
    }
}

pub struct Stop {
    pub audio: Arc<AudioRegistry>,
}

#[async_trait]
impl Command for Stop {
    fn metadata(&self) -> CommandMetadata {
        audio_metadata("stop", "Stops the current track without advancing the queue.")
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = guild_of(ctx)?;
        let Some(handle) = self.audio.get(guild) else {
            return Ok(());
        };
        if let Some(track) = handle.stop().await? {
            ctx.reply(format!("Stopped {track}.")).await?;
        }
        Ok(())
    }
}

pub struct NowPlaying {
    pub audio: Arc<AudioRegistry>,
}

#[async_trait]
impl Command for NowPlaying {
    fn metadata(&self) -> CommandMetadata {
        audio_metadata("nowplaying", "Prints the current audio track being played by the bot.")
            .aliases(["nowplaying", "np", "playing"])
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = guild_of(ctx)?;
        let Some(handle) = connected_session(&self.audio, guild).await? else {
            return Ok(());
        };
        let snapshot = handle.snapshot().await?;
        let Some(now) = snapshot.current else {
            ctx.reply("No tracks are currently playing.").await?;
            return Ok(());
        };

        let up_next = if snapshot.queue.is_empty() {
            "No tracks left.".to_owned()
        } else {
            let shown = snapshot.queue.len().min(QUEUE_PREVIEW);
            format::numbered(&snapshot.queue[..shown])
        };
        ctx.reply(format!(
            "{} {}\n{}/{}\n**Up Next**\n{}\n{} tracks left in the queue",
            emoji::ARROW_FORWARD,
            format::track_line(&now.track),
            format::clock(now.position),
            format::clock(now.track.length()),
            up_next,
            snapshot.queue.len()
        ))
        .await?;
        Ok(())
    }
}

pub struct Queue {
    pub audio: Arc<AudioRegistry>,
}

#[async_trait]
impl Command for Queue {
    fn metadata(&self) -> CommandMetadata {
        audio_metadata("queue", "Lists the tracks waiting in the queue.").aliases(["queue", "q"])
    }

    async fn execute(&self, ctx: &Context) -> CommandResult {
        let guild = guild_of(ctx)?;
        let Some(handle) = self.audio.get(guild) else {
            ctx.reply("The queue is empty.").await?;
            return Ok(());
        };
        let queue = handle.snapshot().await?.queue;
        if queue.is_empty() {
            ctx.reply("The queue is empty.").await?;
            return Ok(());
        }

        let shown = queue.len().min(QUEUE_PREVIEW);
        let mut listing = format!("**Queue**\n{}", format::numbered(&queue[..shown]));
        if queue.len() > shown {
            listing.push_str(&format!("\n...and {} more", queue.len() - shown));
        }
        ctx.reply(listing).await?;
        Ok(())
    }
}
