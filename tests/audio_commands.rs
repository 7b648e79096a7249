//! Integration tests for guild audio driven through chat commands.

mod common;

use common::*;
use opbot::audio::{LoadResult, PlayerState};
use opbot::dispatch::DispatchOutcome;

const PLAYLIST: &str = "https://www.youtube.com/playlist?list=PL0123456789";

async fn run(bot: &TestBot, author: opbot_proto::UserId, content: &str) -> String {
    let outcome = bot.say(author, content).await;
    assert!(
        matches!(outcome, DispatchOutcome::Executed(_)),
        "{content}: {outcome:?}"
    );
    bot.client.last_sent().unwrap_or_default()
}

fn joined_bot() -> TestBot {
    let bot = TestBot::new();
    bot.client.put_in_voice(GUILD, ALICE, VOICE);
    bot
}

#[tokio::test]
async fn join_follows_the_caller() {
    let bot = TestBot::new();

    assert_eq!(
        run(&bot, ALICE, "!join").await,
        "You need to be in a voice channel first."
    );

    bot.client.put_in_voice(GUILD, ALICE, VOICE);
    assert_eq!(run(&bot, ALICE, "!join").await, "Joined <#300>.");
    assert!(bot.client.actions().contains(&Action::Connected {
        guild: GUILD,
        channel: VOICE
    }));

    // Joining the same channel again is silent.
    bot.client.clear();
    run(&bot, ALICE, "!join").await;
    assert!(bot.client.actions().is_empty());
}

#[tokio::test]
async fn playing_needs_a_voice_connection() {
    let bot = joined_bot();
    bot.loader.search("song", &["song"]);

    assert_eq!(
        run(&bot, ALICE, "!yt song").await,
        "I'm not in a voice channel. Use `join` first."
    );
    assert!(bot.playback.started().is_empty());
}

#[tokio::test]
async fn search_plays_first_result_then_queues() {
    let bot = joined_bot();
    run(&bot, ALICE, "!join").await;
    bot.loader.search("first", &["first", "ignored"]);
    bot.loader.search("second", &["second"]);

    assert_eq!(
        run(&bot, ALICE, "!youtube first").await,
        "Now playing **first** by artist."
    );
    assert_eq!(
        run(&bot, ALICE, "!yt second").await,
        "Added **1** track to the queue."
    );
    assert_eq!(bot.playback.started(), vec!["first"]);

    let snapshot = bot.audio.get(GUILD).unwrap().snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlayerState::Playing);
    assert_eq!(snapshot.queue.len(), 1);
    assert_eq!(snapshot.queue[0].requester(), Some(ALICE));
}

#[tokio::test]
async fn playlist_links_are_expanded() {
    let bot = joined_bot();
    run(&bot, ALICE, "!join").await;
    bot.loader.script(
        PLAYLIST,
        LoadResult::Playlist {
            name: "mix".into(),
            tracks: vec![track("a"), track("b"), track("c")],
            selected: None,
            is_search: false,
        },
    );

    assert_eq!(
        run(&bot, ALICE, &format!("!yt {PLAYLIST}")).await,
        "Now playing **a** by artist. Added **2** more tracks to the queue."
    );

    let listing = run(&bot, BOB, "!queue").await;
    assert_eq!(listing, "**Queue**\n1. **b** (03:20)\n2. **c** (03:20)");
}

#[tokio::test]
async fn nothing_found_is_reported() {
    let bot = joined_bot();
    run(&bot, ALICE, "!join").await;

    assert_eq!(
        run(&bot, ALICE, "!yt silence").await,
        "No results found for **silence**."
    );
}

#[tokio::test]
async fn finished_tracks_advance_but_stop_does_not() {
    let bot = joined_bot();
    run(&bot, ALICE, "!join").await;
    bot.loader.script(
        PLAYLIST,
        LoadResult::Playlist {
            name: "mix".into(),
            tracks: vec![track("a"), track("b"), track("c"), track("d")],
            selected: None,
            is_search: false,
        },
    );
    run(&bot, ALICE, &format!("!yt {PLAYLIST}")).await;

    bot.playback.finish_current().await;
    let handle = bot.audio.get(GUILD).unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.current.unwrap().track.title(), "b");
    assert_eq!(bot.playback.started(), vec!["a", "b"]);

    assert_eq!(run(&bot, ALICE, "!skip").await, "Now playing **c** by artist.");

    assert_eq!(run(&bot, ALICE, "!stop").await, "Stopped **c** by artist.");
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlayerState::Connected);
    assert_eq!(snapshot.queue.len(), 1);
    assert_eq!(bot.playback.started(), vec!["a", "b", "c"]);

    assert_eq!(run(&bot, ALICE, "!clear").await, "Queue has been cleared!");
    assert_eq!(run(&bot, ALICE, "!next").await, "The queue is empty.");
}

#[tokio::test]
async fn now_playing_shows_track_and_queue() {
    let bot = joined_bot();
    run(&bot, ALICE, "!join").await;

    assert_eq!(
        run(&bot, ALICE, "!np").await,
        "No tracks are currently playing."
    );

    bot.loader.search("solo", &["solo"]);
    run(&bot, ALICE, "!yt solo").await;
    let reply = run(&bot, ALICE, "!nowplaying").await;
    assert!(reply.contains("**solo** (03:20)"), "{reply}");
    assert!(reply.contains("/03:20\n**Up Next**\nNo tracks left."), "{reply}");
    assert!(reply.ends_with("0 tracks left in the queue"), "{reply}");
}

#[tokio::test]
async fn leave_disconnects_and_keeps_queue() {
    let bot = joined_bot();
    run(&bot, ALICE, "!join").await;
    bot.loader.script(
        PLAYLIST,
        LoadResult::Playlist {
            name: "mix".into(),
            tracks: vec![track("a"), track("b")],
            selected: None,
            is_search: false,
        },
    );
    run(&bot, ALICE, &format!("!yt {PLAYLIST}")).await;

    assert_eq!(run(&bot, ALICE, "!leave").await, "Left the voice channel.");
    assert!(bot.client.actions().contains(&Action::Disconnected { guild: GUILD }));
    assert_eq!(bot.playback.stop_count(), 1);

    let snapshot = bot.audio.get(GUILD).unwrap().snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlayerState::Idle);
    assert_eq!(snapshot.queue.len(), 1);

    // Leaving again does nothing.
    bot.client.clear();
    run(&bot, ALICE, "!leave").await;
    assert!(bot.client.actions().is_empty());
}

#[tokio::test]
async fn guilds_get_independent_sessions() {
    let bot = joined_bot();
    run(&bot, ALICE, "!join").await;

    let other = opbot_proto::GuildId::new(101);
    assert!(bot.audio.get(other).is_none());
    let handle = bot.audio.get_or_create(other);
    assert_eq!(handle.snapshot().await.unwrap().state, PlayerState::Idle);
    assert_eq!(bot.audio.session_count(), 2);

    bot.audio.shutdown().await;
    assert_eq!(bot.audio.session_count(), 0);
    assert!(bot.audio.get(GUILD).is_none());
}
