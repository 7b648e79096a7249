//! Per-guild audio session actor.
//!
//! Each guild's player, queue and voice connection are owned by one task.
//! Commands reach it over an mpsc channel and get answers back on oneshot
//! channels, so two commands for the same guild never interleave.
//!
//! States: `Idle` (no voice, nothing playing), `Connected` (voice joined,
//! player idle) and `Playing`.

use super::playback::{PlaybackBackend, TrackEndReason};
use super::track::AudioTrack;
use crate::error::AudioError;
use crate::platform::{VoiceConnection, VoiceGateway};
use opbot_proto::{ChannelId, GuildId};
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Capacity of each session's command channel.
const SESSION_CHANNEL_CAPACITY: usize = 64;

/// Observable player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Connected,
    Playing,
}

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(ChannelId),
    AlreadyConnected(ChannelId),
}

/// Result of offering tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferOutcome {
    /// Track started immediately because nothing was playing.
    pub started: Option<AudioTrack>,
    /// Tracks appended to the queue.
    pub queued: usize,
}

/// The currently playing track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub track: AudioTrack,
    pub position: Duration,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: PlayerState,
    pub channel: Option<ChannelId>,
    pub current: Option<NowPlaying>,
    pub queue: Vec<AudioTrack>,
}

pub(crate) enum SessionCommand {
    Join {
        channel_id: ChannelId,
        reply: oneshot::Sender<Result<JoinOutcome, AudioError>>,
    },
    Leave {
        reply: oneshot::Sender<bool>,
    },
    Offer {
        tracks: Vec<AudioTrack>,
        reply: oneshot::Sender<OfferOutcome>,
    },
    Next {
        reply: oneshot::Sender<Option<AudioTrack>>,
    },
    Shuffle {
        reply: oneshot::Sender<usize>,
    },
    ClearQueue {
        reply: oneshot::Sender<usize>,
    },
    Stop {
        reply: oneshot::Sender<Option<AudioTrack>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    TrackEnded {
        play_id: u64,
        reason: TrackEndReason,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Reports the end of one started track back to its session.
///
/// Holds only a weak sender: a pending end notification never keeps a
/// finished session alive.
#[derive(Clone)]
pub struct TrackEventSink {
    guild_id: GuildId,
    play_id: u64,
    tx: mpsc::WeakSender<SessionCommand>,
}

impl TrackEventSink {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub async fn ended(&self, reason: TrackEndReason) {
        let Some(tx) = self.tx.upgrade() else {
            return;
        };
        let event = SessionCommand::TrackEnded {
            play_id: self.play_id,
            reason,
        };
        if tx.send(event).await.is_err() {
            debug!(guild = %self.guild_id, "Track ended after session shut down");
        }
    }
}

struct Current {
    track: AudioTrack,
    play_id: u64,
    started_at: Instant,
}

/// State owned by a guild's session task.
pub struct AudioSession {
    guild_id: GuildId,
    connection: Option<VoiceConnection>,
    current: Option<Current>,
    queue: VecDeque<AudioTrack>,
    next_play_id: u64,
    voice: Arc<dyn VoiceGateway>,
    playback: Arc<dyn PlaybackBackend>,
    events: mpsc::WeakSender<SessionCommand>,
}

impl AudioSession {
    /// Spawn the session task for `guild_id`.
    pub fn spawn(
        guild_id: GuildId,
        voice: Arc<dyn VoiceGateway>,
        playback: Arc<dyn PlaybackBackend>,
    ) -> AudioHandle {
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let session = AudioSession {
            guild_id,
            connection: None,
            current: None,
            queue: VecDeque::new(),
            next_play_id: 0,
            voice,
            playback,
            events: tx.downgrade(),
        };
        tokio::spawn(session.run(rx));
        crate::metrics::inc_audio_sessions();
        AudioHandle { guild_id, tx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<SessionCommand>) {
        debug!(guild = %self.guild_id, "Audio session started");
        while let Some(command) = rx.recv().await {
            if !self.handle(command).await {
                break;
            }
        }
        crate::metrics::dec_audio_sessions();
        debug!(guild = %self.guild_id, "Audio session stopped");
    }

    /// Returns `false` once the session should exit.
    async fn handle(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Join { channel_id, reply } => {
                let _ = reply.send(self.join(channel_id).await);
            }
            SessionCommand::Leave { reply } => {
                let _ = reply.send(self.leave().await);
            }
            SessionCommand::Offer { tracks, reply } => {
                let _ = reply.send(self.offer(tracks).await);
            }
            SessionCommand::Next { reply } => {
                let _ = reply.send(self.play_next().await);
            }
            SessionCommand::Shuffle { reply } => {
                self.queue.make_contiguous().shuffle(&mut rand::thread_rng());
                let _ = reply.send(self.queue.len());
            }
            SessionCommand::ClearQueue { reply } => {
                let cleared = self.queue.len();
                self.queue.clear();
                let _ = reply.send(cleared);
            }
            SessionCommand::Stop { reply } => {
                let _ = reply.send(self.halt().await);
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            SessionCommand::TrackEnded { play_id, reason } => {
                self.on_track_end(play_id, reason).await;
            }
            SessionCommand::Shutdown { reply } => {
                self.halt().await;
                self.queue.clear();
                self.leave().await;
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn state(&self) -> PlayerState {
        if self.current.is_some() {
            PlayerState::Playing
        } else if self.connection.is_some() {
            PlayerState::Connected
        } else {
            PlayerState::Idle
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            channel: self.connection.map(|c| c.channel_id),
            current: self.current.as_ref().map(|c| NowPlaying {
                track: c.track.clone(),
                position: c.started_at.elapsed(),
            }),
            queue: self.queue.iter().cloned().collect(),
        }
    }

    async fn join(&mut self, channel_id: ChannelId) -> Result<JoinOutcome, AudioError> {
        if let Some(connection) = self.connection
            && connection.channel_id == channel_id
        {
            return Ok(JoinOutcome::AlreadyConnected(channel_id));
        }
        let connection = self.voice.connect(self.guild_id, channel_id).await?;
        info!(guild = %self.guild_id, channel = %channel_id, "Joined voice channel");
        self.connection = Some(connection);
        Ok(JoinOutcome::Joined(channel_id))
    }

    /// Stop playback and disconnect. The queue is kept.
    async fn leave(&mut self) -> bool {
        self.halt().await;
        let Some(connection) = self.connection.take() else {
            return false;
        };
        if let Err(e) = self.voice.disconnect(self.guild_id).await {
            warn!(guild = %self.guild_id, error = %e, "Voice disconnect failed");
        }
        info!(guild = %self.guild_id, channel = %connection.channel_id, "Left voice channel");
        true
    }

    async fn offer(&mut self, tracks: Vec<AudioTrack>) -> OfferOutcome {
        let offered = tracks.len();
        self.queue.extend(tracks);
        if self.current.is_some() {
            return OfferOutcome {
                started: None,
                queued: offered,
            };
        }
        let started = self.play_next().await;
        // Offered tracks sit behind any leftovers, so whatever remains of
        // them is at the back of the queue.
        let queued = self.queue.len().min(offered);
        OfferOutcome { started, queued }
    }

    /// Start the next queued track, skipping tracks that fail to start.
    ///
    /// With nothing left the current track is stopped and the player idles.
    async fn play_next(&mut self) -> Option<AudioTrack> {
        while let Some(track) = self.queue.pop_front() {
            if self.start(&track).await {
                return Some(track);
            }
        }
        self.halt().await;
        None
    }

    async fn start(&mut self, track: &AudioTrack) -> bool {
        self.next_play_id += 1;
        let play_id = self.next_play_id;
        let sink = TrackEventSink {
            guild_id: self.guild_id,
            play_id,
            tx: self.events.clone(),
        };

        match self.playback.play(self.guild_id, track, sink).await {
            Ok(()) => {
                info!(guild = %self.guild_id, track = %track.title(), "Track started");
                crate::metrics::record_track_started();
                self.current = Some(Current {
                    track: track.clone(),
                    play_id,
                    started_at: Instant::now(),
                });
                true
            }
            Err(e) => {
                warn!(guild = %self.guild_id, track = %track.title(), error = %e, "Track failed to start");
                false
            }
        }
    }

    /// Stop the current track without advancing.
    async fn halt(&mut self) -> Option<AudioTrack> {
        let current = self.current.take()?;
        if let Err(e) = self.playback.stop(self.guild_id).await {
            warn!(guild = %self.guild_id, error = %e, "Failed to stop playback");
        }
        Some(current.track)
    }

    async fn on_track_end(&mut self, play_id: u64, reason: TrackEndReason) {
        let is_current = self.current.as_ref().is_some_and(|c| c.play_id == play_id);
        if !is_current {
            debug!(guild = %self.guild_id, play_id, ?reason, "Ignoring stale track end");
            return;
        }
        self.current = None;
        debug!(guild = %self.guild_id, ?reason, "Track ended");
        if reason.may_start_next() {
            self.play_next().await;
        }
    }
}

/// Cloneable handle to a guild's session task.
#[derive(Clone)]
pub struct AudioHandle {
    guild_id: GuildId,
    tx: mpsc::Sender<SessionCommand>,
}

impl AudioHandle {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// `true` once the session task has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, AudioError> {
        let (reply, rx) = oneshot::channel();
        let closed = || AudioError::SessionClosed(self.guild_id.get());
        self.tx.send(make(reply)).await.map_err(|_| closed())?;
        rx.await.map_err(|_| closed())
    }

    /// Connect to `channel_id` (Idle -> Connected).
    pub async fn join(&self, channel_id: ChannelId) -> Result<JoinOutcome, AudioError> {
        self.request(|reply| SessionCommand::Join { channel_id, reply })
            .await?
    }

    /// Stop and disconnect; returns whether a connection existed.
    pub async fn leave(&self) -> Result<bool, AudioError> {
        self.request(|reply| SessionCommand::Leave { reply }).await
    }

    /// Play immediately if idle, otherwise append to the queue.
    pub async fn offer(&self, tracks: Vec<AudioTrack>) -> Result<OfferOutcome, AudioError> {
        self.request(|reply| SessionCommand::Offer { tracks, reply })
            .await
    }

    /// Skip to the next queued track.
    pub async fn next(&self) -> Result<Option<AudioTrack>, AudioError> {
        self.request(|reply| SessionCommand::Next { reply }).await
    }

    /// Shuffle the pending queue; returns its length.
    pub async fn shuffle(&self) -> Result<usize, AudioError> {
        self.request(|reply| SessionCommand::Shuffle { reply }).await
    }

    /// Empty the pending queue; returns how many tracks were dropped.
    pub async fn clear_queue(&self) -> Result<usize, AudioError> {
        self.request(|reply| SessionCommand::ClearQueue { reply })
            .await
    }

    /// Stop the current track without advancing.
    pub async fn stop(&self) -> Result<Option<AudioTrack>, AudioError> {
        self.request(|reply| SessionCommand::Stop { reply }).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, AudioError> {
        self.request(|reply| SessionCommand::Snapshot { reply })
            .await
    }

    /// Stop, clear, disconnect and end the session task.
    pub async fn shutdown(&self) -> Result<(), AudioError> {
        self.request(|reply| SessionCommand::Shutdown { reply })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::track::TrackInfo;
    use crate::error::PlatformError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeVoice;

    #[async_trait]
    impl VoiceGateway for FakeVoice {
        async fn voice_channel_of(
            &self,
            _guild_id: GuildId,
            _user_id: opbot_proto::UserId,
        ) -> Result<Option<ChannelId>, PlatformError> {
            Ok(None)
        }

        async fn connect(
            &self,
            guild_id: GuildId,
            channel_id: ChannelId,
        ) -> Result<VoiceConnection, PlatformError> {
            Ok(VoiceConnection {
                guild_id,
                channel_id,
            })
        }

        async fn disconnect(&self, _guild_id: GuildId) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    /// Records every started track together with its sink.
    #[derive(Default)]
    struct Recorder {
        started: Mutex<Vec<(String, TrackEventSink)>>,
        failing: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn titles(&self) -> Vec<String> {
            self.started.lock().iter().map(|(t, _)| t.clone()).collect()
        }

        fn sink(&self, index: usize) -> TrackEventSink {
            self.started.lock()[index].1.clone()
        }
    }

    #[async_trait]
    impl PlaybackBackend for Recorder {
        async fn play(
            &self,
            _guild_id: GuildId,
            track: &AudioTrack,
            events: TrackEventSink,
        ) -> Result<(), PlatformError> {
            if self.failing.lock().iter().any(|t| t == track.title()) {
                return Err(PlatformError::Transport("cannot decode".into()));
            }
            self.started.lock().push((track.title().to_owned(), events));
            Ok(())
        }

        async fn stop(&self, _guild_id: GuildId) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    fn track(title: &str) -> AudioTrack {
        AudioTrack::new(
            TrackInfo {
                identifier: title.into(),
                title: title.into(),
                author: "artist".into(),
                uri: None,
                length: Duration::from_secs(30),
                is_stream: false,
            },
            title,
        )
    }

    fn session() -> (AudioHandle, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let handle = AudioSession::spawn(GuildId::new(1), Arc::new(FakeVoice), recorder.clone());
        (handle, recorder)
    }

    #[tokio::test]
    async fn state_machine_transitions() {
        let (handle, _) = session();
        assert_eq!(handle.snapshot().await.unwrap().state, PlayerState::Idle);

        let joined = handle.join(ChannelId::new(7)).await.unwrap();
        assert_eq!(joined, JoinOutcome::Joined(ChannelId::new(7)));
        assert_eq!(
            handle.join(ChannelId::new(7)).await.unwrap(),
            JoinOutcome::AlreadyConnected(ChannelId::new(7))
        );
        assert_eq!(handle.snapshot().await.unwrap().state, PlayerState::Connected);

        handle.offer(vec![track("a")]).await.unwrap();
        assert_eq!(handle.snapshot().await.unwrap().state, PlayerState::Playing);

        assert!(handle.leave().await.unwrap());
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlayerState::Idle);
        assert_eq!(snapshot.channel, None);
    }

    #[tokio::test]
    async fn offer_plays_first_and_queues_rest() {
        let (handle, recorder) = session();
        let outcome = handle
            .offer(vec![track("a"), track("b"), track("c")])
            .await
            .unwrap();
        assert_eq!(outcome.started.map(|t| t.title().to_owned()), Some("a".into()));
        assert_eq!(outcome.queued, 2);

        let outcome = handle.offer(vec![track("d")]).await.unwrap();
        assert!(outcome.started.is_none());
        assert_eq!(outcome.queued, 1);

        let queue: Vec<_> = handle
            .snapshot()
            .await
            .unwrap()
            .queue
            .iter()
            .map(|t| t.title().to_owned())
            .collect();
        assert_eq!(queue, ["b", "c", "d"]);
        assert_eq!(recorder.titles(), ["a"]);
    }

    #[tokio::test]
    async fn finished_track_advances_and_stale_ends_are_ignored() {
        let (handle, recorder) = session();
        handle.offer(vec![track("a"), track("b")]).await.unwrap();
        let first = recorder.sink(0);

        handle.next().await.unwrap();
        assert_eq!(recorder.titles(), ["a", "b"]);

        // "a" reporting late must not skip "b".
        first.ended(TrackEndReason::Finished).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.current.map(|c| c.track.title().to_owned()), Some("b".into()));

        recorder.sink(1).ended(TrackEndReason::Finished).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.current.is_none());
        assert_eq!(snapshot.state, PlayerState::Idle);
    }

    #[tokio::test]
    async fn stopped_track_does_not_advance() {
        let (handle, recorder) = session();
        handle.offer(vec![track("a"), track("b")]).await.unwrap();
        recorder.sink(0).ended(TrackEndReason::Stopped).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.current.is_none());
        assert_eq!(snapshot.queue.len(), 1);
        assert_eq!(recorder.titles(), ["a"]);
    }

    #[tokio::test]
    async fn tracks_that_fail_to_start_are_skipped() {
        let (handle, recorder) = session();
        recorder.failing.lock().push("bad".into());
        let outcome = handle.offer(vec![track("bad"), track("good")]).await.unwrap();
        assert_eq!(outcome.started.map(|t| t.title().to_owned()), Some("good".into()));
        assert_eq!(outcome.queued, 0);
        assert_eq!(recorder.titles(), ["good"]);
    }

    #[tokio::test]
    async fn offer_counts_only_tracks_left_in_the_queue() {
        let (handle, recorder) = session();
        handle.offer(vec![track("a"), track("b")]).await.unwrap();
        recorder.sink(0).ended(TrackEndReason::Stopped).await;

        // "b" was left over, so it starts ahead of the new track.
        let outcome = handle.offer(vec![track("c")]).await.unwrap();
        assert_eq!(outcome.started.map(|t| t.title().to_owned()), Some("b".into()));
        assert_eq!(outcome.queued, 1);

        recorder.failing.lock().push("d".into());
        handle.clear_queue().await.unwrap();
        handle.stop().await.unwrap();
        let outcome = handle
            .offer(vec![track("d"), track("e"), track("f")])
            .await
            .unwrap();
        assert_eq!(outcome.started.map(|t| t.title().to_owned()), Some("e".into()));
        assert_eq!(outcome.queued, 1);
        assert_eq!(handle.snapshot().await.unwrap().queue.len(), 1);
    }

    #[tokio::test]
    async fn next_on_empty_queue_goes_idle() {
        let (handle, _) = session();
        handle.offer(vec![track("a")]).await.unwrap();
        assert!(handle.next().await.unwrap().is_none());
        assert!(handle.snapshot().await.unwrap().current.is_none());
    }

    #[tokio::test]
    async fn shuffle_clear_and_shutdown() {
        let (handle, _) = session();
        let tracks = (0..10).map(|i| track(&i.to_string())).collect();
        handle.offer(tracks).await.unwrap();
        let playing = |snapshot: &SessionSnapshot| {
            snapshot.current.as_ref().map(|c| c.track.title().to_owned())
        };

        assert_eq!(handle.shuffle().await.unwrap(), 9);
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(playing(&snapshot), Some("0".into()));
        assert_eq!(snapshot.queue.len(), 9);

        assert_eq!(handle.clear_queue().await.unwrap(), 9);
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.queue.is_empty());
        assert_eq!(snapshot.state, PlayerState::Playing);
        assert_eq!(playing(&snapshot), Some("0".into()));

        handle.shutdown().await.unwrap();
        assert!(matches!(
            handle.snapshot().await,
            Err(AudioError::SessionClosed(1))
        ));
    }
}
