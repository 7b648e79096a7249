//! Pending search selections.
//!
//! A search command posts its results, opens a selection keyed by that
//! message and waits. The first digit reaction from the requesting user on
//! that message picks a track; otherwise the wait times out. Either way the
//! entry is removed, so late reactions find nothing.

use super::MAX_SEARCH_RESULTS;
use super::track::AudioTrack;
use dashmap::DashMap;
use opbot_proto::{MessageId, ReactionEvent, UserId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

/// Candidates offered to one user.
#[derive(Debug, Clone)]
pub struct AudioSearchSelection {
    requester: UserId,
    tracks: Vec<AudioTrack>,
}

impl AudioSearchSelection {
    /// Keeps at most [`MAX_SEARCH_RESULTS`] tracks.
    pub fn new(requester: UserId, mut tracks: Vec<AudioTrack>) -> Self {
        tracks.truncate(MAX_SEARCH_RESULTS);
        Self { requester, tracks }
    }

    pub fn requester(&self) -> UserId {
        self.requester
    }

    pub fn tracks(&self) -> &[AudioTrack] {
        &self.tracks
    }
}

/// How a selection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected { index: usize, track: AudioTrack },
    TimedOut,
}

struct Pending {
    ticket: u64,
    selection: AudioSearchSelection,
    reply: oneshot::Sender<(usize, AudioTrack)>,
}

/// Tracks every open selection across guilds.
pub struct SelectionManager {
    pending: Arc<DashMap<MessageId, Pending>>,
    next_ticket: AtomicU64,
    timeout: Duration,
}

impl SelectionManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            next_ticket: AtomicU64::new(0),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register `selection` under the message that lists it.
    ///
    /// The timeout runs from here, not from the first `wait` poll.
    ///
    /// An older selection on the same message is replaced and its waiter
    /// sees a timeout.
    pub fn open(&self, message_id: MessageId, selection: AudioSearchSelection) -> SelectionWaiter {
        let (reply, rx) = oneshot::channel();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        self.pending.insert(
            message_id,
            Pending {
                ticket,
                selection,
                reply,
            },
        );
        SelectionWaiter {
            message_id,
            ticket,
            rx: Some(rx),
            pending: Arc::clone(&self.pending),
            deadline: Instant::now() + self.timeout,
        }
    }

    /// Feed a reaction. Returns `true` if it completed a selection.
    pub fn on_reaction(&self, event: &ReactionEvent) -> bool {
        let Some(index) = event.emoji.digit_index() else {
            return false;
        };
        let taken = self.pending.remove_if(&event.message_id, |_, pending| {
            pending.selection.requester == event.user_id && index < pending.selection.tracks.len()
        });
        let Some((_, pending)) = taken else {
            return false;
        };

        let track = pending.selection.tracks[index].clone();
        debug!(message = %event.message_id, user = %event.user_id, index, "Search result selected");
        pending.reply.send((index, track)).is_ok()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Waits for one selection to complete. Dropping it cancels the selection.
pub struct SelectionWaiter {
    message_id: MessageId,
    ticket: u64,
    rx: Option<oneshot::Receiver<(usize, AudioTrack)>>,
    pending: Arc<DashMap<MessageId, Pending>>,
    deadline: Instant,
}

impl SelectionWaiter {
    pub async fn wait(mut self) -> SelectionOutcome {
        let Some(rx) = self.rx.take() else {
            return SelectionOutcome::TimedOut;
        };
        let outcome = match tokio::time::timeout_at(self.deadline, rx).await {
            Ok(Ok((index, track))) => SelectionOutcome::Selected { index, track },
            Ok(Err(_)) | Err(_) => SelectionOutcome::TimedOut,
        };
        crate::metrics::record_selection(match outcome {
            SelectionOutcome::Selected { .. } => "selected",
            SelectionOutcome::TimedOut => "timed_out",
        });
        outcome
    }
}

impl Drop for SelectionWaiter {
    fn drop(&mut self) {
        // A newer selection on the same message keeps its entry.
        let ticket = self.ticket;
        self.pending
            .remove_if(&self.message_id, |_, pending| pending.ticket == ticket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::track::TrackInfo;
    use opbot_proto::{ChannelId, ReactionEmoji, emoji};

    fn track(title: &str) -> AudioTrack {
        AudioTrack::new(
            TrackInfo {
                identifier: title.into(),
                title: title.into(),
                author: "artist".into(),
                uri: None,
                length: Duration::from_secs(60),
                is_stream: false,
            },
            title,
        )
    }

    fn reaction(message: u64, user: u64, emoji: &str) -> ReactionEvent {
        ReactionEvent {
            message_id: MessageId::new(message),
            channel_id: ChannelId::new(1),
            guild_id: None,
            user_id: UserId::new(user),
            emoji: ReactionEmoji::Unicode(emoji.to_owned()),
        }
    }

    fn selection(count: usize) -> AudioSearchSelection {
        let tracks = (0..count).map(|i| track(&format!("t{i}"))).collect();
        AudioSearchSelection::new(UserId::new(42), tracks)
    }

    #[test]
    fn candidates_are_capped() {
        assert_eq!(selection(12).tracks().len(), MAX_SEARCH_RESULTS);
    }

    #[tokio::test]
    async fn requester_digit_selects() {
        let manager = SelectionManager::new(Duration::from_secs(10));
        let waiter = manager.open(MessageId::new(5), selection(3));

        assert!(manager.on_reaction(&reaction(5, 42, emoji::DIGITS[1])));
        let outcome = waiter.wait().await;
        assert!(matches!(outcome, SelectionOutcome::Selected { index: 1, ref track } if track.title() == "t1"));
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn foreign_reactions_are_ignored() {
        let manager = SelectionManager::new(Duration::from_secs(10));
        let _waiter = manager.open(MessageId::new(5), selection(3));

        // Someone else.
        assert!(!manager.on_reaction(&reaction(5, 7, emoji::DIGITS[0])));
        // Different message.
        assert!(!manager.on_reaction(&reaction(6, 42, emoji::DIGITS[0])));
        // Out of range.
        assert!(!manager.on_reaction(&reaction(5, 42, emoji::DIGITS[3])));
        // Not a digit.
        assert!(!manager.on_reaction(&reaction(5, 42, emoji::TIMER)));
        assert_eq!(manager.pending_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_removes_entry() {
        let manager = SelectionManager::new(Duration::from_secs(10));
        let waiter = manager.open(MessageId::new(5), selection(3));

        assert_eq!(waiter.wait().await, SelectionOutcome::TimedOut);
        assert_eq!(manager.pending_count(), 0);
        assert!(!manager.on_reaction(&reaction(5, 42, emoji::DIGITS[0])));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_starts_when_opened() {
        let manager = SelectionManager::new(Duration::from_secs(10));
        let waiter = manager.open(MessageId::new(5), selection(3));

        tokio::time::sleep(Duration::from_secs(6)).await;
        let waiting = Instant::now();
        assert_eq!(waiter.wait().await, SelectionOutcome::TimedOut);
        assert_eq!(waiting.elapsed(), Duration::from_secs(4));
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn only_first_reaction_counts() {
        let manager = SelectionManager::new(Duration::from_secs(10));
        let waiter = manager.open(MessageId::new(5), selection(3));

        assert!(manager.on_reaction(&reaction(5, 42, emoji::DIGITS[2])));
        assert!(!manager.on_reaction(&reaction(5, 42, emoji::DIGITS[0])));
        assert!(matches!(waiter.wait().await, SelectionOutcome::Selected { index: 2, .. }));
    }
}
