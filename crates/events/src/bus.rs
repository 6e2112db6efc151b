//! In-process progress bus backed by per-topic `tokio::sync::broadcast`
//! channels.
//!
//! Topics are subscriber identities; one topic may carry interleaved
//! events from any number of jobs. Publishing is fire-and-forget: with
//! no live subscriber on the topic the event is dropped, and a
//! subscriber only sees events published after it subscribed.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use huebox_core::progress::ProgressUpdate;

/// Buffered events per topic before slow subscribers start lagging.
const TOPIC_CAPACITY: usize = 64;

/// Publish/subscribe interface between orchestrators and relays.
#[async_trait]
pub trait ProgressChannel: Send + Sync {
    /// Publish an update on `topic`. Never blocks on subscriber
    /// presence; with no subscriber the update is dropped.
    async fn publish(&self, topic: &str, update: ProgressUpdate);

    /// Open a live stream of updates subsequently published on `topic`.
    /// No backlog is replayed.
    async fn subscribe(&self, topic: &str) -> Subscription;
}

/// A live subscription to one topic.
///
/// Dropping the subscription unsubscribes; [`Subscription::unsubscribe`]
/// does the same explicitly and is safe to call from any cleanup path.
pub struct Subscription {
    topic: String,
    receiver: broadcast::Receiver<ProgressUpdate>,
}

impl Subscription {
    /// Next update on the topic, or `None` once the channel is closed.
    ///
    /// A subscriber that fell behind the topic buffer skips the
    /// overwritten updates and keeps receiving from the current
    /// position.
    pub async fn recv(&mut self) -> Option<ProgressUpdate> {
        loop {
            match self.receiver.recv().await {
                Ok(update) => return Some(update),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(topic = %self.topic, skipped, "Progress subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Tear the subscription down. Idempotent with respect to drop.
    pub fn unsubscribe(self) {}
}

/// In-memory fan-out bus, shared via `Arc` across the application.
pub struct ProgressBus {
    topics: RwLock<HashMap<String, broadcast::Sender<ProgressUpdate>>>,
}

impl ProgressBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
        }
    }

    /// Number of topics currently held. Topics whose last subscriber
    /// went away are pruned on the next publish to them.
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressChannel for ProgressBus {
    async fn publish(&self, topic: &str, update: ProgressUpdate) {
        let mut topics = self.topics.write().await;
        let Some(sender) = topics.get(topic) else {
            // Nobody ever subscribed to this topic; drop the update.
            return;
        };
        if sender.receiver_count() == 0 {
            // Last subscriber went away; prune the topic and drop.
            topics.remove(topic);
            return;
        }
        // SendError only means the receivers disappeared underneath us.
        let _ = sender.send(update);
    }

    async fn subscribe(&self, topic: &str) -> Subscription {
        let mut topics = self.topics.write().await;
        let sender = topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0);
        Subscription {
            topic: topic.to_string(),
            receiver: sender.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(message: &str) -> ProgressUpdate {
        ProgressUpdate::Error {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = ProgressBus::new();
        let mut sub = bus.subscribe("user:a").await;

        bus.publish("user:a", ProgressUpdate::FetchingMetadata).await;

        assert_eq!(sub.recv().await, Some(ProgressUpdate::FetchingMetadata));
    }

    #[tokio::test]
    async fn two_subscribers_see_identical_ordered_sequences() {
        let bus = ProgressBus::new();
        let mut first = bus.subscribe("user:a").await;
        let mut second = bus.subscribe("user:a").await;

        bus.publish("user:a", update("one")).await;
        bus.publish("user:a", update("two")).await;

        for sub in [&mut first, &mut second] {
            assert_eq!(sub.recv().await, Some(update("one")));
            assert_eq!(sub.recv().await, Some(update("two")));
        }
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let bus = ProgressBus::new();
        let mut a = bus.subscribe("user:a").await;
        let _b = bus.subscribe("user:b").await;

        bus.publish("user:b", update("for b")).await;
        bus.publish("user:a", update("for a")).await;

        assert_eq!(a.recv().await, Some(update("for a")));
    }

    #[tokio::test]
    async fn publish_without_subscriber_is_dropped() {
        let bus = ProgressBus::new();
        // Must not panic or block.
        bus.publish("user:nobody", update("lost")).await;
        assert_eq!(bus.topic_count().await, 0);
    }

    #[tokio::test]
    async fn no_backlog_replay_for_late_subscriber() {
        let bus = ProgressBus::new();
        let early = bus.subscribe("user:a").await;
        bus.publish("user:a", update("before")).await;
        drop(early);

        let mut late = bus.subscribe("user:a").await;
        bus.publish("user:a", update("after")).await;
        assert_eq!(late.recv().await, Some(update("after")));
    }

    #[tokio::test]
    async fn dropped_topic_is_pruned_on_publish() {
        let bus = ProgressBus::new();
        let sub = bus.subscribe("user:a").await;
        sub.unsubscribe();

        bus.publish("user:a", update("gone")).await;
        assert_eq!(bus.topic_count().await, 0);
    }
}
