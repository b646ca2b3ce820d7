//! Headless, typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others, and so that the engine never waits on its host.
//!
//! # Topics
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Estimates`] | Estimates recorded into / evicted from the buffer |
//! | [`Topic::Nodes`] | Node confirmations and per-tick transform updates |
//! | [`Topic::Session`] | Scene root setup, heading resets, tracking state |
//! | [`Topic::Diagnostics`] | Skipped ticks, rejected fixes, stale sensors |
//!
//! Every event is additionally mirrored onto an "all topics" channel for
//! hosts that want a single ordered stream ([`EventBus::subscribe_all`]).

use scenegeo_types::{Event, SceneError};
use tokio::sync::broadcast;
use tracing::warn;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Routing lanes on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Estimates,
    Nodes,
    Session,
    Diagnostics,
}

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    all: broadcast::Sender<Event>,
    estimates: broadcast::Sender<Event>,
    nodes: broadcast::Sender<Event>,
    session: broadcast::Sender<Event>,
    diagnostics: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every channel independently.
    pub fn new(capacity: usize) -> Self {
        let (all, _) = broadcast::channel(capacity);
        let (estimates, _) = broadcast::channel(capacity);
        let (nodes, _) = broadcast::channel(capacity);
        let (session, _) = broadcast::channel(capacity);
        let (diagnostics, _) = broadcast::channel(capacity);
        Self {
            all,
            estimates,
            nodes,
            session,
            diagnostics,
        }
    }

    /// Publish `event` to the given [`Topic`] and to the all-topics channel.
    ///
    /// Returns the number of receivers that were handed the event.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Channel`] when nobody is subscribed to either
    /// the topic or the all-topics channel.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, SceneError> {
        let mirrored = self.all.send(event.clone()).unwrap_or(0);
        let direct = self.topic_sender(topic).send(event).unwrap_or(0);
        match mirrored + direct {
            0 => Err(SceneError::Channel(format!(
                "No subscribers for topic {topic:?}"
            ))),
            n => Ok(n),
        }
    }

    /// Subscribe to a single [`Topic`].
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic: Some(topic),
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    /// Subscribe to every event regardless of topic, in publish order.
    pub fn subscribe_all(&self) -> TopicReceiver {
        TopicReceiver {
            topic: None,
            receiver: self.all.subscribe(),
        }
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Estimates => &self.estimates,
            Topic::Nodes => &self.nodes,
            Topic::Session => &self.session,
            Topic::Diagnostics => &self.diagnostics,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A receiver bound to one [`Topic`] (or to all of them).
///
/// Obtained via [`EventBus::subscribe_to`] or [`EventBus::subscribe_all`].
pub struct TopicReceiver {
    topic: Option<Topic>,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Take the next buffered event without waiting.
    ///
    /// Returns `None` when nothing is buffered or the bus is closed. A lag is
    /// logged and skipped over.
    pub fn try_recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(topic = ?self.topic, lagged_by = n, "TopicReceiver lagged");
                    continue;
                }
                Err(_) => return None,
            }
        }
    }

    /// Drain every buffered event.
    pub fn drain(&mut self) -> Vec<Event> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// The [`Topic`] this receiver is bound to; `None` for the all-topics
    /// stream.
    pub fn topic(&self) -> Option<Topic> {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenegeo_types::EventPayload;

    fn make_event(source: &str) -> Event {
        Event::new(source, EventPayload::SceneRootEstablished)
    }

    #[tokio::test]
    async fn publish_and_receive() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut rx = bus.subscribe_to(Topic::Session);

        let event = make_event("scenegeo-engine::session");
        bus.publish_to(Topic::Session, event.clone())?;

        let received = rx.recv().await?;
        assert_eq!(received.id, event.id);
        assert_eq!(received.source, event.source);
        Ok(())
    }

    #[test]
    fn publish_no_subscribers_returns_error() {
        let bus = EventBus::default();
        let result = bus.publish_to(Topic::Nodes, make_event("test"));
        assert!(matches!(result, Err(SceneError::Channel(_))));
    }

    #[test]
    fn all_topics_stream_sees_every_lane_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut all = bus.subscribe_all();
        assert_eq!(all.topic(), None);

        let first = make_event("a");
        let second = make_event("b");
        bus.publish_to(Topic::Estimates, first.clone())?;
        bus.publish_to(Topic::Diagnostics, second.clone())?;

        let ids: Vec<_> = all.drain().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        Ok(())
    }

    #[test]
    fn topic_subscriber_does_not_receive_other_topic_events() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut nodes = bus.subscribe_to(Topic::Nodes);
        let _estimates = bus.subscribe_to(Topic::Estimates);

        bus.publish_to(Topic::Estimates, make_event("estimates"))?;
        assert!(nodes.try_recv().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe_to(Topic::Nodes);
        let mut rx2 = bus.subscribe_to(Topic::Nodes);

        let event = make_event("scenegeo-engine::nodes");
        let delivered = bus.publish_to(Topic::Nodes, event.clone())?;
        assert_eq!(delivered, 2);

        assert_eq!(rx1.recv().await?.id, event.id);
        assert_eq!(rx2.recv().await?.id, event.id);
        Ok(())
    }

    #[test]
    fn try_recv_skips_over_lag() {
        const CAPACITY: usize = 4;
        let bus = EventBus::new(CAPACITY);
        let mut slow = bus.subscribe_to(Topic::Nodes);

        for _ in 0..100 {
            let _ = bus.publish_to(Topic::Nodes, make_event("flood"));
        }

        let drained = slow.drain();
        assert_eq!(drained.len(), CAPACITY);
    }
}
