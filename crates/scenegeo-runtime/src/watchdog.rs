//! [`SensorWatchdog`] – notices when a sensor feed goes quiet.
//!
//! The session records a heartbeat every time a feed delivers (a location
//! fix, a rendered frame). [`SensorWatchdog::newly_stale`] reports each feed
//! the first time its deadline passes; it is not reported again until a new
//! heartbeat revives it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Health state reported for a single feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedHealth {
    Healthy,
    Stale,
}

struct FeedEntry {
    last_heartbeat: Instant,
    timeout: Duration,
    reported_stale: bool,
}

#[derive(Default)]
pub struct SensorWatchdog {
    feeds: HashMap<String, FeedEntry>,
}

impl SensorWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `feed` with the given deadline. Re-registering resets the
    /// deadline and the stale flag.
    pub fn register(&mut self, feed: &str, timeout: Duration) {
        self.feeds.insert(
            feed.to_string(),
            FeedEntry {
                last_heartbeat: Instant::now(),
                timeout,
                reported_stale: false,
            },
        );
    }

    /// Reset every registered deadline to now.
    pub fn rearm(&mut self) {
        let now = Instant::now();
        for entry in self.feeds.values_mut() {
            entry.last_heartbeat = now;
            entry.reported_stale = false;
        }
    }

    /// Record a delivery on `feed`. Returns `true` if the feed had been
    /// reported stale and has now recovered. Unknown feeds are ignored.
    pub fn heartbeat(&mut self, feed: &str) -> bool {
        match self.feeds.get_mut(feed) {
            Some(entry) => {
                entry.last_heartbeat = Instant::now();
                std::mem::take(&mut entry.reported_stale)
            }
            None => false,
        }
    }

    /// Unknown feeds are [`FeedHealth::Stale`].
    pub fn health(&self, feed: &str) -> FeedHealth {
        match self.feeds.get(feed) {
            Some(entry) if entry.last_heartbeat.elapsed() <= entry.timeout => FeedHealth::Healthy,
            _ => FeedHealth::Stale,
        }
    }

    /// Feeds that passed their deadline since the last call, sorted by name.
    pub fn newly_stale(&mut self) -> Vec<String> {
        let mut stale: Vec<String> = self
            .feeds
            .iter_mut()
            .filter(|(_, entry)| {
                !entry.reported_stale && entry.last_heartbeat.elapsed() > entry.timeout
            })
            .map(|(feed, entry)| {
                entry.reported_stale = true;
                feed.clone()
            })
            .collect();
        stale.sort();
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fresh_feed_is_healthy() {
        let mut wd = SensorWatchdog::new();
        wd.register("location", Duration::from_secs(5));
        assert_eq!(wd.health("location"), FeedHealth::Healthy);
        assert!(wd.newly_stale().is_empty());
    }

    #[test]
    fn unknown_feed_is_stale_and_heartbeat_is_noop() {
        let mut wd = SensorWatchdog::new();
        assert_eq!(wd.health("compass"), FeedHealth::Stale);
        assert!(!wd.heartbeat("compass"));
    }

    #[test]
    fn stale_feed_is_reported_once_per_transition() {
        let mut wd = SensorWatchdog::new();
        wd.register("location", Duration::from_millis(20));
        wd.register("tracking", Duration::from_secs(60));
        thread::sleep(Duration::from_millis(30));

        assert_eq!(wd.newly_stale(), vec!["location".to_string()]);
        assert!(wd.newly_stale().is_empty());

        // Recovery re-arms the report.
        assert!(wd.heartbeat("location"));
        assert!(!wd.heartbeat("location"));
        thread::sleep(Duration::from_millis(30));
        assert_eq!(wd.newly_stale(), vec!["location".to_string()]);
    }

    #[test]
    fn rearm_resets_deadlines() {
        let mut wd = SensorWatchdog::new();
        wd.register("tracking", Duration::from_millis(20));
        thread::sleep(Duration::from_millis(30));
        assert_eq!(wd.health("tracking"), FeedHealth::Stale);

        wd.rearm();
        assert_eq!(wd.health("tracking"), FeedHealth::Healthy);
    }
}
