//! [`SceneSession`] – the single execution context of a positioning session.
//!
//! The session task owns the [`PositioningEngine`], its renderer and the
//! pose source. Everything else talks to it through a cloneable
//! [`SessionHandle`]: sensor callbacks, host commands and the
//! [`TickTimer`] all post [`SessionMessage`]s onto one `mpsc` channel, and
//! the task applies them strictly in arrival order. Queries answer over
//! `oneshot` channels.
//!
//! ```text
//!  location sensor ─┐
//!  compass ─────────┤                    ┌──────────────────────────┐
//!  frame renders ───┼──► SessionHandle ──►  mpsc  ──► SceneSession │──► EventBus
//!  host commands ───┤                    │  engine · pose · watchdog │
//!  TickTimer ───────┘                    └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use scenegeo_engine::{RecordingRenderer, SharedPose};
//! use scenegeo_middleware::EventBus;
//! use scenegeo_runtime::session::{SceneSession, SessionConfig};
//! use scenegeo_types::{GeoCoordinate, ScenePoint};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pose = SharedPose::at(ScenePoint::zero());
//! let (session, handle) =
//!     SceneSession::new(SessionConfig::default(), RecordingRenderer::new(), pose, EventBus::default())?;
//! let task = session.spawn();
//!
//! handle.push_fix(GeoCoordinate::new(35.6586, 139.7454, 0.0)?).await?;
//! assert!(handle.best_estimate().await?.is_some());
//!
//! handle.shutdown().await?;
//! task.await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use scenegeo_engine::{
    EngineConfig, HeadingReading, LocationNode, PoseSource, PositioningEngine,
    SceneLocationEstimate, SceneRenderer,
};
use scenegeo_middleware::{EventBus, Topic};
use scenegeo_types::{
    Event, EventPayload, GeoCoordinate, NodeId, SceneError, ScenePoint, TrackingState,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::ticker::{DEFAULT_TICK_HZ, TickTimer};
use crate::watchdog::SensorWatchdog;

const LOCATION_FEED: &str = "location";
const TRACKING_FEED: &str = "tracking";
const WATCHDOG_SOURCE: &str = "scenegeo-runtime::watchdog";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub engine: EngineConfig,
    /// Positioning passes per second.
    pub tick_hz: f64,
    /// Silence on the location feed longer than this is reported stale.
    pub location_timeout: Duration,
    /// Silence on the frame feed longer than this is reported stale.
    pub tracking_timeout: Duration,
    /// Bound of the inbound message queue.
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            tick_hz: DEFAULT_TICK_HZ,
            location_timeout: Duration::from_secs(5),
            tracking_timeout: Duration::from_secs(2),
            channel_capacity: 256,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

type Reply<T> = oneshot::Sender<T>;

/// Everything that can happen to a session, in the order it happened.
pub enum SessionMessage {
    Fix(GeoCoordinate),
    Heading(HeadingReading),
    FrameRendered,
    TrackingState(TrackingState),
    SensorFault { component: String, message: String },
    Tick,
    AddNodeAtCurrentPosition(LocationNode, Reply<Result<NodeId, SceneError>>),
    AddConfirmedNode(LocationNode, Reply<Result<NodeId, SceneError>>),
    UpdateNode(NodeId, Reply<Result<bool, SceneError>>),
    RemoveNode(NodeId, Reply<Result<(), SceneError>>),
    RemoveAllNodes(Reply<usize>),
    ResetSceneHeading,
    FindNodes(String, Reply<Vec<NodeId>>),
    Node(NodeId, Reply<Option<LocationNode>>),
    BestEstimate(Reply<Option<SceneLocationEstimate>>),
    CurrentLocation(Reply<Option<GeoCoordinate>>),
    CurrentOrientation(Reply<Option<ScenePoint>>),
    Start,
    Pause,
    Shutdown,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Cloneable, thread-safe entry point into a running [`SceneSession`].
///
/// Every method fails with [`SceneError::Channel`] once the session has
/// shut down.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
    pub async fn push_fix(&self, fix: GeoCoordinate) -> Result<(), SceneError> {
        self.send(SessionMessage::Fix(fix)).await
    }

    pub async fn push_heading(&self, degrees: f64, accuracy: f64) -> Result<(), SceneError> {
        self.send(SessionMessage::Heading(HeadingReading { degrees, accuracy }))
            .await
    }

    pub async fn frame_rendered(&self) -> Result<(), SceneError> {
        self.send(SessionMessage::FrameRendered).await
    }

    pub async fn report_tracking_state(&self, state: TrackingState) -> Result<(), SceneError> {
        self.send(SessionMessage::TrackingState(state)).await
    }

    pub async fn report_sensor_fault(
        &self,
        component: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), SceneError> {
        self.send(SessionMessage::SensorFault {
            component: component.into(),
            message: message.into(),
        })
        .await
    }

    pub async fn add_node_at_current_position(
        &self,
        node: LocationNode,
    ) -> Result<NodeId, SceneError> {
        self.request(|reply| SessionMessage::AddNodeAtCurrentPosition(node, reply))
            .await?
    }

    pub async fn add_confirmed_node(&self, node: LocationNode) -> Result<NodeId, SceneError> {
        self.request(|reply| SessionMessage::AddConfirmedNode(node, reply))
            .await?
    }

    /// Recompute one node immediately (animated).
    pub async fn update_node(&self, id: NodeId) -> Result<bool, SceneError> {
        self.request(|reply| SessionMessage::UpdateNode(id, reply))
            .await?
    }

    pub async fn remove_node(&self, id: NodeId) -> Result<(), SceneError> {
        self.request(|reply| SessionMessage::RemoveNode(id, reply))
            .await?
    }

    pub async fn remove_all_nodes(&self) -> Result<usize, SceneError> {
        self.request(SessionMessage::RemoveAllNodes).await
    }

    pub async fn reset_scene_heading(&self) -> Result<(), SceneError> {
        self.send(SessionMessage::ResetSceneHeading).await
    }

    pub async fn find_nodes(&self, tag: impl Into<String>) -> Result<Vec<NodeId>, SceneError> {
        let tag = tag.into();
        self.request(|reply| SessionMessage::FindNodes(tag, reply))
            .await
    }

    /// A snapshot of the node's current state.
    pub async fn node(&self, id: NodeId) -> Result<Option<LocationNode>, SceneError> {
        self.request(|reply| SessionMessage::Node(id, reply)).await
    }

    pub async fn best_estimate(&self) -> Result<Option<SceneLocationEstimate>, SceneError> {
        self.request(SessionMessage::BestEstimate).await
    }

    pub async fn current_location(&self) -> Result<Option<GeoCoordinate>, SceneError> {
        self.request(SessionMessage::CurrentLocation).await
    }

    pub async fn current_orientation(&self) -> Result<Option<ScenePoint>, SceneError> {
        self.request(SessionMessage::CurrentOrientation).await
    }

    /// Begin (or restart) periodic ticking.
    pub async fn start(&self) -> Result<(), SceneError> {
        self.send(SessionMessage::Start).await
    }

    /// Stop scheduling ticks. Inputs and commands keep being processed.
    pub async fn pause(&self) -> Result<(), SceneError> {
        self.send(SessionMessage::Pause).await
    }

    pub async fn shutdown(&self) -> Result<(), SceneError> {
        self.send(SessionMessage::Shutdown).await
    }

    async fn send(&self, message: SessionMessage) -> Result<(), SceneError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| SceneError::Channel("scene session has shut down".into()))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionMessage,
    ) -> Result<T, SceneError> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response
            .await
            .map_err(|_| SceneError::Channel("scene session dropped the request".into()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

pub struct SceneSession<R: SceneRenderer, P: PoseSource> {
    engine: PositioningEngine<R>,
    pose: P,
    bus: EventBus,
    rx: mpsc::Receiver<SessionMessage>,
    tick_tx: mpsc::WeakSender<SessionMessage>,
    ticker: TickTimer,
    watchdog: SensorWatchdog,
    running: bool,
}

impl<R, P> SceneSession<R, P>
where
    R: SceneRenderer + 'static,
    P: PoseSource + 'static,
{
    /// Build a session and the handle that drives it. Nothing runs until
    /// [`spawn`][Self::spawn] (or [`run`][Self::run]) is called.
    ///
    /// # Errors
    ///
    /// [`SceneError::Config`] for an invalid engine configuration or tick
    /// rate.
    pub fn new(
        config: SessionConfig,
        renderer: R,
        pose: P,
        bus: EventBus,
    ) -> Result<(Self, SessionHandle), SceneError> {
        let engine = PositioningEngine::new(config.engine, renderer, bus.clone())?;
        let ticker = TickTimer::from_hz(config.tick_hz)?;

        let mut watchdog = SensorWatchdog::new();
        watchdog.register(LOCATION_FEED, config.location_timeout);
        watchdog.register(TRACKING_FEED, config.tracking_timeout);

        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let session = Self {
            engine,
            pose,
            bus,
            rx,
            tick_tx: tx.downgrade(),
            ticker,
            watchdog,
            running: false,
        };
        Ok((session, SessionHandle { tx }))
    }

    /// Run the session on its own Tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process messages until [`SessionMessage::Shutdown`] or until every
    /// handle has been dropped.
    pub async fn run(mut self) {
        info!("Scene session started");
        while let Some(message) = self.rx.recv().await {
            if !self.handle(message) {
                break;
            }
        }
        self.ticker.stop();
        info!("Scene session stopped");
    }

    /// Apply one message. Returns `false` when the session should end.
    fn handle(&mut self, message: SessionMessage) -> bool {
        let pose = &self.pose as &dyn PoseSource;
        match message {
            SessionMessage::Fix(fix) => {
                if self.watchdog.heartbeat(LOCATION_FEED) {
                    info!(feed = LOCATION_FEED, "Sensor feed recovered");
                }
                // Rejected fixes are already reported as diagnostics.
                let _ = self.engine.on_location_fix(pose, fix);
            }
            SessionMessage::Heading(reading) => {
                self.engine.on_heading(reading);
            }
            SessionMessage::FrameRendered => {
                if self.watchdog.heartbeat(TRACKING_FEED) {
                    info!(feed = TRACKING_FEED, "Sensor feed recovered");
                }
                self.engine.on_frame_rendered(pose);
            }
            SessionMessage::TrackingState(state) => {
                self.engine.report_tracking_state(state);
            }
            SessionMessage::SensorFault { component, message } => {
                self.engine.report_sensor_fault(&component, &message);
            }
            SessionMessage::Tick => {
                if self.running {
                    self.engine.tick(pose);
                    self.check_feeds();
                } else {
                    trace!("Dropping tick queued before pause");
                }
            }
            SessionMessage::AddNodeAtCurrentPosition(node, reply) => {
                let _ = reply.send(self.engine.add_node_at_current_position(pose, node));
            }
            SessionMessage::AddConfirmedNode(node, reply) => {
                let _ = reply.send(self.engine.add_node_with_confirmed_location(pose, node));
            }
            SessionMessage::UpdateNode(id, reply) => {
                let _ = reply.send(self.engine.update_node(pose, id, true));
            }
            SessionMessage::RemoveNode(id, reply) => {
                let _ = reply.send(self.engine.remove_node(id).map(|_| ()));
            }
            SessionMessage::RemoveAllNodes(reply) => {
                let _ = reply.send(self.engine.remove_all_nodes());
            }
            SessionMessage::ResetSceneHeading => self.engine.reset_scene_heading(),
            SessionMessage::FindNodes(tag, reply) => {
                let ids = self
                    .engine
                    .find_nodes(&tag)
                    .into_iter()
                    .map(LocationNode::id)
                    .collect();
                let _ = reply.send(ids);
            }
            SessionMessage::Node(id, reply) => {
                let _ = reply.send(self.engine.node(id).cloned());
            }
            SessionMessage::BestEstimate(reply) => {
                let _ = reply.send(self.engine.best_estimate());
            }
            SessionMessage::CurrentLocation(reply) => {
                let _ = reply.send(self.engine.current_location(pose));
            }
            SessionMessage::CurrentOrientation(reply) => {
                let _ = reply.send(self.engine.current_orientation(pose));
            }
            SessionMessage::Start => self.start_ticking(),
            SessionMessage::Pause => {
                self.ticker.stop();
                self.running = false;
                info!("Scene session paused");
            }
            SessionMessage::Shutdown => return false,
        }
        true
    }

    fn start_ticking(&mut self) {
        let weak = self.tick_tx.clone();
        self.ticker.start(move || {
            let Some(tx) = weak.upgrade() else {
                return false;
            };
            match tx.try_send(SessionMessage::Tick) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    trace!("Session busy; tick skipped");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
        self.watchdog.rearm();
        self.running = true;
        info!(period_ms = self.ticker.period().as_millis() as u64, "Scene session running");
    }

    fn check_feeds(&mut self) {
        for feed in self.watchdog.newly_stale() {
            warn!(feed = %feed, "Sensor feed stale");
            let event = Event::new(
                WATCHDOG_SOURCE,
                EventPayload::SensorStale { component: feed },
            );
            if let Err(e) = self.bus.publish_to(Topic::Diagnostics, event) {
                debug!(error = %e, "Stale-feed event not delivered");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenegeo_engine::{RecordingRenderer, SharedPose};
    use scenegeo_geodesy::destination;
    use tokio::time::{sleep, timeout};

    fn origin() -> GeoCoordinate {
        GeoCoordinate::new(-33.8568, 151.2153, 0.0)
            .unwrap()
            .with_accuracy(5.0, 5.0)
    }

    fn spawn_session(
        config: SessionConfig,
    ) -> (SessionHandle, SharedPose, EventBus, JoinHandle<()>) {
        let pose = SharedPose::at(ScenePoint::zero());
        let bus = EventBus::default();
        let (session, handle) =
            SceneSession::new(config, RecordingRenderer::new(), pose.clone(), bus.clone()).unwrap();
        (handle, pose, bus, session.spawn())
    }

    #[test]
    fn invalid_tick_rate_is_rejected() {
        let config = SessionConfig {
            tick_hz: 0.0,
            ..SessionConfig::default()
        };
        let result = SceneSession::new(
            config,
            RecordingRenderer::new(),
            SharedPose::new(),
            EventBus::default(),
        );
        assert!(matches!(result, Err(SceneError::Config(_))));
    }

    #[tokio::test]
    async fn commands_and_queries_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let (handle, _pose, _bus, task) = spawn_session(SessionConfig::default());

        assert!(handle.current_location().await?.is_none());
        handle.push_fix(origin()).await?;
        assert!(handle.best_estimate().await?.is_some());
        assert!(handle.current_location().await?.is_some());

        let id = handle
            .add_node_at_current_position(LocationNode::new(None).with_tag("poi"))
            .await?;
        assert_eq!(handle.find_nodes("poi").await?, vec![id]);
        let snapshot = handle.node(id).await?.ok_or("node missing")?;
        assert!(!snapshot.is_confirmed());

        assert_eq!(handle.remove_all_nodes().await?, 1);
        assert!(handle.find_nodes("poi").await?.is_empty());
        assert_eq!(
            handle.remove_node(id).await,
            Err(SceneError::NodeNotFound(id))
        );

        handle.shutdown().await?;
        task.await?;
        Ok(())
    }

    #[tokio::test]
    async fn handle_fails_after_shutdown() -> Result<(), Box<dyn std::error::Error>> {
        let (handle, _pose, _bus, task) = spawn_session(SessionConfig::default());
        handle.shutdown().await?;
        task.await?;

        assert!(matches!(
            handle.push_fix(origin()).await,
            Err(SceneError::Channel(_))
        ));
        assert!(matches!(
            handle.best_estimate().await,
            Err(SceneError::Channel(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn dropping_every_handle_ends_the_session() -> Result<(), Box<dyn std::error::Error>> {
        let (handle, _pose, _bus, task) = spawn_session(SessionConfig::default());
        handle.start().await?;
        drop(handle);
        timeout(Duration::from_secs(1), task).await??;
        Ok(())
    }

    #[tokio::test]
    async fn ticks_update_nodes_until_paused() -> Result<(), Box<dyn std::error::Error>> {
        let config = SessionConfig {
            tick_hz: 200.0,
            ..SessionConfig::default()
        };
        let (handle, _pose, bus, task) = spawn_session(config);
        handle.push_fix(origin()).await?;
        let id = handle
            .add_confirmed_node(LocationNode::new(Some(destination(&origin(), 0.0, 40.0))))
            .await?;

        let mut nodes = bus.subscribe_to(Topic::Nodes);
        handle.start().await?;
        // Restarting must not double the tick source.
        handle.start().await?;

        let event = timeout(Duration::from_secs(1), nodes.recv()).await??;
        assert!(matches!(event.payload, EventPayload::NodeUpdated { node, .. } if node == id));

        handle.pause().await?;
        // Round-trip so the pause is applied before draining.
        handle.best_estimate().await?;
        nodes.drain();
        sleep(Duration::from_millis(30)).await;
        handle.best_estimate().await?;
        assert!(nodes.drain().is_empty());

        handle.shutdown().await?;
        task.await?;
        Ok(())
    }

    #[tokio::test]
    async fn silent_location_feed_is_reported_once() -> Result<(), Box<dyn std::error::Error>> {
        let config = SessionConfig {
            tick_hz: 200.0,
            location_timeout: Duration::from_millis(20),
            tracking_timeout: Duration::from_secs(60),
            ..SessionConfig::default()
        };
        let (handle, _pose, bus, task) = spawn_session(config);
        let mut diagnostics = bus.subscribe_to(Topic::Diagnostics);
        handle.start().await?;

        sleep(Duration::from_millis(120)).await;
        handle.pause().await?;
        handle.best_estimate().await?;

        let stale: Vec<String> = diagnostics
            .drain()
            .into_iter()
            .filter_map(|e| match e.payload {
                EventPayload::SensorStale { component } => Some(component),
                _ => None,
            })
            .collect();
        assert_eq!(stale, vec![LOCATION_FEED.to_string()]);

        handle.shutdown().await?;
        task.await?;
        Ok(())
    }

    #[tokio::test]
    async fn heading_and_tracking_reports_reach_the_bus() -> Result<(), Box<dyn std::error::Error>> {
        let (handle, _pose, bus, task) = spawn_session(SessionConfig::default());
        let mut session = bus.subscribe_to(Topic::Session);
        let mut diagnostics = bus.subscribe_to(Topic::Diagnostics);

        handle.push_heading(0.1, 3.0).await?;
        handle.push_heading(0.1, -1.0).await?;
        handle.report_tracking_state(TrackingState::NotAvailable).await?;
        handle.report_sensor_fault("camera", "session failed").await?;
        handle.shutdown().await?;
        task.await?;

        let resets = session
            .drain()
            .into_iter()
            .filter(|e| matches!(e.payload, EventPayload::HeadingReset { .. }))
            .count();
        assert_eq!(resets, 1);
        assert_eq!(diagnostics.drain().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn first_frame_pairs_the_pending_fix() -> Result<(), Box<dyn std::error::Error>> {
        let pose = SharedPose::new();
        let bus = EventBus::default();
        let (session, handle) = SceneSession::new(
            SessionConfig::default(),
            RecordingRenderer::new(),
            pose.clone(),
            bus.clone(),
        )?;
        let task = session.spawn();

        handle.push_fix(origin()).await?;
        assert!(handle.best_estimate().await?.is_none());

        pose.set_position(Some(ScenePoint::new(0.0, 0.0, -2.0)));
        handle.frame_rendered().await?;
        let best = handle.best_estimate().await?.ok_or("no estimate")?;
        assert_eq!(best.position, ScenePoint::new(0.0, 0.0, -2.0));

        handle.shutdown().await?;
        task.await?;
        Ok(())
    }
}
