//! Simulated walk: a viewer heads north through a ring of annotated points
//! of interest while the session keeps them pinned to the scene.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use scenegeo_engine::{LocationNode, RecordingRenderer, SharedPose};
use scenegeo_geodesy::{destination, distance};
use scenegeo_middleware::{EventBus, TopicReceiver};
use scenegeo_runtime::{SceneSession, SessionHandle};
use scenegeo_types::{Event, EventPayload, GeoCoordinate, SceneError, ScenePoint, TrackingState};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;

/// Altitude given to every demo point of interest, in metres.
const POI_ALTITUDE_M: f64 = 10.0;
/// Interval between simulated sensor readings.
const SENSOR_PERIOD: Duration = Duration::from_millis(200);

/// Counters gathered from the event stream.
#[derive(Debug, Default)]
pub struct EventTally {
    pub estimates: usize,
    pub evictions: usize,
    pub confirmations: usize,
    pub updates: usize,
    pub diagnostics: usize,
}

pub async fn run(cfg: Config, shutdown: Arc<AtomicBool>) -> Result<(), SceneError> {
    let demo = &cfg.demo;
    let start = GeoCoordinate::new(demo.start_latitude, demo.start_longitude, 0.0)?
        .with_accuracy(8.0, 4.0);

    let pose = SharedPose::at(ScenePoint::zero());
    pose.set_euler_angles(Some(ScenePoint::zero()));
    let bus = EventBus::default();
    let printer = spawn_printer(bus.subscribe_all());

    let (session, handle) = SceneSession::new(
        cfg.session_config(),
        RecordingRenderer::new(),
        pose.clone(),
        bus.clone(),
    )?;
    let session_task = session.spawn();

    handle.report_tracking_state(TrackingState::Normal).await?;
    handle.push_fix(start).await?;
    handle.frame_rendered().await?;
    handle.push_heading(0.0, 5.0).await?;

    place_ring(&handle, &start, demo.ring_size, demo.ring_radius_m).await?;
    let marker = handle
        .add_node_at_current_position(LocationNode::annotation(None, "start-marker").with_tag("start"))
        .await?;
    println!(
        "  {} start marker {} dropped at the viewer's position",
        "+".green().bold(),
        marker.to_string().dimmed()
    );

    handle.start().await?;
    walk(&handle, &pose, &start, &cfg, &shutdown).await?;
    handle.pause().await?;

    print_summary(&handle, &start).await?;

    let removed = handle.remove_all_nodes().await?;
    info!(removed, "Demo nodes removed");
    handle.shutdown().await?;
    session_task
        .await
        .map_err(|e| SceneError::Channel(format!("session task failed: {e}")))?;

    // The printer ends once every bus sender is gone.
    drop(bus);
    let tally = printer
        .await
        .map_err(|e| SceneError::Channel(format!("printer task failed: {e}")))?;
    println!();
    println!(
        "  {} estimates, {} evictions, {} confirmations, {} node updates, {} diagnostics",
        tally.estimates.to_string().bold(),
        tally.evictions.to_string().bold(),
        tally.confirmations.to_string().bold(),
        tally.updates.to_string().bold(),
        tally.diagnostics.to_string().bold(),
    );
    Ok(())
}

async fn place_ring(
    handle: &SessionHandle,
    start: &GeoCoordinate,
    count: usize,
    radius_m: f64,
) -> Result<(), SceneError> {
    for i in 0..count {
        let bearing = 360.0 * i as f64 / count as f64;
        let mut coordinate = destination(start, bearing, radius_m);
        coordinate.altitude = POI_ALTITUDE_M;
        let node = LocationNode::annotation(Some(coordinate), format!("poi-{i}")).with_tag("ring");
        let id = handle.add_confirmed_node(node).await?;
        println!(
            "  {} poi-{i} at bearing {bearing:>5.1}° ({})",
            "+".green().bold(),
            id.to_string().dimmed()
        );
    }
    Ok(())
}

/// Move the viewer north at the configured speed, emitting a slightly noisy
/// fix and a rendered frame every sensor period.
async fn walk(
    handle: &SessionHandle,
    pose: &SharedPose,
    start: &GeoCoordinate,
    cfg: &Config,
    shutdown: &AtomicBool,
) -> Result<(), SceneError> {
    let steps = (cfg.demo.duration_secs * 1000 / SENSOR_PERIOD.as_millis() as u64).max(1);
    let step_m = cfg.demo.walk_speed_mps * SENSOR_PERIOD.as_secs_f64();

    let mut interval = tokio::time::interval(SENSOR_PERIOD);
    for step in 1..=steps {
        interval.tick().await;
        if shutdown.load(Ordering::SeqCst) {
            println!("  {}", "walk interrupted".yellow());
            break;
        }

        let walked = step as f64 * step_m;
        pose.set_position(Some(ScenePoint::new(0.0, 0.0, -walked)));
        handle.frame_rendered().await?;

        let phase = step as f64;
        let noise_m = 3.0 * (phase * 0.7).sin();
        let accuracy = 6.0 + 4.0 * (phase * 0.3).sin().abs();
        let fix = destination(start, 0.0, walked + noise_m).with_accuracy(accuracy, 4.0);
        handle.push_fix(fix).await?;
        handle.push_heading(2.0 * (phase * 0.1).sin(), 5.0).await?;
    }
    Ok(())
}

async fn print_summary(handle: &SessionHandle, start: &GeoCoordinate) -> Result<(), SceneError> {
    println!();
    if let Some(best) = handle.best_estimate().await? {
        println!(
            "  best estimate  {:.6}, {:.6} ±{:.1} m",
            best.location.latitude, best.location.longitude, best.location.horizontal_accuracy
        );
    }
    if let Some(here) = handle.current_location().await? {
        println!(
            "  current        {:.6}, {:.6} ({:.0} m from start)",
            here.latitude,
            here.longitude,
            distance(start, &here)
        );
    }
    for id in handle.find_nodes("start").await? {
        if let Some(node) = handle.node(id).await? {
            let state = if node.is_confirmed() {
                "confirmed".green()
            } else {
                "provisional".yellow()
            };
            println!("  start marker   {state}");
        }
    }
    Ok(())
}

fn spawn_printer(mut events: TopicReceiver) -> JoinHandle<EventTally> {
    tokio::spawn(async move {
        let mut tally = EventTally::default();
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event, &mut tally),
                Err(RecvError::Lagged(n)) => tracing::warn!(lagged_by = n, "Event printer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
        tally
    })
}

fn print_event(event: &Event, tally: &mut EventTally) {
    let time = event.timestamp.format("%H:%M:%S%.3f").to_string().dimmed();
    match &event.payload {
        EventPayload::EstimateRecorded { coordinate, .. } => {
            tally.estimates += 1;
            println!(
                "  {time} {} ±{:.1} m",
                "estimate".cyan(),
                coordinate.horizontal_accuracy
            );
        }
        EventPayload::EstimateEvicted { reason, .. } => {
            tally.evictions += 1;
            println!("  {time} {} {reason:?}", "evicted".dimmed());
        }
        EventPayload::NodeConfirmed { node, coordinate } => {
            tally.confirmations += 1;
            println!(
                "  {time} {} {} at {:.6}, {:.6}",
                "confirmed".green().bold(),
                node,
                coordinate.latitude,
                coordinate.longitude
            );
        }
        // Updates arrive every tick for every node; only counted.
        EventPayload::NodeUpdated { .. } => tally.updates += 1,
        EventPayload::SceneRootEstablished => {
            println!("  {time} {}", "scene root established".bold());
        }
        EventPayload::HeadingReset { heading_deg } => {
            println!("  {time} {} (heading {heading_deg:.1}°)", "yaw reset".magenta());
        }
        EventPayload::TickSkipped { reason } => {
            tally.diagnostics += 1;
            println!("  {time} {} {reason}", "tick skipped".yellow());
        }
        EventPayload::TrackingStateChanged { state } => {
            tally.diagnostics += 1;
            println!("  {time} {} {state:?}", "tracking".yellow());
        }
        EventPayload::SensorFault { component, message } => {
            tally.diagnostics += 1;
            println!("  {time} {} {component}: {message}", "fault".red().bold());
        }
        EventPayload::SensorStale { component } => {
            tally.diagnostics += 1;
            println!("  {time} {} {component}", "stale".red());
        }
    }
}
