//! `scenegeo-runtime` – Session Loop
//!
//! Hosts a [`PositioningEngine`][scenegeo_engine::PositioningEngine] on a
//! single Tokio task and feeds it from the outside world.
//!
//! # Modules
//!
//! - [`session`] – [`SceneSession`][session::SceneSession] and its
//!   [`SessionHandle`][session::SessionHandle]: every sensor callback, host
//!   command and timer tick is marshalled onto one ordered channel, so the
//!   engine and its node registry are only ever touched from one context.
//! - [`ticker`] – [`TickTimer`][ticker::TickTimer]: the cancellable,
//!   restart-safe interval (10 Hz by default) that drives positioning passes.
//! - [`watchdog`] – [`SensorWatchdog`][watchdog::SensorWatchdog]: reports a
//!   location or tracking feed that has gone quiet, once per outage.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod session;
pub mod telemetry;
pub mod ticker;
pub mod watchdog;

pub use session::{SceneSession, SessionConfig, SessionHandle, SessionMessage};
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
pub use ticker::{DEFAULT_TICK_HZ, TickTimer};
pub use watchdog::{FeedHealth, SensorWatchdog};
