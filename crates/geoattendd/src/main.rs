//! geoattendd - The geofence attendance service
//!
//! This is the main entry point for the geoattendd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization and seeding
//! - Attendance engine
//! - Periodic sweeps (absence, late arrival, end of day)
//! - Notification fan-out

use anyhow::{Context, Result};
use chrono::NaiveTime;
use clap::Parser;
use geoattend_api::Notification;
use geoattend_config::{Config, ServiceConfig, load_config};
use geoattend_core::{AttendanceEngine, AttendanceResult, SweepReport};
use geoattend_notify::{ChannelSink, LogSink, NotificationSink, SessionRegistry};
use geoattend_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use geoattend_util::default_config_path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// geoattendd - Geofence-based attendance service
#[derive(Parser, Debug)]
#[command(name = "geoattendd")]
#[command(about = "Geofence-based attendance service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/geoattend/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set GEOATTEND_DATA_DIR env var)
    #[arg(short, long, env = "GEOATTEND_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    engine: Arc<AttendanceEngine>,
    registry: Arc<SessionRegistry>,
    notifications: mpsc::UnboundedReceiver<Notification>,
    store: Arc<dyn Store>,
    settings: ServiceConfig,
    config_path: PathBuf,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        // Load configuration
        let config = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            zone_count = config.zones.len(),
            team_count = config.teams.len(),
            "Configuration loaded"
        );

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| config.service.data_dir.clone());

        // Create data directory
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        // Initialize store
        let db_path = data_dir.join("geoattend.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        // Log service start
        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;

        // The engine only hands notifications off; delivery happens in the run loop
        let (sink, notifications) = ChannelSink::new();
        let engine = AttendanceEngine::new(store.clone(), Arc::new(sink))
            .context("Failed to initialize attendance engine")?;

        let Config { service, zones, teams } = config;
        engine
            .seed(&zones, &teams, geoattend_util::now())
            .context("Failed to seed zones and teams from configuration")?;

        Ok(Self {
            engine: Arc::new(engine),
            registry: Arc::new(SessionRegistry::new()),
            notifications,
            store,
            settings: service,
            config_path: args.config.clone(),
        })
    }

    async fn run(mut self) -> Result<()> {
        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        let mut absence_timer = sweep_timer(self.settings.absence_sweep_interval);
        let mut checkout_timer = sweep_timer(self.settings.auto_checkout_sweep_interval);
        let mut late_timer = sweep_timer(self.settings.late_sweep_interval);
        let mut late_threshold = self.settings.late_threshold;

        // Every notification also lands in the service log. Session
        // transports attach further subscribers to the registry.
        let mut log_feed = self.registry.subscribe_all();

        if late_threshold.is_none() {
            info!("No late threshold configured, late-arrival sweep disabled");
        }

        info!(
            absence_sweep = ?self.settings.absence_sweep_interval,
            auto_checkout_sweep = ?self.settings.auto_checkout_sweep_interval,
            late_sweep = ?self.settings.late_sweep_interval,
            "Service running"
        );

        loop {
            tokio::select! {
                // Signal: SIGTERM or SIGINT - graceful shutdown
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // Signal: SIGHUP - re-read zones and teams
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading configuration");
                    match self.reload() {
                        Ok(threshold) => late_threshold = threshold,
                        Err(e) => error!(error = %e, "Configuration reload failed, keeping current state"),
                    }
                }

                _ = absence_timer.tick() => {
                    spawn_sweep(&self.engine, "absence", |engine| {
                        engine.mark_absent_sweep(geoattend_util::now())
                    });
                }

                _ = checkout_timer.tick() => {
                    spawn_sweep(&self.engine, "auto_check_out", |engine| {
                        engine.auto_check_out_past_work_hours(geoattend_util::now())
                    });
                }

                _ = late_timer.tick() => {
                    if let Some(threshold) = late_threshold {
                        spawn_sweep(&self.engine, "late_arrivals", move |engine| {
                            engine.detect_late_arrivals(threshold, geoattend_util::now())
                        });
                    }
                }

                Some(notification) = self.notifications.recv() => {
                    self.dispatch(notification);
                }

                Some(notification) = log_feed.recv() => {
                    log_notification(notification);
                }
            }
        }

        // Graceful shutdown
        info!("Shutting down geoattendd");

        // Deliver what is already queued
        while let Ok(notification) = self.notifications.try_recv() {
            self.dispatch(notification);
        }
        while let Ok(notification) = log_feed.try_recv() {
            log_notification(notification);
        }

        // Log shutdown
        if let Err(e) = self.store.append_audit(AuditEvent::new(AuditEventType::ServiceStopped)) {
            warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }

    /// Fan a notification out to the log feed and any subscribed sessions
    fn dispatch(&self, notification: Notification) {
        let delivered = self.registry.deliver(&notification);
        debug!(employee_id = %notification.employee_id, delivered, "Notification dispatched");
    }

    /// Re-seed from the configuration file. Sweep intervals are fixed at
    /// startup; only the late threshold is picked up.
    fn reload(&self) -> Result<Option<NaiveTime>> {
        let config = load_config(&self.config_path)
            .with_context(|| format!("Failed to load config from {:?}", self.config_path))?;

        self.engine
            .seed(&config.zones, &config.teams, geoattend_util::now())
            .context("Failed to seed zones and teams from configuration")?;

        info!(
            zone_count = config.zones.len(),
            team_count = config.teams.len(),
            "Configuration reloaded"
        );
        Ok(config.service.late_threshold)
    }
}

fn log_notification(notification: Notification) {
    let employee_id = notification.employee_id.clone();
    if let Err(e) = LogSink.notify(notification) {
        warn!(employee_id = %employee_id, error = %e, "Failed to log notification");
    }
}

fn sweep_timer(period: Duration) -> Interval {
    let mut timer = tokio::time::interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

/// Run a sweep on the blocking pool so store access never stalls the loop
fn spawn_sweep<F>(engine: &Arc<AttendanceEngine>, name: &'static str, sweep: F)
where
    F: FnOnce(&AttendanceEngine) -> AttendanceResult<SweepReport> + Send + 'static,
{
    let engine = engine.clone();
    tokio::task::spawn_blocking(move || {
        if let Err(e) = sweep(&engine) {
            error!(sweep = name, error = %e, "Sweep aborted");
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "geoattendd starting"
    );

    // Create and run the service
    let service = Service::new(&args)?;
    service.run().await
}
