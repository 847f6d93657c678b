//! UDP Joystick bridge
//!
//! Reads gamepads through gilrs and sends each device's heading to a UDP
//! receiver.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use udp_joystick::config::{AppConfig, ConfigWatcher, TransportKind};
use udp_joystick::input::GamepadProvider;
use udp_joystick::session::JoystickSession;
use udp_joystick::transport;

/// UDP Joystick - send gamepad headings to a remote receiver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Receiver address, overrides transport.destination
    #[arg(short, long, env = "UDP_JOYSTICK_TARGET")]
    target: Option<String>,

    /// Log messages instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long)]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging (guard flushes the file writer on exit)
    let _log_guard = init_logging(&args.log_level, args.log_dir.as_deref())?;

    info!("Starting UDP Joystick...");
    info!("Configuration file: {}", args.config);

    let mut config = AppConfig::load_or_default(&args.config).await?;
    apply_overrides(&mut config, &args);
    info!(
        "Sending headings to {} via {:?}",
        config.transport.destination, config.transport.kind
    );

    // Hot-reload only makes sense for a file that exists
    let config_watcher = if Path::new(&args.config).exists() {
        match ConfigWatcher::new(args.config.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Config hot-reload disabled: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    run_app(config, args, config_watcher, shutdown_signal()).await?;

    info!("UDP Joystick shutdown complete");
    Ok(())
}

async fn run_app(
    config: AppConfig,
    args: Args,
    mut config_watcher: Option<ConfigWatcher>,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let sink = transport::from_config(&config.transport);
    info!("Transport sink ready: {}", sink.name());

    let mut session = JoystickSession::new(
        sink.clone(),
        config.transport.destination.clone(),
        config.heading.dead_zone,
    );

    let (mut provider, mut input_rx) = GamepadProvider::start(config.input.clone());
    info!("✅ Gamepad provider started");

    let mut active = config;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Input events are applied strictly in arrival order
            event = input_rx.recv() => {
                match event {
                    Some(event) => {
                        session.handle(event);
                    }
                    None => {
                        warn!("Gamepad provider stopped, no more input");
                        break;
                    }
                }
            }

            // Handle config reload
            Some(mut new_config) = next_reload(&mut config_watcher) => {
                info!("📝 Configuration file changed, reloading...");
                apply_overrides(&mut new_config, &args);
                apply_reload(&mut session, &active, &new_config);
                active = new_config;
            }

            // Handle shutdown signal
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    // Cleanup
    info!("Shutting down...");
    provider.shutdown().await;
    sink.shutdown();

    Ok(())
}

/// Command line flags win over the config file
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(target) = &args.target {
        config.transport.destination = target.clone();
    }
    if args.dry_run {
        config.transport.kind = TransportKind::Console;
    }
}

fn apply_reload(session: &mut JoystickSession, old: &AppConfig, new: &AppConfig) {
    if new.transport.destination != old.transport.destination {
        session.set_destination(new.transport.destination.clone());
        info!("✅ Destination now {}", new.transport.destination);
    }
    if new.heading.dead_zone != old.heading.dead_zone {
        session.set_dead_zone(new.heading.dead_zone);
        info!("✅ Dead zone now {}", new.heading.dead_zone);
    }
    if new.transport.kind != old.transport.kind
        || new.transport.default_port != old.transport.default_port
        || new.input != old.input
    {
        warn!("⚠️  Transport and input settings take effect after restart");
    }
    debug!("Active config: {:?}", new);
}

/// Next reloaded config, or never when hot-reload is off
async fn next_reload(watcher: &mut Option<ConfigWatcher>) -> Option<AppConfig> {
    match watcher {
        Some(watcher) => watcher.next_config().await,
        None => std::future::pending().await,
    }
}

fn init_logging(level: &str, log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "udp-joystick.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
