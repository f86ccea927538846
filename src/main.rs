use cd22_bridge::config::{Config, ConfigLoader};
use cd22_bridge::rest_api::{build_router, RestContext};
use cd22_bridge::{logging, Cd22, DeviceService};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

// Command-line arguments. Flags override the config file and environment.
#[derive(Parser, Debug)]
#[command(
    version,
    about = "HTTP bridge for a CD22 controller on a serial port.",
    long_about = "Opens the serial port once, then serves /api/command, /api/read and /api/write as JSON endpoints plus a small browser front end."
)]
struct Args {
    /// Serial port name
    #[arg(long)]
    port: Option<String>,

    /// Serial port baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// HTTP listen address
    #[arg(long)]
    addr: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "cd22_bridge=trace"
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.serial.port = port;
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(addr) = self.addr {
            config.server.listen = addr;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = Args::parse();

    let loader = match args.config.take() {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let config_path = loader.config_path.clone();
    let mut config = loader.into_config();
    args.apply(&mut config);
    config.validate()?;

    logging::init(&config.logging);
    if let Some(path) = config_path {
        info!(path = %path.display(), "loaded configuration");
    }

    let device = match Cd22::open(&config.serial.port, config.serial.device_config()) {
        Ok(device) => device,
        Err(e) => {
            error!(port = %config.serial.port, error = %e, "failed to open serial port");
            return Err(e.into());
        }
    };

    let ctx = RestContext {
        service: DeviceService::new(device),
        static_dir: config.server.static_dir.clone(),
    };
    let app = build_router(ctx);

    let listener = TcpListener::bind(config.server.bind_address()).await?;
    info!(
        listen = %listener.local_addr()?,
        serial = %config.serial.port,
        baud_rate = config.serial.baud_rate,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

// --- Graceful Shutdown Handler ---
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, shutting down");
}
