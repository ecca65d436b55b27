//! LED Strip HTTP API Server
//!
//! Runs a web server that starts and stops effects on an addressable LED
//! strip. Any device on the LAN can pick an effect, change the palette or
//! the frame delay via simple HTTP requests.
//!
//! ## Architecture
//! - **Effect thread** (std::thread): one at a time, owns the strip while it runs
//! - **HTTP server** (tokio/axum): calls into the scheduler
//!
//! Without the `hardware` feature the strip is simulated in memory.
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/led-strip-rs --pixels 120 --pin 18 --port 8080
//! ```

use clap::Parser;
use led_strip_rs::server::{self, AppState};
use led_strip_rs::settings::{Settings, SharedSettings};
use led_strip_rs::{Controller, EffectRegistry, Scheduler, StripConfig, device};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// LED Strip HTTP API Server
#[derive(Parser)]
#[command(name = "led-strip-rs")]
#[command(about = "HTTP API server for running effects on an addressable LED strip")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Number of LEDs on the strip
    #[arg(long, default_value = "120")]
    pixels: usize,

    /// GPIO pin driving the data line
    #[arg(long, default_value = "18")]
    pin: i32,

    /// DMA channel used by the driver
    #[arg(long, default_value = "10")]
    dma: i32,

    /// Hardware brightness (0-255)
    #[arg(long, default_value = "255")]
    brightness: u8,

    /// Initial delay between frames, in milliseconds
    #[arg(long, default_value = "50")]
    frame_delay_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();
    let config = StripConfig {
        pixel_count: args.pixels,
        pin: args.pin,
        dma: args.dma,
        brightness: args.brightness,
        ..StripConfig::default()
    };

    tracing::info!("LED Strip HTTP Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Strip: {} pixels on GPIO {}", config.pixel_count, config.pin);
    tracing::info!("Port: {}", args.port);

    let strip = device::open_strip(config)?;
    let settings = SharedSettings::new(Settings {
        frame_delay: Duration::from_millis(args.frame_delay_ms),
        ..Settings::default()
    });
    let scheduler = Scheduler::new(EffectRegistry::builtin(), Controller::new(strip, settings));
    let state = AppState::new(scheduler);
    let app = server::create_router(state.clone());

    let addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", args.port);
    tracing::info!("Try: curl http://localhost:{}/api/v1/effects", args.port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down, blanking strip");
    let scheduler = state.scheduler;
    tokio::task::spawn_blocking(move || scheduler.shutdown()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
