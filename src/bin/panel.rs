//! Register Panel Device
//!
//! Runs the Modbus TCP slave and the panel loop. Without panel hardware the
//! display is printed to the log and buttons are read from stdin: type a
//! button number (1-8) to press it, `0` to release.
//!
//! Usage: cargo run --features bin --bin panel [bind_address] [unit_id]
//! Example: cargo run --features bin --bin panel 127.0.0.1:1502 1

use std::io::BufRead;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use voltage_modbus_slave::{
    led_mask, DisplayRenderer, ModbusSlave, PanelLoop, SlaveConfig, TcpSlaveServer,
};

/// Prints the panel to the log
struct ConsoleRenderer;

impl DisplayRenderer for ConsoleRenderer {
    fn render(&mut self, value_a: u16, value_b: u16, align_right: bool) {
        if align_right {
            info!("Display: [{:>4}] [{:>4}]", value_a, value_b);
        } else {
            info!("Display: [{:<4}] [{:<4}]", value_a, value_b);
        }
    }

    fn highlight(&mut self, slot_a: u8, slot_b: u8) {
        info!("LEDs:    {:08b}", led_mask(slot_a, slot_b).reverse_bits());
    }
}

/// Feed stdin lines into a shared button mask
fn spawn_stdin_buttons(mask: Arc<AtomicU8>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match line.trim().parse::<u8>() {
                Ok(0) => mask.store(0, Ordering::Relaxed),
                Ok(n @ 1..=8) => mask.store(1 << (n - 1), Ordering::Relaxed),
                _ => warn!("Unknown button '{}', expected 0-8", line.trim()),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("{}", voltage_modbus_slave::info());

    let mut args = std::env::args().skip(1);
    let mut config = SlaveConfig::new();
    if let Some(addr) = args.next() {
        config = config.with_bind_address(addr);
    }
    if let Some(unit) = args.next() {
        config = config.with_unit_id(unit.parse()?);
    }

    let slave = Arc::new(ModbusSlave::from_config(&config)?);
    let server = TcpSlaveServer::bind(&config, Arc::clone(&slave)).await?;

    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Server stopped: {}", e);
        }
    });

    let mask = Arc::new(AtomicU8::new(0));
    spawn_stdin_buttons(Arc::clone(&mask));
    let buttons = move || mask.load(Ordering::Relaxed);

    let panel = PanelLoop::new(Arc::clone(slave.bank()), buttons, ConsoleRenderer);
    panel
        .run(&config, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    server_task.abort();
    let stats = slave.stats();
    info!(
        "Frames: {} received, {} dropped; replies: {} sent ({} exceptions), {} dropped",
        stats.frames_received,
        stats.frames_dropped,
        stats.replies_sent,
        stats.exceptions_sent,
        stats.replies_dropped
    );

    Ok(())
}
