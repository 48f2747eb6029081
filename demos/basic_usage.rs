//! Basic usage example
//!
//! Demonstrates the fallback console setup, group levels and per-logger
//! overrides.
//!
//! Run with: cargo run --example basic_usage

use rust_group_logger::prelude::*;
use rust_group_logger::{debug, info};

fn main() -> Result<()> {
    println!("=== Rust Group Logger - Basic Usage Example ===\n");

    let system = LoggingSystem::new();
    let outcome = system.configure(&FallbackConfigurator::new(Level::Info));
    println!("Configuration: {}\n", outcome);

    system.make_group("net", None, None, None)?;
    let net = system.get_logger("net", "net", None, None)?;

    println!("1. Root group at INFO:");
    net.debug("connecting (hidden)");
    net.warn("timeout");

    println!("\n2. Raising the 'net' group to DEBUG:");
    system.set_level_for_group("net", Level::Debug)?;
    debug!(net, "connecting to {}:{}", "example.org", 443);

    println!("\n3. Pinning one logger to ERROR:");
    let db = system.get_logger("db", ROOT_GROUP, None, Some(Level::Error))?;
    info!(db, "pool ready (hidden)");
    db.error("pool exhausted");

    net.flush();
    drop(net);
    drop(db);
    drop(system);

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
