//! Async logging example
//!
//! Demonstrates many threads sharing one sink and the drop counter of a
//! small queue.
//!
//! Run with: cargo run --example async_logging

use rust_group_logger::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Group Logger - Async Logging Example ===\n");

    let system = Arc::new(LoggingSystem::new());
    system.make_sink(
        SinkBuilder::new("console", ConsoleBackend::stdout())
            .formatter(TextFormatter::new().with_color(true).with_thread(ThreadInfo::Name))
            .capacity(64)
            .overflow_policy(OverflowPolicy::DropNewest)
            .on_overflow(Arc::new(|sink, dropped| {
                eprintln!("[overflow] sink '{}' has dropped {} events", sink, dropped);
            })),
    )?;
    system.make_group(ROOT_GROUP, None, Some("console"), Some(Level::Info))?;

    println!("1. Multi-threaded logging:");
    let mut handles = vec![];
    for thread_id in 0..5 {
        let system = Arc::clone(&system);
        let handle = thread::Builder::new()
            .name(format!("worker-{}", thread_id))
            .spawn(move || {
                let logger = system
                    .get_logger(&format!("worker.{}", thread_id), ROOT_GROUP, None, None)
                    .expect("root group exists");
                for i in 0..20 {
                    logger.info(format!("Thread {} - Message {}", thread_id, i));
                    thread::sleep(Duration::from_millis(10));
                }
            })?;
        handles.push(handle);
    }
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    println!("\n2. Flooding a 64-slot queue:");
    let flood = system.get_logger("flood", ROOT_GROUP, None, None)?;
    for i in 0..10_000 {
        flood.info(format!("Flood message {}", i));
    }

    let sink = flood.sink();
    println!(
        "\n   enqueued: {}, dropped: {}",
        sink.metrics().enqueued_count(),
        sink.metrics().dropped_count()
    );

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
