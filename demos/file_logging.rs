//! File logging example
//!
//! Demonstrates a declarative setup with a console sink and a rotating
//! file sink serving different groups.
//!
//! Run with: cargo run --example file_logging

use rust_group_logger::prelude::*;

const CONFIG: &str = r#"{
    "sinks": [
        { "name": "console", "type": "console", "color": true },
        {
            "name": "audit",
            "type": "rotating_file",
            "path": "logs/audit.log",
            "rotation": { "strategy": { "size": { "max_bytes": 1048576 } }, "max_backups": 3, "compress": true },
            "thread": "id"
        }
    ],
    "groups": [
        { "name": "*", "sink": "console", "level": "info", "children": [
            { "name": "audit", "sink": "audit", "level": "verbose" }
        ]}
    ]
}"#;

fn main() -> Result<()> {
    println!("=== Rust Group Logger - File Logging Example ===\n");

    let system = LoggingSystem::new();
    let outcome = system.configure(&DeclarativeConfigurator::from_json(CONFIG)?);
    println!("Configuration: {}\n", outcome);
    if !outcome.is_usable() {
        return Err(LoggerError::config("file_logging", outcome.message));
    }

    let app = system.get_logger("app", ROOT_GROUP, None, None)?;
    let audit = system.get_logger("audit", "audit", None, None)?;

    app.info("Application started");
    audit.verbose("user 42 logged in");
    for i in 1..=5 {
        audit.info(format!("Processing item {}/5", i));
        if i == 3 {
            app.warn("Item 3 took longer than expected");
        }
    }
    app.info("All operations completed");

    drop(app);
    drop(audit);
    // Dropping the system drains and closes every sink
    drop(system);

    println!("\n=== Example completed successfully! ===");
    println!("Check 'logs/audit.log' for the audit output");
    Ok(())
}
