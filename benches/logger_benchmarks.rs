//! Criterion benchmarks for rust_group_logger

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_group_logger::prelude::*;
use std::sync::Arc;
use std::thread;

/// Backend that discards everything, so only the logging path is measured
struct NullBackend;

impl Backend for NullBackend {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        black_box(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn null_system(level: Level) -> LoggingSystem {
    let system = LoggingSystem::new();
    system
        .make_sink(SinkBuilder::new("null", NullBackend).capacity(100_000))
        .unwrap();
    system
        .make_group(ROOT_GROUP, None, Some("null"), Some(level))
        .unwrap();
    system
}

// ============================================================================
// Log Call Benchmarks
// ============================================================================

fn bench_log_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("log_calls");
    group.throughput(Throughput::Elements(1));

    let system = null_system(Level::Info);
    let logger = system.get_logger("bench", ROOT_GROUP, None, None).unwrap();

    group.bench_function("disabled_debug", |b| {
        b.iter(|| logger.debug(black_box("Debug message")));
    });

    group.bench_function("level_probe", |b| {
        b.iter(|| black_box(logger.is_enabled(black_box(Level::Warn))));
    });

    group.bench_function("enabled_info", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    group.bench_function("macro_formatted", |b| {
        b.iter(|| rust_group_logger::info!(logger, "request {} took {}ms", black_box(42), 7));
    });

    group.finish();
}

// ============================================================================
// Formatter Benchmarks
// ============================================================================

fn bench_formatters(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatters");
    group.throughput(Throughput::Elements(1));

    let event = rust_group_logger::Event::new(Level::Warn, "net", "connection timeout after 30s");
    let mut out = Vec::with_capacity(64 * 1024);

    let mut text = TextFormatter::new().with_thread(ThreadInfo::Name);
    group.bench_function("text", |b| {
        b.iter(|| {
            out.clear();
            text.format(black_box(&event), &mut out).unwrap();
        });
    });

    let mut json = JsonFormatter::new();
    group.bench_function("json", |b| {
        b.iter(|| {
            out.clear();
            json.format(black_box(&event), &mut out).unwrap();
        });
    });

    group.finish();
}

// ============================================================================
// Concurrency Benchmarks
// ============================================================================

fn bench_concurrent_producers(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_producers");
    let per_thread = 1_000;

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements((threads * per_thread) as u64));
        group.bench_function(format!("{}_threads", threads), |b| {
            let system = Arc::new(null_system(Level::Info));
            b.iter(|| {
                let workers: Vec<_> = (0..threads)
                    .map(|t| {
                        let system = Arc::clone(&system);
                        thread::spawn(move || {
                            let logger = system
                                .get_logger(&format!("t{}", t), ROOT_GROUP, None, None)
                                .unwrap();
                            for i in 0..per_thread {
                                logger.info(format!("message {}", i));
                            }
                        })
                    })
                    .collect();
                for worker in workers {
                    worker.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

// ============================================================================
// Reconfiguration Benchmarks
// ============================================================================

fn bench_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation");

    let system = null_system(Level::Info);
    let mut parent = ROOT_GROUP.to_string();
    for depth in 0..10 {
        let name = format!("level{}", depth);
        system.make_group(&name, Some(parent.as_str()), None, None).unwrap();
        parent = name;
    }
    let loggers: Vec<_> = (0..100)
        .map(|i| system.get_logger(&format!("l{}", i), &parent, None, None).unwrap())
        .collect();

    group.bench_function("root_level_change_100_loggers", |b| {
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            let level = if toggle { Level::Debug } else { Level::Info };
            system.set_level_for_group(ROOT_GROUP, level).unwrap();
        });
    });

    black_box(loggers);
    group.finish();
}

criterion_group!(
    benches,
    bench_log_calls,
    bench_formatters,
    bench_concurrent_producers,
    bench_propagation
);
criterion_main!(benches);
