//! Property-based tests for rust_group_logger using proptest

use proptest::prelude::*;
use rust_group_logger::prelude::*;
use std::time::Duration;

fn any_level() -> impl Strategy<Value = Level> {
    prop::sample::select(Level::ALL.to_vec())
}

fn memory_system(root_level: Level) -> (LoggingSystem, MemoryHandle) {
    let memory = MemoryBackend::new();
    let handle = memory.handle();
    let system = LoggingSystem::new();
    system
        .make_sink(SinkBuilder::new("mem", memory).latency(Duration::from_millis(10)))
        .unwrap();
    system
        .make_group(ROOT_GROUP, None, Some("mem"), Some(root_level))
        .unwrap();
    (system, handle)
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// Level string conversions roundtrip, in either case
    #[test]
    fn test_level_str_roundtrip(level in any_level(), use_lower in any::<bool>()) {
        let text = if use_lower {
            level.to_str().to_lowercase()
        } else {
            level.to_str().to_string()
        };
        let parsed: Level = text.parse().unwrap();
        prop_assert_eq!(level, parsed);
        prop_assert_eq!(format!("{}", level), level.to_str());
    }

    /// Ordering follows the discriminant
    #[test]
    fn test_level_ordering(level1 in any_level(), level2 in any_level()) {
        let val1 = level1 as u8;
        let val2 = level2 as u8;

        prop_assert_eq!(level1 <= level2, val1 <= val2);
        prop_assert_eq!(level1 < level2, val1 < val2);
        prop_assert_eq!(level1.cmp(&level2), val1.cmp(&val2));
    }

    /// A threshold enables exactly the calls at or below its verbosity
    #[test]
    fn test_enabled_matches_ordering(threshold in any_level(), call in any_level()) {
        let expected = call != Level::Off && call <= threshold;
        prop_assert_eq!(threshold.is_enabled_for(call), expected);
    }
}

// ============================================================================
// Inheritance Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// In a chain of groups, each group without an explicit level reports the
    /// effective level of its parent, and loggers follow their group
    #[test]
    fn test_chain_inheritance(
        root_level in any_level(),
        explicit in prop::collection::vec(prop::option::of(any_level()), 1..8),
    ) {
        let (system, _) = memory_system(root_level);
        let mut parent = ROOT_GROUP.to_string();
        let mut names = Vec::new();
        for (i, level) in explicit.iter().enumerate() {
            let name = format!("g{}", i);
            system.make_group(&name, Some(parent.as_str()), None, *level).unwrap();
            names.push(name.clone());
            parent = name;
        }

        let leaf = system.get_logger("leaf", &parent, None, None).unwrap();

        let mut expected = root_level;
        for (name, level) in names.iter().zip(&explicit) {
            if let Some(level) = level {
                expected = *level;
            }
            let view = system.get_group(name).unwrap();
            prop_assert_eq!(view.effective_level, expected);
            let parent_view = system.get_group(view.parent.as_deref().unwrap()).unwrap();
            if view.level.is_none() {
                prop_assert_eq!(view.effective_level, parent_view.effective_level);
            }
        }
        prop_assert_eq!(leaf.effective_level(), expected);
    }

    /// After any sequence of level changes on the root, loggers without an
    /// override always match their group
    #[test]
    fn test_updates_reach_live_loggers(changes in prop::collection::vec(any_level(), 1..10)) {
        let (system, _) = memory_system(Level::Info);
        system.make_group("child", None, None, None).unwrap();
        let logger = system.get_logger("watcher", "child", None, None).unwrap();

        for level in changes {
            system.set_level_for_group(ROOT_GROUP, level).unwrap();
            prop_assert_eq!(logger.effective_level(), level);
            prop_assert_eq!(
                system.get_group("child").unwrap().effective_level,
                logger.effective_level()
            );
        }
    }

    /// Re-parenting onto any descendant fails and changes nothing
    #[test]
    fn test_reparent_onto_descendant_rejected(depth in 2usize..6, target in 0usize..6) {
        let (system, _) = memory_system(Level::Info);
        let mut parent = ROOT_GROUP.to_string();
        for i in 0..depth {
            let name = format!("n{}", i);
            system.make_group(&name, Some(parent.as_str()), None, None).unwrap();
            parent = name;
        }
        let target = format!("n{}", target % depth);

        let result = system.set_parent_for_group("n0", &target);
        let is_cycle = matches!(result, Err(LoggerError::CycleDetected { .. }));
        prop_assert!(is_cycle);
        let n0 = system.get_group("n0").unwrap();
        prop_assert_eq!(
            n0.parent.as_deref(),
            Some(ROOT_GROUP)
        );
    }
}

// ============================================================================
// Delivery Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Messages from one producer arrive complete and in order
    #[test]
    fn test_fifo_delivery(messages in prop::collection::vec("[a-zA-Z0-9 ]{1,40}", 1..100)) {
        let (system, handle) = memory_system(Level::Trace);
        let logger = system.get_logger("fifo", ROOT_GROUP, None, None).unwrap();
        for message in &messages {
            logger.info(message.as_str());
        }
        drop(logger);
        drop(system);

        let lines = handle.lines();
        prop_assert_eq!(lines.len(), messages.len());
        for (line, message) in lines.iter().zip(&messages) {
            let expected_suffix = format!("  fifo  {}", message);
            prop_assert!(line.ends_with(&expected_suffix));
        }
    }
}
