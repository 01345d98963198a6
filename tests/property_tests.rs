//! Property-based tests for rust_kvlog using proptest

use proptest::prelude::*;
use rust_kvlog::parse_size;
use rust_kvlog::prelude::*;
use rust_kvlog::Pools;
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::TRACE),
        Just(Level::DEBUG),
        Just(Level::INFO),
        Just(Level::WARN),
        Just(Level::ERROR),
    ]
}

fn capture() -> (Arc<IoWriter<Vec<u8>>>, Logger) {
    let sink = Arc::new(IoWriter::new(Vec::new()));
    let logger = Logger::new(Arc::clone(&sink)).with_pools(Pools::leaked());
    (sink, logger)
}

fn output(sink: &IoWriter<Vec<u8>>) -> String {
    sink.with_inner(|buf| String::from_utf8(buf.clone()).unwrap())
        .unwrap_or_default()
}

// ============================================================================
// Level Tests
// ============================================================================

proptest! {
    /// A record is written exactly when its level is at least the logger's
    #[test]
    fn test_level_gate_matches_ordering(threshold in any_level(), level in any_level()) {
        let (sink, logger) = capture();
        let logger = logger.with_level(threshold);

        logger.log(level, "probe", []).unwrap();

        let written = !output(&sink).is_empty();
        prop_assert_eq!(written, level >= threshold);
        prop_assert_eq!(logger.is_enabled(level), level >= threshold);
        prop_assert_eq!(logger.metrics().delivered() + logger.metrics().filtered(), 1);
    }

    /// Level ordering follows the priority
    #[test]
    fn test_level_ordering_follows_priority(a in any_level(), b in any_level()) {
        prop_assert_eq!(a < b, a.priority() < b.priority());
        prop_assert_eq!(a == b, a.priority() == b.priority());
    }

    /// Names parse back to the same level in any case
    #[test]
    fn test_level_name_roundtrip(level in any_level(), lower in any::<bool>()) {
        let name = if lower { level.name().to_lowercase() } else { level.name().to_string() };
        prop_assert_eq!(Level::from_name_strict(&name).unwrap(), level);
    }
}

// ============================================================================
// Pool Tests
// ============================================================================

proptest! {
    /// Buffers come back empty and sequential use allocates once per class
    #[test]
    fn test_pool_roundtrip(sizes in prop::collection::vec(0usize..32, 1..64)) {
        let pools = Pools::leaked();

        for &size in &sizes {
            let mut buffer = pools.fields.acquire(size);
            prop_assert_eq!(buffer.len(), 0);
            prop_assert!(buffer.capacity() >= size);
            for i in 0..size {
                buffer.push(field("i", i as i64));
            }
            pools.fields.release(buffer);
        }

        let metrics = pools.fields.metrics();
        prop_assert_eq!(metrics.acquired(), sizes.len() as u64);
        prop_assert_eq!(metrics.released(), sizes.len() as u64);
        prop_assert!(metrics.fresh_allocations() <= 4);
    }

    /// Every logged record borrows and returns its buffers
    #[test]
    fn test_logger_returns_buffers(count in 1usize..50, extra in 0usize..10) {
        let logger = Logger::new(DiscardWriter).with_pools(Pools::leaked());
        let pools = logger.pools();

        for n in 0..count {
            let fields: Vec<Field> = (0..extra).map(|i| field("k", (i + n) as i64)).collect();
            logger.info("pooled", fields);
        }

        prop_assert_eq!(pools.fields.metrics().acquired(), count as u64);
        prop_assert_eq!(pools.fields.metrics().released(), count as u64);
        prop_assert_eq!(pools.buffers.metrics().acquired(), count as u64);
        prop_assert_eq!(pools.buffers.metrics().fresh_allocations(), 1);
    }
}

// ============================================================================
// Size Parsing Tests
// ============================================================================

proptest! {
    /// Decimal and binary suffixes scale by the right factor
    #[test]
    fn test_parse_size_units(n in 0u64..10_000, unit in 0usize..5) {
        let lower = ['k', 'm', 'g', 't', 'p'][unit];
        let exp = unit as u32 + 1;

        prop_assert_eq!(parse_size(&format!("{}{}", n, lower)).unwrap(), n * 1000u64.pow(exp));
        prop_assert_eq!(
            parse_size(&format!("{}{}", n, lower.to_ascii_uppercase())).unwrap(),
            n * 1024u64.pow(exp)
        );
        prop_assert_eq!(parse_size(&format!("{}b", n)).unwrap(), n);
    }

    /// Anything that is not digits plus an optional unit is rejected
    #[test]
    fn test_parse_size_rejects_garbage(s in "[a-zA-Z.-]{1,3}[0-9]{0,3}[x.]") {
        prop_assert!(parse_size(&s).is_err());
    }
}

// ============================================================================
// Encoder Tests
// ============================================================================

proptest! {
    /// Quoted text output is always one line, whatever the message
    #[test]
    fn test_text_encoder_single_line(
        message in ".*",
        value in ".*",
        key in "[a-z_]{1,12}"
    ) {
        let (sink, logger) = capture();
        logger.info(&message, [field(key.clone(), value)]);

        let out = output(&sink);
        prop_assert!(out.ends_with('\n'));
        prop_assert_eq!(out.matches('\n').count(), 1);
        let expected = format!(" {}=", key);
        prop_assert!(out.contains(&expected));
    }

    /// JSON output always parses and keeps the message intact
    #[test]
    fn test_json_encoder_roundtrip_message(message in ".*", n in any::<i64>()) {
        let (sink, logger) = capture();
        let logger = logger.with_encoder(JsonEncoder::new());
        logger.warn(&message, [field("n", n)]);

        let out = output(&sink);
        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        prop_assert_eq!(value["msg"].as_str(), Some(message.as_str()));
        prop_assert_eq!(value["n"].as_i64(), Some(n));
    }
}
