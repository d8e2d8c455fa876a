//! Property tests for rotation and round-trip behavior

use proptest::prelude::*;
use std::time::Duration;
use tribuf::{RegionConfig, TripleBuffer};

#[derive(Debug, Clone, Copy, PartialEq)]
struct MockData {
    value: i32,
    timestamp: u64,
}

fn ready_buffer(dir: &tempfile::TempDir) -> TripleBuffer<MockData> {
    let buffer =
        TripleBuffer::create(&dir.path().join("region"), RegionConfig::default()).unwrap();
    buffer.wait_mapped(Duration::from_secs(2)).unwrap();
    buffer
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// After k publishes (or triggers) the active index is (1 + k) % 3.
    #[test]
    fn rotation_follows_publish_count(ops in proptest::collection::vec(any::<bool>(), 0..40)) {
        let dir = tempfile::tempdir().unwrap();
        let mut buffer = ready_buffer(&dir);

        prop_assert_eq!(buffer.buffer_index(), 1);

        for (k, use_trigger) in ops.iter().enumerate() {
            if *use_trigger {
                buffer.trigger();
            } else {
                buffer.publish(&MockData { value: k as i32, timestamp: 0 });
            }
            prop_assert_eq!(buffer.buffer_index(), ((1 + k as u32 + 1) % 3));
        }

        prop_assert_eq!(buffer.publish_count(), ops.len() as u64);
    }

    /// A published value reads back field for field when nothing else
    /// publishes in between.
    #[test]
    fn publish_read_roundtrip(value in any::<i32>(), timestamp in any::<u64>()) {
        let dir = tempfile::tempdir().unwrap();
        let mut buffer = ready_buffer(&dir);

        let data = MockData { value, timestamp };
        buffer.publish(&data);

        let mut out = MockData { value: 0, timestamp: 0 };
        prop_assert!(buffer.read(&mut out));
        prop_assert_eq!(out, data);
    }
}
