//! Producer demo: creates a region and publishes a counter at 10 Hz
//!
//! Run the reader demo in a second terminal (or another machine sharing the
//! same filesystem path) to watch the updates arrive.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tribuf::{RegionConfig, TribufResult, TripleBuffer};

#[derive(Clone, Copy)]
struct Telemetry {
    value: i32,
    timestamp_ns: u64,
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

fn main() -> TribufResult<()> {
    tribuf::init_tracing();

    let path = Path::new("/dev/shm/tribuf_demo");
    println!("Tribuf Writer Demo");
    println!("==================");
    println!("Creating region at {}...", path.display());

    let mut writer = TripleBuffer::<Telemetry>::create(path, RegionConfig::default())?;
    writer.wait_mapped(Duration::from_secs(2))?;

    println!("Region ready");
    println!("  Writer PID:  {}", writer.writer_pid());
    println!("  Region size: {} bytes", writer.region_size());
    println!("  Start index: {}", writer.buffer_index());

    for i in 0..100 {
        writer.publish(&Telemetry {
            value: i,
            timestamp_ns: now_ns(),
        });
        println!(
            "published value={} (slot {}, publish #{})",
            i,
            writer.buffer_index(),
            writer.publish_count()
        );
        std::thread::sleep(Duration::from_millis(100));
    }

    // One heartbeat so late readers still get a wakeup.
    writer.trigger();
    println!("Done. Backing file left in place for readers.");

    Ok(())
}
