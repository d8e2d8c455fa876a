//! Consumer demo: attaches to the writer demo's region and follows updates

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tribuf::{RegionConfig, TribufResult, TripleBuffer, WaitOutcome};

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
    println!("Tribuf Reader Demo");
    println!("==================");
    println!("Attaching to region at {}...", path.display());

    let config = RegionConfig {
        wait_timeout: Duration::from_secs(1),
        ..RegionConfig::default()
    };
    let mut reader = TripleBuffer::<Telemetry>::attach(path, config)?;
    reader.wait_mapped(Duration::from_secs(5))?;

    println!("Attached (writer PID {})", reader.writer_pid());

    let mut out = Telemetry {
        value: 0,
        timestamp_ns: 0,
    };
    let mut idle_rounds = 0;

    while idle_rounds < 3 {
        match reader.wait_for_update(&mut out) {
            WaitOutcome::Updated => {
                idle_rounds = 0;
                let latency_ns = now_ns().saturating_sub(out.timestamp_ns);
                println!(
                    "value={} slot={} latency={}us",
                    out.value,
                    reader.buffer_index(),
                    latency_ns / 1_000
                );
            }
            WaitOutcome::Lapped => {
                println!("lapped by the writer, retrying");
            }
            WaitOutcome::TimedOut => {
                idle_rounds += 1;
                println!("no update within timeout ({idle_rounds}/3)");
            }
        }
    }

    println!("Writer went quiet, exiting.");
    Ok(())
}
