use std::collections::HashMap;

use chokepoint::app::{Monitor, TickOutcome};
use chokepoint::system::provider::{
    CounterId, CounterProvider, NumericKind, ProviderError, RawCounter,
};
use unicode_width::UnicodeWidthStr;

/// One scripted tick's worth of provider data.
#[derive(Clone, Default)]
struct TickData {
    collect_fails: bool,
    scalars: HashMap<CounterId, f64>,
    formatted: HashMap<CounterId, Vec<(String, f64)>>,
    raw: HashMap<CounterId, Vec<(String, RawCounter)>>,
}

impl TickData {
    fn healthy(cpu: f64, disk: f64, sent: f64, recv: f64) -> Self {
        let mut data = TickData::default();
        data.scalars.insert(CounterId::SystemCpu, cpu);
        data.scalars.insert(CounterId::RamUsed, 40.0);
        data.formatted.insert(
            CounterId::DiskBusy,
            vec![("_Total".to_string(), disk), ("sda".to_string(), disk)],
        );
        data.formatted
            .insert(CounterId::NetSent, vec![("eth0".to_string(), sent)]);
        data.formatted
            .insert(CounterId::NetRecv, vec![("eth0".to_string(), recv)]);
        data
    }

    fn failing() -> Self {
        TickData {
            collect_fails: true,
            ..TickData::default()
        }
    }

    /// Adds one process row to all three raw arrays. Counters are
    /// cumulative: CPU milliseconds, total bytes written, total read.
    fn with_proc(mut self, label: &str, cpu_ms: u64, written: u64, read: u64, ts: u64) -> Self {
        let raw = |value| RawCounter {
            value,
            timestamp_ms: ts,
        };
        self.raw
            .entry(CounterId::ProcessCpu)
            .or_default()
            .push((label.to_string(), raw(cpu_ms)));
        self.raw
            .entry(CounterId::ProcessWriteBytes)
            .or_default()
            .push((label.to_string(), raw(written)));
        self.raw
            .entry(CounterId::ProcessReadBytes)
            .or_default()
            .push((label.to_string(), raw(read)));
        self
    }
}

/// Replays a fixed script of ticks; every `collect_tick` consumes one.
struct ScriptedProvider {
    ticks: Vec<TickData>,
    cursor: Option<usize>,
    cores: usize,
}

impl ScriptedProvider {
    fn new(ticks: Vec<TickData>) -> Self {
        ScriptedProvider {
            ticks,
            cursor: None,
            cores: 4,
        }
    }

    fn current(&self) -> &TickData {
        &self.ticks[self.cursor.expect("collect_tick not called")]
    }
}

impl CounterProvider for ScriptedProvider {
    fn collect_tick(&mut self) -> Result<(), ProviderError> {
        let next = self.cursor.map(|c| c + 1).unwrap_or(0);
        self.cursor = Some(next);
        if self.ticks[next].collect_fails {
            Err(ProviderError::CollectionFailed)
        } else {
            Ok(())
        }
    }

    fn read_scalar(&self, id: CounterId) -> Result<f64, ProviderError> {
        self.current()
            .scalars
            .get(&id)
            .copied()
            .ok_or(ProviderError::CounterInvalid)
    }

    fn read_formatted_array(&self, id: CounterId, _kind: NumericKind) -> Vec<(String, f64)> {
        self.current().formatted.get(&id).cloned().unwrap_or_default()
    }

    fn read_raw_array(&self, id: CounterId) -> Vec<(String, RawCounter)> {
        self.current().raw.get(&id).cloned().unwrap_or_default()
    }

    fn compute_rate_from_raw(
        &self,
        _id: CounterId,
        kind: NumericKind,
        current: &RawCounter,
        previous: &RawCounter,
    ) -> Result<f64, ProviderError> {
        let dt = current
            .timestamp_ms
            .checked_sub(previous.timestamp_ms)
            .filter(|&dt| dt > 0)
            .ok_or(ProviderError::CounterInvalid)?;
        let dv = current
            .value
            .checked_sub(previous.value)
            .ok_or(ProviderError::CounterInvalid)?;
        Ok(match kind {
            NumericKind::Double => dv as f64 / dt as f64 * 100.0,
            NumericKind::Large => dv as f64 * 1000.0 / dt as f64,
        })
    }

    fn core_count(&self) -> usize {
        self.cores
    }
}

fn rendered(outcome: TickOutcome) -> String {
    match outcome {
        TickOutcome::Rendered(line) => line,
        TickOutcome::Abandoned => panic!("expected a rendered line"),
    }
}

#[test]
fn saturated_cpu_blames_the_hottest_process() {
    let ticks = vec![
        TickData::healthy(95.0, 5.0, 100.0, 100.0)
            .with_proc("hog_10", 0, 0, 0, 1000)
            .with_proc("calm_11", 0, 0, 0, 1000),
        TickData::healthy(95.0, 5.0, 100.0, 100.0)
            .with_proc("hog_10", 800, 0, 0, 2000)
            .with_proc("calm_11", 100, 0, 0, 2000),
    ];
    let mut monitor = Monitor::new(ScriptedProvider::new(ticks), true);
    monitor.prime().unwrap();

    let line = rendered(monitor.tick());
    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields[4], "CPU:hog_10");
}

#[test]
fn busy_disk_blames_the_highest_total_io_process() {
    let ticks = vec![
        TickData::healthy(10.0, 25.0, 100.0, 100.0)
            .with_proc("writer_20", 0, 0, 0, 1000)
            .with_proc("reader_21", 0, 0, 0, 1000),
        TickData::healthy(10.0, 25.0, 100.0, 100.0)
            .with_proc("writer_20", 0, 9000, 1000, 2000)
            .with_proc("reader_21", 0, 2000, 3000, 2000),
    ];
    let mut monitor = Monitor::new(ScriptedProvider::new(ticks), true);
    monitor.prime().unwrap();

    let line = rendered(monitor.tick());
    assert!(line.contains("IO:writer_20"));
}

#[test]
fn inbound_heavy_network_blames_the_biggest_reader() {
    let ticks = vec![
        TickData::healthy(10.0, 5.0, 500.0, 2000.0).with_proc("dl_30", 0, 0, 0, 1000),
        TickData::healthy(10.0, 5.0, 500.0, 2000.0).with_proc("dl_30", 0, 0, 8000, 2000),
    ];
    let mut monitor = Monitor::new(ScriptedProvider::new(ticks), true);
    monitor.prime().unwrap();

    let line = rendered(monitor.tick());
    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields[1], "2000");
    assert_eq!(fields[2], "500");
    assert_eq!(fields[4], "READ:dl_30");
}

#[test]
fn first_appearance_cannot_be_the_offender() {
    let ticks = vec![
        TickData::healthy(10.0, 25.0, 100.0, 100.0).with_proc("old_1", 0, 1000, 1000, 1000),
        // new_2 shows up with enormous cumulative counters but no
        // previous generation; old_1 has a modest real delta.
        TickData::healthy(10.0, 25.0, 100.0, 100.0)
            .with_proc("old_1", 0, 2000, 2000, 2000)
            .with_proc("new_2", 0, u64::MAX / 2, u64::MAX / 2, 2000),
    ];
    let mut monitor = Monitor::new(ScriptedProvider::new(ticks), true);
    monitor.prime().unwrap();

    let line = rendered(monitor.tick());
    assert!(line.contains("IO:old_1"));
}

#[test]
fn abandoned_tick_leaves_history_intact() {
    let ticks = vec![
        TickData::healthy(10.0, 5.0, 2000.0, 500.0).with_proc("up_5", 0, 0, 0, 1000),
        TickData::failing(),
        // Two seconds after the primed generation: 5000B written.
        TickData::healthy(10.0, 5.0, 2000.0, 500.0).with_proc("up_5", 0, 5000, 0, 3000),
    ];
    let mut monitor = Monitor::new(ScriptedProvider::new(ticks), true);
    monitor.prime().unwrap();

    assert_eq!(monitor.tick(), TickOutcome::Abandoned);

    // The delta bridges the gap, so the offender is still found.
    let line = rendered(monitor.tick());
    assert!(line.contains("WRITE:up_5"));
}

#[test]
fn no_offender_still_renders_all_six_fields() {
    let ticks = vec![TickData::healthy(10.0, 5.0, 500.0, 2000.0)];
    let mut monitor = Monitor::new(ScriptedProvider::new(ticks), true);

    let line = rendered(monitor.tick());
    let fields: Vec<&str> = line.split('\t').collect();
    assert_eq!(fields.len(), 6);
    assert_eq!(fields[4], "READ:");
}

#[test]
fn adaptive_mode_truncates_runaway_names() {
    let long = format!("{}_77", "y".repeat(90));
    let ticks = vec![
        TickData::healthy(95.0, 5.0, 100.0, 100.0).with_proc(&long, 0, 0, 0, 1000),
        TickData::healthy(95.0, 5.0, 100.0, 100.0).with_proc(&long, 900, 0, 0, 2000),
    ];
    let mut monitor = Monitor::new(ScriptedProvider::new(ticks), false);
    monitor.prime().unwrap();

    let line = rendered(monitor.tick());
    assert!(line.width() <= 79);
    assert!(line.contains("..._77"));
}

#[test]
fn classification_uses_current_tick_only() {
    // Same scalars on both ticks must classify the same even though the
    // process population changed in between.
    let ticks = vec![
        TickData::healthy(10.0, 5.0, 500.0, 2000.0).with_proc("a_1", 0, 0, 0, 1000),
        TickData::healthy(10.0, 5.0, 500.0, 2000.0),
        TickData::healthy(10.0, 5.0, 500.0, 2000.0).with_proc("b_2", 0, 0, 0, 3000),
    ];
    let mut monitor = Monitor::new(ScriptedProvider::new(ticks), true);
    monitor.prime().unwrap();

    for _ in 0..2 {
        let line = rendered(monitor.tick());
        assert!(line.split('\t').nth(4).unwrap().starts_with("READ:"));
    }
}
