use std::collections::HashMap;

use super::identity::{TOTAL_INSTANCE, resolve_instance};
use super::provider::{CounterId, CounterProvider, NumericKind, ProviderError, RawCounter};

/// Per-process state for one tick. Raw counter fields are provider-owned
/// opaque pairs; the formatted fields default to zero until the delta
/// engine fills them (a process seen for the first time keeps the zeros).
#[derive(Clone, Debug, Default)]
pub struct ProcessCounters {
    pub pid: u32,
    pub name: String,
    pub raw_cpu: Option<RawCounter>,
    pub raw_write: Option<RawCounter>,
    pub raw_read: Option<RawCounter>,
    pub cpu_pct: f64,
    pub write_bps: u64,
    pub read_bps: u64,
    pub total_bps: u64,
}

/// One tick's complete readings.
///
/// `processes` holds only identity-present rows, in the provider's
/// enumeration order so that offender ties resolve stably.
#[derive(Clone, Debug)]
pub struct Sample {
    pub cpu_pct: f64,
    pub disk_busy_pct: f64,
    pub net_sent: u64,
    pub net_recv: u64,
    pub ram_pct: f64,
    pub processes: Vec<ProcessCounters>,
}

/// Two-generation per-process history. Only the previous tick's process
/// map is retained; scalar fields are dropped on demotion.
#[derive(Debug, Default)]
pub struct TickHistory {
    previous: Option<HashMap<u32, ProcessCounters>>,
}

impl TickHistory {
    pub fn new() -> Self {
        TickHistory::default()
    }

    pub fn previous(&self) -> Option<&HashMap<u32, ProcessCounters>> {
        self.previous.as_ref()
    }

    /// Demotes the current sample: its process rows become the previous
    /// generation, keyed by PID for cross-tick correlation.
    pub fn advance(&mut self, sample: Sample) {
        self.previous = Some(
            sample
                .processes
                .into_iter()
                .map(|pc| (pc.pid, pc))
                .collect(),
        );
    }
}

/// Reads one tick's worth of values from the provider.
///
/// A failed CPU scalar read or an empty disk array abandons the tick.
/// Missing network or RAM data degrades to zero, and missing per-process
/// arrays leave `processes` empty; both still produce a renderable line.
pub fn build_sample<P: CounterProvider + ?Sized>(provider: &P) -> Result<Sample, ProviderError> {
    let cpu_pct = provider.read_scalar(CounterId::SystemCpu)?;

    let disks = provider.read_formatted_array(CounterId::DiskBusy, NumericKind::Double);
    if disks.is_empty() {
        return Err(ProviderError::CounterInvalid);
    }
    // The aggregate row averages all disks; the verdict wants the single
    // busiest one.
    let disk_busy_pct = disks
        .iter()
        .filter(|(label, _)| label != TOTAL_INSTANCE)
        .map(|&(_, v)| v)
        .fold(0.0_f64, f64::max);

    let net_sent = sum_array(provider, CounterId::NetSent);
    let net_recv = sum_array(provider, CounterId::NetRecv);
    let ram_pct = provider.read_scalar(CounterId::RamUsed).unwrap_or(0.0);

    Ok(Sample {
        cpu_pct,
        disk_busy_pct,
        net_sent,
        net_recv,
        ram_pct,
        processes: collect_processes(provider),
    })
}

fn sum_array<P: CounterProvider + ?Sized>(provider: &P, id: CounterId) -> u64 {
    provider
        .read_formatted_array(id, NumericKind::Large)
        .iter()
        .map(|&(_, v)| v.max(0.0) as u64)
        .sum()
}

/// Merges the three per-process raw arrays into one row per PID,
/// correlated by key rather than by array position. Rows without identity
/// (aggregate, idle, malformed labels) are dropped here.
fn collect_processes<P: CounterProvider + ?Sized>(provider: &P) -> Vec<ProcessCounters> {
    let mut rows: Vec<ProcessCounters> = Vec::new();
    let mut by_pid: HashMap<u32, usize> = HashMap::new();

    let mut merge = |label: &str, raw: RawCounter, slot: fn(&mut ProcessCounters) -> &mut Option<RawCounter>| {
        let identity = resolve_instance(label);
        let Some(pid) = identity.pid else {
            return;
        };
        let idx = *by_pid.entry(pid).or_insert_with(|| {
            rows.push(ProcessCounters {
                pid,
                name: identity.name.clone(),
                ..ProcessCounters::default()
            });
            rows.len() - 1
        });
        *slot(&mut rows[idx]) = Some(raw);
    };

    for (label, raw) in provider.read_raw_array(CounterId::ProcessCpu) {
        merge(&label, raw, |pc| &mut pc.raw_cpu);
    }
    for (label, raw) in provider.read_raw_array(CounterId::ProcessWriteBytes) {
        merge(&label, raw, |pc| &mut pc.raw_write);
    }
    for (label, raw) in provider.read_raw_array(CounterId::ProcessReadBytes) {
        merge(&label, raw, |pc| &mut pc.raw_read);
    }

    rows
}
