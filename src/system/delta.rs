use std::collections::HashMap;

use super::provider::{CounterId, CounterProvider, NumericKind, RawCounter};
use super::sample::ProcessCounters;

/// The three per-process dimensions a delta can be computed for. Total
/// I/O is never fetched; it is derived from write + read afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeltaKind {
    Cpu,
    WriteIo,
    ReadIo,
}

impl DeltaKind {
    fn counter(self) -> (CounterId, NumericKind) {
        match self {
            DeltaKind::Cpu => (CounterId::ProcessCpu, NumericKind::Double),
            DeltaKind::WriteIo => (CounterId::ProcessWriteBytes, NumericKind::Large),
            DeltaKind::ReadIo => (CounterId::ProcessReadBytes, NumericKind::Large),
        }
    }

    fn raw_of(self, pc: &ProcessCounters) -> Option<&RawCounter> {
        match self {
            DeltaKind::Cpu => pc.raw_cpu.as_ref(),
            DeltaKind::WriteIo => pc.raw_write.as_ref(),
            DeltaKind::ReadIo => pc.raw_read.as_ref(),
        }
    }
}

/// Converts two successive raw snapshots of one process into a rate.
///
/// Absent previous state (a process on its first appearance) or a failed
/// conversion yields `None`; the caller keeps the zero default rather
/// than carrying a stale value forward. CPU rates are un-normalized
/// (0..100·cores) so they stay comparable for ranking; division by core
/// count happens at render time only.
pub fn compute_delta<P: CounterProvider + ?Sized>(
    provider: &P,
    previous: Option<&ProcessCounters>,
    current: &ProcessCounters,
    kind: DeltaKind,
) -> Option<f64> {
    let prev_raw = kind.raw_of(previous?)?;
    let cur_raw = kind.raw_of(current)?;
    let (id, numeric) = kind.counter();
    provider
        .compute_rate_from_raw(id, numeric, cur_raw, prev_raw)
        .ok()
}

/// Fills the formatted rate fields of every row in the current sample
/// from the previous generation, correlating strictly by PID.
pub fn apply_deltas<P: CounterProvider + ?Sized>(
    provider: &P,
    previous: Option<&HashMap<u32, ProcessCounters>>,
    current: &mut [ProcessCounters],
) {
    for pc in current.iter_mut() {
        let prev = previous.and_then(|generation| generation.get(&pc.pid));
        if let Some(v) = compute_delta(provider, prev, pc, DeltaKind::Cpu) {
            pc.cpu_pct = v;
        }
        if let Some(v) = compute_delta(provider, prev, pc, DeltaKind::WriteIo) {
            pc.write_bps = v.max(0.0) as u64;
        }
        if let Some(v) = compute_delta(provider, prev, pc, DeltaKind::ReadIo) {
            pc.read_bps = v.max(0.0) as u64;
        }
        pc.total_bps = pc.write_bps + pc.read_bps;
    }
}
