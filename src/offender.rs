use std::collections::HashMap;

use crate::classify::Bottleneck;
use crate::system::identity::{IDLE_INSTANCE, TOTAL_INSTANCE, resolve_instance};
use crate::system::provider::{CounterId, CounterProvider, NumericKind};
use crate::system::sample::ProcessCounters;

/// The process a verdict blames. `pid` is absent only on the degraded
/// name-keyed path; `value` is the raw metric for the chosen dimension
/// (per-process CPU un-normalized).
#[derive(Clone, Debug, PartialEq)]
pub struct Offender {
    pub name: String,
    pub pid: Option<u32>,
    pub value: f64,
}

/// Scans the current sample's identity-present rows for the maximum of
/// the field matching the classification.
///
/// Ties keep the first-encountered maximum, which is stable because the
/// rows are in provider enumeration order. A set where nothing exceeds
/// zero yields no offender; the tick still renders with an empty process
/// field.
pub fn find_offender(cause: Bottleneck, processes: &[ProcessCounters]) -> Option<Offender> {
    let value_of = metric(cause)?;
    let mut best: Option<&ProcessCounters> = None;
    for pc in processes {
        let v = value_of(pc);
        if v > best.map(value_of).unwrap_or(0.0) {
            best = Some(pc);
        }
    }
    best.map(|pc| Offender {
        name: pc.name.clone(),
        pid: Some(pc.pid),
        value: value_of(pc),
    })
}

fn metric(cause: Bottleneck) -> Option<fn(&ProcessCounters) -> f64> {
    match cause {
        Bottleneck::None => None,
        Bottleneck::Cpu => Some(|pc| pc.cpu_pct),
        Bottleneck::WriteIo => Some(|pc| pc.write_bps as f64),
        Bottleneck::ReadIo => Some(|pc| pc.read_bps as f64),
        Bottleneck::TotalIo => Some(|pc| pc.total_bps as f64),
    }
}

/// Name-keyed fallback for providers without PID-qualified instance
/// labels. Scans one-shot formatted arrays, excluding the aggregate and
/// idle pseudo rows. Cannot disambiguate same-named processes, so it is
/// strictly less accurate and must only run when PID data is unavailable.
pub fn find_offender_degraded<P: CounterProvider + ?Sized>(
    cause: Bottleneck,
    provider: &P,
) -> Option<Offender> {
    let rows = match cause {
        Bottleneck::None => return None,
        Bottleneck::Cpu => {
            provider.read_formatted_array(CounterId::ProcessCpu, NumericKind::Double)
        }
        Bottleneck::WriteIo => {
            provider.read_formatted_array(CounterId::ProcessWriteBytes, NumericKind::Large)
        }
        Bottleneck::ReadIo => {
            provider.read_formatted_array(CounterId::ProcessReadBytes, NumericKind::Large)
        }
        Bottleneck::TotalIo => {
            let mut totals: Vec<(String, f64)> = Vec::new();
            let mut by_name: HashMap<String, usize> = HashMap::new();
            let write = provider.read_formatted_array(CounterId::ProcessWriteBytes, NumericKind::Large);
            let read = provider.read_formatted_array(CounterId::ProcessReadBytes, NumericKind::Large);
            for (label, v) in write.into_iter().chain(read) {
                match by_name.get(&label) {
                    Some(&idx) => totals[idx].1 += v,
                    None => {
                        by_name.insert(label.clone(), totals.len());
                        totals.push((label, v));
                    }
                }
            }
            totals
        }
    };

    let mut best: Option<(&str, f64)> = None;
    for (label, v) in &rows {
        if label == TOTAL_INSTANCE || label == IDLE_INSTANCE {
            continue;
        }
        if *v > best.map(|(_, bv)| bv).unwrap_or(0.0) {
            best = Some((label, *v));
        }
    }
    best.map(|(label, value)| {
        let identity = resolve_instance(label);
        Offender {
            name: identity.name,
            pid: identity.pid,
            value,
        }
    })
}
