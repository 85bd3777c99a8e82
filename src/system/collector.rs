use std::collections::HashMap;
use std::time::Instant;

use sysinfo::{Networks, Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System};

use super::identity::TOTAL_INSTANCE;
use super::platform;
use super::provider::{CounterId, CounterProvider, NumericKind, ProviderError, RawCounter};

/// The real acquisition layer: sysinfo for CPU, memory, networks and
/// per-process counters, plus the platform seam for disk busy time.
///
/// Per-process instances are labelled `name_pid` so the identity resolver
/// can key rows by PID. Raw counters carry cumulative values (accumulated
/// CPU milliseconds, total bytes written/read) stamped with a monotonic
/// per-collect timestamp.
pub struct SystemProvider {
    sys: System,
    networks: Networks,
    cores: usize,
    started: Instant,
    /// Timestamp of the latest successful collection, ms since `started`.
    now_ms: u64,
    /// Wall time between the two latest collections, for one-shot rates.
    elapsed_ms: u64,
    disk_busy: Vec<(String, f64)>,
    disk_ticks_prev: HashMap<String, u64>,
}

impl Default for SystemProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProvider {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_all();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_disk_usage(),
        );
        let cores = sys.cpus().len().max(1);
        SystemProvider {
            sys,
            networks: Networks::new_with_refreshed_list(),
            cores,
            started: Instant::now(),
            now_ms: 0,
            elapsed_ms: 1,
            disk_busy: vec![(TOTAL_INSTANCE.to_string(), 0.0)],
            disk_ticks_prev: HashMap::new(),
        }
    }

    fn refresh_disk_busy(&mut self) {
        let ticks = platform::disk_io_ticks();
        let mut next_prev = HashMap::with_capacity(ticks.len());
        let mut busy = Vec::with_capacity(ticks.len() + 1);
        let mut sum = 0.0;

        for (name, t) in ticks {
            let pct = match self.disk_ticks_prev.get(&name) {
                Some(&prev) => {
                    (t.io_time_ms.saturating_sub(prev)) as f64 / self.elapsed_ms as f64 * 100.0
                }
                None => 0.0,
            }
            .min(100.0);
            sum += pct;
            next_prev.insert(name.clone(), t.io_time_ms);
            busy.push((name, pct));
        }

        let average = if busy.is_empty() {
            0.0
        } else {
            sum / busy.len() as f64
        };
        busy.insert(0, (TOTAL_INSTANCE.to_string(), average));

        self.disk_ticks_prev = next_prev;
        self.disk_busy = busy;
    }

    fn process_label(pid: &Pid, process: &Process) -> String {
        format!("{}_{}", process.name().to_string_lossy(), pid.as_u32())
    }

    fn process_rows<F>(&self, value: F) -> Vec<(String, f64)>
    where
        F: Fn(&Process) -> f64,
    {
        self.sys
            .processes()
            .iter()
            .map(|(pid, process)| (Self::process_label(pid, process), value(process)))
            .collect()
    }

    fn process_raw<F>(&self, value: F) -> Vec<(String, RawCounter)>
    where
        F: Fn(&Process) -> u64,
    {
        let timestamp_ms = self.now_ms;
        self.sys
            .processes()
            .iter()
            .map(|(pid, process)| {
                (
                    Self::process_label(pid, process),
                    RawCounter {
                        value: value(process),
                        timestamp_ms,
                    },
                )
            })
            .collect()
    }

    fn net_rows<F>(&self, bytes: F) -> Vec<(String, f64)>
    where
        F: Fn(&sysinfo::NetworkData) -> u64,
    {
        let elapsed = self.elapsed_ms.max(1) as f64;
        self.networks
            .iter()
            .map(|(iface, data)| (iface.clone(), bytes(data) as f64 * 1000.0 / elapsed))
            .collect()
    }
}

impl CounterProvider for SystemProvider {
    fn collect_tick(&mut self) -> Result<(), ProviderError> {
        let now = self.started.elapsed().as_millis() as u64;
        self.elapsed_ms = now.saturating_sub(self.now_ms).max(1);
        self.now_ms = now;

        self.sys.refresh_memory();
        self.sys.refresh_cpu_all();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_disk_usage(),
        );
        self.networks.refresh(true);
        self.refresh_disk_busy();
        Ok(())
    }

    fn read_scalar(&self, id: CounterId) -> Result<f64, ProviderError> {
        match id {
            CounterId::SystemCpu => Ok(self.sys.global_cpu_usage() as f64),
            CounterId::RamUsed => {
                let total = self.sys.total_memory();
                if total == 0 {
                    return Err(ProviderError::CounterInvalid);
                }
                Ok(self.sys.used_memory() as f64 / total as f64 * 100.0)
            }
            other => Err(ProviderError::Unsupported(other)),
        }
    }

    fn read_formatted_array(&self, id: CounterId, _kind: NumericKind) -> Vec<(String, f64)> {
        match id {
            CounterId::DiskBusy => self.disk_busy.clone(),
            CounterId::NetSent => self.net_rows(|data| data.transmitted()),
            CounterId::NetRecv => self.net_rows(|data| data.received()),
            CounterId::ProcessCpu => self.process_rows(|p| p.cpu_usage() as f64),
            CounterId::ProcessWriteBytes => {
                let elapsed = self.elapsed_ms.max(1) as f64;
                self.process_rows(move |p| p.disk_usage().written_bytes as f64 * 1000.0 / elapsed)
            }
            CounterId::ProcessReadBytes => {
                let elapsed = self.elapsed_ms.max(1) as f64;
                self.process_rows(move |p| p.disk_usage().read_bytes as f64 * 1000.0 / elapsed)
            }
            _ => Vec::new(),
        }
    }

    fn read_raw_array(&self, id: CounterId) -> Vec<(String, RawCounter)> {
        match id {
            CounterId::ProcessCpu => self.process_raw(|p| p.accumulated_cpu_time()),
            CounterId::ProcessWriteBytes => {
                self.process_raw(|p| p.disk_usage().total_written_bytes)
            }
            CounterId::ProcessReadBytes => self.process_raw(|p| p.disk_usage().total_read_bytes),
            _ => Vec::new(),
        }
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
            // Cumulative CPU milliseconds over wall milliseconds; spans
            // 0..100·cores and is normalized only at render time.
            NumericKind::Double => dv as f64 / dt as f64 * 100.0,
            NumericKind::Large => dv as f64 * 1000.0 / dt as f64,
        })
    }

    fn core_count(&self) -> usize {
        self.cores
    }
}
