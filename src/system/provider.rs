use std::fmt;

/// Handles for the counters the pipeline reads. Scalars and per-instance
/// arrays share the same namespace; a provider rejects mismatched reads
/// with `ProviderError::Unsupported`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CounterId {
    SystemCpu,
    RamUsed,
    DiskBusy,
    NetSent,
    NetRecv,
    ProcessCpu,
    ProcessWriteBytes,
    ProcessReadBytes,
}

/// Numeric interpretation requested for a formatted read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericKind {
    /// Fractional values (percentages).
    Double,
    /// 64-bit counts (byte totals and rates).
    Large,
}

/// Opaque raw counter state. The pipeline never interprets these fields;
/// it only stores pairs of them and hands them back to
/// [`CounterProvider::compute_rate_from_raw`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawCounter {
    pub value: u64,
    pub timestamp_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderError {
    /// The per-tick refresh failed; every read for this tick is stale.
    CollectionFailed,
    /// The counter exists but cannot produce a value right now
    /// (mid-reconfiguration, counter reset, zero elapsed time).
    CounterInvalid,
    /// The provider does not serve this counter in the requested shape.
    Unsupported(CounterId),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::CollectionFailed => write!(f, "counter collection failed"),
            ProviderError::CounterInvalid => write!(f, "counter temporarily invalid"),
            ProviderError::Unsupported(id) => write!(f, "counter {id:?} not supported"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Boundary to the counter acquisition layer.
///
/// `collect_tick` must be called once per tick before any read; reads
/// return values as of the most recent successful collection. Array reads
/// return an empty vector on error rather than failing the tick.
pub trait CounterProvider {
    fn collect_tick(&mut self) -> Result<(), ProviderError>;

    fn read_scalar(&self, id: CounterId) -> Result<f64, ProviderError>;

    fn read_formatted_array(&self, id: CounterId, kind: NumericKind) -> Vec<(String, f64)>;

    fn read_raw_array(&self, id: CounterId) -> Vec<(String, RawCounter)>;

    /// Converts two chronologically ordered raw samples into a rate.
    /// Fails with `CounterInvalid` when the pair cannot produce one
    /// (no elapsed time, counter went backwards).
    fn compute_rate_from_raw(
        &self,
        id: CounterId,
        kind: NumericKind,
        current: &RawCounter,
        previous: &RawCounter,
    ) -> Result<f64, ProviderError>;

    /// Logical core count, for normalizing per-process CPU at display time.
    fn core_count(&self) -> usize;

    /// Whether per-process instance labels carry a `_pid` suffix. When
    /// false the offender search degrades to name-keyed scanning.
    fn pid_instances_supported(&self) -> bool {
        true
    }
}
