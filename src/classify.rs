/// System CPU percent at or above this preempts every I/O signal.
pub const CPU_SATURATION_PCT: f64 = 90.0;
/// Single-disk busy percent at or above this marks a disk bottleneck.
pub const DISK_BUSY_PCT: f64 = 20.0;

/// The resource dimension a tick's verdict blames. Closed set so the
/// classifier, the offender search and the renderer all match
/// exhaustively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Bottleneck {
    /// No verdict. The classifier never produces this; it is the state
    /// before classification and the render default.
    #[default]
    None,
    Cpu,
    WriteIo,
    ReadIo,
    TotalIo,
}

impl Bottleneck {
    pub fn label(self) -> &'static str {
        match self {
            Bottleneck::None => "",
            Bottleneck::Cpu => "CPU",
            Bottleneck::WriteIo => "WRITE",
            Bottleneck::ReadIo => "READ",
            Bottleneck::TotalIo => "IO",
        }
    }
}

/// Decides the tick's verdict from the current scalars alone. Pure:
/// identical inputs always classify identically, with no memory of past
/// ticks.
///
/// Precedence: CPU saturation preempts everything; sustained disk busy
/// time outweighs network throughput; network direction picks between
/// read and write. When traffic is balanced the same tree is re-entered
/// with >0 comparisons, defaulting to TotalIo when every signal is zero.
pub fn classify(cpu_pct: f64, disk_busy_pct: f64, sent: u64, recv: u64) -> Bottleneck {
    if cpu_pct >= CPU_SATURATION_PCT {
        return Bottleneck::Cpu;
    }
    if disk_busy_pct >= DISK_BUSY_PCT {
        return Bottleneck::TotalIo;
    }
    if recv > sent {
        return Bottleneck::ReadIo;
    }
    if sent > recv {
        return Bottleneck::WriteIo;
    }
    // sent == recv: tie-break on whatever signal is nonzero.
    if cpu_pct > 0.0 && cpu_pct >= disk_busy_pct {
        Bottleneck::Cpu
    } else if disk_busy_pct > 0.0 {
        Bottleneck::TotalIo
    } else if recv > 0 {
        Bottleneck::ReadIo
    } else {
        Bottleneck::TotalIo
    }
}
