/// Cumulative time a block device has spent with I/O in flight, as
/// reported by the OS. Busy percent is a delta of this over wall time.
#[derive(Clone, Copy, Debug)]
pub struct DiskIoTicks {
    pub io_time_ms: u64,
}

pub trait PlatformDisks {
    fn disk_io_ticks() -> Vec<(String, DiskIoTicks)>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod unsupported;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(not(target_os = "linux"))]
use unsupported as platform_impl;

pub fn disk_io_ticks() -> Vec<(String, DiskIoTicks)> {
    platform_impl::Platform::disk_io_ticks()
}
