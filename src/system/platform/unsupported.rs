use super::{DiskIoTicks, PlatformDisks};

pub struct Platform;

impl PlatformDisks for Platform {
    fn disk_io_ticks() -> Vec<(String, DiskIoTicks)> {
        // No per-device busy time on this platform; the disk column
        // renders as 0.00 and classification falls through to network.
        Vec::new()
    }
}
