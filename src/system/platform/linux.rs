use super::{DiskIoTicks, PlatformDisks};

pub struct Platform;

impl PlatformDisks for Platform {
    fn disk_io_ticks() -> Vec<(String, DiskIoTicks)> {
        let Ok(stats) = procfs::diskstats() else {
            return Vec::new();
        };
        stats
            .into_iter()
            .filter(|d| !is_synthetic(&d.name))
            .map(|d| {
                (
                    d.name,
                    DiskIoTicks {
                        io_time_ms: d.time_in_progress,
                    },
                )
            })
            .collect()
    }
}

// loop/ram/zram devices report I/O time but are not physical disks.
fn is_synthetic(name: &str) -> bool {
    name.starts_with("loop") || name.starts_with("ram") || name.starts_with("zram")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_devices_are_filtered() {
        assert!(is_synthetic("loop0"));
        assert!(is_synthetic("zram0"));
        assert!(!is_synthetic("sda"));
        assert!(!is_synthetic("nvme0n1"));
    }

    #[test]
    fn diskstats_entries_are_not_synthetic() {
        for (name, _) in Platform::disk_io_ticks() {
            assert!(!is_synthetic(&name));
        }
    }
}
