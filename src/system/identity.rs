/// Instance label for the average-of-all-instances pseudo row.
pub const TOTAL_INSTANCE: &str = "_Total";
/// Instance label for the idle pseudo process.
pub const IDLE_INSTANCE: &str = "Idle";

const PID_SEPARATOR: char = '_';

/// A process instance label resolved to a stable key.
///
/// Identity is always by PID, never by name: two processes may share a
/// display name. Labels without a parseable PID suffix resolve to no
/// identity and stay out of per-process ranking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessIdentity {
    pub pid: Option<u32>,
    pub name: String,
}

impl ProcessIdentity {
    fn anonymous(label: &str) -> Self {
        ProcessIdentity {
            pid: None,
            name: label.to_string(),
        }
    }
}

/// Parses a `name_pid` instance label.
///
/// The aggregate and idle pseudo instances, labels without a separator,
/// and labels whose suffix is not a non-negative integer all resolve to
/// an absent PID. A malformed suffix is expected steady-state noise from
/// the data source, not an error.
pub fn resolve_instance(label: &str) -> ProcessIdentity {
    if label == TOTAL_INSTANCE || label == IDLE_INSTANCE {
        return ProcessIdentity::anonymous(label);
    }
    let Some((name, suffix)) = label.rsplit_once(PID_SEPARATOR) else {
        return ProcessIdentity::anonymous(label);
    };
    if name.is_empty() {
        return ProcessIdentity::anonymous(label);
    }
    match suffix.parse::<u32>() {
        Ok(pid) => ProcessIdentity {
            pid: Some(pid),
            name: name.to_string(),
        },
        Err(_) => ProcessIdentity::anonymous(label),
    }
}
