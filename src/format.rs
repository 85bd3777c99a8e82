use std::collections::VecDeque;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::classify::Bottleneck;
use crate::offender::Offender;

/// Adaptive lines never exceed this many display columns.
pub const LINE_WIDTH_BUDGET: usize = 79;
/// Column header printed once at startup and mirrored to the log sink.
pub const COLUMN_HEADER: &str = "Disk   Download\tUpload\tCPU    Process\tRAM";
const WINDOW_CAPACITY: usize = 10;
const COLUMN_PAD: usize = 2;
const TRUNCATION_MARK: &str = "...";

/// Everything the renderer needs for one tick's line. `cpu_pct` and the
/// other scalars are system-wide; the offender's value stays raw.
#[derive(Clone, Debug)]
pub struct Verdict {
    pub disk_pct: f64,
    pub recv: u64,
    pub sent: u64,
    pub cpu_pct: f64,
    pub ram_pct: f64,
    pub cause: Bottleneck,
    pub offender: Option<Offender>,
}

/// Bounded FIFO of recently observed label widths. The current maximum
/// sets the column width, so a column only narrows once a long label has
/// aged out of the window instead of snapping every tick.
#[derive(Debug, Default)]
pub struct WidthWindow {
    lengths: VecDeque<usize>,
}

impl WidthWindow {
    pub fn new() -> Self {
        WidthWindow {
            lengths: VecDeque::with_capacity(WINDOW_CAPACITY),
        }
    }

    pub fn push(&mut self, width: usize) {
        if self.lengths.len() == WINDOW_CAPACITY {
            self.lengths.pop_front();
        }
        self.lengths.push_back(width);
    }

    pub fn max(&self) -> usize {
        self.lengths.iter().copied().max().unwrap_or(0)
    }

    /// Forgets the history and reseeds with a single entry, so a
    /// truncation decision is not undone by stale widths next tick.
    pub fn reset_to(&mut self, width: usize) {
        self.lengths.clear();
        self.lengths.push_back(width);
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

/// Renders verdict lines with width smoothing for the two variable-width
/// fields (cause label, name+PID label). Persists for the whole run.
#[derive(Debug, Default)]
pub struct LineRenderer {
    cause_window: WidthWindow,
    name_window: WidthWindow,
}

impl LineRenderer {
    pub fn new() -> Self {
        LineRenderer {
            cause_window: WidthWindow::new(),
            name_window: WidthWindow::new(),
        }
    }

    /// One aligned line, at most [`LINE_WIDTH_BUDGET`] columns:
    /// `<disk%>  <recv>\t<sent>\t<cpu%>  <CAUSE>:<name>_<pid>\t<ram%>`.
    pub fn render_adaptive(&mut self, v: &Verdict) -> String {
        let disk = format!("{:5.2}", v.disk_pct);
        let recv = v.recv.to_string();
        let sent = v.sent.to_string();
        let cpu = format!("{:5.2}", v.cpu_pct);
        let ram = format!("{:5.2}", v.ram_pct);
        let cause = v.cause.label();
        let mut name = offender_label(v.offender.as_ref());

        self.cause_window.push(cause.width());
        self.name_window.push(name.width());

        let cause_pad = self.cause_window.max().saturating_sub(cause.width()) + COLUMN_PAD;
        let mut name_pad = self.name_window.max().saturating_sub(name.width()) + COLUMN_PAD;

        // Width of everything except the name label and its padding.
        // The colon and both tabs each occupy one column.
        let fixed = disk.width()
            + 2
            + recv.width()
            + 1
            + sent.width()
            + 1
            + cpu.width()
            + 2
            + cause.width()
            + cause_pad
            + 1
            + 1
            + ram.width();

        let projected = fixed + name.width() + name_pad;
        if projected > LINE_WIDTH_BUDGET {
            match v.offender.as_ref() {
                Some(offender) => {
                    let budget = LINE_WIDTH_BUDGET.saturating_sub(fixed + COLUMN_PAD);
                    name = truncated_label(offender, budget);
                    self.name_window.reset_to(name.width());
                    name_pad = COLUMN_PAD;
                }
                None => {
                    // Only stale window widths can overflow an empty name
                    // field; clamp the padding and forget them.
                    name_pad = LINE_WIDTH_BUDGET.saturating_sub(fixed);
                    self.name_window.reset_to(0);
                }
            }
        }

        format!(
            "{disk}  {recv}\t{sent}\t{cpu}  {cause}{:cause_pad$}:{name}{:name_pad$}\t{ram}",
            "", ""
        )
    }
}

/// Machine-readable rendering: the same six fields joined by single tabs,
/// no width smoothing, no truncation.
pub fn render_tabs(v: &Verdict) -> String {
    let name = offender_label(v.offender.as_ref());
    format!(
        "{:.2}\t{}\t{}\t{:.2}\t{}:{name}\t{:.2}",
        v.disk_pct,
        v.recv,
        v.sent,
        v.cpu_pct,
        v.cause.label(),
        v.ram_pct
    )
}

fn offender_label(offender: Option<&Offender>) -> String {
    match offender {
        Some(Offender {
            name,
            pid: Some(pid),
            ..
        }) => format!("{name}_{pid}"),
        Some(Offender { name, pid: None, .. }) => name.clone(),
        None => String::new(),
    }
}

/// Rebuilds the label with the name cut down so that
/// `<stem>...<_pid>` fits in `budget` columns.
fn truncated_label(offender: &Offender, budget: usize) -> String {
    let suffix = match offender.pid {
        Some(pid) => format!("_{pid}"),
        None => String::new(),
    };
    let keep = budget.saturating_sub(suffix.width() + TRUNCATION_MARK.len());
    let stem = truncate_to_width(&offender.name, keep);
    format!("{stem}{TRUNCATION_MARK}{suffix}")
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            break;
        }
        out.push(ch);
        width += ch_width;
    }
    out
}
