use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Append-only mirror of rendered lines. Each line is prefixed with a
/// local timestamp and flushed immediately; the sink never alters
/// classification or formatting.
pub struct LogSink {
    file: File,
}

impl LogSink {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(LogSink { file })
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.file, "{timestamp} {line}")?;
        self.file.flush()
    }
}
