pub mod app;
pub mod classify;
pub mod config;
pub mod format;
pub mod logsink;
pub mod offender;
pub mod system;
