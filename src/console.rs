//! Heads-up debug console fed by the `log` facade.
//!
//! Info and error records emitted by this crate are appended to a bounded
//! line buffer that the renderers draw onto the console plane. Every record
//! is also handed to a forwarding logger (`env_logger` on native, the
//! browser console on the web) so nothing is lost once a line scrolls out
//! of the buffer.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

const CRATE_TARGET: &str = "room_viewer";

/// Bounded buffer holding the most recent console lines.
#[derive(Debug, Clone)]
pub struct DebugConsole {
    lines: VecDeque<String>,
    capacity: usize,
    revision: u64,
}

impl DebugConsole {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            revision: 0,
        }
    }

    pub fn push_log(&mut self, message: &str) {
        self.push(format!("[LOG] {message}"));
    }

    pub fn push_error(&mut self, message: &str) {
        self.push(format!("[ERR] {message}"));
    }

    /// Applies a new line limit, dropping the oldest lines that no longer fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        if self.lines.len() > self.capacity {
            let excess = self.lines.len() - self.capacity;
            self.lines.drain(..excess);
            self.revision += 1;
        }
    }

    fn push(&mut self, line: String) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
        self.revision += 1;
    }

    /// Lines from oldest to newest.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Bumped on every append; renderers redraw the console texture when it changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

/// Console shared between the logger and the renderer.
pub type ConsoleHandle = Arc<Mutex<DebugConsole>>;

pub fn shared_console(capacity: usize) -> ConsoleHandle {
    Arc::new(Mutex::new(DebugConsole::new(capacity)))
}

/// `log` backend that mirrors crate records into a [`DebugConsole`].
pub struct ConsoleLogger {
    console: ConsoleHandle,
    forward: Box<dyn Log>,
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(console: ConsoleHandle, forward: Box<dyn Log>, level: LevelFilter) -> Self {
        Self {
            console,
            forward,
            level,
        }
    }

    /// Installs the logger as the global `log` backend.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }

    fn record_to_console(&self, record: &Record<'_>) {
        if !record.target().starts_with(CRATE_TARGET) {
            return;
        }
        let message = record.args().to_string();
        match record.level() {
            Level::Error => self.console.lock().push_error(&message),
            Level::Info => self.console.lock().push_log(&message),
            // Warnings and chatter only reach the forwarding logger.
            _ => {}
        }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.record_to_console(record);
        if self.forward.enabled(record.metadata()) {
            self.forward.log(record);
        }
    }

    fn flush(&self) {
        self.forward.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Discard;

    impl Log for Discard {
        fn enabled(&self, _: &Metadata<'_>) -> bool {
            false
        }
        fn log(&self, _: &Record<'_>) {}
        fn flush(&self) {}
    }

    #[test]
    fn keeps_only_the_newest_lines() {
        let mut console = DebugConsole::new(20);
        for i in 0..25 {
            console.push_log(&format!("line {i}"));
        }
        assert_eq!(console.len(), 20);
        assert_eq!(console.lines().next(), Some("[LOG] line 5"));
        assert_eq!(console.lines().last(), Some("[LOG] line 24"));
        assert_eq!(console.revision(), 25);
    }

    #[test]
    fn shrinking_capacity_drops_the_oldest_lines() {
        let mut console = DebugConsole::new(20);
        console.push_log("Avatar loaded");
        console.push_log("Animations loaded");
        let revision = console.revision();

        console.set_capacity(1);
        assert_eq!(console.lines().collect::<Vec<_>>(), vec!["[LOG] Animations loaded"]);
        assert!(console.revision() > revision);

        console.push_error("Anim error: empty");
        assert_eq!(console.len(), 1);
        assert_eq!(console.lines().next(), Some("[ERR] Anim error: empty"));

        let revision = console.revision();
        console.set_capacity(0);
        assert_eq!(console.len(), 1);
        assert_eq!(console.revision(), revision);
    }

    #[test]
    fn errors_are_prefixed() {
        let mut console = DebugConsole::new(4);
        console.push_error("Avatar error: not found");
        assert!(console.contains("[ERR] Avatar error"));
    }

    #[test]
    fn logger_routes_crate_records_by_level() {
        let console = shared_console(20);
        let logger = ConsoleLogger::new(Arc::clone(&console), Box::new(Discard), LevelFilter::Info);

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("room_viewer::simulation")
                .args(format_args!("Avatar loaded"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Error)
                .target("room_viewer::assets")
                .args(format_args!("Anim error: empty"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("wgpu_core::device")
                .args(format_args!("adapter chosen"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .target("room_viewer::input")
                .args(format_args!("filtered"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Warn)
                .target("room_viewer::simulation")
                .args(format_args!("clips arrived without an avatar"))
                .build(),
        );

        let console = console.lock();
        let lines: Vec<_> = console.lines().collect();
        assert_eq!(lines, vec!["[LOG] Avatar loaded", "[ERR] Anim error: empty"]);
    }
}
