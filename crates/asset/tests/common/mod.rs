//! Shared helpers for asset integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Mutex, Once};
use std::thread::{self, ThreadId};

use log::{Level, LevelFilter, Log, Metadata, Record};

struct CaptureLogger {
    records: Mutex<Vec<(ThreadId, Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((thread::current().id(), record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

/// Install the capturing logger (once per test binary) and drop anything
/// this thread logged before.
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("logger already set");
        log::set_max_level(LevelFilter::Trace);
    });
    take_logs(Level::Trace);
}

/// Drain the records logged by the current thread at `level` or more severe.
pub fn take_logs(level: Level) -> Vec<String> {
    let me = thread::current().id();
    let mut records = LOGGER.records.lock().expect("log capture poisoned");
    let mut taken = Vec::new();
    records.retain(|(id, lvl, msg)| {
        if *id != me {
            return true;
        }
        if *lvl <= level {
            taken.push(msg.clone());
        }
        false
    });
    taken
}

/// Unique path under the system temp dir for a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("discoparty-asset-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create fixture dir");
    dir.join(name)
}

/// Write `contents` to a fresh fixture file and return its path.
pub fn write_fixture(name: &str, contents: &[u8]) -> PathBuf {
    let path = fixture_path(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}
