//! The conditional debug trace behind the `log` facade.
//!
//! Active only while `CONSTELLATION_DEBUG` is set, checked per record.
//! Every line goes to standard error with a fixed prefix and, with a
//! local-time timestamp, to an append-only file. The file is opened and
//! closed per line so no handle survives a fork. Logging is best-effort:
//! I/O errors are swallowed and never fail the hook.

use std::env;
use std::fs::OpenOptions;
use std::io::Write;

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;

use crate::config;

/// Fixed location of the append-only trace file.
pub(crate) const LOG_FILE: &str = "/tmp/constellation-fs-debug.log";

const PREFIX: &str = "[LD_PRELOAD] ";

struct DebugLog;

static DEBUG_LOG: DebugLog = DebugLog;

impl Log for DebugLog {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        env::var_os(config::DEBUG).is_some()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = record.args().to_string();
        eprintln!("{}{}", PREFIX, line);
        append_to_file(&line);
    }

    fn flush(&self) {}
}

fn append_to_file(line: &str) {
    let Ok(mut file) = OpenOptions::new().create(true).append(true).open(LOG_FILE) else {
        return;
    };
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let _ = writeln!(file, "[{}] {}{}", timestamp, PREFIX, line);
}

/// Installs the trace backend; every hook calls this on entry and all but
/// the first call are no-ops.
pub(crate) fn init() {
    static INSTALLED: OnceCell<()> = OnceCell::new();
    INSTALLED.get_or_init(|| {
        // In a test harness another logger may already be installed;
        // losing the race just silences the trace.
        if log::set_logger(&DEBUG_LOG).is_ok() {
            log::set_max_level(LevelFilter::Debug);
        }
    });
}
