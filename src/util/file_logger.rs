use chrono::{Local, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;

/// Days of log files kept on disk
const LOG_RETENTION_DAYS: i64 = 7;

/// Guarded by the logger's mutex
struct LogFileState {
    writer: Option<BufWriter<File>>,
    current_date: Option<NaiveDate>,
}

/// Thread-safe daily log file writer
///
/// Writes to `<log_dir>/YYYY-MM-DD.log` and switches files when the local
/// date changes. Plugged into `tracing_subscriber::fmt` as its writer.
pub struct FileLogger {
    log_dir: PathBuf,
    state: Mutex<LogFileState>,
}

impl FileLogger {
    /// `~/.fabricant/logs`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".fabricant").join("logs"))
    }

    pub fn new(log_dir: PathBuf) -> Self {
        let _ = fs::create_dir_all(&log_dir);
        Self {
            log_dir,
            state: Mutex::new(LogFileState {
                writer: None,
                current_date: None,
            }),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path of the file written for `date`
    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.log_dir.join(format!("{}.log", date.format("%Y-%m-%d")))
    }

    /// Delete log files older than the retention window
    pub fn cleanup_old_logs(&self) {
        let cutoff = Local::now().date_naive() - chrono::Duration::days(LOG_RETENTION_DAYS);
        let entries = match fs::read_dir(&self.log_dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("log") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                    if date < cutoff {
                        let _ = fs::remove_file(&path);
                    }
                }
            }
        }
    }

    fn write_bytes(&self, buf: &[u8]) {
        let today = Local::now().date_naive();
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(_) => return,
        };

        // Reopen on date change
        if state.current_date != Some(today) {
            state.writer = None;
            state.current_date = None;
            if let Some(w) = self.open_log_file(today) {
                state.writer = Some(w);
                state.current_date = Some(today);
            }
        }

        if let Some(ref mut writer) = state.writer {
            let _ = writer.write_all(buf);
            let _ = writer.flush();
        }
    }

    fn open_log_file(&self, date: NaiveDate) -> Option<BufWriter<File>> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.file_for(date))
            .ok()
            .map(BufWriter::new)
    }
}

/// Per-event handle returned to `tracing_subscriber`
pub struct FileLogWriter<'a> {
    logger: &'a FileLogger,
}

impl Write for FileLogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.logger.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for FileLogger {
    type Writer = FileLogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        FileLogWriter { logger: self }
    }
}
