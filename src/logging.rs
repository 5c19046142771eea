/*
================================================================================
                            synthscope Logging System
================================================================================

Console logging through `env_logger`, plus an in-memory copy of recent records
so that a panic or an explicit `--export-logs` can write them to disk.

- `BufferLogger`: keeps the last `MAX_LOG_LINES` synthscope records
- `CompositeLogger`: console output + buffer capture
- `setup_logger()`: installs the composite logger
- `setup_panic_hook()`: writes panic.log with a backtrace and the buffered logs
- `export_debug_logs()`: writes the buffer to debug.log

**Log Levels**:
- RUST_LOG wins when set
- Debug builds: DEBUG and above for synthscope targets
- Release builds: INFO and above for synthscope targets
- Other crates are silenced

**File Locations**: `dirs::data_dir()/<app>/logs/`
================================================================================
*/

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use env_logger::fmt::{Color, Formatter};
use log::{info, Level, LevelFilter, Metadata, Record};

const MAX_LOG_LINES: usize = 1000;
const LOG_TARGET: &str = "synthscope";

pub type LogBuffer = Arc<Mutex<VecDeque<String>>>;

struct BufferLogger {
    log_buffer: LogBuffer,
}

impl BufferLogger {
    fn new() -> Self {
        Self {
            log_buffer: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES))),
        }
    }

    fn log_to_buffer(&self, message: &str, target: &str, line: Option<u32>) {
        if !target.starts_with(LOG_TARGET) {
            return;
        }

        let mut buffer = self.log_buffer.lock().unwrap();
        if buffer.len() == MAX_LOG_LINES {
            buffer.pop_front();
        }

        // The module is already in the target in most cases
        let formatted_message = if let Some(line_num) = line {
            format!("{target}:{line_num} {message}")
        } else {
            format!("{target} {message}")
        };

        buffer.push_back(formatted_message);
    }

    fn get_shared_buffer(&self) -> LogBuffer {
        Arc::clone(&self.log_buffer)
    }
}

impl log::Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with(LOG_TARGET) && metadata.level() <= LevelFilter::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("{:<5} {}", record.level(), record.args());
            self.log_to_buffer(&message, record.target(), record.line());
        }
    }

    fn flush(&self) {}
}

struct CompositeLogger {
    console_logger: env_logger::Logger,
    buffer_logger: BufferLogger,
}

impl log::Log for CompositeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console_logger.enabled(metadata) || self.buffer_logger.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.console_logger.enabled(record.metadata()) {
            self.console_logger.log(record);
        }
        if self.buffer_logger.enabled(record.metadata()) {
            self.buffer_logger.log(record);
        }
    }

    fn flush(&self) {
        self.console_logger.flush();
        self.buffer_logger.flush();
    }
}

/// Installs the console + buffer logger and returns the shared buffer.
///
/// Calling this twice leaves the first logger in place.
pub fn setup_logger(_app_name: &str) -> LogBuffer {
    let buffer_logger = BufferLogger::new();
    let shared_buffer = buffer_logger.get_shared_buffer();

    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        // Filter out all other crates' logs
        builder.filter(None, LevelFilter::Off);
        if cfg!(debug_assertions) {
            builder.filter(Some(LOG_TARGET), LevelFilter::Debug);
        } else {
            builder.filter(Some(LOG_TARGET), LevelFilter::Info);
        }
    }

    builder.format(|buf: &mut Formatter, record: &Record| {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");

        let module_info = match (record.module_path(), record.line()) {
            (Some(module), Some(line)) => format!("{module}:{line}"),
            (Some(module), None) => module.to_string(),
            (None, Some(line)) => format!("line:{line}"),
            (None, None) => "unknown".to_string(),
        };

        let mut level_style = buf.style();
        let mut meta_style = buf.style();

        match record.level() {
            Level::Error => level_style.set_color(Color::Red).set_bold(true),
            Level::Warn => level_style.set_color(Color::Yellow).set_bold(true),
            Level::Info => level_style.set_color(Color::Green).set_bold(true),
            Level::Debug => level_style.set_color(Color::Blue).set_bold(true),
            Level::Trace => level_style.set_color(Color::White),
        };

        #[cfg(target_os = "macos")]
        {
            // Color::Rgb does not render on the macOS terminal
            meta_style.set_color(Color::Blue);
        }

        #[cfg(not(target_os = "macos"))]
        {
            meta_style.set_color(Color::Rgb(120, 120, 120));
        }

        writeln!(
            buf,
            "{} {} {} {}",
            meta_style.value(timestamp),
            level_style.value(record.level()),
            meta_style.value(module_info),
            record.args()
        )
    });

    let composite_logger = CompositeLogger {
        console_logger: builder.build(),
        buffer_logger,
    };

    if log::set_boxed_logger(Box::new(composite_logger)).is_ok() {
        // Filtering happens in the loggers themselves
        log::set_max_level(LevelFilter::Trace);
    }

    shared_buffer
}

pub fn get_log_directory(app_name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(app_name)
        .join("logs")
}

/// Writes the buffered log lines to `debug.log` in the log directory.
///
/// # Returns
/// * `Ok(PathBuf)` - The path to the created debug log file
/// * `Err(std::io::Error)` - An error if the export fails
pub fn export_debug_logs(app_name: &str, log_buffer: LogBuffer) -> Result<PathBuf, std::io::Error> {
    export_debug_logs_to(&get_log_directory(app_name), log_buffer)
}

fn export_debug_logs_to(log_dir_path: &std::path::Path, log_buffer: LogBuffer) -> Result<PathBuf, std::io::Error> {
    std::fs::create_dir_all(log_dir_path)?;
    let debug_log_path = log_dir_path.join("debug.log");

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&debug_log_path)?;

    let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");

    // Copy out so the lock is not held during file I/O
    let log_entries: Vec<String> = {
        let buffer = log_buffer.lock().unwrap();
        buffer.iter().cloned().collect()
    };

    writeln!(file, "{timestamp} [DEBUG EXPORT] synthscope debug log export")?;
    writeln!(file, "{timestamp} [DEBUG EXPORT] Maximum captured entries: {MAX_LOG_LINES}")?;
    writeln!(file)?;

    if log_entries.is_empty() {
        writeln!(file, "{timestamp} [DEBUG EXPORT] No log entries found in buffer")?;
    } else {
        for log_entry in &log_entries {
            writeln!(file, "{timestamp} {log_entry}")?;
        }
    }

    writeln!(file)?;
    writeln!(file, "{timestamp} [DEBUG EXPORT] Total entries exported: {}", log_entries.len())?;
    file.flush()?;

    info!("Debug logs exported to: {}", debug_log_path.display());
    Ok(debug_log_path)
}

pub fn setup_panic_hook(app_name: &str, log_buffer: LogBuffer) {
    let log_dir = get_log_directory(app_name);
    let log_file_path = log_dir.join("panic.log");

    panic::set_hook(Box::new(move |info| {
        let backtrace = backtrace::Backtrace::new();
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");

        let location = if let Some(location) = info.location() {
            format!("{}:{}", location.file(), location.line())
        } else {
            "unknown location".to_string()
        };

        let header_msg = format!("[PANIC] at {location} - {info}");
        let backtrace_lines: Vec<String> = format!("{backtrace:?}")
            .lines()
            .map(|line| format!("[BACKTRACE] {}", line.trim()))
            .collect();

        eprintln!("\n\n{header_msg}");
        eprintln!("[PANIC] Backtrace:");
        for line in &backtrace_lines {
            eprintln!("{line}");
        }

        // The hook must not panic itself, so file errors only go to stderr
        let written = std::fs::create_dir_all(&log_dir).and_then(|_| {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&log_file_path)?;

            writeln!(file, "{timestamp} {header_msg}")?;
            writeln!(file, "{timestamp} [PANIC] Backtrace:")?;
            for line in &backtrace_lines {
                writeln!(file, "{timestamp} {line}")?;
            }
            writeln!(file)?;
            writeln!(file, "{timestamp} [PANIC] Last {MAX_LOG_LINES} log entries:")?;

            if let Ok(buffer) = log_buffer.lock() {
                for log in buffer.iter() {
                    writeln!(file, "{timestamp} {log}")?;
                }
            }
            Ok(())
        });

        match written {
            Ok(()) => eprintln!("\nA complete crash log has been written to: {}", log_file_path.display()),
            Err(e) => eprintln!("\nFailed to write crash log: {e}"),
        }
    }));
}
