use chrono::Local;
use std::io::{self, Write};
use std::mem;
use std::path::{Path, PathBuf};

use crate::config::{LoggerConfig, MAX_PRECISION};
use crate::format::LineFormat;
use crate::platform::{self, DirectoryProvider, PlatformDirs};
use crate::report::{Reporter, TracingReporter};
use crate::session::{OpenFile, Session, SessionError};
use crate::value::Value;

/// Tag passed to listeners whenever a property value changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Path,
    LogTime,
    LogMillis,
    ToConsole,
    Precision,
    TimestampHeader,
    Header,
    Enabled,
}

type Listener = Box<dyn FnMut(Property)>;

/// Appends one delimited line per `log` call to a lazily opened file, or
/// prints it to the console writer when console mode is on.
pub struct RowLogger {
    path: String,
    header: Vec<String>,
    format: LineFormat,
    to_console: bool,
    enabled: bool,
    session: Session,
    provider: Box<dyn DirectoryProvider>,
    reporter: Box<dyn Reporter>,
    console: Box<dyn Write>,
    listeners: Vec<Listener>,
}

pub struct RowLoggerBuilder {
    config: LoggerConfig,
    provider: Box<dyn DirectoryProvider>,
    reporter: Box<dyn Reporter>,
    console: Box<dyn Write>,
}

impl RowLoggerBuilder {
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn directory_provider<P: DirectoryProvider + 'static>(mut self, provider: P) -> Self {
        self.provider = Box::new(provider);
        self
    }

    pub fn reporter<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn console<W: Write + 'static>(mut self, console: W) -> Self {
        self.console = Box::new(console);
        self
    }

    pub fn build(self) -> RowLogger {
        self.provider.request_storage_access();

        let mut config = self.config;
        if let Err(e) = config.validate() {
            self.reporter.critical(&format!(
                "RowLoggerBuilder::build(): {}, using precision {}.",
                e, MAX_PRECISION
            ));
            config.precision = config.precision.min(MAX_PRECISION);
        }
        RowLogger {
            path: config.path,
            header: config.header,
            format: LineFormat {
                log_time: config.log_time,
                log_millis: config.log_millis,
                precision: config.precision,
                timestamp_header: config.timestamp_header,
            },
            to_console: config.to_console,
            enabled: config.enabled,
            session: Session::Stale,
            provider: self.provider,
            reporter: self.reporter,
            console: self.console,
            listeners: Vec::new(),
        }
    }
}

impl Default for RowLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl RowLogger {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RowLoggerBuilder {
        RowLoggerBuilder {
            config: LoggerConfig::default(),
            provider: Box::new(PlatformDirs),
            reporter: Box::new(TracingReporter),
            console: Box::new(io::stdout()),
        }
    }

    pub fn subscribe<F: FnMut(Property) + 'static>(&mut self, listener: F) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, property: Property) {
        for listener in self.listeners.iter_mut() {
            listener(property);
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Any open file is flushed and closed; the new path is opened on the
    /// next `log` call.
    pub fn set_path<S: Into<String>>(&mut self, path: S) {
        let path = path.into();
        if self.path == path {
            return;
        }
        self.close();
        self.path = path;
        self.notify(Property::Path);
    }

    pub fn log_time(&self) -> bool {
        self.format.log_time
    }

    pub fn set_log_time(&mut self, log_time: bool) {
        if self.format.log_time == log_time {
            return;
        }
        if self.is_writing() {
            self.reporter
                .critical("RowLogger::set_log_time(): log_time cannot be changed while writing.");
            return;
        }
        self.format.log_time = log_time;
        self.notify(Property::LogTime);
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn set_header<I, S>(&mut self, header: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let header: Vec<String> = header.into_iter().map(Into::into).collect();
        if self.header == header {
            return;
        }
        if self.is_writing() {
            self.reporter
                .critical("RowLogger::set_header(): header cannot be changed while writing.");
            return;
        }
        self.header = header;
        self.notify(Property::Header);
    }

    pub fn timestamp_header(&self) -> &str {
        &self.format.timestamp_header
    }

    pub fn set_timestamp_header<S: Into<String>>(&mut self, label: S) {
        let label = label.into();
        if self.format.timestamp_header == label {
            return;
        }
        if self.is_writing() {
            self.reporter.critical(
                "RowLogger::set_timestamp_header(): timestamp_header cannot be changed while writing.",
            );
            return;
        }
        self.format.timestamp_header = label;
        self.notify(Property::TimestampHeader);
    }

    pub fn log_millis(&self) -> bool {
        self.format.log_millis
    }

    pub fn set_log_millis(&mut self, log_millis: bool) {
        if self.format.log_millis != log_millis {
            self.format.log_millis = log_millis;
            self.notify(Property::LogMillis);
        }
    }

    pub fn to_console(&self) -> bool {
        self.to_console
    }

    pub fn set_to_console(&mut self, to_console: bool) {
        if self.to_console != to_console {
            self.to_console = to_console;
            self.notify(Property::ToConsole);
        }
    }

    pub fn precision(&self) -> usize {
        self.format.precision
    }

    pub fn set_precision(&mut self, precision: usize) {
        if self.format.precision == precision {
            return;
        }
        if precision > MAX_PRECISION {
            self.reporter.critical(&format!(
                "RowLogger::set_precision(): precision {} exceeds the maximum of {}.",
                precision, MAX_PRECISION
            ));
            return;
        }
        self.format.precision = precision;
        self.notify(Property::Precision);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.notify(Property::Enabled);
        }
    }

    pub fn is_writing(&self) -> bool {
        self.session.is_writing()
    }

    /// Path of the currently open file, if any.
    pub fn open_path(&self) -> Option<&Path> {
        match &self.session {
            Session::Writing(file) => Some(file.path()),
            Session::Stale => None,
        }
    }

    /// Write one row. Failures are reported, never returned; a failed open
    /// is retried on the next call.
    pub fn log(&mut self, row: &[Value]) {
        if !self.enabled {
            return;
        }

        if self.to_console {
            let line = self.build_line(row);
            if let Err(e) = writeln!(self.console, "{}", line).and_then(|_| self.console.flush()) {
                self.reporter
                    .critical(&format!("RowLogger::log(): Could not write to console: {}", e));
            }
            return;
        }

        if !self.is_writing() {
            if let Err(e) = self.open_session() {
                self.reporter.critical(&format!("RowLogger::log(): {}", e));
                return;
            }
        }

        let line = self.build_line(row);
        match &mut self.session {
            Session::Writing(file) => {
                if let Err(e) = file.write_line(&line) {
                    self.reporter.critical(&format!("RowLogger::log(): {}", e));
                }
            }
            Session::Stale => self
                .reporter
                .critical(&format!("RowLogger::log(): {}", SessionError::NoPath)),
        }
    }

    /// Flush and release the file. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Session::Writing(file) = mem::take(&mut self.session) {
            if let Err(e) = file.close() {
                self.reporter.critical(&format!("RowLogger::close(): {}", e));
            }
        }
    }

    fn build_line(&self, row: &[Value]) -> String {
        self.format.build_log_line(
            row,
            self.header.len(),
            Local::now().naive_local(),
            self.reporter.as_ref(),
        )
    }

    fn open_session(&mut self) -> Result<(), SessionError> {
        if self.path.is_empty() {
            return Err(SessionError::NoPath);
        }

        let configured = PathBuf::from(&self.path);
        let effective = if configured.is_absolute() {
            self.reporter
                .debug(&format!("RowLogger::log(): Opening {} to log.", configured.display()));
            configured
        } else {
            let resolved = platform::resolve(&configured, self.provider.as_ref())
                .ok_or_else(|| SessionError::NoDefaultDir(self.provider.name().to_string()))?;
            self.reporter.debug(&format!(
                "RowLogger::log(): Absolute path not given, opening {} to log.",
                resolved.display()
            ));
            self.path = resolved.to_string_lossy().into_owned();
            self.notify(Property::Path);
            resolved
        };

        let (mut file, empty) = OpenFile::open(&effective)?;
        if empty {
            let header = self.format.build_header_string(&self.header);
            if let Err(e) = file.write_line(&header) {
                self.reporter.critical(&format!("RowLogger::log(): {}", e));
            }
        }
        self.session = Session::Writing(file);
        Ok(())
    }
}

impl Drop for RowLogger {
    fn drop(&mut self) {
        self.close();
    }
}
