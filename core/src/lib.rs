pub mod config;
pub mod format;
pub mod logger;
pub mod platform;
pub mod report;
pub mod session;
pub mod value;

pub use config::{ConfigError, LoggerConfig};
pub use logger::{Property, RowLogger, RowLoggerBuilder};
pub use platform::{DirectoryProvider, FixedDir, PlatformDirs};
pub use report::{Diagnostic, MemoryReporter, Reporter, Severity, TracingReporter};
pub use session::SessionError;
pub use value::Value;
