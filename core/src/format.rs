//! Header and data line construction.
//!
//! Fields are joined with `", "` and never quoted or escaped.

use chrono::NaiveDateTime;

use crate::report::Reporter;
use crate::value::Value;

pub const SEPARATOR: &str = ", ";
pub const TERMINATOR: &str = "\n";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const TIMESTAMP_MILLIS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq)]
pub struct LineFormat {
    pub log_time: bool,
    pub log_millis: bool,
    pub precision: usize,
    pub timestamp_header: String,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self {
            log_time: true,
            log_millis: true,
            precision: 2,
            timestamp_header: "timestamp".to_string(),
        }
    }
}

impl LineFormat {
    pub fn timestamp_pattern(&self) -> &'static str {
        if self.log_millis {
            TIMESTAMP_MILLIS_FORMAT
        } else {
            TIMESTAMP_FORMAT
        }
    }

    pub fn build_header_string(&self, header: &[String]) -> String {
        let mut line = String::new();
        if self.log_time {
            line.push_str(&self.timestamp_header);
        }
        if !header.is_empty() {
            if self.log_time {
                line.push_str(SEPARATOR);
            }
            line.push_str(&header.join(SEPARATOR));
        }
        line
    }

    /// A row whose length differs from `header_len` is still written in full;
    /// the mismatch is only reported as a warning.
    pub fn build_log_line(
        &self,
        row: &[Value],
        header_len: usize,
        now: NaiveDateTime,
        reporter: &dyn Reporter,
    ) -> String {
        let mut line = String::new();

        if self.log_time {
            line.push_str(&now.format(self.timestamp_pattern()).to_string());
        }

        if row.len() != header_len {
            reporter.warning(&format!(
                "Row has {} values but header has {} columns, log file will not be correct.",
                row.len(),
                header_len
            ));
        }

        for (i, value) in row.iter().enumerate() {
            if i > 0 || self.log_time {
                line.push_str(SEPARATOR);
            }
            line.push_str(&value.render(self.precision));
        }

        line
    }
}
