use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use rowlog::{FixedDir, LoggerConfig, RowLogger, Value};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// One comma-separated record per line, value kinds inferred
    Csv,
    /// One JSON array per line
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Append rows read from stdin to a CSV log", long_about = None)]
struct Args {
    /// TOML file with logger settings; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target file, relative paths land in the documents (or app-data) directory
    #[arg(short, long)]
    file: Option<String>,

    /// Column names, comma separated
    #[arg(long, value_delimiter = ',')]
    header: Option<Vec<String>>,

    #[arg(long)]
    no_time: bool,

    #[arg(long)]
    no_millis: bool,

    /// Print lines instead of writing a file
    #[arg(long)]
    console: bool,

    #[arg(short, long)]
    precision: Option<usize>,

    #[arg(long)]
    timestamp_header: Option<String>,

    /// Resolve relative paths against this directory
    #[arg(long)]
    base_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = InputFormat::Csv)]
    input: InputFormat,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn logger_config(&self) -> Result<LoggerConfig> {
        let mut config = match &self.config {
            Some(path) => LoggerConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => LoggerConfig::default(),
        };

        if let Some(file) = &self.file {
            config.path = file.clone();
        }
        if let Some(header) = &self.header {
            config.header = header.iter().map(|h| h.trim().to_string()).collect();
        }
        if self.no_time {
            config.log_time = false;
        }
        if self.no_millis {
            config.log_millis = false;
        }
        if self.console {
            config.to_console = true;
        }
        if let Some(precision) = self.precision {
            config.precision = precision;
        }
        if let Some(label) = &self.timestamp_header {
            config.timestamp_header = label.clone();
        }

        config.validate()?;
        if config.path.is_empty() && !config.to_console {
            bail!("No target file given, use --file, a config file or --console");
        }
        Ok(config)
    }
}

fn parse_csv_row(line: &str) -> Result<Vec<Value>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(record) => Ok(record?.iter().map(Value::infer).collect()),
        None => Ok(Vec::new()),
    }
}

fn parse_json_row(line: &str) -> Result<Vec<Value>> {
    serde_json::from_str(line).context("Expected a JSON array of scalars")
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting default subscriber failed")?;

    let config = args.logger_config()?;
    let mut builder = RowLogger::builder().config(config);
    if let Some(dir) = &args.base_dir {
        builder = builder.directory_provider(FixedDir::new(dir));
    }
    let mut logger = builder.build();

    let mut rows = 0usize;
    for (n, line) in io::stdin().lock().lines().enumerate() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed = match args.input {
            InputFormat::Csv => parse_csv_row(&line),
            InputFormat::Json => parse_json_row(&line),
        };
        match parsed {
            Ok(row) => {
                logger.log(&row);
                rows += 1;
            }
            Err(e) => warn!("Skipping input line {}: {:#}", n + 1, e),
        }
    }

    logger.close();
    info!("Logged {} rows to {}", rows, if logger.to_console() { "console" } else { logger.path() });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_row_inference() {
        let row = parse_csv_row("1, 2.5 ,on,true,").unwrap();
        assert_eq!(
            row,
            vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Text("on".to_string()),
                Value::Bool(true),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_csv_quoted_field() {
        let row = parse_csv_row(r#""a, b",3"#).unwrap();
        assert_eq!(row, vec![Value::Text("a, b".to_string()), Value::Int(3)]);
    }

    #[test]
    fn test_json_row() {
        let row = parse_json_row(r#"[0.125, "x"]"#).unwrap();
        assert_eq!(row, vec![Value::Float(0.125), Value::Text("x".to_string())]);
        assert!(parse_json_row("{}").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "rowlog",
            "--file",
            "out.csv",
            "--header",
            "a, b",
            "--no-time",
            "--precision",
            "3",
        ]);
        let config = args.logger_config().unwrap();
        assert_eq!(config.path, "out.csv");
        assert_eq!(config.header, vec!["a", "b"]);
        assert!(!config.log_time);
        assert_eq!(config.precision, 3);
    }

    #[test]
    fn test_missing_target_rejected() {
        let args = Args::parse_from(["rowlog"]);
        assert!(args.logger_config().is_err());
        let args = Args::parse_from(["rowlog", "--console"]);
        assert!(args.logger_config().is_ok());
    }
}
