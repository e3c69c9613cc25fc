use std::fmt;

use chrono::{DateTime, Utc};
use goals_core::WeekPolicy;

pub const DEFAULT_DB_URL: &str = "sqlite://dev.sqlite3";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidOffset { raw: String },
    InvalidAt { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidOffset { raw } => {
                write!(f, "invalid --tz value (expected +HH:MM or Z): {raw}")
            }
            ArgsError::InvalidAt { raw } => {
                write!(f, "invalid --at value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Summary,
    Seed,
    Help,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "summary" => Some(Self::Summary),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

/// Process environment the binary reads, split out so parsing stays testable.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub db_url: Option<String>,
    pub tz_offset: Option<String>,
}

impl Env {
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            db_url: std::env::var("GOALS_DB_URL").ok(),
            tz_offset: std::env::var("GOALS_TZ_OFFSET").ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub db_url: String,
    pub policy: WeekPolicy,
    pub at: Option<DateTime<Utc>>,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_policy(raw: &str) -> Result<WeekPolicy, ArgsError> {
    WeekPolicy::parse_offset(raw).map_err(|_| ArgsError::InvalidOffset {
        raw: raw.to_string(),
    })
}

impl Args {
    /// Parse argv (without the program name). Flags override the environment.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown flags or values that do not parse.
    pub fn parse(argv: impl IntoIterator<Item = String>, env: &Env) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter().peekable();

        let command = match args.peek().map(String::as_str) {
            None => Command::Summary,
            Some("--help" | "-h") => Command::Help,
            Some(first) if first.starts_with('-') => Command::Summary,
            Some(first) => {
                let command = Command::from_arg(first)
                    .ok_or_else(|| ArgsError::UnknownCommand(first.to_string()))?;
                args.next();
                command
            }
        };

        let mut db_url = env
            .db_url
            .clone()
            .map_or_else(|| DEFAULT_DB_URL.to_string(), normalize_sqlite_url);
        let mut policy = None;
        let mut at = None;
        let mut command = command;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--tz" => {
                    let value = require_value(&mut args, "--tz")?;
                    policy = Some(parse_policy(&value)?);
                }
                "--at" => {
                    let value = require_value(&mut args, "--at")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidAt { raw: value.clone() })?
                        .with_timezone(&Utc);
                    at = Some(parsed);
                }
                "--help" | "-h" => command = Command::Help,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        // The environment offset is only consulted when no `--tz` flag was given.
        let policy = match (policy, env.tz_offset.as_deref()) {
            (Some(policy), _) => policy,
            (None, Some(raw)) => parse_policy(raw)?,
            (None, None) => WeekPolicy::utc(),
        };

        Ok(Self {
            command,
            db_url,
            policy,
            at,
        })
    }
}

/// Turn `sqlite:relative.db` or a bare path into an absolute `sqlite://` URL.
#[must_use]
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:")
    {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [summary] [--db <sqlite_url>] [--tz <offset>] [--at <rfc3339>]");
    eprintln!("  cargo run -p app -- seed      [--db <sqlite_url>] [--at <rfc3339>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --tz +00:00");
    eprintln!("  --at now");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  GOALS_DB_URL, GOALS_TZ_OFFSET, GOALS_LOG (falls back to RUST_LOG)");
}
