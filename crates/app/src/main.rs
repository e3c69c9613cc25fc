mod config;

use chrono::Utc;
use services::{AppServices, Clock};
use storage::seed::seed_demo;

use crate::config::{Args, Command, Env, print_usage};

fn init_logging() {
    // `GOALS_LOG` first, then `RUST_LOG`, default `info`. Logs go to stderr so stdout stays JSON.
    let log_env = std::env::var("GOALS_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(format!("{log_env},sqlx=warn"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1), &Env::from_process()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let clock = args.at.map_or_else(Clock::default_clock, Clock::fixed);
    let services = AppServices::new_sqlite(&args.db_url, clock, args.policy).await?;
    tracing::info!(db = %args.db_url, offset = %args.policy.offset(), "storage ready");

    match args.command {
        Command::Summary => {
            let summary = services.week_summary().current_week_summary().await?;
            let body = serde_json::json!({ "summary": summary });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Command::Seed => {
            let now = args.at.unwrap_or_else(Utc::now);
            let report = seed_demo(services.storage(), now).await?;
            println!(
                "Seeded {} goals and {} completions into {}",
                report.goals, report.completions, args.db_url
            );
        }
        Command::Help => {}
    }

    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.starts_with("sqlite:file:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| format!("invalid --db value: {db_url}"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(format!("invalid --db value: {db_url}").into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        tracing::error!(error = %err, "command failed");
        eprintln!("{err}");
        std::process::exit(2);
    }
}
