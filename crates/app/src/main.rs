use std::fmt;
use std::path::PathBuf;

use quiz_core::Clock;
use services::{AppServices, StatsConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidFallbackTotal { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidFallbackTotal { raw } => {
                write!(f, "invalid --fallback-total value: {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- stats    [--db <sqlite_url>] [--metadata <path>] [--fallback-total <n>]");
    eprintln!("  cargo run -p app -- progress [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- badges   [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- reset    [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --fallback-total 50");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_METADATA");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Stats,
    Progress,
    Badges,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "stats" => Some(Self::Stats),
            "progress" => Some(Self::Progress),
            "badges" => Some(Self::Badges),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    metadata: Option<PathBuf>,
    fallback_total: u32,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut metadata = std::env::var("QUIZ_METADATA").ok().map(PathBuf::from);
        let mut fallback_total = 50u32;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--metadata" => {
                    let value = require_value(args, "--metadata")?;
                    metadata = Some(PathBuf::from(value));
                }
                "--fallback-total" => {
                    let value = require_value(args, "--fallback-total")?;
                    fallback_total = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidFallbackTotal { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            metadata,
            fallback_total,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
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

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
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

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: show stats when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Stats,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Stats,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        Clock::default_clock(),
        parsed.metadata.clone(),
        StatsConfig {
            fallback_total_quizzes: parsed.fallback_total,
        },
    )
    .await?;

    match cmd {
        Command::Stats => print_stats(&services).await,
        Command::Progress => print_progress(&services).await,
        Command::Badges => print_badges(&services).await,
        Command::Reset => {
            services.progress.reset_all().await?;
            println!("All progress, statistics, badges and streaks were erased.");
            Ok(())
        }
    }
}

async fn print_stats(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let data = services.statistics().await?;

    println!(
        "Completion: {}% ({}/{} quizzes)",
        data.global_completion, data.completed_quizzes, data.total_quizzes
    );
    println!(
        "Accuracy:   {}% ({}/{} questions)",
        data.global_accuracy, data.correct_answers, data.total_questions
    );
    match data.avg_time_per_question {
        Some(avg) => println!("Avg time:   {avg}s per question"),
        None => println!("Avg time:   N/A"),
    }

    if !data.theme_stats.is_empty() {
        println!();
        println!("Themes:");
        for theme in &data.theme_stats {
            let quizzes = match theme.total_quizzes {
                Some(total) => format!("{}/{total}", theme.completed_quizzes),
                None => theme.completed_quizzes.to_string(),
            };
            println!(
                "  {:<24} {:>3}%  ({} completed, {} attempts)",
                theme.name, theme.avg_accuracy, quizzes, theme.attempts
            );
        }
        if let (Some(best), Some(worst)) = (&data.best_theme, &data.worst_theme) {
            println!();
            println!("Best:  {} ({}%)", best.name, best.avg_accuracy);
            println!("Worst: {} ({}%)", worst.name, worst.avg_accuracy);
        }
    }

    if !data.history.is_empty() {
        println!();
        println!("Recent quizzes:");
        for entry in data.history.iter().take(10) {
            println!(
                "  {}  {:<24} {}/{} ({}%)",
                entry.recorded_at.format("%Y-%m-%d %H:%M"),
                entry.quiz_name,
                entry.score,
                entry.total,
                entry.accuracy
            );
        }
    }

    Ok(())
}

async fn print_progress(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let overview = services.progress.get_progress().await?;
    if overview.themes.is_empty() {
        println!("No quizzes saved yet.");
        return Ok(());
    }

    let catalog = services.catalog.catalog().await;
    for (theme_id, theme) in &overview.themes {
        let name = catalog
            .and_then(|c| c.theme(*theme_id))
            .map_or_else(|| format!("Theme {theme_id}"), |t| t.name.clone());
        println!("{name}:");
        for (quiz_id, summary) in &theme.quizzes {
            let mark = if summary.completed { "done" } else { "open" };
            println!(
                "  quiz {quiz_id}: {}/{} ({}%), best {}  [{mark}]",
                summary.score, summary.total, summary.accuracy, summary.best_score
            );
        }
    }
    Ok(())
}

async fn print_badges(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let badges = services.progress.badges().await?;
    if badges.is_empty() {
        println!("No badges earned yet.");
        return Ok(());
    }
    for badge in &badges {
        println!(
            "{} {}  ({})  earned {}",
            badge.icon,
            badge.name,
            badge.description,
            badge.earned_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
