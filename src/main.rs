use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use studylog::calendar::MonthCursor;
use studylog::config::StudyLogConfig;
use studylog::display::{format_duration, local_today};
use studylog::heatmap::{available_years, YearCursor};
use studylog::models::{parse_duration_input, parse_topic_list, NewRecord, RecordPatch, StudyRecord};
use studylog::normalize::parse_timestamp;
use studylog::session::{FileSessionStore, SessionStore};
use studylog::{db, report, stats, store};

#[derive(Parser)]
#[command(name = "studylog")]
#[command(about = "Personal study log: records, statistics and calendar insights", long_about = None)]
struct Cli {
    /// Use this JSON records file instead of the database
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a few sample records
    Seed,
    /// Import records from a JSON export or a CSV file
    #[command(group(
        ArgGroup::new("input")
            .args(["json", "csv"])
            .required(true)
            .multiple(false)
    ))]
    Import {
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Log a study session
    Add {
        /// Streak day number (defaults to the day after the latest record)
        #[arg(long)]
        day: Option<u32>,
        /// Minutes, or HH:MM
        #[arg(long)]
        duration: String,
        /// Comma separated topics
        #[arg(long)]
        topics: String,
        /// YYYY-MM-DD or RFC 3339 (defaults to now)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        link: Option<String>,
    },
    /// Change fields of an existing record
    Update {
        id: String,
        #[arg(long)]
        day: Option<u32>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        topics: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        link: Option<String>,
    },
    /// Remove a record
    Delete { id: String },
    /// List records ordered by streak day
    List {
        #[arg(long)]
        topic: Option<String>,
        /// Show every record instead of the first few
        #[arg(long)]
        all: bool,
    },
    /// Show one record by id
    Show { id: String },
    /// Show the record logged on the day after the given one
    Next {
        #[arg(long)]
        day: u32,
    },
    /// Totals, averages and top topics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Monthly calendar
    Calendar {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        /// Move this many months forward (negative for backward)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        shift: i32,
    },
    /// Yearly activity heatmap
    Heatmap {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Years that have records, newest first
    Years,
    /// Write a markdown report
    Report {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long, default_value = "study-report.md")]
        out: PathBuf,
    },
    /// Store an access token for commands that change records
    Login {
        #[arg(long)]
        token: String,
    },
    /// Forget the stored access token
    Logout,
    /// Show whether a token is stored
    Status,
}

enum Source {
    File(PathBuf),
    Database(PgPool),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("studylog error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = StudyLogConfig::load_with_dotenv().context("failed to load configuration")?;
    let offset = config.display_offset();
    let today = local_today(Utc::now(), offset);
    let session_store = FileSessionStore::new(&config.session_file);

    match &cli.command {
        Commands::Login { token } => {
            let session = session_store.load()?.login(token.as_str())?;
            session_store.save(&session)?;
            println!("Logged in. Token saved to {}.", session_store.path().display());
            return Ok(());
        }
        Commands::Logout => {
            let session = session_store.load()?.logout();
            session_store.save(&session)?;
            println!("Logged out.");
            return Ok(());
        }
        Commands::Status => {
            let session = session_store.load()?;
            if session.is_authenticated() {
                println!("Logged in.");
            } else {
                println!("Not logged in.");
            }
            return Ok(());
        }
        _ => {}
    }

    let source = open_source(cli.file, &config).await?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(require_database(&source)?).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let inserted = db::seed(require_database(&source)?).await?;
            println!("Inserted {inserted} sample records.");
        }
        Commands::Import { json, csv } => {
            let pool = require_database(&source)?;
            let (inserted, path) = match (json, csv) {
                (Some(path), _) => (db::import_json(pool, &path).await?, path),
                (None, Some(path)) => (db::import_csv(pool, &path).await?, path),
                (None, None) => anyhow::bail!("pass --json or --csv"),
            };
            println!("Inserted {inserted} records from {}.", path.display());
        }
        Commands::Add {
            day,
            duration,
            topics,
            date,
            description,
            link,
        } => {
            let session = session_store.load()?;
            session.require()?;

            let records = match &source {
                Source::File(path) if !path.exists() => Vec::new(),
                _ => load_records(&source).await?,
            };
            let record = NewRecord {
                day: day.unwrap_or_else(|| store::next_day_number(&records)),
                duration_minutes: parse_duration_input(&duration)?,
                date: match date {
                    Some(text) => parse_date_arg(&text)?,
                    None => Utc::now(),
                },
                topics: parse_topic_list(&topics),
                description,
                link,
            };

            let created = match &source {
                Source::File(path) => store::append_record(path, record, Utc::now())?,
                Source::Database(pool) => db::create_record(pool, record).await?,
            };
            println!(
                "Record added: Day {} ({}) id {}",
                created.day,
                format_duration(created.duration_minutes),
                created.id
            );
        }
        Commands::Update {
            id,
            day,
            duration,
            topics,
            date,
            description,
            link,
        } => {
            let session = session_store.load()?;
            session.require()?;

            let patch = RecordPatch {
                day,
                duration_minutes: duration.as_deref().map(parse_duration_input).transpose()?,
                date: date.as_deref().map(parse_date_arg).transpose()?,
                topics: topics.as_deref().map(parse_topic_list),
                description,
                link,
            };
            let pool = require_database(&source)?;
            let updated = db::update_record(pool, &id, &patch).await?;
            println!("Record {} updated (Day {}).", updated.id, updated.day);
        }
        Commands::Delete { id } => {
            let session = session_store.load()?;
            session.require()?;

            db::delete_record(require_database(&source)?, &id).await?;
            println!("Record {id} deleted.");
        }
        Commands::List { topic, all } => {
            let mut records = load_records(&source).await?;
            stats::sort_by_day(&mut records);

            let topics = stats::all_topics(&records);
            println!("Topics: All, {}", topics.join(", "));

            let filtered = stats::filter_by_topic(&records, topic.as_deref());
            if filtered.is_empty() {
                println!("No records found.");
                return Ok(());
            }

            let shown = if all {
                filtered.len()
            } else {
                filtered.len().min(config.initial_display)
            };
            print!("{}", report::render_records(&filtered[..shown], offset));
            if shown < filtered.len() {
                println!("... {} more (use --all)", filtered.len() - shown);
            }
        }
        Commands::Show { id } => {
            let record = match &source {
                Source::File(path) => {
                    let records = store::load_records(path)?;
                    store::find_record(&records, &id)?.clone()
                }
                Source::Database(pool) => db::fetch_record(pool, &id).await?,
            };
            print!("{}", report::render_records(&[&record], offset));
        }
        Commands::Next { day } => {
            let records = load_records(&source).await?;
            let current = records
                .iter()
                .find(|record| record.day == day)
                .with_context(|| format!("no record for day {day}"))?;
            match stats::next_by_day(&records, current) {
                Some(next) => print!("{}", report::render_records(&[next], offset)),
                None => println!("Day {day} is the latest record."),
            }
        }
        Commands::Stats { json } => {
            let records = load_records(&source).await?;
            if json {
                let statistics = stats::compute_statistics(&records);
                println!("{}", serde_json::to_string_pretty(&statistics)?);
            } else {
                print!("{}", report::render_statistics(&records));
            }
        }
        Commands::Calendar { year, month, shift } => {
            let records = load_records(&source).await?;
            let cursor = match (year, month) {
                (None, None) => MonthCursor::containing(today),
                (year, month) => MonthCursor::new(
                    year.unwrap_or(today.year()),
                    month.unwrap_or(today.month()),
                )?,
            };
            let cursor = cursor.shift(shift)?;
            print!(
                "{}",
                report::render_month(&records, cursor.year, cursor.month, today)?
            );
            let previous = cursor.previous();
            let next = cursor.next();
            println!(
                "\nprevious: --year {} --month {} | next: --year {} --month {}",
                previous.year, previous.month, next.year, next.month
            );
        }
        Commands::Heatmap { year } => {
            let records = load_records(&source).await?;
            let cursor = match year {
                Some(year) => YearCursor::new(year, today.year(), available_years(&records))?,
                None => YearCursor::for_records(&records, today.year()),
            };
            print!("{}", report::render_heatmap(&records, cursor.year)?);
            let previous = if cursor.can_go_previous() {
                format!("--year {}", cursor.previous().year)
            } else {
                "none".to_string()
            };
            let next = if cursor.can_go_next() {
                format!("--year {}", cursor.next().year)
            } else {
                "none".to_string()
            };
            println!("\nprevious: {previous} | next: {next}");
        }
        Commands::Years => {
            let records = load_records(&source).await?;
            let years = available_years(&records);
            if years.is_empty() {
                println!("No dated records.");
            }
            for year in years {
                println!("{year}");
            }
        }
        Commands::Report { year, month, out } => {
            let records = load_records(&source).await?;
            let report = report::build_report(
                &records,
                year.unwrap_or(today.year()),
                month.unwrap_or(today.month()),
                today,
                offset,
            )?;
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Login { .. } | Commands::Logout | Commands::Status => {}
    }

    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("STUDYLOG_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

async fn open_source(file: Option<PathBuf>, config: &StudyLogConfig) -> anyhow::Result<Source> {
    if let Some(path) = file.or_else(|| config.records_file.clone()) {
        return Ok(Source::File(path));
    }

    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set, or pass --file <records.json>")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(Source::Database(pool))
}

fn require_database(source: &Source) -> anyhow::Result<&PgPool> {
    match source {
        Source::Database(pool) => Ok(pool),
        Source::File(path) => anyhow::bail!(
            "this command needs the database; {} is a read/append-only records file",
            path.display()
        ),
    }
}

async fn load_records(source: &Source) -> anyhow::Result<Vec<StudyRecord>> {
    match source {
        Source::File(path) => store::load_records(path)
            .with_context(|| format!("failed to load records from {}", path.display())),
        Source::Database(pool) => db::fetch_records(pool).await,
    }
}

fn parse_date_arg(text: &str) -> anyhow::Result<chrono::DateTime<Utc>> {
    parse_timestamp(text).with_context(|| format!("invalid date `{text}`"))
}
