use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::PgStore;
use crate::models::{ScheduleEntry, SchoolDay, WeekScope};
use crate::schedule::create_current_schedule;
use crate::store::MemoryStore;

mod account;
mod db;
mod error;
#[cfg(test)]
mod fixtures;
mod logging;
mod merge;
mod models;
mod notices;
mod report;
mod schedule;
mod store;
mod timing;
mod window;

#[derive(Parser)]
#[command(name = "timetable-notices")]
#[command(about = "Weekly class timetable reconciled with live notices", long_about = None)]
struct Cli {
    /// Log engine decisions at debug level
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EntryArgs {
    #[arg(long)]
    class: String,
    #[arg(long)]
    subject: String,
    #[arg(long)]
    teacher: String,
    #[arg(long)]
    room: String,
    /// A single period or an inclusive range like 3-4
    #[arg(long)]
    periods: String,
    /// Day of the week, Monday = 1
    #[arg(long, value_parser = clap::value_parser!(i16).range(1..=5))]
    day: i16,
    /// a, b or both
    #[arg(long, default_value = "both")]
    week: WeekScope,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load subjects, a sample timetable and notices for the current week
    Seed {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Import static schedule entries from a CSV file
    ImportEntries {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Add a static schedule entry
    AddEntry {
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Replace a static schedule entry
    UpdateEntry {
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Delete a static schedule entry
    DeleteEntry {
        #[arg(long)]
        id: Uuid,
    },
    /// Create or update account preferences
    SetAccount {
        #[arg(long)]
        id: Option<Uuid>,
        #[arg(long)]
        class: String,
        #[arg(long, default_value = "en")]
        lang: String,
        #[arg(long, value_delimiter = ',')]
        ignore: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        additional: Vec<String>,
    },
    /// Render the current week for an account
    Show {
        #[arg(long)]
        account: Uuid,
        /// Show every stored entry of the class, ignoring notices and preferences
        #[arg(long)]
        edit: bool,
        /// Pretend today is this date
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
        /// Read data from a JSON fixture instead of Postgres
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

fn build_entry(id: Uuid, args: EntryArgs) -> anyhow::Result<ScheduleEntry> {
    Ok(ScheduleEntry {
        id,
        subject: args.subject.trim().to_lowercase(),
        teacher: args.teacher,
        room: args.room,
        periods: timing::parse_periods(&args.periods)?,
        week_day: SchoolDay::from_number(args.day)?,
        week_type: args.week,
        affected_class: args.class.trim().to_string(),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed { date } => {
            let pool = connect().await?;
            let today = date.unwrap_or_else(|| Local::now().date_naive());
            db::seed(&pool, today).await?;
            println!("Seed data inserted (demo account {}).", db::SEED_ACCOUNT_ID);
        }
        Commands::ImportEntries { csv } => {
            let pool = connect().await?;
            let written = db::import_entries_csv(&pool, &csv).await?;
            println!("Imported {written} entries from {}.", csv.display());
        }
        Commands::AddEntry { entry } => {
            let pool = connect().await?;
            let entry = build_entry(Uuid::new_v4(), entry)?;
            db::insert_entry(&pool, &entry).await?;
            println!("Added entry {}.", entry.id);
        }
        Commands::UpdateEntry { id, entry } => {
            let pool = connect().await?;
            let entry = build_entry(id, entry)?;
            if db::update_entry(&pool, &entry).await? {
                println!("Updated entry {id}.");
            } else {
                anyhow::bail!("no schedule entry with id {id}");
            }
        }
        Commands::DeleteEntry { id } => {
            let pool = connect().await?;
            if db::delete_entry(&pool, id).await? {
                println!("Deleted entry {id}.");
            } else {
                anyhow::bail!("no schedule entry with id {id}");
            }
        }
        Commands::SetAccount {
            id,
            class,
            lang,
            ignore,
            additional,
        } => {
            let pool = connect().await?;
            let account = account::build_account(
                id.unwrap_or_else(Uuid::new_v4),
                &class,
                &lang,
                &ignore,
                &additional,
            )?;
            db::upsert_account(&pool, &account).await?;
            println!("Account {} saved.", account.id);
        }
        Commands::Show {
            account,
            edit,
            date,
            format,
            out,
            fixtures,
        } => {
            let today = date.unwrap_or_else(|| Local::now().date_naive());
            let (account_data, schedule) = match fixtures {
                Some(path) => {
                    let store = MemoryStore::from_json_file(&path)?;
                    let account_data = store
                        .account(account)
                        .cloned()
                        .with_context(|| format!("account {account} not found in fixture"))?;
                    let schedule = create_current_schedule(&store, &account_data, edit, today).await?;
                    (account_data, schedule)
                }
                None => {
                    let pool = connect().await?;
                    let account_data = db::fetch_account(&pool, account)
                        .await?
                        .with_context(|| format!("account {account} not found"))?;
                    let store = PgStore::new(pool);
                    let schedule = create_current_schedule(&store, &account_data, edit, today).await?;
                    (account_data, schedule)
                }
            };

            let Some(schedule) = schedule else {
                println!(
                    "No schedule stored for class {} yet. Create one with add-entry or import-entries.",
                    account_data.affected_class
                );
                return Ok(());
            };

            let rendered = match format {
                OutputFormat::Text => {
                    report::build_report(&account_data.affected_class, account_data.lang, &schedule)
                }
                OutputFormat::Json => report::build_json(&schedule)?,
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Schedule written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
    }

    Ok(())
}
