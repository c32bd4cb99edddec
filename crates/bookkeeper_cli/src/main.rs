//! Bookkeeper CLI smoke entry point.
//!
//! # Responsibility
//! - Create the bookkeeper tables in a database file.
//! - Record one demo expense and print the category's expenses.

use bookkeeper_core::db::init_schema;
use bookkeeper_core::{
    core_version, init_logging, AbstractRepository, Category, ConnectionProvider, Expense,
    Filter, LoggingConfig, SqliteConnectionProvider, SqliteRepository,
};
use clap::Parser;
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Parser)]
#[command(name = "bookkeeper")]
#[command(about = "Record a demo expense in a bookkeeper database", long_about = None)]
struct Cli {
    /// SQLite database file, created when missing.
    db_path: String,
    /// Absolute directory for log files; logging stays off when omitted.
    log_dir: Option<PathBuf>,
    /// Log level used together with `log_dir`.
    #[arg(long, default_value_t = bookkeeper_core::default_log_level().to_string())]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        init_logging(&LoggingConfig::new(&cli.log_level, log_dir)?)?;
    }
    info!("event=cli_start module=cli version={}", core_version());

    init_schema(&SqliteConnectionProvider.connect(&cli.db_path)?)?;

    let categories = SqliteRepository::<Category>::new(cli.db_path.as_str())?;
    let expenses = SqliteRepository::<Expense>::new(cli.db_path.as_str())?;

    let by_name = Filter::new().eq("name", "demo".to_string());
    let category = match categories.get_all(Some(&by_name))?.into_iter().next() {
        Some(existing) => existing,
        None => {
            let mut created = Category::new("demo");
            categories.add(&mut created)?;
            created
        }
    };

    let now_ms = i64::try_from(SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis())?;
    let mut expense = Expense::new(1.0, category.pk, now_ms).with_comment("cli demo");
    expenses.add(&mut expense)?;

    let in_category = Filter::new().eq("category", category.pk);
    for stored in expenses.get_all(Some(&in_category))? {
        println!(
            "expense pk={} amount={:.2} category={} comment={}",
            stored.pk, stored.amount, category.name, stored.comment
        );
    }

    Ok(())
}
