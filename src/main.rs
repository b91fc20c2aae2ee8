use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use findash::aggregate::cross_summarize;
use findash::config::AppConfig;
use findash::ingest::FileUpload;
use findash::loader::{discover_spreadsheets, is_spreadsheet_path, schema_hint};
use findash::models::Schema;
use findash::pipeline::Pipeline;
use findash::report;
use findash::storage::{key_for, DuckDbStore};
use findash::utils;

#[derive(Parser)]
#[command(name = "findash", about = "Revenue & cost spreadsheet dashboard", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Upload one spreadsheet, replacing stored data for its schema
    Upload {
        /// .xlsx or .xls file
        file: PathBuf,

        /// revenue or cost
        #[arg(short, long)]
        schema: Schema,
    },

    /// Upload every spreadsheet in a directory, schema inferred from file names
    LoadDir {
        #[arg(short, long, default_value = "data")]
        dir: PathBuf,
    },

    /// Global dashboard figures
    Overview,

    /// Totals, department breakdown and rankings for one schema
    Report {
        #[arg(short, long)]
        schema: Schema,
    },

    /// List stored records
    Records {
        #[arg(short, long)]
        schema: Schema,
    },

    /// Revenue against cost
    Compare,

    /// Delete stored revenue and cost data
    Reset,

    /// Apply schema migrations without loading data
    Migrate,
}

fn open_store(config: &AppConfig) -> Result<DuckDbStore> {
    let store = DuckDbStore::open(&config.storage.db_path)?;
    if config.storage.run_migrations {
        store.run_migrations()?;
    }
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "findash=info,warn",
        1 => "findash=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Upload { file, schema } => {
            if !is_spreadsheet_path(&file) {
                bail!("{:?} is not an .xlsx or .xls file", file);
            }
            let _t = utils::Timer::start(format!("{} upload", schema));
            let pipeline = Pipeline::new(open_store(&config)?);
            let stats = pipeline.upload(&FileUpload::new(&file), schema).await?;
            println!("{} {} records from {}", stats.records, stats.schema, stats.source);
        }

        Command::LoadDir { dir } => {
            let _t = utils::Timer::start("Directory load");
            let pipeline = Pipeline::new(open_store(&config)?);

            let files = discover_spreadsheets(&dir)?;
            info!("Found {} spreadsheets in {:?}", files.len(), dir);

            let mut loaded = 0usize;
            let mut errors = 0usize;

            for path in &files {
                let Some(schema) = schema_hint(path) else {
                    warn!("Skipping {:?}: cannot tell revenue from cost by name", path);
                    continue;
                };
                match pipeline.upload(&FileUpload::new(path), schema).await {
                    Ok(stats) => loaded += stats.records,
                    Err(e) => {
                        warn!("Error loading {:?}: {:#}", path, e);
                        errors += 1;
                    }
                }
            }

            info!("Done: {} records stored, {} errors", loaded, errors);
        }

        Command::Overview => {
            let store = open_store(&config)?;
            let updated = [Schema::Revenue, Schema::Cost]
                .iter()
                .filter_map(|s| store.updated_at(key_for(*s)).ok().flatten())
                .max();
            let pipeline = Pipeline::new(store);
            print!("{}", report::render_overview(&report::overview(&pipeline.dataset())));
            if let Some(ts) = updated {
                println!("  Last upload   : {}", ts.format("%Y-%m-%d %H:%M:%S"));
            }
        }

        Command::Report { schema } => {
            let data = Pipeline::new(open_store(&config)?).dataset();
            let text = match schema {
                Schema::Revenue => {
                    report::render_schema_report(&report::schema_report(&data.revenue, &config.report))
                }
                Schema::Cost => {
                    report::render_schema_report(&report::schema_report(&data.cost, &config.report))
                }
            };
            print!("{}", text);
        }

        Command::Records { schema } => {
            let data = Pipeline::new(open_store(&config)?).dataset();
            let text = match schema {
                Schema::Revenue => report::render_records(&data.revenue),
                Schema::Cost => report::render_records(&data.cost),
            };
            print!("{}", text);
        }

        Command::Compare => {
            let data = Pipeline::new(open_store(&config)?).dataset();
            if data.revenue.is_empty() {
                println!("No revenue data — nothing to compare.");
            } else {
                print!("{}", report::render_comparison(&cross_summarize(&data.revenue, &data.cost)));
            }
        }

        Command::Reset => {
            Pipeline::new(open_store(&config)?).reset()?;
            println!("Stored data cleared.");
        }

        Command::Migrate => {
            DuckDbStore::open(&config.storage.db_path)?.run_migrations()?;
            println!("Migrations applied.");
        }
    }

    Ok(())
}
