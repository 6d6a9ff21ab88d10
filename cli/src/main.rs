//! Desktop shell over the session history store.

mod cli;

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use history::core::platform::{self, FileStorage};
use history::session::export;
use history::{AnalysisFilter, ComparisonSelection, SessionStore, StoreConfig};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ListArgs};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = StoreConfig::default();
    if let Some(capacity) = cli.capacity {
        config.capacity = capacity;
    }
    if let Some(key) = cli.key {
        config.storage_key = key;
    }

    let storage = match cli.data_dir {
        Some(dir) => FileStorage::new(dir),
        None => platform::default_storage().context("locating data directory")?,
    };
    tracing::debug!(dir = %storage.dir().display(), "using file storage");
    let mut store = SessionStore::open(storage, config).context("opening session history")?;

    match cli.command {
        Command::Add { file } => {
            let raw = read_input(file)?;
            let payload: serde_json::Value =
                serde_json::from_str(&raw).context("parsing analysis result")?;
            let record = store.add_analysis(payload);
            println!(
                "{} {} {:.0}% {}",
                record.risk_level.icon,
                record.id,
                record.credibility_score * 100.0,
                record.title
            );
            warn_if_not_durable(&store);
        }
        Command::List(args) => {
            let filter = list_filter(&args);
            let mut records = store.get_analyses(filter.as_ref());
            if args.recent {
                records.reverse();
            }
            if records.is_empty() {
                println!("No analyses yet");
            }
            for record in records {
                println!(
                    "{}  {:<6} {:>4.0}%  {}  ({})",
                    record.id,
                    record.risk().as_str(),
                    record.credibility_score * 100.0,
                    record.title,
                    record.source
                );
            }
        }
        Command::Show { id } => {
            let Some(record) = store.get_analysis_by_id(&id) else {
                bail!("no analysis with id `{id}`");
            };
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        Command::Delete { id } => {
            if store.delete_analysis(&id) {
                println!("Deleted {id}");
                warn_if_not_durable(&store);
            } else {
                println!("No analysis with id `{id}`");
            }
        }
        Command::Clear => {
            store.clear_history();
            println!("History cleared");
            warn_if_not_durable(&store);
        }
        Command::Stats => {
            println!("{}", serde_json::to_string_pretty(&store.get_statistics())?);
        }
        Command::Series => {
            println!(
                "{}",
                serde_json::to_string_pretty(&store.get_time_series_data())?
            );
        }
        Command::Export { out } => {
            let artifact = store.export_session().to_artifact()?;
            let path = match out {
                Some(dir) => export::deliver_to(&dir, &artifact)?,
                None => export::deliver(&artifact)?
                    .context("export produced no file")?,
            };
            println!("Session exported to {path}");
        }
        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let count = store.import_session(&raw)?;
            println!("Imported {count} analyses");
            warn_if_not_durable(&store);
        }
        Command::Compare { ids } => {
            let mut selection = ComparisonSelection::new();
            for id in ids {
                selection.toggle(id);
            }
            println!("{}", selection.label());
            match store.comparison_pair(&selection) {
                Some((left, right)) => {
                    for record in [left, right] {
                        println!(
                            "{} {:>4.0}%  {}  [{}]",
                            record.risk_level.icon,
                            record.credibility_score * 100.0,
                            record.title,
                            record.classification
                        );
                    }
                }
                None if selection.is_ready() => bail!("a selected analysis no longer exists"),
                None => println!("Select two analyses to compare"),
            }
        }
    }

    Ok(())
}

fn list_filter(args: &ListArgs) -> Option<AnalysisFilter> {
    if args.risk.is_none() && args.min.is_none() && args.max.is_none() && args.search.is_none() {
        return None;
    }
    Some(AnalysisFilter {
        risk_level: args.risk,
        min_score: args.min,
        max_score: args.max,
        search_term: args.search.clone(),
    })
}

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("reading analysis result from stdin")?;
            Ok(raw)
        }
    }
}

fn warn_if_not_durable<S: history::Storage>(store: &SessionStore<S>) {
    if !store.is_durable() {
        eprintln!("Warning: change kept in memory only; it could not be saved");
    }
}
