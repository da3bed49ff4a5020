use std::io::BufRead;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use stockcount_lib::{
    db, export_csv, import_catalog, migrate, time, AppError, CountLedger, CountLine, ExportOptions,
    ScanBuffer, UserSettings,
};

#[derive(Debug, Parser)]
#[command(name = "stockcount", about = "Stock counting ledger", version)]
struct Cli {
    /// Path to the ledger database. Defaults to the platform data directory.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Path to the settings JSON file. Missing file means defaults.
    #[arg(long)]
    settings: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Count scans. With barcodes as arguments each is counted once; without,
    /// codes are read from stdin one per line and `undo` reverses the last
    /// scan while it is still inside the undo window.
    Scan { codes: Vec<String> },
    /// Decrement a barcode's quantity by one (clamped at zero).
    Undo { code: String },
    /// Print every count line, most recently touched first.
    List,
    /// Case-insensitive substring search over barcode and name.
    Search { query: String },
    /// Create or overwrite one record.
    Save {
        code: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = 0)]
        quantity: i64,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Remove a record (no-op when absent).
    Delete { code: String },
    /// Export the ledger as CSV.
    Export { path: PathBuf },
    /// Import a barcode/name catalog from CSV.
    Import { path: PathBuf },
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("stockcount")
}

fn print_line(line: &CountLine) {
    println!(
        "{}\t{}\t{}",
        line.ean,
        line.quantity,
        line.name.as_deref().unwrap_or("-")
    );
}

async fn run(cli: Cli) -> Result<()> {
    let data_dir = default_data_dir();
    let db_path = cli.db.unwrap_or_else(|| data_dir.join("stockcount.sqlite3"));
    let settings_path = cli.settings.unwrap_or_else(|| data_dir.join("settings.json"));
    let settings = UserSettings::load(&settings_path).map_err(anyhow::Error::from)?;

    let pool = db::open_sqlite_pool(&db_path).await?;
    migrate::apply_migrations(&pool).await?;
    let ledger = CountLedger::new(pool).await.map_err(AppError::from)?;

    match cli.command {
        Commands::Scan { codes } if !codes.is_empty() => {
            for code in codes {
                let line = ledger.scan(&code).await.map_err(AppError::from)?;
                print_line(&line);
            }
        }
        Commands::Scan { .. } => {
            scan_session(&ledger, &settings).await?;
        }
        Commands::Undo { code } => {
            ledger.undo_scan(&code).await.map_err(AppError::from)?;
            if let Some(line) = ledger.get_item(&code).await.map_err(AppError::from)? {
                print_line(&line);
            }
        }
        Commands::List => {
            for line in ledger.list_all().await.map_err(AppError::from)? {
                print_line(&line);
            }
        }
        Commands::Search { query } => {
            for line in ledger.search(&query).await.map_err(AppError::from)? {
                print_line(&line);
            }
        }
        Commands::Save {
            code,
            name,
            quantity,
            location,
            note,
        } => {
            let mut line = CountLine::new(code);
            line.name = name;
            line.quantity = quantity;
            line.location = location;
            line.note = note;
            let saved = ledger.save(&line).await.map_err(AppError::from)?;
            print_line(&saved);
        }
        Commands::Delete { code } => {
            ledger.delete(&code).await.map_err(AppError::from)?;
        }
        Commands::Export { path } => {
            let opts = ExportOptions {
                encode: settings.encode_options(),
                bom: settings.export_bom,
            };
            let entry = export_csv(&ledger, &path, &opts).await?;
            println!("exported {} rows to {}", entry.rows, entry.path.display());
        }
        Commands::Import { path } => {
            let file = std::fs::File::open(&path)
                .with_context(|| format!("open catalog {}", path.display()))?;
            let summary = import_catalog(&ledger, file).await.map_err(AppError::from)?;
            println!(
                "processed {} rows ({} created, {} updated)",
                summary.processed, summary.created, summary.updated
            );
        }
    }

    Ok(())
}

/// Interactive counting session: one barcode per stdin line, `undo` reverses
/// the previous scan while its window is open, EOF ends the session.
async fn scan_session(ledger: &CountLedger, settings: &UserSettings) -> Result<()> {
    let mut buffer = ScanBuffer::new(settings.undo_window_ms);
    let stdin = std::io::stdin();
    for input in stdin.lock().lines() {
        let input = input?;
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("undo") {
            match buffer.undo(time::now_ms()) {
                Some(code) => {
                    ledger.undo_scan(&code).await.map_err(AppError::from)?;
                    eprintln!("undid {code}");
                }
                None => eprintln!("nothing to undo"),
            }
            continue;
        }
        match ledger.scan(input).await {
            Ok(line) => {
                buffer.record(line.ean.as_str(), time::now_ms());
                print_line(&line);
            }
            Err(err) => {
                // Keep the session alive; a misread barcode is routine.
                eprintln!("{}", AppError::from(err));
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    stockcount_lib::logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        tracing::error!(target = "stockcount", event = "fatal", error = %err);
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}
