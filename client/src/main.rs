//! Bookstore admin CLI
//!
//! # Commands
//!
//! ```bash
//! bookstore-admin import users.xlsx            # Ingest, preview and bulk-create users
//! bookstore-admin import users.csv --dry-run   # Ingest and preview only
//! bookstore-admin upload cover.png -d book     # Upload images, print stored names
//! bookstore-admin users --full-name an         # List users
//! bookstore-admin users --export               # Save the page to export-user.csv
//! bookstore-admin books --author tolkien       # List books
//! bookstore-admin query users --from 2024-01-01 --to 2024-01-31
//! ```
//!
//! Configuration comes from the environment (see `AdminConfig::from_env`);
//! `--backend-url` overrides `BACKEND_URL`.

use bookstore_admin::{
    export_users, ingest_file, select_and_upload, AdminConfig, AdminResult, BookRow,
    BulkSubmissionCoordinator, HttpBackend, ListBackend, ListQueryBuilder, ListState, ListingSpec,
    Notifier, Page, Resource, SelectedFile, SlotMode, Sort, UploadDestination, UploadError,
    UploadSlotController, UserRow, USER_EXPORT_FILE_NAME,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "bookstore-admin")]
#[command(about = "Bookstore admin: image uploads, user import and listings", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import users from a CSV / XLSX / XLS file
    Import {
        /// Spreadsheet file
        input: PathBuf,

        /// Ingest and preview without submitting
        #[arg(long)]
        dry_run: bool,

        /// Write the ingested records as JSON (default: stdout preview)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Upload images to a storage folder
    Upload {
        /// JPG / PNG files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Storage folder
        #[arg(short, long, default_value = "book")]
        destination: UploadDestination,
    },

    /// List users
    Users {
        #[command(flatten)]
        list: ListArgs,

        /// Filter on email (substring, case-insensitive)
        #[arg(long)]
        email: Option<String>,

        /// Filter on full name (substring, case-insensitive)
        #[arg(long)]
        full_name: Option<String>,

        #[command(flatten)]
        range: RangeArgs,

        /// Write the page as CSV instead of printing it
        #[arg(long, num_args = 0..=1, default_missing_value = USER_EXPORT_FILE_NAME)]
        export: Option<PathBuf>,
    },

    /// List books
    Books {
        #[command(flatten)]
        list: ListArgs,

        /// Filter on title (substring, case-insensitive)
        #[arg(long)]
        main_text: Option<String>,

        /// Filter on author (substring, case-insensitive)
        #[arg(long)]
        author: Option<String>,
    },

    /// Print the query string a listing would send
    Query {
        screen: Screen,

        #[command(flatten)]
        list: ListArgs,

        /// Text filters as field=value
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Screen {
    Users,
    Books,
}

#[derive(Args)]
struct ListArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    page: u32,

    /// Rows per page
    #[arg(long, default_value = "10")]
    page_size: u32,

    /// Sort field; prefix with '-' for descending
    #[arg(long, allow_hyphen_values = true)]
    sort: Option<Sort>,
}

#[derive(Args)]
struct RangeArgs {
    /// Created on or after (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Created on or before (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match load_config(cli.backend_url.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Import { input, dry_run, output } => {
                cmd_import(&config, &input, dry_run, output.as_deref()).await
            }

            Commands::Upload { files, destination } => cmd_upload(&config, files, destination).await,

            Commands::Users { list, email, full_name, range, export } => {
                let mut state = list_state(&list).range(range.from, range.to);
                if let Some(email) = email {
                    state = state.filter("email", &email);
                }
                if let Some(name) = full_name {
                    state = state.filter("fullName", &name);
                }
                match export {
                    Some(path) => cmd_export_users(&config, &state, &path).await,
                    None => cmd_list::<UserRow>(&config, Resource::Users, &state).await,
                }
            }

            Commands::Books { list, main_text, author } => {
                let mut state = list_state(&list);
                if let Some(text) = main_text {
                    state = state.filter("mainText", &text);
                }
                if let Some(author) = author {
                    state = state.filter("author", &author);
                }
                cmd_list::<BookRow>(&config, Resource::Books, &state).await
            }

            Commands::Query { screen, list, filters, range } => {
                let mut state = list_state(&list).range(range.from, range.to);
                for (field, value) in &filters {
                    state = state.filter(field, value);
                }
                cmd_query(screen, &state)
            }
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(backend_url: Option<&str>) -> AdminResult<AdminConfig> {
    let config = AdminConfig::from_env()?;
    Ok(match backend_url {
        Some(url) => config.with_backend_url(url),
        None => config,
    })
}

async fn cmd_import(config: &AdminConfig, input: &Path, dry_run: bool, output: Option<&Path>) -> AdminResult<()> {
    eprintln!("📄 Ingesting: {}", input.display());

    let ingested = ingest_file(input)?;
    for sheet in &ingested.sheets {
        eprintln!("   Sheet '{}': {}", sheet.sheet, sheet.headers.join(", "));
    }
    eprintln!("✅ {} records ({})", ingested.records.len(), ingested.format);

    let mut import = BulkSubmissionCoordinator::new(config, Notifier::new());
    import.open();
    import.stage(ingested.records)?;

    match output {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(import.staged())?)?;
            eprintln!("💾 Records written to: {}", path.display());
        }
        None => print_preview(&import),
    }

    if dry_run {
        import.cancel();
        eprintln!("   Dry run, nothing submitted.");
        return Ok(());
    }

    let backend = HttpBackend::new(config)?;
    let outcome = import.submit(&backend).await?;
    eprintln!("✨ Imported {} users (batch {})", outcome.submitted, outcome.batch_id);
    Ok(())
}

fn print_preview(import: &BulkSubmissionCoordinator) {
    println!("{:<6} {:<28} {:<32} {}", "row", "fullName", "email", "phone");
    for record in import.staged() {
        let cell = |field: &str| record.get(field).map(ToString::to_string).unwrap_or_default();
        println!(
            "{:<6} {:<28} {:<32} {}",
            record.row_number,
            cell("fullName"),
            cell("email"),
            cell("phone")
        );
    }
}

async fn cmd_upload(config: &AdminConfig, paths: Vec<PathBuf>, destination: UploadDestination) -> AdminResult<()> {
    let backend = HttpBackend::new(config)?;
    let mut controller =
        UploadSlotController::new(SlotMode::Multi, destination, backend.base_url(), Notifier::new());

    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let bytes = tokio::fs::read(path).await?;
        files.push(SelectedFile::from_path(path, bytes));
    }

    eprintln!("📤 Uploading {} file(s) to '{}'", files.len(), destination);

    let results = select_and_upload(&mut controller, &backend, files).await;
    let mut failed = 0;

    for (path, result) in paths.iter().zip(&results) {
        match result {
            Ok(id) => {
                let url = controller.slot(*id).and_then(|s| s.remote_url()).unwrap_or_default();
                println!("{}\t{}", path.display(), url);
            }
            Err(e) => {
                failed += 1;
                eprintln!("   ❌ {}: {}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        let summary = format!("{} of {} uploads failed", failed, results.len());
        return Err(UploadError::UploadFailed(summary).into());
    }
    Ok(())
}

async fn fetch_page<T: DeserializeOwned>(
    config: &AdminConfig,
    resource: Resource,
    state: &ListState,
) -> AdminResult<Page<T>> {
    let spec = match resource {
        Resource::Users => ListingSpec::users(),
        Resource::Books => ListingSpec::books(),
    };
    let query = ListQueryBuilder::new(spec).build(state);
    let backend = HttpBackend::new(config)?;

    let page: Page<T> = backend.fetch_page(resource, &query).await?;
    eprintln!(
        "📋 {} page {}/{} ({} total)",
        resource, page.meta.current, page.meta.pages, page.meta.total
    );
    Ok(page)
}

async fn cmd_list<T>(config: &AdminConfig, resource: Resource, state: &ListState) -> AdminResult<()>
where
    T: DeserializeOwned + Serialize,
{
    let page: Page<T> = fetch_page(config, resource, state).await?;
    println!("{}", serde_json::to_string_pretty(&page.result)?);
    Ok(())
}

async fn cmd_export_users(config: &AdminConfig, state: &ListState, path: &Path) -> AdminResult<()> {
    let page: Page<UserRow> = fetch_page(config, Resource::Users, state).await?;
    let written = export_users(&page.result, path)?;
    eprintln!("💾 {} user(s) exported to: {}", written, path.display());
    Ok(())
}

fn cmd_query(screen: Screen, state: &ListState) -> AdminResult<()> {
    let spec = match screen {
        Screen::Users => ListingSpec::users(),
        Screen::Books => ListingSpec::books(),
    };
    println!("{}", ListQueryBuilder::new(spec).build(state));
    Ok(())
}

fn list_state(args: &ListArgs) -> ListState {
    let state = ListState::new(args.page, args.page_size);
    match &args.sort {
        Some(sort) => state.sorted(sort.clone()),
        None => state,
    }
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))
}
