mod error;

use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use pagekeep_catalog::{
    Catalog, Database, Document, DocumentFilter, DocumentSort, ReadingStatus, SortDirection, SortField,
};
use pagekeep_config::Config;
use pagekeep_library::{ScanOptions, ScanProgress, ScanReport, Scanner};
use pagekeep_render::{BoundingBox, RendererHandle, ThumbnailCache};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Personal PDF library manager")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to the platform
    /// config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import new documents from ROOT, or from every configured root.
    Scan { root: Option<PathBuf> },
    /// Import a single file, even if it cannot be read.
    Import { file: PathBuf },
    /// List every document.
    List {
        /// title, author, date_added, last_read, rating or page_count.
        #[arg(long, default_value = "title")]
        sort: String,
        #[arg(long)]
        desc: bool,
    },
    /// Find documents. All given filters must match.
    Search {
        /// Substring of title, author or publisher.
        #[arg(long)]
        text: Option<String>,
        /// Repeat to require several tags.
        #[arg(long)]
        tag: Vec<String>,
        /// unread, reading or completed.
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        series: Option<String>,
        #[arg(long)]
        favorites: bool,
    },
    /// List series with their documents in reading order.
    Series,
    /// Library totals.
    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let db = Database::connect(&config.database.path).await.or_raise(|| ErrorKind::Catalog)?;
    let catalog = Catalog::from(&db);
    let result = dispatch(cli.command, &config, &catalog).await;
    db.close().await;
    result
}

async fn dispatch(command: Command, config: &Config, catalog: &Catalog) -> Result<()> {
    match command {
        Command::Scan { root } => {
            let scanner = scanner(config, catalog)?;
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupted; finishing the current file");
                    on_interrupt.cancel();
                }
            });
            let mut progress =
                |p: &ScanProgress| eprintln!("[{:>3}%] {}/{} {}", p.percent, p.current, p.total, p.message);
            let options = ScanOptions { progress: Some(&mut progress), cancel: Some(cancel) };
            let report = match root {
                Some(root) => scanner.scan_root(&root, options).await,
                None => scanner.scan_all(&config.library.roots, options).await,
            }
            .or_raise(|| ErrorKind::Library)?;
            print_report(&report);
        },
        Command::Import { file } => {
            let document = scanner(config, catalog)?.import_file(&file).await.or_raise(|| ErrorKind::Library)?;
            print_documents(&[document]);
        },
        Command::List { sort, desc } => {
            let documents = catalog.list_documents(list_sort(&sort, desc)?).await.or_raise(|| ErrorKind::Catalog)?;
            print_documents(&documents);
        },
        Command::Search { text, tag, status, series, favorites } => {
            let status = status
                .map(|s| s.parse::<ReadingStatus>().or_raise(|| ErrorKind::Argument(s.clone())))
                .transpose()?;
            let filter =
                DocumentFilter { text, tags: tag, series, status, favorites_only: favorites, ..Default::default() };
            let documents =
                catalog.search_documents(&filter, DocumentSort::default()).await.or_raise(|| ErrorKind::Catalog)?;
            print_documents(&documents);
        },
        Command::Series => {
            for series in catalog.list_series().await.or_raise(|| ErrorKind::Catalog)? {
                println!("{}", series.name);
                for entry in catalog.series_documents(series.id).await.or_raise(|| ErrorKind::Catalog)? {
                    let order = entry.order.map(|o| o.to_string()).unwrap_or_else(|| "-".to_string());
                    println!("  {order:>5}  {}", entry.document.title);
                }
            }
        },
        Command::Stats => {
            let stats = catalog.statistics().await.or_raise(|| ErrorKind::Catalog)?;
            println!("books:     {}", stats.total_books);
            println!("series:    {}", stats.total_series);
            println!("tags:      {}", stats.total_tags);
            println!("unread:    {}", stats.unread);
            println!("reading:   {}", stats.reading);
            println!("completed: {}", stats.completed);
            println!("favorites: {}", stats.favorites);
            println!("pages:     {}", stats.total_pages);
        },
    }
    Ok(())
}

fn list_sort(sort: &str, desc: bool) -> Result<DocumentSort> {
    let field = sort.parse::<SortField>().or_raise(|| ErrorKind::Argument(sort.to_string()))?;
    let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
    Ok(DocumentSort::new(field, direction))
}

fn scanner(config: &Config, catalog: &Catalog) -> Result<Scanner> {
    let renderer = renderer()?;
    let size = BoundingBox { width: config.thumbnails.width, height: config.thumbnails.height };
    let thumbnails = ThumbnailCache::new(&config.thumbnails.dir, Arc::clone(&renderer)).with_size(size);
    Ok(Scanner::new(catalog.clone(), renderer)
        .with_thumbnails(Arc::new(thumbnails))
        .with_extensions(config.extensions()))
}

#[cfg(feature = "pdfium")]
fn renderer() -> Result<RendererHandle> {
    Ok(Arc::new(pagekeep_render::pdfium::PdfiumRenderer::new(None)))
}

#[cfg(not(feature = "pdfium"))]
fn renderer() -> Result<RendererHandle> {
    exn::bail!(ErrorKind::NoRenderer)
}

fn print_report(report: &ScanReport) {
    println!("added {}, skipped {}, failed {}", report.added, report.skipped, report.failed);
    if report.cancelled {
        println!("scan was cancelled; run it again to continue");
    }
}

fn print_documents(documents: &[Document]) {
    for document in documents {
        let author = document.author.as_deref().unwrap_or("");
        println!("{:>6}  {:<9}  {}  {}", document.id, document.status.as_str(), document.title, author);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_arguments() {
        let cli = Cli::try_parse_from(["pagekeep", "list", "--sort", "rating", "--desc"]).unwrap();
        let Command::List { sort, desc } = cli.command else {
            panic!("expected the list command");
        };
        assert_eq!(list_sort(&sort, desc).unwrap(), DocumentSort::new(SortField::Rating, SortDirection::Desc));
        let err = list_sort("shoe size", false).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Argument(arg) if arg == "shoe size"));
    }
}
