use std::fmt::Display;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use hh_scrape::export::{self, Table};
use hh_scrape::query::SearchQuery;
use hh_scrape::types::Listing;
use hh_scrape::utils::{ExportFilter, ListingStats};
use hh_scrape::{FetchStrategy, WebScraper};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "hh-scrape")]
#[command(about = "An hh.ru vacancy and resume scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Search vacancies through the JSON API and export them
    Vacancies {
        #[arg(
            short = 's',
            long = "search",
            default_value = "",
            help = "Search phrase; omitted from the request when empty"
        )]
        search: String,

        #[arg(short = 'a', long = "area", help = "Area code to search in (repeatable)")]
        areas: Vec<u32>,

        #[arg(
            short = 'r',
            long = "role",
            help = "Professional role code to filter by (repeatable)"
        )]
        roles: Vec<u32>,

        #[arg(
            long,
            help = "Fetch the full record of every vacancy (slower, includes key skills)"
        )]
        detail: bool,

        #[arg(long, help = "Maximum number of records to export")]
        limit: Option<usize>,

        #[arg(long, help = "Number of records to skip from the beginning")]
        offset: Option<usize>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "csv",
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(
            long,
            value_name = "PATH",
            help = "CSV file path; defaults to a name derived from the search"
        )]
        out: Option<PathBuf>,
    },
    /// Search resumes through the HTML search pages and export them
    Resumes {
        #[arg(
            short = 'n',
            long = "pages",
            value_parser = clap::value_parser!(u32).range(1..),
            help = "Number of search pages to walk"
        )]
        pages: u32,

        #[arg(
            short = 's',
            long = "search",
            default_value = "",
            help = "Search phrase; omitted from the request when empty"
        )]
        search: String,

        #[arg(short = 'a', long = "area", help = "Area code to search in (repeatable)")]
        areas: Vec<u32>,

        #[arg(
            short = 'r',
            long = "role",
            help = "Professional role code to filter by (repeatable)"
        )]
        roles: Vec<u32>,

        #[arg(long, help = "Maximum number of records to export")]
        limit: Option<usize>,

        #[arg(long, help = "Number of records to skip from the beginning")]
        offset: Option<usize>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "csv",
            help = "Output format"
        )]
        format: OutputFormat,

        #[arg(
            long,
            value_name = "PATH",
            help = "CSV file path; defaults to a name derived from the search"
        )]
        out: Option<PathBuf>,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn emit<T>(listings: &[T], format: OutputFormat, out: Option<PathBuf>, kind: &str, query: &SearchQuery)
where
    T: Listing + serde::Serialize + Display,
{
    match format {
        OutputFormat::Json => serialize_json(&listings),
        OutputFormat::Text => {
            if listings.is_empty() {
                println!("No entries to display.");
            } else {
                for (i, listing) in listings.iter().enumerate() {
                    println!("{:>3}. {}", i + 1, listing);
                }
                print!("{}", ListingStats::from_listings(listings));
            }
        }
        OutputFormat::Csv => {
            let table = Table::build(listings);
            let path = out.unwrap_or_else(|| PathBuf::from(export::export_filename(kind, query)));
            match export::write_csv(&table, &path) {
                Ok(()) => log::info!(
                    "Wrote {} record(s) to {}",
                    table.data_rows().len(),
                    path.display()
                ),
                Err(e) => {
                    log::error!("Error writing {}: {}", path.display(), e);
                    process::exit(1);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let scraper = WebScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });

    match cli.command {
        Commands::Vacancies {
            search,
            areas,
            roles,
            detail,
            limit,
            offset,
            format,
            out,
        } => {
            let filter = ExportFilter { limit, offset }.validate().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });
            let query = SearchQuery::from_parts(search, areas, roles);
            let strategy = if detail {
                FetchStrategy::WithDetails
            } else {
                FetchStrategy::PageOnly
            };

            log::info!("Searching vacancies...");
            let mut postings = scraper
                .fetch_vacancies(&query, strategy)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching vacancies: {}", e);
                    process::exit(1);
                });

            postings = filter.apply(postings);
            emit(&postings, format, out, "vacancies", &query);
        }

        Commands::Resumes {
            pages,
            search,
            areas,
            roles,
            limit,
            offset,
            format,
            out,
        } => {
            let filter = ExportFilter { limit, offset }.validate().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });
            let query = SearchQuery::from_parts(search, areas, roles);

            log::info!("Searching resumes across {} page(s)...", pages);
            let mut profiles = scraper
                .fetch_resumes(&query, pages)
                .await
                .unwrap_or_else(|e| {
                    log::error!("Error fetching resumes: {}", e);
                    process::exit(1);
                });

            profiles = filter.apply(profiles);
            emit(&profiles, format, out, "resumes", &query);
        }
    }
}
