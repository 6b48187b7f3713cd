mod config;
mod core;
mod error;
mod fetch;
mod ports;
mod semantic;
mod ui;

use clap::{Parser, Subcommand};
use config::{AppConfig, CliOverrides};
use core::controller::{CrawlController, KeywordRule};
use error::AppError;
use fetch::{HttpFetcher, RealSleeper};
use ports::notifier::ConsoleNotifier;
use ports::persistence::JsonFilePersistence;
use ports::qualis::StaticQualisTable;
use ports::transport::ReqwestTransport;
use ports::translator::IdentityTranslator;
use ports::NotifierPort;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "paperhound")]
#[command(about = "Crawls Semantic Scholar, scores papers for relevance, and keeps a curated local bibliography per search")]
#[command(after_help = "Examples:
  paperhound crawl \"mine detection dog\" --pages 5 --require aggression
  paperhound status \"mine detection dog\"")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the configured Semantic Scholar API key
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// SOCKS5h proxy URL applied to all requests
    #[arg(long, global = true)]
    tor_socks_proxy: Option<String>,

    /// HTTP proxy URL applied to all requests
    #[arg(long, global = true)]
    tor_http_proxy: Option<String>,

    /// Tor control port; a NEWNYM signal is sent once before the run
    #[arg(long, global = true)]
    tor_control_port: Option<String>,

    /// Tor control port password
    #[arg(long, global = true)]
    tor_control_password: Option<String>,

    /// Directory search-label subdirectories are rooted under
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// tracing-style log filter, e.g. "info" or "paperhound=debug"
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one crawl and persist results under the sanitized search label
    Crawl {
        query: String,
        #[arg(long)]
        pages: Option<u32>,
        #[arg(long, value_name = "none|5|10|20")]
        year: Option<String>,
        /// A term that every accepted article's abstract must contain
        #[arg(long = "require")]
        require: Vec<String>,
        /// A term that boosts an article's score when present
        #[arg(long = "optional")]
        optional: Vec<String>,
    },
    /// Report how many articles/authors are already persisted for a search label
    Status { query: String },
    /// Out of scope: exporting is an external collaborator's responsibility
    Export {
        query: String,
        #[arg(long = "out")]
        out: PathBuf,
        #[arg(long)]
        merge: bool,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut keyword_rules = Vec::new();
    let (year_filter_raw, pages_desired) = match &cli.command {
        Commands::Crawl {
            require,
            optional,
            year,
            pages,
            ..
        } => {
            for term in require {
                keyword_rules.push(KeywordRule {
                    term: term.clone(),
                    required: true,
                });
            }
            for term in optional {
                keyword_rules.push(KeywordRule {
                    term: term.clone(),
                    required: false,
                });
            }
            (year.clone(), *pages)
        }
        _ => (None, None),
    };

    let overrides = CliOverrides {
        api_key: cli.api_key.clone(),
        tor_socks_proxy: cli.tor_socks_proxy.clone(),
        tor_http_proxy: cli.tor_http_proxy.clone(),
        tor_control_port: cli.tor_control_port.clone(),
        tor_control_password: cli.tor_control_password.clone(),
        year_filter: year_filter_raw,
        pages_desired,
        output_dir: cli.output_dir.clone(),
        log_level: cli.log_level.clone(),
        keyword_rules,
    };

    let config = match AppConfig::load(overrides) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", AppError::from(err));
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log_level);

    match run(&cli.command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(command: &Commands, config: &AppConfig) -> Result<bool, AppError> {
    let transport = ReqwestTransport::new(
        config
            .tor_socks_proxy
            .as_deref()
            .or(config.tor_http_proxy.as_deref()),
        config.semantic_scholar_api_key.clone(),
    );
    let notifier = ConsoleNotifier::new();
    let sleeper = RealSleeper;
    let fetcher = HttpFetcher::new(&transport, &notifier, &sleeper);
    let translator = IdentityTranslator;
    let qualis = StaticQualisTable;
    let persistence = JsonFilePersistence::new(config.output_dir.clone());

    if let Some(control_port) = config.tor_control_port {
        ports::tor::request_new_identity(control_port, config.tor_control_password.as_deref());
    }

    let controller = CrawlController::new(&persistence, &notifier, &fetcher, &translator, &qualis);

    match command {
        Commands::Crawl { query, .. } => {
            let summary = controller.run(query, config.pages_desired, config.year_filter, &config.keyword_rules);
            Ok(summary.success)
        }
        Commands::Status { query } => {
            let (articles, authors) = controller.status(query);
            crate::blog!(
                "Statut",
                "{} article(s), {} auteur(s) pour « {} »",
                articles,
                authors,
                query
            );
            Ok(true)
        }
        Commands::Export { query, merge, out } => {
            notifier.on_empty_export(*merge, query);
            crate::blog_warning!(
                "Export",
                "non implémenté dans ce binaire (cible demandée : {})",
                out.display()
            );
            Ok(true)
        }
    }
}
