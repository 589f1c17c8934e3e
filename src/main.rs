// src/main.rs

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use seo_dashboard::commands::{self, AnalysisSettingsRequest};
use seo_dashboard::config::{AppConfig, DEFAULT_CONFIG_FILE};
use seo_dashboard::lifecycle::{self, AppState};
use seo_dashboard::views;

#[derive(Parser)]
#[command(name = "seo-dashboard", version, about = "SEO dashboard for the terminal")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Seed for reproducible simulated data
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Fail instead of showing simulated data when a site cannot be fetched
    #[arg(long, global = true)]
    no_fallback: bool,

    /// Print JSON instead of the text view
    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct CrawlArgs {
    /// Maximum number of pages to analyse
    #[arg(long)]
    max_pages: Option<usize>,

    /// Delay between requests in milliseconds
    #[arg(long)]
    delay: Option<u64>,

    /// Check the status of every link found
    #[arg(long)]
    check_links: bool,

    /// Include external links when checking links
    #[arg(long)]
    external: bool,
}

impl CrawlArgs {
    fn request(&self) -> AnalysisSettingsRequest {
        AnalysisSettingsRequest {
            max_pages: self.max_pages,
            include_external_links: self.external.then_some(true),
            check_links: self.check_links.then_some(true),
            delay_between_requests: self.delay,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Crawl a site and list its pages and issues
    Crawl {
        url: String,
        #[command(flatten)]
        crawl: CrawlArgs,
    },
    /// Technical SEO score of one page
    Audit { url: String },
    /// Keyword ideas around a seed keyword
    Keywords {
        seed: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Keywords a page is about
    Extract {
        url: String,
        #[arg(long, default_value_t = 15)]
        limit: usize,
    },
    /// Track keyword positions for a domain
    Rank {
        domain: String,
        /// Keywords to start tracking
        keywords: Vec<String>,
        /// Number of additional ranking checks to run
        #[arg(long, default_value_t = 0)]
        refresh: usize,
    },
    /// Full site report
    Report {
        url: String,
        #[command(flatten)]
        crawl: CrawlArgs,
        /// Export format (json or csv) instead of the text view
        #[arg(long)]
        export: Option<String>,
        /// Write the export to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Title, description and heading outline of a page
    Headings { url: String },
    /// Broken links on a page
    Links {
        url: String,
        #[arg(long)]
        external: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    lifecycle::init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load_or_default(&cli.config);
    if cli.seed.is_some() {
        config.simulation.seed = cli.seed;
    }
    if cli.no_fallback {
        config.simulation.fallback_enabled = false;
    }
    let state = AppState::new(config)?;
    let json = cli.json;

    let result = dispatch(&state, cli.command, json).await;
    lifecycle::shutdown(&state);
    result
}

async fn dispatch(state: &AppState, command: Command, json: bool) -> anyhow::Result<()> {
    match command {
        Command::Crawl { url, crawl } => {
            let settings = crawl.request().apply(&state.config.crawl);
            let job = state.crawler.crawl(&url, settings).await?;
            emit(json, &job, views::reports::render_job)
        }
        Command::Audit { url } => {
            let report = commands::analyze_technical(state, url).await?;
            emit(json, &report, views::technical::render)
        }
        Command::Keywords { seed, limit } => {
            let ideas = commands::research_keywords(state, seed.clone(), Some(limit)).await?;
            emit(json, &ideas, |ideas| views::keywords::render_ideas(&seed, ideas))
        }
        Command::Extract { url, limit } => {
            let extraction = commands::extract_keywords(state, url, Some(limit)).await?;
            emit(json, &extraction, views::keywords::render_extraction)
        }
        Command::Rank {
            domain,
            keywords,
            refresh,
        } => {
            if !keywords.is_empty() {
                commands::track_keywords(state, domain.clone(), keywords).await?;
            }
            for _ in 0..refresh {
                commands::refresh_rankings(state, domain.clone()).await?;
            }
            let response = commands::get_rankings(state, domain).await?;
            emit(json, &response, |r| {
                views::rank_tracking::render(&r.rankings, &r.summary)
            })
        }
        Command::Report {
            url,
            crawl,
            export,
            output,
        } => {
            let report = commands::build_report(state, url, Some(crawl.request())).await?;
            match export {
                Some(format) => {
                    let text = commands::export_report(&report, format).await?;
                    match output {
                        Some(path) => std::fs::write(&path, text)
                            .with_context(|| format!("Failed to write {}", path.display()))?,
                        None => print!("{}", text),
                    }
                    Ok(())
                }
                None => emit(json, &report, views::reports::render),
            }
        }
        Command::Headings { url } => {
            let scan = commands::inspect_page(state, url, false, false).await?;
            emit(json, &scan, |s| views::headings::render(&s.page, s.error))
        }
        Command::Links { url, external } => {
            let scan = commands::inspect_page(state, url, true, external).await?;
            emit(json, &scan, |s| views::broken_links::render(&s.page, s.error))
        }
    }
}

fn emit<T: Serialize>(json: bool, value: &T, render: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", render(value));
    }
    Ok(())
}
