// SPDX-License-Identifier: MPL-2.0

mod cache;
mod config;
mod document;
mod error;
mod html;
mod logging;
mod pipeline;
mod relevance;
mod runtime;
mod settings;
mod social;
mod text;

use cache::CacheDb;
use clap::{Parser, Subcommand};
use error::VerifyError;
use pipeline::Pipeline;
use settings::Settings;
use social::{FeedOrigin, Timeline};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = config::APP_ID, about = "Verify claimed fans: identity document, social history, esports profile")]
struct Cli {
    /// Settings file (defaults to ~/.config/knowyourfan/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Cache database (defaults to ~/.local/share/knowyourfan/cache.db)
    #[arg(long, global = true, env = "KYF_CACHE_DB")]
    cache_db: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a scanned identity document against name and birth date
    Document {
        image: PathBuf,
        #[arg(long)]
        name: String,
        /// DD/MM/YYYY
        #[arg(long)]
        birth_date: String,
    },
    /// Recent posts for a handle (the organization's own when omitted)
    Timeline {
        handle: Option<String>,
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
        /// Fail on API rate limiting instead of scraping the public mirror
        #[arg(long)]
        no_fallback: bool,
    },
    /// A fan's posts that mention the organization
    Mentions {
        handle: String,
        #[arg(short = 'n', long, default_value = "50")]
        max: usize,
    },
    /// Ask the classifier whether an esports profile link fits the fan
    Relevance {
        url: String,
        #[arg(long)]
        summary: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error ({}): {e}", e.kind());
            ExitCode::from(2)
        }
    }
}

/// Ok(false) means the check ran and did not pass
fn run(cli: Cli) -> Result<bool, VerifyError> {
    let settings = match &cli.settings {
        Some(path) => Settings::load_with(path),
        None => Settings::load(),
    };
    let cache = match &cli.cache_db {
        Some(path) => CacheDb::open_at(path)?,
        None => CacheDb::open()?,
    };
    let pipeline = Pipeline::from_settings(&settings, cache)?;

    match cli.command {
        Commands::Document {
            image,
            name,
            birth_date,
        } => {
            let bytes = std::fs::read(&image).map_err(document::DocumentError::from)?;
            let valid = pipeline.validate_document(&bytes, &name, &birth_date)?;
            println!("{}", if valid { "document verified" } else { "document does not match" });
            Ok(valid)
        }
        Commands::Timeline {
            handle,
            count,
            no_fallback,
        } => {
            let handle = handle.unwrap_or_else(|| pipeline.organization().to_string());
            if no_fallback {
                let timeline = pipeline.fetch_timeline(&handle, count)?;
                println!("@{handle}");
                print_timeline(&timeline);
                return Ok(true);
            }
            let feed = pipeline.load_feed(&handle, count)?;
            let origin = match feed.origin {
                FeedOrigin::Cache => "cache",
                FeedOrigin::Primary => "api",
                FeedOrigin::Secondary => "public scrape",
            };
            println!("@{handle} ({origin})");
            print_timeline(&feed.timeline);
            Ok(true)
        }
        Commands::Mentions { handle, max } => {
            let posts = pipeline.fetch_mentions(&handle, max)?;
            println!(
                "{} post(s) by @{handle} mention {}",
                posts.len(),
                pipeline.organization()
            );
            print_timeline(&Timeline::new(posts, Default::default()));
            Ok(true)
        }
        Commands::Relevance { url, summary } => {
            let relevant = pipeline.is_relevant(&url, &summary)?;
            println!("{}", if relevant { "relevant" } else { "not relevant" });
            Ok(relevant)
        }
    }
}

fn print_timeline(timeline: &Timeline) {
    if timeline.posts.is_empty() {
        println!("  no recent posts found");
        return;
    }
    for post in &timeline.posts {
        let who = timeline
            .author_of(post)
            .map(|a| format!("{} (@{})", a.name, a.username))
            .unwrap_or_else(|| post.author_id.clone());
        println!(
            "  [{}] {who}: {}",
            post.created_at.format("%d/%m/%Y %H:%M"),
            post.text.replace('\n', " ")
        );
    }
}
