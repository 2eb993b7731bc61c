use anyhow::Context;
use clap::Parser;
use indicatif::ProgressBar;
use karma_benchmark::api::client::{HttpFetcher, JsonFetcher};
use karma_benchmark::config::{Config, DISPLAY_MATCH_COUNT};
use karma_benchmark::display::output::{display_error, display_info, display_player_summary, display_success};
use karma_benchmark::summary::{SummaryRequest, SummaryService};
use std::sync::{Arc, Once};
use tracing_subscriber::{fmt, EnvFilter};

const LOG_ENV: &str = "KARMA_BENCH_LOG";
const DEFAULT_LOG_FILTER: &str = "karma_benchmark=info";

static INIT: Once = Once::new();

#[derive(Parser, Debug)]
#[command(name = "Karma Benchmark")]
#[command(about = "Compare your Karma support games against a top-ranked cohort", long_about = None)]
struct Args {
    /// Riot Game Name
    game_name: String,

    /// Riot Tag (tag line)
    tag_line: String,

    /// Platform (default: RIOT_PLATFORM or euw1)
    #[arg(short, long)]
    platform: Option<String>,

    /// Number of recent matches to display (default: 5)
    #[arg(short, long, default_value_t = DISPLAY_MATCH_COUNT)]
    matches: usize,

    /// Cohort player key to feature as the reference player
    #[arg(long)]
    reference: Option<String>,

    /// Include degraded upstream calls in the output
    #[arg(long)]
    debug: bool,

    /// Print the summary as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn init_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}

fn main() {
    let args = Args::parse();
    init_logging();

    if let Err(e) = run(args) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let platform = args
        .platform
        .map(|p| p.to_lowercase())
        .unwrap_or_else(|| config.platform.clone());

    let request = SummaryRequest {
        game_name: args.game_name,
        tag_line: args.tag_line,
        platform,
        display_matches: args.matches.max(1),
        reference: args.reference,
        debug: args.debug,
    };

    let fetcher: Arc<dyn JsonFetcher> = Arc::new(HttpFetcher::new(&config.api_key));
    let service = SummaryService::from_config(fetcher, &config);

    let summary = if args.json {
        service.player_summary(&request, &())
    } else {
        display_info(&format!(
            "Fetching data for {}#{} on {}",
            request.game_name, request.tag_line, request.platform
        ));
        let pb = ProgressBar::new(0);
        service.player_summary(&request, &pb)
    }
    .with_context(|| format!("could not build summary for {}#{}", request.game_name, request.tag_line))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        display_success(&format!(
            "Analyzed {} Karma games",
            summary.karma_insights.analyzed_karma_games
        ));
        display_player_summary(&summary);
    }

    Ok(())
}
