//! One player summary request: identity, match history, benchmark and insights.

use crate::analysis::aggregator::{
    derive_your_build, AggregateReport, AggregateStats, ChampionAverages, MatchAggregator,
    PlayerChampionProfile, RecentMatch, SupportInsights, TrendPoint,
};
use crate::analysis::comparator::{compare_builds, ComparisonResult};
use crate::analysis::matchups::MatchupRow;
use crate::analysis::scorer::{deficit_terms, improvement_score, CohortDeltas, ImprovementScore, TargetDeltas};
use crate::analysis::tally::round_to;
use crate::api::client::{JsonFetcher, RiotApiClient};
use crate::benchmark::cohort::{BuildPicks, CohortEntry, CohortFetcher};
use crate::benchmark::consensus::{build_consensus, CohortAverages, CohortProfile};
use crate::benchmark::reference::{CatalogEntry, CatalogResolver, ReferenceCatalog};
use crate::config::{Config, ScoringProfile, TargetBands, COHORT_LIMIT, SAMPLE_MATCH_COUNT};
use crate::error::{truncate, AppError, Diagnostic, Diagnostics};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

const BENCHMARK_SOURCE: &str = "deeplol.gg";
const BENCHMARK_FAILURE: &str = "Failed to load cohort benchmark.";
const FAILURE_DETAIL_LIMIT: usize = 200;

#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub game_name: String,
    pub tag_line: String,
    pub platform: String,
    pub display_matches: usize,
    /// Cohort member to feature; the top entry when absent or unknown.
    pub reference: Option<String>,
    pub debug: bool,
}

/// Progress callbacks over the per-match fetch loop.
pub trait FetchProgress {
    fn start(&self, _total: usize) {}
    fn advance(&self, _match_id: &str) {}
    fn finish(&self) {}
}

impl FetchProgress for () {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerHeader {
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
    pub profile_icon_id: Option<i64>,
    pub summoner_level: Option<i64>,
    pub puuid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunesView {
    pub primary_style: Option<CatalogEntry>,
    pub keystone: Option<CatalogEntry>,
    pub primary_runes: Vec<CatalogEntry>,
    pub secondary_style: Option<CatalogEntry>,
    pub secondary_runes: Vec<CatalogEntry>,
    pub stat_shards: Vec<CatalogEntry>,
}

/// A build with every id resolved to display form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildView {
    pub core_items: Vec<CatalogEntry>,
    pub boots: Option<CatalogEntry>,
    pub summoner_spells: Vec<CatalogEntry>,
    pub runes: RunesView,
}

impl BuildView {
    pub fn resolve(picks: &BuildPicks, catalog: &ReferenceCatalog) -> Self {
        let rune = |id: u32| catalog.runes(&[id]).into_iter().next();
        BuildView {
            core_items: catalog.items(&picks.core_items),
            boots: catalog.items(&[picks.boots]).into_iter().next(),
            summoner_spells: catalog.spells(&picks.spells),
            runes: RunesView {
                primary_style: rune(picks.primary_style),
                keystone: rune(picks.keystone),
                primary_runes: catalog.runes(&picks.primary_runes),
                secondary_style: rune(picks.secondary_style),
                secondary_runes: catalog.runes(&picks.secondary_runes),
                stat_shards: catalog.runes(&picks.shards),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortOption {
    pub player_key: String,
    #[serde(flatten)]
    pub profile: CohortProfile,
}

impl From<&CohortEntry> for CohortOption {
    fn from(entry: &CohortEntry) -> Self {
        CohortOption {
            player_key: entry.player_key.clone(),
            profile: CohortProfile::from(entry),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceView {
    #[serde(flatten)]
    pub profile: CohortProfile,
    pub lane: String,
    pub build_games: i64,
    pub build_win_rate: f64,
    pub build: BuildView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusView {
    pub members: Vec<CohortProfile>,
    pub voters: usize,
    pub averages: CohortAverages,
    pub build: BuildView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YourBuildView {
    pub champion_games: usize,
    pub champion_win_rate: f64,
    pub build: BuildView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Benchmark {
    pub source: &'static str,
    pub region: String,
    pub champion: &'static str,
    pub data_version: String,
    pub selected_player_key: String,
    pub options: Vec<CohortOption>,
    pub featured: ReferenceView,
    pub consensus: ConsensusView,
    pub you: YourBuildView,
    pub comparison: ComparisonResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkFailure {
    pub source: &'static str,
    pub region: String,
    pub error: String,
    pub detail: String,
}

/// A benchmark failure never fails the summary; it is carried as a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BenchmarkOutcome {
    Ready(Box<Benchmark>),
    Failed(BenchmarkFailure),
}

impl BenchmarkOutcome {
    pub fn averages(&self) -> Option<&CohortAverages> {
        match self {
            BenchmarkOutcome::Ready(b) => Some(&b.consensus.averages),
            BenchmarkOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            BenchmarkOutcome::Ready(_) => None,
            BenchmarkOutcome::Failed(f) => Some(f.error.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanePhase {
    pub samples: usize,
    pub avg_gold_diff_14: f64,
    pub avg_xp_diff_14: f64,
    pub avg_assists_before_14: f64,
    pub avg_deaths_before_14: f64,
    pub avg_first_death_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KarmaInsights {
    pub sample_matches: usize,
    pub analyzed_karma_games: usize,
    pub your: ChampionAverages,
    pub cohort_averages: Option<CohortAverages>,
    pub target_bands: TargetBands,
    pub delta_vs_cohort: CohortDeltas,
    pub delta_vs_targets: TargetDeltas,
    pub trend: Vec<TrendPoint>,
    pub lane_phase: LanePhase,
    pub matchups: Vec<MatchupRow>,
    pub improvement_score: ImprovementScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player: PlayerHeader,
    pub recent_matches: Vec<RecentMatch>,
    pub aggregate: AggregateStats,
    pub support_insights: SupportInsights,
    pub benchmark: BenchmarkOutcome,
    pub karma_insights: KarmaInsights,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Vec<Diagnostic>>,
}

/// Long-lived request handler. Owns the process-wide catalog and cohort caches.
pub struct SummaryService {
    fetcher: Arc<dyn JsonFetcher>,
    catalogs: CatalogResolver,
    cohorts: CohortFetcher,
    region: String,
    scoring: ScoringProfile,
}

impl SummaryService {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, benchmark_platform: &str, scoring: ScoringProfile) -> Self {
        SummaryService {
            catalogs: CatalogResolver::new(Arc::clone(&fetcher)),
            cohorts: CohortFetcher::new(Arc::clone(&fetcher), benchmark_platform),
            region: benchmark_platform.to_uppercase(),
            fetcher,
            scoring,
        }
    }

    pub fn from_config(fetcher: Arc<dyn JsonFetcher>, config: &Config) -> Self {
        SummaryService::new(fetcher, &config.benchmark_platform, config.scoring.clone())
    }

    /// Fails only when the player cannot be resolved; everything after
    /// identity degrades into diagnostics.
    pub fn player_summary(
        &self,
        request: &SummaryRequest,
        progress: &dyn FetchProgress,
    ) -> Result<PlayerSummary, AppError> {
        let client = RiotApiClient::new(Arc::clone(&self.fetcher), &request.platform)?;
        let account = client.get_account(&request.game_name, &request.tag_line)?;
        let summoner = client.get_summoner(&account.puuid)?;
        let puuid = account.puuid.clone();

        let mut diagnostics = Diagnostics::new();
        let sample = request.display_matches.max(SAMPLE_MATCH_COUNT);
        let match_ids = client.get_match_ids(&puuid, sample).unwrap_or_else(|err| {
            diagnostics.record_error("match_ids", &err);
            Vec::new()
        });

        let report = self.aggregate_matches(&client, &puuid, &match_ids, request.display_matches, &mut diagnostics, progress);
        info!(
            matches = match_ids.len(),
            champion_games = report.profile.games,
            skipped = report.skipped,
            "match history aggregated"
        );

        let benchmark = match self.resolve_benchmark(&report.profile, request.reference.as_deref(), &mut diagnostics) {
            Ok(benchmark) => BenchmarkOutcome::Ready(Box::new(benchmark)),
            Err(err) => {
                warn!(error = %err, "benchmark unavailable");
                let detail = err.to_string();
                diagnostics.record("benchmark_compare", 0, &detail);
                BenchmarkOutcome::Failed(BenchmarkFailure {
                    source: BENCHMARK_SOURCE,
                    region: self.region.clone(),
                    error: BENCHMARK_FAILURE.to_string(),
                    detail: truncate(&detail, FAILURE_DETAIL_LIMIT),
                })
            }
        };

        let karma_insights = self.insights(&report, &benchmark, sample);
        Ok(PlayerSummary {
            player: PlayerHeader {
                game_name: account.game_name,
                tag_line: account.tag_line,
                profile_icon_id: summoner.profile_icon_id,
                summoner_level: summoner.summoner_level,
                puuid,
            },
            recent_matches: report.recent_matches,
            aggregate: report.aggregate,
            support_insights: report.support_insights,
            benchmark,
            karma_insights,
            diagnostics: request.debug.then(|| diagnostics.into_vec()),
        })
    }

    fn aggregate_matches(
        &self,
        client: &RiotApiClient,
        puuid: &str,
        match_ids: &[String],
        display_matches: usize,
        diagnostics: &mut Diagnostics,
        progress: &dyn FetchProgress,
    ) -> AggregateReport {
        let mut aggregator = MatchAggregator::new(puuid, display_matches);
        progress.start(match_ids.len());

        for match_id in match_ids {
            match client.get_match(match_id) {
                Ok(record) => {
                    aggregator.ingest(match_id, &record, || match client.get_timeline(match_id) {
                        Ok(timeline) => Some(timeline),
                        Err(err) => {
                            diagnostics.record_error("match_timeline", &err);
                            None
                        }
                    });
                }
                Err(err) => diagnostics.record_error("match_detail", &err),
            }
            progress.advance(match_id);
        }

        progress.finish();
        aggregator.finish()
    }

    fn resolve_benchmark(
        &self,
        profile: &PlayerChampionProfile,
        reference: Option<&str>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Benchmark, AppError> {
        let catalog = self.catalogs.get_catalog()?;
        let cohort = self.cohorts.get_cohort(COHORT_LIMIT)?;

        let featured = reference
            .map(str::trim)
            .and_then(|key| cohort.iter().find(|entry| entry.player_key == key))
            .or_else(|| cohort.first())
            .ok_or(AppError::EmptyCohort)?;
        let featured_build = self.cohorts.get_signature_build(&featured.player_key)?;

        let consensus = build_consensus(&cohort, |key| self.cohorts.get_signature_build(key));
        for member in &consensus.excluded {
            diagnostics.record(
                "cohort_build",
                member.status,
                &format!("{}: {}", member.riot_id, member.reason),
            );
        }

        let yours = derive_your_build(profile, &catalog);
        let comparison = compare_builds(&yours, &consensus.picks, &catalog);
        let averages = profile.averages();

        Ok(Benchmark {
            source: BENCHMARK_SOURCE,
            region: self.region.clone(),
            champion: "Karma",
            data_version: catalog.version.clone(),
            selected_player_key: featured.player_key.clone(),
            options: cohort.iter().map(CohortOption::from).collect(),
            featured: ReferenceView {
                profile: CohortProfile::from(featured),
                lane: featured.lane.clone(),
                build_games: featured_build.games,
                build_win_rate: round_to(featured_build.win_rate * 100.0, 1),
                build: BuildView::resolve(&featured_build.picks, &catalog),
            },
            consensus: ConsensusView {
                members: consensus.profiles.clone(),
                voters: consensus.voters,
                averages: consensus.averages.clone(),
                build: BuildView::resolve(&consensus.picks, &catalog),
            },
            you: YourBuildView {
                champion_games: profile.games,
                champion_win_rate: averages.win_rate,
                build: BuildView::resolve(&yours, &catalog),
            },
            comparison,
        })
    }

    fn insights(&self, report: &AggregateReport, benchmark: &BenchmarkOutcome, sample: usize) -> KarmaInsights {
        let profile = &report.profile;
        let your = profile.averages();
        let terms = deficit_terms(&your, &self.scoring);

        KarmaInsights {
            sample_matches: sample,
            analyzed_karma_games: profile.games,
            cohort_averages: benchmark.averages().cloned(),
            target_bands: self.scoring.targets.clone(),
            delta_vs_cohort: CohortDeltas::between(&your, benchmark.averages()),
            delta_vs_targets: TargetDeltas::between(&your, &self.scoring.targets),
            trend: report.trend.clone(),
            lane_phase: LanePhase {
                samples: profile.lane_samples,
                avg_gold_diff_14: your.gold_diff_14,
                avg_xp_diff_14: your.xp_diff_14,
                avg_assists_before_14: your.assists_before_14,
                avg_deaths_before_14: your.deaths_before_14,
                avg_first_death_min: your.first_death_min,
            },
            matchups: report.matchups.clone(),
            improvement_score: improvement_score(&terms),
            your,
        }
    }
}
