use crate::api::client::{fetch_as, JsonFetcher};
use crate::api::endpoints;
use crate::api::models::{BuildDetailDto, CohortRowDto, ItemComboDto, MasterBuildDto, MasteryRankDto};
use crate::cache::{MemoMap, SnapshotCache};
use crate::config::{self, COHORT_LIMIT, COHORT_REQUEST_SIZE, KARMA_CHAMPION_ID};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

/// One top-ranked reference player for the tracked champion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortEntry {
    pub player_key: String,
    pub display_name: String,
    pub rank: i64,
    pub tier: String,
    pub league_points: i64,
    pub games: i64,
    /// Fraction in `[0, 1]` as reported upstream.
    pub win_rate: f64,
    pub kda: f64,
    pub lane: String,
}

impl From<CohortRowDto> for CohortEntry {
    fn from(row: CohortRowDto) -> Self {
        let name = match row.riot_id_name.as_str() {
            "" => "Unknown",
            name => name,
        };
        let tag = match row.riot_id_tag_line.as_str() {
            "" => "?",
            tag => tag,
        };
        CohortEntry {
            display_name: format!("{}#{}", name, tag),
            player_key: row.puu_id,
            rank: row.rank,
            tier: row.tier,
            league_points: row.lp,
            games: row.games,
            win_rate: row.win_rate,
            kda: row.kda,
            lane: row.lane,
        }
    }
}

/// Ascending rank, then descending LP, then descending games.
pub fn cohort_order(a: &CohortEntry, b: &CohortEntry) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then_with(|| b.league_points.cmp(&a.league_points))
        .then_with(|| b.games.cmp(&a.games))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortFilter {
    SupportLane,
    Unfiltered,
}

/// Tried in order; the first filter that keeps any row wins.
pub const COHORT_FILTERS: [CohortFilter; 2] = [CohortFilter::SupportLane, CohortFilter::Unfiltered];

impl CohortFilter {
    fn keeps(self, entry: &CohortEntry) -> bool {
        match self {
            CohortFilter::SupportLane => entry.lane.to_lowercase().starts_with("support"),
            CohortFilter::Unfiltered => true,
        }
    }
}

/// Filter and order raw ranking rows into the cohort.
pub fn select_cohort(rows: Vec<CohortEntry>) -> Vec<CohortEntry> {
    let mut candidates = COHORT_FILTERS
        .iter()
        .map(|filter| rows.iter().filter(|e| filter.keeps(e)).cloned().collect::<Vec<_>>())
        .find(|kept| !kept.is_empty())
        .unwrap_or_default();
    candidates.sort_by(cohort_order);
    candidates
}

/// Categorical picks shared by signature, consensus and player builds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildPicks {
    pub core_items: Vec<u32>,
    pub boots: u32,
    pub spells: Vec<u32>,
    pub primary_style: u32,
    pub keystone: u32,
    pub primary_runes: Vec<u32>,
    pub secondary_style: u32,
    pub secondary_runes: Vec<u32>,
    pub shards: Vec<u32>,
}

/// A cohort member's most representative recorded build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureBuild {
    pub picks: BuildPicks,
    pub games: i64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailFilter {
    /// Both a headline core item and a primary rune are recorded.
    Complete,
    Any,
}

pub const BUILD_DETAIL_FILTERS: [DetailFilter; 2] = [DetailFilter::Complete, DetailFilter::Any];

impl DetailFilter {
    fn keeps(self, detail: &BuildDetailDto) -> bool {
        match self {
            DetailFilter::Complete => detail.core_item > 0 && detail.rune_main > 0,
            DetailFilter::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreItemSource {
    ThreeItemBuilds,
    TwoItemBuilds,
    ScalarCoreItem,
}

/// Tried in order; a source is accepted once it yields `min_items` ids.
pub const CORE_ITEM_SOURCES: [CoreItemSource; 3] = [
    CoreItemSource::ThreeItemBuilds,
    CoreItemSource::TwoItemBuilds,
    CoreItemSource::ScalarCoreItem,
];

impl CoreItemSource {
    pub fn min_items(self) -> usize {
        match self {
            CoreItemSource::ThreeItemBuilds => 3,
            CoreItemSource::TwoItemBuilds | CoreItemSource::ScalarCoreItem => 1,
        }
    }

    pub fn extract(self, detail: &BuildDetailDto) -> Vec<u32> {
        match self {
            CoreItemSource::ThreeItemBuilds => best_combo(&detail.item_build_3),
            CoreItemSource::TwoItemBuilds => best_combo(&detail.item_build_2),
            CoreItemSource::ScalarCoreItem if detail.core_item > 0 => vec![detail.core_item],
            CoreItemSource::ScalarCoreItem => Vec::new(),
        }
    }
}

/// First element with the most games, then highest win rate.
fn most_played<T, F>(rows: &[T], key: F) -> Option<&T>
where
    F: Fn(&T) -> (i64, f64),
{
    let mut best: Option<(&T, (i64, f64))> = None;
    for row in rows {
        let k = key(row);
        let better = match &best {
            None => true,
            Some((_, b)) => k.0 > b.0 || (k.0 == b.0 && k.1 > b.1),
        };
        if better {
            best = Some((row, k));
        }
    }
    best.map(|(row, _)| row)
}

fn best_combo(combos: &[ItemComboDto]) -> Vec<u32> {
    most_played(combos, |c| (c.games, c.win_rate))
        .map(|c| c.items.clone())
        .unwrap_or_default()
}

pub fn core_items_for(detail: &BuildDetailDto) -> Vec<u32> {
    CORE_ITEM_SOURCES
        .iter()
        .map(|source| (source, source.extract(detail)))
        .find(|(source, items)| items.len() >= source.min_items())
        .map(|(_, items)| items)
        .unwrap_or_default()
}

/// Highest-confidence record among a member's recorded builds.
pub fn select_best_build_detail(
    player_key: &str,
    details: &[BuildDetailDto],
) -> Result<BuildDetailDto, AppError> {
    if details.is_empty() {
        return Err(AppError::EmptyBuild(player_key.to_string()));
    }
    let pool = BUILD_DETAIL_FILTERS
        .iter()
        .map(|filter| details.iter().filter(|d| filter.keeps(d)).cloned().collect::<Vec<_>>())
        .find(|kept| !kept.is_empty())
        .unwrap_or_default();
    most_played(&pool, |d| (d.games, d.win_rate))
        .cloned()
        .ok_or_else(|| AppError::EmptyBuild(player_key.to_string()))
}

impl From<&BuildDetailDto> for SignatureBuild {
    fn from(detail: &BuildDetailDto) -> Self {
        let rune_main = &detail.rune.rune_main;
        let rune_sub = &detail.rune.rune_sub;
        SignatureBuild {
            picks: BuildPicks {
                core_items: core_items_for(detail),
                boots: detail.boots.first().map(|b| b.boots).unwrap_or(0),
                spells: detail.spell.first().map(|s| s.spell.clone()).unwrap_or_default(),
                primary_style: rune_main.first().copied().unwrap_or(0),
                keystone: rune_main.get(1).copied().unwrap_or(0),
                primary_runes: rune_main.iter().skip(2).copied().collect(),
                secondary_style: rune_sub.first().copied().unwrap_or(0),
                secondary_runes: rune_sub.iter().skip(1).copied().collect(),
                shards: detail.rune.rune_stat.clone(),
            },
            games: detail.games,
            win_rate: detail.win_rate,
        }
    }
}

/// Cohort rows plus the builds resolved for them during the same window.
#[derive(Debug, Default)]
pub struct CohortSnapshot {
    pub entries: Vec<CohortEntry>,
    builds: MemoMap<String, SignatureBuild>,
}

impl CohortSnapshot {
    pub fn cached_builds(&self) -> usize {
        self.builds.len()
    }
}

pub struct CohortFetcher {
    fetcher: Arc<dyn JsonFetcher>,
    platform: String,
    cache: SnapshotCache<CohortSnapshot>,
}

impl CohortFetcher {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, platform: &str) -> Self {
        CohortFetcher {
            fetcher,
            platform: platform.to_string(),
            cache: SnapshotCache::new("cohort", config::cohort_ttl()),
        }
    }

    pub fn get_cohort(&self, limit: usize) -> Result<Vec<CohortEntry>, AppError> {
        self.get_cohort_at(Utc::now(), limit)
    }

    /// Ordered cohort, at most `min(limit, COHORT_LIMIT)` entries.
    pub fn get_cohort_at(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<CohortEntry>, AppError> {
        let snapshot = self.cache.get_or_refresh_at(
            now,
            |s: &CohortSnapshot| !s.entries.is_empty(),
            || self.fetch_cohort(),
        )?;
        Ok(snapshot
            .entries
            .iter()
            .take(limit.min(COHORT_LIMIT))
            .cloned()
            .collect())
    }

    pub fn snapshot(&self) -> Option<Arc<CohortSnapshot>> {
        self.cache.peek()
    }

    fn fetch_cohort(&self) -> Result<CohortSnapshot, AppError> {
        let url = endpoints::ranked_cohort(&self.platform, "All", KARMA_CHAMPION_ID, COHORT_REQUEST_SIZE);
        let payload: MasteryRankDto = fetch_as(self.fetcher.as_ref(), &url, "ranking_mastery_rank")?;

        let rows: Vec<CohortEntry> = payload.data_list.into_iter().map(CohortEntry::from).collect();
        let entries = select_cohort(rows);
        if entries.is_empty() {
            return Err(AppError::EmptyCohort);
        }
        info!(entries = entries.len(), platform = %self.platform, "cohort refreshed, build memo reset");
        Ok(CohortSnapshot {
            entries,
            builds: MemoMap::new(),
        })
    }

    /// Signature build for one cohort member, memoized for the current cohort window.
    pub fn get_signature_build(&self, player_key: &str) -> Result<Arc<SignatureBuild>, AppError> {
        let key = player_key.trim();
        if key.is_empty() {
            return Err(AppError::MissingPlayerKey);
        }

        let snapshot = self.cache.peek();
        if let Some(hit) = snapshot.as_ref().and_then(|s| s.builds.get(&key.to_string())) {
            debug!(player = key, "signature build memo hit");
            return Ok(hit);
        }

        let url = endpoints::signature_build(key, &self.platform);
        let payload: MasterBuildDto = fetch_as(self.fetcher.as_ref(), &url, "ranking_master_build")?;
        if payload.data.is_empty() {
            return Err(AppError::EmptyBuild(key.to_string()));
        }

        let details: Vec<BuildDetailDto> = payload
            .data
            .into_iter()
            .flat_map(|row| row.data_list)
            .flat_map(|build_row| build_row.build_detail)
            .collect();
        let best = select_best_build_detail(key, &details)?;
        let build = SignatureBuild::from(&best);

        Ok(match snapshot {
            Some(s) => s.builds.insert(key.to_string(), build),
            None => Arc::new(build),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::fake::FakeFetcher;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn entry(rank: i64, lp: i64, games: i64, lane: &str) -> CohortEntry {
        CohortEntry {
            player_key: format!("p-{}-{}-{}", rank, lp, games),
            display_name: "x#y".into(),
            rank,
            tier: "CHALLENGER".into(),
            league_points: lp,
            games,
            win_rate: 0.6,
            kda: 3.0,
            lane: lane.into(),
        }
    }

    fn detail(value: serde_json::Value) -> BuildDetailDto {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn lp_breaks_rank_ties() {
        let sorted = select_cohort(vec![entry(2, 50, 10, "Support"), entry(2, 80, 5, "Support")]);
        let lps: Vec<i64> = sorted.iter().map(|e| e.league_points).collect();
        assert_eq!(lps, vec![80, 50]);
    }

    #[test]
    fn games_break_rank_and_lp_ties() {
        let sorted = select_cohort(vec![
            entry(3, 10, 1, "Support"),
            entry(1, 10, 40, "Support"),
            entry(1, 10, 90, "Support"),
        ]);
        let games: Vec<i64> = sorted.iter().map(|e| e.games).collect();
        assert_eq!(games, vec![90, 40, 1]);
    }

    #[test]
    fn support_rows_preferred_over_others() {
        let sorted = select_cohort(vec![entry(1, 0, 0, "Mid"), entry(4, 0, 0, "support")]);
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].rank, 4);
    }

    #[test]
    fn no_support_rows_falls_back_to_everything() {
        let sorted = select_cohort(vec![entry(2, 0, 0, "Mid"), entry(1, 0, 0, "Top")]);
        assert_eq!(sorted.iter().map(|e| e.rank).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn complete_records_win_over_bigger_incomplete_ones() {
        let details = vec![
            detail(json!({"core_item": 0, "rune_main": 8214, "games": 500})),
            detail(json!({"core_item": 6617, "rune_main": 8214, "games": 40, "win_rate": 0.5})),
            detail(json!({"core_item": 3504, "rune_main": 8214, "games": 40, "win_rate": 0.7})),
        ];
        let best = select_best_build_detail("p", &details).unwrap();
        assert_eq!(best.core_item, 3504);
    }

    #[test]
    fn incomplete_records_used_when_nothing_is_complete() {
        let details = vec![
            detail(json!({"core_item": 0, "games": 3})),
            detail(json!({"rune_main": 0, "games": 9})),
        ];
        assert_eq!(select_best_build_detail("p", &details).unwrap().games, 9);
    }

    #[test]
    fn empty_detail_set_is_an_error() {
        assert!(matches!(
            select_best_build_detail("p", &[]),
            Err(AppError::EmptyBuild(key)) if key == "p"
        ));
    }

    #[test]
    fn core_items_prefer_full_three_item_builds() {
        let d = detail(json!({
            "core_item": 6617,
            "item_build_3": [
                {"items": [6617, 3504, 3107], "games": 12, "win_rate": 0.5},
                {"items": [6617, 3107, 3504], "games": 30, "win_rate": 0.4}
            ],
            "item_build_2": [{"items": [6617, 3504], "games": 80}]
        }));
        assert_eq!(core_items_for(&d), vec![6617, 3107, 3504]);
    }

    #[test]
    fn short_three_item_build_falls_back_to_two_items() {
        let d = detail(json!({
            "core_item": 6617,
            "item_build_3": [{"items": [6617, 0], "games": 12}],
            "item_build_2": [{"items": [3504, 3107], "games": 80}]
        }));
        assert_eq!(core_items_for(&d), vec![3504, 3107]);
    }

    #[test]
    fn scalar_core_item_is_the_last_resort() {
        let d = detail(json!({"core_item": "6617", "item_build_3": [], "item_build_2": "oops"}));
        assert_eq!(core_items_for(&d), vec![6617]);
        assert!(core_items_for(&detail(json!({}))).is_empty());
    }

    #[test]
    fn signature_build_splits_rune_pages() {
        let d = detail(json!({
            "boots": [{"boots": 3158}],
            "spell": [{"spell": [4, 14]}],
            "rune": {
                "rune_main": [8200, 8214, 8226, 8210, 8237],
                "rune_sub": [8300, 8304, 8345],
                "rune_stat": [5008, 5008, 5001]
            }
        }));
        let picks = SignatureBuild::from(&d).picks;
        assert_eq!(picks.primary_style, 8200);
        assert_eq!(picks.keystone, 8214);
        assert_eq!(picks.primary_runes, vec![8226, 8210, 8237]);
        assert_eq!(picks.secondary_style, 8300);
        assert_eq!(picks.secondary_runes, vec![8304, 8345]);
        assert_eq!(picks.shards, vec![5008, 5008, 5001]);
        assert_eq!(picks.boots, 3158);
        assert_eq!(picks.spells, vec![4, 14]);
    }

    fn ranking_payload() -> serde_json::Value {
        json!({"data_list": [
            {"puu_id": "a", "riot_id_name": "Alpha", "riot_id_tag_line": "KR1", "rank": 2, "lp": 900, "games": 120, "lane": "Support"},
            {"puu_id": "b", "rank": 1, "lp": 1200, "games": 300, "lane": "Support"},
            {"puu_id": "c", "rank": 1, "lp": 1500, "games": 30, "lane": "Middle"}
        ]})
    }

    fn build_payload(core: u32) -> serde_json::Value {
        json!({"data": [{"data_list": [{"build_detail": [
            {"core_item": core, "rune_main": 8214, "games": 20, "win_rate": 0.6}
        ]}]}]})
    }

    #[test]
    fn cohort_fetch_orders_and_names_entries() {
        let fetcher = FakeFetcher::new().route("mastery_rank", ranking_payload());
        let cohorts = CohortFetcher::new(Arc::new(fetcher), "KR");
        let cohort = cohorts.get_cohort(12).unwrap();
        assert_eq!(cohort.iter().map(|e| e.player_key.as_str()).collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(cohort[1].display_name, "Alpha#KR1");
        assert_eq!(cohort[0].display_name, "Unknown#?");
    }

    #[test]
    fn empty_ranking_payload_is_empty_cohort() {
        let fetcher = FakeFetcher::new().route("mastery_rank", json!({"data_list": []}));
        let cohorts = CohortFetcher::new(Arc::new(fetcher), "KR");
        assert!(matches!(cohorts.get_cohort(12), Err(AppError::EmptyCohort)));
    }

    #[test]
    fn builds_are_memoized_until_the_cohort_refreshes() {
        let fetcher = Arc::new(
            FakeFetcher::new()
                .route("mastery_rank", ranking_payload())
                .route("puu_id=a", build_payload(6617)),
        );
        let cohorts = CohortFetcher::new(fetcher.clone(), "KR");
        let now = Utc::now();

        cohorts.get_cohort_at(now, 12).unwrap();
        cohorts.get_signature_build("a").unwrap();
        let again = cohorts.get_signature_build("a").unwrap();
        assert_eq!(again.picks.core_items, vec![6617]);
        assert_eq!(fetcher.calls_matching("master_build"), 1);

        cohorts.get_cohort_at(now + Duration::minutes(6), 12).unwrap();
        assert_eq!(cohorts.snapshot().unwrap().cached_builds(), 0);
        cohorts.get_signature_build("a").unwrap();
        assert_eq!(fetcher.calls_matching("master_build"), 2);
    }

    #[test]
    fn build_payload_without_rows_is_empty_build() {
        let fetcher = FakeFetcher::new().route("master_build", json!({"data": []}));
        let cohorts = CohortFetcher::new(Arc::new(fetcher), "KR");
        assert!(matches!(cohorts.get_signature_build("z"), Err(AppError::EmptyBuild(_))));
        assert!(matches!(cohorts.get_signature_build("  "), Err(AppError::MissingPlayerKey)));
    }
}
