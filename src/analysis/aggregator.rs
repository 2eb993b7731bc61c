//! Per-match aggregation for the tracked player.
//!
//! One pass per match record: display-window rows and totals for any champion,
//! plus the champion profile (categorical tallies, continuous sums, and
//! timeline-derived early-game counts) for the tracked champion only.

use super::matchups::{MatchupRow, MatchupTracker};
use super::tally::{round_to, WeightedTally};
use crate::api::models::{FrameDto, MatchDto, ParticipantDto, TimelineDto};
use crate::benchmark::cohort::BuildPicks;
use crate::benchmark::reference::ReferenceCatalog;
use crate::config::{KARMA_CHAMPION_ID, KARMA_CHAMPION_NAME};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

pub const EARLY_GAME_MS: i64 = 14 * 60 * 1000;

/// Support quest items count as gold income, not as build choices.
pub const SUPPORT_QUEST_ITEMS: [u32; 14] = [
    3850, 3851, 3853, 3854, 3855, 3857, 3862, 3863, 3864, 3869, 3870, 3871, 3876, 3877,
];
pub const CONTROL_WARD_ID: u32 = 2055;
const YOUR_CORE_K: usize = 3;

pub fn kill_participation(kills: i64, assists: i64, team_kills: i64) -> f64 {
    if team_kills <= 0 {
        return 0.0;
    }
    round_to((kills + assists) as f64 * 100.0 / team_kills as f64, 1)
}

pub fn duration_minutes(game_duration_secs: i64) -> f64 {
    round_to(game_duration_secs as f64 / 60.0, 1).max(0.1)
}

pub fn is_support_position(position: &str) -> bool {
    matches!(position.to_uppercase().as_str(), "UTILITY" | "SUPPORT")
}

fn is_bot_position(position: &str) -> bool {
    matches!(position.to_uppercase().as_str(), "BOTTOM" | "BOT")
}

pub fn is_tracked_champion(participant: &ParticipantDto) -> bool {
    participant.champion_id == KARMA_CHAMPION_ID
        || participant.champion_name.to_lowercase() == KARMA_CHAMPION_NAME
}

/// Frame with the latest timestamp not after `target_ms`.
pub fn frame_at_or_before(frames: &[FrameDto], target_ms: i64) -> Option<&FrameDto> {
    let mut chosen: Option<&FrameDto> = None;
    for frame in frames.iter().filter(|f| f.timestamp <= target_ms) {
        if chosen.map_or(true, |c| frame.timestamp > c.timestamp) {
            chosen = Some(frame);
        }
    }
    chosen
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LaneDiff {
    pub gold: i64,
    pub xp: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EarlyGame {
    pub assists_14: i64,
    pub deaths_14: i64,
    pub first_death_min: Option<f64>,
    pub lane_diff: Option<LaneDiff>,
}

/// Early-game counts for `participant_id`. Kill events are de-duplicated by
/// (timestamp, victim, killer) across frames; the first qualifying death wins.
/// `lane_diff` is set only when the 14-minute frame has both participants.
pub fn early_game(timeline: &TimelineDto, participant_id: i64, opponent_id: Option<i64>) -> EarlyGame {
    let mut out = EarlyGame::default();
    if participant_id <= 0 {
        return out;
    }
    let frames = &timeline.info.frames;

    let mut seen = HashSet::new();
    let kills = frames
        .iter()
        .filter(|f| f.timestamp <= EARLY_GAME_MS)
        .flat_map(|f| f.events.iter())
        .filter(|e| e.kind == "CHAMPION_KILL");
    for event in kills {
        if !seen.insert((event.timestamp, event.victim_id, event.killer_id)) {
            continue;
        }
        if event.victim_id == participant_id {
            out.deaths_14 += 1;
            if out.first_death_min.is_none() {
                out.first_death_min = Some(round_to(event.timestamp as f64 / 60_000.0, 1));
            }
        }
        if event.assisting_participant_ids.contains(&participant_id) {
            out.assists_14 += 1;
        }
    }

    out.lane_diff = opponent_id.filter(|id| *id > 0).and_then(|opponent| {
        let frame = frame_at_or_before(frames, EARLY_GAME_MS)?;
        let mine = frame.participant_frames.get(&participant_id.to_string())?;
        let theirs = frame.participant_frames.get(&opponent.to_string())?;
        Some(LaneDiff {
            gold: mine.total_gold - theirs.total_gold,
            xp: mine.xp - theirs.xp,
        })
    });
    out
}

/// Sums and categorical tallies over the tracked champion's matches.
#[derive(Debug, Clone, Default)]
pub struct PlayerChampionProfile {
    pub games: usize,
    pub wins: usize,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub kp_sum: f64,
    pub vision_per_min_sum: f64,
    pub control_wards: i64,
    pub assists_14: i64,
    pub deaths_14: i64,
    pub first_death_min_sum: f64,
    pub first_death_samples: usize,
    pub gold_diff_14_sum: i64,
    pub xp_diff_14_sum: i64,
    pub lane_samples: usize,
    pub items: WeightedTally<u32>,
    pub keystones: WeightedTally<u32>,
    pub primary_styles: WeightedTally<u32>,
    pub secondary_styles: WeightedTally<u32>,
    pub secondary_runes: WeightedTally<u32>,
    pub spell_pairs: WeightedTally<(u32, u32)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionAverages {
    pub win_rate: f64,
    pub kda: f64,
    pub deaths_per_game: f64,
    pub kill_participation: f64,
    pub vision_per_min: f64,
    pub control_wards_per_game: f64,
    pub assists_before_14: f64,
    pub deaths_before_14: f64,
    pub first_death_min: f64,
    pub gold_diff_14: f64,
    pub xp_diff_14: f64,
}

fn per(total: f64, samples: usize, digits: i32) -> f64 {
    if samples == 0 {
        0.0
    } else {
        round_to(total / samples as f64, digits)
    }
}

impl PlayerChampionProfile {
    fn record_loadout(&mut self, participant: &ParticipantDto) {
        self.items
            .add_all(participant.items().into_iter().filter(|id| *id > 0), 1.0);

        let styles = &participant.perks.styles;
        if let Some(primary) = styles.first() {
            if primary.style > 0 {
                self.primary_styles.add(primary.style, 1.0);
            }
            if let Some(keystone) = primary.selections.first().filter(|s| s.perk > 0) {
                self.keystones.add(keystone.perk, 1.0);
            }
        }
        if let Some(secondary) = styles.get(1) {
            if secondary.style > 0 {
                self.secondary_styles.add(secondary.style, 1.0);
            }
            if let Some(rune) = secondary.selections.first().filter(|s| s.perk > 0) {
                self.secondary_runes.add(rune.perk, 1.0);
            }
        }

        if participant.summoner1_id > 0 && participant.summoner2_id > 0 {
            self.spell_pairs
                .add((participant.summoner1_id, participant.summoner2_id), 1.0);
        }
    }

    fn record_early_game(&mut self, early: &EarlyGame) {
        self.assists_14 += early.assists_14;
        self.deaths_14 += early.deaths_14;
        if let Some(minute) = early.first_death_min {
            self.first_death_min_sum += minute;
            self.first_death_samples += 1;
        }
        if let Some(diff) = early.lane_diff {
            self.gold_diff_14_sum += diff.gold;
            self.xp_diff_14_sum += diff.xp;
            self.lane_samples += 1;
        }
    }

    pub fn averages(&self) -> ChampionAverages {
        if self.games == 0 {
            return ChampionAverages::default();
        }
        let games = self.games;
        ChampionAverages {
            win_rate: per(self.wins as f64 * 100.0, games, 1),
            kda: round_to((self.kills + self.assists) as f64 / self.deaths.max(1) as f64, 2),
            deaths_per_game: per(self.deaths as f64, games, 2),
            kill_participation: per(self.kp_sum, games, 1),
            vision_per_min: per(self.vision_per_min_sum, games, 2),
            control_wards_per_game: per(self.control_wards as f64, games, 2),
            assists_before_14: per(self.assists_14 as f64, games, 2),
            deaths_before_14: per(self.deaths_14 as f64, games, 2),
            first_death_min: per(self.first_death_min_sum, self.first_death_samples, 2),
            gold_diff_14: per(self.gold_diff_14_sum as f64, self.lane_samples, 1),
            xp_diff_14: per(self.xp_diff_14_sum as f64, self.lane_samples, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreExclusion {
    /// Boots, trinkets, support quest items and control wards.
    BootsTrinketsAndFiller,
    BootsAndTrinkets,
}

/// Tried in order; the first exclusion that leaves any core item wins.
pub const CORE_EXCLUSIONS: [CoreExclusion; 2] =
    [CoreExclusion::BootsTrinketsAndFiller, CoreExclusion::BootsAndTrinkets];

impl CoreExclusion {
    fn excludes(self, id: u32, boots: &HashSet<u32>, trinkets: &HashSet<u32>) -> bool {
        let base = boots.contains(&id) || trinkets.contains(&id);
        match self {
            CoreExclusion::BootsTrinketsAndFiller => {
                base || SUPPORT_QUEST_ITEMS.contains(&id) || id == CONTROL_WARD_ID
            }
            CoreExclusion::BootsAndTrinkets => base,
        }
    }
}

pub fn core_items_from(
    items: &WeightedTally<u32>,
    boots: &HashSet<u32>,
    trinkets: &HashSet<u32>,
) -> Vec<u32> {
    CORE_EXCLUSIONS
        .iter()
        .map(|exclusion| items.top_k_where(YOUR_CORE_K, |id| !exclusion.excludes(*id, boots, trinkets)))
        .find(|core| !core.is_empty())
        .unwrap_or_default()
}

/// The player's modal build on the tracked champion, one vote per match.
pub fn derive_your_build(profile: &PlayerChampionProfile, catalog: &ReferenceCatalog) -> BuildPicks {
    let boots = catalog.boots_ids();
    let trinkets = catalog.trinket_ids();
    BuildPicks {
        core_items: core_items_from(&profile.items, &boots, &trinkets),
        boots: profile
            .items
            .top_k_where(1, |id| boots.contains(id))
            .first()
            .copied()
            .unwrap_or(0),
        spells: profile
            .spell_pairs
            .top()
            .map(|(first, second)| vec![first, second])
            .unwrap_or_default(),
        primary_style: profile.primary_styles.top().unwrap_or(0),
        keystone: profile.keystones.top().unwrap_or(0),
        primary_runes: Vec::new(),
        secondary_style: profile.secondary_styles.top().unwrap_or(0),
        secondary_runes: profile.secondary_runes.top().into_iter().collect(),
        shards: Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentMatch {
    pub match_id: String,
    pub champion_id: u32,
    pub champion: String,
    pub queue: Option<i64>,
    pub result: String,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub cs: i64,
    pub gold: i64,
    pub duration_min: f64,
    pub role: String,
    pub kill_participation: f64,
    pub vision_score: i64,
    pub control_wards: i64,
    pub wards_cleared: i64,
    pub ally_utility: i64,
    pub cc_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub match_id: String,
    pub result: String,
    pub timestamp: i64,
    pub deaths: i64,
    pub kill_participation: f64,
    pub vision_per_min: f64,
    pub control_wards: i64,
    pub assists_14: i64,
    pub deaths_14: i64,
    pub first_death_min: f64,
    pub gold_diff_14: i64,
    pub xp_diff_14: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub games: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_kda: f64,
    pub avg_cs: f64,
    pub avg_kills: f64,
    pub avg_deaths: f64,
    pub avg_assists: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportInsights {
    pub primary_role: String,
    pub support_games: usize,
    pub support_rate: f64,
    pub avg_vision_score: f64,
    pub avg_control_wards: f64,
    pub avg_wards_cleared: f64,
    pub avg_kill_participation: f64,
    pub avg_ally_utility: f64,
    pub avg_cc_score: f64,
}

#[derive(Debug, Default)]
struct DisplayTotals {
    wins: usize,
    kills: i64,
    deaths: i64,
    assists: i64,
    cs: i64,
    support_games: usize,
    vision: i64,
    control_wards: i64,
    wards_cleared: i64,
    kp: f64,
    ally_utility: i64,
    cc_score: i64,
}

#[derive(Debug)]
pub struct AggregateReport {
    pub recent_matches: Vec<RecentMatch>,
    pub aggregate: AggregateStats,
    pub support_insights: SupportInsights,
    pub profile: PlayerChampionProfile,
    pub matchups: Vec<MatchupRow>,
    pub trend: Vec<TrendPoint>,
    pub skipped: usize,
}

pub struct MatchAggregator {
    puuid: String,
    display_limit: usize,
    recent: Vec<RecentMatch>,
    totals: DisplayTotals,
    role_counts: Vec<(String, usize)>,
    profile: PlayerChampionProfile,
    matchups: MatchupTracker,
    trend: Vec<TrendPoint>,
    skipped: usize,
}

impl MatchAggregator {
    pub fn new(puuid: &str, display_limit: usize) -> Self {
        MatchAggregator {
            puuid: puuid.to_string(),
            display_limit,
            recent: Vec::new(),
            totals: DisplayTotals::default(),
            role_counts: Vec::new(),
            profile: PlayerChampionProfile::default(),
            matchups: MatchupTracker::new(),
            trend: Vec::new(),
            skipped: 0,
        }
    }

    /// Fold one match into the aggregates. `timeline` is only invoked for
    /// tracked-champion matches. Returns false when the match was skipped.
    pub fn ingest<T>(&mut self, match_id: &str, record: &MatchDto, timeline: T) -> bool
    where
        T: FnOnce() -> Option<TimelineDto>,
    {
        let Some(info) = record.info.as_ref() else {
            debug!(match_id, "match has no info, skipped");
            self.skipped += 1;
            return false;
        };
        let Some(me) = info.participants.iter().find(|p| p.puuid == self.puuid) else {
            debug!(match_id, "tracked player not in match, skipped");
            self.skipped += 1;
            return false;
        };

        let team_kills: i64 = info
            .participants
            .iter()
            .filter(|p| p.team_id == me.team_id)
            .map(|p| p.kills)
            .sum();
        let kp = kill_participation(me.kills, me.assists, team_kills);
        let minutes = duration_minutes(info.game_duration);
        let vision_per_min = me.vision_score as f64 / minutes;
        let control_wards = me.control_wards();
        let role = me.position();
        let result = if me.win { "Win" } else { "Loss" };
        let in_display = self.recent.len() < self.display_limit;

        if in_display {
            match self.role_counts.iter_mut().find(|(r, _)| *r == role) {
                Some((_, count)) => *count += 1,
                None => self.role_counts.push((role.clone(), 1)),
            }
        }

        if is_tracked_champion(me) {
            let profile = &mut self.profile;
            profile.games += 1;
            profile.wins += usize::from(me.win);
            profile.kills += me.kills;
            profile.deaths += me.deaths;
            profile.assists += me.assists;
            profile.kp_sum += kp;
            profile.vision_per_min_sum += vision_per_min;
            profile.control_wards += control_wards;
            profile.record_loadout(me);

            let enemies: Vec<&ParticipantDto> = info
                .participants
                .iter()
                .filter(|p| p.team_id != me.team_id)
                .collect();
            let enemy_support = enemies.iter().copied().find(|p| is_support_position(&p.position()));
            let enemy_bot = enemies.iter().copied().find(|p| is_bot_position(&p.position()));
            self.matchups.add_game(
                enemy_support.map_or("Unknown", |p| p.champion_name.as_str()),
                enemy_bot.map_or("Unknown", |p| p.champion_name.as_str()),
                me.win,
                kp,
                me.deaths,
                vision_per_min,
            );

            let early = timeline()
                .map(|t| early_game(&t, me.participant_id, enemy_support.map(|p| p.participant_id)))
                .unwrap_or_default();
            self.profile.record_early_game(&early);

            let lane = early.lane_diff.unwrap_or_default();
            self.trend.push(TrendPoint {
                match_id: match_id.to_string(),
                result: result.to_string(),
                timestamp: info.game_end_timestamp,
                deaths: me.deaths,
                kill_participation: kp,
                vision_per_min: round_to(vision_per_min, 2),
                control_wards,
                assists_14: early.assists_14,
                deaths_14: early.deaths_14,
                first_death_min: early.first_death_min.unwrap_or(0.0),
                gold_diff_14: lane.gold,
                xp_diff_14: lane.xp,
            });
        }

        if in_display {
            let cs = me.total_minions_killed + me.neutral_minions_killed;
            let ally_utility = me.total_heals_on_teammates + me.total_damage_shielded_on_teammates;
            let totals = &mut self.totals;
            totals.wins += usize::from(me.win);
            totals.kills += me.kills;
            totals.deaths += me.deaths;
            totals.assists += me.assists;
            totals.cs += cs;
            if is_support_position(&role) {
                totals.support_games += 1;
                totals.vision += me.vision_score;
                totals.control_wards += control_wards;
                totals.wards_cleared += me.wards_killed;
                totals.kp += kp;
                totals.ally_utility += ally_utility;
                totals.cc_score += me.time_ccing_others;
            }

            self.recent.push(RecentMatch {
                match_id: match_id.to_string(),
                champion_id: me.champion_id,
                champion: if me.champion_name.is_empty() {
                    "Unknown".to_string()
                } else {
                    me.champion_name.clone()
                },
                queue: info.queue_id,
                result: result.to_string(),
                kills: me.kills,
                deaths: me.deaths,
                assists: me.assists,
                cs,
                gold: me.gold_earned,
                duration_min: round_to(info.game_duration as f64 / 60.0, 1),
                role,
                kill_participation: kp,
                vision_score: me.vision_score,
                control_wards,
                wards_cleared: me.wards_killed,
                ally_utility,
                cc_score: me.time_ccing_others,
            });
        }
        true
    }

    pub fn profile(&self) -> &PlayerChampionProfile {
        &self.profile
    }

    pub fn finish(self) -> AggregateReport {
        let games = self.recent.len();
        let t = &self.totals;

        let aggregate = AggregateStats {
            games,
            wins: t.wins,
            losses: games.saturating_sub(t.wins),
            win_rate: per(t.wins as f64 * 100.0, games, 1),
            avg_kda: if games == 0 {
                0.0
            } else {
                round_to((t.kills + t.assists) as f64 / t.deaths.max(1) as f64, 2)
            },
            avg_cs: per(t.cs as f64, games, 1),
            avg_kills: per(t.kills as f64, games, 1),
            avg_deaths: per(t.deaths as f64, games, 1),
            avg_assists: per(t.assists as f64, games, 1),
        };

        let mut primary_role: Option<&(String, usize)> = None;
        for entry in &self.role_counts {
            if primary_role.map_or(true, |best| entry.1 > best.1) {
                primary_role = Some(entry);
            }
        }
        let support = t.support_games;
        let support_insights = SupportInsights {
            primary_role: primary_role.map_or_else(|| "UNKNOWN".to_string(), |(r, _)| r.clone()),
            support_games: support,
            support_rate: per(support as f64 * 100.0, games, 1),
            avg_vision_score: per(t.vision as f64, support, 1),
            avg_control_wards: per(t.control_wards as f64, support, 1),
            avg_wards_cleared: per(t.wards_cleared as f64, support, 1),
            avg_kill_participation: per(t.kp, support, 1),
            avg_ally_utility: per(t.ally_utility as f64, support, 0),
            avg_cc_score: per(t.cc_score as f64, support, 1),
        };

        AggregateReport {
            matchups: self.matchups.breakdown(),
            recent_matches: self.recent,
            aggregate,
            support_insights,
            profile: self.profile,
            trend: self.trend,
            skipped: self.skipped,
        }
    }
}
