use super::tally::round_to;
use serde::Serialize;
use std::collections::HashMap;

const MATCHUP_ROWS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct MatchupStats {
    pub enemy_support: String,
    pub enemy_bot: String,
    pub games: usize,
    pub wins: usize,
    pub kp_sum: f64,
    pub deaths_sum: i64,
    pub vision_per_min_sum: f64,
}

impl MatchupStats {
    pub fn new(enemy_support: String, enemy_bot: String) -> Self {
        MatchupStats {
            enemy_support,
            enemy_bot,
            ..Default::default()
        }
    }

    fn per_game(&self, total: f64) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            total / self.games as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupRow {
    pub enemy_support: String,
    pub enemy_bot: String,
    pub games: usize,
    pub win_rate: f64,
    pub avg_kill_participation: f64,
    pub avg_deaths: f64,
    pub avg_vision_per_min: f64,
}

/// Results against each enemy bot lane pairing.
#[derive(Debug, Default)]
pub struct MatchupTracker {
    stats: HashMap<(String, String), MatchupStats>,
}

impl MatchupTracker {
    pub fn new() -> Self {
        MatchupTracker::default()
    }

    pub fn add_game(
        &mut self,
        enemy_support: &str,
        enemy_bot: &str,
        won: bool,
        kill_participation: f64,
        deaths: i64,
        vision_per_min: f64,
    ) {
        let key = (enemy_support.to_string(), enemy_bot.to_string());
        let entry = self
            .stats
            .entry(key)
            .or_insert_with(|| MatchupStats::new(enemy_support.to_string(), enemy_bot.to_string()));

        entry.games += 1;
        if won {
            entry.wins += 1;
        }
        entry.kp_sum += kill_participation;
        entry.deaths_sum += deaths;
        entry.vision_per_min_sum += vision_per_min;
    }

    /// Most-played pairings first, ties by enemy names.
    pub fn breakdown(&self) -> Vec<MatchupRow> {
        let mut rows: Vec<&MatchupStats> = self.stats.values().collect();
        rows.sort_by(|a, b| {
            b.games
                .cmp(&a.games)
                .then_with(|| a.enemy_support.cmp(&b.enemy_support))
                .then_with(|| a.enemy_bot.cmp(&b.enemy_bot))
        });
        rows.into_iter()
            .take(MATCHUP_ROWS)
            .map(|s| MatchupRow {
                enemy_support: s.enemy_support.clone(),
                enemy_bot: s.enemy_bot.clone(),
                games: s.games,
                win_rate: round_to(s.per_game(s.wins as f64 * 100.0), 1),
                avg_kill_participation: round_to(s.per_game(s.kp_sum), 1),
                avg_deaths: round_to(s.per_game(s.deaths_sum as f64), 2),
                avg_vision_per_min: round_to(s.per_game(s.vision_per_min_sum), 2),
            })
            .collect()
    }
}
