//! Improvement score against the configured target bands.

use super::aggregator::ChampionAverages;
use super::tally::round_to;
use crate::benchmark::consensus::CohortAverages;
use crate::config::{ScoringProfile, TargetBands};
use serde::Serialize;

/// Per-term deficits are capped before weighting.
pub const DEFICIT_CAP: f64 = 1.5;
const FOCUS_TARGETS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Below target is a gap.
    Shortfall,
    /// Above target is a gap.
    Excess,
}

/// Direction-adjusted gap divided by the target, never negative.
pub fn normalized_gap(direction: Direction, actual: f64, target: f64) -> f64 {
    let raw = match direction {
        Direction::Shortfall => target - actual,
        Direction::Excess => actual - target,
    };
    (raw / target.max(1.0)).max(0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeficitTerm {
    pub label: &'static str,
    pub deficit: f64,
    pub weight: f64,
}

pub fn deficit_terms(your: &ChampionAverages, profile: &ScoringProfile) -> Vec<DeficitTerm> {
    let t = &profile.targets;
    let w = &profile.weights;
    let term = |label, direction, actual, target, weight| DeficitTerm {
        label,
        deficit: normalized_gap(direction, actual, target),
        weight,
    };
    vec![
        term("Kill Participation", Direction::Shortfall, your.kill_participation, t.kill_participation, w.kill_participation),
        term("Deaths per game", Direction::Excess, your.deaths_per_game, t.deaths, w.deaths),
        term("Vision per minute", Direction::Shortfall, your.vision_per_min, t.vision_per_min, w.vision_per_min),
        term("Control wards per game", Direction::Shortfall, your.control_wards_per_game, t.control_wards, w.control_wards),
        term("Assists before 14", Direction::Shortfall, your.assists_before_14, t.assists_before_14, w.assists_before_14),
        term("Deaths before 14", Direction::Excess, your.deaths_before_14, t.deaths_before_14, w.deaths_before_14),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementScore {
    pub score: u32,
    pub grade: &'static str,
    pub focus_targets: Vec<String>,
}

pub fn grade_for(score: u32) -> &'static str {
    if score >= 85 {
        "A"
    } else if score >= 70 {
        "B"
    } else if score >= 55 {
        "C"
    } else {
        "D"
    }
}

pub fn improvement_score(terms: &[DeficitTerm]) -> ImprovementScore {
    let penalty: f64 = terms
        .iter()
        .map(|t| t.deficit.min(DEFICIT_CAP) * t.weight)
        .sum();
    let score = (100.0 - penalty).round().clamp(0.0, 100.0) as u32;

    let mut ranked: Vec<&DeficitTerm> = terms.iter().filter(|t| t.deficit > 0.0).collect();
    // stable, so equal gaps keep term order
    ranked.sort_by(|a, b| b.deficit.total_cmp(&a.deficit));
    let focus_targets = ranked
        .into_iter()
        .take(FOCUS_TARGETS)
        .map(|t| format!("Improve {}: current gap {:.1}% vs target.", t.label, t.deficit * 100.0))
        .collect();

    ImprovementScore {
        score,
        grade: grade_for(score),
        focus_targets,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDeltas {
    pub kill_participation: f64,
    pub deaths_per_game: f64,
    pub vision_per_min: f64,
    pub control_wards_per_game: f64,
    pub assists_before_14: f64,
    pub deaths_before_14: f64,
    pub first_death_min: f64,
}

impl TargetDeltas {
    pub fn between(your: &ChampionAverages, targets: &TargetBands) -> Self {
        TargetDeltas {
            kill_participation: round_to(your.kill_participation - targets.kill_participation, 1),
            deaths_per_game: round_to(your.deaths_per_game - targets.deaths, 2),
            vision_per_min: round_to(your.vision_per_min - targets.vision_per_min, 2),
            control_wards_per_game: round_to(your.control_wards_per_game - targets.control_wards, 2),
            assists_before_14: round_to(your.assists_before_14 - targets.assists_before_14, 2),
            deaths_before_14: round_to(your.deaths_before_14 - targets.deaths_before_14, 2),
            first_death_min: round_to(your.first_death_min - targets.first_death_min, 2),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortDeltas {
    pub win_rate: f64,
    pub kda: f64,
}

impl CohortDeltas {
    /// Against missing averages (benchmark failed) the cohort side counts as 0.
    pub fn between(your: &ChampionAverages, cohort: Option<&CohortAverages>) -> Self {
        let (win_rate, kda) = cohort.map_or((0.0, 0.0), |c| (c.win_rate, c.kda));
        CohortDeltas {
            win_rate: round_to(your.win_rate - win_rate, 1),
            kda: round_to(your.kda - kda, 2),
        }
    }
}
