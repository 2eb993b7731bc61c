use super::cohort::{BuildPicks, CohortEntry, SignatureBuild};
use crate::analysis::tally::{mean, round_to, weighted_average, WeightedTally};
use crate::config::CONSENSUS_SLICE;
use crate::error::AppError;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

const CORE_ITEMS_K: usize = 3;
const BOOTS_K: usize = 1;
const SPELLS_K: usize = 2;
const PRIMARY_RUNES_K: usize = 3;
const SECONDARY_RUNES_K: usize = 2;
const SHARDS_K: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortProfile {
    pub riot_id: String,
    pub rank: i64,
    pub tier: String,
    pub lp: i64,
    pub games: i64,
    pub win_rate: f64,
    pub kda: f64,
}

impl From<&CohortEntry> for CohortProfile {
    fn from(entry: &CohortEntry) -> Self {
        CohortProfile {
            riot_id: entry.display_name.clone(),
            rank: entry.rank,
            tier: entry.tier.clone(),
            lp: entry.league_points,
            games: entry.games,
            win_rate: round_to(entry.win_rate * 100.0, 1),
            kda: round_to(entry.kda, 2),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortAverages {
    /// Games-weighted, in percent.
    pub win_rate: f64,
    /// Games-weighted.
    pub kda: f64,
    pub lp: f64,
    pub games: f64,
}

/// A cohort member left out of the vote, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedMember {
    pub riot_id: String,
    pub status: u16,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsensusBuild {
    pub picks: BuildPicks,
    pub averages: CohortAverages,
    pub profiles: Vec<CohortProfile>,
    pub voters: usize,
    pub excluded: Vec<ExcludedMember>,
}

/// Per-field weighted tallies for one vote.
#[derive(Debug, Default)]
struct BuildVote {
    core_items: WeightedTally<u32>,
    boots: WeightedTally<u32>,
    spells: WeightedTally<u32>,
    primary_styles: WeightedTally<u32>,
    keystones: WeightedTally<u32>,
    primary_runes: WeightedTally<u32>,
    secondary_styles: WeightedTally<u32>,
    secondary_runes: WeightedTally<u32>,
    shards: WeightedTally<u32>,
}

impl BuildVote {
    fn cast(&mut self, picks: &BuildPicks, weight: f64) {
        self.core_items.add_all(picks.core_items.iter().copied().filter(|id| *id > 0), weight);
        self.spells.add_all(picks.spells.iter().copied().filter(|id| *id > 0), weight);
        self.primary_runes.add_all(picks.primary_runes.iter().copied().filter(|id| *id > 0), weight);
        self.secondary_runes
            .add_all(picks.secondary_runes.iter().copied().filter(|id| *id > 0), weight);
        self.shards.add_all(picks.shards.iter().copied().filter(|id| *id > 0), weight);

        for (tally, id) in [
            (&mut self.boots, picks.boots),
            (&mut self.primary_styles, picks.primary_style),
            (&mut self.keystones, picks.keystone),
            (&mut self.secondary_styles, picks.secondary_style),
        ] {
            if id > 0 {
                tally.add(id, weight);
            }
        }
    }

    fn resolve(&self) -> BuildPicks {
        BuildPicks {
            core_items: self.core_items.top_k(CORE_ITEMS_K),
            boots: self.boots.top_k(BOOTS_K).first().copied().unwrap_or(0),
            spells: self.spells.top_k(SPELLS_K),
            primary_style: self.primary_styles.top().unwrap_or(0),
            keystone: self.keystones.top().unwrap_or(0),
            primary_runes: self.primary_runes.top_k(PRIMARY_RUNES_K),
            secondary_style: self.secondary_styles.top().unwrap_or(0),
            secondary_runes: self.secondary_runes.top_k(SECONDARY_RUNES_K),
            shards: self.shards.top_k(SHARDS_K),
        }
    }
}

/// Weighted vote over the top cohort slice. `build_of` resolves each member's
/// signature build; a member whose lookup fails is excluded, never fatal.
pub fn build_consensus<F>(cohort: &[CohortEntry], build_of: F) -> ConsensusBuild
where
    F: Fn(&str) -> Result<Arc<SignatureBuild>, AppError>,
{
    let slice = &cohort[..cohort.len().min(CONSENSUS_SLICE)];

    let mut vote = BuildVote::default();
    let mut win_rates = Vec::with_capacity(slice.len());
    let mut kdas = Vec::with_capacity(slice.len());
    let mut lps = Vec::with_capacity(slice.len());
    let mut games = Vec::with_capacity(slice.len());
    let mut voters = 0;
    let mut excluded = Vec::new();

    for entry in slice {
        let weight = entry.games.max(1) as f64;
        win_rates.push((entry.win_rate * 100.0, weight));
        kdas.push((entry.kda, weight));
        lps.push(entry.league_points as f64);
        games.push(entry.games as f64);

        match build_of(&entry.player_key) {
            Ok(build) => {
                vote.cast(&build.picks, weight);
                voters += 1;
            }
            Err(err) => {
                warn!(member = %entry.display_name, error = %err, "cohort member excluded from vote");
                excluded.push(ExcludedMember {
                    riot_id: entry.display_name.clone(),
                    status: err.status(),
                    reason: err.to_string(),
                });
            }
        }
    }

    ConsensusBuild {
        picks: vote.resolve(),
        averages: CohortAverages {
            win_rate: round_to(weighted_average(&win_rates), 1),
            kda: round_to(weighted_average(&kdas), 2),
            lp: round_to(mean(&lps), 0),
            games: round_to(mean(&games), 1),
        },
        profiles: slice.iter().map(CohortProfile::from).collect(),
        voters,
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn member(key: &str, games: i64, win_rate: f64) -> CohortEntry {
        CohortEntry {
            player_key: key.into(),
            display_name: format!("{}#KR1", key),
            rank: 1,
            tier: "CHALLENGER".into(),
            league_points: 1000,
            games,
            win_rate,
            kda: 4.0,
            lane: "Support".into(),
        }
    }

    fn build(core: &[u32], keystone: u32) -> Arc<SignatureBuild> {
        Arc::new(SignatureBuild {
            picks: BuildPicks {
                core_items: core.to_vec(),
                boots: 3158,
                spells: vec![4, 14],
                primary_style: 8200,
                keystone,
                primary_runes: vec![8226, 8210, 8237],
                secondary_style: 8300,
                secondary_runes: vec![8304, 8345],
                shards: vec![5008, 5008, 5001],
            },
            games: 10,
            win_rate: 0.5,
        })
    }

    #[test]
    fn heavy_members_outvote_light_ones() {
        let cohort = vec![member("a", 200, 0.6), member("b", 10, 0.5), member("c", 10, 0.5)];
        let builds = HashMap::from([
            ("a", build(&[6617, 3504, 3107], 8214)),
            ("b", build(&[6621, 3504, 3011], 8229)),
            ("c", build(&[6621, 3504, 3011], 8229)),
        ]);
        let consensus = build_consensus(&cohort, |key| Ok(builds[key].clone()));

        assert_eq!(consensus.picks.keystone, 8214);
        assert_eq!(consensus.picks.core_items, vec![3504, 3107, 6617]);
        assert_eq!(consensus.voters, 3);
    }

    #[test]
    fn zero_games_still_count_with_unit_weight() {
        let cohort = vec![member("a", 0, 0.0), member("b", 0, 0.0)];
        let consensus = build_consensus(&cohort, |key| {
            Ok(if key == "a" { build(&[3107], 8229) } else { build(&[3011], 8214) })
        });
        // equal weight: lower id wins
        assert_eq!(consensus.picks.keystone, 8214);
        assert_eq!(consensus.picks.core_items, vec![3011, 3107]);
    }

    #[test]
    fn failed_member_is_excluded_but_recorded() {
        let cohort = vec![member("a", 100, 0.6), member("b", 300, 0.4)];
        let consensus = build_consensus(&cohort, |key| {
            if key == "a" {
                Ok(build(&[6617], 8214))
            } else {
                Err(AppError::EmptyBuild(key.to_string()))
            }
        });
        assert_eq!(consensus.voters, 1);
        assert_eq!(consensus.picks.core_items, vec![6617]);
        assert_eq!(consensus.excluded.len(), 1);
        assert_eq!(consensus.excluded[0].riot_id, "b#KR1");
        // averages still cover every member of the slice
        assert_eq!(consensus.averages.win_rate, 45.0);
        assert_eq!(consensus.profiles.len(), 2);
    }

    #[test]
    fn only_the_top_five_vote() {
        let cohort: Vec<CohortEntry> = (0..8).map(|i| member(&format!("m{}", i), 10, 0.5)).collect();
        let consensus = build_consensus(&cohort, |key| {
            Ok(if key == "m6" || key == "m7" { build(&[1], 1) } else { build(&[3107], 8214) })
        });
        assert_eq!(consensus.profiles.len(), 5);
        assert_eq!(consensus.picks.core_items, vec![3107]);
    }

    #[test]
    fn picks_are_truncated_per_field() {
        let cohort = vec![member("a", 5, 0.5)];
        let consensus = build_consensus(&cohort, |_| Ok(build(&[1, 2, 3, 4], 8214)));
        let picks = consensus.picks;
        assert_eq!(picks.core_items, vec![1, 2, 3]);
        assert_eq!(picks.spells, vec![4, 14]);
        assert_eq!(picks.secondary_runes, vec![8304, 8345]);
        assert_eq!(picks.shards, vec![5008, 5001]);
        assert_eq!(picks.boots, 3158);
    }

    #[test]
    fn empty_cohort_yields_empty_consensus() {
        let consensus = build_consensus(&[], |_| Err(AppError::EmptyCohort));
        assert_eq!(consensus, ConsensusBuild::default());
    }
}
