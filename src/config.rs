use crate::error::AppError;
use chrono::Duration;
use serde::Serialize;
use std::env;

pub const KARMA_CHAMPION_ID: u32 = 43;
pub const KARMA_CHAMPION_NAME: &str = "karma";

/// Match ids requested per summary; champion statistics are drawn from this window.
pub const SAMPLE_MATCH_COUNT: usize = 30;
pub const DISPLAY_MATCH_COUNT: usize = 5;

pub const COHORT_REQUEST_SIZE: usize = 30;
pub const COHORT_LIMIT: usize = 12;
pub const CONSENSUS_SLICE: usize = 5;

pub fn static_ttl() -> Duration {
    Duration::hours(6)
}

pub fn cohort_ttl() -> Duration {
    Duration::minutes(5)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub platform: String,
    pub benchmark_platform: String,
    pub scoring: ScoringProfile,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("RIOT_API_KEY")
            .map(|key| key.trim().to_string())
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::ConfigError("RIOT_API_KEY not found in .env file".to_string()))?;

        let platform = env::var("RIOT_PLATFORM")
            .unwrap_or_else(|_| "euw1".to_string())
            .to_lowercase();
        let benchmark_platform =
            env::var("BENCHMARK_PLATFORM").unwrap_or_else(|_| "KR".to_string());

        Ok(Config {
            api_key,
            platform,
            benchmark_platform,
            scoring: ScoringProfile::default(),
        })
    }
}

/// Per-game levels a high-elo support is expected to reach.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetBands {
    pub kill_participation: f64,
    pub deaths: f64,
    pub vision_per_min: f64,
    pub control_wards: f64,
    pub assists_before_14: f64,
    pub deaths_before_14: f64,
    pub first_death_min: f64,
}

impl Default for TargetBands {
    fn default() -> Self {
        TargetBands {
            kill_participation: 65.0,
            deaths: 4.5,
            vision_per_min: 1.8,
            control_wards: 2.2,
            assists_before_14: 6.0,
            deaths_before_14: 1.0,
            first_death_min: 9.0,
        }
    }
}

/// Weight of each deficit term in the improvement score. The six weights sum to 100.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreWeights {
    pub kill_participation: f64,
    pub deaths: f64,
    pub vision_per_min: f64,
    pub control_wards: f64,
    pub assists_before_14: f64,
    pub deaths_before_14: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            kill_participation: 20.0,
            deaths: 25.0,
            vision_per_min: 20.0,
            control_wards: 15.0,
            assists_before_14: 10.0,
            deaths_before_14: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringProfile {
    pub targets: TargetBands,
    pub weights: ScoreWeights,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one_hundred() {
        let w = ScoreWeights::default();
        let total = w.kill_participation
            + w.deaths
            + w.vision_per_min
            + w.control_wards
            + w.assists_before_14
            + w.deaths_before_14;
        assert_eq!(total, 100.0);
    }
}
