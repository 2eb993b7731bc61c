use crate::analysis::aggregator::RecentMatch;
use crate::analysis::matchups::MatchupRow;
use crate::benchmark::reference::CatalogEntry;
use crate::error::Diagnostic;
use crate::summary::{Benchmark, BenchmarkOutcome, BuildView, KarmaInsights, PlayerSummary};
use crate::summary::FetchProgress;
use colored::*;
use indicatif::ProgressBar;
use tabled::{settings::Style, Table, Tabled};

impl FetchProgress for ProgressBar {
    fn start(&self, total: usize) {
        self.set_length(total as u64);
        self.set_message("Fetching match details");
    }

    fn advance(&self, match_id: &str) {
        self.set_message(match_id.to_string());
        self.inc(1);
    }

    fn finish(&self) {
        self.finish_with_message("✓ Match data fetched");
    }
}

#[derive(Tabled)]
struct MatchRow {
    #[tabled(rename = "#")]
    number: String,
    champion: String,
    result: String,
    kda: String,
    cs: String,
    role: String,
    #[tabled(rename = "KP")]
    kill_participation: String,
    vision: String,
}

#[derive(Tabled)]
struct MetricRow {
    metric: String,
    you: String,
    target: String,
    delta: String,
}

#[derive(Tabled)]
struct BuildRow {
    slot: String,
    you: String,
    cohort: String,
}

#[derive(Tabled)]
struct MatchupTableRow {
    #[tabled(rename = "enemy support")]
    enemy_support: String,
    #[tabled(rename = "enemy bot")]
    enemy_bot: String,
    games: String,
    win_rate: String,
    #[tabled(rename = "KP")]
    kill_participation: String,
    deaths: String,
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

fn section(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());
}

fn names(entries: &[CatalogEntry]) -> String {
    if entries.is_empty() {
        return "-".to_string();
    }
    entries
        .iter()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn name(entry: &Option<CatalogEntry>) -> String {
    entry.as_ref().map_or_else(|| "-".to_string(), |e| e.name.clone())
}

pub fn display_player_summary(summary: &PlayerSummary) {
    let player = &summary.player;
    println!(
        "\n{} {}#{} (level {})",
        "🎮".cyan(),
        player.game_name.as_deref().unwrap_or("Unknown").bold(),
        player.tag_line.as_deref().unwrap_or("?"),
        player.summoner_level.unwrap_or(0)
    );

    display_recent_matches(&summary.recent_matches);

    let support = &summary.support_insights;
    section("🛡️ SUPPORT INSIGHTS");
    println!(
        "Primary role: {}  |  Support games: {} ({:.1}%)",
        support.primary_role.bold(),
        support.support_games,
        support.support_rate
    );
    println!(
        "Vision {:.1}  •  Control wards {:.1}  •  Wards cleared {:.1}  •  KP {:.1}%  •  Ally utility {:.0}",
        support.avg_vision_score,
        support.avg_control_wards,
        support.avg_wards_cleared,
        support.avg_kill_participation,
        support.avg_ally_utility
    );

    display_karma_insights(&summary.karma_insights);

    match &summary.benchmark {
        BenchmarkOutcome::Ready(benchmark) => display_benchmark(benchmark),
        BenchmarkOutcome::Failed(failure) => {
            section("🏆 COHORT BENCHMARK");
            println!("{} {}", failure.error.yellow(), failure.detail);
        }
    }

    if let Some(diagnostics) = &summary.diagnostics {
        display_diagnostics(diagnostics);
    }
    println!();
}

fn display_recent_matches(matches: &[RecentMatch]) {
    section(&format!("📊 MATCH HISTORY (Last {} Games)", matches.len()));
    if matches.is_empty() {
        println!("{}", "No matches available".yellow());
        return;
    }

    let rows: Vec<MatchRow> = matches
        .iter()
        .enumerate()
        .map(|(idx, m)| MatchRow {
            number: format!("{}", idx + 1),
            champion: m.champion.clone(),
            result: if m.result == "Win" {
                "WIN".green().to_string()
            } else {
                "LOSS".red().to_string()
            },
            kda: format!("{}/{}/{}", m.kills, m.deaths, m.assists),
            cs: m.cs.to_string(),
            role: m.role.clone(),
            kill_participation: format!("{:.1}%", m.kill_participation),
            vision: m.vision_score.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

fn display_karma_insights(insights: &KarmaInsights) {
    section("🔮 KARMA INSIGHTS");
    if insights.analyzed_karma_games == 0 {
        println!(
            "{}",
            format!("No Karma games in the last {} matches", insights.sample_matches).yellow()
        );
        return;
    }

    let your = &insights.your;
    let targets = &insights.target_bands;
    let deltas = &insights.delta_vs_targets;
    println!(
        "{} Karma games: {}  |  Win rate {:.1}%  |  KDA {:.2}\n",
        "📈".bold(),
        insights.analyzed_karma_games,
        your.win_rate,
        your.kda
    );

    let row = |metric: &str, you: f64, target: f64, delta: f64| MetricRow {
        metric: metric.to_string(),
        you: format!("{:.2}", you),
        target: format!("{:.2}", target),
        delta: format!("{:+.2}", delta),
    };
    let rows = vec![
        row("Kill participation %", your.kill_participation, targets.kill_participation, deltas.kill_participation),
        row("Deaths per game", your.deaths_per_game, targets.deaths, deltas.deaths_per_game),
        row("Vision per minute", your.vision_per_min, targets.vision_per_min, deltas.vision_per_min),
        row("Control wards", your.control_wards_per_game, targets.control_wards, deltas.control_wards_per_game),
        row("Assists before 14", your.assists_before_14, targets.assists_before_14, deltas.assists_before_14),
        row("Deaths before 14", your.deaths_before_14, targets.deaths_before_14, deltas.deaths_before_14),
        row("First death (min)", your.first_death_min, targets.first_death_min, deltas.first_death_min),
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    let lane = &insights.lane_phase;
    if lane.samples > 0 {
        println!(
            "\nLane phase @14 ({} games): gold {:+.1}  •  xp {:+.1}",
            lane.samples, lane.avg_gold_diff_14, lane.avg_xp_diff_14
        );
    }

    display_matchups(&insights.matchups);

    let score = &insights.improvement_score;
    let grade = match score.grade {
        "A" => score.grade.green(),
        "B" => score.grade.cyan(),
        "C" => score.grade.yellow(),
        _ => score.grade.red(),
    };
    println!("\n{} {}/100 (grade {})", "Improvement score:".bold(), score.score, grade.bold());
    for focus in &score.focus_targets {
        println!("  • {}", focus);
    }
}

fn display_matchups(matchups: &[MatchupRow]) {
    if matchups.is_empty() {
        return;
    }
    println!("\n{}", "Bot lane matchups".bold().yellow());
    let rows: Vec<MatchupTableRow> = matchups
        .iter()
        .map(|m| MatchupTableRow {
            enemy_support: m.enemy_support.clone(),
            enemy_bot: m.enemy_bot.clone(),
            games: m.games.to_string(),
            win_rate: format!("{:.1}%", m.win_rate),
            kill_participation: format!("{:.1}%", m.avg_kill_participation),
            deaths: format!("{:.2}", m.avg_deaths),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

fn build_rows(yours: &BuildView, cohort: &BuildView) -> Vec<BuildRow> {
    let row = |slot: &str, you: String, theirs: String| BuildRow {
        slot: slot.to_string(),
        you,
        cohort: theirs,
    };
    vec![
        row("Core items", names(&yours.core_items), names(&cohort.core_items)),
        row("Boots", name(&yours.boots), name(&cohort.boots)),
        row("Spells", names(&yours.summoner_spells), names(&cohort.summoner_spells)),
        row("Keystone", name(&yours.runes.keystone), name(&cohort.runes.keystone)),
        row("Primary tree", name(&yours.runes.primary_style), name(&cohort.runes.primary_style)),
        row("Secondary tree", name(&yours.runes.secondary_style), name(&cohort.runes.secondary_style)),
    ]
}

fn display_benchmark(benchmark: &Benchmark) {
    section(&format!("🏆 {} COHORT BENCHMARK ({})", benchmark.region, benchmark.source));

    let averages = &benchmark.consensus.averages;
    println!(
        "Top {} consensus: win rate {:.1}%  •  KDA {:.2}  •  LP {:.0}  •  games {:.1}",
        benchmark.consensus.members.len(),
        averages.win_rate,
        averages.kda,
        averages.lp,
        averages.games
    );
    let featured = &benchmark.featured;
    println!(
        "Featured: {} (#{} {} {} LP, {:.1}% over {} games)\n",
        featured.profile.riot_id.bold(),
        featured.profile.rank,
        featured.profile.tier,
        featured.profile.lp,
        featured.profile.win_rate,
        featured.profile.games
    );

    let mut table = Table::new(build_rows(&benchmark.you.build, &benchmark.consensus.build));
    table.with(Style::rounded());
    println!("{}", table);

    println!("\n{}", "Advice".bold().yellow());
    for line in &benchmark.comparison.advice {
        println!("  • {}", line);
    }
}

fn display_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("\n{}", "Diagnostics".bold().red());
    for d in diagnostics {
        println!("  {} [{}] {}", d.endpoint, d.status, d.detail);
    }
}
