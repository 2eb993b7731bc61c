use crate::benchmark::cohort::BuildPicks;
use crate::benchmark::reference::{CatalogEntry, ReferenceCatalog};
use serde::Serialize;

/// Set differences over core item ids, each list in its source's order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreDiff {
    pub shared: Vec<u32>,
    pub missing: Vec<u32>,
    pub extra: Vec<u32>,
}

pub fn diff_core(yours: &[u32], consensus: &[u32]) -> CoreDiff {
    CoreDiff {
        shared: yours.iter().copied().filter(|id| consensus.contains(id)).collect(),
        missing: consensus.iter().copied().filter(|id| !yours.contains(id)).collect(),
        extra: yours.iter().copied().filter(|id| !consensus.contains(id)).collect(),
    }
}

/// Zero means unknown and never matches.
fn same_pick(yours: u32, theirs: u32) -> bool {
    yours != 0 && theirs != 0 && yours == theirs
}

fn differs(yours: u32, theirs: u32) -> bool {
    yours != 0 && theirs != 0 && yours != theirs
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub shared_core_items: Vec<CatalogEntry>,
    pub missing_from_your_core: Vec<CatalogEntry>,
    pub extra_in_your_core: Vec<CatalogEntry>,
    pub keystone_match: bool,
    pub primary_tree_match: bool,
    pub secondary_tree_match: bool,
    pub boots_match: bool,
    pub advice: Vec<String>,
}

pub fn compare_builds(yours: &BuildPicks, consensus: &BuildPicks, catalog: &ReferenceCatalog) -> ComparisonResult {
    let diff = diff_core(&yours.core_items, &consensus.core_items);
    let advice = advice_lines(yours, consensus, &diff, catalog);

    ComparisonResult {
        shared_core_items: catalog.items(&diff.shared),
        missing_from_your_core: catalog.items(&diff.missing),
        extra_in_your_core: catalog.items(&diff.extra),
        keystone_match: same_pick(yours.keystone, consensus.keystone),
        primary_tree_match: same_pick(yours.primary_style, consensus.primary_style),
        secondary_tree_match: same_pick(yours.secondary_style, consensus.secondary_style),
        boots_match: same_pick(yours.boots, consensus.boots),
        advice,
    }
}

/// Every rule that fires adds a line; a single affirmative line otherwise.
fn advice_lines(
    yours: &BuildPicks,
    consensus: &BuildPicks,
    diff: &CoreDiff,
    catalog: &ReferenceCatalog,
) -> Vec<String> {
    let mut advice = Vec::new();

    if !diff.missing.is_empty() {
        let names: Vec<String> = diff.missing.iter().map(|id| catalog.item_name(*id)).collect();
        advice.push(format!("Prioritize cohort core items: {}.", names.join(", ")));
    }
    if differs(yours.keystone, consensus.keystone) {
        advice.push(format!(
            "Switch keystone from {} to {} to match the cohort.",
            catalog.rune_name(yours.keystone),
            catalog.rune_name(consensus.keystone)
        ));
    }
    if differs(yours.secondary_style, consensus.secondary_style) {
        advice.push(format!(
            "Match secondary tree to {}.",
            catalog.rune_name(consensus.secondary_style)
        ));
    }
    if differs(yours.boots, consensus.boots) {
        advice.push(format!(
            "Boot preference mismatch: cohort uses {}.",
            catalog.item_name(consensus.boots)
        ));
    }

    if advice.is_empty() {
        advice.push("Your Karma setup is already close to the cohort benchmark.".to_string());
    }
    advice
}
