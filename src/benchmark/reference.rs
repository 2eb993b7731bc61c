use crate::api::client::{fetch_as, JsonFetcher};
use crate::api::endpoints;
use crate::api::models::{ItemCatalogDto, RuneTreeDto, SpellCatalogDto};
use crate::cache::SnapshotCache;
use crate::config;
use crate::error::AppError;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

/// Stat shards are not part of the rune trees in the static content.
const STAT_SHARD_NAMES: [(u32, &str); 8] = [
    (5001, "Health Scaling"),
    (5002, "Armor"),
    (5003, "Magic Resist"),
    (5005, "Attack Speed"),
    (5007, "Ability Haste"),
    (5008, "Adaptive Force"),
    (5010, "Move Speed"),
    (5011, "Health"),
];

/// Display form of one catalog id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub id: u32,
    pub name: String,
    pub icon: String,
}

/// Lookup tables for one static-content version. Never mutated once built.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    pub version: String,
    item_names: HashMap<u32, String>,
    item_tags: HashMap<u32, Vec<String>>,
    rune_names: HashMap<u32, String>,
    rune_icons: HashMap<u32, String>,
    spell_names: HashMap<u32, String>,
    spell_icons: HashMap<u32, String>,
}

impl ReferenceCatalog {
    pub fn from_parts(
        version: &str,
        items: ItemCatalogDto,
        rune_trees: Vec<RuneTreeDto>,
        spells: SpellCatalogDto,
    ) -> Self {
        let mut item_names = HashMap::new();
        let mut item_tags = HashMap::new();
        for (raw_id, item) in items.data {
            let item_id = raw_id.trim().parse::<u32>().unwrap_or(0);
            if item_id == 0 {
                continue;
            }
            let name = if item.name.is_empty() {
                format!("Item {}", item_id)
            } else {
                item.name
            };
            item_names.insert(item_id, name);
            item_tags.insert(item_id, item.tags);
        }

        let mut rune_names: HashMap<u32, String> = STAT_SHARD_NAMES
            .iter()
            .map(|(id, name)| (*id, name.to_string()))
            .collect();
        let mut rune_icons = HashMap::new();
        for tree in rune_trees {
            if tree.id > 0 {
                rune_names.insert(tree.id, non_empty_or(tree.name, "Rune", tree.id));
            }
            for rune in tree.slots.into_iter().flat_map(|slot| slot.runes) {
                if rune.id == 0 {
                    continue;
                }
                if !rune.icon.is_empty() {
                    rune_icons.insert(rune.id, endpoints::rune_icon(&rune.icon));
                }
                rune_names.insert(rune.id, non_empty_or(rune.name, "Rune", rune.id));
            }
        }

        let mut spell_names = HashMap::new();
        let mut spell_icons = HashMap::new();
        for spell in spells.data.into_values() {
            if spell.key == 0 {
                continue;
            }
            if !spell.image.full.is_empty() {
                spell_icons.insert(spell.key, endpoints::spell_icon(version, &spell.image.full));
            }
            spell_names.insert(spell.key, non_empty_or(spell.name, "Spell", spell.key));
        }

        ReferenceCatalog {
            version: version.to_string(),
            item_names,
            item_tags,
            rune_names,
            rune_icons,
            spell_names,
            spell_icons,
        }
    }

    pub fn has_items(&self) -> bool {
        !self.item_names.is_empty()
    }

    pub fn item_name(&self, id: u32) -> String {
        lookup_name(&self.item_names, id, "Item")
    }

    pub fn rune_name(&self, id: u32) -> String {
        lookup_name(&self.rune_names, id, "Rune")
    }

    pub fn spell_name(&self, id: u32) -> String {
        lookup_name(&self.spell_names, id, "Spell")
    }

    pub fn item_tags(&self, id: u32) -> &[String] {
        self.item_tags.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn ids_tagged(&self, tag: &str) -> HashSet<u32> {
        self.item_tags
            .iter()
            .filter(|(_, tags)| tags.iter().any(|t| t == tag))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn boots_ids(&self) -> HashSet<u32> {
        self.ids_tagged("Boots")
    }

    pub fn trinket_ids(&self) -> HashSet<u32> {
        self.ids_tagged("Trinket")
    }

    pub fn items(&self, ids: &[u32]) -> Vec<CatalogEntry> {
        ids.iter()
            .filter(|id| **id > 0)
            .map(|id| CatalogEntry {
                id: *id,
                name: self.item_name(*id),
                icon: endpoints::item_icon(&self.version, *id),
            })
            .collect()
    }

    pub fn runes(&self, ids: &[u32]) -> Vec<CatalogEntry> {
        ids.iter()
            .filter(|id| **id > 0)
            .map(|id| CatalogEntry {
                id: *id,
                name: self.rune_name(*id),
                icon: self.rune_icons.get(id).cloned().unwrap_or_default(),
            })
            .collect()
    }

    pub fn spells(&self, ids: &[u32]) -> Vec<CatalogEntry> {
        ids.iter()
            .filter(|id| **id > 0)
            .map(|id| CatalogEntry {
                id: *id,
                name: self.spell_name(*id),
                icon: self.spell_icons.get(id).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

fn non_empty_or(name: String, prefix: &str, id: u32) -> String {
    if name.is_empty() {
        format!("{} {}", prefix, id)
    } else {
        name
    }
}

/// `"-"` for an unset id, `"<prefix> <id>"` for one the catalog has never seen.
fn lookup_name(names: &HashMap<u32, String>, id: u32, prefix: &str) -> String {
    if id == 0 {
        return "-".to_string();
    }
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("{} {}", prefix, id))
}

/// Resolves the static lookup tables, keeping one snapshot per TTL window.
pub struct CatalogResolver {
    fetcher: Arc<dyn JsonFetcher>,
    cache: SnapshotCache<ReferenceCatalog>,
}

impl CatalogResolver {
    pub fn new(fetcher: Arc<dyn JsonFetcher>) -> Self {
        CatalogResolver {
            fetcher,
            cache: SnapshotCache::new("reference_catalog", config::static_ttl()).serving_stale(),
        }
    }

    /// Current catalog. Fails only when no snapshot exists and the upstream is unavailable.
    pub fn get_catalog(&self) -> Result<Arc<ReferenceCatalog>, AppError> {
        self.cache
            .get_or_refresh(ReferenceCatalog::has_items, || self.fetch_catalog())
    }

    fn fetch_catalog(&self) -> Result<ReferenceCatalog, AppError> {
        let unavailable = |e: AppError| AppError::CatalogUnavailable(e.to_string());
        let fetcher = self.fetcher.as_ref();

        let versions: Vec<Value> =
            fetch_as(fetcher, &endpoints::static_versions(), "ddragon_versions").map_err(unavailable)?;
        let version = versions
            .first()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != "0")
            .map(str::to_string)
            .ok_or_else(|| AppError::CatalogUnavailable("no static content versions".to_string()))?;

        let items: ItemCatalogDto =
            fetch_as(fetcher, &endpoints::item_catalog(&version), "ddragon_items").map_err(unavailable)?;
        let runes: Vec<RuneTreeDto> =
            fetch_as(fetcher, &endpoints::rune_catalog(&version), "ddragon_runes").map_err(unavailable)?;
        let spells: SpellCatalogDto =
            fetch_as(fetcher, &endpoints::spell_catalog(&version), "ddragon_spells").map_err(unavailable)?;

        let catalog = ReferenceCatalog::from_parts(&version, items, runes, spells);
        info!(version = %catalog.version, items = catalog.item_names.len(), "reference catalog built");
        Ok(catalog)
    }
}

/// Catalog fixtures shared by unit tests across modules.
#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub fn items_json() -> Value {
        json!({"data": {
            "3158": {"name": "Ionian Boots of Lucidity", "tags": ["Boots"]},
            "3020": {"name": "Sorcerer's Shoes", "tags": ["Boots"]},
            "3364": {"name": "Oracle Lens", "tags": ["Trinket", "Vision"]},
            "3340": {"name": "Stealth Ward", "tags": ["Trinket"]},
            "3870": {"name": "Dream Maker", "tags": ["GoldPer"]},
            "2055": {"name": "Control Ward", "tags": ["Consumable"]},
            "6617": {"name": "Moonstone Renewer", "tags": ["SpellBlock"]},
            "3504": {"name": "Ardent Censer", "tags": ["SpellDamage"]},
            "3107": {"name": "Redemption", "tags": ["Health"]},
            "6621": {"name": "Dawncore"},
            "abc":  {"name": "Broken row"}
        }})
    }

    pub fn runes_json() -> Value {
        json!([
            {"id": 8200, "name": "Sorcery", "slots": [
                {"runes": [{"id": 8214, "name": "Summon Aery", "icon": "perk-images/Aery.png"}]},
                {"runes": [{"id": 8226, "name": "Manaflow Band", "icon": "perk-images/Manaflow.png"}]}
            ]},
            {"id": 8300, "name": "Inspiration", "slots": [
                {"runes": [{"id": 8304, "name": "Magical Footwear", "icon": ""}]}
            ]},
            {"id": 8000, "name": "Precision", "slots": [
                {"runes": [{"id": 8021, "name": "Fleet Footwork", "icon": "perk-images/Fleet.png"}]}
            ]}
        ])
    }

    pub fn spells_json() -> Value {
        json!({"data": {
            "SummonerFlash": {"key": "4", "name": "Flash", "image": {"full": "SummonerFlash.png"}},
            "SummonerDot": {"key": "14", "name": "Ignite", "image": {"full": "SummonerDot.png"}},
            "SummonerExhaust": {"key": "3", "name": "Exhaust", "image": {"full": ""}}
        }})
    }

    pub fn catalog() -> super::ReferenceCatalog {
        super::ReferenceCatalog::from_parts(
            "14.10.1",
            serde_json::from_value(items_json()).unwrap(),
            serde_json::from_value(runes_json()).unwrap(),
            serde_json::from_value(spells_json()).unwrap(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;
    use crate::api::client::fake::FakeFetcher;
    use serde_json::json;

    #[test]
    fn catalog_skips_unparsable_item_ids() {
        let catalog = fixtures::catalog();
        assert_eq!(catalog.item_names.len(), 10);
        assert_eq!(catalog.item_name(3158), "Ionian Boots of Lucidity");
        assert!(catalog.item_tags(6621).is_empty());
    }

    #[test]
    fn unknown_ids_get_prefixed_names_and_empty_icons() {
        let catalog = fixtures::catalog();
        assert_eq!(catalog.item_name(9999), "Item 9999");
        assert_eq!(catalog.rune_name(1234), "Rune 1234");
        assert_eq!(catalog.spell_name(77), "Spell 77");
        assert_eq!(catalog.item_name(0), "-");

        let runes = catalog.runes(&[8214, 1234, 0]);
        assert_eq!(runes.len(), 2);
        assert!(runes[0].icon.ends_with("/cdn/img/perk-images/Aery.png"));
        assert_eq!(runes[1].icon, "");
    }

    #[test]
    fn stat_shards_and_trees_have_names() {
        let catalog = fixtures::catalog();
        assert_eq!(catalog.rune_name(5008), "Adaptive Force");
        assert_eq!(catalog.rune_name(8200), "Sorcery");
        assert_eq!(catalog.spells(&[4])[0].icon, endpoints::spell_icon("14.10.1", "SummonerFlash.png"));
        assert_eq!(catalog.spells(&[3])[0].icon, "");
    }

    #[test]
    fn boots_and_trinkets_come_from_tags() {
        let catalog = fixtures::catalog();
        assert_eq!(catalog.boots_ids(), HashSet::from([3158, 3020]));
        assert_eq!(catalog.trinket_ids(), HashSet::from([3364, 3340]));
    }

    fn ddragon_fetcher() -> FakeFetcher {
        ddragon_fetcher_with(json!(["14.10.1", "14.9.1"]))
    }

    fn ddragon_fetcher_with(versions: Value) -> FakeFetcher {
        FakeFetcher::new()
            .route("versions.json", versions)
            .route("item.json", fixtures::items_json())
            .route("runesReforged.json", fixtures::runes_json())
            .route("summoner.json", fixtures::spells_json())
    }

    #[test]
    fn resolver_fetches_once_per_window() {
        let fetcher = Arc::new(ddragon_fetcher());
        let resolver = CatalogResolver::new(fetcher.clone());

        let first = resolver.get_catalog().unwrap();
        let second = resolver.get_catalog().unwrap();

        assert_eq!(first.version, "14.10.1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls_matching("versions.json"), 1);
    }

    #[test]
    fn resolver_without_snapshot_reports_unavailable() {
        let fetcher = FakeFetcher::new().fail("versions.json", 503);
        let resolver = CatalogResolver::new(Arc::new(fetcher));
        assert!(matches!(resolver.get_catalog(), Err(AppError::CatalogUnavailable(_))));
    }

    #[test]
    fn malformed_versions_are_unavailable() {
        for versions in [json!([null, "14.9.1"]), json!([0]), json!(["0"]), json!([" "]), json!([])] {
            let fetcher = Arc::new(ddragon_fetcher_with(versions));
            let resolver = CatalogResolver::new(fetcher.clone());
            assert!(matches!(resolver.get_catalog(), Err(AppError::CatalogUnavailable(_))));
            assert_eq!(fetcher.calls_matching("item.json"), 0);
        }
    }

    #[test]
    fn empty_item_table_is_not_trusted() {
        let fetcher = Arc::new(
            FakeFetcher::new()
                .route("versions.json", json!(["14.10.1"]))
                .route("item.json", json!({"data": {}}))
                .route("runesReforged.json", json!([]))
                .route("summoner.json", json!({"data": {}})),
        );
        let resolver = CatalogResolver::new(fetcher.clone());
        resolver.get_catalog().unwrap();
        resolver.get_catalog().unwrap();
        assert_eq!(fetcher.calls_matching("item.json"), 2);
    }
}
