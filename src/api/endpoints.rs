// URL builders for the three upstreams: Riot (account/summoner/match),
// the ranking service (cohort + builds) and Data Dragon (static content).

use urlencoding::encode;

pub const RANKING_API_BASE: &str = "https://b2c-api-cdn.deeplol.gg";
pub const DATA_DRAGON_BASE: &str = "https://ddragon.leagueoflegends.com";

/// Regional routing value for Account-v1 / Match-v5 given a platform shard.
pub fn regional_routing(platform: &str) -> Option<&'static str> {
    match platform {
        "na1" | "br1" | "la1" | "la2" => Some("americas"),
        "euw1" | "eun1" | "tr1" | "ru" => Some("europe"),
        "kr" | "jp1" => Some("asia"),
        "oc1" | "ph2" | "sg2" | "th2" | "tw2" | "vn2" => Some("sea"),
        _ => None,
    }
}

pub fn is_riot_host(url: &str) -> bool {
    url.split("://")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .is_some_and(|host| host.ends_with(".api.riotgames.com"))
}

pub fn account_by_riot_id(routing: &str, game_name: &str, tag_line: &str) -> String {
    format!(
        "https://{}.api.riotgames.com/riot/account/v1/accounts/by-riot-id/{}/{}",
        routing,
        encode(game_name),
        encode(tag_line)
    )
}

pub fn summoner_by_puuid(platform: &str, puuid: &str) -> String {
    format!(
        "https://{}.api.riotgames.com/lol/summoner/v4/summoners/by-puuid/{}",
        platform, puuid
    )
}

pub fn match_ids_by_puuid(routing: &str, puuid: &str, count: usize) -> String {
    format!(
        "https://{}.api.riotgames.com/lol/match/v5/matches/by-puuid/{}/ids?start=0&count={}",
        routing, puuid, count
    )
}

pub fn match_detail(routing: &str, match_id: &str) -> String {
    format!(
        "https://{}.api.riotgames.com/lol/match/v5/matches/{}",
        routing, match_id
    )
}

pub fn match_timeline(routing: &str, match_id: &str) -> String {
    format!(
        "https://{}.api.riotgames.com/lol/match/v5/matches/{}/timeline",
        routing, match_id
    )
}

pub fn ranked_cohort(platform: &str, lane: &str, champion_id: u32, count: usize) -> String {
    format!(
        "{}/champion/mastery_rank?platform_id={}&lane={}&champion_id={}&cnt={}",
        RANKING_API_BASE,
        encode(platform),
        encode(lane),
        champion_id,
        count
    )
}

pub fn signature_build(player_key: &str, platform: &str) -> String {
    format!(
        "{}/champion/master_build?puu_id={}&platform_id={}",
        RANKING_API_BASE,
        encode(player_key),
        encode(platform)
    )
}

pub fn static_versions() -> String {
    format!("{}/api/versions.json", DATA_DRAGON_BASE)
}

pub fn item_catalog(version: &str) -> String {
    format!("{}/cdn/{}/data/en_US/item.json", DATA_DRAGON_BASE, version)
}

pub fn rune_catalog(version: &str) -> String {
    format!("{}/cdn/{}/data/en_US/runesReforged.json", DATA_DRAGON_BASE, version)
}

pub fn spell_catalog(version: &str) -> String {
    format!("{}/cdn/{}/data/en_US/summoner.json", DATA_DRAGON_BASE, version)
}

pub fn item_icon(version: &str, item_id: u32) -> String {
    format!("{}/cdn/{}/img/item/{}.png", DATA_DRAGON_BASE, version, item_id)
}

pub fn rune_icon(icon_path: &str) -> String {
    format!("{}/cdn/img/{}", DATA_DRAGON_BASE, icon_path)
}

pub fn spell_icon(version: &str, image: &str) -> String {
    format!("{}/cdn/{}/img/spell/{}", DATA_DRAGON_BASE, version, image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_covers_known_platforms_only() {
        assert_eq!(regional_routing("euw1"), Some("europe"));
        assert_eq!(regional_routing("tw2"), Some("sea"));
        assert_eq!(regional_routing("xx9"), None);
    }

    #[test]
    fn riot_ids_are_encoded() {
        let url = account_by_riot_id("europe", "feels ban#man", "EUW");
        assert!(url.ends_with("/by-riot-id/feels%20ban%23man/EUW"));
        assert!(is_riot_host(&url));
        assert!(!is_riot_host(&static_versions()));
    }

    #[test]
    fn ranking_query_values_are_encoded() {
        let url = signature_build("a/b?c=d&e", "KR");
        assert!(url.ends_with("puu_id=a%2Fb%3Fc%3Dd%26e&platform_id=KR"));
        let url = account_by_riot_id("asia", "한국", "KR1");
        assert!(url.ends_with("/by-riot-id/%ED%95%9C%EA%B5%AD/KR1"));
    }
}
