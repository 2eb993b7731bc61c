#![allow(dead_code)]

use karma_benchmark::api::client::JsonFetcher;
use karma_benchmark::error::TransportError;
use serde_json::{json, Value};
use std::sync::Mutex;

pub const ME: &str = "me-puuid";

/// Routes URLs by substring; the first matching route wins, unmatched URLs are 404.
#[derive(Default)]
pub struct StubFetcher {
    routes: Vec<(String, Result<Value, u16>)>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        StubFetcher::default()
    }

    pub fn route(mut self, needle: &str, body: Value) -> Self {
        self.routes.push((needle.to_string(), Ok(body)));
        self
    }

    pub fn fail(mut self, needle: &str, status: u16) -> Self {
        self.routes.push((needle.to_string(), Err(status)));
        self
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u.contains(needle)).count()
    }
}

impl JsonFetcher for StubFetcher {
    fn fetch_json(&self, url: &str, endpoint: &str) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.routes.iter().find(|(needle, _)| url.contains(needle.as_str())) {
            Some((_, Ok(body))) => Ok(body.clone()),
            Some((_, Err(status))) => Err(TransportError::new(*status, endpoint, "stubbed failure")),
            None => Err(TransportError::new(404, endpoint, format!("no route for {}", url))),
        }
    }
}

/// Account, summoner and static content for a player on euw1.
pub fn player_routes(fetcher: StubFetcher) -> StubFetcher {
    fetcher
        .route(
            "accounts/by-riot-id",
            json!({"puuid": ME, "gameName": "Tester", "tagLine": "EUW"}),
        )
        .route(
            "summoners/by-puuid",
            json!({"puuid": ME, "summonerLevel": 321, "profileIconId": 29}),
        )
        .route("versions.json", json!(["14.10.1", "14.9.1"]))
        .route(
            "item.json",
            json!({"data": {
                "3158": {"name": "Ionian Boots of Lucidity", "tags": ["Boots"]},
                "3364": {"name": "Oracle Lens", "tags": ["Trinket"]},
                "3870": {"name": "Dream Maker", "tags": ["GoldPer"]},
                "6617": {"name": "Moonstone Renewer", "tags": ["SpellBlock"]},
                "3504": {"name": "Ardent Censer", "tags": ["SpellDamage"]}
            }}),
        )
        .route(
            "runesReforged.json",
            json!([
                {"id": 8200, "name": "Sorcery", "slots": [
                    {"runes": [{"id": 8214, "name": "Summon Aery", "icon": "perk-images/Aery.png"}]}
                ]},
                {"id": 8300, "name": "Inspiration", "slots": [
                    {"runes": [{"id": 8304, "name": "Magical Footwear", "icon": "perk-images/Footwear.png"}]}
                ]}
            ]),
        )
        .route(
            "summoner.json",
            json!({"data": {
                "SummonerFlash": {"key": "4", "name": "Flash", "image": {"full": "SummonerFlash.png"}},
                "SummonerDot": {"key": "14", "name": "Ignite", "image": {"full": "SummonerDot.png"}}
            }}),
        )
}

pub fn cohort_routes(fetcher: StubFetcher) -> StubFetcher {
    fetcher
        .route(
            "mastery_rank",
            json!({"data_list": [
                {"puu_id": "kr-1", "riot_id_name": "Aery", "riot_id_tag_line": "KR1", "rank": 1, "tier": "CHALLENGER",
                 "lp": 1400, "games": 200, "win_rate": 0.6, "kda": 4.0, "lane": "Support"},
                {"puu_id": "kr-2", "riot_id_name": "Mantra", "riot_id_tag_line": "KR2", "rank": 2, "tier": "GRANDMASTER",
                 "lp": 900, "games": 100, "win_rate": 0.5, "kda": 3.1, "lane": "Support"}
            ]}),
        )
        .route(
            "puu_id=kr-1",
            json!({"data": [{"data_list": [{"build_detail": [{
                "core_item": 6617, "rune_main": 8214, "games": 80, "win_rate": 0.61,
                "item_build_3": [{"items": [6617, 3504, 3870], "games": 40, "win_rate": 0.6}],
                "boots": [{"boots": 3158}],
                "spell": [{"spell": [4, 14]}],
                "rune": {"rune_main": [8200, 8214], "rune_sub": [8300, 8304], "rune_stat": [5008]}
            }]}]}]}),
        )
        .fail("puu_id=kr-2", 500)
}

pub fn participant(id: i64, puuid: &str, team: i64, champion: &str, champion_id: u32, position: &str, win: bool) -> Value {
    json!({
        "puuid": puuid, "participantId": id, "teamId": team, "win": win,
        "championName": champion, "championId": champion_id, "teamPosition": position,
        "kills": 2, "deaths": 3, "assists": 8,
        "totalMinionsKilled": 30, "neutralMinionsKilled": 0, "goldEarned": 9000,
        "visionScore": 54, "detectorWardsPlaced": 3, "wardsKilled": 6,
        "totalHealsOnTeammates": 4000, "totalDamageShieldedOnTeammates": 6000, "timeCCingOthers": 20,
        "item0": 6617, "item1": 3870, "item2": 3158, "item6": 3364,
        "summoner1Id": 4, "summoner2Id": 14,
        "perks": {"styles": [
            {"style": 8200, "selections": [{"perk": 8214}]},
            {"style": 8300, "selections": [{"perk": 8304}]}
        ]}
    })
}

/// A 30-minute match where the tracked player is on blue side as `champion`.
pub fn match_as(champion: &str, champion_id: u32, win: bool) -> Value {
    json!({"info": {
        "gameDuration": 1800,
        "gameEndTimestamp": 1_700_000_000_000i64,
        "queueId": 420,
        "participants": [
            participant(5, ME, 100, champion, champion_id, "UTILITY", win),
            participant(4, "ally-adc", 100, "Jinx", 222, "BOTTOM", win),
            participant(9, "enemy-adc", 200, "Ezreal", 81, "BOTTOM", !win),
            participant(10, "enemy-sup", 200, "Nautilus", 111, "UTILITY", !win)
        ]
    }})
}

pub fn timeline() -> Value {
    json!({"info": {"frames": [
        {"timestamp": 0},
        {"timestamp": 600_000, "events": [
            {"type": "CHAMPION_KILL", "timestamp": 420_000, "victimId": 5, "killerId": 10, "assistingParticipantIds": [9]},
            {"type": "CHAMPION_KILL", "timestamp": 500_000, "victimId": 9, "killerId": 4, "assistingParticipantIds": [5]}
        ]},
        {"timestamp": 840_000, "participantFrames": {
            "5": {"totalGold": 5200, "xp": 6100},
            "10": {"totalGold": 5000, "xp": 6300}
        }}
    ]}})
}
