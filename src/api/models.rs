use super::lenient;
use serde::Deserialize;
use std::collections::HashMap;

// Account V1 response
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountDto {
    #[serde(deserialize_with = "lenient::text")]
    pub puuid: String,
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
}

// Summoner V4 response
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct SummonerDto {
    pub puuid: String,
    pub summoner_level: Option<i64>,
    pub profile_icon_id: Option<i64>,
}

// Match V5 response
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MatchDto {
    pub info: Option<MatchInfo>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchInfo {
    pub game_duration: i64,
    pub game_end_timestamp: i64,
    pub queue_id: Option<i64>,
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantDto {
    pub puuid: String,
    pub participant_id: i64,
    pub champion_id: u32,
    pub champion_name: String,
    pub team_id: i64,
    pub win: bool,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub total_minions_killed: i64,
    pub neutral_minions_killed: i64,
    pub gold_earned: i64,
    pub team_position: String,     // TOP, JUNGLE, MIDDLE, BOTTOM, UTILITY
    pub individual_position: String,
    pub vision_score: i64,
    pub detector_wards_placed: i64,
    pub vision_wards_bought_in_game: i64,
    pub wards_killed: i64,
    pub total_heals_on_teammates: i64,
    pub total_damage_shielded_on_teammates: i64,
    #[serde(rename = "timeCCingOthers")]
    pub time_ccing_others: i64,
    pub item0: u32,
    pub item1: u32,
    pub item2: u32,
    pub item3: u32,
    pub item4: u32,
    pub item5: u32,
    pub item6: u32,
    pub summoner1_id: u32,
    pub summoner2_id: u32,
    pub perks: PerksDto,
}

impl ParticipantDto {
    pub fn items(&self) -> [u32; 7] {
        [
            self.item0, self.item1, self.item2, self.item3, self.item4, self.item5, self.item6,
        ]
    }

    /// Declared position, preferring the team-assigned slot.
    pub fn position(&self) -> String {
        let raw = if !self.team_position.is_empty() {
            self.team_position.as_str()
        } else if !self.individual_position.is_empty() {
            self.individual_position.as_str()
        } else {
            "UNKNOWN"
        };
        raw.to_uppercase()
    }

    pub fn control_wards(&self) -> i64 {
        if self.detector_wards_placed != 0 {
            self.detector_wards_placed
        } else {
            self.vision_wards_bought_in_game
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PerksDto {
    pub styles: Vec<PerkStyleDto>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PerkStyleDto {
    pub style: u32,
    pub selections: Vec<PerkSelectionDto>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct PerkSelectionDto {
    pub perk: u32,
}

// Match V5 timeline response
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TimelineDto {
    pub info: TimelineInfo,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct TimelineInfo {
    pub frames: Vec<FrameDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameDto {
    pub timestamp: i64,
    pub participant_frames: HashMap<String, ParticipantFrameDto>,
    pub events: Vec<EventDto>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantFrameDto {
    pub total_gold: i64,
    pub xp: i64,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: i64,
    pub victim_id: i64,
    pub killer_id: i64,
    pub assisting_participant_ids: Vec<i64>,
}

// Ranking service: champion/mastery_rank
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MasteryRankDto {
    #[serde(deserialize_with = "lenient::records")]
    pub data_list: Vec<CohortRowDto>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CohortRowDto {
    #[serde(deserialize_with = "lenient::text")]
    pub puu_id: String,
    #[serde(deserialize_with = "lenient::text")]
    pub riot_id_name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub riot_id_tag_line: String,
    #[serde(deserialize_with = "lenient::int")]
    pub rank: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub tier: String,
    #[serde(deserialize_with = "lenient::int")]
    pub lp: i64,
    #[serde(deserialize_with = "lenient::int")]
    pub games: i64,
    #[serde(deserialize_with = "lenient::float")]
    pub win_rate: f64,
    #[serde(deserialize_with = "lenient::float")]
    pub kda: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub lane: String,
}

// Ranking service: champion/master_build
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MasterBuildDto {
    #[serde(deserialize_with = "lenient::records")]
    pub data: Vec<MasterBuildRowDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct MasterBuildRowDto {
    #[serde(deserialize_with = "lenient::records")]
    pub data_list: Vec<BuildRowDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BuildRowDto {
    #[serde(deserialize_with = "lenient::records")]
    pub build_detail: Vec<BuildDetailDto>,
}

/// One recorded build of a cohort member. `core_item` and `rune_main` are the
/// scalar headline picks; the nested tables carry the full selections.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct BuildDetailDto {
    #[serde(deserialize_with = "lenient::id")]
    pub core_item: u32,
    #[serde(deserialize_with = "lenient::id")]
    pub rune_main: u32,
    #[serde(deserialize_with = "lenient::int")]
    pub games: i64,
    #[serde(deserialize_with = "lenient::float")]
    pub win_rate: f64,
    #[serde(deserialize_with = "lenient::records")]
    pub item_build_3: Vec<ItemComboDto>,
    #[serde(deserialize_with = "lenient::records")]
    pub item_build_2: Vec<ItemComboDto>,
    #[serde(deserialize_with = "lenient::records")]
    pub boots: Vec<BootsDto>,
    #[serde(deserialize_with = "lenient::records")]
    pub spell: Vec<SpellSetDto>,
    pub rune: RuneSetDto,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ItemComboDto {
    #[serde(deserialize_with = "lenient::ids")]
    pub items: Vec<u32>,
    #[serde(deserialize_with = "lenient::int")]
    pub games: i64,
    #[serde(deserialize_with = "lenient::float")]
    pub win_rate: f64,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct BootsDto {
    #[serde(deserialize_with = "lenient::id")]
    pub boots: u32,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SpellSetDto {
    #[serde(deserialize_with = "lenient::ids")]
    pub spell: Vec<u32>,
}

/// `rune_main` is `[style, keystone, runes..]`, `rune_sub` is `[style, runes..]`.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RuneSetDto {
    #[serde(deserialize_with = "lenient::ids")]
    pub rune_main: Vec<u32>,
    #[serde(deserialize_with = "lenient::ids")]
    pub rune_sub: Vec<u32>,
    #[serde(deserialize_with = "lenient::ids")]
    pub rune_stat: Vec<u32>,
}

// Data Dragon item.json
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ItemCatalogDto {
    pub data: HashMap<String, ItemDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ItemDto {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub tags: Vec<String>,
}

// Data Dragon runesReforged.json
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RuneTreeDto {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u32,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::records")]
    pub slots: Vec<RuneSlotDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RuneSlotDto {
    #[serde(deserialize_with = "lenient::records")]
    pub runes: Vec<RuneDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RuneDto {
    #[serde(deserialize_with = "lenient::id")]
    pub id: u32,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub icon: String,
}

// Data Dragon summoner.json
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SpellCatalogDto {
    pub data: HashMap<String, SpellDto>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SpellDto {
    #[serde(deserialize_with = "lenient::id")]
    pub key: u32,
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    pub image: SpellImageDto,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SpellImageDto {
    #[serde(deserialize_with = "lenient::text")]
    pub full: String,
}
