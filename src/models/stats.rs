use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use sqlx::FromRow;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use utoipa::ToSchema;

use super::{SHORT_COLUMN, TEXT_COLUMN};
use crate::utils::{clean_field, frames_to_minutes, lenient_f32, lenient_i32, lenient_int};

static FACTION_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)_(\d{1,4})$").unwrap());

const FACTION_FIELDS: &[&str] = &[
    "factionIndex",
    "controlType",
    "resourceMultiplier",
    "factionTypeName",
    "personalityType",
    "teamIndex",
    "wonGame",
    "killCount",
    "enemyKillCount",
    "deathCount",
    "unitsProducedCount",
    "resourceHarvestedCount",
    "playerName",
    "quitBeforeGameEnd",
    "quitTime",
    "playerUUID",
    "platform",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    Closed,
    CpuEasy,
    Cpu,
    CpuUltra,
    CpuMega,
    NetworkPlayer,
    NetworkUnassigned,
    HumanHost,
    NetworkCpuEasy,
    NetworkCpu,
    NetworkCpuUltra,
    NetworkCpuMega,
}

impl ControlType {
    /// Control types played by a person rather than the AI.
    pub const HUMAN_CODES: [i32; 3] = [5, 6, 7];

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Closed,
            1 => Self::CpuEasy,
            2 => Self::Cpu,
            3 => Self::CpuUltra,
            4 => Self::CpuMega,
            5 => Self::NetworkPlayer,
            6 => Self::NetworkUnassigned,
            7 => Self::HumanHost,
            8 => Self::NetworkCpuEasy,
            9 => Self::NetworkCpu,
            10 => Self::NetworkCpuUltra,
            11 => Self::NetworkCpuMega,
            _ => return None,
        })
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Closed => "Closed",
            Self::CpuEasy => "CPU Easy",
            Self::Cpu => "CPU",
            Self::CpuUltra => "CPU Ultra",
            Self::CpuMega => "CPU Mega",
            Self::NetworkPlayer => "Network Player",
            Self::NetworkUnassigned => "Network Unassigned",
            Self::HumanHost => "Human Host",
            Self::NetworkCpuEasy => "Network CPU Easy",
            Self::NetworkCpu => "Network CPU",
            Self::NetworkCpuUltra => "Network CPU Ultra",
            Self::NetworkCpuMega => "Network CPU Mega",
        }
    }

    pub fn title_for(code: i32) -> &'static str {
        Self::from_code(code).map(Self::title).unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// One row of `glestgamestats`.
#[derive(Debug, Clone, FromRow)]
pub struct GameStats {
    pub game_uuid: String,
    pub tech: String,
    pub faction_count: i32,
    pub frames_played: i32,
    pub frames_to_calculate_playtime: i32,
    pub max_concurrent_unit_count: i32,
    pub total_end_game_concurrent_unit_count: i32,
    pub is_headless_server: bool,
    pub lasttime: DateTime<Utc>,
}

/// One row of `glestgameplayerstats`.
#[derive(Debug, Clone, FromRow)]
pub struct PlayerStats {
    pub game_uuid: String,
    pub faction_index: i32,
    pub control_type: i32,
    pub resource_multiplier: f32,
    pub faction_type_name: String,
    pub personality_type: i32,
    pub team_index: i32,
    pub won_game: bool,
    pub kill_count: i32,
    pub enemy_kill_count: i32,
    pub death_count: i32,
    pub units_produced_count: i32,
    pub resource_harvested_count: i32,
    pub player_name: String,
    pub quit_before_game_end: bool,
    pub quit_time: i32,
    pub player_uuid: String,
    pub platform: String,
    pub lasttime: DateTime<Utc>,
}

impl PlayerStats {
    pub fn score(&self) -> f64 {
        player_score(
            self.enemy_kill_count,
            self.units_produced_count,
            self.resource_harvested_count,
        )
    }
}

pub fn player_score(enemy_kills: i32, units_produced: i32, resources_harvested: i32) -> f64 {
    enemy_kills as f64 * 100.0 + units_produced as f64 * 50.0 + resources_harvested as f64 / 10.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameStatsReport {
    pub game_uuid: String,
    pub tech: String,
    pub faction_count: i32,
    pub frames_played: i32,
    pub frames_to_calculate_playtime: i32,
    pub max_concurrent_unit_count: i32,
    pub total_end_game_concurrent_unit_count: i32,
    pub is_headless_server: bool,
    pub factions: Vec<PlayerStatsReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatsReport {
    /// The `N` of the `*_N` parameters this faction was read from.
    pub slot: u32,
    pub faction_index: i32,
    pub control_type: i32,
    pub resource_multiplier: f32,
    pub faction_type_name: String,
    pub personality_type: i32,
    pub team_index: i32,
    pub won_game: bool,
    pub kill_count: i32,
    pub enemy_kill_count: i32,
    pub death_count: i32,
    pub units_produced_count: i32,
    pub resource_harvested_count: i32,
    pub player_name: String,
    pub quit_before_game_end: bool,
    pub quit_time: i32,
    pub player_uuid: String,
    pub platform: String,
}

impl GameStatsReport {
    /// `None` when the query carries no `gameUUID`.
    pub fn from_params(params: &HashMap<String, String>) -> Option<Self> {
        let game_uuid = params.get("gameUUID").map(|v| clean_field(v, SHORT_COLUMN))?;
        if game_uuid.is_empty() {
            return None;
        }

        let text = |key: &str| {
            params
                .get(key)
                .map(|v| clean_field(v, TEXT_COLUMN))
                .unwrap_or_default()
        };
        let int = |key: &str| params.get(key).map(|v| lenient_i32(v)).unwrap_or(0);

        let factions = faction_slots(params)
            .into_iter()
            .map(|slot| PlayerStatsReport::from_params(params, slot))
            .collect();

        Some(Self {
            game_uuid,
            tech: text("tech"),
            faction_count: int("factionCount"),
            frames_played: int("framesPlayed"),
            frames_to_calculate_playtime: int("framesToCalculatePlaytime"),
            max_concurrent_unit_count: int("maxConcurrentUnitCount"),
            total_end_game_concurrent_unit_count: int("totalEndGameConcurrentUnitCount"),
            is_headless_server: int("isHeadlessServer") != 0,
            factions,
        })
    }

    pub fn duration_minutes(&self) -> f64 {
        frames_to_minutes(self.frames_to_calculate_playtime as i64)
    }
}

impl PlayerStatsReport {
    fn from_params(params: &HashMap<String, String>, slot: u32) -> Self {
        let key = |field: &str| format!("{}_{}", field, slot);
        let text = |field: &str, width: usize| {
            params
                .get(&key(field))
                .map(|v| clean_field(v, width))
                .unwrap_or_default()
        };
        let raw = |field: &str| params.get(&key(field)).map(String::as_str);
        let int = |field: &str| raw(field).map(lenient_i32).unwrap_or(0);
        let flag = |field: &str| raw(field).map(lenient_int).unwrap_or(0) != 0;

        Self {
            slot,
            faction_index: raw("factionIndex").map(lenient_i32).unwrap_or(slot as i32),
            control_type: int("controlType"),
            resource_multiplier: raw("resourceMultiplier").map(lenient_f32).unwrap_or(0.0),
            faction_type_name: text("factionTypeName", SHORT_COLUMN),
            personality_type: int("personalityType"),
            team_index: int("teamIndex"),
            won_game: flag("wonGame"),
            kill_count: int("killCount"),
            enemy_kill_count: int("enemyKillCount"),
            death_count: int("deathCount"),
            units_produced_count: int("unitsProducedCount"),
            resource_harvested_count: int("resourceHarvestedCount"),
            player_name: text("playerName", TEXT_COLUMN),
            quit_before_game_end: flag("quitBeforeGameEnd"),
            quit_time: int("quitTime"),
            player_uuid: text("playerUUID", SHORT_COLUMN),
            platform: text("platform", TEXT_COLUMN),
        }
    }
}

/// Faction numbers that have at least one `<field>_N` parameter, ascending.
fn faction_slots(params: &HashMap<String, String>) -> BTreeSet<u32> {
    params
        .keys()
        .filter_map(|key| {
            let caps = FACTION_KEY.captures(key)?;
            if !FACTION_FIELDS.contains(&&caps[1]) {
                return None;
            }
            caps[2].parse::<u32>().ok()
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    AllTime,
}

impl Period {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("day") => Self::Day,
            Some("week") => Self::Week,
            Some("month") => Self::Month,
            _ => Self::AllTime,
        }
    }

    pub fn query_value(self) -> Option<&'static str> {
        match self {
            Self::Day => Some("day"),
            Self::Week => Some("week"),
            Self::Month => Some("month"),
            Self::AllTime => None,
        }
    }

    pub fn label(self) -> &'static str {
        self.query_value().unwrap_or("all time")
    }

    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Day => Some(now - chrono::Duration::days(1)),
            Self::Week => Some(now - chrono::Duration::weeks(1)),
            Self::Month => now.checked_sub_months(chrono::Months::new(1)),
            Self::AllTime => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PlayerRanking {
    pub player_name: String,
    pub games_played: i64,
}
