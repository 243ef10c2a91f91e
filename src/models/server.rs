use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::net::IpAddr;
use utoipa::{IntoParams, ToSchema};

use super::{SHORT_COLUMN, TEXT_COLUMN};
use crate::utils::{clean_field, frames_to_time_string, lenient_i32};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Waiting,
    Full,
    InProgress,
    Finished,
}

impl GameStatus {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Waiting),
            1 => Some(Self::Full),
            2 => Some(Self::InProgress),
            3 => Some(Self::Finished),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Waiting => 0,
            Self::Full => 1,
            Self::InProgress => 2,
            Self::Finished => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Waiting => "waiting for players",
            Self::Full => "full / pending start",
            Self::InProgress => "in progress",
            Self::Finished => "finished",
        }
    }
}

/// One row of `glestserver`.
#[derive(Debug, Clone, FromRow)]
pub struct ServerRecord {
    pub id: i64,
    pub glest_version: String,
    pub platform: String,
    pub binary_compile_date: String,
    pub server_title: String,
    pub ip: String,
    pub external_server_port: i32,
    pub tech: String,
    pub map: String,
    pub tileset: String,
    pub active_slots: i32,
    pub network_slots: i32,
    pub connected_clients: i32,
    pub country: String,
    pub status: i32,
    pub game_uuid: Option<String>,
    pub lasttime: DateTime<Utc>,
    /// `framesToCalculatePlaytime` of the linked game, when listing joins it in.
    #[sqlx(default)]
    pub game_frames: Option<i32>,
}

impl ServerRecord {
    /// Stored status, except a waiting server with every network slot taken reads as full.
    pub fn effective_status(&self) -> i32 {
        if self.status == GameStatus::Waiting.code() && self.connected_clients >= self.network_slots {
            GameStatus::Full.code()
        } else {
            self.status
        }
    }

    pub fn game_duration(&self) -> Option<String> {
        self.game_frames.map(|frames| frames_to_time_string(frames as i64))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerListing {
    pub glest_version: String,
    pub platform: String,
    pub binary_compile_date: String,
    pub server_title: String,
    pub ip: String,
    pub tech: String,
    pub map: String,
    pub tileset: String,
    pub active_slots: i32,
    pub network_slots: i32,
    pub connected_clients: i32,
    pub external_server_port: i32,
    pub country: String,
    /// Effective status (0 waiting, 1 full/pending, 2 in progress, 3 finished).
    pub status: i32,
    #[serde(rename = "gameUUID", skip_serializing_if = "Option::is_none")]
    pub game_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_duration: Option<String>,
    pub lasttime: DateTime<Utc>,
}

impl From<ServerRecord> for ServerListing {
    fn from(value: ServerRecord) -> Self {
        let status = value.effective_status();
        let game_duration = value.game_duration();
        Self {
            glest_version: value.glest_version,
            platform: value.platform,
            binary_compile_date: value.binary_compile_date,
            server_title: value.server_title,
            ip: value.ip,
            tech: value.tech,
            map: value.map,
            tileset: value.tileset,
            active_slots: value.active_slots,
            network_slots: value.network_slots,
            connected_clients: value.connected_clients,
            external_server_port: value.external_server_port,
            country: value.country,
            status,
            game_uuid: value.game_uuid,
            game_duration,
            lasttime: value.lasttime,
        }
    }
}

/// Raw query string of `addServerInfo.php`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ServerReportQuery {
    pub glest_version: Option<String>,
    pub platform: Option<String>,
    pub binary_compile_date: Option<String>,
    pub server_title: Option<String>,
    pub externalconnectport: Option<String>,
    pub tech: Option<String>,
    pub map: Option<String>,
    pub tileset: Option<String>,
    pub active_slots: Option<String>,
    pub network_slots: Option<String>,
    pub connected_clients: Option<String>,
    pub game_status: Option<String>,
    pub game_cmd: Option<String>,
    pub privacy_please: Option<String>,
    #[serde(rename = "gameUUID")]
    pub game_uuid: Option<String>,
}

/// A presence report after normalization, ready for the registration rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerReport {
    pub ip: IpAddr,
    pub port: i32,
    pub glest_version: String,
    pub platform: String,
    pub binary_compile_date: String,
    pub server_title: String,
    pub tech: String,
    pub map: String,
    pub tileset: String,
    pub active_slots: i32,
    pub network_slots: i32,
    pub connected_clients: i32,
    pub status: i32,
    pub game_cmd: String,
    pub privacy_please: bool,
    pub game_uuid: Option<String>,
}

impl ServerReport {
    pub fn from_query(query: &ServerReportQuery, ip: IpAddr, default_port: u16) -> Self {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(|v| clean_field(v, TEXT_COLUMN))
                .unwrap_or_default()
        };
        let int = |v: &Option<String>| v.as_deref().map(lenient_i32).unwrap_or(0);

        let port = match int(&query.externalconnectport) {
            0 => default_port as i32,
            p => p,
        };

        Self {
            ip,
            port,
            glest_version: text(&query.glest_version),
            platform: text(&query.platform),
            binary_compile_date: text(&query.binary_compile_date),
            server_title: text(&query.server_title),
            tech: text(&query.tech),
            map: text(&query.map),
            tileset: text(&query.tileset),
            active_slots: int(&query.active_slots),
            network_slots: int(&query.network_slots),
            connected_clients: int(&query.connected_clients),
            status: int(&query.game_status),
            game_cmd: text(&query.game_cmd),
            privacy_please: int(&query.privacy_please) != 0,
            game_uuid: query
                .game_uuid
                .as_deref()
                .map(|v| clean_field(v, SHORT_COLUMN))
                .filter(|u| !u.is_empty()),
        }
    }

    pub fn ip_string(&self) -> String {
        self.ip.to_string()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_cmd == "gameOver"
    }
}

#[cfg(test)]
pub(crate) fn sample_report(ip: &str, port: i32) -> ServerReport {
    ServerReport {
        ip: ip.parse().unwrap(),
        port,
        glest_version: "v3.9.1".to_string(),
        platform: "Linux".to_string(),
        binary_compile_date: "Jan 1 2015".to_string(),
        server_title: "Friday night".to_string(),
        tech: "megapack".to_string(),
        map: "conflict".to_string(),
        tileset: "forest".to_string(),
        active_slots: 4,
        network_slots: 4,
        connected_clients: 1,
        status: 0,
        game_cmd: String::new(),
        privacy_please: false,
        game_uuid: None,
    }
}
