//! In-process store used by tests; mirrors the keys and upsert rules of the MySQL schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::Store;
use crate::models::catalog::{CatalogEntry, CatalogKind};
use crate::models::server::{ServerRecord, ServerReport};
use crate::models::stats::{
    ControlType, GameStats, GameStatsReport, Period, PlayerRanking, PlayerStats, PlayerStatsReport,
    UpsertOutcome,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    servers: Vec<ServerRecord>,
    games: HashMap<String, GameStats>,
    players: Vec<PlayerStats>,
    catalogs: Vec<(CatalogKind, CatalogEntry)>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(&self, ip: &str, port: i32) -> Option<ServerRecord> {
        let tables = self.tables.lock().unwrap();
        tables
            .servers
            .iter()
            .find(|s| s.ip == ip && s.external_server_port == port)
            .cloned()
    }

    pub fn server_count(&self) -> usize {
        self.tables.lock().unwrap().servers.len()
    }

    pub fn player_rows(&self, game_uuid: &str) -> Vec<PlayerStats> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<PlayerStats> = tables
            .players
            .iter()
            .filter(|p| p.game_uuid == game_uuid)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.faction_index);
        rows
    }

    pub fn game_row(&self, game_uuid: &str) -> Option<GameStats> {
        self.tables.lock().unwrap().games.get(game_uuid).cloned()
    }

    /// Moves a server's `lasttime` into the past.
    pub fn backdate_server(&self, ip: &str, port: i32, by: chrono::Duration) {
        let mut tables = self.tables.lock().unwrap();
        for s in tables.servers.iter_mut() {
            if s.ip == ip && s.external_server_port == port {
                s.lasttime = s.lasttime - by;
            }
        }
    }

    pub fn set_server_status(&self, ip: &str, port: i32, status: i32) {
        let mut tables = self.tables.lock().unwrap();
        for s in tables.servers.iter_mut() {
            if s.ip == ip && s.external_server_port == port {
                s.status = status;
            }
        }
    }

    pub fn insert_player_row(&self, row: PlayerStats) {
        self.tables.lock().unwrap().players.push(row);
    }

    pub fn add_catalog_entry(&self, kind: CatalogKind, entry: CatalogEntry) {
        self.tables.lock().unwrap().catalogs.push((kind, entry));
    }

    fn upsert_server(&self, report: &ServerReport, country: Option<&str>) {
        let mut tables = self.tables.lock().unwrap();
        let ip = report.ip_string();
        let now = Utc::now();

        if let Some(existing) = tables
            .servers
            .iter_mut()
            .find(|s| s.ip == ip && s.external_server_port == report.port)
        {
            existing.glest_version = report.glest_version.clone();
            existing.platform = report.platform.clone();
            existing.binary_compile_date = report.binary_compile_date.clone();
            existing.server_title = report.server_title.clone();
            existing.tech = report.tech.clone();
            existing.map = report.map.clone();
            existing.tileset = report.tileset.clone();
            existing.active_slots = report.active_slots;
            existing.network_slots = report.network_slots;
            existing.connected_clients = report.connected_clients;
            existing.status = report.status;
            existing.game_uuid = report.game_uuid.clone();
            existing.lasttime = now.max(existing.lasttime);
            if let Some(country) = country {
                existing.country = country.to_string();
            }
            return;
        }

        tables.next_id += 1;
        let id = tables.next_id;
        tables.servers.push(ServerRecord {
            id,
            glest_version: report.glest_version.clone(),
            platform: report.platform.clone(),
            binary_compile_date: report.binary_compile_date.clone(),
            server_title: report.server_title.clone(),
            ip,
            external_server_port: report.port,
            tech: report.tech.clone(),
            map: report.map.clone(),
            tileset: report.tileset.clone(),
            active_slots: report.active_slots,
            network_slots: report.network_slots,
            connected_clients: report.connected_clients,
            country: country.unwrap_or_default().to_string(),
            status: report.status,
            game_uuid: report.game_uuid.clone(),
            lasttime: now,
            game_frames: None,
        });
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn reap_stale(&self, max_age: Duration) -> anyhow::Result<u64> {
        let cutoff = Utc::now() - chrono::Duration::from_std(max_age)?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.servers.len();
        tables.servers.retain(|s| s.lasttime >= cutoff);
        Ok((before - tables.servers.len()) as u64)
    }

    async fn server_exists(&self, ip: &str, port: i32) -> anyhow::Result<bool> {
        Ok(self.server(ip, port).is_some())
    }

    async fn remove_server(&self, ip: &str, port: i32) -> anyhow::Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.servers.len();
        tables
            .servers
            .retain(|s| !(s.ip == ip && s.external_server_port == port));
        Ok((before - tables.servers.len()) as u64)
    }

    async fn refresh_server(&self, report: &ServerReport) -> anyhow::Result<()> {
        self.upsert_server(report, None);
        Ok(())
    }

    async fn admit_server(&self, report: &ServerReport, country: &str) -> anyhow::Result<()> {
        self.upsert_server(report, Some(country));
        Ok(())
    }

    async fn list_servers(&self) -> anyhow::Result<Vec<ServerRecord>> {
        let tables = self.tables.lock().unwrap();
        let mut servers: Vec<ServerRecord> = tables
            .servers
            .iter()
            .map(|s| {
                let mut s = s.clone();
                s.game_frames = s
                    .game_uuid
                    .as_ref()
                    .and_then(|uuid| tables.games.get(uuid))
                    .map(|g| g.frames_to_calculate_playtime);
                s
            })
            .collect();
        servers.sort_by(|a, b| b.lasttime.cmp(&a.lasttime));
        Ok(servers)
    }

    async fn finished_game_listed(&self, game_uuid: &str) -> anyhow::Result<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .servers
            .iter()
            .any(|s| s.game_uuid.as_deref() == Some(game_uuid) && s.status == 3))
    }

    async fn purge_game(&self, game_uuid: &str) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .servers
            .retain(|s| s.game_uuid.as_deref() != Some(game_uuid));
        tables.games.remove(game_uuid);
        tables.players.retain(|p| p.game_uuid != game_uuid);
        Ok(())
    }

    async fn upsert_game_stats(&self, report: &GameStatsReport) -> anyhow::Result<UpsertOutcome> {
        let mut tables = self.tables.lock().unwrap();
        let row = GameStats {
            game_uuid: report.game_uuid.clone(),
            tech: report.tech.clone(),
            faction_count: report.faction_count,
            frames_played: report.frames_played,
            frames_to_calculate_playtime: report.frames_to_calculate_playtime,
            max_concurrent_unit_count: report.max_concurrent_unit_count,
            total_end_game_concurrent_unit_count: report.total_end_game_concurrent_unit_count,
            is_headless_server: report.is_headless_server,
            lasttime: Utc::now(),
        };
        Ok(match tables.games.insert(report.game_uuid.clone(), row) {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        })
    }

    async fn upsert_player_stats(
        &self,
        game_uuid: &str,
        report: &PlayerStatsReport,
    ) -> anyhow::Result<UpsertOutcome> {
        let mut tables = self.tables.lock().unwrap();
        let row = PlayerStats {
            game_uuid: game_uuid.to_string(),
            faction_index: report.faction_index,
            control_type: report.control_type,
            resource_multiplier: report.resource_multiplier,
            faction_type_name: report.faction_type_name.clone(),
            personality_type: report.personality_type,
            team_index: report.team_index,
            won_game: report.won_game,
            kill_count: report.kill_count,
            enemy_kill_count: report.enemy_kill_count,
            death_count: report.death_count,
            units_produced_count: report.units_produced_count,
            resource_harvested_count: report.resource_harvested_count,
            player_name: report.player_name.clone(),
            quit_before_game_end: report.quit_before_game_end,
            quit_time: report.quit_time,
            player_uuid: report.player_uuid.clone(),
            platform: report.platform.clone(),
            lasttime: Utc::now(),
        };

        match tables
            .players
            .iter()
            .position(|p| p.game_uuid == game_uuid && p.faction_index == report.faction_index)
        {
            Some(index) => {
                tables.players[index] = row;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                tables.players.push(row);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn game_stats(&self, game_uuid: &str) -> anyhow::Result<Option<GameStats>> {
        Ok(self.game_row(game_uuid))
    }

    async fn player_stats(&self, game_uuid: &str) -> anyhow::Result<Vec<PlayerStats>> {
        Ok(self.player_rows(game_uuid))
    }

    async fn top_players(&self, period: Period, limit: i64) -> anyhow::Result<Vec<PlayerRanking>> {
        let since: Option<DateTime<Utc>> = period.since(Utc::now());
        let tables = self.tables.lock().unwrap();

        let mut counts: HashMap<String, i64> = HashMap::new();
        for p in tables.players.iter() {
            if !ControlType::HUMAN_CODES.contains(&p.control_type) {
                continue;
            }
            if since.is_some_and(|since| p.lasttime < since) {
                continue;
            }
            *counts.entry(p.player_name.clone()).or_default() += 1;
        }

        let mut ranking: Vec<PlayerRanking> = counts
            .into_iter()
            .filter(|(_, games)| *games > 1)
            .map(|(player_name, games_played)| PlayerRanking {
                player_name,
                games_played,
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.games_played
                .cmp(&a.games_played)
                .then_with(|| a.player_name.cmp(&b.player_name))
        });
        ranking.truncate(limit.max(0) as usize);
        Ok(ranking)
    }

    async fn catalog(&self, kind: CatalogKind) -> anyhow::Result<Vec<CatalogEntry>> {
        let tables = self.tables.lock().unwrap();
        let mut entries: Vec<CatalogEntry> = tables
            .catalogs
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, e)| e.clone())
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
