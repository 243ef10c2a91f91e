use async_trait::async_trait;
use sqlx::MySqlPool;
use std::time::Duration;

use super::Store;
use crate::models::catalog::{CatalogEntry, CatalogKind};
use crate::models::server::{ServerRecord, ServerReport};
use crate::models::stats::{
    ControlType, GameStats, GameStatsReport, Period, PlayerRanking, PlayerStats, PlayerStatsReport,
    UpsertOutcome,
};

const SERVER_UPSERT: &str = "INSERT INTO glestserver \
    (glest_version, platform, binary_compile_date, server_title, ip, external_server_port, tech, map, tileset, \
     active_slots, network_slots, connected_clients, country, status, game_uuid, lasttime) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(3)) \
    ON DUPLICATE KEY UPDATE \
    glest_version = VALUES(glest_version), platform = VALUES(platform), \
    binary_compile_date = VALUES(binary_compile_date), server_title = VALUES(server_title), \
    tech = VALUES(tech), map = VALUES(map), tileset = VALUES(tileset), \
    active_slots = VALUES(active_slots), network_slots = VALUES(network_slots), \
    connected_clients = VALUES(connected_clients), status = VALUES(status), \
    game_uuid = VALUES(game_uuid), lasttime = NOW(3)";

const GAME_STATS_UPSERT: &str = "INSERT INTO glestgamestats \
    (game_uuid, tech, faction_count, frames_played, frames_to_calculate_playtime, \
     max_concurrent_unit_count, total_end_game_concurrent_unit_count, is_headless_server, lasttime) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, NOW(3)) \
    ON DUPLICATE KEY UPDATE \
    tech = VALUES(tech), faction_count = VALUES(faction_count), frames_played = VALUES(frames_played), \
    frames_to_calculate_playtime = VALUES(frames_to_calculate_playtime), \
    max_concurrent_unit_count = VALUES(max_concurrent_unit_count), \
    total_end_game_concurrent_unit_count = VALUES(total_end_game_concurrent_unit_count), \
    is_headless_server = VALUES(is_headless_server), reports = reports + 1, lasttime = NOW(3)";

const PLAYER_STATS_UPSERT: &str = "INSERT INTO glestgameplayerstats \
    (game_uuid, faction_index, control_type, resource_multiplier, faction_type_name, personality_type, \
     team_index, won_game, kill_count, enemy_kill_count, death_count, units_produced_count, \
     resource_harvested_count, player_name, quit_before_game_end, quit_time, player_uuid, platform, lasttime) \
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(3)) \
    ON DUPLICATE KEY UPDATE \
    control_type = VALUES(control_type), resource_multiplier = VALUES(resource_multiplier), \
    faction_type_name = VALUES(faction_type_name), personality_type = VALUES(personality_type), \
    team_index = VALUES(team_index), won_game = VALUES(won_game), kill_count = VALUES(kill_count), \
    enemy_kill_count = VALUES(enemy_kill_count), death_count = VALUES(death_count), \
    units_produced_count = VALUES(units_produced_count), \
    resource_harvested_count = VALUES(resource_harvested_count), player_name = VALUES(player_name), \
    quit_before_game_end = VALUES(quit_before_game_end), quit_time = VALUES(quit_time), \
    player_uuid = VALUES(player_uuid), platform = VALUES(platform), reports = reports + 1, lasttime = NOW(3)";

pub struct MySqlStore {
    pub db: MySqlPool,
}

impl MySqlStore {
    pub fn new(db: MySqlPool) -> Self {
        Self { db }
    }

    async fn upsert_server(&self, report: &ServerReport, country: Option<&str>) -> anyhow::Result<()> {
        let sql = match country {
            Some(_) => format!("{}, country = VALUES(country)", SERVER_UPSERT),
            None => SERVER_UPSERT.to_string(),
        };

        sqlx::query(&sql)
            .bind(&report.glest_version)
            .bind(&report.platform)
            .bind(&report.binary_compile_date)
            .bind(&report.server_title)
            .bind(report.ip_string())
            .bind(report.port)
            .bind(&report.tech)
            .bind(&report.map)
            .bind(&report.tileset)
            .bind(report.active_slots)
            .bind(report.network_slots)
            .bind(report.connected_clients)
            .bind(country.unwrap_or_default())
            .bind(report.status)
            .bind(&report.game_uuid)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

// ON DUPLICATE KEY UPDATE reports 1 affected row for an insert and 2 for an update.
// sqlx connects with CLIENT_FOUND_ROWS, where an update that changes nothing also
// reports 1, so the stats upserts always bump `reports`.
fn upsert_outcome(rows_affected: u64) -> UpsertOutcome {
    if rows_affected == 1 {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn reap_stale(&self, max_age: Duration) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM glestserver WHERE lasttime < DATE_SUB(NOW(3), INTERVAL ? SECOND)")
            .bind(max_age.as_secs() as i64)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn server_exists(&self, ip: &str, port: i32) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM glestserver WHERE ip = ? AND external_server_port = ?",
        )
        .bind(ip)
        .bind(port)
        .fetch_one(&self.db)
        .await?;
        Ok(count > 0)
    }

    async fn remove_server(&self, ip: &str, port: i32) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM glestserver WHERE ip = ? AND external_server_port = ?")
            .bind(ip)
            .bind(port)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn refresh_server(&self, report: &ServerReport) -> anyhow::Result<()> {
        self.upsert_server(report, None).await
    }

    async fn admit_server(&self, report: &ServerReport, country: &str) -> anyhow::Result<()> {
        self.upsert_server(report, Some(country)).await
    }

    async fn list_servers(&self) -> anyhow::Result<Vec<ServerRecord>> {
        let servers = sqlx::query_as::<_, ServerRecord>(
            "SELECT s.*, g.frames_to_calculate_playtime AS game_frames FROM glestserver s \
             LEFT JOIN glestgamestats g ON g.game_uuid = s.game_uuid \
             ORDER BY s.lasttime DESC",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(servers)
    }

    async fn finished_game_listed(&self, game_uuid: &str) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM glestserver WHERE game_uuid = ? AND status = 3")
            .bind(game_uuid)
            .fetch_one(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn purge_game(&self, game_uuid: &str) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await?;
        for table in ["glestserver", "glestgamestats", "glestgameplayerstats"] {
            sqlx::query(&format!("DELETE FROM {} WHERE game_uuid = ?", table))
                .bind(game_uuid)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn upsert_game_stats(&self, report: &GameStatsReport) -> anyhow::Result<UpsertOutcome> {
        let result = sqlx::query(GAME_STATS_UPSERT)
            .bind(&report.game_uuid)
            .bind(&report.tech)
            .bind(report.faction_count)
            .bind(report.frames_played)
            .bind(report.frames_to_calculate_playtime)
            .bind(report.max_concurrent_unit_count)
            .bind(report.total_end_game_concurrent_unit_count)
            .bind(report.is_headless_server)
            .execute(&self.db)
            .await?;
        Ok(upsert_outcome(result.rows_affected()))
    }

    async fn upsert_player_stats(
        &self,
        game_uuid: &str,
        report: &PlayerStatsReport,
    ) -> anyhow::Result<UpsertOutcome> {
        let result = sqlx::query(PLAYER_STATS_UPSERT)
            .bind(game_uuid)
            .bind(report.faction_index)
            .bind(report.control_type)
            .bind(report.resource_multiplier)
            .bind(&report.faction_type_name)
            .bind(report.personality_type)
            .bind(report.team_index)
            .bind(report.won_game)
            .bind(report.kill_count)
            .bind(report.enemy_kill_count)
            .bind(report.death_count)
            .bind(report.units_produced_count)
            .bind(report.resource_harvested_count)
            .bind(&report.player_name)
            .bind(report.quit_before_game_end)
            .bind(report.quit_time)
            .bind(&report.player_uuid)
            .bind(&report.platform)
            .execute(&self.db)
            .await?;
        Ok(upsert_outcome(result.rows_affected()))
    }

    async fn game_stats(&self, game_uuid: &str) -> anyhow::Result<Option<GameStats>> {
        let stats = sqlx::query_as::<_, GameStats>("SELECT * FROM glestgamestats WHERE game_uuid = ?")
            .bind(game_uuid)
            .fetch_optional(&self.db)
            .await?;
        Ok(stats)
    }

    async fn player_stats(&self, game_uuid: &str) -> anyhow::Result<Vec<PlayerStats>> {
        let players = sqlx::query_as::<_, PlayerStats>(
            "SELECT * FROM glestgameplayerstats WHERE game_uuid = ? ORDER BY faction_index",
        )
        .bind(game_uuid)
        .fetch_all(&self.db)
        .await?;
        Ok(players)
    }

    async fn top_players(&self, period: Period, limit: i64) -> anyhow::Result<Vec<PlayerRanking>> {
        let since = period.since(chrono::Utc::now());
        let humans = ControlType::HUMAN_CODES
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "SELECT player_name, COUNT(*) AS games_played FROM glestgameplayerstats \
             WHERE control_type IN ({}) AND (? IS NULL OR lasttime >= ?) \
             GROUP BY player_name HAVING games_played > 1 \
             ORDER BY games_played DESC, player_name LIMIT ?",
            humans
        );

        let players = sqlx::query_as::<_, PlayerRanking>(&sql)
            .bind(since)
            .bind(since)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        Ok(players)
    }

    async fn catalog(&self, kind: CatalogKind) -> anyhow::Result<Vec<CatalogEntry>> {
        let sql = format!(
            "SELECT name, min_glest_version, crc, description, url, image_url, disabled FROM {} ORDER BY name",
            kind.table()
        );
        let entries = sqlx::query_as::<_, CatalogEntry>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(entries)
    }
}
