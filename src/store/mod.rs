use async_trait::async_trait;
use std::time::Duration;

use crate::models::catalog::{CatalogEntry, CatalogKind};
use crate::models::server::{ServerRecord, ServerReport};
use crate::models::stats::{GameStats, GameStatsReport, Period, PlayerRanking, PlayerStats, PlayerStatsReport, UpsertOutcome};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlStore;

/// Everything the handlers read from or write to the database.
///
/// Server rows are unique per `(ip, port)`, game rows per `gameUUID` and player
/// rows per `(gameUUID, factionIndex)`; every write is a single atomic
/// statement against those keys.
#[async_trait]
pub trait Store: Send + Sync {
    /// Deletes servers that have not reported within `max_age`.
    async fn reap_stale(&self, max_age: Duration) -> anyhow::Result<u64>;

    async fn server_exists(&self, ip: &str, port: i32) -> anyhow::Result<bool>;

    async fn remove_server(&self, ip: &str, port: i32) -> anyhow::Result<u64>;

    /// Overwrites a listed server from a report; the stored country is kept.
    async fn refresh_server(&self, report: &ServerReport) -> anyhow::Result<()>;

    /// Lists a server that just passed the reachability probe.
    async fn admit_server(&self, report: &ServerReport, country: &str) -> anyhow::Result<()>;

    /// All servers, most recently seen first, with the linked game's frame count.
    async fn list_servers(&self) -> anyhow::Result<Vec<ServerRecord>>;

    /// Whether a server with this game is listed as finished.
    async fn finished_game_listed(&self, game_uuid: &str) -> anyhow::Result<bool>;

    /// Deletes the server, game and player rows of a game.
    async fn purge_game(&self, game_uuid: &str) -> anyhow::Result<()>;

    async fn upsert_game_stats(&self, report: &GameStatsReport) -> anyhow::Result<UpsertOutcome>;

    async fn upsert_player_stats(
        &self,
        game_uuid: &str,
        report: &PlayerStatsReport,
    ) -> anyhow::Result<UpsertOutcome>;

    async fn game_stats(&self, game_uuid: &str) -> anyhow::Result<Option<GameStats>>;

    /// Player rows of a game ordered by faction index.
    async fn player_stats(&self, game_uuid: &str) -> anyhow::Result<Vec<PlayerStats>>;

    /// Human players with more than one game in `period`, most games first.
    async fn top_players(&self, period: Period, limit: i64) -> anyhow::Result<Vec<PlayerRanking>>;

    async fn catalog(&self, kind: CatalogKind) -> anyhow::Result<Vec<CatalogEntry>>;
}
