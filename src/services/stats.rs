use crate::config::Config;
use crate::models::stats::{GameStatsReport, PlayerStats, UpsertOutcome};
use crate::store::Store;

/// Stores a stats report and returns the status tokens for the reporter.
///
/// A finished game that ended quickly is dropped entirely instead: its
/// listing, game row and player rows are deleted and `OK - <minutes>` returned.
pub async fn ingest(store: &dyn Store, config: &Config, report: &GameStatsReport) -> anyhow::Result<String> {
    let duration = report.duration_minutes();

    if duration < config.completed_game_max_minutes && store.finished_game_listed(&report.game_uuid).await? {
        store.purge_game(&report.game_uuid).await?;
        tracing::info!("Purged finished game {} after {:.2} minutes", report.game_uuid, duration);
        return Ok(format!("OK - {}", duration));
    }

    let mut body = String::new();
    body.push_str(match store.upsert_game_stats(report).await? {
        UpsertOutcome::Updated => "OK1a",
        UpsertOutcome::Inserted => "OK2b",
    });

    for faction in &report.factions {
        let token = match store.upsert_player_stats(&report.game_uuid, faction).await? {
            UpsertOutcome::Updated => "OK1b",
            UpsertOutcome::Inserted => "OK2b",
        };
        body.push_str(&format!("{}{}", token, faction.slot));
    }

    tracing::debug!("Stats for game {}: {}", report.game_uuid, body);
    Ok(body)
}

/// Best value of each highlighted column across a game's players.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Leaders {
    pub enemy_kills: i32,
    pub units_produced: i32,
    pub resources_harvested: i32,
    pub score: f64,
}

impl Leaders {
    pub fn of(players: &[PlayerStats]) -> Self {
        players.iter().fold(Self::default(), |best, p| Self {
            enemy_kills: best.enemy_kills.max(p.enemy_kill_count),
            units_produced: best.units_produced.max(p.units_produced_count),
            resources_harvested: best.resources_harvested.max(p.resource_harvested_count),
            score: best.score.max(p.score()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::server::sample_report;
    use crate::store::memory::MemoryStore;
    use chrono::Utc;
    use std::collections::HashMap;

    fn report(pairs: &[(&str, &str)]) -> GameStatsReport {
        let params: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        GameStatsReport::from_params(&params).unwrap()
    }

    fn player(name: &str, enemy_kills: i32, units: i32, resources: i32) -> PlayerStats {
        PlayerStats {
            game_uuid: "abc123".into(),
            faction_index: 0,
            control_type: 5,
            resource_multiplier: 1.0,
            faction_type_name: "romans".into(),
            personality_type: 0,
            team_index: 0,
            won_game: false,
            kill_count: 0,
            enemy_kill_count: enemy_kills,
            death_count: 0,
            units_produced_count: units,
            resource_harvested_count: resources,
            player_name: name.into(),
            quit_before_game_end: false,
            quit_time: 0,
            player_uuid: String::new(),
            platform: "Linux".into(),
            lasttime: Utc::now(),
        }
    }

    #[tokio::test]
    async fn first_report_inserts_then_updates() {
        let store = MemoryStore::new();
        let config = Config::for_tests();

        let first = report(&[
            ("gameUUID", "abc123"),
            ("framesToCalculatePlaytime", "48000"),
            ("factionCount", "2"),
            ("playerName_0", "Alice"),
        ]);
        assert_eq!(ingest(&store, &config, &first).await.unwrap(), "OK2bOK2b0");

        let second = report(&[
            ("gameUUID", "abc123"),
            ("framesToCalculatePlaytime", "96000"),
            ("factionCount", "2"),
            ("playerName_0", "Alice"),
        ]);
        assert_eq!(ingest(&store, &config, &second).await.unwrap(), "OK1aOK1b0");

        let game = store.game_row("abc123").unwrap();
        assert_eq!(game.frames_to_calculate_playtime, 96000);
        assert_eq!(store.player_rows("abc123").len(), 1);
    }

    #[tokio::test]
    async fn factions_are_upserted_independently() {
        let store = MemoryStore::new();
        let config = Config::for_tests();

        let faction_zero = |kills: &'static str| {
            report(&[
                ("gameUUID", "abc123"),
                ("framesToCalculatePlaytime", "48000"),
                ("playerName_0", "Alice"),
                ("killCount_0", kills),
            ])
        };

        ingest(&store, &config, &faction_zero("3")).await.unwrap();
        let body = ingest(
            &store,
            &config,
            &report(&[
                ("gameUUID", "abc123"),
                ("framesToCalculatePlaytime", "48000"),
                ("playerName_1", "Bob"),
                ("killCount_1", "5"),
            ]),
        )
        .await
        .unwrap();
        assert_eq!(body, "OK1aOK2b1");

        let body = ingest(&store, &config, &faction_zero("9")).await.unwrap();
        assert_eq!(body, "OK1aOK1b0");

        let rows = store.player_rows("abc123");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].player_name, "Alice");
        assert_eq!(rows[0].kill_count, 9);
        assert_eq!(rows[1].player_name, "Bob");
        assert_eq!(rows[1].kill_count, 5);
    }

    #[tokio::test]
    async fn short_finished_game_is_purged() {
        let store = MemoryStore::new();
        let config = Config::for_tests();

        ingest(
            &store,
            &config,
            &report(&[("gameUUID", "abc123"), ("playerName_0", "Alice")]),
        )
        .await
        .unwrap();

        let mut listing = sample_report("203.0.113.5", 61357);
        listing.game_uuid = Some("abc123".into());
        store.admit_server(&listing, "").await.unwrap();
        store.set_server_status("203.0.113.5", 61357, 3);

        // 2400 frames is one minute of play.
        let body = ingest(
            &store,
            &config,
            &report(&[("gameUUID", "abc123"), ("framesToCalculatePlaytime", "2400")]),
        )
        .await
        .unwrap();

        assert_eq!(body, "OK - 1");
        assert_eq!(store.server_count(), 0);
        assert!(store.game_row("abc123").is_none());
        assert!(store.player_rows("abc123").is_empty());
    }

    #[tokio::test]
    async fn long_finished_game_is_kept() {
        let store = MemoryStore::new();
        let config = Config::for_tests();

        let mut listing = sample_report("203.0.113.5", 61357);
        listing.game_uuid = Some("abc123".into());
        store.admit_server(&listing, "").await.unwrap();
        store.set_server_status("203.0.113.5", 61357, 3);

        let body = ingest(
            &store,
            &config,
            &report(&[("gameUUID", "abc123"), ("framesToCalculatePlaytime", "48000")]),
        )
        .await
        .unwrap();

        assert_eq!(body, "OK2b");
        assert_eq!(store.server_count(), 1);
    }

    #[test]
    fn leaders_take_column_maxima() {
        let players = vec![
            player("Alice", 10, 5, 100),
            player("Bob", 2, 30, 50),
            player("Carol", 4, 1, 9000),
        ];
        let leaders = Leaders::of(&players);

        assert_eq!(leaders.enemy_kills, 10);
        assert_eq!(leaders.units_produced, 30);
        assert_eq!(leaders.resources_harvested, 9000);
        // Bob: 200 + 1500 + 5 beats Alice (1000 + 250 + 10) and Carol (400 + 50 + 900).
        assert_eq!(leaders.score, 1705.0);
    }

    #[test]
    fn leaders_of_empty_game() {
        assert_eq!(Leaders::of(&[]), Leaders::default());
    }
}
