use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::config::Config;
use crate::handlers::{reap_stale, store_failure};
use crate::models::SHORT_COLUMN;
use crate::models::stats::{ControlType, GameStats, GameStatsReport, PlayerStats};
use crate::services::stats::{ingest, Leaders};
use crate::utils::{clean_field, frames_to_time_string, html};
use crate::AppState;

/// Per-faction parameters are sent as `<field>_<N>`, so the query is taken as a plain map.
#[utoipa::path(
    get,
    path = "/addGameStats.php",
    params(
        ("gameUUID" = String, Query, description = "Game the report belongs to"),
        ("framesToCalculatePlaytime" = Option<i32>, Query, description = "Frames played, 40 per second")
    ),
    responses(
        (status = 200, description = "Concatenated `OK1a`/`OK2b`/`OK1b<N>`/`OK2b<N>` tokens, or `OK - <minutes>` for a purged game", body = String, content_type = "text/plain"),
        (status = 500, description = "Database error")
    )
)]
pub async fn add_game_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(e) = reap_stale(&state).await {
        return store_failure("Removing stale servers", e);
    }

    let Some(report) = GameStatsReport::from_params(&params) else {
        return (StatusCode::OK, String::new()).into_response();
    };

    match ingest(state.store.as_ref(), &state.config, &report).await {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => store_failure("Storing game stats", e),
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GameStatsQuery {
    #[serde(rename = "gameUUID")]
    pub game_uuid: Option<String>,
}

#[utoipa::path(
    get,
    path = "/showGameStats.php",
    params(GameStatsQuery),
    responses(
        (status = 200, description = "Match summary with per-player results", body = String, content_type = "text/html"),
        (status = 500, description = "Database error")
    )
)]
pub async fn show_game_stats(State(state): State<Arc<AppState>>, Query(query): Query<GameStatsQuery>) -> Response {
    if let Err(e) = reap_stale(&state).await {
        return store_failure("Removing stale servers", e);
    }

    let game_uuid = query
        .game_uuid
        .as_deref()
        .map(|v| clean_field(v, SHORT_COLUMN))
        .unwrap_or_default();
    if game_uuid.is_empty() {
        return Html(render_missing_game(&game_uuid, &state.config)).into_response();
    }

    let game = match state.store.game_stats(&game_uuid).await {
        Ok(Some(game)) => game,
        Ok(None) => return Html(render_missing_game(&game_uuid, &state.config)).into_response(),
        Err(e) => return store_failure("Reading game stats", e),
    };

    match state.store.player_stats(&game_uuid).await {
        Ok(players) => Html(render_game_page(&game, &players, &state.config)).into_response(),
        Err(e) => store_failure("Reading player stats", e),
    }
}

fn render_missing_game(game_uuid: &str, config: &Config) -> String {
    let body = if game_uuid.is_empty() {
        "\t\t<p>No game was given.</p>\n".to_string()
    } else {
        format!("\t\t<p>No stats recorded for game {}.</p>\n", html::escape(game_uuid))
    };
    html::page(&format!("{} game stats", config.product_name), &body)
}

pub fn render_game_page(game: &GameStats, players: &[PlayerStats], config: &Config) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "\t\t<h1>{} game {}</h1>\n",
        html::escape(&config.product_name),
        html::escape(&game.game_uuid)
    ));

    body.push_str("\t\t<table>\n");
    html::header_row(
        &mut body,
        &[
            ("Techtree", "Techtree"),
            ("Number of factions", "Factions"),
            ("Time played", "Duration"),
            ("Frames played", "Frames"),
            ("Most units alive at once", "Max units"),
            ("Units alive at the end", "End units"),
            ("Hosted by a headless server", "Headless"),
            ("Last update", "Recorded"),
        ],
    );
    body.push_str("\t\t\t<tr>\n");
    html::cell(&mut body, &game.tech);
    html::cell(&mut body, game.faction_count);
    html::cell(&mut body, frames_to_time_string(game.frames_to_calculate_playtime as i64));
    html::cell(&mut body, game.frames_played);
    html::cell(&mut body, game.max_concurrent_unit_count);
    html::cell(&mut body, game.total_end_game_concurrent_unit_count);
    html::cell(&mut body, if game.is_headless_server { "yes" } else { "no" });
    html::cell(&mut body, game.lasttime.format("%Y-%m-%d %H:%M:%S"));
    body.push_str("\t\t\t</tr>\n\t\t</table>\n");

    if players.is_empty() {
        body.push_str("\t\t<p>No player stats recorded.</p>\n");
        return html::page(&format!("{} game stats", config.product_name), &body);
    }

    let leaders = Leaders::of(players);

    body.push_str("\t\t<table>\n");
    html::header_row(
        &mut body,
        &[
            ("Faction index", "#"),
            ("Player name", "Player"),
            ("Who controls the faction", "Control"),
            ("Faction type", "Faction"),
            ("Team", "Team"),
            ("Won the game", "Result"),
            ("Units killed", "Kills"),
            ("Enemy units killed", "Enemy kills"),
            ("Units lost", "Deaths"),
            ("Units produced", "Produced"),
            ("Resources harvested", "Harvested"),
            ("Enemy kills x100 + units produced x50 + resources harvested / 10", "Score"),
            ("Left before the end", "Quit"),
            ("Resource multiplier", "Multiplier"),
            ("Operating system of the player", "Platform"),
        ],
    );

    for p in players {
        body.push_str("\t\t\t<tr>\n");
        html::cell(&mut body, p.faction_index);
        html::classed_cell(
            &mut body,
            if p.won_game { "player_winner" } else { "player_loser" },
            &p.player_name,
        );
        html::cell(&mut body, ControlType::title_for(p.control_type));
        html::cell(&mut body, &p.faction_type_name);
        html::cell(&mut body, p.team_index);
        html::cell(&mut body, if p.won_game { "won" } else { "lost" });
        html::cell(&mut body, p.kill_count);
        highlighted_cell(&mut body, p.enemy_kill_count as f64, leaders.enemy_kills as f64);
        html::cell(&mut body, p.death_count);
        highlighted_cell(&mut body, p.units_produced_count as f64, leaders.units_produced as f64);
        highlighted_cell(&mut body, p.resource_harvested_count as f64, leaders.resources_harvested as f64);
        highlighted_cell(&mut body, p.score(), leaders.score);
        html::cell(
            &mut body,
            if p.quit_before_game_end {
                frames_to_time_string(p.quit_time as i64)
            } else {
                String::new()
            },
        );
        html::cell(&mut body, p.resource_multiplier);
        html::cell(&mut body, &p.platform);
        body.push_str("\t\t\t</tr>\n");
    }
    body.push_str("\t\t</table>\n");

    html::page(&format!("{} game stats", config.product_name), &body)
}

/// Marks the game's best value in a column; nobody leads a column of zeros.
fn highlighted_cell(out: &mut String, value: f64, leader: f64) {
    if value > 0.0 && value == leader {
        html::classed_cell(out, "best", value);
    } else {
        html::cell(out, value);
    }
}
