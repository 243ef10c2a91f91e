use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::config::Config;
use crate::handlers::{reap_stale, store_failure};
use crate::models::stats::{Period, PlayerRanking};
use crate::utils::html;
use crate::AppState;

const TOP_PLAYERS: i64 = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlayersQuery {
    /// `day`, `week` or `month`; anything else means all time.
    pub period: Option<String>,
}

#[utoipa::path(
    get,
    path = "/showPlayers.php",
    params(PlayersQuery),
    responses(
        (status = 200, description = "Top human players by games played", body = String, content_type = "text/html"),
        (status = 500, description = "Database error")
    )
)]
pub async fn show_players(State(state): State<Arc<AppState>>, Query(query): Query<PlayersQuery>) -> Response {
    if let Err(e) = reap_stale(&state).await {
        return store_failure("Removing stale servers", e);
    }

    let period = Period::parse(query.period.as_deref());
    match state.store.top_players(period, TOP_PLAYERS).await {
        Ok(players) => Html(render_players_page(&players, period, &state.config)).into_response(),
        Err(e) => store_failure("Ranking players", e),
    }
}

pub fn render_players_page(players: &[PlayerRanking], period: Period, config: &Config) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "\t\t<h1>Top {} players ({})</h1>\n",
        html::escape(&config.product_name),
        period.label()
    ));

    body.push_str("\t\t<p>");
    let links: Vec<String> = [Period::Day, Period::Week, Period::Month, Period::AllTime]
        .into_iter()
        .map(|p| {
            let href = match p.query_value() {
                Some(value) => format!("showPlayers.php?period={}", value),
                None => "showPlayers.php".to_string(),
            };
            if p == period {
                format!("<b>{}</b>", p.label())
            } else {
                format!("<a href=\"{}\">{}</a>", href, p.label())
            }
        })
        .collect();
    body.push_str(&links.join(" | "));
    body.push_str("</p>\n");

    if players.is_empty() {
        body.push_str("\t\t<p>No player has more than one game in this period.</p>\n");
    } else {
        body.push_str("\t\t<table>\n");
        html::header_row(
            &mut body,
            &[
                ("Rank", "#"),
                ("Player name", "Player"),
                ("Games played", "Games"),
            ],
        );
        for (rank, p) in players.iter().enumerate() {
            body.push_str("\t\t\t<tr>\n");
            html::cell(&mut body, rank + 1);
            html::cell(&mut body, &p.player_name);
            html::cell(&mut body, p.games_played);
            body.push_str("\t\t\t</tr>\n");
        }
        body.push_str("\t\t</table>\n");
    }

    html::page(&format!("{} players", config.product_name), &body)
}
