use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::config::Config;
use crate::handlers::{reap_stale, store_failure};
use crate::models::server::{GameStatus, ServerListing, ServerRecord, ServerReport, ServerReportQuery};
use crate::services::registration::{advertised_ip, register};
use crate::utils::html;
use crate::AppState;

#[utoipa::path(
    get,
    path = "/addServerInfo.php",
    params(ServerReportQuery),
    responses(
        (status = 200, description = "`OK`, or why the server could not be reached", body = String, content_type = "text/plain"),
        (status = 500, description = "Database error")
    )
)]
pub async fn add_server_info(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<ServerReportQuery>,
) -> Response {
    if let Err(e) = reap_stale(&state).await {
        return store_failure("Removing stale servers", e);
    }

    let reporter = reporter_ip(&headers, peer, state.config.trust_forwarded_for);
    let ip = advertised_ip(reporter, state.config.public_address());
    let report = ServerReport::from_query(&query, ip, state.config.default_game_port);

    match register(state.store.as_ref(), &state.geo, &state.config, &report).await {
        Ok(outcome) => (StatusCode::OK, outcome.body()).into_response(),
        Err(e) => store_failure("Registering server", e),
    }
}

/// Peer address, or the first `X-Forwarded-For` hop when the service sits behind a proxy.
fn reporter_ip(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> IpAddr {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }
    peer.ip()
}

async fn current_servers(state: &AppState) -> Result<Vec<ServerRecord>, Response> {
    if let Err(e) = reap_stale(state).await {
        return Err(store_failure("Removing stale servers", e));
    }
    state
        .store
        .list_servers()
        .await
        .map_err(|e| store_failure("Listing servers", e))
}

#[utoipa::path(
    get,
    path = "/showServers.php",
    responses(
        (status = 200, description = "Server list as an HTML page", body = String, content_type = "text/html"),
        (status = 500, description = "Database error")
    )
)]
pub async fn list_servers_html(State(state): State<Arc<AppState>>) -> Response {
    match current_servers(&state).await {
        Ok(servers) => Html(render_server_page(&servers, &state.config)).into_response(),
        Err(response) => response,
    }
}

#[utoipa::path(
    get,
    path = "/showServersForGlest.php",
    responses(
        (status = 200, description = "One pipe-delimited line per server", body = String, content_type = "text/plain"),
        (status = 500, description = "Database error")
    )
)]
pub async fn list_servers_legacy(State(state): State<Arc<AppState>>) -> Response {
    match current_servers(&state).await {
        Ok(servers) => (StatusCode::OK, render_legacy_list(&servers)).into_response(),
        Err(response) => response,
    }
}

#[utoipa::path(
    get,
    path = "/showServersJson.php",
    responses(
        (status = 200, description = "Servers, most recently seen first", body = Vec<ServerListing>),
        (status = 500, description = "Database error")
    )
)]
pub async fn list_servers_json(State(state): State<Arc<AppState>>) -> Response {
    match current_servers(&state).await {
        Ok(servers) => {
            let listings: Vec<ServerListing> = servers.into_iter().map(ServerListing::from).collect();
            (StatusCode::OK, Json(listings)).into_response()
        }
        Err(response) => response,
    }
}

pub fn render_legacy_list(servers: &[ServerRecord]) -> String {
    let mut out = String::new();
    for s in servers {
        out.push_str(&format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|\n",
            s.glest_version,
            s.platform,
            s.binary_compile_date,
            s.server_title,
            s.ip,
            s.tech,
            s.map,
            s.tileset,
            s.active_slots,
            s.network_slots,
            s.connected_clients,
            s.external_server_port,
            s.country,
            s.effective_status(),
        ));
    }
    out
}

pub fn render_server_page(servers: &[ServerRecord], config: &Config) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "\t\t<h1><a href=\"{}\">{}</a> game servers</h1>\n",
        html::escape(&config.product_url),
        html::escape(&config.product_name)
    ));

    if servers.is_empty() {
        body.push_str("\t\t<p>No servers are online right now.</p>\n");
        return html::page(&format!("{} servers", config.product_name), &body);
    }

    body.push_str("\t\t<table>\n");
    html::header_row(
        &mut body,
        &[
            ("Version of the game server", "Version"),
            ("Name of the game server", "Title"),
            ("Country of the game server", "Country"),
            ("Game status", "Status"),
            ("Time played so far", "Duration"),
            ("Techtree", "Techtree"),
            ("Map", "Map"),
            ("Tileset", "Tileset"),
            ("Slots in use by any player or AI", "Active"),
            ("Slots open for network players", "Network"),
            ("Network players connected", "Connected"),
            ("Address of the game server", "IP"),
            ("Port of the game server", "Port"),
            ("Operating system of the game server", "Platform"),
            ("Build date of the game server", "Build"),
            ("Last report from the game server", "Last seen"),
        ],
    );

    for s in servers {
        let status = s.effective_status();
        let label = GameStatus::from_code(status)
            .map(GameStatus::label)
            .unwrap_or("unknown");

        body.push_str("\t\t\t<tr>\n");
        html::cell(&mut body, &s.glest_version);
        html::cell(&mut body, &s.server_title);
        html::cell(&mut body, &s.country);
        html::classed_cell(&mut body, &format!("status_{}", status), label);
        html::cell(&mut body, s.game_duration().unwrap_or_default());
        html::cell(&mut body, &s.tech);
        html::cell(&mut body, &s.map);
        html::cell(&mut body, &s.tileset);
        html::cell(&mut body, s.active_slots);
        html::cell(&mut body, s.network_slots);
        html::cell(&mut body, s.connected_clients);
        html::cell(&mut body, &s.ip);
        html::cell(&mut body, s.external_server_port);
        html::cell(&mut body, &s.platform);
        html::cell(&mut body, &s.binary_compile_date);
        html::cell(&mut body, s.lasttime.format("%Y-%m-%d %H:%M:%S"));
        body.push_str("\t\t\t</tr>\n");
    }
    body.push_str("\t\t</table>\n");

    html::page(&format!("{} servers", config.product_name), &body)
}
