use axum::{
    extract::State,
    routing::get,
    Router,
};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod handlers;
mod models;
mod utils;
mod bg_task;
mod services;
mod store;

use config::Config;
use services::geo::GeoLocator;
use store::{MySqlStore, Store};

// Application State
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub geo: GeoLocator,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::server::add_server_info,
        handlers::server::list_servers_html,
        handlers::server::list_servers_legacy,
        handlers::server::list_servers_json,
        handlers::stats::add_game_stats,
        handlers::stats::show_game_stats,
        handlers::players::show_players,
        handlers::catalog::list_maps,
        handlers::catalog::list_techs,
        handlers::catalog::list_tilesets,
        handlers::catalog::list_scenarios,
    ),
    components(schemas(models::server::ServerListing)),
    tags((name = "masterserver", description = "Game server registry and match statistics"))
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("Invalid configuration");
    let pool = db::establish_connection(&config)
        .await
        .expect("Failed to create pool");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    if config.public_address().is_none() {
        tracing::warn!("PUBLIC_IP is not set and SERVER_HOST is not a public address; private reporters are listed under their LAN address");
    }

    let geo = GeoLocator::from_path(config.geoip_database.as_deref());
    if !geo.is_enabled() {
        tracing::info!("No GeoIP database, server countries stay empty");
    }
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .expect("Invalid address");

    let state = Arc::new(AppState {
        store: Arc::new(MySqlStore::new(pool)),
        config,
        geo,
    });

    let task_state = state.clone();
    tokio::spawn(async move {
        crate::bg_task::start_background_task(task_state).await;
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/addServerInfo.php", get(handlers::server::add_server_info))
        .route("/showServers.php", get(handlers::server::list_servers_html))
        .route("/showServersForGlest.php", get(handlers::server::list_servers_legacy))
        .route("/showServersJson.php", get(handlers::server::list_servers_json))
        .route("/addGameStats.php", get(handlers::stats::add_game_stats))
        .route("/showGameStats.php", get(handlers::stats::show_game_stats))
        .route("/showPlayers.php", get(handlers::players::show_players))
        .route("/showMapsForGlest.php", get(handlers::catalog::list_maps))
        .route("/showTechsForGlest.php", get(handlers::catalog::list_techs))
        .route("/showTilesetsForGlest.php", get(handlers::catalog::list_tilesets))
        .route("/showScenariosForGlest.php", get(handlers::catalog::list_scenarios))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind");
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .expect("Server error");
}

async fn root(State(state): State<Arc<AppState>>) -> String {
    format!("{} Masterserver", state.config.product_name)
}
