use sqlx::mysql::MySqlPoolOptions;
use std::env;

const TABLES: &[&str] = &[
    "glestserver",
    "glestgamestats",
    "glestgameplayerstats",
    "glestmaps",
    "glesttechs",
    "glesttilesets",
    "glestscenarios",
    "_sqlx_migrations",
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    println!("Connecting to drop the masterserver tables...");

    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to server");

    for table in TABLES {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(&pool)
            .await
            .expect("Failed to drop table");
        println!("Dropped {}", table);
    }

    println!("Tables dropped; migrations will recreate them on next start.");
}
