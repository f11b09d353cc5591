use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};

use std::time::Duration;

/// Environment for the HTTP integration suite: a running hogar_api instance
/// and a reachable Postgres. Returns `None` when the environment is not
/// configured so the suite can skip itself.
pub async fn try_setup() -> Option<(Client, String, sqlx::PgPool)> {
    let _ = dotenv::dotenv();
    if std::env::var("PORT").is_err() || std::env::var("DATABASE_HOST").is_err() {
        return None;
    }

    Some((create_client(), service_url(), setup_database().await))
}

fn service_url() -> String {
    let port: u16 = std::env::var("PORT")
        .unwrap()
        .parse()
        .expect("Invalid PORT");
    format!("http://localhost:{port}")
}

async fn setup_database() -> sqlx::PgPool {
    let database_host = std::env::var("DATABASE_HOST").unwrap();
    let database_name = std::env::var("DATABASE_NAME").unwrap();
    let database_user = std::env::var("DATABASE_USER").unwrap();
    let database_password = std::env::var("DATABASE_PASSWORD").unwrap();
    let database_port: u16 = std::env::var("DATABASE_PORT")
        .unwrap()
        .parse()
        .expect("Invalid DATABASE_PORT");

    let database_url = format!("postgres://{database_user}:{database_password}@{database_host}:{database_port}/{database_name}");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .acquire_timeout(Duration::from_millis(1000))
        .connect(&database_url)
        .await
        .expect("Expect to create a database pool with a open connection");

    let mut trx = pool.begin().await.unwrap();
    sqlx::query("DROP TABLE IF EXISTS users")
        .execute(&mut trx)
        .await
        .unwrap();
    sqlx::query("DROP TABLE IF EXISTS cities")
        .execute(&mut trx)
        .await
        .unwrap();
    for sttm in include_str!("../../dbschema.sql").split(';') {
        if sttm.trim().is_empty() {
            continue;
        }
        sqlx::query(sttm).execute(&mut trx).await.unwrap();
    }
    sqlx::query("INSERT INTO cities (name) VALUES ('Madrid'), ('Sevilla')")
        .execute(&mut trx)
        .await
        .unwrap();
    trx.commit().await.unwrap();

    pool
}

fn create_client() -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.append("accept", HeaderValue::from_static("application/json"));

    let connect_timeout = 1000 * 5; // 5 sec
    let timeout = 1000 * 10; // 10 sec

    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(connect_timeout))
        .timeout(Duration::from_millis(timeout))
        .pool_max_idle_per_host(5)
        .default_headers(headers)
        .brotli(true)
        .gzip(true)
        .build()
        .expect("Expect to create a http client")
}
