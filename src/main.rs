use anyhow::Context;
use dotenv::dotenv;
use log::info;
use std::env;
use std::sync::Arc;
use todo_rest::{SharedData, app_env, logging, persistence, security};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    logging::setup_logging(logging::init_env_filter());

    let db_url = env::var(app_env::DB_URL)
        .with_context(|| format!("{} must be set to a postgres URL", app_env::DB_URL))?;
    let jwt_secret = env::var(app_env::JWT_SECRET)
        .with_context(|| format!("{} must be set to sign access tokens", app_env::JWT_SECRET))?;
    let listen_addr =
        env::var(app_env::LISTEN_ADDR).unwrap_or_else(|_| String::from("0.0.0.0:8080"));

    let db_pool = persistence::connect_sqlx(&db_url).await;
    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("Running database migrations")?;

    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
        tokens: security::TokenAuthority::new(jwt_secret.as_bytes()),
    });
    let app = todo_rest::router(shared_data);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Binding {listen_addr}"))?;
    info!("Starting server on {listen_addr}.");
    axum::serve(listener, app).await.context("Serving the API")?;

    Ok(())
}
