use autointelli_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up SUPABASE_URL, webhook URLs, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = autointelli_api::config::config();
    tracing::info!("Starting AutoIntelli portal API");

    // Builds the Supabase/webhook clients and spawns a sync worker per
    // configured Notion catalog
    let state = AppState::from_config(config);
    let app = autointelli_api::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 AutoIntelli portal API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
