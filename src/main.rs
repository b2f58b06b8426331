// src/main.rs
use load_planner::api;
use load_planner::config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let optimizer_config = app_config.optimizer.clone();

    println!("🚚 Load planner starting...");
    api::start_api_server(api_config, optimizer_config).await;
}
